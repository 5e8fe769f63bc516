//! Splits long answers into fragments that fit inside a single Discord message.

/// Discord rejects messages over 2000 characters; keep some headroom.
pub const DEFAULT_FRAGMENT_LIMIT: usize = 1900;

/// Splits `text` into ordered fragments of at most `limit` characters.
///
/// Lines are grouped greedily so paragraphs stay together whenever they fit.
/// A single line longer than `limit` is cut into fixed-width slices, which may
/// break words. Blank fragments are dropped.
///
/// # Arguments
///
/// * `text` - The text to split.
/// * `limit` - Maximum fragment length, counted in characters. `0` is treated as `1`.
///
/// # Returns
///
/// The fragments in reading order. Empty input yields an empty vector.
pub fn split(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);

    // (fragment, length in chars)
    let mut grouped: Vec<(String, usize)> = Vec::new();
    for line in text.split('\n') {
        let line_len = line.chars().count();
        match grouped.last_mut() {
            Some((current, current_len)) if *current_len + 1 + line_len <= limit => {
                current.push('\n');
                current.push_str(line);
                *current_len += 1 + line_len;
            }
            _ => grouped.push((line.to_string(), line_len)),
        }
    }

    grouped
        .into_iter()
        .flat_map(|(fragment, len)| {
            if len <= limit {
                vec![fragment]
            } else {
                slice_fixed_width(&fragment, limit)
            }
        })
        .filter(|fragment| !fragment.trim().is_empty())
        .collect()
}

/// Cuts `line` into consecutive slices of exactly `width` characters; the last may be shorter.
fn slice_fixed_width(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width)
        .map(|slice| slice.iter().collect())
        .collect()
}
