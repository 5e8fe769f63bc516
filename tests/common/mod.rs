//! Fakes shared by the integration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use scrumbot::Error;
use scrumbot::relay::MessageSink;
use scrumbot::utils::openai_client::{CompletionError, CompletionRequest, CompletionService};

/// Completion service that answers every request with a fixed outcome and counts calls.
pub struct ScriptedService {
    outcome: fn() -> Result<String, CompletionError>,
    calls: AtomicUsize,
    pub last_question: Mutex<Option<String>>,
}

impl ScriptedService {
    pub fn new(outcome: fn() -> Result<String, CompletionError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_question: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_question.lock().unwrap() = Some(request.question.clone());
        (self.outcome)()
    }
}

/// Sink that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<String>>,
    /// Fail on the send with this index (0-based).
    pub fail_at: Option<usize>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, content: String) -> Result<(), Error> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_at == Some(sent.len()) {
            return Err("channel unavailable".into());
        }
        sent.push(content);
        Ok(())
    }
}

/// A multi-paragraph coaching answer of exactly `len` characters.
pub fn long_answer(len: usize) -> String {
    let paragraph = "Focus the Sprint Goal, slice stories thinner, and limit work in progress so the team finishes what it starts. ";
    let mut text = String::new();
    let mut i = 0;
    while text.len() < len {
        if i > 0 && i % 4 == 0 {
            text.push_str("\n\n");
        }
        text.push_str(paragraph);
        i += 1;
    }
    text.truncate(len);
    text
}
