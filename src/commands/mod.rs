//! This module aggregates all the command modules for the bot.

/// General purpose commands (e.g., hello, question).
pub(crate) mod general;
