//! Turns a user question into a ScrumMaster answer.
//!
//! Every failure is classified into a [`Failure`] and rendered as user-facing
//! text, so [`Responder::answer`] always has something to send back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::utils::openai_client::{
    CompletionError, CompletionRequest, CompletionService, CompletionSettings,
};

/// Default system instruction steering the model towards an Agile coaching tone.
pub const DEFAULT_PERSONA: &str = "You are ScrumMaster, a professional Agile/Scrum coach.

Your job: answer questions clearly and confidently using Agile/Scrum vernacular.
Tone: professional, calm, concise, supportive.

When helpful, structure responses as:
- Quick answer
- Scrum perspective (roles/events/artifacts)
- Next steps (actionable)
- Risks/anti-patterns

Avoid fluff. Explain terms briefly if the user seems new.";

pub const EMPTY_INPUT_MESSAGE: &str = "Please provide a question after `$question`.";

pub const EMPTY_RESPONSE_MESSAGE: &str =
    "I couldn't generate a response. Could you rephrase your question?";

pub const QUOTA_EXHAUSTED_MESSAGE: &str = "⚠️ OpenAI API error (429): **insufficient_quota**.
Your API key has no available credits or billing is not enabled.
Fix: enable billing / add credits / increase the monthly limit, then update `OPENAI_API_KEY` and restart the bot.";

/// Why a question did not produce a generated answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The question was blank; no request was made.
    EmptyInput,
    /// The account behind the API key is out of credits.
    QuotaExhausted,
    /// Any other service failure, tagged with its category name.
    TransientServiceError(&'static str),
    /// The service answered with blank content.
    EmptyResponse,
}

impl Failure {
    /// Text shown to the user for this failure.
    pub fn message(&self) -> String {
        match self {
            Failure::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            Failure::QuotaExhausted => QUOTA_EXHAUSTED_MESSAGE.to_string(),
            Failure::TransientServiceError(category) => {
                format!("⚠️ OpenAI error: {category}. Please try again.")
            }
            Failure::EmptyResponse => EMPTY_RESPONSE_MESSAGE.to_string(),
        }
    }
}

impl From<&CompletionError> for Failure {
    fn from(error: &CompletionError) -> Self {
        if error.is_quota_exhausted() {
            Failure::QuotaExhausted
        } else {
            Failure::TransientServiceError(error.category())
        }
    }
}

/// Answers questions through an injected [`CompletionService`].
pub struct Responder {
    service: Arc<dyn CompletionService>,
    persona: String,
    settings: CompletionSettings,
}

impl Responder {
    pub fn new(
        service: Arc<dyn CompletionService>,
        persona: impl Into<String>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            service,
            persona: persona.into(),
            settings,
        }
    }

    /// Answers `question`, falling back to an explanatory message on any failure.
    pub async fn answer(&self, question: &str) -> String {
        match self.resolve(question).await {
            Ok(answer) => answer,
            Err(failure) => failure.message(),
        }
    }

    /// Answers `question`, keeping the failure classification.
    ///
    /// Makes at most one completion call and never retries.
    pub async fn resolve(&self, question: &str) -> Result<String, Failure> {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring blank question");
            return Err(Failure::EmptyInput);
        }

        let request = CompletionRequest::new(&self.settings, &self.persona, question);
        info!("Answering question of {} characters", question.chars().count());

        let content = match self.service.complete(&request).await {
            Ok(content) => content,
            Err(e) => {
                let failure = Failure::from(&e);
                warn!("Completion failed ({:?}): {}", failure, e);
                return Err(failure);
            }
        };

        let content = content.trim();
        if content.is_empty() {
            warn!("Completion service returned blank content");
            return Err(Failure::EmptyResponse);
        }

        Ok(content.to_string())
    }
}
