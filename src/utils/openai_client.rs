//! Client for the OpenAI chat completions API, behind the [`CompletionService`] trait
//! so the responder can be exercised without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors returned by a completion service call.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Error during HTTP request communication.
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    /// The request did not complete before the client timeout.
    #[error("Completion request timed out")]
    Timeout,

    /// Error parsing the JSON response from the API.
    #[error("Unable to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("Completion API returned {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The API answered successfully but returned no choices.
    #[error("Completion response contained no choices")]
    NoChoices,
}

impl CompletionError {
    /// Whether the failure means the account has no credits or billing is disabled.
    pub fn is_quota_exhausted(&self) -> bool {
        if let CompletionError::Rejected {
            code: Some(code), ..
        } = self
        {
            if code == "insufficient_quota" || code == "billing_not_active" {
                return true;
            }
        }
        self.to_string().contains("insufficient_quota")
    }

    /// Short class name for the failure, safe to show to end users.
    pub fn category(&self) -> &'static str {
        match self {
            CompletionError::Api(e) if e.is_timeout() => "Timeout",
            CompletionError::Api(e) if e.is_connect() => "ConnectionError",
            CompletionError::Api(_) => "ApiError",
            CompletionError::Timeout => "Timeout",
            CompletionError::Json(_) | CompletionError::NoChoices => "MalformedResponse",
            CompletionError::Rejected { status, .. } => match *status {
                401 => "AuthenticationError",
                403 => "PermissionDeniedError",
                404 => "NotFoundError",
                429 => "RateLimitError",
                500..=599 => "ServerError",
                _ => "ApiError",
            },
        }
    }
}

/// Parameters shared by every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionSettings {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TEMPERATURE: f64 = 0.4;
    pub const DEFAULT_MAX_TOKENS: u32 = 500;

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// A single persona-plus-question completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub persona: String,
    pub question: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(settings: &CompletionSettings, persona: &str, question: &str) -> Self {
        Self {
            model: settings.model.clone(),
            persona: persona.to_string(),
            question: question.to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Anything that can turn a [`CompletionRequest`] into generated text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Performs exactly one completion call. The returned text is untrimmed.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

/// OpenAI chat completions client.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Builds a client for `base_url` whose requests give up after `timeout`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        debug!("Creating OpenAI client for {} with timeout {:?}", base_url, timeout);
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
        })
    }

    fn rejection(status: StatusCode, body: &str) -> CompletionError {
        match serde_json::from_str::<ApiErrorEnvelope>(body) {
            Ok(envelope) => CompletionError::Rejected {
                status: status.as_u16(),
                code: envelope.error.code.or(envelope.error.kind),
                message: envelope.error.message,
            },
            Err(_) => CompletionError::Rejected {
                status: status.as_u16(),
                code: None,
                message: body.trim().to_string(),
            },
        }
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Api(e)
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.persona,
                },
                ChatMessage {
                    role: "user",
                    content: &request.question,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!("Sending chat completion request using model '{}'", request.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let rejection = Self::rejection(status, &text);
            warn!("Chat completion rejected: {}", rejection);
            return Err(rejection);
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse chat completion response: {}", e);
            CompletionError::Json(e)
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::NoChoices)?;

        let content = choice.message.content.unwrap_or_default();
        debug!("Received {} characters of completion text", content.chars().count());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PERSONA: &str = "You are a test coach.";

    fn setup_test_client(server: &MockServer, timeout: Duration) -> OpenAiClient {
        OpenAiClient::new("sk-test", &server.uri(), timeout).expect("client should build")
    }

    fn request(question: &str) -> CompletionRequest {
        CompletionRequest::new(&CompletionSettings::default(), PERSONA, question)
    }

    fn completion_body(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.4,
                "max_tokens": 500,
                "messages": [
                    { "role": "system", "content": PERSONA },
                    { "role": "user", "content": "What is a sprint?" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(json!("  A time-box.  "))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client.complete(&request("What is a sprint?")).await;

        assert_eq!(result.unwrap(), "  A time-box.  ");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_complete_null_content_is_empty_text() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(null))))
            .mount(&server)
            .await;

        let result = client.complete(&request("Anything?")).await;

        assert_eq!(result.unwrap(), "");
    }

    #[tokio::test]
    async fn test_complete_insufficient_quota() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "type": "insufficient_quota",
                    "param": null,
                    "code": "insufficient_quota"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert_matches!(
            &err,
            CompletionError::Rejected { status: 429, code: Some(code), .. } if code == "insufficient_quota"
        );
        assert!(err.is_quota_exhausted());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_complete_rate_limited_is_not_quota() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "message": "Rate limit reached for requests",
                    "type": "requests",
                    "code": "rate_limit_exceeded"
                }
            })))
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert!(!err.is_quota_exhausted());
        assert_eq!(err.category(), "RateLimitError");
    }

    #[tokio::test]
    async fn test_complete_server_error_with_plain_body() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert_matches!(
            &err,
            CompletionError::Rejected { status: 502, code: None, message } if message == "Bad Gateway"
        );
        assert_eq!(err.category(), "ServerError");
    }

    #[tokio::test]
    async fn test_complete_malformed_json() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert_matches!(err, CompletionError::Json(_));
    }

    #[tokio::test]
    async fn test_complete_no_choices() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, OpenAiClient::DEFAULT_TIMEOUT);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert_matches!(err, CompletionError::NoChoices);
    }

    #[tokio::test]
    async fn test_complete_times_out() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server, Duration::from_millis(100));

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(json!("late")))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client.complete(&request("Hello?")).await.unwrap_err();

        assert_matches!(err, CompletionError::Timeout);
        assert_eq!(err.category(), "Timeout");
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client =
            OpenAiClient::new("sk-test", "https://example.com/v1/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint, "https://example.com/v1/chat/completions");
    }

    #[test_case(401, "AuthenticationError" ; "unauthorized")]
    #[test_case(403, "PermissionDeniedError" ; "forbidden")]
    #[test_case(404, "NotFoundError" ; "not found")]
    #[test_case(429, "RateLimitError" ; "rate limited")]
    #[test_case(500, "ServerError" ; "internal error")]
    #[test_case(503, "ServerError" ; "unavailable")]
    #[test_case(400, "ApiError" ; "bad request")]
    fn test_rejection_category(status: u16, expected: &str) {
        let err = CompletionError::Rejected {
            status,
            code: None,
            message: "nope".to_string(),
        };
        assert_eq!(err.category(), expected);
    }

    #[test_case(Some("insufficient_quota"), "quota", true ; "quota code")]
    #[test_case(Some("billing_not_active"), "billing", true ; "billing code")]
    #[test_case(None, "Error code: 429 - insufficient_quota", true ; "quota in message")]
    #[test_case(Some("rate_limit_exceeded"), "slow down", false ; "plain rate limit")]
    fn test_quota_detection(code: Option<&str>, message: &str, expected: bool) {
        let err = CompletionError::Rejected {
            status: 429,
            code: code.map(str::to_string),
            message: message.to_string(),
        };
        assert_eq!(err.is_quota_exhausted(), expected);
    }
}
