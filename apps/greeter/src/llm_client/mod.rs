/// LLM client. Every chat-completion call in the greeter goes through the
/// [`LlmClient`] trait defined here.
///
/// `OpenAiChatClient` is the production adapter. `MockLlmClient` (see
/// `mock.rs`) is the deterministic double used by tests.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod mock;

pub use mock::MockLlmClient;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Text generation capability. Failures propagate to the caller untouched;
/// implementations do not retry.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_text(&self, prompt: &str, temperature: f64) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if the model returned any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Chat-completions adapter. The persona's system prompt is fixed at
/// construction and sent with every request.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String, system_prompt: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
            system_prompt,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &'a str, temperature: f64) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn generate_text(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt, temperature))
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = provider_error(response).await;
            return Err(LlmError::Api { status, message });
        }

        let chat: ChatResponse = response.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Status and message of a failed OpenAI response. Shared by every OpenAI
/// adapter in the crate.
pub(crate) async fn provider_error(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, provider_message(body))
}

/// The provider's own error message, or the raw body when it is not the
/// usual `{"error": {"message": ...}}` envelope.
fn provider_message(body: String) -> String {
    serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_request_carries_system_prompt_and_temperature() {
        let client = OpenAiChatClient::new(
            "sk-test".to_string(),
            "gpt-4.1-nano".to_string(),
            "You are a grandma.".to_string(),
        );
        let body = serde_json::to_value(client.request("Say hi", 0.3)).unwrap();
        assert_eq!(body["model"], "gpt-4.1-nano");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a grandma.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Say hi");
    }

    #[test]
    fn test_chat_response_text() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Buenos días"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Buenos días"));
    }

    #[test]
    fn test_chat_response_without_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_provider_message_is_extracted() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            provider_message(body.to_string()),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_provider_message_falls_back_to_raw_body() {
        assert_eq!(provider_message("bad gateway".to_string()), "bad gateway");
    }
}
