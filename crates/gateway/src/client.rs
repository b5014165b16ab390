//! HTTP client for the chat-completions endpoint.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::protocol::{ChatRequest, ChatResponse, Message, ToolDefinition, ToolSchema};
use crate::{Error, Result};

const COMPLETIONS_PATH: &str = "/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The seam between the conversation loop and the remote endpoint.
///
/// [`Client`] is the real implementation; tests substitute scripted
/// backends. One call is one request: no retries, a single bounded
/// wait. When `tools` is empty the endpoint is not offered
/// tool-calling capability for that call.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> impl Future<Output = Result<Message>> + Send;
}

/// Builder for creating a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Client {
        Client {
            http: reqwest::Client::new(),
            base_url: self.base_url,
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

/// Chat-completions endpoint client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl Client {
    pub fn builder(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(base_url, api_key)
    }

    /// The model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn extract_reply(response: ChatResponse) -> Result<Message> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("no choices in response".into()))?;

        let message = choice.message;
        if message.content.is_none() && message.tool_calls.is_empty() {
            return Err(Error::MalformedResponse(
                "assistant message has neither content nor tool calls".into(),
            ));
        }
        Ok(message)
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "completions({}, model={})", self.base_url, self.model)
    }
}

impl CompletionBackend for Client {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message> {
        let (tool_schemas, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(tools.iter().map(ToolSchema::from).collect()),
                Some("auto"),
            )
        };

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: tool_schemas,
            tool_choice,
        };

        let url = format!("{}{COMPLETIONS_PATH}", self.base_url.trim_end_matches('/'));
        debug!(
            %url,
            messages = messages.len(),
            tools = tools.len(),
            "sending completion request"
        );

        // One bounded wait per call; exceeding it is a failure, not a hang.
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        Self::extract_reply(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_reply_rejects_empty_choices() {
        let response = ChatResponse { choices: vec![] };
        assert!(matches!(
            Client::extract_reply(response),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn extract_reply_rejects_vacant_message() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Client::extract_reply(response),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn extract_reply_takes_first_choice() {
        let json = r#"{"choices":[
            {"message":{"role":"assistant","content":"first"},"finish_reason":"stop"},
            {"message":{"role":"assistant","content":"second"},"finish_reason":"stop"}
        ]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let reply = Client::extract_reply(response).unwrap();
        assert_eq!(reply.content.as_deref(), Some("first"));
    }
}
