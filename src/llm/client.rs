//! Chat completion client for OpenAI-compatible and Ollama endpoints

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::TextGenerator;
use crate::config::AppConfig;
use crate::config::Provider;
use crate::errors::PolicyQaError;
use crate::errors::Result;

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM service used for answer generation
#[derive(Clone)]
pub struct LlmService {
    provider: Provider,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service from application config
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| PolicyQaError::HttpError(e.to_string()))?;

        Ok(Self {
            provider: config.llm.provider,
            endpoint: config.llm.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm.llm_key.clone(),
            model: config.llm.llm_model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    /// Generate a completion for a single user prompt with configured parameters
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_params(prompt, self.temperature, self.max_tokens)
            .await
    }

    /// Generate a completion with explicit sampling parameters
    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt)];
        self.chat(&messages, temperature, max_tokens).await
    }

    /// Run a chat completion and return the trimmed assistant reply
    ///
    /// # Errors
    /// - Network errors (timeouts, connection failures)
    /// - Non-success status from the provider
    /// - Responses without message content
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        let answer = match self.provider {
            Provider::OpenAI => self.chat_openai(messages, temperature, max_tokens).await?,
            Provider::Ollama => self.chat_ollama(messages, temperature, max_tokens).await?,
        };

        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Err(PolicyQaError::LlmError(
                "Model returned an empty answer".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    async fn chat_openai(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: usize,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({})", url, self.model);

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PolicyQaError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PolicyQaError::LlmError(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| PolicyQaError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PolicyQaError::LlmError("No content in response".to_string()))
    }

    async fn chat_ollama(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            num_predict: usize,
        }

        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            stream: bool,
            options: OllamaOptions,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            message: Option<ChatMessage>,
        }

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat API: {} ({})", url, self.model);

        let request = OllamaRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolicyQaError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PolicyQaError::LlmError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| PolicyQaError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .message
            .map(|m| m.content)
            .ok_or_else(|| PolicyQaError::LlmError("No message in response".to_string()))
    }

    /// Get model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Self::generate(self, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_serialization() {
        let json = serde_json::to_value(ChatMessage::user("Is dental covered?")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Is dental covered?");
    }

    #[test]
    fn test_service_uses_config() {
        let mut config = AppConfig::default();
        config.llm.llm_endpoint = "http://localhost:11434/".to_string();
        config.llm.llm_model = "llama3".to_string();
        config.llm.provider = Provider::Ollama;

        let service = LlmService::new(&config).unwrap();
        assert_eq!(service.endpoint, "http://localhost:11434");
        assert_eq!(service.model(), "llama3");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let mut config = AppConfig::default();
        config.llm.llm_endpoint = "http://127.0.0.1:9".to_string();
        let service = LlmService::new(&config).unwrap();

        let err = service.generate("hello").await.unwrap_err();
        assert_eq!(err.kind(), "http");
    }
}
