pub mod models;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{KeyFromEnv, TutorConfig, DEFAULT_BASE_URL};
use crate::core::{ChatClient, ChatMessage};
use crate::error::{AIError, OpenAIError, TutorError};
pub use models::OpenAIModel;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: OpenAIModel,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: OpenAIModel::default(),
            max_tokens: 2048,
            temperature: 0.7,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OpenAIConfig {
    pub fn from_tutor_config(config: &TutorConfig, api_key: String) -> Self {
        Self {
            api_key,
            model: OpenAIModel::from_id(&config.model),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            base_url: config.base_url.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// The key must never reach logs.
impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct OpenAIClient {
    config: OpenAIConfig,
    http: Client,
}

impl KeyFromEnv for OpenAIClient {
    const KEY_NAME: &'static str = "OPENAI_API_KEY";
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        info!(
            model = %config.model.id(),
            base_url = %config.base_url,
            "Creating new OpenAI client"
        );
        Self { config, http: Client::new() }
    }

    /// Resolve the key (secret store, then `manual_key`) and build a client from `config`.
    pub fn from_config(config: &TutorConfig, manual_key: Option<&str>) -> Result<Self, TutorError> {
        let api_key = Self::resolve_key(manual_key)?;
        Ok(Self::new(OpenAIConfig::from_tutor_config(config, api_key)))
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: self.config.model.id(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

/// First choice's content. An empty choice list is an API error.
fn first_choice_text(response: ChatCompletionResponse) -> Result<String, OpenAIError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| OpenAIError::Api("No choices in response".to_string()))
}

#[async_trait]
impl ChatClient for OpenAIClient {
    #[instrument(
        skip(self, messages),
        fields(message_count = messages.len(), model = %self.config.model.id())
    )]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AIError> {
        if messages.iter().any(ChatMessage::has_image) && !self.config.model.supports_images() {
            warn!(
                model = %self.config.model.id(),
                "Sending an image to a model that may not accept images"
            );
        }

        let body = self.request_body(&messages);
        debug!(endpoint = %self.config.endpoint(), "Sending chat completion request");

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                OpenAIError::Http(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received response from OpenAI API");

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("OpenAI API rate limit exceeded");
            return Err(OpenAIError::RateLimit.into());
        }
        if status == StatusCode::UNAUTHORIZED {
            error!("OpenAI API authentication failed");
            return Err(OpenAIError::Authentication.into());
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api(error_text).into());
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI response JSON");
            OpenAIError::Http(e.to_string())
        })?;

        let text = first_choice_text(parsed)?;
        info!(response_len = text.len(), "Successfully received OpenAI response");
        Ok(text)
    }

    fn model(&self) -> &str {
        self.config.model.id()
    }

    fn clone_box(&self) -> Box<dyn ChatClient> {
        Box::new(self.clone())
    }
}
