use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TutorConfig;
use crate::core::{ChatClient, ChatMessage};
use crate::error::{AIError, TutorError};

use super::mock::{MockClient, MockHandle, MockResponse};
use super::openai::{OpenAIClient, OpenAIConfig};

/// Which backend a [`FlexibleClient`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClientType {
    #[default]
    #[value(name = "openai")]
    OpenAI,
    Mock,
}

impl std::str::FromStr for ClientType {
    type Err = String;

    /// Case insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown client type: '{}'. Supported: openai, mock", s)),
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientType::OpenAI => write!(f, "OpenAI"),
            ClientType::Mock => write!(f, "Mock"),
        }
    }
}

/// Cloneable wrapper around any boxed [`ChatClient`].
#[derive(Debug, Clone)]
pub struct FlexibleClient {
    inner: Arc<Box<dyn ChatClient>>,
}

impl FlexibleClient {
    pub fn new(client: Box<dyn ChatClient>) -> Self {
        Self { inner: Arc::new(client) }
    }

    pub fn openai(config: OpenAIConfig) -> Self {
        Self::new(Box::new(OpenAIClient::new(config)))
    }

    /// Mock client plus the handle that scripts it
    pub fn mock() -> (Self, Arc<MockHandle>) {
        let (client, handle) = MockClient::new();
        (Self::new(Box::new(client)), handle)
    }

    pub fn mock_with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = MockClient::with_responses(responses);
        (Self::new(Box::new(client)), handle)
    }

    /// Build the client for `client_type`. Only the OpenAI backend needs a key.
    pub fn from_type(
        client_type: ClientType,
        config: &TutorConfig,
        manual_key: Option<&str>,
    ) -> Result<Self, TutorError> {
        match client_type {
            ClientType::OpenAI => {
                let client = OpenAIClient::from_config(config, manual_key)?;
                Ok(Self::new(Box::new(client)))
            }
            ClientType::Mock => Ok(Self::mock().0),
        }
    }
}

#[async_trait]
impl ChatClient for FlexibleClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AIError> {
        self.inner.complete(messages).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn clone_box(&self) -> Box<dyn ChatClient> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_type_parsing() {
        assert_eq!("openai".parse::<ClientType>(), Ok(ClientType::OpenAI));
        assert_eq!("MOCK".parse::<ClientType>(), Ok(ClientType::Mock));
        assert!("claude".parse::<ClientType>().is_err());
    }

    #[tokio::test]
    async fn mock_type_needs_no_key() {
        let client =
            FlexibleClient::from_type(ClientType::Mock, &TutorConfig::default(), None).unwrap();
        assert_eq!(client.model(), "mock");
        assert!(client.complete(vec![ChatMessage::user("hi")]).await.is_ok());
    }
}
