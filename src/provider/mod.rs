//! Content provider adapter
//!
//! Produces curricula, lesson content, resource recommendations, topic
//! overviews and assignment reviews. A live LLM provider is used when a
//! credential is configured; otherwise, or when the live call fails, the
//! deterministic offline substitute is used instead.
//!
//! Learning-path and topic-overview generation are the exception: when a
//! configured live provider fails they report [`Generated::Unavailable`] so
//! the caller can offer an explicit retry.

pub mod llm;
pub mod offline;
pub mod prompts;
pub mod schema;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::types::{
    AssignmentFeedback, Difficulty, LearningPath, ModuleContent, ResourceItem, TopicNode,
};
use llm::{ChatMessage, OpenRouterClient, ProviderConfig};
pub use offline::OfflineProvider;

/// Failure of a single provider call
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no provider credential configured")]
    MissingCredential,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("could not parse provider response: {0}")]
    Parse(String),
    #[error("provider response failed validation: {0}")]
    Invalid(String),
    #[error("provider did not respond within {0:?}")]
    Timeout(Duration),
}

/// Result of an operation that may surface a hard failure to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Generated<T> {
    Ready(T),
    /// The live provider failed; the caller should offer a retry
    Unavailable(String),
}

impl<T> Generated<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Generated::Ready(value) => Some(value),
            Generated::Unavailable(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Generated::Ready(_))
    }
}

/// Common trait for content sources
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Generate a curriculum. Module statuses are not normalized.
    async fn generate_learning_path(
        &self,
        topic: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> Result<LearningPath, ProviderError>;

    async fn generate_module_content(
        &self,
        topic: &str,
        module_title: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> Result<ModuleContent, ProviderError>;

    async fn evaluate_assignment(
        &self,
        title: &str,
        requirements: &[String],
        submission: &str,
    ) -> Result<AssignmentFeedback, ProviderError>;

    async fn generate_resources(&self, category: &str) -> Result<Vec<ResourceItem>, ProviderError>;

    async fn generate_topic_overview(&self, topic_name: &str) -> Result<TopicNode, ProviderError>;
}

/// Live provider backed by an OpenAI-compatible chat completion API
pub struct LiveProvider {
    client: OpenRouterClient,
    model: String,
    max_tokens: u32,
}

impl LiveProvider {
    pub fn new(client: OpenRouterClient, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }

    /// Build from config, resolving the API key from env/keyring/file
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = crate::security::keyring::get_api_key()
            .map_err(|_| ProviderError::MissingCredential)?;
        let provider = if config.provider.base_url == llm::OPENROUTER_BASE_URL {
            ProviderConfig::openrouter(api_key)
        } else {
            ProviderConfig::custom(api_key, config.provider.base_url.clone())
        };
        Ok(Self::new(
            OpenRouterClient::with_provider(provider),
            config.provider.model.clone(),
            config.provider.max_tokens,
        ))
    }

    async fn ask(&self, prompt: String) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        self.client
            .complete_json(&self.model, messages, Some(self.max_tokens))
            .await
    }
}

#[async_trait]
impl ContentProvider for LiveProvider {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn generate_learning_path(
        &self,
        topic: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> Result<LearningPath, ProviderError> {
        let text = self.ask(prompts::learning_path(topic, difficulty, tech_stack)).await?;
        schema::parse_learning_path(&text, topic, difficulty, tech_stack)
    }

    async fn generate_module_content(
        &self,
        topic: &str,
        module_title: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> Result<ModuleContent, ProviderError> {
        let text = self
            .ask(prompts::module_content(topic, module_title, difficulty, tech_stack))
            .await?;
        schema::parse_module_content(&text)
    }

    async fn evaluate_assignment(
        &self,
        title: &str,
        requirements: &[String],
        submission: &str,
    ) -> Result<AssignmentFeedback, ProviderError> {
        let text = self.ask(prompts::evaluation(title, requirements, submission)).await?;
        schema::parse_feedback(&text)
    }

    async fn generate_resources(&self, category: &str) -> Result<Vec<ResourceItem>, ProviderError> {
        let text = self.ask(prompts::resources(category)).await?;
        schema::parse_resources(&text)
    }

    async fn generate_topic_overview(&self, topic_name: &str) -> Result<TopicNode, ProviderError> {
        let text = self.ask(prompts::topic_overview(topic_name)).await?;
        schema::parse_topic(&text)
    }
}

/// The adapter the rest of the crate talks to
#[derive(Clone)]
pub struct ContentService {
    live: Option<Arc<dyn ContentProvider>>,
    offline: OfflineProvider,
    timeout: Duration,
}

impl ContentService {
    pub fn new(
        live: Option<Arc<dyn ContentProvider>>,
        offline: OfflineProvider,
        timeout: Duration,
    ) -> Self {
        Self { live, offline, timeout }
    }

    /// Offline-only service
    pub fn offline(offline: OfflineProvider) -> Self {
        Self::new(None, offline, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }

    pub fn from_config(config: &Config) -> Self {
        let offline = OfflineProvider::new(config.offline.clone());
        let timeout = Duration::from_secs(config.provider.timeout_secs);

        if config.offline.enabled {
            info!("Offline mode forced by config, using offline content");
            return Self::new(None, offline, timeout);
        }

        match LiveProvider::from_config(config) {
            Ok(live) => Self::new(Some(Arc::new(live)), offline, timeout),
            Err(e) => {
                info!("{}, using offline content", e);
                Self::new(None, offline, timeout)
            }
        }
    }

    pub fn is_online(&self) -> bool {
        self.live.is_some()
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }

    pub async fn generate_learning_path(
        &self,
        topic: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> Generated<LearningPath> {
        let Some(live) = &self.live else {
            return Generated::Ready(self.offline.learning_path(topic, difficulty, tech_stack).await);
        };
        match self
            .bounded(live.generate_learning_path(topic, difficulty, tech_stack))
            .await
        {
            Ok(path) => Generated::Ready(path),
            Err(e) => {
                warn!("Learning path generation failed via {}: {}", live.name(), e);
                Generated::Unavailable(e.to_string())
            }
        }
    }

    pub async fn generate_module_content(
        &self,
        topic: &str,
        module_title: &str,
        difficulty: Difficulty,
        tech_stack: Option<&str>,
    ) -> ModuleContent {
        if let Some(live) = &self.live {
            match self
                .bounded(live.generate_module_content(topic, module_title, difficulty, tech_stack))
                .await
            {
                Ok(content) => return content,
                Err(e) => warn!("Module content generation failed via {} (switching to offline): {}", live.name(), e),
            }
        }
        self.offline.module_content(module_title, tech_stack).await
    }

    pub async fn evaluate_assignment(
        &self,
        title: &str,
        requirements: &[String],
        submission: &str,
    ) -> AssignmentFeedback {
        if let Some(live) = &self.live {
            match self
                .bounded(live.evaluate_assignment(title, requirements, submission))
                .await
            {
                Ok(feedback) => return feedback,
                Err(e) => warn!("Assignment evaluation failed via {} (switching to offline): {}", live.name(), e),
            }
        }
        self.offline.evaluation().await
    }

    pub async fn generate_resources(&self, category: &str) -> Vec<ResourceItem> {
        if let Some(live) = &self.live {
            match self.bounded(live.generate_resources(category)).await {
                Ok(items) => return items,
                Err(e) => warn!("Resource generation failed via {} (switching to offline): {}", live.name(), e),
            }
        }
        self.offline.resources(category).await
    }

    pub async fn generate_topic_overview(&self, topic_name: &str) -> Generated<TopicNode> {
        let Some(live) = &self.live else {
            return Generated::Ready(self.offline.topic(topic_name).await);
        };
        match self.bounded(live.generate_topic_overview(topic_name)).await {
            Ok(node) => Generated::Ready(node),
            Err(e) => {
                warn!("Topic overview failed via {}: {}", live.name(), e);
                Generated::Unavailable(e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_offline_service_is_always_ready() {
        let service = ContentService::offline(OfflineProvider::instant());
        assert!(!service.is_online());
        assert!(service.generate_learning_path("Rust", Difficulty::Beginner, None).await.is_ready());
        assert!(service.generate_topic_overview("Rust").await.is_ready());
    }

    #[tokio::test]
    async fn test_failing_provider_degrades_to_substitute() {
        let service = service_with(FailingProvider);

        let content = service
            .generate_module_content("Rust", "Ownership", Difficulty::Beginner, None)
            .await;
        assert!(!content.quizzes.is_empty());
        assert!(content.overview.contains("offline placeholder"));

        let feedback = service.evaluate_assignment("t", &[], "code").await;
        assert!(!feedback.feedback.is_empty());

        let items = service.generate_resources("Vision").await;
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_provider_surfaces_unavailable_for_exploration() {
        let service = service_with(FailingProvider);
        let path = service.generate_learning_path("Rust", Difficulty::Beginner, None).await;
        assert!(matches!(path, Generated::Unavailable(_)));
        let topic = service.generate_topic_overview("Rust").await;
        assert!(topic.ready().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_provider_times_out_to_substitute() {
        let service = service_with(HangingProvider);
        let content = service
            .generate_module_content("Rust", "Traits", Difficulty::Advanced, Some("Tokio"))
            .await;
        assert_eq!(content.quizzes.len(), 3);

        let path = service.generate_learning_path("Rust", Difficulty::Beginner, None).await;
        match path {
            Generated::Unavailable(reason) => assert!(reason.contains("did not respond")),
            Generated::Ready(_) => panic!("hung provider should not produce a path"),
        }
    }
}
