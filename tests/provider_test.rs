//! Content provider fallback behaviour through the public API

use async_trait::async_trait;
use cognosys::config::OfflineConfig;
use cognosys::types::{
    AssignmentFeedback, Difficulty, LearningPath, ModuleContent, ModuleStatus, ResourceItem,
    TopicNode,
};
use cognosys::{ContentProvider, ContentService, Generated, OfflineProvider, ProviderError};
use std::sync::Arc;
use std::time::Duration;

/// Live provider stand-in that rejects every call
struct Unreachable;

#[async_trait]
impl ContentProvider for Unreachable {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn generate_learning_path(
        &self,
        _topic: &str,
        _difficulty: Difficulty,
        _tech_stack: Option<&str>,
    ) -> Result<LearningPath, ProviderError> {
        Err(ProviderError::Status { code: 502, body: "bad gateway".into() })
    }

    async fn generate_module_content(
        &self,
        _topic: &str,
        _module_title: &str,
        _difficulty: Difficulty,
        _tech_stack: Option<&str>,
    ) -> Result<ModuleContent, ProviderError> {
        Err(ProviderError::EmptyResponse)
    }

    async fn evaluate_assignment(
        &self,
        _title: &str,
        _requirements: &[String],
        _submission: &str,
    ) -> Result<AssignmentFeedback, ProviderError> {
        Err(ProviderError::Parse("truncated".into()))
    }

    async fn generate_resources(&self, _category: &str) -> Result<Vec<ResourceItem>, ProviderError> {
        Err(ProviderError::Invalid("unknown type".into()))
    }

    async fn generate_topic_overview(&self, _topic_name: &str) -> Result<TopicNode, ProviderError> {
        Err(ProviderError::MissingCredential)
    }
}

fn failing_service(latency: OfflineConfig) -> ContentService {
    ContentService::new(
        Some(Arc::new(Unreachable)),
        OfflineProvider::new(latency),
        Duration::from_secs(45),
    )
}

#[tokio::test(start_paused = true)]
async fn test_failures_degrade_within_simulated_latency() {
    let service = failing_service(OfflineConfig::default());
    assert!(service.is_online());

    let started = tokio::time::Instant::now();
    let content = service
        .generate_module_content("Rust", "Lifetimes", Difficulty::Advanced, Some("Tokio"))
        .await;
    assert_eq!(started.elapsed(), Duration::from_millis(1500));
    assert!(!content.overview.is_empty());
    assert!(!content.sections.is_empty());
    assert!(!content.quizzes.is_empty());
    for quiz in &content.quizzes {
        assert!(quiz.options.len() >= 2);
        assert!(quiz.correct_answer < quiz.options.len());
    }

    let started = tokio::time::Instant::now();
    let feedback = service.evaluate_assignment("Ownership", &["Use Box".to_string()], "fn main() {}").await;
    assert_eq!(started.elapsed(), Duration::from_millis(1500));
    assert!(!feedback.feedback.is_empty());

    let started = tokio::time::Instant::now();
    let resources = service.generate_resources("Robotics").await;
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
    assert_eq!(resources.len(), 3);
    assert!(resources.iter().all(|r| !r.id.is_empty() && !r.title.is_empty()));
}

#[tokio::test]
async fn test_path_and_topic_surface_unavailable() {
    let service = failing_service(OfflineConfig::zero_latency());

    match service.generate_learning_path("Rust", Difficulty::Beginner, None).await {
        Generated::Unavailable(reason) => assert!(reason.contains("502")),
        Generated::Ready(_) => panic!("failed live provider should not yield a path"),
    }
    assert!(!service.generate_topic_overview("Robotics").await.is_ready());
}

#[tokio::test]
async fn test_offline_path_is_normalized_and_tagged() {
    let service = ContentService::offline(OfflineProvider::instant());
    let path = service
        .generate_learning_path("Rust", Difficulty::Beginner, Some("Tokio"))
        .await
        .ready()
        .unwrap();

    assert_eq!(path.topic, "Rust");
    assert_eq!(path.tech_stack.as_deref(), Some("Tokio"));
    assert!(path.id.starts_with("mock-path-"));
    assert!(!path.modules.is_empty());
    assert_eq!(path.modules[0].status, Some(ModuleStatus::Active));
    assert!(path.modules[1..]
        .iter()
        .all(|m| m.status == Some(ModuleStatus::Locked)));
}
