//! Topic exploration with breadcrumb history

use tracing::{debug, warn};

use crate::provider::{ContentService, Generated};
use crate::types::TopicNode;

/// Starting points offered before any topic is explored
pub const ROOT_TOPICS: [&str; 10] = [
    "Machine Learning",
    "Deep Learning",
    "Natural Language Processing",
    "Computer Vision",
    "Robotics",
    "Reinforcement Learning",
    "Generative AI",
    "AI Ethics & Safety",
    "Data Science",
    "Expert Systems",
];

#[derive(Debug, Clone, Default)]
pub struct TopicExplorer {
    current: Option<TopicNode>,
    history: Vec<TopicNode>,
    error: Option<String>,
    /// Topic whose overview failed, for retry
    failed_topic: Option<String>,
}

impl TopicExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&TopicNode> {
        self.current.as_ref()
    }

    /// Previously visited topics, oldest first
    pub fn history(&self) -> &[TopicNode] {
        &self.history
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load `name`. On success the previous topic moves onto the history;
    /// on failure the error is recorded and nothing else changes.
    pub async fn explore(&mut self, service: &ContentService, name: &str) -> bool {
        self.error = None;
        self.failed_topic = None;

        match service.generate_topic_overview(name).await {
            Generated::Ready(node) => {
                if let Some(previous) = self.current.take() {
                    self.history.push(previous);
                }
                debug!("Exploring '{}' ({} deep)", node.name, self.history.len());
                self.current = Some(node);
                true
            }
            Generated::Unavailable(reason) => {
                warn!("Topic overview for '{}' unavailable: {}", name, reason);
                self.error = Some(
                    "Unable to load topic details. Check the provider configuration and connection."
                        .to_string(),
                );
                self.failed_topic = Some(name.to_string());
                false
            }
        }
    }

    /// Re-run the last failed exploration
    pub async fn retry(&mut self, service: &ContentService) -> bool {
        match self.failed_topic.clone() {
            Some(name) => self.explore(service, &name).await,
            None => false,
        }
    }

    /// Jump back to breadcrumb `index`, dropping it and everything after it
    /// from the history
    pub fn back_to(&mut self, index: usize) -> bool {
        if index >= self.history.len() {
            return false;
        }
        let mut tail = self.history.split_off(index);
        self.current = Some(tail.remove(0));
        true
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
        self.error = None;
        self.failed_topic = None;
    }

    /// Topic to pre-fill when creating a learning path from here
    pub fn path_seed(&self) -> Option<&str> {
        self.current.as_ref().map(|node| node.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{service_with, FailingProvider};
    use crate::provider::OfflineProvider;

    fn offline_service() -> ContentService {
        ContentService::offline(OfflineProvider::instant())
    }

    fn names(nodes: &[TopicNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_explore_builds_breadcrumbs() {
        let service = offline_service();
        let mut explorer = TopicExplorer::new();
        assert_eq!(explorer.path_seed(), None);

        explorer.explore(&service, ROOT_TOPICS[0]).await;
        explorer.explore(&service, "Supervised Learning").await;
        explorer.explore(&service, "Regression").await;

        assert_eq!(explorer.path_seed(), Some("Regression"));
        assert_eq!(names(explorer.history()), vec!["Machine Learning", "Supervised Learning"]);
    }

    #[tokio::test]
    async fn test_back_to_restores_and_truncates() {
        let service = offline_service();
        let mut explorer = TopicExplorer::new();
        for topic in ["A", "B", "C", "D"] {
            explorer.explore(&service, topic).await;
        }

        assert!(!explorer.back_to(3));
        assert!(explorer.back_to(1));
        assert_eq!(explorer.current().unwrap().name, "B");
        assert_eq!(names(explorer.history()), vec!["A"]);

        assert!(explorer.back_to(0));
        assert_eq!(explorer.current().unwrap().name, "A");
        assert!(explorer.history().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_state_and_allows_retry() {
        let offline = offline_service();
        let mut explorer = TopicExplorer::new();
        explorer.explore(&offline, "Robotics").await;

        let failing = service_with(FailingProvider);
        assert!(!explorer.explore(&failing, "Kinematics").await);
        assert!(explorer.error().is_some());
        assert_eq!(explorer.path_seed(), Some("Robotics"));
        assert!(explorer.history().is_empty());

        assert!(explorer.retry(&offline).await);
        assert!(explorer.error().is_none());
        assert_eq!(explorer.path_seed(), Some("Kinematics"));
        assert_eq!(names(explorer.history()), vec!["Robotics"]);
        assert!(!explorer.retry(&offline).await);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let service = service_with(FailingProvider);
        let mut explorer = TopicExplorer::new();
        explorer.explore(&offline_service(), "Data Science").await;
        explorer.explore(&service, "x").await;

        explorer.reset();
        assert!(explorer.current().is_none());
        assert!(explorer.history().is_empty());
        assert!(explorer.error().is_none());
    }
}
