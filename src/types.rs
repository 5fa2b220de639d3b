//! Shared domain types
//!
//! Entities persisted by the progression store and produced by the content
//! provider. Field names serialize in camelCase so a stored path and a
//! provider payload share one JSON shape.

use serde::{Deserialize, Serialize};

/// Course difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Parse from a user-supplied string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::parse(s).ok_or_else(|| format!("unknown difficulty '{}'", s))
    }
}

/// Kind of learning resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Book,
    Course,
    Paper,
    Tool,
}

impl ResourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "book" => Some(ResourceType::Book),
            "course" => Some(ResourceType::Course),
            "paper" => Some(ResourceType::Paper),
            "tool" => Some(ResourceType::Tool),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Book => write!(f, "Book"),
            ResourceType::Course => write!(f, "Course"),
            ResourceType::Paper => write!(f, "Paper"),
            ResourceType::Tool => write!(f, "Tool"),
        }
    }
}

/// Module lifecycle state. Transitions only move forward:
/// `Locked -> Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Locked,
    Active,
    Completed,
}

impl ModuleStatus {
    /// Position in the forward-only lifecycle
    fn rank(self) -> u8 {
        match self {
            ModuleStatus::Locked => 0,
            ModuleStatus::Active => 1,
            ModuleStatus::Completed => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(self, next: ModuleStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleStatus::Locked => write!(f, "locked"),
            ModuleStatus::Active => write!(f, "active"),
            ModuleStatus::Completed => write!(f, "completed"),
        }
    }
}

/// The learner. Only `xp` changes during normal use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub role: String,
    pub bio: String,
    pub avatar_url: String,
    pub xp: u64,
    pub streak: u32,
    pub interests: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Alex Chen".to_string(),
            role: "Machine Learning Engineer".to_string(),
            bio: "Passionate about bringing AI to the edge. Exploring the intersection of robotics and large language models.".to_string(),
            avatar_url: "https://picsum.photos/200".to_string(),
            xp: 12450,
            streak: 14,
            interests: vec![
                "Reinforcement Learning".to_string(),
                "Edge AI".to_string(),
                "Computer Vision".to_string(),
                "Rust".to_string(),
            ],
        }
    }
}

/// One titled block of lesson prose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeExample {
    pub language: String,
    pub code: String,
    pub explanation: String,
}

/// Multiple-choice question; `correct_answer` indexes into `options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub difficulty: String,
}

/// Generated lesson body for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContent {
    pub overview: String,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<CodeExample>,
    pub quizzes: Vec<QuizQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub estimated_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModuleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ModuleContent>,
}

impl LearningModule {
    /// Status with a missing value read as locked
    pub fn effective_status(&self) -> ModuleStatus {
        self.status.unwrap_or(ModuleStatus::Locked)
    }

    pub fn is_locked(&self) -> bool {
        self.effective_status() == ModuleStatus::Locked
    }

    pub fn is_completed(&self) -> bool {
        self.effective_status() == ModuleStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    pub difficulty: Difficulty,
    pub modules: Vec<LearningModule>,
}

/// Completion summary for a path
#[derive(Debug, Clone, PartialEq)]
pub struct PathProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
    /// Title of the first module not yet completed
    pub next_up: Option<String>,
}

impl LearningPath {
    /// First module active, every other module locked
    pub fn normalize_statuses(&mut self) {
        for (i, module) in self.modules.iter_mut().enumerate() {
            module.status = Some(if i == 0 {
                ModuleStatus::Active
            } else {
                ModuleStatus::Locked
            });
        }
    }

    pub fn progress(&self) -> PathProgress {
        let total = self.modules.len();
        let completed = self.modules.iter().filter(|m| m.is_completed()).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        let next_up = self
            .modules
            .iter()
            .find(|m| !m.is_completed())
            .map(|m| m.title.clone());

        PathProgress {
            completed,
            total,
            percent,
            next_up,
        }
    }
}

/// Verdict of an assignment review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackStatus {
    Pass,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl std::fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackStatus::Pass => write!(f, "Pass"),
            FeedbackStatus::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

/// Advisory review of a free-text submission. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentFeedback {
    pub status: FeedbackStatus,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    pub name: String,
    pub description: String,
    pub subtopics: Vec<String>,
    pub related_fields: Vec<String>,
}
