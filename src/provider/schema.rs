//! Wire schema for provider payloads
//!
//! Provider output is deserialized into strict wire structs and validated
//! before it becomes a domain value. Anything that fails here is treated as
//! a provider failure by the adapter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::ProviderError;
use crate::types::{
    Assignment, AssignmentFeedback, CodeExample, Difficulty, FeedbackStatus, LearningModule,
    LearningPath, ModuleContent, QuizQuestion, ResourceItem, ResourceType, Section, TopicNode,
};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").expect("valid fence regex")
});

/// Strip a surrounding markdown code fence, if any
pub fn extract_json(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

fn decode<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, ProviderError> {
    let json = extract_json(text);
    if json.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn invalid(msg: impl Into<String>) -> ProviderError {
    ProviderError::Invalid(msg.into())
}

// ============ Learning path ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePath {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    tech_stack: Option<String>,
    modules: Vec<WireModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireModule {
    title: String,
    description: String,
    topics: Vec<String>,
    estimated_hours: f64,
}

/// Parse a generated curriculum. Missing id, topic, difficulty or tech stack
/// are filled from the request; module statuses are left unset.
pub fn parse_learning_path(
    text: &str,
    topic: &str,
    difficulty: Difficulty,
    tech_stack: Option<&str>,
) -> Result<LearningPath, ProviderError> {
    let wire: WirePath = decode(text)?;

    if wire.modules.is_empty() {
        return Err(invalid("learning path has no modules"));
    }

    let mut modules = Vec::with_capacity(wire.modules.len());
    for (i, m) in wire.modules.into_iter().enumerate() {
        if m.title.trim().is_empty() {
            return Err(invalid(format!("module {} has an empty title", i)));
        }
        if !m.estimated_hours.is_finite() || m.estimated_hours < 0.0 {
            return Err(invalid(format!("module {} has invalid estimatedHours", i)));
        }
        modules.push(LearningModule {
            title: m.title,
            description: m.description,
            topics: m.topics,
            estimated_hours: m.estimated_hours,
            status: None,
            content: None,
        });
    }

    Ok(LearningPath {
        id: wire
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("path-{}", uuid::Uuid::new_v4())),
        topic: wire
            .topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| topic.to_string()),
        tech_stack: wire
            .tech_stack
            .filter(|s| !s.trim().is_empty())
            .or_else(|| tech_stack.map(str::to_string)),
        difficulty: wire
            .difficulty
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or(difficulty),
        modules,
    })
}

// ============ Module content ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    overview: String,
    sections: Vec<WireSection>,
    #[serde(default)]
    code_example: Option<WireCode>,
    quizzes: Vec<WireQuiz>,
    #[serde(default)]
    assignment: Option<WireAssignment>,
}

#[derive(Debug, Deserialize)]
struct WireSection {
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireCode {
    language: String,
    code: String,
    explanation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuiz {
    question: String,
    options: Vec<String>,
    correct_answer: i64,
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct WireAssignment {
    title: String,
    description: String,
    requirements: Vec<String>,
    difficulty: String,
}

pub fn parse_module_content(text: &str) -> Result<ModuleContent, ProviderError> {
    let wire: WireContent = decode(text)?;

    if wire.quizzes.is_empty() {
        return Err(invalid("module content has no quizzes"));
    }

    let mut quizzes = Vec::with_capacity(wire.quizzes.len());
    for (i, q) in wire.quizzes.into_iter().enumerate() {
        if q.options.len() < 2 {
            return Err(invalid(format!("quiz {} has fewer than two options", i)));
        }
        let correct_answer = usize::try_from(q.correct_answer)
            .ok()
            .filter(|idx| *idx < q.options.len())
            .ok_or_else(|| invalid(format!(
                "quiz {} correctAnswer {} out of range for {} options",
                i, q.correct_answer, q.options.len()
            )))?;
        quizzes.push(QuizQuestion {
            question: q.question,
            options: q.options,
            correct_answer,
            explanation: q.explanation,
        });
    }

    Ok(ModuleContent {
        overview: wire.overview,
        sections: wire
            .sections
            .into_iter()
            .map(|s| Section { title: s.title, content: s.content })
            .collect(),
        code_example: wire.code_example.map(|c| CodeExample {
            language: c.language,
            code: c.code,
            explanation: c.explanation,
        }),
        quizzes,
        assignment: wire.assignment.map(|a| Assignment {
            title: a.title,
            description: a.description,
            requirements: a.requirements,
            difficulty: a.difficulty,
        }),
    })
}

// ============ Assignment feedback ============

#[derive(Debug, Deserialize)]
struct WireFeedback {
    status: FeedbackStatus,
    feedback: String,
    strengths: Vec<String>,
    improvements: Vec<String>,
}

pub fn parse_feedback(text: &str) -> Result<AssignmentFeedback, ProviderError> {
    let wire: WireFeedback = decode(text)?;
    Ok(AssignmentFeedback {
        status: wire.status,
        feedback: wire.feedback,
        strengths: wire.strengths,
        improvements: wire.improvements,
    })
}

// ============ Resources ============

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResourceList {
    Bare(Vec<WireResource>),
    Wrapped { resources: Vec<WireResource> },
}

#[derive(Debug, Deserialize)]
struct WireResource {
    #[serde(default)]
    id: Option<String>,
    title: String,
    author: String,
    #[serde(rename = "type")]
    resource_type: String,
    url: String,
    description: String,
    tags: Vec<String>,
}

/// Parse recommended resources. Items without an id get a fresh `gen-` id.
pub fn parse_resources(text: &str) -> Result<Vec<ResourceItem>, ProviderError> {
    let wire: WireResourceList = decode(text)?;
    let items = match wire {
        WireResourceList::Bare(items) => items,
        WireResourceList::Wrapped { resources } => resources,
    };

    if items.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let resource_type = ResourceType::parse(&r.resource_type).ok_or_else(|| {
                invalid(format!("resource {} has unknown type '{}'", i, r.resource_type))
            })?;
            Ok(ResourceItem {
                id: r
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("gen-{}", uuid::Uuid::new_v4())),
                title: r.title,
                author: r.author,
                resource_type,
                url: r.url,
                description: r.description,
                tags: r.tags,
            })
        })
        .collect()
}

// ============ Topic overview ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTopic {
    name: String,
    description: String,
    subtopics: Vec<String>,
    related_fields: Vec<String>,
}

pub fn parse_topic(text: &str) -> Result<TopicNode, ProviderError> {
    let wire: WireTopic = decode(text)?;
    if wire.name.trim().is_empty() {
        return Err(invalid("topic has an empty name"));
    }
    Ok(TopicNode {
        name: wire.name,
        description: wire.description,
        subtopics: wire.subtopics,
        related_fields: wire.related_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"{
        "overview": "o",
        "sections": [{"title": "s", "content": "c"}],
        "codeExample": {"language": "rust", "code": "fn main() {}", "explanation": "e"},
        "quizzes": [{"question": "q", "options": ["a", "b"], "correctAnswer": 1, "explanation": "x"}],
        "assignment": {"title": "t", "description": "d", "requirements": ["r"], "difficulty": "Easy"}
    }"#;

    #[test]
    fn test_extract_json_strips_fence() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(fenced), "{\"a\": 1}");
        assert_eq!(extract_json("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_module_content() {
        let content = parse_module_content(CONTENT).unwrap();
        assert_eq!(content.quizzes[0].correct_answer, 1);
        assert!(content.code_example.is_some());
        assert_eq!(content.assignment.unwrap().requirements, vec!["r"]);
    }

    #[test]
    fn test_correct_answer_out_of_range_is_rejected() {
        let bad = CONTENT.replace("\"correctAnswer\": 1", "\"correctAnswer\": 5");
        assert!(matches!(parse_module_content(&bad), Err(ProviderError::Invalid(_))));
        let negative = CONTENT.replace("\"correctAnswer\": 1", "\"correctAnswer\": -1");
        assert!(matches!(parse_module_content(&negative), Err(ProviderError::Invalid(_))));
    }

    #[test]
    fn test_content_without_quizzes_is_rejected() {
        let text = r#"{"overview": "o", "sections": [], "quizzes": []}"#;
        assert!(parse_module_content(text).is_err());
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let text = r#"{"sections": [], "quizzes": []}"#;
        assert!(matches!(parse_module_content(text), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_parse_path_fills_request_fields() {
        let text = r#"{"modules": [{"title": "Intro", "description": "d", "topics": ["a"], "estimatedHours": 2}]}"#;
        let path = parse_learning_path(text, "Rust", Difficulty::Beginner, Some("Tokio")).unwrap();
        assert_eq!(path.topic, "Rust");
        assert_eq!(path.tech_stack.as_deref(), Some("Tokio"));
        assert_eq!(path.difficulty, Difficulty::Beginner);
        assert!(path.id.starts_with("path-"));
        assert_eq!(path.modules[0].status, None);
    }

    #[test]
    fn test_parse_path_rejects_empty_modules() {
        let text = r#"{"id": "x", "topic": "Rust", "difficulty": "Beginner", "modules": []}"#;
        assert!(parse_learning_path(text, "Rust", Difficulty::Beginner, None).is_err());
    }

    #[test]
    fn test_parse_resources_wrapped_and_ids() {
        let text = r#"{"resources": [
            {"title": "T", "author": "A", "type": "Book", "url": "u", "description": "d", "tags": []},
            {"id": "keep", "title": "T2", "author": "A", "type": "tool", "url": "u", "description": "d", "tags": ["x"]}
        ]}"#;
        let items = parse_resources(text).unwrap();
        assert!(items[0].id.starts_with("gen-"));
        assert_eq!(items[1].id, "keep");
        assert_eq!(items[1].resource_type, ResourceType::Tool);
    }

    #[test]
    fn test_parse_resources_unknown_type() {
        let text = r#"[{"title": "T", "author": "A", "type": "Podcast", "url": "u", "description": "d", "tags": []}]"#;
        assert!(matches!(parse_resources(text), Err(ProviderError::Invalid(_))));
    }

    #[test]
    fn test_parse_feedback_rejects_unknown_status() {
        let ok = r#"{"status": "Needs Improvement", "feedback": "f", "strengths": [], "improvements": ["i"]}"#;
        assert_eq!(parse_feedback(ok).unwrap().status, FeedbackStatus::NeedsImprovement);
        let bad = ok.replace("Needs Improvement", "Fail");
        assert!(parse_feedback(&bad).is_err());
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(parse_topic("   "), Err(ProviderError::EmptyResponse)));
    }
}
