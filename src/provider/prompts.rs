//! Prompt builders for each content operation
//!
//! Every prompt ends with the exact JSON shape expected back, since
//! OpenAI-compatible endpoints only guarantee "some JSON object".

use crate::types::Difficulty;

pub const SYSTEM_PROMPT: &str = "You are an expert curriculum designer and technical tutor. \
Respond with a single JSON object only, no prose and no markdown.";

const PATH_SHAPE: &str = r#"{
  "id": string,
  "topic": string,
  "difficulty": "Beginner" | "Intermediate" | "Advanced",
  "techStack": string,
  "modules": [
    { "title": string, "description": string, "topics": [string], "estimatedHours": number }
  ]
}"#;

const CONTENT_SHAPE: &str = r#"{
  "overview": string,
  "sections": [ { "title": string, "content": string } ],
  "codeExample": { "language": string, "code": string, "explanation": string },
  "quizzes": [
    { "question": string, "options": [string], "correctAnswer": integer (zero-based index into options), "explanation": string }
  ],
  "assignment": { "title": string, "description": string, "requirements": [string], "difficulty": string }
}"#;

const FEEDBACK_SHAPE: &str = r#"{
  "status": "Pass" | "Needs Improvement",
  "feedback": string,
  "strengths": [string],
  "improvements": [string]
}"#;

const RESOURCES_SHAPE: &str = r#"{
  "resources": [
    { "id": string, "title": string, "author": string, "type": "Book" | "Course" | "Paper" | "Tool", "url": string, "description": string, "tags": [string] }
  ]
}"#;

const TOPIC_SHAPE: &str = r#"{
  "name": string,
  "description": string,
  "subtopics": [string],
  "relatedFields": [string]
}"#;

fn with_shape(body: String, shape: &str) -> String {
    format!("{}\n\nRespond with JSON matching exactly this shape:\n{}", body, shape)
}

pub fn learning_path(topic: &str, difficulty: Difficulty, tech_stack: Option<&str>) -> String {
    let mut body = format!(
        "Create a detailed learning path for \"{}\" at a \"{}\" level.\n",
        topic, difficulty
    );
    if let Some(stack) = tech_stack {
        body.push_str(&format!(
            "Focus specifically on using the \"{}\" technology/framework.\n",
            stack
        ));
    }
    body.push_str("The modules should be sequential and build upon each other.");
    with_shape(body, PATH_SHAPE)
}

pub fn module_content(
    topic: &str,
    module_title: &str,
    difficulty: Difficulty,
    tech_stack: Option<&str>,
) -> String {
    let body = format!(
        "Create a concise, high-quality tutorial for the module \"{title}\" which is part of the course \"{topic}\" ({difficulty} level).\n\n\
         Context:\n- Tech Stack: {stack}\n\n\
         Requirements:\n\
         1. A clear, brief overview.\n\
         2. 2-3 focused sections explaining core concepts.\n\
         3. A relevant code example (using {lang}).\n\
         4. 3 Quiz questions to test understanding.\n\
         5. A \"Practical Assignment\" challenge.",
        title = module_title,
        topic = topic,
        difficulty = difficulty,
        stack = tech_stack.unwrap_or("General/Agnostic"),
        lang = tech_stack.unwrap_or("Python"),
    );
    with_shape(body, CONTENT_SHAPE)
}

pub fn evaluation(title: &str, requirements: &[String], submission: &str) -> String {
    let body = format!(
        "Evaluate the user's submission for \"{}\".\nRequirements: {}.\nSubmission:\n{}",
        title,
        requirements.join(", "),
        submission
    );
    with_shape(body, FEEDBACK_SHAPE)
}

pub fn resources(category: &str) -> String {
    with_shape(format!("Recommend 5 learning resources for: \"{}\".", category), RESOURCES_SHAPE)
}

pub fn topic_overview(topic_name: &str) -> String {
    with_shape(
        format!(
            "Analyze the topic '{}'. Provide description, subtopics, and related fields.",
            topic_name
        ),
        TOPIC_SHAPE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prompt_mentions_stack_only_when_given() {
        let with = learning_path("Rust", Difficulty::Beginner, Some("Tokio"));
        assert!(with.contains("\"Tokio\""));
        let without = learning_path("Rust", Difficulty::Beginner, None);
        assert!(!without.contains("technology/framework"));
        assert!(without.contains("\"modules\""));
    }

    #[test]
    fn test_content_prompt_defaults() {
        let prompt = module_content("Rust", "Ownership", Difficulty::Intermediate, None);
        assert!(prompt.contains("General/Agnostic"));
        assert!(prompt.contains("Intermediate level"));
        assert!(prompt.contains("correctAnswer"));
    }
}
