use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Opening message of every conversation.
pub const GREETING: &str = "Hi! I'm your Bitcoin AI Tutor. What would you like to learn about?";

/// Suggestions shown under the greeting.
pub const GREETING_REPLIES: &[&str] = &[
    "What is Bitcoin?",
    "How does mining work?",
    "Explain Lightning Network",
    "Bitcoin vs Altcoins",
];

const MAX_QUICK_REPLIES: usize = 3;

/// Coarse classification used for styling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Question,
    Explanation,
    Code,
    Error,
    Success,
}

/// A fenced code block found in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// One entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub is_user: bool,
    /// Display name of the model involved, if any.
    pub model: Option<String>,
    pub timestamp_millis: u64,
    pub category: Option<Category>,
    #[serde(default)]
    pub code_blocks: Vec<CodeBlock>,
    #[serde(default)]
    pub quick_replies: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>, model: Option<String>, now: u64) -> Self {
        let text = text.into();
        Self {
            id: new_id(),
            category: Some(determine_category(&text)),
            code_blocks: parse_code_blocks(&text),
            text,
            is_user: true,
            model,
            timestamp_millis: now,
            quick_replies: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, model: Option<String>, now: u64) -> Self {
        let text = text.into();
        Self {
            id: new_id(),
            category: Some(determine_category(&text)),
            code_blocks: parse_code_blocks(&text),
            quick_replies: generate_quick_replies(&text),
            text,
            is_user: false,
            model,
            timestamp_millis: now,
        }
    }

    pub fn greeting(now: u64) -> Self {
        Self {
            id: new_id(),
            text: GREETING.into(),
            is_user: false,
            model: None,
            timestamp_millis: now,
            category: None,
            code_blocks: Vec::new(),
            quick_replies: GREETING_REPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(\w+)?\n([\s\S]*?)```").expect("code fence pattern"))
}

fn topic_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(Bitcoin|blockchain|mining|Lightning Network|wallet|node|transaction)\b")
            .expect("topic pattern")
    })
}

/// Fenced code blocks in order of appearance. Untagged fences are `plaintext`.
pub fn parse_code_blocks(text: &str) -> Vec<CodeBlock> {
    code_fence()
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language: caps.get(1).map_or("plaintext", |m| m.as_str()).to_string(),
            code: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        })
        .collect()
}

/// First matching rule wins: `?`, then a code fence, then error, then success markers.
pub fn determine_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    if text.contains('?') {
        Category::Question
    } else if text.contains("```") {
        Category::Code
    } else if lower.contains("error") || text.contains('❌') {
        Category::Error
    } else if lower.contains("success") || text.contains('✅') {
        Category::Success
    } else {
        Category::Explanation
    }
}

/// Up to three follow-up prompts for topics mentioned in a reply, in order of first
/// mention.
pub fn generate_quick_replies(response: &str) -> Vec<String> {
    let mut replies: Vec<String> = Vec::new();
    for m in topic_words().find_iter(response) {
        let reply = format!("Tell me more about {}", m.as_str());
        if !replies.contains(&reply) {
            replies.push(reply);
        }
        if replies.len() == MAX_QUICK_REPLIES {
            break;
        }
    }
    replies
}
