//! Wire and data types shared by the core and every front end.
//!
//! These mirror the JSON bodies of the PharmaGPT service (`POST /chat`,
//! `POST /search`, `GET /`) and the messages kept in a chat transcript.

use serde::{Deserialize, Serialize};

/// The author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "PharmaGPT",
        }
    }
}

/// Retrieval metadata attached to an assistant answer.
///
/// The service forwards whatever metadata its vector store holds, so only
/// `name` is read and even that may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: Option<String>,
}

impl Source {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Label shown for the source at `index` (0-based) in an answer
    pub fn label(&self, index: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Source {}", index + 1),
        }
    }
}

/// One entry of a chat transcript. Never mutated once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

/// A transcript entry as sent back to the service: role and content only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub text: String,
    pub top_k: u32,
}

/// A ranked medicine returned by `POST /search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub benefits: String,
    #[serde(default)]
    pub side_effects: String,
    #[serde(default)]
    pub safety_advice: String,
    /// Distance from the query; lower is more relevant
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WelcomeResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_serializes_lowercase() {
        let entry = HistoryEntry {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_chat_response_tolerates_null_sources() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"answer": "Rest", "sources": null}"#).unwrap();
        assert_eq!(response.answer, "Rest");
        assert_eq!(response.sources, None);
    }

    #[test]
    fn test_source_ignores_extra_metadata() {
        let sources: Vec<Source> = serde_json::from_str(
            r#"[{"name": "Ibuprofen", "benefits": "pain"}, {"category": "NSAID"}]"#,
        )
        .unwrap();
        assert_eq!(sources[0].label(0), "Ibuprofen");
        assert_eq!(sources[1].label(1), "Source 2");
    }

    #[test]
    fn test_search_result_parses_service_shape() {
        let results: Vec<SearchResult> = serde_json::from_str(
            r#"[{"name": "Paracetamol", "benefits": "Fever", "side_effects": "Rare",
                 "safety_advice": "Max 4g/day", "relevance_score": 0.42}]"#,
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Paracetamol");
        assert!((results[0].relevance_score - 0.42).abs() < f64::EPSILON);
    }
}
