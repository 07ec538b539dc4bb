//! Data models and structures
//!
//! Defines the cache key and entry types, inbound generation requests, and
//! the failure taxonomy every request path reports through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User-facing message for a prompt refused by the upstream safety system.
pub const SAFETY_REJECTION_MESSAGE: &str =
    "Your request was rejected by the AI safety system. Please try a different word or definition.";

/// Exact-match cache key. Fields are compared byte for byte, with no
/// trimming or case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    pub word: String,
    pub part_of_speech: String,
    pub definition: String,
}

impl CacheKey {
    pub fn new(
        word: impl Into<String>,
        part_of_speech: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            part_of_speech: part_of_speech.into(),
            definition: definition.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.word, self.part_of_speech)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(flatten)]
    pub key: CacheKey,
    pub image_reference: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, image_reference: String) -> Self {
        Self {
            key,
            image_reference,
            created_at: Utc::now(),
        }
    }
}

/// Inbound (word, part-of-speech, definition) triple, shared by the JSON body
/// of the generation endpoint and the query string of the lookup endpoint.
///
/// Missing fields deserialize as empty strings so validation can name them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationRequest {
    pub word: String,
    pub part_of_speech: String,
    pub definition: String,
}

impl GenerationRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.word.is_empty() {
            missing.push("word");
        }
        if self.definition.is_empty() {
            missing.push("definition");
        }
        missing
    }

    /// Validate required fields and convert into the exact-match cache key.
    pub fn into_key(self) -> Result<CacheKey, ServiceFailure> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            let verb = if missing.len() == 1 { "is" } else { "are" };
            return Err(ServiceFailure::new(
                FailureKind::Validation,
                format!("{} {} required", missing.join(" and "), verb),
            ));
        }
        Ok(CacheKey {
            word: self.word,
            part_of_speech: self.part_of_speech,
            definition: self.definition,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    CacheUnavailable,
    NotFound,
    ContentPolicyRejection,
    GeneratorFailure,
    Configuration,
}

/// A request-level failure carrying only a message that is safe to show the
/// caller. Diagnostic detail is logged where the failure is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cache_unavailable() -> Self {
        Self::new(FailureKind::CacheUnavailable, "cache unavailable")
    }

    pub fn not_found() -> Self {
        Self::new(FailureKind::NotFound, "Image not found in cache")
    }

    pub fn content_policy() -> Self {
        Self::new(FailureKind::ContentPolicyRejection, SAFETY_REJECTION_MESSAGE)
    }

    pub fn generator_failure() -> Self {
        Self::new(FailureKind::GeneratorFailure, "failed to generate image")
    }

    pub fn not_configured() -> Self {
        Self::new(FailureKind::Configuration, "OpenAI API key not configured")
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Outcome of one generation or lookup: the image reference, or a typed failure.
pub type GenerationResult = std::result::Result<String, ServiceFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_deserializes_missing_fields_as_empty() {
        let req: GenerationRequest = serde_json::from_str(r#"{"definition": "x"}"#).unwrap();
        assert_eq!(req.word, "");
        assert_eq!(req.part_of_speech, "");
        assert_eq!(req.missing_fields(), vec!["word"]);
    }

    #[test]
    fn test_into_key_names_missing_fields() {
        let err = GenerationRequest::default().into_key().unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(err.message, "word and definition are required");

        let err = GenerationRequest {
            word: "cat".to_string(),
            ..Default::default()
        }
        .into_key()
        .unwrap_err();
        assert_eq!(err.message, "definition is required");
    }

    #[test]
    fn test_into_key_keeps_fields_verbatim() {
        let key = GenerationRequest {
            word: " Cat ".to_string(),
            part_of_speech: "".to_string(),
            definition: "A small feline".to_string(),
        }
        .into_key()
        .unwrap();
        assert_eq!(key, CacheKey::new(" Cat ", "", "A small feline"));
    }

    #[test]
    fn test_cache_key_is_case_sensitive() {
        assert_ne!(
            CacheKey::new("Cat", "noun", "a pet"),
            CacheKey::new("cat", "noun", "a pet")
        );
    }

    #[test]
    fn test_cache_entry_serializes_flat_camel_case() {
        let entry = CacheEntry::new(
            CacheKey::new("cat", "noun", "a pet"),
            "https://img".to_string(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["partOfSpeech"], "noun");
        assert_eq!(json["imageReference"], "https://img");
        assert!(json.get("createdAt").is_some());
    }
}
