use serde::{Deserialize, Serialize};

use crate::domain::types::{AnswerOption, MarksPerQuestion};

/// Textual form of the anonymous principal.
pub(crate) const ANONYMOUS_PRINCIPAL: &str = "2vxsx-fae";

/// Caller identity as established by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    principal: String,
    token: Option<String>,
}

impl Identity {
    pub(crate) fn new(principal: impl Into<String>, token: Option<String>) -> Self {
        Self { principal: principal.into(), token }
    }

    pub(crate) fn anonymous() -> Self {
        Self { principal: ANONYMOUS_PRINCIPAL.to_string(), token: None }
    }

    pub(crate) fn principal(&self) -> &str {
        &self.principal
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn is_anonymous(&self) -> bool {
        self.principal == ANONYMOUS_PRINCIPAL
    }
}

/// Reference to a blob already stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageRef {
    pub(crate) direct_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Question {
    pub(crate) id: u64,
    pub(crate) class_level: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) correct_answer: AnswerOption,
    pub(crate) marks: u32,
    /// Nanoseconds since the Unix epoch.
    pub(crate) created_at: i64,
    #[serde(default)]
    pub(crate) question_image: Option<ImageRef>,
}

/// Image bytes ready to be attached to a new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageUpload {
    pub(crate) bytes: Vec<u8>,
    pub(crate) mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewQuestion {
    pub(crate) class_level: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) image: Option<ImageUpload>,
    pub(crate) correct_answer: AnswerOption,
    pub(crate) marks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewTest {
    pub(crate) name: String,
    pub(crate) class_level: String,
    pub(crate) subject: String,
    pub(crate) duration_minutes: u32,
    pub(crate) marks_per_question: MarksPerQuestion,
    pub(crate) question_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserProfile {
    pub(crate) name: String,
}
