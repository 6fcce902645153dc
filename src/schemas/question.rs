use serde::{Deserialize, Serialize};

use crate::core::time::format_backend_nanos;
use crate::domain::models::Question;
use crate::domain::types::AnswerOption;
use crate::services::image_compression::CompressedImage;
use crate::services::question_filter::SelectionSet;

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: u64,
    pub(crate) class_level: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) correct_answer: AnswerOption,
    pub(crate) marks: u32,
    pub(crate) created_at: Option<String>,
    pub(crate) image_url: Option<String>,
}

impl QuestionResponse {
    pub(crate) fn from_question(question: &Question) -> Self {
        Self {
            id: question.id,
            class_level: question.class_level.clone(),
            subject: question.subject.clone(),
            chapter: question.chapter.clone(),
            correct_answer: question.correct_answer,
            marks: question.marks,
            created_at: format_backend_nanos(question.created_at),
            image_url: question.question_image.as_ref().map(|image| image.direct_url.clone()),
        }
    }
}

/// Raw text fields of the create-question form, before validation.
#[derive(Debug, Default)]
pub(crate) struct QuestionForm {
    pub(crate) class_level: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) correct_answer: String,
    pub(crate) marks: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageSummary {
    pub(crate) mime_type: String,
    pub(crate) size_bytes: usize,
    pub(crate) original_size_bytes: usize,
    pub(crate) recompressed: bool,
}

impl ImageSummary {
    pub(crate) fn new(original_size_bytes: usize, image: &CompressedImage) -> Self {
        Self {
            mime_type: image.mime_type.clone(),
            size_bytes: image.bytes.len(),
            original_size_bytes,
            recompressed: image.recompressed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionCreatedResponse {
    pub(crate) message: &'static str,
    pub(crate) image: Option<ImageSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GalleryQuery {
    #[serde(default, alias = "class_level", alias = "classLevel")]
    pub(crate) class: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) chapter: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GalleryResponse {
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) total: usize,
    pub(crate) has_active_filters: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionDeletedResponse {
    pub(crate) id: u64,
    pub(crate) deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BuilderQuery {
    #[serde(default, alias = "classLevel")]
    pub(crate) class_level: String,
    #[serde(default)]
    pub(crate) subject: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BuilderQuestionsResponse {
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) selected: SelectionSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct SelectionResponse {
    pub(crate) question_id: String,
    pub(crate) selected: bool,
    pub(crate) selection: SelectionSet,
}
