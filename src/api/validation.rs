use std::path::Path;

use thiserror::Error;

use crate::api::errors::ApiError;
use crate::domain::models::{NewQuestion, NewTest};
use crate::domain::types::{AnswerOption, MarksPerQuestion};
use crate::schemas::practice_test::TestCreate;
use crate::schemas::question::QuestionForm;

/// Form problems caught before any backend call. Each maps to one message.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ValidationError {
    #[error("Test Name is required")]
    TestNameRequired,
    #[error("Class Level is required")]
    ClassLevelRequired,
    #[error("Subject is required")]
    SubjectRequired,
    #[error("Chapter is required")]
    ChapterRequired,
    #[error("Duration must be a positive number")]
    DurationNotPositive,
    #[error("Marks Per Question must be 1 or 2")]
    MarksPerQuestionInvalid,
    #[error("Please select at least one question")]
    NoQuestionsSelected,
    #[error("Marks must be a positive number")]
    MarksNotPositive,
    #[error("{0}")]
    CorrectAnswer(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Checks run in form order; the first failure wins.
pub(crate) fn validate_test_form(
    form: &TestCreate,
    selection: &[String],
) -> Result<NewTest, ValidationError> {
    let name = form.test_name.trim();
    if name.is_empty() {
        return Err(ValidationError::TestNameRequired);
    }
    if form.class_level.is_empty() {
        return Err(ValidationError::ClassLevelRequired);
    }
    if form.subject.is_empty() {
        return Err(ValidationError::SubjectRequired);
    }

    let duration_minutes = form
        .duration
        .filter(|minutes| *minutes > 0)
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or(ValidationError::DurationNotPositive)?;

    let marks_per_question = form
        .marks_per_question
        .and_then(MarksPerQuestion::from_value)
        .ok_or(ValidationError::MarksPerQuestionInvalid)?;

    if selection.is_empty() {
        return Err(ValidationError::NoQuestionsSelected);
    }

    Ok(NewTest {
        name: name.to_string(),
        class_level: form.class_level.clone(),
        subject: form.subject.clone(),
        duration_minutes,
        marks_per_question,
        question_ids: selection.to_vec(),
    })
}

/// Validates the text fields of the create-question form; the image is
/// attached by the caller after compression.
pub(crate) fn validate_question_form(form: &QuestionForm) -> Result<NewQuestion, ValidationError> {
    let class_level = form.class_level.trim();
    if class_level.is_empty() {
        return Err(ValidationError::ClassLevelRequired);
    }
    let subject = form.subject.trim();
    if subject.is_empty() {
        return Err(ValidationError::SubjectRequired);
    }
    let chapter = form.chapter.trim();
    if chapter.is_empty() {
        return Err(ValidationError::ChapterRequired);
    }

    let correct_answer =
        form.correct_answer.parse::<AnswerOption>().map_err(ValidationError::CorrectAnswer)?;

    let marks = form
        .marks
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|marks| *marks >= 1)
        .ok_or(ValidationError::MarksNotPositive)?;

    Ok(NewQuestion {
        class_level: class_level.to_string(),
        subject: subject.to_string(),
        chapter: chapter.to_string(),
        image: None,
        correct_answer,
        marks,
    })
}

pub(crate) fn validate_image_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        _ => false,
    }
}
