use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::AdminCaller;
use crate::api::validation::{validate_image_upload, validate_question_form};
use crate::core::state::AppState;
use crate::domain::models::ImageUpload;
use crate::schemas::question::{
    ImageSummary, QuestionCreatedResponse, QuestionForm, QuestionResponse,
};
use crate::services::image_compression::{self, CompressionOptions};

struct RawImage {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

pub(super) async fn create_question(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<QuestionCreatedResponse>), ApiError> {
    let uploads = state.settings().uploads();
    let max_bytes = uploads.max_upload_bytes();

    let mut form = QuestionForm::default();
    let mut raw_image: Option<RawImage> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" | "question_image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type =
                    field.content_type().unwrap_or("application/octet-stream").to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read image".to_string()))?
                {
                    if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                        return Err(ApiError::BadRequest(format!(
                            "File size exceeds {}MB limit",
                            uploads.max_upload_size_mb
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    raw_image = Some(RawImage { filename, content_type, bytes });
                }
            }
            "class_level" | "classLevel" => form.class_level = read_text(field).await?,
            "subject" => form.subject = read_text(field).await?,
            "chapter" => form.chapter = read_text(field).await?,
            "correct_answer" | "correctAnswer" => form.correct_answer = read_text(field).await?,
            "marks" => form.marks = read_text(field).await?,
            _ => {}
        }
    }

    let mut question = validate_question_form(&form)?;

    let mut summary = None;
    if let Some(raw) = raw_image {
        validate_image_upload(&raw.filename, &raw.content_type, &uploads.allowed_image_extensions)?;

        let original_size = raw.bytes.len();
        let mime_type = raw.content_type.trim().to_ascii_lowercase();
        let options = CompressionOptions::from(state.settings().compression());
        let compressed = image_compression::compress(raw.bytes, &mime_type, options)
            .await
            .map_err(ApiError::compression)?;

        summary = Some(ImageSummary::new(original_size, &compressed));
        question.image =
            Some(ImageUpload { bytes: compressed.bytes, mime_type: compressed.mime_type });
    }

    state
        .queries()
        .create_question(&identity, &question)
        .await
        .map_err(|e| ApiError::backend(e, "Failed to create question. Please try again."))?;

    tracing::info!(
        principal = identity.principal(),
        class_level = %question.class_level,
        subject = %question.subject,
        has_image = question.image.is_some(),
        "Question created"
    );

    Ok((
        StatusCode::CREATED,
        Json(QuestionCreatedResponse { message: "Question created successfully", image: summary }),
    ))
}

pub(super) async fn get_question(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    Path(question_id): Path<u64>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = state
        .queries()
        .get_question(&identity, question_id)
        .await
        .map_err(|e| ApiError::backend(e, super::gallery::LOAD_FAILURE))?
        .ok_or_else(|| ApiError::NotFound(format!("Question {question_id} not found")))?;

    Ok(Json(QuestionResponse::from_question(&question)))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|_| ApiError::BadRequest("Invalid form field".to_string()))
}
