use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::AdminCaller;
use crate::core::state::AppState;
use crate::schemas::question::{
    GalleryQuery, GalleryResponse, QuestionDeletedResponse, QuestionResponse,
};
use crate::services::question_filter::{filter_questions, GalleryFilter, TagFilter};

pub(super) const LOAD_FAILURE: &str = "Failed to load questions. Please try again.";

pub(super) async fn list(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let questions = state
        .queries()
        .get_all_questions(&identity)
        .await
        .map_err(|e| ApiError::backend(e, LOAD_FAILURE))?;

    let filter = GalleryFilter::new(
        TagFilter::parse(query.class.as_deref()),
        TagFilter::parse(query.subject.as_deref()),
        query.chapter.as_deref().unwrap_or_default(),
    );
    let matched = filter_questions(&questions, &filter);

    Ok(Json(GalleryResponse {
        total: matched.len(),
        has_active_filters: filter.has_active_filters(),
        questions: matched.into_iter().map(QuestionResponse::from_question).collect(),
    }))
}

pub(super) async fn delete_question(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    Path(question_id): Path<u64>,
) -> Result<Json<QuestionDeletedResponse>, ApiError> {
    let deleted = state
        .queries()
        .delete_question(&identity, question_id)
        .await
        .map_err(|e| ApiError::backend(e, "Failed to delete question. Please try again."))?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Question {question_id} not found")));
    }

    tracing::info!(principal = identity.principal(), question_id, "Question deleted");
    Ok(Json(QuestionDeletedResponse { id: question_id, deleted }))
}
