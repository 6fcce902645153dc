mod gallery;
mod questions;
mod users;


use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::api::guards::AdminCaller;
use crate::core::state::AppState;
use crate::schemas::session::AdminHomeResponse;

/// Slack for multipart framing and the text fields around the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub(crate) fn router(max_upload_bytes: u64) -> Router<AppState> {
    let question_body_limit =
        usize::try_from(max_upload_bytes).unwrap_or(usize::MAX).saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(admin_home))
        .route("/gallery", get(gallery::list))
        .route("/gallery/questions/:question_id", delete(gallery::delete_question))
        .route(
            "/questions",
            post(questions::create_question).layer(DefaultBodyLimit::max(question_body_limit)),
        )
        .route("/questions/:question_id", get(questions::get_question))
        .route("/create-test", post(create_test::submit))
        .route("/create-test/questions", get(create_test::candidate_questions))
        .route("/create-test/selection", get(create_test::selection).delete(create_test::reset_selection))
        .route("/create-test/selection/:question_id", post(create_test::toggle_selection))
        .route("/tests/:test_id/publish", post(create_test::publish))
        .route("/users/:principal/profile", get(users::get_user_profile))
        .route("/users/:principal/role", put(users::assign_role))
}

async fn admin_home(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
) -> Json<AdminHomeResponse> {
    tracing::debug!(
        principal = identity.principal(),
        admins = state.allow_list().len(),
        "Admin home requested"
    );

    Json(AdminHomeResponse {
        principal_id: identity.principal().to_string(),
        sections: vec!["gallery", "create-test"],
    })
}
