use axum::{extract::State, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::SignedIn;
use crate::core::state::AppState;
use crate::domain::models::UserProfile;
use crate::schemas::profile::{BackendRoleResponse, ProfileResponse, ProfileUpdate};

const PROFILE_FAILURE: &str = "Failed to load profile. Please try again.";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(save_profile))
        .route("/backend-role", get(backend_role))
}

async fn get_profile(
    SignedIn { identity, .. }: SignedIn,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .queries()
        .get_caller_user_profile(&identity)
        .await
        .map_err(|e| ApiError::backend(e, PROFILE_FAILURE))?;

    Ok(Json(ProfileResponse { principal_id: identity.principal().to_string(), profile }))
}

async fn save_profile(
    SignedIn { identity, .. }: SignedIn,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let profile = UserProfile { name: payload.name.trim().to_string() };
    state
        .queries()
        .save_caller_user_profile(&identity, &profile)
        .await
        .map_err(|e| ApiError::backend(e, "Failed to save profile. Please try again."))?;

    Ok(Json(ProfileResponse {
        principal_id: identity.principal().to_string(),
        profile: Some(profile),
    }))
}

/// Role as the backend sees it. Informational only; portal access follows
/// the admin allow-list.
async fn backend_role(
    SignedIn { identity, .. }: SignedIn,
    State(state): State<AppState>,
) -> Result<Json<BackendRoleResponse>, ApiError> {
    let queries = state.queries();
    let role = queries
        .get_caller_user_role(&identity)
        .await
        .map_err(|e| ApiError::backend(e, PROFILE_FAILURE))?;
    let is_admin = queries
        .is_caller_admin(&identity)
        .await
        .map_err(|e| ApiError::backend(e, PROFILE_FAILURE))?;

    Ok(Json(BackendRoleResponse { role, is_admin }))
}
