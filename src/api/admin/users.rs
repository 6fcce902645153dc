use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::AdminCaller;
use crate::core::state::AppState;
use crate::schemas::profile::{ProfileResponse, RoleAssignment, RoleAssignedResponse};

pub(super) async fn get_user_profile(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .queries()
        .get_user_profile(&identity, &principal)
        .await
        .map_err(|e| ApiError::backend(e, "Failed to load profile. Please try again."))?;

    Ok(Json(ProfileResponse { principal_id: principal, profile }))
}

/// Writes the backend-side role only; portal admin rights stay with the allow-list.
pub(super) async fn assign_role(
    AdminCaller { identity }: AdminCaller,
    State(state): State<AppState>,
    Path(principal): Path<String>,
    Json(payload): Json<RoleAssignment>,
) -> Result<Json<RoleAssignedResponse>, ApiError> {
    state
        .queries()
        .assign_caller_user_role(&identity, &principal, payload.role)
        .await
        .map_err(|e| ApiError::backend(e, "Failed to assign role. Please try again."))?;

    tracing::info!(
        principal = identity.principal(),
        target = %principal,
        role = ?payload.role,
        "Backend role assigned"
    );
    Ok(Json(RoleAssignedResponse { principal_id: principal, role: payload.role }))
}
