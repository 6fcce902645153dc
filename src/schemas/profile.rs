use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::models::UserProfile;
use crate::domain::types::BackendRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[validate(length(min = 1, max = 120, message = "name must be 1..120 characters"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    pub(crate) principal_id: String,
    pub(crate) profile: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BackendRoleResponse {
    pub(crate) role: BackendRole,
    pub(crate) is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleAssignment {
    pub(crate) role: BackendRole,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleAssignedResponse {
    pub(crate) principal_id: String,
    pub(crate) role: BackendRole,
}
