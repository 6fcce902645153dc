use serde::{Deserialize, Serialize};

use crate::services::navigation::Access;

#[derive(Debug, Deserialize)]
pub(crate) struct NavigationQuery {
    pub(crate) path: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NavigationResponse {
    pub(crate) path: String,
    #[serde(flatten)]
    pub(crate) access: Access,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    pub(crate) principal_id: String,
    pub(crate) is_admin: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminHomeResponse {
    pub(crate) principal_id: String,
    pub(crate) sections: Vec<&'static str>,
}

/// Pages that exist in navigation but have no content yet.
#[derive(Debug, Serialize)]
pub(crate) struct PlaceholderResponse {
    pub(crate) page: &'static str,
    pub(crate) id: Option<String>,
    pub(crate) message: &'static str,
}
