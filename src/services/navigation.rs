use serde::Serialize;

use crate::services::role_resolver::AuthState;

pub(crate) const HOME_PATH: &str = "/";
pub(crate) const DASHBOARD_PATH: &str = "/dashboard";

/// Pages of the portal's navigable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    Home,
    About,
    Dashboard,
    Admin,
    AdminGallery,
    AdminCreateTest,
    Test(String),
    Result(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requirement {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "lowercase")]
pub(crate) enum Access {
    Allow,
    Redirect { to: &'static str },
}

impl Route {
    pub(crate) fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        if normalized.is_empty() {
            return trimmed.starts_with('/').then_some(Self::Home);
        }

        let segments: Vec<&str> = normalized.strip_prefix('/')?.split('/').collect();
        match segments.as_slice() {
            ["about"] => Some(Self::About),
            ["dashboard"] => Some(Self::Dashboard),
            ["admin"] => Some(Self::Admin),
            ["admin", "gallery"] => Some(Self::AdminGallery),
            ["admin", "create-test"] => Some(Self::AdminCreateTest),
            ["test", id] if !id.is_empty() => Some(Self::Test((*id).to_string())),
            ["result", id] if !id.is_empty() => Some(Self::Result((*id).to_string())),
            _ => None,
        }
    }

    pub(crate) fn requirement(&self) -> Requirement {
        match self {
            Self::Home | Self::About | Self::Test(_) | Self::Result(_) => Requirement::Public,
            Self::Dashboard => Requirement::Authenticated,
            Self::Admin | Self::AdminGallery | Self::AdminCreateTest => Requirement::Admin,
        }
    }
}

/// Unauthenticated callers land on the home page, non-admins on their dashboard.
pub(crate) fn guard(requirement: Requirement, auth: &AuthState) -> Access {
    match requirement {
        Requirement::Public => Access::Allow,
        Requirement::Authenticated | Requirement::Admin if !auth.is_authenticated => {
            Access::Redirect { to: HOME_PATH }
        }
        Requirement::Admin if !auth.is_admin() => Access::Redirect { to: DASHBOARD_PATH },
        Requirement::Authenticated | Requirement::Admin => Access::Allow,
    }
}
