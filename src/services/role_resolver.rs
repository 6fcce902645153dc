use std::collections::HashSet;

use serde::Serialize;

use crate::domain::models::Identity;
use crate::domain::types::Role;

/// Principals granted the admin role. Built once from settings and handed to
/// whoever resolves roles.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdminAllowList {
    principals: HashSet<String>,
}

impl AdminAllowList {
    pub(crate) fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { principals: principals.into_iter().map(Into::into).collect() }
    }

    pub(crate) fn contains(&self, principal: &str) -> bool {
        self.principals.contains(principal)
    }

    pub(crate) fn len(&self) -> usize {
        self.principals.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AuthState {
    pub(crate) is_authenticated: bool,
    pub(crate) principal_id: Option<String>,
    pub(crate) role: Role,
}

impl AuthState {
    pub(crate) fn unauthenticated() -> Self {
        Self { is_authenticated: false, principal_id: None, role: Role::Student }
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.is_authenticated && self.role == Role::Admin
    }
}

pub(crate) fn resolve(identity: Option<&Identity>, allow_list: &AdminAllowList) -> AuthState {
    let Some(identity) = identity.filter(|identity| !identity.is_anonymous()) else {
        return AuthState::unauthenticated();
    };

    let principal = identity.principal();
    let role = if allow_list.contains(principal) { Role::Admin } else { Role::Student };

    tracing::debug!(principal = %principal, role = role.as_str(), "Resolved caller role");

    AuthState { is_authenticated: true, principal_id: Some(principal.to_string()), role }
}
