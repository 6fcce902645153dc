use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::domain::models::Identity;
use crate::services::navigation::{self, Access, Requirement};
use crate::services::role_resolver::{self, AuthState};

/// Caller identity from the bearer token, if any. A malformed or rejected
/// token is an error, a missing header is not.
pub(crate) struct MaybeIdentity(pub(crate) Option<Identity>);

/// Resolved role for any caller, authenticated or not.
pub(crate) struct CallerSession {
    pub(crate) identity: Option<Identity>,
    pub(crate) auth: AuthState,
}

/// Authenticated caller; anyone else is redirected home.
pub(crate) struct SignedIn {
    pub(crate) identity: Identity,
    pub(crate) auth: AuthState,
}

/// Allow-listed caller; students are redirected to their dashboard.
pub(crate) struct AdminCaller {
    pub(crate) identity: Identity,
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(MaybeIdentity(None));
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_identity_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(MaybeIdentity(Some(Identity::new(claims.sub, Some(token.to_string())))))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeIdentity(identity) = MaybeIdentity::from_request_parts(parts, state).await?;
        let auth = role_resolver::resolve(identity.as_ref(), state.allow_list());

        Ok(CallerSession { identity, auth })
    }
}

async fn require(
    parts: &mut Parts,
    state: &AppState,
    requirement: Requirement,
) -> Result<(Identity, AuthState), ApiError> {
    let CallerSession { identity, auth } = CallerSession::from_request_parts(parts, state).await?;

    match (navigation::guard(requirement, &auth), identity) {
        (Access::Allow, Some(identity)) => Ok((identity, auth)),
        (Access::Redirect { to }, _) => Err(ApiError::Redirect(to)),
        (Access::Allow, None) => Err(ApiError::Redirect(navigation::HOME_PATH)),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (identity, auth) = require(parts, state, Requirement::Authenticated).await?;
        Ok(SignedIn { identity, auth })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (identity, _) = require(parts, state, Requirement::Admin).await?;
        Ok(AdminCaller { identity })
    }
}
