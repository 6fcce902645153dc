use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("identity token encoding failed")]
    TokenEncoding,
    #[error("identity token rejected")]
    TokenRejected,
    #[error("unsupported identity token algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims carried by identity provider tokens; `sub` is the caller's textual principal.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IdentityClaims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
}

pub(crate) fn issue_identity_token(
    principal: &str,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let lifetime = expires_in.unwrap_or_else(|| {
        Duration::minutes(settings.security().dev_token_expire_minutes as i64)
    });
    let claims = IdentityClaims {
        sub: principal.to_string(),
        exp: (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
    };

    encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().identity_secret.as_bytes()),
    )
    .map_err(|_| SecurityError::TokenEncoding)
}

pub(crate) fn verify_identity_token(
    token: &str,
    settings: &Settings,
) -> Result<IdentityClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    let claims = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(settings.security().identity_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::TokenRejected)?;

    if claims.sub.trim().is_empty() {
        return Err(SecurityError::TokenRejected);
    }

    Ok(claims)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
