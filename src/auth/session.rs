//! Session token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying only the subject username plus the
//! issued-at/expiry pair, so they are verifiable without a database lookup.
//! The signing key comes from [`Config::secret_key`](crate::config::Config);
//! there is no server-side session table and no revocation list.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Config, errors::Error as ServiceError};

/// Session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // Subject (username)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// Fine-grained validation failure, for logging and tests only.
///
/// The public surface collapses all of these into a generic
/// unauthenticated signal so a caller probing with bad tokens learns
/// nothing about why a token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed session token")]
    Malformed,
    #[error("bad session token signature")]
    BadSignature,
    #[error("session token expired")]
    Expired,
}

fn signing_secret(config: &Config) -> Result<&str, ServiceError> {
    config
        .secret_key
        .as_deref()
        .ok_or_else(|| ServiceError::Internal {
            operation: "sign session token: secret_key is required".to_string(),
        })
}

/// Create a signed session token for `subject`, expiring after the
/// configured session timeout (6 hours by default).
pub fn issue_session_token(
    subject: &str,
    now: DateTime<Utc>,
    config: &Config,
) -> Result<String, ServiceError> {
    let exp = now + config.auth.session.timeout;
    let claims = SessionClaims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    let key = EncodingKey::from_secret(signing_secret(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| ServiceError::Internal {
        operation: format!("create session token: {e}"),
    })
}

/// Decode and check a session token against the supplied clock.
///
/// The signature is verified before expiry is considered, so a tampered
/// token is always reported as [`TokenError::BadSignature`] even when its
/// claimed expiry has passed. The one exception is corruption in the header
/// segment itself: the header must decode before the signature can be
/// checked, so a flipped header byte surfaces as [`TokenError::Malformed`].
/// A token is valid through its exact expiry instant and rejected one
/// second after.
pub fn decode_session_token(
    token: &str,
    now: DateTime<Utc>,
    secret: &str,
) -> Result<SessionClaims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    // Expiry is checked against the caller's clock below, not the wall
    // clock inside jsonwebtoken.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
        // Structural problems: undecodable segments, wrong part count,
        // missing claims, unexpected algorithm
        _ => TokenError::Malformed,
    })?;

    if now.timestamp() > data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(data.claims)
}

/// Validate a session token, returning its subject.
///
/// Public surface: every failure becomes a generic unauthenticated error;
/// the fine-grained kind is only logged.
pub fn verify_session_token(
    token: &str,
    now: DateTime<Utc>,
    config: &Config,
) -> Result<String, ServiceError> {
    let secret = signing_secret(config)?;

    match decode_session_token(token, now, secret) {
        Ok(claims) => Ok(claims.sub),
        Err(kind) => {
            tracing::debug!("session token rejected: {kind}");
            Err(ServiceError::Unauthenticated { message: None })
        }
    }
}
