use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

/// Claims
///
/// The payload signed into every bearer token. Decoding into this concrete type is
/// the shape check: a token missing `sub`, `email`, `iat` or `exp`, or carrying them
/// with the wrong JSON type, is rejected as malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID the token was issued to.
    pub sub: String,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Identity
///
/// The authenticated subject of a request, produced only by a successful
/// [`TokenService::verify`]. Handlers and services receive it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<Claims> for Identity {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or_else(malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(malformed)?;

        if claims.sub.trim().is_empty() {
            return Err(malformed());
        }

        Ok(Identity {
            subject_id: claims.sub,
            email: claims.email,
            issued_at,
            expires_at,
        })
    }
}

fn malformed() -> AppError {
    AppError::Unauthorized("the token is malformed".to_string())
}

/// TokenService
///
/// Issues and verifies HS256 bearer tokens. Built once at startup from the signing
/// secret in [`AppConfig`]; cloning shares nothing mutable.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let ttl = Duration::try_seconds(config.token_ttl_secs).unwrap_or(Duration::MAX);
        Self::new(&config.jwt_secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject_id: &str, email: &str) -> AppResult<String> {
        self.issue_at(subject_id, email, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, subject_id: &str, email: &str, now: DateTime<Utc>) -> AppResult<String> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry is out of range".to_string()))?;

        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> AppResult<Identity> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature, shape and expiry against an explicit clock.
    ///
    /// Expiry is checked here rather than by `jsonwebtoken` so the result depends only
    /// on the key, the token and `now`. A token is expired once `exp <= now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::warn!("token rejected: {}", e);
            AppError::Unauthorized("the token is invalid".to_string())
        })?;

        let identity = Identity::try_from(data.claims)?;

        if identity.expires_at <= now {
            tracing::warn!(subject = %identity.subject_id, "token rejected: expired");
            return Err(AppError::Unauthorized("the token has expired".to_string()));
        }

        Ok(identity)
    }
}
