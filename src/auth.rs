use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    token::{Identity, TokenService},
};

/// AuthUser Extractor Result
///
/// The verified identity of the caller. Handlers on protected routes take it as an
/// argument; it can only be built from a token that [`TokenService`] accepted.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. An [`Identity`] already placed in the request extensions by [`auth_middleware`]
///    is reused, so the token is verified once per request.
/// 2. Otherwise the `Authorization: Bearer <token>` header is read and verified.
///
/// Rejection: [`AppError::Unauthorized`] (401, status `unauthenticated`) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let tokens = TokenService::from_ref(state);
        let identity = authenticate(&parts.headers, &tokens)?;
        Ok(AuthUser(identity))
    }
}

/// authenticate
///
/// The authentication gate as a pure function of the request headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> AppResult<Identity> {
    let token = bearer_token(headers)?;
    tokens.verify(token)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("sign in to proceed".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("the authorization header is invalid".to_string()))?;

    // The scheme name is case-insensitive.
    let token = match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => {
            return Err(AppError::Unauthorized(
                "the authorization header is invalid".to_string(),
            ));
        }
    };

    if token.is_empty() {
        return Err(AppError::Unauthorized("sign in to proceed".to_string()));
    }

    Ok(token)
}

/// auth_middleware
///
/// Guards every protected route. A request without a valid token is refused by the
/// `AuthUser` extractor before any handler, policy check or repository call runs.
/// On success the identity is stored in the request extensions for the layers and
/// handlers further in.
pub async fn auth_middleware(
    AuthUser(identity): AuthUser,
    mut request: Request,
    next: Next,
) -> Response {
    tracing::debug!(subject = %identity.subject_id, "request authenticated");
    request.extensions_mut().insert(identity);
    next.run(request).await
}
