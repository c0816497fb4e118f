use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; touches neither the token service nor the store.
        .route("/health", get(|| async { "ok" }))
        // POST /users/register
        .route("/users/register", post(handlers::register_user))
        // POST /users/login
        // Returns a bearer token for the protected routes.
        .route("/users/login", post(handlers::login_user))
}
