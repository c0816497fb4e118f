use crate::{
    AppState, handlers,
    policy::{OwnershipPolicy, enforce_ownership},
};
use axum::{
    Router, middleware,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Every route here expects the authentication layer that `create_router` wraps
/// around this router, so handlers and the ownership layer can rely on a verified
/// identity in the request.
///
/// Access Control Strategy:
/// Collection routes (`GET`/`POST`) only need an identity. Mutations on a single
/// resource (`PUT`/`DELETE /{id}`) sit in per-kind sub-routers whose `route_layer`
/// runs the ownership policy first, so a non-owner never reaches the handler.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let owned_images = Router::new()
        .route(
            "/images/{id}",
            put(handlers::edit_image).delete(handlers::delete_image),
        )
        .route_layer(middleware::from_fn_with_state(
            OwnershipPolicy::images(state.repo.clone()),
            enforce_ownership,
        ));

    let owned_comments = Router::new()
        .route(
            "/comments/{id}",
            put(handlers::edit_comment).delete(handlers::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            OwnershipPolicy::comments(state.repo.clone()),
            enforce_ownership,
        ));

    let owned_social_medias = Router::new()
        .route(
            "/socialmedias/{id}",
            put(handlers::edit_social_media).delete(handlers::delete_social_media),
        )
        .route_layer(middleware::from_fn_with_state(
            OwnershipPolicy::social_medias(state.repo.clone()),
            enforce_ownership,
        ));

    Router::<AppState>::new()
        // PUT/DELETE /users
        // Always acts on the caller's own account; no ID in the path.
        .route("/users", put(handlers::edit_user).delete(handlers::delete_user))
        // GET /images lists everyone's images, POST /images posts one as the caller.
        .route("/images", get(handlers::get_images).post(handlers::add_image))
        // GET /comments is scoped to the caller.
        .route("/comments", get(handlers::get_comments).post(handlers::add_comment))
        .route(
            "/socialmedias",
            get(handlers::get_social_medias).post(handlers::add_social_media),
        )
        .merge(owned_images)
        .merge(owned_comments)
        .merge(owned_social_medias)
}
