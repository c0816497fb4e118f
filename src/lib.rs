use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod policy;
pub mod repository;
pub mod response;
pub mod services;
pub mod token;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};
pub use token::{Identity, TokenService};

/// ApiDoc
///
/// Generates the OpenAPI document served at `/api-docs/openapi.json` from the
/// `#[utoipa::path]` handlers and `ToSchema` models.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::register_user, handlers::users::login_user,
        handlers::users::edit_user, handlers::users::delete_user,
        handlers::images::get_images, handlers::images::add_image,
        handlers::images::edit_image, handlers::images::delete_image,
        handlers::comments::get_comments, handlers::comments::add_comment,
        handlers::comments::edit_comment, handlers::comments::delete_comment,
        handlers::social_medias::get_social_medias, handlers::social_medias::add_social_media,
        handlers::social_medias::edit_social_media, handlers::social_medias::delete_social_media,
    ),
    components(
        schemas(
            models::Image, models::Comment, models::SocialMedia,
            models::RegisterUserRequest, models::LoginRequest, models::EditUserRequest,
            models::CreateImageRequest, models::EditImageRequest,
            models::CreateCommentRequest, models::EditCommentRequest,
            models::CreateSocialMediaRequest, models::EditSocialMediaRequest,
            models::RegisteredUser, models::LoggedInUser, models::EditedUser,
            models::AuthorSummary, models::ImageWithAuthor, models::AddedImage, models::EditedImage,
            models::CommentAuthor, models::CommentImage, models::CommentWithRelations,
            models::AddedComment, models::SocialMediaOwner, models::SocialMediaWithOwner,
            models::SocialMediaList, models::AddedSocialMedia, models::EditedSocialMedia,
            response::ApiMessage, error::ErrorBody,
        )
    ),
    tags(
        (name = "users", description = "Accounts and sign-in"),
        (name = "images", description = "Posted images"),
        (name = "comments", description = "Comments on images"),
        (name = "socialmedias", description = "Social-media links")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The shared, immutable container handed to every request: the persistence layer,
/// the token service and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub tokens: TokenService,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state from a repository and a configuration, deriving the token
    /// service from the configured secret and TTL.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            tokens: TokenService::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree, the access-control layers and the observability
/// stack, and binds the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Authentication runs outermost on the protected routes: the ownership layers
        // inside `authenticated_routes` only ever see verified requests.
        .merge(
            authenticated::authenticated_routes(&state).route_layer(
                middleware::from_fn_with_state(state.clone(), auth::auth_middleware),
            ),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span carrying method, URI and the `x-request-id` set by
/// `SetRequestIdLayer`, so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
