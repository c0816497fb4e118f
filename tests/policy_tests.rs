use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    middleware,
    routing::delete,
};
use chrono::{Duration, Utc};
use photogram::{
    AppConfig, AppError, AppResult, AppState, InMemoryRepository, create_router,
    models::{CreateImageRequest, RegisterUserRequest, ResourceKind},
    policy::{OwnerLookup, OwnershipPolicy, enforce_ownership},
    repository::Repository,
    services,
    token::Identity,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tower::ServiceExt;

// --- Mock Owner Lookup ---

/// Resource ID -> owner ID, plus a count of lookups performed.
#[derive(Default)]
struct MapOwners {
    owners: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl MapOwners {
    fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            owners: entries
                .iter()
                .map(|(id, owner)| (id.to_string(), owner.to_string()))
                .collect(),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OwnerLookup for MapOwners {
    async fn owner_of(&self, id: &str) -> AppResult<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.owners.get(id).cloned())
    }
}

struct FailingLookup;

#[async_trait]
impl OwnerLookup for FailingLookup {
    async fn owner_of(&self, _id: &str) -> AppResult<Option<String>> {
        Err(AppError::Timeout)
    }
}

fn identity(subject_id: &str) -> Identity {
    Identity {
        subject_id: subject_id.to_string(),
        email: format!("{subject_id}@example.com"),
        issued_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn image_policy(lookup: Arc<MapOwners>) -> OwnershipPolicy {
    OwnershipPolicy::new(ResourceKind::Image, lookup)
}

// --- Policy Core ---

#[tokio::test]
async fn test_owner_is_allowed() {
    let policy = image_policy(Arc::new(MapOwners::with(&[("image-1", "user-a")])));

    assert!(policy.authorize("image-1", &identity("user-a")).await.is_ok());
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let policy = image_policy(Arc::new(MapOwners::with(&[("image-1", "user-a")])));

    let err = policy.authorize("image-1", &identity("user-b")).await.unwrap_err();

    match err {
        AppError::Forbidden(message) => {
            assert_eq!(message, "you don't have permission to view or edit this image")
        }
        other => panic!("expected Forbidden, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_resource_is_not_found_for_everyone() {
    let policy = image_policy(Arc::new(MapOwners::with(&[("image-1", "user-a")])));

    for caller in ["user-a", "user-b"] {
        let err = policy.authorize("image-404", &identity(caller)).await.unwrap_err();
        match err {
            AppError::NotFound(message) => {
                assert_eq!(message, "image with id image-404 doesn't exist")
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_lookup_failures_propagate() {
    let policy = OwnershipPolicy::new(ResourceKind::Comment, Arc::new(FailingLookup));

    let err = policy.authorize("comment-1", &identity("user-a")).await.unwrap_err();

    assert!(matches!(err, AppError::Timeout));
}

#[tokio::test]
async fn test_kind_names_the_resource_in_messages() {
    let policy = OwnershipPolicy::new(
        ResourceKind::SocialMedia,
        Arc::new(MapOwners::with(&[("socialmedia-1", "user-a")])),
    );

    let err = policy
        .authorize("socialmedia-1", &identity("user-b"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "you don't have permission to view or edit this social media"
    );
    assert_eq!(policy.kind(), ResourceKind::SocialMedia);
}

// --- Middleware Adapter ---

fn guarded_router(
    policy: OwnershipPolicy,
    reached: Arc<AtomicUsize>,
    caller: Option<Identity>,
) -> Router {
    let router = Router::new()
        .route(
            "/images/{id}",
            delete(move || {
                let reached = reached.clone();
                async move {
                    reached.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        )
        .route_layer(middleware::from_fn_with_state(policy, enforce_ownership));

    // Stands in for the authentication gate.
    router.layer(middleware::from_fn(
        move |mut request: Request<Body>, next: middleware::Next| {
            let caller = caller.clone();
            async move {
                if let Some(identity) = caller {
                    request.extensions_mut().insert(identity);
                }
                next.run(request).await
            }
        },
    ))
}

async fn send_delete(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_middleware_stops_non_owner_before_handler() {
    let lookup = Arc::new(MapOwners::with(&[("image-1", "user-a")]));
    let reached = Arc::new(AtomicUsize::new(0));
    let router = guarded_router(image_policy(lookup.clone()), reached.clone(), Some(identity("user-b")));

    let (status, body) = send_delete(router, "/images/image-1").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "unauthorized");
    assert_eq!(reached.load(Ordering::SeqCst), 0);
    assert_eq!(lookup.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_middleware_lets_owner_through() {
    let lookup = Arc::new(MapOwners::with(&[("image-1", "user-a")]));
    let reached = Arc::new(AtomicUsize::new(0));
    let router = guarded_router(image_policy(lookup), reached.clone(), Some(identity("user-a")));

    let (status, _) = send_delete(router, "/images/image-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reached.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_middleware_reports_missing_resource() {
    let lookup = Arc::new(MapOwners::default());
    let reached = Arc::new(AtomicUsize::new(0));
    let router = guarded_router(image_policy(lookup), reached.clone(), Some(identity("user-a")));

    let (status, body) = send_delete(router, "/images/image-9").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "image with id image-9 doesn't exist");
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_middleware_without_identity_is_unauthenticated() {
    let lookup = Arc::new(MapOwners::with(&[("image-1", "user-a")]));
    let reached = Arc::new(AtomicUsize::new(0));
    let router = guarded_router(image_policy(lookup.clone()), reached.clone(), None);

    let (status, body) = send_delete(router, "/images/image-1").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "unauthenticated");
    assert_eq!(lookup.lookups.load(Ordering::SeqCst), 0);
}

// --- Full Chain ---

#[tokio::test]
async fn test_other_users_image_cannot_be_deleted() {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState::new(repo.clone(), AppConfig::default());

    let owner = services::users::register(
        repo.as_ref(),
        4,
        RegisterUserRequest {
            username: "owner".into(),
            email: "owner@example.com".into(),
            password: "secret".into(),
            age: 20,
            profile_image_url: None,
        },
    )
    .await
    .unwrap();
    let image = services::images::create(
        repo.as_ref(),
        &identity(&owner.id),
        CreateImageRequest {
            title: "A Title".into(),
            caption: None,
            image_url: "https://x.io/a.jpg".into(),
        },
    )
    .await
    .unwrap();
    let writes_before = repo.write_count();

    let intruder_token = state.tokens.issue("user-intruder", "intruder@example.com").unwrap();
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/images/{}", image.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", intruder_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(repo.write_count(), writes_before);
    assert!(repo.get_image(&image.id).await.unwrap().is_some());
}
