//! PostgreSQL repository tests. They need a reachable database:
//! `DATABASE_URL=... cargo test -- --ignored`.

use chrono::Utc;
use photogram::{
    AppError,
    models::{Comment, Image, ImageChanges, ResourceKind, SocialMedia, User, UserChanges},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use std::time::Duration;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone(), Duration::from_secs(5))
    }
}

// --- Test Data Helpers ---

/// Builds a user with unique username and email so tests can share a database.
fn new_user() -> User {
    let id = ResourceKind::User.new_id();
    User {
        username: format!("name-{id}"),
        email: format!("{id}@test.com"),
        password_hash: "hash".into(),
        age: 20,
        profile_image_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        id,
    }
}

fn new_image(user_id: &str) -> Image {
    Image {
        id: ResourceKind::Image.new_id(),
        title: "A Title".into(),
        caption: Some("A caption".into()),
        image_url: "https://x.io/a.jpg".into(),
        user_id: user_id.into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn test_user_uniqueness_is_reported_as_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();

    let mut twin = new_user();
    twin.username = user.username.clone();
    let err = repo.create_user(twin).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "the username you entered has been used"));

    let mut twin = new_user();
    twin.email = user.email.clone();
    let err = repo.create_user(twin).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "the email you entered has been used"));

    repo.delete_user(&user.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_image_edit_and_caption_clear() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();
    let image = repo.create_image(new_image(&user.id)).await.unwrap();

    let edited = repo
        .edit_image(
            &image.id,
            ImageChanges {
                title: Some("New".into()),
                caption: Some(None),
                image_url: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.title, "New");
    assert_eq!(edited.caption, None);
    assert_eq!(edited.image_url, image.image_url);
    assert_eq!(edited.user_id, user.id);
    assert!(edited.updated_at >= edited.created_at);

    repo.delete_user(&user.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_delete_user_cascades_to_owned_rows() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();
    let image = repo.create_image(new_image(&user.id)).await.unwrap();
    let comment = repo
        .create_comment(Comment {
            id: ResourceKind::Comment.new_id(),
            user_id: user.id.clone(),
            image_id: image.id.clone(),
            message: "hi".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    let link = repo
        .create_social_media(SocialMedia {
            id: ResourceKind::SocialMedia.new_id(),
            name: "Example".into(),
            social_media_url: "https://example.com".into(),
            user_id: user.id.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    repo.delete_user(&user.id).await.unwrap();

    assert!(repo.get_image(&image.id).await.unwrap().is_none());
    assert!(repo.get_comment(&comment.id).await.unwrap().is_none());
    assert!(repo.get_social_media(&link.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_missing_rows_are_not_found() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    assert!(matches!(
        repo.delete_comment("comment-missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.edit_user("user-missing", UserChanges::default()).await,
        Err(AppError::NotFound(_))
    ));
    // Foreign key on a missing owner.
    assert!(matches!(
        repo.create_image(new_image("user-missing")).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_comment_listing_joins_user_and_image() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();
    let image = repo.create_image(new_image(&user.id)).await.unwrap();
    repo.create_comment(Comment {
        id: ResourceKind::Comment.new_id(),
        user_id: user.id.clone(),
        image_id: image.id.clone(),
        message: "hi".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    })
    .await
    .unwrap();

    let listed = repo.list_comments(&user.id).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user.username, user.username);
    assert_eq!(listed[0].image.title, image.title);

    repo.delete_user(&user.id).await.unwrap();
}
