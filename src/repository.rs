use crate::{
    error::{AppError, AppResult},
    models::{
        AuthorSummary, Comment, CommentAuthor, CommentChanges, CommentImage,
        CommentWithRelations, Image, ImageChanges, ImageWithAuthor, ResourceKind, SocialMedia,
        SocialMediaChanges, SocialMediaOwner, SocialMediaWithOwner, User, UserChanges,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::{future::Future, sync::Arc, time::Duration};

pub const USERNAME_TAKEN: &str = "the username you entered has been used";
pub const EMAIL_TAKEN: &str = "the email you entered has been used";

/// Repository Trait
///
/// The persistence gateway. Handlers never touch it directly; the resource services
/// do, and the ownership policy reads owners through it.
///
/// Every implementation must bound each call by a deadline, report a missing row on
/// `edit_*`/`delete_*` as [`AppError::NotFound`], and report username/email
/// collisions as [`AppError::Conflict`].
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn edit_user(&self, id: &str, changes: UserChanges) -> AppResult<User>;
    // Cascades to everything the user owns or authored.
    async fn delete_user(&self, id: &str) -> AppResult<()>;

    // --- Images ---
    // All images, newest first, with the public author summary.
    async fn list_images(&self) -> AppResult<Vec<ImageWithAuthor>>;
    async fn create_image(&self, image: Image) -> AppResult<Image>;
    async fn get_image(&self, id: &str) -> AppResult<Option<Image>>;
    async fn edit_image(&self, id: &str, changes: ImageChanges) -> AppResult<Image>;
    // Cascades to the image's comments.
    async fn delete_image(&self, id: &str) -> AppResult<()>;

    // --- Comments ---
    // Only the comments authored by `user_id`.
    async fn list_comments(&self, user_id: &str) -> AppResult<Vec<CommentWithRelations>>;
    async fn create_comment(&self, comment: Comment) -> AppResult<Comment>;
    async fn get_comment(&self, id: &str) -> AppResult<Option<Comment>>;
    async fn edit_comment(&self, id: &str, changes: CommentChanges) -> AppResult<Comment>;
    async fn delete_comment(&self, id: &str) -> AppResult<()>;

    // --- Social Media ---
    // Only the links owned by `user_id`.
    async fn list_social_medias(&self, user_id: &str) -> AppResult<Vec<SocialMediaWithOwner>>;
    async fn create_social_media(&self, link: SocialMedia) -> AppResult<SocialMedia>;
    async fn get_social_media(&self, id: &str) -> AppResult<Option<SocialMedia>>;
    async fn edit_social_media(&self, id: &str, changes: SocialMediaChanges)
    -> AppResult<SocialMedia>;
    async fn delete_social_media(&self, id: &str) -> AppResult<()>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Each query is wrapped in
/// `tokio::time::timeout`; dropping the request future cancels the query with it.
pub struct PostgresRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn with_deadline<T, F>(&self, query: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(classify),
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "query exceeded its deadline");
                Err(AppError::Timeout)
            }
        }
    }
}

/// Reclassifies driver errors that carry a meaning callers act on.
pub fn classify(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("users_username_key") => return AppError::Conflict(USERNAME_TAKEN.into()),
                Some("users_email_key") => return AppError::Conflict(EMAIL_TAKEN.into()),
                _ => {}
            }
        }
        if db.is_foreign_key_violation() {
            return AppError::NotFound("the referenced record doesn't exist".into());
        }
    }
    AppError::Database(err)
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, age, profile_image_url, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, title, caption, image_url, user_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, user_id, image_id, message, created_at, updated_at";
const SOCIAL_MEDIA_COLUMNS: &str = "id, name, social_media_url, user_id, created_at, updated_at";

// --- Join Rows ---

#[derive(FromRow)]
struct ImageAuthorRow {
    id: String,
    title: String,
    caption: Option<String>,
    image_url: String,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    username: String,
}

impl From<ImageAuthorRow> for ImageWithAuthor {
    fn from(row: ImageAuthorRow) -> Self {
        ImageWithAuthor {
            image: Image {
                id: row.id,
                title: row.title,
                caption: row.caption,
                image_url: row.image_url,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            user: AuthorSummary {
                email: row.email,
                username: row.username,
            },
        }
    }
}

#[derive(FromRow)]
struct CommentRelationsRow {
    id: String,
    user_id: String,
    image_id: String,
    message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_email: String,
    user_username: String,
    user_profile_image_url: Option<String>,
    image_title: String,
    image_caption: Option<String>,
    image_image_url: String,
    image_user_id: String,
}

impl From<CommentRelationsRow> for CommentWithRelations {
    fn from(row: CommentRelationsRow) -> Self {
        CommentWithRelations {
            user: CommentAuthor {
                id: row.user_id.clone(),
                email: row.user_email,
                username: row.user_username,
                profile_image_url: row.user_profile_image_url,
            },
            image: CommentImage {
                id: row.image_id.clone(),
                title: row.image_title,
                caption: row.image_caption,
                image_url: row.image_image_url,
                user_id: row.image_user_id,
            },
            comment: Comment {
                id: row.id,
                user_id: row.user_id,
                image_id: row.image_id,
                message: row.message,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(FromRow)]
struct SocialMediaOwnerRow {
    id: String,
    name: String,
    social_media_url: String,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_username: String,
    user_email: String,
}

impl From<SocialMediaOwnerRow> for SocialMediaWithOwner {
    fn from(row: SocialMediaOwnerRow) -> Self {
        SocialMediaWithOwner {
            user: SocialMediaOwner {
                id: row.user_id.clone(),
                username: row.user_username,
                email: row.user_email,
            },
            social_media: SocialMedia {
                id: row.id,
                name: row.name,
                social_media_url: row.social_media_url,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn create_user(&self, user: User) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        self.with_deadline(
            sqlx::query_as::<_, User>(&sql)
                .bind(&user.id)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.age)
                .bind(&user.profile_image_url)
                .bind(user.created_at)
                .bind(user.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.with_deadline(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.with_deadline(
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Uses `COALESCE` so only the provided columns change.
    async fn edit_user(&self, id: &str, changes: UserChanges) -> AppResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        self.with_deadline(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .bind(changes.username)
                .bind(changes.email)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| ResourceKind::User.not_found(id))
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        let result = self
            .with_deadline(
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(ResourceKind::User.not_found(id));
        }
        Ok(())
    }

    // --- IMAGES ---

    async fn list_images(&self) -> AppResult<Vec<ImageWithAuthor>> {
        let rows = self
            .with_deadline(
                sqlx::query_as::<_, ImageAuthorRow>(
                    r#"
                    SELECT i.id, i.title, i.caption, i.image_url, i.user_id,
                           i.created_at, i.updated_at, u.email, u.username
                    FROM images i
                    JOIN users u ON u.id = i.user_id
                    ORDER BY i.created_at DESC
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(ImageWithAuthor::from).collect())
    }

    async fn create_image(&self, image: Image) -> AppResult<Image> {
        let sql = format!(
            "INSERT INTO images ({IMAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {IMAGE_COLUMNS}"
        );
        self.with_deadline(
            sqlx::query_as::<_, Image>(&sql)
                .bind(&image.id)
                .bind(&image.title)
                .bind(&image.caption)
                .bind(&image.image_url)
                .bind(&image.user_id)
                .bind(image.created_at)
                .bind(image.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_image(&self, id: &str) -> AppResult<Option<Image>> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1");
        self.with_deadline(sqlx::query_as::<_, Image>(&sql).bind(id).fetch_optional(&self.pool))
            .await
    }

    /// `caption` is nullable, so it is driven by an explicit "set" flag rather than
    /// `COALESCE`.
    async fn edit_image(&self, id: &str, changes: ImageChanges) -> AppResult<Image> {
        let caption_set = changes.caption.is_some();
        let sql = format!(
            r#"
            UPDATE images
            SET title = COALESCE($2, title),
                caption = CASE WHEN $3 THEN $4 ELSE caption END,
                image_url = COALESCE($5, image_url),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {IMAGE_COLUMNS}
            "#
        );
        self.with_deadline(
            sqlx::query_as::<_, Image>(&sql)
                .bind(id)
                .bind(changes.title)
                .bind(caption_set)
                .bind(changes.caption.flatten())
                .bind(changes.image_url)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| ResourceKind::Image.not_found(id))
    }

    async fn delete_image(&self, id: &str) -> AppResult<()> {
        let result = self
            .with_deadline(
                sqlx::query("DELETE FROM images WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(ResourceKind::Image.not_found(id));
        }
        Ok(())
    }

    // --- COMMENTS ---

    async fn list_comments(&self, user_id: &str) -> AppResult<Vec<CommentWithRelations>> {
        let rows = self
            .with_deadline(
                sqlx::query_as::<_, CommentRelationsRow>(
                    r#"
                    SELECT c.id, c.user_id, c.image_id, c.message, c.created_at, c.updated_at,
                           u.email AS user_email, u.username AS user_username,
                           u.profile_image_url AS user_profile_image_url,
                           i.title AS image_title, i.caption AS image_caption,
                           i.image_url AS image_image_url, i.user_id AS image_user_id
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    JOIN images i ON i.id = c.image_id
                    WHERE c.user_id = $1
                    ORDER BY c.created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(CommentWithRelations::from).collect())
    }

    async fn create_comment(&self, comment: Comment) -> AppResult<Comment> {
        let sql = format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COMMENT_COLUMNS}"
        );
        self.with_deadline(
            sqlx::query_as::<_, Comment>(&sql)
                .bind(&comment.id)
                .bind(&comment.user_id)
                .bind(&comment.image_id)
                .bind(&comment.message)
                .bind(comment.created_at)
                .bind(comment.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_comment(&self, id: &str) -> AppResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        self.with_deadline(
            sqlx::query_as::<_, Comment>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn edit_comment(&self, id: &str, changes: CommentChanges) -> AppResult<Comment> {
        let sql = format!(
            r#"
            UPDATE comments
            SET message = COALESCE($2, message),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        );
        self.with_deadline(
            sqlx::query_as::<_, Comment>(&sql)
                .bind(id)
                .bind(changes.message)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| ResourceKind::Comment.not_found(id))
    }

    async fn delete_comment(&self, id: &str) -> AppResult<()> {
        let result = self
            .with_deadline(
                sqlx::query("DELETE FROM comments WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(ResourceKind::Comment.not_found(id));
        }
        Ok(())
    }

    // --- SOCIAL MEDIA ---

    async fn list_social_medias(&self, user_id: &str) -> AppResult<Vec<SocialMediaWithOwner>> {
        let rows = self
            .with_deadline(
                sqlx::query_as::<_, SocialMediaOwnerRow>(
                    r#"
                    SELECT s.id, s.name, s.social_media_url, s.user_id, s.created_at, s.updated_at,
                           u.username AS user_username, u.email AS user_email
                    FROM social_medias s
                    JOIN users u ON u.id = s.user_id
                    WHERE s.user_id = $1
                    ORDER BY s.created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(SocialMediaWithOwner::from).collect())
    }

    async fn create_social_media(&self, link: SocialMedia) -> AppResult<SocialMedia> {
        let sql = format!(
            "INSERT INTO social_medias ({SOCIAL_MEDIA_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SOCIAL_MEDIA_COLUMNS}"
        );
        self.with_deadline(
            sqlx::query_as::<_, SocialMedia>(&sql)
                .bind(&link.id)
                .bind(&link.name)
                .bind(&link.social_media_url)
                .bind(&link.user_id)
                .bind(link.created_at)
                .bind(link.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_social_media(&self, id: &str) -> AppResult<Option<SocialMedia>> {
        let sql = format!("SELECT {SOCIAL_MEDIA_COLUMNS} FROM social_medias WHERE id = $1");
        self.with_deadline(
            sqlx::query_as::<_, SocialMedia>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn edit_social_media(
        &self,
        id: &str,
        changes: SocialMediaChanges,
    ) -> AppResult<SocialMedia> {
        let sql = format!(
            r#"
            UPDATE social_medias
            SET name = COALESCE($2, name),
                social_media_url = COALESCE($3, social_media_url),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {SOCIAL_MEDIA_COLUMNS}
            "#
        );
        self.with_deadline(
            sqlx::query_as::<_, SocialMedia>(&sql)
                .bind(id)
                .bind(changes.name)
                .bind(changes.social_media_url)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| ResourceKind::SocialMedia.not_found(id))
    }

    async fn delete_social_media(&self, id: &str) -> AppResult<()> {
        let result = self
            .with_deadline(
                sqlx::query("DELETE FROM social_medias WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(ResourceKind::SocialMedia.not_found(id));
        }
        Ok(())
    }
}
