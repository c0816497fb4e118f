use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// --- Core Records (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. Carries the bcrypt hash, so it is
/// never serialized to clients directly; handlers project it into one of the
/// response shapes below.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Image
///
/// A posted image from the `images` table. `user_id` is the owner.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Image {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A comment from the `comments` table. `user_id` is the author, `image_id` the target.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub image_id: String,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// SocialMedia
///
/// A social-media link from the `social_medias` table. `user_id` is the owner.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct SocialMedia {
    pub id: String,
    pub name: String,
    pub social_media_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Partial Updates (Service → Repository) ---

/// Only the fields that actually changed; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// `caption: Some(None)` clears the caption.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageChanges {
    pub title: Option<String>,
    pub caption: Option<Option<String>>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentChanges {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialMediaChanges {
    pub name: Option<String>,
    pub social_media_url: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

impl ImageChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.caption.is_none() && self.image_url.is_none()
    }
}

impl CommentChanges {
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
    }
}

impl SocialMediaChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.social_media_url.is_none()
    }
}

// --- Request Payloads (Input Schemas) ---
//
// Create payloads default missing fields to empty values so that the services,
// not the JSON decoder, report which required field is absent. None of them
// carries an owner/author field: a client-supplied `user_id` is simply ignored.

/// Rejects empty and whitespace-only text with the `required` code.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// RegisterUserRequest
///
/// Input payload for `POST /users/register`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
#[serde(default)]
pub struct RegisterUserRequest {
    #[schema(example = "johndoe")]
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[schema(example = "johndoe@example.com")]
    #[validate(
        custom(function = "not_blank"),
        email(message = "the email address is not valid")
    )]
    pub email: String,
    #[schema(example = "secret")]
    #[validate(
        custom(function = "not_blank"),
        length(min = 6, message = "password must be at least 6 characters")
    )]
    pub password: String,
    #[schema(example = 8)]
    #[validate(range(min = 8, message = "age must be at least 8"))]
    pub age: i32,
    pub profile_image_url: Option<String>,
}

/// LoginRequest
///
/// Input payload for `POST /users/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(example = "johndoe@example.com")]
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[schema(example = "secret")]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// EditUserRequest
///
/// Partial update for `PUT /users`. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
pub struct EditUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom(function = "not_blank"),
        email(message = "the email address is not valid")
    )]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub username: Option<String>,
}

/// CreateImageRequest
///
/// Input payload for `POST /images`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
#[serde(default)]
pub struct CreateImageRequest {
    #[schema(example = "A Title")]
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[schema(example = "A caption")]
    pub caption: Option<String>,
    #[schema(example = "https://www.example.com/image.jpg")]
    #[validate(custom(function = "not_blank"))]
    pub image_url: String,
}

/// EditImageRequest
///
/// Partial update for `PUT /images/{id}`. An empty `caption` clears it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// CreateCommentRequest
///
/// Input payload for `POST /comments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
#[serde(default)]
pub struct CreateCommentRequest {
    #[schema(example = "A comment")]
    #[validate(custom(function = "not_blank"))]
    pub message: String,
    #[schema(example = "image-123")]
    #[validate(custom(function = "not_blank"))]
    pub image_id: String,
}

/// EditCommentRequest
///
/// Partial update for `PUT /comments/{id}`. The target image cannot be changed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditCommentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// CreateSocialMediaRequest
///
/// Input payload for `POST /socialmedias`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
#[serde(default)]
pub struct CreateSocialMediaRequest {
    #[schema(example = "Example")]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[schema(example = "https://www.example.com/johndoe")]
    #[validate(custom(function = "not_blank"))]
    pub social_media_url: String,
}

/// EditSocialMediaRequest
///
/// Partial update for `PUT /socialmedias/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditSocialMediaRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media_url: Option<String>,
}

// --- Response Payloads (Output Schemas) ---

/// RegisteredUser
///
/// Returned by `POST /users/register`. Never includes the password or its hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct RegisteredUser {
    pub age: i32,
    pub email: String,
    pub id: String,
    pub username: String,
}

impl From<&User> for RegisteredUser {
    fn from(user: &User) -> Self {
        Self {
            age: user.age,
            email: user.email.clone(),
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoggedInUser {
    pub token: String,
}

/// EditedUser
///
/// Returned by `PUT /users`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditedUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub age: i32,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for EditedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            age: user.age,
            updated_at: user.updated_at,
        }
    }
}

/// AuthorSummary
///
/// The public face of an image's owner: no ID, no password, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AuthorSummary {
    pub email: String,
    pub username: String,
}

/// ImageWithAuthor
///
/// One row of `GET /images`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ImageWithAuthor {
    #[serde(flatten)]
    pub image: Image,
    pub user: AuthorSummary,
}

/// AddedImage
///
/// Returned by `POST /images`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddedImage {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<Image> for AddedImage {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            title: image.title,
            caption: image.caption,
            image_url: image.image_url,
            user_id: image.user_id,
            created_at: image.created_at,
        }
    }
}

/// EditedImage
///
/// Returned by `PUT /images/{id}` and, for compatibility, by `PUT /comments/{id}`,
/// which answers with the image the edited comment belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct EditedImage {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Image> for EditedImage {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            title: image.title,
            caption: image.caption,
            image_url: image.image_url,
            user_id: image.user_id,
            updated_at: image.updated_at,
        }
    }
}

/// The author block embedded in a listed comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct CommentAuthor {
    pub id: String,
    pub email: String,
    pub username: String,
    pub profile_image_url: Option<String>,
}

/// The image block embedded in a listed comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct CommentImage {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub user_id: String,
}

/// CommentWithRelations
///
/// One row of `GET /comments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct CommentWithRelations {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: CommentAuthor,
    pub image: CommentImage,
}

/// AddedComment
///
/// Returned by `POST /comments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddedComment {
    pub id: String,
    pub user_id: String,
    pub image_id: String,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for AddedComment {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            user_id: comment.user_id,
            image_id: comment.image_id,
            message: comment.message,
            created_at: comment.created_at,
        }
    }
}

/// The owner block embedded in a listed social-media link.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SocialMediaOwner {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SocialMediaWithOwner {
    #[serde(flatten)]
    pub social_media: SocialMedia,
    pub user: SocialMediaOwner,
}

/// SocialMediaList
///
/// Returned by `GET /socialmedias`: the caller's links wrapped in `social_medias`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SocialMediaList {
    pub social_medias: Vec<SocialMediaWithOwner>,
}

/// AddedSocialMedia
///
/// Returned by `POST /socialmedias`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddedSocialMedia {
    pub id: String,
    pub name: String,
    pub social_media_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<SocialMedia> for AddedSocialMedia {
    fn from(link: SocialMedia) -> Self {
        Self {
            id: link.id,
            name: link.name,
            social_media_url: link.social_media_url,
            user_id: link.user_id,
            created_at: link.created_at,
        }
    }
}

/// EditedSocialMedia
///
/// Returned by `PUT /socialmedias/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditedSocialMedia {
    pub id: String,
    pub name: String,
    pub social_media_url: String,
    pub user_id: String,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<SocialMedia> for EditedSocialMedia {
    fn from(link: SocialMedia) -> Self {
        Self {
            id: link.id,
            name: link.name,
            social_media_url: link.social_media_url,
            user_id: link.user_id,
            updated_at: link.updated_at,
        }
    }
}

// --- Resource Kinds ---

/// ResourceKind
///
/// Names the entity a lookup or policy check is about, so "not found" messages read
/// the same wherever they are raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Image,
    Comment,
    SocialMedia,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Image => "image",
            ResourceKind::Comment => "comment",
            ResourceKind::SocialMedia => "social media",
        }
    }

    /// Prefix of server-generated IDs for this kind.
    pub fn id_prefix(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Image => "image",
            ResourceKind::Comment => "comment",
            ResourceKind::SocialMedia => "socialmedia",
        }
    }

    pub fn new_id(self) -> String {
        format!("{}-{}", self.id_prefix(), uuid::Uuid::new_v4().simple())
    }

    pub fn not_found(self, id: &str) -> crate::error::AppError {
        crate::error::AppError::NotFound(format!("{} with id {} doesn't exist", self.as_str(), id))
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
