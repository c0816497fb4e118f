use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        Comment, CommentChanges, CommentWithRelations, CreateCommentRequest, EditCommentRequest,
        Image, ResourceKind,
    },
    repository::Repository,
    services::changed,
    token::Identity,
};
use validator::Validate;

/// The caller's own comments, newest first.
pub async fn list(repo: &dyn Repository, identity: &Identity) -> AppResult<Vec<CommentWithRelations>> {
    repo.list_comments(&identity.subject_id).await
}

/// create
///
/// Comments on an existing image as the caller. The image is looked up first so a
/// dangling `image_id` is reported by name.
pub async fn create(
    repo: &dyn Repository,
    identity: &Identity,
    request: CreateCommentRequest,
) -> AppResult<Comment> {
    request.validate()?;

    if repo.get_image(&request.image_id).await?.is_none() {
        return Err(ResourceKind::Image.not_found(&request.image_id));
    }

    let now = Utc::now();
    let comment = Comment {
        id: ResourceKind::Comment.new_id(),
        user_id: identity.subject_id.clone(),
        image_id: request.image_id,
        message: request.message,
        created_at: now,
        updated_at: now,
    };

    repo.create_comment(comment).await
}

/// edit
///
/// Replaces the message of a comment and answers with the image it belongs to.
pub async fn edit(
    repo: &dyn Repository,
    identity: &Identity,
    id: &str,
    request: EditCommentRequest,
) -> AppResult<Image> {
    let current = repo
        .get_comment(id)
        .await?
        .ok_or_else(|| ResourceKind::Comment.not_found(id))?;

    let changes = CommentChanges {
        message: changed(&current.message, request.message),
    };

    CreateCommentRequest {
        message: changes.message.clone().unwrap_or_else(|| current.message.clone()),
        image_id: current.image_id.clone(),
    }
    .validate()?;

    if !changes.is_empty() {
        tracing::debug!(comment_id = id, editor = %identity.subject_id, "editing comment");
        repo.edit_comment(id, changes).await?;
    }

    repo.get_image(&current.image_id)
        .await?
        .ok_or_else(|| ResourceKind::Image.not_found(&current.image_id))
}

pub async fn delete(repo: &dyn Repository, identity: &Identity, id: &str) -> AppResult<()> {
    repo.delete_comment(id).await?;
    tracing::info!(comment_id = id, user_id = %identity.subject_id, "comment deleted");
    Ok(())
}
