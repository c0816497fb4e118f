use chrono::Utc;

use crate::{
    error::AppResult,
    models::{CreateImageRequest, EditImageRequest, Image, ImageChanges, ImageWithAuthor, ResourceKind},
    repository::Repository,
    services::changed,
    token::Identity,
};
use validator::Validate;

/// Every image, newest first, each with its author's public summary.
pub async fn list(repo: &dyn Repository) -> AppResult<Vec<ImageWithAuthor>> {
    repo.list_images().await
}

/// create
///
/// Posts an image as the caller. A blank caption is stored as no caption.
pub async fn create(
    repo: &dyn Repository,
    identity: &Identity,
    request: CreateImageRequest,
) -> AppResult<Image> {
    request.validate()?;

    let now = Utc::now();
    let image = Image {
        id: ResourceKind::Image.new_id(),
        title: request.title,
        caption: request.caption.filter(|caption| !caption.is_empty()),
        image_url: request.image_url,
        user_id: identity.subject_id.clone(),
        created_at: now,
        updated_at: now,
    };

    repo.create_image(image).await
}

/// edit
///
/// Merges the partial payload over the stored image and re-validates the result.
/// An empty `caption` clears it; an empty `title` or `image_url` is rejected.
pub async fn edit(
    repo: &dyn Repository,
    identity: &Identity,
    id: &str,
    request: EditImageRequest,
) -> AppResult<Image> {
    let current = repo
        .get_image(id)
        .await?
        .ok_or_else(|| ResourceKind::Image.not_found(id))?;

    let caption = request
        .caption
        .map(|caption| if caption.is_empty() { None } else { Some(caption) })
        .filter(|caption| *caption != current.caption);

    let changes = ImageChanges {
        title: changed(&current.title, request.title),
        caption,
        image_url: changed(&current.image_url, request.image_url),
    };

    CreateImageRequest {
        title: changes.title.clone().unwrap_or_else(|| current.title.clone()),
        caption: None,
        image_url: changes.image_url.clone().unwrap_or_else(|| current.image_url.clone()),
    }
    .validate()?;

    if changes.is_empty() {
        return Ok(current);
    }

    tracing::debug!(image_id = id, editor = %identity.subject_id, "editing image");
    repo.edit_image(id, changes).await
}

pub async fn delete(repo: &dyn Repository, identity: &Identity, id: &str) -> AppResult<()> {
    repo.delete_image(id).await?;
    tracing::info!(image_id = id, user_id = %identity.subject_id, "image deleted");
    Ok(())
}
