use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        CreateSocialMediaRequest, EditSocialMediaRequest, ResourceKind, SocialMedia,
        SocialMediaChanges, SocialMediaWithOwner,
    },
    repository::Repository,
    services::changed,
    token::Identity,
};
use validator::Validate;

/// The caller's own links, newest first.
pub async fn list(repo: &dyn Repository, identity: &Identity) -> AppResult<Vec<SocialMediaWithOwner>> {
    repo.list_social_medias(&identity.subject_id).await
}

pub async fn create(
    repo: &dyn Repository,
    identity: &Identity,
    request: CreateSocialMediaRequest,
) -> AppResult<SocialMedia> {
    request.validate()?;

    let now = Utc::now();
    let link = SocialMedia {
        id: ResourceKind::SocialMedia.new_id(),
        name: request.name,
        social_media_url: request.social_media_url,
        user_id: identity.subject_id.clone(),
        created_at: now,
        updated_at: now,
    };

    repo.create_social_media(link).await
}

/// edit
///
/// Merges name and URL over the stored link; both must stay non-empty.
pub async fn edit(
    repo: &dyn Repository,
    identity: &Identity,
    id: &str,
    request: EditSocialMediaRequest,
) -> AppResult<SocialMedia> {
    let current = repo
        .get_social_media(id)
        .await?
        .ok_or_else(|| ResourceKind::SocialMedia.not_found(id))?;

    let changes = SocialMediaChanges {
        name: changed(&current.name, request.name),
        social_media_url: changed(&current.social_media_url, request.social_media_url),
    };

    CreateSocialMediaRequest {
        name: changes.name.clone().unwrap_or_else(|| current.name.clone()),
        social_media_url: changes
            .social_media_url
            .clone()
            .unwrap_or_else(|| current.social_media_url.clone()),
    }
    .validate()?;

    if changes.is_empty() {
        return Ok(current);
    }

    tracing::debug!(social_media_id = id, editor = %identity.subject_id, "editing social media");
    repo.edit_social_media(id, changes).await
}

pub async fn delete(repo: &dyn Repository, identity: &Identity, id: &str) -> AppResult<()> {
    repo.delete_social_media(id).await?;
    tracing::info!(social_media_id = id, user_id = %identity.subject_id, "social media deleted");
    Ok(())
}
