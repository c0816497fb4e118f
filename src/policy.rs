use async_trait::async_trait;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::ResourceKind,
    repository::RepositoryState,
    token::Identity,
};

/// OwnerLookup
///
/// Resolves the owning user of one kind of resource. The policy only needs this one
/// question answered, so tests can back it with a plain map instead of a repository.
#[async_trait]
pub trait OwnerLookup: Send + Sync {
    /// `Ok(None)` when no resource with `id` exists.
    async fn owner_of(&self, id: &str) -> AppResult<Option<String>>;
}

/// Image owner = the user who posted it.
pub struct ImageOwners(pub RepositoryState);

/// Comment owner = the comment's author.
pub struct CommentOwners(pub RepositoryState);

pub struct SocialMediaOwners(pub RepositoryState);

#[async_trait]
impl OwnerLookup for ImageOwners {
    async fn owner_of(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.0.get_image(id).await?.map(|image| image.user_id))
    }
}

#[async_trait]
impl OwnerLookup for CommentOwners {
    async fn owner_of(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.0.get_comment(id).await?.map(|comment| comment.user_id))
    }
}

#[async_trait]
impl OwnerLookup for SocialMediaOwners {
    async fn owner_of(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.0.get_social_media(id).await?.map(|link| link.user_id))
    }
}

/// OwnershipPolicy
///
/// Decides whether an authenticated identity may edit or delete one resource.
/// Only the owner may; everyone else is refused, and a missing resource is reported
/// as not found before ownership is even considered.
#[derive(Clone)]
pub struct OwnershipPolicy {
    lookup: Arc<dyn OwnerLookup>,
    kind: ResourceKind,
}

impl OwnershipPolicy {
    pub fn new(kind: ResourceKind, lookup: Arc<dyn OwnerLookup>) -> Self {
        Self { lookup, kind }
    }

    pub fn images(repo: RepositoryState) -> Self {
        Self::new(ResourceKind::Image, Arc::new(ImageOwners(repo)))
    }

    pub fn comments(repo: RepositoryState) -> Self {
        Self::new(ResourceKind::Comment, Arc::new(CommentOwners(repo)))
    }

    pub fn social_medias(repo: RepositoryState) -> Self {
        Self::new(ResourceKind::SocialMedia, Arc::new(SocialMediaOwners(repo)))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub async fn authorize(&self, resource_id: &str, identity: &Identity) -> AppResult<()> {
        let owner = self
            .lookup
            .owner_of(resource_id)
            .await?
            .ok_or_else(|| self.kind.not_found(resource_id))?;

        if owner != identity.subject_id {
            tracing::warn!(
                kind = %self.kind,
                resource_id,
                subject = %identity.subject_id,
                "ownership check failed"
            );
            return Err(AppError::Forbidden(format!(
                "you don't have permission to view or edit this {}",
                self.kind
            )));
        }

        Ok(())
    }
}

/// enforce_ownership
///
/// Route layer for the `/{id}` edit/delete routes. It must sit inside the
/// authentication layer: it reads the [`Identity`] that layer stored in the request
/// extensions and refuses the request before the handler runs unless the caller
/// owns resource `id`.
pub async fn enforce_ownership(
    State(policy): State<OwnershipPolicy>,
    Path(resource_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

    policy.authorize(&resource_id, identity).await?;

    Ok(next.run(request).await)
}
