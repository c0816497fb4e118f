use crate::{
    error::{AppError, AppResult},
    models::{
        AuthorSummary, Comment, CommentAuthor, CommentChanges, CommentImage,
        CommentWithRelations, Image, ImageChanges, ImageWithAuthor, ResourceKind, SocialMedia,
        SocialMediaChanges, SocialMediaOwner, SocialMediaWithOwner, User, UserChanges,
    },
    repository::{EMAIL_TAKEN, Repository, USERNAME_TAKEN},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Default)]
struct Store {
    users: HashMap<String, User>,
    images: HashMap<String, Image>,
    comments: HashMap<String, Comment>,
    social_medias: HashMap<String, SocialMedia>,
}

/// InMemoryRepository
///
/// A `Repository` kept in process memory. It enforces the same constraints as the
/// PostgreSQL schema (unique username/email, owners must exist, cascading deletes)
/// and counts committed writes so tests can assert that a rejected request never
/// reached the store.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    writes: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful create/edit/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| AppError::Internal("in-memory store poisoned".into()))
    }

    fn write(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| AppError::Internal("in-memory store poisoned".into()))
    }

    fn committed<T>(&self, value: T) -> AppResult<T> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

fn touch(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, String)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn missing_reference() -> AppError {
    AppError::NotFound("the referenced record doesn't exist".into())
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: User) -> AppResult<User> {
        let mut store = self.write()?;
        if store.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }
        if store.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        store.users.insert(user.id.clone(), user.clone());
        self.committed(user)
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn edit_user(&self, id: &str, changes: UserChanges) -> AppResult<User> {
        let mut store = self.write()?;
        if let Some(username) = &changes.username {
            if store.users.values().any(|u| u.id != id && &u.username == username) {
                return Err(AppError::Conflict(USERNAME_TAKEN.into()));
            }
        }
        if let Some(email) = &changes.email {
            if store.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
        }
        let user = store
            .users
            .get_mut(id)
            .ok_or_else(|| ResourceKind::User.not_found(id))?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = touch(user.created_at);
        let user = user.clone();
        self.committed(user)
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        let mut store = self.write()?;
        if store.users.remove(id).is_none() {
            return Err(ResourceKind::User.not_found(id));
        }
        store.images.retain(|_, image| image.user_id != id);
        store.social_medias.retain(|_, link| link.user_id != id);
        let Store {
            images, comments, ..
        } = &mut *store;
        comments.retain(|_, c| c.user_id != id && images.contains_key(&c.image_id));
        self.committed(())
    }

    async fn list_images(&self) -> AppResult<Vec<ImageWithAuthor>> {
        let store = self.read()?;
        let mut images: Vec<ImageWithAuthor> = store
            .images
            .values()
            .filter_map(|image| {
                let author = store.users.get(&image.user_id)?;
                Some(ImageWithAuthor {
                    image: image.clone(),
                    user: AuthorSummary {
                        email: author.email.clone(),
                        username: author.username.clone(),
                    },
                })
            })
            .collect();
        newest_first(&mut images, |i| (i.image.created_at, i.image.id.clone()));
        Ok(images)
    }

    async fn create_image(&self, image: Image) -> AppResult<Image> {
        let mut store = self.write()?;
        if !store.users.contains_key(&image.user_id) {
            return Err(missing_reference());
        }
        store.images.insert(image.id.clone(), image.clone());
        self.committed(image)
    }

    async fn get_image(&self, id: &str) -> AppResult<Option<Image>> {
        Ok(self.read()?.images.get(id).cloned())
    }

    async fn edit_image(&self, id: &str, changes: ImageChanges) -> AppResult<Image> {
        let mut store = self.write()?;
        let image = store
            .images
            .get_mut(id)
            .ok_or_else(|| ResourceKind::Image.not_found(id))?;
        if let Some(title) = changes.title {
            image.title = title;
        }
        if let Some(caption) = changes.caption {
            image.caption = caption;
        }
        if let Some(image_url) = changes.image_url {
            image.image_url = image_url;
        }
        image.updated_at = touch(image.created_at);
        let image = image.clone();
        self.committed(image)
    }

    async fn delete_image(&self, id: &str) -> AppResult<()> {
        let mut store = self.write()?;
        if store.images.remove(id).is_none() {
            return Err(ResourceKind::Image.not_found(id));
        }
        store.comments.retain(|_, c| c.image_id != id);
        self.committed(())
    }

    async fn list_comments(&self, user_id: &str) -> AppResult<Vec<CommentWithRelations>> {
        let store = self.read()?;
        let mut comments: Vec<CommentWithRelations> = store
            .comments
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| {
                let author = store.users.get(&c.user_id)?;
                let image = store.images.get(&c.image_id)?;
                Some(CommentWithRelations {
                    comment: c.clone(),
                    user: CommentAuthor {
                        id: author.id.clone(),
                        email: author.email.clone(),
                        username: author.username.clone(),
                        profile_image_url: author.profile_image_url.clone(),
                    },
                    image: CommentImage {
                        id: image.id.clone(),
                        title: image.title.clone(),
                        caption: image.caption.clone(),
                        image_url: image.image_url.clone(),
                        user_id: image.user_id.clone(),
                    },
                })
            })
            .collect();
        newest_first(&mut comments, |c| (c.comment.created_at, c.comment.id.clone()));
        Ok(comments)
    }

    async fn create_comment(&self, comment: Comment) -> AppResult<Comment> {
        let mut store = self.write()?;
        if !store.users.contains_key(&comment.user_id)
            || !store.images.contains_key(&comment.image_id)
        {
            return Err(missing_reference());
        }
        store.comments.insert(comment.id.clone(), comment.clone());
        self.committed(comment)
    }

    async fn get_comment(&self, id: &str) -> AppResult<Option<Comment>> {
        Ok(self.read()?.comments.get(id).cloned())
    }

    async fn edit_comment(&self, id: &str, changes: CommentChanges) -> AppResult<Comment> {
        let mut store = self.write()?;
        let comment = store
            .comments
            .get_mut(id)
            .ok_or_else(|| ResourceKind::Comment.not_found(id))?;
        if let Some(message) = changes.message {
            comment.message = message;
        }
        comment.updated_at = touch(comment.created_at);
        let comment = comment.clone();
        self.committed(comment)
    }

    async fn delete_comment(&self, id: &str) -> AppResult<()> {
        let mut store = self.write()?;
        if store.comments.remove(id).is_none() {
            return Err(ResourceKind::Comment.not_found(id));
        }
        self.committed(())
    }

    async fn list_social_medias(&self, user_id: &str) -> AppResult<Vec<SocialMediaWithOwner>> {
        let store = self.read()?;
        let mut links: Vec<SocialMediaWithOwner> = store
            .social_medias
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                let owner = store.users.get(&s.user_id)?;
                Some(SocialMediaWithOwner {
                    social_media: s.clone(),
                    user: SocialMediaOwner {
                        id: owner.id.clone(),
                        username: owner.username.clone(),
                        email: owner.email.clone(),
                    },
                })
            })
            .collect();
        newest_first(&mut links, |s| (s.social_media.created_at, s.social_media.id.clone()));
        Ok(links)
    }

    async fn create_social_media(&self, link: SocialMedia) -> AppResult<SocialMedia> {
        let mut store = self.write()?;
        if !store.users.contains_key(&link.user_id) {
            return Err(missing_reference());
        }
        store.social_medias.insert(link.id.clone(), link.clone());
        self.committed(link)
    }

    async fn get_social_media(&self, id: &str) -> AppResult<Option<SocialMedia>> {
        Ok(self.read()?.social_medias.get(id).cloned())
    }

    async fn edit_social_media(
        &self,
        id: &str,
        changes: SocialMediaChanges,
    ) -> AppResult<SocialMedia> {
        let mut store = self.write()?;
        let link = store
            .social_medias
            .get_mut(id)
            .ok_or_else(|| ResourceKind::SocialMedia.not_found(id))?;
        if let Some(name) = changes.name {
            link.name = name;
        }
        if let Some(url) = changes.social_media_url {
            link.social_media_url = url;
        }
        link.updated_at = touch(link.created_at);
        let link = link.clone();
        self.committed(link)
    }

    async fn delete_social_media(&self, id: &str) -> AppResult<()> {
        let mut store = self.write()?;
        if store.social_medias.remove(id).is_none() {
            return Err(ResourceKind::SocialMedia.not_found(id));
        }
        self.committed(())
    }
}
