use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{EditUserRequest, LoginRequest, RegisterUserRequest, ResourceKind, User, UserChanges},
    repository::Repository,
    services::changed,
    token::{Identity, TokenService},
};
use validator::Validate;

const WRONG_CREDENTIALS: &str = "the credential you entered are wrong";
const ACCOUNT_NOT_FOUND: &str = "account not found";

/// register
///
/// Validates the payload, hashes the password and stores the new account. Username
/// and email collisions come back from the repository as `Conflict`.
pub async fn register(
    repo: &dyn Repository,
    bcrypt_cost: u32,
    request: RegisterUserRequest,
) -> AppResult<User> {
    request.validate()?;

    let password_hash = hash_password(request.password, bcrypt_cost).await?;
    let now = Utc::now();

    let user = User {
        id: ResourceKind::User.new_id(),
        username: request.username,
        email: request.email,
        password_hash,
        age: request.age,
        profile_image_url: request.profile_image_url.filter(|url| !url.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    let user = repo.create_user(user).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// login
///
/// Exchanges email and password for a bearer token. An unknown email and a wrong
/// password are indistinguishable to the caller.
pub async fn login(
    repo: &dyn Repository,
    tokens: &TokenService,
    request: LoginRequest,
) -> AppResult<String> {
    request.validate()?;

    let Some(user) = repo.find_user_by_email(&request.email).await? else {
        tracing::warn!("login failed: unknown email");
        return Err(AppError::Unauthorized(WRONG_CREDENTIALS.to_string()));
    };

    if !verify_password(request.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "login failed: wrong password");
        return Err(AppError::Unauthorized(WRONG_CREDENTIALS.to_string()));
    }

    tokens.issue(&user.id, &user.email)
}

/// edit
///
/// Applies a partial email/username update to the caller's own account.
pub async fn edit(
    repo: &dyn Repository,
    identity: &Identity,
    request: EditUserRequest,
) -> AppResult<User> {
    let current = repo
        .get_user(&identity.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound(ACCOUNT_NOT_FOUND.to_string()))?;

    let changes = UserChanges {
        username: changed(&current.username, request.username),
        email: changed(&current.email, request.email),
    };

    EditUserRequest {
        username: Some(changes.username.clone().unwrap_or_else(|| current.username.clone())),
        email: Some(changes.email.clone().unwrap_or_else(|| current.email.clone())),
    }
    .validate()?;

    if changes.is_empty() {
        return Ok(current);
    }

    repo.edit_user(&current.id, changes)
        .await
        .map_err(account_not_found)
}

/// delete
///
/// Removes the caller's account together with everything it owns.
pub async fn delete(repo: &dyn Repository, identity: &Identity) -> AppResult<()> {
    repo.delete_user(&identity.subject_id)
        .await
        .map_err(account_not_found)?;
    tracing::info!(user_id = %identity.subject_id, "account deleted");
    Ok(())
}

fn account_not_found(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::NotFound(ACCOUNT_NOT_FOUND.to_string()),
        other => other,
    }
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {e}")))
}
