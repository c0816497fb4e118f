use axum::extract::State;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    models::{EditUserRequest, EditedUser, LoggedInUser, LoginRequest, RegisterUserRequest, RegisteredUser},
    response::{ApiMessage, ApiResponse, JsonBody},
    services::users,
};

/// register_user
///
/// [Public Route] Creates an account. The response echoes the stored profile and never
/// the password or its hash.
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = RegisteredUser),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>,
) -> AppResult<ApiResponse<RegisteredUser>> {
    let user = users::register(state.repo.as_ref(), state.config.bcrypt_cost, payload).await?;
    Ok(ApiResponse::created(RegisteredUser::from(&user)))
}

/// login_user
///
/// [Public Route] Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoggedInUser),
        (status = 401, description = "Wrong credentials", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<LoggedInUser>> {
    let token = users::login(state.repo.as_ref(), &state.tokens, payload).await?;
    Ok(ApiResponse::ok(LoggedInUser { token }))
}

/// edit_user
///
/// [Authenticated Route] Updates the caller's email and/or username.
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "Updated", body = EditedUser),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody)
    )
)]
pub async fn edit_user(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EditUserRequest>,
) -> AppResult<ApiResponse<EditedUser>> {
    let user = users::edit(state.repo.as_ref(), &identity, payload).await?;
    Ok(ApiResponse::ok(EditedUser::from(user)))
}

/// delete_user
///
/// [Authenticated Route] Deletes the caller's account and everything it owns.
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiMessage> {
    users::delete(state.repo.as_ref(), &identity).await?;
    Ok(ApiMessage::success("your account has been successfully deleted"))
}
