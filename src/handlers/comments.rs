use axum::extract::{Path, State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    models::{AddedComment, CommentWithRelations, CreateCommentRequest, EditCommentRequest, EditedImage},
    response::{ApiMessage, ApiResponse, JsonBody},
    services::comments,
};

/// get_comments
///
/// [Authenticated Route] Lists the caller's comments with their author and image.
#[utoipa::path(
    get,
    path = "/comments",
    tag = "comments",
    responses(
        (status = 200, description = "Caller's comments", body = [CommentWithRelations]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_comments(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CommentWithRelations>>> {
    let comments = comments::list(state.repo.as_ref(), &identity).await?;
    Ok(ApiResponse::ok(comments))
}

/// add_comment
///
/// [Authenticated Route] Comments on an existing image.
#[utoipa::path(
    post,
    path = "/comments",
    tag = "comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = AddedComment),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Image not found", body = ErrorBody)
    )
)]
pub async fn add_comment(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> AppResult<ApiResponse<AddedComment>> {
    let comment = comments::create(state.repo.as_ref(), &identity, payload).await?;
    Ok(ApiResponse::created(AddedComment::from(comment)))
}

/// edit_comment
///
/// [Owner Route] Replaces a comment's message. Answers with the commented image.
#[utoipa::path(
    put,
    path = "/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment ID")),
    request_body = EditCommentRequest,
    responses(
        (status = 200, description = "Updated; the commented image", body = EditedImage),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated or not the author", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn edit_comment(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EditCommentRequest>,
) -> AppResult<ApiResponse<EditedImage>> {
    let image = comments::edit(state.repo.as_ref(), &identity, &id, payload).await?;
    Ok(ApiResponse::ok(EditedImage::from(image)))
}

/// delete_comment
///
/// [Owner Route]
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 401, description = "Not authenticated or not the author", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_comment(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiMessage> {
    comments::delete(state.repo.as_ref(), &identity, &id).await?;
    Ok(ApiMessage::success("your comment has been successfully deleted"))
}
