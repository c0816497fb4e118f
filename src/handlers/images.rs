use axum::extract::{Path, State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    models::{AddedImage, CreateImageRequest, EditImageRequest, EditedImage, ImageWithAuthor},
    response::{ApiMessage, ApiResponse, JsonBody},
    services::images,
};

/// get_images
///
/// [Authenticated Route] Lists every image with its author's email and username.
#[utoipa::path(
    get,
    path = "/images",
    tag = "images",
    responses(
        (status = 200, description = "All images", body = [ImageWithAuthor]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_images(
    AuthUser(_identity): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ImageWithAuthor>>> {
    let images = images::list(state.repo.as_ref()).await?;
    Ok(ApiResponse::ok(images))
}

/// add_image
///
/// [Authenticated Route] Posts an image owned by the caller.
#[utoipa::path(
    post,
    path = "/images",
    tag = "images",
    request_body = CreateImageRequest,
    responses(
        (status = 201, description = "Image added", body = AddedImage),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn add_image(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateImageRequest>,
) -> AppResult<ApiResponse<AddedImage>> {
    let image = images::create(state.repo.as_ref(), &identity, payload).await?;
    Ok(ApiResponse::created(AddedImage::from(image)))
}

/// edit_image
///
/// [Owner Route] Partially updates an image.
#[utoipa::path(
    put,
    path = "/images/{id}",
    tag = "images",
    params(("id" = String, Path, description = "Image ID")),
    request_body = EditImageRequest,
    responses(
        (status = 200, description = "Updated", body = EditedImage),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated or not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn edit_image(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EditImageRequest>,
) -> AppResult<ApiResponse<EditedImage>> {
    let image = images::edit(state.repo.as_ref(), &identity, &id, payload).await?;
    Ok(ApiResponse::ok(EditedImage::from(image)))
}

/// delete_image
///
/// [Owner Route] Deletes an image and its comments.
#[utoipa::path(
    delete,
    path = "/images/{id}",
    tag = "images",
    params(("id" = String, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 401, description = "Not authenticated or not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_image(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiMessage> {
    images::delete(state.repo.as_ref(), &identity, &id).await?;
    Ok(ApiMessage::success("your image has been successfully deleted"))
}
