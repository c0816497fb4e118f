use axum::extract::{Path, State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    models::{
        AddedSocialMedia, CreateSocialMediaRequest, EditSocialMediaRequest, EditedSocialMedia,
        SocialMediaList,
    },
    response::{ApiMessage, ApiResponse, JsonBody},
    services::social_medias,
};

/// get_social_medias
///
/// [Authenticated Route] Lists the caller's social-media links.
#[utoipa::path(
    get,
    path = "/socialmedias",
    tag = "socialmedias",
    responses(
        (status = 200, description = "Caller's links", body = SocialMediaList),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_social_medias(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SocialMediaList>> {
    let social_medias = social_medias::list(state.repo.as_ref(), &identity).await?;
    Ok(ApiResponse::ok(SocialMediaList { social_medias }))
}

#[utoipa::path(
    post,
    path = "/socialmedias",
    tag = "socialmedias",
    request_body = CreateSocialMediaRequest,
    responses(
        (status = 201, description = "Link added", body = AddedSocialMedia),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn add_social_media(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateSocialMediaRequest>,
) -> AppResult<ApiResponse<AddedSocialMedia>> {
    let link = social_medias::create(state.repo.as_ref(), &identity, payload).await?;
    Ok(ApiResponse::created(AddedSocialMedia::from(link)))
}

/// edit_social_media
///
/// [Owner Route] Partially updates a link's name and URL.
#[utoipa::path(
    put,
    path = "/socialmedias/{id}",
    tag = "socialmedias",
    params(("id" = String, Path, description = "Social media ID")),
    request_body = EditSocialMediaRequest,
    responses(
        (status = 200, description = "Updated", body = EditedSocialMedia),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated or not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn edit_social_media(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EditSocialMediaRequest>,
) -> AppResult<ApiResponse<EditedSocialMedia>> {
    let link = social_medias::edit(state.repo.as_ref(), &identity, &id, payload).await?;
    Ok(ApiResponse::ok(EditedSocialMedia::from(link)))
}

#[utoipa::path(
    delete,
    path = "/socialmedias/{id}",
    tag = "socialmedias",
    params(("id" = String, Path, description = "Social media ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 401, description = "Not authenticated or not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_social_media(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiMessage> {
    social_medias::delete(state.repo.as_ref(), &identity, &id).await?;
    Ok(ApiMessage::success("your social media has been successfully deleted"))
}
