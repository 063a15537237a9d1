use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use blog_core::AppState;
use blog_models::{PostResponse, UserCreate, UserResponse, UserUpdate};

use crate::error::ApiError;
use crate::MULTIPART_OVERHEAD;
use crate::extract::ValidJson;

/// Multipart field carrying the picture.
const UPLOAD_FIELD: &str = "file";
/// Name used when the client sends no filename at all.
const DEFAULT_UPLOAD_NAME: &str = "profile.png";

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = blog_core::users::create_user(&state.db, &body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = blog_core::users::get_user(&state.db, user_id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ValidJson(body): ValidJson<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = blog_core::users::update_user(&state.db, user_id, &body).await?;
    Ok(Json(user))
}

pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = blog_core::posts::list_user_posts(&state.db, user_id).await?;
    Ok(Json(posts))
}

fn is_image(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("image/"))
}

pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    // Early rejection if Content-Length exceeds what the body limit would accept.
    // The header covers the whole multipart body, not just the file.
    if let Some(content_length) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        let max_body = state.config.max_upload_size.saturating_add(MULTIPART_OVERHEAD);
        if content_length > max_body {
            return Err(ApiError::PayloadTooLarge("File too large".into()));
        }
    }

    blog_core::users::ensure_user_exists(&state.db, user_id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let raw_filename = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string).or_else(|| {
            mime_guess::from_path(&raw_filename)
                .first()
                .map(|mime| mime.essence_str().to_string())
        });
        if !is_image(content_type.as_deref()) {
            return Err(ApiError::BadRequest("Only image files are allowed".into()));
        }
        let data = field.bytes().await?;
        upload = Some((raw_filename, content_type, data));
        break;
    }
    let (raw_filename, content_type, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("Empty file".into()));
    }
    if data.len() as u64 > state.config.max_upload_size {
        return Err(ApiError::PayloadTooLarge("File too large".into()));
    }

    tracing::debug!(
        user_id,
        "Profile picture upload: {:?} ({} bytes, {:?})",
        raw_filename,
        data.len(),
        content_type
    );
    let user = blog_core::users::set_profile_picture(
        &state.db,
        &state.media,
        user_id,
        &raw_filename,
        &data,
    )
    .await?;
    Ok(Json(user))
}
