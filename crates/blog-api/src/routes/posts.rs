use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use blog_core::AppState;
use blog_models::{PostCreate, PostResponse, PostUpdate};

use crate::error::ApiError;
use crate::extract::ValidJson;

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = blog_core::posts::list_posts(&state.db).await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = blog_core::posts::get_post(&state.db, post_id).await?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<PostCreate>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let post = blog_core::posts::create_post(&state.db, &body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

// TODO: take the author from an authenticated session once login exists
// instead of trusting `user_id` in the body.
pub async fn replace_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    ValidJson(body): ValidJson<PostCreate>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = blog_core::posts::replace_post(&state.db, post_id, &body).await?;
    Ok(Json(post))
}

pub async fn patch_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    ValidJson(body): ValidJson<PostUpdate>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = blog_core::posts::patch_post(&state.db, post_id, &body).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    blog_core::posts::delete_post(&state.db, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
