use blog_db::DbPool;
use blog_models::{PostCreate, PostResponse, PostUpdate};
use chrono::Utc;

use crate::users::ensure_user_exists;
use crate::CoreError;

pub async fn list_posts(pool: &DbPool) -> Result<Vec<PostResponse>, CoreError> {
    let rows = blog_db::posts::list_posts(pool).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_post(pool: &DbPool, post_id: i64) -> Result<PostResponse, CoreError> {
    blog_db::posts::get_post(pool, post_id)
        .await?
        .map(Into::into)
        .ok_or(CoreError::NotFound("Post not found"))
}

pub async fn create_post(pool: &DbPool, input: &PostCreate) -> Result<PostResponse, CoreError> {
    ensure_user_exists(pool, input.user_id).await?;

    let row = blog_db::posts::create_post(
        pool,
        input.user_id,
        &input.title,
        &input.content,
        Utc::now(),
    )
    .await?;
    tracing::info!(post_id = row.id, user_id = row.user_id, "Created post");

    get_post(pool, row.id).await
}

pub async fn list_user_posts(pool: &DbPool, user_id: i64) -> Result<Vec<PostResponse>, CoreError> {
    ensure_user_exists(pool, user_id).await?;
    let rows = blog_db::posts::list_posts_by_user(pool, user_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Replace title and content. The supplied `user_id` must own the post.
pub async fn replace_post(
    pool: &DbPool,
    post_id: i64,
    input: &PostCreate,
) -> Result<PostResponse, CoreError> {
    let post = blog_db::posts::get_post(pool, post_id).await?;
    ensure_user_exists(pool, input.user_id).await?;
    let post = post.ok_or(CoreError::NotFound("Post not found"))?;
    if post.user_id != input.user_id {
        return Err(CoreError::Forbidden("You can only update your own posts"));
    }

    blog_db::posts::update_post(pool, post_id, Some(&input.title), Some(&input.content)).await?;
    get_post(pool, post_id).await
}

pub async fn patch_post(
    pool: &DbPool,
    post_id: i64,
    input: &PostUpdate,
) -> Result<PostResponse, CoreError> {
    let updated = blog_db::posts::update_post(
        pool,
        post_id,
        input.title.as_deref(),
        input.content.as_deref(),
    )
    .await?;
    if !updated {
        return Err(CoreError::NotFound("Post not found"));
    }
    get_post(pool, post_id).await
}

pub async fn delete_post(pool: &DbPool, post_id: i64) -> Result<(), CoreError> {
    if !blog_db::posts::delete_post(pool, post_id).await? {
        return Err(CoreError::NotFound("Post not found"));
    }
    tracing::info!(post_id, "Deleted post");
    Ok(())
}
