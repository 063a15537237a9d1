use chrono::{DateTime, Utc};

use crate::{DbError, DbPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub date_posted: DateTime<Utc>,
}

/// A post joined with the columns of its author.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithAuthorRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub date_posted: DateTime<Utc>,
    pub author_username: String,
    pub author_email: String,
    pub author_image_file: Option<String>,
}

const SELECT_WITH_AUTHOR: &str =
    "SELECT p.id, p.title, p.content, p.user_id, p.date_posted,
            u.username AS author_username, u.email AS author_email,
            u.image_file AS author_image_file
     FROM posts p
     JOIN users u ON u.id = p.user_id";

pub async fn create_post(
    pool: &DbPool,
    user_id: i64,
    title: &str,
    content: &str,
    date_posted: DateTime<Utc>,
) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (title, content, user_id, date_posted)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, title, content, user_id, date_posted"
    )
    .bind(title)
    .bind(content)
    .bind(user_id)
    .bind(date_posted)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_post(pool: &DbPool, id: i64) -> Result<Option<PostWithAuthorRow>, DbError> {
    let row = sqlx::query_as::<_, PostWithAuthorRow>(&format!("{SELECT_WITH_AUTHOR} WHERE p.id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All posts, newest first.
pub async fn list_posts(pool: &DbPool) -> Result<Vec<PostWithAuthorRow>, DbError> {
    let rows = sqlx::query_as::<_, PostWithAuthorRow>(&format!(
        "{SELECT_WITH_AUTHOR} ORDER BY p.date_posted DESC, p.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_posts_by_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Vec<PostWithAuthorRow>, DbError> {
    let rows = sqlx::query_as::<_, PostWithAuthorRow>(&format!(
        "{SELECT_WITH_AUTHOR} WHERE p.user_id = ?1 ORDER BY p.date_posted DESC, p.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Update only the provided columns. Returns false if the post does not exist.
pub async fn update_post(
    pool: &DbPool,
    id: i64,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE posts
         SET title = COALESCE(?2, title),
             content = COALESCE(?3, content)
         WHERE id = ?1"
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_post(pool: &DbPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
