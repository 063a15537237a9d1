use crate::{DbError, DbPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: Option<String>,
}

pub async fn create_user(pool: &DbPool, username: &str, email: &str) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, email)
         VALUES (?1, ?2)
         RETURNING id, username, email, image_file"
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_id(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, image_file FROM users WHERE id = ?1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, image_file FROM users WHERE username = ?1"
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, image_file FROM users WHERE email = ?1"
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// First user holding either the username or the email, if any.
pub async fn find_user_by_username_or_email(
    pool: &DbPool,
    username: &str,
    email: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, image_file
         FROM users WHERE username = ?1 OR email = ?2
         ORDER BY id LIMIT 1"
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn username_taken_by_other(
    pool: &DbPool,
    username: &str,
    user_id: i64,
) -> Result<bool, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2"
    )
    .bind(username)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn email_taken_by_other(
    pool: &DbPool,
    email: &str,
    user_id: i64,
) -> Result<bool, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2"
    )
    .bind(email)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Update only the provided columns. Returns `None` if the user does not exist.
pub async fn update_user(
    pool: &DbPool,
    id: i64,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users
         SET username = COALESCE(?2, username),
             email = COALESCE(?3, email)
         WHERE id = ?1
         RETURNING id, username, email, image_file"
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Set `image_file` only if it still holds `expected`.
///
/// Returns `None` when the user does not exist or another writer changed the
/// column first, so the caller knows exactly which file it replaced.
pub async fn swap_image_file(
    pool: &DbPool,
    id: i64,
    expected: Option<&str>,
    image_file: Option<&str>,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET image_file = ?3
         WHERE id = ?1 AND image_file IS ?2
         RETURNING id, username, email, image_file"
    )
    .bind(id)
    .bind(expected)
    .bind(image_file)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_pool;

    #[tokio::test]
    async fn create_and_lookup() {
        let pool = memory_pool().await.unwrap();
        let user = create_user(&pool, "alice", "alice@example.com").await.unwrap();
        assert!(user.image_file.is_none());

        let by_id = get_user_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(get_user_by_username(&pool, "alice").await.unwrap().is_some());
        assert!(get_user_by_email(&pool, "alice@example.com").await.unwrap().is_some());
        assert!(get_user_by_id(&pool, user.id + 1).await.unwrap().is_none());

        let found = find_user_by_username_or_email(&pool, "nobody", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn duplicate_username_is_unique_violation() {
        let pool = memory_pool().await.unwrap();
        create_user(&pool, "alice", "a@example.com").await.unwrap();
        let err = create_user(&pool, "alice", "b@example.com").await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn partial_update_keeps_missing_columns() {
        let pool = memory_pool().await.unwrap();
        let user = create_user(&pool, "alice", "a@example.com").await.unwrap();

        let updated = update_user(&pool, user.id, None, Some("new@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "new@example.com");

        assert!(update_user(&pool, 999, Some("x"), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn taken_checks_exclude_self() {
        let pool = memory_pool().await.unwrap();
        let alice = create_user(&pool, "alice", "a@example.com").await.unwrap();
        let bob = create_user(&pool, "bob", "b@example.com").await.unwrap();

        assert!(!email_taken_by_other(&pool, "a@example.com", alice.id).await.unwrap());
        assert!(email_taken_by_other(&pool, "a@example.com", bob.id).await.unwrap());
        assert!(username_taken_by_other(&pool, "bob", alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn swap_image_file_only_replaces_expected_value() {
        let pool = memory_pool().await.unwrap();
        let user = create_user(&pool, "alice", "a@example.com").await.unwrap();

        let first = swap_image_file(&pool, user.id, None, Some("aaaa0000_a.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.image_file.as_deref(), Some("aaaa0000_a.png"));

        // Stale expectation: someone already moved off `None`.
        assert!(swap_image_file(&pool, user.id, None, Some("bbbb1111_b.png"))
            .await
            .unwrap()
            .is_none());
        let current = get_user_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(current.image_file.as_deref(), Some("aaaa0000_a.png"));

        let second = swap_image_file(&pool, user.id, Some("aaaa0000_a.png"), Some("bbbb1111_b.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.image_file.as_deref(), Some("bbbb1111_b.png"));

        assert!(swap_image_file(&pool, 999, None, Some("x.png")).await.unwrap().is_none());
    }
}
