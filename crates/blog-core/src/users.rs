use blog_db::DbPool;
use blog_models::{UserCreate, UserResponse, UserUpdate};

use crate::{CoreError, MediaStore};

pub async fn create_user(pool: &DbPool, input: &UserCreate) -> Result<UserResponse, CoreError> {
    if blog_db::users::get_user_by_username(pool, &input.username)
        .await?
        .is_some()
    {
        return Err(CoreError::Conflict("Username already exists"));
    }
    if blog_db::users::get_user_by_email(pool, &input.email)
        .await?
        .is_some()
    {
        return Err(CoreError::Conflict("Email already exists"));
    }

    // A concurrent insert can still win between the checks and this statement.
    let row = blog_db::users::create_user(pool, &input.username, &input.email)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                CoreError::Conflict("Username or email already exists")
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = row.id, "Created user {}", row.username);
    Ok(row.into())
}

pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<UserResponse, CoreError> {
    blog_db::users::get_user_by_id(pool, user_id)
        .await?
        .map(Into::into)
        .ok_or(CoreError::NotFound("User not found"))
}

/// Fails with `NotFound` unless the user exists.
pub async fn ensure_user_exists(pool: &DbPool, user_id: i64) -> Result<(), CoreError> {
    blog_db::users::get_user_by_id(pool, user_id)
        .await?
        .map(|_| ())
        .ok_or(CoreError::NotFound("User not found"))
}

pub async fn update_user(
    pool: &DbPool,
    user_id: i64,
    input: &UserUpdate,
) -> Result<UserResponse, CoreError> {
    ensure_user_exists(pool, user_id).await?;

    if let Some(username) = input.username.as_deref() {
        if blog_db::users::username_taken_by_other(pool, username, user_id).await? {
            return Err(CoreError::Conflict("Username already exists"));
        }
    }
    if let Some(email) = input.email.as_deref() {
        if blog_db::users::email_taken_by_other(pool, email, user_id).await? {
            return Err(CoreError::Conflict("Email already exists"));
        }
    }

    let row = blog_db::users::update_user(
        pool,
        user_id,
        input.username.as_deref(),
        input.email.as_deref(),
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            CoreError::Conflict("Username or email already exists")
        } else {
            e.into()
        }
    })?
    .ok_or(CoreError::NotFound("User not found"))?;

    Ok(row.into())
}

/// Store an uploaded picture and make it the user's profile picture.
///
/// The column is swapped against the value last read, so when uploads race
/// each one removes exactly the file it displaced and no upload is orphaned.
pub async fn set_profile_picture(
    pool: &DbPool,
    media: &MediaStore,
    user_id: i64,
    raw_filename: &str,
    data: &[u8],
) -> Result<UserResponse, CoreError> {
    let mut previous = blog_db::users::get_user_by_id(pool, user_id)
        .await?
        .ok_or(CoreError::NotFound("User not found"))?
        .image_file;

    let stored_name = media.save(raw_filename, data).await?;

    let row = loop {
        let swapped = blog_db::users::swap_image_file(
            pool,
            user_id,
            previous.as_deref(),
            Some(&stored_name),
        )
        .await;
        match swapped {
            Ok(Some(row)) => break row,
            Ok(None) => {}
            Err(e) => {
                media.remove(&stored_name).await;
                return Err(e.into());
            }
        }

        // Lost the race or the user is gone; re-read and try again.
        match blog_db::users::get_user_by_id(pool, user_id).await {
            Ok(Some(current)) => {
                tracing::debug!(user_id, "Profile picture changed concurrently, retrying swap");
                previous = current.image_file;
            }
            Ok(None) => {
                media.remove(&stored_name).await;
                return Err(CoreError::NotFound("User not found"));
            }
            Err(e) => {
                media.remove(&stored_name).await;
                return Err(e.into());
            }
        }
    };

    if let Some(old) = previous {
        media.remove(&old).await;
    }

    tracing::info!(user_id, "Updated profile picture to {}", stored_name);
    Ok(row.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_db::memory_pool;

    fn new_user(username: &str, email: &str) -> UserCreate {
        UserCreate {
            username: username.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let pool = memory_pool().await.unwrap();
        let alice = create_user(&pool, &new_user("alice", "a@example.com")).await.unwrap();
        assert_eq!(alice.image_path, "/static/profile_pics/default.png");

        let err = create_user(&pool, &new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict("Username already exists")));

        let err = create_user(&pool, &new_user("alice2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict("Email already exists")));
    }

    #[tokio::test]
    async fn get_missing_user() {
        let pool = memory_pool().await.unwrap();
        let err = get_user(&pool, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("User not found")));
    }

    #[tokio::test]
    async fn update_checks_other_users_only() {
        let pool = memory_pool().await.unwrap();
        let alice = create_user(&pool, &new_user("alice", "a@example.com")).await.unwrap();
        create_user(&pool, &new_user("bob", "b@example.com")).await.unwrap();

        // Re-submitting your own email is fine.
        let same = UserUpdate {
            username: None,
            email: Some("a@example.com".into()),
        };
        assert!(update_user(&pool, alice.id, &same).await.is_ok());

        let steal = UserUpdate {
            username: None,
            email: Some("b@example.com".into()),
        };
        let err = update_user(&pool, alice.id, &steal).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict("Email already exists")));

        let rename = UserUpdate {
            username: Some("alicia".into()),
            email: None,
        };
        let updated = update_user(&pool, alice.id, &rename).await.unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, "a@example.com");

        let err = update_user(&pool, 999, &rename).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_picture_replaces_previous_file() {
        let pool = memory_pool().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let media = MediaStore::new(root.path());
        let alice = create_user(&pool, &new_user("alice", "a@example.com")).await.unwrap();

        let first = set_profile_picture(&pool, &media, alice.id, "me.png", b"one")
            .await
            .unwrap();
        let first_file = first.image_file.clone().unwrap();
        assert!(first_file.ends_with("_me.png"));
        assert_eq!(first.image_path, format!("/media/profile_pics/{first_file}"));

        let second = set_profile_picture(&pool, &media, alice.id, "me.png", b"two")
            .await
            .unwrap();
        let second_file = second.image_file.unwrap();
        assert_ne!(first_file, second_file);
        assert!(!media.dir().join(&first_file).exists());
        assert!(media.dir().join(&second_file).exists());
    }

    #[tokio::test]
    async fn profile_picture_for_missing_user_writes_nothing() {
        let pool = memory_pool().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let media = MediaStore::new(root.path());

        let err = set_profile_picture(&pool, &media, 5, "me.png", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(!media.dir().exists());
    }

    #[tokio::test]
    async fn concurrent_uploads_leave_only_the_current_file() {
        let pool = memory_pool().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let media = MediaStore::new(root.path());
        let alice = create_user(&pool, &new_user("alice", "a@example.com")).await.unwrap();
        set_profile_picture(&pool, &media, alice.id, "seed.png", b"seed")
            .await
            .unwrap();

        let (a, b, c) = tokio::join!(
            set_profile_picture(&pool, &media, alice.id, "a.png", b"a"),
            set_profile_picture(&pool, &media, alice.id, "b.png", b"b"),
            set_profile_picture(&pool, &media, alice.id, "c.png", b"c"),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let current = get_user(&pool, alice.id).await.unwrap().image_file.unwrap();
        let files: Vec<String> = std::fs::read_dir(media.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec![current]);
    }
}
