use blog_db::posts::PostWithAuthorRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::{image_path, UserResponse};
use crate::{check_length, Validate, ValidationError};

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const CONTENT_MIN: usize = 10;

/// Body for creating a post or replacing one in full.
#[derive(Debug, Clone, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub content: String,
    // Supplied by the client until requests carry an authenticated identity.
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub date_posted: DateTime<Utc>,
    pub author: UserResponse,
}

impl From<PostWithAuthorRow> for PostResponse {
    fn from(row: PostWithAuthorRow) -> Self {
        let author = UserResponse {
            id: row.user_id,
            image_path: image_path(row.author_image_file.as_deref()),
            username: row.author_username,
            email: row.author_email,
            image_file: row.author_image_file,
        };
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            date_posted: row.date_posted,
            author,
        }
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    check_length("title", title, TITLE_MIN, Some(TITLE_MAX))
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
    check_length("content", content, CONTENT_MIN, None)
}

impl Validate for PostCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

impl Validate for PostUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_bounds() {
        let post = |title: &str, content: &str| PostCreate {
            title: title.into(),
            content: content.into(),
            user_id: 1,
        };
        assert!(post("Hey", "0123456789").validate().is_ok());
        assert_eq!(post("Hi", "0123456789").validate().unwrap_err().field, "title");
        assert_eq!(post("Hello", "too short").validate().unwrap_err().field, "content");
        assert!(post(&"t".repeat(101), "0123456789").validate().is_err());
    }

    #[test]
    fn partial_update_skips_absent_fields() {
        let update: PostUpdate = serde_json::from_str(r#"{"title": "New title"}"#).unwrap();
        assert!(update.content.is_none());
        assert!(update.validate().is_ok());

        let update: PostUpdate = serde_json::from_str(r#"{"content": "short"}"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn response_embeds_author() {
        let row = PostWithAuthorRow {
            id: 7,
            title: "Title".into(),
            content: "Body text here".into(),
            user_id: 3,
            date_posted: Utc::now(),
            author_username: "carol".into(),
            author_email: "c@example.com".into(),
            author_image_file: None,
        };
        let response = PostResponse::from(row);
        assert_eq!(response.author.id, 3);
        assert_eq!(response.author.username, "carol");
        assert_eq!(response.author.image_path, "/static/profile_pics/default.png");
    }
}
