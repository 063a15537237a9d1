use blog_db::users::UserRow;
use serde::{Deserialize, Serialize};

use crate::{check_length, Validate, ValidationError};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 120;

/// Public URL prefix for uploaded profile pictures.
pub const PROFILE_PICS_URL: &str = "/media/profile_pics";
pub const DEFAULT_PROFILE_PIC: &str = "/static/profile_pics/default.png";

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: Option<String>,
    pub image_path: String,
}

/// Public path of a user's profile picture, falling back to the bundled default.
pub fn image_path(image_file: Option<&str>) -> String {
    match image_file {
        Some(file) => format!("{}/{}", PROFILE_PICS_URL, file),
        None => DEFAULT_PROFILE_PIC.to_string(),
    }
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            image_path: image_path(row.image_file.as_deref()),
            id: row.id,
            username: row.username,
            email: row.email,
            image_file: row.image_file,
        }
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    check_length("username", username, USERNAME_MIN, Some(USERNAME_MAX))
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > EMAIL_MAX {
        return Err(ValidationError::new(
            "email",
            format!("must be at most {EMAIL_MAX} characters"),
        ));
    }
    let invalid = || ValidationError::new("email", "value is not a valid email address");
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}
