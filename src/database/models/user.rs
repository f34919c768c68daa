use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[sqlx(rename = "name")]
    #[serde(rename = "name")]
    pub display_name: String,
    /// PHC-formatted argon2 hash. Empty only on a record that has not been saved yet.
    #[sqlx(rename = "password")]
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::new("username", "empty"));
        }

        Ok(())
    }
}

/// What the registration form remembers between a failed submit and the re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub name: String,
}

impl From<&User> for UserDraft {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.display_name.clone(),
        }
    }
}
