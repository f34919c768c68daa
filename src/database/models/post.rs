use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationError;

const PREVIEW_CHARS: usize = 100;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new("<.*?>").expect("static regex"));

/// A blog post. `body` is trusted HTML and is rendered without escaping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub slug: String,
    #[serde(skip)]
    pub user_id: i64,
    /// Display name of the author, filled from the users table on read.
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl Post {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.slug.is_empty() {
            return Err(ValidationError::new("slug", "invalid value"));
        }
        if self.title.is_empty() {
            return Err(ValidationError::new("title", "empty"));
        }
        if self.user_id <= 0 {
            return Err(ValidationError::new("user_id", "invalid value"));
        }

        Ok(())
    }

    /// Body with tags stripped, cut to the first 100 characters.
    pub fn preview(&self) -> String {
        HTML_TAG
            .replace_all(&self.body, "")
            .chars()
            .take(PREVIEW_CHARS)
            .collect()
    }
}

/// What the new-post form remembers between a failed submit and the re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub slug: String,
    pub title: String,
    pub body: String,
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
        }
    }
}
