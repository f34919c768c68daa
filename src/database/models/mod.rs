pub mod post;
pub mod user;

pub use post::{Post, PostDraft};
pub use user::{User, UserDraft};

use thiserror::Error;

/// A domain rule violated by one input attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
