//! Input validation for message content.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Content is empty or only whitespace.
    EmptyContent,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyContent => write!(f, "message content cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate message content.
///
/// Content is valid when it has at least one non-whitespace character.
/// There is no upper length limit.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    Ok(())
}
