use thiserror::Error;

/// A required id or field was missing or malformed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("Duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    #[error("{entity} {id} is not loaded")]
    NotLoaded { entity: &'static str, id: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;
