use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("Invalid ExpectedReturn type: {0}")]
    InvalidExpectedReturn(String),

    #[error("Unsupported column type {type_name} for column '{column}'")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Expected {expected} output but routine was shaped as {actual}")]
    ShapeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
