//! Error types for BunnySteps
//!
//! All errors use thiserror for structured error handling.
//! Errors serialize to their display string so an API layer can hand
//! them to clients unchanged; `status_code` gives the matching HTTP status.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Absent, or owned by someone else. The two cases are reported the same way.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Warning! Adding this item exceeds your budget of {budget_cents} cents (projected {projected_cents})")]
    BudgetExceeded {
        budget_cents: i64,
        projected_cents: i64,
    },

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// HTTP status an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound { .. } => 404,
            AppError::Conflict(_) => 409,
            AppError::Validation(_) | AppError::BudgetExceeded { .. } => 400,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Generic(_) => 500,
        }
    }
}

/// Check if a sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// Map a unique-constraint failure to `Conflict`, anything else to `Database`
pub fn conflict_on_unique(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(message.into())
    } else {
        AppError::Database(e)
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("Task", "abc").status_code(), 404);
        assert_eq!(AppError::Conflict("session already ended".into()).status_code(), 409);
        assert_eq!(AppError::Validation("mode is required".into()).status_code(), 400);
        assert_eq!(
            AppError::BudgetExceeded {
                budget_cents: 100_000,
                projected_cents: 100_500
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::not_found("Focus session", "42");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Focus session not found: 42\"");
    }
}
