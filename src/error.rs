//! # Error Types
//!
//! Structured error handling for the assignment lifecycle core using thiserror
//! instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy follows the operation contracts: `NotFound` and `Conflict`
//! surface to callers, `Database`/`Configuration`/`Validation` wrap collaborator
//! failures. Non-fatal sub-step failures (self-evaluation cleanup, activity
//! logging, per-item bulk work) are never represented here; they are caught
//! and logged at the orchestration layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationCoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate {entity}: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("Database error during {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EvaluationCoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, detail: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            detail: detail.into(),
        }
    }

    pub fn database(operation: impl Into<String>, source: &sqlx::Error) -> Self {
        Self::Database {
            operation: operation.into(),
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvaluationCoreError>;
