//! # Evaluation Line Model
//!
//! Reusable evaluator-role template (primary or secondary). Read-only from
//! this core's perspective; line rows are seeded by the line-management
//! surface, which is out of scope here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EvaluationLine {
    pub evaluation_line_id: i64,
    /// `PRIMARY` or `SECONDARY`; see
    /// [`EvaluatorType`](crate::constants::EvaluatorType).
    pub evaluator_type: String,
    pub line_order: i32,
    pub required: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
