//! # Evaluation Line Mapping Model
//!
//! A concrete binding of one evaluator to one employee for one period through
//! one evaluation line. `wbs_item_id = None` encodes an employee-level fixed
//! evaluator (used for PRIMARY); a non-null `wbs_item_id` encodes a per-WBS
//! evaluator (used for SECONDARY).
//!
//! `evaluator_id` is always an internal employee id: the auto-configurator
//! resolves external references before writing a mapping.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EvaluationLineMapping {
    pub mapping_id: i64,
    pub period_id: i64,
    pub employee_id: i64,
    /// Internal id of the evaluating employee.
    pub evaluator_id: i64,
    pub evaluation_line_id: i64,
    /// None = employee-level fixed evaluator; Some = per-WBS evaluator.
    pub wbs_item_id: Option<i64>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvaluationLineMapping {
    pub period_id: i64,
    pub employee_id: i64,
    pub evaluator_id: i64,
    pub evaluation_line_id: i64,
    pub wbs_item_id: Option<i64>,
    pub created_by: String,
}
