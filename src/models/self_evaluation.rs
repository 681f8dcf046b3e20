//! # WBS Self-Evaluation Model
//!
//! An employee's own performance write-up for one (employee, period, WBS item).
//! Deleted in cascade when the corresponding assignment is cancelled.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WbsSelfEvaluation {
    pub self_evaluation_id: i64,
    pub employee_id: i64,
    pub period_id: i64,
    pub wbs_item_id: i64,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWbsSelfEvaluation {
    pub employee_id: i64,
    pub period_id: i64,
    pub wbs_item_id: i64,
    pub content: String,
}
