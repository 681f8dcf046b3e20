//! # WBS Evaluation Criteria Model
//!
//! A criteria-and-importance pair scoped to a WBS item only. Criteria are
//! shared across every employee assigned to the item, so they are an
//! orphan-collected shared resource: the orchestrator lazily creates an empty
//! placeholder on first assignment and deletes all rows for an item only when
//! the last active assignment referencing it in the period is removed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WbsEvaluationCriteria {
    pub criteria_id: i64,
    pub wbs_item_id: i64,
    pub criteria: String,
    pub importance: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWbsEvaluationCriteria {
    pub wbs_item_id: i64,
    pub criteria: String,
    pub importance: i32,
}
