//! # WBS Item Model
//!
//! One unit of work in a project's work-breakdown structure. Items are created
//! here only by the insert-between operation; everything else consumes them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WbsItem {
    pub wbs_item_id: i64,
    pub project_id: i64,
    pub title: String,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New WBS item for creation (without generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWbsItem {
    pub project_id: i64,
    pub title: String,
    pub created_by: String,
}
