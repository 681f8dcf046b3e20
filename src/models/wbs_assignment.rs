//! # WBS Assignment Model
//!
//! The binding of one employee to one WBS item within one project and one
//! evaluation period. This is the primary orchestration unit of the core: the
//! lifecycle orchestrator creates and soft-deletes these rows and cascades into
//! the dependent criteria, line-mapping, and self-evaluation records.
//!
//! ## Invariants
//!
//! - At most one active (non-deleted) row per (employee_id, wbs_item_id,
//!   period_id); the store enforces this and reports violations as conflicts.
//! - `display_order` values across an active (employee_id, project_id,
//!   period_id) scope form a dense 0..N-1 sequence after every mutation. Rows
//!   are first persisted with an out-of-range sentinel order, then placed by
//!   the ordering engine.
//! - `weight` is computed by an external collaborator and never mutated here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WbsAssignment {
    pub assignment_id: i64,
    pub employee_id: i64,
    pub wbs_item_id: i64,
    pub project_id: i64,
    pub period_id: i64,
    pub display_order: i32,
    pub weight: Option<f64>,
    pub assigned_by: String,
    pub assigned_date: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl WbsAssignment {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// New assignment for creation (without generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWbsAssignment {
    pub employee_id: i64,
    pub wbs_item_id: i64,
    pub project_id: i64,
    pub period_id: i64,
    /// Initial order; the orchestrator always passes the sentinel and lets the
    /// ordering engine assign the real position.
    pub display_order: i32,
    pub assigned_by: String,
    /// Defaults to NOW() when not provided.
    pub assigned_date: Option<NaiveDateTime>,
}
