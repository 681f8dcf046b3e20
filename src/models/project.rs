//! # Project Model
//!
//! Read-only project record. The project manager may arrive pre-resolved
//! (`manager_employee_id`) or only as an external reference
//! (`manager_external_id`); evaluator auto-configuration handles both shapes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::ExternalId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    /// Internal id of the project manager, when already resolved upstream.
    pub manager_employee_id: Option<i64>,
    /// External reference to the project manager, when not yet resolved.
    pub manager_external_id: Option<ExternalId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
