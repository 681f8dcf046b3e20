//! # Employee Model
//!
//! Read-only mirror of the employee directory consumed by evaluator
//! auto-configuration and identity resolution.
//!
//! ## Identifier spaces
//!
//! `employee_id` is the internal primary key. `external_id` and
//! `manager_external_id` carry identifiers minted by the external HR source
//! system; they are typed [`ExternalId`](crate::identity::ExternalId) so they
//! can never be compared against internal ids without going through the
//! identity resolver first.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::ExternalId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub employee_id: i64,
    pub name: String,
    /// This employee's identifier in the external organizational system.
    pub external_id: ExternalId,
    /// The employee's manager, as an external reference. May be absent for
    /// top-of-hierarchy employees.
    pub manager_external_id: Option<ExternalId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
