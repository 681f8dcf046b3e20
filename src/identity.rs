//! # Identity Resolution
//!
//! Organizational-hierarchy references (an employee's manager, a project's
//! manager) originate in an external HR source system and carry that system's
//! identifiers, not our internal primary keys. The two identifier spaces must
//! never be compared or persisted interchangeably.
//!
//! `ExternalId` is the tagged type for the external space: comparing it against
//! an internal `i64` is a compile error, which turns an entire class of latent
//! runtime bugs into type errors. Every external reference goes through an
//! [`IdentityResolver`] before any equality test or mapping creation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Employee;
use crate::stores::EmployeeStore;

/// An identifier minted by the external organizational source system.
///
/// Opaque by design: the only way to turn it into something comparable with
/// internal records is [`IdentityResolver::resolve_external_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Translates an externally sourced organizational reference into the internal
/// employee record, when one exists.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_external_id(&self, external_id: &ExternalId) -> Result<Option<Employee>>;
}

/// Resolver backed by the employee directory mirror in the local store.
pub struct DirectoryIdentityResolver {
    employees: Arc<dyn EmployeeStore>,
}

impl DirectoryIdentityResolver {
    pub fn new(employees: Arc<dyn EmployeeStore>) -> Self {
        Self { employees }
    }
}

#[async_trait]
impl IdentityResolver for DirectoryIdentityResolver {
    async fn resolve_external_id(&self, external_id: &ExternalId) -> Result<Option<Employee>> {
        self.employees.find_by_external_id(external_id).await
    }
}
