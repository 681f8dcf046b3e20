//! # Store Seams
//!
//! Async trait boundaries for the durable collections the orchestrator
//! coordinates. Persistence is an external collaborator: the orchestration
//! layer only ever sees these traits, so it runs unchanged against the
//! Postgres implementations ([`postgres`]) and the in-process ones
//! ([`memory`]).
//!
//! All soft-deleting stores are idempotent at this layer: deleting an
//! already-deleted row reports zero rows affected rather than an error.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::EvaluatorType;
use crate::error::Result;
use crate::identity::ExternalId;
use crate::models::{
    Employee, EvaluationLine, EvaluationLineMapping, NewEvaluationLineMapping,
    NewWbsAssignment, NewWbsEvaluationCriteria, NewWbsItem, NewWbsSelfEvaluation, Project,
    WbsAssignment, WbsEvaluationCriteria, WbsItem, WbsSelfEvaluation,
};

/// Durable collection of WBS-assignment rows for a period.
///
/// Finders return active (non-deleted) rows only; cancelled rows stay in the
/// store under their soft-delete marker.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Persist a new assignment. A second active row for the same
    /// (employee, wbs_item, period) natural key is a
    /// [`Conflict`](crate::error::EvaluationCoreError::Conflict).
    async fn create(&self, new: NewWbsAssignment) -> Result<WbsAssignment>;

    async fn find_by_id(&self, assignment_id: i64) -> Result<Option<WbsAssignment>>;

    async fn find_active_by_key(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Option<WbsAssignment>>;

    /// Active rows of one ordering scope, unsorted; the ordering engine owns
    /// the deterministic sort.
    async fn list_scope(
        &self,
        employee_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>>;

    async fn list_by_period(&self, period_id: i64) -> Result<Vec<WbsAssignment>>;

    async fn list_by_project(&self, project_id: i64, period_id: i64)
        -> Result<Vec<WbsAssignment>>;

    async fn list_by_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>>;

    /// Whether any active assignment other than `excluding_assignment_id`
    /// still references (wbs_item, period), across all employees.
    async fn other_active_for_item(
        &self,
        wbs_item_id: i64,
        period_id: i64,
        excluding_assignment_id: i64,
    ) -> Result<bool>;

    async fn count_active_for_item(&self, wbs_item_id: i64, period_id: i64) -> Result<i64>;

    async fn update_display_order(&self, assignment_id: i64, display_order: i32) -> Result<()>;

    /// Soft-delete one assignment. Returns `false` when the row was already
    /// deleted or never existed.
    async fn soft_delete(&self, assignment_id: i64) -> Result<bool>;
}

/// Shared, WBS-item-scoped evaluation criteria rows.
#[async_trait]
pub trait CriteriaStore: Send + Sync {
    async fn count_for_item(&self, wbs_item_id: i64) -> Result<i64>;

    async fn list_for_item(&self, wbs_item_id: i64) -> Result<Vec<WbsEvaluationCriteria>>;

    async fn create(&self, new: NewWbsEvaluationCriteria) -> Result<WbsEvaluationCriteria>;

    /// Orphan collection: remove every criteria row for the item. Returns the
    /// number of rows removed.
    async fn delete_all_for_item(&self, wbs_item_id: i64) -> Result<u64>;
}

/// Evaluator-role templates. Read-only from this core's perspective.
#[async_trait]
pub trait EvaluationLineStore: Send + Sync {
    async fn find_by_type(&self, evaluator_type: EvaluatorType) -> Result<Option<EvaluationLine>>;
}

/// Concrete (period, employee, evaluator, optional WBS item) bindings.
#[async_trait]
pub trait LineMappingStore: Send + Sync {
    /// The employee-level fixed mapping (wbs_item = NULL) for one line, if any.
    async fn find_employee_level(
        &self,
        employee_id: i64,
        period_id: i64,
        evaluation_line_id: i64,
    ) -> Result<Option<EvaluationLineMapping>>;

    async fn create(&self, new: NewEvaluationLineMapping) -> Result<EvaluationLineMapping>;

    /// Delete the per-WBS mappings for (employee, wbs_item, period). The
    /// employee-level mapping is out of reach by construction.
    async fn delete_for_wbs(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
    ) -> Result<u64>;

    async fn list_for_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<EvaluationLineMapping>>;
}

/// Employee-authored per-WBS performance write-ups.
#[async_trait]
pub trait SelfEvaluationStore: Send + Sync {
    async fn create(&self, new: NewWbsSelfEvaluation) -> Result<WbsSelfEvaluation>;

    async fn delete_for(
        &self,
        employee_id: i64,
        period_id: i64,
        wbs_item_id: i64,
    ) -> Result<u64>;

    async fn list_for(&self, employee_id: i64, period_id: i64)
        -> Result<Vec<WbsSelfEvaluation>>;
}

/// WBS items themselves; created here only by insert-between.
#[async_trait]
pub trait WbsItemStore: Send + Sync {
    async fn create(&self, new: NewWbsItem) -> Result<WbsItem>;

    async fn find_by_id(&self, wbs_item_id: i64) -> Result<Option<WbsItem>>;
}

/// Read-only employee directory mirror.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_by_id(&self, employee_id: i64) -> Result<Option<Employee>>;

    async fn find_by_external_id(&self, external_id: &ExternalId) -> Result<Option<Employee>>;
}

/// Read-only project records.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_by_id(&self, project_id: i64) -> Result<Option<Project>>;
}

/// Handle bundle passed to the orchestration components.
#[derive(Clone)]
pub struct Stores {
    pub assignments: Arc<dyn AssignmentStore>,
    pub criteria: Arc<dyn CriteriaStore>,
    pub evaluation_lines: Arc<dyn EvaluationLineStore>,
    pub line_mappings: Arc<dyn LineMappingStore>,
    pub self_evaluations: Arc<dyn SelfEvaluationStore>,
    pub wbs_items: Arc<dyn WbsItemStore>,
    pub employees: Arc<dyn EmployeeStore>,
    pub projects: Arc<dyn ProjectStore>,
}
