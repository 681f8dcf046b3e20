//! # Assignment Lifecycle Orchestrator
//!
//! Top-level coordinator for WBS-to-employee assignments within one evaluation
//! period: create, cancel, bulk-assign, reorder, insert-between, and reset,
//! plus the read surface. Each operation sequences its dependent-entity
//! cascade in a fixed order and tolerates non-fatal sub-step failures:
//! self-evaluation cleanup, activity logging, per-item bulk work, and the
//! peer-evaluation collaborator are caught and logged, never propagated. Only
//! `NotFound` and `Conflict` surface to callers, and cancellation defines
//! not-found as a successful no-op.
//!
//! No transaction spans a cascade. Each step commits independently and is
//! individually idempotent, so a crash mid-cascade leaves at worst a
//! stale-but-harmless row (e.g. an unreferenced criteria placeholder), never a
//! criteria row deleted while still in use: the orphan check is re-evaluated
//! fresh at delete-decision time.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::OrchestrationConfig;
use crate::constants::{actions, Direction};
use crate::error::{EvaluationCoreError, Result};
use crate::identity::IdentityResolver;
use crate::models::{
    NewWbsAssignment, NewWbsEvaluationCriteria, NewWbsItem, WbsAssignment, WbsItem,
};
use crate::orchestration::activity_log::{ActivityEvent, ActivityLog};
use crate::orchestration::evaluator_config::EvaluatorAutoConfigurator;
use crate::orchestration::ordering::{OrderingEngine, OrderingScope};
use crate::stores::Stores;

/// External collaborator that wires per-WBS peer evaluation lines after an
/// assignment is created. Invoked best-effort.
#[async_trait]
pub trait PeerEvaluationSetup: Send + Sync {
    async fn setup(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
        created_by: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignWbsRequest {
    pub employee_id: i64,
    pub wbs_item_id: i64,
    pub project_id: i64,
    pub period_id: i64,
    pub assigned_by: String,
}

/// One entry of a bulk assignment batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignmentItem {
    pub employee_id: i64,
    pub wbs_item_id: i64,
    pub project_id: i64,
    pub period_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertBetweenRequest {
    pub title: String,
    pub project_id: i64,
    pub employee_id: i64,
    pub period_id: i64,
    pub previous_wbs_item_id: Option<i64>,
    pub next_wbs_item_id: Option<i64>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertBetweenResult {
    pub wbs_item: WbsItem,
    pub assignment: WbsAssignment,
}

pub struct AssignmentOrchestrator {
    stores: Stores,
    evaluator_config: EvaluatorAutoConfigurator,
    ordering: OrderingEngine,
    activity_log: Arc<dyn ActivityLog>,
    peer_setup: Option<Arc<dyn PeerEvaluationSetup>>,
    config: OrchestrationConfig,
}

impl AssignmentOrchestrator {
    pub fn new(
        stores: Stores,
        resolver: Arc<dyn IdentityResolver>,
        activity_log: Arc<dyn ActivityLog>,
        config: OrchestrationConfig,
    ) -> Self {
        let evaluator_config = EvaluatorAutoConfigurator::new(stores.clone(), resolver);
        let ordering = OrderingEngine::new(stores.assignments.clone());
        Self {
            stores,
            evaluator_config,
            ordering,
            activity_log,
            peer_setup: None,
            config,
        }
    }

    pub fn with_peer_setup(mut self, peer_setup: Arc<dyn PeerEvaluationSetup>) -> Self {
        self.peer_setup = Some(peer_setup);
        self
    }

    /// Assign one WBS item to one employee and wire the dependent records.
    ///
    /// Cascade order: persist (sentinel order), append-place, criteria
    /// placeholder, evaluator auto-configuration, peer-line collaborator
    /// (best-effort), activity log (best-effort). A duplicate active key
    /// surfaces as `Conflict` unchanged.
    #[instrument(skip(self, request), fields(
        employee_id = request.employee_id,
        wbs_item_id = request.wbs_item_id,
        period_id = request.period_id
    ))]
    pub async fn assign_wbs(&self, request: AssignWbsRequest) -> Result<WbsAssignment> {
        let assignment = self
            .stores
            .assignments
            .create(NewWbsAssignment {
                employee_id: request.employee_id,
                wbs_item_id: request.wbs_item_id,
                project_id: request.project_id,
                period_id: request.period_id,
                display_order: self.config.display_order_sentinel,
                assigned_by: request.assigned_by.clone(),
                assigned_date: None,
            })
            .await?;
        info!(assignment_id = assignment.assignment_id, "Created assignment");

        self.ordering
            .place(OrderingScope::of(&assignment), assignment.assignment_id, None)
            .await?;

        self.ensure_criteria_placeholder(request.wbs_item_id).await?;

        self.evaluator_config
            .configure(
                request.employee_id,
                request.wbs_item_id,
                request.project_id,
                request.period_id,
                &request.assigned_by,
            )
            .await?;

        self.trigger_peer_setup(
            request.employee_id,
            request.wbs_item_id,
            request.period_id,
            &request.assigned_by,
        )
        .await;

        self.record_activity(
            ActivityEvent::new(actions::WBS_ASSIGNED, &request.assigned_by)
                .employee(request.employee_id)
                .wbs_item(request.wbs_item_id)
                .project(request.project_id)
                .period(request.period_id),
        )
        .await;

        // Re-read so the caller sees the placed display order.
        Ok(self
            .stores
            .assignments
            .find_by_id(assignment.assignment_id)
            .await?
            .unwrap_or(assignment))
    }

    /// Cancel one assignment. Idempotent: an unknown or already-cancelled id
    /// is a successful no-op.
    ///
    /// Cascade order when found: self-evaluation cleanup (caught), orphan
    /// criteria collection, per-WBS line-mapping cleanup, soft delete,
    /// activity log (caught). Self-evaluation cleanup runs first because its
    /// failure must never prevent the later cleanups from being attempted.
    #[instrument(skip(self, cancelled_by))]
    pub async fn cancel_assignment(&self, assignment_id: i64, cancelled_by: &str) -> Result<()> {
        let Some(assignment) = self.stores.assignments.find_by_id(assignment_id).await? else {
            info!(assignment_id, "Cancellation target not found; nothing to do");
            return Ok(());
        };

        if let Err(e) = self
            .stores
            .self_evaluations
            .delete_for(
                assignment.employee_id,
                assignment.period_id,
                assignment.wbs_item_id,
            )
            .await
        {
            warn!(
                assignment_id,
                employee_id = assignment.employee_id,
                error = %e,
                "Self-evaluation cleanup failed; continuing cancellation"
            );
        }

        // Criteria are shared per WBS item: collect them only when no other
        // active assignment in the period still references the item.
        let still_referenced = self
            .stores
            .assignments
            .other_active_for_item(
                assignment.wbs_item_id,
                assignment.period_id,
                assignment.assignment_id,
            )
            .await?;
        if !still_referenced {
            let removed = self
                .stores
                .criteria
                .delete_all_for_item(assignment.wbs_item_id)
                .await?;
            debug!(
                wbs_item_id = assignment.wbs_item_id,
                removed, "Removed orphaned criteria"
            );
        }

        // Per-WBS secondary binding only; the employee-level primary mapping
        // (wbs_item = NULL) is not WBS-specific and stays.
        self.stores
            .line_mappings
            .delete_for_wbs(
                assignment.employee_id,
                assignment.wbs_item_id,
                assignment.period_id,
            )
            .await?;

        self.stores
            .assignments
            .soft_delete(assignment.assignment_id)
            .await?;

        self.ordering
            .normalize(OrderingScope::of(&assignment))
            .await?;

        self.record_activity(
            ActivityEvent::new(actions::WBS_ASSIGNMENT_CANCELLED, cancelled_by)
                .employee(assignment.employee_id)
                .wbs_item(assignment.wbs_item_id)
                .project(assignment.project_id)
                .period(assignment.period_id),
        )
        .await;

        Ok(())
    }

    /// Cancel by natural key: resolve to an id, then delegate. An unresolvable
    /// key is a successful no-op.
    pub async fn cancel_assignment_by_key(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
        cancelled_by: &str,
    ) -> Result<()> {
        match self
            .stores
            .assignments
            .find_active_by_key(employee_id, wbs_item_id, project_id, period_id)
            .await?
        {
            Some(assignment) => {
                self.cancel_assignment(assignment.assignment_id, cancelled_by)
                    .await
            }
            None => {
                info!(
                    employee_id,
                    wbs_item_id, period_id, "No active assignment for key; nothing to do"
                );
                Ok(())
            }
        }
    }

    /// Create a batch of assignments with partial-success semantics: a single
    /// item's creation, criteria, or evaluator-configuration failure is caught
    /// and logged, and the caller receives only the successfully created
    /// assignments.
    #[instrument(skip(self, items, assigned_by), fields(batch_size = items.len()))]
    pub async fn bulk_assign(
        &self,
        items: Vec<BulkAssignmentItem>,
        assigned_by: &str,
    ) -> Result<Vec<WbsAssignment>> {
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            let new = NewWbsAssignment {
                employee_id: item.employee_id,
                wbs_item_id: item.wbs_item_id,
                project_id: item.project_id,
                period_id: item.period_id,
                display_order: self.config.display_order_sentinel,
                assigned_by: assigned_by.to_string(),
                assigned_date: None,
            };
            match self.stores.assignments.create(new).await {
                Ok(assignment) => created.push(assignment),
                Err(e) => warn!(
                    employee_id = item.employee_id,
                    wbs_item_id = item.wbs_item_id,
                    error = %e,
                    "Bulk item creation failed; continuing batch"
                ),
            }
        }

        // One resequencing pass per affected scope.
        let scopes: BTreeSet<(i64, i64, i64)> = created
            .iter()
            .map(|a| (a.employee_id, a.project_id, a.period_id))
            .collect();
        for (employee_id, project_id, period_id) in scopes {
            self.ordering
                .normalize(OrderingScope {
                    employee_id,
                    project_id,
                    period_id,
                })
                .await?;
        }

        // Deduplicate before placeholder creation: items shared across the
        // batch get one criteria row, not one per assignment.
        let item_ids: BTreeSet<i64> = created.iter().map(|a| a.wbs_item_id).collect();
        for wbs_item_id in item_ids {
            if let Err(e) = self.ensure_criteria_placeholder(wbs_item_id).await {
                warn!(
                    wbs_item_id,
                    error = %e,
                    "Criteria placeholder creation failed for bulk item; continuing batch"
                );
            }
        }

        let configs = created.iter().map(|a| {
            self.evaluator_config.configure(
                a.employee_id,
                a.wbs_item_id,
                a.project_id,
                a.period_id,
                assigned_by,
            )
        });
        for (assignment, result) in created.iter().zip(join_all(configs).await) {
            if let Err(e) = result {
                warn!(
                    assignment_id = assignment.assignment_id,
                    employee_id = assignment.employee_id,
                    error = %e,
                    "Evaluator configuration failed for bulk item; continuing batch"
                );
            }
        }

        let logs = created.iter().map(|a| {
            self.record_activity(
                ActivityEvent::new(actions::WBS_BULK_ASSIGNED, assigned_by)
                    .employee(a.employee_id)
                    .wbs_item(a.wbs_item_id)
                    .project(a.project_id)
                    .period(a.period_id),
            )
        });
        join_all(logs).await;

        info!(
            requested = items.len(),
            created = created.len(),
            "Bulk assignment completed"
        );
        Ok(created)
    }

    /// Move one assignment a single position within its scope. Unknown id is
    /// `NotFound`; a move past the scope edge is a no-op.
    #[instrument(skip(self, updated_by))]
    pub async fn change_order(
        &self,
        assignment_id: i64,
        direction: Direction,
        updated_by: &str,
    ) -> Result<WbsAssignment> {
        let assignment = self
            .stores
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| EvaluationCoreError::not_found("assignment", assignment_id))?;

        self.ordering
            .shift(OrderingScope::of(&assignment), assignment_id, direction)
            .await?;

        self.record_activity(
            ActivityEvent::new(actions::WBS_ORDER_CHANGED, updated_by)
                .employee(assignment.employee_id)
                .wbs_item(assignment.wbs_item_id)
                .project(assignment.project_id)
                .period(assignment.period_id)
                .detail(serde_json::json!({ "direction": direction })),
        )
        .await;

        self.stores
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| EvaluationCoreError::not_found("assignment", assignment_id))
    }

    /// Create a new WBS item and its assignment, positioned relative to the
    /// optional previous/next neighbors.
    ///
    /// The target index is computed against the pre-insert snapshot; the new
    /// row is persisted with the sentinel order and the placement pass then
    /// resequences the scope from a fresh read.
    #[instrument(skip(self, request), fields(
        employee_id = request.employee_id,
        project_id = request.project_id,
        period_id = request.period_id
    ))]
    pub async fn insert_between(
        &self,
        request: InsertBetweenRequest,
    ) -> Result<InsertBetweenResult> {
        let mut current = self
            .stores
            .assignments
            .list_scope(request.employee_id, request.project_id, request.period_id)
            .await?;
        OrderingEngine::sort(&mut current);
        let target = OrderingEngine::target_index(
            request.previous_wbs_item_id,
            request.next_wbs_item_id,
            &current,
        );

        let wbs_item = self
            .stores
            .wbs_items
            .create(NewWbsItem {
                project_id: request.project_id,
                title: request.title.clone(),
                created_by: request.created_by.clone(),
            })
            .await?;

        let assignment = self
            .stores
            .assignments
            .create(NewWbsAssignment {
                employee_id: request.employee_id,
                wbs_item_id: wbs_item.wbs_item_id,
                project_id: request.project_id,
                period_id: request.period_id,
                display_order: self.config.display_order_sentinel,
                assigned_by: request.created_by.clone(),
                assigned_date: None,
            })
            .await?;

        self.ordering
            .place(
                OrderingScope::of(&assignment),
                assignment.assignment_id,
                target,
            )
            .await?;

        self.ensure_criteria_placeholder(wbs_item.wbs_item_id).await?;

        self.evaluator_config
            .configure(
                request.employee_id,
                wbs_item.wbs_item_id,
                request.project_id,
                request.period_id,
                &request.created_by,
            )
            .await?;

        self.trigger_peer_setup(
            request.employee_id,
            wbs_item.wbs_item_id,
            request.period_id,
            &request.created_by,
        )
        .await;

        self.record_activity(
            ActivityEvent::new(actions::WBS_INSERTED, &request.created_by)
                .employee(request.employee_id)
                .wbs_item(wbs_item.wbs_item_id)
                .project(request.project_id)
                .period(request.period_id)
                .detail(serde_json::json!({ "title": request.title })),
        )
        .await;

        let assignment = self
            .stores
            .assignments
            .find_by_id(assignment.assignment_id)
            .await?
            .unwrap_or(assignment);

        Ok(InsertBetweenResult {
            wbs_item,
            assignment,
        })
    }

    /// Remove every assignment of the period and orphan-collect criteria.
    #[instrument(skip(self, reset_by))]
    pub async fn reset_by_period(&self, period_id: i64, reset_by: &str) -> Result<()> {
        let affected = self.stores.assignments.list_by_period(period_id).await?;
        self.reset_assignments(
            affected,
            period_id,
            reset_by,
            serde_json::json!({ "scope": "period" }),
        )
        .await
    }

    /// Remove every assignment of the project within the period.
    #[instrument(skip(self, reset_by))]
    pub async fn reset_by_project(
        &self,
        project_id: i64,
        period_id: i64,
        reset_by: &str,
    ) -> Result<()> {
        let affected = self
            .stores
            .assignments
            .list_by_project(project_id, period_id)
            .await?;
        self.reset_assignments(
            affected,
            period_id,
            reset_by,
            serde_json::json!({ "scope": "project", "project_id": project_id }),
        )
        .await
    }

    /// Remove every assignment of the employee within the period.
    #[instrument(skip(self, reset_by))]
    pub async fn reset_by_employee(
        &self,
        employee_id: i64,
        period_id: i64,
        reset_by: &str,
    ) -> Result<()> {
        let affected = self
            .stores
            .assignments
            .list_by_employee(employee_id, period_id)
            .await?;
        self.reset_assignments(
            affected,
            period_id,
            reset_by,
            serde_json::json!({ "scope": "employee", "employee_id": employee_id }),
        )
        .await
    }

    // Read surface.

    pub async fn get_assignment(&self, assignment_id: i64) -> Result<WbsAssignment> {
        self.stores
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| EvaluationCoreError::not_found("assignment", assignment_id))
    }

    /// Active assignments of one employee in one period, ordered by project
    /// then display order.
    pub async fn list_by_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        let mut rows = self
            .stores
            .assignments
            .list_by_employee(employee_id, period_id)
            .await?;
        rows.sort_by_key(|a| (a.project_id, a.display_order, a.assignment_id));
        Ok(rows)
    }

    /// Active assignments of one project in one period, ordered by employee
    /// then display order.
    pub async fn list_by_project(
        &self,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        let mut rows = self
            .stores
            .assignments
            .list_by_project(project_id, period_id)
            .await?;
        rows.sort_by_key(|a| (a.employee_id, a.display_order, a.assignment_id));
        Ok(rows)
    }

    pub async fn list_by_period(&self, period_id: i64) -> Result<Vec<WbsAssignment>> {
        let mut rows = self.stores.assignments.list_by_period(period_id).await?;
        rows.sort_by_key(|a| (a.employee_id, a.project_id, a.display_order, a.assignment_id));
        Ok(rows)
    }

    // Cascade helpers.

    /// The affected WBS item ids must be captured from the pre-delete set:
    /// after the bulk delete that information is unrecoverable.
    async fn reset_assignments(
        &self,
        affected: Vec<WbsAssignment>,
        period_id: i64,
        reset_by: &str,
        detail: serde_json::Value,
    ) -> Result<()> {
        if affected.is_empty() {
            info!(period_id, "No assignments in reset scope; nothing to do");
            return Ok(());
        }

        let item_ids: BTreeSet<i64> = affected.iter().map(|a| a.wbs_item_id).collect();

        let deletes = affected
            .iter()
            .map(|a| self.stores.assignments.soft_delete(a.assignment_id));
        let mut first_error = None;
        for result in join_all(deletes).await {
            if let Err(e) = result {
                warn!(error = %e, "Assignment delete failed during reset");
                first_error.get_or_insert(e);
            }
        }

        // Orphan collection runs even after a partial delete failure: the
        // per-item check is re-evaluated fresh, so an item whose delete failed
        // still counts as referenced and keeps its criteria.
        for wbs_item_id in item_ids {
            if self
                .stores
                .assignments
                .count_active_for_item(wbs_item_id, period_id)
                .await?
                == 0
            {
                self.stores.criteria.delete_all_for_item(wbs_item_id).await?;
            }
        }

        self.record_activity(
            ActivityEvent::new(actions::WBS_ASSIGNMENTS_RESET, reset_by)
                .period(period_id)
                .detail(detail),
        )
        .await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Lazily create the placeholder criteria row on first assignment, so the
    /// criteria-editing surface always has a row to edit.
    async fn ensure_criteria_placeholder(&self, wbs_item_id: i64) -> Result<()> {
        if self.stores.criteria.count_for_item(wbs_item_id).await? == 0 {
            self.stores
                .criteria
                .create(NewWbsEvaluationCriteria {
                    wbs_item_id,
                    criteria: String::new(),
                    importance: self.config.default_criteria_importance,
                })
                .await?;
            debug!(wbs_item_id, "Created criteria placeholder");
        }
        Ok(())
    }

    async fn trigger_peer_setup(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
        created_by: &str,
    ) {
        if let Some(peer_setup) = &self.peer_setup {
            if let Err(e) = peer_setup
                .setup(employee_id, wbs_item_id, period_id, created_by)
                .await
            {
                warn!(
                    employee_id,
                    wbs_item_id,
                    error = %e,
                    "Peer evaluation line setup failed; continuing"
                );
            }
        }
    }

    async fn record_activity(&self, event: ActivityEvent) {
        let action = event.action.clone();
        if let Err(e) = self.activity_log.record(event).await {
            warn!(action = %action, error = %e, "Activity log write failed; continuing");
        }
    }
}
