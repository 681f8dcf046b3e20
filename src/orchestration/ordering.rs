//! # Ordering Engine
//!
//! Maintains the dense, zero-based `display_order` sequence of the active
//! assignments in one (employee, project, period) scope.
//!
//! ## Two-phase placement
//!
//! A new assignment is first persisted with an out-of-range sentinel order so
//! it can never collide with live orders. The placement pass then re-reads the
//! whole scope fresh, removes the new row from that snapshot, sorts the
//! remainder deterministically, splices the new row at the target index, and
//! rewrites `display_order = index` for every row whose stored value differs.
//! Recomputing from one fresh full read (instead of patching neighbor orders
//! incrementally) is what keeps the sequence consistent when the snapshot the
//! target was computed against has moved on.
//!
//! The positional rewrites are independent; they are dispatched concurrently
//! and jointly awaited.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::constants::Direction;
use crate::error::{EvaluationCoreError, Result};
use crate::models::WbsAssignment;
use crate::stores::AssignmentStore;

/// One (employee, project, period) ordering scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingScope {
    pub employee_id: i64,
    pub project_id: i64,
    pub period_id: i64,
}

impl OrderingScope {
    pub fn of(assignment: &WbsAssignment) -> Self {
        Self {
            employee_id: assignment.employee_id,
            project_id: assignment.project_id,
            period_id: assignment.period_id,
        }
    }
}

pub struct OrderingEngine {
    assignments: Arc<dyn AssignmentStore>,
}

impl OrderingEngine {
    pub fn new(assignments: Arc<dyn AssignmentStore>) -> Self {
        Self { assignments }
    }

    /// Deterministic scope order: display_order, then assigned_date for ties
    /// (sentinel rows land after live ones), then id as the final tiebreak.
    pub fn sort(rows: &mut [WbsAssignment]) {
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.assigned_date.cmp(&b.assigned_date))
                .then(a.assignment_id.cmp(&b.assignment_id))
        });
    }

    /// Resolve the requested neighbors to an insertion index against the
    /// current sorted scope. `None` means append.
    ///
    /// Both neighbors given: both must be locatable, otherwise append. Only
    /// previous: right after it, or append when unlocatable. Only next: its
    /// current index, or the start when unlocatable.
    pub fn target_index(
        previous_wbs_item_id: Option<i64>,
        next_wbs_item_id: Option<i64>,
        sorted: &[WbsAssignment],
    ) -> Option<usize> {
        let find = |wbs_item_id: i64| sorted.iter().position(|a| a.wbs_item_id == wbs_item_id);

        match (previous_wbs_item_id, next_wbs_item_id) {
            (Some(prev), Some(next)) => match (find(prev), find(next)) {
                (Some(p), Some(_)) => Some(p + 1),
                _ => None,
            },
            (Some(prev), None) => find(prev).map(|p| p + 1),
            (None, Some(next)) => Some(find(next).unwrap_or(0)),
            (None, None) => None,
        }
    }

    /// Place a freshly persisted assignment at `target` (append when `None`)
    /// and resequence the whole scope to 0..N-1.
    #[instrument(skip(self))]
    pub async fn place(
        &self,
        scope: OrderingScope,
        new_assignment_id: i64,
        target: Option<usize>,
    ) -> Result<()> {
        let mut rows = self
            .assignments
            .list_scope(scope.employee_id, scope.project_id, scope.period_id)
            .await?;

        let new_row = match rows
            .iter()
            .position(|a| a.assignment_id == new_assignment_id)
        {
            Some(pos) => Some(rows.remove(pos)),
            None => {
                warn!(
                    assignment_id = new_assignment_id,
                    "Assignment to place is no longer in its scope; resequencing without it"
                );
                None
            }
        };

        Self::sort(&mut rows);

        if let Some(row) = new_row {
            let index = target.unwrap_or(rows.len()).min(rows.len());
            rows.insert(index, row);
        }

        self.write_positions(&rows).await
    }

    /// Re-derive the dense sequence for a scope without repositioning anything.
    pub async fn normalize(&self, scope: OrderingScope) -> Result<()> {
        let mut rows = self
            .assignments
            .list_scope(scope.employee_id, scope.project_id, scope.period_id)
            .await?;
        Self::sort(&mut rows);
        self.write_positions(&rows).await
    }

    /// Move one assignment a single position up or down, clamped at the scope
    /// edges (an edge move only re-normalizes).
    #[instrument(skip(self))]
    pub async fn shift(
        &self,
        scope: OrderingScope,
        assignment_id: i64,
        direction: Direction,
    ) -> Result<()> {
        let mut rows = self
            .assignments
            .list_scope(scope.employee_id, scope.project_id, scope.period_id)
            .await?;
        Self::sort(&mut rows);

        let position = rows
            .iter()
            .position(|a| a.assignment_id == assignment_id)
            .ok_or_else(|| EvaluationCoreError::not_found("assignment", assignment_id))?;

        let last = rows.len().saturating_sub(1);
        let target = match direction {
            Direction::Up => position.saturating_sub(1),
            Direction::Down => (position + 1).min(last),
        };

        if target != position {
            let row = rows.remove(position);
            rows.insert(target, row);
        } else {
            debug!(assignment_id, ?direction, "Shift clamped at scope edge");
        }

        self.write_positions(&rows).await
    }

    /// Rewrite display_order = index for every row whose stored value differs.
    /// All writes fan out concurrently and are jointly awaited.
    async fn write_positions(&self, rows: &[WbsAssignment]) -> Result<()> {
        let writes = rows
            .iter()
            .enumerate()
            .filter(|(index, row)| row.display_order != *index as i32)
            .map(|(index, row)| {
                self.assignments
                    .update_display_order(row.assignment_id, index as i32)
            });

        let mut first_error = None;
        for result in join_all(writes).await {
            if let Err(e) = result {
                warn!(error = %e, "Positional rewrite failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
