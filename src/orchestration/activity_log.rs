//! # Activity Log Sink
//!
//! Fire-and-forget recording of lifecycle events. The orchestrator treats the
//! sink as best-effort: a failed `record` call is logged with context and
//! never fails the parent operation.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EvaluationCoreError, Result};

/// One recorded lifecycle event, with the ids involved and a free-form detail
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub action: String,
    pub actor: String,
    pub employee_id: Option<i64>,
    pub wbs_item_id: Option<i64>,
    pub project_id: Option<i64>,
    pub period_id: Option<i64>,
    pub detail: serde_json::Value,
}

impl ActivityEvent {
    pub fn new(action: &str, actor: &str) -> Self {
        Self {
            action: action.to_string(),
            actor: actor.to_string(),
            employee_id: None,
            wbs_item_id: None,
            project_id: None,
            period_id: None,
            detail: serde_json::Value::Null,
        }
    }

    pub fn employee(mut self, employee_id: i64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn wbs_item(mut self, wbs_item_id: i64) -> Self {
        self.wbs_item_id = Some(wbs_item_id);
        self
    }

    pub fn project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn period(mut self, period_id: i64) -> Self {
        self.period_id = Some(period_id);
        self
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Activity-log collaborator. Implementations may deliver to a database, a
/// message queue, or anywhere else; the orchestrator only sees this seam.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, event: ActivityEvent) -> Result<()>;
}

/// Default sink that emits events as structured tracing records.
#[derive(Default)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivityLog for TracingActivityLog {
    async fn record(&self, event: ActivityEvent) -> Result<()> {
        info!(
            action = %event.action,
            actor = %event.actor,
            employee_id = ?event.employee_id,
            wbs_item_id = ?event.wbs_item_id,
            project_id = ?event.project_id,
            period_id = ?event.period_id,
            "activity recorded"
        );
        Ok(())
    }
}

/// Recording sink for tests and local runs.
#[derive(Default)]
pub struct MemoryActivityLog {
    events: RwLock<Vec<ActivityEvent>>,
}

impl MemoryActivityLog {
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn record(&self, event: ActivityEvent) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }
}

/// Sink that always fails, for exercising the best-effort contract.
#[derive(Default)]
pub struct FailingActivityLog;

#[async_trait]
impl ActivityLog for FailingActivityLog {
    async fn record(&self, _event: ActivityEvent) -> Result<()> {
        Err(EvaluationCoreError::Validation(
            "activity log unavailable".to_string(),
        ))
    }
}
