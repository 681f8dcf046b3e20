//! # In-Process Stores
//!
//! One [`MemoryStore`] implements every store seam behind a single
//! `parking_lot::RwLock`. It enforces the same invariants the Postgres layer
//! does (active-key uniqueness, idempotent soft deletion), which makes the
//! conflict and cascade paths of the orchestrator testable without a database.
//! Embedders without persistence can use it directly.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::constants::EvaluatorType;
use crate::error::{EvaluationCoreError, Result};
use crate::identity::ExternalId;
use crate::models::{
    Employee, EvaluationLine, EvaluationLineMapping, NewEvaluationLineMapping,
    NewWbsAssignment, NewWbsEvaluationCriteria, NewWbsItem, NewWbsSelfEvaluation, Project,
    WbsAssignment, WbsEvaluationCriteria, WbsItem, WbsSelfEvaluation,
};
use crate::stores::{
    AssignmentStore, CriteriaStore, EmployeeStore, EvaluationLineStore, LineMappingStore,
    ProjectStore, SelfEvaluationStore, Stores, WbsItemStore,
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    assignments: Vec<WbsAssignment>,
    criteria: Vec<WbsEvaluationCriteria>,
    evaluation_lines: Vec<EvaluationLine>,
    line_mappings: Vec<EvaluationLineMapping>,
    self_evaluations: Vec<WbsSelfEvaluation>,
    wbs_items: Vec<WbsItem>,
    employees: Vec<Employee>,
    projects: Vec<Project>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this store as every seam of the orchestration layer.
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            assignments: self.clone(),
            criteria: self.clone(),
            evaluation_lines: self.clone(),
            line_mappings: self.clone(),
            self_evaluations: self.clone(),
            wbs_items: self.clone(),
            employees: self.clone(),
            projects: self.clone(),
        }
    }

    // Seed helpers for the read-only directories. The lifecycle core never
    // writes these collections, so they are populated up front.

    pub fn add_employee(
        &self,
        name: &str,
        external_id: &str,
        manager_external_id: Option<&str>,
    ) -> Employee {
        let mut inner = self.inner.write();
        let employee = Employee {
            employee_id: inner.next_id(),
            name: name.to_string(),
            external_id: ExternalId::new(external_id),
            manager_external_id: manager_external_id.map(ExternalId::new),
            created_at: now(),
            updated_at: now(),
        };
        inner.employees.push(employee.clone());
        employee
    }

    pub fn add_project(
        &self,
        name: &str,
        manager_employee_id: Option<i64>,
        manager_external_id: Option<&str>,
    ) -> Project {
        let mut inner = self.inner.write();
        let project = Project {
            project_id: inner.next_id(),
            name: name.to_string(),
            manager_employee_id,
            manager_external_id: manager_external_id.map(ExternalId::new),
            created_at: now(),
            updated_at: now(),
        };
        inner.projects.push(project.clone());
        project
    }

    pub fn add_wbs_item(&self, project_id: i64, title: &str) -> WbsItem {
        let mut inner = self.inner.write();
        let item = WbsItem {
            wbs_item_id: inner.next_id(),
            project_id,
            title: title.to_string(),
            created_by: "seed".to_string(),
            created_at: now(),
            updated_at: now(),
        };
        inner.wbs_items.push(item.clone());
        item
    }

    pub fn add_evaluation_line(
        &self,
        evaluator_type: EvaluatorType,
        line_order: i32,
        required: bool,
    ) -> EvaluationLine {
        let mut inner = self.inner.write();
        let line = EvaluationLine {
            evaluation_line_id: inner.next_id(),
            evaluator_type: evaluator_type.as_str().to_string(),
            line_order,
            required,
            created_at: now(),
            updated_at: now(),
        };
        inner.evaluation_lines.push(line.clone());
        line
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn create(&self, new: NewWbsAssignment) -> Result<WbsAssignment> {
        let mut inner = self.inner.write();
        let duplicate = inner.assignments.iter().any(|a| {
            a.is_active()
                && a.employee_id == new.employee_id
                && a.wbs_item_id == new.wbs_item_id
                && a.period_id == new.period_id
        });
        if duplicate {
            return Err(EvaluationCoreError::conflict(
                "assignment",
                format!(
                    "employee={} wbs_item={} period={}",
                    new.employee_id, new.wbs_item_id, new.period_id
                ),
            ));
        }
        let assignment = WbsAssignment {
            assignment_id: inner.next_id(),
            employee_id: new.employee_id,
            wbs_item_id: new.wbs_item_id,
            project_id: new.project_id,
            period_id: new.period_id,
            display_order: new.display_order,
            weight: None,
            assigned_by: new.assigned_by,
            assigned_date: new.assigned_date.unwrap_or_else(now),
            deleted_at: None,
            created_at: now(),
            updated_at: now(),
        };
        inner.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn find_by_id(&self, assignment_id: i64) -> Result<Option<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .find(|a| a.assignment_id == assignment_id && a.is_active())
            .cloned())
    }

    async fn find_active_by_key(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Option<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .find(|a| {
                a.is_active()
                    && a.employee_id == employee_id
                    && a.wbs_item_id == wbs_item_id
                    && a.project_id == project_id
                    && a.period_id == period_id
            })
            .cloned())
    }

    async fn list_scope(
        &self,
        employee_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .filter(|a| {
                a.is_active()
                    && a.employee_id == employee_id
                    && a.project_id == project_id
                    && a.period_id == period_id
            })
            .cloned()
            .collect())
    }

    async fn list_by_period(&self, period_id: i64) -> Result<Vec<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .filter(|a| a.is_active() && a.period_id == period_id)
            .cloned()
            .collect())
    }

    async fn list_by_project(
        &self,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .filter(|a| a.is_active() && a.project_id == project_id && a.period_id == period_id)
            .cloned()
            .collect())
    }

    async fn list_by_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .filter(|a| a.is_active() && a.employee_id == employee_id && a.period_id == period_id)
            .cloned()
            .collect())
    }

    async fn other_active_for_item(
        &self,
        wbs_item_id: i64,
        period_id: i64,
        excluding_assignment_id: i64,
    ) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.assignments.iter().any(|a| {
            a.is_active()
                && a.wbs_item_id == wbs_item_id
                && a.period_id == period_id
                && a.assignment_id != excluding_assignment_id
        }))
    }

    async fn count_active_for_item(&self, wbs_item_id: i64, period_id: i64) -> Result<i64> {
        let inner = self.inner.read();
        Ok(inner
            .assignments
            .iter()
            .filter(|a| a.is_active() && a.wbs_item_id == wbs_item_id && a.period_id == period_id)
            .count() as i64)
    }

    async fn update_display_order(&self, assignment_id: i64, display_order: i32) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(a) = inner
            .assignments
            .iter_mut()
            .find(|a| a.assignment_id == assignment_id && a.is_active())
        {
            a.display_order = display_order;
            a.updated_at = now();
        }
        Ok(())
    }

    async fn soft_delete(&self, assignment_id: i64) -> Result<bool> {
        let mut inner = self.inner.write();
        match inner
            .assignments
            .iter_mut()
            .find(|a| a.assignment_id == assignment_id && a.is_active())
        {
            Some(a) => {
                a.deleted_at = Some(now());
                a.updated_at = now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CriteriaStore for MemoryStore {
    async fn count_for_item(&self, wbs_item_id: i64) -> Result<i64> {
        let inner = self.inner.read();
        Ok(inner
            .criteria
            .iter()
            .filter(|c| c.wbs_item_id == wbs_item_id)
            .count() as i64)
    }

    async fn list_for_item(&self, wbs_item_id: i64) -> Result<Vec<WbsEvaluationCriteria>> {
        let inner = self.inner.read();
        Ok(inner
            .criteria
            .iter()
            .filter(|c| c.wbs_item_id == wbs_item_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewWbsEvaluationCriteria) -> Result<WbsEvaluationCriteria> {
        let mut inner = self.inner.write();
        let row = WbsEvaluationCriteria {
            criteria_id: inner.next_id(),
            wbs_item_id: new.wbs_item_id,
            criteria: new.criteria,
            importance: new.importance,
            created_at: now(),
            updated_at: now(),
        };
        inner.criteria.push(row.clone());
        Ok(row)
    }

    async fn delete_all_for_item(&self, wbs_item_id: i64) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.criteria.len();
        inner.criteria.retain(|c| c.wbs_item_id != wbs_item_id);
        Ok((before - inner.criteria.len()) as u64)
    }
}

#[async_trait]
impl EvaluationLineStore for MemoryStore {
    async fn find_by_type(
        &self,
        evaluator_type: EvaluatorType,
    ) -> Result<Option<EvaluationLine>> {
        let inner = self.inner.read();
        Ok(inner
            .evaluation_lines
            .iter()
            .find(|l| l.evaluator_type == evaluator_type.as_str())
            .cloned())
    }
}

#[async_trait]
impl LineMappingStore for MemoryStore {
    async fn find_employee_level(
        &self,
        employee_id: i64,
        period_id: i64,
        evaluation_line_id: i64,
    ) -> Result<Option<EvaluationLineMapping>> {
        let inner = self.inner.read();
        Ok(inner
            .line_mappings
            .iter()
            .find(|m| {
                m.employee_id == employee_id
                    && m.period_id == period_id
                    && m.evaluation_line_id == evaluation_line_id
                    && m.wbs_item_id.is_none()
            })
            .cloned())
    }

    async fn create(&self, new: NewEvaluationLineMapping) -> Result<EvaluationLineMapping> {
        let mut inner = self.inner.write();
        let mapping = EvaluationLineMapping {
            mapping_id: inner.next_id(),
            period_id: new.period_id,
            employee_id: new.employee_id,
            evaluator_id: new.evaluator_id,
            evaluation_line_id: new.evaluation_line_id,
            wbs_item_id: new.wbs_item_id,
            created_by: new.created_by,
            created_at: now(),
            updated_at: now(),
        };
        inner.line_mappings.push(mapping.clone());
        Ok(mapping)
    }

    async fn delete_for_wbs(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
    ) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.line_mappings.len();
        inner.line_mappings.retain(|m| {
            !(m.employee_id == employee_id
                && m.period_id == period_id
                && m.wbs_item_id == Some(wbs_item_id))
        });
        Ok((before - inner.line_mappings.len()) as u64)
    }

    async fn list_for_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<EvaluationLineMapping>> {
        let inner = self.inner.read();
        Ok(inner
            .line_mappings
            .iter()
            .filter(|m| m.employee_id == employee_id && m.period_id == period_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SelfEvaluationStore for MemoryStore {
    async fn create(&self, new: NewWbsSelfEvaluation) -> Result<WbsSelfEvaluation> {
        let mut inner = self.inner.write();
        let row = WbsSelfEvaluation {
            self_evaluation_id: inner.next_id(),
            employee_id: new.employee_id,
            period_id: new.period_id,
            wbs_item_id: new.wbs_item_id,
            content: new.content,
            created_at: now(),
            updated_at: now(),
        };
        inner.self_evaluations.push(row.clone());
        Ok(row)
    }

    async fn delete_for(
        &self,
        employee_id: i64,
        period_id: i64,
        wbs_item_id: i64,
    ) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.self_evaluations.len();
        inner.self_evaluations.retain(|s| {
            !(s.employee_id == employee_id
                && s.period_id == period_id
                && s.wbs_item_id == wbs_item_id)
        });
        Ok((before - inner.self_evaluations.len()) as u64)
    }

    async fn list_for(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsSelfEvaluation>> {
        let inner = self.inner.read();
        Ok(inner
            .self_evaluations
            .iter()
            .filter(|s| s.employee_id == employee_id && s.period_id == period_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WbsItemStore for MemoryStore {
    async fn create(&self, new: NewWbsItem) -> Result<WbsItem> {
        let mut inner = self.inner.write();
        let item = WbsItem {
            wbs_item_id: inner.next_id(),
            project_id: new.project_id,
            title: new.title,
            created_by: new.created_by,
            created_at: now(),
            updated_at: now(),
        };
        inner.wbs_items.push(item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, wbs_item_id: i64) -> Result<Option<WbsItem>> {
        let inner = self.inner.read();
        Ok(inner
            .wbs_items
            .iter()
            .find(|i| i.wbs_item_id == wbs_item_id)
            .cloned())
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn find_by_id(&self, employee_id: i64) -> Result<Option<Employee>> {
        let inner = self.inner.read();
        Ok(inner
            .employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned())
    }

    async fn find_by_external_id(&self, external_id: &ExternalId) -> Result<Option<Employee>> {
        let inner = self.inner.read();
        Ok(inner
            .employees
            .iter()
            .find(|e| &e.external_id == external_id)
            .cloned())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find_by_id(&self, project_id: i64) -> Result<Option<Project>> {
        let inner = self.inner.read();
        Ok(inner
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }
}
