//! # Evaluator Auto-Configurator
//!
//! Resolves the primary and secondary evaluators for one assignment and writes
//! the corresponding line mappings.
//!
//! - Primary: the existing employee-level fixed mapping wins unconditionally
//!   (sticky); otherwise the employee's manager, resolved from its external
//!   reference to an internal id.
//! - Secondary: the project manager, pre-resolved or resolved here, bound
//!   per-WBS.
//! - De-duplication: when the employee's manager and the project manager are
//!   the same internal employee, no secondary mapping is written. Both sides
//!   of that comparison are resolved internal ids; `ExternalId` never reaches
//!   an equality test against an internal id.
//!
//! Every skip path is a logged warning, never an error: a partially configured
//! evaluator line is a tolerated deficiency.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::constants::EvaluatorType;
use crate::error::{EvaluationCoreError, Result};
use crate::identity::IdentityResolver;
use crate::models::{Employee, NewEvaluationLineMapping};
use crate::stores::Stores;

/// Outcome of one auto-configuration pass: the internal evaluator ids now in
/// effect for the assignment, when resolvable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfiguration {
    pub primary_evaluator_id: Option<i64>,
    pub secondary_evaluator_id: Option<i64>,
}

pub struct EvaluatorAutoConfigurator {
    stores: Stores,
    resolver: Arc<dyn IdentityResolver>,
}

impl EvaluatorAutoConfigurator {
    pub fn new(stores: Stores, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { stores, resolver }
    }

    #[instrument(skip(self, created_by))]
    pub async fn configure(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
        created_by: &str,
    ) -> Result<EvaluatorConfiguration> {
        let employee = self
            .stores
            .employees
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| EvaluationCoreError::not_found("employee", employee_id))?;

        // Resolve the employee's manager once: it is both the primary fallback
        // and one side of the de-duplication comparison.
        let manager_internal_id = match &employee.manager_external_id {
            Some(external) => self
                .resolver
                .resolve_external_id(external)
                .await?
                .map(|m| m.employee_id),
            None => None,
        };

        let primary = self
            .configure_primary(&employee, period_id, manager_internal_id, created_by)
            .await?;
        let secondary = self
            .configure_secondary(
                &employee,
                wbs_item_id,
                project_id,
                period_id,
                manager_internal_id,
                created_by,
            )
            .await?;

        Ok(EvaluatorConfiguration {
            primary_evaluator_id: primary,
            secondary_evaluator_id: secondary,
        })
    }

    async fn configure_primary(
        &self,
        employee: &Employee,
        period_id: i64,
        manager_internal_id: Option<i64>,
        created_by: &str,
    ) -> Result<Option<i64>> {
        let line = match self
            .stores
            .evaluation_lines
            .find_by_type(EvaluatorType::Primary)
            .await?
        {
            Some(line) => line,
            None => {
                warn!("No PRIMARY evaluation line template; skipping primary evaluator");
                return Ok(None);
            }
        };

        // Sticky: once a primary evaluator is fixed for (employee, period),
        // auto-configuration never replaces it.
        if let Some(existing) = self
            .stores
            .line_mappings
            .find_employee_level(employee.employee_id, period_id, line.evaluation_line_id)
            .await?
        {
            debug!(
                employee_id = employee.employee_id,
                evaluator_id = existing.evaluator_id,
                "Reusing fixed primary evaluator"
            );
            return Ok(Some(existing.evaluator_id));
        }

        let Some(evaluator_id) = manager_internal_id else {
            warn!(
                employee_id = employee.employee_id,
                period_id, "No resolvable manager; skipping primary evaluator"
            );
            return Ok(None);
        };

        self.stores
            .line_mappings
            .create(NewEvaluationLineMapping {
                period_id,
                employee_id: employee.employee_id,
                evaluator_id,
                evaluation_line_id: line.evaluation_line_id,
                wbs_item_id: None,
                created_by: created_by.to_string(),
            })
            .await?;
        Ok(Some(evaluator_id))
    }

    async fn configure_secondary(
        &self,
        employee: &Employee,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
        manager_internal_id: Option<i64>,
        created_by: &str,
    ) -> Result<Option<i64>> {
        let line = match self
            .stores
            .evaluation_lines
            .find_by_type(EvaluatorType::Secondary)
            .await?
        {
            Some(line) => line,
            None => {
                warn!("No SECONDARY evaluation line template; skipping secondary evaluator");
                return Ok(None);
            }
        };

        let Some(project) = self.stores.projects.find_by_id(project_id).await? else {
            warn!(project_id, "Project not found; skipping secondary evaluator");
            return Ok(None);
        };

        let candidate = match project.manager_employee_id {
            Some(internal) => Some(internal),
            None => match &project.manager_external_id {
                Some(external) => self
                    .resolver
                    .resolve_external_id(external)
                    .await?
                    .map(|e| e.employee_id),
                None => None,
            },
        };

        let Some(evaluator_id) = candidate else {
            warn!(
                project_id,
                employee_id = employee.employee_id,
                "No resolvable project manager; skipping secondary evaluator"
            );
            return Ok(None);
        };

        if manager_internal_id == Some(evaluator_id) {
            warn!(
                employee_id = employee.employee_id,
                evaluator_id,
                "Manager and project manager are the same employee; skipping secondary evaluator"
            );
            return Ok(None);
        }

        self.stores
            .line_mappings
            .create(NewEvaluationLineMapping {
                period_id,
                employee_id: employee.employee_id,
                evaluator_id,
                evaluation_line_id: line.evaluation_line_id,
                wbs_item_id: Some(wbs_item_id),
                created_by: created_by.to_string(),
            })
            .await?;
        Ok(Some(evaluator_id))
    }
}
