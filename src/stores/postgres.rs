//! # Postgres Stores
//!
//! sqlx-backed implementations of the store seams against the `eval_` tables
//! (schema under `migrations/`). Queries use the runtime query API with
//! explicit binds rather than the compile-time checked macros, so the crate
//! builds without a reachable database.
//!
//! Soft deletion is an `UPDATE ... SET deleted_at = NOW()` guarded by
//! `deleted_at IS NULL`, which keeps it idempotent at the row level. The
//! active-key uniqueness invariant is enforced by a partial unique index and
//! surfaced as a `Conflict`.

use async_trait::async_trait;
use sqlx::PgPool;
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

const UNIQUE_VIOLATION: &str = "23505";

fn map_db_error(entity: &'static str, operation: &str, error: sqlx::Error) -> EvaluationCoreError {
    if let sqlx::Error::Database(ref db) = error {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return EvaluationCoreError::conflict(entity, db.message().to_string());
        }
    }
    EvaluationCoreError::database(format!("{entity} {operation}"), &error)
}

/// Build the full store bundle over one connection pool.
pub fn pg_stores(pool: PgPool) -> Stores {
    Stores {
        assignments: Arc::new(PgAssignmentStore::new(pool.clone())),
        criteria: Arc::new(PgCriteriaStore::new(pool.clone())),
        evaluation_lines: Arc::new(PgEvaluationLineStore::new(pool.clone())),
        line_mappings: Arc::new(PgLineMappingStore::new(pool.clone())),
        self_evaluations: Arc::new(PgSelfEvaluationStore::new(pool.clone())),
        wbs_items: Arc::new(PgWbsItemStore::new(pool.clone())),
        employees: Arc::new(PgEmployeeStore::new(pool.clone())),
        projects: Arc::new(PgProjectStore::new(pool)),
    }
}

pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn create(&self, new: NewWbsAssignment) -> Result<WbsAssignment> {
        sqlx::query_as::<_, WbsAssignment>(
            r#"
            INSERT INTO eval_wbs_assignments
                (employee_id, wbs_item_id, project_id, period_id, display_order,
                 assigned_by, assigned_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.employee_id)
        .bind(new.wbs_item_id)
        .bind(new.project_id)
        .bind(new.period_id)
        .bind(new.display_order)
        .bind(&new.assigned_by)
        .bind(new.assigned_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "create", e))
    }

    async fn find_by_id(&self, assignment_id: i64) -> Result<Option<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            "SELECT * FROM eval_wbs_assignments WHERE assignment_id = $1 AND deleted_at IS NULL",
        )
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "find_by_id", e))
    }

    async fn find_active_by_key(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Option<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            r#"
            SELECT * FROM eval_wbs_assignments
            WHERE employee_id = $1 AND wbs_item_id = $2 AND project_id = $3
              AND period_id = $4 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(wbs_item_id)
        .bind(project_id)
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "find_active_by_key", e))
    }

    async fn list_scope(
        &self,
        employee_id: i64,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            r#"
            SELECT * FROM eval_wbs_assignments
            WHERE employee_id = $1 AND project_id = $2 AND period_id = $3
              AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(project_id)
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "list_scope", e))
    }

    async fn list_by_period(&self, period_id: i64) -> Result<Vec<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            "SELECT * FROM eval_wbs_assignments WHERE period_id = $1 AND deleted_at IS NULL",
        )
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "list_by_period", e))
    }

    async fn list_by_project(
        &self,
        project_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            r#"
            SELECT * FROM eval_wbs_assignments
            WHERE project_id = $1 AND period_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(project_id)
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "list_by_project", e))
    }

    async fn list_by_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsAssignment>> {
        sqlx::query_as::<_, WbsAssignment>(
            r#"
            SELECT * FROM eval_wbs_assignments
            WHERE employee_id = $1 AND period_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "list_by_employee", e))
    }

    async fn other_active_for_item(
        &self,
        wbs_item_id: i64,
        period_id: i64,
        excluding_assignment_id: i64,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM eval_wbs_assignments
                WHERE wbs_item_id = $1 AND period_id = $2
                  AND assignment_id <> $3 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(wbs_item_id)
        .bind(period_id)
        .bind(excluding_assignment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "other_active_for_item", e))
    }

    async fn count_active_for_item(&self, wbs_item_id: i64, period_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM eval_wbs_assignments
            WHERE wbs_item_id = $1 AND period_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(wbs_item_id)
        .bind(period_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "count_active_for_item", e))
    }

    async fn update_display_order(&self, assignment_id: i64, display_order: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE eval_wbs_assignments
            SET display_order = $2, updated_at = NOW()
            WHERE assignment_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(assignment_id)
        .bind(display_order)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "update_display_order", e))?;
        Ok(())
    }

    async fn soft_delete(&self, assignment_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE eval_wbs_assignments
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE assignment_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(assignment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("assignment", "soft_delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgCriteriaStore {
    pool: PgPool,
}

impl PgCriteriaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CriteriaStore for PgCriteriaStore {
    async fn count_for_item(&self, wbs_item_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM eval_wbs_evaluation_criteria WHERE wbs_item_id = $1",
        )
        .bind(wbs_item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("criteria", "count_for_item", e))
    }

    async fn list_for_item(&self, wbs_item_id: i64) -> Result<Vec<WbsEvaluationCriteria>> {
        sqlx::query_as::<_, WbsEvaluationCriteria>(
            r#"
            SELECT * FROM eval_wbs_evaluation_criteria
            WHERE wbs_item_id = $1 ORDER BY criteria_id
            "#,
        )
        .bind(wbs_item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("criteria", "list_for_item", e))
    }

    async fn create(&self, new: NewWbsEvaluationCriteria) -> Result<WbsEvaluationCriteria> {
        sqlx::query_as::<_, WbsEvaluationCriteria>(
            r#"
            INSERT INTO eval_wbs_evaluation_criteria
                (wbs_item_id, criteria, importance, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.wbs_item_id)
        .bind(&new.criteria)
        .bind(new.importance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("criteria", "create", e))
    }

    async fn delete_all_for_item(&self, wbs_item_id: i64) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM eval_wbs_evaluation_criteria WHERE wbs_item_id = $1")
                .bind(wbs_item_id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_error("criteria", "delete_all_for_item", e))?;
        Ok(result.rows_affected())
    }
}

pub struct PgEvaluationLineStore {
    pool: PgPool,
}

impl PgEvaluationLineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationLineStore for PgEvaluationLineStore {
    async fn find_by_type(
        &self,
        evaluator_type: EvaluatorType,
    ) -> Result<Option<EvaluationLine>> {
        sqlx::query_as::<_, EvaluationLine>(
            r#"
            SELECT * FROM eval_evaluation_lines
            WHERE evaluator_type = $1 ORDER BY line_order LIMIT 1
            "#,
        )
        .bind(evaluator_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("evaluation_line", "find_by_type", e))
    }
}

pub struct PgLineMappingStore {
    pool: PgPool,
}

impl PgLineMappingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LineMappingStore for PgLineMappingStore {
    async fn find_employee_level(
        &self,
        employee_id: i64,
        period_id: i64,
        evaluation_line_id: i64,
    ) -> Result<Option<EvaluationLineMapping>> {
        sqlx::query_as::<_, EvaluationLineMapping>(
            r#"
            SELECT * FROM eval_evaluation_line_mappings
            WHERE employee_id = $1 AND period_id = $2
              AND evaluation_line_id = $3 AND wbs_item_id IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(period_id)
        .bind(evaluation_line_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("line_mapping", "find_employee_level", e))
    }

    async fn create(&self, new: NewEvaluationLineMapping) -> Result<EvaluationLineMapping> {
        sqlx::query_as::<_, EvaluationLineMapping>(
            r#"
            INSERT INTO eval_evaluation_line_mappings
                (period_id, employee_id, evaluator_id, evaluation_line_id,
                 wbs_item_id, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.period_id)
        .bind(new.employee_id)
        .bind(new.evaluator_id)
        .bind(new.evaluation_line_id)
        .bind(new.wbs_item_id)
        .bind(&new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("line_mapping", "create", e))
    }

    async fn delete_for_wbs(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM eval_evaluation_line_mappings
            WHERE employee_id = $1 AND wbs_item_id = $2 AND period_id = $3
            "#,
        )
        .bind(employee_id)
        .bind(wbs_item_id)
        .bind(period_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("line_mapping", "delete_for_wbs", e))?;
        Ok(result.rows_affected())
    }

    async fn list_for_employee(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<EvaluationLineMapping>> {
        sqlx::query_as::<_, EvaluationLineMapping>(
            r#"
            SELECT * FROM eval_evaluation_line_mappings
            WHERE employee_id = $1 AND period_id = $2 ORDER BY mapping_id
            "#,
        )
        .bind(employee_id)
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("line_mapping", "list_for_employee", e))
    }
}

pub struct PgSelfEvaluationStore {
    pool: PgPool,
}

impl PgSelfEvaluationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SelfEvaluationStore for PgSelfEvaluationStore {
    async fn create(&self, new: NewWbsSelfEvaluation) -> Result<WbsSelfEvaluation> {
        sqlx::query_as::<_, WbsSelfEvaluation>(
            r#"
            INSERT INTO eval_wbs_self_evaluations
                (employee_id, period_id, wbs_item_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.employee_id)
        .bind(new.period_id)
        .bind(new.wbs_item_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("self_evaluation", "create", e))
    }

    async fn delete_for(
        &self,
        employee_id: i64,
        period_id: i64,
        wbs_item_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM eval_wbs_self_evaluations
            WHERE employee_id = $1 AND period_id = $2 AND wbs_item_id = $3
            "#,
        )
        .bind(employee_id)
        .bind(period_id)
        .bind(wbs_item_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("self_evaluation", "delete_for", e))?;
        Ok(result.rows_affected())
    }

    async fn list_for(
        &self,
        employee_id: i64,
        period_id: i64,
    ) -> Result<Vec<WbsSelfEvaluation>> {
        sqlx::query_as::<_, WbsSelfEvaluation>(
            r#"
            SELECT * FROM eval_wbs_self_evaluations
            WHERE employee_id = $1 AND period_id = $2 ORDER BY self_evaluation_id
            "#,
        )
        .bind(employee_id)
        .bind(period_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("self_evaluation", "list_for", e))
    }
}

pub struct PgWbsItemStore {
    pool: PgPool,
}

impl PgWbsItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WbsItemStore for PgWbsItemStore {
    async fn create(&self, new: NewWbsItem) -> Result<WbsItem> {
        sqlx::query_as::<_, WbsItem>(
            r#"
            INSERT INTO eval_wbs_items (project_id, title, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.project_id)
        .bind(&new.title)
        .bind(&new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("wbs_item", "create", e))
    }

    async fn find_by_id(&self, wbs_item_id: i64) -> Result<Option<WbsItem>> {
        sqlx::query_as::<_, WbsItem>("SELECT * FROM eval_wbs_items WHERE wbs_item_id = $1")
            .bind(wbs_item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("wbs_item", "find_by_id", e))
    }
}

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn find_by_id(&self, employee_id: i64) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>("SELECT * FROM eval_employees WHERE employee_id = $1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("employee", "find_by_id", e))
    }

    async fn find_by_external_id(&self, external_id: &ExternalId) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>("SELECT * FROM eval_employees WHERE external_id = $1")
            .bind(external_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("employee", "find_by_external_id", e))
    }
}

pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn find_by_id(&self, project_id: i64) -> Result<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM eval_projects WHERE project_id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("project", "find_by_id", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct StubUniqueViolation;

    impl fmt::Display for StubUniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl StdError for StubUniqueViolation {}

    impl sqlx::error::DatabaseError for StubUniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(UNIQUE_VIOLATION))
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_unique_violation_becomes_conflict_for_the_calling_entity() {
        let err = map_db_error(
            "line_mapping",
            "create",
            sqlx::Error::Database(Box::new(StubUniqueViolation)),
        );
        match err {
            EvaluationCoreError::Conflict { entity, .. } => assert_eq!(entity, "line_mapping"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_carry_entity_and_operation() {
        let err = map_db_error("criteria", "count_for_item", sqlx::Error::RowNotFound);
        match err {
            EvaluationCoreError::Database { operation, .. } => {
                assert_eq!(operation, "criteria count_for_item");
            }
            other => panic!("expected Database, got {other:?}"),
        }
    }
}
