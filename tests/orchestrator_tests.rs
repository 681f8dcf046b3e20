//! Lifecycle cascade tests for the assignment orchestrator: creation wiring,
//! idempotent cancellation, orphan-criteria collection, evaluator
//! auto-configuration, bulk partial success, and resets.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{assign, setup, setup_with_log, setup_with_peer, TestContext, PERIOD};
use evaluation_core::constants::{actions, EvaluatorType};
use evaluation_core::error::EvaluationCoreError;
use evaluation_core::models::{NewEvaluationLineMapping, NewWbsSelfEvaluation};
use evaluation_core::orchestration::{
    AssignWbsRequest, BulkAssignmentItem, FailingActivityLog, PeerEvaluationSetup,
};
use evaluation_core::stores::{
    AssignmentStore, CriteriaStore, EvaluationLineStore, LineMappingStore, SelfEvaluationStore,
};

#[derive(Default)]
struct RecordingPeerSetup {
    calls: Mutex<Vec<(i64, i64, i64)>>,
}

#[async_trait]
impl PeerEvaluationSetup for RecordingPeerSetup {
    async fn setup(
        &self,
        employee_id: i64,
        wbs_item_id: i64,
        period_id: i64,
        _created_by: &str,
    ) -> evaluation_core::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((employee_id, wbs_item_id, period_id));
        Ok(())
    }
}

struct FailingPeerSetup;

#[async_trait]
impl PeerEvaluationSetup for FailingPeerSetup {
    async fn setup(
        &self,
        _employee_id: i64,
        _wbs_item_id: i64,
        _period_id: i64,
        _created_by: &str,
    ) -> evaluation_core::Result<()> {
        Err(EvaluationCoreError::Validation(
            "peer line service unavailable".to_string(),
        ))
    }
}

struct Org {
    manager_id: i64,
    employee_id: i64,
    pm_id: i64,
    project_id: i64,
    wbs_item_id: i64,
}

/// Manager and PM are distinct people; the employee reports to the manager
/// through an external reference.
fn seed_org(ctx: &TestContext) -> Org {
    let manager = ctx.store.add_employee("Manager", "HR-001", None);
    let employee = ctx.store.add_employee("Employee", "HR-100", Some("HR-001"));
    let pm = ctx.store.add_employee("PM", "HR-002", None);
    let project = ctx
        .store
        .add_project("Platform", Some(pm.employee_id), None);
    let item = ctx.store.add_wbs_item(project.project_id, "API design");
    Org {
        manager_id: manager.employee_id,
        employee_id: employee.employee_id,
        pm_id: pm.employee_id,
        project_id: project.project_id,
        wbs_item_id: item.wbs_item_id,
    }
}

#[tokio::test]
async fn test_assign_wbs_wires_dependent_records() {
    let ctx = setup();
    let org = seed_org(&ctx);

    let assignment = assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    assert_eq!(assignment.display_order, 0);
    assert!(assignment.is_active());

    // Placeholder criteria row with the default importance.
    let criteria = ctx.store.list_for_item(org.wbs_item_id).await.unwrap();
    assert_eq!(criteria.len(), 1);
    assert_eq!(criteria[0].criteria, "");
    assert_eq!(criteria[0].importance, 5);

    // Employee-level primary (manager) plus per-WBS secondary (PM).
    let mappings = ctx
        .store
        .list_for_employee(org.employee_id, PERIOD)
        .await
        .unwrap();
    assert_eq!(mappings.len(), 2);
    let primary = mappings.iter().find(|m| m.wbs_item_id.is_none()).unwrap();
    assert_eq!(primary.evaluator_id, org.manager_id);
    let secondary = mappings.iter().find(|m| m.wbs_item_id.is_some()).unwrap();
    assert_eq!(secondary.evaluator_id, org.pm_id);
    assert_eq!(secondary.wbs_item_id, Some(org.wbs_item_id));

    let events = ctx.log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, actions::WBS_ASSIGNED);
}

#[tokio::test]
async fn test_duplicate_assignment_surfaces_as_conflict() {
    let ctx = setup();
    let org = seed_org(&ctx);
    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;

    let err = ctx
        .orchestrator
        .assign_wbs(AssignWbsRequest {
            employee_id: org.employee_id,
            wbs_item_id: org.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
            assigned_by: "tester".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluationCoreError::Conflict { .. }));
}

#[tokio::test]
async fn test_primary_evaluator_is_sticky() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let fixed = ctx.store.add_employee("Fixed Evaluator", "HR-777", None);

    // An employee-level primary mapping already exists before the first
    // assignment; auto-configuration must reuse it, not replace it.
    let primary_line = ctx
        .store
        .find_by_type(EvaluatorType::Primary)
        .await
        .unwrap()
        .unwrap();
    LineMappingStore::create(
        ctx.store.as_ref(),
        NewEvaluationLineMapping {
            period_id: PERIOD,
            employee_id: org.employee_id,
            evaluator_id: fixed.employee_id,
            evaluation_line_id: primary_line.evaluation_line_id,
            wbs_item_id: None,
            created_by: "admin".to_string(),
        },
    )
    .await
    .unwrap();

    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    let second_item = ctx.store.add_wbs_item(org.project_id, "Follow-up");
    assign(&ctx, org.employee_id, second_item.wbs_item_id, org.project_id).await;

    let mappings = ctx
        .store
        .list_for_employee(org.employee_id, PERIOD)
        .await
        .unwrap();
    let primaries: Vec<_> = mappings.iter().filter(|m| m.wbs_item_id.is_none()).collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].evaluator_id, fixed.employee_id);
}

#[tokio::test]
async fn test_no_secondary_when_manager_and_pm_are_the_same_person() {
    let ctx = setup();
    let manager = ctx.store.add_employee("Manager And PM", "HR-001", None);
    let employee = ctx.store.add_employee("Employee", "HR-100", Some("HR-001"));
    // The project carries only the external reference; de-duplication must
    // still fire because both sides resolve to the same internal id.
    let project = ctx.store.add_project("Platform", None, Some("HR-001"));
    let item = ctx.store.add_wbs_item(project.project_id, "API design");

    assign(&ctx, employee.employee_id, item.wbs_item_id, project.project_id).await;

    let mappings = ctx
        .store
        .list_for_employee(employee.employee_id, PERIOD)
        .await
        .unwrap();
    assert_eq!(mappings.len(), 1);
    assert!(mappings[0].wbs_item_id.is_none());
    assert_eq!(mappings[0].evaluator_id, manager.employee_id);
}

#[tokio::test]
async fn test_secondary_resolved_from_external_reference() {
    let ctx = setup();
    ctx.store.add_employee("Manager", "HR-001", None);
    let employee = ctx.store.add_employee("Employee", "HR-100", Some("HR-001"));
    let pm = ctx.store.add_employee("PM", "HR-002", None);
    let project = ctx.store.add_project("Platform", None, Some("HR-002"));
    let item = ctx.store.add_wbs_item(project.project_id, "API design");

    assign(&ctx, employee.employee_id, item.wbs_item_id, project.project_id).await;

    let mappings = ctx
        .store
        .list_for_employee(employee.employee_id, PERIOD)
        .await
        .unwrap();
    let secondary = mappings.iter().find(|m| m.wbs_item_id.is_some()).unwrap();
    assert_eq!(secondary.evaluator_id, pm.employee_id);
}

#[tokio::test]
async fn test_unresolvable_manager_skips_primary_but_assignment_succeeds() {
    let ctx = setup();
    let employee = ctx.store.add_employee("Orphaned", "HR-100", Some("HR-999"));
    let pm = ctx.store.add_employee("PM", "HR-002", None);
    let project = ctx
        .store
        .add_project("Platform", Some(pm.employee_id), None);
    let item = ctx.store.add_wbs_item(project.project_id, "API design");

    let assignment =
        assign(&ctx, employee.employee_id, item.wbs_item_id, project.project_id).await;
    assert!(assignment.is_active());

    let mappings = ctx
        .store
        .list_for_employee(employee.employee_id, PERIOD)
        .await
        .unwrap();
    assert_eq!(mappings.len(), 1);
    assert!(mappings[0].wbs_item_id.is_some());
}

#[tokio::test]
async fn test_cancellation_is_idempotent() {
    let ctx = setup();
    let org = seed_org(&ctx);

    // Never-existing id is a successful no-op.
    ctx.orchestrator.cancel_assignment(9_999, "tester").await.unwrap();

    let assignment = assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    ctx.orchestrator
        .cancel_assignment(assignment.assignment_id, "tester")
        .await
        .unwrap();
    ctx.orchestrator
        .cancel_assignment(assignment.assignment_id, "tester")
        .await
        .unwrap();

    assert!(
        AssignmentStore::find_by_id(ctx.store.as_ref(), assignment.assignment_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_cancellation_cascade_and_shared_criteria() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let colleague = ctx.store.add_employee("Colleague", "HR-101", Some("HR-001"));

    let first = assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    let second = assign(&ctx, colleague.employee_id, org.wbs_item_id, org.project_id).await;
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 1);

    SelfEvaluationStore::create(
        ctx.store.as_ref(),
        NewWbsSelfEvaluation {
            employee_id: org.employee_id,
            period_id: PERIOD,
            wbs_item_id: org.wbs_item_id,
            content: "Delivered the API design".to_string(),
        },
    )
    .await
    .unwrap();

    ctx.orchestrator
        .cancel_assignment(first.assignment_id, "tester")
        .await
        .unwrap();

    // Self-evaluation and per-WBS secondary mapping are gone, the
    // employee-level primary mapping stays, and the shared criteria survive
    // while the colleague still references the item.
    assert!(ctx
        .store
        .list_for(org.employee_id, PERIOD)
        .await
        .unwrap()
        .is_empty());
    let mappings = ctx
        .store
        .list_for_employee(org.employee_id, PERIOD)
        .await
        .unwrap();
    assert_eq!(mappings.len(), 1);
    assert!(mappings[0].wbs_item_id.is_none());
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 1);

    ctx.orchestrator
        .cancel_assignment(second.assignment_id, "tester")
        .await
        .unwrap();
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_by_natural_key() {
    let ctx = setup();
    let org = seed_org(&ctx);
    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;

    ctx.orchestrator
        .cancel_assignment_by_key(
            org.employee_id,
            org.wbs_item_id,
            org.project_id,
            PERIOD,
            "tester",
        )
        .await
        .unwrap();
    assert!(ctx
        .orchestrator
        .list_by_employee(org.employee_id, PERIOD)
        .await
        .unwrap()
        .is_empty());

    // Unresolvable key is a successful no-op.
    ctx.orchestrator
        .cancel_assignment_by_key(org.employee_id, 9_999, org.project_id, PERIOD, "tester")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bulk_partial_success_on_evaluator_failure() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let item2 = ctx.store.add_wbs_item(org.project_id, "Second");
    let item3 = ctx.store.add_wbs_item(org.project_id, "Third");

    // The third entry references an employee the directory does not know;
    // its evaluator configuration fails but the batch result is full-length.
    let items = vec![
        BulkAssignmentItem {
            employee_id: org.employee_id,
            wbs_item_id: org.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
        },
        BulkAssignmentItem {
            employee_id: org.employee_id,
            wbs_item_id: item2.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
        },
        BulkAssignmentItem {
            employee_id: 9_999,
            wbs_item_id: item3.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
        },
    ];

    let created = ctx.orchestrator.bulk_assign(items, "tester").await.unwrap();
    assert_eq!(created.len(), 3);

    // Dense order inside the employee's scope.
    let scope = ctx
        .orchestrator
        .list_by_employee(org.employee_id, PERIOD)
        .await
        .unwrap();
    let orders: Vec<i32> = scope.iter().map(|a| a.display_order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[tokio::test]
async fn test_bulk_creates_one_criteria_row_per_distinct_item() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let colleague = ctx.store.add_employee("Colleague", "HR-101", Some("HR-001"));

    let items = vec![
        BulkAssignmentItem {
            employee_id: org.employee_id,
            wbs_item_id: org.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
        },
        BulkAssignmentItem {
            employee_id: colleague.employee_id,
            wbs_item_id: org.wbs_item_id,
            project_id: org.project_id,
            period_id: PERIOD,
        },
    ];

    let created = ctx.orchestrator.bulk_assign(items, "tester").await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_bulk_returns_only_successfully_created_rows() {
    let ctx = setup();
    let org = seed_org(&ctx);

    // The duplicate entry conflicts at creation and is dropped from the
    // result; the rest of the batch proceeds.
    let entry = BulkAssignmentItem {
        employee_id: org.employee_id,
        wbs_item_id: org.wbs_item_id,
        project_id: org.project_id,
        period_id: PERIOD,
    };
    let created = ctx
        .orchestrator
        .bulk_assign(vec![entry.clone(), entry], "tester")
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
}

#[tokio::test]
async fn test_reset_by_period_removes_assignments_and_criteria() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let colleague = ctx.store.add_employee("Colleague", "HR-101", Some("HR-001"));
    let item2 = ctx.store.add_wbs_item(org.project_id, "Second");

    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    assign(&ctx, colleague.employee_id, org.wbs_item_id, org.project_id).await;
    assign(&ctx, org.employee_id, item2.wbs_item_id, org.project_id).await;

    ctx.orchestrator.reset_by_period(PERIOD, "admin").await.unwrap();

    assert!(ctx
        .orchestrator
        .list_by_period(PERIOD)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 0);
    assert_eq!(ctx.store.count_for_item(item2.wbs_item_id).await.unwrap(), 0);

    let events = ctx.log.events();
    assert!(events
        .iter()
        .any(|e| e.action == actions::WBS_ASSIGNMENTS_RESET));
}

#[tokio::test]
async fn test_reset_by_employee_keeps_criteria_still_referenced() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let colleague = ctx.store.add_employee("Colleague", "HR-101", Some("HR-001"));
    let exclusive = ctx.store.add_wbs_item(org.project_id, "Exclusive");

    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    assign(&ctx, colleague.employee_id, org.wbs_item_id, org.project_id).await;
    assign(&ctx, org.employee_id, exclusive.wbs_item_id, org.project_id).await;

    ctx.orchestrator
        .reset_by_employee(org.employee_id, PERIOD, "admin")
        .await
        .unwrap();

    assert!(ctx
        .orchestrator
        .list_by_employee(org.employee_id, PERIOD)
        .await
        .unwrap()
        .is_empty());
    // Shared item is still referenced by the colleague; exclusive item is not.
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 1);
    assert_eq!(
        ctx.store.count_for_item(exclusive.wbs_item_id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_reset_by_project_leaves_other_projects_alone() {
    let ctx = setup();
    let org = seed_org(&ctx);
    let other_project = ctx.store.add_project("Mobile", Some(org.pm_id), None);
    let other_item = ctx
        .store
        .add_wbs_item(other_project.project_id, "App shell");

    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    assign(
        &ctx,
        org.employee_id,
        other_item.wbs_item_id,
        other_project.project_id,
    )
    .await;

    ctx.orchestrator
        .reset_by_project(org.project_id, PERIOD, "admin")
        .await
        .unwrap();

    assert!(ctx
        .orchestrator
        .list_by_project(org.project_id, PERIOD)
        .await
        .unwrap()
        .is_empty());
    let remaining = ctx
        .orchestrator
        .list_by_project(other_project.project_id, PERIOD)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        ctx.store.count_for_item(other_item.wbs_item_id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_activity_log_outage_is_invisible_to_the_caller() {
    let (store, orchestrator) = setup_with_log(Arc::new(FailingActivityLog));
    store.add_employee("Manager", "HR-001", None);
    let employee = store.add_employee("Employee", "HR-100", Some("HR-001"));
    let project = store.add_project("Platform", None, Some("HR-001"));
    let item = store.add_wbs_item(project.project_id, "API design");

    let assignment = orchestrator
        .assign_wbs(AssignWbsRequest {
            employee_id: employee.employee_id,
            wbs_item_id: item.wbs_item_id,
            project_id: project.project_id,
            period_id: PERIOD,
            assigned_by: "tester".to_string(),
        })
        .await
        .unwrap();

    orchestrator
        .cancel_assignment(assignment.assignment_id, "tester")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_peer_setup_is_invoked_per_created_assignment() {
    let peer = Arc::new(RecordingPeerSetup::default());
    let ctx = setup_with_peer(peer.clone());
    let org = seed_org(&ctx);

    assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;

    let calls = peer.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(org.employee_id, org.wbs_item_id, PERIOD)]);
}

#[tokio::test]
async fn test_peer_setup_outage_is_invisible_to_the_caller() {
    let ctx = setup_with_peer(Arc::new(FailingPeerSetup));
    let org = seed_org(&ctx);

    // The collaborator fails on every call; the assignment and the rest of the
    // cascade still land.
    let assignment = assign(&ctx, org.employee_id, org.wbs_item_id, org.project_id).await;
    assert!(assignment.is_active());
    assert_eq!(ctx.store.count_for_item(org.wbs_item_id).await.unwrap(), 1);
    assert_eq!(
        ctx.store
            .list_for_employee(org.employee_id, PERIOD)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_get_assignment_not_found() {
    let ctx = setup();
    let err = ctx.orchestrator.get_assignment(42).await.unwrap_err();
    assert!(matches!(err, EvaluationCoreError::NotFound { .. }));
}
