//! Ordering tests: neighbor-relative insertion, single-step moves with edge
//! clamping, and the dense 0..N-1 invariant across mutations.

mod common;

use common::{assign, setup, TestContext, PERIOD};
use evaluation_core::constants::Direction;
use evaluation_core::error::EvaluationCoreError;
use evaluation_core::models::WbsAssignment;
use evaluation_core::orchestration::InsertBetweenRequest;

struct Scope {
    employee_id: i64,
    project_id: i64,
    item_ids: Vec<i64>,
    assignments: Vec<WbsAssignment>,
}

/// One employee with three assigned items, appended in order A, B, C.
async fn seed_scope(ctx: &TestContext) -> Scope {
    ctx.store.add_employee("Manager", "HR-001", None);
    let employee = ctx.store.add_employee("Employee", "HR-100", Some("HR-001"));
    let pm = ctx.store.add_employee("PM", "HR-002", None);
    let project = ctx
        .store
        .add_project("Platform", Some(pm.employee_id), None);

    let mut item_ids = Vec::new();
    let mut assignments = Vec::new();
    for title in ["A", "B", "C"] {
        let item = ctx.store.add_wbs_item(project.project_id, title);
        let assignment =
            assign(ctx, employee.employee_id, item.wbs_item_id, project.project_id).await;
        item_ids.push(item.wbs_item_id);
        assignments.push(assignment);
    }

    Scope {
        employee_id: employee.employee_id,
        project_id: project.project_id,
        item_ids,
        assignments,
    }
}

async fn scope_items(ctx: &TestContext, scope: &Scope) -> Vec<i64> {
    let rows = ctx
        .orchestrator
        .list_by_project(scope.project_id, PERIOD)
        .await
        .unwrap();
    assert_dense(&rows);
    rows.iter().map(|a| a.wbs_item_id).collect()
}

fn assert_dense(rows: &[WbsAssignment]) {
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(
            row.display_order, index as i32,
            "display_order must be the dense position"
        );
    }
}

fn insert_request(scope: &Scope, prev: Option<i64>, next: Option<i64>) -> InsertBetweenRequest {
    InsertBetweenRequest {
        title: "Inserted".to_string(),
        project_id: scope.project_id,
        employee_id: scope.employee_id,
        period_id: PERIOD,
        previous_wbs_item_id: prev,
        next_wbs_item_id: next,
        created_by: "tester".to_string(),
    }
}

#[tokio::test]
async fn test_append_order_matches_assignment_sequence() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;
    assert_eq!(scope_items(&ctx, &scope).await, scope.item_ids);
}

#[tokio::test]
async fn test_insert_between_two_neighbors() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    let result = ctx
        .orchestrator
        .insert_between(insert_request(
            &scope,
            Some(scope.item_ids[1]),
            Some(scope.item_ids[2]),
        ))
        .await
        .unwrap();

    // [A, B, X, C]
    let expected = vec![
        scope.item_ids[0],
        scope.item_ids[1],
        result.wbs_item.wbs_item_id,
        scope.item_ids[2],
    ];
    assert_eq!(scope_items(&ctx, &scope).await, expected);
}

#[tokio::test]
async fn test_insert_with_only_next_lands_first() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    let result = ctx
        .orchestrator
        .insert_between(insert_request(&scope, None, Some(scope.item_ids[0])))
        .await
        .unwrap();
    assert_eq!(result.assignment.display_order, 0);

    let items = scope_items(&ctx, &scope).await;
    assert_eq!(items[0], result.wbs_item.wbs_item_id);
    assert_eq!(&items[1..], &scope.item_ids[..]);
}

#[tokio::test]
async fn test_insert_without_neighbors_appends() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    let result = ctx
        .orchestrator
        .insert_between(insert_request(&scope, None, None))
        .await
        .unwrap();
    assert_eq!(result.assignment.display_order, 3);
}

#[tokio::test]
async fn test_insert_with_unlocatable_neighbor_appends() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    // The referenced neighbor is not in this scope, so the position request
    // degrades to an append instead of failing.
    let result = ctx
        .orchestrator
        .insert_between(insert_request(&scope, Some(9_999), None))
        .await
        .unwrap();
    assert_eq!(result.assignment.display_order, 3);
}

#[tokio::test]
async fn test_change_order_moves_one_position() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    // B up: [B, A, C]
    let moved = ctx
        .orchestrator
        .change_order(scope.assignments[1].assignment_id, Direction::Up, "tester")
        .await
        .unwrap();
    assert_eq!(moved.display_order, 0);
    assert_eq!(
        scope_items(&ctx, &scope).await,
        vec![scope.item_ids[1], scope.item_ids[0], scope.item_ids[2]]
    );

    // A down: [B, C, A]
    ctx.orchestrator
        .change_order(scope.assignments[0].assignment_id, Direction::Down, "tester")
        .await
        .unwrap();
    assert_eq!(
        scope_items(&ctx, &scope).await,
        vec![scope.item_ids[1], scope.item_ids[2], scope.item_ids[0]]
    );
}

#[tokio::test]
async fn test_change_order_clamps_at_the_edges() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    let first = ctx
        .orchestrator
        .change_order(scope.assignments[0].assignment_id, Direction::Up, "tester")
        .await
        .unwrap();
    assert_eq!(first.display_order, 0);

    let last = ctx
        .orchestrator
        .change_order(scope.assignments[2].assignment_id, Direction::Down, "tester")
        .await
        .unwrap();
    assert_eq!(last.display_order, 2);

    assert_eq!(scope_items(&ctx, &scope).await, scope.item_ids);
}

#[tokio::test]
async fn test_change_order_unknown_assignment_is_not_found() {
    let ctx = setup();
    let err = ctx
        .orchestrator
        .change_order(9_999, Direction::Up, "tester")
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluationCoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_cancellation_closes_the_gap() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    ctx.orchestrator
        .cancel_assignment(scope.assignments[1].assignment_id, "tester")
        .await
        .unwrap();

    assert_eq!(
        scope_items(&ctx, &scope).await,
        vec![scope.item_ids[0], scope.item_ids[2]]
    );
}

#[tokio::test]
async fn test_scopes_are_ordered_independently() {
    let ctx = setup();
    let scope = seed_scope(&ctx).await;

    // A second project for the same employee starts its own sequence at 0.
    let other_project = ctx.store.add_project("Mobile", None, Some("HR-002"));
    let other_item = ctx
        .store
        .add_wbs_item(other_project.project_id, "App shell");
    let assignment = assign(
        &ctx,
        scope.employee_id,
        other_item.wbs_item_id,
        other_project.project_id,
    )
    .await;
    assert_eq!(assignment.display_order, 0);

    // The original scope is untouched.
    assert_eq!(scope_items(&ctx, &scope).await, scope.item_ids);
}
