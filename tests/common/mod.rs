//! Shared harness for the lifecycle integration tests: an in-process store
//! seeded with the two evaluation-line templates, a recording activity log,
//! and an orchestrator wired over both.

#![allow(dead_code)]

use std::sync::Arc;

use evaluation_core::config::OrchestrationConfig;
use evaluation_core::constants::EvaluatorType;
use evaluation_core::identity::DirectoryIdentityResolver;
use evaluation_core::models::WbsAssignment;
use evaluation_core::orchestration::{
    ActivityLog, AssignWbsRequest, AssignmentOrchestrator, MemoryActivityLog,
    PeerEvaluationSetup,
};
use evaluation_core::stores::memory::MemoryStore;

pub const PERIOD: i64 = 1;

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub log: Arc<MemoryActivityLog>,
    pub orchestrator: AssignmentOrchestrator,
}

pub fn setup() -> TestContext {
    let store = seeded_store();
    let log = Arc::new(MemoryActivityLog::default());
    let orchestrator = build(&store, log.clone());
    TestContext {
        store,
        log,
        orchestrator,
    }
}

/// Same harness with a caller-provided activity log.
pub fn setup_with_log(log: Arc<dyn ActivityLog>) -> (Arc<MemoryStore>, AssignmentOrchestrator) {
    let store = seeded_store();
    let orchestrator = build(&store, log);
    (store, orchestrator)
}

/// Same harness with the peer-evaluation collaborator installed.
pub fn setup_with_peer(peer: Arc<dyn PeerEvaluationSetup>) -> TestContext {
    let TestContext {
        store,
        log,
        orchestrator,
    } = setup();
    TestContext {
        store,
        log,
        orchestrator: orchestrator.with_peer_setup(peer),
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_evaluation_line(EvaluatorType::Primary, 1, true);
    store.add_evaluation_line(EvaluatorType::Secondary, 2, false);
    store
}

fn build(store: &Arc<MemoryStore>, log: Arc<dyn ActivityLog>) -> AssignmentOrchestrator {
    let stores = store.stores();
    let resolver = Arc::new(DirectoryIdentityResolver::new(stores.employees.clone()));
    AssignmentOrchestrator::new(stores, resolver, log, OrchestrationConfig::default())
}

pub async fn assign(
    ctx: &TestContext,
    employee_id: i64,
    wbs_item_id: i64,
    project_id: i64,
) -> WbsAssignment {
    ctx.orchestrator
        .assign_wbs(AssignWbsRequest {
            employee_id,
            wbs_item_id,
            project_id,
            period_id: PERIOD,
            assigned_by: "tester".to_string(),
        })
        .await
        .expect("assignment should succeed")
}
