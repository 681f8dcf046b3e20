//! # Orchestration Layer
//!
//! The coordinators over the store seams: the assignment lifecycle
//! orchestrator, the ordering engine, the evaluator auto-configurator, and the
//! activity-log sink.

pub mod activity_log;
pub mod assignment_orchestrator;
pub mod evaluator_config;
pub mod ordering;

pub use activity_log::{
    ActivityEvent, ActivityLog, FailingActivityLog, MemoryActivityLog, TracingActivityLog,
};
pub use assignment_orchestrator::{
    AssignWbsRequest, AssignmentOrchestrator, BulkAssignmentItem, InsertBetweenRequest,
    InsertBetweenResult, PeerEvaluationSetup,
};
pub use evaluator_config::{EvaluatorAutoConfigurator, EvaluatorConfiguration};
pub use ordering::{OrderingEngine, OrderingScope};
