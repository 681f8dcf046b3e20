#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Evaluation Core
//!
//! Library core for the WBS assignment lifecycle inside one evaluation
//! period: who works on which work-breakdown-structure item, and who evaluates
//! them for it.
//!
//! ## Overview
//!
//! The [`orchestration::AssignmentOrchestrator`] is the single entry point. It
//! creates, cancels, bulk-assigns, reorders, inserts, and resets
//! WBS-to-employee assignments and cascades each mutation into the dependent
//! records:
//!
//! - shared per-WBS evaluation criteria (lazily created, orphan-collected),
//! - two-tier evaluator-line mappings (sticky primary, de-duplicated
//!   secondary),
//! - per-WBS self-evaluation write-ups.
//!
//! Ordering within an (employee, project, period) scope is a dense 0..N-1
//! `display_order` sequence maintained by the [`orchestration::OrderingEngine`]
//! through sentinel inserts and fresh-snapshot resequencing.
//!
//! ## Identifier spaces
//!
//! Manager and project-manager references originate in an external HR system.
//! They are typed [`identity::ExternalId`] and only the
//! [`identity::IdentityResolver`] can turn them into internal employee rows,
//! so external and internal ids can never be compared by accident.
//!
//! ## Module Organization
//!
//! - [`models`] - Row types for assignments, criteria, lines, mappings
//! - [`stores`] - Store seams with Postgres and in-process implementations
//! - [`orchestration`] - Lifecycle orchestrator, ordering engine, evaluator
//!   auto-configuration, activity log
//! - [`identity`] - External/internal identifier boundary
//! - [`config`] - Configuration management
//! - [`database`] - Connection-pool bootstrap
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use evaluation_core::config::OrchestrationConfig;
//! use evaluation_core::identity::DirectoryIdentityResolver;
//! use evaluation_core::orchestration::{
//!     AssignWbsRequest, AssignmentOrchestrator, TracingActivityLog,
//! };
//! use evaluation_core::stores::memory::MemoryStore;
//!
//! # async fn example() -> evaluation_core::Result<()> {
//! let store = MemoryStore::new();
//! let employee = store.add_employee("Kim", "HR-100", Some("HR-001"));
//! let stores = store.stores();
//! let resolver = Arc::new(DirectoryIdentityResolver::new(stores.employees.clone()));
//! let orchestrator = AssignmentOrchestrator::new(
//!     stores,
//!     resolver,
//!     Arc::new(TracingActivityLog),
//!     OrchestrationConfig::default(),
//! );
//!
//! let project = store.add_project("Platform", None, Some("HR-002"));
//! let item = store.add_wbs_item(project.project_id, "API design");
//! let assignment = orchestrator
//!     .assign_wbs(AssignWbsRequest {
//!         employee_id: employee.employee_id,
//!         wbs_item_id: item.wbs_item_id,
//!         project_id: project.project_id,
//!         period_id: 1,
//!         assigned_by: "admin".to_string(),
//!     })
//!     .await?;
//! assert_eq!(assignment.display_order, 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod identity;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod stores;

pub use constants::{Direction, EvaluatorType};
pub use error::{EvaluationCoreError, Result};
pub use identity::{DirectoryIdentityResolver, ExternalId, IdentityResolver};
pub use logging::init_structured_logging;
pub use orchestration::{
    ActivityEvent, ActivityLog, AssignWbsRequest, AssignmentOrchestrator, BulkAssignmentItem,
    EvaluatorAutoConfigurator, EvaluatorConfiguration, InsertBetweenRequest, InsertBetweenResult,
    OrderingEngine, OrderingScope, PeerEvaluationSetup, TracingActivityLog,
};
