//! # Domain Models
//!
//! Row types for the assignment lifecycle core. Each model maps to one
//! `eval_`-prefixed table and carries a `New*` companion for creation without
//! generated fields. Soft-deletable rows use a `deleted_at` marker rather than
//! physical deletion.

pub mod employee;
pub mod evaluation_criteria;
pub mod evaluation_line;
pub mod line_mapping;
pub mod project;
pub mod self_evaluation;
pub mod wbs_assignment;
pub mod wbs_item;

pub use employee::Employee;
pub use evaluation_criteria::{NewWbsEvaluationCriteria, WbsEvaluationCriteria};
pub use evaluation_line::EvaluationLine;
pub use line_mapping::{EvaluationLineMapping, NewEvaluationLineMapping};
pub use project::Project;
pub use self_evaluation::{NewWbsSelfEvaluation, WbsSelfEvaluation};
pub use wbs_assignment::{NewWbsAssignment, WbsAssignment};
pub use wbs_item::{NewWbsItem, WbsItem};
