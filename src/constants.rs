//! # System Constants
//!
//! Core constants and enums that define the operational boundaries of the
//! assignment lifecycle core: evaluator role types, the display-order sentinel,
//! and the activity-log action names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default importance written into the lazily created criteria placeholder row.
pub const DEFAULT_CRITERIA_IMPORTANCE: i32 = 5;

/// Out-of-range display order used when a row is first persisted, before the
/// resequencing pass assigns its real position. Must stay far above any dense
/// 0..N-1 sequence a real scope can reach.
pub const DISPLAY_ORDER_SENTINEL: i32 = 1_000_000;

/// Activity-log action names recorded by the orchestrator.
pub mod actions {
    pub const WBS_ASSIGNED: &str = "wbs.assigned";
    pub const WBS_ASSIGNMENT_CANCELLED: &str = "wbs.assignment_cancelled";
    pub const WBS_BULK_ASSIGNED: &str = "wbs.bulk_assigned";
    pub const WBS_ORDER_CHANGED: &str = "wbs.order_changed";
    pub const WBS_INSERTED: &str = "wbs.inserted";
    pub const WBS_ASSIGNMENTS_RESET: &str = "wbs.assignments_reset";
}

/// Evaluator role carried by an evaluation-line template.
///
/// Stored as `PRIMARY` / `SECONDARY` text in the line row; the enum keeps the
/// comparison sites type-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvaluatorType {
    Primary,
    Secondary,
}

impl EvaluatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorType::Primary => "PRIMARY",
            EvaluatorType::Secondary => "SECONDARY",
        }
    }
}

impl fmt::Display for EvaluatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EvaluatorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIMARY" => Ok(EvaluatorType::Primary),
            "SECONDARY" => Ok(EvaluatorType::Secondary),
            other => Err(format!("unknown evaluator type: {other}")),
        }
    }
}

/// Direction for single-step reordering of an assignment within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}
