// ==========================================
// Academic Records Platform - promotion execution audit entities
// ==========================================
// Append-only: once written, an execution and its per-student results
// are the historical record of what happened, independent of later
// rule or data changes.
// ==========================================

use crate::domain::facts::StudentPromotionFacts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One batch promotion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionExecution {
    pub execution_id: String,
    pub rule_id: String,
    pub source_class_id: String,
    pub target_class_id: String,
    pub academic_year_id: String,
    pub executed_by: String,
    pub executed_at: DateTime<Utc>,
}

/// Per-student outcome of a promotion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionExecutionResult {
    pub result_id: String,
    pub execution_id: String,
    pub student_id: String,
    pub was_promoted: bool,
    /// Failure reasons when not promoted; empty on success
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Facts snapshot the decision was based on, when available
    pub facts: Option<StudentPromotionFacts>,
}

/// Execution plus its results, as returned by getExecutionDetails
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionExecutionDetails {
    pub execution: PromotionExecution,
    pub results: Vec<PromotionExecutionResult>,
    pub promoted_count: u32,
    pub failed_count: u32,
}
