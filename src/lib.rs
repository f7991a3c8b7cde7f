// ==========================================
// Academic Records Platform - promotion evaluation core
// ==========================================
// Scope: derived facts per student per academic year, a refreshable
// summary projection, declarative promotion rules with explainable
// evaluation, and batch promotion execution with an immutable audit
// trail. Transport, authentication and tenant scoping live outside
// this crate.
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - business computation
pub mod engine;

// API layer - procedure-call boundary
pub mod api;

// Database infrastructure (connection init / unified PRAGMA / schema)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports of core types
// ==========================================

pub use domain::{
    ConditionNode, ConditionOperator, CourseEnrollmentStatus, EnrollmentStatus, GradeBand,
    GradingConfig, NewPromotionRule, PromotionExecution, PromotionExecutionDetails,
    PromotionExecutionResult, PromotionRule, PromotionRuleUpdate, RuleSet,
    StudentPromotionFacts,
};

pub use engine::{
    ApplyPromotionRequest, ClassPromotionEvaluation, CourseEnrollmentService,
    EnrollmentHistoryReader, FactsBuilder, PromotionExecutor, RuleEvaluator, StudentEvaluation,
    SummaryRefreshService, TranscriptAggregator,
};

pub use api::{ApiError, ApiResult, RulesApi, SummariesApi};

// ==========================================
// Constants
// ==========================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
