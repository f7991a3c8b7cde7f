// ==========================================
// Academic Records Platform - engine layer
// ==========================================
// Business computation: aggregation, derived facts, rule matching,
// batch execution. Repositories do the data access; engines own the
// arithmetic and decisions.
// ==========================================

pub mod condition;
pub mod credit_ledger;
pub mod enrollment_history;
pub mod evaluator;
pub mod executor;
pub mod facts_builder;
pub mod summary_refresh;
pub mod transcript;

pub use condition::{evaluate as evaluate_condition, ConditionOutcome};
pub use credit_ledger::{credit_contribution, transition_delta, CourseEnrollmentService};
pub use enrollment_history::EnrollmentHistoryReader;
pub use evaluator::{
    ClassPromotionEvaluation, RuleEvaluator, StudentEvaluation, MISSING_SUMMARY_REASON,
};
pub use executor::{ApplyPromotionRequest, PromotionExecutor};
pub use facts_builder::FactsBuilder;
pub use summary_refresh::SummaryRefreshService;
pub use transcript::{aggregate_rows, TranscriptAggregator, TranscriptSummary};
