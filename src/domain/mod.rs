// ==========================================
// Academic Records Platform - domain layer
// ==========================================

pub mod execution;
pub mod facts;
pub mod rule;
pub mod student;
pub mod types;

pub use execution::{PromotionExecution, PromotionExecutionDetails, PromotionExecutionResult};
pub use facts::{CourseAverage, FactValue, StudentPromotionFacts, TeachingUnitAverage};
pub use rule::{
    ConditionNode, ConditionOperator, NewPromotionRule, PromotionRule, PromotionRuleUpdate,
    RuleEvent, RuleSet,
};
pub use student::{AcademicYear, EnrollmentHistorySummary, EnrollmentRecord, StudentRecord};
pub use types::{
    CourseEnrollmentStatus, EnrollmentStatus, GradeBand, GradingConfig, COMPENSABLE_THRESHOLD,
    GRADE_SCALE_MAX, PASSING_THRESHOLD,
};
