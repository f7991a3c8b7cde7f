// ==========================================
// Academic Records Platform - repository layer
// ==========================================
// Red line: repositories do data mapping only, no business logic
// ==========================================

pub mod credit_ledger_repo;
pub mod enrollment_repo;
pub mod error;
pub mod execution_repo;
pub mod grade_repo;
pub mod rule_repo;
pub mod student_repo;
pub mod summary_repo;

pub use credit_ledger_repo::{CreditLedgerEntry, CreditLedgerRepository, CreditLedgerSummary};
pub use enrollment_repo::{CourseEnrollmentRow, EnrollmentRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use execution_repo::PromotionExecutionRepository;
pub use grade_repo::{GradeRepository, GradedExamRow};
pub use rule_repo::PromotionRuleRepository;
pub use student_repo::StudentRepository;
pub use summary_repo::{PromotionSummaryRepository, PromotionSummaryRow};
