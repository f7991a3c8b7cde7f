// ==========================================
// Academic Records Platform - API layer
// ==========================================

pub mod error;
pub mod rules_api;
pub mod summary_api;

pub use error::{ApiError, ApiResult};
pub use rules_api::RulesApi;
pub use summary_api::{ClassRefreshOutcome, SummariesApi};
