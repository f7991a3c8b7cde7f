// ==========================================
// Academic Records Platform - directory entities
// ==========================================
// Read-side views of entities owned by the wider platform; the
// promotion core consumes them but does not manage their lifecycle
// (except for the enrollment mutations done by the executor).
// ==========================================

use crate::domain::types::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Student directory entry, joined to class and program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_id: String,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<String>,
    pub class_name: Option<String>,
    pub program_id: Option<String>,
    pub program_code: Option<String>,
    pub admission_year_id: Option<String>,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Academic year directory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub academic_year_id: String,
    pub label: String,
    pub start_year: i32,
}

/// One enrollment row (student x class x academic year)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    pub enrollment_id: String,
    pub student_id: String,
    pub class_id: String,
    pub academic_year_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Enrollment history counters for one student
///
/// "Prior" counts enrollments in academic years other than the one
/// being evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentHistorySummary {
    pub enrollments_count: u32,
    pub completed_years_count: u32,
    pub active_years_count: u32,
    pub withdrawn_years_count: u32,
    pub prior_enrollments_count: u32,
}
