// ==========================================
// Academic Records Platform - domain type definitions
// ==========================================
// Grading scale: 0-20, pass at 10, compensable band [8,10),
// eliminatory below 8
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Grading scale constants
// ==========================================

/// Upper bound of the grading scale
pub const GRADE_SCALE_MAX: f64 = 20.0;

/// Passing threshold on the 0-20 scale
pub const PASSING_THRESHOLD: f64 = 10.0;

/// Lower bound of the compensable band; averages in [8,10) may be
/// offset by stronger averages elsewhere
pub const COMPENSABLE_THRESHOLD: f64 = 8.0;

// ==========================================
// Grading configuration
// ==========================================

/// Tunable grading/promotion thresholds
///
/// Defaults follow the standard 0-20 scale; institutions with a
/// different on-track policy can override the completion floor.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    pub passing_threshold: f64,
    pub compensable_threshold: f64,
    /// Minimum credit completion rate for the on-track indicator
    pub on_track_completion_rate: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            passing_threshold: PASSING_THRESHOLD,
            compensable_threshold: COMPENSABLE_THRESHOLD,
            on_track_completion_rate: 0.75,
        }
    }
}

// ==========================================
// Grade band classification
// ==========================================

/// Band a course average falls in under compensation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeBand {
    Passed,      // >= 10
    Compensable, // [8, 10)
    Eliminatory, // < 8
}

impl GradeBand {
    pub fn classify(average: f64, config: &GradingConfig) -> Self {
        if average >= config.passing_threshold {
            GradeBand::Passed
        } else if average >= config.compensable_threshold {
            GradeBand::Compensable
        } else {
            GradeBand::Eliminatory
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeBand::Passed => write!(f, "PASSED"),
            GradeBand::Compensable => write!(f, "COMPENSABLE"),
            GradeBand::Eliminatory => write!(f, "ELIMINATORY"),
        }
    }
}

// ==========================================
// Enrollment status (student x class x year)
// ==========================================
// Serialization format: SCREAMING_SNAKE_CASE (matches the database)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,    // currently enrolled
    Completed, // year finished, promotion applied or year validated
    Withdrawn, // left before completion
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(EnrollmentStatus::Active),
            "COMPLETED" => Some(EnrollmentStatus::Completed),
            "WITHDRAWN" => Some(EnrollmentStatus::Withdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Course enrollment status
// ==========================================
// Drives the credit ledger contribution table: planned/active count
// as in-progress credits, completed counts as earned credits,
// failed/withdrawn contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseEnrollmentStatus {
    Planned,
    Active,
    Completed,
    Failed,
    Withdrawn,
}

impl CourseEnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseEnrollmentStatus::Planned => "PLANNED",
            CourseEnrollmentStatus::Active => "ACTIVE",
            CourseEnrollmentStatus::Completed => "COMPLETED",
            CourseEnrollmentStatus::Failed => "FAILED",
            CourseEnrollmentStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(CourseEnrollmentStatus::Planned),
            "ACTIVE" => Some(CourseEnrollmentStatus::Active),
            "COMPLETED" => Some(CourseEnrollmentStatus::Completed),
            "FAILED" => Some(CourseEnrollmentStatus::Failed),
            "WITHDRAWN" => Some(CourseEnrollmentStatus::Withdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for CourseEnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
