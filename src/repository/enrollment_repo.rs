// ==========================================
// EnrollmentRepository - enrollment and course-enrollment access
// ==========================================
// Covers the enrollment directory reads (history, rosters, open
// course enrollments) and the status update the course-enrollment
// transition service performs. The promotion executor's enrollment
// writes run as inline SQL inside its own transaction instead.
// ==========================================

use crate::domain::student::EnrollmentRecord;
use crate::domain::types::{CourseEnrollmentStatus, EnrollmentStatus};
use crate::repository::error::{parse_timestamp, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// One course-enrollment row with the course's credit weight attached
#[derive(Debug, Clone)]
pub struct CourseEnrollmentRow {
    pub course_enrollment_id: String,
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub academic_year_id: String,
    pub status: CourseEnrollmentStatus,
    pub attempt_number: u32,
    pub course_credits: f64,
}

pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // status and timestamps parsed after the row closure; kept raw here
    fn map_enrollment(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(EnrollmentRecord, String, String, Option<String>)> {
        let status_raw: String = row.get(4)?;
        let enrolled_at_raw: String = row.get(5)?;
        let closed_at_raw: Option<String> = row.get(6)?;
        Ok((
            EnrollmentRecord {
                enrollment_id: row.get(0)?,
                student_id: row.get(1)?,
                class_id: row.get(2)?,
                academic_year_id: row.get(3)?,
                status: EnrollmentStatus::Active,
                enrolled_at: Utc::now(),
                closed_at: None,
            },
            status_raw,
            enrolled_at_raw,
            closed_at_raw,
        ))
    }

    fn finish_enrollment(
        (mut record, status_raw, enrolled_at_raw, closed_at_raw): (
            EnrollmentRecord,
            String,
            String,
            Option<String>,
        ),
    ) -> RepositoryResult<EnrollmentRecord> {
        record.status = EnrollmentStatus::parse(&status_raw).ok_or_else(|| {
            RepositoryError::ValidationError(format!(
                "unknown enrollment status '{}' for enrollment {}",
                status_raw, record.enrollment_id
            ))
        })?;
        record.enrolled_at =
            parse_timestamp(&enrolled_at_raw, "enrolled_at", &record.enrollment_id)?;
        record.closed_at = closed_at_raw
            .map(|s| parse_timestamp(&s, "closed_at", &record.enrollment_id))
            .transpose()?;
        Ok(record)
    }

    // ==========================================
    // enrollment reads
    // ==========================================

    /// Full enrollment history of a student, oldest first
    pub fn list_for_student(&self, student_id: &str) -> RepositoryResult<Vec<EnrollmentRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT enrollment_id, student_id, class_id, academic_year_id,
                   status, enrolled_at, closed_at
            FROM enrollment
            WHERE student_id = ?1
            ORDER BY enrolled_at ASC
            "#,
        )?;

        let raw = stmt
            .query_map(params![student_id], Self::map_enrollment)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(Self::finish_enrollment).collect()
    }

    /// Active enrollment of a student in a given class, if any
    pub fn get_active_enrollment(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> RepositoryResult<Option<EnrollmentRecord>> {
        let conn = self.get_conn()?;

        let raw = conn
            .query_row(
                r#"
                SELECT enrollment_id, student_id, class_id, academic_year_id,
                       status, enrolled_at, closed_at
                FROM enrollment
                WHERE student_id = ?1 AND class_id = ?2 AND status = 'ACTIVE'
                "#,
                params![student_id, class_id],
                Self::map_enrollment,
            )
            .optional()?;

        raw.map(Self::finish_enrollment).transpose()
    }

    /// Whether the student has any enrollment in the class (any status)
    pub fn enrollment_exists(&self, student_id: &str, class_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM enrollment WHERE student_id = ?1 AND class_id = ?2 LIMIT 1",
                params![student_id, class_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ==========================================
    // course enrollment access
    // ==========================================

    fn map_course_enrollment(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CourseEnrollmentRow, String)> {
        let status_raw: String = row.get(5)?;
        Ok((
            CourseEnrollmentRow {
                course_enrollment_id: row.get(0)?,
                enrollment_id: row.get(1)?,
                student_id: row.get(2)?,
                course_id: row.get(3)?,
                academic_year_id: row.get(4)?,
                status: CourseEnrollmentStatus::Planned,
                attempt_number: row.get::<_, i64>(6)? as u32,
                course_credits: row.get(7)?,
            },
            status_raw,
        ))
    }

    fn finish_course_enrollment(
        (mut row, status_raw): (CourseEnrollmentRow, String),
    ) -> RepositoryResult<CourseEnrollmentRow> {
        row.status = CourseEnrollmentStatus::parse(&status_raw).ok_or_else(|| {
            RepositoryError::ValidationError(format!(
                "unknown course enrollment status '{}' for {}",
                status_raw, row.course_enrollment_id
            ))
        })?;
        Ok(row)
    }

    /// Course enrollments of a student in one academic year
    pub fn list_course_enrollments(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<Vec<CourseEnrollmentRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT ce.course_enrollment_id, ce.enrollment_id, ce.student_id,
                   ce.course_id, ce.academic_year_id, ce.status,
                   ce.attempt_number, co.credits
            FROM course_enrollment ce
            JOIN course co ON co.course_id = ce.course_id
            WHERE ce.student_id = ?1 AND ce.academic_year_id = ?2
            ORDER BY ce.course_enrollment_id
            "#,
        )?;

        let raw = stmt
            .query_map(params![student_id, academic_year_id], Self::map_course_enrollment)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(Self::finish_course_enrollment).collect()
    }

    /// Open (planned/active) course enrollments under one enrollment
    pub fn list_open_course_enrollments(
        &self,
        enrollment_id: &str,
    ) -> RepositoryResult<Vec<CourseEnrollmentRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT ce.course_enrollment_id, ce.enrollment_id, ce.student_id,
                   ce.course_id, ce.academic_year_id, ce.status,
                   ce.attempt_number, co.credits
            FROM course_enrollment ce
            JOIN course co ON co.course_id = ce.course_id
            WHERE ce.enrollment_id = ?1 AND ce.status IN ('PLANNED', 'ACTIVE')
            ORDER BY ce.course_enrollment_id
            "#,
        )?;

        let raw = stmt
            .query_map(params![enrollment_id], Self::map_course_enrollment)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(Self::finish_course_enrollment).collect()
    }

    pub fn update_course_enrollment_status(
        &self,
        course_enrollment_id: &str,
        status: CourseEnrollmentStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE course_enrollment SET status = ?2, updated_at = ?3 WHERE course_enrollment_id = ?1",
            params![course_enrollment_id, status.as_str(), Utc::now().to_rfc3339()],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CourseEnrollment".to_string(),
                id: course_enrollment_id.to_string(),
            });
        }
        Ok(())
    }
}
