// ==========================================
// Academic Records Platform - SQLite connection setup
// ==========================================
// Goals:
// - One place for Connection::open PRAGMA behavior, so every module
//   runs with foreign keys enabled instead of "some do, some don't"
// - Shared busy_timeout to cut down on spurious busy errors when
//   parallel requests touch the credit ledger
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version the code expects
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the unified PRAGMA set to a connection
///
/// foreign_keys and busy_timeout are per-connection settings, so this
/// must run on every connection, not once per database.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration
///
/// Warns (but still opens) when the database carries a schema version
/// other than the one this build expects; a fresh database without a
/// schema_version table passes silently because `init_schema` has not
/// run yet.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;

    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                db_path = db_path,
                found = version,
                expected = CURRENT_SCHEMA_VERSION,
                "database schema version mismatch"
            );
        }
    }
    Ok(conn)
}

/// Read schema_version (None if the table does not exist yet)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Initialize the full schema on an empty database
///
/// Idempotent (CREATE TABLE IF NOT EXISTS everywhere); used by the
/// integration tests and by embedding applications that manage their
/// own database file.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ===== directory entities (owned by the wider platform) =====

        CREATE TABLE IF NOT EXISTS program (
            program_id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS academic_year (
            academic_year_id TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            start_year INTEGER NOT NULL,
            UNIQUE(start_year)
        );

        CREATE TABLE IF NOT EXISTS school_class (
            class_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            program_id TEXT REFERENCES program(program_id),
            cycle_level_id TEXT
        );

        CREATE TABLE IF NOT EXISTS student (
            student_id TEXT PRIMARY KEY,
            registration_number TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            class_id TEXT REFERENCES school_class(class_id),
            admission_year_id TEXT REFERENCES academic_year(academic_year_id),
            UNIQUE(registration_number)
        );

        -- ===== curriculum =====

        CREATE TABLE IF NOT EXISTS teaching_unit (
            teaching_unit_id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            credits REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS course (
            course_id TEXT PRIMARY KEY,
            teaching_unit_id TEXT NOT NULL REFERENCES teaching_unit(teaching_unit_id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            credits REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS class_course (
            class_course_id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL REFERENCES school_class(class_id),
            course_id TEXT NOT NULL REFERENCES course(course_id)
        );

        CREATE TABLE IF NOT EXISTS exam (
            exam_id TEXT PRIMARY KEY,
            class_course_id TEXT NOT NULL REFERENCES class_course(class_course_id),
            name TEXT NOT NULL,
            percentage REAL NOT NULL,
            exam_date TEXT
        );

        CREATE TABLE IF NOT EXISTS grade (
            grade_id TEXT PRIMARY KEY,
            exam_id TEXT NOT NULL REFERENCES exam(exam_id),
            student_id TEXT NOT NULL REFERENCES student(student_id),
            score REAL NOT NULL,
            recorded_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_grade_student ON grade(student_id);

        -- ===== enrollment lifecycle =====

        CREATE TABLE IF NOT EXISTS enrollment (
            enrollment_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            class_id TEXT NOT NULL REFERENCES school_class(class_id),
            academic_year_id TEXT NOT NULL REFERENCES academic_year(academic_year_id),
            status TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            closed_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_enrollment_student ON enrollment(student_id);
        CREATE INDEX IF NOT EXISTS idx_enrollment_class ON enrollment(class_id, academic_year_id);

        CREATE TABLE IF NOT EXISTS course_enrollment (
            course_enrollment_id TEXT PRIMARY KEY,
            enrollment_id TEXT NOT NULL REFERENCES enrollment(enrollment_id),
            student_id TEXT NOT NULL REFERENCES student(student_id),
            course_id TEXT NOT NULL REFERENCES course(course_id),
            academic_year_id TEXT NOT NULL REFERENCES academic_year(academic_year_id),
            status TEXT NOT NULL,
            attempt_number INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_course_enrollment_student
            ON course_enrollment(student_id, academic_year_id);

        -- ===== credit ledger (accumulator, delta-updated only) =====

        CREATE TABLE IF NOT EXISTS credit_ledger (
            student_id TEXT NOT NULL REFERENCES student(student_id),
            academic_year_id TEXT NOT NULL REFERENCES academic_year(academic_year_id),
            credits_earned REAL NOT NULL DEFAULT 0,
            credits_in_progress REAL NOT NULL DEFAULT 0,
            required_credits REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (student_id, academic_year_id)
        );

        -- ===== promotion summary cache =====

        CREATE TABLE IF NOT EXISTS promotion_summary (
            student_id TEXT NOT NULL REFERENCES student(student_id),
            academic_year_id TEXT NOT NULL REFERENCES academic_year(academic_year_id),
            overall_average REAL NOT NULL,
            credits_earned REAL NOT NULL,
            facts_json TEXT NOT NULL,
            refreshed_at TEXT NOT NULL,
            PRIMARY KEY (student_id, academic_year_id)
        );

        -- ===== promotion rules =====

        CREATE TABLE IF NOT EXISTS promotion_rule (
            rule_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            source_class_id TEXT,
            program_id TEXT,
            cycle_level_id TEXT,
            ruleset_json TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- ===== promotion execution audit (append-only) =====

        CREATE TABLE IF NOT EXISTS promotion_execution (
            execution_id TEXT PRIMARY KEY,
            rule_id TEXT NOT NULL REFERENCES promotion_rule(rule_id),
            source_class_id TEXT NOT NULL,
            target_class_id TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            executed_by TEXT NOT NULL,
            executed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS promotion_execution_result (
            result_id TEXT PRIMARY KEY,
            execution_id TEXT NOT NULL REFERENCES promotion_execution(execution_id),
            student_id TEXT NOT NULL,
            was_promoted INTEGER NOT NULL,
            reasons_json TEXT,
            facts_json TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_execution_result_execution
            ON promotion_execution_result(execution_id);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_schema_version_recorded_on_init() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();

        let conn = open_sqlite_connection(path).unwrap();
        // fresh file: no schema_version table yet
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );

        // re-opening an initialized database reads the same version
        let reopened = open_sqlite_connection(path).unwrap();
        assert_eq!(
            read_schema_version(&reopened).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let conn = open_sqlite_connection(temp.path().to_str().unwrap()).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
