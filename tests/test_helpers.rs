// ==========================================
// Test helpers
// ==========================================
// Database initialization and seed data builders shared by the
// integration tests.
// ==========================================

#![allow(dead_code)]

use academic_promotion::db;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Create a temp database with the full schema
///
/// # Returns
/// - NamedTempFile: temp database file (must stay alive)
/// - String: its path
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// Open a shared connection to a test database
pub fn open_test_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    let conn = db::open_sqlite_connection(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

// ==========================================
// seed builders
// ==========================================

pub fn insert_academic_year(
    conn: &Connection,
    id: &str,
    label: &str,
    start_year: i32,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO academic_year (academic_year_id, label, start_year) VALUES (?1, ?2, ?3)",
        params![id, label, start_year],
    )?;
    Ok(())
}

pub fn insert_program(
    conn: &Connection,
    id: &str,
    code: &str,
    name: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO program (program_id, code, name) VALUES (?1, ?2, ?3)",
        params![id, code, name],
    )?;
    Ok(())
}

pub fn insert_class(
    conn: &Connection,
    id: &str,
    name: &str,
    program_id: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO school_class (class_id, name, program_id, cycle_level_id) VALUES (?1, ?2, ?3, NULL)",
        params![id, name, program_id],
    )?;
    Ok(())
}

pub fn insert_student(
    conn: &Connection,
    id: &str,
    registration_number: &str,
    class_id: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO student (
            student_id, registration_number, first_name, last_name,
            class_id, admission_year_id
        ) VALUES (?1, ?2, 'Test', 'Student', ?3, NULL)
        "#,
        params![id, registration_number, class_id],
    )?;
    Ok(())
}

pub fn insert_teaching_unit(
    conn: &Connection,
    id: &str,
    code: &str,
    credits: f64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO teaching_unit (teaching_unit_id, code, name, credits) VALUES (?1, ?2, ?2, ?3)",
        params![id, code, credits],
    )?;
    Ok(())
}

pub fn insert_course(
    conn: &Connection,
    id: &str,
    teaching_unit_id: &str,
    code: &str,
    credits: f64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO course (course_id, teaching_unit_id, code, name, credits) VALUES (?1, ?2, ?3, ?3, ?4)",
        params![id, teaching_unit_id, code, credits],
    )?;
    Ok(())
}

pub fn insert_class_course(
    conn: &Connection,
    id: &str,
    class_id: &str,
    course_id: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO class_course (class_course_id, class_id, course_id) VALUES (?1, ?2, ?3)",
        params![id, class_id, course_id],
    )?;
    Ok(())
}

pub fn insert_exam(
    conn: &Connection,
    id: &str,
    class_course_id: &str,
    percentage: f64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO exam (exam_id, class_course_id, name, percentage, exam_date) VALUES (?1, ?2, ?1, ?3, NULL)",
        params![id, class_course_id, percentage],
    )?;
    Ok(())
}

pub fn insert_grade(
    conn: &Connection,
    id: &str,
    exam_id: &str,
    student_id: &str,
    score: f64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO grade (grade_id, exam_id, student_id, score, recorded_at) VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        params![id, exam_id, student_id, score],
    )?;
    Ok(())
}

pub fn insert_enrollment(
    conn: &Connection,
    id: &str,
    student_id: &str,
    class_id: &str,
    academic_year_id: &str,
    status: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO enrollment (
            enrollment_id, student_id, class_id, academic_year_id,
            status, enrolled_at, closed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, '2025-09-01T08:00:00+00:00', NULL)
        "#,
        params![id, student_id, class_id, academic_year_id, status],
    )?;
    Ok(())
}

pub fn insert_course_enrollment(
    conn: &Connection,
    id: &str,
    enrollment_id: &str,
    student_id: &str,
    course_id: &str,
    academic_year_id: &str,
    status: &str,
    attempt_number: i64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO course_enrollment (
            course_enrollment_id, enrollment_id, student_id, course_id,
            academic_year_id, status, attempt_number, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
        "#,
        params![
            id,
            enrollment_id,
            student_id,
            course_id,
            academic_year_id,
            status,
            attempt_number
        ],
    )?;
    Ok(())
}

/// Seed a minimal graded scenario: one class, one student, one course
/// worth `credits` with a single 100% exam scored `score`
pub struct SimpleScenario {
    pub year_id: String,
    pub class_id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrollment_id: String,
}

pub fn seed_simple_scenario(
    conn: &Connection,
    score: f64,
    credits: f64,
) -> Result<SimpleScenario, Box<dyn Error>> {
    insert_academic_year(conn, "y2025", "2025-2026", 2025)?;
    insert_program(conn, "p1", "CS", "Computer Science")?;
    insert_class(conn, "c1", "L1-A", Some("p1"))?;
    insert_student(conn, "s1", "R-0001", Some("c1"))?;
    insert_teaching_unit(conn, "u1", "UE1", credits)?;
    insert_course(conn, "co1", "u1", "MATH101", credits)?;
    insert_class_course(conn, "cc1", "c1", "co1")?;
    insert_exam(conn, "e1", "cc1", 100.0)?;
    insert_grade(conn, "g1", "e1", "s1", score)?;
    insert_enrollment(conn, "en1", "s1", "c1", "y2025", "ACTIVE")?;
    insert_course_enrollment(conn, "ce1", "en1", "s1", "co1", "y2025", "ACTIVE", 1)?;

    Ok(SimpleScenario {
        year_id: "y2025".to_string(),
        class_id: "c1".to_string(),
        student_id: "s1".to_string(),
        course_id: "co1".to_string(),
        enrollment_id: "en1".to_string(),
    })
}
