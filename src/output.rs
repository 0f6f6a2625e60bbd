//! Text tables and JSON rendering for report output.

use crate::error::Result;
use crate::models::{
    AuditRow, Course, CourseRanking, DepartmentTrend, Enrollment, Mismatch, PeerPair, RosterRow,
    SemesterChange, Student, StudentStanding,
};
use comfy_table::{Table, presets};
use serde::Serialize;
use std::fmt;

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table, or `empty` when it has no rows
pub fn print_table(table: &Table, empty: &str) {
    if table.row_iter().next().is_none() {
        println!("{empty}");
    } else {
        println!("{table}");
    }
}

/// Borderless table with the given header row
fn new_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING).set_header(headers);
    table
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

fn grade(value: Option<f64>) -> String {
    value.map_or_else(|| "in progress".to_string(), |g| format!("{g:.2}"))
}

fn decimal(value: f64) -> String {
    format!("{value:.2}")
}

fn signed<T: fmt::Display + Default + PartialOrd>(value: &Option<T>) -> String {
    match value {
        Some(v) if *v > T::default() => format!("+{v}"),
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

pub fn students_table(students: &[Student]) -> Table {
    let mut table = new_table(vec!["ID", "NAME", "MAJOR", "ADMITTED"]);
    for s in students {
        table.add_row(vec![
            s.student_id.to_string(),
            s.name.clone(),
            opt(&s.major),
            s.enrollment_date.to_string(),
        ]);
    }
    table
}

pub fn courses_table(courses: &[Course]) -> Table {
    let mut table = new_table(vec!["ID", "CODE", "NAME", "DEPARTMENT", "CREDITS"]);
    for c in courses {
        table.add_row(vec![
            c.course_id.to_string(),
            c.course_code.clone(),
            c.course_name.clone(),
            c.department.clone(),
            c.credits.to_string(),
        ]);
    }
    table
}

pub fn enrollment_line(e: &Enrollment) -> String {
    format!(
        "#{} student #{} in course #{} ({}), grade: {}",
        e.enrollment_id,
        e.student_id,
        e.course_id,
        e.semester,
        grade(e.grade)
    )
}

pub fn roster_table(rows: &[RosterRow]) -> Table {
    let mut table = new_table(vec![
        "ENROLLMENT", "STUDENT", "NAME", "MAJOR", "CODE", "COURSE", "CREDITS", "GRADE",
    ]);
    for r in rows {
        table.add_row(vec![
            r.enrollment_id.to_string(),
            r.student_id.to_string(),
            r.student_name.clone(),
            opt(&r.major),
            r.course_code.clone(),
            r.course_name.clone(),
            r.credits.to_string(),
            grade(r.grade),
        ]);
    }
    table
}

pub fn audit_table(rows: &[AuditRow]) -> Table {
    let mut table = new_table(vec!["STUDENT", "NAME", "COURSE", "CODE", "STATUS"]);
    for r in rows {
        table.add_row(vec![
            opt(&r.student_id),
            opt(&r.student_name),
            opt(&r.course_id),
            opt(&r.course_code),
            r.status.to_string(),
        ]);
    }
    table
}

pub fn peers_table(rows: &[PeerPair]) -> Table {
    let mut table = new_table(vec!["STUDENT 1", "NAME 1", "STUDENT 2", "NAME 2", "MAJOR", "ADMITTED"]);
    for p in rows {
        table.add_row(vec![
            p.student1_id.to_string(),
            p.student1_name.clone(),
            p.student2_id.to_string(),
            p.student2_name.clone(),
            p.major.clone(),
            p.enrollment_date.to_string(),
        ]);
    }
    table
}

pub fn rankings_table(rows: &[CourseRanking]) -> Table {
    let mut table = new_table(vec![
        "DEPARTMENT", "CODE", "ENROLLED", "ROW", "RANK", "DENSE", "PCT RANK",
    ]);
    for r in rows {
        table.add_row(vec![
            r.department.clone(),
            r.course_code.clone(),
            r.enrollment_count.to_string(),
            r.row_number.to_string(),
            r.rank.to_string(),
            r.dense_rank.to_string(),
            decimal(r.percent_rank),
        ]);
    }
    table
}

pub fn trends_table(rows: &[DepartmentTrend]) -> Table {
    let mut table = new_table(vec![
        "DEPARTMENT", "SEMESTER", "ENROLLED", "RUNNING TOTAL", "MOVING AVG",
    ]);
    for r in rows {
        table.add_row(vec![
            r.department.clone(),
            r.semester.clone(),
            r.enrollment_count.to_string(),
            r.running_total.to_string(),
            decimal(r.moving_average),
        ]);
    }
    table
}

pub fn changes_table(rows: &[SemesterChange]) -> Table {
    let mut table = new_table(vec![
        "CODE", "SEMESTER", "GRADED", "AVG", "PREV", "PREV AVG", "CHANGE", "AVG CHANGE", "NEXT",
    ]);
    for r in rows {
        table.add_row(vec![
            r.course_code.clone(),
            r.semester.clone(),
            r.enrollment_count.to_string(),
            decimal(r.average_grade),
            opt(&r.previous_count),
            r.previous_average.map_or_else(|| "-".to_string(), decimal),
            signed(&r.count_change),
            signed(&r.grade_change.map(|g| (g * 100.0).round() / 100.0)),
            opt(&r.next_count),
        ]);
    }
    table
}

pub fn distribution_table(rows: &[StudentStanding]) -> Table {
    let mut table = new_table(vec![
        "MAJOR", "STUDENT", "NAME", "COURSES", "GPA", "QUARTILE", "TIER", "CUME DIST",
    ]);
    for r in rows {
        table.add_row(vec![
            r.major.clone(),
            r.student_id.to_string(),
            r.name.clone(),
            r.courses_completed.to_string(),
            decimal(r.gpa),
            r.quartile.to_string(),
            r.tier.to_string(),
            decimal(r.cume_dist),
        ]);
    }
    table
}

pub fn mismatches_table(rows: &[Mismatch]) -> Table {
    let mut table = new_table(vec!["REPORT", "ROW", "COLUMN", "EXPECTED", "ACTUAL"]);
    for m in rows {
        table.add_row(vec![
            m.report.to_string(),
            m.row.clone(),
            m.column.to_string(),
            m.expected.clone(),
            m.actual.clone(),
        ]);
    }
    table
}
