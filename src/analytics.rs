//! Window-function analytics over per-course, per-department and
//! per-student aggregates.

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    CourseRanking, DepartmentTrend, Mismatch, PerformanceTier, SemesterChange, StudentStanding,
};
use crate::window;
use rusqlite::Row;
use std::fmt::Display;
use tracing::{debug, warn};

const FLOAT_TOLERANCE: f64 = 1e-9;
// Values rounded to 2 places in SQL
const ROUNDED_TOLERANCE: f64 = 0.0051;

impl Database {
    /// Courses ranked by enrollment count within their department
    pub fn course_rankings(&self) -> Result<Vec<CourseRanking>> {
        let mut stmt = self.conn().prepare(
            "WITH course_counts AS (
                SELECT c.department, c.course_id, c.course_code,
                       COUNT(e.enrollment_id) AS enrollment_count
                FROM courses c
                LEFT JOIN enrollments e ON e.course_id = c.course_id
                GROUP BY c.department, c.course_id, c.course_code
            )
            SELECT department, course_id, course_code, enrollment_count,
                   ROW_NUMBER() OVER (
                       PARTITION BY department ORDER BY enrollment_count DESC, course_id
                   ) AS row_num,
                   RANK() OVER by_count AS rank,
                   DENSE_RANK() OVER by_count AS dense_rank,
                   PERCENT_RANK() OVER by_count AS percent_rank
            FROM course_counts
            WINDOW by_count AS (PARTITION BY department ORDER BY enrollment_count DESC)
            ORDER BY department, row_num",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CourseRanking {
                    department: row.get(0)?,
                    course_id: row.get(1)?,
                    course_code: row.get(2)?,
                    enrollment_count: row.get(3)?,
                    row_number: row.get(4)?,
                    rank: row.get(5)?,
                    dense_rank: row.get(6)?,
                    percent_rank: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "course rankings");
        Ok(rows)
    }

    /// Per-semester department volume with a running total and a
    /// three-semester centered moving average
    pub fn department_trends(&self) -> Result<Vec<DepartmentTrend>> {
        let mut stmt = self.conn().prepare(
            "WITH semester_counts AS (
                SELECT c.department, e.semester, COUNT(*) AS enrollment_count
                FROM enrollments e
                INNER JOIN courses c ON c.course_id = e.course_id
                GROUP BY c.department, e.semester
            )
            SELECT department, semester, enrollment_count,
                   SUM(enrollment_count) OVER (
                       PARTITION BY department ORDER BY semester_key(semester)
                       ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
                   ) AS running_total,
                   ROUND(AVG(enrollment_count) OVER (
                       PARTITION BY department ORDER BY semester_key(semester)
                       ROWS BETWEEN 1 PRECEDING AND 1 FOLLOWING
                   ), 2) AS moving_average
            FROM semester_counts
            ORDER BY department, semester_key(semester)",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(DepartmentTrend {
                    department: row.get(0)?,
                    semester: row.get(1)?,
                    enrollment_count: row.get(2)?,
                    running_total: row.get(3)?,
                    moving_average: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "department trends");
        Ok(rows)
    }

    /// Semester-over-semester movement per course, graded enrollments only
    pub fn semester_changes(&self) -> Result<Vec<SemesterChange>> {
        let mut stmt = self.conn().prepare(
            "WITH course_semesters AS (
                SELECT c.course_id, c.course_code, e.semester,
                       COUNT(*) AS enrollment_count,
                       ROUND(AVG(e.grade), 2) AS average_grade
                FROM enrollments e
                INNER JOIN courses c ON c.course_id = e.course_id
                WHERE e.grade IS NOT NULL
                GROUP BY c.course_id, c.course_code, e.semester
            )
            SELECT course_id, course_code, semester, enrollment_count, average_grade,
                   LAG(enrollment_count, 1) OVER by_semester AS previous_count,
                   LAG(average_grade, 1) OVER by_semester AS previous_average,
                   enrollment_count - LAG(enrollment_count, 1) OVER by_semester AS count_change,
                   ROUND(average_grade - LAG(average_grade, 1) OVER by_semester, 2) AS grade_change,
                   LEAD(enrollment_count, 1) OVER by_semester AS next_count
            FROM course_semesters
            WINDOW by_semester AS (PARTITION BY course_id ORDER BY semester_key(semester))
            ORDER BY course_id, semester_key(semester)",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SemesterChange {
                    course_id: row.get(0)?,
                    course_code: row.get(1)?,
                    semester: row.get(2)?,
                    enrollment_count: row.get(3)?,
                    average_grade: row.get(4)?,
                    previous_count: row.get(5)?,
                    previous_average: row.get(6)?,
                    count_change: row.get(7)?,
                    grade_change: row.get(8)?,
                    next_count: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "semester changes");
        Ok(rows)
    }

    /// GPA quartiles and cumulative distribution within each major, for
    /// students with a major and at least two graded courses
    pub fn performance_distribution(&self) -> Result<Vec<StudentStanding>> {
        let mut stmt = self.conn().prepare(
            "WITH student_gpa AS (
                SELECT s.student_id, s.name, s.major,
                       COUNT(e.grade) AS courses_completed,
                       ROUND(AVG(e.grade), 2) AS gpa
                FROM students s
                INNER JOIN enrollments e ON e.student_id = s.student_id
                WHERE s.major IS NOT NULL AND e.grade IS NOT NULL
                GROUP BY s.student_id, s.name, s.major
                HAVING COUNT(e.grade) >= 2
            )
            SELECT student_id, name, major, courses_completed, gpa,
                   NTILE(4) OVER (PARTITION BY major ORDER BY gpa DESC, student_id) AS quartile,
                   CUME_DIST() OVER (PARTITION BY major ORDER BY gpa) AS cume_dist
            FROM student_gpa
            ORDER BY major, gpa DESC, student_id",
        )?;

        let rows = stmt
            .query_map([], standing_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "performance distribution");
        Ok(rows)
    }

    /// Recompute every window column from its aggregate and report
    /// disagreements. All four reports read the same snapshot.
    pub fn verify_window_analytics(&self) -> Result<Vec<Mismatch>> {
        let (rankings, trends, changes, standings) = self.transaction(|db| {
            Ok((
                db.course_rankings()?,
                db.department_trends()?,
                db.semester_changes()?,
                db.performance_distribution()?,
            ))
        })?;

        let mut check = Checker::default();
        check_rankings(&mut check, &rankings);
        check_trends(&mut check, &trends);
        check_changes(&mut check, &changes);
        check_standings(&mut check, &standings);

        for m in &check.mismatches {
            warn!(
                report = m.report,
                row = %m.row,
                column = m.column,
                expected = %m.expected,
                actual = %m.actual,
                "window analytics mismatch"
            );
        }
        Ok(check.mismatches)
    }
}

fn standing_from_row(row: &Row) -> std::result::Result<StudentStanding, rusqlite::Error> {
    let quartile: i64 = row.get(5)?;
    let tier = PerformanceTier::from_quartile(quartile).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Quartile out of range: {quartile}"),
            )),
        )
    })?;

    Ok(StudentStanding {
        student_id: row.get(0)?,
        name: row.get(1)?,
        major: row.get(2)?,
        courses_completed: row.get(3)?,
        gpa: row.get(4)?,
        quartile,
        tier,
        cume_dist: row.get(6)?,
    })
}

// ==================== Cross-check ====================

#[derive(Default)]
struct Checker {
    mismatches: Vec<Mismatch>,
}

impl Checker {
    fn exact<T: PartialEq + Display>(
        &mut self,
        report: &'static str,
        row: &str,
        column: &'static str,
        expected: T,
        actual: T,
    ) {
        if expected != actual {
            self.push(report, row, column, expected.to_string(), actual.to_string());
        }
    }

    fn approx(
        &mut self,
        report: &'static str,
        row: &str,
        column: &'static str,
        expected: f64,
        actual: f64,
        tolerance: f64,
    ) {
        if (expected - actual).abs() > tolerance {
            self.push(report, row, column, expected.to_string(), actual.to_string());
        }
    }

    fn optional<T: PartialEq + Display>(
        &mut self,
        report: &'static str,
        row: &str,
        column: &'static str,
        expected: Option<T>,
        actual: Option<T>,
    ) {
        if expected != actual {
            self.push(report, row, column, show(&expected), show(&actual));
        }
    }

    fn push(
        &mut self,
        report: &'static str,
        row: &str,
        column: &'static str,
        expected: String,
        actual: String,
    ) {
        self.mismatches.push(Mismatch {
            report,
            row: row.to_string(),
            column,
            expected,
            actual,
        });
    }
}

fn show<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "NULL".to_string(), ToString::to_string)
}

fn check_rankings(check: &mut Checker, rows: &[CourseRanking]) {
    for part in window::partitions(rows, |r| r.department.clone()) {
        let counts: Vec<i64> = part.iter().map(|r| r.enrollment_count).collect();
        let row_numbers = window::row_number(part.len());
        let ranks = window::rank(&counts);
        let dense = window::dense_rank(&counts);
        let percent = window::percent_rank(&counts);

        for (i, r) in part.iter().enumerate() {
            let label = format!("{}/{}", r.department, r.course_code);
            check.exact("rankings", &label, "row_number", row_numbers[i], r.row_number);
            check.exact("rankings", &label, "rank", ranks[i], r.rank);
            check.exact("rankings", &label, "dense_rank", dense[i], r.dense_rank);
            check.approx(
                "rankings",
                &label,
                "percent_rank",
                percent[i],
                r.percent_rank,
                FLOAT_TOLERANCE,
            );
        }
    }
}

fn check_trends(check: &mut Checker, rows: &[DepartmentTrend]) {
    for part in window::partitions(rows, |r| r.department.clone()) {
        let counts: Vec<i64> = part.iter().map(|r| r.enrollment_count).collect();
        let as_float: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        let totals = window::running_total(&counts);
        let averages = window::centered_moving_average(&as_float, 1);

        for (i, r) in part.iter().enumerate() {
            let label = format!("{}/{}", r.department, r.semester);
            check.exact("trends", &label, "running_total", totals[i], r.running_total);
            check.approx(
                "trends",
                &label,
                "moving_average",
                averages[i],
                r.moving_average,
                ROUNDED_TOLERANCE,
            );
        }
    }
}

fn check_changes(check: &mut Checker, rows: &[SemesterChange]) {
    for part in window::partitions(rows, |r| r.course_id) {
        let counts: Vec<i64> = part.iter().map(|r| r.enrollment_count).collect();
        let averages: Vec<f64> = part.iter().map(|r| r.average_grade).collect();
        let prev_counts = window::lag(&counts, 1);
        let prev_averages = window::lag(&averages, 1);
        let next_counts = window::lead(&counts, 1);

        for (i, r) in part.iter().enumerate() {
            let label = format!("{}/{}", r.course_code, r.semester);
            check.optional("changes", &label, "previous_count", prev_counts[i], r.previous_count);
            check.optional(
                "changes",
                &label,
                "previous_average",
                prev_averages[i],
                r.previous_average,
            );
            check.optional(
                "changes",
                &label,
                "count_change",
                prev_counts[i].map(|p| counts[i] - p),
                r.count_change,
            );
            match (prev_averages[i], r.grade_change) {
                (Some(prev), Some(actual)) => check.approx(
                    "changes",
                    &label,
                    "grade_change",
                    averages[i] - prev,
                    actual,
                    ROUNDED_TOLERANCE,
                ),
                (expected, actual) => check.optional(
                    "changes",
                    &label,
                    "grade_change",
                    expected.map(|prev| averages[i] - prev),
                    actual,
                ),
            }
            check.optional("changes", &label, "next_count", next_counts[i], r.next_count);
        }
    }
}

fn check_standings(check: &mut Checker, rows: &[StudentStanding]) {
    for part in window::partitions(rows, |r| r.major.clone()) {
        let quartiles = window::ntile(part.len(), 4);

        // Rows arrive GPA-descending; cume_dist is defined on ascending GPA
        let ascending: Vec<f64> = part.iter().rev().map(|r| r.gpa).collect();
        let mut cume = window::cume_dist(&ascending);
        cume.reverse();

        for (i, r) in part.iter().enumerate() {
            let label = format!("{}/{}", r.major, r.student_id);
            check.exact("distribution", &label, "quartile", quartiles[i], r.quartile);
            check.approx(
                "distribution",
                &label,
                "cume_dist",
                cume[i],
                r.cume_dist,
                FLOAT_TOLERANCE,
            );
        }
    }
}
