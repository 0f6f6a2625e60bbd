use crate::error::EnrollError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Academic term within a year, in chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Spring,
    Summer,
    Fall,
}

impl Term {
    pub fn as_str(&self) -> &'static str {
        match self {
            Term::Spring => "Spring",
            Term::Summer => "Summer",
            Term::Fall => "Fall",
        }
    }

    fn ordinal(&self) -> i64 {
        match self {
            Term::Spring => 1,
            Term::Summer => 2,
            Term::Fall => 3,
        }
    }
}

/// A semester label such as `2024-Fall`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Semester {
    pub year: i32,
    pub term: Term,
}

impl Semester {
    pub fn new(year: i32, term: Term) -> Self {
        Semester { year, term }
    }

    /// Sortable key: `year * 10 + term`, Spring=1, Summer=2, Fall=3
    pub fn sort_key(&self) -> i64 {
        i64::from(self.year) * 10 + self.term.ordinal()
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.term.as_str())
    }
}

impl FromStr for Semester {
    type Err = EnrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EnrollError::InvalidSemester(s.to_string());
        let (year, term) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        if year < 1000 {
            return Err(invalid());
        }
        let term = match term {
            "Spring" => Term::Spring,
            "Summer" => Term::Summer,
            "Fall" => Term::Fall,
            _ => return Err(invalid()),
        };
        Ok(Semester { year, term })
    }
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(s: &str) -> Result<NaiveDate, EnrollError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| EnrollError::InvalidDate(s.to_string()))
}

/// A student admitted to the university
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub name: String,
    pub major: Option<String>,
    pub enrollment_date: NaiveDate,
}

/// A course in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub department: String,
    pub credits: i64,
}

/// A student's registration in a course for one semester.
/// `grade` is `None` while the course is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub semester: String,
    pub grade: Option<f64>,
    pub enrollment_date: NaiveDate,
}

// ==================== Join Reports ====================

/// Row of the per-semester roster (inner join of all three tables)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRow {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub major: Option<String>,
    pub course_code: String,
    pub course_name: String,
    pub credits: i64,
    pub grade: Option<f64>,
}

/// Status tag of an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "Enrolled")]
    Enrolled,
    #[serde(rename = "Student Not Enrolled")]
    StudentNotEnrolled,
    #[serde(rename = "Course Not Taken")]
    CourseNotTaken,
    #[serde(rename = "No Match")]
    NoMatch,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Enrolled => "Enrolled",
            AuditStatus::StudentNotEnrolled => "Student Not Enrolled",
            AuditStatus::CourseNotTaken => "Course Not Taken",
            AuditStatus::NoMatch => "No Match",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for AuditStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "Enrolled" => Ok(AuditStatus::Enrolled),
            "Student Not Enrolled" => Ok(AuditStatus::StudentNotEnrolled),
            "Course Not Taken" => Ok(AuditStatus::CourseNotTaken),
            "No Match" => Ok(AuditStatus::NoMatch),
            _ => Err(format!("Invalid audit status: {s}")),
        }
    }
}

/// Row of the full outer join audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub course_id: Option<i64>,
    pub course_code: Option<String>,
    pub status: AuditStatus,
}

/// Two students sharing a major and an admission date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerPair {
    pub student1_id: i64,
    pub student1_name: String,
    pub student2_id: i64,
    pub student2_name: String,
    pub major: String,
    pub enrollment_date: NaiveDate,
}

// ==================== Window Analytics ====================

/// Course popularity ranking within its department
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRanking {
    pub department: String,
    pub course_id: i64,
    pub course_code: String,
    pub enrollment_count: i64,
    pub row_number: i64,
    pub rank: i64,
    pub dense_rank: i64,
    pub percent_rank: f64,
}

/// Per-semester department volume with running and moving aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentTrend {
    pub department: String,
    pub semester: String,
    pub enrollment_count: i64,
    pub running_total: i64,
    pub moving_average: f64,
}

/// Semester-over-semester change for one course (graded enrollments only)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterChange {
    pub course_id: i64,
    pub course_code: String,
    pub semester: String,
    pub enrollment_count: i64,
    pub average_grade: f64,
    pub previous_count: Option<i64>,
    pub previous_average: Option<f64>,
    pub count_change: Option<i64>,
    pub grade_change: Option<f64>,
    pub next_count: Option<i64>,
}

/// Quartile label of a student's GPA within their major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    #[serde(rename = "Top Performer")]
    TopPerformer,
    #[serde(rename = "Above Average")]
    AboveAverage,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceTier {
    /// Map an `NTILE(4)` bucket to its label
    pub fn from_quartile(quartile: i64) -> Option<Self> {
        match quartile {
            1 => Some(PerformanceTier::TopPerformer),
            2 => Some(PerformanceTier::AboveAverage),
            3 => Some(PerformanceTier::Average),
            4 => Some(PerformanceTier::NeedsImprovement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::TopPerformer => "Top Performer",
            PerformanceTier::AboveAverage => "Above Average",
            PerformanceTier::Average => "Average",
            PerformanceTier::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student's GPA position within their major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStanding {
    pub student_id: i64,
    pub name: String,
    pub major: String,
    pub courses_completed: i64,
    pub gpa: f64,
    pub quartile: i64,
    pub tier: PerformanceTier,
    pub cume_dist: f64,
}

/// One disagreement found by the window cross-check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub report: &'static str,
    pub row: String,
    pub column: &'static str,
    pub expected: String,
    pub actual: String,
}
