use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "enroll")]
#[command(about = "University enrollment schema and reporting")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Database file (defaults to $ENROLL_DB, then ./enroll.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the schema in a new database
    Init,

    /// Load the sample students, courses and enrollments
    Seed {
        /// Print the seed INSERT statements instead of loading them
        #[arg(long)]
        print: bool,
    },

    /// Print the schema DDL
    Schema,

    /// Manage students
    Student {
        #[command(subcommand)]
        action: StudentCommand,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommand,
    },

    /// Enroll a student in a course for a semester
    Register {
        /// Enrollment ID
        id: i64,
        /// Student ID
        student_id: i64,
        /// Course ID
        course_id: i64,
        /// Semester label, e.g. 2024-Fall
        semester: String,
        /// Enrollment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Final grade on the 0.0-4.0 scale (omit while in progress)
        #[arg(long)]
        grade: Option<f64>,
    },

    /// Record or clear the grade of an enrollment
    Grade {
        /// Enrollment ID
        id: i64,
        /// Grade on the 0.0-4.0 scale
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        grade: Option<f64>,
        /// Clear the grade (mark in progress)
        #[arg(long)]
        clear: bool,
    },

    /// Run a report
    Report {
        #[command(subcommand)]
        kind: ReportKind,
    },

    /// Get or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Cross-check the window analytics against an in-process recomputation
    Verify,
}

#[derive(Subcommand)]
pub enum StudentCommand {
    /// Admit a student
    Add {
        /// Student ID
        id: i64,
        /// Full name
        name: String,
        /// Declared major
        #[arg(long)]
        major: Option<String>,
        /// Admission date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// List students
    List,
    /// Delete a student and their enrollments
    Delete {
        /// Student ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CourseCommand {
    /// Add a course to the catalog
    Add {
        /// Course ID
        id: i64,
        /// Unique course code, e.g. CS101
        code: String,
        /// Course name
        name: String,
        /// Owning department
        #[arg(long)]
        department: String,
        /// Credit hours (must be positive)
        #[arg(long)]
        credits: i64,
    },
    /// List courses
    List,
    /// Delete a course and its enrollments
    Delete {
        /// Course ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReportKind {
    /// Enrollments of one semester with student and course, best grade first
    Roster {
        /// Semester label (defaults to the stored default_semester)
        #[arg(long)]
        semester: Option<String>,
    },
    /// Students with no enrollments
    Unenrolled,
    /// Courses with no enrollments
    Untaken,
    /// Students, enrollments and courses lacking a counterpart
    Audit,
    /// Pairs of students sharing a major and admission date
    Peers,
    /// Course popularity ranks within each department
    Rankings,
    /// Department volume per semester with running total and moving average
    Trends,
    /// Semester-over-semester changes per course
    Changes,
    /// GPA quartiles and cumulative distribution within each major
    Distribution,
    /// Every report from one snapshot
    All {
        /// Semester for the roster section
        #[arg(long)]
        semester: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show a setting
    Get {
        /// Setting name
        key: String,
    },
    /// Store a setting
    Set {
        /// Setting name
        key: String,
        /// Value
        value: String,
    },
    /// Remove a setting
    Unset {
        /// Setting name
        key: String,
    },
}
