use crate::cli::{ConfigCommand, CourseCommand, ReportKind, StudentCommand};
use crate::config::{Config, OutputFormat};
use crate::core::{Registrar, ReportBundle};
use crate::db::SCHEMA_SQL;
use crate::error::EnrollError;
use crate::models::parse_date;
use crate::output::{self, print_json, print_table};
use crate::seed;
use serde_json::json;

/// Handle the init command
pub fn handle_init(config: &Config) -> Result<(), EnrollError> {
    let registrar = Registrar::open_at(&config.db_path)?;
    registrar.init()?;

    println!("Initialized enrollment database");
    println!("  - Created: {}", config.db_path.display());

    Ok(())
}

/// Handle the seed command
pub fn handle_seed(config: &Config, print: bool) -> Result<(), EnrollError> {
    if print {
        print!("{}", seed::seed_sql());
        return Ok(());
    }

    let registrar = open(config)?;
    let summary = registrar.seed()?;

    println!(
        "Loaded {} students, {} courses, {} enrollments",
        summary.students, summary.courses, summary.enrollments
    );

    Ok(())
}

/// Handle the schema command
pub fn handle_schema() -> Result<(), EnrollError> {
    print!("{SCHEMA_SQL}");
    Ok(())
}

/// Handle the student subcommands
pub fn handle_student(config: &Config, action: StudentCommand) -> Result<(), EnrollError> {
    let registrar = open(config)?;

    match action {
        StudentCommand::Add {
            id,
            name,
            major,
            date,
        } => {
            let student = registrar.add_student(id, &name, major.as_deref(), parse_date(&date)?)?;
            match config.output {
                OutputFormat::Json => print_json(&student)?,
                OutputFormat::Table => {
                    println!("Added student #{}: {}", student.student_id, student.name)
                }
            }
        }
        StudentCommand::List => {
            let students = registrar.students()?;
            match config.output {
                OutputFormat::Json => print_json(&students)?,
                OutputFormat::Table => {
                    print_table(&output::students_table(&students), "No students found.")
                }
            }
        }
        StudentCommand::Delete { id } => {
            let removed = registrar.remove_student(id)?;
            match config.output {
                OutputFormat::Json => {
                    print_json(&json!({ "student_id": id, "enrollments_removed": removed }))?
                }
                OutputFormat::Table => {
                    println!("Deleted student #{id} and {removed} enrollment(s)")
                }
            }
        }
    }

    Ok(())
}

/// Handle the course subcommands
pub fn handle_course(config: &Config, action: CourseCommand) -> Result<(), EnrollError> {
    let registrar = open(config)?;

    match action {
        CourseCommand::Add {
            id,
            code,
            name,
            department,
            credits,
        } => {
            let course = registrar.add_course(id, &code, &name, &department, credits)?;
            match config.output {
                OutputFormat::Json => print_json(&course)?,
                OutputFormat::Table => println!(
                    "Added course #{}: {} {}",
                    course.course_id, course.course_code, course.course_name
                ),
            }
        }
        CourseCommand::List => {
            let courses = registrar.courses()?;
            match config.output {
                OutputFormat::Json => print_json(&courses)?,
                OutputFormat::Table => {
                    print_table(&output::courses_table(&courses), "No courses found.")
                }
            }
        }
        CourseCommand::Delete { id } => {
            let removed = registrar.remove_course(id)?;
            match config.output {
                OutputFormat::Json => {
                    print_json(&json!({ "course_id": id, "enrollments_removed": removed }))?
                }
                OutputFormat::Table => {
                    println!("Deleted course #{id} and {removed} enrollment(s)")
                }
            }
        }
    }

    Ok(())
}

/// Handle the register command
pub fn handle_register(
    config: &Config,
    id: i64,
    student_id: i64,
    course_id: i64,
    semester: &str,
    date: &str,
    grade: Option<f64>,
) -> Result<(), EnrollError> {
    let registrar = open(config)?;
    let enrollment =
        registrar.enroll(id, student_id, course_id, semester, grade, parse_date(date)?)?;

    match config.output {
        OutputFormat::Json => print_json(&enrollment)?,
        OutputFormat::Table => println!("Enrolled {}", output::enrollment_line(&enrollment)),
    }

    Ok(())
}

/// Handle the grade command
pub fn handle_grade(
    config: &Config,
    id: i64,
    grade: Option<f64>,
    clear: bool,
) -> Result<(), EnrollError> {
    let registrar = open(config)?;
    let grade = if clear { None } else { grade };
    let enrollment = registrar.record_grade(id, grade)?;

    match config.output {
        OutputFormat::Json => print_json(&enrollment)?,
        OutputFormat::Table => println!("Updated {}", output::enrollment_line(&enrollment)),
    }

    Ok(())
}

/// Handle the report subcommands
pub fn handle_report(config: &Config, kind: ReportKind) -> Result<(), EnrollError> {
    let registrar = open(config)?;
    let json = config.output == OutputFormat::Json;

    match kind {
        ReportKind::Roster { semester } => {
            let (semester, rows) = registrar.roster(semester.as_deref())?;
            if json {
                print_json(&json!({ "semester": semester, "rows": rows }))?;
            } else {
                println!("Roster for {semester}");
                print_table(&output::roster_table(&rows), "No enrollments found.");
            }
        }
        ReportKind::Unenrolled => {
            let rows = registrar.unenrolled_students()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::students_table(&rows), "Every student is enrolled.");
            }
        }
        ReportKind::Untaken => {
            let rows = registrar.untaken_courses()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::courses_table(&rows), "Every course has enrollments.");
            }
        }
        ReportKind::Audit => {
            let rows = registrar.audit()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::audit_table(&rows), "No unmatched records.");
            }
        }
        ReportKind::Peers => {
            let rows = registrar.peers()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::peers_table(&rows), "No study peers found.");
            }
        }
        ReportKind::Rankings => {
            let rows = registrar.rankings()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::rankings_table(&rows), "No courses found.");
            }
        }
        ReportKind::Trends => {
            let rows = registrar.trends()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::trends_table(&rows), "No enrollments found.");
            }
        }
        ReportKind::Changes => {
            let rows = registrar.changes()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(&output::changes_table(&rows), "No graded enrollments found.");
            }
        }
        ReportKind::Distribution => {
            let rows = registrar.distribution()?;
            if json {
                print_json(&rows)?;
            } else {
                print_table(
                    &output::distribution_table(&rows),
                    "No students with two or more graded courses.",
                );
            }
        }
        ReportKind::All { semester } => {
            let bundle = registrar.all_reports(semester.as_deref())?;
            if json {
                print_json(&bundle)?;
            } else {
                print_bundle(&bundle);
            }
        }
    }

    Ok(())
}

fn print_bundle(bundle: &ReportBundle) {
    match &bundle.semester {
        Some(semester) => {
            println!("== Roster ({semester}) ==");
            print_table(&output::roster_table(&bundle.roster), "No enrollments found.");
        }
        None => println!("== Roster == (skipped: no semester given or stored)"),
    }

    let sections = [
        ("Unenrolled students", output::students_table(&bundle.unenrolled)),
        ("Courses not taken", output::courses_table(&bundle.untaken)),
        ("Audit", output::audit_table(&bundle.audit)),
        ("Study peers", output::peers_table(&bundle.peers)),
        ("Course rankings", output::rankings_table(&bundle.rankings)),
        ("Department trends", output::trends_table(&bundle.trends)),
        ("Semester changes", output::changes_table(&bundle.changes)),
        ("Performance distribution", output::distribution_table(&bundle.distribution)),
    ];
    for (title, table) in sections {
        println!();
        println!("== {title} ==");
        print_table(&table, "(none)");
    }
}

/// Handle the config subcommands
pub fn handle_config(config: &Config, action: ConfigCommand) -> Result<(), EnrollError> {
    let registrar = open(config)?;
    let json = config.output == OutputFormat::Json;

    match action {
        ConfigCommand::Get { key } => {
            let value = registrar.get_setting(&key)?;
            if json {
                print_json(&json!({ "key": key, "value": value }))?;
            } else {
                match value {
                    Some(value) => println!("{key} = {value}"),
                    None => println!("{key} is not set"),
                }
            }
        }
        ConfigCommand::Set { key, value } => {
            registrar.set_setting(&key, &value)?;
            if json {
                print_json(&json!({ "key": key, "value": value }))?;
            } else {
                println!("Set {key} = {value}");
            }
        }
        ConfigCommand::Unset { key } => {
            let removed = registrar.unset_setting(&key)?;
            if json {
                print_json(&json!({ "key": key, "removed": removed }))?;
            } else if removed {
                println!("Removed {key}");
            } else {
                println!("{key} was not set");
            }
        }
    }

    Ok(())
}

/// Handle the verify command
pub fn handle_verify(config: &Config) -> Result<(), EnrollError> {
    let registrar = open(config)?;
    let mismatches = registrar.verify()?;

    if config.output == OutputFormat::Json {
        print_json(&mismatches)?;
    } else if mismatches.is_empty() {
        println!("Window analytics verified: no mismatches");
    } else {
        print_table(&output::mismatches_table(&mismatches), "");
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(EnrollError::VerificationFailed(mismatches.len()))
    }
}

// Helper function
fn open(config: &Config) -> Result<Registrar, EnrollError> {
    if !config.db_path.exists() {
        return Err(EnrollError::NotInitialized);
    }
    let registrar = Registrar::open_at(&config.db_path)?;
    if !registrar.is_initialized()? {
        return Err(EnrollError::NotInitialized);
    }
    Ok(registrar)
}
