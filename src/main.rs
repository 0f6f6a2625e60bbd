use clap::Parser;
use enroll::cli::{Cli, Commands};
use enroll::cli_handlers;
use enroll::config::Config;
use std::process;

fn main() {
    // Logs go to stderr so report output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.json);

    let result = match cli.command {
        Commands::Init => cli_handlers::handle_init(&config),
        Commands::Seed { print } => cli_handlers::handle_seed(&config, print),
        Commands::Schema => cli_handlers::handle_schema(),
        Commands::Student { action } => cli_handlers::handle_student(&config, action),
        Commands::Course { action } => cli_handlers::handle_course(&config, action),
        Commands::Register {
            id,
            student_id,
            course_id,
            semester,
            date,
            grade,
        } => cli_handlers::handle_register(
            &config, id, student_id, course_id, &semester, &date, grade,
        ),
        Commands::Grade { id, grade, clear } => {
            cli_handlers::handle_grade(&config, id, grade, clear)
        }
        Commands::Report { kind } => cli_handlers::handle_report(&config, kind),
        Commands::Config { action } => cli_handlers::handle_config(&config, action),
        Commands::Verify => cli_handlers::handle_verify(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
