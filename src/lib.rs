pub mod analytics;
pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod joins;
pub mod models;
pub mod output;
pub mod seed;
pub mod window;

pub use error::{EnrollError, Result};
pub use models::*;
