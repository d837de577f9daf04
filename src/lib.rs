pub mod analytics;
pub mod config;
pub mod lookup;
pub mod models;
pub mod publish;
pub mod runner;
pub mod source;

pub use runner::{Analyzer, RunError, RunReport};
