//! CLI command implementations for herakles-top.
//!
//! - `top`: foreground refresh loop rendering to stdout
//! - `snapshot`: one two-sample reading
//! - `kill`: one-shot termination request
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate-testdata`: Test data generation

pub mod check;
pub mod config;
pub mod generate_testdata;
pub mod kill;
pub mod snapshot;
pub mod top;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate_testdata::command_generate_testdata;
pub use kill::command_kill;
pub use snapshot::command_snapshot;
pub use top::command_top;
