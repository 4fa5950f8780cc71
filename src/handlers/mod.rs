//! HTTP endpoint handlers.
//!
//! - `/`: HTML landing page with the live process table
//! - `/health`: refresh loop health (text)
//! - `/system`: system summary (JSON)
//! - `/processes`, `/processes.txt`: sorted process table (JSON / text)
//! - `/sort`: change the sort column and order
//! - `/processes/{pid}/kill`: request termination of a process

pub mod health;
pub mod processes;
pub mod root;
pub mod system;

// Re-export handlers
pub use health::health_handler;
pub use processes::{kill_handler, processes_handler, processes_text_handler, sort_handler};
pub use root::root_handler;
pub use system::system_handler;
