//! Tracklist CLI Library
//!
//! Runs command scripts against the playback core with a virtual engine,
//! printing every emitted event.
//!
//! This library exposes the harness components for testing purposes.

pub mod config;
pub mod error;
pub mod runner;
pub mod script;

// Re-export commonly used types for convenience
pub use config::CliConfig;
pub use error::{CliError, Result};
pub use runner::{OutputFormat, ScriptRunner, Status};
pub use script::{parse_script, Command, End};
