//! MachineVisor host — runs the capture pipeline with console and
//! file-backed devices.

pub mod config;
pub mod devices;
pub mod error;
pub mod input;
pub mod run;

pub use config::resolve_prefs_path;
pub use error::{HostError, HostResult};
pub use run::{run_pipeline, RunOptions};
