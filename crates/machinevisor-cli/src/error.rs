//! Error types for the host binary.

use machinevisor::VisorError;

/// All errors that can occur while wiring devices to the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Visor(#[from] VisorError),

    #[error("Sensor file {path}, line {line}: {message}")]
    SensorRecord {
        path: String,
        line: usize,
        message: String,
    },

    #[error("No JPEG images in {0}")]
    NoImages(String),
}

pub type HostResult<T> = Result<T, HostError>;
