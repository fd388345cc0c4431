/*!
 * Error types for the shadowreel pipeline.
 *
 * `ToolError` describes what went wrong inside an external collaborator
 * (ffmpeg, ffprobe, a speech engine). `GenerationError` is the closed
 * taxonomy a pipeline run can fail with; every failure surfaced to callers
 * carries one of its `ErrorKind`s.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by external tool adapters
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool binary could not be started
    #[error("Failed to launch {tool}: {message}")]
    Spawn {
        /// Tool name (e.g. "ffmpeg")
        tool: String,
        /// Launch failure description
        message: String,
    },

    /// The tool ran but exited unsuccessfully
    #[error("{tool} exited with {status}: {diagnostic}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit status as reported by the OS
        status: String,
        /// Filtered stderr output
        diagnostic: String,
    },

    /// The tool did not finish within the configured limit
    #[error("{tool} timed out after {seconds}s")]
    Timeout {
        /// Tool name
        tool: String,
        /// Configured limit in seconds
        seconds: u64,
    },

    /// The tool produced output that could not be interpreted
    #[error("Failed to parse {tool} output: {message}")]
    ParseError {
        /// Tool name
        tool: String,
        /// Parse failure description
        message: String,
    },

    /// A speech API request failed before a response arrived
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// A speech API answered with an error status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error body returned by the API
        message: String,
    },

    /// Reading or writing an intermediate file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Build a `Failed` error from a finished process's stderr
    pub fn failed(tool: &str, status: impl fmt::Display, diagnostic: impl Into<String>) -> Self {
        Self::Failed {
            tool: tool.to_string(),
            status: status.to_string(),
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(error: reqwest::Error) -> Self {
        Self::RequestFailed(error.to_string())
    }
}

/// Category of a failed generation, mirrored into task status records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Invalid repeat count, unknown mode or other illegal setting
    ConfigurationError,
    /// Input clip or caption file absent
    MissingResourceError,
    /// Collaborator call exited non-zero or could not run
    ExternalToolError,
    /// Collaborator reported success but left no usable output
    EmptyOutputError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::MissingResourceError => "MissingResourceError",
            ErrorKind::ExternalToolError => "ExternalToolError",
            ErrorKind::EmptyOutputError => "EmptyOutputError",
        };
        write!(f, "{}", name)
    }
}

/// Errors that abort a practice video generation
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Illegal configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required input does not exist
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// A collaborator call failed
    #[error("External tool error: {0}")]
    ExternalTool(#[from] ToolError),

    /// A collaborator claimed success without producing a file
    #[error("Empty output: {0}")]
    EmptyOutput(String),
}

impl GenerationError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Configuration(_) => ErrorKind::ConfigurationError,
            GenerationError::MissingResource(_) => ErrorKind::MissingResourceError,
            GenerationError::ExternalTool(_) => ErrorKind::ExternalToolError,
            GenerationError::EmptyOutput(_) => ErrorKind::EmptyOutputError,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        GenerationError::Configuration(message.into())
    }
}

impl From<std::io::Error> for GenerationError {
    fn from(error: std::io::Error) -> Self {
        GenerationError::ExternalTool(ToolError::Io(error))
    }
}
