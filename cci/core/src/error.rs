use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Error aborting an inventory run as a whole
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Renewal directory does not exist or is not a directory
    #[error("renewal directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    /// Renewal directory exists but could not be listed
    #[error("failed to read renewal directory {}: {source}", .dir.display())]
    ReadDirectory {
        /// Directory being listed
        dir: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// One renewal record could not be read or parsed
    #[error("failed to parse {filename}: {source}")]
    Record {
        /// File name of the renewal record, relative to the renewal directory
        filename: String,
        /// Reason
        source: RecordError,
    },
}

/// Reason a renewal record could not be loaded
#[derive(Debug, Error)]
pub enum RecordError {
    /// File could not be read
    #[error(transparent)]
    Io(#[from] io::Error),
    /// File is not valid INI
    #[error(transparent)]
    Ini(#[from] ini::ParseError),
    /// Section header appears more than once
    #[error("section {0:?} already exists")]
    DuplicateSection(String),
    /// Key appears more than once in a section
    #[error("option {key:?} in section {section:?} already exists")]
    DuplicateKey {
        /// Section holding the key
        section: String,
        /// Repeated key as written
        key: String,
    },
}

/// Error from an [`crate::ExpiryInspector`]
///
/// Never aborts an inventory run, the record falls back to [`crate::Expiry::Unknown`].
#[derive(Debug, Error)]
pub enum InspectError {
    /// Inspection program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program being run
        program: String,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Inspection program did not finish in time
    #[error("inspection timed out after {0:?}")]
    Timeout(Duration),
    /// Inspection program exited unsuccessfully
    #[error("inspection exited with {status}: {stderr}")]
    Exit {
        /// Exit status
        status: ExitStatus,
        /// Captured standard error, trimmed
        stderr: String,
    },
    /// Output does not start with `notAfter=`
    #[error("unexpected inspection output: {0:?}")]
    UnexpectedOutput(String),
    /// Date after `notAfter=` could not be parsed
    #[error("invalid expiration date {date:?}: {reason}")]
    InvalidDate {
        /// Date text as printed by the inspection program
        date: String,
        /// Reason
        reason: String,
    },
}
