use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures a split run can end with.
///
/// Finding no blocks is not an error; `split` reports it through an empty `RunReport`.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("DbContext file '{}' does not exist or is not a file", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Cannot embed configuration for '{type_name}': '{}' does not exist", .path.display())]
    MissingEmbedTarget { type_name: String, path: PathBuf },

    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl SplitError {
    /// Process exit code for this failure. 2 is left to clap for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            SplitError::SourceNotFound(_) => 3,
            SplitError::MissingEmbedTarget { .. } => 4,
            SplitError::Write { .. } => 5,
            SplitError::Read { .. } | SplitError::Config { .. } => 1,
        }
    }
}
