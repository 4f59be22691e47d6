use std::path::PathBuf;

/// Error type for repository discovery and normalization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `deb` line that could not be parsed (too few tokens, or an
    /// attribute without `=`).
    #[error("invalid repository declaration: {0}")]
    InvalidDeclaration(String),

    /// A malformed `deb` line, located in its declaration source.
    #[error("malformed repository declaration in {source_id}: {line} ({reason})")]
    MalformedDeclaration {
        /// Identifier of the declaration source (usually a file path).
        source_id: String,
        /// The raw line text.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two records with different URLs were merged.
    #[error("cannot merge repository {found} into {expected}")]
    MergeConflict {
        /// URL of the accumulator record.
        expected: String,
        /// URL of the record being folded in.
        found: String,
    },

    /// A declaration source could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration document.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for apt-repofind operations.
pub type Result<T> = std::result::Result<T, Error>;
