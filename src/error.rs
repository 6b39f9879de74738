//! Error types for upmerge

/// All errors produced by the merge orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Branch enumeration or repository introspection failed.
    ///
    /// Always fatal: raised before any mutation, never retried.
    #[error("failed to inspect repository: {0}")]
    Inventory(String),

    /// A git command exited non-zero (and the failure was not a
    /// recoverable merge conflict).
    #[error("git {command} failed: {message}")]
    Tool {
        /// The git subcommand that failed (e.g. "push")
        command: String,
        /// Diagnostic text captured from the tool
        message: String,
    },

    /// The conflict monitor gave up after the configured wait ceiling.
    #[error("timed out after {waited_secs}s waiting for conflict resolution")]
    ConflictTimeout {
        /// How long the monitor waited before giving up
        waited_secs: u64,
    },

    /// The merge was aborted (or never observed in progress) while the
    /// monitor was waiting.
    #[error("merge not completed: {0}")]
    MergeAborted(String),

    /// An interactive prompt could not be read.
    #[error("prompt error: {0}")]
    Prompt(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error deliberately leaves merge state on disk for the
    /// user to finish by hand (conflict wait ended without a resolution).
    #[must_use]
    pub const fn preserves_merge_state(&self) -> bool {
        matches!(self, Self::ConflictTimeout { .. } | Self::MergeAborted(_))
    }
}
