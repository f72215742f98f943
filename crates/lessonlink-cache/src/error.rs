//! Cache error types.

use thiserror::Error;

/// Errors from cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No partition with this name is configured.
    #[error("unknown cache partition: {0}")]
    UnknownPartition(String),
    /// A single entry is larger than the partition's byte quota.
    #[error("entry of {size} bytes exceeds the {quota} byte quota of partition {partition}")]
    QuotaExceeded {
        /// Partition name.
        partition: String,
        /// Size of the rejected entry.
        size: u64,
        /// Configured quota.
        quota: u64,
    },
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
