//! Package-level constants.

/// Current version (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "lessonlink";

/// Partition holding the application shell (scripts, styles, icons).
pub const STATIC_PARTITION: &str = "static";

/// Partition holding API responses.
pub const DYNAMIC_PARTITION: &str = "dynamic";

/// Partition holding downloaded lesson content.
pub const LESSON_PARTITION: &str = "lesson";
