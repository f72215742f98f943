//! # lessonlink-core
//!
//! Foundation types shared by every LessonLink crate:
//!
//! - **Branded IDs**: `SubjectId`, `ConnectionId` as newtypes for type safety
//! - **Constants**: package name/version and well-known partition names
//! - **Logging**: `tracing` subscriber setup and in-memory capture for tests

#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod logging;

pub use ids::{ConnectionId, SubjectId};
