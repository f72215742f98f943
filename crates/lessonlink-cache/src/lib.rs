//! # lessonlink-cache
//!
//! Tiered offline response cache.
//!
//! - **Partitions**: named stores (static assets, dynamic API responses,
//!   lesson content) with independent entry limits, optional byte quotas and
//!   FIFO eviction by first insertion
//! - **Router**: ordered prefix/suffix rules mapping a request path to a
//!   partition and a [`FetchStrategy`]
//! - **Strategies**: [`fetch_through`] implements cache-first, network-first
//!   and network-only on top of a caller-supplied fetch

#![deny(unsafe_code)]

pub mod entry;
pub mod error;
pub mod partition;
pub mod router;
pub mod strategy;
pub mod tiered;

pub use entry::{CacheEntry, CachedResponse};
pub use error::{CacheError, Result};
pub use lessonlink_settings::FetchStrategy;
pub use partition::Partition;
pub use router::{RouteMatch, Router};
pub use strategy::{Fetched, Source, fetch_through};
pub use tiered::{OfflineCache, PartitionStats};
