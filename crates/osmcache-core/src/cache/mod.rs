//! In-memory, time-bounded response caching.
//!
//! This module provides:
//! - `CachedData`: one cached value with an expiry, re-fetched on demand
//! - `CachedDataSet`: cells keyed by scope (section + term, or user),
//!   created lazily so unrelated queries never share staleness
//! - `CacheSettings`: the cache duration, one minute by default
//!
//! Nothing is persisted; cached state lives as long as its manager.

pub mod cell;
pub mod registry;

pub use cell::{CacheSettings, CachedData};
pub use registry::{section_term_key, user_key, CachedDataSet, SharedCell};
