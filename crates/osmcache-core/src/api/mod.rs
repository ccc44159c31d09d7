//! Transport module for the OSM web services.
//!
//! This module provides the `Connection` for sending authenticated,
//! form-encoded POST requests and `QueryParams` for building the
//! deterministic parameter encodings used in bodies, query strings and
//! cache scopes.

pub mod client;
pub mod error;
pub mod query;

pub use client::{Connection, ConnectionConfig};
pub use error::ApiError;
pub use query::QueryParams;
