//! Authorisation state for OSM requests.
//!
//! This module provides:
//! - `Session`: application identity (api id, token) plus the optional user
//!   identity (`SessionData`) obtained from the authorise endpoint
//! - `SessionHandle`: the single swappable point through which every facade
//!   sees the current connection
//!
//! Sessions are immutable values; re-authorising builds a new one.

pub mod handle;
pub mod session;

pub use handle::SessionHandle;
pub use session::{Session, SessionData};
