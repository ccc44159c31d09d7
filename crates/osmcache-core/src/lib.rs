//! osmcache-core - a caching client for the Online Scout Manager (OSM) API.
//!
//! Authorise once through [`Manager`], then read groups, terms, members,
//! badges and badge progress through its facades. Responses are cached in
//! memory per scope (user, or section and term) for a configurable duration.

pub mod api;
pub mod auth;
pub mod cache;
pub mod managers;
pub mod models;
pub mod utils;

pub use api::{ApiError, Connection, ConnectionConfig, QueryParams};
pub use auth::{Session, SessionData, SessionHandle};
pub use cache::{CacheSettings, CachedData, CachedDataSet};
pub use managers::{BadgeManager, GroupManager, Manager, MemberManager, TermManager};
pub use models::{
    Badge, BadgeProgress, BadgeProgressReport, BadgeTask, BadgeType, Group, GroupRef, Member,
    Section, Term, TermArray,
};
