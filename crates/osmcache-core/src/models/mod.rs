//! Data models for OSM entities.
//!
//! This module contains the domain values rebuilt on every retrieval:
//!
//! - `Group`, `Section`, `GroupRef`: organization structure
//! - `Term`, `TermArray`: a section's terms with current-term resolution
//! - `Member`: section membership for a term
//! - `Badge`, `BadgeTask`, `BadgeType`: badge definitions
//! - `BadgeProgress`, `BadgeProgressReport`: per-member badge progress
//!
//! Back-references (section → group, task → badge, term → section) are held
//! by id, never by ownership.

pub mod badge;
pub mod member;
pub mod organization;
pub mod progress;
pub mod term;

pub use badge::{Badge, BadgeTask, BadgeType};
pub use member::Member;
pub use organization::{Group, GroupRef, Section};
pub use progress::{BadgeProgress, BadgeProgressReport};
pub use term::{resolve_current, Term, TermArray};
