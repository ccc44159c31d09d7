//! Domain facades over the OSM endpoints.
//!
//! `Manager` is the entry point. It authorises the user and lazily creates
//! one facade per domain (`GroupManager`, `TermManager`, `MemberManager`,
//! `BadgeManager`), each reading through its own scoped caches.

pub mod badge;
pub mod group;
pub mod manager;
pub mod member;
pub mod term;

pub use badge::BadgeManager;
pub use group::GroupManager;
pub use manager::Manager;
pub use member::MemberManager;
pub use term::TermManager;
