//! Parsing helpers shared by the managers.

pub mod dates;
pub mod de;

pub use dates::{parse_date, parse_date_time, today};
