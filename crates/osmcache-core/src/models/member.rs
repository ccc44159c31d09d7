use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A member of a section, as listed for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub family_name: String,
    pub first_name: String,
    pub patrol: String,
    pub role: String,
    pub is_active: bool,
    pub when_born: Option<NaiveDate>,
    pub when_joined: Option<NaiveDate>,
    pub when_started: Option<NaiveDate>,
    pub when_ended: Option<NaiveDate>,
    pub section_id: String,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.family_name)
    }

    /// "Family, First" for sorted listings.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let member = Member {
            id: "55".to_string(),
            family_name: "Baden-Powell".to_string(),
            first_name: "Robert".to_string(),
            patrol: "Kea".to_string(),
            role: "Patrol Leader".to_string(),
            is_active: true,
            when_born: None,
            when_joined: None,
            when_started: None,
            when_ended: None,
            section_id: "10".to_string(),
        };
        assert_eq!(member.full_name(), "Robert Baden-Powell");
        assert_eq!(member.display_name(), "Baden-Powell, Robert");
    }
}
