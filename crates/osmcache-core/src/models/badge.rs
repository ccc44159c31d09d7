use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The badge families OSM lists separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeType {
    /// Earned as part of the section's award scheme.
    AwardScheme,
    /// Earned through a member's personal achievements.
    PersonalAchievement,
}

impl BadgeType {
    pub const ALL: [BadgeType; 2] = [BadgeType::AwardScheme, BadgeType::PersonalAchievement];

    /// OSM's `type_id`.
    pub fn id(self) -> u32 {
        match self {
            BadgeType::AwardScheme => 1,
            BadgeType::PersonalAchievement => 2,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadgeType::AwardScheme => write!(f, "Award Scheme"),
            BadgeType::PersonalAchievement => write!(f, "Personal Achievement"),
        }
    }
}

/// One requirement of a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeTask {
    pub id: String,
    pub name: String,
    pub description: String,
    pub module: Option<String>,
    /// Full id of the owning badge; `None` until bound by [`Badge::new`].
    pub badge_id: Option<String>,
}

impl BadgeTask {
    /// An unbound task; the owning badge does not exist yet.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        module: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            module,
            badge_id: None,
        }
    }

    pub fn bind_to(self, badge_full_id: &str) -> Self {
        Self {
            badge_id: Some(badge_full_id.to_string()),
            ..self
        }
    }
}

/// A badge definition with its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub version: String,
    pub category: u32,
    pub name: String,
    pub description: String,
    pub group: String,
    pub picture_url: String,
    pub section_id: String,
    pub when_added: Option<NaiveDateTime>,
    pub when_updated: Option<NaiveDateTime>,
    tasks: Vec<BadgeTask>,
}

impl Badge {
    /// Build a badge and bind every task to it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        version: impl Into<String>,
        category: u32,
        name: impl Into<String>,
        description: impl Into<String>,
        group: impl Into<String>,
        picture_url: impl Into<String>,
        section_id: impl Into<String>,
        when_added: Option<NaiveDateTime>,
        when_updated: Option<NaiveDateTime>,
        tasks: Vec<BadgeTask>,
    ) -> Self {
        let mut badge = Self {
            id: id.into(),
            version: version.into(),
            category,
            name: name.into(),
            description: description.into(),
            group: group.into(),
            picture_url: picture_url.into(),
            section_id: section_id.into(),
            when_added,
            when_updated,
            tasks: Vec::new(),
        };
        let full_id = badge.full_id();
        badge.tasks = tasks.into_iter().map(|t| t.bind_to(&full_id)).collect();
        badge
    }

    /// `id` and `version` joined by an underscore; stable across revisions.
    pub fn full_id(&self) -> String {
        format!("{}_{}", self.id, self.version)
    }

    pub fn tasks(&self) -> &[BadgeTask] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&BadgeTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Tasks grouped by module label (unlabelled tasks under "").
    pub fn tasks_by_module(&self) -> BTreeMap<&str, Vec<&BadgeTask>> {
        let mut modules: BTreeMap<&str, Vec<&BadgeTask>> = BTreeMap::new();
        for task in &self.tasks {
            modules
                .entry(task.module.as_deref().unwrap_or(""))
                .or_default()
                .push(task);
        }
        modules
    }
}
