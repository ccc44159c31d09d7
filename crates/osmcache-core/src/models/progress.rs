use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Badge, Member};

/// One member's progress towards one badge in one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub member: Member,
    /// Full id of the badge (see [`Badge::full_id`]).
    pub badge_id: String,
    pub is_completed: bool,
    /// Independent of `is_completed`: a badge may be awarded without every
    /// task being marked, and completed without being awarded.
    pub when_awarded: Option<NaiveDate>,
    pub task_status: HashMap<String, String>,
}

impl BadgeProgress {
    pub fn is_awarded(&self) -> bool {
        self.when_awarded.is_some()
    }

    pub fn status(&self, task_id: &str) -> Option<&str> {
        self.task_status.get(task_id).map(String::as_str)
    }

    /// A task counts as done when it has any non-empty status.
    pub fn is_task_completed(&self, task_id: &str) -> bool {
        self.status(task_id).map(|s| !s.is_empty()).unwrap_or(false)
    }
}

/// Every member's progress towards a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeProgressReport {
    pub badge: Badge,
    progress: Vec<BadgeProgress>,
}

impl BadgeProgressReport {
    pub fn new(badge: Badge, progress: Vec<BadgeProgress>) -> Self {
        Self { badge, progress }
    }

    pub fn for_member(&self, member_id: &str) -> Option<&BadgeProgress> {
        self.progress.iter().find(|p| p.member.id == member_id)
    }

    /// Completed tasks for a member, counted per module label.
    pub fn module_counts(&self, member_id: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        let Some(progress) = self.for_member(member_id) else {
            return counts;
        };
        for task in self.badge.tasks() {
            let module = task.module.clone().unwrap_or_default();
            let entry = counts.entry(module).or_insert(0);
            if progress.is_task_completed(&task.id) {
                *entry += 1;
            }
        }
        counts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BadgeProgress> {
        self.progress.iter()
    }

    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }
}

impl<'a> IntoIterator for &'a BadgeProgressReport {
    type Item = &'a BadgeProgress;
    type IntoIter = std::slice::Iter<'a, BadgeProgress>;

    fn into_iter(self) -> Self::IntoIter {
        self.progress.iter()
    }
}

impl IntoIterator for BadgeProgressReport {
    type Item = BadgeProgress;
    type IntoIter = std::vec::IntoIter<BadgeProgress>;

    fn into_iter(self) -> Self::IntoIter {
        self.progress.into_iter()
    }
}
