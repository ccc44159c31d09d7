use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::QueryParams;
use crate::auth::SessionHandle;
use crate::cache::{section_term_key, CacheSettings, CachedData, CachedDataSet};
use crate::models::{
    Badge, BadgeProgress, BadgeProgressReport, BadgeTask, BadgeType, Member, Section, Term,
};
use crate::utils::de::{entries_or_empty, string_or_number, value_to_string};
use crate::utils::{parse_date, parse_date_time};

const STRUCTURE_ENDPOINT: &str = "ext/badges/records/?action=getBadgeStructureByType";
const RECORDS_ENDPOINT: &str = "ext/badges/records/?action=getBadgeRecords";

/// Per-member fields of a progress record that are not task statuses.
const MEMBER_FIELDS: &[&str] = &[
    "scoutid",
    "firstname",
    "lastname",
    "completed",
    "awardeddate",
    "awarded",
    "patrolid",
    "patrol",
    "sid",
    "dob",
    "age",
    "photo_guid",
    "pic",
    "_filterstring",
];

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StructureResponse {
    #[serde(default, deserialize_with = "entries_or_empty")]
    details: Vec<(String, BadgeDetails)>,
    #[serde(default, deserialize_with = "entries_or_empty")]
    structure: Vec<(String, Vec<RowGroup>)>,
}

#[derive(Debug, Clone, Deserialize)]
struct BadgeDetails {
    #[serde(deserialize_with = "string_or_number")]
    badge_id: String,
    #[serde(deserialize_with = "string_or_number")]
    badge_version: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    lastupdated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RowGroup {
    #[serde(default, alias = "Rows")]
    rows: Vec<StructureRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct StructureRow {
    #[serde(default, deserialize_with = "string_or_number")]
    field: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tooltip: Option<String>,
    #[serde(default)]
    module: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    items: Vec<Map<String, Value>>,
}

// ============================================================================
// Joiners
// ============================================================================

fn optional_timestamp(value: &Option<String>) -> Result<Option<chrono::NaiveDateTime>> {
    value
        .as_deref()
        .map(parse_date_time)
        .transpose()
        .map(Option::flatten)
}

/// Join badge details with their task structure.
///
/// Badges come back in response order. The first row group of each
/// structure entry is the header and carries no tasks. Details without a
/// structure entry are dropped.
pub(crate) fn assemble_badges(
    response: &StructureResponse,
    section_id: &str,
    badge_type: BadgeType,
) -> Result<Vec<Badge>> {
    let structure: HashMap<&str, &[RowGroup]> = response
        .structure
        .iter()
        .map(|(key, groups)| (key.as_str(), groups.as_slice()))
        .collect();

    let mut badges = Vec::with_capacity(response.details.len());
    for (key, details) in &response.details {
        let Some(groups) = structure.get(key.as_str()) else {
            debug!(badge = key.as_str(), "No structure for badge, skipping");
            continue;
        };

        let tasks = groups
            .iter()
            .skip(1)
            .flat_map(|group| group.rows.iter())
            .map(|row| {
                BadgeTask::new(
                    row.field.as_str(),
                    row.name.clone().unwrap_or_default(),
                    row.tooltip.clone().unwrap_or_default(),
                    row.module.clone().filter(|m| !m.is_empty()),
                )
            })
            .collect();

        let when_added = optional_timestamp(&details.created_at)
            .with_context(|| format!("Badge {} has an invalid created_at", key))?;
        let when_updated = optional_timestamp(&details.lastupdated)
            .with_context(|| format!("Badge {} has an invalid lastupdated", key))?;

        badges.push(Badge::new(
            details.badge_id.as_str(),
            details.badge_version.as_str(),
            badge_type.id(),
            details.name.as_str(),
            details.description.clone().unwrap_or_default(),
            details.group_name.clone().unwrap_or_default(),
            details.picture.clone().unwrap_or_default(),
            section_id,
            when_added,
            when_updated,
            tasks,
        ));
    }
    Ok(badges)
}

fn take(fields: &mut HashMap<String, String>, key: &str) -> String {
    fields.remove(key).unwrap_or_default()
}

/// Turn raw progress records into one [`BadgeProgress`] per member.
///
/// Every value is stringified; whatever is left after removing the member
/// fields is the task-status map.
pub(crate) fn parse_progress(
    items: &[Map<String, Value>],
    badge: &Badge,
    section_id: &str,
) -> Result<Vec<BadgeProgress>> {
    items
        .iter()
        .map(|item| {
            let mut fields: HashMap<String, String> = item
                .iter()
                .map(|(key, value)| (key.clone(), value_to_string(value)))
                .collect();

            let id = take(&mut fields, "scoutid");
            let member = Member {
                family_name: take(&mut fields, "lastname"),
                first_name: take(&mut fields, "firstname"),
                patrol: take(&mut fields, "patrol"),
                role: String::new(),
                is_active: true,
                when_born: None,
                when_joined: None,
                when_started: None,
                when_ended: None,
                section_id: section_id.to_string(),
                id: id.clone(),
            };
            let is_completed = take(&mut fields, "completed") == "1";
            let when_awarded = parse_date(&take(&mut fields, "awardeddate"))
                .with_context(|| format!("Progress for member {} has an invalid award date", id))?;
            for key in MEMBER_FIELDS {
                fields.remove(*key);
            }

            Ok(BadgeProgress {
                member,
                badge_id: badge.full_id(),
                is_completed,
                when_awarded,
                task_status: fields,
            })
        })
        .collect()
}

// ============================================================================
// Manager
// ============================================================================

/// Badge definitions and per-member progress.
///
/// Definitions are cached per badge type, then per section and term.
/// Progress is always fetched fresh.
pub struct BadgeManager {
    session: SessionHandle,
    structures: HashMap<BadgeType, CachedDataSet<StructureResponse>>,
}

impl BadgeManager {
    pub(crate) fn new(session: SessionHandle, settings: CacheSettings) -> Self {
        let structures = BadgeType::ALL
            .into_iter()
            .map(|badge_type| {
                let set = CachedDataSet::new(move || {
                    CachedData::from_endpoint(STRUCTURE_ENDPOINT, settings)
                });
                (badge_type, set)
            })
            .collect();
        Self { session, structures }
    }

    pub async fn list_for_section(
        &self,
        section: &Section,
        badge_type: BadgeType,
        term: &Term,
    ) -> Result<Vec<Badge>> {
        let connection = self.session.current();
        let query = QueryParams::new()
            .with("a", "1")
            .with("section", section.section_type.as_str())
            .with("type_id", badge_type.id().to_string())
            .with("term_id", term.id.as_str())
            .with("section_id", section.id.as_str())
            .to_query_string();

        let cache = self
            .structures
            .get(&badge_type)
            .with_context(|| format!("No badge cache for {}", badge_type))?;
        let response = cache
            .fetch(
                &section_term_key(&section.id, &term.id),
                &connection,
                Some(&query),
                &QueryParams::new(),
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to load {} badges for section {}",
                    badge_type, section.id
                )
            })?;
        assemble_badges(&response, &section.id, badge_type)
    }

    pub async fn list_progress_for_badge(
        &self,
        section: &Section,
        badge: &Badge,
        term: &Term,
    ) -> Result<BadgeProgressReport> {
        let connection = self.session.current();
        let query = QueryParams::new()
            .with("term_id", term.id.as_str())
            .with("section", section.section_type.as_str())
            .with("badge_id", badge.id.as_str())
            .with("section_id", section.id.as_str())
            .with("badge_version", badge.version.as_str())
            .to_query_string();

        let response: RecordsResponse = connection
            .post(RECORDS_ENDPOINT, Some(&query), &QueryParams::new())
            .await
            .with_context(|| format!("Failed to load progress for badge {}", badge.full_id()))?;
        debug!(badge = %badge.full_id(), records = response.items.len(), "Badge progress loaded");

        let progress = parse_progress(&response.items, badge, &section.id)?;
        Ok(BadgeProgressReport::new(badge.clone(), progress))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::test_support::authorised_handle;
    use chrono::NaiveDate;
    use httpmock::MockServer;

    const STRUCTURE: &str = r#"{
        "badgeOrder": "101,102",
        "details": {
            "101": {"badge_id": "101", "badge_version": "2", "name": "Camping",
                    "description": "Sleep outside", "group_name": "Outdoor",
                    "picture": "camping.png", "created_at": "2019-03-01 10:00:00",
                    "lastupdated": "2020-01-02 03:04:05"},
            "102": {"badge_id": 102, "badge_version": 0, "name": "Orphan"}
        },
        "structure": {
            "101": [
                {"rows": [
                    {"field": "firstname", "name": "First name"},
                    {"field": "lastname", "name": "Last name"}
                ]},
                {"rows": [
                    {"field": "_1", "name": "Pitch a tent", "tooltip": "Any tent",
                     "module": "Shelter"},
                    {"field": "_2", "name": "Cook a meal", "tooltip": null, "module": ""}
                ]}
            ]
        }
    }"#;

    fn structure() -> StructureResponse {
        serde_json::from_str(STRUCTURE).unwrap()
    }

    fn term() -> Term {
        Term {
            id: "5".to_string(),
            name: "Term 2".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            section_id: "10".to_string(),
        }
    }

    fn items(json: &str) -> Vec<Map<String, Value>> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_assemble_skips_header_row() {
        let badges = assemble_badges(&structure(), "10", BadgeType::AwardScheme).unwrap();
        assert_eq!(badges.len(), 1);

        let badge = &badges[0];
        assert_eq!(badge.full_id(), "101_2");
        assert_eq!(badge.category, 1);
        assert_eq!(badge.section_id, "10");
        assert_eq!(
            badge.tasks().iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["_1", "_2"]
        );
        assert!(badge.tasks().iter().all(|t| t.badge_id.as_deref() == Some("101_2")));
        assert_eq!(badge.task("_1").and_then(|t| t.module.as_deref()), Some("Shelter"));
        assert_eq!(badge.task("_2").map(|t| t.description.as_str()), Some(""));
        assert_eq!(badge.task("_2").and_then(|t| t.module.clone()), None);
        assert_eq!(
            badge.when_updated,
            NaiveDate::from_ymd_opt(2020, 1, 2).and_then(|d| d.and_hms_opt(3, 4, 5))
        );
    }

    #[test]
    fn test_assemble_keeps_response_order() {
        let response: StructureResponse = serde_json::from_str(
            r#"{
                "details": {
                    "99": {"badge_id": "99", "badge_version": "1", "name": "Nine"},
                    "100": {"badge_id": "100", "badge_version": "1", "name": "Hundred"}
                },
                "structure": {
                    "100": [{"rows": []}, {"rows": [{"field": "_h", "name": "H"}]}],
                    "99": [{"rows": []}, {"rows": [{"field": "_n", "name": "N"}]}]
                }
            }"#,
        )
        .unwrap();
        let badges = assemble_badges(&response, "10", BadgeType::AwardScheme).unwrap();

        let names: Vec<&str> = badges.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Nine", "Hundred"]);
        assert_eq!(badges[1].task("_h").map(|t| t.name.as_str()), Some("H"));
    }

    #[test]
    fn test_malformed_detail_names_the_field() {
        let err = serde_json::from_str::<StructureResponse>(
            r#"{"details": {"101": {"badge_version": "1"}}, "structure": []}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("badge_id"), "{}", err);
    }

    #[test]
    fn test_assemble_empty_response() {
        let response: StructureResponse =
            serde_json::from_str(r#"{"details": [], "structure": []}"#).unwrap();
        assert!(assemble_badges(&response, "10", BadgeType::PersonalAchievement)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_progress_strips_member_fields() {
        let badge = &assemble_badges(&structure(), "10", BadgeType::AwardScheme).unwrap()[0];
        let progress = parse_progress(
            &items(
                r#"[{"scoutid":"55","firstname":"A","lastname":"B","completed":"1",
                     "awardeddate":"2020-05-01","task_x":"Yes"}]"#,
            ),
            badge,
            "10",
        )
        .unwrap();

        let p = &progress[0];
        assert!(p.is_completed);
        assert_eq!(p.when_awarded, NaiveDate::from_ymd_opt(2020, 5, 1));
        assert!(p.is_awarded());
        assert_eq!(
            p.task_status,
            HashMap::from([("task_x".to_string(), "Yes".to_string())])
        );
        assert_eq!(p.member.id, "55");
        assert_eq!(p.member.full_name(), "A B");
        assert_eq!(p.badge_id, "101_2");
    }

    #[test]
    fn test_parse_progress_loose_values() {
        let badge = &assemble_badges(&structure(), "10", BadgeType::AwardScheme).unwrap()[0];
        let progress = parse_progress(
            &items(
                r#"[{"scoutid":56,"firstname":"C","lastname":"D","completed":0,
                     "awardeddate":"0000-00-00","patrol":"Kea","age":"12 / 3",
                     "_1":"x","_2":null,"_filterstring":"c d"}]"#,
            ),
            badge,
            "10",
        )
        .unwrap();

        let p = &progress[0];
        assert_eq!(p.member.id, "56");
        assert_eq!(p.member.patrol, "Kea");
        assert!(!p.is_completed);
        assert!(!p.is_awarded());
        assert_eq!(p.status("_1"), Some("x"));
        assert_eq!(p.status("_2"), Some(""));
        assert_eq!(p.task_status.len(), 2);
    }

    #[test]
    fn test_parse_progress_bad_award_date() {
        let badge = &assemble_badges(&structure(), "10", BadgeType::AwardScheme).unwrap()[0];
        let result = parse_progress(
            &items(r#"[{"scoutid":"1","awardeddate":"May 2020"}]"#),
            badge,
            "10",
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_structure_cached_per_type() {
        let server = MockServer::start_async().await;
        let award = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/ext/badges/records/")
                    .query_param("action", "getBadgeStructureByType")
                    .query_param("a", "1")
                    .query_param("section", "scouts")
                    .query_param("type_id", "1")
                    .query_param("term_id", "5")
                    .query_param("section_id", "10");
                then.status(200).body(STRUCTURE);
            })
            .await;
        let personal = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/ext/badges/records/")
                    .query_param("type_id", "2");
                then.status(200).body(r#"{"details": [], "structure": []}"#);
            })
            .await;

        let manager = BadgeManager::new(authorised_handle(&server), CacheSettings::default());
        let section = Section::new("10", "Scouts", "scouts");
        let first = manager
            .list_for_section(&section, BadgeType::AwardScheme, &term())
            .await
            .unwrap();
        let second = manager
            .list_for_section(&section, BadgeType::AwardScheme, &term())
            .await
            .unwrap();
        let other = manager
            .list_for_section(&section, BadgeType::PersonalAchievement, &term())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert!(other.is_empty());
        award.assert_async().await;
        personal.assert_async().await;
    }

    const RECORDS: &str = r#"{"identifier": "scoutid", "items": [
        {"scoutid": "55", "firstname": "A", "lastname": "B", "completed": "0",
         "awardeddate": "", "_1": "Yes", "_2": ""}
    ]}"#;

    async fn records_mock(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/ext/badges/records/")
                    .query_param("action", "getBadgeRecords")
                    .query_param("term_id", "5")
                    .query_param("section", "scouts")
                    .query_param("badge_id", "101")
                    .query_param("section_id", "10")
                    .query_param("badge_version", "2");
                then.status(200).body(RECORDS);
            })
            .await
    }

    #[tokio::test]
    async fn test_progress_is_fetched_every_time() {
        let server = MockServer::start_async().await;

        let manager = BadgeManager::new(authorised_handle(&server), CacheSettings::default());
        let section = Section::new("10", "Scouts", "scouts");
        let badge = assemble_badges(&structure(), "10", BadgeType::AwardScheme)
            .unwrap()
            .remove(0);

        let first = records_mock(&server).await;
        let report = manager
            .list_progress_for_badge(&section, &badge, &term())
            .await
            .unwrap();
        first.assert_async().await;
        first.delete_async().await;

        let second = records_mock(&server).await;
        manager
            .list_progress_for_badge(&section, &badge, &term())
            .await
            .unwrap();
        second.assert_async().await;

        assert_eq!(report.len(), 1);
        assert_eq!(report.badge.full_id(), "101_2");
        assert_eq!(report.module_counts("55").get("Shelter"), Some(&1));
        assert_eq!(report.module_counts("55").get(""), Some(&0));
    }
}
