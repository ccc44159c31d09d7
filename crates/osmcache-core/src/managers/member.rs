use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::QueryParams;
use crate::auth::SessionHandle;
use crate::cache::{section_term_key, CacheSettings, CachedData, CachedDataSet};
use crate::models::{Member, Section, Term};
use crate::utils::de::{entries_or_empty, flexible_bool, string_or_number};
use crate::utils::parse_date;

const MEMBERS_ENDPOINT: &str = "ext/members/contact/grid/?action=getMembers";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MembersResponse {
    #[serde(default, deserialize_with = "entries_or_empty")]
    data: Vec<(String, MemberRecord)>,
}

#[derive(Debug, Clone, Deserialize)]
struct MemberRecord {
    #[serde(deserialize_with = "string_or_number")]
    member_id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    patrol: String,
    #[serde(default, deserialize_with = "string_or_number")]
    patrol_role_level_label: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    active: bool,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    joined: Option<String>,
    #[serde(default)]
    started: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

fn optional_date(value: &Option<String>) -> Result<Option<chrono::NaiveDate>> {
    value.as_deref().map(parse_date).transpose().map(Option::flatten)
}

/// Members in response order.
pub(crate) fn convert_members(
    response: &MembersResponse,
    section_id: &str,
) -> Result<Vec<Member>> {
    response
        .data
        .iter()
        .map(|(_, record)| {
            let dates = || -> Result<_> {
                Ok((
                    optional_date(&record.date_of_birth)?,
                    optional_date(&record.joined)?,
                    optional_date(&record.started)?,
                    optional_date(&record.end_date)?,
                ))
            };
            let (when_born, when_joined, when_started, when_ended) = dates()
                .with_context(|| format!("Member {} has an invalid date", record.member_id))?;

            Ok(Member {
                id: record.member_id.clone(),
                family_name: record.last_name.clone(),
                first_name: record.first_name.clone(),
                patrol: record.patrol.clone(),
                role: record.patrol_role_level_label.clone(),
                is_active: record.active,
                when_born,
                when_joined,
                when_started,
                when_ended,
                section_id: section_id.to_string(),
            })
        })
        .collect()
}

/// Section membership per term.
pub struct MemberManager {
    session: SessionHandle,
    members: CachedDataSet<MembersResponse>,
}

impl MemberManager {
    pub(crate) fn new(session: SessionHandle, settings: CacheSettings) -> Self {
        Self {
            session,
            members: CachedDataSet::new(move || {
                CachedData::from_endpoint(MEMBERS_ENDPOINT, settings)
            }),
        }
    }

    pub async fn list_for_section(&self, section: &Section, term: &Term) -> Result<Vec<Member>> {
        let connection = self.session.current();
        let params = QueryParams::new()
            .with("section_id", section.id.as_str())
            .with("term_id", term.id.as_str());

        let response = self
            .members
            .fetch(&section_term_key(&section.id, &term.id), &connection, None, &params)
            .await
            .with_context(|| format!("Failed to load members for section {}", section.id))?;
        convert_members(&response, &section.id)
    }
}
