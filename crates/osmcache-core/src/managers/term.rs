use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::api::{ApiError, QueryParams};
use crate::auth::SessionHandle;
use crate::cache::{user_key, CacheSettings, CachedData, CachedDataSet};
use crate::models::{Section, Term, TermArray};
use crate::utils::de::{entries_or_empty, string_or_number};
use crate::utils::{parse_date, today};

const TERMS_ENDPOINT: &str = "api.php?action=getTerms";

/// `getTerms` returns the terms of every section the user can see, keyed by
/// section id.
#[derive(Debug, Clone)]
pub(crate) struct TermsResponse {
    sections: Vec<(String, Vec<TermRecord>)>,
}

impl<'de> Deserialize<'de> for TermsResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        entries_or_empty(deserializer).map(|sections| Self { sections })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TermRecord {
    #[serde(deserialize_with = "string_or_number")]
    termid: String,
    #[serde(default)]
    name: String,
    startdate: String,
    enddate: String,
    #[serde(default, deserialize_with = "string_or_number")]
    sectionid: String,
}

fn required_date(value: &str, what: &str, term_id: &str) -> Result<NaiveDate> {
    parse_date(value)
        .with_context(|| format!("Term {} has an invalid {}", term_id, what))?
        .ok_or_else(|| {
            anyhow!(ApiError::InvalidResponse(format!(
                "Term {} has no {}",
                term_id, what
            )))
        })
}

/// The terms of one section, with the current term resolved against `today`.
pub(crate) fn convert_terms(
    response: &TermsResponse,
    section_id: &str,
    today: NaiveDate,
) -> Result<TermArray> {
    let Some((_, records)) = response.sections.iter().find(|(id, _)| id == section_id) else {
        return Ok(TermArray::default());
    };

    let terms = records
        .iter()
        .map(|record| {
            Ok(Term {
                id: record.termid.clone(),
                name: record.name.clone(),
                start_date: required_date(&record.startdate, "start date", &record.termid)?,
                end_date: required_date(&record.enddate, "end date", &record.termid)?,
                section_id: if record.sectionid.is_empty() {
                    section_id.to_string()
                } else {
                    record.sectionid.clone()
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TermArray::resolved_at(terms, today))
}

/// Terms per section. One request covers every section of the user, so the
/// response is cached per user and filtered per call.
pub struct TermManager {
    session: SessionHandle,
    terms: CachedDataSet<TermsResponse>,
}

impl TermManager {
    pub(crate) fn new(session: SessionHandle, settings: CacheSettings) -> Self {
        Self {
            session,
            terms: CachedDataSet::new(move || {
                CachedData::from_endpoint(TERMS_ENDPOINT, settings)
            }),
        }
    }

    pub async fn list_for_section(&self, section: &Section) -> Result<TermArray> {
        let connection = self.session.current();
        let user_id = connection
            .session()
            .user_id()
            .ok_or(ApiError::NotAuthorised)?;

        let response = self
            .terms
            .fetch(&user_key(user_id), &connection, None, &QueryParams::new())
            .await
            .context("Failed to load terms")?;
        convert_terms(&response, &section.id, today())
            .with_context(|| format!("Failed to read terms for section {}", section.id))
    }
}
