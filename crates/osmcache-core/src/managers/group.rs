use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::{ApiError, QueryParams};
use crate::auth::SessionHandle;
use crate::cache::{user_key, CacheSettings, CachedData, CachedDataSet};
use crate::models::{Group, Section};
use crate::utils::de::string_or_number;

const USER_ROLES_ENDPOINT: &str = "api.php?action=getUserRoles";

/// One row of `getUserRoles`: a section the user can see, with its group.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserRole {
    #[serde(deserialize_with = "string_or_number")]
    groupid: String,
    #[serde(default)]
    groupname: String,
    #[serde(deserialize_with = "string_or_number")]
    sectionid: String,
    #[serde(default)]
    sectionname: String,
    #[serde(default)]
    section: String,
}

/// Rows grouped by `(groupid, groupname)` in first-appearance order.
pub(crate) fn group_sections(roles: Vec<UserRole>) -> Vec<Group> {
    let mut grouped: Vec<((String, String), Vec<Section>)> = Vec::new();
    for role in roles {
        let key = (role.groupid, role.groupname);
        let section = Section::new(role.sectionid, role.sectionname, role.section);
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, sections)) => sections.push(section),
            None => grouped.push((key, vec![section])),
        }
    }
    grouped
        .into_iter()
        .map(|((id, name), sections)| Group::new(id, name, sections))
        .collect()
}

/// Groups and sections visible to the authorised user.
pub struct GroupManager {
    session: SessionHandle,
    roles: CachedDataSet<Vec<UserRole>>,
}

impl GroupManager {
    pub(crate) fn new(session: SessionHandle, settings: CacheSettings) -> Self {
        Self {
            session,
            roles: CachedDataSet::new(move || {
                CachedData::from_endpoint(USER_ROLES_ENDPOINT, settings)
            }),
        }
    }

    pub async fn load_for_current_user(&self) -> Result<Vec<Group>> {
        let connection = self.session.current();
        let user_id = connection
            .session()
            .user_id()
            .ok_or(ApiError::NotAuthorised)?;

        let roles = self
            .roles
            .fetch(&user_key(user_id), &connection, None, &QueryParams::new())
            .await
            .context("Failed to load user roles")?;
        Ok(group_sections(roles))
    }
}
