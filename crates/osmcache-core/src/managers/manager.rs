use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::{BadgeManager, GroupManager, MemberManager, TermManager};
use crate::api::{ApiError, Connection, ConnectionConfig, QueryParams};
use crate::auth::{Session, SessionData, SessionHandle};
use crate::cache::CacheSettings;
use crate::utils::de::string_or_number;

const AUTHORISE_ENDPOINT: &str = "users.php?action=authorise";

#[derive(Debug, Deserialize)]
struct AuthoriseResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    userid: String,
    #[serde(default)]
    secret: Option<String>,
}

/// Entry point to the OSM API.
///
/// Owns the session handle and hands out the domain facades. Facades are
/// created on first use and see re-authorisation through the shared handle.
pub struct Manager {
    session: SessionHandle,
    settings: CacheSettings,
    badge: OnceLock<BadgeManager>,
    group: OnceLock<GroupManager>,
    member: OnceLock<MemberManager>,
    term: OnceLock<TermManager>,
}

impl Manager {
    /// An unauthorised manager for the application's credentials.
    pub fn new(api_id: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_config(
            Session::new(api_id, token),
            ConnectionConfig::default(),
            CacheSettings::default(),
        )
    }

    /// Resume a previously authorised session.
    pub fn with_authorisation(
        api_id: impl Into<String>,
        token: impl Into<String>,
        user_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(
            Session::new(api_id, token).with_authorisation(user_id, secret),
            ConnectionConfig::default(),
            CacheSettings::default(),
        )
    }

    pub fn with_config(
        session: Session,
        config: ConnectionConfig,
        settings: CacheSettings,
    ) -> Result<Self> {
        let connection = Connection::new(session, config)?;
        Ok(Self {
            session: SessionHandle::new(connection),
            settings,
            badge: OnceLock::new(),
            group: OnceLock::new(),
            member: OnceLock::new(),
            term: OnceLock::new(),
        })
    }

    /// Replace the cache settings. Facades built earlier are discarded.
    pub fn with_cache_settings(self, settings: CacheSettings) -> Self {
        Self {
            session: self.session,
            settings,
            badge: OnceLock::new(),
            group: OnceLock::new(),
            member: OnceLock::new(),
            term: OnceLock::new(),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        self.settings
    }

    /// The user identity of the current session, for persisting between runs.
    pub fn authorisation(&self) -> Option<SessionData> {
        self.session.current().session().data().cloned()
    }

    pub fn is_authorised(&self) -> bool {
        self.session.is_authorised()
    }

    /// Exchange a user's email and password for a session.
    ///
    /// Returns `Ok(false)` when OSM does not return a user identity; the
    /// current session is kept in that case.
    pub async fn authorise(&self, email: &str, password: &str) -> Result<bool> {
        let connection = self.session.current();
        let params = QueryParams::new()
            .with("email", email)
            .with("password", password);

        let response: Option<AuthoriseResponse> = connection
            .post(AUTHORISE_ENDPOINT, None, &params)
            .await
            .context("Failed to authorise")?;

        let data = response
            .map(|r| SessionData::new(r.userid, r.secret.unwrap_or_default()))
            .filter(SessionData::is_valid);
        let Some(data) = data else {
            info!("Authorisation refused");
            return Ok(false);
        };

        info!(user_id = %data.user_id, "Authorised");
        self.session
            .replace(connection.with_authorisation(data.user_id, data.secret));
        Ok(true)
    }

    fn ensure_authorised(&self) -> Result<(), ApiError> {
        if self.session.is_authorised() {
            Ok(())
        } else {
            Err(ApiError::NotAuthorised)
        }
    }

    pub fn badge(&self) -> Result<&BadgeManager, ApiError> {
        self.ensure_authorised()?;
        Ok(self
            .badge
            .get_or_init(|| BadgeManager::new(self.session.clone(), self.settings)))
    }

    pub fn group(&self) -> Result<&GroupManager, ApiError> {
        self.ensure_authorised()?;
        Ok(self
            .group
            .get_or_init(|| GroupManager::new(self.session.clone(), self.settings)))
    }

    pub fn member(&self) -> Result<&MemberManager, ApiError> {
        self.ensure_authorised()?;
        Ok(self
            .member
            .get_or_init(|| MemberManager::new(self.session.clone(), self.settings)))
    }

    pub fn term(&self) -> Result<&TermManager, ApiError> {
        self.ensure_authorised()?;
        Ok(self
            .term
            .get_or_init(|| TermManager::new(self.session.clone(), self.settings)))
    }
}
