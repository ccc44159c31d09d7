use serde::{Deserialize, Serialize};

/// The identity returned by the authorise endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub secret: String,
}

impl SessionData {
    pub fn new(user_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            secret: secret.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.user_id.is_empty() && !self.secret.is_empty()
    }
}

/// Application identity plus, once authorised, the user's session identity.
///
/// Immutable: authorising produces a new `Session` via
/// [`Session::with_authorisation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    api_id: String,
    token: String,
    data: Option<SessionData>,
}

impl Session {
    pub fn new(api_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            token: token.into(),
            data: None,
        }
    }

    pub fn with_authorisation(
        &self,
        user_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            api_id: self.api_id.clone(),
            token: self.token.clone(),
            data: Some(SessionData::new(user_id, secret)),
        }
    }

    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Session identity, present only when both fields are non-empty.
    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref().filter(|d| d.is_valid())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data().map(|d| d.user_id.as_str())
    }

    pub fn is_authorised(&self) -> bool {
        self.data().is_some()
    }
}
