use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{Connection, QueryParams};

/// Default lifetime of a cached response.
const DEFAULT_CACHE_MINUTES: i64 = 1;

/// Settings shared by every cache cell of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// How long a fetched value is served before the next call re-fetches.
    /// Zero (or negative) disables caching.
    pub cache_duration: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_CACHE_MINUTES)
    }
}

impl CacheSettings {
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            cache_duration: Duration::minutes(minutes),
        }
    }

    pub fn disabled() -> Self {
        Self {
            cache_duration: Duration::zero(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.cache_duration <= Duration::zero()
    }
}

pub type FetchFuture<T> = BoxFuture<'static, Result<T>>;

type Fetcher<T> =
    Arc<dyn Fn(Connection, Option<String>, QueryParams) -> FetchFuture<T> + Send + Sync>;

/// A single time-bounded cached value.
///
/// The fetch operation is fixed at construction. `get` serves the stored
/// value until `expires_at`, then re-fetches and resets the expiry. A failed
/// fetch leaves the previous state untouched.
pub struct CachedData<T> {
    fetcher: Fetcher<T>,
    settings: CacheSettings,
    value: Option<T>,
    expires_at: DateTime<Utc>,
}

impl<T> CachedData<T>
where
    T: Clone + Send + 'static,
{
    pub fn with_fetcher<F, Fut>(fetcher: F, settings: CacheSettings) -> Self
    where
        F: Fn(Connection, Option<String>, QueryParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            fetcher: Arc::new(move |connection, query, params| {
                Box::pin(fetcher(connection, query, params))
            }),
            settings,
            value: None,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// POST to a fixed endpoint and deserialize the response into `T`.
    pub fn from_endpoint(endpoint: impl Into<String>, settings: CacheSettings) -> Self
    where
        T: DeserializeOwned,
    {
        let endpoint: Arc<str> = Arc::from(endpoint.into());
        Self::with_fetcher(
            move |connection, query, params| {
                let endpoint = Arc::clone(&endpoint);
                async move {
                    connection
                        .post::<T>(&endpoint, query.as_deref(), &params)
                        .await
                }
            },
            settings,
        )
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.settings.is_disabled() || now > self.expires_at
    }

    pub async fn get(
        &mut self,
        connection: &Connection,
        query: Option<&str>,
        params: &QueryParams,
    ) -> Result<T> {
        self.get_at(Utc::now(), connection, query, params).await
    }

    pub(crate) async fn get_at(
        &mut self,
        now: DateTime<Utc>,
        connection: &Connection,
        query: Option<&str>,
        params: &QueryParams,
    ) -> Result<T> {
        if !self.is_expired_at(now) {
            if let Some(ref value) = self.value {
                debug!(expires_at = %self.expires_at, "Cache hit");
                return Ok(value.clone());
            }
        }

        debug!("Cache miss, fetching");
        let value = (self.fetcher)(
            connection.clone(),
            query.map(str::to_string),
            params.clone(),
        )
        .await?;

        self.value = Some(value.clone());
        self.expires_at = now
            .checked_add_signed(self.settings.cache_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Ok(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
