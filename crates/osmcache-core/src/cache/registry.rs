use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use super::cell::CachedData;
use crate::api::{Connection, QueryParams};

/// A cache cell shared between callers of the same scope.
pub type SharedCell<T> = Arc<Mutex<CachedData<T>>>;

/// Scope key for data that belongs to a section within a term.
pub fn section_term_key(section_id: &str, term_id: &str) -> String {
    format!("s{}~t{}", section_id, term_id)
}

/// Scope key for data that belongs to the authorised user.
pub fn user_key(user_id: &str) -> String {
    format!("u{}", user_id)
}

/// A family of cache cells keyed by scope.
///
/// Cells are created by the factory on first access to a key and reused
/// afterwards, so each scope has its own value and expiry.
pub struct CachedDataSet<T> {
    caches: Mutex<HashMap<String, SharedCell<T>>>,
    initialise: Box<dyn Fn() -> CachedData<T> + Send + Sync>,
}

impl<T> CachedDataSet<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(initialise: impl Fn() -> CachedData<T> + Send + Sync + 'static) -> Self {
        Self {
            caches: Mutex::new(HashMap::new()),
            initialise: Box::new(initialise),
        }
    }

    pub async fn get(&self, key: &str) -> SharedCell<T> {
        let mut caches = self.caches.lock().await;
        if let Some(cell) = caches.get(key) {
            return Arc::clone(cell);
        }
        debug!(scope = key, "Creating cache cell");
        let cell = Arc::new(Mutex::new((self.initialise)()));
        caches.insert(key.to_string(), Arc::clone(&cell));
        cell
    }

    pub async fn get_for_section_and_term(
        &self,
        section_id: &str,
        term_id: &str,
    ) -> SharedCell<T> {
        self.get(&section_term_key(section_id, term_id)).await
    }

    /// Resolve the cell for `key` and read through it.
    ///
    /// The cell stays locked for the duration of a fetch, so concurrent
    /// callers of one scope wait for a single request.
    pub async fn fetch(
        &self,
        key: &str,
        connection: &Connection,
        query: Option<&str>,
        params: &QueryParams,
    ) -> Result<T> {
        let cell = self.get(key).await;
        let mut cell = cell.lock().await;
        debug!(scope = key, "Reading through cache");
        cell.get(connection, query, params).await
    }

    pub async fn len(&self) -> usize {
        self.caches.lock().await.len()
    }
}
