use std::sync::{Arc, PoisonError, RwLock};

use crate::api::Connection;

/// Shared, swappable reference to the current [`Connection`].
///
/// Facades hold a clone of the handle and read the connection at call time,
/// so a successful `authorise` is visible everywhere without rebuilding them.
/// The lock is never held across an `.await`.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Connection>>,
}

impl SessionHandle {
    pub fn new(connection: Connection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(connection)),
        }
    }

    /// Snapshot of the current connection (cheap clone).
    pub fn current(&self) -> Connection {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, connection: Connection) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = connection;
    }

    pub fn is_authorised(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authorised()
    }
}
