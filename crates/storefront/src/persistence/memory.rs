//! In-memory cart repository for tests and ephemeral guest sessions.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use vendorcart_core::{CartRepository, CartScope, PersistenceError};

/// Keeps payloads in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryCartRepository {
    payloads: Mutex<HashMap<CartScope, String>>,
}

impl MemoryCartRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a payload is stored for `scope`.
    #[must_use]
    pub fn contains(&self, scope: &CartScope) -> bool {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(scope)
    }
}

impl CartRepository for MemoryCartRepository {
    fn load(&self, scope: &CartScope) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(scope)
            .cloned())
    }

    fn store(&self, scope: &CartScope, payload: &str) -> Result<(), PersistenceError> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*scope, payload.to_string());
        Ok(())
    }

    fn delete(&self, scope: &CartScope) -> Result<(), PersistenceError> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(scope);
        Ok(())
    }
}
