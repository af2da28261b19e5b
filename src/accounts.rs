// 👤 Account Registry - Append-only list of registered users
//
// Usernames are unique (case-sensitive). The uniqueness check and the append
// run under one write lock, so two concurrent registrations of the same name
// cannot both succeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{CatalogError, Result};

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity (UUID)
    pub id: String,

    pub username: String,

    /// Opaque, stored as given
    #[serde(skip_serializing)]
    pub password: String,

    pub registered_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, password: String) -> Self {
        Account {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password,
            registered_at: Utc::now(),
        }
    }
}

// ============================================================================
// ACCOUNT REGISTRY
// ============================================================================

/// Registry of all registered accounts
///
/// Cloning shares the underlying list, so one registry can be handed to
/// every request handler.
#[derive(Clone)]
pub struct AccountRegistry {
    accounts: Arc<RwLock<Vec<Account>>>,
}

impl AccountRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        AccountRegistry {
            accounts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a new account.
    ///
    /// Fails with `InvalidInput` when either field is empty and with
    /// `AlreadyExists` when the username is taken. Failed calls leave the
    /// registry untouched.
    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(CatalogError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let mut accounts = self.write();
        if accounts.iter().any(|a| a.username == username) {
            return Err(CatalogError::AlreadyExists(format!("user {}", username)));
        }

        accounts.push(Account::new(username.to_string(), password.to_string()));
        Ok(())
    }

    /// Check whether a username is registered (exact match)
    pub fn contains(&self, username: &str) -> bool {
        self.read().iter().any(|a| a.username == username)
    }

    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        self.read().iter().find(|a| a.username == username).cloned()
    }

    /// All accounts in registration order
    pub fn all_accounts(&self) -> Vec<Account> {
        self.read().clone()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    // Registration never leaves the list half-written, so a poisoned lock
    // still guards a consistent Vec.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Account>> {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Account>> {
        self.accounts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
