//! redb-backed local store.

use crate::error::{CoreError, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// TABLES
// =============================================================================

/// Authentication values, keyed by name.
const AUTH: TableDefinition<&str, &str> = TableDefinition::new("auth");

/// Promo name -> unix seconds at which it was dismissed.
const DISMISSED_PROMOS: TableDefinition<&str, u64> = TableDefinition::new("dismissed_promos");

/// Widget name -> postcard-encoded `WidgetPosition`.
const WIDGET_POSITIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("widget_positions");

const TOKEN_KEY: &str = "bearer_token";

fn storage_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Storage(e.to_string())
}

// =============================================================================
// VALUE TYPES
// =============================================================================

/// Screen position of a draggable widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: i32,
    pub y: i32,
}

impl WidgetPosition {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Persistent client-side key/value storage.
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(storage_err)?;

        // Create every table up front so read transactions never miss one.
        let txn = db.begin_write().map_err(storage_err)?;
        {
            txn.open_table(AUTH).map_err(storage_err)?;
            txn.open_table(DISMISSED_PROMOS).map_err(storage_err)?;
            txn.open_table(WIDGET_POSITIONS).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;

        Ok(Self { db })
    }

    // -------------------------------------------------------------------------
    // Bearer token
    // -------------------------------------------------------------------------

    /// The cached bearer token, if one was stored.
    pub fn auth_token(&self) -> Result<Option<String>> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(AUTH).map_err(storage_err)?;
        let value = table.get(TOKEN_KEY).map_err(storage_err)?;
        Ok(value.map(|v| v.value().to_string()))
    }

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(AUTH).map_err(storage_err)?;
            table.insert(TOKEN_KEY, token).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)
    }

    /// Remove the token. Returns whether one was present.
    pub fn clear_auth_token(&self) -> Result<bool> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut table = txn.open_table(AUTH).map_err(storage_err)?;
            let removed = table.remove(TOKEN_KEY).map_err(storage_err)?;
            removed.is_some()
        };
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Dismissed promos
    // -------------------------------------------------------------------------

    /// Mark a promo as dismissed now.
    pub fn dismiss_promo(&self, name: &str) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(DISMISSED_PROMOS).map_err(storage_err)?;
            table.insert(name, now).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)
    }

    /// When the promo was dismissed (unix seconds), `None` if never.
    pub fn promo_dismissed_at(&self, name: &str) -> Result<Option<u64>> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(DISMISSED_PROMOS).map_err(storage_err)?;
        let value = table.get(name).map_err(storage_err)?;
        Ok(value.map(|v| v.value()))
    }

    pub fn is_promo_dismissed(&self, name: &str) -> Result<bool> {
        Ok(self.promo_dismissed_at(name)?.is_some())
    }

    /// Names of every dismissed promo, sorted.
    pub fn dismissed_promos(&self) -> Result<Vec<String>> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(DISMISSED_PROMOS).map_err(storage_err)?;
        let mut names = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    // -------------------------------------------------------------------------
    // Widget positions
    // -------------------------------------------------------------------------

    pub fn set_widget_position(&self, widget: &str, position: WidgetPosition) -> Result<()> {
        let bytes = postcard::to_allocvec(&position)?;
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(WIDGET_POSITIONS).map_err(storage_err)?;
            table.insert(widget, bytes.as_slice()).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)
    }

    pub fn widget_position(&self, widget: &str) -> Result<Option<WidgetPosition>> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(WIDGET_POSITIONS).map_err(storage_err)?;
        let Some(value) = table.get(widget).map_err(storage_err)? else {
            return Ok(None);
        };
        let position = postcard::from_bytes(value.value())?;
        Ok(Some(position))
    }
}

// =============================================================================
// TESTS
// =============================================================================
