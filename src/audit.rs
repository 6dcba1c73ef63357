//! Request audit log backed by the `logs` collection

use crate::models::LogEntry;
use crate::record::{RecordId, Stored};
use crate::store::StoreHandle;
use anyhow::{Context, Result};
use tracing::debug;

/// How many entries the admin view shows
pub const ADMIN_VIEW_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct AuditLog {
    store: StoreHandle<LogEntry>,
}

impl AuditLog {
    pub fn new(store: StoreHandle<LogEntry>) -> Self {
        Self { store }
    }

    pub fn record(&self, entry: &LogEntry) -> Result<RecordId> {
        debug!(method = %entry.method, path = %entry.path, status = entry.status, "audit");
        self.store.add_item(entry).context("Failed to write audit entry")
    }

    /// The newest `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Stored<LogEntry>>> {
        let mut entries = self.store.read_typed().context("Failed to read audit log")?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }
}
