// Table synchronization: subscribe to a named table, replay its snapshot,
// then forward every later change in arrival order.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::protocol::{Table, TableUpdate};

#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("table channel unavailable while subscribing to `{table}`")]
    ChannelUnavailable { table: Table },
}

/// The external key-value tables the channel reads snapshots from.
pub trait TableSource {
    /// Current entries of `table`, in the table's natural enumeration order.
    fn entries(&self, table: Table) -> Result<Vec<(String, Value)>, SyncError>;

    /// Record a live change so later snapshots include it.
    fn record(&mut self, update: &TableUpdate);
}

/// In-process copy of every table, fed by the game-client bridge.
///
/// Enumeration order is the order in which keys were first seen; a later
/// value for an existing key replaces it in place.
#[derive(Debug, Clone)]
pub struct MemoryTables {
    tables: HashMap<Table, Vec<(String, Value)>>,
    online: bool,
}

impl Default for MemoryTables {
    fn default() -> Self {
        MemoryTables {
            tables: HashMap::new(),
            online: true,
        }
    }
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose backing tables cannot be reached.
    pub fn offline() -> Self {
        MemoryTables {
            tables: HashMap::new(),
            online: false,
        }
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn len(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }
}

impl TableSource for MemoryTables {
    fn entries(&self, table: Table) -> Result<Vec<(String, Value)>, SyncError> {
        if !self.online {
            return Err(SyncError::ChannelUnavailable { table });
        }
        Ok(self.tables.get(&table).cloned().unwrap_or_default())
    }

    fn record(&mut self, update: &TableUpdate) {
        let rows = self.tables.entry(update.table).or_default();
        match rows.iter_mut().find(|(k, _)| *k == update.key) {
            Some((_, value)) => *value = update.value.clone(),
            None => rows.push((update.key.clone(), update.value.clone())),
        }
    }
}

/// Subscribe-and-replay adapter over a [`TableSource`].
///
/// All subscribed tables share one ordered sink, so updates are consumed one
/// at a time by a single reader and never overlap.
pub struct TableSyncChannel<S> {
    source: S,
    subscribed: HashSet<Table>,
    sink: mpsc::UnboundedSender<TableUpdate>,
}

impl<S: TableSource> TableSyncChannel<S> {
    /// Create a channel plus the receiving end the consumer drains.
    pub fn new(source: S) -> (Self, mpsc::UnboundedReceiver<TableUpdate>) {
        let (sink, rx) = mpsc::unbounded_channel();
        (
            TableSyncChannel {
                source,
                subscribed: HashSet::new(),
                sink,
            },
            rx,
        )
    }

    /// Subscribe to `table`, enqueueing one update per existing entry before
    /// returning. Fails without enqueueing anything when the source or the
    /// consumer is gone.
    pub fn subscribe(&mut self, table: Table) -> Result<usize, SyncError> {
        if self.sink.is_closed() {
            return Err(SyncError::ChannelUnavailable { table });
        }
        let snapshot = self.source.entries(table)?;
        let replayed = snapshot.len();
        for (key, value) in snapshot {
            self.sink
                .send(TableUpdate::new(table, key, value))
                .map_err(|_| SyncError::ChannelUnavailable { table })?;
        }
        self.subscribed.insert(table);
        debug!("Subscribed to `{table}` ({replayed} entries replayed)");
        Ok(replayed)
    }

    pub fn is_subscribed(&self, table: Table) -> bool {
        self.subscribed.contains(&table)
    }

    /// Record a live change and forward it if its table is subscribed.
    /// Returns whether the update was forwarded.
    pub fn publish(&mut self, update: TableUpdate) -> bool {
        self.source.record(&update);
        if !self.subscribed.contains(&update.table) {
            trace!("No subscriber for `{}`, update recorded only", update.table);
            return false;
        }
        self.sink.send(update).is_ok()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
