use std::fmt;

use time::OffsetDateTime;

use crate::config::StorageOptions;
use crate::registry::NoteRegistry;
use crate::storage::{DataStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointReason {
    /// A note lost focus.
    Deactivated,
    Shutdown,
    Manual,
}

impl fmt::Display for CheckpointReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckpointReason::Deactivated => "deactivated",
            CheckpointReason::Shutdown => "shutdown",
            CheckpointReason::Manual => "manual",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointStatus {
    Never,
    Saved {
        at: OffsetDateTime,
        notes: usize,
        reason: CheckpointReason,
    },
    Error {
        message: String,
        occurred_at: OffsetDateTime,
        reason: CheckpointReason,
    },
}

/// Writes full snapshots of the registry to the data file and remembers how
/// the last one went.
#[derive(Debug)]
pub struct Checkpointer {
    store: DataStore,
    on_deactivate: bool,
    status: CheckpointStatus,
    completed: u64,
}

impl Checkpointer {
    pub fn new(store: DataStore, options: &StorageOptions) -> Self {
        Self {
            store,
            on_deactivate: options.checkpoint_on_deactivate,
            status: CheckpointStatus::Never,
            completed: 0,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn status(&self) -> &CheckpointStatus {
        &self.status
    }

    /// Successful checkpoints since startup.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn wants(&self, reason: CheckpointReason) -> bool {
        match reason {
            CheckpointReason::Deactivated => self.on_deactivate,
            CheckpointReason::Shutdown | CheckpointReason::Manual => true,
        }
    }

    pub fn run(
        &mut self,
        registry: &NoteRegistry,
        reason: CheckpointReason,
    ) -> Result<usize, StorageError> {
        let now = OffsetDateTime::now_utc();
        match self.store.save(registry) {
            Ok(notes) => {
                tracing::debug!(notes, %reason, path = %self.store.path().display(), "checkpoint written");
                self.completed += 1;
                self.status = CheckpointStatus::Saved {
                    at: now,
                    notes,
                    reason,
                };
                Ok(notes)
            }
            Err(err) => {
                self.status = CheckpointStatus::Error {
                    message: error_chain(&err),
                    occurred_at: now,
                    reason,
                };
                Err(err)
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
