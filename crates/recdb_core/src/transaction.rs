//! Single-table transaction wrapper.
//!
//! A transaction wraps exactly one table operation. It snapshots every
//! record the operation will touch at begin time; `commit` performs
//! the operation, `rollback` restores the snapshot (in memory and on
//! disk). Transactions are ephemeral and never reused.

use crate::error::{CoreError, CoreResult};
use crate::table::Table;
use recdb_codec::Record;
use std::collections::HashMap;

/// The mutation a transaction wraps.
#[derive(Debug, Clone)]
pub enum TableOperation {
    /// Insert a new record.
    Insert {
        /// The record to insert.
        record: Record,
    },
    /// Update fields of an existing record.
    Update {
        /// Primary-key value of the record to update.
        key: String,
        /// Fields to change.
        updates: Record,
    },
    /// Delete a record.
    Delete {
        /// Primary-key value of the record to delete.
        key: String,
    },
}

impl TableOperation {
    /// Primary-key values this operation touches.
    fn touched_keys(&self, table: &Table) -> CoreResult<Vec<String>> {
        match self {
            Self::Insert { record } => {
                let key = record
                    .get(table.primary_key())
                    .ok_or_else(|| CoreError::missing_primary_key(table.primary_key()))?;
                Ok(vec![key.to_string()])
            }
            Self::Update { key, updates } => {
                let mut keys = vec![key.clone()];
                // A primary-key update also touches the new identity.
                if let Some(new_key) = updates.get(table.primary_key()) {
                    if new_key != key {
                        keys.push(new_key.to_string());
                    }
                }
                Ok(keys)
            }
            Self::Delete { key } => Ok(vec![key.clone()]),
        }
    }
}

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Created; the operation has not run yet.
    Started,
    /// The operation ran successfully.
    Committed,
    /// The snapshot has been restored. Terminal.
    RolledBack,
}

/// An ephemeral all-or-nothing wrapper around one table mutation.
///
/// State machine: `Started → Committed → RolledBack`. `commit` is
/// legal only from `Started`; `rollback` is legal from `Started`
/// (abort before the operation ran) and from `Committed`
/// (caller-requested undo). Any other transition is a programming
/// error and returns [`CoreError::InvalidTransactionState`].
#[derive(Debug)]
pub struct Transaction<'t> {
    table: &'t Table,
    operation: TableOperation,
    snapshot: HashMap<String, Option<Record>>,
    state: TransactionState,
}

impl<'t> Transaction<'t> {
    /// Begins a transaction, deep-copying the current state of every
    /// record the operation will touch.
    pub fn begin(table: &'t Table, operation: TableOperation) -> CoreResult<Self> {
        let keys = operation.touched_keys(table)?;
        let snapshot = table.snapshot_records(&keys)?;
        Ok(Self {
            table,
            operation,
            snapshot,
            state: TransactionState::Started,
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Performs the wrapped table operation.
    ///
    /// The operation is all-or-nothing at the record-set level: on
    /// failure nothing visible has changed and the error is returned,
    /// with the transaction still in `Started`.
    pub fn commit(&mut self) -> CoreResult<()> {
        if self.state != TransactionState::Started {
            return Err(CoreError::invalid_transaction_state(format!(
                "commit from {:?}",
                self.state
            )));
        }

        match &self.operation {
            TableOperation::Insert { record } => self.table.insert(record.clone())?,
            TableOperation::Update { key, updates } => {
                self.table.update(key, updates.clone())?;
            }
            TableOperation::Delete { key } => self.table.delete(key)?,
        }

        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Restores every snapshotted record — in the record set, the
    /// indexes, and on disk — to its state as captured at begin time.
    pub fn rollback(&mut self) -> CoreResult<()> {
        if self.state == TransactionState::RolledBack {
            return Err(CoreError::invalid_transaction_state(
                "rollback of an already rolled back transaction",
            ));
        }

        self.table.restore_snapshot(&self.snapshot)?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }
}
