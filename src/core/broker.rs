use crate::core::audit::{AuditEvent, EventSink, Level};
use crate::core::db;
use crate::core::error;
use crate::core::store::SqliteLedger;
use rusqlite::TransactionBehavior;
use std::path::Path;

/// The DB Broker is the single gate through which an invocation touches the ledger.
///
/// Each call opens an immediate transaction, hands the closure a ledger view
/// over it, and commits only if the closure succeeds. Writes from a failed
/// invocation never land. Contending writers queue on the SQLite write lock
/// (or fail with a busy error) instead of interleaving.
pub struct DbBroker<'s> {
    sink: &'s dyn EventSink,
}

impl<'s> DbBroker<'s> {
    pub fn new(sink: &'s dyn EventSink) -> Self {
        Self { sink }
    }

    /// Execute a closure inside one atomic ledger transaction.
    pub fn with_ledger<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::LedgerError>
    where
        F: FnOnce(&mut SqliteLedger<'_>) -> Result<R, error::LedgerError>,
    {
        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mut conn = db::db_connect(&db_path.to_string_lossy())?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ledger = SqliteLedger::new(tx);

        let result = match f(&mut ledger) {
            Ok(value) => ledger.commit().map(|_| value),
            Err(e) => keep_invocation_error(e, ledger.rollback(), op_name),
        };

        let event = match &result {
            Ok(_) => AuditEvent::new(Level::Debug, actor, op_name, "committed"),
            Err(e) => AuditEvent::new(Level::Debug, actor, op_name, "rolled_back")
                .with_detail(e.kind()),
        };
        self.sink.emit(event.with_target(&db_id));

        result
    }
}

/// The invocation's own error wins over a failed rollback, which is only logged.
/// SQLite discards the open transaction when the connection drops either way.
fn keep_invocation_error<R>(
    err: error::LedgerError,
    rollback: Result<(), error::LedgerError>,
    op_name: &str,
) -> Result<R, error::LedgerError> {
    if let Err(rollback_err) = rollback {
        tracing::error!(op = op_name, error = %rollback_err, "rollback failed");
    }
    Err(err)
}
