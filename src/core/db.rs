use crate::core::audit::EventSink;
use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use crate::core::store::LedgerStore;
use crate::plugins::index::RecordIndex;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub fn db_connect(db_path: &str) -> Result<Connection, error::LedgerError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::LedgerError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::LedgerError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::LedgerError::RusqliteError)?;
    conn.execute(schemas::LEDGER_DB_SCHEMA, [])
        .map_err(error::LedgerError::RusqliteError)?;
    Ok(conn)
}

/// Creates the ledger database and seeds an empty record index.
///
/// Safe to run repeatedly: an existing index is left as it is.
pub fn initialize_ledger_db(
    db_path: &Path,
    sink: &dyn EventSink,
) -> Result<bool, error::LedgerError> {
    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).map_err(error::LedgerError::IoError)?;
    }

    let broker = DbBroker::new(sink);
    broker.with_ledger(db_path, "lifeledger", "ledger.init", |ledger| {
        if ledger.get_state(schemas::MEMBER_INDEX_KEY)?.is_some() {
            return Ok(false);
        }
        RecordIndex::default().store(ledger)?;
        Ok(true)
    })
}
