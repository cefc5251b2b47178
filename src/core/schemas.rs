//! Centralized storage layout for the lifeledger store.
//!
//! Everything lives in one SQLite database used as a flat key-value ledger.
//! Member records are keyed by their identifier; the record index sits under
//! a single reserved key that can never collide with a valid identifier.

/// Directory (relative to the project root) holding all ledger state.
pub const STORE_DIR_NAME: &str = ".lifeledger";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const LEDGER_DB_NAME: &str = "ledger.db";

pub const AUDIT_LOG_NAME: &str = "ledger.events.jsonl";

pub const LEDGER_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ledger_state (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        updated_at TEXT NOT NULL
    )
";

/// Reserved key for the append-only list of every member id ever created.
pub const MEMBER_INDEX_KEY: &str = "member_index";
