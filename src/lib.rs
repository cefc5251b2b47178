//! lifeledger: a custody-gated lifecycle ledger for member health records.
//!
//! Each member record follows one person from conception to death. At any
//! moment exactly one named party holds it, and only that party may move it
//! along the lifecycle or edit its details. Who may do what is decided by the
//! caller's institutional affiliation (guardian, birth registrar, health
//! provider, illness provider, death registrar).
//!
//! # Architecture
//!
//! ## The Thin Waist
//!
//! Every invocation runs inside one `DbBroker::with_ledger` call:
//! - one immediate SQLite transaction, committed only on success
//! - audit logging (`ledger.events.jsonl`)
//!
//! ## Layers
//!
//! - [`core`]: ledger store, broker, identity, config, audit, envelopes
//! - [`plugins`]: member records, lifecycle transitions, field updates,
//!   the record index and the named-operation dispatcher
//!
//! # Examples
//!
//! ```bash
//! lifeledger init
//! lifeledger --user alice --role parents invoke create_member AB1234567
//! lifeledger --user alice --role parents invoke custody_handoff bob AB1234567
//! lifeledger --user alice --role parents query get_members
//! ```

pub mod core;
pub mod plugins;

mod cli;

use crate::core::{
    audit::{JsonlSink, TracingSink},
    broker::DbBroker,
    config, db, envelope,
    error::LedgerError,
    identity::{EnvIdentity, IdentityProvider},
    schemas,
    store::Store,
};
use crate::plugins::operations::{self, Operation, OperationKind, Surface};
use clap::Parser;
use cli::{Cli, Command, OperationCli};
use std::fs;
use std::path::PathBuf;

pub fn run() -> Result<(), LedgerError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init { dir } => init_store(dir),
        Command::Invoke(op) => run_operation(Surface::Invoke, op, cli.user, cli.role),
        Command::Query(op) => run_operation(Surface::Query, op, cli.user, cli.role),
    }
}

fn init_store(dir: Option<PathBuf>) -> Result<(), LedgerError> {
    let target_dir = match dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };
    let root = target_dir.join(schemas::STORE_DIR_NAME);
    fs::create_dir_all(&root).map_err(LedgerError::IoError)?;
    let store = Store { root };

    let config_created = config::write_default_config(&store.root)?;
    let cfg = config::load_config(&store.root)?;
    let sink = (
        JsonlSink::new(&store.file(&cfg.ledger.audit_log)),
        TracingSink,
    );
    let index_created = db::initialize_ledger_db(&store.file(&cfg.ledger.db_name), &sink)?;

    tracing::info!(
        root = %store.root.display(),
        config_created,
        index_created,
        "store initialized"
    );
    print_json(&envelope::command_envelope(
        "init",
        "ok",
        serde_json::json!({
            "store": store.root.display().to_string(),
            "config_created": config_created,
            "index_created": index_created,
        }),
    ));
    Ok(())
}

fn run_operation(
    surface: Surface,
    request: OperationCli,
    user: Option<String>,
    role: Option<String>,
) -> Result<(), LedgerError> {
    let cmd = format!("{}.{}", surface.as_str(), request.function);
    let result = execute_request(surface, &request, user, role);

    match result {
        Ok(output) => {
            print_json(&envelope::command_envelope(
                &cmd,
                "ok",
                serde_json::json!({ "result": output }),
            ));
            Ok(())
        }
        Err(e) => {
            let mut out = envelope::error_envelope(&cmd, &e);
            if OperationKind::from_name(&request.function) == Some(OperationKind::IsUnique)
                && let Some(obj) = out.as_object_mut()
            {
                obj.insert("result".to_string(), serde_json::json!({ "unique": false }));
            }
            print_json(&out);
            Err(e)
        }
    }
}

fn execute_request(
    surface: Surface,
    request: &OperationCli,
    user: Option<String>,
    role: Option<String>,
) -> Result<operations::OperationOutput, LedgerError> {
    let op = Operation::parse(surface, &request.function, &request.args)?;

    let current_dir = std::env::current_dir()?;
    let store = Store::discover(&current_dir)?;
    let cfg = config::load_config(&store.root)?;

    let identity = EnvIdentity {
        user_override: user,
        role_override: role,
        default_user: cfg.identity.user.clone(),
        default_role: cfg.identity.role.clone(),
    };
    let caller = identity.caller()?;

    let sink = (
        JsonlSink::new(&store.file(&cfg.ledger.audit_log)),
        TracingSink,
    );
    let broker = DbBroker::new(&sink);
    broker.with_ledger(
        &store.file(&cfg.ledger.db_name),
        &caller.name,
        op.name(),
        |ledger| operations::execute(&op, ledger, &caller, &sink),
    )
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(body) => println!("{}", body),
        Err(e) => tracing::error!(error = %e, "failed to render envelope"),
    }
}
