//! CLI struct definitions for the lifeledger command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "lifeledger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Custody-gated lifecycle ledger for member health records.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Caller name (overrides LIFELEDGER_USER and [identity].user).
    #[clap(long, global = true)]
    pub user: Option<String>,
    /// Caller role (overrides LIFELEDGER_ROLE and [identity].role).
    #[clap(long, global = true)]
    pub role: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create `.lifeledger/` with a default config and an empty ledger
    Init {
        /// Directory to initialize (defaults to current working directory).
        #[clap(short, long)]
        dir: Option<PathBuf>,
    },
    /// Run a mutating operation
    Invoke(OperationCli),
    /// Run a read-only operation
    Query(OperationCli),
    /// Print the lifeledger version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct OperationCli {
    /// Operation name, e.g. `create_member` or `get_members`.
    pub function: String,
    /// Positional arguments; the member id always comes last.
    #[clap(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
