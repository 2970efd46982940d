//! # lookout-cli
//!
//! Lookout command-line interface.
//!
//! Keeps the alert channel integrations declared in a TOML manifest in
//! sync with the remote service:
//! - `apply` creates or replaces every declared channel
//! - `refresh` re-reads tracked integrations and drops deleted ones
//! - `destroy` deletes one tracked integration
//! - `import` adopts an existing integration
//! - `show` prints local state with secrets redacted
//!
//! Managed integrations are tracked in a JSON state file keyed by
//! `<kind>.<name>`, saved after every resource.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;

use lookout_channels::{AlertChannelApi, Reconciler};

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod state;

pub use cli::{Cli, Commands, Format, KindArg, LogFormat};
pub use error::{CliError, Result};
pub use manifest::Manifest;
pub use output::OutputFormat;
pub use state::{StateStore, StoredResource};

use commands::{ApplyCommand, DestroyCommand, ImportCommand, RefreshCommand, ShowCommand};

/// Runs `cli.command` against `reconciler`, writing output to `out`.
///
/// # Errors
///
/// Returns the first manifest, state, reconciliation or output error.
pub async fn run<A, W>(cli: &Cli, reconciler: &Reconciler<A>, out: &mut W) -> Result<()>
where
    A: AlertChannelApi,
    W: Write,
{
    let format = OutputFormat::new(cli.format);
    let mut store = StateStore::open(&cli.state)?;

    match &cli.command {
        Commands::Apply => {
            let manifest = Manifest::from_file(&cli.manifest)?;
            let cmd = ApplyCommand::new(reconciler);
            cmd.execute(out, &format, &manifest, &mut store).await
        }
        Commands::Refresh => {
            let cmd = RefreshCommand::new(reconciler);
            cmd.execute(out, &format, &mut store).await
        }
        Commands::Destroy { key } => {
            let cmd = DestroyCommand::new(reconciler);
            cmd.execute(out, &format, &mut store, key).await
        }
        Commands::Import { kind, id } => {
            let cmd = ImportCommand::new(reconciler);
            cmd.execute(out, &format, &mut store, (*kind).into(), id).await
        }
        Commands::Show => ShowCommand::new().execute(out, &format, &store),
    }
}

/// Runs a command that needs no remote service.
///
/// # Errors
///
/// Returns an error if the state cannot be read or output fails.
pub fn run_local<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let format = OutputFormat::new(cli.format);
    let store = StateStore::open(&cli.state)?;
    ShowCommand::new().execute(out, &format, &store)
}
