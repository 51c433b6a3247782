//! Command handlers and dispatch.

pub mod config_cmd;
pub mod hosts;
pub mod watch;

use netpresence_core::RouterSource;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Route a router-facing command to its handler.
///
/// `Config` and `Completions` never reach here; they need no router.
pub async fn dispatch(
    cmd: Command,
    resolved: Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Hosts(args) => {
            let source = RouterSource::new(&resolved.router)?;
            hosts::handle(&source, &args, global).await
        }
        Command::Watch(args) => watch::handle(resolved, &args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a router connection".into(),
        )),
    }
}
