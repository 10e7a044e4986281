//! Command dispatch: bridges CLI args -> engine operations -> output formatting.

pub mod bindings;
pub mod config_cmd;
pub mod connections;
pub mod courts;
pub mod run;
pub mod util;
pub mod value;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

use self::util::Context;

/// Dispatch a command that needs the loaded configuration.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(ctx, args, global).await,
        Command::Connections(args) => connections::handle(ctx, args, global).await,
        Command::Bindings(args) => bindings::handle(ctx, args, global).await,
        Command::Value(args) => value::handle(ctx, args, global).await,
        Command::Courts(args) => courts::handle(ctx, args, global).await,
        // Handled before the config is loaded
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are dispatched directly".into(),
        )),
    }
}
