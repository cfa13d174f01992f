//! The command-line front end.

pub mod args;
pub mod commands;
pub mod output;

use anyhow::Result;

pub use args::{Cli, Command};
use commands::CommandContext;

use crate::config::settings;
use crate::core::{CancellationToken, CoreError};

/// Runs one CLI invocation. Ctrl-C cancels the running operation.
pub async fn run(cli: Cli) -> Result<()> {
    let config = settings::load_config(cli.config.as_deref())?;
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling...");
            interrupt.cancel();
        }
    });

    let mut ctx = CommandContext {
        config,
        config_path: cli.config,
        cancel,
    };
    match cli.command {
        Command::Pack(args) => commands::pack(&mut ctx, args).await,
        Command::Structure(args) => commands::structure(&mut ctx, args).await,
        Command::Search(args) => commands::search(&mut ctx, args).await,
        Command::Filters(args) => commands::filters(&ctx, args),
    }
}

/// 2 when a single file did not fit into a part, 1 for anything else.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    let too_large = error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<CoreError>(), Some(CoreError::FileTooLarge { .. })));
    if too_large {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn file_too_large_maps_to_two() {
        let err: anyhow::Error = CoreError::FileTooLarge {
            path: "a.cs".into(),
            size: 10,
            limit: 5,
        }
        .into();
        assert_eq!(exit_code(&err), 2);

        let wrapped = Err::<(), _>(CoreError::FileTooLarge {
            path: "a.cs".into(),
            size: 10,
            limit: 5,
        })
        .context("packing failed")
        .unwrap_err();
        assert_eq!(exit_code(&wrapped), 2);
    }

    #[test]
    fn other_errors_map_to_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
        assert_eq!(exit_code(&CoreError::Cancelled.into()), 1);
    }
}
