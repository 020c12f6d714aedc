//! Command execution.

mod bundle;
mod inspect;
mod resolve_key;

use crate::cli::{Args, Command};
use crate::error::Result;

pub use bundle::{BundleOptions, execute_bundle};
pub use inspect::execute_inspect;
pub use resolve_key::execute_resolve_key;

/// Execute the command and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    match args.command {
        Command::Bundle {
            manifest,
            targets,
            dest,
            release,
            stubs,
            admin,
            publish,
            verbose,
        } => {
            execute_bundle(BundleOptions {
                manifest,
                targets,
                dest,
                release,
                stubs,
                admin,
                publish,
                verbose,
            })
            .await
        }
        Command::Inspect { launcher } => execute_inspect(&launcher).await,
        Command::ResolveKey { developer_id, ca_id } => {
            execute_resolve_key(developer_id, ca_id).await
        }
    }
}
