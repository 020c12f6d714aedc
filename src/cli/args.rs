//! Command line argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Native launcher bundler for JVM applications
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_launcher",
    version,
    about = "Native launcher bundler for JVM applications",
    long_about = "Builds Linux, Windows and macOS launchers, webOS directories and JNLP descriptors
from an application manifest.

Usage:
  kodegen_bundler_launcher bundle app.toml --stubs stubs/
  kodegen_bundler_launcher bundle app.toml --target linux --target win-installer
  kodegen_bundler_launcher inspect dist/linux-x64/Demo
  kodegen_bundler_launcher resolve-key --developer-id acme-dev"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle an application for one or more targets
    Bundle {
        /// Application manifest (TOML)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Target to build (repeatable; `all` for every launcher target)
        #[arg(short, long = "target", value_name = "TARGET")]
        targets: Vec<String>,

        /// Destination directory (default: `dist` next to the manifest)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Release directory (default: `release` next to the manifest)
        #[arg(long, value_name = "DIR")]
        release: Option<PathBuf>,

        /// Directory holding prebuilt launcher stubs
        #[arg(long, value_name = "DIR")]
        stubs: Option<PathBuf>,

        /// Produce launchers that request elevated privileges
        #[arg(long)]
        admin: bool,

        /// Publish release files into this directory after bundling
        #[arg(long, value_name = "DIR")]
        publish: Option<PathBuf>,

        /// Increase step logging
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Print the metadata document appended to a launcher
    Inspect {
        /// Launcher file
        #[arg(value_name = "LAUNCHER")]
        launcher: PathBuf,
    },

    /// Resolve a signing credential through the default backend chain
    ResolveKey {
        /// Developer identity (overrides KODEGEN_DEVELOPER_ID)
        #[arg(long)]
        developer_id: Option<String>,

        /// Certificate authority identity (overrides KODEGEN_CA_ID)
        #[arg(long)]
        ca_id: Option<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
