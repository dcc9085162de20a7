use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tessera: component lifecycle kernel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Kernel settings file (.json, .toml or .yaml). Defaults to ./tessera.toml when present
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Configuration store directory, overriding the settings file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out an empty configuration directory
    New {
        /// Directory to create
        dir: PathBuf,
        /// Configuration id, `name/version`
        id: String,
        /// Parent configuration id
        #[arg(long)]
        parent: Option<String>,
        /// Classpath entry relative to the configuration directory (repeatable)
        #[arg(long = "classpath")]
        classpath: Vec<PathBuf>,
        /// Dependency artifact, `group/name/version/type` (repeatable)
        #[arg(long = "dependency")]
        dependencies: Vec<String>,
    },
    /// Pack a configuration directory into an archive
    Pack {
        /// Directory holding META-INF/configuration.json
        dir: PathBuf,
        /// Archive to write
        out: PathBuf,
    },
    /// Install an archive into the store
    Install {
        archive: PathBuf,
    },
    /// Remove a configuration from the store
    Uninstall {
        id: String,
    },
    /// List installed configurations
    List {},
    /// Load and start configurations, report their members, then stop them
    Start {
        /// Configuration ids; defaults to the settings file's start list
        ids: Vec<String>,
    },
}
