//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use id8_stack::DEFAULT_STACK_NAME;

/// ID8 marketplace services.
#[derive(Parser, Debug)]
#[command(name = "id8", version)]
#[command(about = "ID8 marketplace: API server, configuration and stack builder", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ID8_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Build and manage your stack
    Stack {
        #[command(subcommand)]
        action: StackAction,
    },
}

/// `id8 config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,
    /// Print one value by dotted key (e.g. `server.port`)
    Get { key: String },
    /// Set one value by dotted key in the config file
    Set { key: String, value: String },
    /// Write a default config file
    Init {
        /// Where to write (defaults to the platform config dir)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration as ID8_* environment variables
    Export {
        /// Format as `--env KEY=VALUE` for docker run
        #[arg(long)]
        docker_env: bool,
    },
}

/// `id8 stack` subcommands.
#[derive(Subcommand, Debug)]
pub enum StackAction {
    /// Add a catalog item by slug
    Add { slug: String },
    /// Remove an item by id
    Remove { id: String },
    /// Add the item if absent, remove it if present
    Toggle { slug: String },
    /// List the active stack
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show per-type and per-category counts
    Stats,
    /// Print or write the active stack in the exchange format
    Export {
        /// Stack name recorded in the export
        #[arg(long, default_value = DEFAULT_STACK_NAME)]
        name: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the active stack with an exported file
    Import { file: PathBuf },
    /// Save the active stack under a name
    Save { name: String },
    /// Make a saved stack active
    Load { name: String },
    /// Delete a saved stack
    Delete { name: String },
    /// List saved stacks
    Saved,
    /// Empty the active stack
    Clear,
}
