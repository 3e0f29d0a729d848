//! `id8` entry point.

use clap::Parser;
use id8_cli::{Cli, Command, config_handlers, logging, stack_handlers};
use id8_core::{ConfigManager, Id8Config};

fn load_config(path: Option<&str>) -> anyhow::Result<Id8Config> {
    let config = Id8Config::load(path)?;
    logging::init(&config.logging.filter);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands must work on a file that does not load cleanly yet.
        Command::Config { action } => {
            logging::init("warn");
            config_handlers::handle_config_command(cli.config.as_deref(), action)?;
        }
        Command::Serve { host, port } => {
            let config = load_config(cli.config.as_deref())?;
            id8_cli::serve(config, host, port).await?;
        }
        Command::Stack { action } => {
            let config = load_config(cli.config.as_deref())?;
            stack_handlers::handle_stack_command(&config, action).await?;
        }
    }
    Ok(())
}
