mod cli;
mod commands;

use clap::Parser;
use cli::{init_logging, Cli, Command};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.log_filter.as_deref());

    match cli.command {
        Command::Serve {
            bind,
            upload_dir,
            output_dir,
        } => {
            let config = commands::load(&cli.config).await?;
            commands::serve(config, bind, upload_dir, output_dir).await
        }
        Command::Convert { input, output_dir } => {
            let config = commands::load(&cli.config).await?;
            commands::convert(config, input, output_dir).await
        }
        Command::Inspect { filename, json } => commands::inspect(&filename, json),
    }
}
