//! Command-line definition and logging setup.

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "bootkit", version, about = "Turn installer images into bootable images")]
pub struct Cli {
    /// Path to the TOML configuration file; missing file means defaults
    #[arg(long, global = true, default_value = "bootkit.toml")]
    pub config: PathBuf,

    /// env_logger-style filter string (e.g. "info,bk_core=debug"); overrides RUST_LOG/defaults
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address, e.g. 0.0.0.0:5000
        #[arg(long)]
        bind: Option<String>,

        /// Directory uploads are stored in while processed
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Directory produced images are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Convert one local image and report each stage
    Convert {
        /// The image to convert
        input: PathBuf,

        /// Directory the produced image is written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Decode the product and version encoded in an image file name
    Inspect {
        /// File name to decode, e.g. UCSInstall_UCOS_14.0.1.10000.iso
        filename: String,

        /// Print the decoded metadata as JSON
        #[arg(long)]
        json: bool,
    },
}

pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn init_logging(cli_filter: Option<&str>) {
    let env = Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(filter) = cli_filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp_secs();
    builder.format(|buf, record| {
        let ts = buf.timestamp();
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            ts,
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();
}
