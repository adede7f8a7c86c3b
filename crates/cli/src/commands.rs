//! Subcommand implementations.

use bk_core::config::loader::{load_config, validate};
use bk_core::engine::{PipelineEngine, PipelineRequest};
use bk_core::product::parse_iso_filename;
use bk_core::service::{sanitize_filename, ImageService};
use bk_core::state::registry::RunHandle;
use bk_core::tools::preflight::missing_tools;
use bk_core::tools::ProcessToolInvoker;
use bk_protocol::config_models::ServiceConfig;
use bk_protocol::product_models::ProductVersionInfo;
use bk_protocol::run_models::PipelineResult;
use bk_protocol::step_models::{StepKey, StepRecord, StepStatus};
use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How often `convert` polls the run for stage changes.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

pub async fn load(path: &Path) -> Result<ServiceConfig> {
    load_config(path)
        .await
        .wrap_err_with(|| format!("Failed to load {}", path.display()))
}

pub async fn serve(
    mut config: ServiceConfig,
    bind: Option<String>,
    upload_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(dir) = upload_dir {
        config.upload_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    validate(&config).map_err(|reason| eyre!("Invalid configuration: {reason}"))?;
    warn_missing_tools(&config);

    let service = Arc::new(ImageService::with_process_tools(config));
    bk_server::run_server(service, shutdown_signal()).await?;
    Ok(())
}

pub async fn convert(
    mut config: ServiceConfig,
    input: PathBuf,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    validate(&config).map_err(|reason| eyre!("Invalid configuration: {reason}"))?;
    if !input.is_file() {
        return Err(eyre!("{} is not a file", input.display()));
    }
    warn_missing_tools(&config);

    let source_name = input
        .file_name()
        .map(|name| sanitize_filename(&name.to_string_lossy()))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| eyre!("{} has no usable file name", input.display()))?;

    let invoker = ProcessToolInvoker::new()
        .with_timeout(config.tools.timeout_secs.map(Duration::from_secs));
    let engine = PipelineEngine::new(Arc::new(invoker), &config);
    let request = PipelineRequest {
        input_path: input,
        source_name,
        output_dir: config.output_dir.clone(),
    };

    let run = RunHandle::detached();
    let pipeline = {
        let run = run.clone();
        tokio::spawn(async move { engine.run(&run, &request).await })
    };

    let mut printed: Vec<StepRecord> = Vec::new();
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    while !pipeline.is_finished() {
        ticker.tick().await;
        print_changes(&run.steps().await, &mut printed);
    }
    let result = pipeline.await.wrap_err("Pipeline task failed")?;
    print_changes(&run.steps().await, &mut printed);

    match result {
        PipelineResult::Success { output_path } => {
            println!(
                "\n{} {}",
                "Bootable image:".green().bold(),
                output_path.display()
            );
            Ok(())
        }
        PipelineResult::Failure { error } => Err(eyre!(error)),
    }
}

pub fn inspect(filename: &str, json: bool) -> Result<()> {
    let name = Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let info = parse_iso_filename(&name);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    match info {
        Some(info) => print_product(&info),
        None => println!("{} {}", "Unrecognized file name:".yellow(), name),
    }
    Ok(())
}

fn print_product(info: &ProductVersionInfo) {
    println!("{:<10} {}", "Product:".bold(), info.product);
    println!("{:<10} {}", "Code:".bold(), info.code);
    println!("{:<10} {}", "Version:".bold(), info.version_string);
    println!("{:<10} {}", "Build:".bold(), info.full_version);
    if info.is_ga() {
        println!("{:<10} {}", "Release:".bold(), "GA".green());
    } else if let Some(su) = info.su {
        println!("{:<10} {}", "Release:".bold(), format!("SU{su}").cyan());
    }
}

/// Print every record that differs from what was printed before.
fn print_changes(current: &[StepRecord], printed: &mut Vec<StepRecord>) {
    for record in current {
        if record.key == StepKey::Upload || record.status == StepStatus::Pending {
            continue;
        }
        if printed.contains(record) {
            continue;
        }
        println!("{}", format_record(record));
        printed.retain(|seen| seen.key != record.key);
        printed.push(record.clone());
    }
}

fn format_record(record: &StepRecord) -> String {
    let status = match record.status {
        StepStatus::Pending => "pending".dimmed(),
        StepStatus::InProgress => "running".yellow(),
        StepStatus::Completed => "done".green(),
        StepStatus::Error => "error".red().bold(),
    };
    format!(
        "{:<11} {:<8} {}",
        record.key.as_str().to_uppercase(),
        status,
        record.message
    )
}

fn warn_missing_tools(config: &ServiceConfig) {
    for tool in missing_tools(&config.tools) {
        warn!("required tool not found on PATH: {tool}");
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
