//! E2E tests for pipeline execution.
//!
//! These tests drive the engine against a scripted toolchain that touches
//! the file system the way the real utilities do, and verify:
//! - Stage records and messages of successful runs
//! - Output naming from the marker file and from the upload name
//! - Fatal failures, pending stages and temp directory removal
//! - Isolation of concurrent runs

mod common;

use bk_core::engine::{PipelineEngine, PipelineRequest};
use bk_core::state::registry::RunRegistry;
use bk_core::tools::{ScriptedResponse, ScriptedToolInvoker};
use bk_protocol::run_models::PipelineResult;
use bk_protocol::step_models::{StepKey, StepStatus};
use common::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn request(env: &TestEnv, source_name: &str) -> PipelineRequest {
    PipelineRequest {
        input_path: env.upload_dir().join("0123abcd_input.iso"),
        source_name: source_name.to_string(),
        output_dir: env.output_dir().to_path_buf(),
    }
}

/// A GA image named by its marker converts end to end.
#[tokio::test]
async fn test_ga_image_with_marker() {
    let env = TestEnv::new();
    let engine = PipelineEngine::new(
        Arc::new(toolchain_with_marker("UCSInstall_UCOS_14.0.1.10000.iso\n")),
        &env.config,
    );
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    let result = engine.run(&run, &request(&env, "input.iso")).await;

    assert!(result.is_success(), "{result:?}");
    let output = env.output_dir().join("Bootable_UCSInstall_UCOS_14.0.1.10000.iso");
    assert!(output.is_file());

    let steps = run.steps().await;
    assert_statuses(
        &steps,
        &[
            (StepKey::Upload, StepStatus::Pending),
            (StepKey::Setup, StepStatus::Completed),
            (StepKey::Extract, StepStatus::Completed),
            (StepKey::Copy, StepStatus::Completed),
            (StepKey::Analyze, StepStatus::Completed),
            (StepKey::Bootloader, StepStatus::Completed),
            (StepKey::Generate, StepStatus::Completed),
            (StepKey::Cleanup, StepStatus::Completed),
            (StepKey::Complete, StepStatus::Completed),
        ],
    );
    assert_eq!(
        step(&steps, StepKey::Analyze).message,
        "Product detected: Cisco Unified Communications Manager (UCOS) - 14.0.1 (GA)"
    );
    assert_eq!(
        step(&steps, StepKey::Bootloader).message,
        "Bootloader files copied; boot catalog will be generated"
    );
    assert_eq!(
        step(&steps, StepKey::Generate).message,
        "ISO generated successfully: Bootable_UCSInstall_UCOS_14.0.1.10000.iso"
    );
    assert_eq!(
        step(&steps, StepKey::Complete).message,
        "Processing completed successfully!"
    );

    let info = run.product_info_response().await;
    let product = info.product_info.expect("product info recorded");
    assert_eq!(product.code, "UCOS");
    assert_eq!(product.version_string, "14.0.1 (GA)");
    assert!(!info.has_unrst_warning);

    assert!(env.leftover_temp_dirs().is_empty());
}

/// Without a marker the upload name is used, even when unrecognized.
#[tokio::test]
async fn test_unrecognized_name_still_converts() {
    let env = TestEnv::new();
    let engine = PipelineEngine::new(Arc::new(toolchain_with(&[])), &env.config);
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    let result = engine.run(&run, &request(&env, "randomfile.iso")).await;

    assert_eq!(
        result,
        PipelineResult::Success {
            output_path: std::path::absolute(env.output_dir().join("Bootable_randomfile.iso"))
                .unwrap()
        }
    );
    assert!(run.product_info_response().await.product_info.is_none());
}

/// A marker with an unparseable name is reported as unrecognized.
#[tokio::test]
async fn test_unrestricted_marker_sets_warning() {
    let env = TestEnv::new();
    let engine = PipelineEngine::new(
        Arc::new(toolchain_with_marker("Bootable_UNRESTRICTED_build.iso")),
        &env.config,
    );
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    engine.run(&run, &request(&env, "input.iso")).await;

    let steps = run.steps().await;
    assert_eq!(
        step(&steps, StepKey::Analyze).message,
        "Product analysis completed (unrecognized format: Bootable_UNRESTRICTED_build.iso)"
    );
    let info = run.product_info_response().await;
    assert!(info.product_info.is_none());
    assert!(info.has_unrst_warning);
}

/// A service-update image parsed from the upload name.
#[tokio::test]
async fn test_service_update_from_upload_name() {
    let env = TestEnv::new();
    let engine = PipelineEngine::new(Arc::new(toolchain_with(&[])), &env.config);
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    engine
        .run(&run, &request(&env, "PCD_CUC_12.5.1.13900-1.iso"))
        .await;

    let steps = run.steps().await;
    assert_eq!(
        step(&steps, StepKey::Analyze).message,
        "Product detected from filename: Cisco Unity Connection (CUC) - 12.5.1 (SU3)"
    );
    let product = run
        .product_info_response()
        .await
        .product_info
        .expect("product info recorded");
    assert_eq!(product.su, Some(3));
    assert!(env.output_dir().join("Bootable_PCD_CUC_12.5.1.13900-1.iso").is_file());
}

/// No boot-loader directory: failure at bootloader, no output produced.
#[tokio::test]
async fn test_missing_boot_dir() {
    let env = TestEnv::new();
    let invoker = toolchain_without_boot_dir();
    let engine = PipelineEngine::new(Arc::new(invoker.clone()), &env.config);
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    let result = engine.run(&run, &request(&env, "randomfile.iso")).await;

    assert_eq!(
        result.error(),
        Some("Could not find isolinux folder in extracted ISO")
    );
    let steps = run.steps().await;
    assert_statuses(
        &steps,
        &[
            (StepKey::Analyze, StepStatus::Completed),
            (StepKey::Bootloader, StepStatus::Error),
            (StepKey::Generate, StepStatus::Pending),
            (StepKey::Cleanup, StepStatus::Completed),
            (StepKey::Complete, StepStatus::Error),
        ],
    );
    assert!(!env.output_dir().join("Bootable_randomfile.iso").exists());
    assert_eq!(invoker.programs_called(), vec!["7z", "rsync"]);
    assert!(env.leftover_temp_dirs().is_empty());
}

/// Extraction failure skips every later work stage and removes both temp
/// directories.
#[tokio::test]
async fn test_extraction_failure_removes_temp_dirs() {
    let env = TestEnv::new();
    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let seen_by_tool = Arc::clone(&seen);
    let invoker = ScriptedToolInvoker::new().on(
        "7z",
        ScriptedResponse::exit(2, "ERROR: Can not open the file as archive").with_effect(
            move |request| {
                let dest = request
                    .args
                    .iter()
                    .find_map(|arg| arg.strip_prefix("-o"))
                    .map(PathBuf::from);
                *seen_by_tool.lock().unwrap() = dest;
                Ok(())
            },
        ),
    );
    let engine = PipelineEngine::new(Arc::new(invoker), &env.config);
    let registry = RunRegistry::new(8);
    let run = registry.begin_run(None).await;

    let result = engine.run(&run, &request(&env, "input.iso")).await;

    assert_eq!(
        result.error(),
        Some("Failed to extract ISO using 7zip: ERROR: Can not open the file as archive")
    );
    let steps = run.steps().await;
    assert_statuses(
        &steps,
        &[
            (StepKey::Setup, StepStatus::Completed),
            (StepKey::Extract, StepStatus::Error),
            (StepKey::Copy, StepStatus::Pending),
            (StepKey::Analyze, StepStatus::Pending),
            (StepKey::Bootloader, StepStatus::Pending),
            (StepKey::Generate, StepStatus::Pending),
            (StepKey::Cleanup, StepStatus::Completed),
            (StepKey::Complete, StepStatus::Error),
        ],
    );

    let mount = seen.lock().unwrap().clone().expect("extractor was invoked");
    assert!(!mount.exists());
    assert!(env.leftover_temp_dirs().is_empty());
}

/// Two runs in parallel keep disjoint records.
#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let env = TestEnv::new();
    let registry = RunRegistry::new(8);

    let good = Arc::new(PipelineEngine::new(
        Arc::new(toolchain_with_marker("UCSInstall_UCOS_14.0.1.10000.iso")),
        &env.config,
    ));
    let broken = Arc::new(PipelineEngine::new(
        Arc::new(toolchain_without_boot_dir()),
        &env.config,
    ));
    let first = registry.begin_run(None).await;
    let second = registry.begin_run(None).await;

    let first_request = request(&env, "a.iso");
    let second_request = request(&env, "b.iso");

    let (a, b) = tokio::join!(
        good.run(&first, &first_request),
        broken.run(&second, &second_request),
    );

    assert!(a.is_success());
    assert!(!b.is_success());
    assert_all_completed(
        &first
            .steps()
            .await
            .into_iter()
            .filter(|record| record.key != StepKey::Upload)
            .collect::<Vec<_>>(),
    );
    let second_steps = second.steps().await;
    assert_eq!(step(&second_steps, StepKey::Bootloader).status, StepStatus::Error);
    assert!(first.product_info_response().await.product_info.is_some());
    assert!(second.product_info_response().await.product_info.is_none());

    let latest = registry.latest_snapshot().await.expect("runs exist");
    assert_eq!(latest.run_id, second.id());
    assert!(env.leftover_temp_dirs().is_empty());
}
