//! Renderer integration tests against fake athenapdf scripts.
//!
//! Each test writes a small shell script standing in for the renderer and
//! runs real child processes through `AthenaConverter`.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use weaver_core::{
    converter::{
        AthenaConverter, ConversionRequest, ConversionSource, Converter, RenderOptions,
        RendererConfig, StagedUpload,
    },
    queue::{ErrorKind, JobError, PoolConfig, WorkerPool},
};

fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    path
}

fn converter_for(script: &Path, extra: &str) -> AthenaConverter {
    let command = format!("sh {} {}", script.display(), extra);
    AthenaConverter::new(RendererConfig::with_command(command.trim()).with_kill_grace_ms(200))
}

#[tokio::test]
async fn test_renders_pdf_from_stdout() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "render.sh", r#"printf '%%PDF-1.4 %s' "$*""#);
    let converter = converter_for(&script, "");

    let request = ConversionRequest::from_url("https://example.com")
        .with_options(RenderOptions::default().aggressive().with_page_size("A4"));
    let output = converter
        .convert(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        output.as_pdf().unwrap(),
        b"%PDF-1.4 https://example.com -A -P A4"
    );
}

#[tokio::test]
async fn test_failed_render_reports_stderr_in_diagnostics_only() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "fail.sh",
        "echo 'net::ERR_NAME_NOT_RESOLVED' >&2\nexit 2",
    );
    let pool = WorkerPool::start(PoolConfig::new(1, 1), converter_for(&script, ""));

    let err = pool
        .submit_with_default_timeout(ConversionRequest::from_url("https://nope.invalid"))
        .unwrap()
        .wait()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProcessFailed);
    assert!(err.diagnostics().contains("net::ERR_NAME_NOT_RESOLVED"));
    assert!(!err.kind().public_message().contains("ERR_NAME"));
    assert!(err.is_reportable());

    pool.shutdown().await;
}

#[tokio::test]
async fn test_missing_renderer_is_launch_failure() {
    let converter = AthenaConverter::new(RendererConfig::with_command("/nonexistent/athenapdf -S"));
    let pool = WorkerPool::start(PoolConfig::new(1, 1), converter);

    let err = pool
        .submit_with_default_timeout(ConversionRequest::from_url("https://example.com"))
        .unwrap()
        .wait()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LaunchFailed);
    assert_eq!(err.kind().status_code(), 500);

    pool.shutdown().await;
}

#[tokio::test]
async fn test_empty_output_is_failure() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "silent.sh", "exit 0");
    let pool = WorkerPool::start(PoolConfig::new(1, 0), converter_for(&script, ""));

    let err = pool
        .submit_with_default_timeout(ConversionRequest::from_url("https://example.com"))
        .unwrap()
        .wait()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessFailed);

    pool.shutdown().await;
}

#[tokio::test]
async fn test_staged_upload_rendered_from_file_and_removed() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "cat.sh", r#"cat "${1#file://}""#);
    let pool = WorkerPool::start(PoolConfig::new(1, 1), converter_for(&script, ""));

    let upload =
        StagedUpload::stage(&dir.path().join("staging"), b"<h1>report</h1>", "html").unwrap();
    let staged_path = upload.path().to_path_buf();
    let request = ConversionRequest::new(ConversionSource::staged(upload));

    let output = pool
        .submit_with_default_timeout(request)
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(output.as_pdf().unwrap(), b"<h1>report</h1>");

    pool.shutdown().await;
    assert!(!staged_path.exists());
}

/// Whether `pid` still names a live (non-zombie) process.
#[cfg(target_os = "linux")]
fn is_alive(pid: i32) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .map(|rest| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timeout_kills_renderer_and_helpers() {
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("pids");
    let script = write_script(
        &dir,
        "hang.sh",
        "sleep 30 &\necho \"$$ $!\" > \"$1\"\nwait",
    );
    let pool = WorkerPool::start(
        PoolConfig::new(1, 1),
        converter_for(&script, &pidfile.display().to_string()),
    );

    let started = std::time::Instant::now();
    let result = pool
        .submit(
            ConversionRequest::from_url("https://slow.example.com"),
            Duration::from_millis(500),
        )
        .unwrap()
        .wait()
        .await;
    assert!(matches!(result, Err(JobError::TimedOut { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));

    let pids: Vec<i32> = fs::read_to_string(&pidfile)
        .unwrap()
        .split_whitespace()
        .map(|p| p.parse().unwrap())
        .collect();
    assert_eq!(pids.len(), 2);

    // The orphaned helper may take a moment to be reaped.
    for _ in 0..50 {
        if pids.iter().all(|pid| !is_alive(*pid)) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    for pid in &pids {
        assert!(!is_alive(*pid), "process {} survived the timeout", pid);
    }

    pool.shutdown().await;
}
