//! End-to-end queue processing tests
//!
//! These drive the real claim/validate/run/archive lifecycle against
//! temporary folders, with mock engine collaborators standing in for
//! papermill and nbconvert.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use nb_runner::context::RunnerContext;
use nb_runner::engine::{ExecutionRequest, HtmlRenderer, NotebookExecutor};
use nb_runner::errors::{ExecutionError, JobError, RenderError};
use nb_runner::jobs::output_path::PartitionGranularity;
use nb_runner::jobs::{NotebookJob, QueueWatcher};

/// Executed-notebook JSON, optionally carrying a truthy Findings scrap
fn executed_notebook_json(findings: bool) -> String {
    let outputs = if findings {
        serde_json::json!([
            {
                "output_type": "display_data",
                "data": {
                    "application/scrapbook.scrap.json+data": {
                        "name": "Findings",
                        "data": true,
                        "encoder": "json",
                        "version": 1
                    }
                }
            }
        ])
    } else {
        serde_json::json!([])
    };
    serde_json::json!({
        "cells": [ { "cell_type": "code", "outputs": outputs } ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    })
    .to_string()
}

/// Engine stand-in: writes an executed artifact, or fails on request
struct MockExecutor {
    attempts: AtomicUsize,
    fail_mode: Option<String>,
    findings: bool,
}

impl MockExecutor {
    fn new(findings: bool, fail_mode: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
            fail_mode: fail_mode.map(str::to_string),
            findings,
        })
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotebookExecutor for MockExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<(), ExecutionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mode = request
            .parameters
            .get("mode")
            .and_then(|value| value.as_str());
        if self.fail_mode.as_deref().is_some_and(|marker| mode == Some(marker)) {
            return Err(ExecutionError::Engine {
                code: Some(1),
                stderr: "kernel died".to_string(),
            });
        }
        std::fs::write(&request.output_path, executed_notebook_json(self.findings)).unwrap();
        Ok(())
    }
}

/// Renderer stand-in: writes a sibling `.html` file
struct MockRenderer;

#[async_trait]
impl HtmlRenderer for MockRenderer {
    async fn render(&self, notebook: &Path) -> Result<PathBuf, RenderError> {
        let html = notebook.with_extension("html");
        std::fs::write(&html, "<html></html>")?;
        Ok(html)
    }
}

fn test_context(root: &Path, executor: Arc<dyn NotebookExecutor>) -> Arc<RunnerContext> {
    let notebook_path = root.join("nb");
    let queue_path = root.join("queue");
    let output_path = root.join("output");
    let findings_path = root.join("findings");
    std::fs::create_dir_all(&notebook_path).unwrap();
    std::fs::create_dir_all(&queue_path).unwrap();
    std::fs::create_dir_all(&output_path).unwrap();
    std::fs::write(notebook_path.join("hunt.ipynb"), "{}").unwrap();

    Arc::new(RunnerContext {
        notebook_path,
        queue_path,
        output_path,
        findings_path,
        granularity: PartitionGranularity::from_code("d"),
        check_interval: Duration::from_millis(10),
        executor,
        renderer: Arc::new(MockRenderer),
    })
}

fn write_descriptor(queue: &Path, file_name: &str, host: &str, mode: &str) -> PathBuf {
    let path = queue.join(file_name);
    let body = format!(
        "papermill:\n  host: {host}\n  mode: {mode}\nexec:\n  notebook: hunt.ipynb\n  identifier: host\n"
    );
    std::fs::write(&path, body).unwrap();
    path
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn construction_claims_the_descriptor() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(false, None);
    let ctx = test_context(tmp.path(), executor);
    let descriptor = write_descriptor(&ctx.queue_path, "job.yaml", "srv01", "normal");

    let job = NotebookJob::new(ctx.clone(), &descriptor).await.unwrap();

    assert!(!descriptor.exists());
    let working = files_with_extension(&ctx.queue_path, "tmp");
    assert_eq!(working.len(), 1);
    assert_eq!(
        working[0].file_name().unwrap().to_str().unwrap(),
        format!("{}.tmp", job.job_id())
    );
}

#[tokio::test]
async fn successful_run_archives_descriptor_and_findings() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(true, None);
    let ctx = test_context(tmp.path(), executor.clone());
    let descriptor = write_descriptor(&ctx.queue_path, "job.yaml", "srv01", "normal");

    let mut job = NotebookJob::new(ctx.clone(), &descriptor).await.unwrap();
    job.run().await.unwrap();

    assert_eq!(executor.attempts(), 1);

    // Executed artifact lands in the day-partitioned output folder.
    let artifact = job.output_file_path();
    assert!(artifact.is_file());
    assert!(artifact.starts_with(&ctx.output_path));

    // The working file became a completed marker named after the output.
    let output_stem = job.output_notebook();
    let output_stem = output_stem.strip_suffix(".ipynb").unwrap();
    assert!(files_with_extension(&ctx.queue_path, "tmp").is_empty());
    let completed = files_with_extension(&ctx.queue_path, "job");
    assert_eq!(completed.len(), 1);
    assert_eq!(
        completed[0].file_name().unwrap().to_str().unwrap(),
        format!("{output_stem}.job")
    );

    // Findings copy and HTML render appear in the findings store.
    let copy = ctx.findings_path.join(job.output_notebook());
    assert!(copy.is_file());
    assert!(copy.with_extension("html").is_file());
}

#[tokio::test]
async fn failed_run_leaves_the_working_file() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(false, Some("explode"));
    let ctx = test_context(tmp.path(), executor);
    let descriptor = write_descriptor(&ctx.queue_path, "job.yaml", "srv01", "explode");

    let mut job = NotebookJob::new(ctx.clone(), &descriptor).await.unwrap();
    let err = job.run().await.unwrap_err();
    assert!(matches!(err, JobError::Execution(_)));

    // The claimed file stays behind as the durable failure record.
    let working = files_with_extension(&ctx.queue_path, "tmp");
    assert_eq!(working.len(), 1);
    assert_eq!(
        working[0].file_name().unwrap().to_str().unwrap(),
        format!("{}.tmp", job.job_id())
    );
    assert!(files_with_extension(&ctx.queue_path, "job").is_empty());
}

#[tokio::test]
async fn scrapless_notebook_produces_no_findings() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(false, None);
    let ctx = test_context(tmp.path(), executor);
    let descriptor = write_descriptor(&ctx.queue_path, "job.yaml", "srv01", "normal");

    let mut job = NotebookJob::new(ctx.clone(), &descriptor).await.unwrap();
    job.run().await.unwrap();

    // The findings store is never even created.
    assert!(!ctx.findings_path.exists());
    assert_eq!(files_with_extension(&ctx.queue_path, "job").len(), 1);
}

#[tokio::test]
async fn validation_failure_prevents_execution() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(false, None);
    let ctx = test_context(tmp.path(), executor.clone());
    let path = ctx.queue_path.join("job.yaml");
    std::fs::write(
        &path,
        "papermill: {}\nexec:\n  notebook: hunt.ipynb\n  identifier: host\n",
    )
    .unwrap();

    let err = NotebookJob::new(ctx.clone(), &path).await.unwrap_err();
    assert!(matches!(err, JobError::Validation(_)));
    assert_eq!(executor.attempts(), 0);

    // Rejected jobs stay claimed and visible for operator inspection.
    assert_eq!(files_with_extension(&ctx.queue_path, "tmp").len(), 1);
}

#[tokio::test]
async fn sweep_isolates_a_failing_job() {
    let tmp = TempDir::new().unwrap();
    let executor = MockExecutor::new(false, Some("explode"));
    let ctx = test_context(tmp.path(), executor.clone());
    write_descriptor(&ctx.queue_path, "a.yaml", "srv01", "normal");
    write_descriptor(&ctx.queue_path, "b.yaml", "srv02", "explode");
    write_descriptor(&ctx.queue_path, "c.yaml", "srv03", "normal");
    // Clutter the queue: wrong extension and a directory named like a
    // descriptor; both must be ignored.
    std::fs::write(ctx.queue_path.join("notes.txt"), "ignore me").unwrap();
    std::fs::create_dir(ctx.queue_path.join("fake.yaml")).unwrap();

    let watcher = QueueWatcher::new(ctx.clone());
    watcher.sweep().await;

    // All three were attempted; the failure did not stop the sweep.
    assert_eq!(executor.attempts(), 3);
    assert_eq!(files_with_extension(&ctx.queue_path, "job").len(), 2);
    assert_eq!(files_with_extension(&ctx.queue_path, "tmp").len(), 1);
    assert!(ctx.queue_path.join("notes.txt").is_file());
    assert!(ctx.queue_path.join("fake.yaml").is_dir());

    // A subsequent sweep finds an empty queue and attempts nothing new.
    watcher.sweep().await;
    assert_eq!(executor.attempts(), 3);
}
