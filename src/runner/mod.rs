//! Sequential plan execution
//!
//! The external downloader does not serialize concurrent invocations writing
//! to the same place, so tasks are executed strictly one after another: a
//! task finishes (successfully or not) before the next one starts.

mod external;

pub use external::ExternalDownloader;

use crate::ProgressEvent;
use crate::planner::{DownloadTask, TaskKind};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors reported by a downloader for a single task
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The external tool is not installed
    #[error("{0} not found. Please install it first.")]
    ToolNotFound(String),

    /// The external tool could not be started
    #[error("Failed to run {tool}: {message}")]
    SpawnFailed { tool: String, message: String },

    /// The external tool exited unsuccessfully
    #[error("{tool} failed with exit code {code:?}")]
    ToolFailed { tool: String, code: Option<i32> },
}

/// Transfers media and subtitle files
///
/// Both calls block until the transfer is finished.
pub trait Downloader {
    /// Downloads a media stream into `directory/file_name`
    fn download_media(&self, url: &str, directory: &Path, file_name: &str)
    -> Result<(), DownloadError>;

    /// Downloads a subtitle file into `directory/file_name`
    fn download_subtitle(
        &self,
        url: &str,
        directory: &Path,
        file_name: &str,
    ) -> Result<(), DownloadError>;
}

/// A task that did not complete
#[derive(Debug)]
pub struct FailedTask {
    pub task: DownloadTask,
    pub error: DownloadError,
}

/// Outcome of executing a plan
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of tasks that completed successfully
    pub completed: usize,
    /// Tasks that failed, in execution order
    pub failed: Vec<FailedTask>,
}

/// Executes a plan in order, one task at a time
///
/// A failing task is recorded and execution continues with the next task.
pub fn execute_plan<D, F>(plan: &[DownloadTask], downloader: &D, mut progress_callback: F) -> RunReport
where
    D: Downloader + ?Sized,
    F: FnMut(ProgressEvent),
{
    let mut report = RunReport::default();
    let total = plan.len();

    for (index, task) in plan.iter().enumerate() {
        progress_callback(ProgressEvent::DownloadStarted {
            index,
            total,
            kind: task.kind,
            destination: task.destination_path(),
        });

        let result = match task.kind {
            TaskKind::Subtitle => {
                downloader.download_subtitle(&task.source_url, &task.destination_dir, &task.file_name)
            }
            TaskKind::Media => {
                downloader.download_media(&task.source_url, &task.destination_dir, &task.file_name)
            }
        };

        match result {
            Ok(()) => report.completed += 1,
            Err(error) => {
                warn!(file = %task.file_name, %error, "download failed");
                progress_callback(ProgressEvent::DownloadFailed {
                    destination: task.destination_path(),
                    error: error.to_string(),
                });
                report.failed.push(FailedTask {
                    task: task.clone(),
                    error,
                });
            }
        }
    }

    report
}
