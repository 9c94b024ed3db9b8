//! Downloader backed by external command line tools
//!
//! Media streams are handed to `yt-dlp`, subtitle files to `curl`. Both run
//! in the foreground with inherited stdio so their own progress output stays
//! visible.

use super::{DownloadError, Downloader};
use std::io;
use std::path::Path;
use std::process::Command;

/// Default media downloader executable
const MEDIA_TOOL: &str = "yt-dlp";

/// Default subtitle downloader executable
const SUBTITLE_TOOL: &str = "curl";

/// [`Downloader`] that spawns `yt-dlp` and `curl`
pub struct ExternalDownloader {
    media_tool: String,
    subtitle_tool: String,
}

impl ExternalDownloader {
    /// Creates a downloader using `yt-dlp` and `curl` from `PATH`
    pub fn new() -> Self {
        Self::with_tools(MEDIA_TOOL, SUBTITLE_TOOL)
    }

    /// Creates a downloader using the given executables
    pub fn with_tools(media_tool: &str, subtitle_tool: &str) -> Self {
        Self {
            media_tool: media_tool.to_string(),
            subtitle_tool: subtitle_tool.to_string(),
        }
    }

    /// Runs a prepared command and waits for it to exit
    fn run(tool: &str, command: &mut Command) -> Result<(), DownloadError> {
        let status = command.status().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DownloadError::ToolNotFound(tool.to_string()),
            _ => DownloadError::SpawnFailed {
                tool: tool.to_string(),
                message: e.to_string(),
            },
        })?;

        if !status.success() {
            return Err(DownloadError::ToolFailed {
                tool: tool.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

impl Default for ExternalDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for ExternalDownloader {
    fn download_media(&self, url: &str, directory: &Path, file_name: &str) -> Result<(), DownloadError> {
        Self::run(
            &self.media_tool,
            Command::new(&self.media_tool)
                .arg("--quiet")
                .arg("--paths")
                .arg(directory)
                .arg("--output")
                .arg(file_name)
                .arg(url),
        )
    }

    fn download_subtitle(
        &self,
        url: &str,
        directory: &Path,
        file_name: &str,
    ) -> Result<(), DownloadError> {
        Self::run(
            &self.subtitle_tool,
            Command::new(&self.subtitle_tool)
                .arg("--silent")
                .arg("--show-error")
                .arg("--fail")
                .arg("--location")
                .arg("--output")
                .arg(directory.join(file_name))
                .arg(url),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let downloader = ExternalDownloader::with_tools(
            "soaper-dl-no-such-media-tool",
            "soaper-dl-no-such-subtitle-tool",
        );
        let result = downloader.download_media("https://x/a.m3u8", Path::new("/tmp"), "a.mp4");
        assert!(matches!(result, Err(DownloadError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_checked() {
        let downloader = ExternalDownloader::with_tools("true", "false");
        assert!(
            downloader
                .download_media("https://x/a.m3u8", Path::new("/tmp"), "a.mp4")
                .is_ok()
        );

        let result = downloader.download_subtitle("https://x/a.srt", Path::new("/tmp"), "a.srt");
        assert!(matches!(
            result,
            Err(DownloadError::ToolFailed { code: Some(1), .. })
        ));
    }
}
