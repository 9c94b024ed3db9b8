//! Download planning
//!
//! Turns resolved, sequenced items into a flat list of [`DownloadTask`]s. The
//! plan is fully materialized before anything is downloaded, and its order is
//! the execution order: per item the subtitle comes right before the media,
//! and items keep the oldest-first order they were sequenced in.

use crate::catalog::absolute_url;
use crate::config::Config;
use crate::resolver::ResolvedMedia;
use crate::sequencer::{SequencedItem, sanitize_filename};
use std::fmt;
use std::path::PathBuf;

/// Extension of downloaded media files
pub const MEDIA_EXTENSION: &str = "mp4";

/// Extension of downloaded subtitle files
pub const SUBTITLE_EXTENSION: &str = "srt";

/// What a task downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Subtitle,
    Media,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Subtitle => write!(f, "subtitle"),
            TaskKind::Media => write!(f, "media"),
        }
    }
}

/// A single planned download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub kind: TaskKind,
    /// Absolute source URL
    pub source_url: String,
    /// Directory the file is written to
    pub destination_dir: PathBuf,
    /// File name including extension
    pub file_name: String,
}

impl DownloadTask {
    /// Full path of the file this task produces
    pub fn destination_path(&self) -> PathBuf {
        self.destination_dir.join(&self.file_name)
    }
}

/// A sequenced item together with its resolved links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub item: SequencedItem,
    pub media: ResolvedMedia,
}

/// Builds the ordered download plan for already sequenced items
///
/// `items` must already be in execution order; the planner never reorders.
pub fn plan_downloads(items: &[ResolvedItem], config: &Config) -> Vec<DownloadTask> {
    let mut tasks = Vec::with_capacity(items.len() * 2);
    let subtitle_suffix = subtitle_suffix(&config.subtitle_language);

    for resolved in items {
        let item = &resolved.item;

        if let Some(subtitle_url) = &resolved.media.subtitle_url {
            tasks.push(DownloadTask {
                kind: TaskKind::Subtitle,
                source_url: absolute_url(&config.base_uri, subtitle_url),
                destination_dir: item.destination_dir.clone(),
                file_name: format!("{}{}", item.file_name, subtitle_suffix),
            });
        }

        tasks.push(DownloadTask {
            kind: TaskKind::Media,
            source_url: absolute_url(&config.base_uri, &resolved.media.media_url),
            destination_dir: item.destination_dir.clone(),
            file_name: format!("{}.{}", item.file_name, MEDIA_EXTENSION),
        });
    }

    tasks
}

/// `.<lang>.srt`, or just `.srt` when nothing of the language survives sanitizing
fn subtitle_suffix(language: &str) -> String {
    let language = sanitize_filename(language);
    let language = language.trim();
    if language.is_empty() {
        format!(".{}", SUBTITLE_EXTENSION)
    } else {
        format!(".{}.{}", language, SUBTITLE_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(file_name: &str, subtitle: Option<&str>) -> ResolvedItem {
        ResolvedItem {
            item: SequencedItem {
                label: file_name.to_string(),
                page_link: format!("/episode_{}.html", file_name),
                is_series: true,
                file_name: file_name.to_string(),
                destination_dir: PathBuf::from("/videos/Show"),
            },
            media: ResolvedMedia {
                media_url: format!("/dl/{}.m3u8", file_name),
                subtitle_url: subtitle.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_subtitle_precedes_media_per_item() {
        let config = Config::new("/videos");
        let items = vec![
            resolved("Show_S01E01_A", Some("/s/1.srt")),
            resolved("Show_S01E02_B", None),
            resolved("Show_S02E01_C", Some("https://subs.example/3.srt")),
        ];

        let plan = plan_downloads(&items, &config);
        let summary: Vec<(TaskKind, &str)> = plan
            .iter()
            .map(|t| (t.kind, t.file_name.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (TaskKind::Subtitle, "Show_S01E01_A.en.srt"),
                (TaskKind::Media, "Show_S01E01_A.mp4"),
                (TaskKind::Media, "Show_S01E02_B.mp4"),
                (TaskKind::Subtitle, "Show_S02E01_C.en.srt"),
                (TaskKind::Media, "Show_S02E01_C.mp4"),
            ]
        );
    }

    #[test]
    fn test_urls_are_resolved_against_host() {
        let config = Config::new("/videos");
        let plan = plan_downloads(
            &[resolved("Show_S01E01_A", Some("https://subs.example/1.srt"))],
            &config,
        );

        assert_eq!(plan[0].source_url, "https://subs.example/1.srt");
        assert_eq!(plan[1].source_url, "https://soaper.tv/dl/Show_S01E01_A.m3u8");
        assert_eq!(
            plan[1].destination_path(),
            PathBuf::from("/videos/Show/Show_S01E01_A.mp4")
        );
    }

    #[test]
    fn test_subtitle_extension_follows_language() {
        let config = Config::new("/videos").with_subtitle_language("de");
        let plan = plan_downloads(&[resolved("Film_1999", Some("/s/de.srt"))], &config);
        assert_eq!(plan[0].file_name, "Film_1999.de.srt");
    }

    #[test]
    fn test_subtitle_language_cannot_escape_destination() {
        let config = Config::new("/videos").with_subtitle_language("en/../../etc");
        let plan = plan_downloads(&[resolved("Film_1999", Some("/s/en.srt"))], &config);
        assert_eq!(plan[0].file_name, "Film_1999.en....etc.srt");
        assert_eq!(
            plan[0].destination_path(),
            PathBuf::from("/videos/Show/Film_1999.en....etc.srt")
        );

        let config = Config::new("/videos").with_subtitle_language("");
        let plan = plan_downloads(&[resolved("Film_1999", Some("/s/en.srt"))], &config);
        assert_eq!(plan[0].file_name, "Film_1999.srt");
    }

    #[test]
    fn test_empty_plan() {
        assert!(plan_downloads(&[], &Config::new("/videos")).is_empty());
    }
}
