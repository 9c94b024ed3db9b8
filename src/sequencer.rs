use crate::config::Config;
use crate::listing_parser::{EpisodeListing, Listing, normalize_whitespace};
use crate::planner::DownloadTask;
use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;

/// Folder used for a series whose title yields no usable name
pub const DEFAULT_SERIES_FOLDER: &str = "Unknown_Series";

/// Characters stripped from every derived file or folder name
const STRIPPED_CHARS: &[char] = &['/', '\\', '*', '?', '<', '>', '|', '\'', '[', ']', '(', ')'];

/// Errors that can occur while sequencing a selection
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The destination directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    FilesystemFailure { path: PathBuf, source: io::Error },
}

/// A selected item with its final name and destination, ready to be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedItem {
    /// Short human readable label used in progress output
    pub label: String,
    /// Detail page link, relative to the catalog host
    pub page_link: String,
    /// Whether the episode variant of the resolution RPC applies
    pub is_series: bool,
    /// File name without extension
    pub file_name: String,
    /// Directory the files are written to
    pub destination_dir: PathBuf,
}

/// Removes characters that are illegal or troublesome in file names
///
/// Strips `/ \ * ? < > | ' [ ] ( )` and the platform path separator. Spaces
/// are preserved.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !STRIPPED_CHARS.contains(c) && *c != MAIN_SEPARATOR)
        .collect()
}

/// Sanitizes a name and joins its words with `_`
fn file_stem(raw: &str) -> String {
    normalize_whitespace(&sanitize_filename(raw))
}

/// File name of a movie: `<title>_<year>`
pub fn movie_file_name(movie: &Listing) -> String {
    file_stem(&format!("{}_{}", movie.title, movie.year))
}

/// File name of an episode: `<series>_<S01E02>_<episode name>`
pub fn episode_file_name(series_name: &str, episode: &EpisodeListing) -> String {
    file_stem(&format!(
        "{}_{}_{}",
        series_name,
        episode.label(),
        episode.episode_name
    ))
}

/// Folder name shared by all episodes of a series
pub fn series_folder_name(series: &Listing) -> String {
    let name = file_stem(&series.title);
    if name.trim_matches(|c: char| c == '_' || c == '.').is_empty() {
        DEFAULT_SERIES_FOLDER.to_string()
    } else {
        name
    }
}

/// Orders selected episodes oldest first, independent of selection order
pub fn sequence_episodes(mut selected: Vec<EpisodeListing>) -> Vec<EpisodeListing> {
    selected.sort_by_key(EpisodeListing::sort_key);
    selected
}

/// Creates `path` and its parents; an existing directory is not an error
pub fn ensure_directory(path: &Path) -> Result<(), SequencerError> {
    fs::create_dir_all(path).map_err(|e| SequencerError::FilesystemFailure {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Sequences a movie: written straight into the download root
pub fn sequence_movie(movie: &Listing, config: &Config) -> SequencedItem {
    SequencedItem {
        label: movie.label.clone(),
        page_link: movie.page_link.clone(),
        is_series: movie.is_series,
        file_name: movie_file_name(movie),
        destination_dir: config.download_root().to_path_buf(),
    }
}

/// Sequences a batch of episodes of one series
///
/// Episodes are ordered oldest first and all go into one series folder below
/// the download root. The folder is only created once the plan is executed
/// (see [`prepare_destinations`]).
pub fn sequence_series(
    series: &Listing,
    selected: Vec<EpisodeListing>,
    config: &Config,
) -> Vec<SequencedItem> {
    let folder_name = series_folder_name(series);
    let destination_dir = config.download_root().join(&folder_name);

    sequence_episodes(selected)
        .into_iter()
        .map(|episode| SequencedItem {
            label: episode.label(),
            file_name: episode_file_name(&folder_name, &episode),
            page_link: episode.page_link,
            is_series: true,
            destination_dir: destination_dir.clone(),
        })
        .collect()
}

/// Creates every destination directory a plan writes into
///
/// Must run before the first task executes; the subtitle fetch does not create
/// missing directories.
pub fn prepare_destinations(plan: &[DownloadTask]) -> Result<(), SequencerError> {
    let mut created: Vec<&Path> = Vec::new();
    for task in plan {
        let dir = task.destination_dir.as_path();
        if created.contains(&dir) {
            continue;
        }
        ensure_directory(dir)?;
        created.push(dir);
    }
    Ok(())
}
