//! soaper-dl - Locate movies and episodes on a streaming catalog and download them
//!
//! This library provides the link-resolution and selection pipeline: it
//! searches the catalog, lets the user pick a title (and, for series, the
//! episodes), resolves every pick to a media URL plus an optional subtitle URL
//! and turns the result into a strictly ordered download plan.

mod catalog;
mod config;
mod document;
mod listing_parser;
mod passkey;
mod planner;
mod resolver;
mod runner;
mod selection;
mod sequencer;

// Re-export error types
pub use catalog::{CatalogError, TransportError};
pub use document::DocumentError;
pub use listing_parser::ListingParseError;
pub use passkey::PasskeyError;
pub use resolver::ResolveError;
pub use runner::DownloadError;
pub use selection::SelectionError;
pub use sequencer::SequencerError;

// Re-export pipeline building blocks
pub use catalog::{Catalog, CatalogTransport, HttpTransport, absolute_url};
pub use config::{Config, DEFAULT_BASE_URI, DEFAULT_SUBTITLE_LANGUAGE, default_download_root};
pub use document::{Document, HtmlDocument};
pub use listing_parser::{
    EpisodeListing, Listing, SeasonNumber, parse_catalog, parse_episodes,
};
pub use passkey::{Passkey, extract_passkey};
pub use planner::{DownloadTask, ResolvedItem, TaskKind, plan_downloads};
pub use resolver::{MediaLinkResolver, ResolvedMedia, SOURCE_UNAVAILABLE_SENTINEL};
pub use runner::{Downloader, ExternalDownloader, FailedTask, RunReport, execute_plan};
pub use selection::{DialoguerUi, FzfUi, Selection, SelectionUi, SelectorType, selector};
pub use sequencer::{
    DEFAULT_SERIES_FOLDER, SequencedItem, episode_file_name, movie_file_name, prepare_destinations,
    sanitize_filename, sequence_episodes, series_folder_name,
};

use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Header shown when picking from search results
const SEARCH_HEADER: &str = "Search Results";

/// Header shown when picking from the new release list
const NEW_RELEASES_HEADER: &str = "New Releases";

/// Header shown when picking episodes
const EPISODES_HEADER: &str = "Choose episodes to download";

/// Progress event emitted while building and executing a plan
///
/// These events allow library users to report progress; the library itself
/// never prints.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Searching the catalog for a term
    Searching { term: String },

    /// No term given, fetching the new release list instead
    FetchingNewReleases,

    /// Catalog entries found
    ListingsFound { count: usize },

    /// Fetching the episode list of a series
    FetchingEpisodes { series: String },

    /// Episodes found on the series page
    EpisodesFound { count: usize },

    /// Resolving the media link of one item
    Resolving {
        index: usize,
        total: usize,
        label: String,
    },

    /// Resolving an item of a batch failed; the item is skipped
    ResolutionFailed { label: String, error: String },

    /// The download plan is complete
    PlanReady { task_count: usize, skipped: usize },

    /// A download task is starting
    DownloadStarted {
        index: usize,
        total: usize,
        kind: TaskKind,
        destination: PathBuf,
    },

    /// A download task failed; execution continues with the next one
    DownloadFailed { destination: PathBuf, error: String },
}

/// Top-level error type for soaper-dl operations
#[derive(Debug, Error)]
pub enum SoaperError {
    /// Nothing matched the search (or a series lists no episodes)
    #[error("Nothing found, try another search term")]
    EmptyResult,

    /// The user aborted a selection
    #[error("Selection canceled")]
    UserCanceled,

    /// A page link carries no passkey
    #[error(transparent)]
    MissingPasskey(PasskeyError),

    /// The resolution RPC refused to hand out a media source
    #[error("Cannot get video source for {page_link}: {value}")]
    SourceUnavailable { page_link: String, value: String },

    /// A request to the catalog host failed
    #[error("Network error: {0}")]
    NetworkFailure(#[from] TransportError),

    /// The resolution RPC answered with unexpected content
    #[error("Invalid response while resolving {page_link}: {message}")]
    InvalidResponse { page_link: String, message: String },

    /// The destination folder could not be created
    #[error("Filesystem error: {0}")]
    FilesystemFailure(#[from] SequencerError),

    /// A catalog page could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ListingParseError),

    /// The selection UI failed
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
}

impl SoaperError {
    /// Returns true for outcomes that end the run without being faults
    pub fn is_benign(&self) -> bool {
        matches!(self, SoaperError::EmptyResult | SoaperError::UserCanceled)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_benign() { 0 } else { 1 }
    }
}

impl From<ResolveError> for SoaperError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::MissingPasskey(e) => SoaperError::MissingPasskey(e),
            ResolveError::SourceUnavailable { page_link, value } => {
                SoaperError::SourceUnavailable { page_link, value }
            }
            ResolveError::Network(e) => SoaperError::NetworkFailure(e),
            ResolveError::InvalidResponse { page_link, message } => {
                SoaperError::InvalidResponse { page_link, message }
            }
        }
    }
}

impl From<CatalogError> for SoaperError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::Transport(e) => SoaperError::NetworkFailure(e),
            CatalogError::Parse(e) => SoaperError::Parse(e),
        }
    }
}

/// An item of a batch that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub label: String,
    pub reason: String,
}

/// The fully materialized download plan of one run
#[derive(Debug, Clone, Default)]
pub struct DownloadPlan {
    /// Tasks in execution order
    pub tasks: Vec<DownloadTask>,
    /// Batch items dropped because their resolution failed
    pub skipped: Vec<SkippedItem>,
}

/// Searches the catalog, asks the user to choose and builds the download plan
///
/// An empty `term` lists new releases instead of searching. Movies are
/// resolved on their own and any failure aborts the run. Series episodes are
/// resolved one at a time, oldest first; an episode that fails to resolve is
/// reported through [`ProgressEvent::ResolutionFailed`] and skipped.
///
/// Returns [`SoaperError::EmptyResult`] when nothing was found and
/// [`SoaperError::UserCanceled`] when a selection was aborted; both are
/// benign (see [`SoaperError::is_benign`]).
///
/// Building a plan never touches the filesystem. Call
/// [`prepare_destinations`] before executing it.
///
/// # Examples
///
/// ```no_run
/// use soaper_dl::{
///     Config, ExternalDownloader, HttpTransport, SelectorType, build_plan, execute_plan,
///     prepare_destinations, selector,
/// };
///
/// let config = Config::new("/home/me/Videos");
/// let ui = selector(SelectorType::Builtin);
/// let plan = build_plan("Dune", &config, HttpTransport::new(), &ui, |_| {}).unwrap();
/// prepare_destinations(&plan.tasks).unwrap();
/// let report = execute_plan(&plan.tasks, &ExternalDownloader::new(), |_| {});
/// println!("{} downloads completed", report.completed);
/// ```
pub fn build_plan<T, S, F>(
    term: &str,
    config: &Config,
    transport: T,
    selector: &S,
    mut progress_callback: F,
) -> Result<DownloadPlan, SoaperError>
where
    T: CatalogTransport,
    S: SelectionUi + ?Sized,
    F: FnMut(ProgressEvent),
{
    let term = term.trim();
    let catalog = Catalog::new(&transport, &config.base_uri);

    let (listings, header) = if term.is_empty() {
        progress_callback(ProgressEvent::FetchingNewReleases);
        (catalog.new_releases()?, NEW_RELEASES_HEADER)
    } else {
        progress_callback(ProgressEvent::Searching {
            term: term.to_string(),
        });
        (catalog.search(term)?, SEARCH_HEADER)
    };

    progress_callback(ProgressEvent::ListingsFound {
        count: listings.len(),
    });
    if listings.is_empty() {
        return Err(SoaperError::EmptyResult);
    }

    let candidates: Vec<String> = listings.iter().map(|l| l.label.clone()).collect();
    let listing = choose(selector, &listings, &candidates, header, false)?
        .into_iter()
        .next()
        .ok_or(SoaperError::UserCanceled)?;

    let resolver = MediaLinkResolver::new(&transport, config);

    let plan = if listing.is_series {
        plan_series(listing, config, &catalog, &resolver, selector, &mut progress_callback)?
    } else {
        plan_movie(listing, config, &resolver, &mut progress_callback)?
    };

    progress_callback(ProgressEvent::PlanReady {
        task_count: plan.tasks.len(),
        skipped: plan.skipped.len(),
    });

    Ok(plan)
}

/// Resolves a single movie; any failure is fatal
fn plan_movie<T, F>(
    movie: &Listing,
    config: &Config,
    resolver: &MediaLinkResolver<T>,
    progress_callback: &mut F,
) -> Result<DownloadPlan, SoaperError>
where
    T: CatalogTransport,
    F: FnMut(ProgressEvent),
{
    let item = sequencer::sequence_movie(movie, config);

    progress_callback(ProgressEvent::Resolving {
        index: 0,
        total: 1,
        label: item.label.clone(),
    });
    let media = resolver.resolve(&item.page_link, item.is_series)?;

    Ok(DownloadPlan {
        tasks: plan_downloads(&[ResolvedItem { item, media }], config),
        skipped: Vec::new(),
    })
}

/// Lets the user pick episodes and resolves them oldest first
fn plan_series<T, S, F>(
    series: &Listing,
    config: &Config,
    catalog: &Catalog<T>,
    resolver: &MediaLinkResolver<T>,
    selector: &S,
    progress_callback: &mut F,
) -> Result<DownloadPlan, SoaperError>
where
    T: CatalogTransport,
    S: SelectionUi + ?Sized,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::FetchingEpisodes {
        series: series.label.clone(),
    });
    let episodes = catalog.episodes(series)?;

    progress_callback(ProgressEvent::EpisodesFound {
        count: episodes.len(),
    });
    if episodes.is_empty() {
        return Err(SoaperError::EmptyResult);
    }

    let candidates: Vec<String> = episodes.iter().map(EpisodeListing::candidate_line).collect();
    let selected: Vec<EpisodeListing> =
        choose(selector, &episodes, &candidates, EPISODES_HEADER, true)?
            .into_iter()
            .cloned()
            .collect();

    let items = sequencer::sequence_series(series, selected, config);

    let total = items.len();
    let mut resolved = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        progress_callback(ProgressEvent::Resolving {
            index,
            total,
            label: item.label.clone(),
        });

        match resolver.resolve(&item.page_link, item.is_series) {
            Ok(media) => resolved.push(ResolvedItem { item, media }),
            Err(error) => {
                let label = &item.label;
                warn!(%label, %error, "skipping episode");
                progress_callback(ProgressEvent::ResolutionFailed {
                    label: item.label.clone(),
                    error: error.to_string(),
                });
                skipped.push(SkippedItem {
                    label: item.label,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(DownloadPlan {
        tasks: plan_downloads(&resolved, config),
        skipped,
    })
}

/// Runs a selection and maps the chosen indices back to items
///
/// Duplicate indices are ignored; an empty choice counts as cancellation.
fn choose<'a, S, I>(
    selector: &S,
    items: &'a [I],
    candidates: &[String],
    header: &str,
    multi: bool,
) -> Result<Vec<&'a I>, SoaperError>
where
    S: SelectionUi + ?Sized,
{
    let indices = match selector.choose(candidates, header, multi)? {
        Selection::Canceled => return Err(SoaperError::UserCanceled),
        Selection::Chosen(indices) => indices,
    };

    let mut seen = Vec::with_capacity(indices.len());
    for index in indices {
        if seen.contains(&index) {
            continue;
        }
        if index >= items.len() {
            return Err(SelectionError::InvalidOutput(format!(
                "index {} out of range for {} candidates",
                index,
                items.len()
            ))
            .into());
        }
        seen.push(index);
    }

    if seen.is_empty() {
        return Err(SoaperError::UserCanceled);
    }

    Ok(seen.into_iter().map(|index| &items[index]).collect())
}
