//! Catalog and episode listing parser
//!
//! Turns fetched catalog pages (search results, new releases) into [`Listing`]s
//! and series detail pages into [`EpisodeListing`]s.

use crate::catalog::absolute_url;
use crate::document::{Document, DocumentError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

/// One result block on a catalog or search page
const CATALOG_ENTRY: &str = "div.thumbnail.text-center";
const CATALOG_YEAR: &str = ".img-group > div";
const CATALOG_TITLE: &str = "h5";
const CATALOG_LINK: &str = "h5 > a";

/// One season block on a series detail page
const SEASON_BLOCK: &str = ".alert-info-ex";
const SEASON_HEADING: &str = "h3, h4, strong";
const EPISODE_LINK: &str = "a";

/// Joining character used when collapsing whitespace in titles and names
pub const JOIN_CHAR: char = '_';

static SEASON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)season\s*(?P<season>\d+)").expect("season pattern is valid")
});

/// Errors that can occur while parsing a listing page
#[derive(Debug, Error)]
pub enum ListingParseError {
    /// The page could not be queried
    #[error("Failed to query page: {0}")]
    Document(#[from] DocumentError),
}

/// A browsable catalog entry (movie or series)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Human readable candidate line, e.g. `[2021] Dune`
    pub label: String,
    /// Release year or date as shown on the page
    pub year: String,
    /// Title with whitespace collapsed into [`JOIN_CHAR`]
    pub title: String,
    /// Link to the detail page, relative to the catalog host
    pub page_link: String,
    /// Whether the entry is a series (detail page lists episodes)
    pub is_series: bool,
}

impl Listing {
    /// Creates a listing from the raw fields found on a catalog page
    pub fn new(year: &str, raw_title: &str, page_link: &str) -> Self {
        let year = year.trim().to_string();
        let title = normalize_whitespace(raw_title);
        let display_title = if title.is_empty() {
            "(untitled)".to_string()
        } else {
            title.replace(JOIN_CHAR, " ")
        };

        Self {
            label: format!("[{}] {}", year, display_title),
            year,
            title,
            page_link: page_link.trim().to_string(),
            is_series: is_series_link(page_link),
        }
    }

    /// Returns true if the page provided no title for this entry
    pub fn is_untitled(&self) -> bool {
        self.title.is_empty()
    }

    /// Resolves the detail page link against the catalog host
    pub fn absolute_link(&self, base_uri: &str) -> String {
        absolute_url(base_uri, &self.page_link)
    }
}

/// Season number of an episode
///
/// Pages occasionally omit the season heading. Such episodes are kept and
/// grouped under [`SeasonNumber::Unknown`], which orders after every known
/// season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeasonNumber {
    Known(u32),
    Unknown,
}

impl fmt::Display for SeasonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonNumber::Known(n) => write!(f, "{:02}", n),
            SeasonNumber::Unknown => write!(f, "xx"),
        }
    }
}

/// One episode of a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeListing {
    pub season: SeasonNumber,
    pub episode_number: u32,
    /// Episode title with whitespace collapsed into [`JOIN_CHAR`]
    pub episode_name: String,
    /// Link to the episode page, relative to the catalog host
    pub page_link: String,
}

impl EpisodeListing {
    /// Zero-padded label such as `S01E05`
    ///
    /// For seasons and episodes below 100 the lexicographic order of labels
    /// equals the chronological order.
    pub fn label(&self) -> String {
        format!("S{}E{:02}", self.season, self.episode_number)
    }

    /// Candidate line shown in the selection UI
    pub fn candidate_line(&self) -> String {
        format!("[{}] {}", self.label(), self.episode_name.replace(JOIN_CHAR, " "))
    }

    /// Chronological ordering key
    pub fn sort_key(&self) -> (SeasonNumber, u32) {
        (self.season, self.episode_number)
    }
}

/// Collapses every whitespace run into a single [`JOIN_CHAR`]
///
/// Leading and trailing whitespace is dropped, so a blank title becomes an
/// empty string.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(JOIN_CHAR.to_string().as_str())
}

/// Returns true if a detail page link points at a series or one of its episodes
pub fn is_series_link(link: &str) -> bool {
    link.contains("/tv_") || link.contains("/episode")
}

/// Parses a catalog page (search results or new releases)
///
/// An empty vector means the page contained no entries; that is a normal
/// outcome, not an error. Entries without a link cannot be resolved and are
/// skipped.
pub fn parse_catalog<D: Document>(document: &D) -> Result<Vec<Listing>, ListingParseError> {
    let mut listings = Vec::new();

    for (index, entry) in document.find_all(CATALOG_ENTRY)?.into_iter().enumerate() {
        let year = first_text(document, entry, CATALOG_YEAR)?.unwrap_or_default();
        let title = first_text(document, entry, CATALOG_TITLE)?.unwrap_or_default();

        let href = document
            .find_within(entry, CATALOG_LINK)?
            .into_iter()
            .find_map(|link| document.attr(link, "href"))
            .filter(|href| !href.trim().is_empty());

        let Some(href) = href else {
            let title = title.trim();
            warn!(index, %title, "skipping catalog entry without a link");
            continue;
        };

        let listing = Listing::new(&year, &title, &href);
        if listing.is_untitled() {
            let page_link = &listing.page_link;
            warn!(index, %page_link, "catalog entry has an empty title");
        }
        listings.push(listing);
    }

    Ok(listings)
}

/// Parses the episode list of a series detail page
///
/// The page shows the newest season first and the newest episode first
/// within each season, so both levels are walked in reverse to produce an
/// oldest-first list.
pub fn parse_episodes<D: Document>(document: &D) -> Result<Vec<EpisodeListing>, ListingParseError> {
    let mut episodes = Vec::new();

    for block in document.find_all(SEASON_BLOCK)?.into_iter().rev() {
        let heading = match first_text(document, block, SEASON_HEADING)? {
            Some(text) => text,
            None => document.text(block),
        };
        let season = parse_season_number(&heading);

        let links = document.find_within(block, EPISODE_LINK)?;
        let mut position = 0;
        for link in links.into_iter().rev() {
            let Some(href) = document.attr(link, "href").filter(|h| !h.trim().is_empty()) else {
                warn!(%season, "skipping episode anchor without a link");
                continue;
            };
            position += 1;

            let (episode_number, episode_name) =
                split_episode_text(&document.text(link), position);

            episodes.push(EpisodeListing {
                season,
                episode_number,
                episode_name,
                page_link: href.trim().to_string(),
            });
        }
    }

    Ok(episodes)
}

/// Extracts the season number from a season block heading
fn parse_season_number(heading: &str) -> SeasonNumber {
    SEASON_PATTERN
        .captures(heading)
        .and_then(|caps| caps.name("season"))
        .and_then(|m| m.as_str().parse().ok())
        .map(SeasonNumber::Known)
        .unwrap_or(SeasonNumber::Unknown)
}

/// Splits anchor text like `3.The Name` into episode number and name
///
/// Falls back to `position` when the text carries no leading number.
fn split_episode_text(text: &str, position: u32) -> (u32, String) {
    let text = text.trim();
    match text.split_once('.') {
        Some((number, name)) => match number.trim().parse() {
            Ok(number) => (number, normalize_whitespace(name)),
            Err(_) => (position, normalize_whitespace(text)),
        },
        None => (position, normalize_whitespace(text)),
    }
}

fn first_text<'a, D: Document>(
    document: &'a D,
    scope: D::Element<'a>,
    selector: &str,
) -> Result<Option<String>, ListingParseError> {
    Ok(document
        .find_within(scope, selector)?
        .into_iter()
        .next()
        .map(|element| document.text(element)))
}
