//! Catalog site access
//!
//! This module defines the narrow HTTP capability the pipeline needs from the
//! catalog host ([`CatalogTransport`]) and the page-level operations built on
//! top of it: searching, listing new releases and listing a series' episodes.

mod http;

pub use http::HttpTransport;

use crate::document::HtmlDocument;
use crate::listing_parser::{
    EpisodeListing, Listing, ListingParseError, parse_catalog, parse_episodes,
};
use thiserror::Error;
use tracing::debug;

/// Search endpoint, takes a `keyword` query parameter
const SEARCH_PATH: &str = "/search.html";

/// Listing of recently added movies
const NEW_RELEASES_PATH: &str = "/movielist/";

/// Errors raised by a transport while talking to the catalog host
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status
    #[error("Request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Errors that can occur while fetching and parsing catalog pages
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ListingParseError),
}

/// Minimal HTTP capability required from the catalog host
///
/// Implementations perform exactly one request per call and never retry.
pub trait CatalogTransport {
    /// Fetches an HTML page with the given query parameters
    fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError>;

    /// Posts a form-encoded body with the given `Referer` and returns the response body
    fn post_form(
        &self,
        url: &str,
        referer: &str,
        form: &[(&str, &str)],
    ) -> Result<String, TransportError>;
}

impl<T: CatalogTransport + ?Sized> CatalogTransport for &T {
    fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        (**self).get_html(url, query)
    }

    fn post_form(
        &self,
        url: &str,
        referer: &str,
        form: &[(&str, &str)],
    ) -> Result<String, TransportError> {
        (**self).post_form(url, referer, form)
    }
}

/// Resolves a possibly relative link against the catalog host
///
/// Absolute http(s) links are returned unchanged; site-relative links are
/// appended to `base_uri` verbatim, which keeps the result identical to the
/// `Referer` the site expects.
pub fn absolute_url(base_uri: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }

    let base = base_uri.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}

/// Page-level operations against the catalog host
pub struct Catalog<T: CatalogTransport> {
    transport: T,
    base_uri: String,
}

impl<T: CatalogTransport> Catalog<T> {
    /// Creates a catalog client for the given host
    pub fn new(transport: T, base_uri: &str) -> Self {
        Self {
            transport,
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    /// Searches the catalog for `term`
    ///
    /// An empty result is returned as an empty vector.
    pub fn search(&self, term: &str) -> Result<Vec<Listing>, CatalogError> {
        let url = format!("{}{}", self.base_uri, SEARCH_PATH);
        debug!(%url, term, "searching catalog");

        let html = self.transport.get_html(&url, &[("keyword", term)])?;
        Ok(parse_catalog(&HtmlDocument::parse(&html))?)
    }

    /// Lists the most recently added titles
    pub fn new_releases(&self) -> Result<Vec<Listing>, CatalogError> {
        let url = format!("{}{}", self.base_uri, NEW_RELEASES_PATH);
        debug!(%url, "fetching new releases");

        let html = self.transport.get_html(&url, &[])?;
        Ok(parse_catalog(&HtmlDocument::parse(&html))?)
    }

    /// Lists all episodes of a series, oldest first
    pub fn episodes(&self, series: &Listing) -> Result<Vec<EpisodeListing>, CatalogError> {
        let url = series.absolute_link(&self.base_uri);
        debug!(%url, "fetching episode list");

        let html = self.transport.get_html(&url, &[])?;
        Ok(parse_episodes(&HtmlDocument::parse(&html))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serves canned pages and records every requested URL
    struct CannedPages {
        body: String,
        requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl CannedPages {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl CatalogTransport for CannedPages {
        fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
            self.requests.borrow_mut().push((
                url.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
            Ok(self.body.clone())
        }

        fn post_form(&self, url: &str, _: &str, _: &[(&str, &str)]) -> Result<String, TransportError> {
            Err(TransportError::Status {
                url: url.to_string(),
                status: 405,
            })
        }
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://soaper.tv", "/movie_a.html"),
            "https://soaper.tv/movie_a.html"
        );
        assert_eq!(
            absolute_url("https://soaper.tv/", "movie_a.html"),
            "https://soaper.tv/movie_a.html"
        );
        assert_eq!(
            absolute_url("https://soaper.tv", "https://cdn.example/a.m3u8"),
            "https://cdn.example/a.m3u8"
        );
    }

    #[test]
    fn test_search_sends_keyword() {
        let pages = CannedPages::new(
            r#"<div class="thumbnail text-center"><h5><a href="/movie_x1.html">Dune</a></h5></div>"#,
        );
        let catalog = Catalog::new(&pages, "https://soaper.tv/");

        let listings = catalog.search("Dune Part Two").unwrap();
        assert_eq!(listings.len(), 1);

        let requests = pages.requests.borrow();
        assert_eq!(requests[0].0, "https://soaper.tv/search.html");
        assert_eq!(
            requests[0].1,
            vec![("keyword".to_string(), "Dune Part Two".to_string())]
        );
    }

    #[test]
    fn test_new_releases_and_episode_urls() {
        let pages = CannedPages::new("<html></html>");
        let catalog = Catalog::new(&pages, "https://soaper.tv");

        assert!(catalog.new_releases().unwrap().is_empty());
        let series = Listing::new("2020", "Some Show", "/tv_abc.html");
        assert!(catalog.episodes(&series).unwrap().is_empty());

        let requests = pages.requests.borrow();
        assert_eq!(requests[0].0, "https://soaper.tv/movielist/");
        assert_eq!(requests[1].0, "https://soaper.tv/tv_abc.html");
    }
}
