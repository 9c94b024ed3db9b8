//! Media link resolution
//!
//! Exchanges the passkey of a detail page for a playable media URL and an
//! optional subtitle URL through the catalog's media info RPC.
//!
//! The RPC is authorized by pairing the passkey with the `Referer` header, so
//! the referer must be exactly the detail page URL the passkey came from.

mod rpc_types;

use crate::catalog::{CatalogTransport, TransportError, absolute_url};
use crate::config::Config;
use crate::passkey::{PasskeyError, extract_passkey};
use rpc_types::{RpcResponse, RpcSubtitle};
use thiserror::Error;
use tracing::debug;

/// RPC variant for movies
const MOVIE_INFO_ENDPOINT: &str = "/home/index/GetMInfoAjax";

/// RPC variant for series episodes
const EPISODE_INFO_ENDPOINT: &str = "/home/index/GetEInfoAjax";

/// The value the RPC puts into `val` when the passkey or session is no longer valid
///
/// This is an upstream protocol detail and may change without notice, which is
/// why any `val` that does not look like a link is treated the same way.
pub const SOURCE_UNAVAILABLE_SENTINEL: &str = "Cannot get video source.";

/// Errors that can occur while resolving a page link
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The page link carries no passkey
    #[error(transparent)]
    MissingPasskey(#[from] PasskeyError),

    /// The server refused to hand out a media source
    #[error("Cannot get video source for {page_link}: {value}")]
    SourceUnavailable { page_link: String, value: String },

    /// The RPC request failed
    #[error("Resolution request failed: {0}")]
    Network(#[from] TransportError),

    /// The RPC answered with something that is not the expected JSON
    #[error("Invalid response while resolving {page_link}: {message}")]
    InvalidResponse { page_link: String, message: String },
}

/// Result of resolving a single detail page
///
/// URLs are kept exactly as the RPC returned them; they are usually
/// site-relative and get resolved against the host when a download plan is
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub media_url: String,
    pub subtitle_url: Option<String>,
}

/// Resolves detail pages to media links
pub struct MediaLinkResolver<T: CatalogTransport> {
    transport: T,
    base_uri: String,
    subtitle_language: String,
}

impl<T: CatalogTransport> MediaLinkResolver<T> {
    /// Creates a resolver for the host and subtitle language in `config`
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            subtitle_language: config.subtitle_language.to_lowercase(),
        }
    }

    /// Resolves a detail page link
    ///
    /// `is_series` selects the episode variant of the RPC. Exactly one request
    /// is made; failures are never retried.
    pub fn resolve(&self, page_link: &str, is_series: bool) -> Result<ResolvedMedia, ResolveError> {
        let passkey = extract_passkey(page_link)?;

        let endpoint = if is_series {
            EPISODE_INFO_ENDPOINT
        } else {
            MOVIE_INFO_ENDPOINT
        };
        let url = format!("{}{}", self.base_uri, endpoint);
        let referer = absolute_url(&self.base_uri, page_link);
        debug!(%url, %referer, "resolving media link");

        let body = self
            .transport
            .post_form(&url, &referer, &[("pass", passkey.as_str())])?;

        let response: RpcResponse =
            serde_json::from_str(&body).map_err(|e| ResolveError::InvalidResponse {
                page_link: page_link.to_string(),
                message: e.to_string(),
            })?;

        self.interpret(page_link, response)
    }

    /// Turns a decoded RPC response into resolved links
    fn interpret(&self, page_link: &str, response: RpcResponse) -> Result<ResolvedMedia, ResolveError> {
        let media_url = response.val.trim();
        if media_url == SOURCE_UNAVAILABLE_SENTINEL || !looks_like_link(media_url) {
            return Err(ResolveError::SourceUnavailable {
                page_link: page_link.to_string(),
                value: response.val,
            });
        }

        let subtitle_url = response
            .subs
            .as_deref()
            .and_then(|subs| select_subtitle(subs, &self.subtitle_language));

        Ok(ResolvedMedia {
            media_url: media_url.to_string(),
            subtitle_url,
        })
    }
}

/// Returns true for absolute http(s) URLs and site-relative paths
fn looks_like_link(value: &str) -> bool {
    let is_link = value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with('/');
    is_link && !value.contains(char::is_whitespace)
}

/// Picks the first subtitle whose name contains `language` (already lowercased)
fn select_subtitle(subs: &[RpcSubtitle], language: &str) -> Option<String> {
    if language.is_empty() {
        return None;
    }
    subs.iter()
        .find(|sub| sub.name.to_lowercase().contains(language))
        .map(|sub| sub.path.trim())
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct PostedForm {
        url: String,
        referer: String,
        form: Vec<(String, String)>,
    }

    /// Answers every RPC with a fixed body and records what was posted
    struct FixedRpc {
        body: String,
        posted: RefCell<Vec<PostedForm>>,
    }

    impl FixedRpc {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                posted: RefCell::new(Vec::new()),
            }
        }
    }

    impl CatalogTransport for FixedRpc {
        fn get_html(&self, url: &str, _: &[(&str, &str)]) -> Result<String, TransportError> {
            Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
        }

        fn post_form(
            &self,
            url: &str,
            referer: &str,
            form: &[(&str, &str)],
        ) -> Result<String, TransportError> {
            self.posted.borrow_mut().push(PostedForm {
                url: url.to_string(),
                referer: referer.to_string(),
                form: form
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
            Ok(self.body.clone())
        }
    }

    fn config() -> Config {
        Config::new("/tmp")
    }

    #[test]
    fn test_resolve_movie_with_subtitle() {
        let rpc = FixedRpc::new(
            r#"{"val": "http://x/a.m3u8", "subs": [{"name": "English", "path": "/s/a.srt"}]}"#,
        );
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let media = resolver.resolve("/movie_abc123XY.html", false).unwrap();
        assert_eq!(media.media_url, "http://x/a.m3u8");
        assert_eq!(media.subtitle_url.as_deref(), Some("/s/a.srt"));

        let posted = rpc.posted.borrow();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].url, "https://soaper.tv/home/index/GetMInfoAjax");
        assert_eq!(posted[0].referer, "https://soaper.tv/movie_abc123XY.html");
        assert_eq!(
            posted[0].form,
            vec![("pass".to_string(), "abc123XY".to_string())]
        );
    }

    #[test]
    fn test_resolve_episode_uses_episode_endpoint() {
        let rpc = FixedRpc::new(r#"{"val": "/dl/ep.m3u8", "subs": null}"#);
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let media = resolver.resolve("/episode_Qw3.html", true).unwrap();
        assert_eq!(media.media_url, "/dl/ep.m3u8");
        assert_eq!(media.subtitle_url, None);
        assert_eq!(
            rpc.posted.borrow()[0].url,
            "https://soaper.tv/home/index/GetEInfoAjax"
        );
    }

    #[test]
    fn test_sentinel_is_source_unavailable() {
        let rpc = FixedRpc::new(r#"{"val": "Cannot get video source.", "subs": null}"#);
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let result = resolver.resolve("/movie_abc.html", false);
        assert!(matches!(result, Err(ResolveError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_non_link_value_is_source_unavailable() {
        let rpc = FixedRpc::new(r#"{"val": "Session expired, try again", "subs": []}"#);
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let result = resolver.resolve("/movie_abc.html", false);
        assert!(matches!(result, Err(ResolveError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_missing_passkey_short_circuits() {
        let rpc = FixedRpc::new(r#"{"val": "http://x/a.m3u8", "subs": null}"#);
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let result = resolver.resolve("/movie_noext", false);
        assert!(matches!(result, Err(ResolveError::MissingPasskey(_))));
        assert!(rpc.posted.borrow().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let rpc = FixedRpc::new("<html>Forbidden</html>");
        let resolver = MediaLinkResolver::new(&rpc, &config());

        let result = resolver.resolve("/movie_abc.html", false);
        assert!(matches!(result, Err(ResolveError::InvalidResponse { .. })));
    }

    #[test]
    fn test_subtitle_language_filtering() {
        let body = r#"{"val": "/a.m3u8", "subs": [
            {"name": "Deutsch", "path": "/s/de.srt"},
            {"name": "English (SDH)", "path": "/s/en.srt"},
            {"name": "English", "path": "/s/en2.srt"}
        ]}"#;

        let rpc = FixedRpc::new(body);
        let resolver = MediaLinkResolver::new(&rpc, &config());
        let media = resolver.resolve("/movie_abc.html", false).unwrap();
        assert_eq!(media.subtitle_url.as_deref(), Some("/s/en.srt"));

        let german = config().with_subtitle_language("DE");
        let resolver = MediaLinkResolver::new(&rpc, &german);
        let media = resolver.resolve("/movie_abc.html", false).unwrap();
        assert_eq!(media.subtitle_url.as_deref(), Some("/s/de.srt"));

        let french = config().with_subtitle_language("fr");
        let resolver = MediaLinkResolver::new(&rpc, &french);
        let media = resolver.resolve("/movie_abc.html", false).unwrap();
        assert_eq!(media.subtitle_url, None);
    }

    #[test]
    fn test_empty_language_matches_no_subtitle() {
        let rpc = FixedRpc::new(r#"{"val": "/a.m3u8", "subs": [{"name": "English", "path": "/s/en.srt"}]}"#);
        let blank = config().with_subtitle_language("  ");
        let resolver = MediaLinkResolver::new(&rpc, &blank);

        let media = resolver.resolve("/movie_abc.html", false).unwrap();
        assert_eq!(media.media_url, "/a.m3u8");
        assert_eq!(media.subtitle_url, None);
    }
}
