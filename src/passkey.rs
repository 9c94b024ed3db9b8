//! Passkey extraction
//!
//! Detail pages carry an opaque token in their file name
//! (`/movie_<pass>.html`, `/episode_<pass>.html`). The resolution RPC is
//! authorized by that token, so a link without one cannot be resolved.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static PASSKEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(?P<pass>[^_/?#]+)\.html(?:[?#].*)?$").expect("passkey pattern is valid")
});

/// Errors that can occur during passkey extraction
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// The link does not end in `_<pass>.html`
    #[error("Couldn't get passkey from page link: {0}")]
    MissingPasskey(String),
}

/// Opaque authorization token of a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passkey(String);

impl Passkey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the passkey between the last `_` and `.html` of a page link
pub fn extract_passkey(page_link: &str) -> Result<Passkey, PasskeyError> {
    PASSKEY_PATTERN
        .captures(page_link.trim())
        .and_then(|caps| caps.name("pass"))
        .map(|m| Passkey(m.as_str().to_string()))
        .ok_or_else(|| PasskeyError::MissingPasskey(page_link.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_passkey() {
        let pass = extract_passkey("/movie_abc123XY.html").unwrap();
        assert_eq!(pass.as_str(), "abc123XY");
    }

    #[test]
    fn test_extract_passkey_uses_last_underscore() {
        let pass = extract_passkey("https://soaper.tv/episode_my_show_Zq9.html").unwrap();
        assert_eq!(pass.as_str(), "Zq9");
    }

    #[test]
    fn test_extract_passkey_tolerates_query() {
        let pass = extract_passkey("/tv_k3y.html?from=search").unwrap();
        assert_eq!(pass.to_string(), "k3y");
    }

    #[test]
    fn test_missing_passkey() {
        assert!(matches!(
            extract_passkey("/movie_noext"),
            Err(PasskeyError::MissingPasskey(_))
        ));
        assert!(extract_passkey("/movie_.html").is_err());
        assert!(extract_passkey("/about.html").is_err());
    }
}
