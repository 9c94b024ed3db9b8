//! Runtime configuration
//!
//! Everything that used to be ambient (download location, subtitle language,
//! catalog host) is collected into a single [`Config`] value that is passed
//! explicitly into the resolver, the sequencer and the planner.

use std::path::{Path, PathBuf};

/// Catalog host used when nothing else is configured
pub const DEFAULT_BASE_URI: &str = "https://soaper.tv";

/// Subtitle language code used when nothing else is configured
pub const DEFAULT_SUBTITLE_LANGUAGE: &str = "en";

/// Configuration shared by all pipeline stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scheme and host of the catalog site, without a trailing slash
    pub base_uri: String,
    /// Directory movies are written to, and under which series folders are created
    pub download_root: PathBuf,
    /// Language code matched (case-insensitively, as a substring) against subtitle names
    pub subtitle_language: String,
}

impl Config {
    /// Creates a configuration with default host and subtitle language
    pub fn new(download_root: impl Into<PathBuf>) -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            download_root: download_root.into(),
            subtitle_language: DEFAULT_SUBTITLE_LANGUAGE.to_string(),
        }
    }

    /// Overrides the catalog host
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = base_uri.trim_end_matches('/').to_string();
        self
    }

    /// Overrides the subtitle language code
    pub fn with_subtitle_language(mut self, language: &str) -> Self {
        self.subtitle_language = language.trim().to_string();
        self
    }

    /// Returns the download root directory
    pub fn download_root(&self) -> &Path {
        &self.download_root
    }
}

/// Returns the current user's home directory, if one can be determined
///
/// This is the default download root.
pub fn default_download_root() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("/tmp/videos");
        assert_eq!(config.base_uri, "https://soaper.tv");
        assert_eq!(config.subtitle_language, "en");
        assert_eq!(config.download_root(), Path::new("/tmp/videos"));
    }

    #[test]
    fn test_base_uri_trailing_slash_is_trimmed() {
        let config = Config::new("/tmp").with_base_uri("https://mirror.example/");
        assert_eq!(config.base_uri, "https://mirror.example");
    }

    #[test]
    fn test_subtitle_language_override() {
        let config = Config::new("/tmp").with_subtitle_language(" de ");
        assert_eq!(config.subtitle_language, "de");
    }
}
