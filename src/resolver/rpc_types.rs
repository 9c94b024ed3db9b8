/// Response types of the catalog's media info RPC.
///
/// Both the movie and the episode variant answer with the same shape.
use serde::Deserialize;

/// Body of a `GetMInfoAjax` / `GetEInfoAjax` response.
#[derive(Debug, Deserialize)]
pub(super) struct RpcResponse {
    /// Media URL, or an error sentence when the source is unavailable
    pub val: String,
    /// Available subtitles (null when there are none)
    #[serde(default)]
    pub subs: Option<Vec<RpcSubtitle>>,
}

/// A single subtitle entry.
#[derive(Debug, Deserialize)]
pub(super) struct RpcSubtitle {
    /// Display name, usually the language (e.g. "English")
    #[serde(default)]
    pub name: String,
    /// Site-relative path of the subtitle file
    #[serde(default)]
    pub path: String,
}
