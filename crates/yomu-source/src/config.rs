use serde::{Deserialize, Serialize};

/// Upstream content-rating classification, used as a listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
}

impl ContentRating {
    /// Query-parameter value expected by the MangaDex API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Suggestive => "suggestive",
            Self::Erotica => "erotica",
        }
    }
}

/// Source configuration.
///
/// All fields have defaults matching the public MangaDex deployment,
/// so `SourceConfig::default()` is a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Translated-language filter and preferred language for localized
    /// titles, descriptions, and tag labels.
    pub language: String,
    /// Content ratings included in listings and search.
    pub content_ratings: Vec<ContentRating>,
    /// Request throttle applied by the transport.
    pub requests_per_second: f64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User-agent header sent with every request.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            content_ratings: vec![ContentRating::Safe, ContentRating::Suggestive],
            requests_per_second: 5.0,
            request_timeout_secs: 20,
            user_agent: concat!("yomu/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}
