//! Request/response DTOs for the web layer.

use serde::{Deserialize, Serialize};

use crate::board::SampleStats;
use crate::domain::Departure;

/// Query parameters for `GET /api/bus/stops`.
#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub query: Option<String>,
    pub anchor: Option<String>,
    pub limit: Option<usize>,
}

/// Response body for `GET /api/bus/stops`: suggestion titles only.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub items: Vec<String>,
}

/// Query parameters for `GET /api/bus/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: Option<String>,
    pub dest: Option<String>,
    pub debug: Option<String>,
}

impl SearchParams {
    pub fn debug_requested(&self) -> bool {
        self.debug.as_deref() == Some("1")
    }
}

/// Response body for `GET /api/bus/search`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub origin: String,
    pub dest: String,
    pub results: Vec<Departure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Extra diagnostics attached with `debug=1`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub sample_stats: SampleStats,
    pub sample_window_minutes: u64,
}

/// Error body for client errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_requires_exactly_one() {
        let params = |debug: Option<&str>| SearchParams {
            origin: None,
            dest: None,
            debug: debug.map(String::from),
        };
        assert!(params(Some("1")).debug_requested());
        assert!(!params(Some("true")).debug_requested());
        assert!(!params(None).debug_requested());
    }
}
