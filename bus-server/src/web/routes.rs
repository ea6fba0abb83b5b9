//! HTTP route handlers.
//!
//! The external collaborators' surface: validates inputs, sets response
//! caching headers, and renders nothing — the board does all the work.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::dto::*;
use super::state::AppState;

/// How long clients may cache suggestion responses.
const SUGGESTION_MAX_AGE: &str = "private, max-age=60";
/// Shorter caching for the blank-query short-circuit.
const EMPTY_SUGGESTION_MAX_AGE: &str = "private, max-age=30";
/// How long clients may cache search responses; matches the server-side
/// query-response TTL.
const SEARCH_MAX_AGE: &str = "private, max-age=30";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/bus/stops", get(suggest_stops))
        .route("/api/bus/search", get(search_departures))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Stop suggestions for a text query.
async fn suggest_stops(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Response {
    let query = params.query.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return (
            [(header::CACHE_CONTROL, EMPTY_SUGGESTION_MAX_AGE)],
            Json(SuggestResponse { items: Vec::new() }),
        )
            .into_response();
    }

    let anchor = params
        .anchor
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    match state.board.suggest_stops(query, anchor, params.limit).await {
        Ok(suggestions) => (
            [(header::CACHE_CONTROL, SUGGESTION_MAX_AGE)],
            Json(SuggestResponse {
                items: suggestions.into_iter().map(|s| s.title).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(query, error = %e, "suggestion query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "suggestion lookup failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Ranked next departures for an origin/destination pair.
async fn search_departures(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let origin = params.origin.as_deref().unwrap_or("").trim().to_string();
    let dest = params.dest.as_deref().unwrap_or("").trim().to_string();

    if origin.is_empty() || dest.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "origin and dest are required".to_string(),
            }),
        )
            .into_response();
    }

    // Degraded-to-empty is the contract for this operation.
    let results = state.board.next_departures_safe(&origin, &dest).await;

    let debug = if params.debug_requested() {
        let route_ids: Vec<String> = results.iter().filter_map(|d| d.route_id.clone()).collect();
        let pattern_ids: Vec<String> =
            results.iter().filter_map(|d| d.pattern_id.clone()).collect();
        match state
            .board
            .occupancy_sample_stats(&route_ids, &pattern_ids)
            .await
        {
            Ok(sample_stats) => Some(DebugInfo {
                sample_stats,
                sample_window_minutes: state.board.config().occupancy_match_window.as_secs() / 60,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "sample stats unavailable");
                None
            }
        }
    } else {
        None
    };

    (
        [(header::CACHE_CONTROL, SEARCH_MAX_AGE)],
        Json(SearchResponse {
            origin,
            dest,
            results,
            debug,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardConfig, DepartureBoard};
    use crate::cache::{CacheConfig, Caches};
    use crate::odpt::{OdptClient, OdptConfig};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let client = OdptClient::new(OdptConfig::new("")).unwrap();
        let board = DepartureBoard::new(
            client,
            Caches::new(&CacheConfig::default()),
            BoardConfig::default(),
        );
        create_router(AppState::new(board))
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_search_params_are_rejected() {
        let response = test_router()
            .oneshot(
                Request::get("/api/bus/search?origin=a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_suggestion_query_short_circuits() {
        let response = test_router()
            .oneshot(
                Request::get("/api/bus/stops?query=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some(EMPTY_SUGGESTION_MAX_AGE)
        );
    }

    #[tokio::test]
    async fn search_without_credential_degrades_to_empty_results() {
        let response = test_router()
            .oneshot(
                Request::get("/api/bus/search?origin=%E8%B1%8A%E6%B4%B2&dest=%E6%9E%9D%E5%B7%9D")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["results"].as_array().map(Vec::len), Some(0));
    }
}
