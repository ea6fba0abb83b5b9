//! Application state for the web layer.

use std::sync::Arc;

use crate::board::DepartureBoard;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The departure board service.
    pub board: Arc<DepartureBoard>,
}

impl AppState {
    pub fn new(board: DepartureBoard) -> Self {
        Self {
            board: Arc::new(board),
        }
    }
}
