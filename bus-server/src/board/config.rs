//! Pipeline tunables.

use std::time::Duration;

/// Configuration for departure assembly.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Maximum departures returned per route key.
    pub max_per_route: usize,
    /// Consecutive departures on one route key within this window collapse
    /// into the later one.
    pub dedupe_window: Duration,
    /// Maximum distance between an occupancy sample and a departure for the
    /// sample to apply.
    pub occupancy_match_window: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            max_per_route: 2,
            dedupe_window: Duration::from_secs(3 * 60),
            occupancy_match_window: Duration::from_secs(10 * 60),
        }
    }
}

impl BoardConfig {
    pub fn with_max_per_route(mut self, n: usize) -> Self {
        self.max_per_route = n;
        self
    }

    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    pub fn with_occupancy_match_window(mut self, window: Duration) -> Self {
        self.occupancy_match_window = window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.max_per_route, 2);
        assert_eq!(config.dedupe_window, Duration::from_secs(180));
        assert_eq!(config.occupancy_match_window, Duration::from_secs(600));
    }

    #[test]
    fn builder() {
        let config = BoardConfig::default()
            .with_max_per_route(3)
            .with_dedupe_window(Duration::from_secs(60));
        assert_eq!(config.max_per_route, 3);
        assert_eq!(config.dedupe_window, Duration::from_secs(60));
    }
}
