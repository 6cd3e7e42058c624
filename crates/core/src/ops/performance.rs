use std::collections::HashMap;
use std::time::Duration;

use crate::router::RouteKind;

/// Running response-time and cache statistics.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    handled: u64,
    average_ms: f64,
    max_ms: u64,
    by_route: HashMap<RouteKind, (u64, f64)>,
    cache_hits: u64,
    cache_misses: u64,
    handler_errors: u64,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, route: RouteKind, elapsed: Duration) {
        let ms = elapsed.as_millis() as f64;
        self.handled += 1;
        self.average_ms += (ms - self.average_ms) / self.handled as f64;
        self.max_ms = self.max_ms.max(ms as u64);
        let (n, avg) = self.by_route.entry(route).or_insert((0, 0.0));
        *n += 1;
        *avg += (ms - *avg) / *n as f64;
    }

    pub fn record_cache(&mut self, hit: bool) {
        if hit {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
    }

    pub fn record_error(&mut self) {
        self.handler_errors += 1;
    }

    pub fn handled(&self) -> u64 {
        self.handled
    }

    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    pub fn route_average_ms(&self, route: RouteKind) -> Option<f64> {
        self.by_route.get(&route).map(|(_, avg)| *avg)
    }

    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 { 0.0 } else { self.cache_hits as f64 / total as f64 }
    }

    pub fn handler_errors(&self) -> u64 {
        self.handler_errors
    }

    /// Handler errors per handled message.
    pub fn error_rate(&self) -> f64 {
        if self.handled == 0 { 0.0 } else { self.handler_errors as f64 / self.handled as f64 }
    }
}
