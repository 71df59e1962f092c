use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which lookup path a cache request went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Unscoped `get`, visible to every repository.
    Global,
    /// `scoped_get` restricted to one repository.
    Scoped,
}

/// Sink for cache hit/miss signals.
pub trait CacheMetrics: Send + Sync {
    fn hit(&self, scope: RequestScope);
    fn miss(&self, scope: RequestScope);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    fn hit(&self, _scope: RequestScope) {}
    fn miss(&self, _scope: RequestScope) {}
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> RequestCounts {
        RequestCounts {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// In-process hit/miss counters, one pair per request scope.
#[derive(Debug, Default)]
pub struct CounterMetrics {
    global: Counters,
    scoped: Counters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub global: RequestCounts,
    pub scoped: RequestCounts,
}

impl CounterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, scope: RequestScope) -> &Counters {
        match scope {
            RequestScope::Global => &self.global,
            RequestScope::Scoped => &self.scoped,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            global: self.global.snapshot(),
            scoped: self.scoped.snapshot(),
        }
    }
}

impl CacheMetrics for CounterMetrics {
    fn hit(&self, scope: RequestScope) {
        self.counters(scope).hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self, scope: RequestScope) {
        self.counters(scope).misses.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_metrics_tracks_scopes_separately() {
        let metrics = CounterMetrics::new();
        metrics.hit(RequestScope::Global);
        metrics.hit(RequestScope::Global);
        metrics.miss(RequestScope::Scoped);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.global, RequestCounts { hits: 2, misses: 0 });
        assert_eq!(snapshot.scoped, RequestCounts { hits: 0, misses: 1 });
    }
}
