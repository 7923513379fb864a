//! Process-wide advisory counters.
//!
//! Counters are bumped at the call site; [`Metrics::flush`] emits all of them
//! as one `info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters shared by the daemon and the CLI.
pub struct Metrics {
    advisories_served: AtomicU64,
    advisories_failed: AtomicU64,
    agent_failures: AtomicU64,
    agent_timeouts: AtomicU64,
    rejections: AtomicU64,
    clamp_events: AtomicU64,
    conflicts_resolved: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub advisories_served: u64,
    pub advisories_failed: u64,
    pub agent_failures: u64,
    pub agent_timeouts: u64,
    pub rejections: u64,
    pub clamp_events: u64,
    pub conflicts_resolved: u64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            advisories_served: AtomicU64::new(0),
            advisories_failed: AtomicU64::new(0),
            agent_failures: AtomicU64::new(0),
            agent_timeouts: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            clamp_events: AtomicU64::new(0),
            conflicts_resolved: AtomicU64::new(0),
        }
    }

    /// Increment the advisories-served counter by one.
    pub fn inc_served(&self) {
        self.advisories_served.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "advisories_served", "counter incremented");
    }

    /// Increment the advisories-failed counter by one.
    pub fn inc_failed(&self) {
        self.advisories_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "advisories_failed", "counter incremented");
    }

    /// Increment the agent-failures counter by one.
    pub fn inc_agent_failures(&self) {
        self.agent_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agent_failures", "counter incremented");
    }

    /// Increment the agent-timeouts counter by one.
    pub fn inc_agent_timeouts(&self) {
        self.agent_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agent_timeouts", "counter incremented");
    }

    /// Add `n` rejected recommendations.
    pub fn add_rejections(&self, n: u64) {
        self.rejections.fetch_add(n, Ordering::Relaxed);
    }

    /// Add `n` clamp events.
    pub fn add_clamps(&self, n: u64) {
        self.clamp_events.fetch_add(n, Ordering::Relaxed);
    }

    /// Add `n` fired conflict rules.
    pub fn add_conflicts(&self, n: u64) {
        self.conflicts_resolved.fetch_add(n, Ordering::Relaxed);
    }

    /// Read every counter at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            advisories_served: self.advisories_served.load(Ordering::Relaxed),
            advisories_failed: self.advisories_failed.load(Ordering::Relaxed),
            agent_failures: self.agent_failures.load(Ordering::Relaxed),
            agent_timeouts: self.agent_timeouts.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            clamp_events: self.clamp_events.load(Ordering::Relaxed),
            conflicts_resolved: self.conflicts_resolved.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (e.g. daemon shutdown)
    /// rather than on every increment.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            advisories_served = s.advisories_served,
            advisories_failed = s.advisories_failed,
            agent_failures = s.agent_failures,
            agent_timeouts = s.agent_timeouts,
            rejections = s.rejections,
            clamp_events = s.clamp_events,
            conflicts_resolved = s.conflicts_resolved,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.advisories_served,
            &self.advisories_failed,
            &self.agent_failures,
            &self.agent_timeouts,
            &self.rejections,
            &self.clamp_events,
            &self.conflicts_resolved,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
