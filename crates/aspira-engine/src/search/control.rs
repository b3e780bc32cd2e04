//! Stop flag, node budget and time limits for a running search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Nodes between clock reads.
const CHECK_INTERVAL: u64 = 2048;

/// Decides when a running search must stop.
///
/// Polled by the search at every node; the clock is only read every
/// 2048 nodes. Two time limits apply:
/// - **soft**: no new iterative-deepening iteration starts past it
/// - **hard**: the current iteration is abandoned
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
}

impl SearchControl {
    /// Control with no limits; only the external flag stops the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self::new(stopped, None, None, None)
    }

    /// The clock starts now.
    pub fn new(
        stopped: Arc<AtomicBool>,
        soft: Option<Duration>,
        hard: Option<Duration>,
        nodes: Option<u64>,
    ) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit: soft,
            hard_limit: hard,
            node_limit: nodes,
        }
    }

    /// Check whether the search should abort immediately.
    ///
    /// When a limit trips, the shared stop flag is raised so that later calls
    /// return at once.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }

        if let Some(limit) = self.node_limit
            && nodes >= limit
        {
            self.stopped.store(true, Ordering::Relaxed);
            return true;
        }

        if nodes % CHECK_INTERVAL != 0 {
            return false;
        }

        if let Some(hard) = self.hard_limit
            && self.elapsed() >= hard
        {
            self.stopped.store(true, Ordering::Relaxed);
            return true;
        }

        false
    }

    /// Check whether iterative deepening should start another iteration.
    pub fn should_stop_iterating(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        self.soft_limit.is_some_and(|soft| self.elapsed() >= soft)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Reference to the shared stop flag.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn external_flag_stops_at_any_node() {
        let stopped = flag();
        let control = SearchControl::new_infinite(Arc::clone(&stopped));
        assert!(!control.should_stop(1));
        assert!(!control.should_stop_iterating());
        stopped.store(true, Ordering::Relaxed);
        assert!(control.should_stop(1));
        assert!(control.should_stop_iterating());
    }

    #[test]
    fn node_budget_raises_the_flag() {
        let stopped = flag();
        let control = SearchControl::new(Arc::clone(&stopped), None, None, Some(500));
        assert!(!control.should_stop(499));
        assert!(control.should_stop(500));
        assert!(stopped.load(Ordering::Relaxed));
    }

    #[test]
    fn hard_limit_is_checked_on_the_interval() {
        let control = SearchControl::new(flag(), None, Some(Duration::ZERO), None);
        assert!(!control.should_stop(CHECK_INTERVAL + 1));
        assert!(control.should_stop(CHECK_INTERVAL * 3));
        assert!(control.stop_flag().load(Ordering::Relaxed));
    }

    #[test]
    fn soft_limit_only_affects_iterations() {
        let control = SearchControl::new(flag(), Some(Duration::ZERO), None, None);
        assert!(control.should_stop_iterating());
        assert!(!control.should_stop(CHECK_INTERVAL));
    }
}
