//! Per-source debounce window

use std::time::{Duration, Instant};

use ad_core::HitSource;

/// Suppresses repeat events from one source inside `window` of its last
/// accepted event. Suppressed events do not extend the window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    enabled: bool,
    window: Duration,
    last_accepted: [Option<Instant>; 3],
}

impl Debouncer {
    pub fn new(enabled: bool, window: Duration) -> Self {
        Self {
            enabled,
            window,
            last_accepted: [None; 3],
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Should an event from `source` at `now` be dispatched?
    pub fn accept(&mut self, source: HitSource, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        let slot = &mut self.last_accepted[source.index()];
        let accepted = match *slot {
            Some(last) => now.saturating_duration_since(last) >= self.window,
            None => true,
        };
        if accepted {
            *slot = Some(now);
        }
        accepted
    }
}
