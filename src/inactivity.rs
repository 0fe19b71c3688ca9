use std::time::{Duration, Instant};

use tracing::warn;

use crate::event::RepEvent;
use crate::judge::SessionCounters;

/// Wall-clock accumulator for a "nothing is happening" condition.
#[derive(Debug, Clone, Copy)]
pub struct InactivityTimer {
    elapsed: Duration,
    last_tick: Instant,
}

impl InactivityTimer {
    pub fn new(now: Instant) -> Self {
        Self {
            elapsed: Duration::ZERO,
            last_tick: now,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Add the time since the previous tick.
    pub fn accumulate(&mut self, now: Instant) -> Duration {
        self.elapsed += now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.elapsed
    }

    pub fn reset(&mut self, now: Instant) {
        self.elapsed = Duration::ZERO;
        self.last_tick = now;
    }
}

/// Resets the session when the subject stops moving or stays badly framed.
///
/// The primary timer runs while the posture state does not change, the
/// secondary one while the camera offset is out of tolerance. Whichever
/// crosses the threshold zeroes the counters and restarts from zero, so the
/// reset fires once per crossing.
#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    primary: InactivityTimer,
    secondary: InactivityTimer,
    threshold: Duration,
}

impl InactivityMonitor {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            primary: InactivityTimer::new(now),
            secondary: InactivityTimer::new(now),
            threshold,
        }
    }

    pub fn primary(&self) -> &InactivityTimer {
        &self.primary
    }

    pub fn secondary(&self) -> &InactivityTimer {
        &self.secondary
    }

    /// Analysed frame: run the primary timer if the state held, else restart it.
    pub fn observe_state(
        &mut self,
        unchanged: bool,
        now: Instant,
        counters: &mut SessionCounters,
    ) -> Option<RepEvent> {
        if unchanged {
            Self::check(&mut self.primary, self.threshold, now, counters, "no movement")
        } else {
            self.primary.reset(now);
            None
        }
    }

    /// Badly framed frame. The primary timer restarts since no state is tracked.
    pub fn observe_misaligned(
        &mut self,
        now: Instant,
        counters: &mut SessionCounters,
    ) -> Option<RepEvent> {
        self.primary.reset(now);
        Self::check(&mut self.secondary, self.threshold, now, counters, "camera misaligned")
    }

    pub fn observe_aligned(&mut self, now: Instant) {
        self.secondary.reset(now);
    }

    /// Frame without a subject: counts as inactivity; framing is forgotten.
    pub fn observe_no_subject(
        &mut self,
        now: Instant,
        counters: &mut SessionCounters,
    ) -> Option<RepEvent> {
        self.secondary.reset(now);
        Self::check(&mut self.primary, self.threshold, now, counters, "no subject")
    }

    fn check(
        timer: &mut InactivityTimer,
        threshold: Duration,
        now: Instant,
        counters: &mut SessionCounters,
        reason: &str,
    ) -> Option<RepEvent> {
        let elapsed = timer.accumulate(now);
        if elapsed < threshold {
            return None;
        }

        warn!(
            reason,
            elapsed_secs = elapsed.as_secs_f32(),
            correct = counters.correct,
            incorrect = counters.incorrect,
            "inactivity threshold reached, resetting counters"
        );
        counters.reset();
        timer.reset(now);
        Some(RepEvent::ResetCounters)
    }
}
