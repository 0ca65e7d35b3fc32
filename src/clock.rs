/// True once at least `interval_ms` has passed since the last sample.
pub fn should_sample(now_ms: u64, last_sample_ms: u64, interval_ms: u64) -> bool {
    now_ms.saturating_sub(last_sample_ms) >= interval_ms
}

/// Tracks when a panel last sampled.
///
/// The timestamp only moves in [`SampleClock::mark_sampled`], so frames
/// where sampling was due but produced nothing keep the sample due.
#[derive(Debug, Clone)]
pub struct SampleClock {
    interval_ms: u64,
    last_sample_ms: Option<u64>,
}

impl SampleClock {
    pub fn new(interval_ms: u64) -> Self {
        Self { interval_ms, last_sample_ms: None }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(last) => should_sample(now_ms, last, self.interval_ms),
        }
    }

    pub fn mark_sampled(&mut self, now_ms: u64) {
        self.last_sample_ms = Some(now_ms);
    }

    pub fn last_sample_ms(&self) -> Option<u64> {
        self.last_sample_ms
    }

    pub fn reset(&mut self) {
        self.last_sample_ms = None;
    }
}
