use crate::{
    error::ScopeError,
    sample::{DriftSample, RateSample},
    snapshot::StateSnapshot,
};

/// Turns the current snapshot into a sample record for one panel.
pub trait MetricSampler {
    type Sample: Clone;

    /// Fails with [`ScopeError::SourceUnavailable`] when there is no snapshot.
    fn sample(&mut self, snapshot: Option<&StateSnapshot>, now_ms: u64) -> Result<Self::Sample, ScopeError>;

    /// Forget any retained state, as after a fresh mount.
    fn reset(&mut self) {}
}

#[derive(Debug, Default, Clone)]
pub struct DriftSampler;

impl MetricSampler for DriftSampler {
    type Sample = DriftSample;

    fn sample(&mut self, snapshot: Option<&StateSnapshot>, now_ms: u64) -> Result<DriftSample, ScopeError> {
        let snap = snapshot.ok_or(ScopeError::SourceUnavailable)?;
        Ok(DriftSample::new(now_ms, snap.entropy, snap.scup))
    }
}

/// Ticks per second between two readings, plus whether the counter went
/// backwards. Backwards counters and zero elapsed time both give 0 Hz.
pub fn tick_rate_hz(previous_tick: u64, current_tick: u64, delta_ms: u64) -> (f64, bool) {
    if current_tick < previous_tick {
        return (0.0, true);
    }
    if delta_ms == 0 {
        return (0.0, false);
    }
    let ticks = (current_tick - previous_tick) as f64;
    (ticks / (delta_ms as f64 / 1000.0), false)
}

/// Derives Hz from successive tick numbers. The first sample after
/// creation or reset reports 0 Hz.
#[derive(Debug, Clone)]
pub struct RateSampler {
    max_hz: f64,
    previous: Option<(u64, u64)>,
}

impl RateSampler {
    pub fn new(max_hz: f64) -> Self {
        Self { max_hz, previous: None }
    }
}

impl MetricSampler for RateSampler {
    type Sample = RateSample;

    fn sample(&mut self, snapshot: Option<&StateSnapshot>, now_ms: u64) -> Result<RateSample, ScopeError> {
        let snap = snapshot.ok_or(ScopeError::SourceUnavailable)?;
        let (hz, discontinuity) = match self.previous {
            None => (0.0, false),
            Some((prev_tick, prev_ms)) => tick_rate_hz(prev_tick, snap.tick_number, now_ms.saturating_sub(prev_ms)),
        };
        self.previous = Some((snap.tick_number, now_ms));
        Ok(RateSample::new(now_ms, snap.tick_number, hz, self.max_hz, snap.entropy, discontinuity))
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}
