use crate::constants::{ENTROPY_MAX, SCUP_MAX};

/// Clamp into `[lo, hi]`; NaN maps to `lo`.
pub fn clamp_to(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Entropy and SCUP at one instant, as plotted by the drift graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftSample {
    timestamp_ms: u64,
    entropy: f64,
    scup: f64,
}

impl DriftSample {
    pub fn new(timestamp_ms: u64, entropy: f64, scup: f64) -> Self {
        Self {
            timestamp_ms,
            entropy: clamp_to(entropy, 0.0, ENTROPY_MAX),
            scup: clamp_to(scup, 0.0, SCUP_MAX),
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn scup(&self) -> f64 {
        self.scup
    }
}

/// Derived thought rate at one instant.
///
/// `discontinuity` is set when the tick counter went backwards since the
/// previous sample; `hz` is 0 in that case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    timestamp_ms: u64,
    tick_number: u64,
    hz: f64,
    entropy: f64,
    discontinuity: bool,
}

impl RateSample {
    pub fn new(timestamp_ms: u64, tick_number: u64, hz: f64, max_hz: f64, entropy: f64, discontinuity: bool) -> Self {
        Self {
            timestamp_ms,
            tick_number,
            hz: clamp_to(hz, 0.0, max_hz),
            entropy: clamp_to(entropy, 0.0, ENTROPY_MAX),
            discontinuity,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn tick_number(&self) -> u64 {
        self.tick_number
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn discontinuity(&self) -> bool {
        self.discontinuity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_is_clamped_on_creation() {
        assert_eq!(DriftSample::new(0, 1.5, 50.0).entropy(), 1.0);
        assert_eq!(DriftSample::new(0, -0.2, 50.0).entropy(), 0.0);
    }

    #[test]
    fn scup_and_nan_are_clamped() {
        let s = DriftSample::new(0, f64::NAN, 140.0);
        assert_eq!(s.entropy(), 0.0);
        assert_eq!(s.scup(), 100.0);
    }

    #[test]
    fn hz_is_clamped_to_max() {
        let s = RateSample::new(0, 10, 99.0, 20.0, 0.5, false);
        assert_eq!(s.hz(), 20.0);
        let s = RateSample::new(0, 10, -3.0, 20.0, 0.5, false);
        assert_eq!(s.hz(), 0.0);
    }
}
