// Display refresh period for the terminal host (~60 Hz).
pub const FRAME_INTERVAL_MS: u64 = 16;

// Drift panel: entropy + SCUP lines
pub const DRIFT_INTERVAL_MS: u64 = 200;
pub const DRIFT_CAPACITY: usize = 300;

// Thought-rate panel: Hz bars
pub const RATE_INTERVAL_MS: u64 = 1000;
pub const RATE_CAPACITY: usize = 60;
pub const MAX_HZ: f64 = 20.0;
pub const RATE_DROP_RATIO: f64 = 0.5;
pub const RATE_DROP_LOOKBACK: usize = 5;

// Fixed value scales
pub const ENTROPY_MAX: f64 = 1.0;
pub const SCUP_MAX: f64 = 100.0;

// Virtual pixel size of a panel surface
pub const SURFACE_WIDTH: f64 = 400.0;
pub const SURFACE_HEIGHT: f64 = 200.0;
pub const SURFACE_PADDING: f64 = 24.0;

pub const DEMO_PERIOD_MS: u64 = 100;
