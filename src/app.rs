use chrono::{DateTime, Local};
use ratatui::style::Color;

use crate::{
    config::Config,
    constants::{ENTROPY_MAX, SCUP_MAX, SURFACE_HEIGHT, SURFACE_PADDING, SURFACE_WIDTH},
    error::ScopeError,
    render::{AlertRule, FrameRenderer, PlotStyle, RenderConfig, Series},
    render_loop::{FrameOutcome, ManualScheduler, RenderLoop},
    sample::{DriftSample, RateSample},
    sampler::{DriftSampler, MetricSampler, RateSampler},
    snapshot::{SharedSource, SnapshotSource, StateSnapshot},
    surface::DisplayList,
    util::heat_color,
};

const ENTROPY_SPIKE_DELTA: f64 = 0.3;
const ENTROPY_SPIKE_LOOKBACK: usize = 5;

/// A render loop plus the surface it paints into.
pub struct Panel<M: MetricSampler> {
    pub render_loop: RenderLoop<M, SharedSource, ManualScheduler>,
    pub surface: DisplayList,
}

impl<M: MetricSampler> Panel<M> {
    fn new(config: RenderConfig<M::Sample>, sampler: M, source: SharedSource) -> Result<Self, ScopeError> {
        let surface = DisplayList::new(config.width, config.height);
        let renderer = FrameRenderer::new(config)?;
        let render_loop = RenderLoop::new(renderer, sampler, source, ManualScheduler::new())?;
        Ok(Self { render_loop, surface })
    }

    fn pump(&mut self, now_ms: u64) -> Option<FrameOutcome> {
        self.render_loop.pump(now_ms, &mut self.surface)
    }
}

pub fn drift_config(config: &Config) -> RenderConfig<DriftSample> {
    RenderConfig {
        title: "Drift".to_string(),
        width: SURFACE_WIDTH,
        height: SURFACE_HEIGHT,
        padding: SURFACE_PADDING,
        background: Color::Reset,
        grid_color: Color::Rgb(50, 50, 50),
        label_color: Color::DarkGray,
        h_grid_divisions: 4,
        v_grid_divisions: 6,
        style: PlotStyle::Line,
        series: vec![
            Series::new("entropy", Color::Magenta, ENTROPY_MAX, DriftSample::entropy),
            Series::new("scup", Color::Cyan, SCUP_MAX, DriftSample::scup).with_precision(0),
        ],
        color_map: None,
        marker: None,
        alert: Some(AlertRule::Rise {
            series: 0,
            lookback: ENTROPY_SPIKE_LOOKBACK,
            delta: ENTROPY_SPIKE_DELTA,
            label: "entropy spike".to_string(),
        }),
        capacity: config.drift.capacity,
        sample_interval_ms: config.drift.interval_ms,
    }
}

pub fn rate_config(config: &Config) -> RenderConfig<RateSample> {
    RenderConfig {
        title: "Thought rate".to_string(),
        width: SURFACE_WIDTH,
        height: SURFACE_HEIGHT,
        padding: SURFACE_PADDING,
        background: Color::Reset,
        grid_color: Color::Rgb(50, 50, 50),
        label_color: Color::DarkGray,
        h_grid_divisions: 4,
        v_grid_divisions: 6,
        style: PlotStyle::Bars,
        series: vec![Series::new("hz", Color::Yellow, config.rate.max_hz, RateSample::hz).with_precision(1)],
        color_map: Some(heat_color),
        marker: Some(RateSample::discontinuity),
        alert: Some(AlertRule::Drop {
            series: 0,
            lookback: config.rate.drop_lookback,
            ratio: config.rate.drop_ratio,
            label: "rate drop detected".to_string(),
        }),
        capacity: config.rate.capacity,
        sample_interval_ms: config.rate.interval_ms,
    }
}

// Main dashboard state
pub struct App {
    pub drift: Panel<DriftSampler>,
    pub rate: Panel<RateSampler>,
    pub peak_hz_record: (f64, DateTime<Local>),
    pub paused: bool,
    source: SharedSource,
}

impl App {
    pub fn new(config: &Config, source: SharedSource) -> Result<App, ScopeError> {
        config.validate()?;
        Ok(App {
            drift: Panel::new(drift_config(config), DriftSampler, source.clone())?,
            rate: Panel::new(rate_config(config), RateSampler::new(config.rate.max_hz), source.clone())?,
            peak_hz_record: (0.0, Local::now()),
            paused: false,
            source,
        })
    }

    pub fn start(&mut self) {
        self.drift.render_loop.start();
        self.rate.render_loop.start();
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.drift.render_loop.stop();
        self.rate.render_loop.stop();
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.start();
        } else {
            self.stop();
            self.paused = true;
        }
    }

    pub fn reset(&mut self) {
        self.drift.render_loop.reset();
        self.rate.render_loop.reset();
        self.peak_hz_record = (0.0, Local::now());
    }

    /// One display refresh: fire each panel's pending frame.
    pub fn on_frame(&mut self, now_ms: u64) {
        self.drift.pump(now_ms);
        self.rate.pump(now_ms);

        if let Some(latest) = self.rate.render_loop.latest() {
            if latest.hz() > self.peak_hz_record.0 {
                self.peak_hz_record = (latest.hz(), Local::now());
            }
        }
    }

    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.source.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_loop::LoopState;

    fn app_with(source: &SharedSource) -> App {
        let mut app = App::new(&Config::default(), source.clone()).unwrap();
        app.start();
        app
    }

    #[test]
    fn panels_run_independently() {
        let source = SharedSource::new();
        source.publish(StateSnapshot { tick_number: 10, entropy: 0.3, scup: 50.0, ..Default::default() });
        let mut app = app_with(&source);

        // drift samples every 200 ms, rate every 1000 ms
        for now in (0..=1000).step_by(100) {
            app.on_frame(now);
        }
        assert_eq!(app.drift.render_loop.buffer().len(), 6);
        assert_eq!(app.rate.render_loop.buffer().len(), 2);
    }

    #[test]
    fn peak_hz_is_tracked() {
        let source = SharedSource::new();
        source.publish(StateSnapshot { tick_number: 0, ..Default::default() });
        let mut app = app_with(&source);
        app.on_frame(0);
        source.publish(StateSnapshot { tick_number: 8, ..Default::default() });
        app.on_frame(1000);
        assert_eq!(app.peak_hz_record.0, 8.0);
    }

    #[test]
    fn pause_stops_both_loops() {
        let source = SharedSource::new();
        let mut app = app_with(&source);
        app.toggle_pause();
        assert!(app.paused);
        assert_eq!(app.drift.render_loop.state(), LoopState::Stopped);
        assert_eq!(app.rate.render_loop.state(), LoopState::Stopped);
        app.toggle_pause();
        assert_eq!(app.rate.render_loop.state(), LoopState::Running);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = Config::default();
        config.rate.capacity = 0;
        assert!(matches!(App::new(&config, SharedSource::new()), Err(ScopeError::InvalidCapacity)));
    }
}
