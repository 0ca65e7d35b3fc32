use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::{
    clock::SampleClock,
    error::ScopeError,
    render::FrameRenderer,
    ring::RingBuffer,
    sampler::MetricSampler,
    snapshot::SnapshotSource,
    surface::Surface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Handle for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Source of display-frame callbacks.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Scheduler whose frames fire only when the owner calls [`ManualScheduler::fire`].
/// The terminal host fires one frame per display refresh; tests fire by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<FrameToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest pending callback, removed from the queue.
    pub fn fire(&mut self) -> Option<FrameToken> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.queue.push_back(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.retain(|t| *t != token);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Stale or cancelled callback, or the loop is stopped.
    Ignored,
    Rendered,
    /// The render pass failed; the loop carries on.
    RenderSkipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_rendered: u64,
    pub samples_taken: u64,
    pub samples_skipped: u64,
    pub render_failures: u64,
}

/// One panel's sample -> buffer -> render pipeline, driven by frame
/// callbacks from a [`FrameScheduler`].
///
/// Every accepted callback samples if the clock says so, always renders,
/// and schedules the next callback. Errors from either step are logged
/// and counted, never returned.
pub struct RenderLoop<M, Src, Sch>
where
    M: MetricSampler,
{
    state: LoopState,
    pending: Option<FrameToken>,
    clock: SampleClock,
    buffer: RingBuffer<M::Sample>,
    sampler: M,
    renderer: FrameRenderer<M::Sample>,
    source: Src,
    scheduler: Sch,
    stats: LoopStats,
}

impl<M, Src, Sch> RenderLoop<M, Src, Sch>
where
    M: MetricSampler,
    Src: SnapshotSource,
    Sch: FrameScheduler,
{
    pub fn new(renderer: FrameRenderer<M::Sample>, sampler: M, source: Src, scheduler: Sch) -> Result<Self, ScopeError> {
        let cfg = renderer.config();
        let buffer = RingBuffer::new(cfg.capacity)?;
        let clock = SampleClock::new(cfg.sample_interval_ms);
        Ok(Self {
            state: LoopState::Stopped,
            pending: None,
            clock,
            buffer,
            sampler,
            renderer,
            source,
            scheduler,
            stats: LoopStats::default(),
        })
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        self.pending = Some(self.scheduler.request_frame());
        info!(panel = %self.renderer.config().title, "render loop started");
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
        self.state = LoopState::Stopped;
        info!(panel = %self.renderer.config().title, "render loop stopped");
    }

    pub fn on_frame(&mut self, token: FrameToken, now_ms: u64, surface: &mut dyn Surface) -> FrameOutcome {
        if self.state != LoopState::Running || self.pending != Some(token) {
            debug!(?token, "ignoring stale frame callback");
            return FrameOutcome::Ignored;
        }
        self.pending = None;

        if self.clock.is_due(now_ms) {
            self.sample(now_ms);
        }

        let outcome = match self.renderer.render(surface, self.buffer.chronological()) {
            Ok(()) => {
                self.stats.frames_rendered += 1;
                FrameOutcome::Rendered
            }
            Err(e) => {
                self.stats.render_failures += 1;
                if e.is_transient() {
                    debug!(error = %e, "render pass skipped");
                } else {
                    warn!(error = %e, "render pass failed");
                }
                FrameOutcome::RenderSkipped
            }
        };

        self.pending = Some(self.scheduler.request_frame());
        outcome
    }

    fn sample(&mut self, now_ms: u64) {
        let snapshot = self.source.snapshot();
        match self.sampler.sample(snapshot.as_ref(), now_ms) {
            Ok(sample) => {
                self.buffer.push(sample);
                self.clock.mark_sampled(now_ms);
                self.stats.samples_taken += 1;
            }
            Err(ScopeError::SourceUnavailable) => {
                self.stats.samples_skipped += 1;
                debug!("no snapshot, sample skipped");
            }
            Err(e) => {
                self.stats.samples_skipped += 1;
                warn!(error = %e, "sampling failed");
            }
        }
    }

    /// Drop history and sampler state, as on a fresh mount.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sampler.reset();
        self.clock.reset();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn buffer(&self) -> &RingBuffer<M::Sample> {
        &self.buffer
    }

    pub fn latest(&self) -> Option<&M::Sample> {
        self.buffer.latest()
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn renderer(&self) -> &FrameRenderer<M::Sample> {
        &self.renderer
    }

    pub fn source(&self) -> &Src {
        &self.source
    }

    pub fn scheduler_mut(&mut self) -> &mut Sch {
        &mut self.scheduler
    }
}

impl<M, Src> RenderLoop<M, Src, ManualScheduler>
where
    M: MetricSampler,
    Src: SnapshotSource,
{
    /// Fire the next pending callback, if any.
    pub fn pump(&mut self, now_ms: u64, surface: &mut dyn Surface) -> Option<FrameOutcome> {
        let token = self.scheduler.fire()?;
        Some(self.on_frame(token, now_ms, surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        render::{PlotStyle, RenderConfig, Series},
        sample::DriftSample,
        sampler::DriftSampler,
        snapshot::{SharedSource, StateSnapshot},
        surface::DisplayList,
    };
    use ratatui::style::Color;

    fn drift_loop(source: SharedSource) -> RenderLoop<DriftSampler, SharedSource, ManualScheduler> {
        let config = RenderConfig {
            title: "drift".into(),
            width: 100.0,
            height: 50.0,
            padding: 5.0,
            background: Color::Black,
            grid_color: Color::DarkGray,
            label_color: Color::Gray,
            h_grid_divisions: 2,
            v_grid_divisions: 2,
            style: PlotStyle::Line,
            series: vec![Series::new("entropy", Color::Green, 1.0, DriftSample::entropy)],
            color_map: None,
            marker: None,
            alert: None,
            capacity: 4,
            sample_interval_ms: 200,
        };
        let renderer = FrameRenderer::new(config).unwrap();
        RenderLoop::new(renderer, DriftSampler, source, ManualScheduler::new()).unwrap()
    }

    fn connected() -> SharedSource {
        let source = SharedSource::new();
        source.publish(StateSnapshot { entropy: 0.5, scup: 40.0, ..Default::default() });
        source
    }

    #[test]
    fn stop_before_first_frame_renders_nothing() {
        let mut lp = drift_loop(connected());
        let mut surface = DisplayList::new(100.0, 50.0);
        lp.start();
        lp.stop();
        assert_eq!(lp.pump(0, &mut surface), None);
        assert_eq!(lp.stats().frames_rendered, 0);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn stale_token_is_ignored_after_stop() {
        let mut lp = drift_loop(connected());
        let mut surface = DisplayList::new(100.0, 50.0);
        lp.start();
        let token = lp.scheduler_mut().fire().unwrap();
        lp.stop();
        assert_eq!(lp.on_frame(token, 0, &mut surface), FrameOutcome::Ignored);
        assert_eq!(lp.stats().frames_rendered, 0);
    }

    #[test]
    fn stop_twice_is_a_noop() {
        let mut lp = drift_loop(connected());
        lp.start();
        lp.stop();
        lp.stop();
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(lp.scheduler_mut().pending(), 0);
    }

    #[test]
    fn start_twice_schedules_once() {
        let mut lp = drift_loop(connected());
        lp.start();
        lp.start();
        assert_eq!(lp.scheduler_mut().pending(), 1);
    }

    #[test]
    fn samples_on_interval_renders_every_frame() {
        let mut lp = drift_loop(connected());
        let mut surface = DisplayList::new(100.0, 50.0);
        lp.start();
        for now in [0, 16, 32, 200, 216, 399, 400] {
            assert_eq!(lp.pump(now, &mut surface), Some(FrameOutcome::Rendered));
        }
        let stats = lp.stats();
        assert_eq!(stats.frames_rendered, 7);
        assert_eq!(stats.samples_taken, 3);
        assert_eq!(lp.scheduler_mut().pending(), 1);
    }

    #[test]
    fn disconnected_source_keeps_rendering_placeholder() {
        let mut lp = drift_loop(SharedSource::new());
        let mut surface = DisplayList::new(100.0, 50.0);
        lp.start();
        lp.pump(0, &mut surface);
        lp.pump(16, &mut surface);
        assert!(lp.buffer().is_empty());
        assert_eq!(lp.stats().samples_skipped, 2);
        assert!(surface.contains_text(crate::render::PLACEHOLDER_TEXT));
        assert_eq!(lp.state(), LoopState::Running);
    }

    #[test]
    fn lost_surface_skips_render_but_loop_continues() {
        let mut lp = drift_loop(connected());
        let mut surface = DisplayList::new(100.0, 50.0);
        surface.detach();
        lp.start();
        assert_eq!(lp.pump(0, &mut surface), Some(FrameOutcome::RenderSkipped));
        assert_eq!(lp.stats().render_failures, 1);
        assert_eq!(lp.stats().samples_taken, 1);
        assert_eq!(lp.scheduler_mut().pending(), 1);
    }

    #[test]
    fn reset_clears_history() {
        let mut lp = drift_loop(connected());
        let mut surface = DisplayList::new(100.0, 50.0);
        lp.start();
        lp.pump(0, &mut surface);
        assert_eq!(lp.buffer().len(), 1);
        lp.reset();
        assert!(lp.buffer().is_empty());
        // clock was reset too, so the next frame samples immediately
        lp.pump(10, &mut surface);
        assert_eq!(lp.buffer().len(), 1);
    }
}
