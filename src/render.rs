use ratatui::style::Color;

use crate::{error::ScopeError, surface::Surface};

pub const PLACEHOLDER_TEXT: &str = "waiting for data";

const READOUT_LINE_HEIGHT: f64 = 12.0;
const MARKER_RADIUS: f64 = 2.0;
// share of each bar slot that is filled
const BAR_FILL: f64 = 0.8;

/// One plotted metric: fixed 0..scale value axis, never auto-scaled.
#[derive(Debug, Clone)]
pub struct Series<T> {
    pub label: String,
    pub color: Color,
    pub scale: f64,
    pub precision: usize,
    pub value: fn(&T) -> f64,
}

impl<T> Series<T> {
    pub fn new(label: impl Into<String>, color: Color, scale: f64, value: fn(&T) -> f64) -> Self {
        Self {
            label: label.into(),
            color,
            scale,
            precision: 2,
            value,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn normalized(&self, sample: &T) -> f64 {
        if self.scale <= 0.0 {
            return 0.0;
        }
        ((self.value)(sample) / self.scale).clamp(0.0, 1.0)
    }

    fn format(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStyle {
    /// Connected polyline per series.
    Line,
    /// One bar per sample for the first series, coloured by the colour map.
    Bars,
}

/// Annotation raised by comparing the latest sample with one `lookback`
/// samples earlier.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertRule {
    Drop { series: usize, lookback: usize, ratio: f64, label: String },
    Rise { series: usize, lookback: usize, delta: f64, label: String },
}

impl AlertRule {
    fn series(&self) -> usize {
        match self {
            AlertRule::Drop { series, .. } | AlertRule::Rise { series, .. } => *series,
        }
    }

    fn lookback(&self) -> usize {
        match self {
            AlertRule::Drop { lookback, .. } | AlertRule::Rise { lookback, .. } => *lookback,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AlertRule::Drop { label, .. } | AlertRule::Rise { label, .. } => label,
        }
    }

    fn triggered(&self, prior: f64, latest: f64) -> bool {
        match self {
            AlertRule::Drop { ratio, .. } => prior > 0.0 && latest < prior * ratio,
            AlertRule::Rise { delta, .. } => latest - prior >= *delta,
        }
    }
}

/// Per-panel drawing parameters, fixed for the life of the panel.
#[derive(Debug, Clone)]
pub struct RenderConfig<T> {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub background: Color,
    pub grid_color: Color,
    pub label_color: Color,
    /// Bands between horizontal grid lines; `n` bands draw `n + 1` lines,
    /// 0 draws none.
    pub h_grid_divisions: usize,
    /// Same for vertical lines along the time axis.
    pub v_grid_divisions: usize,
    pub style: PlotStyle,
    pub series: Vec<Series<T>>,
    pub color_map: Option<fn(f64) -> Color>,
    pub marker: Option<fn(&T) -> bool>,
    pub alert: Option<AlertRule>,
    pub capacity: usize,
    pub sample_interval_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct PlotArea {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl PlotArea {
    fn bottom(&self) -> f64 {
        self.y + self.h
    }

    fn y_for(&self, normalized: f64) -> f64 {
        self.y + self.h * (1.0 - normalized)
    }
}

/// Draws a chronological sample sequence onto a [`Surface`].
///
/// Output depends only on the samples and the config; nothing here reads
/// the clock.
#[derive(Debug, Clone)]
pub struct FrameRenderer<T> {
    config: RenderConfig<T>,
}

impl<T> FrameRenderer<T> {
    pub fn new(config: RenderConfig<T>) -> Result<Self, ScopeError> {
        if config.capacity == 0 {
            return Err(ScopeError::InvalidCapacity);
        }
        if config.series.is_empty() {
            return Err(ScopeError::Config(format!("panel '{}' has no series", config.title)));
        }
        if let Some(rule) = &config.alert {
            if rule.series() >= config.series.len() {
                return Err(ScopeError::Config(format!(
                    "alert on '{}' refers to series {} of {}",
                    config.title,
                    rule.series(),
                    config.series.len()
                )));
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &RenderConfig<T> {
        &self.config
    }

    pub fn render<'a, I>(&self, surface: &mut dyn Surface, samples: I) -> Result<(), ScopeError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let (width, height) = surface.size().ok_or(ScopeError::SurfaceUnavailable)?;
        let cfg = &self.config;
        let pad = cfg.padding;
        let area = PlotArea {
            x: pad,
            y: pad,
            w: (width - 2.0 * pad).max(1.0),
            h: (height - 2.0 * pad).max(1.0),
        };

        surface.clear(cfg.background);
        surface.text((pad, pad / 4.0), &cfg.title, cfg.label_color);
        self.draw_grid(surface, area);

        let points: Vec<&T> = samples.into_iter().collect();
        if points.len() < 2 {
            let at = (area.x + area.w / 4.0, area.y + area.h / 2.0);
            surface.text(at, PLACEHOLDER_TEXT, cfg.label_color);
            return Ok(());
        }

        match cfg.style {
            PlotStyle::Line => self.draw_lines(surface, area, &points),
            PlotStyle::Bars => self.draw_bars(surface, area, &points),
        }
        self.draw_markers(surface, area, &points);
        self.draw_readout(surface, area, &points);
        if let Some(label) = self.alert(&points) {
            surface.text((area.x + 4.0, area.bottom() - READOUT_LINE_HEIGHT), &format!("! {label}"), Color::Red);
        }
        Ok(())
    }

    /// Label of the configured alert if it fires for these samples.
    pub fn alert(&self, points: &[&T]) -> Option<&str> {
        let rule = self.config.alert.as_ref()?;
        let lookback = rule.lookback().max(1);
        if points.len() <= lookback {
            return None;
        }
        let series = &self.config.series[rule.series()];
        let latest = (series.value)(points[points.len() - 1]);
        let prior = (series.value)(points[points.len() - 1 - lookback]);
        rule.triggered(prior, latest).then(|| rule.label())
    }

    fn x_for(&self, area: PlotArea, index: usize) -> f64 {
        let span = self.config.capacity.saturating_sub(1).max(1) as f64;
        area.x + area.w * (index as f64 / span)
    }

    fn bar_width(&self, area: PlotArea) -> f64 {
        area.w / self.config.capacity as f64 * BAR_FILL
    }

    /// Horizontal position of sample `index` for the configured style.
    /// Bars are centred on it; markers are drawn through it.
    fn sample_x(&self, area: PlotArea, index: usize) -> f64 {
        match self.config.style {
            PlotStyle::Line => self.x_for(area, index),
            PlotStyle::Bars => {
                let slot_w = area.w / self.config.capacity as f64;
                let bar_area = PlotArea { w: area.w - slot_w, ..area };
                self.x_for(bar_area, index) + self.bar_width(area) / 2.0
            }
        }
    }

    fn draw_grid(&self, surface: &mut dyn Surface, area: PlotArea) {
        let cfg = &self.config;
        let rows = cfg.h_grid_divisions;
        for i in grid_steps(rows) {
            let frac = i as f64 / rows as f64;
            let y = area.y + area.h * frac;
            surface.line((area.x, y), (area.x + area.w, y), cfg.grid_color);

            // left axis for the first series, right axis for the second
            if let Some(first) = cfg.series.first() {
                let label = first.format(first.scale * (1.0 - frac));
                surface.text((0.0, y), &label, first.color);
            }
            if let Some(second) = cfg.series.get(1) {
                let label = second.format(second.scale * (1.0 - frac));
                surface.text((area.x + area.w + 2.0, y), &label, second.color);
            }
        }

        let cols = cfg.v_grid_divisions;
        let window_ms = cfg.capacity.saturating_sub(1) as f64 * cfg.sample_interval_ms as f64;
        for j in grid_steps(cols) {
            let frac = j as f64 / cols as f64;
            let x = area.x + area.w * frac;
            surface.line((x, area.y), (x, area.bottom()), cfg.grid_color);
            let secs_ago = window_ms * (1.0 - frac) / 1000.0;
            let label = if secs_ago < 0.05 { "now".to_string() } else { format!("-{secs_ago:.0}s") };
            surface.text((x, area.bottom() + 2.0), &label, cfg.label_color);
        }
    }

    fn draw_lines(&self, surface: &mut dyn Surface, area: PlotArea, points: &[&T]) {
        for series in &self.config.series {
            let coords: Vec<(f64, f64)> = points
                .iter()
                .enumerate()
                .map(|(i, p)| (self.sample_x(area, i), area.y_for(series.normalized(p))))
                .collect();
            for pair in coords.windows(2) {
                surface.line(pair[0], pair[1], series.color);
            }
            if let Some(&last) = coords.last() {
                surface.arc(last, MARKER_RADIUS, series.color);
            }
        }
    }

    fn draw_bars(&self, surface: &mut dyn Surface, area: PlotArea, points: &[&T]) {
        let series = &self.config.series[0];
        let bar_w = self.bar_width(area);
        for (i, p) in points.iter().enumerate() {
            let norm = series.normalized(p);
            let color = self.config.color_map.map_or(series.color, |map| map(norm));
            let top = area.y_for(norm);
            let x = self.sample_x(area, i) - bar_w / 2.0;
            surface.rect((x, top), bar_w, area.bottom() - top, color, true);
        }
    }

    fn draw_markers(&self, surface: &mut dyn Surface, area: PlotArea, points: &[&T]) {
        let Some(marker) = self.config.marker else {
            return;
        };
        for (i, p) in points.iter().enumerate() {
            if marker(p) {
                let x = self.sample_x(area, i);
                surface.line((x, area.bottom()), (x, area.bottom() - 2.0 * MARKER_RADIUS), Color::Yellow);
            }
        }
    }

    fn draw_readout(&self, surface: &mut dyn Surface, area: PlotArea, points: &[&T]) {
        let Some(latest) = points.last() else {
            return;
        };
        let x = area.x + area.w * 0.6;
        for (k, series) in self.config.series.iter().enumerate() {
            let text = format!("{}: {}", series.label, series.format((series.value)(latest)));
            surface.text((x, area.y + 2.0 + k as f64 * READOUT_LINE_HEIGHT), &text, series.color);
        }
    }
}

/// Line indices for `divisions` bands: none when 0, else both edges plus
/// the inner lines.
fn grid_steps(divisions: usize) -> std::ops::Range<usize> {
    if divisions == 0 {
        0..0
    } else {
        0..divisions + 1
    }
}
