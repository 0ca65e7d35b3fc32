use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle},
        Block, BorderType, Borders, Paragraph,
    },
    Frame, Terminal,
};
use tracing::{error, info};

use crate::app::App;
use crate::snapshot::StateSnapshot;
use crate::surface::{DisplayList, DrawOp};
use crate::util::{format_hz, format_tick, heat_color, zone_color};

pub fn run(app: App, frame_interval: Duration, shutdown: Arc<AtomicBool>, source_label: &str) -> io::Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_loop(&mut terminal, app, frame_interval, &shutdown, source_label);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "display loop failed");
    }
    res
}

fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    frame_interval: Duration,
    shutdown: &AtomicBool,
    source_label: &str,
) -> io::Result<()> {
    let started = Instant::now();
    let mut last_frame = Instant::now();
    app.start();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        terminal.draw(|f| draw(f, &app, source_label))?;

        // Handle input until the next display frame is due
        let timeout = frame_interval.checked_sub(last_frame.elapsed()).unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('c') => break,
                        KeyCode::Char('r') => {
                            info!("panels reset");
                            app.reset();
                        }
                        KeyCode::Char('p') => app.toggle_pause(),
                        _ => {}
                    }
                }
            }
        }
        if last_frame.elapsed() >= frame_interval {
            app.on_frame(started.elapsed().as_millis() as u64);
            last_frame = Instant::now();
        }
    }

    // unmount: no frame may land on the panels after this point
    app.stop();
    app.drift.surface.detach();
    app.rate.surface.detach();
    Ok(())
}

fn draw(f: &mut Frame, app: &App, source_label: &str) {
    // ============= whole screen layout ============
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Panels
            Constraint::Length(1), // Bottom Status Bar
        ])
        .split(f.size());

    let panel_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[0]);

    draw_panel(f, panel_chunks[0], &app.drift.surface, " Drift ", Color::Magenta);
    draw_panel(f, panel_chunks[1], &app.rate.surface, " Thought Rate ", Color::Yellow);
    draw_status_bar(f, main_chunks[1], app, source_label);
}

fn draw_panel(f: &mut Frame, area: Rect, surface: &DisplayList, title: &str, accent: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(accent))
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(surface.background())
        .x_bounds([0.0, surface.width()])
        .y_bounds([0.0, surface.height()])
        .paint(|ctx| replay(surface, ctx));
    f.render_widget(canvas, area);
}

/// Paint a recorded frame into a ratatui canvas. Canvas y grows upwards,
/// display lists grow downwards.
pub fn replay(surface: &DisplayList, ctx: &mut Context) {
    let h = surface.height();
    for op in surface.ops() {
        match op {
            DrawOp::Clear(_) => {}
            DrawOp::Line { from, to, color } => ctx.draw(&CanvasLine {
                x1: from.0,
                y1: h - from.1,
                x2: to.0,
                y2: h - to.1,
                color: *color,
            }),
            DrawOp::Rect { origin, width, height, color, filled: true } => {
                // fill with vertical strokes, one per surface unit
                let mut x = origin.0;
                while x <= origin.0 + width {
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: h - origin.1 - height,
                        x2: x,
                        y2: h - origin.1,
                        color: *color,
                    });
                    x += 1.0;
                }
            }
            DrawOp::Rect { origin, width, height, color, filled: false } => ctx.draw(&Rectangle {
                x: origin.0,
                y: h - origin.1 - height,
                width: *width,
                height: *height,
                color: *color,
            }),
            DrawOp::Arc { center, radius, color } => ctx.draw(&Circle {
                x: center.0,
                y: h - center.1,
                radius: *radius,
                color: *color,
            }),
            DrawOp::Text { at, text, color } => {
                ctx.print(at.0, h - at.1, Span::styled(text.clone(), Style::default().fg(*color)))
            }
        }
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App, source_label: &str) {
    let snapshot = app.snapshot();
    let (link, link_color) = if snapshot.is_some() { ("UP", Color::Green) } else { ("DOWN", Color::Red) };

    let mut spans = vec![
        Span::styled(" TELEMETRY ", Style::default().bg(Color::White).fg(Color::Black).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", source_label)),
        Span::styled(link, Style::default().fg(link_color).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
    ];

    if let Some(snap) = &snapshot {
        spans.extend(snapshot_spans(snap));
    }

    let peak_time = app.peak_hz_record.1.format("%H:%M:%S").to_string();
    spans.push(Span::styled("PEAK: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    spans.push(Span::raw(format!("{} ", format_hz(app.peak_hz_record.0))));
    spans.push(Span::styled(format!("(@{})", peak_time), Style::default().fg(Color::DarkGray)));
    if app.paused {
        spans.push(Span::styled(" PAUSED", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)));
    }
    spans.push(Span::raw(" | q quit  r reset  p pause"));

    let status_bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(status_bar, area);
}

/// Status-bar fields taken straight from the latest snapshot.
fn snapshot_spans(snap: &StateSnapshot) -> Vec<Span<'static>> {
    let key = Style::default().fg(Color::DarkGray);
    vec![
        Span::styled("TICK ", key),
        Span::raw(format!("{} ", format_tick(snap.tick_number))),
        Span::styled("ZONE ", key),
        Span::styled(
            format!("{} ", snap.zone.label()),
            Style::default().fg(zone_color(snap.zone)).add_modifier(Modifier::BOLD),
        ),
        Span::styled("HEAT ", key),
        Span::styled(format!("{:.2} ", snap.heat), Style::default().fg(heat_color(snap.heat))),
        Span::styled("REBLOOM ", key),
        Span::raw(format!("{} ", snap.rebloom_count)),
        Span::styled("MOOD ", key),
        Span::raw(format!("{} ", snap.mood.as_deref().unwrap_or("-"))),
        Span::raw("| "),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Zone;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn status_shows_heat_and_rebloom() {
        let snap = StateSnapshot {
            tick_number: 1_500,
            heat: 0.42,
            rebloom_count: 12,
            zone: Zone::Surge,
            mood: Some("curious".into()),
            ..Default::default()
        };
        let line = text(&snapshot_spans(&snap));
        assert!(line.contains("TICK 1.5k"), "{line}");
        assert!(line.contains("ZONE SURGE"), "{line}");
        assert!(line.contains("HEAT 0.42"), "{line}");
        assert!(line.contains("REBLOOM 12"), "{line}");
        assert!(line.contains("MOOD curious"), "{line}");
    }

    #[test]
    fn heat_span_uses_heat_ramp() {
        let snap = StateSnapshot { heat: 1.0, ..Default::default() };
        let spans = snapshot_spans(&snap);
        let heat = spans.iter().find(|s| s.content.starts_with("1.00")).unwrap();
        assert_eq!(heat.style.fg, Some(Color::Rgb(255, 0, 0)));
    }
}
