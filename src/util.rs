use ratatui::style::Color;

use crate::snapshot::Zone;

// Thought rate for display
pub fn format_hz(hz: f64) -> String {
    if hz >= 10.0 {
        format!("{:.0} Hz", hz)
    } else if hz >= 1.0 {
        format!("{:.1} Hz", hz)
    } else {
        format!("{:.2} Hz", hz)
    }
}

// Tick counters get large; group digits so they stay readable
pub fn format_tick(tick: u64) -> String {
    const K: u64 = 1_000;
    const M: u64 = 1_000 * K;
    if tick >= M {
        format!("{:.2}M", tick as f64 / M as f64)
    } else if tick >= K {
        format!("{:.1}k", tick as f64 / K as f64)
    } else {
        format!("{}", tick)
    }
}

/// Cold-to-hot ramp for a value in `[0, 1]`: blue -> green -> yellow -> red.
pub fn heat_color(normalized: f64) -> Color {
    let t = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
    let (r, g, b) = if t < 1.0 / 3.0 {
        let k = t * 3.0;
        (0.0, 255.0 * k, 255.0 * (1.0 - k))
    } else if t < 2.0 / 3.0 {
        let k = (t - 1.0 / 3.0) * 3.0;
        (255.0 * k, 255.0, 0.0)
    } else {
        let k = (t - 2.0 / 3.0) * 3.0;
        (255.0, 255.0 * (1.0 - k), 0.0)
    };
    Color::Rgb(r.round() as u8, g.round() as u8, b.round() as u8)
}

pub fn zone_color(zone: Zone) -> Color {
    match zone {
        Zone::Calm | Zone::Stable => Color::Green,
        Zone::Active | Zone::Flowing => Color::Cyan,
        Zone::Surge => Color::Red,
        Zone::Fragile => Color::Magenta,
        Zone::Unknown => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hz_precision_depends_on_magnitude() {
        assert_eq!(format_hz(12.4), "12 Hz");
        assert_eq!(format_hz(2.46), "2.5 Hz");
        assert_eq!(format_hz(0.5), "0.50 Hz");
    }

    #[test]
    fn ticks_are_grouped() {
        assert_eq!(format_tick(999), "999");
        assert_eq!(format_tick(12_345), "12.3k");
        assert_eq!(format_tick(2_500_000), "2.50M");
    }

    #[test]
    fn heat_ramp_endpoints() {
        assert_eq!(heat_color(0.0), Color::Rgb(0, 0, 255));
        assert_eq!(heat_color(1.0), Color::Rgb(255, 0, 0));
        assert_eq!(heat_color(f64::NAN), heat_color(0.0));
        assert!(matches!(heat_color(0.5), Color::Rgb(_, 255, 0)));
    }
}
