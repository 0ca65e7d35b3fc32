use ratatui::style::Color;

/// Immediate-mode 2D drawing target with a fixed pixel size.
/// Coordinates start at the top-left corner, y grows downwards.
pub trait Surface {
    /// `None` once the surface has been torn down.
    fn size(&self) -> Option<(f64, f64)>;
    fn clear(&mut self, color: Color);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color);
    fn rect(&mut self, origin: (f64, f64), width: f64, height: f64, color: Color, filled: bool);
    fn arc(&mut self, center: (f64, f64), radius: f64, color: Color);
    fn text(&mut self, at: (f64, f64), text: &str, color: Color);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    Line { from: (f64, f64), to: (f64, f64), color: Color },
    Rect { origin: (f64, f64), width: f64, height: f64, color: Color, filled: bool },
    Arc { center: (f64, f64), radius: f64, color: Color },
    Text { at: (f64, f64), text: String, color: Color },
}

/// Surface that records draw calls for later replay.
///
/// `clear` drops everything recorded so far, so the list always holds one
/// frame.
#[derive(Debug, Clone)]
pub struct DisplayList {
    width: f64,
    height: f64,
    detached: bool,
    background: Color,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            detached: false,
            background: Color::Reset,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Marks the surface as gone; later `size()` calls return `None`.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

impl Surface for DisplayList {
    fn size(&self) -> Option<(f64, f64)> {
        if self.detached {
            None
        } else {
            Some((self.width, self.height))
        }
    }

    fn clear(&mut self, color: Color) {
        self.ops.clear();
        self.background = color;
        self.ops.push(DrawOp::Clear(color));
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) {
        self.ops.push(DrawOp::Line { from, to, color });
    }

    fn rect(&mut self, origin: (f64, f64), width: f64, height: f64, color: Color, filled: bool) {
        self.ops.push(DrawOp::Rect { origin, width, height, color, filled });
    }

    fn arc(&mut self, center: (f64, f64), radius: f64, color: Color) {
        self.ops.push(DrawOp::Arc { center, radius, color });
    }

    fn text(&mut self, at: (f64, f64), text: &str, color: Color) {
        self.ops.push(DrawOp::Text { at, text: text.to_string(), color });
    }
}
