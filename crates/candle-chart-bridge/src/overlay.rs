/// Default horizontal line width in pixels.
pub const DEFAULT_LINE_WIDTH: u32 = 2;

/// Line dash pattern, numbered the way the renderer numbers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
    LargeDashed,
    SparseDotted,
}

impl LineStyle {
    pub fn code(self) -> u8 {
        match self {
            LineStyle::Solid => 0,
            LineStyle::Dotted => 1,
            LineStyle::Dashed => 2,
            LineStyle::LargeDashed => 3,
            LineStyle::SparseDotted => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LineStyle::Solid),
            1 => Some(LineStyle::Dotted),
            2 => Some(LineStyle::Dashed),
            3 => Some(LineStyle::LargeDashed),
            4 => Some(LineStyle::SparseDotted),
            _ => None,
        }
    }
}

/// A horizontal price line drawn over the candles.
///
/// `color` is any CSS color and is passed through unchecked.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalLine {
    pub price: f64,
    pub color: String,
    pub label: String,
    pub line_width: u32,
    pub line_style: LineStyle,
}

impl HorizontalLine {
    /// A solid line of [`DEFAULT_LINE_WIDTH`] pixels.
    pub fn new(price: f64, color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            price,
            color: color.into(),
            label: label.into(),
            line_width: DEFAULT_LINE_WIDTH,
            line_style: LineStyle::Solid,
        }
    }

    pub fn with_width(mut self, line_width: u32) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_two_pixel_solid() {
        let line = HorizontalLine::new(42.5, "#ff0000", "Support");
        assert_eq!(line.line_width, 2);
        assert_eq!(line.line_style, LineStyle::Solid);
        assert_eq!(line.line_style.code(), 0);
    }

    #[test]
    fn builders_override_defaults() {
        let line = HorizontalLine::new(1.0, "blue", "x")
            .with_width(4)
            .with_style(LineStyle::Dashed);
        assert_eq!(line.line_width, 4);
        assert_eq!(line.line_style.code(), 2);
    }

    #[test]
    fn style_codes_round_trip() {
        for code in 0..=4 {
            assert_eq!(LineStyle::from_code(code).unwrap().code(), code);
        }
        assert_eq!(LineStyle::from_code(5), None);
    }
}
