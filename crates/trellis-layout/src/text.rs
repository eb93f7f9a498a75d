//! Estimated text metrics for content-sized labels.
//!
//! Measurement is character based. Hosts with real font shaping implement
//! [`LayoutTree::preferred_content_size`](crate::LayoutTree) themselves.

/// Font parameters that affect measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStyle {
    /// Font size in pixels
    pub font_size: f32,
    /// Line height as a multiplier of the font size
    pub line_height: f32,
    /// Extra advance per character in pixels
    pub letter_spacing: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_height: 1.25,
            letter_spacing: 0.0,
        }
    }
}

/// Measured text block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    pub lines: u32,
}

/// Text carried by a node.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextContent {
    pub text: String,
    pub style: TextStyle,
    /// Wraps at word boundaries when given a width
    pub multiline: bool,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    pub fn measure(&self, max_width: Option<f32>) -> TextMetrics {
        let max_width = if self.multiline { max_width } else { None };
        measure_text(&self.text, &self.style, max_width)
    }
}

/// Measure `text`, wrapping words when `max_width` is positive.
pub fn measure_text(text: &str, style: &TextStyle, max_width: Option<f32>) -> TextMetrics {
    let line_height = style.font_size * style.line_height;
    if text.is_empty() {
        return TextMetrics {
            width: 0.0,
            height: line_height,
            lines: 1,
        };
    }

    let char_width = char_width(style);
    match max_width {
        Some(max_width) if max_width > 0.0 => {
            measure_wrapped(text, line_height, max_width, char_width)
        }
        _ => TextMetrics {
            width: text.chars().count() as f32 * char_width,
            height: line_height,
            lines: 1,
        },
    }
}

fn char_width(style: &TextStyle) -> f32 {
    // proportional fonts average a little over half an em
    style.font_size * 0.55 + style.letter_spacing
}

fn measure_wrapped(text: &str, line_height: f32, max_width: f32, char_width: f32) -> TextMetrics {
    let mut widest = 0.0f32;
    let mut lines = 0u32;
    let mut current = 0.0f32;

    for word in text.split_whitespace() {
        let word_width = word.chars().count() as f32 * char_width;
        if current == 0.0 {
            current = word_width;
        } else if current + char_width + word_width <= max_width {
            current += char_width + word_width;
        } else {
            widest = widest.max(current);
            lines += 1;
            current = word_width;
        }
    }
    if current > 0.0 {
        widest = widest.max(current);
        lines += 1;
    }

    let lines = lines.max(1);
    TextMetrics {
        width: widest,
        height: lines as f32 * line_height,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle {
            font_size: 20.0,
            line_height: 1.5,
            letter_spacing: 0.0,
        }
    }

    #[test]
    fn test_measure_empty_text() {
        let metrics = measure_text("", &style(), None);
        assert_eq!(metrics.width, 0.0);
        assert_eq!(metrics.height, 30.0);
    }

    #[test]
    fn test_measure_single_line() {
        // 11 characters at 11px each
        let metrics = measure_text("hello world", &style(), None);
        assert_eq!(metrics.width, 121.0);
        assert_eq!(metrics.lines, 1);
    }

    #[test]
    fn test_measure_wrapped() {
        // "aaaa" is 44 wide; two words plus a space need 99
        let metrics = measure_text("aaaa aaaa aaaa", &style(), Some(100.0));
        assert_eq!(metrics.lines, 2);
        assert_eq!(metrics.width, 99.0);
        assert_eq!(metrics.height, 60.0);
    }

    #[test]
    fn test_single_line_content_ignores_width() {
        let content = TextContent::new("aaaa aaaa aaaa").with_style(style());
        assert_eq!(content.measure(Some(50.0)).lines, 1);
        assert_eq!(content.with_multiline(true).measure(Some(50.0)).lines, 3);
    }
}
