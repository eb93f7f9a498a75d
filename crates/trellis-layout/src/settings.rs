//! Platform inputs shared by every layout run.

use trellis_core::{Rect, SafeAreaInsets};

/// Settings the platform layer provides before a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSettings {
    /// Global right-to-left flag
    pub rtl: bool,
    pub safe_area_insets: SafeAreaInsets,
    /// Visible part of the screen in root coordinates
    pub visibility_rect: Rect,
}

impl LayoutSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn with_safe_area_insets(mut self, insets: SafeAreaInsets) -> Self {
        self.safe_area_insets = insets;
        self
    }

    pub fn with_visibility_rect(mut self, rect: Rect) -> Self {
        self.visibility_rect = rect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let settings = LayoutSettings::new()
            .with_rtl(true)
            .with_visibility_rect(Rect::new(0.0, 0.0, 320.0, 480.0));
        assert!(settings.rtl);
        assert_eq!(settings.visibility_rect.width, 320.0);
        assert_eq!(settings.safe_area_insets, SafeAreaInsets::default());
    }
}
