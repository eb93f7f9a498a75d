//! Shared arithmetic for the managed layouts.

use trellis_core::EPSILON;

/// Paddings and spacing of one run of items along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacing {
    pub leading: f32,
    pub trailing: f32,
    pub spacing: f32,
}

impl Spacing {
    pub fn new(leading: f32, trailing: f32, spacing: f32) -> Self {
        Self {
            leading,
            trailing,
            spacing,
        }
    }

    /// Grow dynamic padding and spacing to consume leftover space.
    ///
    /// `rest_size` is the available extent minus the items' sizes; paddings and
    /// the `items - 1` gaps are subtracted here. The remainder is split evenly
    /// between both paddings (when dynamic) and every gap (when dynamic).
    pub fn distribute(
        &mut self,
        dynamic_padding: bool,
        dynamic_spacing: bool,
        rest_size: f32,
        items: usize,
    ) {
        if items == 0 {
            return;
        }
        let spaces = items - 1;
        let rest = rest_size - self.leading - self.trailing - self.spacing * spaces as f32;
        if rest <= EPSILON || !(dynamic_padding || (dynamic_spacing && spaces > 0)) {
            return;
        }

        let mut parts = 0;
        if dynamic_padding {
            parts += 2;
        }
        if dynamic_spacing {
            parts += spaces;
        }

        let delta = rest / parts as f32;
        if dynamic_padding {
            self.leading += delta;
            self.trailing += delta;
        }
        if dynamic_spacing {
            self.spacing += delta;
        }
    }
}

/// `percent` of `base`, guarded against non-finite input.
pub fn percent_of(base: f32, percent: f32) -> f32 {
    let value = base * percent / 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
