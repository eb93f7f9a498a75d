//! Layout components a node can declare.
//!
//! Each component is one capability the external tree exposes through
//! [`LayoutTree::extension`](crate::LayoutTree::extension).

use trellis_core::{
    ContentDirection, FlowOrientation, LayoutAxis, LinearOrientation, SafeAreaInsetPolicy,
    SizePolicy,
};
use trellis_formula::LayoutFormula;

/// Default upper size limit.
pub const DEFAULT_MAX_SIZE: f32 = 99999.0;

/// Size policy for one axis.
#[derive(Debug, Clone)]
pub struct AxisSizePolicy {
    /// Policy kind
    pub policy: SizePolicy,
    /// Fixed size, or percent for the percent kinds
    pub value: f32,
    /// Lower size limit
    pub min: f32,
    /// Upper size limit
    pub max: f32,
    formula: Option<LayoutFormula>,
}

impl Default for AxisSizePolicy {
    fn default() -> Self {
        Self {
            policy: SizePolicy::Ignore,
            value: 100.0,
            min: 0.0,
            max: DEFAULT_MAX_SIZE,
            formula: None,
        }
    }
}

impl AxisSizePolicy {
    /// A fixed size.
    pub fn fixed(value: f32) -> Self {
        Self {
            policy: SizePolicy::Fixed,
            value,
            ..Default::default()
        }
    }

    /// A percent of the parent's available space.
    pub fn percent_of_parent(percent: f32) -> Self {
        Self::percent(SizePolicy::PercentOfParent, percent)
    }

    /// Any percent policy kind.
    pub fn percent(policy: SizePolicy, percent: f32) -> Self {
        Self {
            policy,
            value: percent,
            ..Default::default()
        }
    }

    /// A formula-driven size.
    pub fn formula(source: impl Into<String>) -> Self {
        Self {
            policy: SizePolicy::Formula,
            formula: Some(LayoutFormula::new(source)),
            ..Default::default()
        }
    }

    /// Set the size limits.
    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn formula_ref(&self) -> Option<&LayoutFormula> {
        self.formula.as_ref()
    }

    /// Replace the formula source, creating the formula if needed.
    pub fn set_formula_source(&mut self, source: impl Into<String>) {
        match &mut self.formula {
            Some(formula) => formula.set_source(source),
            None => self.formula = Some(LayoutFormula::new(source)),
        }
    }

    pub fn remove_formula(&mut self) -> Option<LayoutFormula> {
        self.formula.take()
    }
}

/// Per-axis size policies of a node.
#[derive(Debug, Clone, Default)]
pub struct SizePolicyComponent {
    pub horizontal: AxisSizePolicy,
    pub vertical: AxisSizePolicy,
}

impl SizePolicyComponent {
    pub fn new(horizontal: AxisSizePolicy, vertical: AxisSizePolicy) -> Self {
        Self { horizontal, vertical }
    }

    pub fn axis(&self, axis: LayoutAxis) -> &AxisSizePolicy {
        match axis {
            LayoutAxis::Horizontal => &self.horizontal,
            LayoutAxis::Vertical => &self.vertical,
        }
    }

    pub fn axis_mut(&mut self, axis: LayoutAxis) -> &mut AxisSizePolicy {
        match axis {
            LayoutAxis::Horizontal => &mut self.horizontal,
            LayoutAxis::Vertical => &mut self.vertical,
        }
    }

    /// True when the size along `axis` is computed from the node's children.
    pub fn is_depends_on_children(&self, axis: LayoutAxis) -> bool {
        self.axis(axis).policy.depends_on_children()
    }

    /// Formula of an axis, if that axis uses the formula policy.
    pub fn formula(&self, axis: LayoutAxis) -> Option<&LayoutFormula> {
        self.axis(axis).formula_ref()
    }
}

/// Anchor pulls relative to the parent. `None` means the anchor is disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorComponent {
    pub enabled: bool,
    pub left: Option<f32>,
    pub h_center: Option<f32>,
    pub right: Option<f32>,
    pub top: Option<f32>,
    pub v_center: Option<f32>,
    pub bottom: Option<f32>,
    /// Mirror horizontal anchors on right-to-left layouts
    pub use_rtl: bool,
}

impl Default for AnchorComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            left: None,
            h_center: None,
            right: None,
            top: None,
            v_center: None,
            bottom: None,
            use_rtl: false,
        }
    }
}

impl AnchorComponent {
    /// Anchor filling the parent on both axes.
    pub fn fill() -> Self {
        Self::default()
            .with_left(0.0)
            .with_right(0.0)
            .with_top(0.0)
            .with_bottom(0.0)
    }

    pub fn with_left(mut self, offset: f32) -> Self {
        self.left = Some(offset);
        self
    }

    pub fn with_h_center(mut self, offset: f32) -> Self {
        self.h_center = Some(offset);
        self
    }

    pub fn with_right(mut self, offset: f32) -> Self {
        self.right = Some(offset);
        self
    }

    pub fn with_top(mut self, offset: f32) -> Self {
        self.top = Some(offset);
        self
    }

    pub fn with_v_center(mut self, offset: f32) -> Self {
        self.v_center = Some(offset);
        self
    }

    pub fn with_bottom(mut self, offset: f32) -> Self {
        self.bottom = Some(offset);
        self
    }

    pub fn with_rtl(mut self, use_rtl: bool) -> Self {
        self.use_rtl = use_rtl;
        self
    }

    pub fn leading(&self, axis: LayoutAxis) -> Option<f32> {
        match axis {
            LayoutAxis::Horizontal => self.left,
            LayoutAxis::Vertical => self.top,
        }
    }

    pub fn center(&self, axis: LayoutAxis) -> Option<f32> {
        match axis {
            LayoutAxis::Horizontal => self.h_center,
            LayoutAxis::Vertical => self.v_center,
        }
    }

    pub fn trailing(&self, axis: LayoutAxis) -> Option<f32> {
        match axis {
            LayoutAxis::Horizontal => self.right,
            LayoutAxis::Vertical => self.bottom,
        }
    }
}

/// Safe-area behaviour of each anchor edge. Edges are physical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorSafeAreaComponent {
    pub left: SafeAreaInsetPolicy,
    pub top: SafeAreaInsetPolicy,
    pub right: SafeAreaInsetPolicy,
    pub bottom: SafeAreaInsetPolicy,
}

impl AnchorSafeAreaComponent {
    /// Same policy on every edge.
    pub fn uniform(policy: SafeAreaInsetPolicy) -> Self {
        Self {
            left: policy,
            top: policy,
            right: policy,
            bottom: policy,
        }
    }

    pub fn leading(&self, axis: LayoutAxis) -> SafeAreaInsetPolicy {
        match axis {
            LayoutAxis::Horizontal => self.left,
            LayoutAxis::Vertical => self.top,
        }
    }

    pub fn trailing(&self, axis: LayoutAxis) -> SafeAreaInsetPolicy {
        match axis {
            LayoutAxis::Horizontal => self.right,
            LayoutAxis::Vertical => self.bottom,
        }
    }
}

/// Single-axis stack layout settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearLayoutComponent {
    pub enabled: bool,
    pub orientation: LinearOrientation,
    /// Padding on both ends of the stacking axis
    pub padding: f32,
    /// Gap between children
    pub spacing: f32,
    pub dynamic_padding: bool,
    pub dynamic_spacing: bool,
    pub skip_invisible: bool,
    pub use_rtl: bool,
    /// Add the platform safe-area insets to the padding
    pub safe_area_padding_inset: bool,
}

impl Default for LinearLayoutComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            orientation: LinearOrientation::LeftToRight,
            padding: 0.0,
            spacing: 0.0,
            dynamic_padding: false,
            dynamic_spacing: false,
            skip_invisible: true,
            use_rtl: false,
            safe_area_padding_inset: false,
        }
    }
}

impl LinearLayoutComponent {
    pub fn new(orientation: LinearOrientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    /// Create a left-to-right stack.
    pub fn horizontal() -> Self {
        Self::new(LinearOrientation::LeftToRight)
    }

    /// Create a top-down stack.
    pub fn vertical() -> Self {
        Self::new(LinearOrientation::TopDown)
    }

    pub fn axis(&self) -> LayoutAxis {
        self.orientation.axis()
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_dynamic_padding(mut self, dynamic: bool) -> Self {
        self.dynamic_padding = dynamic;
        self
    }

    pub fn with_dynamic_spacing(mut self, dynamic: bool) -> Self {
        self.dynamic_spacing = dynamic;
        self
    }

    pub fn with_rtl(mut self, use_rtl: bool) -> Self {
        self.use_rtl = use_rtl;
        self
    }

    pub fn with_safe_area_padding_inset(mut self, inset: bool) -> Self {
        self.safe_area_padding_inset = inset;
        self
    }
}

/// Line-wrapping layout settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLayoutComponent {
    pub enabled: bool,
    pub orientation: FlowOrientation,
    pub horizontal_padding: f32,
    pub horizontal_spacing: f32,
    /// Center the widest line within the container
    pub dynamic_horizontal_padding: bool,
    /// Spread each line's leftover width into its own padding
    pub dynamic_horizontal_in_line_padding: bool,
    pub dynamic_horizontal_spacing: bool,
    pub vertical_padding: f32,
    pub vertical_spacing: f32,
    pub dynamic_vertical_padding: bool,
    pub dynamic_vertical_spacing: bool,
    pub skip_invisible: bool,
    pub use_rtl: bool,
    pub horizontal_safe_area_padding_inset: bool,
    pub vertical_safe_area_padding_inset: bool,
}

impl Default for FlowLayoutComponent {
    fn default() -> Self {
        Self {
            enabled: true,
            orientation: FlowOrientation::LeftToRight,
            horizontal_padding: 0.0,
            horizontal_spacing: 0.0,
            dynamic_horizontal_padding: false,
            dynamic_horizontal_in_line_padding: false,
            dynamic_horizontal_spacing: false,
            vertical_padding: 0.0,
            vertical_spacing: 0.0,
            dynamic_vertical_padding: false,
            dynamic_vertical_spacing: false,
            skip_invisible: true,
            use_rtl: false,
            horizontal_safe_area_padding_inset: false,
            vertical_safe_area_padding_inset: false,
        }
    }
}

impl FlowLayoutComponent {
    pub fn new(orientation: FlowOrientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    pub fn with_padding(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_padding = horizontal;
        self.vertical_padding = vertical;
        self
    }

    pub fn with_spacing(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }

    pub fn with_rtl(mut self, use_rtl: bool) -> Self {
        self.use_rtl = use_rtl;
        self
    }

    pub fn padding(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.horizontal_padding,
            LayoutAxis::Vertical => self.vertical_padding,
        }
    }

    pub fn spacing(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.horizontal_spacing,
            LayoutAxis::Vertical => self.vertical_spacing,
        }
    }

    pub fn safe_area_padding_inset(&self, axis: LayoutAxis) -> bool {
        match axis {
            LayoutAxis::Horizontal => self.horizontal_safe_area_padding_inset,
            LayoutAxis::Vertical => self.vertical_safe_area_padding_inset,
        }
    }
}

/// Per-child hints for a flow layout.
///
/// A stick is dropped when the later item carries an explicit direction that
/// differs from the earlier one, so a `Neutral` item does not stick to an
/// unhinted item of a left-to-right layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowLayoutHintComponent {
    pub new_line_before_this: bool,
    pub new_line_after_this: bool,
    pub stick_item_before_this: bool,
    pub stick_item_after_this: bool,
    pub stick_hard_before_this: bool,
    pub stick_hard_after_this: bool,
    pub content_direction: ContentDirection,
}

impl FlowLayoutHintComponent {
    pub fn with_new_line_before(mut self) -> Self {
        self.new_line_before_this = true;
        self
    }

    pub fn with_new_line_after(mut self) -> Self {
        self.new_line_after_this = true;
        self
    }

    /// Never break between this item and the previous one unless overflowing.
    pub fn with_stick_before(mut self, hard: bool) -> Self {
        self.stick_item_before_this = true;
        self.stick_hard_before_this = hard;
        self
    }

    /// Never break between this item and the next one unless overflowing.
    pub fn with_stick_after(mut self, hard: bool) -> Self {
        self.stick_item_after_this = true;
        self.stick_hard_after_this = hard;
        self
    }

    pub fn with_direction(mut self, direction: ContentDirection) -> Self {
        self.content_direction = direction;
        self
    }
}
