//! Core value types for layout computation.

/// Tolerance used when comparing computed sizes.
pub const EPSILON: f32 = 0.0001;

/// One of the two independent layout dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutAxis {
    /// X axis (width, left/right)
    #[default]
    Horizontal,
    /// Y axis (height, top/bottom)
    Vertical,
}

impl LayoutAxis {
    /// Both axes in processing order.
    pub const ALL: [LayoutAxis; 2] = [LayoutAxis::Horizontal, LayoutAxis::Vertical];

    /// Component index into a two-element vector.
    pub fn index(self) -> usize {
        match self {
            LayoutAxis::Horizontal => 0,
            LayoutAxis::Vertical => 1,
        }
    }

    /// The other axis.
    pub fn cross(self) -> LayoutAxis {
        match self {
            LayoutAxis::Horizontal => LayoutAxis::Vertical,
            LayoutAxis::Vertical => LayoutAxis::Horizontal,
        }
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f32::clamp` this never panics: when `min > max` the result is `min`.
pub fn clamp_value(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a rectangle with position and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Start coordinate along an axis.
    pub fn origin(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.x,
            LayoutAxis::Vertical => self.y,
        }
    }

    /// Extent along an axis.
    pub fn extent(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.width,
            LayoutAxis::Vertical => self.height,
        }
    }
}

/// Margins on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Margins {
    /// Create margins from the four sides.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Leading margin (left or top) along an axis.
    pub fn leading(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.left,
            LayoutAxis::Vertical => self.top,
        }
    }

    /// Trailing margin (right or bottom) along an axis.
    pub fn trailing(&self, axis: LayoutAxis) -> f32 {
        match axis {
            LayoutAxis::Horizontal => self.right,
            LayoutAxis::Vertical => self.bottom,
        }
    }

    /// Sum of both margins along an axis.
    pub fn total(&self, axis: LayoutAxis) -> f32 {
        self.leading(axis) + self.trailing(axis)
    }
}

/// Platform-reported unusable screen margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafeAreaInsets {
    /// Inset sizes in layout units
    pub insets: Margins,
    /// The left edge is cut by a notch
    pub is_left_notch: bool,
    /// The right edge is cut by a notch
    pub is_right_notch: bool,
}

impl SafeAreaInsets {
    /// Create insets without notches.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            insets: Margins::new(left, top, right, bottom),
            is_left_notch: false,
            is_right_notch: false,
        }
    }

    /// Mark which horizontal edges have a notch.
    pub fn with_notches(mut self, left: bool, right: bool) -> Self {
        self.is_left_notch = left;
        self.is_right_notch = right;
        self
    }
}

/// How a node's size along one axis is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizePolicy {
    /// Size is left untouched
    #[default]
    Ignore,
    /// Size is the declared value
    Fixed,
    /// Percent of the parent's available space
    PercentOfParent,
    /// Percent of the sum of the children
    PercentOfChildrenSum,
    /// Percent of the largest child
    PercentOfMaxChild,
    /// Percent of the first child
    PercentOfFirstChild,
    /// Percent of the last child
    PercentOfLastChild,
    /// Percent of the intrinsic content size
    PercentOfContent,
    /// Result of a formula expression
    Formula,
}

impl SizePolicy {
    /// True for the percent kinds measured from the node's own subtree or content.
    pub fn is_percent_of_self(self) -> bool {
        matches!(
            self,
            SizePolicy::PercentOfChildrenSum
                | SizePolicy::PercentOfMaxChild
                | SizePolicy::PercentOfFirstChild
                | SizePolicy::PercentOfLastChild
                | SizePolicy::PercentOfContent
        )
    }

    /// True when the node's size must be recomputed if its children change.
    pub fn depends_on_children(self) -> bool {
        matches!(
            self,
            SizePolicy::PercentOfChildrenSum
                | SizePolicy::PercentOfMaxChild
                | SizePolicy::PercentOfFirstChild
                | SizePolicy::PercentOfLastChild
                | SizePolicy::Formula
        )
    }

    /// True when the size is computed by the parent's layout, not by measuring.
    pub fn is_measured_by_parent(self) -> bool {
        matches!(self, SizePolicy::Ignore | SizePolicy::PercentOfParent)
    }
}

/// How an anchor edge reacts to the platform safe area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SafeAreaInsetPolicy {
    /// Ignore the safe area
    #[default]
    None,
    /// Always add the inset
    Inset,
    /// Add the inset only when the edge has a notch
    InsetOnlyIfNotch,
    /// Subtract the inset
    Reverse,
}

impl SafeAreaInsetPolicy {
    /// Fold an inset into an anchor offset.
    pub fn correct(self, offset: f32, inset: f32, is_notch: bool) -> f32 {
        match self {
            SafeAreaInsetPolicy::None => offset,
            SafeAreaInsetPolicy::Inset => offset + inset,
            SafeAreaInsetPolicy::InsetOnlyIfNotch if is_notch => offset + inset,
            SafeAreaInsetPolicy::InsetOnlyIfNotch => offset,
            SafeAreaInsetPolicy::Reverse => offset - inset,
        }
    }
}

/// Declared direction of a flow item's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentDirection {
    #[default]
    Neutral,
    Ltr,
    Rtl,
}

/// Orientation of a linear layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinearOrientation {
    #[default]
    LeftToRight,
    RightToLeft,
    TopDown,
    BottomUp,
}

impl LinearOrientation {
    /// Axis along which children are stacked.
    pub fn axis(self) -> LayoutAxis {
        match self {
            LinearOrientation::LeftToRight | LinearOrientation::RightToLeft => {
                LayoutAxis::Horizontal
            }
            LinearOrientation::TopDown | LinearOrientation::BottomUp => LayoutAxis::Vertical,
        }
    }

    /// Children are placed from the trailing edge.
    pub fn is_inverse(self) -> bool {
        matches!(self, LinearOrientation::RightToLeft | LinearOrientation::BottomUp)
    }
}

/// Orientation of a flow layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowOrientation {
    #[default]
    LeftToRight,
    RightToLeft,
}
