//! Flat per-node records used during one layout run.

use std::ops::Range;

use glam::Vec2;
use trellis_core::LayoutAxis;

bitflags::bitflags! {
    /// Per-run state of a node in the layout arena.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u16 {
        /// Width was finalized by a linear layout
        const SIZE_CALCULATED_X = 1 << 0;
        /// Height was finalized by a linear layout
        const SIZE_CALCULATED_Y = 1 << 1;
        /// Last item of a flow line
        const LAST_IN_LINE = 1 << 2;
        /// Flow item sticks to its predecessor
        const STICK_THIS = 1 << 3;
        /// The stick may never be broken
        const STICK_HARD = 1 << 4;
        const LTR = 1 << 5;
        const RTL = 1 << 6;
        /// Flow container whose horizontal line breaking already ran
        const LINES_COLLECTED = 1 << 7;
    }
}

impl LayoutFlags {
    pub fn size_calculated(axis: LayoutAxis) -> Self {
        match axis {
            LayoutAxis::Horizontal => LayoutFlags::SIZE_CALCULATED_X,
            LayoutAxis::Vertical => LayoutFlags::SIZE_CALCULATED_Y,
        }
    }
}

/// One flattened node.
///
/// Children of a node occupy the contiguous arena slots `children()`; every
/// child index is greater than its parent's.
#[derive(Debug, Clone)]
pub struct ControlLayoutData<Id> {
    node: Id,
    parent_index: Option<usize>,
    children: Range<usize>,
    size: Vec2,
    position: Vec2,
    flags: LayoutFlags,
    visible: bool,
    layout_ignored: bool,
}

impl<Id: Copy> ControlLayoutData<Id> {
    pub fn new(node: Id, parent_index: Option<usize>, size: Vec2, position: Vec2) -> Self {
        Self {
            node,
            parent_index,
            children: 0..0,
            size: size.max(Vec2::ZERO),
            position,
            flags: LayoutFlags::empty(),
            visible: true,
            layout_ignored: false,
        }
    }

    /// Record the node's visibility and `IgnoreLayout` marker.
    pub fn with_skip_state(mut self, visible: bool, layout_ignored: bool) -> Self {
        self.visible = visible;
        self.layout_ignored = layout_ignored;
        self
    }

    pub fn node(&self) -> Id {
        self.node
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    pub fn children(&self) -> Range<usize> {
        self.children.clone()
    }

    pub fn set_children(&mut self, children: Range<usize>) {
        debug_assert!(children.start <= children.end);
        self.children = children;
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn first_child_index(&self) -> usize {
        self.children.start
    }

    /// Index of the last child, `None` for a leaf.
    pub fn last_child_index(&self) -> Option<usize> {
        self.has_children().then(|| self.children.end - 1)
    }

    pub fn size(&self, axis: LayoutAxis) -> f32 {
        self.size[axis.index()]
    }

    /// Set the size along an axis. Negative and NaN values become zero.
    pub fn set_size(&mut self, axis: LayoutAxis, value: f32) {
        self.size[axis.index()] = value.max(0.0);
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn size_vec(&self) -> Vec2 {
        self.size
    }

    pub fn position(&self, axis: LayoutAxis) -> f32 {
        self.position[axis.index()]
    }

    pub fn set_position(&mut self, axis: LayoutAxis, value: f32) {
        self.position[axis.index()] = value;
    }

    pub fn position_vec(&self) -> Vec2 {
        self.position
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: LayoutFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: LayoutFlags) {
        self.flags.insert(flag);
    }

    pub fn reset_flag(&mut self, flag: LayoutFlags) {
        self.flags.remove(flag);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_layout_ignored(&self) -> bool {
        self.layout_ignored
    }

    /// True when a managed layout must not place this node.
    pub fn have_to_skip(&self, skip_invisible: bool) -> bool {
        (skip_invisible && !self.visible) || self.layout_ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_range() {
        let mut data = ControlLayoutData::new(1u32, None, Vec2::new(10.0, 20.0), Vec2::ZERO);
        assert!(!data.has_children());
        assert_eq!(data.last_child_index(), None);

        data.set_children(3..6);
        assert!(data.has_children());
        assert_eq!(data.first_child_index(), 3);
        assert_eq!(data.last_child_index(), Some(5));
    }

    #[test]
    fn test_size_never_negative() {
        let mut data = ControlLayoutData::new(0u32, Some(0), Vec2::new(-5.0, 3.0), Vec2::ZERO);
        assert_eq!(data.width(), 0.0);

        data.set_size(LayoutAxis::Vertical, -1.0);
        assert_eq!(data.height(), 0.0);
        data.set_size(LayoutAxis::Horizontal, f32::NAN);
        assert_eq!(data.width(), 0.0);
    }

    #[test]
    fn test_skip_rules() {
        let hidden = ControlLayoutData::new(0u32, None, Vec2::ZERO, Vec2::ZERO)
            .with_skip_state(false, false);
        assert!(hidden.have_to_skip(true));
        assert!(!hidden.have_to_skip(false));

        let ignored = ControlLayoutData::new(0u32, None, Vec2::ZERO, Vec2::ZERO)
            .with_skip_state(true, true);
        assert!(ignored.have_to_skip(false));
    }

    #[test]
    fn test_flags() {
        let mut data = ControlLayoutData::new(0u32, None, Vec2::ZERO, Vec2::ZERO);
        data.set_flag(LayoutFlags::size_calculated(LayoutAxis::Vertical));
        data.set_flag(LayoutFlags::STICK_THIS | LayoutFlags::RTL);
        assert!(data.has_flag(LayoutFlags::SIZE_CALCULATED_Y));
        assert!(!data.has_flag(LayoutFlags::SIZE_CALCULATED_X));
        data.reset_flag(LayoutFlags::STICK_THIS);
        assert_eq!(data.flags(), LayoutFlags::SIZE_CALCULATED_Y | LayoutFlags::RTL);
    }
}
