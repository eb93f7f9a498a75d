//! Anchor resolution: leading, center and trailing pulls relative to the parent.

use trellis_core::{clamp_value, LayoutAxis, SizePolicy};

use crate::helpers::percent_of;
use crate::layouter::LayoutContext;
use crate::node::LayoutTree;
use crate::size_measuring::SizeMeasuringAlgorithm;

/// Places children of a container that has no managed layout on an axis,
/// and the skipped children of one that has.
pub struct AnchorLayoutAlgorithm<'c, 'a, T: LayoutTree> {
    ctx: &'c mut LayoutContext<'a, T>,
}

impl<'c, 'a, T: LayoutTree> AnchorLayoutAlgorithm<'c, 'a, T> {
    pub fn new(ctx: &'c mut LayoutContext<'a, T>) -> Self {
        Self { ctx }
    }

    /// Anchor the children of `container` within `[0, container size]`.
    ///
    /// With `only_ignored` set, only children carrying `IgnoreLayout` are touched.
    pub fn apply(&mut self, container: usize, axis: LayoutAxis, only_ignored: bool) {
        let data = self.ctx.data(container);
        let size = data.size(axis);
        for child in data.children() {
            if !only_ignored || self.ctx.data(child).have_to_skip(false) {
                self.apply_anchor(child, axis, 0.0, size);
            }
        }
    }

    /// Size parent-dependent policies, then resolve anchors within `[min, max]`.
    pub fn apply_anchor(&mut self, child: usize, axis: LayoutAxis, min: f32, max: f32) {
        self.resize_dependent_on_parent(child, axis, max - min);
        position_by_anchors(self.ctx, child, axis, min, max);
    }

    fn resize_dependent_on_parent(&mut self, child: usize, axis: LayoutAxis, parent_size: f32) {
        let Some(policy) = self.ctx.node(child).size_policy() else {
            return;
        };
        let policy = policy.axis(axis);

        let size = match policy.policy {
            SizePolicy::PercentOfParent => {
                clamp_value(percent_of(parent_size, policy.value), policy.min, policy.max)
            }
            SizePolicy::Formula if !self.ctx.is_measuring() => return,
            SizePolicy::Formula => SizeMeasuringAlgorithm::new(self.ctx, child, axis, policy)
                .with_parent_size(parent_size)
                .calculate(),
            _ => return,
        };
        self.ctx.data_mut(child).set_size(axis, size);
    }
}

/// Resolve a child's anchors within `[min, max]` on one axis.
///
/// Safe-area insets are folded into the physical edges after the
/// right-to-left swap.
pub(crate) fn position_by_anchors<T: LayoutTree>(
    ctx: &mut LayoutContext<'_, T>,
    child: usize,
    axis: LayoutAxis,
    min: f32,
    max: f32,
) {
    let node = ctx.node(child);
    let Some(anchor) = node.anchor() else {
        return;
    };
    let settings = ctx.settings();

    let mut leading = anchor.leading(axis);
    let mut center = anchor.center(axis);
    let mut trailing = anchor.trailing(axis);

    if axis == LayoutAxis::Horizontal && settings.rtl && anchor.use_rtl {
        std::mem::swap(&mut leading, &mut trailing);
        center = center.map(|offset| -offset);
    }

    if let Some(safe_area) = node.anchor_safe_area() {
        let insets = &settings.safe_area_insets;
        let (leading_notch, trailing_notch) = match axis {
            LayoutAxis::Horizontal => (insets.is_left_notch, insets.is_right_notch),
            LayoutAxis::Vertical => (false, false),
        };
        leading = leading.map(|offset| {
            safe_area
                .leading(axis)
                .correct(offset, insets.insets.leading(axis), leading_notch)
        });
        trailing = trailing.map(|offset| {
            safe_area
                .trailing(axis)
                .correct(offset, insets.insets.trailing(axis), trailing_notch)
        });
    }

    let parent_size = max - min;
    let data = ctx.data_mut(child);
    let size = data.size(axis);

    let (position, size) = match (leading, center, trailing) {
        (Some(leading), _, Some(trailing)) => (leading, parent_size - (leading + trailing)),
        (Some(leading), Some(center), None) => (leading, parent_size / 2.0 - (leading - center)),
        (None, Some(center), Some(trailing)) => {
            (parent_size / 2.0 + center, parent_size / 2.0 - (center + trailing))
        }
        (Some(leading), None, None) => (leading, size),
        (None, Some(center), None) => ((parent_size - size) / 2.0 + center, size),
        (None, None, Some(trailing)) => (parent_size - (size + trailing), size),
        (None, None, None) => return,
    };

    data.set_position(axis, position + min);
    data.set_size(axis, size);
}

#[cfg(test)]
mod tests {
    use crate::components::{
        AnchorComponent, AnchorSafeAreaComponent, AxisSizePolicy, SizePolicyComponent,
    };
    use crate::layouter::Layouter;
    use crate::tree::{Bounds, NodeId, UiNode, UiTree};
    use trellis_core::{SafeAreaInsetPolicy, SafeAreaInsets};

    fn layout_child(child: UiNode, rtl: bool, insets: SafeAreaInsets) -> Bounds {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(200.0, 100.0));
        let child: NodeId = tree.add_child(root, child).unwrap();

        let mut layouter = Layouter::new();
        layouter.set_rtl(rtl);
        layouter.set_safe_area_insets(insets);
        layouter.apply_layout(&mut tree, root);
        tree.bounds(child).unwrap()
    }

    fn anchored(anchor: AnchorComponent) -> UiNode {
        UiNode::new().with_size(20.0, 10.0).with_anchor(anchor)
    }

    #[test]
    fn test_leading_and_trailing_stretch() {
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_left(10.0).with_right(30.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.x, 10.0);
        assert_eq!(bounds.width, 160.0);
    }

    #[test]
    fn test_leading_and_center() {
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_left(10.0).with_h_center(20.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.x, 10.0);
        assert_eq!(bounds.width, 110.0);
    }

    #[test]
    fn test_center_and_trailing() {
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_v_center(-10.0).with_bottom(5.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.y, 40.0);
        assert_eq!(bounds.height, 55.0);
    }

    #[test]
    fn test_single_anchors_keep_size() {
        let center = layout_child(
            anchored(AnchorComponent::default().with_h_center(5.0).with_top(3.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!((center.x, center.y), (95.0, 3.0));
        assert_eq!(center.width, 20.0);

        let trailing = layout_child(
            anchored(AnchorComponent::default().with_right(10.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(trailing.x, 170.0);
    }

    #[test]
    fn test_no_anchor_leaves_child_untouched() {
        let bounds = layout_child(
            UiNode::new().with_size(20.0, 10.0).with_position(7.0, 8.0),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds, Bounds::new(7.0, 8.0, 20.0, 10.0));
    }

    #[test]
    fn test_over_constrained_size_clamps_to_zero() {
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_left(150.0).with_right(100.0)),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.width, 0.0);
    }

    #[test]
    fn test_rtl_mirrors_leading_anchor() {
        let anchor = AnchorComponent::default().with_left(15.0).with_rtl(true);
        let ltr = layout_child(anchored(anchor), false, SafeAreaInsets::default());
        let rtl = layout_child(anchored(anchor), true, SafeAreaInsets::default());
        assert_eq!(ltr.x, 15.0);
        assert_eq!(rtl.x, 200.0 - 15.0 - 20.0);
    }

    #[test]
    fn test_rtl_ignored_without_opt_in() {
        let anchor = AnchorComponent::default().with_left(15.0);
        let rtl = layout_child(anchored(anchor), true, SafeAreaInsets::default());
        assert_eq!(rtl.x, 15.0);
    }

    #[test]
    fn test_safe_area_policies() {
        let insets = SafeAreaInsets::new(40.0, 20.0, 10.0, 30.0).with_notches(false, true);
        let safe_area = AnchorSafeAreaComponent {
            left: SafeAreaInsetPolicy::InsetOnlyIfNotch,
            right: SafeAreaInsetPolicy::InsetOnlyIfNotch,
            top: SafeAreaInsetPolicy::Inset,
            bottom: SafeAreaInsetPolicy::Reverse,
        };
        let bounds = layout_child(
            anchored(AnchorComponent::fill()).with_anchor_safe_area(safe_area),
            false,
            insets,
        );
        // only the right edge has a notch
        assert_eq!(bounds.x, 0.0);
        assert_eq!(bounds.width, 190.0);
        assert_eq!(bounds.y, 20.0);
        assert_eq!(bounds.height, 100.0 - 20.0 + 30.0);
    }

    #[test]
    fn test_safe_area_after_rtl_swap_uses_physical_edges() {
        let insets = SafeAreaInsets::new(40.0, 0.0, 0.0, 0.0);
        let safe_area = AnchorSafeAreaComponent {
            left: SafeAreaInsetPolicy::Inset,
            ..Default::default()
        };
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_right(0.0).with_rtl(true))
                .with_anchor_safe_area(safe_area),
            true,
            insets,
        );
        // the right anchor becomes a left anchor and picks up the left inset
        assert_eq!(bounds.x, 40.0);
    }

    #[test]
    fn test_percent_of_parent_resolved_before_anchoring() {
        let bounds = layout_child(
            anchored(AnchorComponent::default().with_h_center(0.0)).with_size_policy(
                SizePolicyComponent::new(
                    AxisSizePolicy::percent_of_parent(50.0),
                    AxisSizePolicy::percent_of_parent(10.0).with_limits(15.0, 99999.0),
                ),
            ),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.width, 100.0);
        assert_eq!(bounds.x, 50.0);
        assert_eq!(bounds.height, 15.0);
    }

    #[test]
    fn test_formula_sees_parent_size() {
        let bounds = layout_child(
            UiNode::new().with_size_policy(SizePolicyComponent::new(
                AxisSizePolicy::formula("parent - 40"),
                AxisSizePolicy::formula("parent / 4"),
            )),
            false,
            SafeAreaInsets::default(),
        );
        assert_eq!(bounds.width, 160.0);
        assert_eq!(bounds.height, 25.0);
    }
}
