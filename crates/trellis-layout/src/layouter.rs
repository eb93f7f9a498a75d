//! Layout orchestration: flatten, measure, lay out, write back.

use std::fmt;

use trellis_core::{LayoutAxis, Rect, SafeAreaInsets, SizePolicy};
use trellis_formula::LayoutFormula;

use crate::anchor::AnchorLayoutAlgorithm;
use crate::control_data::ControlLayoutData;
use crate::flow::FlowLayoutAlgorithm;
use crate::linear::LinearLayoutAlgorithm;
use crate::node::{LayoutNode, LayoutTree};
use crate::settings::LayoutSettings;
use crate::size_measuring::SizeMeasuringAlgorithm;

/// Observer of formula state changes: `(node, axis, formula)`.
pub type FormulaCallback<Id> = Box<dyn FnMut(Id, LayoutAxis, &LayoutFormula)>;

/// Everything the algorithms of one axis pass share.
pub struct LayoutContext<'a, T: LayoutTree> {
    tree: &'a T,
    data: &'a mut [ControlLayoutData<T::NodeId>],
    settings: &'a LayoutSettings,
    measuring: bool,
}

impl<'a, T: LayoutTree> LayoutContext<'a, T> {
    pub fn new(
        tree: &'a T,
        data: &'a mut [ControlLayoutData<T::NodeId>],
        settings: &'a LayoutSettings,
    ) -> Self {
        Self {
            tree,
            data,
            settings,
            measuring: true,
        }
    }

    /// A context for a run that keeps the sizes collected from the tree.
    ///
    /// Only direct children are flattened in such a run, so formulas that
    /// read grandchildren would see an empty subtree.
    pub fn without_measuring(mut self) -> Self {
        self.measuring = false;
        self
    }

    /// Whether size policies that depend on the parent are re-evaluated.
    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn tree(&self) -> &'a T {
        self.tree
    }

    pub fn settings(&self) -> &'a LayoutSettings {
        self.settings
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self, index: usize) -> &ControlLayoutData<T::NodeId> {
        &self.data[index]
    }

    pub fn data_mut(&mut self, index: usize) -> &mut ControlLayoutData<T::NodeId> {
        &mut self.data[index]
    }

    /// View of the external node behind an arena slot.
    pub fn node(&self, index: usize) -> LayoutNode<'a, T> {
        LayoutNode::new(self.tree, self.data[index].node())
    }
}

/// Computes sizes and positions for a subtree.
///
/// The layouter owns a flat arena that is rebuilt for every run. Settings
/// persist between runs.
pub struct Layouter<Id> {
    layout_data: Vec<ControlLayoutData<Id>>,
    settings: LayoutSettings,
    on_formula_processed: Option<FormulaCallback<Id>>,
    on_formula_removed: Option<FormulaCallback<Id>>,
}

impl<Id> fmt::Debug for Layouter<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layouter")
            .field("settings", &self.settings)
            .field("nodes", &self.layout_data.len())
            .finish()
    }
}

impl<Id: Copy + Eq + fmt::Debug> Default for Layouter<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + fmt::Debug> Layouter<Id> {
    pub fn new() -> Self {
        Self::with_settings(LayoutSettings::default())
    }

    pub fn with_settings(settings: LayoutSettings) -> Self {
        Self {
            layout_data: Vec::new(),
            settings,
            on_formula_processed: None,
            on_formula_removed: None,
        }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: LayoutSettings) {
        self.settings = settings;
    }

    pub fn is_rtl(&self) -> bool {
        self.settings.rtl
    }

    pub fn set_rtl(&mut self, rtl: bool) {
        self.settings.rtl = rtl;
    }

    pub fn safe_area_insets(&self) -> &SafeAreaInsets {
        &self.settings.safe_area_insets
    }

    pub fn set_safe_area_insets(&mut self, insets: SafeAreaInsets) {
        self.settings.safe_area_insets = insets;
    }

    pub fn visibility_rect(&self) -> &Rect {
        &self.settings.visibility_rect
    }

    pub fn set_visibility_rect(&mut self, rect: Rect) {
        self.settings.visibility_rect = rect;
    }

    pub fn set_on_formula_processed(
        &mut self,
        callback: impl FnMut(Id, LayoutAxis, &LayoutFormula) + 'static,
    ) {
        self.on_formula_processed = Some(Box::new(callback));
    }

    pub fn set_on_formula_removed(
        &mut self,
        callback: impl FnMut(Id, LayoutAxis, &LayoutFormula) + 'static,
    ) {
        self.on_formula_removed = Some(Box::new(callback));
    }

    /// Raise the formula-removed notification.
    pub fn notify_formula_removed(&mut self, node: Id, axis: LayoutAxis, formula: &LayoutFormula) {
        if let Some(callback) = self.on_formula_removed.as_mut() {
            callback(node, axis, formula);
        }
    }

    /// Measure and lay out the whole subtree under `root`.
    ///
    /// Every visited node receives exactly one `set_size` and one
    /// `set_position` call per axis.
    pub fn apply_layout<T>(&mut self, tree: &mut T, root: Id)
    where
        T: LayoutTree<NodeId = Id>,
    {
        self.collect_nodes(&*tree, root, true);
        log::trace!("layout {:?}: {} nodes", root, self.layout_data.len());

        for axis in LayoutAxis::ALL {
            self.process_axis(&*tree, axis, true);
        }

        for data in &self.layout_data {
            for axis in LayoutAxis::ALL {
                tree.set_size(data.node(), axis, data.size(axis));
                tree.set_position(data.node(), axis, data.position(axis));
            }
        }
        self.layout_data.clear();
    }

    /// Re-position the direct children of `root` without measuring.
    ///
    /// Sizes computed by an earlier run are kept; only positions are written.
    pub fn apply_layout_non_recursive<T>(&mut self, tree: &mut T, root: Id)
    where
        T: LayoutTree<NodeId = Id>,
    {
        self.collect_nodes(&*tree, root, false);
        log::trace!("reposition {:?}: {} nodes", root, self.layout_data.len());

        for axis in LayoutAxis::ALL {
            self.process_axis(&*tree, axis, false);
        }

        for data in &self.layout_data {
            for axis in LayoutAxis::ALL {
                tree.set_position(data.node(), axis, data.position(axis));
            }
        }
        self.layout_data.clear();
    }

    fn collect_nodes<T>(&mut self, tree: &T, root: Id, recursive: bool)
    where
        T: LayoutTree<NodeId = Id>,
    {
        self.layout_data.clear();
        self.layout_data.push(node_data(tree, root, None));
        self.collect_children(tree, 0, recursive);
    }

    /// Append the children of `index` as one block, then expand each child.
    fn collect_children<T>(&mut self, tree: &T, index: usize, recursive: bool)
    where
        T: LayoutTree<NodeId = Id>,
    {
        let start = self.layout_data.len();
        for &child in tree.children(self.layout_data[index].node()) {
            self.layout_data.push(node_data(tree, child, Some(index)));
        }
        let end = self.layout_data.len();
        self.layout_data[index].set_children(start..end);

        if recursive {
            for child_index in start..end {
                if !tree.node(self.layout_data[child_index].node()).is_isolated() {
                    self.collect_children(tree, child_index, true);
                }
            }
        }
    }

    fn process_axis<T>(&mut self, tree: &T, axis: LayoutAxis, measure: bool)
    where
        T: LayoutTree<NodeId = Id>,
    {
        let mut ctx = LayoutContext::new(tree, &mut self.layout_data, &self.settings);
        if measure {
            measure_phase(&mut ctx, axis);
        } else {
            ctx = ctx.without_measuring();
        }
        layout_phase(&mut ctx, axis);

        self.notify_formulas_processed(tree, axis);
    }

    fn notify_formulas_processed<T>(&mut self, tree: &T, axis: LayoutAxis)
    where
        T: LayoutTree<NodeId = Id>,
    {
        for data in &self.layout_data {
            let Some(policy) = tree.node(data.node()).size_policy() else {
                continue;
            };
            let axis_policy = policy.axis(axis);
            let Some(formula) = axis_policy.formula_ref() else {
                continue;
            };
            if axis_policy.policy == SizePolicy::Formula && formula.has_changes() {
                if let Some(callback) = self.on_formula_processed.as_mut() {
                    callback(data.node(), axis, formula);
                }
                formula.reset_changes();
            }
        }
    }
}

fn node_data<T: LayoutTree>(
    tree: &T,
    id: T::NodeId,
    parent_index: Option<usize>,
) -> ControlLayoutData<T::NodeId> {
    let node = tree.node(id);
    ControlLayoutData::new(id, parent_index, node.size(), node.position())
        .with_skip_state(node.is_visible(), node.is_layout_ignored())
}

/// Children are measured before their parents.
fn measure_phase<T: LayoutTree>(ctx: &mut LayoutContext<'_, T>, axis: LayoutAxis) {
    for index in (0..ctx.len()).rev() {
        if let Some(policy) = ctx.node(index).size_policy() {
            SizeMeasuringAlgorithm::apply(ctx, index, axis, policy.axis(axis));
        }
    }
}

/// Parents place their children before the children place theirs.
fn layout_phase<T: LayoutTree>(ctx: &mut LayoutContext<'_, T>, axis: LayoutAxis) {
    for index in 0..ctx.len() {
        if !ctx.data(index).has_children() {
            continue;
        }

        let node = ctx.node(index);
        if let Some(flow) = node.flow_layout() {
            FlowLayoutAlgorithm::new(ctx, flow).apply(index, axis);
        } else if let Some(linear) = node.linear_layout().filter(|l| l.axis() == axis) {
            LinearLayoutAlgorithm::new(ctx, linear).apply(index, axis);
        } else {
            AnchorLayoutAlgorithm::new(ctx).apply(index, axis, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::components::{
        AnchorComponent, AxisSizePolicy, LinearLayoutComponent, SizePolicyComponent,
    };
    use crate::tree::{NodeId, UiNode, UiTree};

    fn fixed(width: f32, height: f32) -> SizePolicyComponent {
        SizePolicyComponent::new(AxisSizePolicy::fixed(width), AxisSizePolicy::fixed(height))
    }

    #[test]
    fn test_flatten_blocks_children() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new());
        let a = tree.add_child(root, UiNode::new()).unwrap();
        let b = tree.add_child(root, UiNode::new()).unwrap();
        let a1 = tree.add_child(a, UiNode::new()).unwrap();
        let b1 = tree.add_child(b, UiNode::new()).unwrap();

        let mut layouter = Layouter::new();
        layouter.collect_nodes(&tree, root, true);

        let order: Vec<NodeId> = layouter.layout_data.iter().map(|d| d.node()).collect();
        assert_eq!(order, vec![root, a, b, a1, b1]);
        assert_eq!(layouter.layout_data[0].children(), 1..3);
        assert_eq!(layouter.layout_data[1].children(), 3..4);
        assert_eq!(layouter.layout_data[2].children(), 4..5);
        for (index, data) in layouter.layout_data.iter().enumerate() {
            if let Some(parent) = data.parent_index() {
                assert!(parent < index);
            }
        }
    }

    #[test]
    fn test_isolated_subtree_is_not_expanded() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new());
        let isolated = tree.add_child(root, UiNode::new().with_isolation(true)).unwrap();
        tree.add_child(isolated, UiNode::new()).unwrap();

        let mut layouter = Layouter::new();
        layouter.collect_nodes(&tree, root, true);

        assert_eq!(layouter.layout_data.len(), 2);
        assert!(!layouter.layout_data[1].has_children());
    }

    #[test]
    fn test_non_recursive_collects_direct_children() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new());
        let a = tree.add_child(root, UiNode::new()).unwrap();
        tree.add_child(a, UiNode::new()).unwrap();

        let mut layouter = Layouter::new();
        layouter.collect_nodes(&tree, root, false);

        assert_eq!(layouter.layout_data.len(), 2);
    }

    #[test]
    fn test_apply_layout_writes_back() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size_policy(fixed(200.0, 100.0)));
        let child = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size(10.0, 10.0)
                    .with_anchor(AnchorComponent::default().with_right(5.0).with_bottom(5.0)),
            )
            .unwrap();

        let mut layouter = Layouter::new();
        layouter.apply_layout(&mut tree, root);

        let bounds = tree.bounds(child).unwrap();
        assert_eq!((bounds.x, bounds.y), (185.0, 85.0));
        assert_eq!(tree.bounds(root).unwrap().width, 200.0);
    }

    #[test]
    fn test_isolated_child_is_sized_by_parent() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(300.0, 300.0));
        let isolated = tree
            .add_child(
                root,
                UiNode::new()
                    .with_isolation(true)
                    .with_anchor(AnchorComponent::fill()),
            )
            .unwrap();
        let inner = tree
            .add_child(isolated, UiNode::new().with_anchor(AnchorComponent::fill()))
            .unwrap();

        Layouter::new().apply_layout(&mut tree, root);

        assert_eq!(tree.bounds(isolated).unwrap().width, 300.0);
        assert_eq!(tree.bounds(inner).unwrap().width, 0.0);
    }

    #[test]
    fn test_formula_processed_notification() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size_policy(SizePolicyComponent::new(
            AxisSizePolicy::formula("10 +"),
            AxisSizePolicy::formula("20"),
        )));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut layouter = Layouter::new();
        layouter.set_on_formula_processed(move |node, axis, formula| {
            sink.borrow_mut().push((node, axis, formula.has_error()));
        });

        layouter.apply_layout(&mut tree, root);
        assert_eq!(
            *seen.borrow(),
            vec![
                (root, LayoutAxis::Horizontal, true),
                (root, LayoutAxis::Vertical, false)
            ]
        );

        // changes were reset; a second run stays quiet
        layouter.apply_layout(&mut tree, root);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_non_recursive_keeps_sizes() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(100.0, 100.0));
        let child = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size_policy(fixed(40.0, 40.0))
                    .with_anchor(AnchorComponent::default().with_h_center(0.0).with_v_center(0.0)),
            )
            .unwrap();

        let mut layouter = Layouter::new();
        layouter.apply_layout(&mut tree, root);
        let first = tree.bounds(child).unwrap();

        tree.get_mut(child).unwrap().set_position(0.0, 0.0);
        layouter.apply_layout_non_recursive(&mut tree, root);

        assert_eq!(tree.bounds(child).unwrap(), first);
        assert_eq!((first.x, first.y), (30.0, 30.0));
    }

    fn hugging() -> SizePolicyComponent {
        SizePolicyComponent::new(AxisSizePolicy::formula("childrenSum"), AxisSizePolicy::default())
    }

    #[test]
    fn test_non_recursive_keeps_children_formula_size() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(100.0, 100.0));
        let child = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size_policy(hugging())
                    .with_anchor(AnchorComponent::default().with_right(0.0)),
            )
            .unwrap();
        tree.add_child(child, UiNode::new().with_size(30.0, 10.0))
            .unwrap();

        let mut layouter = Layouter::new();
        layouter.apply_layout(&mut tree, root);
        let first = tree.bounds(child).unwrap();
        assert_eq!((first.x, first.width), (70.0, 30.0));

        layouter.apply_layout_non_recursive(&mut tree, root);
        assert_eq!(tree.bounds(child).unwrap(), first);
    }

    #[test]
    fn test_non_recursive_linear_keeps_children_formula_size() {
        let mut tree = UiTree::new();
        let root = tree.add_root(
            UiNode::new()
                .with_size(100.0, 20.0)
                .with_linear_layout(LinearLayoutComponent::horizontal()),
        );
        let hug = tree
            .add_child(root, UiNode::new().with_size_policy(hugging()))
            .unwrap();
        tree.add_child(hug, UiNode::new().with_size(30.0, 10.0))
            .unwrap();
        let next = tree
            .add_child(root, UiNode::new().with_size(20.0, 10.0))
            .unwrap();

        let mut layouter = Layouter::new();
        layouter.apply_layout(&mut tree, root);
        assert_eq!(tree.bounds(next).unwrap().x, 30.0);

        tree.get_mut(next).unwrap().set_position(0.0, 0.0);
        layouter.apply_layout_non_recursive(&mut tree, root);
        assert_eq!(tree.bounds(next).unwrap().x, 30.0);
        assert_eq!(tree.bounds(hug).unwrap().width, 30.0);
    }
}
