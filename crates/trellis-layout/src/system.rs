//! Per-frame driver that turns dirty flags into layout runs.

use std::fmt;

use trellis_core::{LayoutAxis, Rect, SafeAreaInsets};
use trellis_formula::LayoutFormula;

use crate::layouter::Layouter;
use crate::node::{DirtyTracking, LayoutDirty, LayoutTree};

/// Owns the shared [`Layouter`] and decides where a layout run must start.
pub struct LayoutSystem<Id> {
    layouter: Layouter<Id>,
    autoupdates_enabled: bool,
    current_screen: Option<Id>,
    popup_container: Option<Id>,
    /// Screen and popups need a full run after a geometry setting changed
    refresh_pending: bool,
}

impl<Id> fmt::Debug for LayoutSystem<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutSystem")
            .field("layouter", &self.layouter)
            .field("autoupdates_enabled", &self.autoupdates_enabled)
            .field("refresh_pending", &self.refresh_pending)
            .finish()
    }
}

impl<Id: Copy + Eq + fmt::Debug> Default for LayoutSystem<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + fmt::Debug> LayoutSystem<Id> {
    pub fn new() -> Self {
        Self {
            layouter: Layouter::new(),
            autoupdates_enabled: true,
            current_screen: None,
            popup_container: None,
            refresh_pending: false,
        }
    }

    pub fn layouter(&self) -> &Layouter<Id> {
        &self.layouter
    }

    pub fn layouter_mut(&mut self) -> &mut Layouter<Id> {
        &mut self.layouter
    }

    pub fn is_autoupdates_enabled(&self) -> bool {
        self.autoupdates_enabled
    }

    pub fn set_autoupdates_enabled(&mut self, enabled: bool) {
        self.autoupdates_enabled = enabled;
    }

    pub fn is_rtl(&self) -> bool {
        self.layouter.is_rtl()
    }

    /// Does not mark anything dirty; the caller marks the roots it wants
    /// refreshed.
    pub fn set_rtl(&mut self, rtl: bool) {
        self.layouter.set_rtl(rtl);
    }

    /// The root refreshed when safe-area insets or the visibility rect change.
    pub fn set_current_screen(&mut self, screen: Option<Id>) {
        self.current_screen = screen;
    }

    pub fn set_popup_container(&mut self, container: Option<Id>) {
        self.popup_container = container;
    }

    /// The current screen and popup container are marked for layout on the
    /// next [`process`](Self::process).
    pub fn set_safe_area_insets(&mut self, insets: SafeAreaInsets) {
        self.layouter.set_safe_area_insets(insets);
        self.refresh_pending = true;
    }

    /// The current screen and popup container are marked for layout on the
    /// next [`process`](Self::process).
    pub fn set_visibility_rect(&mut self, rect: Rect) {
        self.layouter.set_visibility_rect(rect);
        self.refresh_pending = true;
    }

    pub fn set_on_formula_processed(
        &mut self,
        callback: impl FnMut(Id, LayoutAxis, &LayoutFormula) + 'static,
    ) {
        self.layouter.set_on_formula_processed(callback);
    }

    pub fn set_on_formula_removed(
        &mut self,
        callback: impl FnMut(Id, LayoutAxis, &LayoutFormula) + 'static,
    ) {
        self.layouter.set_on_formula_removed(callback);
    }

    /// Process dirty nodes under `root`. Does nothing with autoupdates off.
    pub fn process<T>(&mut self, tree: &mut T, root: Id)
    where
        T: DirtyTracking<NodeId = Id>,
    {
        if self.autoupdates_enabled {
            self.force_process(tree, root);
        }
    }

    /// Process dirty nodes under `root` regardless of the autoupdate switch.
    ///
    /// Nodes are visited parent first, so one run at a container usually
    /// covers its whole subtree.
    pub fn force_process<T>(&mut self, tree: &mut T, root: Id)
    where
        T: DirtyTracking<NodeId = Id>,
    {
        if std::mem::take(&mut self.refresh_pending) {
            for screen in [self.current_screen, self.popup_container].into_iter().flatten() {
                tree.mark_layout_dirty(screen, LayoutDirty::LAYOUT);
            }
        }

        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            self.process_node(tree, node);
            pending.extend(tree.children(node).iter().rev().copied());
        }
    }

    /// Lay out `node` immediately with a private layouter sharing the
    /// current settings. Dirty flags are left alone.
    pub fn manual_apply_layout<T>(&self, tree: &mut T, node: Id)
    where
        T: LayoutTree<NodeId = Id>,
    {
        let mut layouter = Layouter::with_settings(*self.layouter.settings());
        layouter.apply_layout(tree, node);
    }

    /// Announce the removal of a node's formulas. Call before the node is
    /// dropped from the tree.
    pub fn unregister_node<T>(&mut self, tree: &T, node: Id)
    where
        T: LayoutTree<NodeId = Id>,
    {
        let Some(policy) = tree.node(node).size_policy() else {
            return;
        };
        for axis in LayoutAxis::ALL {
            if let Some(formula) = policy.formula(axis) {
                formula.mark_changes();
                self.layouter.notify_formula_removed(node, axis, formula);
            }
        }
    }

    fn process_node<T>(&mut self, tree: &mut T, node: Id)
    where
        T: DirtyTracking<NodeId = Id>,
    {
        let dirty = tree.layout_dirty(node);
        if dirty.is_empty() {
            return;
        }
        tree.reset_layout_dirty(node);

        let relayout = dirty.contains(LayoutDirty::LAYOUT)
            || (dirty.contains(LayoutDirty::ORDER) && have_to_layout_after_reorder(&*tree, node));
        if relayout {
            let container = find_not_dependent_on_children(&*tree, node);
            log::debug!("layout {:?} starting at {:?}", node, container);
            self.layouter.apply_layout(tree, container);
        } else if dirty.contains(LayoutDirty::POSITION) {
            if let Some(parent) = reposition_parent(&*tree, node) {
                log::debug!("reposition children of {:?}", parent);
                self.layouter.apply_layout_non_recursive(tree, parent);
            }
        }
    }
}

/// The node to start a run from when `node` changed: climb while the parent
/// sizes itself from its children, then take one more step up so the changed
/// node gets placed. Isolated nodes are never climbed past.
fn find_not_dependent_on_children<T: LayoutTree>(tree: &T, node: T::NodeId) -> T::NodeId {
    let mut result = tree.node(node);
    while let Some(parent) = result.parent().filter(|_| !result.is_isolated()) {
        let depends_on_children = parent.size_policy().is_some_and(|policy| {
            LayoutAxis::ALL
                .into_iter()
                .any(|axis| policy.is_depends_on_children(axis))
        });
        if !depends_on_children {
            break;
        }
        result = parent;
    }

    match result.parent() {
        Some(parent) if !result.is_isolated() => parent.id(),
        _ => result.id(),
    }
}

/// Children changes matter to managed layouts and children-sized nodes.
fn have_to_layout_after_reorder<T: LayoutTree>(tree: &T, node: T::NodeId) -> bool {
    let node = tree.node(node);
    if node.has_managed_layout() {
        return true;
    }
    node.size_policy().is_some_and(|policy| {
        LayoutAxis::ALL
            .into_iter()
            .any(|axis| policy.is_depends_on_children(axis))
    })
}

/// The parent to re-position after `node` was moved by hand, if any.
fn reposition_parent<T: LayoutTree>(tree: &T, node: T::NodeId) -> Option<T::NodeId> {
    let node = tree.node(node);
    let parent = node.parent()?;
    (node.anchor().is_some() || parent.has_managed_layout()).then(|| parent.id())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::components::{
        AnchorComponent, AnchorSafeAreaComponent, AxisSizePolicy, LinearLayoutComponent,
        SizePolicyComponent,
    };
    use crate::tree::{NodeId, UiNode, UiTree};
    use trellis_core::{SafeAreaInsetPolicy, SizePolicy};

    fn children_sum() -> SizePolicyComponent {
        SizePolicyComponent::new(
            AxisSizePolicy::percent(SizePolicy::PercentOfChildrenSum, 100.0),
            AxisSizePolicy::percent(SizePolicy::PercentOfMaxChild, 100.0),
        )
    }

    fn fixed(width: f32, height: f32) -> SizePolicyComponent {
        SizePolicyComponent::new(AxisSizePolicy::fixed(width), AxisSizePolicy::fixed(height))
    }

    fn clean(tree: &mut UiTree, root: NodeId) {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            tree.reset_layout_dirty(node);
            pending.extend(LayoutTree::children(tree, node).iter().copied());
        }
    }

    #[test]
    fn test_process_lays_out_dirty_tree() {
        let mut tree = UiTree::new();
        let root = tree.add_root(
            UiNode::new()
                .with_size(300.0, 100.0)
                .with_linear_layout(LinearLayoutComponent::horizontal().with_spacing(5.0)),
        );
        let a = tree.add_child(root, UiNode::new().with_size_policy(fixed(20.0, 10.0))).unwrap();
        let b = tree.add_child(root, UiNode::new().with_size_policy(fixed(30.0, 10.0))).unwrap();

        let mut system = LayoutSystem::new();
        system.process(&mut tree, root);

        assert_eq!(tree.bounds(a).unwrap().width, 20.0);
        assert_eq!(tree.bounds(b).unwrap().x, 25.0);
        assert!(tree.layout_dirty(root).is_empty());
        assert!(tree.layout_dirty(b).is_empty());
    }

    #[test]
    fn test_autoupdates_disabled() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size_policy(fixed(50.0, 50.0)));

        let mut system = LayoutSystem::new();
        system.set_autoupdates_enabled(false);
        system.process(&mut tree, root);
        assert_eq!(tree.bounds(root).unwrap().width, 0.0);
        assert!(tree.layout_dirty(root).contains(LayoutDirty::LAYOUT));

        system.force_process(&mut tree, root);
        assert_eq!(tree.bounds(root).unwrap().width, 50.0);
    }

    #[test]
    fn test_change_climbs_children_sized_ancestors() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(500.0, 500.0));
        let panel = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size_policy(children_sum())
                    .with_linear_layout(LinearLayoutComponent::horizontal()),
            )
            .unwrap();
        let leaf = tree
            .add_child(panel, UiNode::new().with_size_policy(fixed(40.0, 10.0)))
            .unwrap();

        assert_eq!(find_not_dependent_on_children(&tree, leaf), root);
        assert_eq!(find_not_dependent_on_children(&tree, panel), root);
        assert_eq!(find_not_dependent_on_children(&tree, root), root);

        let mut system = LayoutSystem::new();
        system.process(&mut tree, root);
        clean(&mut tree, root);
        assert_eq!(tree.bounds(panel).unwrap().width, 40.0);

        if let Some(policy) = tree.get_mut(leaf).and_then(|n| n.size_policy_mut()) {
            policy.horizontal.value = 70.0;
        }
        tree.mark_dirty(leaf, LayoutDirty::LAYOUT);
        system.process(&mut tree, root);
        assert_eq!(tree.bounds(panel).unwrap().width, 70.0);
    }

    #[test]
    fn test_isolation_stops_the_climb() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size_policy(children_sum()));
        let isolated = tree
            .add_child(
                root,
                UiNode::new().with_size_policy(children_sum()).with_isolation(true),
            )
            .unwrap();
        let leaf = tree.add_child(isolated, UiNode::new()).unwrap();

        assert_eq!(find_not_dependent_on_children(&tree, leaf), isolated);
        assert_eq!(find_not_dependent_on_children(&tree, isolated), isolated);
    }

    #[test]
    fn test_reorder_relayouts_managed_parent() {
        let mut tree = UiTree::new();
        let root = tree.add_root(
            UiNode::new()
                .with_size(200.0, 50.0)
                .with_linear_layout(LinearLayoutComponent::horizontal()),
        );
        let a = tree.add_child(root, UiNode::new().with_size_policy(fixed(20.0, 10.0))).unwrap();
        let b = tree.add_child(root, UiNode::new().with_size_policy(fixed(30.0, 10.0))).unwrap();

        let mut system = LayoutSystem::new();
        system.process(&mut tree, root);
        clean(&mut tree, root);

        tree.reorder(b, 0).unwrap();
        system.process(&mut tree, root);
        assert_eq!(tree.bounds(b).unwrap().x, 0.0);
        assert_eq!(tree.bounds(a).unwrap().x, 30.0);
    }

    #[test]
    fn test_reorder_ignored_without_layout() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new());
        let a = tree.add_child(root, UiNode::new()).unwrap();
        assert!(!have_to_layout_after_reorder(&tree, root));
        assert!(!have_to_layout_after_reorder(&tree, a));

        let sized = tree.add_root(UiNode::new().with_size_policy(children_sum()));
        assert!(have_to_layout_after_reorder(&tree, sized));
    }

    #[test]
    fn test_moved_anchored_child_snaps_back() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(100.0, 100.0));
        let child = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size(10.0, 10.0)
                    .with_anchor(AnchorComponent::default().with_right(5.0).with_bottom(5.0)),
            )
            .unwrap();
        let free = tree
            .add_child(root, UiNode::new().with_size(10.0, 10.0).with_position(1.0, 1.0))
            .unwrap();

        let mut system = LayoutSystem::new();
        system.process(&mut tree, root);
        clean(&mut tree, root);

        tree.move_node(child, 0.0, 0.0);
        tree.move_node(free, 50.0, 50.0);
        system.process(&mut tree, root);

        assert_eq!(tree.bounds(child).unwrap().position(), glam::Vec2::new(85.0, 85.0));
        assert_eq!(tree.bounds(free).unwrap().position(), glam::Vec2::new(50.0, 50.0));
        assert_eq!(reposition_parent(&tree, free), None);
        assert_eq!(reposition_parent(&tree, child), Some(root));
    }

    #[test]
    fn test_manual_apply_uses_shared_settings() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size(100.0, 100.0));
        let child = tree
            .add_child(
                root,
                UiNode::new()
                    .with_size(10.0, 10.0)
                    .with_anchor(AnchorComponent::default().with_left(5.0).with_rtl(true)),
            )
            .unwrap();

        let mut system = LayoutSystem::new();
        system.set_rtl(true);
        system.manual_apply_layout(&mut tree, root);

        assert_eq!(tree.bounds(child).unwrap().x, 85.0);
        // flags are untouched
        assert!(tree.layout_dirty(root).contains(LayoutDirty::LAYOUT));
    }

    #[test]
    fn test_unregister_reports_formulas() {
        let mut tree = UiTree::new();
        let root = tree.add_root(UiNode::new().with_size_policy(SizePolicyComponent::new(
            AxisSizePolicy::formula("100"),
            AxisSizePolicy::fixed(10.0),
        )));

        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let mut system = LayoutSystem::new();
        system.set_on_formula_removed(move |node, axis, formula: &LayoutFormula| {
            sink.borrow_mut().push((node, axis, formula.source().to_string()));
        });

        system.unregister_node(&tree, root);
        assert_eq!(
            removed.borrow().as_slice(),
            &[(root, LayoutAxis::Horizontal, "100".to_string())]
        );
    }

    #[test]
    fn test_safe_area_change_refreshes_current_screen() {
        let mut tree = UiTree::new();
        let screen = tree.add_root(UiNode::new().with_size(100.0, 100.0));
        let content = tree
            .add_child(
                screen,
                UiNode::new()
                    .with_anchor(AnchorComponent::fill())
                    .with_anchor_safe_area(AnchorSafeAreaComponent::uniform(
                        SafeAreaInsetPolicy::Inset,
                    )),
            )
            .unwrap();

        let mut system = LayoutSystem::new();
        system.process(&mut tree, screen);
        assert_eq!(tree.bounds(content).unwrap().x, 0.0);

        // nothing is registered to refresh
        system.set_safe_area_insets(SafeAreaInsets::new(10.0, 0.0, 0.0, 0.0));
        system.process(&mut tree, screen);
        assert_eq!(tree.bounds(content).unwrap().x, 0.0);

        system.set_current_screen(Some(screen));
        system.set_safe_area_insets(SafeAreaInsets::new(10.0, 0.0, 0.0, 0.0));
        assert!(tree.layout_dirty(screen).is_empty());
        system.process(&mut tree, screen);
        assert_eq!(tree.bounds(content).unwrap().x, 10.0);
        assert_eq!(tree.bounds(content).unwrap().width, 90.0);
        assert!(tree.layout_dirty(screen).is_empty());

        // rtl changes leave refreshing to the caller
        system.set_rtl(true);
        system.process(&mut tree, screen);
        assert!(tree.layout_dirty(screen).is_empty());
    }

    #[test]
    fn test_visibility_rect_change_refreshes_popups() {
        let mut tree = UiTree::new();
        let screen = tree.add_root(UiNode::new());
        let popups = tree.add_root(UiNode::new().with_size_policy(fixed(40.0, 40.0)));
        clean(&mut tree, screen);
        clean(&mut tree, popups);

        let mut system = LayoutSystem::new();
        system.set_current_screen(Some(screen));
        system.set_popup_container(Some(popups));
        system.set_visibility_rect(Rect::new(0.0, 0.0, 320.0, 240.0));
        system.process(&mut tree, screen);

        assert!(tree.layout_dirty(screen).is_empty());
        assert!(tree.layout_dirty(popups).contains(LayoutDirty::LAYOUT));
        system.process(&mut tree, popups);
        assert_eq!(tree.bounds(popups).unwrap().width, 40.0);
    }
}
