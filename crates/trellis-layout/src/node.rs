//! The collaborator tree contract and a borrowed node view over it.

use std::fmt;

use glam::Vec2;
use trellis_core::LayoutAxis;

use crate::components::{
    AnchorComponent, AnchorSafeAreaComponent, FlowLayoutComponent, FlowLayoutHintComponent,
    LinearLayoutComponent, SizePolicyComponent,
};

/// The fixed set of layout capabilities a node can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutExtensionKind {
    SizePolicy,
    Anchor,
    AnchorSafeArea,
    LinearLayout,
    FlowLayout,
    FlowLayoutHint,
    /// The node's subtree is laid out independently
    Isolation,
    /// Managed layouts skip the node
    IgnoreLayout,
}

/// A declared layout capability.
#[derive(Debug, Clone, Copy)]
pub enum LayoutExtension<'a> {
    SizePolicy(&'a SizePolicyComponent),
    Anchor(&'a AnchorComponent),
    AnchorSafeArea(&'a AnchorSafeAreaComponent),
    LinearLayout(&'a LinearLayoutComponent),
    FlowLayout(&'a FlowLayoutComponent),
    FlowLayoutHint(&'a FlowLayoutHintComponent),
    Isolation,
    IgnoreLayout,
}

impl LayoutExtension<'_> {
    pub fn kind(&self) -> LayoutExtensionKind {
        match self {
            LayoutExtension::SizePolicy(_) => LayoutExtensionKind::SizePolicy,
            LayoutExtension::Anchor(_) => LayoutExtensionKind::Anchor,
            LayoutExtension::AnchorSafeArea(_) => LayoutExtensionKind::AnchorSafeArea,
            LayoutExtension::LinearLayout(_) => LayoutExtensionKind::LinearLayout,
            LayoutExtension::FlowLayout(_) => LayoutExtensionKind::FlowLayout,
            LayoutExtension::FlowLayoutHint(_) => LayoutExtensionKind::FlowLayoutHint,
            LayoutExtension::Isolation => LayoutExtensionKind::Isolation,
            LayoutExtension::IgnoreLayout => LayoutExtensionKind::IgnoreLayout,
        }
    }
}

/// A node hierarchy the layouter can read from and write results into.
///
/// Positions are relative to the parent's origin. The layouter never creates
/// or destroys nodes; it only calls the setters with final values.
pub trait LayoutTree {
    type NodeId: Copy + Eq + fmt::Debug;

    fn children(&self, node: Self::NodeId) -> &[Self::NodeId];

    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Capability query. Implementations must return the variant matching `kind`.
    fn extension(&self, node: Self::NodeId, kind: LayoutExtensionKind)
        -> Option<LayoutExtension<'_>>;

    fn is_visible(&self, node: Self::NodeId) -> bool;

    fn size(&self, node: Self::NodeId) -> Vec2;

    fn position(&self, node: Self::NodeId) -> Vec2;

    fn set_size(&mut self, node: Self::NodeId, axis: LayoutAxis, value: f32);

    fn set_position(&mut self, node: Self::NodeId, axis: LayoutAxis, value: f32);

    /// Intrinsic content size, optionally constrained to a width.
    fn preferred_content_size(&self, node: Self::NodeId, width_constraint: Option<f32>) -> Vec2 {
        let _ = (node, width_constraint);
        Vec2::ZERO
    }

    /// True for reflowable text or proportionally scaled images.
    fn is_height_depends_on_width(&self, node: Self::NodeId) -> bool {
        let _ = node;
        false
    }

    /// Borrowed view of one node.
    fn node(&self, id: Self::NodeId) -> LayoutNode<'_, Self>
    where
        Self: Sized,
    {
        LayoutNode::new(self, id)
    }
}

bitflags::bitflags! {
    /// Pending layout work recorded on a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutDirty: u8 {
        /// Sizes or policies changed
        const LAYOUT = 1 << 0;
        /// Children were added, removed or reordered
        const ORDER = 1 << 1;
        /// The node was moved by hand
        const POSITION = 1 << 2;
    }
}

/// A tree that records which nodes need layout.
pub trait DirtyTracking: LayoutTree {
    fn layout_dirty(&self, node: Self::NodeId) -> LayoutDirty;

    fn mark_layout_dirty(&mut self, node: Self::NodeId, dirty: LayoutDirty);

    fn reset_layout_dirty(&mut self, node: Self::NodeId);
}

/// Read-only handle over one node of a [`LayoutTree`].
pub struct LayoutNode<'a, T: LayoutTree + ?Sized> {
    tree: &'a T,
    id: T::NodeId,
}

impl<T: LayoutTree + ?Sized> Clone for LayoutNode<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: LayoutTree + ?Sized> Copy for LayoutNode<'_, T> {}

impl<T: LayoutTree + ?Sized> fmt::Debug for LayoutNode<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutNode").field("id", &self.id).finish()
    }
}

impl<'a, T: LayoutTree + ?Sized> LayoutNode<'a, T> {
    pub fn new(tree: &'a T, id: T::NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> T::NodeId {
        self.id
    }

    pub fn children(&self) -> &'a [T::NodeId] {
        self.tree.children(self.id)
    }

    pub fn parent(&self) -> Option<LayoutNode<'a, T>> {
        self.tree.parent(self.id).map(|id| LayoutNode::new(self.tree, id))
    }

    pub fn is_visible(&self) -> bool {
        self.tree.is_visible(self.id)
    }

    pub fn size(&self) -> Vec2 {
        self.tree.size(self.id)
    }

    pub fn position(&self) -> Vec2 {
        self.tree.position(self.id)
    }

    pub fn preferred_content_size(&self, width_constraint: Option<f32>) -> Vec2 {
        self.tree.preferred_content_size(self.id, width_constraint)
    }

    pub fn is_height_depends_on_width(&self) -> bool {
        self.tree.is_height_depends_on_width(self.id)
    }

    pub fn has_extension(&self, kind: LayoutExtensionKind) -> bool {
        self.tree.extension(self.id, kind).is_some()
    }

    pub fn size_policy(&self) -> Option<&'a SizePolicyComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::SizePolicy)? {
            LayoutExtension::SizePolicy(component) => Some(component),
            _ => None,
        }
    }

    /// Anchors, when declared and enabled.
    pub fn anchor(&self) -> Option<&'a AnchorComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::Anchor)? {
            LayoutExtension::Anchor(component) if component.enabled => Some(component),
            _ => None,
        }
    }

    pub fn anchor_safe_area(&self) -> Option<&'a AnchorSafeAreaComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::AnchorSafeArea)? {
            LayoutExtension::AnchorSafeArea(component) => Some(component),
            _ => None,
        }
    }

    /// Linear layout, when declared and enabled.
    pub fn linear_layout(&self) -> Option<&'a LinearLayoutComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::LinearLayout)? {
            LayoutExtension::LinearLayout(component) if component.enabled => Some(component),
            _ => None,
        }
    }

    /// Flow layout, when declared and enabled.
    pub fn flow_layout(&self) -> Option<&'a FlowLayoutComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::FlowLayout)? {
            LayoutExtension::FlowLayout(component) if component.enabled => Some(component),
            _ => None,
        }
    }

    pub fn flow_hint(&self) -> Option<&'a FlowLayoutHintComponent> {
        match self.tree.extension(self.id, LayoutExtensionKind::FlowLayoutHint)? {
            LayoutExtension::FlowLayoutHint(component) => Some(component),
            _ => None,
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.has_extension(LayoutExtensionKind::Isolation)
    }

    pub fn is_layout_ignored(&self) -> bool {
        self.has_extension(LayoutExtensionKind::IgnoreLayout)
    }

    /// True when the node has a linear or flow layout.
    pub fn has_managed_layout(&self) -> bool {
        self.linear_layout().is_some() || self.flow_layout().is_some()
    }
}
