//! A ready-made node tree implementing [`LayoutTree`].
//!
//! Hosts with their own scene graph implement the trait directly; this tree
//! serves embedders without one, as well as tests and benchmarks.

use std::collections::HashMap;

use glam::Vec2;
use trellis_core::{LayoutAxis, TreeError};

use crate::components::{
    AnchorComponent, AnchorSafeAreaComponent, FlowLayoutComponent, FlowLayoutHintComponent,
    LinearLayoutComponent, SizePolicyComponent,
};
use crate::node::{DirtyTracking, LayoutDirty, LayoutExtension, LayoutExtensionKind, LayoutTree};
use crate::text::TextContent;

/// Unique identifier for a node in a [`UiTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

/// Axis-aligned box relative to the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_vecs(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Right edge (x + width).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (y + height).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Bitmap content with a natural size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageContent {
    pub width: f32,
    pub height: f32,
    /// Keeps the aspect ratio when the width is constrained
    pub proportional: bool,
}

impl ImageContent {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            proportional: false,
        }
    }

    pub fn with_proportional(mut self, proportional: bool) -> Self {
        self.proportional = proportional;
        self
    }

    fn preferred_size(&self, width_constraint: Option<f32>) -> Vec2 {
        match width_constraint {
            Some(width) if self.proportional && width > 0.0 && self.width > 0.0 => {
                Vec2::new(width, self.height * width / self.width)
            }
            _ => Vec2::new(self.width, self.height),
        }
    }
}

/// What a node displays. Drives `PercentOfContent` sizing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeContent {
    #[default]
    None,
    Text(TextContent),
    Image(ImageContent),
}

/// A node and its layout components.
#[derive(Debug, Clone)]
pub struct UiNode {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dirty: LayoutDirty,
    /// Optional name for debugging
    pub name: Option<String>,
    pub size: Vec2,
    pub position: Vec2,
    pub visible: bool,
    pub content: NodeContent,
    pub size_policy: Option<SizePolicyComponent>,
    pub anchor: Option<AnchorComponent>,
    pub anchor_safe_area: Option<AnchorSafeAreaComponent>,
    pub linear_layout: Option<LinearLayoutComponent>,
    pub flow_layout: Option<FlowLayoutComponent>,
    pub flow_hint: Option<FlowLayoutHintComponent>,
    pub isolated: bool,
    pub ignore_layout: bool,
}

impl Default for UiNode {
    fn default() -> Self {
        Self::new()
    }
}

impl UiNode {
    /// A detached, visible node. The tree assigns its id on insertion.
    pub fn new() -> Self {
        Self {
            id: NodeId(0),
            parent: None,
            children: Vec::new(),
            dirty: LayoutDirty::LAYOUT,
            name: None,
            size: Vec2::ZERO,
            position: Vec2::ZERO,
            visible: true,
            content: NodeContent::None,
            size_policy: None,
            anchor: None,
            anchor_safe_area: None,
            linear_layout: None,
            flow_layout: None,
            flow_hint: None,
            isolated: false,
            ignore_layout: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_size_policy(mut self, policy: SizePolicyComponent) -> Self {
        self.size_policy = Some(policy);
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorComponent) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_anchor_safe_area(mut self, safe_area: AnchorSafeAreaComponent) -> Self {
        self.anchor_safe_area = Some(safe_area);
        self
    }

    pub fn with_linear_layout(mut self, layout: LinearLayoutComponent) -> Self {
        self.linear_layout = Some(layout);
        self
    }

    pub fn with_flow_layout(mut self, layout: FlowLayoutComponent) -> Self {
        self.flow_layout = Some(layout);
        self
    }

    pub fn with_flow_hint(mut self, hint: FlowLayoutHintComponent) -> Self {
        self.flow_hint = Some(hint);
        self
    }

    pub fn with_isolation(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    pub fn with_ignore_layout(mut self, ignore: bool) -> Self {
        self.ignore_layout = ignore;
        self
    }

    pub fn with_text(mut self, text: TextContent) -> Self {
        self.content = NodeContent::Text(text);
        self
    }

    pub fn with_image(mut self, image: ImageContent) -> Self {
        self.content = NodeContent::Image(image);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_vecs(self.position, self.size)
    }

    pub fn size_policy(&self) -> Option<&SizePolicyComponent> {
        self.size_policy.as_ref()
    }

    pub fn size_policy_mut(&mut self) -> Option<&mut SizePolicyComponent> {
        self.size_policy.as_mut()
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    pub fn dirty(&self) -> LayoutDirty {
        self.dirty
    }
}

/// Owning node hierarchy with dirty tracking.
#[derive(Debug, Clone, Default)]
pub struct UiTree {
    nodes: HashMap<NodeId, UiNode>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a top-level node.
    pub fn add_root(&mut self, mut node: UiNode) -> NodeId {
        let id = self.next_id();
        node.id = id;
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    /// Append a node to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, node: UiNode) -> Result<NodeId, TreeError> {
        let index = self
            .nodes
            .get(&parent)
            .map(|p| p.children.len())
            .ok_or(TreeError::UnknownNode { id: parent.0 })?;
        self.insert_child(parent, index, node)
    }

    /// Insert a node at `index` among `parent`'s children. The index is clamped.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        mut node: UiNode,
    ) -> Result<NodeId, TreeError> {
        if !self.nodes.contains_key(&parent) {
            return Err(TreeError::UnknownNode { id: parent.0 });
        }
        let id = self.next_id();
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, id);
            parent_node.dirty |= LayoutDirty::ORDER;
        }
        Ok(id)
    }

    /// Detach and drop a subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Result<UiNode, TreeError> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or(TreeError::UnknownNode { id: id.0 })?;

        match node.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => {
                parent.children.retain(|&child| child != id);
                parent.dirty |= LayoutDirty::ORDER;
            }
            None => self.roots.retain(|&root| root != id),
        }

        let mut pending = node.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                pending.extend(removed.children);
            }
        }
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&UiNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut UiNode> {
        self.nodes.get_mut(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds(&self, id: NodeId) -> Option<Bounds> {
        self.nodes.get(&id).map(UiNode::bounds)
    }

    /// Record pending layout work on a node.
    pub fn mark_dirty(&mut self, id: NodeId, dirty: LayoutDirty) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.dirty |= dirty;
        }
    }

    /// Move a node by hand; it will be re-anchored on the next update.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_position(x, y);
            node.dirty |= LayoutDirty::POSITION;
        }
    }

    /// Resize a node by hand and request a layout.
    pub fn resize_node(&mut self, id: NodeId, width: f32, height: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_size(width, height);
            node.dirty |= LayoutDirty::LAYOUT;
        }
    }

    /// Move `id` to `index` among its siblings.
    pub fn reorder(&mut self, id: NodeId, index: usize) -> Result<(), TreeError> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::UnknownNode { id: id.0 })?
            .parent
            .ok_or(TreeError::UnknownNode { id: id.0 })?;
        let parent = self
            .nodes
            .get_mut(&parent)
            .ok_or(TreeError::UnknownNode { id: parent.0 })?;
        parent.children.retain(|&child| child != id);
        let index = index.min(parent.children.len());
        parent.children.insert(index, id);
        parent.dirty |= LayoutDirty::ORDER;
        Ok(())
    }
}

impl LayoutTree for UiTree {
    type NodeId = NodeId;

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn extension(&self, node: NodeId, kind: LayoutExtensionKind) -> Option<LayoutExtension<'_>> {
        let node = self.nodes.get(&node)?;
        match kind {
            LayoutExtensionKind::SizePolicy => {
                node.size_policy.as_ref().map(LayoutExtension::SizePolicy)
            }
            LayoutExtensionKind::Anchor => node.anchor.as_ref().map(LayoutExtension::Anchor),
            LayoutExtensionKind::AnchorSafeArea => node
                .anchor_safe_area
                .as_ref()
                .map(LayoutExtension::AnchorSafeArea),
            LayoutExtensionKind::LinearLayout => {
                node.linear_layout.as_ref().map(LayoutExtension::LinearLayout)
            }
            LayoutExtensionKind::FlowLayout => {
                node.flow_layout.as_ref().map(LayoutExtension::FlowLayout)
            }
            LayoutExtensionKind::FlowLayoutHint => {
                node.flow_hint.as_ref().map(LayoutExtension::FlowLayoutHint)
            }
            LayoutExtensionKind::Isolation => node.isolated.then_some(LayoutExtension::Isolation),
            LayoutExtensionKind::IgnoreLayout => {
                node.ignore_layout.then_some(LayoutExtension::IgnoreLayout)
            }
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    fn size(&self, node: NodeId) -> Vec2 {
        self.nodes.get(&node).map_or(Vec2::ZERO, |n| n.size)
    }

    fn position(&self, node: NodeId) -> Vec2 {
        self.nodes.get(&node).map_or(Vec2::ZERO, |n| n.position)
    }

    fn set_size(&mut self, node: NodeId, axis: LayoutAxis, value: f32) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.size[axis.index()] = value;
        }
    }

    fn set_position(&mut self, node: NodeId, axis: LayoutAxis, value: f32) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.position[axis.index()] = value;
        }
    }

    fn preferred_content_size(&self, node: NodeId, width_constraint: Option<f32>) -> Vec2 {
        match self.nodes.get(&node).map(|n| &n.content) {
            Some(NodeContent::Text(text)) => {
                let metrics = text.measure(width_constraint);
                Vec2::new(metrics.width, metrics.height)
            }
            Some(NodeContent::Image(image)) => image.preferred_size(width_constraint),
            _ => Vec2::ZERO,
        }
    }

    fn is_height_depends_on_width(&self, node: NodeId) -> bool {
        match self.nodes.get(&node).map(|n| &n.content) {
            Some(NodeContent::Text(text)) => text.multiline,
            Some(NodeContent::Image(image)) => image.proportional,
            _ => false,
        }
    }
}

impl DirtyTracking for UiTree {
    fn layout_dirty(&self, node: NodeId) -> LayoutDirty {
        self.nodes.get(&node).map_or(LayoutDirty::empty(), |n| n.dirty)
    }

    fn mark_layout_dirty(&mut self, node: NodeId, dirty: LayoutDirty) {
        self.mark_dirty(node, dirty);
    }

    fn reset_layout_dirty(&mut self, node: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.dirty = LayoutDirty::empty();
        }
    }
}
