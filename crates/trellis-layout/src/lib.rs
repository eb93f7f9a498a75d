//! Measure and layout passes for Trellis UI trees.
//!
//! A host exposes its node hierarchy through [`LayoutTree`] and calls
//! [`Layouter::apply_layout`] on the root of a subtree. Each run:
//!
//! 1. **Flattens** the subtree into an arena with contiguous child blocks
//! 2. **Measures** every node bottom-up from its size policy
//! 3. **Lays out** every container top-down with a flow, linear or anchor algorithm
//! 4. **Writes back** sizes and positions through the tree's setters
//!
//! Horizontal runs completely before vertical, so text and proportional images
//! can size their height from a final width.
//!
//! # Example
//!
//! ```ignore
//! use trellis_layout::{Layouter, LinearLayoutComponent, UiNode, UiTree};
//!
//! let mut tree = UiTree::new();
//! let root = tree.add_root(
//!     UiNode::new()
//!         .with_size(320.0, 48.0)
//!         .with_linear_layout(LinearLayoutComponent::horizontal().with_spacing(8.0)),
//! );
//! tree.add_child(root, UiNode::new().with_size(40.0, 40.0))?;
//!
//! Layouter::new().apply_layout(&mut tree, root);
//! ```

mod anchor;
mod components;
mod control_data;
mod flow;
mod helpers;
mod layouter;
mod linear;
mod node;
mod settings;
mod size_measuring;
mod system;
mod text;
mod tree;

pub use anchor::AnchorLayoutAlgorithm;
pub use components::{
    AnchorComponent, AnchorSafeAreaComponent, AxisSizePolicy, FlowLayoutComponent,
    FlowLayoutHintComponent, LinearLayoutComponent, SizePolicyComponent, DEFAULT_MAX_SIZE,
};
pub use control_data::{ControlLayoutData, LayoutFlags};
pub use flow::FlowLayoutAlgorithm;
pub use helpers::Spacing;
pub use layouter::{FormulaCallback, LayoutContext, Layouter};
pub use linear::LinearLayoutAlgorithm;
pub use node::{
    DirtyTracking, LayoutDirty, LayoutExtension, LayoutExtensionKind, LayoutNode, LayoutTree,
};
pub use settings::LayoutSettings;
pub use size_measuring::SizeMeasuringAlgorithm;
pub use system::LayoutSystem;
pub use text::{measure_text, TextContent, TextMetrics, TextStyle};
pub use tree::{Bounds, ImageContent, NodeContent, NodeId, UiNode, UiTree};

pub use trellis_core::{
    ContentDirection, FlowOrientation, LayoutAxis, LinearOrientation, Margins, Rect,
    SafeAreaInsetPolicy, SafeAreaInsets, SizePolicy,
};
pub use trellis_formula::LayoutFormula;
