//! Intrinsic size of one node along one axis.

use indexmap::IndexMap;
use trellis_core::{clamp_value, FormulaError, LayoutAxis, Margins, SizePolicy};
use trellis_formula::{expect_args, FormulaContext, FormulaValue};

use crate::components::{AxisSizePolicy, FlowLayoutComponent, LinearLayoutComponent};
use crate::control_data::{ControlLayoutData, LayoutFlags};
use crate::helpers::percent_of;
use crate::layouter::LayoutContext;
use crate::node::LayoutTree;

/// Computes a node's size from its size policy.
///
/// During the measure phase only `parent` related fields are zero; managed
/// layouts fill them in before evaluating parent-dependent policies.
pub struct SizeMeasuringAlgorithm<'c, 'a, T: LayoutTree> {
    ctx: &'c LayoutContext<'a, T>,
    index: usize,
    axis: LayoutAxis,
    policy: &'a AxisSizePolicy,
    linear_layout: Option<&'a LinearLayoutComponent>,
    flow_layout: Option<&'a FlowLayoutComponent>,
    skip_invisible: bool,
    parent_size: f32,
    parent_rest_size: f32,
    parent_line_size: f32,
}

impl<'c, 'a, T: LayoutTree> SizeMeasuringAlgorithm<'c, 'a, T> {
    pub fn new(
        ctx: &'c LayoutContext<'a, T>,
        index: usize,
        axis: LayoutAxis,
        policy: &'a AxisSizePolicy,
    ) -> Self {
        let node = ctx.node(index);
        let flow_layout = node.flow_layout();
        let linear_layout = if flow_layout.is_some() {
            None
        } else {
            node.linear_layout()
        };
        let skip_invisible = flow_layout
            .map(|flow| flow.skip_invisible)
            .or_else(|| linear_layout.map(|linear| linear.skip_invisible))
            .unwrap_or(false);

        Self {
            ctx,
            index,
            axis,
            policy,
            linear_layout,
            flow_layout,
            skip_invisible,
            parent_size: 0.0,
            parent_rest_size: 0.0,
            parent_line_size: 0.0,
        }
    }

    pub fn with_parent_size(mut self, size: f32) -> Self {
        self.parent_size = size;
        self
    }

    pub fn with_parent_rest_size(mut self, size: f32) -> Self {
        self.parent_rest_size = size;
        self
    }

    pub fn with_parent_line_size(mut self, size: f32) -> Self {
        self.parent_line_size = size;
        self
    }

    /// Measure the node and store the result, unless its size is owned by the parent.
    pub fn apply(
        ctx: &mut LayoutContext<'a, T>,
        index: usize,
        axis: LayoutAxis,
        policy: &'a AxisSizePolicy,
    ) {
        if policy.policy.is_measured_by_parent() {
            return;
        }
        let size = SizeMeasuringAlgorithm::new(ctx, index, axis, policy).calculate();
        ctx.data_mut(index).set_size(axis, size);
    }

    /// The node's size along the axis. Never negative.
    pub fn calculate(&self) -> f32 {
        let value = match self.policy.policy {
            SizePolicy::Ignore | SizePolicy::PercentOfParent => 0.0,
            SizePolicy::Fixed => self.clamp(self.policy.value),
            SizePolicy::PercentOfChildrenSum => self.children_sum(),
            SizePolicy::PercentOfMaxChild => self.max_child(),
            SizePolicy::PercentOfFirstChild => self.first_child(),
            SizePolicy::PercentOfLastChild => self.last_child(),
            SizePolicy::PercentOfContent => self.content(),
            SizePolicy::Formula => self
                .policy
                .formula_ref()
                .map(|formula| formula.calculate(self))
                .unwrap_or(0.0),
        };

        let value = if self.policy.policy.is_percent_of_self() {
            self.clamp(percent_of(value + self.layout_padding(), self.policy.value))
        } else {
            value
        };

        value.max(0.0)
    }

    fn data(&self) -> &ControlLayoutData<T::NodeId> {
        self.ctx.data(self.index)
    }

    fn clamp(&self, value: f32) -> f32 {
        clamp_value(value, self.policy.min, self.policy.max)
    }

    /// Indices of the children that take part in measuring.
    fn measured_children(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.data()
            .children()
            .filter(move |&child| !self.ctx.data(child).have_to_skip(self.skip_invisible))
    }

    /// A child's contribution. Percent-of-parent children count with their minimum.
    fn child_size(&self, child: usize) -> f32 {
        let node = self.ctx.node(child);
        match node.size_policy().map(|policy| policy.axis(self.axis)) {
            Some(policy) if policy.policy == SizePolicy::PercentOfParent => policy.min,
            _ => self.ctx.data(child).size(self.axis),
        }
    }

    fn children_sum(&self) -> f32 {
        match (self.flow_layout, self.axis) {
            (Some(flow), LayoutAxis::Horizontal) => self.horizontal_flow_children_sum(flow),
            (Some(flow), LayoutAxis::Vertical) => self.vertical_flow_children_sum(flow),
            (None, _) => self.default_children_sum(),
        }
    }

    fn default_children_sum(&self) -> f32 {
        let mut count = 0;
        let mut value = 0.0;
        for child in self.measured_children() {
            value += self.child_size(child);
            count += 1;
        }

        if let Some(linear) = self.linear_layout.filter(|l| l.axis() == self.axis) {
            if count > 0 {
                value += linear.spacing * (count - 1) as f32;
            }
        }
        value
    }

    /// Widest line when only forced line breaks are honored.
    fn horizontal_flow_children_sum(&self, flow: &FlowLayoutComponent) -> f32 {
        let mut line_width = 0.0f32;
        let mut max_width = 0.0f32;
        let mut first_in_line = true;
        let mut new_line_before_next = false;

        for child in self.measured_children() {
            let mut new_line_before = std::mem::take(&mut new_line_before_next);
            if let Some(hint) = self.ctx.node(child).flow_hint() {
                new_line_before |= hint.new_line_before_this;
                new_line_before_next = hint.new_line_after_this;
            }

            if new_line_before {
                max_width = max_width.max(line_width);
                line_width = 0.0;
                first_in_line = true;
            }

            line_width += self.child_size(child);
            if !first_in_line {
                line_width += flow.horizontal_spacing;
            }
            first_in_line = false;
        }

        max_width.max(line_width)
    }

    /// Sum of line heights. Line boundaries come from the horizontal pass.
    fn vertical_flow_children_sum(&self, flow: &FlowLayoutComponent) -> f32 {
        if !self.data().has_children() {
            return 0.0;
        }
        if !self.data().has_flag(LayoutFlags::LINES_COLLECTED) {
            debug_assert!(false, "flow lines must be collected before measuring height");
            log::warn!(
                "flow container {:?} measured vertically before its lines were collected",
                self.data().node()
            );
            return 0.0;
        }

        let mut value = 0.0;
        let mut lines = 0;
        let mut line_height = 0.0f32;
        for child in self.measured_children() {
            let data = self.ctx.data(child);
            line_height = line_height.max(data.height());
            if data.has_flag(LayoutFlags::LAST_IN_LINE) {
                value += line_height;
                lines += 1;
                line_height = 0.0;
            }
        }

        if lines > 0 {
            value += flow.vertical_spacing * (lines - 1) as f32;
        }
        value
    }

    fn max_child(&self) -> f32 {
        self.measured_children()
            .map(|child| self.child_size(child))
            .fold(0.0, f32::max)
    }

    fn first_child(&self) -> f32 {
        self.measured_children()
            .next()
            .map(|child| self.child_size(child))
            .unwrap_or(0.0)
    }

    fn last_child(&self) -> f32 {
        self.measured_children()
            .next_back()
            .map(|child| self.child_size(child))
            .unwrap_or(0.0)
    }

    fn content(&self) -> f32 {
        let node = self.ctx.node(self.index);
        let constraint = (self.axis == LayoutAxis::Vertical && node.is_height_depends_on_width())
            .then(|| self.data().width());
        node.preferred_content_size(constraint)[self.axis.index()]
    }

    /// Padding of the node's own managed layout along the axis.
    fn layout_padding(&self) -> f32 {
        let insets = &self.ctx.settings().safe_area_insets.insets;
        if let Some(flow) = self.flow_layout {
            let mut padding = flow.padding(self.axis) * 2.0;
            if flow.safe_area_padding_inset(self.axis) {
                padding += insets.total(self.axis);
            }
            padding
        } else if let Some(linear) = self.linear_layout.filter(|l| l.axis() == self.axis) {
            let mut padding = linear.padding * 2.0;
            if linear.safe_area_padding_inset {
                padding += insets.total(self.axis);
            }
            padding
        } else {
            0.0
        }
    }

    /// How far the parent extends past the visibility rect on this axis.
    fn visibility_margins(&self) -> Margins {
        let mut parent_position = 0.0;
        let mut parent = self.data().parent_index();
        while let Some(index) = parent {
            let data = self.ctx.data(index);
            parent_position += data.position(self.axis);
            parent = data.parent_index();
        }

        let rect = &self.ctx.settings().visibility_rect;
        let origin = rect.origin(self.axis);
        let leading = (origin - parent_position).max(0.0);
        let trailing =
            ((parent_position + self.parent_size) - (origin + rect.extent(self.axis))).max(0.0);

        match self.axis {
            LayoutAxis::Horizontal => Margins::new(leading, 0.0, trailing, 0.0),
            LayoutAxis::Vertical => Margins::new(0.0, leading, 0.0, trailing),
        }
    }
}

fn margins_record(margins: &Margins) -> FormulaValue {
    let mut fields = IndexMap::new();
    fields.insert("left".to_string(), margins.left);
    fields.insert("top".to_string(), margins.top);
    fields.insert("right".to_string(), margins.right);
    fields.insert("bottom".to_string(), margins.bottom);
    FormulaValue::Record(fields)
}

impl<T: LayoutTree> FormulaContext for SizeMeasuringAlgorithm<'_, '_, T> {
    fn field(&self, name: &str) -> Option<FormulaValue> {
        let value = match name {
            "childrenSum" => self.children_sum(),
            "maxChild" => self.max_child(),
            "firstChild" => self.first_child(),
            "lastChild" => self.last_child(),
            "content" => self.content(),
            "parent" => self.parent_size,
            "parentRest" => self.parent_rest_size,
            "parentLine" => self.parent_line_size,
            "minLimit" => self.policy.min,
            "maxLimit" => self.policy.max,
            "value" => self.policy.value,
            "visibilityMargins" => return Some(margins_record(&self.visibility_margins())),
            "safeAreaInsets" => {
                return Some(margins_record(&self.ctx.settings().safe_area_insets.insets))
            }
            _ => return None,
        };
        Some(FormulaValue::Number(value))
    }

    fn call(&self, name: &str, args: &[f32]) -> Result<f32, FormulaError> {
        match name {
            "min" => {
                expect_args(name, args, 2)?;
                Ok(args[0].min(args[1]))
            }
            "max" => {
                expect_args(name, args, 2)?;
                Ok(args[0].max(args[1]))
            }
            "clamp" => {
                expect_args(name, args, 3)?;
                Ok(clamp_value(args[0], args[1], args[2]))
            }
            _ => Err(FormulaError::UnknownFunction {
                name: name.to_string(),
            }),
        }
    }
}
