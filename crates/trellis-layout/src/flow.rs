//! Line-wrapping layout with stick hints and bidirectional runs.
//!
//! The horizontal pass breaks children into lines and marks the last child of
//! every line with `LAST_IN_LINE`. The vertical pass reads those marks, so it
//! must run after the horizontal pass of the same layout run.

use smallvec::SmallVec;
use trellis_core::{
    clamp_value, ContentDirection, FlowOrientation, LayoutAxis, SizePolicy, EPSILON,
};

use crate::anchor::{position_by_anchors, AnchorLayoutAlgorithm};
use crate::components::FlowLayoutComponent;
use crate::control_data::LayoutFlags;
use crate::helpers::{percent_of, Spacing};
use crate::layouter::LayoutContext;
use crate::node::LayoutTree;
use crate::size_measuring::SizeMeasuringAlgorithm;

/// A non-skipped child taking part in line breaking.
#[derive(Debug, Clone, Copy)]
struct FlowItem {
    index: usize,
    size: f32,
    /// Sticks to the previous item
    stick: bool,
    /// The stick may never be broken
    stick_hard: bool,
    new_line_before: bool,
}

/// One line of items.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FlowLine {
    first_index: usize,
    last_index: usize,
    /// Number of stick groups in the line
    children_count: usize,
    /// Sum of item widths without spacing
    used_size: f32,
}

impl FlowLine {
    fn from_items(items: &[FlowItem]) -> Self {
        debug_assert!(!items.is_empty());
        let groups = items
            .iter()
            .enumerate()
            .filter(|(i, item)| *i == 0 || !item.stick)
            .count();
        Self {
            first_index: items.first().map_or(0, |item| item.index),
            last_index: items.last().map_or(0, |item| item.index),
            children_count: groups,
            used_size: items.iter().map(|item| item.size).sum(),
        }
    }
}

/// First item of the hard-stuck chain that ends at `end`, not before `start`.
fn hard_chain_start(items: &[FlowItem], start: usize, end: usize) -> usize {
    let mut index = end;
    while index > start && items[index].stick_hard {
        index -= 1;
    }
    index
}

/// Arranges the children of a flow container.
pub struct FlowLayoutAlgorithm<'c, 'a, T: LayoutTree> {
    ctx: &'c mut LayoutContext<'a, T>,
    layout: &'a FlowLayoutComponent,
    inverse: bool,
    skip_invisible: bool,
    horizontal: Spacing,
    vertical: Spacing,
}

impl<'c, 'a, T: LayoutTree> FlowLayoutAlgorithm<'c, 'a, T> {
    pub fn new(ctx: &'c mut LayoutContext<'a, T>, layout: &'a FlowLayoutComponent) -> Self {
        let settings = ctx.settings();
        let mut inverse = layout.orientation == FlowOrientation::RightToLeft;
        if settings.rtl && layout.use_rtl {
            inverse = !inverse;
        }

        let insets = &settings.safe_area_insets.insets;
        let mut horizontal = Spacing::new(
            layout.horizontal_padding,
            layout.horizontal_padding,
            layout.horizontal_spacing,
        );
        if layout.horizontal_safe_area_padding_inset {
            if inverse {
                horizontal.leading += insets.right;
                horizontal.trailing += insets.left;
            } else {
                horizontal.leading += insets.left;
                horizontal.trailing += insets.right;
            }
        }

        let mut vertical = Spacing::new(
            layout.vertical_padding,
            layout.vertical_padding,
            layout.vertical_spacing,
        );
        if layout.vertical_safe_area_padding_inset {
            vertical.leading += insets.top;
            vertical.trailing += insets.bottom;
        }

        Self {
            ctx,
            layout,
            inverse,
            skip_invisible: layout.skip_invisible,
            horizontal,
            vertical,
        }
    }

    pub fn apply(&mut self, container: usize, axis: LayoutAxis) {
        if self.ctx.data(container).has_children() {
            match axis {
                LayoutAxis::Horizontal => self.process_horizontal(container),
                LayoutAxis::Vertical => self.process_vertical(container),
            }
        }

        AnchorLayoutAlgorithm::new(self.ctx).apply(container, axis, true);
    }

    fn process_horizontal(&mut self, container: usize) {
        let width = self.ctx.data(container).width();
        let items = self.collect_items(container, width);
        let lines = self.collect_lines(width, &items);

        if self.layout.dynamic_horizontal_padding {
            self.fix_horizontal_padding(width, &lines);
        }
        for line in &lines {
            self.layout_line(width, line);
        }

        let data = self.ctx.data_mut(container);
        data.set_flag(LayoutFlags::LINES_COLLECTED);
        log::trace!("flow {:?}: {} lines", data.node(), lines.len());
    }

    /// Resolve item widths and record stick and direction flags.
    fn collect_items(&mut self, container: usize, width: f32) -> Vec<FlowItem> {
        let default_direction = if self.inverse {
            ContentDirection::Rtl
        } else {
            ContentDirection::Ltr
        };

        let mut items = Vec::new();
        let mut new_line_before_next = false;
        let mut stick_before_next = false;
        let mut stick_hard_before_next = false;
        let mut prev_direction = ContentDirection::Neutral;

        for child in self.ctx.data(container).children() {
            if self.ctx.data(child).have_to_skip(self.skip_invisible) {
                continue;
            }
            let size = self.resolve_width(child, width);

            let mut new_line_before = std::mem::take(&mut new_line_before_next);
            let mut stick = std::mem::take(&mut stick_before_next);
            let mut stick_hard = std::mem::take(&mut stick_hard_before_next);
            let mut direction = default_direction;

            if let Some(hint) = self.ctx.node(child).flow_hint() {
                new_line_before |= hint.new_line_before_this;
                new_line_before_next = hint.new_line_after_this;
                stick |= hint.stick_item_before_this;
                stick_before_next = hint.stick_item_after_this;
                stick_hard |= hint.stick_hard_before_this;
                stick_hard_before_next = hint.stick_hard_after_this;
                direction = hint.content_direction;
            }

            // sticking only holds within one direction run
            if direction != ContentDirection::Neutral && direction != prev_direction {
                stick = false;
                stick_hard = false;
            }
            prev_direction = direction;

            let mut flags = LayoutFlags::empty();
            if stick {
                flags |= LayoutFlags::STICK_THIS;
                if stick_hard {
                    flags |= LayoutFlags::STICK_HARD;
                }
            }
            match direction {
                ContentDirection::Ltr => flags |= LayoutFlags::LTR,
                ContentDirection::Rtl => flags |= LayoutFlags::RTL,
                ContentDirection::Neutral => {}
            }
            self.ctx.data_mut(child).set_flag(flags);

            items.push(FlowItem {
                index: child,
                size,
                stick,
                stick_hard: stick && stick_hard,
                new_line_before,
            });
        }
        items
    }

    fn resolve_width(&mut self, child: usize, width: f32) -> f32 {
        let axis = LayoutAxis::Horizontal;
        let measuring = self.ctx.is_measuring();
        let policy = self.ctx.node(child).size_policy().map(|p| p.axis(axis));
        let size = match policy {
            Some(policy) if policy.policy == SizePolicy::PercentOfParent => {
                let available = width - self.horizontal.leading - self.horizontal.trailing;
                clamp_value(percent_of(available, policy.value), policy.min, policy.max)
            }
            Some(policy) if policy.policy == SizePolicy::Formula && measuring => {
                SizeMeasuringAlgorithm::new(self.ctx, child, axis, policy)
                    .with_parent_size(width)
                    .calculate()
            }
            _ => return self.ctx.data(child).width(),
        };

        let data = self.ctx.data_mut(child);
        data.set_size(axis, size);
        data.width()
    }

    fn collect_lines(&self, width: f32, items: &[FlowItem]) -> Vec<FlowLine> {
        let available = width - self.horizontal.leading - self.horizontal.trailing;
        let spacing = self.horizontal.spacing;

        let mut lines = Vec::new();
        let mut start = 0;
        let mut groups = 0usize;
        let mut used = 0.0;
        let mut k = 0;

        while k < items.len() {
            let item = &items[k];
            if item.new_line_before && k > start {
                lines.push(FlowLine::from_items(&items[start..k]));
                start = k;
                groups = 0;
                used = 0.0;
            }

            let gaps = match groups {
                0 => 0,
                n if item.stick => n - 1,
                n => n,
            };
            let rest = available - used - spacing * gaps as f32 - item.size;

            // an item that starts a line is always accepted, even when oversized
            if rest < -EPSILON && k > start {
                let cut = if item.stick_hard {
                    hard_chain_start(items, start, k)
                } else {
                    k
                };
                if cut > start {
                    lines.push(FlowLine::from_items(&items[start..cut]));
                    start = cut;
                    groups = 0;
                    used = 0.0;
                    k = cut;
                    continue;
                }
                // a hard chain fills the whole line and is kept together
            }

            if !item.stick || k == start {
                groups += 1;
            }
            used += item.size;
            k += 1;
        }

        if start < items.len() {
            lines.push(FlowLine::from_items(&items[start..]));
        }
        lines
    }

    /// Widen the padding so the widest line is centered.
    fn fix_horizontal_padding(&mut self, width: f32, lines: &[FlowLine]) {
        let spacing = self.horizontal.spacing;
        let max_used = lines
            .iter()
            .map(|line| line.used_size + spacing * line.children_count.saturating_sub(1) as f32)
            .fold(0.0, f32::max);

        let rest = width - max_used - self.horizontal.leading - self.horizontal.trailing;
        if rest >= EPSILON {
            self.horizontal.leading += rest / 2.0;
            self.horizontal.trailing += rest / 2.0;
        }
    }

    fn layout_line(&mut self, width: f32, line: &FlowLine) {
        let mut spacing = self.horizontal;
        spacing.distribute(
            self.layout.dynamic_horizontal_in_line_padding,
            self.layout.dynamic_horizontal_spacing,
            width - line.used_size,
            line.children_count,
        );

        let inverse = self.inverse;
        let mut position = if inverse {
            width - spacing.leading
        } else {
            spacing.leading
        };
        let (order, real_last) = self.order_by_content_direction(line);

        let mut first = true;
        let mut prev_same_direction = true;
        let mut stick_next = false;
        for index in order {
            let data = self.ctx.data_mut(index);
            let stick_this = data.has_flag(LayoutFlags::STICK_THIS);
            let ltr = data.has_flag(LayoutFlags::LTR);
            let rtl = data.has_flag(LayoutFlags::RTL);
            let same_direction = (!ltr && !rtl) || (!inverse && ltr) || (inverse && rtl);
            let paired_direction = same_direction == prev_same_direction;

            if first {
                if stick_this && !same_direction {
                    stick_next = true;
                }
            } else if stick_this && same_direction {
                stick_next = false;
            } else {
                if !(stick_next && paired_direction) {
                    position += if inverse { -spacing.spacing } else { spacing.spacing };
                }
                stick_next = stick_this && !same_direction;
            }

            let size = data.width();
            if inverse {
                data.set_position(LayoutAxis::Horizontal, position - size);
                position -= size;
            } else {
                data.set_position(LayoutAxis::Horizontal, position);
                position += size;
            }

            first = false;
            prev_same_direction = same_direction;
        }

        if let Some(last) = real_last {
            self.ctx.data_mut(last).set_flag(LayoutFlags::LAST_IN_LINE);
        }
    }

    /// Placement order of a line's items and the last item in tree order.
    ///
    /// Runs of the direction opposite to the layout are reversed.
    fn order_by_content_direction(
        &self,
        line: &FlowLine,
    ) -> (SmallVec<[usize; 16]>, Option<usize>) {
        let mut order: SmallVec<[usize; 16]> = SmallVec::new();
        let mut run_start = 0;
        let mut last_direction = ContentDirection::Neutral;
        let mut real_last = None;

        for index in line.first_index..=line.last_index {
            let data = self.ctx.data(index);
            if data.have_to_skip(self.skip_invisible) {
                continue;
            }

            let direction = if data.has_flag(LayoutFlags::LTR) {
                ContentDirection::Ltr
            } else if data.has_flag(LayoutFlags::RTL) {
                ContentDirection::Rtl
            } else {
                ContentDirection::Neutral
            };

            let prepend = !order.is_empty()
                && direction == last_direction
                && match direction {
                    ContentDirection::Neutral => false,
                    ContentDirection::Ltr => self.inverse,
                    ContentDirection::Rtl => !self.inverse,
                };
            if prepend {
                order.insert(run_start, index);
            } else {
                order.push(index);
                run_start = order.len() - 1;
            }

            last_direction = direction;
            real_last = Some(index);
        }

        (order, real_last)
    }

    fn process_vertical(&mut self, container: usize) {
        if !self.ctx.data(container).has_flag(LayoutFlags::LINES_COLLECTED) {
            debug_assert!(false, "flow lines must be collected before the vertical pass");
            log::warn!(
                "flow {:?}: vertical pass before line breaking",
                self.ctx.data(container).node()
            );
            return;
        }

        self.calculate_vertical_dynamic_padding_and_spacing(container);

        let height = self.ctx.data(container).height();
        let children = self.ctx.data(container).children();
        let mut line_height = 0.0f32;
        let mut top = self.vertical.leading;
        let mut first = children.start;

        for child in children {
            let data = self.ctx.data(child);
            if data.have_to_skip(self.skip_invisible) {
                continue;
            }

            line_height = line_height.max(data.height());
            if data.has_flag(LayoutFlags::LAST_IN_LINE) {
                self.layout_line_vertically(height, first, child, top, top + line_height);
                top += line_height + self.vertical.spacing;
                line_height = 0.0;
                first = child + 1;
            }
        }
    }

    fn calculate_vertical_dynamic_padding_and_spacing(&mut self, container: usize) {
        if !self.layout.dynamic_vertical_padding && !self.layout.dynamic_vertical_spacing {
            return;
        }

        let mut lines = 0;
        let mut content_size = 0.0;
        let mut line_height = 0.0f32;
        for child in self.ctx.data(container).children() {
            let data = self.ctx.data(child);
            if data.have_to_skip(self.skip_invisible) {
                continue;
            }
            line_height = line_height.max(data.height());
            if data.has_flag(LayoutFlags::LAST_IN_LINE) {
                lines += 1;
                content_size += line_height;
                line_height = 0.0;
            }
        }

        let rest = self.ctx.data(container).height() - content_size;
        self.vertical.distribute(
            self.layout.dynamic_vertical_padding,
            self.layout.dynamic_vertical_spacing,
            rest,
            lines,
        );
    }

    /// Size line-relative policies, then anchor each child within `[top, bottom]`.
    fn layout_line_vertically(
        &mut self,
        container_height: f32,
        first: usize,
        last: usize,
        top: f32,
        bottom: f32,
    ) {
        let axis = LayoutAxis::Vertical;
        let measuring = self.ctx.is_measuring();
        for child in first..=last {
            if self.ctx.data(child).have_to_skip(self.skip_invisible) {
                continue;
            }

            let policy = self.ctx.node(child).size_policy().map(|p| p.axis(axis));
            let size = match policy {
                Some(policy) if policy.policy == SizePolicy::PercentOfParent => Some(clamp_value(
                    percent_of(bottom - top, policy.value),
                    policy.min,
                    policy.max,
                )),
                Some(policy) if policy.policy == SizePolicy::Formula && measuring => Some(
                    SizeMeasuringAlgorithm::new(self.ctx, child, axis, policy)
                        .with_parent_size(container_height)
                        .with_parent_line_size(bottom - top)
                        .calculate(),
                ),
                _ => None,
            };

            let data = self.ctx.data_mut(child);
            if let Some(size) = size {
                data.set_size(axis, size);
            }
            data.set_position(axis, top);
            position_by_anchors(self.ctx, child, axis, top, bottom);
        }
    }
}
