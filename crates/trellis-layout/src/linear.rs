//! Single-axis stack layout.

use smallvec::SmallVec;
use trellis_core::{clamp_value, LayoutAxis, SizePolicy};

use crate::anchor::AnchorLayoutAlgorithm;
use crate::components::LinearLayoutComponent;
use crate::control_data::LayoutFlags;
use crate::helpers::{percent_of, Spacing};
use crate::layouter::LayoutContext;
use crate::node::LayoutTree;
use crate::size_measuring::SizeMeasuringAlgorithm;

/// Stacks the non-skipped children of a container along the layout's axis.
pub struct LinearLayoutAlgorithm<'c, 'a, T: LayoutTree> {
    ctx: &'c mut LayoutContext<'a, T>,
    layout: &'a LinearLayoutComponent,
    inverse: bool,
    skip_invisible: bool,
    spacing: Spacing,
    fixed_size: f32,
    total_percent: f32,
    children_count: usize,
    content_size: f32,
}

impl<'c, 'a, T: LayoutTree> LinearLayoutAlgorithm<'c, 'a, T> {
    pub fn new(ctx: &'c mut LayoutContext<'a, T>, layout: &'a LinearLayoutComponent) -> Self {
        Self {
            ctx,
            layout,
            inverse: false,
            skip_invisible: layout.skip_invisible,
            spacing: Spacing::default(),
            fixed_size: 0.0,
            total_percent: 0.0,
            children_count: 0,
            content_size: 0.0,
        }
    }

    pub fn apply(&mut self, container: usize, axis: LayoutAxis) {
        self.init_properties(container, axis);
        if self.children_count > 0 {
            self.resolve_dependent_on_parent_sizes(container, axis);
            self.calculate_dynamic_padding_and_spacing(container, axis);
            self.place_children(container, axis);
        }

        AnchorLayoutAlgorithm::new(self.ctx).apply(container, axis, true);
    }

    fn init_properties(&mut self, container: usize, axis: LayoutAxis) {
        let settings = self.ctx.settings();
        self.inverse = self.layout.orientation.is_inverse();
        if axis == LayoutAxis::Horizontal && settings.rtl && self.layout.use_rtl {
            self.inverse = !self.inverse;
        }

        let mut leading = self.layout.padding;
        let mut trailing = self.layout.padding;
        if self.layout.safe_area_padding_inset {
            let insets = &settings.safe_area_insets.insets;
            let (start, end) = (insets.leading(axis), insets.trailing(axis));
            if self.inverse {
                leading += end;
                trailing += start;
            } else {
                leading += start;
                trailing += end;
            }
        }
        self.spacing = Spacing::new(leading, trailing, self.layout.spacing);

        self.fixed_size = 0.0;
        self.total_percent = 0.0;
        self.children_count = 0;
        for child in self.ctx.data(container).children() {
            let data = self.ctx.data(child);
            if data.have_to_skip(self.skip_invisible) {
                continue;
            }
            self.children_count += 1;

            let policy = self.ctx.node(child).size_policy().map(|p| p.axis(axis));
            match policy {
                Some(policy) if policy.policy == SizePolicy::PercentOfParent => {
                    self.total_percent += policy.value;
                }
                Some(policy) if policy.policy == SizePolicy::Formula => {}
                _ => self.fixed_size += data.size(axis),
            }
        }

        self.content_size = self.ctx.data(container).size(axis)
            - self.spacing.leading
            - self.spacing.trailing
            - self.spacing.spacing * self.children_count.saturating_sub(1) as f32;
    }

    /// Fixed point over the children whose size depends on the container.
    ///
    /// Each round finalizes at most one child: a percent child whose share
    /// violates its limits, or a formula child. Remaining percent children keep
    /// their tentative share.
    fn resolve_dependent_on_parent_sizes(&mut self, container: usize, axis: LayoutAxis) {
        let container_size = self.ctx.data(container).size(axis);
        let calculated = LayoutFlags::size_calculated(axis);
        let mut rest_size = self.content_size - self.fixed_size;
        let mut total_percent = self.total_percent;

        let mut pending: SmallVec<[usize; 16]> = self
            .ctx
            .data(container)
            .children()
            .filter(|&child| {
                let data = self.ctx.data(child);
                !data.have_to_skip(self.skip_invisible) && !data.has_flag(calculated)
            })
            .filter(|&child| {
                self.ctx.node(child).size_policy().is_some_and(|p| {
                    matches!(
                        p.axis(axis).policy,
                        SizePolicy::PercentOfParent | SizePolicy::Formula
                    )
                })
            })
            .collect();

        loop {
            let mut finalized = None;

            for (slot, &child) in pending.iter().enumerate() {
                let Some(policy) = self.ctx.node(child).size_policy().map(|p| p.axis(axis)) else {
                    continue;
                };

                if policy.policy == SizePolicy::Formula {
                    let size = if self.ctx.is_measuring() {
                        SizeMeasuringAlgorithm::new(self.ctx, child, axis, policy)
                            .with_parent_size(container_size)
                            .with_parent_rest_size(rest_size)
                            .calculate()
                    } else {
                        self.ctx.data(child).size(axis)
                    };
                    let data = self.ctx.data_mut(child);
                    data.set_size(axis, size);
                    data.set_flag(calculated);
                    rest_size -= size;
                    finalized = Some(slot);
                    break;
                }

                let percent = policy.value;
                let share = if total_percent > 100.0 {
                    rest_size * percent / total_percent
                } else {
                    percent_of(rest_size, percent)
                };

                if share < policy.min || share > policy.max {
                    let size = clamp_value(share, policy.min, policy.max);
                    let data = self.ctx.data_mut(child);
                    data.set_size(axis, size);
                    data.set_flag(calculated);
                    rest_size -= size;
                    total_percent -= percent;
                    finalized = Some(slot);
                    break;
                }

                self.ctx.data_mut(child).set_size(axis, share);
            }

            match finalized {
                Some(slot) => {
                    pending.remove(slot);
                }
                None => break,
            }
        }
    }

    fn calculate_dynamic_padding_and_spacing(&mut self, container: usize, axis: LayoutAxis) {
        if !self.layout.dynamic_padding && !self.layout.dynamic_spacing {
            return;
        }

        let children_size: f32 = self
            .ctx
            .data(container)
            .children()
            .map(|child| self.ctx.data(child))
            .filter(|data| !data.have_to_skip(self.skip_invisible))
            .map(|data| data.size(axis))
            .sum();

        let available = self.ctx.data(container).size(axis);
        self.spacing.distribute(
            self.layout.dynamic_padding,
            self.layout.dynamic_spacing,
            available - children_size,
            self.children_count,
        );
    }

    fn place_children(&mut self, container: usize, axis: LayoutAxis) {
        let container_size = self.ctx.data(container).size(axis);
        let mut position = if self.inverse {
            container_size - self.spacing.leading
        } else {
            self.spacing.leading
        };

        for child in self.ctx.data(container).children() {
            let data = self.ctx.data_mut(child);
            if data.have_to_skip(self.skip_invisible) {
                continue;
            }

            let size = data.size(axis);
            if self.inverse {
                data.set_position(axis, position - size);
                position -= size + self.spacing.spacing;
            } else {
                data.set_position(axis, position);
                position += size + self.spacing.spacing;
            }
        }
    }
}
