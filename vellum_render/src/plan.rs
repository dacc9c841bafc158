// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the flattened draws of one list, nested lists included.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};
use vellum_core::DisplayList;
use vellum_core::color::{BlendMode, DlColor};
use vellum_core::effects::{ColorFilter, ColorSource, ImageFilter, MaskFilter, PathEffect};
use vellum_core::op::OpType;
use vellum_core::options::SaveLayerOptions;
use vellum_core::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
use vellum_core::receiver::DlOpReceiver;
use vellum_core::resource::{DlImage, DlVertices, TextBlob};
use vellum_core::tracker::StateTracker;
use vellum_core::transform::Transform3d;

/// A single leaf draw in the render plan.
///
/// Items are produced in painter's order. Nested lists never appear as
/// items; their draws are inlined.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// Unique id of the list the draw was recorded in.
    pub list_id: u64,
    /// Record kind of the draw.
    pub kind: OpType,
    /// Conservative device bounds.
    pub bounds: Rect,
    /// Device transform at the draw.
    pub transform: Transform3d,
    /// Product of the opacities of every enclosing nested list.
    pub opacity: f64,
    /// Number of save layers open around the draw, across nesting.
    pub layer_depth: usize,
}

/// An ordered list of draws for one frame.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draws in painter's order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `list`, culled to `cull` when given.
    #[must_use]
    pub fn from_list(list: &DisplayList, cull: Option<Rect>) -> Self {
        let mut recorder = PlanRecorder::new(list.unique_id(), Self::new());
        match cull {
            Some(cull) => list.dispatch_culled(&mut recorder, cull),
            None => list.dispatch(&mut recorder),
        }
        recorder.finish()
    }

    /// Union of every item's bounds, or `None` for an empty plan.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .iter()
            .map(|item| item.bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A receiver that appends one [`RenderItem`] per draw to a plan.
///
/// Nested lists are replayed into a child recorder whose tracker is
/// [nested](StateTracker::nested) in the parent's, so it keeps the parent's
/// transform, clip and open layer filters. When the parent received a cull region for
/// the nested list, the child uses culled dispatch with it.
#[derive(Debug)]
pub struct PlanRecorder {
    tracker: StateTracker,
    list_id: u64,
    opacity: f64,
    base_depth: usize,
    /// One entry per open save; `true` for layers.
    saves: Vec<bool>,
    plan: RenderPlan,
}

impl PlanRecorder {
    /// Starts recording draws of list `list_id` into `plan`.
    #[must_use]
    pub fn new(list_id: u64, plan: RenderPlan) -> Self {
        Self {
            tracker: StateTracker::default(),
            list_id,
            opacity: 1.0,
            base_depth: 0,
            saves: Vec::new(),
            plan,
        }
    }

    /// Returns the finished plan.
    #[must_use]
    pub fn finish(self) -> RenderPlan {
        self.plan
    }

    fn layer_depth(&self) -> usize {
        self.base_depth + self.saves.iter().filter(|layer| **layer).count()
    }

    fn emit(&mut self, kind: OpType) {
        let Some(bounds) = self.tracker.take_last_bounds() else {
            return;
        };
        self.plan.items.push(RenderItem {
            list_id: self.list_id,
            kind,
            bounds,
            transform: self.tracker.transform(),
            opacity: self.opacity,
            layer_depth: self.layer_depth(),
        });
    }
}

macro_rules! forward {
    ($( fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*); )*) => {
        $(
            fn $name(&mut self $(, $arg: $ty)*) {
                self.tracker.$name($($arg),*);
            }
        )*
    };
}

macro_rules! draw {
    ($( fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) => $kind:expr; )*) => {
        $(
            fn $name(&mut self $(, $arg: $ty)*) {
                self.tracker.$name($($arg),*);
                self.emit($kind);
            }
        )*
    };
}

const fn with_attr(render_with_attributes: bool, plain: OpType, with: OpType) -> OpType {
    if render_with_attributes { with } else { plain }
}

impl DlOpReceiver for PlanRecorder {
    forward! {
        fn set_anti_alias(&mut self, aa: bool);
        fn set_dither(&mut self, dither: bool);
        fn set_invert_colors(&mut self, invert: bool);
        fn set_stroke_cap(&mut self, cap: StrokeCap);
        fn set_stroke_join(&mut self, join: StrokeJoin);
        fn set_draw_style(&mut self, style: DrawStyle);
        fn set_stroke_width(&mut self, width: f64);
        fn set_stroke_miter(&mut self, limit: f64);
        fn set_color(&mut self, color: DlColor);
        fn set_blend_mode(&mut self, mode: BlendMode);
        fn set_color_source(&mut self, source: Option<&ColorSource>);
        fn set_color_filter(&mut self, filter: Option<&ColorFilter>);
        fn set_image_filter(&mut self, filter: Option<&ImageFilter>);
        fn set_mask_filter(&mut self, filter: Option<&MaskFilter>);
        fn set_path_effect(&mut self, effect: Option<&PathEffect>);
        fn translate(&mut self, tx: f64, ty: f64);
        fn scale(&mut self, sx: f64, sy: f64);
        fn rotate(&mut self, degrees: f64);
        fn skew(&mut self, kx: f64, ky: f64);
        fn transform_2d_affine(&mut self, affine: Affine);
        fn transform_full_perspective(&mut self, transform: &Transform3d);
        fn transform_reset(&mut self);
        fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool);
        fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, anti_alias: bool);
        fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, anti_alias: bool);
    }

    fn save(&mut self) {
        self.tracker.save();
        self.saves.push(false);
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&ImageFilter>,
    ) {
        self.tracker.save_layer(bounds, options, backdrop);
        self.saves.push(true);
    }

    fn restore(&mut self) {
        self.tracker.restore();
        self.saves.pop();
    }

    draw! {
        fn draw_paint(&mut self) => OpType::DrawPaint;
        fn draw_color(&mut self, color: DlColor, mode: BlendMode) => OpType::DrawColor;
        fn draw_line(&mut self, p0: Point, p1: Point) => OpType::DrawLine;
        fn draw_rect(&mut self, rect: Rect) => OpType::DrawRect;
        fn draw_oval(&mut self, bounds: Rect) => OpType::DrawOval;
        fn draw_circle(&mut self, center: Point, radius: f64) => OpType::DrawCircle;
        fn draw_rounded_rect(&mut self, rrect: RoundedRect) => OpType::DrawRRect;
        fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect)
            => OpType::DrawDRRect;
        fn draw_arc(
            &mut self,
            oval: Rect,
            start_degrees: f64,
            sweep_degrees: f64,
            use_center: bool
        ) => OpType::DrawArc;
        fn draw_path(&mut self, path: &Arc<BezPath>) => OpType::DrawPath;
        fn draw_points(&mut self, mode: PointMode, points: &[Point]) => match mode {
            PointMode::Points => OpType::DrawPoints,
            PointMode::Lines => OpType::DrawLines,
            PointMode::Polygon => OpType::DrawPolygon,
        };
        fn draw_vertices(&mut self, vertices: &Arc<DlVertices>, mode: BlendMode)
            => OpType::DrawVertices;
        fn draw_image(
            &mut self,
            image: &Arc<DlImage>,
            point: Point,
            sampling: ImageSampling,
            render_with_attributes: bool
        ) => with_attr(render_with_attributes, OpType::DrawImage, OpType::DrawImageWithAttr);
        fn draw_image_rect(
            &mut self,
            image: &Arc<DlImage>,
            src: Rect,
            dst: Rect,
            sampling: ImageSampling,
            render_with_attributes: bool,
            constraint: SrcRectConstraint
        ) => OpType::DrawImageRect;
        fn draw_image_nine(
            &mut self,
            image: &Arc<DlImage>,
            center: Rect,
            dst: Rect,
            filter: FilterMode,
            render_with_attributes: bool
        ) => with_attr(
            render_with_attributes,
            OpType::DrawImageNine,
            OpType::DrawImageNineWithAttr,
        );
        fn draw_atlas(
            &mut self,
            atlas: &Arc<DlImage>,
            xforms: &[RSTransform],
            tex: &[Rect],
            colors: Option<&[DlColor]>,
            mode: BlendMode,
            sampling: ImageSampling,
            cull: Option<Rect>,
            render_with_attributes: bool
        ) => if cull.is_some() { OpType::DrawAtlasCulled } else { OpType::DrawAtlas };
        fn draw_text_blob(&mut self, blob: &Arc<TextBlob>, origin: Point) => OpType::DrawTextBlob;
        fn draw_shadow(
            &mut self,
            path: &Arc<BezPath>,
            color: DlColor,
            elevation: f64,
            transparent_occluder: bool,
            dpr: f64
        ) => with_attr(
            transparent_occluder,
            OpType::DrawShadow,
            OpType::DrawShadowTransparentOccluder,
        );
    }

    fn draw_display_list(&mut self, list: &Arc<DisplayList>, opacity: f64, cull: Option<Rect>) {
        let mut child = Self {
            tracker: self.tracker.nested(),
            list_id: list.unique_id(),
            opacity: self.opacity * opacity,
            base_depth: self.layer_depth(),
            saves: Vec::new(),
            plan: core::mem::take(&mut self.plan),
        };
        match cull {
            Some(cull) => list.dispatch_culled(&mut child, cull),
            None => list.dispatch(&mut child),
        }
        self.plan = child.plan;
        self.tracker.draw_display_list(list, opacity, cull);
        _ = self.tracker.take_last_bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::paint::TileMode;
    use vellum_core::{BuilderConfig, DisplayListBuilder};

    fn child() -> Arc<DisplayList> {
        let mut b = DisplayListBuilder::default();
        b.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        b.draw_rect(Rect::new(20.0, 0.0, 30.0, 10.0));
        b.build().unwrap()
    }

    #[test]
    fn flat_list_becomes_one_item_per_draw() {
        let list = child();
        let plan = RenderPlan::from_list(&list, None);
        assert_eq!(plan.items.len(), 2);
        assert!(plan.items.iter().all(|item| item.list_id == list.unique_id()));
        assert_eq!(plan.items[1].kind, OpType::DrawRect);
        assert_eq!(plan.items[1].bounds, Rect::new(20.0, 0.0, 30.0, 10.0));
        assert_eq!(plan.bounds(), Some(list.bounds()));
    }

    #[test]
    fn nested_lists_are_inlined() {
        let child = child();
        let mut b = DisplayListBuilder::default();
        b.save_layer(None, SaveLayerOptions::NO_ATTRIBUTES, None);
        b.translate(100.0, 0.0);
        b.draw_display_list(&child, 0.5, None);
        b.restore();
        b.draw_circle(Point::new(5.0, 5.0), 5.0);
        let parent = b.build().unwrap();

        let plan = RenderPlan::from_list(&parent, None);
        let kinds: Vec<_> = plan.items.iter().map(|item| item.kind).collect();
        assert_eq!(kinds, [OpType::DrawRect, OpType::DrawRect, OpType::DrawCircle]);

        let nested = &plan.items[0];
        assert_eq!(nested.list_id, child.unique_id());
        assert_eq!(nested.bounds, Rect::new(100.0, 0.0, 110.0, 10.0));
        assert_eq!(nested.transform, Transform3d::from_translation(100.0, 0.0));
        assert_eq!(nested.opacity, 0.5);
        assert_eq!(nested.layer_depth, 1);

        let after = &plan.items[2];
        assert_eq!(after.list_id, parent.unique_id());
        assert_eq!(after.opacity, 1.0);
        assert_eq!(after.layer_depth, 0, "the layer was restored");
        assert_eq!(after.transform, Transform3d::IDENTITY);
    }

    #[test]
    fn nested_reset_keeps_parent_transform() {
        let mut b = DisplayListBuilder::default();
        b.scale(2.0, 2.0);
        b.transform_reset();
        b.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let child = b.build().unwrap();

        let mut b = DisplayListBuilder::default();
        b.translate(100.0, 0.0);
        b.draw_display_list(&child, 1.0, None);
        let parent = b.build().unwrap();

        let plan = RenderPlan::from_list(&parent, None);
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].bounds, Rect::new(100.0, 0.0, 110.0, 10.0));
        assert_eq!(plan.items[0].transform, Transform3d::from_translation(100.0, 0.0));
        assert_eq!(plan.bounds(), Some(parent.bounds()));
    }

    #[test]
    fn enclosing_layer_filters_reach_nested_draws() {
        let child = child();
        let mut b = DisplayListBuilder::default();
        b.set_image_filter(Some(&ImageFilter::Blur {
            sigma_x: 1.0,
            sigma_y: 1.0,
            tile_mode: TileMode::Decal,
        }));
        b.save_layer(None, SaveLayerOptions::WITH_ATTRIBUTES, None);
        b.set_image_filter(None);
        b.draw_display_list(&child, 1.0, None);
        b.restore();
        let parent = b.build().unwrap();

        let plan = RenderPlan::from_list(&parent, None);
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].bounds, Rect::new(-3.0, -3.0, 13.0, 13.0));
        assert_eq!(plan.items[0].layer_depth, 1);
    }

    #[test]
    fn cull_reaches_nested_lists() {
        let child = child();
        for config in [BuilderConfig::new(), BuilderConfig::without_index()] {
            let mut b = DisplayListBuilder::new(config);
            b.translate(100.0, 0.0);
            b.draw_display_list(&child, 1.0, None);
            let parent = b.build().unwrap();

            let plan = RenderPlan::from_list(&parent, Some(Rect::new(95.0, 0.0, 105.0, 5.0)));
            assert_eq!(plan.items.len(), 1, "only the first child rect is visible");
            assert_eq!(plan.items[0].bounds, Rect::new(100.0, 0.0, 110.0, 10.0));
        }
    }

    #[test]
    fn plans_can_be_reused() {
        let list = child();
        let mut recorder = PlanRecorder::new(list.unique_id(), RenderPlan::new());
        list.dispatch(&mut recorder);
        let mut plan = recorder.finish();
        assert_eq!(plan.items.len(), 2);
        plan.clear();
        assert!(plan.items.is_empty());
        assert_eq!(plan.bounds(), None);
    }
}
