// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A receiver that follows drawing state.
//!
//! [`StateTracker`] keeps the paint attributes, the current transform, a
//! conservative device clip and the save stack, and computes device bounds
//! for every drawing call it sees. The builder uses it to accumulate list
//! bounds, culled dispatch uses it to test records inline when a list has no
//! index, and other receivers can embed it for the same bookkeeping.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f64::consts::SQRT_2;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape};

use crate::color::{BlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::{ColorFilter, ColorSource, ImageFilter, MaskFilter, PathEffect, invert};
use crate::options::SaveLayerOptions;
use crate::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
use crate::receiver::DlOpReceiver;
use crate::resource::{DlImage, DlVertices, TextBlob, bounds_of};
use crate::transform::Transform3d;

/// Device padding for hairline strokes, which are one pixel wide at any
/// scale.
const HAIRLINE_PAD: f64 = 1.0;

/// Paint attributes as set by the attribute operations.
///
/// Attributes are not part of the save stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Attributes {
    /// Anti-aliasing.
    pub anti_alias: bool,
    /// Dithering.
    pub dither: bool,
    /// Colour inversion.
    pub invert_colors: bool,
    /// Stroke cap.
    pub stroke_cap: StrokeCap,
    /// Stroke join.
    pub stroke_join: StrokeJoin,
    /// Fill/stroke style.
    pub style: DrawStyle,
    /// Stroke width; `0` is a hairline.
    pub stroke_width: f64,
    /// Miter limit.
    pub stroke_miter: f64,
    /// Solid colour.
    pub color: DlColor,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Colour source replacing the solid colour.
    pub color_source: Option<ColorSource>,
    /// Colour filter.
    pub color_filter: Option<ColorFilter>,
    /// Image filter.
    pub image_filter: Option<ImageFilter>,
    /// Mask filter.
    pub mask_filter: Option<MaskFilter>,
    /// Path effect.
    pub path_effect: Option<PathEffect>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            anti_alias: false,
            dither: false,
            invert_colors: false,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            style: DrawStyle::Fill,
            stroke_width: 0.0,
            stroke_miter: 4.0,
            color: DlColor::BLACK,
            blend_mode: BlendMode::SrcOver,
            color_source: None,
            color_filter: None,
            image_filter: None,
            mask_filter: None,
            path_effect: None,
        }
    }
}

impl Attributes {
    /// Local distance a stroke can extend past its geometry.
    #[must_use]
    pub fn stroke_outset(&self) -> f64 {
        let mut pad = self.stroke_width * 0.5;
        if self.stroke_join == StrokeJoin::Miter {
            pad *= self.stroke_miter.max(1.0);
        }
        if self.stroke_cap == StrokeCap::Square {
            pad *= SQRT_2;
        }
        pad
    }

    /// Whether a group opacity can be applied to a draw with these
    /// attributes instead of to the group.
    #[must_use]
    pub fn is_opacity_compatible(&self) -> bool {
        self.blend_mode.is_opacity_compatible()
            && self.color_filter.is_none()
            && self.image_filter.is_none()
    }

    /// Whether filling the whole clip with these attributes can change a
    /// transparent-black destination.
    #[must_use]
    pub fn modifies_transparent_black(&self) -> bool {
        if self.filters_modify_transparent_black() {
            return true;
        }
        let source_transparent = self.color_source.is_none() && self.color.is_transparent();
        !source_transparent && self.blend_mode.keeps_source_over_transparent()
    }

    /// Whether the colour or image filter produces colour from
    /// transparent-black input, which spreads a draw past its geometry.
    #[must_use]
    pub fn filters_modify_transparent_black(&self) -> bool {
        self.color_filter
            .as_ref()
            .is_some_and(ColorFilter::modifies_transparent_black)
            || self
                .image_filter
                .as_ref()
                .is_some_and(ImageFilter::modifies_transparent_black)
    }
}

/// How a drawing call consults the paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PaintUse {
    /// The paint is not used.
    Ignored,
    /// Filled; filters apply, the stroke does not.
    Filled,
    /// Stroked when the style says so.
    Styled,
    /// Always stroked.
    Stroked,
}

#[derive(Clone, Debug)]
struct LayerFilter {
    filter: ImageFilter,
    transform: Transform3d,
}

#[derive(Clone, Debug)]
struct SaveEntry {
    transform: Transform3d,
    clip: Rect,
    layer: Option<LayerFilter>,
}

/// Attribute, transform, clip and bounds bookkeeping for a replayed stream.
#[derive(Clone, Debug)]
pub struct StateTracker {
    attributes: Attributes,
    transform: Transform3d,
    /// Target of `transform_reset`.
    base: Transform3d,
    clip: Rect,
    saves: Vec<SaveEntry>,
    /// Entries below this index belong to an enclosing list and are never
    /// restored.
    floor: usize,
    last_bounds: Option<Rect>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new(crate::builder::BuilderConfig::MAX_CULL_RECT)
    }
}

impl StateTracker {
    /// Starts with identity transform and `clip` as the device clip.
    #[must_use]
    pub fn new(clip: Rect) -> Self {
        Self::with_transform(Transform3d::IDENTITY, clip)
    }

    /// Starts from an existing transform and clip.
    ///
    /// `transform_reset` returns to `transform` rather than to identity.
    #[must_use]
    pub fn with_transform(transform: Transform3d, clip: Rect) -> Self {
        Self {
            attributes: Attributes::default(),
            transform,
            base: transform,
            clip,
            saves: Vec::new(),
            floor: 0,
            last_bounds: None,
        }
    }

    /// A tracker for replaying a nested list drawn at the current state.
    ///
    /// The nested tracker starts with default attributes, inherits the
    /// transform (also as its reset target) and clip, and keeps the open
    /// layers so their filters still expand its bounds. Its restores never
    /// close those layers.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self {
            attributes: Attributes::default(),
            transform: self.transform,
            base: self.transform,
            clip: self.clip,
            saves: self.saves.clone(),
            floor: self.saves.len(),
            last_bounds: None,
        }
    }

    /// Current paint attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Current transform.
    #[must_use]
    pub fn transform(&self) -> Transform3d {
        self.transform
    }

    /// Conservative device bounds of the current clip.
    #[must_use]
    pub fn clip_bounds(&self) -> Rect {
        self.clip
    }

    /// Number of open saves and layers, excluding those inherited by a
    /// [`nested`](Self::nested) tracker.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saves.len() - self.floor
    }

    /// Device bounds of the most recent drawing call, if not yet taken.
    pub fn take_last_bounds(&mut self) -> Option<Rect> {
        self.last_bounds.take()
    }

    /// Maps a device-space cull region into the current local space.
    ///
    /// Returns `None` when the transform has perspective or is singular; the
    /// caller should not cull in that case.
    #[must_use]
    pub fn local_cull(&self, device_cull: Rect) -> Option<Rect> {
        let inverse = invert(self.transform.to_affine()?)?;
        Some(inverse.transform_rect_bbox(device_cull))
    }

    fn local_to_device(&self, local: Rect, usage: PaintUse) -> Option<Rect> {
        let attrs = &self.attributes;
        let stroked = match usage {
            PaintUse::Ignored | PaintUse::Filled => false,
            PaintUse::Styled => attrs.style.is_stroked(),
            PaintUse::Stroked => true,
        };
        let mut rect = local.abs();
        let mut hairline = false;
        if stroked {
            if attrs.stroke_width > 0.0 {
                let pad = attrs.stroke_outset();
                rect = rect.inflate(pad, pad);
            } else {
                hairline = true;
            }
        }
        if usage != PaintUse::Ignored {
            if let Some(mask) = &attrs.mask_filter {
                let pad = mask.outset();
                rect = rect.inflate(pad, pad);
            }
            if let Some(filter) = &attrs.image_filter {
                rect = filter.map_local_bounds(rect)?;
            }
        }
        let device = self.transform.map_rect(rect)?;
        Some(if hairline {
            device.inflate(HAIRLINE_PAD, HAIRLINE_PAD)
        } else {
            device
        })
    }

    /// Clips `device` (or the clip itself when unbounded) and pushes it out
    /// through every enclosing layer filter.
    fn finish(&mut self, device: Option<Rect>) {
        let mut bounds = device.map_or(self.clip, |d| d.intersect(self.clip));
        for entry in self.saves.iter().rev() {
            if let Some(layer) = &entry.layer {
                bounds = layer
                    .filter
                    .map_device_bounds(bounds, &layer.transform)
                    .map_or(entry.clip, |b| b.intersect(entry.clip));
            }
        }
        self.last_bounds = Some(bounds);
    }

    fn accumulate(&mut self, local: Rect, usage: PaintUse) {
        let device = self.local_to_device(local, usage);
        self.finish(device);
    }

    fn concat(&mut self, local: Transform3d) {
        self.transform = self.transform * local;
    }

    fn clip_local(&mut self, local: Rect, op: ClipOp) {
        if op == ClipOp::Intersect
            && let Some(device) = self.transform.map_rect(local.abs())
        {
            self.clip = self.clip.intersect(device);
        }
    }
}

fn circle_bounds(center: Point, radius: f64) -> Rect {
    Rect::new(
        center.x - radius,
        center.y - radius,
        center.x + radius,
        center.y + radius,
    )
}

impl DlOpReceiver for StateTracker {
    fn set_anti_alias(&mut self, aa: bool) {
        self.attributes.anti_alias = aa;
    }

    fn set_dither(&mut self, dither: bool) {
        self.attributes.dither = dither;
    }

    fn set_invert_colors(&mut self, invert: bool) {
        self.attributes.invert_colors = invert;
    }

    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        self.attributes.stroke_cap = cap;
    }

    fn set_stroke_join(&mut self, join: StrokeJoin) {
        self.attributes.stroke_join = join;
    }

    fn set_draw_style(&mut self, style: DrawStyle) {
        self.attributes.style = style;
    }

    fn set_stroke_width(&mut self, width: f64) {
        self.attributes.stroke_width = width;
    }

    fn set_stroke_miter(&mut self, limit: f64) {
        self.attributes.stroke_miter = limit;
    }

    fn set_color(&mut self, color: DlColor) {
        self.attributes.color = color;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.attributes.blend_mode = mode;
    }

    fn set_color_source(&mut self, source: Option<&ColorSource>) {
        self.attributes.color_source = source.cloned();
    }

    fn set_color_filter(&mut self, filter: Option<&ColorFilter>) {
        self.attributes.color_filter = filter.cloned();
    }

    fn set_image_filter(&mut self, filter: Option<&ImageFilter>) {
        self.attributes.image_filter = filter.cloned();
    }

    fn set_mask_filter(&mut self, filter: Option<&MaskFilter>) {
        self.attributes.mask_filter = filter.copied();
    }

    fn set_path_effect(&mut self, effect: Option<&PathEffect>) {
        self.attributes.path_effect = effect.cloned();
    }

    fn save(&mut self) {
        self.saves.push(SaveEntry {
            transform: self.transform,
            clip: self.clip,
            layer: None,
        });
    }

    fn save_layer(
        &mut self,
        _bounds: Option<Rect>,
        options: SaveLayerOptions,
        _backdrop: Option<&ImageFilter>,
    ) {
        let layer = options
            .renders_with_attributes()
            .then(|| self.attributes.image_filter.clone())
            .flatten()
            .map(|filter| LayerFilter {
                filter,
                transform: self.transform,
            });
        self.saves.push(SaveEntry {
            transform: self.transform,
            clip: self.clip,
            layer,
        });
    }

    fn restore(&mut self) {
        if self.saves.len() > self.floor
            && let Some(entry) = self.saves.pop()
        {
            self.transform = entry.transform;
            self.clip = entry.clip;
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.concat(Transform3d::from_translation(tx, ty));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Transform3d::from_scale(sx, sy));
    }

    fn rotate(&mut self, degrees: f64) {
        self.concat(Transform3d::from_rotation_degrees(degrees));
    }

    fn skew(&mut self, kx: f64, ky: f64) {
        self.concat(Transform3d::from_skew(kx, ky));
    }

    fn transform_2d_affine(&mut self, affine: Affine) {
        self.concat(Transform3d::from_affine(affine));
    }

    fn transform_full_perspective(&mut self, transform: &Transform3d) {
        self.concat(*transform);
    }

    fn transform_reset(&mut self) {
        self.transform = self.base;
    }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, _anti_alias: bool) {
        self.clip_local(rect, op);
    }

    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, _anti_alias: bool) {
        self.clip_local(rrect.rect(), op);
    }

    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, _anti_alias: bool) {
        self.clip_local(path.bounding_box(), op);
    }

    fn draw_paint(&mut self) {
        self.finish(None);
    }

    fn draw_color(&mut self, _color: DlColor, _mode: BlendMode) {
        self.finish(None);
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        self.accumulate(Rect::from_points(p0, p1), PaintUse::Stroked);
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.accumulate(rect, PaintUse::Styled);
    }

    fn draw_oval(&mut self, bounds: Rect) {
        self.accumulate(bounds, PaintUse::Styled);
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        self.accumulate(circle_bounds(center, radius), PaintUse::Styled);
    }

    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        self.accumulate(rrect.rect(), PaintUse::Styled);
    }

    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, _inner: RoundedRect) {
        self.accumulate(outer.rect(), PaintUse::Styled);
    }

    fn draw_arc(&mut self, oval: Rect, _start: f64, _sweep: f64, _use_center: bool) {
        self.accumulate(oval, PaintUse::Styled);
    }

    fn draw_path(&mut self, path: &Arc<BezPath>) {
        self.accumulate(path.bounding_box(), PaintUse::Styled);
    }

    fn draw_points(&mut self, _mode: PointMode, points: &[Point]) {
        self.accumulate(bounds_of(points), PaintUse::Stroked);
    }

    fn draw_vertices(&mut self, vertices: &Arc<DlVertices>, _mode: BlendMode) {
        self.accumulate(vertices.bounds(), PaintUse::Filled);
    }

    fn draw_image(
        &mut self,
        image: &Arc<DlImage>,
        point: Point,
        _sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        let rect = image.bounds() + point.to_vec2();
        self.accumulate(rect, image_paint(render_with_attributes));
    }

    fn draw_image_rect(
        &mut self,
        _image: &Arc<DlImage>,
        _src: Rect,
        dst: Rect,
        _sampling: ImageSampling,
        render_with_attributes: bool,
        _constraint: SrcRectConstraint,
    ) {
        self.accumulate(dst, image_paint(render_with_attributes));
    }

    fn draw_image_nine(
        &mut self,
        _image: &Arc<DlImage>,
        _center: Rect,
        dst: Rect,
        _filter: FilterMode,
        render_with_attributes: bool,
    ) {
        self.accumulate(dst, image_paint(render_with_attributes));
    }

    fn draw_atlas(
        &mut self,
        _atlas: &Arc<DlImage>,
        xforms: &[RSTransform],
        tex: &[Rect],
        _colors: Option<&[DlColor]>,
        _mode: BlendMode,
        _sampling: ImageSampling,
        cull: Option<Rect>,
        render_with_attributes: bool,
    ) {
        let local = cull.unwrap_or_else(|| {
            xforms
                .iter()
                .zip(tex)
                .map(|(xf, t)| xf.sprite_bounds(t.width(), t.height()))
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO)
        });
        self.accumulate(local, image_paint(render_with_attributes));
    }

    fn draw_display_list(&mut self, list: &Arc<DisplayList>, _opacity: f64, _cull: Option<Rect>) {
        self.accumulate(list.bounds(), PaintUse::Ignored);
    }

    fn draw_text_blob(&mut self, blob: &Arc<TextBlob>, origin: Point) {
        self.accumulate(blob.bounds() + origin.to_vec2(), PaintUse::Styled);
    }

    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        _color: DlColor,
        elevation: f64,
        _transparent_occluder: bool,
        dpr: f64,
    ) {
        let spread = (2.0 * elevation * dpr).max(0.0);
        self.accumulate(path.bounding_box().inflate(spread, spread), PaintUse::Ignored);
    }
}

const fn image_paint(render_with_attributes: bool) -> PaintUse {
    if render_with_attributes {
        PaintUse::Filled
    } else {
        PaintUse::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{BlurStyle, TileMode};

    fn tracker() -> StateTracker {
        StateTracker::new(Rect::new(-1000.0, -1000.0, 1000.0, 1000.0))
    }

    #[test]
    fn fill_bounds_follow_transform() {
        let mut t = tracker();
        t.translate(5.0, 5.0);
        t.draw_circle(Point::ZERO, 3.0);
        assert_eq!(t.take_last_bounds(), Some(Rect::new(2.0, 2.0, 8.0, 8.0)));
        assert!(t.take_last_bounds().is_none(), "bounds are taken once");
    }

    #[test]
    fn stroke_outset_uses_join_and_cap() {
        let mut t = tracker();
        t.set_draw_style(DrawStyle::Stroke);
        t.set_stroke_width(2.0);
        t.set_stroke_join(StrokeJoin::Round);
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(-1.0, -1.0, 11.0, 11.0)));

        t.set_stroke_join(StrokeJoin::Miter);
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(-4.0, -4.0, 14.0, 14.0)));
    }

    #[test]
    fn hairlines_pad_in_device_space() {
        let mut t = tracker();
        t.scale(10.0, 10.0);
        t.draw_line(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(-1.0, -1.0, 11.0, 1.0)));
    }

    #[test]
    fn mask_blur_outsets_three_sigma() {
        let mut t = tracker();
        t.set_mask_filter(Some(&MaskFilter::Blur {
            style: BlurStyle::Normal,
            sigma: 1.0,
        }));
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(-3.0, -3.0, 13.0, 13.0)));
    }

    #[test]
    fn clip_limits_bounds_and_restores() {
        let mut t = tracker();
        t.save();
        t.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), ClipOp::Intersect, false);
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        t.draw_paint();
        assert_eq!(t.take_last_bounds(), Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        t.restore();
        assert_eq!(t.clip_bounds(), Rect::new(-1000.0, -1000.0, 1000.0, 1000.0));
        t.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), ClipOp::Difference, false);
        assert_eq!(t.clip_bounds(), Rect::new(-1000.0, -1000.0, 1000.0, 1000.0));
    }

    #[test]
    fn layer_filter_expands_child_bounds() {
        let mut t = tracker();
        t.set_image_filter(Some(&ImageFilter::Blur {
            sigma_x: 2.0,
            sigma_y: 2.0,
            tile_mode: TileMode::Decal,
        }));
        t.save_layer(None, SaveLayerOptions::WITH_ATTRIBUTES, None);
        t.set_image_filter(None);
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(-6.0, -6.0, 16.0, 16.0)));
        t.restore();
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn reset_returns_to_base_transform() {
        let mut t = StateTracker::with_transform(
            Transform3d::from_translation(100.0, 0.0),
            Rect::new(-1000.0, -1000.0, 1000.0, 1000.0),
        );
        t.scale(2.0, 2.0);
        t.transform_reset();
        assert_eq!(t.transform(), Transform3d::from_translation(100.0, 0.0));
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(Rect::new(100.0, 0.0, 110.0, 10.0)));

        let mut t = tracker();
        t.translate(5.0, 5.0);
        t.transform_reset();
        assert_eq!(t.transform(), Transform3d::IDENTITY);
    }

    #[test]
    fn nested_tracker_keeps_enclosing_layers() {
        let mut t = tracker();
        t.set_image_filter(Some(&ImageFilter::Blur {
            sigma_x: 2.0,
            sigma_y: 2.0,
            tile_mode: TileMode::Decal,
        }));
        t.save_layer(None, SaveLayerOptions::WITH_ATTRIBUTES, None);
        t.translate(100.0, 0.0);

        let mut nested = t.nested();
        assert_eq!(nested.depth(), 0);
        assert!(nested.attributes().image_filter.is_none());
        nested.scale(2.0, 2.0);
        nested.transform_reset();
        nested.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            nested.take_last_bounds(),
            Some(Rect::new(94.0, -6.0, 116.0, 16.0)),
            "the enclosing blur still applies"
        );

        nested.restore();
        assert_eq!(nested.transform(), Transform3d::from_translation(100.0, 0.0));
        nested.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            nested.take_last_bounds(),
            Some(Rect::new(94.0, -6.0, 116.0, 16.0)),
            "inherited layers are not restored"
        );
    }

    #[test]
    fn perspective_draw_falls_back_to_clip() {
        let mut t = tracker();
        let mut m = Transform3d::IDENTITY;
        m.cols[0][3] = -1.0;
        t.transform_full_perspective(&m);
        t.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.take_last_bounds(), Some(t.clip_bounds()));
        assert!(t.local_cull(Rect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn local_cull_inverts_transform() {
        let mut t = tracker();
        t.translate(100.0, 0.0);
        t.scale(2.0, 2.0);
        let local = t.local_cull(Rect::new(100.0, 0.0, 120.0, 20.0));
        assert_eq!(local, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn attributes_survive_restore() {
        let mut t = tracker();
        t.save();
        t.set_color(DlColor::RED);
        t.restore();
        assert_eq!(t.attributes().color, DlColor::RED);
        t.restore();
        assert_eq!(t.depth(), 0, "unbalanced restore is ignored");
    }

    #[test]
    fn transparent_black_rules() {
        let mut attrs = Attributes::default();
        assert!(attrs.modifies_transparent_black());
        assert!(!attrs.filters_modify_transparent_black());
        attrs.color = DlColor::TRANSPARENT;
        assert!(!attrs.modifies_transparent_black());
        attrs.color_filter = Some(ColorFilter::Blend {
            color: DlColor::RED,
            mode: BlendMode::Src,
        });
        assert!(attrs.modifies_transparent_black());
        assert!(attrs.filters_modify_transparent_black());
        let mut attrs = Attributes::default();
        attrs.blend_mode = BlendMode::DstIn;
        assert!(!attrs.modifies_transparent_black());
    }
}
