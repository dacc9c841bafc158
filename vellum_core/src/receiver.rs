// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The replay interface.
//!
//! [`DlOpReceiver`] has one method per receiver operation. Every method body
//! defaults to a no-op, so a receiver that only cares about drawing calls
//! implements only those. [`NoopReceiver`] discards everything, and
//! [`StateTracker`](crate::tracker::StateTracker) is the building block for
//! receivers that need the current transform, clip and attributes.
//!
//! Dispatch calls [`DlOpReceiver::should_stop`] before every record; a
//! receiver that wants to abandon a long replay returns `true` there.

use alloc::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};

use crate::color::{BlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::{ColorFilter, ColorSource, ImageFilter, MaskFilter, PathEffect};
use crate::options::SaveLayerOptions;
use crate::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
use crate::resource::{DlImage, DlVertices, TextBlob};
use crate::transform::Transform3d;

/// Consumer of a replayed operation stream.
///
/// Recording order is z-order; dispatch calls these methods in exactly that
/// order.
pub trait DlOpReceiver {
    /// Polled before every record; returning `true` ends the replay.
    fn should_stop(&self) -> bool {
        false
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Sets anti-aliasing.
    fn set_anti_alias(&mut self, aa: bool) {
        _ = aa;
    }

    /// Sets dithering.
    fn set_dither(&mut self, dither: bool) {
        _ = dither;
    }

    /// Sets colour inversion.
    fn set_invert_colors(&mut self, invert: bool) {
        _ = invert;
    }

    /// Sets the stroke cap.
    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        _ = cap;
    }

    /// Sets the stroke join.
    fn set_stroke_join(&mut self, join: StrokeJoin) {
        _ = join;
    }

    /// Sets the fill/stroke style.
    fn set_draw_style(&mut self, style: DrawStyle) {
        _ = style;
    }

    /// Sets the stroke width; `0` is a hairline.
    fn set_stroke_width(&mut self, width: f64) {
        _ = width;
    }

    /// Sets the miter limit.
    fn set_stroke_miter(&mut self, limit: f64) {
        _ = limit;
    }

    /// Sets the solid colour.
    fn set_color(&mut self, color: DlColor) {
        _ = color;
    }

    /// Sets the blend mode.
    fn set_blend_mode(&mut self, mode: BlendMode) {
        _ = mode;
    }

    /// Sets or clears the colour source.
    fn set_color_source(&mut self, source: Option<&ColorSource>) {
        _ = source;
    }

    /// Sets or clears the colour filter.
    fn set_color_filter(&mut self, filter: Option<&ColorFilter>) {
        _ = filter;
    }

    /// Sets or clears the image filter.
    fn set_image_filter(&mut self, filter: Option<&ImageFilter>) {
        _ = filter;
    }

    /// Sets or clears the mask filter.
    fn set_mask_filter(&mut self, filter: Option<&MaskFilter>) {
        _ = filter;
    }

    /// Sets or clears the path effect.
    fn set_path_effect(&mut self, effect: Option<&PathEffect>) {
        _ = effect;
    }

    // ---------------------------------------------------------------------
    // Save and restore
    // ---------------------------------------------------------------------

    /// Pushes the transform and clip.
    fn save(&mut self) {}

    /// Pushes an offscreen layer, optionally bounded and with a backdrop
    /// filter applied to what is already drawn beneath it.
    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&ImageFilter>,
    ) {
        _ = (bounds, options, backdrop);
    }

    /// Pops the innermost save or layer.
    fn restore(&mut self) {}

    // ---------------------------------------------------------------------
    // Transforms
    // ---------------------------------------------------------------------

    /// Concatenates a translation.
    fn translate(&mut self, tx: f64, ty: f64) {
        _ = (tx, ty);
    }

    /// Concatenates a scale.
    fn scale(&mut self, sx: f64, sy: f64) {
        _ = (sx, sy);
    }

    /// Concatenates a rotation in degrees.
    fn rotate(&mut self, degrees: f64) {
        _ = degrees;
    }

    /// Concatenates a skew.
    fn skew(&mut self, kx: f64, ky: f64) {
        _ = (kx, ky);
    }

    /// Concatenates a 2-D affine transform.
    fn transform_2d_affine(&mut self, affine: Affine) {
        _ = affine;
    }

    /// Concatenates a 4×4 transform.
    fn transform_full_perspective(&mut self, transform: &Transform3d) {
        _ = transform;
    }

    /// Resets the transform to identity.
    fn transform_reset(&mut self) {}

    // ---------------------------------------------------------------------
    // Clips
    // ---------------------------------------------------------------------

    /// Clips to a rect.
    fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
        _ = (rect, op, anti_alias);
    }

    /// Clips to a rounded rect.
    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, anti_alias: bool) {
        _ = (rrect, op, anti_alias);
    }

    /// Clips to a path.
    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, anti_alias: bool) {
        _ = (path, op, anti_alias);
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    /// Fills the clip with the paint.
    fn draw_paint(&mut self) {}

    /// Fills the clip with a colour.
    fn draw_color(&mut self, color: DlColor, mode: BlendMode) {
        _ = (color, mode);
    }

    /// Strokes a line.
    fn draw_line(&mut self, p0: Point, p1: Point) {
        _ = (p0, p1);
    }

    /// Draws a rect.
    fn draw_rect(&mut self, rect: Rect) {
        _ = rect;
    }

    /// Draws an oval inscribed in `bounds`.
    fn draw_oval(&mut self, bounds: Rect) {
        _ = bounds;
    }

    /// Draws a circle.
    fn draw_circle(&mut self, center: Point, radius: f64) {
        _ = (center, radius);
    }

    /// Draws a rounded rect.
    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        _ = rrect;
    }

    /// Draws the area between two rounded rects.
    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect) {
        _ = (outer, inner);
    }

    /// Draws an arc of the oval inscribed in `oval`; with `use_center` a
    /// wedge.
    fn draw_arc(&mut self, oval: Rect, start_degrees: f64, sweep_degrees: f64, use_center: bool) {
        _ = (oval, start_degrees, sweep_degrees, use_center);
    }

    /// Draws a path.
    fn draw_path(&mut self, path: &Arc<BezPath>) {
        _ = path;
    }

    /// Draws points, line segments or a polyline.
    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
        _ = (mode, points);
    }

    /// Draws a vertex mesh.
    fn draw_vertices(&mut self, vertices: &Arc<DlVertices>, mode: BlendMode) {
        _ = (vertices, mode);
    }

    /// Draws an image with its top-left at `point`.
    fn draw_image(
        &mut self,
        image: &Arc<DlImage>,
        point: Point,
        sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        _ = (image, point, sampling, render_with_attributes);
    }

    /// Draws the `src` part of an image into `dst`.
    fn draw_image_rect(
        &mut self,
        image: &Arc<DlImage>,
        src: Rect,
        dst: Rect,
        sampling: ImageSampling,
        render_with_attributes: bool,
        constraint: SrcRectConstraint,
    ) {
        _ = (image, src, dst, sampling, render_with_attributes, constraint);
    }

    /// Draws a nine-patch image, stretching only the `center` region.
    fn draw_image_nine(
        &mut self,
        image: &Arc<DlImage>,
        center: Rect,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
        _ = (image, center, dst, filter, render_with_attributes);
    }

    /// Draws atlas sprites. `colors`, when present, has one entry per sprite.
    fn draw_atlas(
        &mut self,
        atlas: &Arc<DlImage>,
        xforms: &[RSTransform],
        tex: &[Rect],
        colors: Option<&[DlColor]>,
        mode: BlendMode,
        sampling: ImageSampling,
        cull: Option<Rect>,
        render_with_attributes: bool,
    ) {
        _ = (atlas, xforms, tex, colors, mode, sampling, cull, render_with_attributes);
    }

    /// Draws a nested list.
    ///
    /// During culled dispatch `cull` is the active cull region mapped into
    /// the nested list's coordinates; `None` means the nested list should be
    /// drawn without culling.
    fn draw_display_list(&mut self, list: &Arc<DisplayList>, opacity: f64, cull: Option<Rect>) {
        _ = (list, opacity, cull);
    }

    /// Draws a text blob at `origin`.
    fn draw_text_blob(&mut self, blob: &Arc<TextBlob>, origin: Point) {
        _ = (blob, origin);
    }

    /// Draws the shadow of `path` raised by `elevation`.
    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        color: DlColor,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    ) {
        _ = (path, color, elevation, transparent_occluder, dpr);
    }
}

// ---------------------------------------------------------------------------
// NoopReceiver
// ---------------------------------------------------------------------------

/// A [`DlOpReceiver`] that discards every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReceiver;

impl DlOpReceiver for NoopReceiver {}
