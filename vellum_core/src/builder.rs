// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording calls into a display list.
//!
//! [`DisplayListBuilder`] is itself a [`DlOpReceiver`], so dispatching an
//! existing list into a builder re-records it. Metadata is accumulated while
//! recording; [`build`](DisplayListBuilder::build) only trims the storage,
//! builds the spatial index and hands everything to the new list.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::mem::size_of;

use bytemuck::Pod;
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};

use crate::color::{BlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::{ColorFilter, ColorSource, ImageFilter, MaskFilter, PathEffect};
use crate::index::{RTree, SpatialIndex};
use crate::metadata::{LayerAccumulator, Metadata};
use crate::op::{
    AffineOp, ArcOp, AtlasCulledOp, AtlasOp, CircleOp, ClipRRectOp, ClipRectOp, ColorFilterOp,
    DRRectOp, DashOp, DisplayListOp, DrawColorOp, GradientOp, HandleOp, ImageFilterOp,
    ImageNineOp, ImageOp, ImageRectOp, ImageSourceOp, LineOp, MaskFilterOp, OpCategory, OpType,
    PairOp, PathOp, PerspectiveOp, PointsOp, RRectOp, RectOp, SaveLayerBackdropBoundsOp,
    SaveLayerBackdropOp, SaveLayerBoundsOp, SaveLayerOp, ScalarOp, ShadowOp, TextBlobOp,
    VerticesOp, WordOp, flag, point_raw, radii_raw, rect_raw,
};
use crate::options::SaveLayerOptions;
use crate::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
use crate::receiver::DlOpReceiver;
use crate::resource::{DlImage, DlVertices, Resource, TextBlob};
use crate::storage::{DlStorage, StorageError};
use crate::tracker::StateTracker;
use crate::transform::Transform3d;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Builder configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuilderConfig {
    /// Device-space clip applied to every recorded bound.
    pub cull_rect: Rect,
    /// Whether [`build`](DisplayListBuilder::build) creates a spatial index
    /// for culled dispatch.
    pub prepare_index: bool,
}

impl BuilderConfig {
    /// The default clip: large enough to be unbounded in practice while
    /// keeping bounds finite.
    pub const MAX_CULL_RECT: Rect = Rect::new(-1e9, -1e9, 1e9, 1e9);

    /// Maximal cull rect with an index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cull_rect: Self::MAX_CULL_RECT,
            prepare_index: true,
        }
    }

    /// Maximal cull rect without an index; culled dispatch computes bounds
    /// inline instead.
    #[must_use]
    pub const fn without_index() -> Self {
        Self {
            cull_rect: Self::MAX_CULL_RECT,
            prepare_index: false,
        }
    }

    /// Returns a copy clipped to `cull_rect`.
    #[must_use]
    pub const fn with_cull_rect(self, cull_rect: Rect) -> Self {
        Self { cull_rect, ..self }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why [`DisplayListBuilder::build`] failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// Storage refused a write; the recording is incomplete.
    Storage(StorageError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "display list recording failed: {err}"),
        }
    }
}

impl core::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for BuildError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct OpenLayer {
    offset: usize,
    op: OpType,
    options: SaveLayerOptions,
    has_backdrop: bool,
    /// Device clip when the layer was opened.
    clip: Rect,
    content: LayerAccumulator,
    /// Whether the layer's own paint accepts a group opacity.
    paint_compatible: bool,
    /// Whether the layer's own paint floods transparent black.
    paint_floods: bool,
}

#[derive(Clone, Debug)]
struct SaveEntry {
    layer: Option<OpenLayer>,
}

/// Records receiver calls into a [`DisplayList`].
///
/// Redundant attribute changes and identity transforms are dropped.
/// Unbalanced restores are ignored and saves still open at
/// [`build`](Self::build) are closed. A storage failure poisons the builder:
/// later calls are ignored and `build` reports the error.
#[derive(Debug)]
pub struct DisplayListBuilder {
    config: BuilderConfig,
    storage: DlStorage,
    tracker: StateTracker,
    saves: Vec<SaveEntry>,
    root: LayerAccumulator,
    op_count: u32,
    render_op_count: u32,
    nested_op_count: u32,
    nested_byte_count: usize,
    bounds: Option<Rect>,
    is_thread_safe: bool,
    /// Device bounds per draw record, indexed by draw ordinal.
    rects: Vec<Rect>,
    error: Option<StorageError>,
}

impl Default for DisplayListBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl DisplayListBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            storage: DlStorage::new(),
            tracker: StateTracker::new(config.cull_rect),
            saves: Vec::new(),
            root: LayerAccumulator::default(),
            op_count: 0,
            render_op_count: 0,
            nested_op_count: 0,
            nested_byte_count: 0,
            bounds: None,
            is_thread_safe: true,
            rects: Vec::new(),
            error: None,
        }
    }

    /// The configuration this builder was created with.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Records written so far.
    #[must_use]
    pub fn op_count(&self) -> u32 {
        self.op_count
    }

    /// Open saves and layers.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.len()
    }

    /// Current attributes, transform and clip.
    #[must_use]
    pub fn state(&self) -> &StateTracker {
        &self.tracker
    }

    /// The error that poisoned this builder, if any.
    #[must_use]
    pub fn error(&self) -> Option<StorageError> {
        self.error
    }

    /// Closes open saves and finalizes the recording.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Storage`] when any write failed; a partial
    /// recording is never exposed.
    pub fn build(mut self) -> Result<Arc<DisplayList>, BuildError> {
        while !self.saves.is_empty() {
            self.restore();
        }
        if let Some(err) = self.error {
            return Err(err.into());
        }
        self.storage.trim();

        let index = self
            .config
            .prepare_index
            .then(|| Arc::new(RTree::new(&self.rects)) as Arc<dyn SpatialIndex>);
        let metadata = Metadata {
            op_count: self.op_count,
            render_op_count: self.render_op_count,
            nested_op_count: self.nested_op_count,
            nested_byte_count: self.nested_byte_count,
            bounds: self.bounds.unwrap_or(Rect::ZERO),
            can_apply_group_opacity: self.root.opacity_compatible(),
            is_thread_safe: self.is_thread_safe,
            modifies_transparent_black: self.root.affects_transparent(),
        };
        let list = DisplayList::new(self.storage.take(), metadata, index);
        log::debug!(
            "built display list {}: {} ops ({} nested), {} bytes",
            list.unique_id(),
            list.op_count(false),
            list.metadata().nested_op_count,
            list.bytes(true),
        );
        Ok(Arc::new(list))
    }

    fn poison(&mut self, err: StorageError) {
        log::error!("display list builder poisoned: {err}");
        self.error = Some(err);
    }

    /// Appends a record with `trailing` bytes filled by `fill`. Returns the
    /// record offset, or `None` once poisoned.
    fn push_with<T: Pod>(
        &mut self,
        op: OpType,
        payload: &T,
        trailing: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> Option<usize> {
        if self.error.is_some() {
            return None;
        }
        match self.storage.push_op(op, payload, trailing) {
            Ok((offset, tail)) => {
                fill(tail);
                self.op_count += 1;
                if matches!(op.category(), OpCategory::Draw | OpCategory::SaveLayer) {
                    self.render_op_count += 1;
                }
                Some(offset)
            }
            Err(err) => {
                self.poison(err);
                None
            }
        }
    }

    fn push<T: Pod>(&mut self, op: OpType, payload: &T) -> Option<usize> {
        self.push_with(op, payload, 0, |_| {})
    }

    fn resource(&mut self, resource: Resource) -> Option<u32> {
        if self.error.is_some() {
            return None;
        }
        match self.storage.push_resource(resource) {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.poison(err);
                None
            }
        }
    }

    fn current_layer(&mut self) -> &mut LayerAccumulator {
        self.saves
            .iter_mut()
            .rev()
            .find_map(|entry| entry.layer.as_mut().map(|layer| &mut layer.content))
            .unwrap_or(&mut self.root)
    }

    /// Folds the bounds of the draw the tracker just saw into the metadata.
    fn account_draw(&mut self, compatible: bool, floods: bool) {
        let Some(bounds) = self.tracker.take_last_bounds() else {
            return;
        };
        self.rects.push(bounds);
        self.bounds = Some(self.bounds.map_or(bounds, |b| b.union(bounds)));
        self.current_layer().add_op(bounds, compatible, floods);
    }

    /// Accounts a draw that uses the paint attributes.
    fn account_paint_draw(&mut self, shape_compatible: bool) {
        let attrs = self.tracker.attributes();
        let compatible = shape_compatible && attrs.is_opacity_compatible();
        let floods = attrs.filters_modify_transparent_black();
        self.account_draw(compatible, floods);
    }

    fn note_image(&mut self, image: &DlImage) {
        if !image.is_thread_safe() {
            self.is_thread_safe = false;
        }
    }

    fn close_layer(&mut self, layer: OpenLayer) {
        let mut options = layer.options;
        if layer.content.opacity_compatible() && self.error.is_none() {
            options = options.with_can_distribute_opacity();
            let bits = options.bits();
            match layer.op {
                OpType::SaveLayer => {
                    self.storage.payload_mut::<SaveLayerOp>(layer.offset).options = bits;
                }
                OpType::SaveLayerBounds => {
                    self.storage.payload_mut::<SaveLayerBoundsOp>(layer.offset).options = bits;
                }
                OpType::SaveLayerBackdrop => {
                    self.storage.payload_mut::<SaveLayerBackdropOp>(layer.offset).options = bits;
                }
                _ => {
                    self.storage
                        .payload_mut::<SaveLayerBackdropBoundsOp>(layer.offset)
                        .options = bits;
                }
            }
        }

        let floods = layer.has_backdrop || layer.paint_floods;
        let bounds = if floods {
            self.bounds = Some(self.bounds.map_or(layer.clip, |b| b.union(layer.clip)));
            layer.clip
        } else {
            layer.content.bounds()
        };
        let compatible = layer.paint_compatible && !layer.has_backdrop;
        let affects = floods || layer.content.affects_transparent();
        self.current_layer().add_op(bounds, compatible, affects);
    }

    fn record_clip(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
        let kind = match op {
            ClipOp::Intersect => OpType::ClipIntersectRect,
            ClipOp::Difference => OpType::ClipDifferenceRect,
        };
        self.push(
            kind,
            &ClipRectOp {
                rect: rect_raw(rect),
                anti_alias: flag(anti_alias),
                _pad: 0,
            },
        );
    }
}

/// Length prefix for a trailing array. Lengths that do not fit make the
/// record too large to store, so the write fails before the prefix is read.
fn array_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn put_rects(tail: &mut [u8], rects: impl Iterator<Item = Rect>) {
    for (chunk, rect) in tail.chunks_exact_mut(size_of::<[f64; 4]>()).zip(rects) {
        chunk.copy_from_slice(bytemuck::bytes_of(&rect_raw(rect)));
    }
}

impl DlOpReceiver for DisplayListBuilder {
    fn should_stop(&self) -> bool {
        self.error.is_some()
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    fn set_anti_alias(&mut self, aa: bool) {
        if self.tracker.attributes().anti_alias != aa {
            self.push(OpType::SetAntiAlias, &WordOp::new(flag(aa)));
            self.tracker.set_anti_alias(aa);
        }
    }

    fn set_dither(&mut self, dither: bool) {
        if self.tracker.attributes().dither != dither {
            self.push(OpType::SetDither, &WordOp::new(flag(dither)));
            self.tracker.set_dither(dither);
        }
    }

    fn set_invert_colors(&mut self, invert: bool) {
        if self.tracker.attributes().invert_colors != invert {
            self.push(OpType::SetInvertColors, &WordOp::new(flag(invert)));
            self.tracker.set_invert_colors(invert);
        }
    }

    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        if self.tracker.attributes().stroke_cap != cap {
            self.push(OpType::SetStrokeCap, &WordOp::new(cap.to_raw()));
            self.tracker.set_stroke_cap(cap);
        }
    }

    fn set_stroke_join(&mut self, join: StrokeJoin) {
        if self.tracker.attributes().stroke_join != join {
            self.push(OpType::SetStrokeJoin, &WordOp::new(join.to_raw()));
            self.tracker.set_stroke_join(join);
        }
    }

    fn set_draw_style(&mut self, style: DrawStyle) {
        if self.tracker.attributes().style != style {
            self.push(OpType::SetStyle, &WordOp::new(style.to_raw()));
            self.tracker.set_draw_style(style);
        }
    }

    fn set_stroke_width(&mut self, width: f64) {
        if self.tracker.attributes().stroke_width != width {
            self.push(OpType::SetStrokeWidth, &ScalarOp { value: width });
            self.tracker.set_stroke_width(width);
        }
    }

    fn set_stroke_miter(&mut self, limit: f64) {
        if self.tracker.attributes().stroke_miter != limit {
            self.push(OpType::SetStrokeMiter, &ScalarOp { value: limit });
            self.tracker.set_stroke_miter(limit);
        }
    }

    fn set_color(&mut self, color: DlColor) {
        if self.tracker.attributes().color != color {
            self.push(OpType::SetColor, &WordOp::new(color.0));
            self.tracker.set_color(color);
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.tracker.attributes().blend_mode != mode {
            self.push(OpType::SetBlendMode, &WordOp::new(mode.to_raw()));
            self.tracker.set_blend_mode(mode);
        }
    }

    fn set_color_source(&mut self, source: Option<&ColorSource>) {
        if self.tracker.attributes().color_source.as_ref() == source {
            return;
        }
        match source {
            None => {
                self.push(OpType::ClearColorSource, &());
            }
            Some(ColorSource::Gradient(gradient)) => {
                assert_eq!(
                    gradient.colors.len(),
                    gradient.stops.len(),
                    "one stop per gradient colour"
                );
                let count = gradient.colors.len();
                let op = GradientOp::encode(gradient, array_len(count));
                let stop_bytes = count * size_of::<f64>();
                let trailing = stop_bytes + count * size_of::<DlColor>();
                self.push_with(OpType::SetPodColorSource, &op, trailing, |tail| {
                    let (stops, colors) = tail.split_at_mut(stop_bytes);
                    stops.copy_from_slice(bytemuck::cast_slice::<f64, u8>(&gradient.stops));
                    colors.copy_from_slice(bytemuck::cast_slice::<DlColor, u8>(&gradient.colors));
                });
            }
            Some(ColorSource::Image {
                image,
                horizontal,
                vertical,
                sampling,
                matrix,
            }) => {
                if let Some(handle) = self.resource(Resource::Image(Arc::clone(image))) {
                    let op = ImageSourceOp {
                        handle,
                        sampling: sampling.to_raw(),
                        horizontal: horizontal.to_raw(),
                        vertical: vertical.to_raw(),
                        matrix: matrix.as_coeffs(),
                    };
                    self.push(OpType::SetImageColorSource, &op);
                }
            }
            Some(ColorSource::RuntimeEffect(effect)) => {
                if let Some(handle) = self.resource(Resource::RuntimeEffect(Arc::clone(effect))) {
                    self.push(OpType::SetRuntimeEffectColorSource, &HandleOp::new(handle));
                }
            }
        }
        if source.is_some_and(|s| !s.is_thread_safe()) {
            self.is_thread_safe = false;
        }
        self.tracker.set_color_source(source);
    }

    fn set_color_filter(&mut self, filter: Option<&ColorFilter>) {
        if self.tracker.attributes().color_filter.as_ref() == filter {
            return;
        }
        match filter {
            None => self.push(OpType::ClearColorFilter, &()),
            Some(f) => self.push(OpType::SetPodColorFilter, &ColorFilterOp::encode(f)),
        };
        self.tracker.set_color_filter(filter);
    }

    fn set_image_filter(&mut self, filter: Option<&ImageFilter>) {
        if self.tracker.attributes().image_filter.as_ref() == filter {
            return;
        }
        match filter {
            None => {
                self.push(OpType::ClearImageFilter, &());
            }
            Some(f) => match ImageFilterOp::encode(f) {
                Some(op) => {
                    self.push(OpType::SetPodImageFilter, &op);
                }
                None => {
                    if let Some(handle) = self.resource(Resource::ImageFilter(Arc::new(f.clone())))
                    {
                        self.push(OpType::SetSharedImageFilter, &HandleOp::new(handle));
                    }
                }
            },
        }
        self.tracker.set_image_filter(filter);
    }

    fn set_mask_filter(&mut self, filter: Option<&MaskFilter>) {
        if self.tracker.attributes().mask_filter.as_ref() == filter {
            return;
        }
        match filter {
            None => self.push(OpType::ClearMaskFilter, &()),
            Some(f) => self.push(OpType::SetPodMaskFilter, &MaskFilterOp::encode(f)),
        };
        self.tracker.set_mask_filter(filter);
    }

    fn set_path_effect(&mut self, effect: Option<&PathEffect>) {
        if self.tracker.attributes().path_effect.as_ref() == effect {
            return;
        }
        match effect {
            None => {
                self.push(OpType::ClearPathEffect, &());
            }
            Some(PathEffect::Dash { intervals, phase }) => {
                let op = DashOp {
                    count: array_len(intervals.len()),
                    _pad: 0,
                    phase: *phase,
                };
                let trailing = intervals.len() * size_of::<f64>();
                self.push_with(OpType::SetPodPathEffect, &op, trailing, |tail| {
                    tail.copy_from_slice(bytemuck::cast_slice::<f64, u8>(intervals));
                });
            }
        }
        self.tracker.set_path_effect(effect);
    }

    // ---------------------------------------------------------------------
    // Save and restore
    // ---------------------------------------------------------------------

    fn save(&mut self) {
        self.push(OpType::Save, &());
        self.tracker.save();
        self.saves.push(SaveEntry { layer: None });
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&ImageFilter>,
    ) {
        let options = options.without_optimizations();
        let bits = options.bits();
        let backdrop_handle = match backdrop {
            Some(filter) => self.resource(Resource::ImageFilter(Arc::new(filter.clone()))),
            None => None,
        };
        let (op, offset) = match (bounds, backdrop_handle) {
            (None, None) => (
                OpType::SaveLayer,
                self.push(OpType::SaveLayer, &SaveLayerOp { options: bits, _pad: 0 }),
            ),
            (Some(b), None) => (
                OpType::SaveLayerBounds,
                self.push(
                    OpType::SaveLayerBounds,
                    &SaveLayerBoundsOp {
                        options: bits,
                        _pad: 0,
                        bounds: rect_raw(b),
                    },
                ),
            ),
            (None, Some(handle)) => (
                OpType::SaveLayerBackdrop,
                self.push(
                    OpType::SaveLayerBackdrop,
                    &SaveLayerBackdropOp {
                        handle,
                        options: bits,
                    },
                ),
            ),
            (Some(b), Some(handle)) => (
                OpType::SaveLayerBackdropBounds,
                self.push(
                    OpType::SaveLayerBackdropBounds,
                    &SaveLayerBackdropBoundsOp {
                        handle,
                        options: bits,
                        bounds: rect_raw(b),
                    },
                ),
            ),
        };

        let attrs = self.tracker.attributes();
        let with_attrs = options.renders_with_attributes();
        let layer = offset.map(|offset| OpenLayer {
            offset,
            op,
            options,
            has_backdrop: backdrop.is_some(),
            clip: self.tracker.clip_bounds(),
            content: LayerAccumulator::default(),
            paint_compatible: !with_attrs || attrs.is_opacity_compatible(),
            paint_floods: with_attrs && attrs.filters_modify_transparent_black(),
        });
        self.tracker.save_layer(bounds, options, backdrop);
        self.saves.push(SaveEntry { layer });
    }

    fn restore(&mut self) {
        let Some(entry) = self.saves.pop() else {
            return;
        };
        self.push(OpType::Restore, &());
        self.tracker.restore();
        if let Some(layer) = entry.layer {
            self.close_layer(layer);
        }
    }

    // ---------------------------------------------------------------------
    // Transforms
    // ---------------------------------------------------------------------

    fn translate(&mut self, tx: f64, ty: f64) {
        if tx != 0.0 || ty != 0.0 {
            self.push(OpType::Translate, &PairOp { x: tx, y: ty });
            self.tracker.translate(tx, ty);
        }
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        if sx != 1.0 || sy != 1.0 {
            self.push(OpType::Scale, &PairOp { x: sx, y: sy });
            self.tracker.scale(sx, sy);
        }
    }

    fn rotate(&mut self, degrees: f64) {
        if degrees % 360.0 != 0.0 {
            self.push(OpType::Rotate, &ScalarOp { value: degrees });
            self.tracker.rotate(degrees);
        }
    }

    fn skew(&mut self, kx: f64, ky: f64) {
        if kx != 0.0 || ky != 0.0 {
            self.push(OpType::Skew, &PairOp { x: kx, y: ky });
            self.tracker.skew(kx, ky);
        }
    }

    fn transform_2d_affine(&mut self, affine: Affine) {
        if affine != Affine::IDENTITY {
            let op = AffineOp {
                coeffs: affine.as_coeffs(),
            };
            self.push(OpType::Transform2DAffine, &op);
            self.tracker.transform_2d_affine(affine);
        }
    }

    fn transform_full_perspective(&mut self, transform: &Transform3d) {
        if !transform.is_identity() {
            let op = PerspectiveOp {
                cols: transform.to_cols_flat(),
            };
            self.push(OpType::TransformFullPerspective, &op);
            self.tracker.transform_full_perspective(transform);
        }
    }

    fn transform_reset(&mut self) {
        self.push(OpType::TransformReset, &());
        self.tracker.transform_reset();
    }

    // ---------------------------------------------------------------------
    // Clips
    // ---------------------------------------------------------------------

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
        self.record_clip(rect, op, anti_alias);
        self.tracker.clip_rect(rect, op, anti_alias);
    }

    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, anti_alias: bool) {
        let kind = match op {
            ClipOp::Intersect => OpType::ClipIntersectRRect,
            ClipOp::Difference => OpType::ClipDifferenceRRect,
        };
        self.push(
            kind,
            &ClipRRectOp {
                rect: rect_raw(rrect.rect()),
                radii: radii_raw(&rrect),
                anti_alias: flag(anti_alias),
                _pad: 0,
            },
        );
        self.tracker.clip_rounded_rect(rrect, op, anti_alias);
    }

    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, anti_alias: bool) {
        let kind = match op {
            ClipOp::Intersect => OpType::ClipIntersectPath,
            ClipOp::Difference => OpType::ClipDifferencePath,
        };
        if let Some(handle) = self.resource(Resource::Path(Arc::clone(path))) {
            self.push(
                kind,
                &PathOp {
                    handle,
                    anti_alias: flag(anti_alias),
                },
            );
        }
        self.tracker.clip_path(path, op, anti_alias);
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    fn draw_paint(&mut self) {
        if self.push(OpType::DrawPaint, &()).is_some() {
            self.tracker.draw_paint();
            let attrs = self.tracker.attributes();
            let (compatible, floods) = (
                attrs.is_opacity_compatible(),
                attrs.modifies_transparent_black(),
            );
            self.account_draw(compatible, floods);
        }
    }

    fn draw_color(&mut self, color: DlColor, mode: BlendMode) {
        let op = DrawColorOp {
            color: color.0,
            mode: mode.to_raw(),
        };
        if self.push(OpType::DrawColor, &op).is_some() {
            self.tracker.draw_color(color, mode);
            let floods = !color.is_transparent() && mode.keeps_source_over_transparent();
            self.account_draw(mode.is_opacity_compatible(), floods);
        }
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        let op = LineOp {
            p0: point_raw(p0),
            p1: point_raw(p1),
        };
        if self.push(OpType::DrawLine, &op).is_some() {
            self.tracker.draw_line(p0, p1);
            self.account_paint_draw(true);
        }
    }

    fn draw_rect(&mut self, rect: Rect) {
        let op = RectOp {
            rect: rect_raw(rect),
        };
        if self.push(OpType::DrawRect, &op).is_some() {
            self.tracker.draw_rect(rect);
            self.account_paint_draw(true);
        }
    }

    fn draw_oval(&mut self, bounds: Rect) {
        let op = RectOp {
            rect: rect_raw(bounds),
        };
        if self.push(OpType::DrawOval, &op).is_some() {
            self.tracker.draw_oval(bounds);
            self.account_paint_draw(true);
        }
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        let op = CircleOp {
            center: point_raw(center),
            radius,
        };
        if self.push(OpType::DrawCircle, &op).is_some() {
            self.tracker.draw_circle(center, radius);
            self.account_paint_draw(true);
        }
    }

    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        let op = RRectOp {
            rect: rect_raw(rrect.rect()),
            radii: radii_raw(&rrect),
        };
        if self.push(OpType::DrawRRect, &op).is_some() {
            self.tracker.draw_rounded_rect(rrect);
            self.account_paint_draw(true);
        }
    }

    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect) {
        let op = DRRectOp {
            outer: RRectOp {
                rect: rect_raw(outer.rect()),
                radii: radii_raw(&outer),
            },
            inner: RRectOp {
                rect: rect_raw(inner.rect()),
                radii: radii_raw(&inner),
            },
        };
        if self.push(OpType::DrawDRRect, &op).is_some() {
            self.tracker.draw_double_rounded_rect(outer, inner);
            self.account_paint_draw(true);
        }
    }

    fn draw_arc(&mut self, oval: Rect, start_degrees: f64, sweep_degrees: f64, use_center: bool) {
        let op = ArcOp {
            oval: rect_raw(oval),
            start_degrees,
            sweep_degrees,
            use_center: flag(use_center),
            _pad: 0,
        };
        if self.push(OpType::DrawArc, &op).is_some() {
            self.tracker
                .draw_arc(oval, start_degrees, sweep_degrees, use_center);
            self.account_paint_draw(true);
        }
    }

    fn draw_path(&mut self, path: &Arc<BezPath>) {
        let Some(handle) = self.resource(Resource::Path(Arc::clone(path))) else {
            return;
        };
        if self.push(OpType::DrawPath, &HandleOp::new(handle)).is_some() {
            self.tracker.draw_path(path);
            self.account_paint_draw(true);
        }
    }

    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
        let kind = match mode {
            PointMode::Points => OpType::DrawPoints,
            PointMode::Lines => OpType::DrawLines,
            PointMode::Polygon => OpType::DrawPolygon,
        };
        let op = PointsOp {
            count: array_len(points.len()),
            _pad: 0,
        };
        let stride = size_of::<[f64; 2]>();
        let recorded = self.push_with(kind, &op, points.len() * stride, |tail| {
            for (chunk, p) in tail.chunks_exact_mut(stride).zip(points) {
                chunk.copy_from_slice(bytemuck::bytes_of(&point_raw(*p)));
            }
        });
        if recorded.is_some() {
            self.tracker.draw_points(mode, points);
            self.account_paint_draw(false);
        }
    }

    fn draw_vertices(&mut self, vertices: &Arc<DlVertices>, mode: BlendMode) {
        let Some(handle) = self.resource(Resource::Vertices(Arc::clone(vertices))) else {
            return;
        };
        let op = VerticesOp {
            handle,
            mode: mode.to_raw(),
        };
        if self.push(OpType::DrawVertices, &op).is_some() {
            self.tracker.draw_vertices(vertices, mode);
            self.account_paint_draw(false);
        }
    }

    fn draw_image(
        &mut self,
        image: &Arc<DlImage>,
        point: Point,
        sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        let Some(handle) = self.resource(Resource::Image(Arc::clone(image))) else {
            return;
        };
        let kind = if render_with_attributes {
            OpType::DrawImageWithAttr
        } else {
            OpType::DrawImage
        };
        let op = ImageOp {
            handle,
            sampling: sampling.to_raw(),
            point: point_raw(point),
        };
        if self.push(kind, &op).is_some() {
            self.note_image(image);
            self.tracker
                .draw_image(image, point, sampling, render_with_attributes);
            if render_with_attributes {
                self.account_paint_draw(true);
            } else {
                self.account_draw(true, false);
            }
        }
    }

    fn draw_image_rect(
        &mut self,
        image: &Arc<DlImage>,
        src: Rect,
        dst: Rect,
        sampling: ImageSampling,
        render_with_attributes: bool,
        constraint: SrcRectConstraint,
    ) {
        let Some(handle) = self.resource(Resource::Image(Arc::clone(image))) else {
            return;
        };
        let op = ImageRectOp {
            handle,
            sampling: sampling.to_raw(),
            render_with_attributes: flag(render_with_attributes),
            constraint: constraint.to_raw(),
            src: rect_raw(src),
            dst: rect_raw(dst),
        };
        if self.push(OpType::DrawImageRect, &op).is_some() {
            self.note_image(image);
            self.tracker.draw_image_rect(
                image,
                src,
                dst,
                sampling,
                render_with_attributes,
                constraint,
            );
            if render_with_attributes {
                self.account_paint_draw(true);
            } else {
                self.account_draw(true, false);
            }
        }
    }

    fn draw_image_nine(
        &mut self,
        image: &Arc<DlImage>,
        center: Rect,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
        let Some(handle) = self.resource(Resource::Image(Arc::clone(image))) else {
            return;
        };
        let kind = if render_with_attributes {
            OpType::DrawImageNineWithAttr
        } else {
            OpType::DrawImageNine
        };
        let op = ImageNineOp {
            handle,
            filter: filter.to_raw(),
            center: rect_raw(center),
            dst: rect_raw(dst),
        };
        if self.push(kind, &op).is_some() {
            self.note_image(image);
            self.tracker
                .draw_image_nine(image, center, dst, filter, render_with_attributes);
            if render_with_attributes {
                self.account_paint_draw(true);
            } else {
                self.account_draw(true, false);
            }
        }
    }

    /// # Panics
    ///
    /// Panics unless `tex`, and `colors` when present, have one entry per
    /// transform.
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
        assert_eq!(xforms.len(), tex.len(), "one texture rect per atlas transform");
        if let Some(colors) = colors {
            assert_eq!(colors.len(), xforms.len(), "one colour per atlas sprite");
        }
        let Some(handle) = self.resource(Resource::Image(Arc::clone(atlas))) else {
            return;
        };
        let count = xforms.len();
        let atlas_op = AtlasOp {
            handle,
            count: array_len(count),
            mode: mode.to_raw(),
            sampling: sampling.to_raw(),
            has_colors: flag(colors.is_some()),
            render_with_attributes: flag(render_with_attributes),
        };
        let xform_bytes = count * size_of::<RSTransform>();
        let tex_bytes = count * size_of::<[f64; 4]>();
        let color_bytes = colors.map_or(0, |c| c.len() * size_of::<DlColor>());
        let trailing = xform_bytes + tex_bytes + color_bytes;
        let fill = |tail: &mut [u8]| {
            let (xf_out, rest) = tail.split_at_mut(xform_bytes);
            let (tex_out, color_out) = rest.split_at_mut(tex_bytes);
            xf_out.copy_from_slice(bytemuck::cast_slice::<RSTransform, u8>(xforms));
            put_rects(tex_out, tex.iter().copied());
            if let Some(colors) = colors {
                color_out.copy_from_slice(bytemuck::cast_slice::<DlColor, u8>(colors));
            }
        };
        let recorded = match cull {
            Some(c) => {
                let op = AtlasCulledOp {
                    atlas: atlas_op,
                    cull: rect_raw(c),
                };
                self.push_with(OpType::DrawAtlasCulled, &op, trailing, fill)
            }
            None => self.push_with(OpType::DrawAtlas, &atlas_op, trailing, fill),
        };
        if recorded.is_some() {
            self.note_image(atlas);
            self.tracker.draw_atlas(
                atlas,
                xforms,
                tex,
                colors,
                mode,
                sampling,
                cull,
                render_with_attributes,
            );
            if render_with_attributes {
                self.account_paint_draw(false);
            } else {
                self.account_draw(false, false);
            }
        }
    }

    /// Records a nested list. `cull` only matters during dispatch and is
    /// not recorded.
    fn draw_display_list(&mut self, list: &Arc<DisplayList>, opacity: f64, cull: Option<Rect>) {
        let Some(handle) = self.resource(Resource::DisplayList(Arc::clone(list))) else {
            return;
        };
        let op = DisplayListOp {
            handle,
            _pad: 0,
            opacity,
        };
        if self.push(OpType::DrawDisplayList, &op).is_some() {
            self.nested_op_count = self.nested_op_count.saturating_add(list.op_count(true));
            self.nested_byte_count = self.nested_byte_count.saturating_add(list.bytes(true));
            if !list.is_thread_safe() {
                self.is_thread_safe = false;
            }
            self.tracker.draw_display_list(list, opacity, cull);
            self.account_draw(
                list.can_apply_group_opacity(),
                list.modifies_transparent_black(),
            );
        }
    }

    fn draw_text_blob(&mut self, blob: &Arc<TextBlob>, origin: Point) {
        let Some(handle) = self.resource(Resource::TextBlob(Arc::clone(blob))) else {
            return;
        };
        let op = TextBlobOp {
            handle,
            _pad: 0,
            origin: point_raw(origin),
        };
        if self.push(OpType::DrawTextBlob, &op).is_some() {
            self.tracker.draw_text_blob(blob, origin);
            self.account_paint_draw(false);
        }
    }

    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        color: DlColor,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    ) {
        let Some(handle) = self.resource(Resource::Path(Arc::clone(path))) else {
            return;
        };
        let kind = if transparent_occluder {
            OpType::DrawShadowTransparentOccluder
        } else {
            OpType::DrawShadow
        };
        let op = ShadowOp {
            handle,
            color: color.0,
            elevation,
            dpr,
        };
        if self.push(kind, &op).is_some() {
            self.tracker
                .draw_shadow(path, color, elevation, transparent_occluder, dpr);
            self.account_draw(false, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Gradient, GradientKind};
    use crate::paint::TileMode;
    use alloc::vec;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(x0, y0, x1, y1)
    }

    #[test]
    fn redundant_attributes_are_dropped() {
        let mut b = DisplayListBuilder::default();
        b.set_color(DlColor::BLACK);
        b.set_anti_alias(false);
        b.set_stroke_miter(4.0);
        b.set_color_filter(None);
        assert_eq!(b.op_count(), 0, "defaults are not recorded");
        b.set_color(DlColor::RED);
        b.set_color(DlColor::RED);
        assert_eq!(b.op_count(), 1);
    }

    #[test]
    fn identity_transforms_are_dropped() {
        let mut b = DisplayListBuilder::default();
        b.translate(0.0, 0.0);
        b.scale(1.0, 1.0);
        b.rotate(720.0);
        b.skew(0.0, 0.0);
        b.transform_2d_affine(Affine::IDENTITY);
        b.transform_full_perspective(&Transform3d::IDENTITY);
        assert_eq!(b.op_count(), 0);
        b.rotate(90.0);
        assert_eq!(b.op_count(), 1);
    }

    #[test]
    fn restores_are_balanced() {
        let mut b = DisplayListBuilder::default();
        b.restore();
        assert_eq!(b.op_count(), 0, "unbalanced restore is ignored");
        b.save();
        b.save_layer(None, SaveLayerOptions::NO_ATTRIBUTES, None);
        assert_eq!(b.save_count(), 2);
        let list = b.build().unwrap();
        assert_eq!(list.op_count(false), 4, "open saves are closed at build");
        assert_eq!(list.render_op_count(), 1);
    }

    #[test]
    fn byte_accounting() {
        let mut b = DisplayListBuilder::default();
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        let child = b.build().unwrap();
        assert_eq!(child.storage().used(), child.storage().allocated());
        assert_eq!(
            child.bytes(false),
            size_of::<DisplayList>() + child.storage().allocated()
        );

        let mut b = DisplayListBuilder::default();
        b.draw_display_list(&child, 1.0, None);
        b.draw_display_list(&child, 0.5, None);
        let parent = b.build().unwrap();
        assert_eq!(parent.metadata().nested_byte_count, 2 * child.bytes(true));
        assert_eq!(
            parent.bytes(true),
            parent.bytes(false) + parent.metadata().nested_byte_count
        );
        assert_eq!(parent.op_count(false), 2);
        assert_eq!(parent.op_count(true), 4);
    }

    #[test]
    fn nested_counts_saturate() {
        let mut b = DisplayListBuilder::new(BuilderConfig::without_index());
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        let mut list = b.build().unwrap();
        for _ in 0..7 {
            let mut b = DisplayListBuilder::new(BuilderConfig::without_index());
            for _ in 0..16 {
                b.draw_display_list(&list, 1.0, None);
            }
            list = b.build().unwrap();
        }
        assert_eq!(list.op_count(true), 554_766_608);

        let mut b = DisplayListBuilder::new(BuilderConfig::without_index());
        for _ in 0..16 {
            b.draw_display_list(&list, 1.0, None);
        }
        let top = b.build().unwrap();
        assert_eq!(top.op_count(false), 16);
        assert_eq!(top.metadata().nested_op_count, u32::MAX);
        assert_eq!(top.op_count(true), u32::MAX);
    }

    #[test]
    fn bounds_cover_every_draw() {
        let mut b = DisplayListBuilder::default();
        b.set_color(DlColor::RED);
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        b.save();
        b.translate(5.0, 5.0);
        b.draw_circle(Point::ZERO, 3.0);
        b.restore();
        b.draw_oval(rect(-4.0, 20.0, 0.0, 30.0));
        let list = b.build().unwrap();
        assert_eq!(list.bounds(), rect(-4.0, 0.0, 10.0, 30.0));
    }

    #[test]
    fn cull_rect_clips_bounds() {
        let config = BuilderConfig::new().with_cull_rect(rect(0.0, 0.0, 50.0, 50.0));
        let mut b = DisplayListBuilder::new(config);
        b.draw_paint();
        let list = b.build().unwrap();
        assert_eq!(list.bounds(), rect(0.0, 0.0, 50.0, 50.0));
        assert!(list.modifies_transparent_black(), "black paint floods the clip");
    }

    #[test]
    fn group_opacity_tracks_overlap() {
        let mut b = DisplayListBuilder::default();
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        b.draw_rect(rect(20.0, 0.0, 30.0, 10.0));
        assert!(b.build().unwrap().can_apply_group_opacity());

        let mut b = DisplayListBuilder::default();
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        b.draw_rect(rect(5.0, 5.0, 15.0, 15.0));
        assert!(!b.build().unwrap().can_apply_group_opacity());

        let mut b = DisplayListBuilder::default();
        b.set_blend_mode(BlendMode::Multiply);
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        assert!(!b.build().unwrap().can_apply_group_opacity());
    }

    #[test]
    fn save_layer_gets_distribute_flag() {
        let mut b = DisplayListBuilder::default();
        b.save_layer(
            None,
            SaveLayerOptions::WITH_ATTRIBUTES.with_can_distribute_opacity(),
            None,
        );
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        b.restore();
        b.save_layer(Some(rect(0.0, 0.0, 5.0, 5.0)), SaveLayerOptions::NO_ATTRIBUTES, None);
        b.draw_rect(rect(0.0, 0.0, 10.0, 10.0));
        b.draw_rect(rect(1.0, 1.0, 10.0, 10.0));
        b.restore();
        let list = b.build().unwrap();

        let options: Vec<_> = list
            .storage()
            .records()
            .filter_map(|r| match r.op {
                OpType::SaveLayer => Some(r.payload::<SaveLayerOp>().options),
                OpType::SaveLayerBounds => Some(r.payload::<SaveLayerBoundsOp>().options),
                _ => None,
            })
            .map(SaveLayerOptions::from_bits_retain)
            .collect();
        assert_eq!(
            options,
            [
                SaveLayerOptions::WITH_ATTRIBUTES.with_can_distribute_opacity(),
                SaveLayerOptions::NO_ATTRIBUTES,
            ]
        );
        assert!(
            !list.can_apply_group_opacity(),
            "the two layers overlap each other"
        );
    }

    #[test]
    fn backdrop_layer_modifies_transparent_black() {
        let blur = ImageFilter::Blur {
            sigma_x: 4.0,
            sigma_y: 4.0,
            tile_mode: TileMode::Clamp,
        };
        let config = BuilderConfig::new().with_cull_rect(rect(0.0, 0.0, 100.0, 100.0));
        let mut b = DisplayListBuilder::new(config);
        b.save_layer(None, SaveLayerOptions::NO_ATTRIBUTES, Some(&blur));
        b.restore();
        let list = b.build().unwrap();
        assert!(list.modifies_transparent_black());
        assert!(!list.can_apply_group_opacity());
        assert_eq!(list.bounds(), rect(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn texture_images_are_not_thread_safe() {
        let mut b = DisplayListBuilder::default();
        b.draw_image(
            &Arc::new(DlImage::raster(1, 4, 4)),
            Point::ZERO,
            ImageSampling::Nearest,
            false,
        );
        let raster = b.build().unwrap();
        assert!(raster.is_thread_safe());

        let mut b = DisplayListBuilder::default();
        b.draw_display_list(&raster, 1.0, None);
        b.draw_image_nine(
            &Arc::new(DlImage::texture(2, 4, 4)),
            rect(1.0, 1.0, 3.0, 3.0),
            rect(0.0, 0.0, 40.0, 40.0),
            FilterMode::Linear,
            false,
        );
        let texture = b.build().unwrap();
        assert!(!texture.is_thread_safe());

        let mut b = DisplayListBuilder::default();
        b.draw_display_list(&texture, 1.0, None);
        assert!(!b.build().unwrap().is_thread_safe(), "nested lists propagate");
    }

    #[test]
    fn gradient_and_dash_are_inline() {
        let mut b = DisplayListBuilder::default();
        let gradient = Gradient::new(
            GradientKind::Linear {
                start: Point::ZERO,
                end: Point::new(10.0, 0.0),
            },
            vec![DlColor::RED, DlColor::GREEN, DlColor::BLUE],
        );
        b.set_color_source(Some(&ColorSource::Gradient(gradient)));
        b.set_path_effect(Some(&PathEffect::Dash {
            intervals: vec![2.0, 1.0],
            phase: 0.5,
        }));
        let list = b.build().unwrap();
        let ops: Vec<_> = list.storage().records().map(|r| r.op).collect();
        assert_eq!(ops, [OpType::SetPodColorSource, OpType::SetPodPathEffect]);
        assert!(list.is_thread_safe());
    }

    #[test]
    #[should_panic(expected = "one stop per gradient colour")]
    fn mismatched_gradient_is_a_contract_violation() {
        let mut gradient = Gradient::new(
            GradientKind::Radial {
                center: Point::ZERO,
                radius: 1.0,
            },
            vec![DlColor::RED, DlColor::BLUE],
        );
        gradient.stops.pop();
        DisplayListBuilder::default().set_color_source(Some(&ColorSource::Gradient(gradient)));
    }

    #[test]
    #[should_panic(expected = "one texture rect per atlas transform")]
    fn mismatched_atlas_is_a_contract_violation() {
        DisplayListBuilder::default().draw_atlas(
            &Arc::new(DlImage::raster(1, 4, 4)),
            &[RSTransform::from_translation(0.0, 0.0)],
            &[],
            None,
            BlendMode::SrcOver,
            ImageSampling::Linear,
            None,
            false,
        );
    }

    #[test]
    fn poisoned_builder_fails_to_build() {
        let mut b = DisplayListBuilder::default();
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        b.poison(StorageError::Exhausted { requested: 64 });
        assert!(b.should_stop());
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        assert_eq!(b.op_count(), 1, "writes after poisoning are dropped");
        assert_eq!(
            b.build().unwrap_err(),
            BuildError::Storage(StorageError::Exhausted { requested: 64 })
        );
    }

    #[test]
    fn index_is_optional() {
        let mut b = DisplayListBuilder::new(BuilderConfig::without_index());
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        assert!(!b.build().unwrap().has_index());

        let mut b = DisplayListBuilder::default();
        b.draw_rect(rect(0.0, 0.0, 1.0, 1.0));
        let list = b.build().unwrap();
        let index = list.index().unwrap();
        assert_eq!(index.rect(0), Some(rect(0.0, 0.0, 1.0, 1.0)));
    }
}
