// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replaying a list into a receiver.
//!
//! Unconditional dispatch decodes every record in order. Culled dispatch
//! runs two lanes over the same walk: context records (attributes, saves,
//! layers, restores, transforms, clips) are always forwarded, while drawing
//! records are forwarded only when their bounds overlap the cull region.
//! Draw bounds come from the list's spatial index when it has one, and from
//! an inline [`StateTracker`] otherwise.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::color::{BlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::{ColorSource, PathEffect};
use crate::index::{contains_rect, overlaps};
use crate::op::{
    AffineOp, ArcOp, AtlasCulledOp, AtlasOp, CircleOp, ClipRRectOp, ClipRectOp, ColorFilterOp,
    DRRectOp, DashOp, DisplayListOp, DrawColorOp, GradientOp, ImageFilterOp, ImageNineOp, ImageOp,
    ImageRectOp, ImageSourceOp, LineOp, MaskFilterOp, OpType, PairOp, PathOp, PerspectiveOp,
    PointsOp, RRectOp, RectOp, SaveLayerBackdropBoundsOp, SaveLayerBackdropOp, SaveLayerBoundsOp,
    SaveLayerOp, ScalarOp, ShadowOp, TextBlobOp, VerticesOp, WordOp, checked, point_from,
    rect_from, rrect_from,
};
use crate::options::SaveLayerOptions;
use crate::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin, TileMode,
};
use crate::receiver::DlOpReceiver;
use crate::storage::{DlStorage, Record, split_array};
use crate::tracker::StateTracker;
use crate::transform::Transform3d;

impl DisplayList {
    /// Replays every record, in recording order.
    pub fn dispatch<R: DlOpReceiver + ?Sized>(&self, receiver: &mut R) {
        let storage = self.storage();
        for record in storage.records() {
            if receiver.should_stop() {
                return;
            }
            dispatch_record(storage, &record, receiver, None);
        }
    }

    /// Replays context records unconditionally and drawing records whose
    /// device bounds overlap `cull`.
    ///
    /// A nested list is handed to the receiver together with `cull` mapped
    /// into its local coordinates, or `None` when the current transform
    /// cannot be inverted.
    pub fn dispatch_culled<R: DlOpReceiver + ?Sized>(&self, receiver: &mut R, cull: Rect) {
        if contains_rect(cull, self.bounds()) {
            self.dispatch(receiver);
            return;
        }
        let mut hits = Vec::new();
        let indexed = match self.index() {
            Some(index) => {
                index.search(cull, &mut hits);
                true
            }
            None => false,
        };

        let storage = self.storage();
        let mut tracker = StateTracker::default();
        let mut cursor = 0;
        let mut ordinal: u32 = 0;
        let mut visited = 0_usize;
        let mut skipped = 0_usize;
        for record in storage.records() {
            if receiver.should_stop() {
                break;
            }
            if record.op.category().is_context() {
                dispatch_record(storage, &record, &mut tracker, None);
                dispatch_record(storage, &record, receiver, None);
                continue;
            }

            let visible = if indexed {
                while hits.get(cursor).is_some_and(|id| *id < ordinal) {
                    cursor += 1;
                }
                hits.get(cursor) == Some(&ordinal)
            } else {
                dispatch_record(storage, &record, &mut tracker, None);
                tracker
                    .take_last_bounds()
                    .is_some_and(|bounds| overlaps(bounds, cull))
            };
            ordinal += 1;

            if visible {
                let nested_cull = if record.op == OpType::DrawDisplayList {
                    tracker.local_cull(cull)
                } else {
                    None
                };
                dispatch_record(storage, &record, receiver, nested_cull);
                visited += 1;
            } else {
                skipped += 1;
            }
        }
        log::trace!(
            "culled dispatch of list {}: {visited} draws visited, {skipped} skipped (indexed: {indexed})",
            self.unique_id()
        );
    }

    /// [`dispatch_culled`](Self::dispatch_culled) with an integer cull
    /// region given as `[left, top, right, bottom]`.
    pub fn dispatch_culled_irect<R: DlOpReceiver + ?Sized>(&self, receiver: &mut R, cull: [i32; 4]) {
        let [x0, y0, x1, y1] = cull.map(f64::from);
        self.dispatch_culled(receiver, Rect::new(x0, y0, x1, y1));
    }
}

fn word_flag(record: &Record<'_>) -> bool {
    record.payload::<WordOp>().value != 0
}

fn word(record: &Record<'_>) -> u32 {
    record.payload::<WordOp>().value
}

/// Decodes one record and invokes the matching receiver method.
///
/// # Panics
///
/// Panics on corrupt payloads: unknown enum encodings, trailing arrays that
/// overrun the record and dangling handles.
pub(crate) fn dispatch_record<R: DlOpReceiver + ?Sized>(
    storage: &DlStorage,
    record: &Record<'_>,
    receiver: &mut R,
    nested_cull: Option<Rect>,
) {
    match record.op {
        // --- attributes ---
        OpType::SetAntiAlias => receiver.set_anti_alias(word_flag(record)),
        OpType::SetDither => receiver.set_dither(word_flag(record)),
        OpType::SetInvertColors => receiver.set_invert_colors(word_flag(record)),
        OpType::SetStrokeCap => {
            receiver.set_stroke_cap(checked(StrokeCap::from_raw(word(record)), "stroke cap"));
        }
        OpType::SetStrokeJoin => {
            receiver.set_stroke_join(checked(StrokeJoin::from_raw(word(record)), "stroke join"));
        }
        OpType::SetStyle => {
            receiver.set_draw_style(checked(DrawStyle::from_raw(word(record)), "draw style"));
        }
        OpType::SetStrokeWidth => receiver.set_stroke_width(record.payload::<ScalarOp>().value),
        OpType::SetStrokeMiter => receiver.set_stroke_miter(record.payload::<ScalarOp>().value),
        OpType::SetColor => receiver.set_color(DlColor(word(record))),
        OpType::SetBlendMode => {
            receiver.set_blend_mode(checked(BlendMode::from_raw(word(record)), "blend mode"));
        }
        OpType::SetPodPathEffect => {
            let op = record.payload::<DashOp>();
            let (intervals, _) = split_array::<f64>(record.trailing::<DashOp>(), op.count as usize);
            receiver.set_path_effect(Some(&PathEffect::Dash {
                intervals: Vec::from(intervals),
                phase: op.phase,
            }));
        }
        OpType::ClearPathEffect => receiver.set_path_effect(None),
        OpType::ClearColorFilter => receiver.set_color_filter(None),
        OpType::SetPodColorFilter => {
            receiver.set_color_filter(Some(&record.payload::<ColorFilterOp>().decode()));
        }
        OpType::ClearColorSource => receiver.set_color_source(None),
        OpType::SetPodColorSource => {
            let op = record.payload::<GradientOp>();
            let count = op.count as usize;
            let (stops, rest) = split_array::<f64>(record.trailing::<GradientOp>(), count);
            let (colors, _) = split_array::<DlColor>(rest, count);
            receiver.set_color_source(Some(&ColorSource::Gradient(op.decode(stops, colors))));
        }
        OpType::SetImageColorSource => {
            let op = record.payload::<ImageSourceOp>();
            receiver.set_color_source(Some(&ColorSource::Image {
                image: Arc::clone(storage.image(op.handle)),
                horizontal: checked(TileMode::from_raw(op.horizontal), "tile mode"),
                vertical: checked(TileMode::from_raw(op.vertical), "tile mode"),
                sampling: checked(ImageSampling::from_raw(op.sampling), "sampling"),
                matrix: Affine::new(op.matrix),
            }));
        }
        OpType::SetRuntimeEffectColorSource => {
            let effect = storage.runtime_effect(record.handle());
            receiver.set_color_source(Some(&ColorSource::RuntimeEffect(Arc::clone(effect))));
        }
        OpType::ClearImageFilter => receiver.set_image_filter(None),
        OpType::SetPodImageFilter => {
            receiver.set_image_filter(Some(&record.payload::<ImageFilterOp>().decode()));
        }
        OpType::SetSharedImageFilter => {
            receiver.set_image_filter(Some(storage.image_filter(record.handle()).as_ref()));
        }
        OpType::ClearMaskFilter => receiver.set_mask_filter(None),
        OpType::SetPodMaskFilter => {
            receiver.set_mask_filter(Some(&record.payload::<MaskFilterOp>().decode()));
        }

        // --- saves ---
        OpType::Save => receiver.save(),
        OpType::SaveLayer => {
            let op = record.payload::<SaveLayerOp>();
            receiver.save_layer(None, SaveLayerOptions::from_bits_retain(op.options), None);
        }
        OpType::SaveLayerBounds => {
            let op = record.payload::<SaveLayerBoundsOp>();
            receiver.save_layer(
                Some(rect_from(op.bounds)),
                SaveLayerOptions::from_bits_retain(op.options),
                None,
            );
        }
        OpType::SaveLayerBackdrop => {
            let op = record.payload::<SaveLayerBackdropOp>();
            receiver.save_layer(
                None,
                SaveLayerOptions::from_bits_retain(op.options),
                Some(storage.image_filter(op.handle).as_ref()),
            );
        }
        OpType::SaveLayerBackdropBounds => {
            let op = record.payload::<SaveLayerBackdropBoundsOp>();
            receiver.save_layer(
                Some(rect_from(op.bounds)),
                SaveLayerOptions::from_bits_retain(op.options),
                Some(storage.image_filter(op.handle).as_ref()),
            );
        }
        OpType::Restore => receiver.restore(),

        // --- transforms ---
        OpType::Translate => {
            let op = record.payload::<PairOp>();
            receiver.translate(op.x, op.y);
        }
        OpType::Scale => {
            let op = record.payload::<PairOp>();
            receiver.scale(op.x, op.y);
        }
        OpType::Rotate => receiver.rotate(record.payload::<ScalarOp>().value),
        OpType::Skew => {
            let op = record.payload::<PairOp>();
            receiver.skew(op.x, op.y);
        }
        OpType::Transform2DAffine => {
            receiver.transform_2d_affine(Affine::new(record.payload::<AffineOp>().coeffs));
        }
        OpType::TransformFullPerspective => {
            let m = Transform3d::from_cols_flat(record.payload::<PerspectiveOp>().cols);
            receiver.transform_full_perspective(&m);
        }
        OpType::TransformReset => receiver.transform_reset(),

        // --- clips ---
        OpType::ClipIntersectRect | OpType::ClipDifferenceRect => {
            let op = record.payload::<ClipRectOp>();
            receiver.clip_rect(rect_from(op.rect), clip_op(record.op), op.anti_alias != 0);
        }
        OpType::ClipIntersectRRect | OpType::ClipDifferenceRRect => {
            let op = record.payload::<ClipRRectOp>();
            receiver.clip_rounded_rect(
                rrect_from(op.rect, op.radii),
                clip_op(record.op),
                op.anti_alias != 0,
            );
        }
        OpType::ClipIntersectPath | OpType::ClipDifferencePath => {
            let op = record.payload::<PathOp>();
            receiver.clip_path(storage.path(op.handle), clip_op(record.op), op.anti_alias != 0);
        }

        // --- draws ---
        OpType::DrawPaint => receiver.draw_paint(),
        OpType::DrawColor => {
            let op = record.payload::<DrawColorOp>();
            receiver.draw_color(
                DlColor(op.color),
                checked(BlendMode::from_raw(op.mode), "blend mode"),
            );
        }
        OpType::DrawLine => {
            let op = record.payload::<LineOp>();
            receiver.draw_line(point_from(op.p0), point_from(op.p1));
        }
        OpType::DrawRect => receiver.draw_rect(rect_from(record.payload::<RectOp>().rect)),
        OpType::DrawOval => receiver.draw_oval(rect_from(record.payload::<RectOp>().rect)),
        OpType::DrawCircle => {
            let op = record.payload::<CircleOp>();
            receiver.draw_circle(point_from(op.center), op.radius);
        }
        OpType::DrawRRect => {
            let op = record.payload::<RRectOp>();
            receiver.draw_rounded_rect(rrect_from(op.rect, op.radii));
        }
        OpType::DrawDRRect => {
            let op = record.payload::<DRRectOp>();
            receiver.draw_double_rounded_rect(
                rrect_from(op.outer.rect, op.outer.radii),
                rrect_from(op.inner.rect, op.inner.radii),
            );
        }
        OpType::DrawArc => {
            let op = record.payload::<ArcOp>();
            receiver.draw_arc(
                rect_from(op.oval),
                op.start_degrees,
                op.sweep_degrees,
                op.use_center != 0,
            );
        }
        OpType::DrawPath => receiver.draw_path(storage.path(record.handle())),
        OpType::DrawPoints | OpType::DrawLines | OpType::DrawPolygon => {
            let mode = match record.op {
                OpType::DrawPoints => PointMode::Points,
                OpType::DrawLines => PointMode::Lines,
                _ => PointMode::Polygon,
            };
            let count = record.payload::<PointsOp>().count as usize;
            let (raw, _) = split_array::<[f64; 2]>(record.trailing::<PointsOp>(), count);
            let points: Vec<_> = raw.iter().copied().map(point_from).collect();
            receiver.draw_points(mode, &points);
        }
        OpType::DrawVertices => {
            let op = record.payload::<VerticesOp>();
            receiver.draw_vertices(
                storage.vertices(op.handle),
                checked(BlendMode::from_raw(op.mode), "blend mode"),
            );
        }
        OpType::DrawImage | OpType::DrawImageWithAttr => {
            let op = record.payload::<ImageOp>();
            receiver.draw_image(
                storage.image(op.handle),
                point_from(op.point),
                checked(ImageSampling::from_raw(op.sampling), "sampling"),
                record.op == OpType::DrawImageWithAttr,
            );
        }
        OpType::DrawImageRect => {
            let op = record.payload::<ImageRectOp>();
            receiver.draw_image_rect(
                storage.image(op.handle),
                rect_from(op.src),
                rect_from(op.dst),
                checked(ImageSampling::from_raw(op.sampling), "sampling"),
                op.render_with_attributes != 0,
                checked(SrcRectConstraint::from_raw(op.constraint), "constraint"),
            );
        }
        OpType::DrawImageNine | OpType::DrawImageNineWithAttr => {
            let op = record.payload::<ImageNineOp>();
            receiver.draw_image_nine(
                storage.image(op.handle),
                rect_from(op.center),
                rect_from(op.dst),
                checked(FilterMode::from_raw(op.filter), "filter mode"),
                record.op == OpType::DrawImageNineWithAttr,
            );
        }
        OpType::DrawAtlas => {
            let op = record.payload::<AtlasOp>();
            dispatch_atlas(storage, op, record.trailing::<AtlasOp>(), None, receiver);
        }
        OpType::DrawAtlasCulled => {
            let op = record.payload::<AtlasCulledOp>();
            dispatch_atlas(
                storage,
                &op.atlas,
                record.trailing::<AtlasCulledOp>(),
                Some(rect_from(op.cull)),
                receiver,
            );
        }
        OpType::DrawDisplayList => {
            let op = record.payload::<DisplayListOp>();
            receiver.draw_display_list(storage.display_list(op.handle), op.opacity, nested_cull);
        }
        OpType::DrawTextBlob => {
            let op = record.payload::<TextBlobOp>();
            receiver.draw_text_blob(storage.text_blob(op.handle), point_from(op.origin));
        }
        OpType::DrawShadow | OpType::DrawShadowTransparentOccluder => {
            let op = record.payload::<ShadowOp>();
            receiver.draw_shadow(
                storage.path(op.handle),
                DlColor(op.color),
                op.elevation,
                record.op == OpType::DrawShadowTransparentOccluder,
                op.dpr,
            );
        }
    }
}

fn clip_op(op: OpType) -> ClipOp {
    match op {
        OpType::ClipDifferenceRect | OpType::ClipDifferenceRRect | OpType::ClipDifferencePath => {
            ClipOp::Difference
        }
        _ => ClipOp::Intersect,
    }
}

fn dispatch_atlas<R: DlOpReceiver + ?Sized>(
    storage: &DlStorage,
    op: &AtlasOp,
    trailing: &[u8],
    cull: Option<Rect>,
    receiver: &mut R,
) {
    let count = op.count as usize;
    let (xforms, rest) = split_array::<RSTransform>(trailing, count);
    let (tex, rest) = split_array::<[f64; 4]>(rest, count);
    let tex: Vec<Rect> = tex.iter().copied().map(rect_from).collect();
    let colors = (op.has_colors != 0).then(|| split_array::<DlColor>(rest, count).0);
    receiver.draw_atlas(
        storage.image(op.handle),
        xforms,
        &tex,
        colors,
        checked(BlendMode::from_raw(op.mode), "blend mode"),
        checked(ImageSampling::from_raw(op.sampling), "sampling"),
        cull,
        op.render_with_attributes != 0,
    );
}
