// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The record format.
//!
//! Every record is an 8-byte [`OpHeader`] (tag and total padded size)
//! followed by the fixed `Pod` payload of its kind and, for variable kinds,
//! trailing arrays whose length is given by a `count` field in the payload.
//! Records are padded to [`RECORD_ALIGN`] so every payload can be viewed in
//! place with `bytemuck`.
//!
//! Payloads that own a shared resource start with its `u32` handle.

use alloc::vec::Vec;
use core::mem::size_of;

use bytemuck::{Pod, Zeroable};
use kurbo::{Affine, Point, Rect, RoundedRect, RoundedRectRadii};

use crate::color::{BlendMode, DlColor};
use crate::effects::{ColorFilter, Gradient, GradientKind, ImageFilter, MaskFilter};
use crate::paint::{BlurStyle, ImageSampling, TileMode};

/// Alignment and padding granularity of every record.
pub(crate) const RECORD_ALIGN: usize = 8;

/// Size of [`OpHeader`].
pub(crate) const HEADER_SIZE: usize = size_of::<OpHeader>();

/// Record header.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct OpHeader {
    pub(crate) tag: u8,
    pub(crate) _reserved: [u8; 3],
    /// Total record size including header, payload, trailing data and padding.
    pub(crate) size: u32,
}

/// Coarse classification of an operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCategory {
    /// Sets a paint attribute.
    Attribute,
    /// Plain save.
    Save,
    /// Save with an offscreen layer.
    SaveLayer,
    /// Pops a save or save layer.
    Restore,
    /// Modifies the current transform.
    Transform,
    /// Modifies the current clip.
    Clip,
    /// Produces pixels.
    Draw,
}

impl OpCategory {
    /// `true` for every category that establishes drawing context for later
    /// operations. Culling never skips these.
    #[inline]
    #[must_use]
    pub const fn is_context(self) -> bool {
        !matches!(self, Self::Draw)
    }
}

/// What tearing down a record involves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dispose {
    /// Plain data.
    Trivial,
    /// Releases the resource handle at the start of the payload.
    ReleaseHandle,
}

/// Static description of one operation kind.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OpInfo {
    pub(crate) name: &'static str,
    pub(crate) category: OpCategory,
    /// Size of the fixed payload, excluding the header.
    pub(crate) base_size: usize,
    pub(crate) dispose: Dispose,
}

macro_rules! define_ops {
    ($(
        $(#[$doc:meta])*
        $name:ident($payload:ty, $category:ident, $dispose:ident);
    )*) => {
        /// The closed set of recorded operation kinds.
        ///
        /// The discriminant is the record tag.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum OpType {
            $( $(#[$doc])* $name, )*
        }

        impl OpType {
            /// Every kind, in tag order.
            pub const ALL: &'static [Self] = &[$(Self::$name),*];
        }

        pub(crate) static OP_INFO: [OpInfo; OpType::COUNT] = [
            $(
                OpInfo {
                    name: stringify!($name),
                    category: OpCategory::$category,
                    base_size: size_of::<$payload>(),
                    dispose: Dispose::$dispose,
                },
            )*
        ];

        const _: () = {
            $(
                assert!(
                    size_of::<$payload>() % RECORD_ALIGN == 0,
                    "payloads keep records 8-byte aligned"
                );
            )*
        };
    };
}

define_ops! {
    /// Toggles anti-aliasing.
    SetAntiAlias(WordOp, Attribute, Trivial);
    /// Toggles dithering.
    SetDither(WordOp, Attribute, Trivial);
    /// Toggles colour inversion.
    SetInvertColors(WordOp, Attribute, Trivial);
    /// Sets the stroke cap.
    SetStrokeCap(WordOp, Attribute, Trivial);
    /// Sets the stroke join.
    SetStrokeJoin(WordOp, Attribute, Trivial);
    /// Sets fill/stroke style.
    SetStyle(WordOp, Attribute, Trivial);
    /// Sets the stroke width.
    SetStrokeWidth(ScalarOp, Attribute, Trivial);
    /// Sets the miter limit.
    SetStrokeMiter(ScalarOp, Attribute, Trivial);
    /// Sets the solid colour.
    SetColor(WordOp, Attribute, Trivial);
    /// Sets the blend mode.
    SetBlendMode(WordOp, Attribute, Trivial);
    /// Sets a dash path effect inline.
    SetPodPathEffect(DashOp, Attribute, Trivial);
    /// Clears the path effect.
    ClearPathEffect((), Attribute, Trivial);
    /// Clears the colour filter.
    ClearColorFilter((), Attribute, Trivial);
    /// Sets a colour filter inline.
    SetPodColorFilter(ColorFilterOp, Attribute, Trivial);
    /// Clears the colour source.
    ClearColorSource((), Attribute, Trivial);
    /// Sets a gradient colour source inline.
    SetPodColorSource(GradientOp, Attribute, Trivial);
    /// Sets an image colour source.
    SetImageColorSource(ImageSourceOp, Attribute, ReleaseHandle);
    /// Sets a runtime-effect colour source.
    SetRuntimeEffectColorSource(HandleOp, Attribute, ReleaseHandle);
    /// Clears the image filter.
    ClearImageFilter((), Attribute, Trivial);
    /// Sets a blur, dilate, erode or matrix image filter inline.
    SetPodImageFilter(ImageFilterOp, Attribute, Trivial);
    /// Sets any other image filter through a handle.
    SetSharedImageFilter(HandleOp, Attribute, ReleaseHandle);
    /// Clears the mask filter.
    ClearMaskFilter((), Attribute, Trivial);
    /// Sets a mask filter inline.
    SetPodMaskFilter(MaskFilterOp, Attribute, Trivial);

    /// Pushes transform and clip.
    Save((), Save, Trivial);
    /// Pushes an unbounded layer.
    SaveLayer(SaveLayerOp, SaveLayer, Trivial);
    /// Pushes a bounded layer.
    SaveLayerBounds(SaveLayerBoundsOp, SaveLayer, Trivial);
    /// Pushes an unbounded layer with a backdrop filter.
    SaveLayerBackdrop(SaveLayerBackdropOp, SaveLayer, ReleaseHandle);
    /// Pushes a bounded layer with a backdrop filter.
    SaveLayerBackdropBounds(SaveLayerBackdropBoundsOp, SaveLayer, ReleaseHandle);
    /// Pops the innermost save or layer.
    Restore((), Restore, Trivial);

    /// Translates.
    Translate(PairOp, Transform, Trivial);
    /// Scales.
    Scale(PairOp, Transform, Trivial);
    /// Rotates by degrees.
    Rotate(ScalarOp, Transform, Trivial);
    /// Skews.
    Skew(PairOp, Transform, Trivial);
    /// Concatenates a 2-D affine transform.
    Transform2DAffine(AffineOp, Transform, Trivial);
    /// Concatenates a 4×4 transform.
    TransformFullPerspective(PerspectiveOp, Transform, Trivial);
    /// Resets the transform to identity.
    TransformReset((), Transform, Trivial);

    /// Intersects the clip with a rect.
    ClipIntersectRect(ClipRectOp, Clip, Trivial);
    /// Intersects the clip with a rounded rect.
    ClipIntersectRRect(ClipRRectOp, Clip, Trivial);
    /// Intersects the clip with a path.
    ClipIntersectPath(PathOp, Clip, ReleaseHandle);
    /// Subtracts a rect from the clip.
    ClipDifferenceRect(ClipRectOp, Clip, Trivial);
    /// Subtracts a rounded rect from the clip.
    ClipDifferenceRRect(ClipRRectOp, Clip, Trivial);
    /// Subtracts a path from the clip.
    ClipDifferencePath(PathOp, Clip, ReleaseHandle);

    /// Fills the clip with the paint.
    DrawPaint((), Draw, Trivial);
    /// Fills the clip with a colour.
    DrawColor(DrawColorOp, Draw, Trivial);
    /// Strokes a line.
    DrawLine(LineOp, Draw, Trivial);
    /// Draws a rect.
    DrawRect(RectOp, Draw, Trivial);
    /// Draws an oval.
    DrawOval(RectOp, Draw, Trivial);
    /// Draws a circle.
    DrawCircle(CircleOp, Draw, Trivial);
    /// Draws a rounded rect.
    DrawRRect(RRectOp, Draw, Trivial);
    /// Draws the area between two rounded rects.
    DrawDRRect(DRRectOp, Draw, Trivial);
    /// Draws an arc or wedge.
    DrawArc(ArcOp, Draw, Trivial);
    /// Draws a path.
    DrawPath(HandleOp, Draw, ReleaseHandle);
    /// Draws separate points.
    DrawPoints(PointsOp, Draw, Trivial);
    /// Draws line segments from point pairs.
    DrawLines(PointsOp, Draw, Trivial);
    /// Draws an open polyline.
    DrawPolygon(PointsOp, Draw, Trivial);
    /// Draws a vertex mesh.
    DrawVertices(VerticesOp, Draw, ReleaseHandle);
    /// Draws an image at a point.
    DrawImage(ImageOp, Draw, ReleaseHandle);
    /// Draws an image at a point with the paint.
    DrawImageWithAttr(ImageOp, Draw, ReleaseHandle);
    /// Draws part of an image into a rect.
    DrawImageRect(ImageRectOp, Draw, ReleaseHandle);
    /// Draws a nine-patch image.
    DrawImageNine(ImageNineOp, Draw, ReleaseHandle);
    /// Draws a nine-patch image with the paint.
    DrawImageNineWithAttr(ImageNineOp, Draw, ReleaseHandle);
    /// Draws atlas sprites.
    DrawAtlas(AtlasOp, Draw, ReleaseHandle);
    /// Draws atlas sprites with a cull hint.
    DrawAtlasCulled(AtlasCulledOp, Draw, ReleaseHandle);
    /// Draws a nested display list.
    DrawDisplayList(DisplayListOp, Draw, ReleaseHandle);
    /// Draws a text blob.
    DrawTextBlob(TextBlobOp, Draw, ReleaseHandle);
    /// Draws a shadow for an opaque occluder.
    DrawShadow(ShadowOp, Draw, ReleaseHandle);
    /// Draws a shadow for a transparent occluder.
    DrawShadowTransparentOccluder(ShadowOp, Draw, ReleaseHandle);
}

impl OpType {
    /// Number of kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Decodes a record tag.
    #[inline]
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// Variant name.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Coarse classification.
    #[inline]
    #[must_use]
    pub fn category(self) -> OpCategory {
        self.info().category
    }

    #[inline]
    pub(crate) fn info(self) -> &'static OpInfo {
        &OP_INFO[self as usize]
    }
}

// ----- //

/// Unwraps a decoded enum value, treating garbage as corruption.
pub(crate) fn checked<T>(value: Option<T>, what: &str) -> T {
    value.unwrap_or_else(|| panic!("corrupt display list record: invalid {what}"))
}

pub(crate) const fn rect_raw(r: Rect) -> [f64; 4] {
    [r.x0, r.y0, r.x1, r.y1]
}

pub(crate) const fn rect_from(r: [f64; 4]) -> Rect {
    Rect::new(r[0], r[1], r[2], r[3])
}

pub(crate) const fn point_raw(p: Point) -> [f64; 2] {
    [p.x, p.y]
}

pub(crate) const fn point_from(p: [f64; 2]) -> Point {
    Point::new(p[0], p[1])
}

pub(crate) fn radii_raw(rr: &RoundedRect) -> [f64; 4] {
    let r = rr.radii();
    [r.top_left, r.top_right, r.bottom_right, r.bottom_left]
}

pub(crate) fn rrect_from(rect: [f64; 4], radii: [f64; 4]) -> RoundedRect {
    RoundedRect::from_rect(
        rect_from(rect),
        RoundedRectRadii::new(radii[0], radii[1], radii[2], radii[3]),
    )
}

pub(crate) const fn flag(value: bool) -> u32 {
    value as u32
}

// ----- //

/// One 32-bit value: flags, enums and colours.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct WordOp {
    pub(crate) value: u32,
    pub(crate) _pad: u32,
}

impl WordOp {
    pub(crate) const fn new(value: u32) -> Self {
        Self { value, _pad: 0 }
    }
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ScalarOp {
    pub(crate) value: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PairOp {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct AffineOp {
    pub(crate) coeffs: [f64; 6],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PerspectiveOp {
    pub(crate) cols: [f64; 16],
}

/// A resource handle with no other parameters.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct HandleOp {
    pub(crate) handle: u32,
    pub(crate) _pad: u32,
}

impl HandleOp {
    pub(crate) const fn new(handle: u32) -> Self {
        Self { handle, _pad: 0 }
    }
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ClipRectOp {
    pub(crate) rect: [f64; 4],
    pub(crate) anti_alias: u32,
    pub(crate) _pad: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ClipRRectOp {
    pub(crate) rect: [f64; 4],
    pub(crate) radii: [f64; 4],
    pub(crate) anti_alias: u32,
    pub(crate) _pad: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PathOp {
    pub(crate) handle: u32,
    pub(crate) anti_alias: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct RectOp {
    pub(crate) rect: [f64; 4],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct RRectOp {
    pub(crate) rect: [f64; 4],
    pub(crate) radii: [f64; 4],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DRRectOp {
    pub(crate) outer: RRectOp,
    pub(crate) inner: RRectOp,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct LineOp {
    pub(crate) p0: [f64; 2],
    pub(crate) p1: [f64; 2],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct CircleOp {
    pub(crate) center: [f64; 2],
    pub(crate) radius: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ArcOp {
    pub(crate) oval: [f64; 4],
    pub(crate) start_degrees: f64,
    pub(crate) sweep_degrees: f64,
    pub(crate) use_center: u32,
    pub(crate) _pad: u32,
}

/// Followed by `count` `[f64; 2]` points.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PointsOp {
    pub(crate) count: u32,
    pub(crate) _pad: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct VerticesOp {
    pub(crate) handle: u32,
    pub(crate) mode: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DrawColorOp {
    pub(crate) color: u32,
    pub(crate) mode: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ImageOp {
    pub(crate) handle: u32,
    pub(crate) sampling: u32,
    pub(crate) point: [f64; 2],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ImageRectOp {
    pub(crate) handle: u32,
    pub(crate) sampling: u32,
    pub(crate) render_with_attributes: u32,
    pub(crate) constraint: u32,
    pub(crate) src: [f64; 4],
    pub(crate) dst: [f64; 4],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ImageNineOp {
    pub(crate) handle: u32,
    pub(crate) filter: u32,
    pub(crate) center: [f64; 4],
    pub(crate) dst: [f64; 4],
}

/// Followed by `count` [`RSTransform`](crate::paint::RSTransform)s, `count`
/// `[f64; 4]` texture rects and, when `has_colors`, `count` `u32` colours.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct AtlasOp {
    pub(crate) handle: u32,
    pub(crate) count: u32,
    pub(crate) mode: u32,
    pub(crate) sampling: u32,
    pub(crate) has_colors: u32,
    pub(crate) render_with_attributes: u32,
}

/// [`AtlasOp`] plus a cull hint; same trailing layout.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct AtlasCulledOp {
    pub(crate) atlas: AtlasOp,
    pub(crate) cull: [f64; 4],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DisplayListOp {
    pub(crate) handle: u32,
    pub(crate) _pad: u32,
    pub(crate) opacity: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct TextBlobOp {
    pub(crate) handle: u32,
    pub(crate) _pad: u32,
    pub(crate) origin: [f64; 2],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ShadowOp {
    pub(crate) handle: u32,
    pub(crate) color: u32,
    pub(crate) elevation: f64,
    pub(crate) dpr: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SaveLayerOp {
    pub(crate) options: u32,
    pub(crate) _pad: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SaveLayerBoundsOp {
    pub(crate) options: u32,
    pub(crate) _pad: u32,
    pub(crate) bounds: [f64; 4],
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SaveLayerBackdropOp {
    pub(crate) handle: u32,
    pub(crate) options: u32,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SaveLayerBackdropBoundsOp {
    pub(crate) handle: u32,
    pub(crate) options: u32,
    pub(crate) bounds: [f64; 4],
}

/// Followed by `count` `f64` intervals.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DashOp {
    pub(crate) count: u32,
    pub(crate) _pad: u32,
    pub(crate) phase: f64,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct MaskFilterOp {
    pub(crate) style: u32,
    pub(crate) _pad: u32,
    pub(crate) sigma: f64,
}

impl MaskFilterOp {
    pub(crate) fn encode(filter: &MaskFilter) -> Self {
        let MaskFilter::Blur { style, sigma } = *filter;
        Self {
            style: style.to_raw(),
            _pad: 0,
            sigma,
        }
    }

    pub(crate) fn decode(&self) -> MaskFilter {
        MaskFilter::Blur {
            style: checked(BlurStyle::from_raw(self.style), "blur style"),
            sigma: self.sigma,
        }
    }
}

const COLOR_FILTER_BLEND: u32 = 0;
const COLOR_FILTER_MATRIX: u32 = 1;
const COLOR_FILTER_SRGB_TO_LINEAR: u32 = 2;
const COLOR_FILTER_LINEAR_TO_SRGB: u32 = 3;

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ColorFilterOp {
    pub(crate) kind: u32,
    pub(crate) mode: u32,
    pub(crate) color: u32,
    pub(crate) _pad: u32,
    pub(crate) matrix: [f32; 20],
}

impl ColorFilterOp {
    pub(crate) fn encode(filter: &ColorFilter) -> Self {
        let mut op = Self::zeroed();
        match filter {
            ColorFilter::Blend { color, mode } => {
                op.kind = COLOR_FILTER_BLEND;
                op.color = color.0;
                op.mode = mode.to_raw();
            }
            ColorFilter::Matrix(matrix) => {
                op.kind = COLOR_FILTER_MATRIX;
                op.matrix = *matrix;
            }
            ColorFilter::SrgbToLinearGamma => op.kind = COLOR_FILTER_SRGB_TO_LINEAR,
            ColorFilter::LinearToSrgbGamma => op.kind = COLOR_FILTER_LINEAR_TO_SRGB,
        }
        op
    }

    pub(crate) fn decode(&self) -> ColorFilter {
        match self.kind {
            COLOR_FILTER_BLEND => ColorFilter::Blend {
                color: DlColor(self.color),
                mode: checked(BlendMode::from_raw(self.mode), "blend mode"),
            },
            COLOR_FILTER_MATRIX => ColorFilter::Matrix(self.matrix),
            COLOR_FILTER_SRGB_TO_LINEAR => ColorFilter::SrgbToLinearGamma,
            COLOR_FILTER_LINEAR_TO_SRGB => ColorFilter::LinearToSrgbGamma,
            other => panic!("corrupt display list record: color filter kind {other}"),
        }
    }
}

const IMAGE_FILTER_BLUR: u32 = 0;
const IMAGE_FILTER_DILATE: u32 = 1;
const IMAGE_FILTER_ERODE: u32 = 2;
const IMAGE_FILTER_MATRIX: u32 = 3;

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ImageFilterOp {
    pub(crate) kind: u32,
    pub(crate) mode: u32,
    pub(crate) params: [f64; 6],
}

impl ImageFilterOp {
    /// Encodes an inline filter; `None` for variants that need a handle.
    pub(crate) fn encode(filter: &ImageFilter) -> Option<Self> {
        let mut op = Self::zeroed();
        match filter {
            ImageFilter::Blur {
                sigma_x,
                sigma_y,
                tile_mode,
            } => {
                op.kind = IMAGE_FILTER_BLUR;
                op.mode = tile_mode.to_raw();
                op.params[..2].copy_from_slice(&[*sigma_x, *sigma_y]);
            }
            ImageFilter::Dilate { radius_x, radius_y } => {
                op.kind = IMAGE_FILTER_DILATE;
                op.params[..2].copy_from_slice(&[*radius_x, *radius_y]);
            }
            ImageFilter::Erode { radius_x, radius_y } => {
                op.kind = IMAGE_FILTER_ERODE;
                op.params[..2].copy_from_slice(&[*radius_x, *radius_y]);
            }
            ImageFilter::Matrix { matrix, sampling } => {
                op.kind = IMAGE_FILTER_MATRIX;
                op.mode = sampling.to_raw();
                op.params = matrix.as_coeffs();
            }
            ImageFilter::ColorFilter(_)
            | ImageFilter::Compose { .. }
            | ImageFilter::LocalMatrix { .. } => return None,
        }
        Some(op)
    }

    pub(crate) fn decode(&self) -> ImageFilter {
        let [a, b, ..] = self.params;
        match self.kind {
            IMAGE_FILTER_BLUR => ImageFilter::Blur {
                sigma_x: a,
                sigma_y: b,
                tile_mode: checked(TileMode::from_raw(self.mode), "tile mode"),
            },
            IMAGE_FILTER_DILATE => ImageFilter::Dilate {
                radius_x: a,
                radius_y: b,
            },
            IMAGE_FILTER_ERODE => ImageFilter::Erode {
                radius_x: a,
                radius_y: b,
            },
            IMAGE_FILTER_MATRIX => ImageFilter::Matrix {
                matrix: Affine::new(self.params),
                sampling: checked(ImageSampling::from_raw(self.mode), "sampling"),
            },
            other => panic!("corrupt display list record: image filter kind {other}"),
        }
    }
}

const GRADIENT_LINEAR: u32 = 0;
const GRADIENT_RADIAL: u32 = 1;
const GRADIENT_CONICAL: u32 = 2;
const GRADIENT_SWEEP: u32 = 3;

/// Followed by `count` `f64` stops, then `count` `u32` colours.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct GradientOp {
    pub(crate) kind: u32,
    pub(crate) tile_mode: u32,
    pub(crate) count: u32,
    pub(crate) _pad: u32,
    pub(crate) geometry: [f64; 6],
    pub(crate) matrix: [f64; 6],
}

impl GradientOp {
    /// Encodes the fixed part; the builder writes the trailing arrays.
    pub(crate) fn encode(gradient: &Gradient, count: u32) -> Self {
        let (kind, geometry) = match gradient.kind {
            GradientKind::Linear { start, end } => {
                (GRADIENT_LINEAR, [start.x, start.y, end.x, end.y, 0.0, 0.0])
            }
            GradientKind::Radial { center, radius } => {
                (GRADIENT_RADIAL, [center.x, center.y, radius, 0.0, 0.0, 0.0])
            }
            GradientKind::Conical {
                start,
                start_radius,
                end,
                end_radius,
            } => (
                GRADIENT_CONICAL,
                [start.x, start.y, start_radius, end.x, end.y, end_radius],
            ),
            GradientKind::Sweep {
                center,
                start_degrees,
                end_degrees,
            } => (
                GRADIENT_SWEEP,
                [center.x, center.y, start_degrees, end_degrees, 0.0, 0.0],
            ),
        };
        Self {
            kind,
            tile_mode: gradient.tile_mode.to_raw(),
            count,
            _pad: 0,
            geometry,
            matrix: gradient.matrix.as_coeffs(),
        }
    }

    pub(crate) fn decode(&self, stops: &[f64], colors: &[DlColor]) -> Gradient {
        let g = self.geometry;
        let kind = match self.kind {
            GRADIENT_LINEAR => GradientKind::Linear {
                start: Point::new(g[0], g[1]),
                end: Point::new(g[2], g[3]),
            },
            GRADIENT_RADIAL => GradientKind::Radial {
                center: Point::new(g[0], g[1]),
                radius: g[2],
            },
            GRADIENT_CONICAL => GradientKind::Conical {
                start: Point::new(g[0], g[1]),
                start_radius: g[2],
                end: Point::new(g[3], g[4]),
                end_radius: g[5],
            },
            GRADIENT_SWEEP => GradientKind::Sweep {
                center: Point::new(g[0], g[1]),
                start_degrees: g[2],
                end_degrees: g[3],
            },
            other => panic!("corrupt display list record: gradient kind {other}"),
        };
        Gradient {
            kind,
            colors: Vec::from(colors),
            stops: Vec::from(stops),
            tile_mode: checked(TileMode::from_raw(self.tile_mode), "tile mode"),
            matrix: Affine::new(self.matrix),
        }
    }
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct ImageSourceOp {
    pub(crate) handle: u32,
    pub(crate) sampling: u32,
    pub(crate) horizontal: u32,
    pub(crate) vertical: u32,
    pub(crate) matrix: [f64; 6],
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn tags_index_the_info_table() {
        assert_eq!(OpType::COUNT, 67);
        for (tag, op) in OpType::ALL.iter().enumerate() {
            assert_eq!(*op as usize, tag, "tags are sequential");
            assert_eq!(OpType::from_tag(u8::try_from(tag).unwrap()), Some(*op));
        }
        assert!(OpType::from_tag(67).is_none());
        assert_eq!(OpType::DrawRect.name(), "DrawRect");
    }

    #[test]
    fn categories() {
        assert_eq!(OpType::SetColor.category(), OpCategory::Attribute);
        assert_eq!(OpType::SaveLayerBackdrop.category(), OpCategory::SaveLayer);
        assert_eq!(OpType::ClipDifferencePath.category(), OpCategory::Clip);
        assert_eq!(OpType::TransformReset.category(), OpCategory::Transform);
        assert_eq!(OpType::DrawShadow.category(), OpCategory::Draw);
        assert!(OpType::Restore.category().is_context());
        assert!(!OpType::DrawPaint.category().is_context());
    }

    #[test]
    fn handle_payloads_start_with_the_handle() {
        for op in OpType::ALL {
            if op.info().dispose == Dispose::ReleaseHandle {
                assert!(
                    op.info().base_size >= 4,
                    "{op:?} must have room for its handle"
                );
            }
        }
        assert_eq!(OpType::Save.info().base_size, 0);
        assert_eq!(HEADER_SIZE, 8);
    }

    #[test]
    fn inline_filter_codecs() {
        let blur = ImageFilter::Blur {
            sigma_x: 1.5,
            sigma_y: 2.5,
            tile_mode: TileMode::Mirror,
        };
        let op = ImageFilterOp::encode(&blur).expect("blur is inline");
        assert_eq!(op.decode(), blur);

        let composed = ImageFilter::Compose {
            outer: alloc::sync::Arc::new(blur.clone()),
            inner: alloc::sync::Arc::new(blur),
        };
        assert!(ImageFilterOp::encode(&composed).is_none());

        let filter = ColorFilter::Blend {
            color: DlColor::GREEN,
            mode: BlendMode::Multiply,
        };
        assert_eq!(ColorFilterOp::encode(&filter).decode(), filter);
    }

    #[test]
    fn gradient_codec() {
        let gradient = Gradient {
            kind: GradientKind::Conical {
                start: Point::new(1.0, 2.0),
                start_radius: 3.0,
                end: Point::new(4.0, 5.0),
                end_radius: 6.0,
            },
            colors: vec![DlColor::RED, DlColor::BLUE],
            stops: vec![0.25, 0.75],
            tile_mode: TileMode::Repeat,
            matrix: Affine::translate((1.0, 1.0)),
        };
        let op = GradientOp::encode(&gradient, 2);
        assert_eq!(op.decode(&gradient.stops, &gradient.colors), gradient);
    }

    #[test]
    #[should_panic(expected = "invalid blur style")]
    fn corrupt_enum_is_fatal() {
        let op = MaskFilterOp {
            style: 99,
            _pad: 0,
            sigma: 1.0,
        };
        let _ = op.decode();
    }
}
