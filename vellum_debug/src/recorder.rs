// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned capture of receiver calls.
//!
//! [`OpRecorder`] implements [`DlOpReceiver`] and stores each call as a
//! [`RecordedOp`] holding owned copies of its arguments. Shared resources
//! are kept by `Arc`. Nested lists are recorded as a single
//! [`RecordedOp::DrawDisplayList`] and not expanded.

use std::fmt;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape};
use vellum_core::DisplayList;
use vellum_core::color::{BlendMode, DlColor};
use vellum_core::effects::{ColorFilter, ColorSource, ImageFilter, MaskFilter, PathEffect};
use vellum_core::options::SaveLayerOptions;
use vellum_core::paint::{
    ClipOp, DrawStyle, FilterMode, ImageSampling, PointMode, RSTransform, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
use vellum_core::resource::{DlImage, DlVertices, TextBlob};
use vellum_core::transform::Transform3d;

// ---------------------------------------------------------------------------
// RecordedOp
// ---------------------------------------------------------------------------

/// One receiver call with owned arguments.
#[derive(Clone, Debug, PartialEq)]
#[expect(missing_docs, reason = "fields mirror the receiver parameters")]
pub enum RecordedOp {
    SetAntiAlias(bool),
    SetDither(bool),
    SetInvertColors(bool),
    SetStrokeCap(StrokeCap),
    SetStrokeJoin(StrokeJoin),
    SetDrawStyle(DrawStyle),
    SetStrokeWidth(f64),
    SetStrokeMiter(f64),
    SetColor(DlColor),
    SetBlendMode(BlendMode),
    SetColorSource(Option<ColorSource>),
    SetColorFilter(Option<ColorFilter>),
    SetImageFilter(Option<ImageFilter>),
    SetMaskFilter(Option<MaskFilter>),
    SetPathEffect(Option<PathEffect>),
    Save,
    SaveLayer {
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<ImageFilter>,
    },
    Restore,
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate(f64),
    Skew(f64, f64),
    Transform2dAffine(Affine),
    TransformFullPerspective(Transform3d),
    TransformReset,
    ClipRect {
        rect: Rect,
        op: ClipOp,
        anti_alias: bool,
    },
    ClipRoundedRect {
        rrect: RoundedRect,
        op: ClipOp,
        anti_alias: bool,
    },
    ClipPath {
        path: Arc<BezPath>,
        op: ClipOp,
        anti_alias: bool,
    },
    DrawPaint,
    DrawColor {
        color: DlColor,
        mode: BlendMode,
    },
    DrawLine(Point, Point),
    DrawRect(Rect),
    DrawOval(Rect),
    DrawCircle {
        center: Point,
        radius: f64,
    },
    DrawRoundedRect(RoundedRect),
    DrawDoubleRoundedRect {
        outer: RoundedRect,
        inner: RoundedRect,
    },
    DrawArc {
        oval: Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
    },
    DrawPath(Arc<BezPath>),
    DrawPoints {
        mode: PointMode,
        points: Vec<Point>,
    },
    DrawVertices {
        vertices: Arc<DlVertices>,
        mode: BlendMode,
    },
    DrawImage {
        image: Arc<DlImage>,
        point: Point,
        sampling: ImageSampling,
        render_with_attributes: bool,
    },
    DrawImageRect {
        image: Arc<DlImage>,
        src: Rect,
        dst: Rect,
        sampling: ImageSampling,
        render_with_attributes: bool,
        constraint: SrcRectConstraint,
    },
    DrawImageNine {
        image: Arc<DlImage>,
        center: Rect,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    },
    DrawAtlas {
        atlas: Arc<DlImage>,
        xforms: Vec<RSTransform>,
        tex: Vec<Rect>,
        colors: Option<Vec<DlColor>>,
        mode: BlendMode,
        sampling: ImageSampling,
        cull: Option<Rect>,
        render_with_attributes: bool,
    },
    DrawDisplayList {
        list: Arc<DisplayList>,
        opacity: f64,
        cull: Option<Rect>,
    },
    DrawTextBlob {
        blob: Arc<TextBlob>,
        origin: Point,
    },
    DrawShadow {
        path: Arc<BezPath>,
        color: DlColor,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    },
}

impl RecordedOp {
    /// The receiver method this op came from.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetAntiAlias(_) => "set_anti_alias",
            Self::SetDither(_) => "set_dither",
            Self::SetInvertColors(_) => "set_invert_colors",
            Self::SetStrokeCap(_) => "set_stroke_cap",
            Self::SetStrokeJoin(_) => "set_stroke_join",
            Self::SetDrawStyle(_) => "set_draw_style",
            Self::SetStrokeWidth(_) => "set_stroke_width",
            Self::SetStrokeMiter(_) => "set_stroke_miter",
            Self::SetColor(_) => "set_color",
            Self::SetBlendMode(_) => "set_blend_mode",
            Self::SetColorSource(_) => "set_color_source",
            Self::SetColorFilter(_) => "set_color_filter",
            Self::SetImageFilter(_) => "set_image_filter",
            Self::SetMaskFilter(_) => "set_mask_filter",
            Self::SetPathEffect(_) => "set_path_effect",
            Self::Save => "save",
            Self::SaveLayer { .. } => "save_layer",
            Self::Restore => "restore",
            Self::Translate(..) => "translate",
            Self::Scale(..) => "scale",
            Self::Rotate(_) => "rotate",
            Self::Skew(..) => "skew",
            Self::Transform2dAffine(_) => "transform_2d_affine",
            Self::TransformFullPerspective(_) => "transform_full_perspective",
            Self::TransformReset => "transform_reset",
            Self::ClipRect { .. } => "clip_rect",
            Self::ClipRoundedRect { .. } => "clip_rounded_rect",
            Self::ClipPath { .. } => "clip_path",
            Self::DrawPaint => "draw_paint",
            Self::DrawColor { .. } => "draw_color",
            Self::DrawLine(..) => "draw_line",
            Self::DrawRect(_) => "draw_rect",
            Self::DrawOval(_) => "draw_oval",
            Self::DrawCircle { .. } => "draw_circle",
            Self::DrawRoundedRect(_) => "draw_rounded_rect",
            Self::DrawDoubleRoundedRect { .. } => "draw_double_rounded_rect",
            Self::DrawArc { .. } => "draw_arc",
            Self::DrawPath(_) => "draw_path",
            Self::DrawPoints { .. } => "draw_points",
            Self::DrawVertices { .. } => "draw_vertices",
            Self::DrawImage { .. } => "draw_image",
            Self::DrawImageRect { .. } => "draw_image_rect",
            Self::DrawImageNine { .. } => "draw_image_nine",
            Self::DrawAtlas { .. } => "draw_atlas",
            Self::DrawDisplayList { .. } => "draw_display_list",
            Self::DrawTextBlob { .. } => "draw_text_blob",
            Self::DrawShadow { .. } => "draw_shadow",
        }
    }

    /// Whether this op draws.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.name().starts_with("draw_")
    }
}

struct R(Rect);

impl fmt::Display for R {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rect { x0, y0, x1, y1 } = self.0;
        write!(f, "[{x0}, {y0}, {x1}, {y1}]")
    }
}

struct P(Point);

impl fmt::Display for P {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0.x, self.0.y)
    }
}

struct RR(RoundedRect);

impl fmt::Display for RR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let radii = self.0.radii();
        write!(
            f,
            "{} r=[{}, {}, {}, {}]",
            R(self.0.rect()),
            radii.top_left,
            radii.top_right,
            radii.bottom_right,
            radii.bottom_left
        )
    }
}

fn aa(anti_alias: bool) -> &'static str {
    if anti_alias { " aa" } else { "" }
}

fn attr(render_with_attributes: bool) -> &'static str {
    if render_with_attributes { " +paint" } else { "" }
}

/// One line per op: the method name followed by a compact rendering of its
/// arguments.
impl fmt::Display for RecordedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Self::SetAntiAlias(v) | Self::SetDither(v) | Self::SetInvertColors(v) => {
                write!(f, " {v}")
            }
            Self::SetStrokeCap(cap) => write!(f, " {cap:?}"),
            Self::SetStrokeJoin(join) => write!(f, " {join:?}"),
            Self::SetDrawStyle(style) => write!(f, " {style:?}"),
            Self::SetStrokeWidth(v) | Self::SetStrokeMiter(v) | Self::Rotate(v) => {
                write!(f, " {v}")
            }
            Self::SetColor(color) => write!(f, " #{:08x}", color.0),
            Self::SetBlendMode(mode) => write!(f, " {mode:?}"),
            Self::SetColorSource(source) => match source {
                None => f.write_str(" none"),
                Some(ColorSource::Gradient(g)) => {
                    write!(f, " gradient {:?} stops={}", g.kind, g.stops.len())
                }
                Some(ColorSource::Image { image, .. }) => write!(f, " image #{}", image.id()),
                Some(ColorSource::RuntimeEffect(effect)) => write!(f, " effect {}", effect.name),
            },
            Self::SetColorFilter(filter) => match filter {
                None => f.write_str(" none"),
                Some(filter) => write!(f, " {filter:?}"),
            },
            Self::SetImageFilter(filter) => match filter {
                None => f.write_str(" none"),
                Some(filter) => write!(f, " {filter:?}"),
            },
            Self::SetMaskFilter(filter) => match filter {
                None => f.write_str(" none"),
                Some(MaskFilter::Blur { style, sigma }) => write!(f, " blur {style:?} {sigma}"),
            },
            Self::SetPathEffect(effect) => match effect {
                None => f.write_str(" none"),
                Some(PathEffect::Dash { intervals, phase }) => {
                    write!(f, " dash {intervals:?} phase={phase}")
                }
            },
            Self::Save | Self::Restore | Self::TransformReset | Self::DrawPaint => Ok(()),
            Self::SaveLayer {
                bounds,
                options,
                backdrop,
            } => {
                if let Some(bounds) = bounds {
                    write!(f, " {}", R(*bounds))?;
                }
                if options.renders_with_attributes() {
                    f.write_str(" +paint")?;
                }
                if options.can_distribute_opacity() {
                    f.write_str(" +opacity")?;
                }
                if backdrop.is_some() {
                    f.write_str(" +backdrop")?;
                }
                Ok(())
            }
            Self::Translate(x, y) | Self::Scale(x, y) | Self::Skew(x, y) => write!(f, " {x} {y}"),
            Self::Transform2dAffine(affine) => write!(f, " {:?}", affine.as_coeffs()),
            Self::TransformFullPerspective(m) => write!(f, " {:?}", m.to_cols_flat()),
            Self::ClipRect {
                rect,
                op,
                anti_alias,
            } => write!(f, " {op:?} {}{}", R(*rect), aa(*anti_alias)),
            Self::ClipRoundedRect {
                rrect,
                op,
                anti_alias,
            } => write!(f, " {op:?} {}{}", RR(*rrect), aa(*anti_alias)),
            Self::ClipPath {
                path,
                op,
                anti_alias,
            } => write!(
                f,
                " {op:?} path({} els){}",
                path.elements().len(),
                aa(*anti_alias)
            ),
            Self::DrawColor { color, mode } => write!(f, " #{:08x} {mode:?}", color.0),
            Self::DrawLine(p0, p1) => write!(f, " {} {}", P(*p0), P(*p1)),
            Self::DrawRect(rect) | Self::DrawOval(rect) => write!(f, " {}", R(*rect)),
            Self::DrawCircle { center, radius } => write!(f, " {} r={radius}", P(*center)),
            Self::DrawRoundedRect(rrect) => write!(f, " {}", RR(*rrect)),
            Self::DrawDoubleRoundedRect { outer, inner } => {
                write!(f, " {} {}", RR(*outer), RR(*inner))
            }
            Self::DrawArc {
                oval,
                start_degrees,
                sweep_degrees,
                use_center,
            } => write!(
                f,
                " {} {start_degrees}+{sweep_degrees}{}",
                R(*oval),
                if *use_center { " center" } else { "" }
            ),
            Self::DrawPath(path) => write!(f, " bbox={}", R(path.bounding_box())),
            Self::DrawPoints { mode, points } => write!(f, " {mode:?} n={}", points.len()),
            Self::DrawVertices { vertices, mode } => write!(
                f,
                " {:?} n={} {mode:?}",
                vertices.mode(),
                vertices.positions().len()
            ),
            Self::DrawImage {
                image,
                point,
                sampling,
                render_with_attributes,
            } => write!(
                f,
                " #{} at {} {sampling:?}{}",
                image.id(),
                P(*point),
                attr(*render_with_attributes)
            ),
            Self::DrawImageRect {
                image,
                src,
                dst,
                sampling,
                render_with_attributes,
                constraint,
            } => write!(
                f,
                " #{} {} -> {} {sampling:?} {constraint:?}{}",
                image.id(),
                R(*src),
                R(*dst),
                attr(*render_with_attributes)
            ),
            Self::DrawImageNine {
                image,
                center,
                dst,
                filter,
                render_with_attributes,
            } => write!(
                f,
                " #{} center={} -> {} {filter:?}{}",
                image.id(),
                R(*center),
                R(*dst),
                attr(*render_with_attributes)
            ),
            Self::DrawAtlas {
                atlas,
                xforms,
                colors,
                mode,
                cull,
                render_with_attributes,
                ..
            } => {
                write!(f, " #{} n={} {mode:?}", atlas.id(), xforms.len())?;
                if colors.is_some() {
                    f.write_str(" +colors")?;
                }
                if let Some(cull) = cull {
                    write!(f, " cull={}", R(*cull))?;
                }
                f.write_str(attr(*render_with_attributes))
            }
            Self::DrawDisplayList {
                list,
                opacity,
                cull,
            } => {
                write!(
                    f,
                    " id={} ops={} opacity={opacity}",
                    list.unique_id(),
                    list.op_count(false)
                )?;
                match cull {
                    Some(cull) => write!(f, " cull={}", R(*cull)),
                    None => Ok(()),
                }
            }
            Self::DrawTextBlob { blob, origin } => {
                write!(f, " glyphs={} at {}", blob.glyphs().len(), P(*origin))
            }
            Self::DrawShadow {
                path,
                color,
                elevation,
                transparent_occluder,
                dpr,
            } => write!(
                f,
                " bbox={} #{:08x} elevation={elevation} dpr={dpr}{}",
                R(path.bounding_box()),
                color.0,
                if *transparent_occluder {
                    " transparent"
                } else {
                    ""
                }
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Receiver glue
// ---------------------------------------------------------------------------

/// Implements [`DlOpReceiver`](vellum_core::DlOpReceiver) for a type with a
/// `push_op(&mut self, RecordedOp)` method.
macro_rules! record_ops {
    (impl [$($generics:tt)*] $ty:ty) => {
        impl<$($generics)*> vellum_core::DlOpReceiver for $ty {
            fn set_anti_alias(&mut self, aa: bool) {
                self.push_op(RecordedOp::SetAntiAlias(aa));
            }
            fn set_dither(&mut self, dither: bool) {
                self.push_op(RecordedOp::SetDither(dither));
            }
            fn set_invert_colors(&mut self, invert: bool) {
                self.push_op(RecordedOp::SetInvertColors(invert));
            }
            fn set_stroke_cap(&mut self, cap: StrokeCap) {
                self.push_op(RecordedOp::SetStrokeCap(cap));
            }
            fn set_stroke_join(&mut self, join: StrokeJoin) {
                self.push_op(RecordedOp::SetStrokeJoin(join));
            }
            fn set_draw_style(&mut self, style: DrawStyle) {
                self.push_op(RecordedOp::SetDrawStyle(style));
            }
            fn set_stroke_width(&mut self, width: f64) {
                self.push_op(RecordedOp::SetStrokeWidth(width));
            }
            fn set_stroke_miter(&mut self, limit: f64) {
                self.push_op(RecordedOp::SetStrokeMiter(limit));
            }
            fn set_color(&mut self, color: DlColor) {
                self.push_op(RecordedOp::SetColor(color));
            }
            fn set_blend_mode(&mut self, mode: BlendMode) {
                self.push_op(RecordedOp::SetBlendMode(mode));
            }
            fn set_color_source(&mut self, source: Option<&ColorSource>) {
                self.push_op(RecordedOp::SetColorSource(source.cloned()));
            }
            fn set_color_filter(&mut self, filter: Option<&ColorFilter>) {
                self.push_op(RecordedOp::SetColorFilter(filter.cloned()));
            }
            fn set_image_filter(&mut self, filter: Option<&ImageFilter>) {
                self.push_op(RecordedOp::SetImageFilter(filter.cloned()));
            }
            fn set_mask_filter(&mut self, filter: Option<&MaskFilter>) {
                self.push_op(RecordedOp::SetMaskFilter(filter.copied()));
            }
            fn set_path_effect(&mut self, effect: Option<&PathEffect>) {
                self.push_op(RecordedOp::SetPathEffect(effect.cloned()));
            }
            fn save(&mut self) {
                self.push_op(RecordedOp::Save);
            }
            fn save_layer(
                &mut self,
                bounds: Option<Rect>,
                options: SaveLayerOptions,
                backdrop: Option<&ImageFilter>,
            ) {
                self.push_op(RecordedOp::SaveLayer {
                    bounds,
                    options,
                    backdrop: backdrop.cloned(),
                });
            }
            fn restore(&mut self) {
                self.push_op(RecordedOp::Restore);
            }
            fn translate(&mut self, tx: f64, ty: f64) {
                self.push_op(RecordedOp::Translate(tx, ty));
            }
            fn scale(&mut self, sx: f64, sy: f64) {
                self.push_op(RecordedOp::Scale(sx, sy));
            }
            fn rotate(&mut self, degrees: f64) {
                self.push_op(RecordedOp::Rotate(degrees));
            }
            fn skew(&mut self, kx: f64, ky: f64) {
                self.push_op(RecordedOp::Skew(kx, ky));
            }
            fn transform_2d_affine(&mut self, affine: Affine) {
                self.push_op(RecordedOp::Transform2dAffine(affine));
            }
            fn transform_full_perspective(&mut self, transform: &Transform3d) {
                self.push_op(RecordedOp::TransformFullPerspective(*transform));
            }
            fn transform_reset(&mut self) {
                self.push_op(RecordedOp::TransformReset);
            }
            fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
                self.push_op(RecordedOp::ClipRect {
                    rect,
                    op,
                    anti_alias,
                });
            }
            fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, anti_alias: bool) {
                self.push_op(RecordedOp::ClipRoundedRect {
                    rrect,
                    op,
                    anti_alias,
                });
            }
            fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, anti_alias: bool) {
                self.push_op(RecordedOp::ClipPath {
                    path: Arc::clone(path),
                    op,
                    anti_alias,
                });
            }
            fn draw_paint(&mut self) {
                self.push_op(RecordedOp::DrawPaint);
            }
            fn draw_color(&mut self, color: DlColor, mode: BlendMode) {
                self.push_op(RecordedOp::DrawColor { color, mode });
            }
            fn draw_line(&mut self, p0: Point, p1: Point) {
                self.push_op(RecordedOp::DrawLine(p0, p1));
            }
            fn draw_rect(&mut self, rect: Rect) {
                self.push_op(RecordedOp::DrawRect(rect));
            }
            fn draw_oval(&mut self, bounds: Rect) {
                self.push_op(RecordedOp::DrawOval(bounds));
            }
            fn draw_circle(&mut self, center: Point, radius: f64) {
                self.push_op(RecordedOp::DrawCircle { center, radius });
            }
            fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
                self.push_op(RecordedOp::DrawRoundedRect(rrect));
            }
            fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect) {
                self.push_op(RecordedOp::DrawDoubleRoundedRect { outer, inner });
            }
            fn draw_arc(
                &mut self,
                oval: Rect,
                start_degrees: f64,
                sweep_degrees: f64,
                use_center: bool,
            ) {
                self.push_op(RecordedOp::DrawArc {
                    oval,
                    start_degrees,
                    sweep_degrees,
                    use_center,
                });
            }
            fn draw_path(&mut self, path: &Arc<BezPath>) {
                self.push_op(RecordedOp::DrawPath(Arc::clone(path)));
            }
            fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
                self.push_op(RecordedOp::DrawPoints {
                    mode,
                    points: points.to_vec(),
                });
            }
            fn draw_vertices(&mut self, vertices: &Arc<DlVertices>, mode: BlendMode) {
                self.push_op(RecordedOp::DrawVertices {
                    vertices: Arc::clone(vertices),
                    mode,
                });
            }
            fn draw_image(
                &mut self,
                image: &Arc<DlImage>,
                point: Point,
                sampling: ImageSampling,
                render_with_attributes: bool,
            ) {
                self.push_op(RecordedOp::DrawImage {
                    image: Arc::clone(image),
                    point,
                    sampling,
                    render_with_attributes,
                });
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
                self.push_op(RecordedOp::DrawImageRect {
                    image: Arc::clone(image),
                    src,
                    dst,
                    sampling,
                    render_with_attributes,
                    constraint,
                });
            }
            fn draw_image_nine(
                &mut self,
                image: &Arc<DlImage>,
                center: Rect,
                dst: Rect,
                filter: FilterMode,
                render_with_attributes: bool,
            ) {
                self.push_op(RecordedOp::DrawImageNine {
                    image: Arc::clone(image),
                    center,
                    dst,
                    filter,
                    render_with_attributes,
                });
            }
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
                self.push_op(RecordedOp::DrawAtlas {
                    atlas: Arc::clone(atlas),
                    xforms: xforms.to_vec(),
                    tex: tex.to_vec(),
                    colors: colors.map(<[DlColor]>::to_vec),
                    mode,
                    sampling,
                    cull,
                    render_with_attributes,
                });
            }
            fn draw_display_list(
                &mut self,
                list: &Arc<DisplayList>,
                opacity: f64,
                cull: Option<Rect>,
            ) {
                self.push_op(RecordedOp::DrawDisplayList {
                    list: Arc::clone(list),
                    opacity,
                    cull,
                });
            }
            fn draw_text_blob(&mut self, blob: &Arc<TextBlob>, origin: Point) {
                self.push_op(RecordedOp::DrawTextBlob {
                    blob: Arc::clone(blob),
                    origin,
                });
            }
            fn draw_shadow(
                &mut self,
                path: &Arc<BezPath>,
                color: DlColor,
                elevation: f64,
                transparent_occluder: bool,
                dpr: f64,
            ) {
                self.push_op(RecordedOp::DrawShadow {
                    path: Arc::clone(path),
                    color,
                    elevation,
                    transparent_occluder,
                    dpr,
                });
            }
        }
    };
}

pub(crate) use record_ops;

// ---------------------------------------------------------------------------
// OpRecorder
// ---------------------------------------------------------------------------

/// A receiver that keeps every call it receives.
#[derive(Clone, Debug, Default)]
pub struct OpRecorder {
    ops: Vec<RecordedOp>,
}

impl OpRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `list` in full.
    #[must_use]
    pub fn record(list: &DisplayList) -> Vec<RecordedOp> {
        let mut recorder = Self::new();
        list.dispatch(&mut recorder);
        recorder.ops
    }

    /// The ops recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Consumes the recorder and returns the ops.
    #[must_use]
    pub fn into_ops(self) -> Vec<RecordedOp> {
        self.ops
    }

    fn push_op(&mut self, op: RecordedOp) {
        self.ops.push(op);
    }
}

record_ops!(impl [] OpRecorder);
