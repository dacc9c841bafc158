// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small enumerations carried by paint attributes and drawing calls.

use bytemuck::{Pod, Zeroable};
use kurbo::{Point, Rect};

raw_enum! {
    /// Shape at the ends of open strokes.
    #[derive(Default)]
    pub enum StrokeCap {
        /// Ends flush with the endpoint.
        #[default]
        Butt = 0,
        /// Semicircle past the endpoint.
        Round = 1,
        /// Half-square past the endpoint.
        Square = 2,
    }
}

raw_enum! {
    /// Shape at stroke corners.
    #[derive(Default)]
    pub enum StrokeJoin {
        /// Sharp corner, limited by the miter limit.
        #[default]
        Miter = 0,
        /// Rounded corner.
        Round = 1,
        /// Cut-off corner.
        Bevel = 2,
    }
}

raw_enum! {
    /// How closed geometry is painted.
    #[derive(Default)]
    pub enum DrawStyle {
        /// Interior only.
        #[default]
        Fill = 0,
        /// Outline only.
        Stroke = 1,
        /// Interior and outline.
        StrokeAndFill = 2,
    }
}

impl DrawStyle {
    /// `true` for styles that draw an outline.
    #[inline]
    #[must_use]
    pub const fn is_stroked(self) -> bool {
        !matches!(self, Self::Fill)
    }
}

raw_enum! {
    /// How a clip shape combines with the current clip.
    pub enum ClipOp {
        /// Keep the overlap.
        Intersect = 0,
        /// Remove the shape.
        Difference = 1,
    }
}

raw_enum! {
    /// Interpretation of a point array.
    pub enum PointMode {
        /// Each point separately.
        Points = 0,
        /// Each pair as a line segment.
        Lines = 1,
        /// All points as one open polyline.
        Polygon = 2,
    }
}

raw_enum! {
    /// Texture filtering for nine-patch images.
    pub enum FilterMode {
        /// Nearest texel.
        Nearest = 0,
        /// Bilinear.
        Linear = 1,
    }
}

raw_enum! {
    /// Image sampling options.
    #[derive(Default)]
    pub enum ImageSampling {
        /// Nearest texel.
        #[default]
        Nearest = 0,
        /// Bilinear.
        Linear = 1,
        /// Bilinear with linear mipmap blending.
        MipmapLinear = 2,
        /// Bicubic.
        Cubic = 3,
    }
}

raw_enum! {
    /// Whether source-rect sampling may read outside the source rect.
    #[derive(Default)]
    pub enum SrcRectConstraint {
        /// Never sample outside the source rect.
        #[default]
        Strict = 0,
        /// Sampling may bleed for speed.
        Fast = 1,
    }
}

raw_enum! {
    /// Behaviour outside a shader's natural domain.
    #[derive(Default)]
    pub enum TileMode {
        /// Repeat the edge.
        #[default]
        Clamp = 0,
        /// Repeat the content.
        Repeat = 1,
        /// Repeat mirrored.
        Mirror = 2,
        /// Transparent outside.
        Decal = 3,
    }
}

raw_enum! {
    /// Which side of an edge a mask blur covers.
    #[derive(Default)]
    pub enum BlurStyle {
        /// Both sides.
        #[default]
        Normal = 0,
        /// Solid inside, blurred outside.
        Solid = 1,
        /// Outside only.
        Outer = 2,
        /// Inside only.
        Inner = 3,
    }
}

raw_enum! {
    /// Primitive assembly for vertex meshes.
    pub enum VertexMode {
        /// Independent triangles.
        Triangles = 0,
        /// Strip sharing two vertices.
        TriangleStrip = 1,
        /// Fan around the first vertex.
        TriangleFan = 2,
    }
}

/// A compressed rotation, uniform scale and translation used by atlas
/// sprites: `x' = scos*x - ssin*y + tx`, `y' = ssin*x + scos*y + ty`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RSTransform {
    /// Scale times cosine of the rotation.
    pub scos: f64,
    /// Scale times sine of the rotation.
    pub ssin: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl RSTransform {
    /// Creates a transform from its four components.
    #[inline]
    #[must_use]
    pub const fn new(scos: f64, ssin: f64, tx: f64, ty: f64) -> Self {
        Self { scos, ssin, tx, ty }
    }

    /// Pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, tx, ty)
    }

    fn map(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.scos * x - self.ssin * y + self.tx,
            self.ssin * x + self.scos * y + self.ty,
        )
    }

    /// Bounds of a `width` x `height` sprite placed by this transform.
    #[must_use]
    pub fn sprite_bounds(&self, width: f64, height: f64) -> Rect {
        let origin = self.map(0.0, 0.0);
        [
            self.map(width, 0.0),
            self.map(0.0, height),
            self.map(width, height),
        ]
        .into_iter()
        .fold(Rect::from_points(origin, origin), |r, p| r.union_pt(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_bounds_translation() {
        let xf = RSTransform::from_translation(10.0, 20.0);
        assert_eq!(xf.sprite_bounds(4.0, 3.0), Rect::new(10.0, 20.0, 14.0, 23.0));
    }

    #[test]
    fn sprite_bounds_quarter_turn() {
        let xf = RSTransform::new(0.0, 1.0, 0.0, 0.0);
        assert_eq!(xf.sprite_bounds(4.0, 2.0), Rect::new(-2.0, 0.0, 0.0, 4.0));
    }

    #[test]
    fn unknown_raw_values_rejected() {
        assert_eq!(StrokeCap::from_raw(2), Some(StrokeCap::Square));
        assert!(StrokeCap::from_raw(3).is_none());
        assert!(ClipOp::from_raw(7).is_none());
    }

    #[test]
    fn stroke_styles() {
        assert!(!DrawStyle::Fill.is_stroked());
        assert!(DrawStyle::Stroke.is_stroked());
        assert!(DrawStyle::StrokeAndFill.is_stroked());
    }
}
