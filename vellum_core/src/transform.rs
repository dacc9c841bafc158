// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform used for the current transformation matrix.
//!
//! Recorded transforms are 2-D (translate, scale, rotate, skew, affine) or
//! full 4×4 perspective. The tracker composes them all into one
//! [`Transform3d`] and uses it to map local bounds to device space.

use core::ops::Mul;
use kurbo::{Affine, Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Homogeneous `w` at or below this value is treated as behind the eye.
const MIN_W: f64 = 1e-9;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* `[x, y, z, w]`, the same layout as the
/// 16-value perspective records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Creates a transform from 16 column-major values.
    #[must_use]
    pub const fn from_cols_flat(m: [f64; 16]) -> Self {
        Self {
            cols: [
                [m[0], m[1], m[2], m[3]],
                [m[4], m[5], m[6], m[7]],
                [m[8], m[9], m[10], m[11]],
                [m[12], m[13], m[14], m[15]],
            ],
        }
    }

    /// Returns the 16 column-major values.
    #[must_use]
    pub const fn to_cols_flat(self) -> [f64; 16] {
        let c = self.cols;
        [
            c[0][0], c[0][1], c[0][2], c[0][3], c[1][0], c[1][1], c[1][2], c[1][3], c[2][0],
            c[2][1], c[2][2], c[2][3], c[3][0], c[3][1], c[3][2], c[3][3],
        ]
    }

    /// Creates a 2-D translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f64, ty: f64) -> Self {
        Self::from_affine(Affine::new([1.0, 0.0, 0.0, 1.0, tx, ty]))
    }

    /// Creates a 2-D non-uniform scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        Self::from_affine(Affine::new([sx, 0.0, 0.0, sy, 0.0, 0.0]))
    }

    /// Creates a rotation around the Z axis, in degrees.
    #[must_use]
    pub fn from_rotation_degrees(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (s, c) = (radians.sin(), radians.cos());
        Self::from_affine(Affine::new([c, s, -s, c, 0.0, 0.0]))
    }

    /// Creates a 2-D skew.
    #[inline]
    #[must_use]
    pub const fn from_skew(kx: f64, ky: f64) -> Self {
        Self::from_affine(Affine::new([1.0, ky, kx, 1.0, 0.0, 0.0]))
    }

    /// Embeds a 2-D affine transform.
    #[must_use]
    pub const fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    /// Returns the 2-D affine part when this transform has no perspective.
    ///
    /// Z components are ignored because recorded geometry is planar.
    #[must_use]
    pub fn to_affine(&self) -> Option<Affine> {
        let c = &self.cols;
        (c[0][3] == 0.0 && c[1][3] == 0.0 && c[3][3] == 1.0)
            .then(|| Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]]))
    }

    /// Returns `true` if this is exactly the identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is every element [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Is any element [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|v| v.is_nan())
    }

    /// Maps a planar point, returning `None` when it lands at or behind the
    /// eye (`w <= 0`).
    #[must_use]
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        (w > MIN_W).then(|| Point::new(x / w, y / w))
    }

    /// Maps a rectangle to the bounding box of its transformed corners.
    ///
    /// Returns `None` when any corner lands at or behind the eye; callers
    /// treat that as unbounded.
    #[must_use]
    pub fn map_rect(&self, rect: Rect) -> Option<Rect> {
        if let Some(affine) = self.to_affine() {
            return Some(affine.transform_rect_bbox(rect));
        }
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ];
        let mut out: Option<Rect> = None;
        for corner in corners {
            let p = self.map_point(corner)?;
            out = Some(match out {
                Some(r) => r.union_pt(p),
                None => Rect::from_points(p, p),
            });
        }
        out
    }

    /// Largest length a unit vector can have after the 2-D linear part.
    ///
    /// Used to turn local blur radii into device radii. Perspective
    /// transforms report infinity.
    #[must_use]
    pub fn max_scale(&self) -> f64 {
        let Some(affine) = self.to_affine() else {
            return f64::INFINITY;
        };
        let [a, b, c, d, _, _] = affine.as_coeffs();
        // Largest singular value of [[a, c], [b, d]].
        let s = a * a + b * b + c * c + d * d;
        let det = a * d - b * c;
        let disc = (s * s - 4.0 * det * det).max(0.0).sqrt();
        ((s + disc) * 0.5).sqrt()
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform3d {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl Mul for Transform3d {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (&self.cols, &rhs.cols);
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rect_close(a: Rect, b: Rect) -> bool {
        (a.x0 - b.x0).abs() < EPS
            && (a.y0 - b.y0).abs() < EPS
            && (a.x1 - b.x1).abs() < EPS
            && (a.y1 - b.y1).abs() < EPS
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert!(Transform3d::IDENTITY.is_identity());
    }

    #[test]
    fn translation_composition() {
        let c = Transform3d::from_translation(1.0, 0.0) * Transform3d::from_translation(0.0, 2.0);
        assert_eq!(c.cols[3], [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn translate_then_scale_maps_local_first() {
        // current * local: the scale applies to geometry before the translation.
        let ctm = Transform3d::from_translation(10.0, 0.0) * Transform3d::from_scale(2.0, 2.0);
        let mapped = ctm.map_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(mapped, Some(Rect::new(10.0, 0.0, 12.0, 2.0)));
    }

    #[test]
    fn affine_round_trip() {
        let affine = Affine::new([2.0, 0.5, -0.5, 3.0, 7.0, 9.0]);
        let t = Transform3d::from_affine(affine);
        assert_eq!(t.to_affine(), Some(affine));
    }

    #[test]
    fn flat_round_trip() {
        let t = Transform3d::from_skew(0.25, 0.5);
        assert_eq!(Transform3d::from_cols_flat(t.to_cols_flat()), t);
    }

    #[test]
    fn rotation_ninety_degrees() {
        let r = Transform3d::from_rotation_degrees(90.0);
        let mapped = r.map_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        let mapped = mapped.expect("affine maps are bounded");
        assert!(
            rect_close(mapped, Rect::new(-1.0, 0.0, 0.0, 2.0)),
            "unexpected rotated bounds {mapped:?}"
        );
    }

    #[test]
    fn perspective_has_no_affine() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = 0.001;
        assert!(t.to_affine().is_none());
        assert_eq!(t.max_scale(), f64::INFINITY);
    }

    #[test]
    fn perspective_divide_applied() {
        let mut t = Transform3d::IDENTITY;
        t.cols[3][3] = 2.0;
        let mapped = t.map_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(mapped, Some(Rect::new(0.0, 0.0, 2.0, 2.0)));
    }

    #[test]
    fn corner_behind_eye_is_unbounded() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = -1.0;
        assert!(t.map_rect(Rect::new(0.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn max_scale_of_non_uniform_scale() {
        let t = Transform3d::from_scale(2.0, 5.0);
        assert!((t.max_scale() - 5.0).abs() < EPS, "got {}", t.max_scale());
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }

    #[test]
    fn infinity_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
        assert!(!t.is_nan());
    }
}
