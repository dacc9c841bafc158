// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint effect objects: colour sources, colour/mask/image filters and path
//! effects.
//!
//! These are plain value types. Equality is structural so that two lists
//! recorded from the same calls compare equal even when the effect objects
//! were allocated separately.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use crate::color::{BlendMode, DlColor};
use crate::paint::{BlurStyle, ImageSampling, TileMode};
use crate::resource::{DlImage, RuntimeEffect};
use crate::transform::Transform3d;

/// Blur radii extend this many sigmas past the geometry.
const BLUR_SIGMA_SCALE: f64 = 3.0;

/// A per-pixel colour transformation.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    /// Blends a constant colour onto every pixel.
    Blend {
        /// The constant source colour.
        color: DlColor,
        /// How it combines with the pixel.
        mode: BlendMode,
    },
    /// A 4×5 row-major colour matrix applied to un-premultiplied RGBA, with
    /// the translation column in normalized units.
    Matrix([f32; 20]),
    /// Converts sRGB-encoded values to linear.
    SrgbToLinearGamma,
    /// Converts linear values to sRGB encoding.
    LinearToSrgbGamma,
}

impl ColorFilter {
    /// Whether filtering a transparent-black pixel can produce a visible one.
    #[must_use]
    pub fn modifies_transparent_black(&self) -> bool {
        match self {
            Self::Blend { color, mode } => {
                !color.is_transparent() && mode.keeps_source_over_transparent()
            }
            Self::Matrix(m) => m[4] != 0.0 || m[9] != 0.0 || m[14] != 0.0 || m[19] != 0.0,
            Self::SrgbToLinearGamma | Self::LinearToSrgbGamma => false,
        }
    }
}

/// A filter applied to the coverage mask of a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaskFilter {
    /// Gaussian blur of the mask.
    Blur {
        /// Which side of the edge is blurred.
        style: BlurStyle,
        /// Standard deviation in local units.
        sigma: f64,
    },
}

impl MaskFilter {
    /// Distance the filter can spread coverage past the shape.
    #[must_use]
    pub fn outset(&self) -> f64 {
        match self {
            Self::Blur { sigma, .. } => sigma * BLUR_SIGMA_SCALE,
        }
    }
}

/// A geometric effect applied to stroked paths.
#[derive(Clone, Debug, PartialEq)]
pub enum PathEffect {
    /// On/off dash pattern.
    Dash {
        /// Alternating on and off lengths.
        intervals: Vec<f64>,
        /// Offset into the pattern.
        phase: f64,
    },
}

/// A filter applied to the rendered content of a draw or layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageFilter {
    /// Gaussian blur.
    Blur {
        /// Horizontal standard deviation.
        sigma_x: f64,
        /// Vertical standard deviation.
        sigma_y: f64,
        /// Edge treatment.
        tile_mode: TileMode,
    },
    /// Morphological dilation.
    Dilate {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
    },
    /// Morphological erosion.
    Erode {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
    },
    /// Resamples content through a matrix.
    Matrix {
        /// The transform applied to the content.
        matrix: Affine,
        /// Sampling used when resampling.
        sampling: ImageSampling,
    },
    /// Applies a colour filter to the content.
    ColorFilter(ColorFilter),
    /// Applies `inner`, then `outer`.
    Compose {
        /// Applied second.
        outer: Arc<Self>,
        /// Applied first.
        inner: Arc<Self>,
    },
    /// Evaluates `filter` in a coordinate space offset by `matrix`.
    LocalMatrix {
        /// The local coordinate change.
        matrix: Affine,
        /// The wrapped filter.
        filter: Arc<Self>,
    },
}

impl ImageFilter {
    /// `true` for the variants recorded inline instead of behind a handle.
    #[must_use]
    pub fn is_pod(&self) -> bool {
        matches!(
            self,
            Self::Blur { .. } | Self::Dilate { .. } | Self::Erode { .. } | Self::Matrix { .. }
        )
    }

    /// Whether applying this filter to empty content can produce pixels.
    #[must_use]
    pub fn modifies_transparent_black(&self) -> bool {
        match self {
            Self::Blur { .. } | Self::Dilate { .. } | Self::Erode { .. } | Self::Matrix { .. } => {
                false
            }
            Self::ColorFilter(filter) => filter.modifies_transparent_black(),
            Self::Compose { outer, inner } => {
                outer.modifies_transparent_black() || inner.modifies_transparent_black()
            }
            Self::LocalMatrix { filter, .. } => filter.modifies_transparent_black(),
        }
    }

    /// Conservative local-space bounds of the output for content covering
    /// `input`. `None` means the output is unbounded.
    #[must_use]
    pub fn map_local_bounds(&self, input: Rect) -> Option<Rect> {
        match self {
            Self::Blur {
                sigma_x, sigma_y, ..
            } => Some(input.inflate(sigma_x * BLUR_SIGMA_SCALE, sigma_y * BLUR_SIGMA_SCALE)),
            Self::Dilate { radius_x, radius_y } => Some(input.inflate(*radius_x, *radius_y)),
            // Erosion only shrinks coverage.
            Self::Erode { .. } => Some(input),
            Self::Matrix { matrix, .. } => Some(matrix.transform_rect_bbox(input)),
            Self::ColorFilter(filter) => (!filter.modifies_transparent_black()).then_some(input),
            Self::Compose { outer, inner } => outer.map_local_bounds(inner.map_local_bounds(input)?),
            Self::LocalMatrix { matrix, filter } => {
                let inverse = invert(*matrix)?;
                let local = filter.map_local_bounds(inverse.transform_rect_bbox(input))?;
                Some(matrix.transform_rect_bbox(local))
            }
        }
    }

    /// Conservative device-space bounds of the output for device content
    /// covering `input`, when the filter was set up under `ctm`.
    ///
    /// Returns `None` when the result is unbounded or the transform cannot
    /// be inverted.
    #[must_use]
    pub fn map_device_bounds(&self, input: Rect, ctm: &Transform3d) -> Option<Rect> {
        let affine = ctm.to_affine()?;
        let inverse = invert(affine)?;
        let local = self.map_local_bounds(inverse.transform_rect_bbox(input))?;
        Some(affine.transform_rect_bbox(local))
    }
}

/// Inverts an affine transform, rejecting singular ones.
pub(crate) fn invert(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    (det != 0.0 && det.is_finite()).then(|| affine.inverse())
}

/// Geometry of a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    /// Along the segment from `start` to `end`.
    Linear {
        /// Position of stop 0.
        start: Point,
        /// Position of stop 1.
        end: Point,
    },
    /// Concentric circles.
    Radial {
        /// Circle centre.
        center: Point,
        /// Radius of stop 1.
        radius: f64,
    },
    /// Between two circles.
    Conical {
        /// Centre of the start circle.
        start: Point,
        /// Radius of the start circle.
        start_radius: f64,
        /// Centre of the end circle.
        end: Point,
        /// Radius of the end circle.
        end_radius: f64,
    },
    /// Angular sweep around a centre.
    Sweep {
        /// Sweep centre.
        center: Point,
        /// Angle of stop 0, in degrees.
        start_degrees: f64,
        /// Angle of stop 1, in degrees.
        end_degrees: f64,
    },
}

/// A gradient colour source.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    /// Shape of the gradient.
    pub kind: GradientKind,
    /// Stop colours; same length as `stops`.
    pub colors: Vec<DlColor>,
    /// Stop positions in `[0, 1]`.
    pub stops: Vec<f64>,
    /// Behaviour outside `[0, 1]`.
    pub tile_mode: TileMode,
    /// Local matrix applied to the gradient.
    pub matrix: Affine,
}

impl Gradient {
    /// Creates a gradient with evenly spaced stops and no local matrix.
    #[must_use]
    pub fn new(kind: GradientKind, colors: Vec<DlColor>) -> Self {
        let last = colors.len().saturating_sub(1).max(1) as f64;
        let stops = (0..colors.len()).map(|i| i as f64 / last).collect();
        Self {
            kind,
            colors,
            stops,
            tile_mode: TileMode::Clamp,
            matrix: Affine::IDENTITY,
        }
    }

    /// Whether every stop colour is opaque.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.tile_mode != TileMode::Decal && self.colors.iter().all(|c| c.is_opaque())
    }
}

/// The source of colour for a paint, replacing its solid colour.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSource {
    /// A gradient.
    Gradient(Gradient),
    /// A tiled image.
    Image {
        /// The image.
        image: Arc<DlImage>,
        /// Horizontal tiling.
        horizontal: TileMode,
        /// Vertical tiling.
        vertical: TileMode,
        /// Sampling options.
        sampling: ImageSampling,
        /// Local matrix.
        matrix: Affine,
    },
    /// A runtime shader.
    RuntimeEffect(Arc<RuntimeEffect>),
}

impl ColorSource {
    /// Whether this source may be evaluated away from the thread that
    /// created it.
    #[must_use]
    pub fn is_thread_safe(&self) -> bool {
        match self {
            Self::Gradient(_) | Self::RuntimeEffect(_) => true,
            Self::Image { image, .. } => image.is_thread_safe(),
        }
    }
}
