// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared external resources referenced by records through handles.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{BezPath, PathEl, Point, Rect};

use crate::color::DlColor;
use crate::display_list::DisplayList;
use crate::effects::ImageFilter;
use crate::paint::VertexMode;

/// An image known to the embedder by id.
///
/// Pixels live elsewhere; a list only needs the size and whether the image
/// is bound to a GPU context (which makes it unsafe to use off-thread).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DlImage {
    id: u64,
    width: u32,
    height: u32,
    texture_backed: bool,
}

impl DlImage {
    /// A CPU-resident image, usable from any thread.
    #[must_use]
    pub const fn raster(id: u64, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            texture_backed: false,
        }
    }

    /// A GPU texture owned by one context.
    #[must_use]
    pub const fn texture(id: u64, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            texture_backed: true,
        }
    }

    /// Embedder-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(0, 0, width, height)`.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Whether the image is bound to a GPU context.
    #[must_use]
    pub const fn is_texture_backed(&self) -> bool {
        self.texture_backed
    }

    /// Whether the image may be drawn away from its creating thread.
    #[must_use]
    pub const fn is_thread_safe(&self) -> bool {
        !self.texture_backed
    }
}

/// A triangle mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct DlVertices {
    mode: VertexMode,
    positions: Vec<Point>,
    texture_coordinates: Option<Vec<Point>>,
    colors: Option<Vec<DlColor>>,
    indices: Option<Vec<u16>>,
    bounds: Rect,
}

impl DlVertices {
    /// Creates a mesh from vertex positions.
    #[must_use]
    pub fn new(mode: VertexMode, positions: Vec<Point>) -> Self {
        let bounds = bounds_of(&positions);
        Self {
            mode,
            positions,
            texture_coordinates: None,
            colors: None,
            indices: None,
            bounds,
        }
    }

    /// Attaches per-vertex texture coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the count differs from the vertex count.
    #[must_use]
    pub fn with_texture_coordinates(mut self, coords: Vec<Point>) -> Self {
        assert_eq!(
            coords.len(),
            self.positions.len(),
            "one texture coordinate per vertex"
        );
        self.texture_coordinates = Some(coords);
        self
    }

    /// Attaches per-vertex colours.
    ///
    /// # Panics
    ///
    /// Panics if the count differs from the vertex count.
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<DlColor>) -> Self {
        assert_eq!(colors.len(), self.positions.len(), "one colour per vertex");
        self.colors = Some(colors);
        self
    }

    /// Attaches an index buffer.
    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u16>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Primitive assembly mode.
    #[must_use]
    pub const fn mode(&self) -> VertexMode {
        self.mode
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Per-vertex texture coordinates, if any.
    #[must_use]
    pub fn texture_coordinates(&self) -> Option<&[Point]> {
        self.texture_coordinates.as_deref()
    }

    /// Index buffer, if any.
    #[must_use]
    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    /// Per-vertex colours, if any.
    #[must_use]
    pub fn colors(&self) -> Option<&[DlColor]> {
        self.colors.as_deref()
    }

    /// Bounds of all positions.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Shaped glyph run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlob {
    glyphs: Vec<u16>,
    positions: Vec<Point>,
    bounds: Rect,
}

impl TextBlob {
    /// Creates a blob from glyph ids, their origins and precomputed ink
    /// bounds relative to the blob origin.
    ///
    /// # Panics
    ///
    /// Panics if there is not exactly one position per glyph.
    #[must_use]
    pub fn new(glyphs: Vec<u16>, positions: Vec<Point>, bounds: Rect) -> Self {
        assert_eq!(glyphs.len(), positions.len(), "one position per glyph");
        Self {
            glyphs,
            positions,
            bounds,
        }
    }

    /// Glyph ids.
    #[must_use]
    pub fn glyphs(&self) -> &[u16] {
        &self.glyphs
    }

    /// Glyph origins relative to the draw origin.
    #[must_use]
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Ink bounds relative to the draw origin.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// A compiled runtime shader and its uniform values.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeEffect {
    /// Shader identifier.
    pub name: String,
    /// Uniform values in declaration order.
    pub uniforms: Vec<f32>,
}

pub(crate) fn bounds_of(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// A shared object owned by a record through a handle.
#[derive(Clone, Debug)]
pub(crate) enum Resource {
    Path(Arc<BezPath>),
    Image(Arc<DlImage>),
    Vertices(Arc<DlVertices>),
    TextBlob(Arc<TextBlob>),
    DisplayList(Arc<DisplayList>),
    ImageFilter(Arc<ImageFilter>),
    RuntimeEffect(Arc<RuntimeEffect>),
}

impl Resource {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Image(_) => "image",
            Self::Vertices(_) => "vertices",
            Self::TextBlob(_) => "text blob",
            Self::DisplayList(_) => "display list",
            Self::ImageFilter(_) => "image filter",
            Self::RuntimeEffect(_) => "runtime effect",
        }
    }
}

fn same<T: PartialEq + ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

// Geometry compares by bit pattern, like the record payloads that point at
// it: NaN equals itself and -0.0 differs from 0.0.

fn point_bits(p: Point) -> [u64; 2] {
    [p.x.to_bits(), p.y.to_bits()]
}

fn points_identical(a: &[Point], b: &[Point]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(a, b)| point_bits(*a) == point_bits(*b))
}

fn element_identical(a: &PathEl, b: &PathEl) -> bool {
    match (a, b) {
        (PathEl::MoveTo(a), PathEl::MoveTo(b)) | (PathEl::LineTo(a), PathEl::LineTo(b)) => {
            point_bits(*a) == point_bits(*b)
        }
        (PathEl::QuadTo(a0, a1), PathEl::QuadTo(b0, b1)) => {
            points_identical(&[*a0, *a1], &[*b0, *b1])
        }
        (PathEl::CurveTo(a0, a1, a2), PathEl::CurveTo(b0, b1, b2)) => {
            points_identical(&[*a0, *a1, *a2], &[*b0, *b1, *b2])
        }
        (PathEl::ClosePath, PathEl::ClosePath) => true,
        _ => false,
    }
}

fn paths_identical(a: &BezPath, b: &BezPath) -> bool {
    let (a, b) = (a.elements(), b.elements());
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| element_identical(a, b))
}

fn vertices_identical(a: &DlVertices, b: &DlVertices) -> bool {
    let coords = match (&a.texture_coordinates, &b.texture_coordinates) {
        (Some(a), Some(b)) => points_identical(a, b),
        (None, None) => true,
        _ => false,
    };
    a.mode == b.mode
        && points_identical(&a.positions, &b.positions)
        && coords
        && a.colors == b.colors
        && a.indices == b.indices
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Path(a), Self::Path(b)) => Arc::ptr_eq(a, b) || paths_identical(a, b),
            (Self::Image(a), Self::Image(b)) => same(a, b),
            (Self::Vertices(a), Self::Vertices(b)) => {
                Arc::ptr_eq(a, b) || vertices_identical(a, b)
            }
            (Self::TextBlob(a), Self::TextBlob(b)) => same(a, b),
            (Self::DisplayList(a), Self::DisplayList(b)) => same(a, b),
            (Self::ImageFilter(a), Self::ImageFilter(b)) => same(a, b),
            (Self::RuntimeEffect(a), Self::RuntimeEffect(b)) => same(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn texture_images_are_not_thread_safe() {
        assert!(DlImage::raster(1, 4, 4).is_thread_safe());
        assert!(!DlImage::texture(1, 4, 4).is_thread_safe());
        assert_eq!(DlImage::raster(1, 4, 2).bounds(), Rect::new(0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn vertex_bounds() {
        let v = DlVertices::new(
            VertexMode::Triangles,
            vec![Point::new(1.0, 5.0), Point::new(-2.0, 0.0), Point::new(3.0, 1.0)],
        );
        assert_eq!(v.bounds(), Rect::new(-2.0, 0.0, 3.0, 5.0));
    }

    #[test]
    fn resources_compare_by_value() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((4.0, 4.0));
        let a = Resource::Path(Arc::new(path.clone()));
        let b = Resource::Path(Arc::new(path));
        assert_eq!(a, b);
        let image = Resource::Image(Arc::new(DlImage::raster(7, 1, 1)));
        assert_ne!(a, image, "different kinds never compare equal");
    }

    #[test]
    fn path_geometry_compares_bitwise() {
        let path = |x: f64| {
            let mut path = BezPath::new();
            path.move_to((0.0, 0.0));
            path.quad_to((x, 1.0), (2.0, 2.0));
            path.close_path();
            Resource::Path(Arc::new(path))
        };
        assert_eq!(path(f64::NAN), path(f64::NAN), "NaN equals itself");
        assert_ne!(path(0.0), path(-0.0));
        assert_eq!(path(1.5), path(1.5));
    }

    #[test]
    fn vertex_geometry_compares_bitwise() {
        let mesh = |x: f64| {
            Resource::Vertices(Arc::new(
                DlVertices::new(
                    VertexMode::Triangles,
                    vec![Point::new(x, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
                )
                .with_texture_coordinates(vec![Point::ZERO; 3]),
            ))
        };
        assert_eq!(mesh(f64::NAN), mesh(f64::NAN));
        assert_ne!(mesh(0.0), mesh(-0.0));
        let plain = Resource::Vertices(Arc::new(DlVertices::new(
            VertexMode::Triangles,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
        )));
        assert_ne!(mesh(0.0), plain, "texture coordinates take part");
    }

    #[test]
    #[should_panic(expected = "one colour per vertex")]
    fn mismatched_vertex_colors() {
        let _ = DlVertices::new(VertexMode::Triangles, vec![Point::ZERO])
            .with_colors(vec![DlColor::RED, DlColor::BLUE]);
    }
}
