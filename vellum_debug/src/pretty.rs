// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable list dumps.
//!
//! [`PrettyPrintReceiver`] implements [`DlOpReceiver`](vellum_core::DlOpReceiver)
//! and writes one line per op to a [`Write`](std::io::Write) destination
//! (default: stderr), indented by save depth.

use std::io::Write;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};
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

use crate::recorder::{RecordedOp, record_ops};

/// Writes an indented op listing to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintReceiver<W: Write = Box<dyn Write>> {
    writer: W,
    depth: usize,
    expand_nested: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintReceiver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintReceiver")
            .field("depth", &self.depth)
            .field("expand_nested", &self.expand_nested)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintReceiver {
    /// Creates a receiver that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a receiver that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintReceiver<W> {
    /// Creates a receiver that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            depth: 0,
            expand_nested: false,
        }
    }

    /// Also lists the ops of nested display lists, one level deeper.
    #[must_use]
    pub fn expand_nested(mut self, expand: bool) -> Self {
        self.expand_nested = expand;
        self
    }

    /// Writes a header line followed by every op of `list`.
    pub fn print(&mut self, list: &DisplayList) {
        let bounds = list.bounds();
        let _ = writeln!(
            self.writer,
            "display list id={} ops={} bytes={} bounds=[{}, {}, {}, {}]",
            list.unique_id(),
            list.op_count(true),
            list.bytes(true),
            bounds.x0,
            bounds.y0,
            bounds.x1,
            bounds.y1,
        );
        list.dispatch(self);
    }

    /// Consumes the receiver and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn push_op(&mut self, op: RecordedOp) {
        if op == RecordedOp::Restore {
            self.depth = self.depth.saturating_sub(1);
        }
        let _ = writeln!(self.writer, "{:indent$}{op}", "", indent = self.depth * 2);
        match op {
            RecordedOp::Save | RecordedOp::SaveLayer { .. } => self.depth += 1,
            RecordedOp::DrawDisplayList { list, .. } if self.expand_nested => {
                self.depth += 1;
                list.dispatch(self);
                self.depth -= 1;
            }
            _ => {}
        }
    }
}

record_ops!(impl [W: Write] PrettyPrintReceiver<W>);
