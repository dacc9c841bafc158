// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregate facts computed once while recording.

use kurbo::Rect;

use crate::index::overlaps;

/// Facts about a finished list, computed by the builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metadata {
    /// Records in this list, excluding the contents of nested lists.
    pub op_count: u32,
    /// Drawing records plus save-layer records.
    pub render_op_count: u32,
    /// Records inside nested lists, recursively.
    pub nested_op_count: u32,
    /// Bytes held by nested lists, recursively.
    pub nested_byte_count: usize,
    /// Union of the device bounds of every drawing op.
    pub bounds: Rect,
    /// Whether a group opacity can be applied op by op.
    pub can_apply_group_opacity: bool,
    /// Whether every referenced resource is safe to use off the recording
    /// thread.
    pub is_thread_safe: bool,
    /// Whether rendering can change a transparent-black destination.
    pub modifies_transparent_black: bool,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Metadata {
    /// Metadata of a list with no records.
    pub const EMPTY: Self = Self {
        op_count: 0,
        render_op_count: 0,
        nested_op_count: 0,
        nested_byte_count: 0,
        bounds: Rect::ZERO,
        can_apply_group_opacity: true,
        is_thread_safe: true,
        modifies_transparent_black: false,
    };
}

/// Opacity and transparency bookkeeping for the root or one open layer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayerAccumulator {
    bounds: Option<Rect>,
    opacity_compatible: bool,
    affects_transparent: bool,
}

impl Default for LayerAccumulator {
    fn default() -> Self {
        Self {
            bounds: None,
            opacity_compatible: true,
            affects_transparent: false,
        }
    }
}

impl LayerAccumulator {
    /// Accounts for one op drawn into this layer.
    ///
    /// Group opacity distributes only while ops are individually compatible
    /// and no two of them overlap.
    pub(crate) fn add_op(&mut self, bounds: Rect, compatible: bool, modifies_transparent: bool) {
        self.affects_transparent |= modifies_transparent;
        if !compatible {
            self.opacity_compatible = false;
        }
        let has_area = bounds.width() > 0.0 && bounds.height() > 0.0;
        if !has_area {
            return;
        }
        match self.bounds {
            Some(prev) => {
                if self.opacity_compatible && overlaps(prev, bounds) {
                    self.opacity_compatible = false;
                }
                self.bounds = Some(prev.union(bounds));
            }
            None => self.bounds = Some(bounds),
        }
    }

    pub(crate) fn opacity_compatible(&self) -> bool {
        self.opacity_compatible
    }

    pub(crate) fn affects_transparent(&self) -> bool {
        self.affects_transparent
    }

    /// Union of the op bounds, or zero when nothing with area was drawn.
    pub(crate) fn bounds(&self) -> Rect {
        self.bounds.unwrap_or(Rect::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_compatible_ops_keep_opacity() {
        let mut acc = LayerAccumulator::default();
        acc.add_op(Rect::new(0.0, 0.0, 10.0, 10.0), true, false);
        acc.add_op(Rect::new(20.0, 0.0, 30.0, 10.0), true, false);
        assert!(acc.opacity_compatible());
        assert_eq!(acc.bounds(), Rect::new(0.0, 0.0, 30.0, 10.0));
    }

    #[test]
    fn overlap_breaks_opacity() {
        let mut acc = LayerAccumulator::default();
        acc.add_op(Rect::new(0.0, 0.0, 10.0, 10.0), true, false);
        acc.add_op(Rect::new(5.0, 5.0, 15.0, 15.0), true, false);
        assert!(!acc.opacity_compatible());
    }

    #[test]
    fn incompatible_op_breaks_opacity() {
        let mut acc = LayerAccumulator::default();
        acc.add_op(Rect::new(0.0, 0.0, 10.0, 10.0), false, true);
        assert!(!acc.opacity_compatible());
        assert!(acc.affects_transparent());
    }

    #[test]
    fn empty_layer_defaults() {
        let acc = LayerAccumulator::default();
        assert!(acc.opacity_compatible());
        assert!(!acc.affects_transparent());
        assert_eq!(acc.bounds(), Rect::ZERO);
        assert_eq!(Metadata::default(), Metadata::EMPTY);
    }
}
