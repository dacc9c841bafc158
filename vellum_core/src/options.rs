// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Save-layer option flags.

bitflags::bitflags! {
    /// Modifiers attached to every save-layer record.
    ///
    /// Copied by value; equality is bitwise.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SaveLayerOptions: u32 {
        /// The layer is composited with the current paint attributes
        /// (opacity, blend mode, colour and image filters).
        const RENDERS_WITH_ATTRIBUTES = 1 << 0;
        /// Every op in the layer can take a group opacity individually, so
        /// a renderer may skip the offscreen pass. Computed by the builder.
        const CAN_DISTRIBUTE_OPACITY = 1 << 1;
    }
}

impl SaveLayerOptions {
    /// Layer composited with the paint attributes.
    pub const WITH_ATTRIBUTES: Self = Self::RENDERS_WITH_ATTRIBUTES;
    /// Layer composited with default attributes.
    pub const NO_ATTRIBUTES: Self = Self::empty();

    /// Whether the layer is composited with the paint attributes.
    #[inline]
    #[must_use]
    pub const fn renders_with_attributes(self) -> bool {
        self.contains(Self::RENDERS_WITH_ATTRIBUTES)
    }

    /// Whether a group opacity may be pushed down into the layer's ops.
    #[inline]
    #[must_use]
    pub const fn can_distribute_opacity(self) -> bool {
        self.contains(Self::CAN_DISTRIBUTE_OPACITY)
    }

    /// Returns a copy with `renders_with_attributes` set.
    #[inline]
    #[must_use]
    pub const fn with_renders_with_attributes(self) -> Self {
        self.union(Self::RENDERS_WITH_ATTRIBUTES)
    }

    /// Returns a copy with `can_distribute_opacity` set.
    #[inline]
    #[must_use]
    pub const fn with_can_distribute_opacity(self) -> Self {
        self.union(Self::CAN_DISTRIBUTE_OPACITY)
    }

    /// Returns a copy with every builder-computed optimization hint cleared.
    #[inline]
    #[must_use]
    pub const fn without_optimizations(self) -> Self {
        self.difference(Self::CAN_DISTRIBUTE_OPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert!(SaveLayerOptions::WITH_ATTRIBUTES.renders_with_attributes());
        assert!(!SaveLayerOptions::NO_ATTRIBUTES.renders_with_attributes());
        assert!(!SaveLayerOptions::WITH_ATTRIBUTES.can_distribute_opacity());
    }

    #[test]
    fn builders_are_independent() {
        let opts = SaveLayerOptions::NO_ATTRIBUTES.with_can_distribute_opacity();
        assert!(opts.can_distribute_opacity());
        assert!(!opts.renders_with_attributes());
        let opts = opts.with_renders_with_attributes();
        assert!(opts.renders_with_attributes());
        assert_eq!(opts.without_optimizations(), SaveLayerOptions::WITH_ATTRIBUTES);
    }

    #[test]
    fn equality_is_bitwise() {
        assert_eq!(
            SaveLayerOptions::from_bits_truncate(3),
            SaveLayerOptions::WITH_ATTRIBUTES.with_can_distribute_opacity()
        );
        assert_ne!(SaveLayerOptions::WITH_ATTRIBUTES, SaveLayerOptions::NO_ATTRIBUTES);
    }
}
