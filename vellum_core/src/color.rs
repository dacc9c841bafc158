// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed colours and blend modes.

use bytemuck::{Pod, Zeroable};

/// A non-premultiplied ARGB colour packed as `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct DlColor(pub u32);

impl DlColor {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque green.
    pub const GREEN: Self = Self(0xFF00_FF00);
    /// Opaque blue.
    pub const BLUE: Self = Self(0xFF00_00FF);

    /// Packs four 8-bit channels.
    #[inline]
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Alpha channel.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "the shift leaves 8 bits")]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns this colour with its alpha replaced.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }

    /// `true` when alpha is zero.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.alpha() == 0
    }

    /// `true` when alpha is 255.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0xFF
    }
}

raw_enum! {
    /// Porter-Duff and separable/non-separable blend modes, in Skia order.
    #[derive(Default)]
    pub enum BlendMode {
        /// `r = 0`
        Clear = 0,
        /// `r = s`
        Src = 1,
        /// `r = d`
        Dst = 2,
        /// `r = s + (1-sa)*d`
        #[default]
        SrcOver = 3,
        /// `r = d + (1-da)*s`
        DstOver = 4,
        /// `r = s * da`
        SrcIn = 5,
        /// `r = d * sa`
        DstIn = 6,
        /// `r = s * (1-da)`
        SrcOut = 7,
        /// `r = d * (1-sa)`
        DstOut = 8,
        /// `r = s*da + d*(1-sa)`
        SrcATop = 9,
        /// `r = d*sa + s*(1-da)`
        DstATop = 10,
        /// `r = s*(1-da) + d*(1-sa)`
        Xor = 11,
        /// `r = min(s + d, 1)`
        Plus = 12,
        /// `r = s*d`
        Modulate = 13,
        /// `r = s + d - s*d`
        Screen = 14,
        /// Multiply or screen, depending on destination.
        Overlay = 15,
        /// Darker of source and destination.
        Darken = 16,
        /// Lighter of source and destination.
        Lighten = 17,
        /// Brighten destination to reflect source.
        ColorDodge = 18,
        /// Darken destination to reflect source.
        ColorBurn = 19,
        /// Multiply or screen, depending on source.
        HardLight = 20,
        /// Lighten or darken, depending on source.
        SoftLight = 21,
        /// Subtract darker from lighter with higher contrast.
        Difference = 22,
        /// Subtract darker from lighter with lower contrast.
        Exclusion = 23,
        /// `r = s*(1-da) + d*(1-sa) + s*d`
        Multiply = 24,
        /// Hue of source with saturation and luminosity of destination.
        Hue = 25,
        /// Saturation of source with hue and luminosity of destination.
        Saturation = 26,
        /// Hue and saturation of source with luminosity of destination.
        Color = 27,
        /// Luminosity of source with hue and saturation of destination.
        Luminosity = 28,
    }
}

impl BlendMode {
    /// Whether drawing a non-transparent source with this mode onto a
    /// transparent-black destination can produce a non-transparent result.
    #[must_use]
    pub const fn keeps_source_over_transparent(self) -> bool {
        !matches!(
            self,
            Self::Clear
                | Self::Dst
                | Self::SrcIn
                | Self::DstIn
                | Self::DstOut
                | Self::SrcATop
                | Self::Modulate
        )
    }

    /// Whether a group opacity can be folded into each draw using this mode.
    #[must_use]
    pub const fn is_opacity_compatible(self) -> bool {
        matches!(self, Self::SrcOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_packing() {
        let c = DlColor::from_argb(0x80, 0x11, 0x22, 0x33);
        assert_eq!(c, DlColor(0x8011_2233));
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.with_alpha(0xFF), DlColor(0xFF11_2233));
    }

    #[test]
    fn transparency_predicates() {
        assert!(DlColor::TRANSPARENT.is_transparent());
        assert!(DlColor::RED.is_opaque());
        assert!(!DlColor::RED.with_alpha(1).is_opaque());
    }

    #[test]
    fn blend_raw_round_trip_covers_every_mode() {
        for raw in 0..29 {
            let mode = BlendMode::from_raw(raw).expect("29 blend modes");
            assert_eq!(mode.to_raw(), raw);
        }
        assert!(BlendMode::from_raw(29).is_none());
    }

    #[test]
    fn transparent_black_classification() {
        assert!(BlendMode::SrcOver.keeps_source_over_transparent());
        assert!(BlendMode::Src.keeps_source_over_transparent());
        assert!(BlendMode::Multiply.keeps_source_over_transparent());
        assert!(!BlendMode::SrcIn.keeps_source_over_transparent());
        assert!(!BlendMode::DstOut.keeps_source_over_transparent());
        assert!(!BlendMode::Clear.keeps_source_over_transparent());
    }
}
