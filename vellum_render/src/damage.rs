// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use kurbo::Rect;
use vellum_core::DisplayList;

/// A region of the output that needs re-rendering.
///
/// Renderers turn this into the cull region for
/// [`DisplayList::dispatch_culled`] so only ops touching the damaged area
/// are replayed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Device-space rectangles that need redrawing.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Damage between two recordings of the same content.
    ///
    /// Structurally equal lists produce no damage; otherwise both lists'
    /// bounds are damaged, covering what disappeared and what appeared.
    #[must_use]
    pub fn between(old: &DisplayList, new: &DisplayList) -> Self {
        if old.equals(new) {
            return Self::None;
        }
        let mut damage = Self::None;
        damage.add_rect(old.bounds());
        damage.add_rect(new.bounds());
        damage
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds one damaged rectangle. Rects without area are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(rect),
            Self::None => *self = Self::Rects(alloc::vec![rect]),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// The single cull region covering this damage within `full`, or
    /// `None` when nothing needs drawing.
    #[must_use]
    pub fn cull_rect(&self, full: Rect) -> Option<Rect> {
        match self {
            Self::Full => Some(full),
            Self::None => None,
            Self::Rects(rects) => {
                let union = rects.iter().copied().reduce(|a, b| a.union(b))?;
                let clipped = union.intersect(full);
                (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::DisplayListBuilder;
    use vellum_core::color::DlColor;
    use vellum_core::receiver::DlOpReceiver;

    const SCREEN: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn merge_rules() {
        let mut d = DamageRegion::None;
        d.merge(&DamageRegion::Rects(alloc::vec![Rect::new(0.0, 0.0, 1.0, 1.0)]));
        d.merge(&DamageRegion::Rects(alloc::vec![Rect::new(5.0, 5.0, 6.0, 6.0)]));
        assert_eq!(d.cull_rect(SCREEN), Some(Rect::new(0.0, 0.0, 6.0, 6.0)));
        d.merge(&DamageRegion::None);
        assert!(matches!(&d, DamageRegion::Rects(r) if r.len() == 2));
        d.merge(&DamageRegion::Full);
        assert_eq!(d, DamageRegion::Full);
        assert_eq!(d.cull_rect(SCREEN), Some(SCREEN));
    }

    #[test]
    fn empty_damage_has_no_cull() {
        let mut d = DamageRegion::None;
        assert!(d.is_empty());
        assert_eq!(d.cull_rect(SCREEN), None);
        d.add_rect(Rect::new(3.0, 3.0, 3.0, 9.0));
        assert!(d.is_empty(), "zero-width rect is not damage");
        d.add_rect(Rect::new(200.0, 200.0, 210.0, 210.0));
        assert_eq!(d.cull_rect(SCREEN), None, "offscreen damage");
    }

    #[test]
    fn damage_between_lists() {
        let record = |color: DlColor, x: f64| {
            let mut b = DisplayListBuilder::default();
            b.set_color(color);
            b.draw_rect(Rect::new(x, 0.0, x + 10.0, 10.0));
            b.build().unwrap()
        };
        let a = record(DlColor::RED, 0.0);
        let same = record(DlColor::RED, 0.0);
        assert!(DamageRegion::between(&a, &same).is_empty());

        let moved = record(DlColor::RED, 50.0);
        let damage = DamageRegion::between(&a, &moved);
        assert_eq!(damage.cull_rect(SCREEN), Some(Rect::new(0.0, 0.0, 60.0, 10.0)));

        let recolored = record(DlColor::BLUE, 0.0);
        assert_eq!(
            DamageRegion::between(&a, &recolored).cull_rect(SCREEN),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
    }
}
