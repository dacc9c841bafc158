// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural equality of display lists.
//!
//! Two lists are equal when they hold the same records in the same order
//! with equal parameters. Plain payloads compare bitwise; records holding a
//! shared resource compare the rest of their payload bitwise and the
//! resources by value. Unique ids, allocation sizes and resource identity
//! never matter.

use core::mem::size_of;
use core::ptr;

use crate::display_list::DisplayList;
use crate::op::{Dispose, HEADER_SIZE};
use crate::storage::{DlStorage, Record};

impl DisplayList {
    /// Whether `self` and `other` encode the same operation stream.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        if self.op_count(false) != other.op_count(false)
            || self.storage().used() != other.storage().used()
        {
            return false;
        }
        let (a, b) = (self.storage(), other.storage());
        a.records()
            .zip(b.records())
            .all(|(ra, rb)| records_equal(a, &ra, b, &rb))
    }
}

fn records_equal(a: &DlStorage, ra: &Record<'_>, b: &DlStorage, rb: &Record<'_>) -> bool {
    if ra.op != rb.op || ra.bytes.len() != rb.bytes.len() {
        return false;
    }
    match ra.op.info().dispose {
        Dispose::Trivial => ra.bytes == rb.bytes,
        Dispose::ReleaseHandle => {
            // The handle is the first payload word; everything after it is
            // plain data.
            let rest = HEADER_SIZE + size_of::<u32>();
            ra.bytes[rest..] == rb.bytes[rest..]
                && a.resource(ra.handle()) == b.resource(rb.handle())
        }
    }
}

impl PartialEq for DisplayList {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use kurbo::{BezPath, Point, Rect};

    use crate::builder::DisplayListBuilder;
    use crate::color::DlColor;
    use crate::display_list::DisplayList;
    use crate::receiver::DlOpReceiver;
    use crate::resource::DlImage;

    fn triangle() -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((5.0, 8.0));
        path.close_path();
        path
    }

    fn record(color: DlColor, path: Arc<BezPath>) -> Arc<DisplayList> {
        let mut builder = DisplayListBuilder::default();
        builder.set_color(color);
        builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        builder.draw_path(&path);
        builder.draw_image(
            &Arc::new(DlImage::raster(3, 16, 16)),
            Point::new(2.0, 2.0),
            crate::paint::ImageSampling::Linear,
            false,
        );
        builder.build().unwrap()
    }

    #[test]
    fn equality_is_reflexive() {
        let list = record(DlColor::RED, Arc::new(triangle()));
        assert!(list.equals(&list));
        assert_eq!(*list, *list);
    }

    #[test]
    fn independent_builds_are_equal() {
        let a = record(DlColor::RED, Arc::new(triangle()));
        let b = record(DlColor::RED, Arc::new(triangle()));
        let c = record(DlColor::RED, Arc::new(triangle()));
        assert_ne!(a.unique_id(), b.unique_id());
        assert!(a.equals(&b) && b.equals(&a), "symmetric");
        assert!(b.equals(&c) && a.equals(&c), "transitive");
    }

    #[test]
    fn parameter_change_breaks_equality() {
        let a = record(DlColor::RED, Arc::new(triangle()));
        let b = record(DlColor::BLUE, Arc::new(triangle()));
        assert!(!a.equals(&b));
        assert!(!b.equals(&a));
    }

    #[test]
    fn resources_compare_by_value() {
        let mut other = triangle();
        other.line_to((1.0, 1.0));
        let a = record(DlColor::RED, Arc::new(triangle()));
        let b = record(DlColor::RED, Arc::new(other));
        assert!(!a.equals(&b), "different path contents");
    }

    #[test]
    fn op_count_mismatch_short_circuits() {
        let a = record(DlColor::RED, Arc::new(triangle()));
        let empty = DisplayList::empty();
        assert!(!a.equals(&empty));
        assert!(DisplayList::empty().equals(&empty));
    }
}
