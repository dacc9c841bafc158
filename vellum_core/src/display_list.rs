// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The finished, immutable display list.

use alloc::sync::Arc;
use core::fmt;
use core::mem::size_of;
use core::sync::atomic::{AtomicU64, Ordering};

use kurbo::Rect;

use crate::index::SpatialIndex;
use crate::metadata::Metadata;
use crate::storage::DlStorage;

static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique, non-zero id.
fn next_unique_id() -> u64 {
    loop {
        let id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

/// A recorded operation stream with its precomputed metadata.
///
/// Lists are created by [`DisplayListBuilder::build`] and shared as
/// `Arc<DisplayList>`. Nothing about a list changes after it is built; it
/// can be dispatched from several threads at once when
/// [`is_thread_safe`](Self::is_thread_safe) holds.
///
/// [`DisplayListBuilder::build`]: crate::builder::DisplayListBuilder::build
pub struct DisplayList {
    storage: DlStorage,
    metadata: Metadata,
    unique_id: u64,
    index: Option<Arc<dyn SpatialIndex>>,
}

impl fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayList")
            .field("unique_id", &self.unique_id)
            .field("bytes", &self.storage.used())
            .field("metadata", &self.metadata)
            .field("has_index", &self.index.is_some())
            .finish_non_exhaustive()
    }
}

impl DisplayList {
    pub(crate) fn new(
        storage: DlStorage,
        metadata: Metadata,
        index: Option<Arc<dyn SpatialIndex>>,
    ) -> Self {
        debug_assert_eq!(storage.used(), storage.allocated(), "storage is trimmed");
        Self {
            storage,
            metadata,
            unique_id: next_unique_id(),
            index,
        }
    }

    /// A list with no records.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(DlStorage::new(), Metadata::EMPTY, None)
    }

    /// Memory held by this list; with `nested`, including nested lists.
    ///
    /// The nested total saturates at `usize::MAX`.
    #[must_use]
    pub fn bytes(&self, nested: bool) -> usize {
        let own = size_of::<Self>() + self.storage.allocated();
        if nested {
            own.saturating_add(self.metadata.nested_byte_count)
        } else {
            own
        }
    }

    /// Number of records; with `nested`, including records of nested lists.
    ///
    /// The nested total saturates at `u32::MAX`.
    #[must_use]
    pub fn op_count(&self, nested: bool) -> u32 {
        if nested {
            self.metadata
                .op_count
                .saturating_add(self.metadata.nested_op_count)
        } else {
            self.metadata.op_count
        }
    }

    /// Number of drawing and save-layer records.
    #[must_use]
    pub fn render_op_count(&self) -> u32 {
        self.metadata.render_op_count
    }

    /// Id assigned at build time; never reused within a process.
    #[must_use]
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Conservative device bounds of everything drawn.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.metadata.bounds
    }

    /// Whether culled dispatch can use a spatial index.
    #[must_use]
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// The spatial index over draw-op bounds.
    #[must_use]
    pub fn index(&self) -> Option<&Arc<dyn SpatialIndex>> {
        self.index.as_ref()
    }

    /// Whether a group opacity can be applied op by op.
    #[must_use]
    pub fn can_apply_group_opacity(&self) -> bool {
        self.metadata.can_apply_group_opacity
    }

    /// Whether this list can be dispatched off the recording thread.
    #[must_use]
    pub fn is_thread_safe(&self) -> bool {
        self.metadata.is_thread_safe
    }

    /// Whether rendering this list can change a transparent-black
    /// destination.
    #[must_use]
    pub fn modifies_transparent_black(&self) -> bool {
        self.metadata.modifies_transparent_black
    }

    /// All aggregate facts at once.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn storage(&self) -> &DlStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn empty_list() {
        let list = DisplayList::empty();
        assert_eq!(list.op_count(true), 0);
        assert_eq!(list.render_op_count(), 0);
        assert_eq!(list.bounds(), Rect::ZERO);
        assert_eq!(list.bytes(false), size_of::<DisplayList>());
        assert!(list.can_apply_group_opacity());
        assert!(list.is_thread_safe());
        assert!(!list.modifies_transparent_black());
        assert!(!list.has_index());
    }

    #[test]
    fn unique_ids_differ() {
        let a = DisplayList::empty();
        let b = DisplayList::empty();
        assert_ne!(a.unique_id(), b.unique_id());
        assert_ne!(a.unique_id(), 0, "zero is never assigned");
    }

    #[test]
    fn unique_ids_increase() {
        let ids: Vec<u64> = (0..4).map(|_| DisplayList::empty().unique_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn nested_totals_saturate() {
        let metadata = Metadata {
            op_count: 3,
            nested_op_count: u32::MAX - 1,
            nested_byte_count: usize::MAX,
            ..Metadata::EMPTY
        };
        let list = DisplayList::new(DlStorage::new(), metadata, None);
        assert_eq!(list.op_count(false), 3);
        assert_eq!(list.op_count(true), u32::MAX);
        assert_eq!(list.bytes(true), usize::MAX);
    }

    #[test]
    fn lists_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DisplayList>();
        assert_send_sync::<Arc<DisplayList>>();
    }
}
