// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Record storage.
//!
//! [`DlStorage`] is one growable, 8-byte aligned arena of packed records
//! plus a table of the shared resources those records own. Records are
//! appended by the builder, moved exactly once into a finished list and
//! walked in order by dispatch, equality and teardown.
//!
//! The arena is a `Vec<u64>` viewed as bytes, so every record offset is
//! 8-byte aligned and payloads can be borrowed in place.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::mem::{self, size_of};

use bytemuck::Pod;
use kurbo::BezPath;

use crate::display_list::DisplayList;
use crate::effects::ImageFilter;
use crate::op::{Dispose, HEADER_SIZE, OpHeader, OpType, RECORD_ALIGN};
use crate::resource::{DlImage, DlVertices, Resource, RuntimeEffect, TextBlob};

/// Growth never allocates less than one page.
const PAGE_SIZE: usize = 4096;

/// Why storage refused a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// The arena could not grow to hold `requested` more bytes.
    Exhausted {
        /// Size of the refused allocation.
        requested: usize,
    },
    /// A single record would exceed the 32-bit size field.
    RecordTooLarge {
        /// Size the record would have had.
        size: usize,
    },
    /// The storage was disabled by an earlier failure or moved from.
    Disabled,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { requested } => {
                write!(f, "display list storage exhausted allocating {requested} bytes")
            }
            Self::RecordTooLarge { size } => {
                write!(f, "display list record of {size} bytes exceeds the record size limit")
            }
            Self::Disabled => f.write_str("display list storage is disabled"),
        }
    }
}

impl core::error::Error for StorageError {}

/// Packed records and the resources they own.
pub(crate) struct DlStorage {
    words: Vec<u64>,
    used: usize,
    allocated: usize,
    disabled: bool,
    resources: Vec<Option<Resource>>,
}

impl fmt::Debug for DlStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DlStorage")
            .field("used", &self.used)
            .field("allocated", &self.allocated)
            .field("disabled", &self.disabled)
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl DlStorage {
    pub(crate) const fn new() -> Self {
        Self {
            words: Vec::new(),
            used: 0,
            allocated: 0,
            disabled: false,
            resources: Vec::new(),
        }
    }

    /// Bytes written so far.
    pub(crate) const fn used(&self) -> usize {
        self.used
    }

    /// Bytes reserved.
    pub(crate) const fn allocated(&self) -> usize {
        self.allocated
    }

    /// `false` once a growth failure or a move has disabled the storage.
    pub(crate) const fn is_valid(&self) -> bool {
        !self.disabled
    }

    /// The written region.
    pub(crate) fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.used]
    }

    /// Reserves `bytes` zeroed bytes at the write cursor.
    ///
    /// The returned region is only valid until the next call; growth may
    /// move the arena.
    pub(crate) fn alloc(&mut self, bytes: usize) -> Result<&mut [u8], StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        debug_assert!(bytes % RECORD_ALIGN == 0, "allocations keep 8-byte alignment");
        let end = self
            .used
            .checked_add(bytes)
            .ok_or(StorageError::Exhausted { requested: bytes })?;
        if end > self.allocated {
            self.grow(end, bytes)?;
        }
        let start = self.used;
        self.used = end;
        Ok(&mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[start..end])
    }

    fn grow(&mut self, needed: usize, requested: usize) -> Result<(), StorageError> {
        let target = needed
            .checked_next_multiple_of(PAGE_SIZE)
            .map(|paged| paged.max(self.allocated.saturating_mul(2)));
        let reserved = target.and_then(|target| {
            let words = target / size_of::<u64>();
            self.words
                .try_reserve_exact(words - self.words.len())
                .ok()
                .map(|()| (target, words))
        });
        let Some((target, words)) = reserved else {
            self.disabled = true;
            log::error!(
                "display list storage could not grow from {} bytes by {requested}; builder disabled",
                self.allocated
            );
            return Err(StorageError::Exhausted { requested });
        };
        self.words.resize(words, 0);
        self.allocated = target;
        Ok(())
    }

    /// Appends one record: header, `payload` and `trailing` zeroed bytes for
    /// the caller to fill. Returns the record offset and the trailing region.
    pub(crate) fn push_op<T: Pod>(
        &mut self,
        op: OpType,
        payload: &T,
        trailing: usize,
    ) -> Result<(usize, &mut [u8]), StorageError> {
        debug_assert_eq!(size_of::<T>(), op.info().base_size, "{op:?} payload type");
        let base = HEADER_SIZE + size_of::<T>();
        let size = base
            .checked_add(trailing)
            .and_then(|s| s.checked_next_multiple_of(RECORD_ALIGN))
            .ok_or(StorageError::RecordTooLarge { size: usize::MAX })?;
        let size32 = u32::try_from(size).map_err(|_| StorageError::RecordTooLarge { size })?;
        let offset = self.used;
        let record = self.alloc(size)?;
        let header = OpHeader {
            tag: op as u8,
            _reserved: [0; 3],
            size: size32,
        };
        record[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        record[HEADER_SIZE..base].copy_from_slice(bytemuck::bytes_of(payload));
        Ok((offset, &mut record[base..base + trailing]))
    }

    /// Takes shared ownership of `resource` and returns its handle.
    pub(crate) fn push_resource(&mut self, resource: Resource) -> Result<u32, StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        let handle = u32::try_from(self.resources.len()).map_err(|_| {
            self.disabled = true;
            StorageError::Exhausted { requested: 1 }
        })?;
        self.resources.push(Some(resource));
        Ok(handle)
    }

    /// Mutable view of the payload of the record at `offset`.
    pub(crate) fn payload_mut<T: Pod>(&mut self, offset: usize) -> &mut T {
        let start = offset + HEADER_SIZE;
        bytemuck::from_bytes_mut(
            &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[start..start + size_of::<T>()],
        )
    }

    /// Shrinks the reservation to the written size.
    pub(crate) fn trim(&mut self) {
        self.words.truncate(self.used / size_of::<u64>());
        self.words.shrink_to_fit();
        self.allocated = self.used;
    }

    /// Moves the contents out, leaving this storage empty and disabled.
    pub(crate) fn take(&mut self) -> Self {
        let taken = Self {
            words: mem::take(&mut self.words),
            used: self.used,
            allocated: self.allocated,
            disabled: self.disabled,
            resources: mem::take(&mut self.resources),
        };
        self.used = 0;
        self.allocated = 0;
        self.disabled = true;
        taken
    }

    /// Iterates the records in encoding order.
    pub(crate) fn records(&self) -> Records<'_> {
        Records::new(self.bytes())
    }

    /// Resolves a handle.
    ///
    /// # Panics
    ///
    /// Panics on a dangling handle, which only a corrupt record can hold.
    pub(crate) fn resource(&self, handle: u32) -> &Resource {
        self.resources
            .get(handle as usize)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("corrupt display list record: dangling handle {handle}"))
    }
}

macro_rules! typed_resource {
    ($($fn_name:ident => $variant:ident($ty:ty);)*) => {
        impl DlStorage {
            $(
                pub(crate) fn $fn_name(&self, handle: u32) -> &Arc<$ty> {
                    match self.resource(handle) {
                        Resource::$variant(value) => value,
                        other => mismatched(handle, stringify!($variant), other),
                    }
                }
            )*
        }
    };
}

typed_resource! {
    path => Path(BezPath);
    image => Image(DlImage);
    vertices => Vertices(DlVertices);
    text_blob => TextBlob(TextBlob);
    display_list => DisplayList(DisplayList);
    image_filter => ImageFilter(ImageFilter);
    runtime_effect => RuntimeEffect(RuntimeEffect);
}

#[cold]
fn mismatched(handle: u32, expected: &str, found: &Resource) -> ! {
    panic!(
        "corrupt display list record: handle {handle} is a {}, expected {expected}",
        found.kind()
    )
}

impl Drop for DlStorage {
    fn drop(&mut self) {
        if self.disabled {
            return;
        }
        let bytes = &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.used];
        for handle in owned_handles(bytes) {
            let released = self
                .resources
                .get_mut(handle as usize)
                .and_then(Option::take);
            drop(released);
        }
    }
}

/// Handles held by the records in `bytes`, in encoding order.
fn owned_handles(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    Records::new(bytes)
        .filter(|record| record.op.info().dispose == Dispose::ReleaseHandle)
        .map(|record| record.handle())
}

// ----- //

/// One decoded record.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Record<'a> {
    pub(crate) offset: usize,
    pub(crate) op: OpType,
    /// The whole record, header included.
    pub(crate) bytes: &'a [u8],
}

impl<'a> Record<'a> {
    /// The fixed payload.
    pub(crate) fn payload<T: Pod>(&self) -> &'a T {
        bytemuck::from_bytes(&self.bytes[HEADER_SIZE..HEADER_SIZE + size_of::<T>()])
    }

    /// Bytes after the fixed payload `T`, padding included.
    pub(crate) fn trailing<T: Pod>(&self) -> &'a [u8] {
        &self.bytes[HEADER_SIZE + size_of::<T>()..]
    }

    /// The resource handle of a handle-carrying record.
    pub(crate) fn handle(&self) -> u32 {
        *self.payload::<u32>()
    }
}

/// Splits `count` values of `E` off the front of a trailing region.
///
/// # Panics
///
/// Panics when the region is too short, which only a corrupt record causes.
pub(crate) fn split_array<E: Pod>(bytes: &[u8], count: usize) -> (&[E], &[u8]) {
    let len = count
        .checked_mul(size_of::<E>())
        .filter(|len| *len <= bytes.len())
        .unwrap_or_else(|| {
            panic!("corrupt display list record: {count} trailing values overrun the record")
        });
    let (head, tail) = bytes.split_at(len);
    (bytemuck::cast_slice(head), tail)
}

/// Walks packed records up to the used boundary.
#[derive(Clone, Debug)]
pub(crate) struct Records<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Records<'a> {
    pub(crate) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        let offset = self.offset;
        let remaining = self.bytes.len().checked_sub(offset)?;
        if remaining == 0 {
            return None;
        }
        assert!(
            remaining >= HEADER_SIZE,
            "corrupt display list: record header at byte {offset} overruns the used boundary"
        );
        let header: OpHeader = *bytemuck::from_bytes(&self.bytes[offset..offset + HEADER_SIZE]);
        let Some(op) = OpType::from_tag(header.tag) else {
            panic!("corrupt display list: unknown op tag {} at byte {offset}", header.tag);
        };
        let size = header.size as usize;
        assert!(
            size >= HEADER_SIZE + op.info().base_size && size % RECORD_ALIGN == 0 && size <= remaining,
            "corrupt display list: {op:?} record at byte {offset} has size {size} with {remaining} bytes remaining"
        );
        self.offset = offset + size;
        Some(Record {
            offset,
            op,
            bytes: &self.bytes[offset..offset + size],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{HandleOp, PointsOp, RectOp, WordOp};

    #[test]
    fn records_are_packed_and_aligned() {
        let mut storage = DlStorage::new();
        storage
            .push_op(OpType::SetColor, &WordOp::new(0xFF00_00FF), 0)
            .unwrap();
        storage
            .push_op(OpType::DrawRect, &RectOp { rect: [0.0, 0.0, 4.0, 4.0] }, 0)
            .unwrap();
        storage.push_op(OpType::Save, &(), 0).unwrap();
        let ops: Vec<_> = storage.records().map(|r| (r.offset, r.op)).collect();
        assert_eq!(
            ops,
            [(0, OpType::SetColor), (16, OpType::DrawRect), (56, OpType::Save)]
        );
        assert_eq!(storage.used(), 64);
        let rect = storage.records().nth(1).unwrap();
        assert_eq!(rect.payload::<RectOp>().rect, [0.0, 0.0, 4.0, 4.0]);
    }

    #[test]
    fn trailing_data_is_padded() {
        let mut storage = DlStorage::new();
        let points = PointsOp { count: 0, _pad: 0 };
        let (_, trailing) = storage.push_op(OpType::DrawPoints, &points, 12).unwrap();
        assert_eq!(trailing.len(), 12);
        assert_eq!(storage.used(), 8 + 8 + 16);
    }

    #[test]
    fn growth_is_geometric_and_page_sized() {
        let points = PointsOp { count: 0, _pad: 0 };
        let mut storage = DlStorage::new();
        storage.push_op(OpType::Save, &(), 0).unwrap();
        assert_eq!(storage.allocated(), PAGE_SIZE);
        storage
            .push_op(OpType::DrawPoints, &points, PAGE_SIZE)
            .unwrap();
        assert_eq!(storage.allocated(), 2 * PAGE_SIZE);
        storage
            .push_op(OpType::DrawPoints, &points, PAGE_SIZE)
            .unwrap();
        assert_eq!(storage.allocated(), 4 * PAGE_SIZE);
        assert_eq!(storage.used(), 8 + 2 * (8 + 8 + PAGE_SIZE));
        assert_eq!(storage.records().count(), 3);
    }

    #[test]
    fn trim_matches_used() {
        let mut storage = DlStorage::new();
        storage.push_op(OpType::Restore, &(), 0).unwrap();
        storage.trim();
        assert_eq!(storage.used(), storage.allocated());
        assert_eq!(storage.records().count(), 1);
    }

    #[test]
    fn exhaustion_disables_storage() {
        let mut storage = DlStorage::new();
        let err = storage.alloc((usize::MAX / 2) & !7).unwrap_err();
        assert!(matches!(err, StorageError::Exhausted { .. }), "got {err:?}");
        assert!(!storage.is_valid());
        assert_eq!(storage.alloc(8).unwrap_err(), StorageError::Disabled);
        assert_eq!(storage.used(), 0, "a failed write leaves nothing decodable");
    }

    #[test]
    fn take_moves_contents_and_disables_source() {
        let mut storage = DlStorage::new();
        storage.push_op(OpType::Save, &(), 0).unwrap();
        let taken = storage.take();
        assert_eq!(taken.records().count(), 1);
        assert!(taken.is_valid());
        assert!(!storage.is_valid());
        assert_eq!(storage.used(), 0);
        assert!(storage.push_op(OpType::Save, &(), 0).is_err());
    }

    #[test]
    fn teardown_releases_handles_once() {
        let image = Arc::new(DlImage::raster(1, 2, 2));
        let mut storage = DlStorage::new();
        for _ in 0..3 {
            let handle = storage.push_resource(Resource::Image(image.clone())).unwrap();
            storage
                .push_op(OpType::SetRuntimeEffectColorSource, &HandleOp::new(handle), 0)
                .unwrap();
        }
        assert_eq!(Arc::strong_count(&image), 4);
        drop(storage);
        assert_eq!(Arc::strong_count(&image), 1);
    }

    #[test]
    fn teardown_follows_encoding_order() {
        let mut storage = DlStorage::new();
        let handles: Vec<u32> = (0..3)
            .map(|id| {
                storage
                    .push_resource(Resource::Image(Arc::new(DlImage::raster(id, 1, 1))))
                    .unwrap()
            })
            .collect();
        storage.push_op(OpType::Save, &(), 0).unwrap();
        for handle in [handles[2], handles[0], handles[1]] {
            storage
                .push_op(OpType::SetRuntimeEffectColorSource, &HandleOp::new(handle), 0)
                .unwrap();
        }
        let order: Vec<u32> = owned_handles(storage.bytes()).collect();
        assert_eq!(order, [handles[2], handles[0], handles[1]]);
    }

    #[test]
    fn typed_lookup() {
        let mut storage = DlStorage::new();
        let handle = storage
            .push_resource(Resource::Image(Arc::new(DlImage::raster(9, 1, 1))))
            .unwrap();
        assert_eq!(storage.image(handle).id(), 9);
    }

    #[test]
    #[should_panic(expected = "is a image, expected Path")]
    fn handle_of_wrong_kind_is_fatal() {
        let mut storage = DlStorage::new();
        let handle = storage
            .push_resource(Resource::Image(Arc::new(DlImage::raster(9, 1, 1))))
            .unwrap();
        let _ = storage.path(handle);
    }

    #[test]
    #[should_panic(expected = "overruns the used boundary")]
    fn truncated_header_is_fatal() {
        let bytes = [0_u8; 4];
        let _ = Records::new(&bytes).count();
    }

    #[test]
    #[should_panic(expected = "unknown op tag 200")]
    fn unknown_tag_is_fatal() {
        let mut bytes = [0_u64; 2];
        let header = OpHeader {
            tag: 200,
            _reserved: [0; 3],
            size: 16,
        };
        bytemuck::cast_slice_mut::<u64, u8>(&mut bytes)[..8]
            .copy_from_slice(bytemuck::bytes_of(&header));
        let _ = Records::new(bytemuck::cast_slice(&bytes)).count();
    }

    #[test]
    #[should_panic(expected = "DrawRect record at byte 0 has size 16")]
    fn short_record_is_fatal() {
        let mut bytes = [0_u64; 2];
        let header = OpHeader {
            tag: OpType::DrawRect as u8,
            _reserved: [0; 3],
            size: 16,
        };
        bytemuck::cast_slice_mut::<u64, u8>(&mut bytes)[..8]
            .copy_from_slice(bytemuck::bytes_of(&header));
        let _ = Records::new(bytemuck::cast_slice(&bytes)).count();
    }
}
