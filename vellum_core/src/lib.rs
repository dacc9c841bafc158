// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded rendering-command buffers.
//!
//! `vellum_core` holds a sequence of drawing operations captured once in a
//! compact binary form and replayed any number of times, from any number of
//! threads, optionally pruned against a cull region. It is `no_std`
//! compatible (with `alloc`) and contains no `unsafe` code.
//!
//! # Architecture
//!
//! ```text
//!   DisplayListBuilder ──(append records)──► DlStorage
//!          │                                    │
//!          └──── build() ── Metadata + RTree ───┤
//!                                               ▼
//!                                        Arc<DisplayList>
//!                                               │
//!              dispatch() / dispatch_culled()   │   equals()
//!                                               ▼
//!                                         DlOpReceiver
//! ```
//!
//! **[`op`]**: The closed set of operation kinds ([`OpType`](op::OpType)),
//! their fixed `Pod` payload layouts and the static table indexed by tag.
//!
//! **[`storage`]**: A single growable, 8-byte aligned arena of packed
//! records plus the table of shared resource handles those records own.
//!
//! **[`display_list`]**: The immutable [`DisplayList`] artifact and its
//! precomputed [`Metadata`](metadata::Metadata).
//!
//! **[`dispatch`]**: Unconditional and culled replay into a
//! [`DlOpReceiver`](receiver::DlOpReceiver).
//!
//! **[`receiver`]**: The receiver trait; every method defaults to a no-op.
//!
//! **[`tracker`]**: [`StateTracker`](tracker::StateTracker), a receiver
//! that follows attributes, transforms and clips and computes conservative
//! device bounds for each drawing call.
//!
//! **[`index`]**: The [`SpatialIndex`](index::SpatialIndex) consumed by
//! culled dispatch and the bulk-loaded [`RTree`](index::RTree) the builder
//! produces.
//!
//! **[`builder`]**: [`DisplayListBuilder`](builder::DisplayListBuilder),
//! which records calls and finalizes them into a [`DisplayList`].
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

/// Declares a fieldless enum with explicit `u32` encodings and the
/// `to_raw`/`from_raw` pair used by the record codec.
macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )*
        }

        impl $name {
            /// Returns the encoded value of this variant.
            #[inline]
            #[must_use]
            pub const fn to_raw(self) -> u32 {
                self as u32
            }

            /// Decodes a value produced by [`to_raw`](Self::to_raw).
            #[must_use]
            pub const fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

pub mod builder;
pub mod color;
pub mod dispatch;
pub mod display_list;
pub mod effects;
pub mod equality;
pub mod index;
pub mod metadata;
pub mod op;
pub mod options;
pub mod paint;
pub mod receiver;
pub mod resource;
pub mod storage;
pub mod tracker;
pub mod transform;

#[cfg(test)]
mod testing;

pub use builder::{BuildError, BuilderConfig, DisplayListBuilder};
pub use display_list::DisplayList;
pub use receiver::DlOpReceiver;
