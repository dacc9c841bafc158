// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans and damage regions for vellum display lists.
//!
//! This crate sits between recorded [`DisplayList`]s and a renderer:
//!
//! - [`PlanRecorder`] is a receiver that flattens a list, including nested
//!   lists, into a [`RenderPlan`] of [`RenderItem`]s with device bounds,
//!   transforms and accumulated opacity.
//! - [`DamageRegion`] tracks what changed between frames and turns it into
//!   the cull region handed to culled dispatch.
//!
//! [`DisplayList`]: vellum_core::DisplayList

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;

pub use damage::DamageRegion;
pub use plan::{PlanRecorder, RenderItem, RenderPlan};
