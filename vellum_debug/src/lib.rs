// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for vellum display lists.
//!
//! This crate provides [`DlOpReceiver`](vellum_core::DlOpReceiver)
//! implementations for development and test diagnostics:
//!
//! - [`recorder::OpRecorder`] keeps every call as an owned
//!   [`recorder::RecordedOp`], for assertions on dispatch output.
//! - [`pretty::PrettyPrintReceiver`] writes an indented listing, one line
//!   per op.
//! - [`json::export`] writes a list's metadata and ops as JSON.

pub mod json;
pub mod pretty;
pub mod recorder;
