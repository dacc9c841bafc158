// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test receivers.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::color::{BlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::ImageFilter;
use crate::options::SaveLayerOptions;
use crate::paint::ClipOp;
use crate::receiver::DlOpReceiver;

/// Logs the calls it receives as short strings; other calls are dropped.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub(crate) calls: Vec<String>,
    /// Stop after this many logged calls.
    pub(crate) limit: Option<usize>,
}

impl CallLog {
    pub(crate) fn draws(&self) -> usize {
        self.calls.iter().filter(|c| c.starts_with("draw")).count()
    }
}

impl DlOpReceiver for CallLog {
    fn should_stop(&self) -> bool {
        self.limit.is_some_and(|limit| self.calls.len() >= limit)
    }

    fn set_color(&mut self, color: DlColor) {
        self.calls.push(format!("set_color {:08x}", color.0));
    }

    fn save(&mut self) {
        self.calls.push("save".into());
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&ImageFilter>,
    ) {
        self.calls.push(format!(
            "save_layer {bounds:?} {:?} {}",
            options.bits(),
            backdrop.is_some()
        ));
    }

    fn restore(&mut self) {
        self.calls.push("restore".into());
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.calls.push(format!("translate {tx} {ty}"));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.calls.push(format!("scale {sx} {sy}"));
    }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
        self.calls
            .push(format!("clip_rect {rect:?} {op:?} {anti_alias}"));
    }

    fn draw_paint(&mut self) {
        self.calls.push("draw_paint".into());
    }

    fn draw_color(&mut self, color: DlColor, mode: BlendMode) {
        self.calls
            .push(format!("draw_color {:08x} {mode:?}", color.0));
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.calls.push(format!("draw_rect {rect:?}"));
    }

    fn draw_oval(&mut self, bounds: Rect) {
        self.calls.push(format!("draw_oval {bounds:?}"));
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        self.calls.push(format!("draw_circle {center:?} {radius}"));
    }

    fn draw_display_list(&mut self, list: &Arc<DisplayList>, opacity: f64, cull: Option<Rect>) {
        self.calls.push(format!(
            "draw_display_list {} {opacity} {cull:?}",
            list.op_count(false)
        ));
    }
}
