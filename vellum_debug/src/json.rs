// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of a display list.
//!
//! [`export`] writes a list's metadata and its ops, one object per record,
//! as pretty-printed JSON. Nested lists are exported inline under the
//! `nested` key of their `draw_display_list` op.

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};

use vellum_core::DisplayList;

use crate::recorder::{OpRecorder, RecordedOp};

/// Exports `list` as a JSON document.
pub fn export(list: &DisplayList, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &to_value(list))?;
    Ok(())
}

/// Builds the JSON value [`export`] writes.
#[must_use]
pub fn to_value(list: &DisplayList) -> Value {
    let ops: Vec<Value> = OpRecorder::record(list)
        .iter()
        .map(|op| {
            let mut value = json!({
                "op": op.name(),
                "text": op.to_string(),
            });
            if let RecordedOp::DrawDisplayList { list, .. } = op {
                value["nested"] = to_value(list);
            }
            value
        })
        .collect();

    json!({
        "unique_id": list.unique_id(),
        "op_count": list.op_count(false),
        "nested_op_count": list.op_count(true),
        "render_op_count": list.render_op_count(),
        "bytes": list.bytes(true),
        "bounds": rect(list.bounds()),
        "has_index": list.has_index(),
        "can_apply_group_opacity": list.can_apply_group_opacity(),
        "is_thread_safe": list.is_thread_safe(),
        "modifies_transparent_black": list.modifies_transparent_black(),
        "ops": ops,
    })
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use vellum_core::color::DlColor;
    use vellum_core::{BuilderConfig, DisplayListBuilder, DlOpReceiver};

    #[test]
    fn export_produces_valid_json() {
        let mut b = DisplayListBuilder::default();
        b.set_color(DlColor::BLUE);
        b.draw_rect(Rect::new(0.0, 0.0, 20.0, 10.0));
        let list = b.build().unwrap();

        let mut out = Vec::new();
        export(&list, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["unique_id"], list.unique_id());
        assert_eq!(parsed["op_count"], 2);
        assert_eq!(parsed["render_op_count"], 1);
        assert_eq!(parsed["bounds"], json!([0.0, 0.0, 20.0, 10.0]));
        assert_eq!(parsed["has_index"], true);
        assert_eq!(parsed["ops"][0]["op"], "set_color");
        assert_eq!(parsed["ops"][1]["text"], "draw_rect [0, 0, 20, 10]");
    }

    #[test]
    fn nested_lists_are_inlined() {
        let mut inner = DisplayListBuilder::new(BuilderConfig::without_index());
        inner.draw_circle(Point::new(1.0, 1.0), 1.0);
        let inner = inner.build().unwrap();

        let mut outer = DisplayListBuilder::default();
        outer.translate(10.0, 0.0);
        outer.draw_display_list(&inner, 0.5, None);
        let outer = outer.build().unwrap();

        let value = to_value(&outer);
        let nested = &value["ops"][1]["nested"];
        assert_eq!(nested["unique_id"], inner.unique_id());
        assert_eq!(nested["has_index"], false);
        assert_eq!(nested["ops"][0]["op"], "draw_circle");
        assert_eq!(value["nested_op_count"], 3);
    }

    #[test]
    fn export_empty_list() {
        let value = to_value(&DisplayList::empty());
        assert_eq!(value["op_count"], 0);
        assert!(value["ops"].as_array().unwrap().is_empty());
    }
}
