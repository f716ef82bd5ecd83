use super::types::{JsonArray, JsonObject, JsonValue};
use std::fmt::Write;

impl JsonValue {
	/// Renders this value as compact JSON text.
	#[must_use]
	pub fn stringify(&self) -> String {
		let mut out = String::new();
		write_value(self, &mut out);
		out
	}
}

fn write_value(value: &JsonValue, out: &mut String) {
	match value {
		JsonValue::Null => out.push_str("null"),
		JsonValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
		JsonValue::Number(n) => {
			if n.fract() == 0.0 && n.abs() < 1e15 {
				let _ = write!(out, "{}", *n as i64);
			} else {
				let _ = write!(out, "{n}");
			}
		}
		JsonValue::String(s) => write_escaped_string(s, out),
		JsonValue::Array(array) => write_array(array, out),
		JsonValue::Object(object) => write_object(object, out),
	}
}

fn write_array(array: &JsonArray, out: &mut String) {
	out.push('[');
	for (i, item) in array.0.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		write_value(item, out);
	}
	out.push(']');
}

fn write_object(object: &JsonObject, out: &mut String) {
	out.push('{');
	for (i, (key, value)) in object.0.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		write_escaped_string(key, out);
		out.push(':');
		write_value(value, out);
	}
	out.push('}');
}

fn write_escaped_string(s: &str, out: &mut String) {
	out.push('"');
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if (c as u32) < 0x20 => {
				let _ = write!(out, "\\u{:04x}", c as u32);
			}
			c => out.push(c),
		}
	}
	out.push('"');
}
