use tilekiln_core::json::{JsonArray, JsonObject, JsonValue};
use tilekiln_core::{Blob, GeoBBox};

/// Builds the archive's metadata blob.
#[must_use]
pub fn build(bounds: GeoBBox, min_zoom: u8, max_zoom: u8, attribution: Option<&str>) -> Blob {
	let mut object = JsonObject::new();
	let corners: JsonArray = [bounds.min_lon(), bounds.min_lat(), bounds.max_lon(), bounds.max_lat()].into_iter().collect();
	object.set("bounds", corners);
	object.set("minzoom", min_zoom);
	object.set("maxzoom", max_zoom);
	if let Some(attribution) = attribution {
		object.set("attribution", attribution);
	}
	Blob::new(JsonValue::Object(object).stringify().into_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embeds_bounds_and_zoom_range() {
		let blob = build(GeoBBox::new(-1.0, -2.0, 3.0, 4.0), 0, 8, None);
		let json = String::from_utf8(blob.as_slice().to_vec()).unwrap();
		assert!(json.contains("\"bounds\":[-1,-2,3,4]"));
		assert!(json.contains("\"minzoom\":0"));
		assert!(json.contains("\"maxzoom\":8"));
		assert!(!json.contains("attribution"));
	}

	#[test]
	fn escapes_quotes_in_attribution() {
		let blob = build(GeoBBox::new(0.0, 0.0, 1.0, 1.0), 0, 0, Some("Data © \"Example\""));
		let json = String::from_utf8(blob.as_slice().to_vec()).unwrap();
		assert!(json.contains("Data \u{a9} \\\"Example\\\""));
	}
}
