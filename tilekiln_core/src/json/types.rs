/// A JSON value being assembled for output. There is deliberately no
/// `parse` counterpart — this module only ever builds the PMTiles metadata
/// blob, it never reads one back.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	Array(JsonArray),
	Object(JsonObject),
}

impl From<&str> for JsonValue {
	fn from(value: &str) -> Self {
		JsonValue::String(value.to_string())
	}
}

impl From<String> for JsonValue {
	fn from(value: String) -> Self {
		JsonValue::String(value)
	}
}

impl From<bool> for JsonValue {
	fn from(value: bool) -> Self {
		JsonValue::Bool(value)
	}
}

macro_rules! impl_from_number {
	($($ty:ty),+) => {
		$(impl From<$ty> for JsonValue {
			fn from(value: $ty) -> Self {
				JsonValue::Number(value as f64)
			}
		})+
	};
}
impl_from_number!(f32, f64, i32, i64, u8, u16, u32, u64, usize);

impl From<JsonArray> for JsonValue {
	fn from(value: JsonArray) -> Self {
		JsonValue::Array(value)
	}
}

impl From<JsonObject> for JsonValue {
	fn from(value: JsonObject) -> Self {
		JsonValue::Object(value)
	}
}

impl<T: Into<JsonValue>> From<Option<T>> for JsonValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(JsonValue::Null, Into::into)
	}
}

/// An ordered list of JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonArray(pub Vec<JsonValue>);

impl JsonArray {
	#[must_use]
	pub fn new() -> Self {
		JsonArray(Vec::new())
	}

	pub fn push(&mut self, value: impl Into<JsonValue>) -> &mut Self {
		self.0.push(value.into());
		self
	}
}

impl<T: Into<JsonValue>> FromIterator<T> for JsonArray {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		JsonArray(iter.into_iter().map(Into::into).collect())
	}
}

/// An ordered key/value map — insertion order is preserved and reproduced
/// on output, matching the field ordering a reader would expect from a
/// hand-assembled metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject(pub Vec<(String, JsonValue)>);

impl JsonObject {
	#[must_use]
	pub fn new() -> Self {
		JsonObject(Vec::new())
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
		self.0.push((key.into(), value.into()));
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn object_preserves_insertion_order() {
		let mut object = JsonObject::new();
		object.set("b", 2).set("a", 1);
		assert_eq!(object.0[0].0, "b");
		assert_eq!(object.0[1].0, "a");
	}

	#[test]
	fn option_none_becomes_null() {
		let value: JsonValue = None::<u32>.into();
		assert_eq!(value, JsonValue::Null);
	}
}
