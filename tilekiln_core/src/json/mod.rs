//! A small hand-rolled JSON builder, used to assemble the PMTiles metadata
//! blob without pulling in a general-purpose JSON library for what is, on
//! the write path, a handful of known fields.

mod stringify;
mod types;

pub use types::{JsonArray, JsonObject, JsonValue};
