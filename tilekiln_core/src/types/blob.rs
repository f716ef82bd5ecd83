use std::fmt::Debug;
use std::ops::Deref;

/// A reference-counted, cheaply cloneable byte buffer.
///
/// Every layer that passes tile payloads around — the render path, the
/// disk-spilling store, the PMTiles writer — moves `Blob`s rather than
/// `Vec<u8>` so that a clone never duplicates the underlying bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob(std::sync::Arc<Vec<u8>>);

impl Blob {
	#[must_use]
	pub fn new(data: Vec<u8>) -> Self {
		Blob(std::sync::Arc::new(data))
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Reads a sub-range of this blob, returning a fresh owned copy.
	pub fn read_range(&self, range: &super::ByteRange) -> anyhow::Result<Blob> {
		let start = range.offset as usize;
		let end = start + range.length as usize;
		anyhow::ensure!(
			end <= self.0.len(),
			"byte range {range:?} out of bounds for blob of length {}",
			self.0.len()
		);
		Ok(Blob::new(self.0[start..end].to_vec()))
	}
}

impl Deref for Blob {
	type Target = [u8];
	fn deref(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for Blob {
	fn from(data: Vec<u8>) -> Self {
		Blob::new(data)
	}
}

impl From<&[u8]> for Blob {
	fn from(data: &[u8]) -> Self {
		Blob::new(data.to_vec())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Blob({} bytes)", self.0.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::ByteRange;

	#[test]
	fn read_range_slices_the_buffer() {
		let blob = Blob::new(vec![1, 2, 3, 4, 5]);
		let sub = blob.read_range(&ByteRange::new(1, 3)).unwrap();
		assert_eq!(sub.as_slice(), &[2, 3, 4]);
	}

	#[test]
	fn read_range_rejects_out_of_bounds() {
		let blob = Blob::new(vec![1, 2, 3]);
		assert!(blob.read_range(&ByteRange::new(2, 5)).is_err());
	}

	#[test]
	fn clone_is_cheap_and_equal() {
		let a = Blob::new(vec![9, 9, 9]);
		let b = a.clone();
		assert_eq!(a, b);
	}
}
