use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};
use std::io::{Seek, SeekFrom, Write};

use anyhow::{ensure, Result};
use fnv::FnvHasher;
use tilekiln_core::{Blob, ByteRange, GeoBBox, TileCoord3};
use tilekiln_derive::context;

use super::entries_v3::EntriesV3;
use super::entry_v3::EntryV3;
use super::header_v3::HeaderV3;
use super::tile_compression::PMTilesCompression;
use super::tile_type::PMTilesType;

/// Counts bytes written through it without buffering, so the writer always
/// knows the current absolute file offset.
struct CountingWriter<W: Write> {
	inner: W,
	position: u64,
}

impl<W: Write> CountingWriter<W> {
	fn new(inner: W) -> Self {
		Self { inner, position: 0 }
	}
}

impl<W: Write> Write for CountingWriter<W> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		let n = self.inner.write(buf)?;
		self.position += n as u64;
		Ok(n)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		self.inner.flush()
	}
}

fn fnv_hash(data: &[u8]) -> u64 {
	let mut hasher = FnvHasher::default();
	hasher.write(data);
	hasher.finish()
}

struct TileLocation {
	offset: u64,
	length: u32,
}

/// Streams tiles to an output in two passes: `add_tile` writes (or
/// deduplicates) each tile's bytes as it arrives, and `finalize` builds
/// the directory structure and seeks back to fill in the header.
///
/// Callers are expected to feed tiles in ascending tile-id order (the
/// pyramid generator does, by construction of its per-level traversal);
/// out-of-order input still produces a correct archive, just an
/// unclustered one, which costs `finalize` an extra sort.
pub struct PMTilesWriter<W: Write + Seek> {
	out: CountingWriter<W>,
	header: HeaderV3,
	entries: EntriesV3,
	tile_content_map: HashMap<(u64, u32), TileLocation, BuildHasherDefault<FnvHasher>>,
	prev_tile_hash: Option<u64>,
	prev_written_offset: u64,
	addressed_tiles: u64,
	clustered: bool,
	data_start: u64,
}

impl<W: Write + Seek> PMTilesWriter<W> {
	/// Reserves space for the header and writes the (already-compressed)
	/// metadata blob, then returns a writer ready to stream tile bodies.
	#[context("creating PMTiles writer")]
	pub fn create(
		mut out: W,
		bounds: GeoBBox,
		min_zoom: u8,
		max_zoom: u8,
		tile_type: PMTilesType,
		tile_compression: PMTilesCompression,
		metadata: &Blob,
	) -> Result<Self> {
		out.write_all(&vec![0u8; HeaderV3::LEN as usize])?;
		let mut out = CountingWriter::new(out);

		let mut header = HeaderV3::new(bounds, min_zoom, max_zoom, tile_type, tile_compression);
		let metadata_offset = out.position;
		out.write_all(metadata.as_slice())?;
		header.metadata = ByteRange::new(metadata_offset, metadata.len() as u64);

		let data_start = out.position;
		Ok(Self {
			out,
			header,
			entries: EntriesV3::new(),
			tile_content_map: HashMap::default(),
			prev_tile_hash: None,
			prev_written_offset: 0,
			addressed_tiles: 0,
			clustered: true,
			data_start,
		})
	}

	/// Adds one already-encoded tile. Identical consecutive payloads along
	/// the tile-id ordering are fused into a single entry's run length;
	/// identical non-consecutive payloads are deduplicated by content hash
	/// and point at the same stored bytes — the hash alone does not prove
	/// equality, so a previous entry is only reused when its stored length
	/// also matches this tile's length.
	#[context("adding tile {} to PMTiles archive", coord.get_tile_id().unwrap_or_default())]
	pub fn add_tile(&mut self, coord: TileCoord3, data: &Blob) -> Result<()> {
		if data.is_empty() {
			return Ok(());
		}
		let tile_id = coord.get_tile_id()?;
		let hash = fnv_hash(data.as_slice());
		let length = data.len() as u32;
		self.addressed_tiles += 1;

		if let Some(last) = self.entries.as_slice().last() {
			if self.prev_tile_hash == Some(hash) && tile_id == last.tile_id + u64::from(last.run_length) {
				let mut fused = *last;
				fused.run_length += 1;
				let index = self.entries.len() - 1;
				self.entries.set(index, fused);
				return Ok(());
			}
			if tile_id < last.tile_id + u64::from(last.run_length) {
				self.clustered = false;
			}
		}

		let location = match self.tile_content_map.entry((hash, length)) {
			Entry::Occupied(e) => {
				let loc = e.get();
				TileLocation { offset: loc.offset, length: loc.length }
			}
			Entry::Vacant(e) => {
				let offset = self.prev_written_offset;
				self.out.write_all(data.as_slice())?;
				self.prev_written_offset += u64::from(length);
				e.insert(TileLocation { offset, length });
				TileLocation { offset, length }
			}
		};

		self.prev_tile_hash = Some(hash);
		self.entries.push(EntryV3::new(tile_id, location.offset, location.length, 1));
		Ok(())
	}

	/// Builds the root/leaf directories from the accumulated entries,
	/// writes them and the header, and hands back the underlying writer.
	#[context("finalizing PMTiles archive")]
	pub fn finalize(mut self, metadata_tile_count: u64) -> Result<W> {
		let data_end = self.out.position;
		self.header.tile_data = ByteRange::new(self.data_start, data_end - self.data_start);

		if !self.clustered {
			self.entries.sort_by_tile_id();
		}

		let target_root_len = 16_384 - HeaderV3::LEN as usize;
		let directory = self.entries.as_directory(target_root_len)?;

		let root_offset = self.out.position;
		self.out.write_all(directory.root_bytes.as_slice())?;
		self.header.root_dir = ByteRange::new(root_offset, directory.root_bytes.len() as u64);

		let leaf_offset = self.out.position;
		self.out.write_all(directory.leaves_bytes.as_slice())?;
		self.header.leaf_dirs = ByteRange::new(leaf_offset, directory.leaves_bytes.len() as u64);

		self.header.clustered = self.clustered;
		self.header.addressed_tiles_count = self.addressed_tiles;
		self.header.tile_entries_count = self.entries.len() as u64;
		self.header.tile_contents_count = self.tile_content_map.len() as u64;
		ensure!(metadata_tile_count == self.addressed_tiles || metadata_tile_count == 0, "tile count mismatch with generator bookkeeping");

		let header_bytes = self.header.serialize()?;
		self.out.inner.seek(SeekFrom::Start(0))?;
		self.out.inner.write_all(header_bytes.as_slice())?;
		self.out.inner.flush()?;
		Ok(self.out.inner)
	}
}
