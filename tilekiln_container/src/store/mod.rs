//! The disk-spilling tile store: holds one zoom level's tiles in memory as
//! encoded bytes while the next level is rendered, continuously evicting
//! them to a temporary file once `memory_limit_bytes` is exceeded.
//!
//! Reads never take a lock on the temp file itself — the file handle is
//! published through an `ArcSwapOption` once, and every read after that is
//! a position-based `pread`/`seek_read` against a cloned `Arc<File>`.

mod accounting;
mod file_io;

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use log::warn;
use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;

use tilekiln_core::{Blob, ByteRange, TileCoord3};
use tilekiln_raster::encoder::{Format, TileEncoder};
use tilekiln_raster::TileData;

use accounting::MemoryAccounting;

const MIN_ENCODED_CAPACITY: usize = 1024;
const MAX_ENCODED_CAPACITY: usize = 1_000_000;
const BYTES_PER_CAPACITY_ENTRY: u64 = 20_000;
const IO_CHANNEL_DEPTH: usize = 256;

struct PendingEviction {
	coord: TileCoord3,
	bytes: Blob,
}

/// Concurrent map of `(z, x, y)` to tile payload, backed by a spill file
/// once resident bytes exceed `memory_limit_bytes`. `memory_limit_bytes ==
/// 0` disables spilling entirely (pure in-memory mode): no I/O task is
/// started and `put` never blocks.
pub struct TileStore {
	uniforms: DashMap<TileCoord3, TileData>,
	encoded: Arc<DashMap<TileCoord3, Blob>>,
	index: Arc<DashMap<TileCoord3, ByteRange>>,
	file: Arc<ArcSwapOption<File>>,
	accounting: Arc<MemoryAccounting>,
	memory_limit_bytes: u64,
	io_tx: Option<mpsc::Sender<PendingEviction>>,
	backpressure: Arc<(Mutex<()>, Condvar)>,
	encoder: Box<dyn TileEncoder + Send + Sync>,
	closed: AtomicBool,
}

impl TileStore {
	/// Builds a store for tiles encoded with `format`. When
	/// `memory_limit_bytes > 0`, spawns a single background task (on
	/// `runtime`) that drains evicted tiles into a temp file created lazily
	/// under `temp_dir` (the OS default when `None`).
	pub fn new(format: Format, memory_limit_bytes: u64, temp_dir: Option<PathBuf>, runtime: &tokio::runtime::Handle) -> Self {
		let encoded_capacity = if memory_limit_bytes == 0 {
			MIN_ENCODED_CAPACITY
		} else {
			((memory_limit_bytes / BYTES_PER_CAPACITY_ENTRY) as usize).clamp(MIN_ENCODED_CAPACITY, MAX_ENCODED_CAPACITY)
		};

		let encoded = Arc::new(DashMap::with_capacity(encoded_capacity));
		let index = Arc::new(DashMap::new());
		let file = Arc::new(ArcSwapOption::from(None));
		let accounting = Arc::new(MemoryAccounting::default());
		let backpressure = Arc::new((Mutex::new(()), Condvar::new()));

		let io_tx = if memory_limit_bytes > 0 {
			let (tx, rx) = mpsc::channel(IO_CHANNEL_DEPTH);
			runtime.spawn(run_io_task(rx, Arc::clone(&encoded), Arc::clone(&index), Arc::clone(&file), Arc::clone(&accounting), Arc::clone(&backpressure), temp_dir));
			Some(tx)
		} else {
			None
		};

		Self {
			uniforms: DashMap::new(),
			encoded,
			index,
			file,
			accounting,
			memory_limit_bytes,
			io_tx,
			backpressure,
			encoder: format.encoder(),
			closed: AtomicBool::new(false),
		}
	}

	/// Stores one tile's payload. Uniform tiles are never spilled, since at
	/// four bytes each they cost less than an index entry would. Everything
	/// else is inserted into the in-memory map and handed to the I/O task;
	/// the caller blocks here (not holding any lock) if that push leaves
	/// the store over its memory budget.
	pub fn put(&self, coord: TileCoord3, payload: TileData, encoded_bytes: Blob) {
		if payload.is_uniform() {
			self.uniforms.insert(coord, payload);
			self.accounting.add_uniform();
			return;
		}

		self.accounting.add_encoded(encoded_bytes.len());
		self.encoded.insert(coord, encoded_bytes.clone());

		let Some(tx) = &self.io_tx else { return };
		// Send before waiting: a blocked caller must never be the reason the
		// channel is empty, or the I/O task would have nothing left to drain.
		if tx.try_send(PendingEviction { coord, bytes: encoded_bytes }).is_err() {
			warn!("disk-spilling store: I/O task queue full, tile {coord:?} stays resident a little longer");
		}

		let (lock, cvar) = &*self.backpressure;
		let mut guard = lock.lock();
		while self.accounting.usage() > self.memory_limit_bytes {
			cvar.wait(&mut guard);
		}
	}

	/// Looks up a tile, decoding resident bytes or issuing a position-based
	/// read against the spill file as needed.
	pub fn get(&self, coord: TileCoord3) -> Result<Option<TileData>> {
		if let Some(uniform) = self.uniforms.get(&coord) {
			return Ok(Some(uniform.clone()));
		}

		let encoded_hit = self.encoded.get(&coord).map(|r| r.clone());
		let index_hit = self.index.get(&coord).map(|r| *r);

		if let Some(bytes) = encoded_hit {
			return Ok(Some(self.encoder.decode(&bytes)?));
		}

		if let Some(range) = index_hit {
			let Some(file) = self.file.load_full() else {
				return Ok(None);
			};
			let mut buffer = vec![0u8; range.length as usize];
			file_io::pread(&file, &mut buffer, range.offset)?;
			return Ok(Some(self.encoder.decode(&Blob::from(buffer))?));
		}

		Ok(None)
	}

	/// Current resident memory usage in bytes (encoded tile bytes plus
	/// per-entry overhead), as reported to back-pressure decisions.
	#[must_use]
	pub fn memory_usage(&self) -> u64 {
		self.accounting.usage()
	}

	/// Drains the I/O channel and drops the spill file. Safe to call more
	/// than once; safe to skip if spilling was never enabled.
	pub fn close(&mut self) {
		if self.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.io_tx.take();
		self.file.store(None);
	}
}

impl Drop for TileStore {
	fn drop(&mut self) {
		self.close();
	}
}

async fn run_io_task(
	mut rx: mpsc::Receiver<PendingEviction>,
	encoded: Arc<DashMap<TileCoord3, Blob>>,
	index: Arc<DashMap<TileCoord3, ByteRange>>,
	file_slot: Arc<ArcSwapOption<File>>,
	accounting: Arc<MemoryAccounting>,
	backpressure: Arc<(Mutex<()>, Condvar)>,
	temp_dir: Option<PathBuf>,
) {
	let mut write_file: Option<Arc<File>> = None;
	let mut next_offset: u64 = 0;

	while let Some(PendingEviction { coord, bytes }) = rx.recv().await {
		let file = match &write_file {
			Some(f) => Arc::clone(f),
			None => match open_temp_file(temp_dir.as_deref()) {
				Ok(f) => {
					let f = Arc::new(f);
					file_slot.store(Some(Arc::clone(&f)));
					write_file = Some(Arc::clone(&f));
					f
				}
				Err(err) => {
					warn!("disk-spilling store: failed to create temp file, tile {coord:?} stays resident: {err:#}");
					continue;
				}
			},
		};

		let offset = next_offset;
		let length = bytes.len() as u64;
		if let Err(err) = file_io::pwrite(&file, bytes.as_slice(), offset) {
			warn!("disk-spilling store: write failed, tile {coord:?} stays resident: {err:#}");
			continue;
		}
		next_offset += length;

		// Insert into `index` before removing from `encoded`: the tile is
		// briefly present in both, never in neither.
		index.insert(coord, ByteRange::new(offset, length));
		if let Some((_, removed)) = encoded.remove(&coord) {
			accounting.remove_encoded(removed.len());
		}
		accounting.add_index();

		let (_, cvar) = &*backpressure;
		cvar.notify_all();
	}
}

fn open_temp_file(temp_dir: Option<&std::path::Path>) -> std::io::Result<File> {
	match temp_dir {
		Some(dir) => tempfile::tempfile_in(dir),
		None => tempfile::tempfile(),
	}
}
