use std::fs::File;
use std::io;

/// Writes `buf` at `offset` without moving the file's cursor, so concurrent
/// writers and readers on the same handle never race over `seek`.
#[cfg(unix)]
pub fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
	use std::os::unix::fs::FileExt;
	file.write_all_at(buf, offset)
}

#[cfg(windows)]
pub fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
	use std::os::windows::fs::FileExt;
	let mut written = 0;
	while written < buf.len() {
		written += file.seek_write(&buf[written..], offset + written as u64)?;
	}
	Ok(())
}

/// Reads exactly `buf.len()` bytes starting at `offset`, again without
/// touching the shared cursor — the lock-free read path depends on this.
#[cfg(unix)]
pub fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
	use std::os::unix::fs::FileExt;
	file.read_exact_at(buf, offset)
}

#[cfg(windows)]
pub fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
	use std::os::windows::fs::FileExt;
	let mut read = 0;
	while read < buf.len() {
		let n = file.seek_read(&mut buf[read..], offset + read as u64)?;
		if n == 0 {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read from store temp file"));
		}
		read += n;
	}
	Ok(())
}
