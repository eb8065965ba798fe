/*!
The I/O capability (spec section 4.1): the engine never touches a filesystem directly, it drives
an abstract `MidiIo` the host supplies. [`FileIo`] is the "thin convenience" default backed by
`std::fs::File`; [`MemoryIo`] backs the in-crate tests and is handy for hosts that already hold
the whole byte buffer in memory.
!*/

use crate::error::{self, Result};
use snafu::{IntoError, ResultExt};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Whether a session is reading or writing. Threaded through [`MidiIo::open`] so a capability
/// backed by a single file handle can pick the right open mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpenMode {
    Read,
    Write,
}

/// The external I/O capability an engine session is driven through (spec section 4.1).
///
/// Read and write are kept as distinct methods rather than one `read_or_write` dispatching on a
/// mode flag: a session is always one or the other for its whole lifetime, so there is nothing
/// to gain from a shared entry point, and distinct methods let the trait express "a read capability
/// never needs a mutable write path" directly in the type.
///
/// A host that has already opened its handle (the original DLL's "`OpenMidi` is null" case) can
/// simply never call [`MidiIo::open`] and hand the engine an already-open capability; `open` only
/// exists for the default, engine-owns-the-handle convenience path used by [`crate::reader::read_path`]
/// and [`crate::writer::write_path`].
pub trait MidiIo {
    /// Opens the target for reading or writing.
    fn open(&mut self, mode: OpenMode) -> Result<()>;

    /// Reads up to `buf.len()` bytes. Returns the number of bytes transferred; `0` means EOF. A
    /// short read past a chunk's declared length is reported by the caller, not here.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Seeks forward by `delta` bytes, relative to the current position. The engine never seeks
    /// backward except to backpatch a just-closed MTrk length, which goes through
    /// [`MidiIo::patch_u32`] instead so that forward-only capabilities can implement `seek` as a
    /// read-and-discard.
    fn seek_forward(&mut self, delta: u64) -> Result<()>;

    /// Overwrites 4 bytes at `absolute_position` with `value`, big-endian. Used only to
    /// backpatch an MTrk chunk's length field after the chunk has been written (spec section
    /// 4.3). Capabilities that cannot seek backward (a non-seekable writer) should return an
    /// error here; such hosts must instead buffer each MTrk themselves before calling
    /// [`crate::writer::write_file`] one track at a time with a pre-sized buffer.
    fn patch_u32(&mut self, absolute_position: u64, value: u32) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// The default, filesystem-backed [`MidiIo`]. A thin convenience, not part of the engine core.
pub struct FileIo {
    path: PathBuf,
    file: Option<File>,
}

impl FileIo {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            error::Open { site: site!() }.into_error(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "file not open",
            ))
        })
    }
}

impl MidiIo for FileIo {
    fn open(&mut self, mode: OpenMode) -> Result<()> {
        let file = match mode {
            OpenMode::Read => File::open(&self.path).context(error::Open { site: site!() })?,
            OpenMode::Write => OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)
                .context(error::Open { site: site!() })?,
        };
        self.file = Some(file);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file_mut()?.read(buf).context(io!())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.file_mut()?.write_all(buf).context(wr!())
    }

    fn seek_forward(&mut self, delta: u64) -> Result<()> {
        self.file_mut()?
            .seek(SeekFrom::Current(delta as i64))
            .context(io!())?;
        Ok(())
    }

    fn patch_u32(&mut self, absolute_position: u64, value: u32) -> Result<()> {
        let file = self.file_mut()?;
        let restore_to = file.stream_position().context(wr!())?;
        file.seek(SeekFrom::Start(absolute_position)).context(wr!())?;
        file.write_all(&value.to_be_bytes()).context(wr!())?;
        file.seek(SeekFrom::Start(restore_to)).context(wr!())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }
}

/// An in-memory [`MidiIo`], useful for hosts (and tests) that already hold the whole byte buffer.
/// Reading drains `buffer`; writing appends to it. Always seekable, so it always backpatches MTrk
/// lengths rather than falling back to per-track buffering.
#[derive(Default)]
pub struct MemoryIo {
    buffer: Vec<u8>,
    cursor: usize,
}

impl MemoryIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { buffer: bytes, cursor: 0 }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl MidiIo for MemoryIo {
    fn open(&mut self, mode: OpenMode) -> Result<()> {
        self.cursor = 0;
        if mode == OpenMode::Write {
            self.buffer.clear();
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let available = self.buffer.len().saturating_sub(self.cursor);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&self.buffer[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(buf);
        self.cursor += buf.len();
        Ok(())
    }

    fn seek_forward(&mut self, delta: u64) -> Result<()> {
        self.cursor += delta as usize;
        Ok(())
    }

    fn patch_u32(&mut self, absolute_position: u64, value: u32) -> Result<()> {
        let pos = absolute_position as usize;
        self.buffer[pos..pos + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_io_round_trips_bytes() {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        io.write(&[1, 2, 3]).unwrap();
        io.patch_u32(0, 0xAABBCCDD).unwrap();
        let bytes = io.into_bytes();
        assert_eq!(&[0xAA, 0xBB, 0xCC][..], &bytes[0..3]);
    }

    #[test]
    fn memory_io_read_short_returns_fewer_bytes() {
        let mut io = MemoryIo::from_bytes(vec![1, 2]);
        io.open(OpenMode::Read).unwrap();
        let mut buf = [0u8; 4];
        let n = io.read(&mut buf).unwrap();
        assert_eq!(2, n);
    }
}
