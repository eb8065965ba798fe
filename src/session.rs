/*!
The session object (spec section 3.1): the single piece of state threaded through an entire
`read` or `write` call, and presented to every host callback. Running status and the chunk byte
budget live here as plain fields, kept in one small struct rather than scattered across a
parallel family of aliasing views, per the engine's design notes.
!*/

use crate::error::{self, Result};
use crate::flags::Flags;
use crate::header::{Division, Format};
use crate::io::MidiIo;
use crate::vlq;
use log::trace;
use snafu::{ensure, IntoError};

/// Whether a [`Session`] is driving a read or a write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Reading,
    Writing,
}

/// The session object threaded through an entire read or write call (spec section 3.1).
pub struct Session<IO: MidiIo> {
    pub(crate) mode: Mode,
    pub(crate) io: IO,

    /// Reads: bytes left in the file, from the start of the MThd payload. Writes: total bytes
    /// emitted so far.
    pub(crate) file_bytes_remaining: i64,

    pub(crate) chunk_id: [u8; 4],

    /// Reads: bytes left in the current chunk payload. Writes: bytes written since the chunk
    /// header, for length backpatching at [`crate::chunk::close_chunk`].
    pub(crate) chunk_bytes_remaining: i64,

    pub(crate) format: Format,
    pub(crate) num_tracks: u16,
    pub(crate) division: Division,
    pub flags: Flags,

    /// Reads: remaining payload bytes of the current variable meta/SysEx event. Writes: the
    /// payload size the host intends to emit.
    pub(crate) event_size: u32,

    pub(crate) prev_time: u32,
    pub(crate) time: u32,
    pub(crate) track_num: u8,

    /// `0xFF` for any meta-event.
    pub(crate) status: u8,

    /// Per-event payload scratch; layout depends on the event kind (spec section 4).
    pub(crate) data: [u8; 8],

    /// The last running-status byte accepted; `None` means "cleared" (spec section 3.1).
    pub(crate) run_status: Option<u8>,

    /// Absolute byte offset of the chunk-length field of the MTrk currently being written, for
    /// [`crate::chunk::close_chunk`] to backpatch.
    pub(crate) chunk_length_field_offset: u64,
}

impl<IO: MidiIo> Session<IO> {
    /// Builds a session around an already-open I/O capability. The WRITE flag (spec section 6.4)
    /// is set or cleared to match `mode` regardless of what `flags` carries in.
    pub fn new(mode: Mode, io: IO, flags: Flags) -> Self {
        let mut flags = flags;
        if mode == Mode::Writing {
            flags.insert(crate::flags::WRITE);
        } else {
            flags.remove(crate::flags::WRITE);
        }
        Self {
            mode,
            io,
            file_bytes_remaining: 0,
            chunk_id: [0; 4],
            chunk_bytes_remaining: 0,
            format: Format::default(),
            num_tracks: 0,
            division: Division::default(),
            flags,
            event_size: 0,
            prev_time: 0,
            time: 0,
            track_num: 0,
            status: 0,
            data: [0; 8],
            run_status: None,
            chunk_length_field_offset: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Consumes the session, returning its I/O capability. Used by hosts that own a [`MemoryIo`]
    /// and want the accumulated bytes back after a write.
    ///
    /// [`MemoryIo`]: crate::io::MemoryIo
    pub fn into_io(self) -> IO {
        self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn num_tracks(&self) -> u16 {
        self.num_tracks
    }

    pub fn division(&self) -> Division {
        self.division
    }

    pub fn track_num(&self) -> u8 {
        self.track_num
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn prev_time(&self) -> u32 {
        self.prev_time
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }

    pub fn event_size(&self) -> u32 {
        self.event_size
    }

    /// Reads exactly `buf.len()` bytes, decrementing `chunk_bytes_remaining`. A short read is
    /// `MIDIERRREAD` (spec section 7, code 4); reading past the chunk budget is `MIDIERRBAD`
    /// (code 6), checked before the read is attempted.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        ensure!(
            self.chunk_bytes_remaining >= buf.len() as i64,
            error::Bad {
                site: site!(),
                description: "attempted to read past the end of the current chunk",
            }
        );
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.io.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(error::Io { site: site!() }
                    .into_error(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)));
            }
            filled += n;
        }
        self.chunk_bytes_remaining -= buf.len() as i64;
        self.file_bytes_remaining -= buf.len() as i64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_bytes(&mut b)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_bytes(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_bytes(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    /// Decodes a VLQ, consuming only the bytes the value actually occupies (spec section 4.2).
    pub fn read_vlq(&mut self) -> Result<u32> {
        let mut bytes = Vec::with_capacity(4);
        loop {
            let b = self.read_u8()?;
            bytes.push(b);
            if b & vlq::CONTINUE == 0 {
                break;
            }
            if bytes.len() == 4 {
                // one more byte is always consumed before decode_slice reports TooLong, so
                // surface the malformed-input error immediately instead of reading a 5th byte.
                bad!("VLQ exceeded 4 bytes without terminating");
            }
        }
        let (value, consumed) = vlq::decode_slice(&bytes).map_err(|e| {
            error::Bad {
                site: site!(),
                description: e.to_string(),
            }
            .build()
        })?;
        debug_assert_eq!(consumed, bytes.len());
        trace!("decoded vlq {} from {} bytes", value, bytes.len());
        Ok(value)
    }

    /// Forward-only skip of `count` bytes, used to discard an unconsumed chunk or event (spec
    /// section 4.3). Implementable as read-and-discard by non-seekable hosts.
    pub fn seek(&mut self, count: u64) -> Result<()> {
        self.io.seek_forward(count)?;
        self.chunk_bytes_remaining -= count as i64;
        self.file_bytes_remaining -= count as i64;
        Ok(())
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.io.write(buf)?;
        self.chunk_bytes_remaining += buf.len() as i64;
        self.file_bytes_remaining += buf.len() as i64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_vlq(&mut self, value: u32) -> Result<()> {
        let bytes = vlq::encode(value);
        self.write_bytes(&bytes)
    }

    /// Running status is valid only for channel-voice statuses `0x80..=0xEF` (spec section 3.1).
    pub(crate) fn latch_running_status(&mut self, status: u8) {
        if (0x80..=0xEF).contains(&status) {
            self.run_status = Some(status);
        }
    }

    pub(crate) fn clear_running_status(&mut self) {
        self.run_status = None;
    }

    /// System Realtime clears running status unless the REALTIME flag is set (spec section 3.1).
    pub(crate) fn maybe_clear_for_realtime(&mut self) {
        if !self.flags.contains(crate::flags::REALTIME) {
            self.clear_running_status();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryIo, OpenMode};

    fn new_session(bytes: Vec<u8>) -> Session<MemoryIo> {
        let mut io = MemoryIo::from_bytes(bytes);
        io.open(OpenMode::Read).unwrap();
        let mut s = Session::new(Mode::Reading, io, Flags::new());
        s.chunk_bytes_remaining = i64::MAX;
        s.file_bytes_remaining = i64::MAX;
        s
    }

    #[test]
    fn read_bytes_tracks_chunk_budget() {
        let mut s = new_session(vec![1, 2, 3, 4]);
        s.chunk_bytes_remaining = 4;
        let mut buf = [0u8; 2];
        s.read_bytes(&mut buf).unwrap();
        assert_eq!([1, 2], buf);
        assert_eq!(2, s.chunk_bytes_remaining);
    }

    #[test]
    fn read_past_chunk_budget_is_bad() {
        let mut s = new_session(vec![1, 2, 3, 4]);
        s.chunk_bytes_remaining = 1;
        let mut buf = [0u8; 2];
        let err = s.read_bytes(&mut buf).unwrap_err();
        assert_eq!(6, err.code());
    }

    #[test]
    fn read_vlq_consumes_exact_bytes() {
        let mut s = new_session(vec![0xff, 0x7f, 0x00]);
        s.chunk_bytes_remaining = 3;
        let value = s.read_vlq().unwrap();
        assert_eq!(0x3fff, value);
        assert_eq!(1, s.chunk_bytes_remaining);
    }

    #[test]
    fn five_continuation_bytes_is_bad() {
        let mut s = new_session(vec![0xff, 0xff, 0xff, 0xff, 0x7f]);
        let err = s.read_vlq().unwrap_err();
        assert_eq!(6, err.code());
    }

    #[test]
    fn running_status_only_latches_channel_voice() {
        let mut s = new_session(vec![]);
        s.latch_running_status(0x90);
        assert_eq!(Some(0x90), s.run_status);
        s.latch_running_status(0xF0);
        assert_eq!(Some(0x90), s.run_status, "sysex must not latch as running status");
    }
}
