/*!
Chunk framer (spec section 4.3): 8-byte headers (4-byte ASCII id + 4-byte big-endian length)
bracketing MThd, MTrk, and any number of unknown chunks.
!*/

use crate::constants::CHUNK_ID_MTRK;
use crate::error::{self, Result};
use crate::io::MidiIo;
use crate::session::Session;
use log::{debug, trace};
use snafu::ensure;

/// A decoded 8-byte chunk header.
#[derive(Debug)]
pub(crate) struct ChunkHeader {
    pub(crate) id: [u8; 4],
    pub(crate) length: u32,
}

/// Reads the next 8-byte chunk header and validates it fits in the file's remaining bytes (spec
/// section 4.3: "a chunk whose declared length exceeds the file remainder is `MIDIERRBAD`").
pub(crate) fn read_header<IO: MidiIo>(session: &mut Session<IO>) -> Result<ChunkHeader> {
    session.chunk_bytes_remaining = 8;
    let mut id = [0u8; 4];
    session.read_bytes(&mut id)?;
    let length = session.read_u32()?;
    ensure!(
        session.file_bytes_remaining >= length as i64,
        error::Bad {
            site: site!(),
            description: format!(
                "chunk {} declares length {} but only {} bytes remain",
                chunk_id_string(&id),
                length,
                session.file_bytes_remaining
            ),
        }
    );
    trace!("chunk {} length {}", chunk_id_string(&id), length);
    session.chunk_id = id;
    session.chunk_bytes_remaining = length as i64;
    Ok(ChunkHeader { id, length })
}

/// Skips whatever remains of the current chunk (spec section 4.3: "if the host returns without
/// draining the chunk, the engine issues a forward seek of exactly the leftover byte count").
pub(crate) fn skip_remainder<IO: MidiIo>(session: &mut Session<IO>) -> Result<()> {
    let remaining = session.chunk_bytes_remaining;
    if remaining > 0 {
        debug!("skipping {} leftover bytes in chunk {:?}", remaining, session.chunk_id);
        session.seek(remaining as u64)?;
    }
    Ok(())
}

/// Returns `true` if `id` names an MTrk chunk.
pub(crate) fn is_mtrk(id: &[u8; 4]) -> bool {
    id == CHUNK_ID_MTRK
}

fn chunk_id_string(id: &[u8; 4]) -> String {
    String::from_utf8_lossy(id).into_owned()
}

/// Emits an 8-byte chunk header with a placeholder length, recording the length field's absolute
/// offset so [`close_chunk`] can backpatch it (spec section 4.3's writer half).
///
/// Exposed so a host can hand-assemble an MTrk's bytes directly with [`Session::write_bytes`]
/// between this call and [`close_chunk`], instead of going through [`crate::writer::write_file`]'s
/// per-event [`crate::visitor::WriteEmitter`] loop.
///
/// [`Session::write_bytes`]: crate::session::Session::write_bytes
pub fn write_header<IO: MidiIo>(session: &mut Session<IO>, id: &[u8; 4]) -> Result<()> {
    let offset = session.file_bytes_remaining.max(0) as u64;
    session.write_bytes(id)?;
    session.chunk_length_field_offset = offset + 4;
    session.write_u32(0)?;
    session.chunk_bytes_remaining = 0;
    Ok(())
}

/// Backpatches the chunk header written by [`write_header`] with the number of bytes emitted
/// since, per spec section 4.3: "`close_chunk` seeks back to patch the length field ... and
/// resumes at the end."
pub fn close_chunk<IO: MidiIo>(session: &mut Session<IO>) -> Result<()> {
    let length = session.chunk_bytes_remaining.max(0) as u32;
    let offset = session.chunk_length_field_offset;
    session.io_mut().patch_u32(offset, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::io::{MemoryIo, OpenMode};
    use crate::session::Mode;

    #[test]
    fn write_then_close_backpatches_length() {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        let mut s = Session::new(Mode::Writing, io, Flags::new());
        write_header(&mut s, CHUNK_ID_MTRK).unwrap();
        s.write_bytes(&[1, 2, 3]).unwrap();
        close_chunk(&mut s).unwrap();
        let bytes = s.into_io().into_bytes();
        assert_eq!(&[0, 0, 0, 3], &bytes[4..8]);
    }

    #[test]
    fn header_past_file_remainder_is_bad() {
        let mut io = MemoryIo::from_bytes(b"MTrk\x00\x00\x00\x0a\x00\x00".to_vec());
        io.open(OpenMode::Read).unwrap();
        let mut s = Session::new(Mode::Reading, io, Flags::new());
        s.file_bytes_remaining = 8;
        let err = read_header(&mut s).unwrap_err();
        assert_eq!(6, err.code());
    }

    #[test]
    fn is_mtrk_detects_track_chunks() {
        assert!(is_mtrk(b"MTrk"));
        assert!(!is_mtrk(b"MThd"));
    }
}
