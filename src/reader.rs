/*!
Top-level read operation (spec section 4.5) and its per-MTrk event decoder loop.
!*/

use crate::chunk::{self, ChunkHeader};
use crate::constants::{self, ChannelMessageType};
use crate::error::{self, Result};
use crate::event::{StandardEvent, SysexKind, SystemEvent};
use crate::flags::{self, Flags};
use crate::header;
use crate::io::{FileIo, MemoryIo, MidiIo, OpenMode};
use crate::meta::{self, FixedMeta};
use crate::session::{Mode, Session};
use crate::vlq;
use crate::visitor::ReadVisitor;
use log::trace;
use snafu::{ensure, OptionExt};
use std::path::Path;

/// Convenience entry point for the common case of reading a file on disk: opens `path` with
/// [`FileIo`], determines its size for the chunk-length sanity checks of spec section 4.3, drives
/// [`read_file`], then closes the handle regardless of outcome.
pub fn read_path<P: AsRef<Path>, V: ReadVisitor<FileIo>>(path: P, visitor: &mut V) -> Result<()> {
    let path = path.as_ref();
    let len = std::fs::metadata(path)
        .map_err(|_| error::FileSize { site: site!() }.build())?
        .len();
    let mut io = FileIo::new(path);
    io.open(OpenMode::Read)?;
    let mut session = Session::new(Mode::Reading, io, Flags::new());
    session.file_bytes_remaining = len as i64;
    let result = read_file(&mut session, visitor);
    session.io_mut().close()?;
    result
}

/// Convenience entry point for reading a buffer already held in memory, sizing a [`MemoryIo`] to
/// `bytes.len()` rather than requiring the caller to assemble a [`Session`] by hand.
pub fn read_memory<V: ReadVisitor<MemoryIo>>(bytes: Vec<u8>, visitor: &mut V) -> Result<()> {
    let len = bytes.len() as i64;
    let mut io = MemoryIo::from_bytes(bytes);
    io.open(OpenMode::Read)?;
    let mut session = Session::new(Mode::Reading, io, Flags::new());
    session.file_bytes_remaining = len;
    read_file(&mut session, visitor)
}

/// Walks the whole file: MThd followed by every chunk until `file_bytes_remaining` is exhausted
/// (spec section 4.3). Returns once the file is fully consumed or a visitor/decode error aborts
/// the operation.
pub fn read_file<IO: MidiIo, V: ReadVisitor<IO>>(
    session: &mut Session<IO>,
    visitor: &mut V,
) -> Result<()> {
    let file_len = session.file_bytes_remaining;
    let first = chunk::read_header(session)?;
    ensure!(&first.id == constants::CHUNK_ID_MTHD, error::NoMidi { site: site!() });
    header::read_mthd(session)?;
    visitor.start_header(session)?;

    while session.file_bytes_remaining > 0 {
        let ChunkHeader { id, .. } = chunk::read_header(session)?;
        if chunk::is_mtrk(&id) {
            session.track_num += 1;
            visitor.start_track(session)?;
            read_track(session, visitor)?;
        } else {
            visitor.unknown_chunk(session, id)?;
        }
        chunk::skip_remainder(session)?;
    }
    trace!("finished reading {} byte file", file_len.max(0));
    Ok(())
}

/// The per-MTrk loop of spec section 4.5: decode delta-time, resolve status (honouring running
/// status), classify, dispatch.
fn read_track<IO: MidiIo, V: ReadVisitor<IO>>(
    session: &mut Session<IO>,
    visitor: &mut V,
) -> Result<()> {
    session.prev_time = 0;
    session.time = 0;
    session.run_status = None;
    session.flags.remove(flags::SYSEX);

    while session.chunk_bytes_remaining > 0 {
        let delta = session.read_vlq()?;
        if session.flags.contains(flags::DELTA) {
            session.time = delta;
        } else {
            session.time = session.prev_time + delta;
        }

        let first_byte = session.read_u8()?;
        let status = if first_byte & vlq::CONTINUE != 0 {
            first_byte
        } else {
            let running = session.run_status.context(error::Status { site: site!() })?;
            // first_byte was actually the first data byte of a running-status event; push it
            // back onto the session's one-byte scratch so the dispatch below can pick it up.
            session.data[0] = first_byte;
            running
        };
        session.status = status;

        let had_running_data = status != first_byte;
        let eot = dispatch_event(session, visitor, status, had_running_data)?;
        session.prev_time = session.time;
        if eot {
            break;
        }
    }
    Ok(())
}

/// Returns `true` if this event was an end-of-track meta, which terminates the track loop early.
fn dispatch_event<IO: MidiIo, V: ReadVisitor<IO>>(
    session: &mut Session<IO>,
    visitor: &mut V,
    status: u8,
    had_running_data: bool,
) -> Result<bool> {
    match status {
        0x80..=0xEF => {
            let kind = ChannelMessageType::from_status(status)?;
            let arity = kind.data_byte_count();
            let data0 = if had_running_data {
                session.data[0]
            } else {
                session.read_u8()?
            };
            let data1 = if arity == 2 { session.read_u8()? } else { 0xFF };
            session.latch_running_status(status);
            visitor.standard_event(session, StandardEvent { status, data0, data1 })?;
            Ok(false)
        }
        constants::STATUS_SYSEX_F0 => {
            session.flags.insert(flags::SYSEX);
            session.clear_running_status();
            let len = session.read_vlq()?;
            session.event_size = len;
            visitor.sysex(session, SysexKind::Initial)?;
            Ok(false)
        }
        constants::STATUS_SYSEX_F7 => {
            let kind = if session.flags.contains(flags::SYSEX) {
                session.flags.remove(flags::SYSEX);
                SysexKind::Continuation
            } else {
                SysexKind::Escape
            };
            session.clear_running_status();
            let len = session.read_vlq()?;
            session.event_size = len;
            visitor.sysex(session, kind)?;
            Ok(false)
        }
        constants::STATUS_META => {
            let meta_type = session.read_u8()?;
            let len = session.read_vlq()?;
            if let Some(expected) = meta::fixed_length(meta_type) {
                ensure!(
                    len == expected,
                    error::Bad {
                        site: site!(),
                        description: format!(
                            "fixed meta type {:#04x} declared length {}, expected {}",
                            meta_type, len, expected
                        ),
                    }
                );
                let is_eot = meta_type == constants::META_END_OF_TRACK;
                match meta::read_fixed(session, meta_type)? {
                    FixedMeta::SequenceNumber(n) => visitor.sequence_number(session, n)?,
                    FixedMeta::EndOfTrack => visitor.end_of_track(session)?,
                    FixedMeta::Tempo(t) => visitor.tempo(session, t)?,
                    FixedMeta::Smpte(s) => visitor.smpte_offset(session, s)?,
                    FixedMeta::TimeSignature(t) => visitor.time_signature(session, t)?,
                    FixedMeta::KeySignature(k) => visitor.key_signature(session, k)?,
                }
                Ok(is_eot)
            } else {
                session.event_size = len;
                visitor.meta_text(session, meta_type)?;
                Ok(false)
            }
        }
        _ => {
            if let Some(data_len) = constants::system_common_data_len(status) {
                if constants::is_system_realtime(status) {
                    session.maybe_clear_for_realtime();
                } else {
                    session.clear_running_status();
                }
                let mut data = [0u8; 2];
                for slot in data.iter_mut().take(data_len) {
                    *slot = session.read_u8()?;
                }
                visitor.system_event(
                    session,
                    SystemEvent {
                        status,
                        data,
                        data_len,
                    },
                )?;
                Ok(false)
            } else {
                error::Event { site: site!(), status }.fail()
            }
        }
    }
}
