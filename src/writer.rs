/*!
Top-level write operation (spec section 4.6) and its per-MTrk event encoder loop.
!*/

use crate::chunk;
use crate::constants::{self, ChannelMessageType, CHUNK_ID_MTRK};
use crate::error::Result;
use crate::event::SysexKind;
use crate::flags::{self, Flags};
use crate::header::{Division, Format};
use crate::io::{FileIo, MemoryIo, MidiIo, OpenMode};
use crate::meta;
use crate::session::{Mode, Session};
use crate::visitor::{OutEvent, OutEventKind, WriteEmitter};
use log::trace;
use std::path::Path;

/// Convenience entry point for the common case of writing a file on disk: opens `path` with
/// [`FileIo`] (truncating it), drives [`write_file`], then closes the handle regardless of
/// outcome.
pub fn write_path<P: AsRef<Path>, E: WriteEmitter<FileIo>>(
    path: P,
    emitter: &mut E,
    format: Format,
    num_tracks: u16,
    division: Division,
) -> Result<()> {
    let mut io = FileIo::new(path);
    io.open(OpenMode::Write)?;
    let mut session = Session::new(Mode::Writing, io, Flags::new());
    let result = write_file(&mut session, emitter, format, num_tracks, division);
    session.io_mut().close()?;
    result
}

/// Convenience entry point for writing to an in-memory buffer rather than a file, returning the
/// bytes the engine produced.
pub fn write_memory<E: WriteEmitter<MemoryIo>>(
    emitter: &mut E,
    format: Format,
    num_tracks: u16,
    division: Division,
) -> Result<Vec<u8>> {
    let io = MemoryIo::new();
    let mut session = Session::new(Mode::Writing, io, Flags::new());
    write_file(&mut session, emitter, format, num_tracks, division)?;
    Ok(session.into_io().into_bytes())
}

/// Emits MThd, then one MTrk per call to [`WriteEmitter::next_event`] returning events until it
/// yields `None`, per spec section 4.6. The caller is responsible for calling
/// [`WriteEmitter::next_event`]'s `None` to end each track; this function starts a new MTrk for
/// every track index up to `num_tracks`.
pub fn write_file<IO: MidiIo, E: WriteEmitter<IO>>(
    session: &mut Session<IO>,
    emitter: &mut E,
    format: Format,
    num_tracks: u16,
    division: Division,
) -> Result<()> {
    crate::header::write_mthd(session, format, num_tracks, division)?;
    emitter.header(session)?;

    for _ in 0..num_tracks {
        session.track_num += 1;
        chunk::write_header(session, CHUNK_ID_MTRK)?;
        write_track(session, emitter)?;
        chunk::close_chunk(session)?;
    }
    trace!("finished writing {} tracks", num_tracks);
    Ok(())
}

fn write_track<IO: MidiIo, E: WriteEmitter<IO>>(
    session: &mut Session<IO>,
    emitter: &mut E,
) -> Result<()> {
    session.prev_time = 0;
    session.run_status = None;
    session.flags.remove(flags::SYSEX);

    while let Some(out) = emitter.next_event(session)? {
        let is_eot = matches!(out.kind, OutEventKind::EndOfTrack);
        write_delta(session, out.time)?;
        write_kind(session, out.kind)?;
        session.prev_time = out.time;
        if is_eot {
            break;
        }
    }
    Ok(())
}

fn write_delta<IO: MidiIo>(session: &mut Session<IO>, time: u32) -> Result<()> {
    let delta = if session.flags.contains(flags::DELTA) {
        time
    } else {
        time.saturating_sub(session.prev_time)
    };
    session.time = time;
    session.write_vlq(delta)
}

/// Emits status + data for one event, eliding the status byte when running status covers it
/// (spec section 4.6, step 2).
fn write_kind<IO: MidiIo>(session: &mut Session<IO>, kind: OutEventKind) -> Result<()> {
    match kind {
        OutEventKind::Standard(event) => {
            let arity = ChannelMessageType::from_status(event.status)?.data_byte_count();
            let elide = session.run_status == Some(event.status);
            if !elide {
                session.write_u8(event.status)?;
            }
            session.write_u8(event.data0)?;
            if arity == 2 {
                session.write_u8(event.data1)?;
            }
            session.latch_running_status(event.status);
            Ok(())
        }
        OutEventKind::System(event) => {
            session.write_u8(event.status)?;
            for &b in event.data.iter().take(event.data_len) {
                session.write_u8(b)?;
            }
            if constants::is_system_realtime(event.status) {
                session.maybe_clear_for_realtime();
            } else {
                session.clear_running_status();
            }
            Ok(())
        }
        OutEventKind::Sysex { kind, payload } => {
            let status = match kind {
                SysexKind::Initial => {
                    session.flags.insert(flags::SYSEX);
                    constants::STATUS_SYSEX_F0
                }
                SysexKind::Continuation => {
                    session.flags.remove(flags::SYSEX);
                    constants::STATUS_SYSEX_F7
                }
                SysexKind::Escape => constants::STATUS_SYSEX_F7,
            };
            session.write_u8(status)?;
            session.write_vlq(payload.len() as u32)?;
            session.clear_running_status();
            session.write_bytes(&payload)
        }
        OutEventKind::MetaText { meta_type, payload } => {
            session.write_u8(0xFF)?;
            session.write_u8(meta_type)?;
            session.write_vlq(payload.len() as u32)?;
            session.write_bytes(&payload)
        }
        OutEventKind::Tempo(tempo) => meta::write_tempo(session, tempo),
        OutEventKind::SmpteOffset(smpte) => meta::write_smpte(session, smpte),
        OutEventKind::TimeSignature(ts) => meta::write_time_signature(session, ts),
        OutEventKind::KeySignature(ks) => meta::write_key_signature(session, ks),
        OutEventKind::SequenceNumber(n) => meta::write_sequence_number(session, n),
        OutEventKind::EndOfTrack => meta::write_end_of_track(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StandardEvent;
    use crate::flags::Flags;
    use crate::io::{MemoryIo, OpenMode};
    use crate::session::Mode;

    struct ScriptedTrack {
        events: Vec<OutEvent>,
    }

    impl<IO: MidiIo> WriteEmitter<IO> for ScriptedTrack {
        fn next_event(&mut self, _session: &mut Session<IO>) -> Result<Option<OutEvent>> {
            if self.events.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.events.remove(0)))
            }
        }
    }

    fn note_on(time: u32, data0: u8, data1: u8) -> OutEvent {
        OutEvent {
            time,
            kind: OutEventKind::Standard(StandardEvent {
                status: 0x90,
                data0,
                data1,
            }),
        }
    }

    fn eot(time: u32) -> OutEvent {
        OutEvent {
            time,
            kind: OutEventKind::EndOfTrack,
        }
    }

    #[test]
    fn minimal_format_0_file_round_trips_spec_bytes() {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        let mut session = Session::new(Mode::Writing, io, Flags::new());
        let mut emitter = ScriptedTrack {
            events: vec![eot(0)],
        };
        write_file(
            &mut session,
            &mut emitter,
            Format::Single,
            1,
            Division::TicksPerQuarter(0x60),
        )
        .unwrap();
        let bytes = session.into_io().into_bytes();
        let expected = [
            0x4d, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x60,
            0x4d, 0x54, 0x72, 0x6b, 0x00, 0x00, 0x00, 0x04, 0x00, 0xff, 0x2f, 0x00,
        ];
        assert_eq!(&expected[..], bytes.as_slice());
    }

    #[test]
    fn running_status_elides_repeated_note_on() {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        let mut session = Session::new(Mode::Writing, io, Flags::new());
        let mut emitter = ScriptedTrack {
            events: vec![note_on(0, 0x3C, 0x40), note_on(48, 0x3C, 0x00), eot(48)],
        };
        write_file(
            &mut session,
            &mut emitter,
            Format::Single,
            1,
            Division::TicksPerQuarter(0x60),
        )
        .unwrap();
        let bytes = session.into_io().into_bytes();
        let mtrk_payload = &bytes[22..];
        assert_eq!(
            &[0x00, 0x90, 0x3c, 0x40, 0x30, 0x3c, 0x00, 0x00, 0xff, 0x2f, 0x00],
            &mtrk_payload[0..11]
        );
    }
}
