/*!
Host callback contracts (spec section 6.2 and Design Notes section 9).

The source serves both directions through one callback family gated by the WRITE flag. Here a
read and a write each get their own trait: a [`ReadVisitor`] is handed fully-decoded events as
the engine walks the file; a [`WriteEmitter`] is pulled for the next event to encode. Neither
trait can be asked to do the other's job, so the WRITE flag on [`crate::flags::Flags`] only ever
describes the session's own direction, never which callback shape to expect.
!*/

use crate::error::Result;
use crate::event::{KeySignature, SmpteOffset, StandardEvent, SysexKind, SystemEvent, Tempo, TimeSignature};
use crate::io::MidiIo;
use crate::session::Session;

/// Receives decoded events during [`crate::reader::read_file`] (spec section 4.5).
///
/// Every method has a default no-op implementation except [`ReadVisitor::standard_event`],
/// since a host that ignores channel voice messages entirely isn't meaningfully reading a MIDI
/// file. Returning `Err` aborts the read; the engine propagates the error unchanged (spec
/// section 6.2).
pub trait ReadVisitor<IO: MidiIo> {
    fn start_header(&mut self, _session: &mut Session<IO>) -> Result<()> {
        Ok(())
    }

    fn start_track(&mut self, _session: &mut Session<IO>) -> Result<()> {
        Ok(())
    }

    fn standard_event(
        &mut self,
        session: &mut Session<IO>,
        event: StandardEvent,
    ) -> Result<()>;

    fn system_event(&mut self, _session: &mut Session<IO>, _event: SystemEvent) -> Result<()> {
        Ok(())
    }

    /// A sysex initial packet, continuation, or escape (spec section 4.5, `0xF0`/`0xF7`). The
    /// payload is exactly `session.event_size()` bytes, which the visitor must consume with
    /// [`Session::read_bytes`] (or [`Session::seek`] to discard it) before returning.
    ///
    /// [`Session::read_bytes`]: crate::session::Session::read_bytes
    /// [`Session::seek`]: crate::session::Session::seek
    fn sysex(&mut self, session: &mut Session<IO>, kind: SysexKind) -> Result<()> {
        let remaining = session.event_size() as u64;
        session.seek(remaining)
    }

    /// A variable-length meta event: text types `0x01..=0x09`, `0x7F` sequencer-specific, or any
    /// unrecognized meta type. `meta_type` identifies which; the payload is
    /// `session.event_size()` bytes, to be consumed the same way as [`ReadVisitor::sysex`].
    fn meta_text(&mut self, session: &mut Session<IO>, meta_type: u8) -> Result<()> {
        let _ = meta_type;
        let remaining = session.event_size() as u64;
        session.seek(remaining)
    }

    fn tempo(&mut self, _session: &mut Session<IO>, _tempo: Tempo) -> Result<()> {
        Ok(())
    }

    fn smpte_offset(&mut self, _session: &mut Session<IO>, _smpte: SmpteOffset) -> Result<()> {
        Ok(())
    }

    fn time_signature(
        &mut self,
        _session: &mut Session<IO>,
        _ts: TimeSignature,
    ) -> Result<()> {
        Ok(())
    }

    fn key_signature(
        &mut self,
        _session: &mut Session<IO>,
        _ks: KeySignature,
    ) -> Result<()> {
        Ok(())
    }

    fn sequence_number(&mut self, _session: &mut Session<IO>, _number: u16) -> Result<()> {
        Ok(())
    }

    /// Called when an end-of-track meta event terminates the current MTrk early (spec section
    /// 4.5, step 3's EOT bullet).
    fn end_of_track(&mut self, _session: &mut Session<IO>) -> Result<()> {
        Ok(())
    }

    /// A non-MThd/MTrk chunk (spec section 4.3). The default skips it; a host that wants to read
    /// or re-emit the bytes can do so with [`Session::read_bytes`]/[`Session::write_bytes`]
    /// before returning, leaving anything unconsumed for the engine to skip.
    ///
    /// [`Session::read_bytes`]: crate::session::Session::read_bytes
    /// [`Session::write_bytes`]: crate::session::Session::write_bytes
    fn unknown_chunk(&mut self, session: &mut Session<IO>, _id: [u8; 4]) -> Result<()> {
        let remaining = session.chunk_bytes_remaining.max(0) as u64;
        session.seek(remaining)
    }
}

/// One event a [`WriteEmitter`] asks the engine to encode (spec section 4.6).
///
/// `time` is an absolute tick count unless the DELTA flag is set, in which case it is the delta
/// from the previous event in the same track, matching the read side's `time`/`prev_time` pair.
pub struct OutEvent {
    pub time: u32,
    pub kind: OutEventKind,
}

pub enum OutEventKind {
    Standard(StandardEvent),
    System(SystemEvent),
    Sysex { kind: SysexKind, payload: Vec<u8> },
    MetaText { meta_type: u8, payload: Vec<u8> },
    Tempo(Tempo),
    SmpteOffset(SmpteOffset),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    SequenceNumber(u16),
    EndOfTrack,
}

/// Drives [`crate::writer::write_file`]: pulled for the next event of each MTrk in turn (spec
/// section 4.6, mode (b), "one event at a time"). A host that wants to hand-assemble an MTrk
/// chunk itself (mode (a)) bypasses `write_file` entirely and calls [`crate::chunk::write_header`],
/// [`Session::write_bytes`], and [`crate::chunk::close_chunk`] directly, with no `WriteEmitter`
/// involved.
///
/// [`Session::write_bytes`]: crate::session::Session::write_bytes
pub trait WriteEmitter<IO: MidiIo> {
    fn header(&mut self, session: &mut Session<IO>) -> Result<()> {
        let _ = session;
        Ok(())
    }

    /// Returns the next event of the current track, or `None` to close it. Time fields on the
    /// returned event are interpreted as absolute ticks unless the DELTA flag is set, matching
    /// the read side.
    fn next_event(&mut self, session: &mut Session<IO>) -> Result<Option<OutEvent>>;
}
