/*!
Meta/sysex router (spec section 4.7): the only place that synthesises the typed descriptors of
section 3.2 out of a meta-event's raw type byte and payload.
!*/

use crate::constants::{
    META_END_OF_TRACK, META_KEY_SIGNATURE, META_SEQUENCE_NUMBER, META_SET_TEMPO,
    META_SMPTE_OFFSET, META_TIME_SIGNATURE,
};
use crate::error::{self, Result};
use crate::event::{KeySignature, SmpteOffset, Tempo, TimeSignature};
use crate::flags;
use crate::io::MidiIo;
use crate::session::Session;

/// The declared payload length for each fixed-length meta type (spec section 6.1).
pub(crate) fn fixed_length(meta_type: u8) -> Option<u32> {
    match meta_type {
        META_SEQUENCE_NUMBER => Some(2),
        META_END_OF_TRACK => Some(0),
        META_SET_TEMPO => Some(3),
        META_SMPTE_OFFSET => Some(5),
        META_TIME_SIGNATURE => Some(4),
        META_KEY_SIGNATURE => Some(2),
        _ => None,
    }
}

/// What kind of fixed-length meta event `meta_type` identifies, carrying its decoded payload.
pub(crate) enum FixedMeta {
    SequenceNumber(u16),
    EndOfTrack,
    Tempo(Tempo),
    Smpte(SmpteOffset),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
}

/// Reads the payload of a fixed-length meta event and synthesises its typed descriptor. The
/// caller has already verified `fixed_length(meta_type) == Some(declared_length)`.
pub(crate) fn read_fixed<IO: MidiIo>(
    session: &mut Session<IO>,
    meta_type: u8,
) -> Result<FixedMeta> {
    match meta_type {
        META_SEQUENCE_NUMBER => Ok(FixedMeta::SequenceNumber(session.read_u16()?)),
        META_END_OF_TRACK => Ok(FixedMeta::EndOfTrack),
        META_SET_TEMPO => {
            let mut b = [0u8; 3];
            session.read_bytes(&mut b)?;
            let micros = u32::from_be_bytes([0, b[0], b[1], b[2]]);
            Ok(FixedMeta::Tempo(Tempo::from_micros(
                micros,
                session.flags.contains(flags::BPM),
            )))
        }
        META_SMPTE_OFFSET => {
            let mut b = [0u8; 5];
            session.read_bytes(&mut b)?;
            Ok(FixedMeta::Smpte(SmpteOffset {
                hour: b[0],
                minute: b[1],
                second: b[2],
                frame: b[3],
                subframe: b[4],
            }))
        }
        META_TIME_SIGNATURE => {
            let mut b = [0u8; 4];
            session.read_bytes(&mut b)?;
            let denominator = if session.flags.contains(flags::DENOM) {
                1u8 << b[1]
            } else {
                b[1]
            };
            Ok(FixedMeta::TimeSignature(TimeSignature {
                numerator: b[0],
                denominator,
                clocks_per_click: b[2],
                notated_32nds_per_quarter: b[3],
            }))
        }
        META_KEY_SIGNATURE => {
            let mut b = [0u8; 2];
            session.read_bytes(&mut b)?;
            Ok(FixedMeta::KeySignature(KeySignature {
                sharps_flats: b[0] as i8,
                is_minor: b[1] != 0,
            }))
        }
        _ => error::Bad {
            site: site!(),
            description: format!("{:#04x} is not a fixed-length meta type", meta_type),
        }
        .fail(),
    }
}

/// Emits `0xFF type VLQ(len) payload` for a fixed-length meta event.
pub(crate) fn write_sequence_number<IO: MidiIo>(
    session: &mut Session<IO>,
    number: u16,
) -> Result<()> {
    write_meta_header(session, META_SEQUENCE_NUMBER, 2)?;
    session.write_u16(number)
}

pub(crate) fn write_end_of_track<IO: MidiIo>(session: &mut Session<IO>) -> Result<()> {
    write_meta_header(session, META_END_OF_TRACK, 0)
}

pub(crate) fn write_tempo<IO: MidiIo>(session: &mut Session<IO>, tempo: Tempo) -> Result<()> {
    write_meta_header(session, META_SET_TEMPO, 3)?;
    let micros = match tempo.bpm {
        Some(bpm) if session.flags.contains(flags::BPM) => Tempo::to_micros(bpm),
        _ => tempo.micros_per_quarter,
    };
    let bytes = micros.to_be_bytes();
    session.write_bytes(&bytes[1..4])
}

pub(crate) fn write_smpte<IO: MidiIo>(
    session: &mut Session<IO>,
    smpte: SmpteOffset,
) -> Result<()> {
    write_meta_header(session, META_SMPTE_OFFSET, 5)?;
    session.write_bytes(&[
        smpte.hour,
        smpte.minute,
        smpte.second,
        smpte.frame,
        smpte.subframe,
    ])
}

pub(crate) fn write_time_signature<IO: MidiIo>(
    session: &mut Session<IO>,
    ts: TimeSignature,
) -> Result<()> {
    write_meta_header(session, META_TIME_SIGNATURE, 4)?;
    let denom_byte = if session.flags.contains(flags::DENOM) {
        (ts.denominator as f64).log2().round() as u8
    } else {
        ts.denominator
    };
    session.write_bytes(&[
        ts.numerator,
        denom_byte,
        ts.clocks_per_click,
        ts.notated_32nds_per_quarter,
    ])
}

pub(crate) fn write_key_signature<IO: MidiIo>(
    session: &mut Session<IO>,
    ks: KeySignature,
) -> Result<()> {
    write_meta_header(session, META_KEY_SIGNATURE, 2)?;
    session.write_bytes(&[ks.sharps_flats as u8, ks.is_minor as u8])
}

fn write_meta_header<IO: MidiIo>(
    session: &mut Session<IO>,
    meta_type: u8,
    len: u32,
) -> Result<()> {
    session.write_u8(0xFF)?;
    session.write_u8(meta_type)?;
    session.write_vlq(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::io::{MemoryIo, OpenMode};
    use crate::session::Mode;

    fn writer() -> Session<MemoryIo> {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        Session::new(Mode::Writing, io, Flags::new())
    }

    #[test]
    fn tempo_bpm_120_emits_spec_bytes() {
        let mut s = writer();
        s.flags.set(flags::BPM, true);
        write_tempo(
            &mut s,
            Tempo {
                micros_per_quarter: 0,
                bpm: Some(120),
            },
        )
        .unwrap();
        let bytes = s.into_io().into_bytes();
        assert_eq!(&[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20], bytes.as_slice());
    }

    #[test]
    fn time_signature_six_eight_emits_spec_bytes() {
        let mut s = writer();
        s.flags.set(flags::DENOM, true);
        write_time_signature(
            &mut s,
            TimeSignature {
                numerator: 6,
                denominator: 8,
                clocks_per_click: 24,
                notated_32nds_per_quarter: 8,
            },
        )
        .unwrap();
        let bytes = s.into_io().into_bytes();
        assert_eq!(&[0xFF, 0x58, 0x04, 0x06, 0x03, 0x18, 0x08], bytes.as_slice());
    }

    #[test]
    fn time_signature_decodes_with_and_without_denom_flag() {
        let bytes = vec![0x06, 0x03, 0x18, 0x08];
        for (want_denom_flag, expected_denominator) in [(true, 8u8), (false, 3u8)] {
            let mut io = MemoryIo::from_bytes(bytes.clone());
            io.open(OpenMode::Read).unwrap();
            let mut s = Session::new(Mode::Reading, io, Flags::new());
            s.flags.set(flags::DENOM, want_denom_flag);
            s.chunk_bytes_remaining = 4;
            match read_fixed(&mut s, META_TIME_SIGNATURE).unwrap() {
                FixedMeta::TimeSignature(ts) => assert_eq!(expected_denominator, ts.denominator),
                _ => panic!("expected a time signature"),
            }
        }
    }
}
