/*!
MThd handling (spec section 4.4): a fixed 6-byte payload carrying format, track count, and
division.
!*/

use crate::error::{self, Result};
use crate::io::MidiIo;
use crate::session::Session;
use snafu::ensure;

/// SMF format, the first field of MThd.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// Format 0: a single MTrk carrying every channel.
    #[default]
    Single,
    /// Format 1: multiple MTrks played simultaneously, the first carrying tempo/meta.
    Multi,
    /// Format 2: multiple independent, sequentially-played MTrks.
    Sequential,
}

impl Format {
    pub(crate) fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Format::Single),
            1 => Ok(Format::Multi),
            2 => Ok(Format::Sequential),
            _ => error::Bad {
                site: site!(),
                description: format!("unknown SMF format word {}", value),
            }
            .fail(),
        }
    }

    pub(crate) fn as_u16(&self) -> u16 {
        match self {
            Format::Single => 0,
            Format::Multi => 1,
            Format::Sequential => 2,
        }
    }
}

/// The tick resolution declared in MThd (spec section 3.1's division invariant). The engine
/// passes either form through unchanged; it never interprets SMPTE time itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Division {
    /// High bit clear: pulses (ticks) per quarter note.
    TicksPerQuarter(u16),
    /// High bit set: negative SMPTE frame rate in the upper byte, ticks-per-frame in the lower.
    Smpte { frame_rate: i8, ticks_per_frame: u8 },
}

impl Default for Division {
    fn default() -> Self {
        Division::TicksPerQuarter(96)
    }
}

impl Division {
    pub(crate) fn from_u16(value: u16) -> Self {
        if value & 0x8000 == 0 {
            Division::TicksPerQuarter(value)
        } else {
            let bytes = value.to_be_bytes();
            Division::Smpte {
                frame_rate: bytes[0] as i8,
                ticks_per_frame: bytes[1],
            }
        }
    }

    pub(crate) fn as_u16(&self) -> u16 {
        match self {
            Division::TicksPerQuarter(ticks) => *ticks & 0x7fff,
            Division::Smpte {
                frame_rate,
                ticks_per_frame,
            } => u16::from_be_bytes([*frame_rate as u8, *ticks_per_frame]),
        }
    }
}

/// The length of an MThd payload; any other length is malformed (spec section 4.4).
pub(crate) const MTHD_PAYLOAD_LEN: u32 = 6;

/// Reads the 6-byte MThd payload, populating `session.format`/`num_tracks`/`division`. The
/// chunk header itself (id + length) has already been consumed by [`crate::chunk`].
pub(crate) fn read_mthd<IO: MidiIo>(session: &mut Session<IO>) -> Result<()> {
    ensure!(
        session.chunk_bytes_remaining == MTHD_PAYLOAD_LEN as i64,
        error::Bad {
            site: site!(),
            description: format!(
                "MThd payload length {} does not match the required {}",
                session.chunk_bytes_remaining, MTHD_PAYLOAD_LEN
            ),
        }
    );
    let format_word = session.read_u16()?;
    let num_tracks = session.read_u16()?;
    let division_word = session.read_u16()?;
    session.format = Format::from_u16(format_word)?;
    ensure!(
        !(session.format == Format::Single && num_tracks != 1),
        error::Bad {
            site: site!(),
            description: "format 0 requires exactly one track",
        }
    );
    session.num_tracks = num_tracks;
    session.division = Division::from_u16(division_word);
    Ok(())
}

/// Emits the 8-byte MThd chunk header plus its 6-byte payload in one call; MThd never needs
/// backpatching since its length is always 6.
pub(crate) fn write_mthd<IO: MidiIo>(
    session: &mut Session<IO>,
    format: Format,
    num_tracks: u16,
    division: Division,
) -> Result<()> {
    session.write_bytes(crate::constants::CHUNK_ID_MTHD)?;
    session.write_u32(MTHD_PAYLOAD_LEN)?;
    session.write_u16(format.as_u16())?;
    session.write_u16(num_tracks)?;
    session.write_u16(division.as_u16())?;
    session.format = format;
    session.num_tracks = num_tracks;
    session.division = division;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::io::{MemoryIo, OpenMode};
    use crate::session::Mode;

    #[test]
    fn division_round_trips_ppqn() {
        let d = Division::from_u16(96);
        assert_eq!(Division::TicksPerQuarter(96), d);
        assert_eq!(96, d.as_u16());
    }

    #[test]
    fn division_round_trips_smpte() {
        let raw: u16 = 0xE328; // -29 fps, 40 ticks/frame
        let d = Division::from_u16(raw);
        assert_eq!(
            Division::Smpte {
                frame_rate: -29,
                ticks_per_frame: 0x28
            },
            d
        );
        assert_eq!(raw, d.as_u16());
    }

    #[test]
    fn write_then_read_mthd_round_trips() {
        let mut io = MemoryIo::new();
        io.open(OpenMode::Write).unwrap();
        let mut session = Session::new(Mode::Writing, io, Flags::new());
        write_mthd(&mut session, Format::Multi, 3, Division::TicksPerQuarter(480)).unwrap();
        let bytes = session.into_io().into_bytes();
        assert_eq!(b"MThd", &bytes[0..4]);

        let mut read_io = MemoryIo::from_bytes(bytes[8..14].to_vec());
        read_io.open(OpenMode::Read).unwrap();
        let mut read_session = Session::new(Mode::Reading, read_io, Flags::new());
        read_session.chunk_bytes_remaining = 6;
        read_mthd(&mut read_session).unwrap();
        assert_eq!(Format::Multi, read_session.format());
        assert_eq!(3, read_session.num_tracks());
        assert_eq!(Division::TicksPerQuarter(480), read_session.division());
    }

    #[test]
    fn format_zero_requires_single_track() {
        let mut io = MemoryIo::from_bytes(vec![0x00, 0x00, 0x00, 0x02, 0x00, 0x60]);
        io.open(OpenMode::Read).unwrap();
        let mut session = Session::new(Mode::Reading, io, Flags::new());
        session.chunk_bytes_remaining = 6;
        let err = read_mthd(&mut session).unwrap_err();
        assert_eq!(6, err.code());
    }
}
