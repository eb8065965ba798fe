use smf_engine::io::MemoryIo;
use smf_engine::visitor::{OutEvent, OutEventKind, WriteEmitter};
use smf_engine::{
    write_file, Division, Error, Flags, Format, Mode, Session, StandardEvent, Tempo,
    TimeSignature,
};

const QUARTER: u32 = 1024;
const EIGHTH: u32 = QUARTER / 2;
const DOTTED_QUARTER: u32 = QUARTER + EIGHTH;

const C4: u8 = 72;
const D4: u8 = 74;
const E4: u8 = 76;
const VELOCITY: u8 = 64;
const CHANNEL: u8 = 0;

struct RowRowRowYourBoat {
    events: std::vec::IntoIter<OutEvent>,
}

impl RowRowRowYourBoat {
    fn new() -> Self {
        let mut events = Vec::new();
        let mut time = 0u32;

        events.push(standard(time, 0xC0 | CHANNEL, 0x37, 0xFF));
        events.push(text(time, 0x04, "Alto"));
        events.push(text(time, 0x03, "Singer"));
        events.push(OutEvent {
            time,
            kind: OutEventKind::TimeSignature(TimeSignature {
                numerator: 6,
                denominator: 3,
                clocks_per_click: 0x20,
                notated_32nds_per_quarter: 0,
            }),
        });
        events.push(OutEvent {
            time,
            kind: OutEventKind::Tempo(Tempo {
                micros_per_quarter: 0x07E479,
                bpm: None,
            }),
        });

        let mut note = |events: &mut Vec<OutEvent>, time: &mut u32, lyric: &str, pitch: u8, dur: u32| {
            events.push(text(*time, 0x05, lyric));
            events.push(note_on(*time, pitch));
            *time += dur;
            events.push(note_off(*time, pitch));
        };

        note(&mut events, &mut time, "Row", C4, DOTTED_QUARTER);
        note(&mut events, &mut time, "row", C4, DOTTED_QUARTER);
        note(&mut events, &mut time, "row", C4, QUARTER);
        note(&mut events, &mut time, "your", D4, EIGHTH);
        note(&mut events, &mut time, "boat", E4, DOTTED_QUARTER);

        events.push(OutEvent {
            time,
            kind: OutEventKind::EndOfTrack,
        });

        Self {
            events: events.into_iter(),
        }
    }
}

fn standard(time: u32, status: u8, data0: u8, data1: u8) -> OutEvent {
    OutEvent {
        time,
        kind: OutEventKind::Standard(StandardEvent { status, data0, data1 }),
    }
}

fn note_on(time: u32, pitch: u8) -> OutEvent {
    standard(time, 0x90 | CHANNEL, pitch, VELOCITY)
}

fn note_off(time: u32, pitch: u8) -> OutEvent {
    standard(time, 0x80 | CHANNEL, pitch, VELOCITY)
}

fn text(time: u32, meta_type: u8, s: &str) -> OutEvent {
    OutEvent {
        time,
        kind: OutEventKind::MetaText {
            meta_type,
            payload: s.as_bytes().to_vec(),
        },
    }
}

impl WriteEmitter<MemoryIo> for RowRowRowYourBoat {
    fn next_event(&mut self, _session: &mut Session<MemoryIo>) -> smf_engine::Result<Option<OutEvent>> {
        Ok(self.events.next())
    }
}

fn main() -> Result<(), Error> {
    let io = MemoryIo::new();
    let mut session = Session::new(Mode::Writing, io, Flags::new());
    let mut track = RowRowRowYourBoat::new();
    write_file(
        &mut session,
        &mut track,
        Format::Multi,
        1,
        Division::TicksPerQuarter(QUARTER as u16),
    )?;
    let bytes = session.into_io().into_bytes();
    println!("wrote {} bytes of Row, Row, Row Your Boat", bytes.len());
    Ok(())
}
