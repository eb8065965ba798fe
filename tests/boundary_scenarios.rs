//! Exercises the engine through its public API only, the way a host crate would: no access to
//! anything `pub(crate)`.

use smf_engine::io::MemoryIo;
use smf_engine::{read_memory, ReadVisitor, Session, StandardEvent, SysexKind};

fn hex(s: &str) -> Vec<u8> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

#[derive(Default)]
struct SysexRecorder {
    events: Vec<(SysexKind, Vec<u8>)>,
}

impl ReadVisitor<MemoryIo> for SysexRecorder {
    fn standard_event(&mut self, _session: &mut Session<MemoryIo>, _event: StandardEvent) -> smf_engine::Result<()> {
        Ok(())
    }

    fn sysex(&mut self, session: &mut Session<MemoryIo>, kind: SysexKind) -> smf_engine::Result<()> {
        let mut payload = vec![0u8; session.event_size() as usize];
        session.read_bytes(&mut payload)?;
        self.events.push((kind, payload));
        Ok(())
    }
}

/// Spec boundary scenario 5: a sysex-initial packet without a trailing `0xF7` in its own payload,
/// followed by a continuation that closes it, followed by a third `0xF7` with no sysex open, an
/// escape.
#[test]
fn sysex_continuation_then_escape() {
    let bytes = hex(
        "4d54686400000006000000010060\
         4d54726b0000000f\
         00f00341424300f702aabb00f701cc",
    );
    let mut recorder = SysexRecorder::default();
    read_memory(bytes, &mut recorder).unwrap();

    assert_eq!(3, recorder.events.len());
    assert_eq!((SysexKind::Initial, vec![0x41, 0x42, 0x43]), recorder.events[0]);
    assert_eq!(
        (SysexKind::Continuation, vec![0xAA, 0xBB]),
        recorder.events[1]
    );
    assert_eq!((SysexKind::Escape, vec![0xCC]), recorder.events[2]);
}

#[derive(Default)]
struct NoopVisitor;

impl ReadVisitor<MemoryIo> for NoopVisitor {
    fn standard_event(&mut self, _session: &mut Session<MemoryIo>, _event: StandardEvent) -> smf_engine::Result<()> {
        Ok(())
    }
}

/// Spec boundary scenario 6a: a VLQ with five continuation bytes is malformed without reading
/// further.
#[test]
fn five_continuation_byte_vlq_is_error_six() {
    let bytes = hex(
        "4d54686400000006000000010060\
         4d54726b00000005\
         ffffffff7f",
    );
    let err = read_memory(bytes, &mut NoopVisitor).unwrap_err();
    assert_eq!(6, err.code());
}

/// Spec boundary scenario 6b: a track declaring length 10 when only 8 bytes remain in the file
/// is malformed at chunk-frame time, before any event bytes are read.
#[test]
fn chunk_length_past_file_remainder_is_error_six() {
    let bytes = hex(
        "4d54686400000006000000010060\
         4d54726b0000000a\
         0000000000000000",
    );
    let err = read_memory(bytes, &mut NoopVisitor).unwrap_err();
    assert_eq!(6, err.code());
}
