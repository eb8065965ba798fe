/*!
The decoded event variants presented to a host (spec section 3.2 and Design Notes section 9).

The original dispatch table aliases one family of structs over the same memory to fake a tagged
union; here the tag and its payload are a single Rust enum, so a host match arm can never read a
field that doesn't apply to the event it received.
!*/

/// A channel voice/mode message, status `0x80..=0xEF` (spec section 3.2).
///
/// `data1` is the sentinel `0xFF` for program change and channel pressure, which carry only one
/// data byte; legal MIDI data bytes are `0x00..=0x7F` so the sentinel is unambiguous (an explicit
/// `Option` was considered and rejected in favor of matching the source's own convention, see
/// the open question this resolves).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StandardEvent {
    pub status: u8,
    pub data0: u8,
    pub data1: u8,
}

impl StandardEvent {
    pub fn channel(&self) -> u8 {
        self.status & crate::constants::STATUS_CHANNEL_MASK
    }
}

/// Which 0xF0/0xF7 packet a [`ReadVisitor::sysex`] call represents.
///
/// [`ReadVisitor::sysex`]: crate::visitor::ReadVisitor::sysex
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SysexKind {
    /// `0xF0`: begins a new sysex message.
    Initial,
    /// `0xF7` while the SYSEX flag was set: continues the message started by `Initial`.
    Continuation,
    /// `0xF7` while the SYSEX flag was clear: an escape sequence, not part of any sysex.
    Escape,
}

/// A MIDI System Common or Realtime message with a known, fixed data-byte arity (spec section
/// 4.5, bullet four).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SystemEvent {
    pub status: u8,
    pub data: [u8; 2],
    pub data_len: usize,
}

/// `0xFF 0x51`: tempo, widened from a 24-bit big-endian field (spec section 4.5's tempo
/// convenience).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tempo {
    pub micros_per_quarter: u32,
    /// `Some(bpm)` when the BPM flag is set and the tempo fits in a `u8` (`round(60_000_000 /
    /// micros) <= 255`); `None` otherwise, in which case the host must use
    /// `micros_per_quarter`.
    pub bpm: Option<u8>,
}

impl Tempo {
    pub(crate) fn from_micros(micros: u32, want_bpm: bool) -> Self {
        let bpm = if want_bpm {
            let computed = (60_000_000f64 / micros as f64).round();
            if computed > 0.0 && computed <= 255.0 {
                Some(computed as u8)
            } else {
                None
            }
        } else {
            None
        };
        Self {
            micros_per_quarter: micros,
            bpm,
        }
    }

    pub(crate) fn to_micros(bpm: u8) -> u32 {
        (60_000_000f64 / bpm as f64).round() as u32
    }
}

/// `0xFF 0x54`: SMPTE offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SmpteOffset {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    pub subframe: u8,
}

/// `0xFF 0x58`: time signature. `denominator` is the real value (e.g. 8 for a 3/8 bar) when the
/// DENOM flag is set, or the raw power-of-two exponent otherwise (spec section 4.5's
/// time-signature convenience).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
    pub clocks_per_click: u8,
    pub notated_32nds_per_quarter: u8,
}

/// `0xFF 0x59`: key signature. `sharps_flats` is signed: negative for flats, positive for
/// sharps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeySignature {
    pub sharps_flats: i8,
    pub is_minor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_computes_bpm_when_requested() {
        let t = Tempo::from_micros(500_000, true);
        assert_eq!(Some(120), t.bpm);
    }

    #[test]
    fn tempo_bpm_sentinel_for_out_of_range() {
        // ~235 BPM is roughly the fastest an 8-bit BPM can express; slower tempos (bigger
        // micros-per-quarter) are the ones more likely to overflow in the other direction if
        // rounding went wrong, so pin a value known to stay in range and one known not to.
        let slow = Tempo::from_micros(60_000_000 / 300, true); // 300 BPM, out of u8 range
        assert_eq!(None, slow.bpm);
    }

    #[test]
    fn standard_event_channel_mask() {
        let e = StandardEvent {
            status: 0x93,
            data0: 60,
            data1: 64,
        };
        assert_eq!(3, e.channel());
    }
}
