/*!
Named helpers from spec section 6.3 that don't belong to any one component: byte-order swaps and
chunk-id comparison, mirrored from the original `MidiFlipShort`/`MidiFlipLong`/`MidiCompareID`.
!*/

/// Byte-swaps a `u16`. The engine itself always reads/writes big-endian directly via
/// `to_be_bytes`/`from_be_bytes`; this is kept as a named helper for hosts translating from a
/// little-endian source the way the original did on OS/2.
pub fn flip_u16(value: u16) -> u16 {
    value.swap_bytes()
}

/// Byte-swaps a `u32`. See [`flip_u16`].
pub fn flip_u32(value: u32) -> u32 {
    value.swap_bytes()
}

/// Compares a 4-byte chunk id against an ASCII tag, mirroring the original `MidiCompareID`.
pub fn chunk_id_eq(id: &[u8; 4], tag: &[u8; 4]) -> bool {
    id == tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_round_trips() {
        assert_eq!(0x1234, flip_u16(flip_u16(0x1234)));
        assert_eq!(0x1234_5678, flip_u32(flip_u32(0x1234_5678)));
    }

    #[test]
    fn chunk_id_eq_compares_bytes() {
        assert!(chunk_id_eq(b"MThd", b"MThd"));
        assert!(!chunk_id_eq(b"MThd", b"MTrk"));
    }
}
