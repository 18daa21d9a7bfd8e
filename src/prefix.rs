//! Legacy and REX prefix scanning.
//!
//! Generalizes the teacher crate's `LegacyPrefix`/`RexPrefix`/`PrefixInfo`
//! triplet (`instruction_emulator.rs`) from its EPT-violation-length-only
//! use case to full decode: segment overrides are tracked individually
//! (not just counted), and REX is only honored when it immediately
//! precedes the opcode byte, with no other prefix between it and the
//! opcode. The teacher's `parse_prefixes` captures a REX byte as soon as it
//! sees one after the legacy-prefix loop and never reconsiders it; the
//! reference decoder this crate targets instead drops a tentatively-seen
//! REX byte the moment another prefix byte follows it, which is a real
//! divergence in any stream shaped like `40 66 89 C8` (REX.'s extension
//! bits must NOT apply there — `66` is not a REX byte, so the `40` is
//! just a one-byte NOP-ish legacy opcode... except it appears before the
//! opcode, so it is a prefix slot, and the correct reading is "no REX").

use crate::error::{decode_err, DResult};
use crate::mode::CpuMode;
use crate::reader::Reader;
use crate::registers::SegReg;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RexPrefix {
    pub w: bool,
    pub r: bool,
    pub x: bool,
    pub b: bool,
}

impl RexPrefix {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte & 0xF0 == 0x40 {
            Some(Self {
                w: byte & 0x08 != 0,
                r: byte & 0x04 != 0,
                x: byte & 0x02 != 0,
                b: byte & 0x01 != 0,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixState {
    pub lock: bool,
    pub repne: bool,
    pub rep: bool,
    pub segment: Option<SegReg>,
    pub opsize_override: bool,
    pub addrsize_override: bool,
    /// `Some` only if a REX byte was the prefix byte immediately preceding
    /// the opcode. A REX byte seen earlier, then superseded by another
    /// prefix, is discarded entirely: it decodes as nothing (not even a
    /// redundant `40` opcode byte — prefixes are consumed, not re-read).
    pub rex: Option<RexPrefix>,
}

/// Scan the legacy-prefix / REX prefix run at the start of an instruction.
/// Loops until a non-prefix byte is reached, honoring the last segment
/// override and the last operand-size/address-size override seen (matching
/// `asmx86.c`'s `ProcessPrefixes`, which keeps overwriting rather than
/// rejecting repeats). REX state resets to `None` on every further prefix
/// match so only a REX byte with no other prefix after it survives.
///
/// `0x40..=0x4F` is only a REX prefix in 64-bit mode; in 16/32-bit mode
/// those bytes are the `INC`/`DEC reg` opcodes (primary map 0x40-0x4F) and
/// must fall through to opcode dispatch untouched.
pub fn scan(reader: &mut Reader, mode: CpuMode) -> DResult<PrefixState> {
    let mut state = PrefixState::default();

    loop {
        if reader.is_empty() {
            decode_err!("prefix scan ran off the end of the buffer");
        }
        let byte = reader.peek8()?;

        let matched = match byte {
            0xF0 => {
                state.lock = true;
                true
            }
            0xF2 => {
                state.repne = true;
                state.rep = false;
                true
            }
            0xF3 => {
                state.rep = true;
                state.repne = false;
                true
            }
            0x2E => {
                state.segment = Some(SegReg::Cs);
                true
            }
            0x36 => {
                state.segment = Some(SegReg::Ss);
                true
            }
            0x3E => {
                state.segment = Some(SegReg::Ds);
                true
            }
            0x26 => {
                state.segment = Some(SegReg::Es);
                true
            }
            0x64 => {
                state.segment = Some(SegReg::Fs);
                true
            }
            0x65 => {
                state.segment = Some(SegReg::Gs);
                true
            }
            0x66 => {
                state.opsize_override = true;
                true
            }
            0x67 => {
                state.addrsize_override = true;
                true
            }
            _ => false,
        };

        if matched {
            state.rex = None;
            reader.read8()?;
            continue;
        }

        if mode.is_long_mode() {
            if let Some(rex) = RexPrefix::from_byte(byte) {
                state.rex = Some(rex);
                reader.read8()?;
                continue;
            }
        }

        break;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rex_survives_when_immediately_before_opcode() {
        let mut r = Reader::new(&[0x48, 0x89, 0xC8]);
        let state = scan(&mut r, CpuMode::Bits64).unwrap();
        assert_eq!(state.rex, Some(RexPrefix { w: true, r: false, x: false, b: false }));
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn rex_nullified_by_later_prefix() {
        // REX byte, then a 66 prefix, then the opcode: the REX must not apply.
        let mut r = Reader::new(&[0x48, 0x66, 0x89, 0xC8]);
        let state = scan(&mut r, CpuMode::Bits64).unwrap();
        assert_eq!(state.rex, None);
        assert!(state.opsize_override);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn rex_byte_is_inc_reg_opcode_outside_64bit_mode() {
        // 0x48 in 32-bit mode is `DEC EAX`, not a REX prefix; the prefix
        // scanner must not consume it.
        let mut r = Reader::new(&[0x48]);
        let state = scan(&mut r, CpuMode::Bits32).unwrap();
        assert_eq!(state.rex, None);
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn last_segment_override_wins() {
        let mut r = Reader::new(&[0x2E, 0x64, 0x90]);
        let state = scan(&mut r, CpuMode::Bits32).unwrap();
        assert_eq!(state.segment, Some(SegReg::Fs));
    }

    #[test]
    fn lock_and_rep_are_independent() {
        let mut r = Reader::new(&[0xF0, 0xF3, 0x90]);
        let state = scan(&mut r, CpuMode::Bits32).unwrap();
        assert!(state.lock);
        assert!(state.rep);
    }
}
