//! Register identity and the tables used to resolve a 3-bit encoding field
//! (plus an optional REX extension bit) to a concrete register.
//!
//! The original disassembler kept one flat array per register class
//! (`reg8List`, `reg8List64`, `reg16List`, `reg32List`, `reg64List`,
//! `mmxRegList`, `xmmRegList`, `fpuRegList`) and printed register names by
//! indexing into whichever array matched the current operand size. Rust
//! gives us a sum type instead of eight parallel string tables indexed by
//! the same integer, so `Reg` carries its register-class tag instead of the
//! caller needing to remember which array an index came from.

/// A resolved register operand. The wrapped index is always in `0..=15`
/// (`0..=7` for the legacy, non-REX encodings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    /// 8-bit legacy encoding: AL/CL/DL/BL/AH/CH/DH/BH (no REX prefix present).
    Gpr8Legacy(u8),
    /// 8-bit REX encoding: AL/CL/DL/BL/SPL/BPL/SIL/DIL/R8B.. (REX prefix present).
    Gpr8Rex(u8),
    Gpr16(u8),
    Gpr32(u8),
    Gpr64(u8),
    Seg(SegReg),
    Mmx(u8),
    Xmm(u8),
    /// FPU stack register, relative to the current top (ST(0)..ST(7)).
    Fpu(u8),
    Cr(u8),
    Dr(u8),
    Tr(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegReg {
    Es,
    Cs,
    Ss,
    Ds,
    Fs,
    Gs,
}

impl SegReg {
    pub const fn from_index(i: u8) -> Option<Self> {
        Some(match i & 0x7 {
            0 => SegReg::Es,
            1 => SegReg::Cs,
            2 => SegReg::Ss,
            3 => SegReg::Ds,
            4 => SegReg::Fs,
            5 => SegReg::Gs,
            _ => return None,
        })
    }

    pub const fn index(self) -> u8 {
        match self {
            SegReg::Es => 0,
            SegReg::Cs => 1,
            SegReg::Ss => 2,
            SegReg::Ds => 3,
            SegReg::Fs => 4,
            SegReg::Gs => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SegReg::Es => "es",
            SegReg::Cs => "cs",
            SegReg::Ss => "ss",
            SegReg::Ds => "ds",
            SegReg::Fs => "fs",
            SegReg::Gs => "gs",
        }
    }
}

/// Operand size class, in bytes: the thing `%Nb`/`%o` in the formatter
/// template language and the register-list lookups both key off of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpSize {
    Byte,
    Word,
    Dword,
    Qword,
}

impl OpSize {
    pub const fn bytes(self) -> u8 {
        match self {
            OpSize::Byte => 1,
            OpSize::Word => 2,
            OpSize::Dword => 4,
            OpSize::Qword => 8,
        }
    }
}

/// Resolve a 3-bit field (`0..=7`) plus the REX extension bit to a GPR of
/// the given width. `rex_present` distinguishes the two 8-bit encodings:
/// with no REX prefix at all, index 4..=7 name AH/CH/DH/BH; with any REX
/// prefix present (even one with all bits clear), they name SPL/BPL/SIL/DIL.
/// This mirrors the original's separate `reg8List`/`reg8List64` tables
/// selected by whether a REX prefix had been seen.
pub fn gpr(field: u8, ext: bool, size: OpSize, rex_present: bool) -> Reg {
    let idx = (field & 0x7) | if ext { 0x8 } else { 0 };
    match size {
        OpSize::Byte if rex_present => Reg::Gpr8Rex(idx),
        OpSize::Byte => Reg::Gpr8Legacy(idx),
        OpSize::Word => Reg::Gpr16(idx),
        OpSize::Dword => Reg::Gpr32(idx),
        OpSize::Qword => Reg::Gpr64(idx),
    }
}

pub const GPR8_LEGACY_NAMES: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
pub const GPR8_REX_NAMES: [&str; 16] = [
    "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil", "r8b", "r9b", "r10b", "r11b", "r12b",
    "r13b", "r14b", "r15b",
];
pub const GPR16_NAMES: [&str; 16] = [
    "ax", "cx", "dx", "bx", "sp", "bp", "si", "di", "r8w", "r9w", "r10w", "r11w", "r12w", "r13w",
    "r14w", "r15w",
];
pub const GPR32_NAMES: [&str; 16] = [
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi", "r8d", "r9d", "r10d", "r11d", "r12d",
    "r13d", "r14d", "r15d",
];
pub const GPR64_NAMES: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
    "r13", "r14", "r15",
];
pub const MMX_NAMES: [&str; 8] = ["mm0", "mm1", "mm2", "mm3", "mm4", "mm5", "mm6", "mm7"];
pub const XMM_NAMES: [&str; 16] = [
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7", "xmm8", "xmm9", "xmm10",
    "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
];
pub const FPU_NAMES: [&str; 8] = [
    "st(0)", "st(1)", "st(2)", "st(3)", "st(4)", "st(5)", "st(6)", "st(7)",
];

impl Reg {
    /// Render this register to its AT&T-ish lowercase mnemonic name, the
    /// way the original's `WriteOperand` printed directly out of its
    /// register-name arrays.
    pub fn name(self) -> &'static str {
        match self {
            Reg::Gpr8Legacy(i) => GPR8_LEGACY_NAMES[i as usize & 0x7],
            Reg::Gpr8Rex(i) => GPR8_REX_NAMES[i as usize & 0xF],
            Reg::Gpr16(i) => GPR16_NAMES[i as usize & 0xF],
            Reg::Gpr32(i) => GPR32_NAMES[i as usize & 0xF],
            Reg::Gpr64(i) => GPR64_NAMES[i as usize & 0xF],
            Reg::Seg(s) => s.name(),
            Reg::Mmx(i) => MMX_NAMES[i as usize & 0x7],
            Reg::Xmm(i) => XMM_NAMES[i as usize & 0xF],
            Reg::Fpu(i) => FPU_NAMES[i as usize & 0x7],
            Reg::Cr(i) => ["cr0", "cr1", "cr2", "cr3", "cr4", "cr5", "cr6", "cr7"][i as usize & 0x7],
            Reg::Dr(i) => ["dr0", "dr1", "dr2", "dr3", "dr4", "dr5", "dr6", "dr7"][i as usize & 0x7],
            Reg::Tr(i) => ["tr0", "tr1", "tr2", "tr3", "tr4", "tr5", "tr6", "tr7"][i as usize & 0x7],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_high_byte_regs_need_no_rex() {
        assert_eq!(gpr(4, false, OpSize::Byte, false).name(), "ah");
    }

    #[test]
    fn rex_present_remaps_high_byte_slot_to_spl() {
        assert_eq!(gpr(4, false, OpSize::Byte, true).name(), "spl");
    }

    #[test]
    fn rex_extension_reaches_r8_r15() {
        assert_eq!(gpr(0, true, OpSize::Qword, true).name(), "r8");
    }

    #[test]
    fn seg_round_trips() {
        assert_eq!(SegReg::from_index(SegReg::Fs.index()), Some(SegReg::Fs));
    }
}
