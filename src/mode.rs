//! CPU operating mode and the default operand/address sizes it implies.
//!
//! The original disassembler exposed three free functions,
//! `Disassemble16`/`Disassemble32`/`Disassemble64`, each hard-coding its own
//! default sizes inline. `CpuMode` pulls that out into one enum so the rest
//! of the decoder takes a mode value instead of being triplicated, while
//! [`crate::decode16`]/[`decode32`]/[`decode64`] keep the three entry
//! points the public API promises.

use crate::registers::OpSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// 16-bit mode: default operand size 16 bits, default address size 16 bits.
    Bits16,
    /// 32-bit protected mode: default operand size 32 bits, default address size 32 bits.
    Bits32,
    /// 64-bit long mode: default operand size 32 bits, default address size 64 bits,
    /// and REX.W present forces a 64-bit operand size.
    Bits64,
}

impl CpuMode {
    pub const fn default_operand_size(self) -> OpSize {
        match self {
            CpuMode::Bits16 => OpSize::Word,
            CpuMode::Bits32 | CpuMode::Bits64 => OpSize::Dword,
        }
    }

    pub const fn default_address_size(self) -> OpSize {
        match self {
            CpuMode::Bits16 => OpSize::Word,
            CpuMode::Bits32 => OpSize::Dword,
            CpuMode::Bits64 => OpSize::Qword,
        }
    }

    pub const fn is_long_mode(self) -> bool {
        matches!(self, CpuMode::Bits64)
    }
}

/// Resolve the effective operand size from the default for the mode, the
/// 0x66 override, and REX.W (REX.W wins over 0x66 in 64-bit mode, and 0x66
/// toggles between 16- and 32-bit everywhere else).
pub fn effective_operand_size(mode: CpuMode, opsize_override: bool, rex_w: bool) -> OpSize {
    if mode.is_long_mode() && rex_w {
        return OpSize::Qword;
    }
    let default = mode.default_operand_size();
    if !opsize_override {
        return default;
    }
    match mode {
        CpuMode::Bits64 => OpSize::Word,
        CpuMode::Bits16 => OpSize::Dword,
        CpuMode::Bits32 => OpSize::Word,
    }
}

/// Resolve the effective address size from the default for the mode and
/// the 0x67 override.
pub fn effective_address_size(mode: CpuMode, addrsize_override: bool) -> OpSize {
    let default = mode.default_address_size();
    if !addrsize_override {
        return default;
    }
    match mode {
        CpuMode::Bits16 => OpSize::Dword,
        CpuMode::Bits32 => OpSize::Word,
        CpuMode::Bits64 => OpSize::Dword,
    }
}
