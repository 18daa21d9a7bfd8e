#![no_std]
#![doc = include_str!("../README.md")]

#[macro_use]
extern crate log;

extern crate alloc;

mod decoder;
mod error;
mod mode;
mod modrm;
mod operand;
mod prefix;
mod reader;
mod registers;
mod tables;

pub mod format;

pub use error::DecodeError;
pub use mode::CpuMode;
pub use operand::{Condition, DecodeFlags, Instruction, InstructionOperand, OperandKind, Operation};
pub use registers::{OpSize, Reg, SegReg};

/// Decode one instruction from `code` as 16-bit real/virtual-86 mode code,
/// starting at `address`. On success, writes the result into `out` and
/// returns `true`; on any decode failure (truncated buffer, unassigned
/// opcode, or a violated encoding invariant) returns `false` and leaves
/// `out` unspecified, matching the original's boolean-success API surface
/// rather than surfacing the specific failure to callers.
pub fn decode16(code: &[u8], address: u64, out: &mut Instruction) -> bool {
    decode_with_mode(mode::CpuMode::Bits16, code, address, out)
}

/// Decode one instruction from `code` as 32-bit protected-mode code.
pub fn decode32(code: &[u8], address: u64, out: &mut Instruction) -> bool {
    decode_with_mode(mode::CpuMode::Bits32, code, address, out)
}

/// Decode one instruction from `code` as 64-bit long-mode code.
pub fn decode64(code: &[u8], address: u64, out: &mut Instruction) -> bool {
    decode_with_mode(mode::CpuMode::Bits64, code, address, out)
}

fn decode_with_mode(mode: mode::CpuMode, code: &[u8], address: u64, out: &mut Instruction) -> bool {
    match decoder::decode(mode, code, address, out) {
        Ok(()) => true,
        Err(e) => {
            trace!("decode failed at 0x{:x}: {}", address, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_decodes_to_length_one() {
        let mut inst = Instruction::default();
        assert!(decode32(&[0x90], 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Nop);
        assert_eq!(inst.length, 1);
    }

    #[test]
    fn rex_w_mov_reg_reg_in_64bit_mode() {
        let mut inst = Instruction::default();
        assert!(decode64(&[0x48, 0x89, 0xC8], 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Mov);
        assert_eq!(inst.length, 3);
    }

    #[test]
    fn addr32_override_mov_from_displaced_memory() {
        let mut inst = Instruction::default();
        let bytes = [0x67, 0x8B, 0x04, 0x25, 0x78, 0x56, 0x34, 0x12];
        assert!(decode64(&bytes, 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Mov);
        assert_eq!(inst.length, 8);
    }

    #[test]
    fn call_near_resolves_target_relative_to_next_instruction() {
        let mut inst = Instruction::default();
        let bytes = [0xE8, 0x00, 0x00, 0x00, 0x00];
        assert!(decode32(&bytes, 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::CallNear);
        assert_eq!(inst.operands[0].imm, 0x1005);
    }

    #[test]
    fn lock_add_to_memory_is_accepted() {
        let mut inst = Instruction::default();
        let bytes = [0xF0, 0x83, 0x00, 0x01];
        assert!(decode32(&bytes, 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Add);
    }

    #[test]
    fn lock_cmp_is_rejected() {
        let mut inst = Instruction::default();
        let bytes = [0xF0, 0x39, 0xC1];
        assert!(!decode32(&bytes, 0x1000, &mut inst));
    }

    #[test]
    fn fld1_decodes() {
        let mut inst = Instruction::default();
        assert!(decode32(&[0xD9, 0xE8], 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Fld1);
    }

    #[test]
    fn mov_rax_imm64() {
        let mut inst = Instruction::default();
        let bytes = [0x48, 0xB8, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(decode64(&bytes, 0x1000, &mut inst));
        assert_eq!(inst.operation, Operation::Mov);
        assert_eq!(inst.operands[1].imm, 1);
        assert_eq!(inst.length, 10);
    }

    #[test]
    fn truncated_buffer_fails() {
        let mut inst = Instruction::default();
        assert!(!decode32(&[0xF3], 0x1000, &mut inst));
    }
}
