//! Property tests over random input buffers, exercising the decoder the way
//! a fuzzer would without requiring one: any byte sequence, in any mode,
//! must either decode to a well-formed instruction or fail outright, never
//! reading past the 15-byte architectural maximum.

use proptest::prelude::*;
use x86_decoder::{decode16, decode32, decode64, DecodeFlags, Instruction, OperandKind};

const MAX_INSTRUCTION_LEN: usize = 15;

proptest! {
    #[test]
    fn decode_never_panics_and_len_is_sane_bits16(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut inst = Instruction::default();
        if decode16(&bytes, 0x1000, &mut inst) {
            prop_assert!(inst.length as usize >= 1);
            prop_assert!(inst.length as usize <= MAX_INSTRUCTION_LEN.min(bytes.len()));
        }
    }

    #[test]
    fn decode_never_panics_and_len_is_sane_bits32(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut inst = Instruction::default();
        if decode32(&bytes, 0x1000, &mut inst) {
            prop_assert!(inst.length as usize >= 1);
            prop_assert!(inst.length as usize <= MAX_INSTRUCTION_LEN.min(bytes.len()));
        }
    }

    #[test]
    fn decode_never_panics_and_len_is_sane_bits64(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut inst = Instruction::default();
        if decode64(&bytes, 0x1000, &mut inst) {
            prop_assert!(inst.length as usize >= 1);
            prop_assert!(inst.length as usize <= MAX_INSTRUCTION_LEN.min(bytes.len()));
        }
    }

    /// A successful decode leaves every operand slot past the last used one
    /// at kind NONE; there is no partial-initialization leak between slots.
    #[test]
    fn unused_operand_slots_are_none(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut inst = Instruction::default();
        if decode32(&bytes, 0x1000, &mut inst) {
            let used = inst.operands.iter().take_while(|o| o.kind != OperandKind::None).count();
            for op in &inst.operands[used..] {
                prop_assert_eq!(op.kind, OperandKind::None);
            }
        }
    }

    /// LOCK is only ever reported alongside a MEM destination operand.
    #[test]
    fn lock_flag_implies_a_memory_operand(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut inst = Instruction::default();
        if decode32(&bytes, 0x1000, &mut inst) && inst.flags.contains(DecodeFlags::LOCK) {
            prop_assert!(inst.operands[0].is_mem() || inst.operands[1].is_mem());
        }
    }

    /// Decoding the same buffer twice is deterministic.
    #[test]
    fn decode_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INSTRUCTION_LEN)) {
        let mut first = Instruction::default();
        let mut second = Instruction::default();
        let ok1 = decode64(&bytes, 0x1000, &mut first);
        let ok2 = decode64(&bytes, 0x1000, &mut second);
        prop_assert_eq!(ok1, ok2);
        if ok1 {
            prop_assert_eq!(first, second);
        }
    }
}
