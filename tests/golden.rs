//! End-to-end scenarios, each pinned to a specific byte sequence and the
//! exact decode it must produce. These are the scenario table checked
//! against actual hardware/reference disassembler output, not derived from
//! the implementation, so a correct refactor should never need to touch
//! the expected values here.

use x86_decoder::{decode32, decode64, DecodeFlags, Instruction, OperandKind, Operation, Reg, SegReg};

#[test]
fn nop_decodes_to_length_one() {
    let mut inst = Instruction::default();
    assert!(decode32(&[0x90], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Nop);
    assert_eq!(inst.length, 1);
    assert!(inst.operands[0].is_none());
}

#[test]
fn mov_rax_rcx_in_64bit_mode() {
    let mut inst = Instruction::default();
    assert!(decode64(&[0x48, 0x89, 0xC8], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Mov);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr64(0)));
    assert_eq!(inst.operands[1].components[0], Some(Reg::Gpr64(1)));
    assert_eq!(inst.length, 3);
}

#[test]
fn rip_relative_load_resolves_on_the_memory_operand_not_the_register() {
    // MOV EAX, [RIP+0x10] — the RIP-relative fixup must land on operands[1]
    // (the memory source), not operands[0] (the EAX destination register),
    // since this encoding is `Gv, Ev` (reg first, r/m second).
    let mut inst = Instruction::default();
    let bytes = [0x8B, 0x05, 0x10, 0x00, 0x00, 0x00];
    assert!(decode64(&bytes, 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Mov);
    assert_eq!(inst.length, 6);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr32(0)));
    assert!(inst.operands[1].is_mem());
    // address of next instruction (0x1000 + 6) + displacement (0x10).
    assert_eq!(inst.operands[1].imm, 0x1016);
}

#[test]
fn addr32_override_mov_from_displaced_memory() {
    let mut inst = Instruction::default();
    let bytes = [0x67, 0x8B, 0x04, 0x25, 0x78, 0x56, 0x34, 0x12];
    assert!(decode64(&bytes, 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Mov);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr32(0)));
    assert!(inst.operands[1].is_mem());
    assert_eq!(inst.operands[1].imm, 0x1234_5678);
    assert_eq!(inst.operands[1].size, 4);
    assert_eq!(inst.length, 8);
}

#[test]
fn call_near_resolves_target_relative_to_next_instruction() {
    let mut inst = Instruction::default();
    let bytes = [0xE8, 0x00, 0x00, 0x00, 0x00];
    assert!(decode32(&bytes, 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::CallNear);
    assert_eq!(inst.operands[0].imm, 0x1005);
    assert_eq!(inst.length, 5);
}

#[test]
fn lock_add_to_memory_is_accepted_lock_cmp_is_rejected() {
    let mut inst = Instruction::default();
    let bytes = [0xF0, 0x83, 0x00, 0x01];
    assert!(decode32(&bytes, 0x1000, &mut inst));
    assert!(inst.flags.contains(DecodeFlags::LOCK));
    assert_eq!(inst.operation, Operation::Add);
    assert!(inst.operands[0].is_mem());
    assert_eq!(inst.operands[0].size, 4);
    assert_eq!(inst.operands[1].imm, 1);
    assert_eq!(inst.operands[1].size, 4);
    assert_eq!(inst.length, 4);

    let mut rejected = Instruction::default();
    assert!(!decode32(&[0xF0, 0x39, 0xC1], 0x1000, &mut rejected));
}

#[test]
fn fld1_decodes() {
    let mut inst = Instruction::default();
    assert!(decode32(&[0xD9, 0xE8], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Fld1);
    assert_eq!(inst.length, 2);
}

#[test]
fn mov_rax_imm64() {
    let mut inst = Instruction::default();
    let bytes = [0x48, 0xB8, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    assert!(decode64(&bytes, 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Mov);
    assert_eq!(inst.operands[1].imm as u64, 0x8877_6655_4433_2211);
    assert_eq!(inst.operands[1].size, 8);
    assert_eq!(inst.length, 10);
}

#[test]
fn truncated_buffer_fails() {
    let mut inst = Instruction::default();
    assert!(!decode32(&[0xF3, 0xA4][..1], 0x1000, &mut inst));
}

#[test]
fn bound_requires_a_memory_operand() {
    // BOUND EAX, [EBX] — valid (mod != 3, so ModR/M names memory).
    let mut inst = Instruction::default();
    assert!(decode32(&[0x62, 0x03], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Bound);
    assert!(inst.operands[1].is_mem());
    assert_eq!(inst.operands[1].size, 8);

    // BOUND EAX, ECX — mod == 3 names a register, which BOUND never allows.
    let mut rejected = Instruction::default();
    assert!(!decode32(&[0x62, 0xC1], 0x1000, &mut rejected));
}

#[test]
fn bound_is_invalid_in_64bit_mode() {
    let mut inst = Instruction::default();
    assert!(!decode64(&[0x62, 0x03], 0x1000, &mut inst));
}

#[test]
fn lds_loads_a_far_pointer_from_memory() {
    // LDS ECX, [EAX]
    let mut inst = Instruction::default();
    assert!(decode32(&[0xC5, 0x08], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Lds);
    assert!(inst.operands[1].is_mem());
    assert_eq!(inst.operands[1].size, 6);

    // Register-form r/m is not a valid LDS source.
    let mut rejected = Instruction::default();
    assert!(!decode32(&[0xC5, 0xC8], 0x1000, &mut rejected));
}

#[test]
fn lea_rejects_a_register_rm() {
    // LEA EAX, ECX — LEA's r/m must resolve to memory.
    let mut inst = Instruction::default();
    assert!(!decode32(&[0x8D, 0xC1], 0x1000, &mut inst));
}

#[test]
fn lea_computes_an_address_without_reading_memory() {
    // LEA EAX, [ECX+4]
    let mut inst = Instruction::default();
    assert!(decode32(&[0x8D, 0x41, 0x04], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Lea);
    assert!(inst.operands[1].is_mem());
    assert_eq!(inst.length, 3);
}

#[test]
fn mov_to_cs_is_rejected() {
    // MOV CS, AX (opcode 8E /1) — CS is never a valid MOV destination.
    let mut inst = Instruction::default();
    assert!(!decode32(&[0x8E, 0xC8], 0x1000, &mut inst));
}

#[test]
fn pusha_is_invalid_in_64bit_mode_but_valid_in_32bit() {
    let mut inst32 = Instruction::default();
    assert!(decode32(&[0x60], 0x1000, &mut inst32));
    assert_eq!(inst32.operation, Operation::Pusha);

    let mut inst64 = Instruction::default();
    assert!(!decode64(&[0x60], 0x1000, &mut inst64));
}

#[test]
fn movsd_populates_both_dword_memory_operands_es_hard_ds_default() {
    // A5 in 32-bit mode: MOVS dword ES:[EDI], DS:[ESI].
    let mut inst = Instruction::default();
    assert!(decode32(&[0xA5], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Movs);
    assert_eq!(inst.length, 1);

    assert_eq!(inst.operands[0].kind, OperandKind::Mem);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr32(7))); // EDI
    assert_eq!(inst.operands[0].size, 4);
    assert_eq!(inst.operands[0].segment, Some(SegReg::Es));

    assert_eq!(inst.operands[1].kind, OperandKind::Mem);
    assert_eq!(inst.operands[1].components[0], Some(Reg::Gpr32(6))); // ESI
    assert_eq!(inst.operands[1].size, 4);
    // DS is the default and is not overridden here, so it stays unset —
    // the formatter's print-only-if-set rule then omits the redundant `ds:`.
    assert_eq!(inst.operands[1].segment, None);
}

#[test]
fn movsb_source_segment_is_overridable_destination_is_not() {
    // 2E A4: CS: MOVS byte ES:[EDI], DS:[ESI] (CS override applies to the
    // source half; the destination stays hard-wired to ES).
    let mut inst = Instruction::default();
    assert!(decode32(&[0x2E, 0xA4], 0x1000, &mut inst));
    assert_eq!(inst.operands[0].segment, Some(SegReg::Es));
    assert_eq!(inst.operands[1].segment, Some(SegReg::Cs));
}

#[test]
fn stosb_writes_only_the_destination_memory_operand() {
    let mut inst = Instruction::default();
    assert!(decode32(&[0xAA], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Stos);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr32(7))); // EDI
    assert_eq!(inst.operands[0].segment, Some(SegReg::Es));
    assert!(inst.operands[1].is_none());
}

#[test]
fn outs_pairs_dx_with_the_source_memory_operand() {
    // 6F: OUTS DX, DS:[ESI] (operand size follows the current default, dword
    // absent an 0x66 override).
    let mut inst = Instruction::default();
    assert!(decode32(&[0x6F], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Outs);
    assert_eq!(inst.operands[0].components[0], Some(Reg::Gpr16(2))); // DX
    assert_eq!(inst.operands[1].components[0], Some(Reg::Gpr32(6))); // ESI (addr-size)
    assert_eq!(inst.operands[1].size, 4);
}

#[test]
fn jcxz_family_is_selected_by_address_size_not_operand_size() {
    // E3 with no prefixes, 32-bit mode: JECXZ (32-bit address size).
    let mut inst = Instruction::default();
    assert!(decode32(&[0xE3, 0x02], 0x1000, &mut inst));
    assert_eq!(inst.operation, Operation::Jecxz);

    // 67 E3, 32-bit mode: 0x67 narrows the address size to 16-bit, so JCXZ.
    let mut inst16 = Instruction::default();
    assert!(decode32(&[0x67, 0xE3, 0x02], 0x1000, &mut inst16));
    assert_eq!(inst16.operation, Operation::Jcxz);

    // E3, 64-bit mode: JRCXZ (64-bit address size).
    let mut inst64 = Instruction::default();
    assert!(decode64(&[0xE3, 0x02], 0x1000, &mut inst64));
    assert_eq!(inst64.operation, Operation::Jrcxz);

    // 67 E3, 64-bit mode: 0x67 narrows the address size to 32-bit, so JECXZ.
    let mut inst64_32 = Instruction::default();
    assert!(decode64(&[0x67, 0xE3, 0x02], 0x1000, &mut inst64_32));
    assert_eq!(inst64_32.operation, Operation::Jecxz);
}

#[test]
fn cbw_family_is_selected_by_operand_size() {
    // 98, 32-bit mode: CWDE.
    let mut inst32 = Instruction::default();
    assert!(decode32(&[0x98], 0x1000, &mut inst32));
    assert_eq!(inst32.operation, Operation::Cwde);

    // 66 98, 32-bit mode: 0x66 narrows to 16-bit operand size, so CBW.
    let mut inst16 = Instruction::default();
    assert!(decode32(&[0x66, 0x98], 0x1000, &mut inst16));
    assert_eq!(inst16.operation, Operation::Cbw);

    // 48 98, 64-bit mode: REX.W widens to 64-bit operand size, so CDQE.
    let mut inst64 = Instruction::default();
    assert!(decode64(&[0x48, 0x98], 0x1000, &mut inst64));
    assert_eq!(inst64.operation, Operation::Cdqe);
}

#[test]
fn cwd_family_is_selected_by_operand_size() {
    // 99, 32-bit mode: CDQ.
    let mut inst32 = Instruction::default();
    assert!(decode32(&[0x99], 0x1000, &mut inst32));
    assert_eq!(inst32.operation, Operation::Cdq);

    // 48 99, 64-bit mode: REX.W widens to 64-bit operand size, so CQO.
    let mut inst64 = Instruction::default();
    assert!(decode64(&[0x48, 0x99], 0x1000, &mut inst64));
    assert_eq!(inst64.operation, Operation::Cqo);
}

#[test]
fn group6_lldt_forces_a_16bit_selector_operand() {
    // 0F 00 /2 (LLDT) on a register r/m: reg >= 2 forces a 16-bit operand
    // size even though this is decoded in 32-bit mode with no 0x66 prefix.
    let mut inst = Instruction::default();
    assert!(decode32(&[0x0F, 0x00, 0xD0], 0x1000, &mut inst)); // ModRM: mod=11 reg=010 rm=000 -> LLDT AX
    assert_eq!(inst.operation, Operation::Lldt);
    assert_eq!(inst.operands[0].size, 2);
}

#[test]
fn group6_sldt_uses_the_normal_operand_size() {
    // 0F 00 /0 (SLDT) on a register r/m in 32-bit mode: reg < 2, so the
    // normal (dword) operand size applies, not the forced 16-bit selector
    // size that the load forms (reg >= 2) get.
    let mut inst = Instruction::default();
    assert!(decode32(&[0x0F, 0x00, 0xC0], 0x1000, &mut inst)); // mod=11 reg=000 rm=000 -> SLDT EAX
    assert_eq!(inst.operation, Operation::Sldt);
    assert_eq!(inst.operands[0].size, 4);
}

#[test]
fn group7_sgdt_requires_memory_and_is_sized_to_the_descriptor_pointer() {
    // 0F 01 /0 (SGDT) on a memory r/m: 6-byte pointer outside long mode.
    let mut inst = Instruction::default();
    assert!(decode32(&[0x0F, 0x01, 0x00], 0x1000, &mut inst)); // [EAX], mod=00 reg=000 rm=000
    assert_eq!(inst.operation, Operation::Sgdt);
    assert!(inst.operands[0].is_mem());
    assert_eq!(inst.operands[0].size, 6);

    // Same encoding in 64-bit mode: 10-byte pointer.
    let mut inst64 = Instruction::default();
    assert!(decode64(&[0x0F, 0x01, 0x00], 0x1000, &mut inst64));
    assert_eq!(inst64.operands[0].size, 10);

    // A register r/m is never valid for SGDT.
    let mut rejected = Instruction::default();
    assert!(!decode32(&[0x0F, 0x01, 0xC0], 0x1000, &mut rejected));
}

#[test]
fn group7_lmsw_forces_a_16bit_operand() {
    // 0F 01 /6 (LMSW) on a register r/m: reg == 6 forces 16-bit.
    let mut inst = Instruction::default();
    assert!(decode32(&[0x0F, 0x01, 0xF0], 0x1000, &mut inst)); // mod=11 reg=110 rm=000 -> LMSW AX
    assert_eq!(inst.operation, Operation::Lmsw);
    assert_eq!(inst.operands[0].size, 2);
}

#[test]
fn group7_invlpg_is_memory_only_and_byte_sized() {
    let mut inst = Instruction::default();
    assert!(decode32(&[0x0F, 0x01, 0x38], 0x1000, &mut inst)); // INVLPG [EAX]
    assert_eq!(inst.operation, Operation::Invlpg);
    assert!(inst.operands[0].is_mem());
    assert_eq!(inst.operands[0].size, 1);

    let mut rejected = Instruction::default();
    assert!(!decode32(&[0x0F, 0x01, 0xF8], 0x1000, &mut rejected)); // register r/m is invalid
}
