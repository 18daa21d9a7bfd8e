//! The top-level decode pipeline: prefix scan, opcode lookup, operand
//! construction, and the post-decode invariant checks the spec requires
//! (LOCK only on a memory destination, no far-pointer truncation, CS never
//! a writable destination, total length never exceeding 15 bytes).
//!
//! This plays the role the original's `ProcessEncoding`/`ProcessOpcode`
//! pair played, but as one explicit state machine over an immutable
//! `Reader` instead of a `State` struct mutated in place by every helper it
//! called.

use crate::error::{decode_err, DecodeError};
use crate::mode::{effective_address_size, effective_operand_size, CpuMode};
use crate::modrm::{read_modrm, RmContext, RmRegClass};
use crate::operand::{DecodeFlags, Instruction, InstructionOperand, Operation, RipFixup};
use crate::prefix::{self, PrefixState};
use crate::reader::Reader;
use crate::registers::{gpr, OpSize, Reg, SegReg};
use crate::tables::groups::{self, GroupId};
use crate::tables::{fpu, primary, three_d_now, two_byte, Encoding, OpcodeEntry};

const MAX_INSTRUCTION_LENGTH: usize = 15;

pub fn decode(mode: CpuMode, code: &[u8], address: u64, out: &mut Instruction) -> Result<(), DecodeError> {
    if code.is_empty() {
        decode_err!("decode: empty buffer");
    }
    // The encoding itself never exceeds 15 bytes; truncate the working
    // view so a too-long buffer can't hide a length miscount, while still
    // allowing a caller to pass a longer slice (e.g. a whole code page).
    let window = &code[..code.len().min(MAX_INSTRUCTION_LENGTH)];
    let mut reader = Reader::new(window);

    let prefixes = prefix::scan(&mut reader, mode)?;
    let rex_w = prefixes.rex.map_or(false, |r| r.w);
    let operand_size = effective_operand_size(mode, prefixes.opsize_override, rex_w);
    let address_size = effective_address_size(mode, prefixes.addrsize_override);

    let opcode_byte = reader.read8()?;
    let (entry, two_byte_opcode) = if opcode_byte == 0x0F {
        (two_byte::TWO_BYTE[reader.read8()? as usize], true)
    } else {
        (primary::PRIMARY[opcode_byte as usize], false)
    };

    let ctx = RmContext {
        mode,
        address_size,
        operand_size,
        rex_r: prefixes.rex.map_or(false, |r| r.r),
        rex_x: prefixes.rex.map_or(false, |r| r.x),
        rex_b: prefixes.rex.map_or(false, |r| r.b),
        rex_present: prefixes.rex.is_some(),
        segment_override: prefixes.segment,
        rm_reg_class: crate::modrm::RmRegClass::Gpr,
    };

    let mut inst = Instruction::default();
    inst.segment = prefixes.segment;
    apply_prefix_flags(&mut inst, &prefixes);

    let mut rip_fixup: Option<RipFixup> = None;

    match entry {
        OpcodeEntry::Invalid => decode_err!("opcode 0x{:02x} has no table entry", opcode_byte),
        OpcodeEntry::Escape => decode_err!("unexpected escape entry reached after dispatch"),
        OpcodeEntry::Final(op, enc) => {
            build_final(&mut reader, &ctx, op, enc, &mut inst, &mut rip_fixup)?;
        }
        OpcodeEntry::Group(group, enc) => {
            build_group(&mut reader, &ctx, group, enc, &mut inst, &mut rip_fixup)?;
        }
    }

    let _ = two_byte_opcode;

    if reader.position() > MAX_INSTRUCTION_LENGTH {
        decode_err!("instruction length {} exceeds architectural maximum", reader.position());
    }
    inst.length = reader.position() as u8;

    finalize(&mut inst, address, rip_fixup)?;
    validate(&inst, mode)?;

    *out = inst;
    Ok(())
}

fn apply_prefix_flags(inst: &mut Instruction, p: &PrefixState) {
    if p.lock {
        inst.flags |= DecodeFlags::LOCK;
    }
    if p.rep {
        inst.flags |= DecodeFlags::REP | DecodeFlags::REPE;
    }
    if p.repne {
        inst.flags |= DecodeFlags::REPNE;
    }
    if p.opsize_override {
        inst.flags |= DecodeFlags::OPSIZE_PREFIX_PRESENT;
    }
    if p.addrsize_override {
        inst.flags |= DecodeFlags::ADDRSIZE_PREFIX_PRESENT;
    }
    if p.rex.is_some() {
        inst.flags |= DecodeFlags::REX_PRESENT;
    }
}

/// Apply the RIP-relative fixup (displacement becomes `disp` relative to
/// the end of the instruction, once its length is known) and stamp the
/// operation's mode-dependent variant (e.g. `CBW` vs `CWDE` vs `CDQE`).
fn finalize(inst: &mut Instruction, address: u64, fixup: Option<RipFixup>) -> Result<(), DecodeError> {
    if let Some(fx) = fixup {
        let end = address.wrapping_add(inst.length as u64);
        inst.operands[fx.operand_index].imm = (end as i64).wrapping_add(fx.disp);
    }
    Ok(())
}

/// Encodings the architecture removed entirely in 64-bit mode rather than
/// merely reinterpreting (unlike, say, `INC`/`DEC` stealing the one-byte
/// opcodes that used to be `INC`/`DEC` reg and becoming REX prefixes).
fn invalid_in_64bit(op: Operation) -> bool {
    matches!(
        op,
        Operation::Pusha
            | Operation::Popa
            | Operation::Bound
            | Operation::Daa
            | Operation::Das
            | Operation::Aaa
            | Operation::Aas
            | Operation::Aam
            | Operation::Aad
            | Operation::Into
    )
}

fn validate(inst: &Instruction, mode: CpuMode) -> Result<(), DecodeError> {
    if mode.is_long_mode() && invalid_in_64bit(inst.operation) {
        decode_err!("{:?} is invalid in 64-bit mode", inst.operation);
    }
    if inst.flags.contains(DecodeFlags::LOCK) {
        let dest_is_mem = inst.operands[0].is_mem();
        let lockable = matches!(
            inst.operation,
            Operation::Add | Operation::Adc | Operation::And | Operation::Btc | Operation::Btr
                | Operation::Bts | Operation::Dec | Operation::Inc | Operation::Neg | Operation::Not
                | Operation::Or | Operation::Sbb | Operation::Sub | Operation::Xor | Operation::Xchg
                | Operation::Xadd | Operation::Cmpxchg | Operation::Cmpxchg8b | Operation::Cmpxchg16b
        );
        if !dest_is_mem || !lockable {
            decode_err!("LOCK prefix on non-lockable or non-memory-destination instruction");
        }
    }
    if inst.length > MAX_INSTRUCTION_LENGTH as u8 {
        decode_err!("instruction length {} exceeds 15 bytes", inst.length);
    }
    Ok(())
}

fn build_final(
    reader: &mut Reader,
    ctx: &RmContext,
    op: Operation,
    enc: Encoding,
    inst: &mut Instruction,
    fixup: &mut Option<RipFixup>,
) -> Result<(), DecodeError> {
    inst.operation = op;
    decode_operands(reader, ctx, enc, inst, fixup, None)
}

fn build_group(
    reader: &mut Reader,
    ctx: &RmContext,
    group: GroupId,
    enc: Encoding,
    inst: &mut Instruction,
    fixup: &mut Option<RipFixup>,
) -> Result<(), DecodeError> {
    decode_operands(reader, ctx, enc, inst, fixup, Some(group))
}

/// Build operands for one encoding pattern. `group` is `Some` when the
/// final operation is resolved from the ModR/M reg field rather than fixed
/// by the opcode; in that case `inst.operation` is set here, once the reg
/// field has been read, instead of by the caller.
fn decode_operands(
    reader: &mut Reader,
    ctx: &RmContext,
    enc: Encoding,
    inst: &mut Instruction,
    fixup: &mut Option<RipFixup>,
    group: Option<GroupId>,
) -> Result<(), DecodeError> {
    use Encoding as E;

    let byte_ctx = || RmContext {
        operand_size: OpSize::Byte,
        ..ctx_copy(ctx)
    };

    match enc {
        // CBW/CWDE/CDQE (0x98) and CWD/CDQ/CQO (0x99) share one opcode slot
        // each across all three operand sizes; the mnemonic family is
        // selected by `ctx.operand_size`, the same "operation depends on
        // operand size" adjustment §4.7 names for other opcode families.
        E::Implicit if inst.operation == Operation::Cbw => {
            inst.operation = match ctx.operand_size {
                OpSize::Word => Operation::Cbw,
                OpSize::Dword => Operation::Cwde,
                OpSize::Qword => Operation::Cdqe,
                OpSize::Byte => decode_err!("CBW family: operand size cannot be byte-sized"),
            };
        }
        E::Implicit if inst.operation == Operation::Cwd => {
            inst.operation = match ctx.operand_size {
                OpSize::Word => Operation::Cwd,
                OpSize::Dword => Operation::Cdq,
                OpSize::Qword => Operation::Cqo,
                OpSize::Byte => decode_err!("CWD family: operand size cannot be byte-sized"),
            };
        }
        E::Implicit => {}

        E::EbGb | E::EvGv | E::GbEb | E::GvEv | E::GvEb | E::GvEw => {
            let rm_ctx = match enc {
                E::EbGb | E::GbEb | E::GvEb => byte_ctx(),
                E::GvEw => RmContext { operand_size: OpSize::Word, ..ctx_copy(ctx) },
                _ => ctx_copy(ctx),
            };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            let reg_size = if matches!(enc, E::GvEb | E::GvEw) { ctx.operand_size } else { rm_ctx.operand_size };
            let reg = gpr(modrm.reg, ctx.rex_r, reg_size, ctx.rex_present);
            let reg_operand = InstructionOperand::reg(reg, reg_size.bytes());
            let rm_index = if matches!(enc, E::EbGb | E::EvGv) { 0 } else { 1 };
            // LEA's r/m is "no-size": it names an address, never a value, so
            // it must resolve to MEM and carries no meaningful width.
            let rm_operand = if inst.operation == Operation::Lea {
                if rm.reg.is_some() {
                    decode_err!("LEA requires a memory r/m operand");
                }
                rm_to_operand_sized(&rm, 0, rm_index, fixup)
            } else {
                rm_to_operand(&rm, rm_ctx.operand_size, rm_index, fixup)
            };
            match enc {
                E::EbGb | E::EvGv => {
                    inst.operands[0] = rm_operand;
                    inst.operands[1] = reg_operand;
                }
                _ => {
                    inst.operands[0] = reg_operand;
                    inst.operands[1] = rm_operand;
                }
            }
        }

        E::AlIb => {
            inst.operands[0] = InstructionOperand::reg(Reg::Gpr8Legacy(0), 1);
            inst.operands[1] = InstructionOperand::imm(reader.read_signed8()?, 1);
        }
        E::EaxIz => {
            let reg = gpr(0, false, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            inst.operands[1] = InstructionOperand::imm(read_iz(reader, ctx.operand_size)?, ctx.operand_size.bytes());
        }

        E::RegIb => {
            let field = current_opcode_low_bits(reader)?;
            let reg = gpr(field, ctx.rex_b, OpSize::Byte, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, 1);
            inst.operands[1] = InstructionOperand::imm(reader.read_signed8()?, 1);
        }
        E::RegIv => {
            let field = current_opcode_low_bits(reader)?;
            let reg = gpr(field, ctx.rex_b, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            let size = ctx.operand_size;
            let imm = if size == OpSize::Qword { reader.read64()? as i64 } else { read_iz(reader, size)? };
            inst.operands[1] = InstructionOperand::imm(imm, size.bytes());
        }
        E::Reg => {
            let field = current_opcode_low_bits(reader)?;
            let reg = gpr(field, ctx.rex_b, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
        }

        E::Jb | E::CcJb => {
            let disp = reader.read_signed8()?;
            inst.operands[0] = InstructionOperand::imm(0, 1);
            *fixup = Some(RipFixup { operand_index: 0, disp });
            // JCXZ (opcode 0xE3) is the same rel8 encoding for JCXZ/JECXZ/
            // JRCXZ; the address size in effect (not the operand size)
            // picks which of the three this actually is.
            if inst.operation == Operation::Jcxz {
                inst.operation = match ctx.address_size {
                    OpSize::Word => Operation::Jcxz,
                    OpSize::Dword => Operation::Jecxz,
                    OpSize::Qword => Operation::Jrcxz,
                    OpSize::Byte => decode_err!("JCXZ: address size cannot be byte-sized"),
                };
            }
        }
        E::Jz | E::CcJz => {
            let disp = read_iz(reader, ctx.operand_size)?;
            inst.operands[0] = InstructionOperand::imm(0, ctx.operand_size.bytes());
            *fixup = Some(RipFixup { operand_index: 0, disp });
        }

        E::Ap => {
            let offset = read_iz(reader, ctx.operand_size)?;
            let selector = reader.read16()?;
            inst.operands[0] = InstructionOperand::imm(selector as i64, 2);
            inst.operands[1] = InstructionOperand::imm(offset, ctx.operand_size.bytes());
        }

        E::ImmB => {
            inst.operands[0] = InstructionOperand::imm(reader.read_signed8()?, 1);
        }
        E::ImmW => {
            inst.operands[0] = InstructionOperand::imm(reader.read16()? as i64, 2);
        }
        E::ImmZ => {
            inst.operands[0] = InstructionOperand::imm(read_iz(reader, ctx.operand_size)?, ctx.operand_size.bytes());
        }
        E::IwIb => {
            inst.operands[0] = InstructionOperand::imm(reader.read16()? as i64, 2);
            inst.operands[1] = InstructionOperand::imm(reader.read8()? as i64, 1);
        }

        E::GvEvIz | E::GvEvIb => {
            let (modrm, rm) = read_modrm(reader, ctx)?;
            let reg = gpr(modrm.reg, ctx.rex_r, ctx.operand_size, ctx.rex_present);
            let imm = if enc == E::GvEvIz { read_iz(reader, ctx.operand_size)? } else { reader.read_signed8()? };
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            inst.operands[1] = rm_to_operand(&rm, ctx.operand_size, 1, fixup);
            inst.operands[2] = InstructionOperand::imm(imm, ctx.operand_size.bytes());
        }

        E::MoffsToAl | E::AlToMoffs => {
            let offset = read_iz(reader, ctx.address_size)?;
            let mem = InstructionOperand {
                kind: crate::operand::OperandKind::Mem,
                imm: offset,
                size: 1,
                segment: ctx.segment_override,
                ..InstructionOperand::none()
            };
            let al = InstructionOperand::reg(Reg::Gpr8Legacy(0), 1);
            if enc == E::MoffsToAl {
                inst.operands[0] = al;
                inst.operands[1] = mem;
            } else {
                inst.operands[0] = mem;
                inst.operands[1] = al;
            }
        }
        E::MoffsToEax | E::EaxToMoffs => {
            let offset = read_iz(reader, ctx.address_size)?;
            let mem = InstructionOperand {
                kind: crate::operand::OperandKind::Mem,
                imm: offset,
                size: ctx.operand_size.bytes(),
                segment: ctx.segment_override,
                ..InstructionOperand::none()
            };
            let eax = InstructionOperand::reg(gpr(0, false, ctx.operand_size, ctx.rex_present), ctx.operand_size.bytes());
            if enc == E::MoffsToEax {
                inst.operands[0] = eax;
                inst.operands[1] = mem;
            } else {
                inst.operands[0] = mem;
                inst.operands[1] = eax;
            }
        }

        E::EaxIb => {
            inst.operands[0] = InstructionOperand::reg(gpr(0, false, ctx.operand_size, ctx.rex_present), ctx.operand_size.bytes());
            inst.operands[1] = InstructionOperand::imm(reader.read8()? as i64, 1);
        }
        E::IbAl => {
            inst.operands[0] = InstructionOperand::imm(reader.read8()? as i64, 1);
            inst.operands[1] = InstructionOperand::reg(Reg::Gpr8Legacy(0), 1);
        }
        E::IbEax => {
            inst.operands[0] = InstructionOperand::imm(reader.read8()? as i64, 1);
            inst.operands[1] = InstructionOperand::reg(gpr(0, false, ctx.operand_size, ctx.rex_present), ctx.operand_size.bytes());
        }

        E::StringOp => {
            // Size is the opcode's own low bit: clear selects the Bb
            // (byte) form, set selects the current operand size (Bw/Bd/Bq).
            let size = if current_opcode_byte(reader)? & 1 == 0 { OpSize::Byte } else { ctx.operand_size };
            let src_base = gpr(6, false, ctx.address_size, true); // (r)SI
            let dst_base = gpr(7, false, ctx.address_size, true); // (r)DI
            let src_mem = InstructionOperand {
                kind: crate::operand::OperandKind::Mem,
                components: [Some(src_base), None],
                size: size.bytes(),
                // DS is the default and may be overridden by a segment
                // prefix; `None` here lets the formatter's usual
                // print-only-if-set rule suppress the redundant `ds:`.
                segment: ctx.segment_override,
                ..InstructionOperand::none()
            };
            let dst_mem = InstructionOperand {
                kind: crate::operand::OperandKind::Mem,
                components: [Some(dst_base), None],
                size: size.bytes(),
                // ES is hard-wired for the destination half of a string
                // op and cannot be overridden by a segment prefix, unlike
                // the source half above.
                segment: Some(SegReg::Es),
                ..InstructionOperand::none()
            };
            let dx = InstructionOperand::reg(Reg::Gpr16(2), 2);

            match inst.operation {
                Operation::Movs | Operation::Scas => {
                    // SCAS compares AL/eAX against ES:[rDI]; only the
                    // destination-side memory operand is explicit.
                    inst.operands[0] = dst_mem;
                    if inst.operation == Operation::Movs {
                        inst.operands[1] = src_mem;
                    }
                }
                Operation::Cmps => {
                    inst.operands[0] = src_mem;
                    inst.operands[1] = dst_mem;
                }
                Operation::Stos => inst.operands[0] = dst_mem,
                Operation::Lods => inst.operands[0] = src_mem,
                Operation::Ins => {
                    inst.operands[0] = dst_mem;
                    inst.operands[1] = dx;
                }
                Operation::Outs => {
                    inst.operands[0] = dx;
                    inst.operands[1] = src_mem;
                }
                _ => decode_err!("{:?} reached the string-op handler", inst.operation),
            }
        }

        E::EvSw | E::SwEv => {
            let rm_ctx = RmContext { operand_size: OpSize::Word, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            let seg = match SegReg::from_index(modrm.reg) {
                Some(s) => s,
                None => decode_err!("reg field {} names no segment register", modrm.reg),
            };
            let seg_operand = InstructionOperand::reg(Reg::Seg(seg), 2);
            let rm_index = if enc == E::EvSw { 0 } else { 1 };
            let rm_operand = rm_to_operand(&rm, OpSize::Word, rm_index, fixup);
            if enc == E::EvSw {
                inst.operands[0] = rm_operand;
                inst.operands[1] = seg_operand;
            } else {
                // MOV Sw, Ev: CS is readable as a segment override but the
                // architecture forbids it as a MOV destination.
                if seg == SegReg::Cs {
                    decode_err!("MOV to CS (segment register destination) is invalid");
                }
                inst.operands[0] = seg_operand;
                inst.operands[1] = rm_operand;
            }
        }

        E::GroupE if group == Some(GroupId::Group5) => {
            // Group 5 (opcode FF): in 64-bit mode, reg in {2,3,4,5} (the
            // indirect CALLN/CALLF/JMPN/JMPF forms) forces a 64-bit operand
            // size unless 0x66 already reduced it to 32-bit; CALLF/JMPF
            // (reg 3/5) additionally require a memory r/m and widen that
            // memory operand's size by 2 (selector:offset far pointer).
            let peeked = reader.peek8()?;
            let reg_field = (peeked >> 3) & 0x7;
            let mut size = ctx.operand_size;
            if ctx.mode.is_long_mode()
                && matches!(reg_field, 2 | 3 | 4 | 5)
                && !inst.flags.contains(DecodeFlags::OPSIZE_PREFIX_PRESENT)
            {
                size = OpSize::Qword;
            }
            let rm_ctx = RmContext { operand_size: size, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            inst.operation = groups::resolve(GroupId::Group5, modrm.reg);

            if matches!(inst.operation, Operation::CallFar | Operation::JmpFar) {
                if rm.reg.is_some() {
                    decode_err!("CALLF/JMPF via FF group requires a memory r/m, not a register");
                }
                inst.operands[0] = InstructionOperand {
                    kind: crate::operand::OperandKind::Mem,
                    components: [rm.mem_base, rm.mem_index],
                    scale: rm.mem_scale,
                    imm: rm.mem_disp,
                    size: size.bytes() + 2,
                    segment: rm.segment_override,
                };
                if rm.is_rip_relative {
                    *fixup = Some(RipFixup { operand_index: 0, disp: inst.operands[0].imm });
                    inst.operands[0].imm = 0;
                }
            } else {
                inst.operands[0] = rm_to_operand(&rm, size, 0, fixup);
            }
        }

        E::GroupE if group == Some(GroupId::Group9) => {
            // CMPXCHG8B/16B (0F C7 /1): a 16-bit operand size promotes to
            // 32-bit (there is no CMPXCHG4B); REX.W selects the 128-bit
            // form and renames the operation. The r/m must be memory, sized
            // to twice the (possibly promoted) operand width.
            let mut size = if ctx.operand_size == OpSize::Word { OpSize::Dword } else { ctx.operand_size };
            let is_16b = size == OpSize::Qword;
            let (modrm, rm) = read_modrm(reader, &RmContext { operand_size: size, ..ctx_copy(ctx) })?;
            inst.operation = groups::resolve(GroupId::Group9, modrm.reg);
            if inst.operation == Operation::Cmpxchg8b && is_16b {
                inst.operation = Operation::Cmpxchg16b;
            }
            if rm.reg.is_some() {
                decode_err!("CMPXCHG8B/16B requires a memory r/m, not a register");
            }
            inst.operands[0] = InstructionOperand {
                kind: crate::operand::OperandKind::Mem,
                components: [rm.mem_base, rm.mem_index],
                scale: rm.mem_scale,
                imm: rm.mem_disp,
                size: size.bytes() * 2,
                segment: rm.segment_override,
            };
            if rm.is_rip_relative {
                *fixup = Some(RipFixup { operand_index: 0, disp: inst.operands[0].imm });
                inst.operands[0].imm = 0;
            }
        }

        E::GroupE if group == Some(GroupId::Group6) => {
            // 0F 00 group: SLDT/STR/LLDT/LTR/VERR/VERW. reg >= 2 (the
            // load forms) forces a 16-bit selector operand size
            // regardless of the current default; SLDT/STR (reg 0/1)
            // use the normal operand size.
            let peeked = reader.peek8()?;
            let reg_field = (peeked >> 3) & 0x7;
            let size = if reg_field >= 2 { OpSize::Word } else { ctx.operand_size };
            let rm_ctx = RmContext { operand_size: size, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            inst.operation = groups::resolve(GroupId::Group6, modrm.reg);
            inst.operands[0] = rm_to_operand(&rm, size, 0, fixup);
        }

        E::GroupE if group == Some(GroupId::Group7) => {
            // 0F 01 group. reg < 4 (SGDT/SIDT/LGDT/LIDT) stores/loads a
            // GDT/IDT pseudo-descriptor: memory-only, 6 bytes outside
            // long mode (16-bit limit + 32-bit base) or 10 bytes inside
            // it (16-bit limit + 64-bit base). reg 4/6 (SMSW/LMSW) force
            // a 16-bit operand size. reg 7 (INVLPG) is memory-only and
            // forces byte size, since it never has a meaningful operand
            // width of its own.
            let peeked = reader.peek8()?;
            let reg_field = (peeked >> 3) & 0x7;
            let ptr_width: u8 = if ctx.mode.is_long_mode() { 10 } else { 6 };
            let size = match reg_field {
                4 | 6 => OpSize::Word,
                _ => ctx.operand_size,
            };
            let rm_ctx = RmContext { operand_size: size, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            inst.operation = groups::resolve(GroupId::Group7, modrm.reg);
            match reg_field {
                0..=3 => {
                    if rm.reg.is_some() {
                        decode_err!("SGDT/SIDT/LGDT/LIDT requires a memory r/m operand");
                    }
                    inst.operands[0] = rm_to_operand_sized(&rm, ptr_width, 0, fixup);
                }
                7 => {
                    if rm.reg.is_some() {
                        decode_err!("INVLPG requires a memory r/m operand");
                    }
                    inst.operands[0] = rm_to_operand_sized(&rm, 1, 0, fixup);
                }
                _ => {
                    inst.operands[0] = rm_to_operand(&rm, size, 0, fixup);
                }
            }
        }

        E::GroupE | E::GroupEIb | E::GroupE1 | E::GroupECl | E::GroupEvIz | E::GroupEvIb | E::GroupEbIb
        | E::Group3Eb | E::Group3Ev => {
            let size = match enc {
                E::GroupEbIb | E::Group3Eb => OpSize::Byte,
                _ => ctx.operand_size,
            };
            let rm_ctx = RmContext { operand_size: size, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &rm_ctx)?;
            if let Some(group) = group {
                inst.operation = groups::resolve(group, modrm.reg);
            }
            inst.operands[0] = rm_to_operand(&rm, size, 0, fixup);
            match enc {
                E::GroupEIb => inst.operands[1] = InstructionOperand::imm(reader.read8()? as i64, 1),
                E::GroupECl => inst.operands[1] = InstructionOperand::reg(Reg::Gpr8Legacy(1), 1),
                E::GroupEvIz => inst.operands[1] = InstructionOperand::imm(read_iz(reader, size)?, size.bytes()),
                // The imm8 is sign-extended to the full operand size for
                // display even though only one byte is read from the stream.
                E::GroupEvIb => inst.operands[1] = InstructionOperand::imm(reader.read_signed8()?, size.bytes()),
                E::GroupEbIb => inst.operands[1] = InstructionOperand::imm(reader.read_signed8()?, 1),
                E::Group3Eb => {
                    if modrm.reg < 2 {
                        inst.operands[1] = InstructionOperand::imm(reader.read8()? as i64, 1);
                    }
                }
                E::Group3Ev => {
                    if modrm.reg < 2 {
                        inst.operands[1] = InstructionOperand::imm(read_iz(reader, size)?, size.bytes());
                    }
                }
                _ => {}
            }
        }

        E::CcGbEb => {
            let rm_ctx = RmContext { operand_size: OpSize::Byte, ..ctx_copy(ctx) };
            let (_modrm, rm) = read_modrm(reader, &rm_ctx)?;
            inst.operands[0] = rm_to_operand(&rm, OpSize::Byte, 0, fixup);
        }
        E::CcGvEv => {
            let (modrm, rm) = read_modrm(reader, ctx)?;
            let reg = gpr(modrm.reg, ctx.rex_r, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            inst.operands[1] = rm_to_operand(&rm, ctx.operand_size, 1, fixup);
        }

        E::Fpu(row) => {
            let modrm_byte = reader.peek8()?;
            let modrm = crate::modrm::ModRmByte::from_byte(modrm_byte);
            if modrm.is_register() {
                let special = match row {
                    1 => fpu::d9_special(modrm_byte),
                    2 => fpu::da_special(modrm_byte),
                    3 => fpu::db_special(modrm_byte),
                    6 => fpu::de_special(modrm_byte),
                    7 => fpu::df_special(modrm_byte),
                    _ => None,
                };
                reader.read8()?;
                inst.operation = special.unwrap_or(fpu::REG[row as usize][modrm.reg as usize]);
                if inst.operation == Operation::Invalid {
                    decode_err!("unassigned FPU register-form opcode D{:X} /{}", row + 8, modrm.reg);
                }
                if special.is_none() {
                    inst.operands[0] = InstructionOperand::reg(Reg::Fpu(0), 10);
                    inst.operands[1] = InstructionOperand::reg(Reg::Fpu(modrm.rm), 10);
                }
            } else {
                let op = fpu::MEM[row as usize][modrm.reg as usize];
                if op == Operation::Invalid {
                    decode_err!("unassigned FPU memory-form opcode D{:X} /{}", row + 8, modrm.reg);
                }
                inst.operation = op;
                let (_modrm, rm) = read_modrm(reader, ctx)?;
                inst.operands[0] = rm_to_operand(&rm, ctx.operand_size, 0, fixup);
            }
        }

        E::ThreeDNow => {
            let (_modrm, rm) = read_modrm(reader, ctx)?;
            let opcode = reader.read8()?;
            inst.operation = three_d_now::lookup(opcode).ok_or_else(|| {
                log::trace!("unassigned 3DNow! trailing opcode 0x{:02x}", opcode);
                DecodeError
            })?;
            inst.operands[1] = rm_to_operand(&rm, OpSize::Qword, 1, fixup);
        }

        E::PqQq => {
            let mmx_ctx = RmContext { rm_reg_class: RmRegClass::Mmx, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &mmx_ctx)?;
            let reg = Reg::Mmx(modrm.reg & 0x7);
            inst.operands[0] = InstructionOperand::reg(reg, 8);
            inst.operands[1] = rm_to_operand(&rm, OpSize::Qword, 1, fixup);
        }

        E::VxWx | E::WxVx => {
            // Full 128-bit XMM reg/mem forms (MOVUPS/MOVAPS): reg field is
            // always an XMM register; r/m is XMM-or-mem128 depending on mod.
            let xmm_ctx = RmContext { rm_reg_class: RmRegClass::Xmm, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &xmm_ctx)?;
            let reg_operand = InstructionOperand::reg(Reg::Xmm((modrm.reg & 0x7) | if ctx.rex_r { 0x8 } else { 0 }), 16);
            let rm_index = if enc == E::VxWx { 1 } else { 0 };
            let rm_operand = rm_to_operand_sized(&rm, 16, rm_index, fixup);
            if enc == E::VxWx {
                inst.operands[0] = reg_operand;
                inst.operands[1] = rm_operand;
            } else {
                inst.operands[0] = rm_operand;
                inst.operands[1] = reg_operand;
            }
        }
        E::VxMq | E::MqVx => {
            // MOVLPS/MOVHPS: r/m is memory-only (mem64); the register/register
            // encoding of these opcodes names a different instruction
            // (MOVHLPS/MOVLHPS), out of scope here.
            let xmm_ctx = RmContext { rm_reg_class: RmRegClass::Xmm, ..ctx_copy(ctx) };
            let (modrm, rm) = read_modrm(reader, &xmm_ctx)?;
            if rm.reg.is_some() {
                decode_err!("MOVLPS/MOVHPS requires a memory r/m operand");
            }
            let reg_operand = InstructionOperand::reg(Reg::Xmm((modrm.reg & 0x7) | if ctx.rex_r { 0x8 } else { 0 }), 16);
            let rm_index = if enc == E::VxMq { 1 } else { 0 };
            let rm_operand = rm_to_operand(&rm, OpSize::Qword, rm_index, fixup);
            if enc == E::VxMq {
                inst.operands[0] = reg_operand;
                inst.operands[1] = rm_operand;
            } else {
                inst.operands[0] = rm_operand;
                inst.operands[1] = reg_operand;
            }
        }

        E::GvMa => {
            // BOUND Gv, Ma: the bound pair lives in memory only, packed as
            // two operand-sized values back to back.
            let (modrm, rm) = read_modrm(reader, ctx)?;
            if rm.reg.is_some() {
                decode_err!("BOUND requires a memory r/m operand");
            }
            let reg = gpr(modrm.reg, ctx.rex_r, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            inst.operands[1] = rm_to_operand_sized(&rm, ctx.operand_size.bytes() * 2, 1, fixup);
        }

        E::GvMp => {
            // LDS/LES/LFS/LGS/LSS Gv, Mp: far pointer, selector:offset, so
            // the memory operand is two bytes wider than the GPR it loads.
            let (modrm, rm) = read_modrm(reader, ctx)?;
            if rm.reg.is_some() {
                decode_err!("far-pointer load requires a memory r/m operand");
            }
            let reg = gpr(modrm.reg, ctx.rex_r, ctx.operand_size, ctx.rex_present);
            inst.operands[0] = InstructionOperand::reg(reg, ctx.operand_size.bytes());
            inst.operands[1] = rm_to_operand_sized(&rm, ctx.operand_size.bytes() + 2, 1, fixup);
        }

        E::Seg(seg) => {
            inst.operands[0] = InstructionOperand::reg(Reg::Seg(seg), 2);
        }

        E::GvCr | E::CrGv => {
            // AMD LOCK-MOV-CR trick: a LOCK prefix preceding this form is
            // not a real lock request (the destination is never memory);
            // it is retrofitted as REX.R so CR8-CR15 are reachable even
            // without a real REX prefix.
            let mut rex_r = ctx.rex_r;
            if inst.flags.contains(DecodeFlags::LOCK) {
                inst.flags.remove(DecodeFlags::LOCK);
                rex_r = true;
            }
            let size = if ctx.mode.is_long_mode() {
                OpSize::Qword
            } else if ctx.operand_size == OpSize::Word {
                OpSize::Dword
            } else {
                ctx.operand_size
            };
            let byte = reader.read8()?;
            let modrm = crate::modrm::ModRmByte::from_byte(byte);
            let ctrl_index = (modrm.reg & 0x7) | if rex_r { 0x8 } else { 0 };
            let ctrl_reg = if inst.operation == Operation::MovDr { Reg::Dr(ctrl_index) } else { Reg::Cr(ctrl_index) };
            let gpr_operand = InstructionOperand::reg(gpr(modrm.rm, ctx.rex_b, size, ctx.rex_present), size.bytes());
            let ctrl_operand = InstructionOperand::reg(ctrl_reg, size.bytes());
            if enc == E::GvCr {
                inst.operands[0] = gpr_operand;
                inst.operands[1] = ctrl_operand;
            } else {
                inst.operands[0] = ctrl_operand;
                inst.operands[1] = gpr_operand;
            }
        }
    }

    Ok(())
}

fn ctx_copy(ctx: &RmContext) -> RmContext {
    *ctx
}

fn read_iz(reader: &mut Reader, size: OpSize) -> Result<i64, DecodeError> {
    match size {
        OpSize::Byte => reader.read_signed8(),
        OpSize::Word => reader.read_signed16(),
        OpSize::Dword | OpSize::Qword => reader.read_signed32(),
    }
}

fn rm_to_operand(
    rm: &crate::modrm::ResolvedRm,
    size: OpSize,
    operand_index: usize,
    fixup: &mut Option<RipFixup>,
) -> InstructionOperand {
    rm_to_operand_sized(rm, size.bytes(), operand_index, fixup)
}

/// Like [`rm_to_operand`] but takes a raw byte width instead of an [`OpSize`],
/// for operand widths [`OpSize`] can't represent (128-bit XMM registers, the
/// 6/10-byte far-pointer and packed-bound memory forms). `operand_index` is
/// the slot this resolved operand is about to be stored into — needed here,
/// not just at the call site, because a RIP-relative result must record
/// which `Instruction::operands` slot [`finalize`] patches, and that slot
/// varies with operand order (`Gv, Ev` vs `Ev, Gv`).
fn rm_to_operand_sized(
    rm: &crate::modrm::ResolvedRm,
    size: u8,
    operand_index: usize,
    fixup: &mut Option<RipFixup>,
) -> InstructionOperand {
    if let Some(reg) = rm.reg {
        return InstructionOperand::reg(reg, size);
    }
    let mut operand = InstructionOperand {
        kind: crate::operand::OperandKind::Mem,
        components: [rm.mem_base, rm.mem_index],
        scale: rm.mem_scale,
        imm: rm.mem_disp,
        size,
        segment: rm.segment_override,
    };
    if rm.is_rip_relative {
        *fixup = Some(RipFixup { operand_index, disp: operand.imm });
        operand.imm = 0;
    }
    operand
}

/// Recover the opcode byte's low 3 bits for `Reg`/`RegIb`/`RegIv` forms.
/// These encodings have already consumed the opcode byte by the time
/// operand decoding runs, so the byte is re-read from one position back
/// rather than threaded through as an extra parameter at every call site.
fn current_opcode_low_bits(reader: &Reader) -> Result<u8, DecodeError> {
    Ok(current_opcode_byte(reader)? & 0x7)
}

/// Recover the raw opcode byte already consumed by the dispatcher, for
/// encodings (`Reg`/`RegIb`/`RegIv`/`StringOp`) that derive part of their
/// meaning from bits baked into the opcode itself rather than from ModR/M.
fn current_opcode_byte(reader: &Reader) -> Result<u8, DecodeError> {
    let pos = reader.position();
    if pos == 0 {
        decode_err!("current_opcode_byte: no opcode byte consumed yet");
    }
    reader.byte_at(pos - 1)
}
