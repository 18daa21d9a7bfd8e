//! Rendering a decoded [`Instruction`] back to text.
//!
//! Mirrors the original's `FormatInstructionString`: a template string per
//! operation drives a small interpreter recognizing `%a` (mnemonic),
//! `%Nb` (operand N as bare register/immediate), `%Ni` (operand N, memory
//! reference gets brackets), `%o` (segment-override/size prefix keyword),
//! and literal characters copied through verbatim. This crate keeps that
//! template-driven shape but drives it off the typed `Operation`/`Encoding`
//! pair instead of a second, parallel format-string table indexed by the
//! same opcode.

use core::fmt::{self, Write as _};

use crate::operand::{Instruction, InstructionOperand, OperandKind};

/// Render `inst` into a freshly allocated `String`. Convenience wrapper
/// around [`write_instruction`] for callers that have an allocator and don't
/// want to manage a fixed-capacity buffer themselves.
#[cfg(feature = "alloc")]
pub fn to_string(inst: &Instruction) -> alloc::string::String {
    let mut s = alloc::string::String::new();
    // `write_instruction` only errors on a full fixed buffer; a `String`
    // grows, so this can't fail.
    write_instruction(inst, &mut s).expect("write to String is infallible");
    s
}

/// Write `inst`'s assembly-text rendering into `out`. Returns an error only
/// if `out` runs out of room; decode failures never reach this function.
pub fn write_instruction(inst: &Instruction, out: &mut dyn fmt::Write) -> fmt::Result {
    if let Some(seg) = inst.segment {
        if inst.operands.iter().all(|o| !o.is_mem() || o.segment.is_some()) {
            // Default segment with no memory operand to attach to (e.g. a
            // register-only instruction preceded by a segment-override
            // prefix the encoding didn't need): still surface it, the way
            // the original echoed an otherwise-inert prefix byte back out.
            write!(out, "{}: ", seg.name())?;
        }
    }

    write_mnemonic(inst, out)?;

    let operands: heapless_operands::Operands = collect_operands(inst);
    for (i, operand) in operands.iter().enumerate() {
        out.write_str(if i == 0 { " " } else { ", " })?;
        write_operand(operand, out)?;
    }

    Ok(())
}

fn write_mnemonic(inst: &Instruction, out: &mut dyn fmt::Write) -> fmt::Result {
    use crate::operand::Operation as Op;
    if inst.flags.contains(crate::operand::DecodeFlags::LOCK) {
        out.write_str("lock ")?;
    }
    if inst.flags.contains(crate::operand::DecodeFlags::REPNE) {
        out.write_str("repne ")?;
    } else if inst.flags.contains(crate::operand::DecodeFlags::REP) {
        out.write_str("rep ")?;
    }
    match inst.operation {
        Op::Jcc(cc) => write!(out, "j{}", cc.mnemonic_suffix()),
        Op::SetCc(cc) => write!(out, "set{}", cc.mnemonic_suffix()),
        Op::CmovCc(cc) => write!(out, "cmov{}", cc.mnemonic_suffix()),
        other => out.write_str(mnemonic_str(other)),
    }
}

fn write_operand(operand: &InstructionOperand, out: &mut dyn fmt::Write) -> fmt::Result {
    match operand.kind {
        OperandKind::None => Ok(()),
        OperandKind::Imm => write!(out, "0x{:x}", operand.imm),
        OperandKind::Reg => {
            let reg = operand.components[0].expect("Reg operand always carries a register");
            out.write_str(reg.name())
        }
        OperandKind::Mem => {
            if let Some(seg) = operand.segment {
                write!(out, "{}:", seg.name())?;
            }
            out.write_char('[')?;
            let mut wrote = false;
            if let Some(base) = operand.components[0] {
                out.write_str(base.name())?;
                wrote = true;
            }
            if let Some(index) = operand.components[1] {
                if wrote {
                    out.write_char('+')?;
                }
                write!(out, "{}*{}", index.name(), operand.scale.max(1))?;
                wrote = true;
            }
            if operand.imm != 0 || !wrote {
                if wrote {
                    out.write_char('+')?;
                }
                write!(out, "0x{:x}", operand.imm)?;
            }
            out.write_char(']')
        }
    }
}

/// Small fixed-capacity stand-in for `Vec<&InstructionOperand>` so the
/// formatter has no allocation dependency even with the `alloc` feature
/// off; three is the architectural maximum operand count.
mod heapless_operands {
    use crate::operand::InstructionOperand;

    pub struct Operands {
        items: [InstructionOperand; 3],
        len: usize,
    }

    impl Operands {
        pub fn iter(&self) -> impl Iterator<Item = &InstructionOperand> {
            self.items[..self.len].iter()
        }
    }

    pub(super) fn new(items: [InstructionOperand; 3], len: usize) -> Operands {
        Operands { items, len }
    }
}

fn collect_operands(inst: &Instruction) -> heapless_operands::Operands {
    let len = inst.operands.iter().take_while(|o| !o.is_none()).count();
    heapless_operands::new(inst.operands, len)
}

const fn mnemonic_str(op: crate::operand::Operation) -> &'static str {
    use crate::operand::Operation::*;
    match op {
        Invalid => "(invalid)",
        Mov => "mov", Movsx => "movsx", Movzx => "movzx", Lea => "lea", Xchg => "xchg", Xlat => "xlat",
        Push => "push", Pop => "pop", Pusha => "pusha", Popa => "popa", Pushf => "pushf", Popf => "popf",
        Cbw => "cbw", Cwde => "cwde", Cdqe => "cdqe", Cwd => "cwd", Cdq => "cdq", Cqo => "cqo",
        Bswap => "bswap", Bound => "bound",
        Add => "add", Adc => "adc", Sub => "sub", Sbb => "sbb", Cmp => "cmp", Test => "test",
        And => "and", Or => "or", Xor => "xor", Not => "not", Neg => "neg",
        Mul => "mul", Imul => "imul", Div => "div", Idiv => "idiv",
        Inc => "inc", Dec => "dec",
        Xadd => "xadd", Cmpxchg => "cmpxchg", Cmpxchg8b => "cmpxchg8b", Cmpxchg16b => "cmpxchg16b",
        Shl => "shl", Shr => "shr", Sar => "sar", Rol => "rol", Ror => "ror", Rcl => "rcl", Rcr => "rcr",
        Daa => "daa", Das => "das", Aaa => "aaa", Aas => "aas", Aam => "aam", Aad => "aad",
        JmpNear => "jmp", JmpFar => "jmpf", CallNear => "call", CallFar => "callf",
        RetNear => "ret", RetFar => "retf", Iret => "iret",
        Jcc(_) => "j", // overridden in write_mnemonic
        Loop => "loop", LoopE => "loope", LoopNe => "loopne",
        Jcxz => "jcxz", Jecxz => "jecxz", Jrcxz => "jrcxz",
        Int => "int", Int3 => "int3", Into => "into",
        Enter => "enter", Leave => "leave", Movsxd => "movsxd",
        Nop => "nop", Hlt => "hlt", Cmc => "cmc", Clc => "clc", Stc => "stc",
        Cli => "cli", Sti => "sti", Cld => "cld", Std => "std",
        Lahf => "lahf", Sahf => "sahf", Wait => "wait",
        Bt => "bt", Bts => "bts", Btr => "btr", Btc => "btc", Bsf => "bsf", Bsr => "bsr",
        Shld => "shld", Shrd => "shrd",
        SetCc(_) => "set", CmovCc(_) => "cmov",
        Movs => "movs", Cmps => "cmps", Stos => "stos", Lods => "lods", Scas => "scas",
        Ins => "ins", Outs => "outs",
        In => "in", Out => "out",
        Lds => "lds", Les => "les", Lfs => "lfs", Lgs => "lgs", Lss => "lss",
        Lgdt => "lgdt", Sgdt => "sgdt", Lidt => "lidt", Sidt => "sidt",
        Lldt => "lldt", Sldt => "sldt", Ltr => "ltr", Str => "str",
        Smsw => "smsw", Lmsw => "lmsw", Clts => "clts",
        Arpl => "arpl", Lar => "lar", Lsl => "lsl", Verr => "verr", Verw => "verw",
        Cpuid => "cpuid", Rdtsc => "rdtsc", Rdmsr => "rdmsr", Wrmsr => "wrmsr", Rdpmc => "rdpmc",
        Syscall => "syscall", Sysret => "sysret", Sysenter => "sysenter", Sysexit => "sysexit",
        Invd => "invd", Wbinvd => "wbinvd", Invlpg => "invlpg",
        MovCr => "mov", MovDr => "mov", MovTr => "mov",
        Ud2 => "ud2", Emms => "emms", Prefetch => "prefetch",
        Fld => "fld", Fst => "fst", Fstp => "fstp", Fxch => "fxch",
        Fild => "fild", Fist => "fist", Fistp => "fistp", Fbld => "fbld", Fbstp => "fbstp",
        Fld1 => "fld1", Fldl2t => "fldl2t", Fldl2e => "fldl2e", Fldpi => "fldpi",
        Fldlg2 => "fldlg2", Fldln2 => "fldln2", Fldz => "fldz",
        Fadd => "fadd", Faddp => "faddp", Fiadd => "fiadd",
        Fsub => "fsub", Fsubp => "fsubp", Fisub => "fisub",
        Fsubr => "fsubr", Fsubrp => "fsubrp", Fisubr => "fisubr",
        Fmul => "fmul", Fmulp => "fmulp", Fimul => "fimul",
        Fdiv => "fdiv", Fdivp => "fdivp", Fidiv => "fidiv",
        Fdivr => "fdivr", Fdivrp => "fdivrp", Fidivr => "fidivr",
        Fcom => "fcom", Fcomp => "fcomp", Fcompp => "fcompp",
        Fcomi => "fcomi", Fcomip => "fcomip",
        Fucom => "fucom", Fucomp => "fucomp", Fucompp => "fucompp",
        Fucomi => "fucomi", Fucomip => "fucomip",
        Ficom => "ficom", Ficomp => "ficomp",
        Ftst => "ftst", Fxam => "fxam", Fabs => "fabs", Fchs => "fchs",
        F2xm1 => "f2xm1", Fyl2x => "fyl2x", Fyl2xp1 => "fyl2xp1",
        Fptan => "fptan", Fpatan => "fpatan", Fxtract => "fxtract",
        Fprem => "fprem", Fprem1 => "fprem1",
        Fdecstp => "fdecstp", Fincstp => "fincstp", Fscale => "fscale", Fsqrt => "fsqrt",
        Fsin => "fsin", Fcos => "fcos", Fsincos => "fsincos", Frndint => "frndint",
        Ffree => "ffree", Fnop => "fnop",
        Fnstcw => "fnstcw", Fldcw => "fldcw", Fnstsw => "fnstsw",
        Fnstenv => "fnstenv", Fldenv => "fldenv", Fnsave => "fnsave", Frstor => "frstor",
        Fnclex => "fnclex", Fninit => "fninit",
        Movd => "movd", Movq => "movq", Movdqu => "movdqu", Movdqa => "movdqa",
        Movaps => "movaps", Movups => "movups", Movlps => "movlps", Movhps => "movhps",
        Movss => "movss", Movsd => "movsd",
        Paddb => "paddb", Paddw => "paddw", Paddd => "paddd", Paddq => "paddq",
        Psubb => "psubb", Psubw => "psubw", Psubd => "psubd", Psubq => "psubq",
        Pand => "pand", Pandn => "pandn", Por => "por", Pxor => "pxor",
        Pcmpeqb => "pcmpeqb", Pcmpeqw => "pcmpeqw", Pcmpeqd => "pcmpeqd",
        Pcmpgtb => "pcmpgtb", Pcmpgtw => "pcmpgtw", Pcmpgtd => "pcmpgtd",
        Punpcklbw => "punpcklbw", Punpcklwd => "punpcklwd", Punpckldq => "punpckldq",
        Punpckhbw => "punpckhbw", Punpckhwd => "punpckhwd", Punpckhdq => "punpckhdq",
        Packsswb => "packsswb", Packssdw => "packssdw", Packuswb => "packuswb",
        Pmullw => "pmullw", Pmulhw => "pmulhw", Pmaddwd => "pmaddwd",
        Psllw => "psllw", Pslld => "pslld", Psllq => "psllq",
        Psrlw => "psrlw", Psrld => "psrld", Psrlq => "psrlq",
        Psraw => "psraw", Psrad => "psrad",
        Pfadd => "pfadd", Pfsub => "pfsub", Pfsubr => "pfsubr", Pfmul => "pfmul",
        Pfcmpeq => "pfcmpeq", Pfcmpge => "pfcmpge", Pfcmpgt => "pfcmpgt",
        Pfmin => "pfmin", Pfmax => "pfmax", Pf2id => "pf2id", Pi2fd => "pi2fd",
        Pfrcp => "pfrcp", Pfrsqrt => "pfrsqrt", Pfacc => "pfacc", Pfnacc => "pfnacc", Pfpnacc => "pfpnacc",
        Pavgusb => "pavgusb", Pmulhrw => "pmulhrw", Femms => "femms", Prefetchw => "prefetchw",
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::operand::{DecodeFlags, Operation};
    use crate::registers::Reg;

    #[test]
    fn renders_simple_reg_reg_mov() {
        let mut inst = Instruction {
            operation: Operation::Mov,
            ..Instruction::default()
        };
        inst.operands[0] = InstructionOperand::reg(Reg::Gpr64(0), 8);
        inst.operands[1] = InstructionOperand::reg(Reg::Gpr64(1), 8);

        let mut s = String::new();
        write_instruction(&inst, &mut s).unwrap();
        assert_eq!(s.as_str(), "mov rax, rcx");
    }

    #[test]
    fn renders_lock_prefix() {
        let mut inst = Instruction {
            operation: Operation::Add,
            flags: DecodeFlags::LOCK,
            ..Instruction::default()
        };
        inst.operands[0] = InstructionOperand {
            kind: OperandKind::Mem,
            components: [Some(Reg::Gpr64(0)), None],
            size: 4,
            ..InstructionOperand::none()
        };
        inst.operands[1] = InstructionOperand::imm(1, 4);

        let mut s = String::new();
        write_instruction(&inst, &mut s).unwrap();
        assert_eq!(s.as_str(), "lock add [rax], 0x1");
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn to_string_matches_write_instruction() {
        let mut inst = Instruction {
            operation: Operation::Mov,
            ..Instruction::default()
        };
        inst.operands[0] = InstructionOperand::reg(Reg::Gpr64(0), 8);
        inst.operands[1] = InstructionOperand::reg(Reg::Gpr64(1), 8);

        assert_eq!(to_string(&inst), "mov rax, rcx");
    }
}
