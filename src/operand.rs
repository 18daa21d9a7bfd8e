//! The decoded instruction record and its operand representation.
//!
//! This is the Rust-shaped replacement for the original `Instruction` /
//! `InstructionOperand` C structs: same fields, but operand kind and
//! register identity are sum types instead of an integer tag plus a union,
//! so an `OPERAND_REG` that happens to carry a memory displacement is
//! unrepresentable instead of merely unused.

use bitflags::bitflags;

use crate::registers::{Reg, SegReg};

bitflags! {
    /// Prefix-derived flags that survive into the decoded instruction.
    /// Mirrors the original's `FLAG_LOCK`/`FLAG_REP`/... bitset, minus the
    /// prefixes that are fully absorbed into operand sizing instead
    /// (operand-size and address-size overrides still get a flag each
    /// since callers may want to distinguish `66 90` from `90`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DecodeFlags: u16 {
        const LOCK                    = 1 << 0;
        const REP                     = 1 << 1;
        const REPE                    = 1 << 2;
        const REPNE                   = 1 << 3;
        const OPSIZE_PREFIX_PRESENT   = 1 << 4;
        const ADDRSIZE_PREFIX_PRESENT = 1 << 5;
        const REX_PRESENT             = 1 << 6;
        const INSUFFICIENT_LENGTH     = 1 << 7;
    }
}

/// What kind of value an [`InstructionOperand`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperandKind {
    #[default]
    None,
    /// A register operand; the register lives in `components[0]`.
    Reg,
    /// An immediate value; the value lives in `InstructionOperand::imm`.
    Imm,
    /// A memory reference: `[base + index*scale + disp]`, any of which may
    /// be absent (`components[_]` is `None`, `scale` is 0, `disp` is 0).
    Mem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionOperand {
    pub kind: OperandKind,
    /// Base and index registers for a memory operand; for a register
    /// operand, `components[0]` holds it and `components[1]` is `None`.
    pub components: [Option<Reg>; 2],
    /// SIB scale factor: 1, 2, 4 or 8; 0 when there is no index register.
    pub scale: u8,
    /// Sign-extended immediate or displacement value.
    pub imm: i64,
    /// Operand width in bytes (1, 2, 4, 8, or 10 for an 80-bit FPU memory
    /// operand).
    pub size: u8,
    /// Segment override applying to this specific operand, if memory and
    /// overridden; `None` means "use the instruction's default segment".
    pub segment: Option<SegReg>,
}

impl Default for InstructionOperand {
    fn default() -> Self {
        Self {
            kind: OperandKind::None,
            components: [None, None],
            scale: 0,
            imm: 0,
            size: 0,
            segment: None,
        }
    }
}

impl InstructionOperand {
    pub const fn none() -> Self {
        Self {
            kind: OperandKind::None,
            components: [None, None],
            scale: 0,
            imm: 0,
            size: 0,
            segment: None,
        }
    }

    pub fn reg(reg: Reg, size: u8) -> Self {
        Self {
            kind: OperandKind::Reg,
            components: [Some(reg), None],
            size,
            ..Self::none()
        }
    }

    pub fn imm(value: i64, size: u8) -> Self {
        Self {
            kind: OperandKind::Imm,
            imm: value,
            size,
            ..Self::none()
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == OperandKind::None
    }

    pub fn is_mem(&self) -> bool {
        self.kind == OperandKind::Mem
    }
}

/// Every mnemonic this decoder can produce, spanning the general-purpose,
/// string, FPU, MMX/3DNow! and privileged instruction groups named in the
/// opcode tables. `Invalid` is the sentinel a failed decode never actually
/// returns (decode fails outright instead) but which group/escape
/// resolution uses internally for unassigned table slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Operation {
    Invalid,

    // Data movement
    Mov, Movsx, Movzx, Lea, Xchg, Xlat,
    Push, Pop, Pusha, Popa, Pushf, Popf,
    Cbw, Cwde, Cdqe, Cwd, Cdq, Cqo,
    Bswap, Bound,

    // Arithmetic / logic
    Add, Adc, Sub, Sbb, Cmp, Test,
    And, Or, Xor, Not, Neg,
    Mul, Imul, Div, Idiv,
    Inc, Dec,
    Xadd, Cmpxchg, Cmpxchg8b, Cmpxchg16b,
    Shl, Shr, Sar, Rol, Ror, Rcl, Rcr,
    Daa, Das, Aaa, Aas, Aam, Aad,

    // Control flow
    JmpNear, JmpFar, CallNear, CallFar,
    RetNear, RetFar, Iret,
    Jcc(Condition),
    Loop, LoopE, LoopNe,
    /// `JCXZ`/`JECXZ`/`JRCXZ` (opcode 0xE3): same encoding, the mnemonic
    /// selected by the current address size.
    Jcxz, Jecxz, Jrcxz,
    Int, Int3, Into,
    Enter, Leave,
    /// `MOVSXD Gv, Ed` (64-bit mode only; opcode 0x63 is `ARPL` elsewhere).
    Movsxd,

    // Flags / misc single-byte
    Nop, Hlt, Cmc, Clc, Stc, Cli, Sti, Cld, Std,
    Lahf, Sahf, Wait,

    // Bit manipulation (two-byte escape)
    Bt, Bts, Btr, Btc, Bsf, Bsr,
    Shld, Shrd,
    SetCc(Condition),
    CmovCc(Condition),

    // String operations (repeat-eligible)
    Movs, Cmps, Stos, Lods, Scas, Ins, Outs,

    // I/O
    In, Out,

    // Segment / table registers
    Lds, Les, Lfs, Lgs, Lss,
    Lgdt, Sgdt, Lidt, Sidt, Lldt, Sldt, Ltr, Str,
    Smsw, Lmsw, Clts,
    Arpl, Lar, Lsl, Verr, Verw,

    // System / privileged
    Cpuid, Rdtsc, Rdmsr, Wrmsr, Rdpmc,
    Syscall, Sysret, Sysenter, Sysexit,
    Invd, Wbinvd, Invlpg,
    MovCr, MovDr, MovTr,

    // Misc two-byte
    Ud2, Emms, Prefetch,

    // x87 FPU
    Fld, Fst, Fstp, Fxch, Fild, Fist, Fistp, Fbld, Fbstp,
    Fld1, Fldl2t, Fldl2e, Fldpi, Fldlg2, Fldln2, Fldz,
    Fadd, Faddp, Fiadd, Fsub, Fsubp, Fisub, Fsubr, Fsubrp, Fisubr,
    Fmul, Fmulp, Fimul, Fdiv, Fdivp, Fidiv, Fdivr, Fdivrp, Fidivr,
    Fcom, Fcomp, Fcompp, Fcomi, Fcomip,
    Fucom, Fucomp, Fucompp, Fucomi, Fucomip,
    Ficom, Ficomp,
    Ftst, Fxam, Fabs, Fchs,
    F2xm1, Fyl2x, Fyl2xp1, Fptan, Fpatan, Fxtract, Fprem, Fprem1,
    Fdecstp, Fincstp, Fscale, Fsqrt, Fsin, Fcos, Fsincos, Frndint,
    Ffree, Fnop,
    Fnstcw, Fldcw, Fnstsw, Fnstenv, Fldenv, Fnsave, Frstor, Fnclex, Fninit,

    // MMX / SSE, limited to the legacy two-operand move forms (AVX/EVEX/VEX
    // and SSE4+ are out of scope).
    Movd, Movq, Movdqu, Movdqa, Movaps, Movups, Movlps, Movhps, Movss, Movsd,
    Paddb, Paddw, Paddd, Paddq,
    Psubb, Psubw, Psubd, Psubq,
    Pand, Pandn, Por, Pxor,
    Pcmpeqb, Pcmpeqw, Pcmpeqd,
    Pcmpgtb, Pcmpgtw, Pcmpgtd,
    Punpcklbw, Punpcklwd, Punpckldq, Punpckhbw, Punpckhwd, Punpckhdq,
    Packsswb, Packssdw, Packuswb,
    Pmullw, Pmulhw, Pmaddwd,
    Psllw, Pslld, Psllq, Psrlw, Psrld, Psrlq, Psraw, Psrad,

    // 3DNow!
    Pfadd, Pfsub, Pfsubr, Pfmul, Pfcmpeq, Pfcmpge, Pfcmpgt,
    Pfmin, Pfmax, Pf2id, Pi2fd, Pfrcp, Pfrsqrt, Pfacc, Pfnacc, Pfpnacc,
    Pavgusb, Pmulhrw, Femms, Prefetchw,
}

/// The 16 condition codes selecting a `Jcc`/`SetCc`/`CMOVcc` variant, keyed
/// the same way the low nibble of the opcode byte is: `O,NO,B,AE,E,NE,BE,
/// A,S,NS,P,NP,L,GE,LE,G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    O, No, B, Ae, E, Ne, Be, A, S, Ns, P, Np, L, Ge, Le, G,
}

impl Condition {
    pub const fn from_nibble(n: u8) -> Self {
        match n & 0xF {
            0x0 => Condition::O,
            0x1 => Condition::No,
            0x2 => Condition::B,
            0x3 => Condition::Ae,
            0x4 => Condition::E,
            0x5 => Condition::Ne,
            0x6 => Condition::Be,
            0x7 => Condition::A,
            0x8 => Condition::S,
            0x9 => Condition::Ns,
            0xA => Condition::P,
            0xB => Condition::Np,
            0xC => Condition::L,
            0xD => Condition::Ge,
            0xE => Condition::Le,
            _ => Condition::G,
        }
    }

    pub const fn mnemonic_suffix(self) -> &'static str {
        match self {
            Condition::O => "o",
            Condition::No => "no",
            Condition::B => "b",
            Condition::Ae => "ae",
            Condition::E => "e",
            Condition::Ne => "ne",
            Condition::Be => "be",
            Condition::A => "a",
            Condition::S => "s",
            Condition::Ns => "ns",
            Condition::P => "p",
            Condition::Np => "np",
            Condition::L => "l",
            Condition::Ge => "ge",
            Condition::Le => "le",
            Condition::G => "g",
        }
    }
}

/// A fully decoded instruction: at most 15 bytes long, up to 3 operands,
/// matching the buffer-size and operand-count invariants of the x86
/// encoding itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub operands: [InstructionOperand; 3],
    pub flags: DecodeFlags,
    /// Default segment used by memory operands that carry no explicit
    /// override (`None` means the architectural default: DS, or SS for
    /// stack-frame addressing via RBP/ESP/EBP).
    pub segment: Option<SegReg>,
    pub length: u8,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            operation: Operation::Invalid,
            operands: [InstructionOperand::none(); 3],
            flags: DecodeFlags::empty(),
            segment: None,
            length: 0,
        }
    }
}

/// Fixup recording a RIP-relative memory operand whose displacement must be
/// resolved against the instruction's own final length once it is known
/// (since the displacement is relative to the address of the *next*
/// instruction, not the position of the displacement bytes themselves).
/// Applied once at the end of [`crate::decoder`]'s finalize step instead of
/// the original's approach of writing straight through a `State` pointer
/// that aliased the in-progress instruction.
#[derive(Debug, Clone, Copy)]
pub struct RipFixup {
    pub operand_index: usize,
    pub disp: i64,
}
