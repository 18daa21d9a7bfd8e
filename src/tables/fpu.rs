//! x87 FPU opcode resolution (opcodes D8-DF), corresponding to the
//! original's `fpuMemOpcodeMap[8][8]`/`fpuRegOpcodeMap[8][8]`: row is the
//! opcode byte minus 0xD8, column is the ModR/M reg field for the
//! memory-operand form (`mod != 3`) or the full low-6-bits pattern for the
//! register form (`mod == 3`), which this table narrows to the reg field
//! plus a row/rm lookup since most FPU register forms only vary by `ST(i)`.
//!
//! `FCMOVcc` (DA/DB C0-DF) is out of scope (the spec's FPU coverage is
//! arithmetic/load/store/compare and the classic transcendental constants,
//! not the P6 conditional-move extensions) and resolves to `Invalid`.

use crate::operand::Operation as I;

/// `mod != 3`: row selected by `opcode - 0xD8`, column by the ModR/M reg field.
pub const MEM: [[I; 8]; 8] = [
    // D8
    [I::Fadd, I::Fmul, I::Fcom, I::Fcomp, I::Fsub, I::Fsubr, I::Fdiv, I::Fdivr],
    // D9
    [I::Fld, I::Invalid, I::Fst, I::Fstp, I::Fldenv, I::Fldcw, I::Fnstenv, I::Fnstcw],
    // DA
    [I::Fiadd, I::Fimul, I::Ficom, I::Ficomp, I::Fisub, I::Fisubr, I::Fidiv, I::Fidivr],
    // DB
    [I::Fild, I::Invalid, I::Fist, I::Fistp, I::Invalid, I::Fld, I::Invalid, I::Fstp],
    // DC
    [I::Fadd, I::Fmul, I::Fcom, I::Fcomp, I::Fsub, I::Fsubr, I::Fdiv, I::Fdivr],
    // DD
    [I::Fld, I::Invalid, I::Fst, I::Fstp, I::Frstor, I::Invalid, I::Fnsave, I::Fnstsw],
    // DE
    [I::Fiadd, I::Fimul, I::Ficom, I::Ficomp, I::Fisub, I::Fisubr, I::Fidiv, I::Fidivr],
    // DF
    [I::Fild, I::Invalid, I::Fist, I::Fistp, I::Fbld, I::Fild, I::Fbstp, I::Fistp],
];

/// `mod == 3`, keyed by row (`opcode - 0xD8`) and the ModR/M reg field; the
/// rm field (which `ST(i)` is addressed) is resolved separately by the
/// handler. Constant-loading and no-operand forms under row 1 (D9) are
/// further split out in [`D9_SPECIAL`] since the reg field alone does not
/// distinguish e.g. `FCHS` from `FLD1`.
pub const REG: [[I; 8]; 8] = [
    // D8: FADD/FMUL/FCOM/FCOMP/FSUB/FSUBR/FDIV/FDIVR ST, ST(i)
    [I::Fadd, I::Fmul, I::Fcom, I::Fcomp, I::Fsub, I::Fsubr, I::Fdiv, I::Fdivr],
    // D9: FLD ST(i) under reg 0; the rest dispatch via D9_SPECIAL
    [I::Fld, I::Invalid, I::Invalid, I::Invalid, I::Invalid, I::Invalid, I::Invalid, I::Invalid],
    // DA: only FUCOMPP (DA E9) is modeled, via DA_SPECIAL
    [I::Invalid; 8],
    // DB: FNCLEX/FNINIT/FCOMI modeled via DB_SPECIAL
    [I::Invalid; 8],
    // DC: FADD/FMUL/FSUBR/FSUB/FDIVR/FDIV ST(i), ST (reversed direction)
    [I::Fadd, I::Fmul, I::Invalid, I::Invalid, I::Fsubr, I::Fsub, I::Fdivr, I::Fdiv],
    // DD: FFREE / FST / FSTP / FUCOM / FUCOMP by reg field
    [I::Ffree, I::Invalid, I::Fst, I::Fstp, I::Fucom, I::Fucomp, I::Invalid, I::Invalid],
    // DE: FADDP/FMULP/.../FSUBRP/FSUBP/FDIVRP/FDIVP ST(i), ST
    [I::Faddp, I::Fmulp, I::Invalid, I::Invalid, I::Fsubrp, I::Fsubp, I::Fdivrp, I::Fdivp],
    // DF: FNSTSW AX (E0) modeled via DF_SPECIAL; FUCOMIP/FCOMIP likewise
    [I::Invalid; 8],
];

/// Full ModR/M byte (`0xC0..=0xFF`) special cases within row D9 that the
/// reg-field table alone can't disambiguate: constant loads and the
/// no-operand transcendental/rounding operations.
pub const fn d9_special(modrm_byte: u8) -> Option<I> {
    Some(match modrm_byte {
        0xE0 => I::Fchs,
        0xE1 => I::Fabs,
        0xE4 => I::Ftst,
        0xE5 => I::Fxam,
        0xE8 => I::Fld1,
        0xE9 => I::Fldl2t,
        0xEA => I::Fldl2e,
        0xEB => I::Fldpi,
        0xEC => I::Fldlg2,
        0xED => I::Fldln2,
        0xEE => I::Fldz,
        0xF0 => I::F2xm1,
        0xF1 => I::Fyl2x,
        0xF2 => I::Fptan,
        0xF3 => I::Fpatan,
        0xF4 => I::Fxtract,
        0xF5 => I::Fprem1,
        0xF6 => I::Fdecstp,
        0xF7 => I::Fincstp,
        0xF8 => I::Fprem,
        0xF9 => I::Fyl2xp1,
        0xFA => I::Fsqrt,
        0xFB => I::Fsincos,
        0xFC => I::Frndint,
        0xFD => I::Fscale,
        0xFE => I::Fsin,
        0xFF => I::Fcos,
        0xD0 => I::Fnop,
        _ => return None,
    })
}

pub const fn da_special(modrm_byte: u8) -> Option<I> {
    if modrm_byte == 0xE9 {
        Some(I::Fucompp)
    } else {
        None
    }
}

pub const fn db_special(modrm_byte: u8) -> Option<I> {
    Some(match modrm_byte {
        0xE2 => I::Fnclex,
        0xE3 => I::Fninit,
        0xF0..=0xF7 => I::Fcomi,
        0xE8..=0xEF => I::Fucomi,
        _ => return None,
    })
}

pub const fn de_special(modrm_byte: u8) -> Option<I> {
    if modrm_byte == 0xD9 {
        Some(I::Fcompp)
    } else {
        None
    }
}

pub const fn df_special(modrm_byte: u8) -> Option<I> {
    Some(match modrm_byte {
        0xE0 => I::Fnstsw,
        0xE8..=0xEF => I::Fucomip,
        0xF0..=0xF7 => I::Fcomip,
        _ => return None,
    })
}
