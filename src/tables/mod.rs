//! Opcode table types and the four tables themselves.
//!
//! The original disassembler kept `mainOpcodeMap`/`twoByteOpcodeMap` as
//! arrays of `{ operation, encoding }` pairs where `operation` doubled as a
//! group index for "group" opcodes (a small integer smuggled into the same
//! field that otherwise held a real mnemonic). [`OpcodeEntry`] replaces
//! that smuggling with an explicit sum type: a table slot is *either* a
//! final operation, *or* a group to resolve via the ModR/M reg field, *or*
//! the two-byte escape, *or* one of the FPU/3DNow sub-dispatches.

pub mod fpu;
pub mod groups;
pub mod primary;
pub mod three_d_now;
pub mod two_byte;

use crate::operand::Operation;
use crate::registers::SegReg;

/// The operand-pattern a table entry expects, named the way the Intel
/// manuals name them (`Eb`=byte r/m, `Gv`=full-size reg field, `Iz`=
/// word/dword immediate, `Jb`=byte relative offset, etc.) rather than after
/// a handler function, so one `Encoding` variant can serve many operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// No operands at all (`NOP`, `CLC`, `HLT`, ...).
    Implicit,
    /// r/m (byte) <- reg (byte): `op Eb, Gb`.
    EbGb,
    /// r/m (full) <- reg (full): `op Ev, Gv`.
    EvGv,
    /// reg (byte) <- r/m (byte): `op Gb, Eb`.
    GbEb,
    /// reg (full) <- r/m (full): `op Gv, Ev`.
    GvEv,
    /// reg (full) <- r/m (byte), sign/zero-extended.
    GvEb,
    /// reg (full) <- r/m (word), sign/zero-extended (only meaningful in 32/64-bit operand size).
    GvEw,
    /// AL <- imm8.
    AlIb,
    /// eAX (full) <- imm (full, or imm16 when operand size is 16).
    EaxIz,
    /// Register named in the low 3 bits of the opcode byte, implied 64/32-bit immediate for MOV r, imm.
    RegIv,
    /// Register named in the low 3 bits of the opcode byte, no other operand (PUSH/POP r, BSWAP r, XCHG eAX,r).
    Reg,
    /// rel8 branch displacement.
    Jb,
    /// rel (full) branch displacement.
    Jz,
    /// Far pointer operand: imm16:imm(full) (`CALLF`/`JMPF ptr16:32`).
    Ap,
    /// ENTER's imm16, imm8 pair.
    IwIb,
    /// r/m only, group-dispatched opcode (`INC`/`DEC`/`NOT`/`NEG`/indirect `CALL`/`JMP`/`PUSH`).
    GroupE,
    /// r/m plus an imm8 shift count (`SHL`/`SHR`/... group with immediate).
    GroupEIb,
    /// r/m plus a fixed shift count of 1 (`SHL`/`SHR`/... group, no immediate).
    GroupE1,
    /// r/m shifted by CL (`SHL`/`SHR`/... group via CL).
    GroupECl,
    /// r/m (full) <- imm (full or imm8), group-dispatched (group 1: ADD/OR/.../CMP).
    GroupEvIz,
    GroupEvIb,
    GroupEbIb,
    /// String operation operand pair implied by the opcode (`MOVS`, `CMPS`, ...); size comes from the opcode's low bit.
    StringOp,
    /// `reg, r/m` with the reg field selecting a condition code (`SETcc`, `CMOVcc`).
    CcGbEb,
    CcGvEv,
    /// `Jcc rel8` / `Jcc rel(full)`.
    CcJb,
    CcJz,
    /// FPU opcode: row index into the FPU memory/register sub-tables, further dispatched by ModR/M.
    Fpu(u8),
    /// Sparse 3DNow! table, dispatched on the trailing opcode byte after the ModR/M+SIB+disp.
    ThreeDNow,
    /// MMX reg,r/m forms that do not need a distinct size per mnemonic.
    PqQq,
    /// XMM reg <- XMM/mem128 (`MOVUPS`/`MOVAPS` load forms).
    VxWx,
    /// XMM/mem128 <- XMM reg (`MOVUPS`/`MOVAPS` store forms).
    WxVx,
    /// XMM reg <- mem64 only (`MOVLPS`/`MOVHPS` load forms; the register/register
    /// encoding of these opcodes is MOVHLPS/MOVLHPS, out of scope here).
    VxMq,
    /// mem64 <- XMM reg (`MOVLPS`/`MOVHPS` store forms).
    MqVx,

    /// Implicit push/pop of a fixed segment register (opcodes 06/07/0E/16/17/1E/1F).
    Seg(SegReg),
    /// r/m (full) <- Sw: `MOV Ev, Sw`.
    EvSw,
    /// Sw <- r/m (full): `MOV Sw, Ev`.
    SwEv,
    /// Bare imm8 operand, no r/m (`PUSH Ib`, `INT Ib`, `AAM`, `AAD`).
    ImmB,
    /// Bare imm16 operand, no r/m (`RETN Iw`, `RETF Iw`).
    ImmW,
    /// Bare full-size immediate, no r/m (`PUSH Iz`).
    ImmZ,
    /// Three-operand `IMUL Gv, Ev, Iz`.
    GvEvIz,
    /// Three-operand `IMUL Gv, Ev, Ib` (imm8 sign-extended).
    GvEvIb,
    /// `MOV AL, Ob` (direct memory offset load).
    MoffsToAl,
    /// `MOV eAX, Ov`.
    MoffsToEax,
    /// `MOV Ob, AL`.
    AlToMoffs,
    /// `MOV Ov, eAX`.
    EaxToMoffs,
    /// `MOV reg8, Ib` (opcodes B0-B7: register named in the opcode's low 3 bits).
    RegIb,
    /// `IN eAX, Ib`.
    EaxIb,
    /// `OUT Ib, AL`.
    IbAl,
    /// `OUT Ib, eAX`.
    IbEax,
    /// Group 3 (F6): r/m byte, plus an imm8 only when the resolved operation is `TEST`.
    Group3Eb,
    /// Group 3 (F7): r/m full, plus an imm(full) only when the resolved operation is `TEST`.
    Group3Ev,
    /// `MOV Gv, Cr/Dr` (opcodes 0F 20/21): GPR from the ModR/M r/m field,
    /// control/debug register from the reg field.
    GvCr,
    /// `MOV Cr/Dr, Gv` (opcodes 0F 22/23): reverse direction of [`Self::GvCr`].
    CrGv,
    /// "2x-size" reg, r/m: reg (full) <- r/m, where r/m must be memory and is
    /// twice the operand size (`BOUND Gv, Ma`'s packed low/high bound pair).
    GvMa,
    /// "far-size" reg, r/m: reg (full) <- r/m, where r/m must be memory and
    /// is the operand size plus 2 bytes (a far `selector:offset` pointer, for
    /// `LDS`/`LES`/`LFS`/`LGS`/`LSS`).
    GvMp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeEntry {
    Final(Operation, Encoding),
    Group(groups::GroupId, Encoding),
    Escape,
    Invalid,
}
