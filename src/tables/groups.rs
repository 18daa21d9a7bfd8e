//! The "group" opcode tables: opcodes whose final mnemonic is selected by
//! the ModR/M reg field rather than being fixed by the opcode byte alone.
//! These correspond to the original's `groupOperations[24][8]`; each row
//! here is one group, indexed `[0..=7]` by the reg field.

use crate::operand::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupId {
    /// ADD/OR/ADC/SBB/AND/SUB/XOR/CMP (opcodes 80/81/82/83).
    Group1,
    /// ROL/ROR/RCL/RCR/SHL/SHR/SAL(=SHL)/SAR (opcodes C0/C1/D0-D3).
    Group2,
    /// TEST/TEST/NOT/NEG/MUL/IMUL/DIV/IDIV (opcodes F6/F7).
    Group3,
    /// INC/DEC (opcode FE, byte r/m only).
    Group4,
    /// INC/DEC/CALLN/CALLF/JMPN/JMPF/PUSH/(unused) (opcode FF).
    Group5,
    /// SLDT/STR/LLDT/LTR/VERR/VERW/(unused)/(unused) (0F 00).
    Group6,
    /// SGDT/SIDT/LGDT/LIDT/SMSW/(unused)/LMSW/INVLPG (0F 01).
    Group7,
    /// BT/BTS/BTR/BTC (0F BA, reg field 4-7 only; 0-3 are invalid).
    Group8,
    /// CMPXCHG8B/CMPXCHG16B (0F C7, reg field 1 only; the rest are unused
    /// here — VMPTRLD/VMCLEAR/RDRAND and friends also live in this slot on
    /// real silicon but are out of scope).
    Group9,
}

pub const fn resolve(group: GroupId, reg_field: u8) -> Operation {
    let reg = (reg_field & 0x7) as usize;
    match group {
        GroupId::Group1 => [
            Operation::Add,
            Operation::Or,
            Operation::Adc,
            Operation::Sbb,
            Operation::And,
            Operation::Sub,
            Operation::Xor,
            Operation::Cmp,
        ][reg],
        GroupId::Group2 => [
            Operation::Rol,
            Operation::Ror,
            Operation::Rcl,
            Operation::Rcr,
            Operation::Shl,
            Operation::Shr,
            Operation::Shl, // SAL is an alias of SHL
            Operation::Sar,
        ][reg],
        GroupId::Group3 => [
            Operation::Test,
            Operation::Test,
            Operation::Not,
            Operation::Neg,
            Operation::Mul,
            Operation::Imul,
            Operation::Div,
            Operation::Idiv,
        ][reg],
        GroupId::Group4 => [
            Operation::Inc,
            Operation::Dec,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
        ][reg],
        GroupId::Group5 => [
            Operation::Inc,
            Operation::Dec,
            Operation::CallNear,
            Operation::CallFar,
            Operation::JmpNear,
            Operation::JmpFar,
            Operation::Push,
            Operation::Invalid,
        ][reg],
        GroupId::Group6 => [
            Operation::Sldt,
            Operation::Str,
            Operation::Lldt,
            Operation::Ltr,
            Operation::Verr,
            Operation::Verw,
            Operation::Invalid,
            Operation::Invalid,
        ][reg],
        GroupId::Group7 => [
            Operation::Sgdt,
            Operation::Sidt,
            Operation::Lgdt,
            Operation::Lidt,
            Operation::Smsw,
            Operation::Invalid,
            Operation::Lmsw,
            Operation::Invlpg,
        ][reg],
        GroupId::Group8 => [
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Bt,
            Operation::Bts,
            Operation::Btr,
            Operation::Btc,
        ][reg],
        GroupId::Group9 => [
            Operation::Invalid,
            Operation::Cmpxchg8b, // also Cmpxchg16b under REX.W; decoder.rs swaps it in
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
            Operation::Invalid,
        ][reg],
    }
}
