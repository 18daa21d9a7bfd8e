//! The primary (one-byte) opcode map, corresponding to the original's
//! `mainOpcodeMap[256]`.

use super::groups::GroupId;
use super::{Encoding as E, OpcodeEntry as Op};
use crate::operand::Operation as I;
use crate::registers::SegReg;

macro_rules! f {
    ($op:expr, $enc:expr) => {
        Op::Final($op, $enc)
    };
}
macro_rules! g {
    ($grp:expr, $enc:expr) => {
        Op::Group($grp, $enc)
    };
}

pub const PRIMARY: [Op; 256] = build();

const fn build() -> [Op; 256] {
    [
        // 0x00
        f!(I::Add, E::EbGb), f!(I::Add, E::EvGv), f!(I::Add, E::GbEb), f!(I::Add, E::GvEv),
        f!(I::Add, E::AlIb), f!(I::Add, E::EaxIz), f!(I::Push, E::Seg(SegReg::Es)), f!(I::Pop, E::Seg(SegReg::Es)),
        // 0x08
        f!(I::Or, E::EbGb), f!(I::Or, E::EvGv), f!(I::Or, E::GbEb), f!(I::Or, E::GvEv),
        f!(I::Or, E::AlIb), f!(I::Or, E::EaxIz), f!(I::Push, E::Seg(SegReg::Cs)), Op::Escape,
        // 0x10
        f!(I::Adc, E::EbGb), f!(I::Adc, E::EvGv), f!(I::Adc, E::GbEb), f!(I::Adc, E::GvEv),
        f!(I::Adc, E::AlIb), f!(I::Adc, E::EaxIz), f!(I::Push, E::Seg(SegReg::Ss)), f!(I::Pop, E::Seg(SegReg::Ss)),
        // 0x18
        f!(I::Sbb, E::EbGb), f!(I::Sbb, E::EvGv), f!(I::Sbb, E::GbEb), f!(I::Sbb, E::GvEv),
        f!(I::Sbb, E::AlIb), f!(I::Sbb, E::EaxIz), f!(I::Push, E::Seg(SegReg::Ds)), f!(I::Pop, E::Seg(SegReg::Ds)),
        // 0x20
        f!(I::And, E::EbGb), f!(I::And, E::EvGv), f!(I::And, E::GbEb), f!(I::And, E::GvEv),
        f!(I::And, E::AlIb), f!(I::And, E::EaxIz), Op::Invalid, f!(I::Daa, E::Implicit),
        // 0x28
        f!(I::Sub, E::EbGb), f!(I::Sub, E::EvGv), f!(I::Sub, E::GbEb), f!(I::Sub, E::GvEv),
        f!(I::Sub, E::AlIb), f!(I::Sub, E::EaxIz), Op::Invalid, f!(I::Das, E::Implicit),
        // 0x30
        f!(I::Xor, E::EbGb), f!(I::Xor, E::EvGv), f!(I::Xor, E::GbEb), f!(I::Xor, E::GvEv),
        f!(I::Xor, E::AlIb), f!(I::Xor, E::EaxIz), Op::Invalid, f!(I::Aaa, E::Implicit),
        // 0x38
        f!(I::Cmp, E::EbGb), f!(I::Cmp, E::EvGv), f!(I::Cmp, E::GbEb), f!(I::Cmp, E::GvEv),
        f!(I::Cmp, E::AlIb), f!(I::Cmp, E::EaxIz), Op::Invalid, f!(I::Aas, E::Implicit),
        // 0x40 (INC reg in 16/32-bit mode; REX prefix byte in 64-bit mode, never reaches this table there)
        f!(I::Inc, E::Reg), f!(I::Inc, E::Reg), f!(I::Inc, E::Reg), f!(I::Inc, E::Reg),
        f!(I::Inc, E::Reg), f!(I::Inc, E::Reg), f!(I::Inc, E::Reg), f!(I::Inc, E::Reg),
        // 0x48
        f!(I::Dec, E::Reg), f!(I::Dec, E::Reg), f!(I::Dec, E::Reg), f!(I::Dec, E::Reg),
        f!(I::Dec, E::Reg), f!(I::Dec, E::Reg), f!(I::Dec, E::Reg), f!(I::Dec, E::Reg),
        // 0x50
        f!(I::Push, E::Reg), f!(I::Push, E::Reg), f!(I::Push, E::Reg), f!(I::Push, E::Reg),
        f!(I::Push, E::Reg), f!(I::Push, E::Reg), f!(I::Push, E::Reg), f!(I::Push, E::Reg),
        // 0x58
        f!(I::Pop, E::Reg), f!(I::Pop, E::Reg), f!(I::Pop, E::Reg), f!(I::Pop, E::Reg),
        f!(I::Pop, E::Reg), f!(I::Pop, E::Reg), f!(I::Pop, E::Reg), f!(I::Pop, E::Reg),
        // 0x60
        f!(I::Pusha, E::Implicit), f!(I::Popa, E::Implicit), f!(I::Bound, E::GvMa), f!(I::Movsxd, E::GvEv),
        Op::Invalid, Op::Invalid, Op::Invalid, Op::Invalid,
        // 0x68
        f!(I::Push, E::ImmZ), f!(I::Imul, E::GvEvIz), f!(I::Push, E::ImmB), f!(I::Imul, E::GvEvIb),
        f!(I::Ins, E::StringOp), f!(I::Ins, E::StringOp), f!(I::Outs, E::StringOp), f!(I::Outs, E::StringOp),
        // 0x70
        f!(I::Jcc(crate::operand::Condition::O), E::CcJb), f!(I::Jcc(crate::operand::Condition::No), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::B), E::CcJb), f!(I::Jcc(crate::operand::Condition::Ae), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::E), E::CcJb), f!(I::Jcc(crate::operand::Condition::Ne), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::Be), E::CcJb), f!(I::Jcc(crate::operand::Condition::A), E::CcJb),
        // 0x78
        f!(I::Jcc(crate::operand::Condition::S), E::CcJb), f!(I::Jcc(crate::operand::Condition::Ns), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::P), E::CcJb), f!(I::Jcc(crate::operand::Condition::Np), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::L), E::CcJb), f!(I::Jcc(crate::operand::Condition::Ge), E::CcJb),
        f!(I::Jcc(crate::operand::Condition::Le), E::CcJb), f!(I::Jcc(crate::operand::Condition::G), E::CcJb),
        // 0x80
        g!(GroupId::Group1, E::GroupEbIb), g!(GroupId::Group1, E::GroupEvIz),
        g!(GroupId::Group1, E::GroupEbIb), g!(GroupId::Group1, E::GroupEvIb),
        f!(I::Test, E::EbGb), f!(I::Test, E::EvGv), f!(I::Xchg, E::EbGb), f!(I::Xchg, E::EvGv),
        // 0x88
        f!(I::Mov, E::EbGb), f!(I::Mov, E::EvGv), f!(I::Mov, E::GbEb), f!(I::Mov, E::GvEv),
        f!(I::Mov, E::EvSw), f!(I::Lea, E::GvEv), f!(I::Mov, E::SwEv), f!(I::Pop, E::GroupE),
        // 0x90
        f!(I::Nop, E::Implicit), f!(I::Xchg, E::Reg), f!(I::Xchg, E::Reg), f!(I::Xchg, E::Reg),
        f!(I::Xchg, E::Reg), f!(I::Xchg, E::Reg), f!(I::Xchg, E::Reg), f!(I::Xchg, E::Reg),
        // 0x98
        f!(I::Cbw, E::Implicit), f!(I::Cwd, E::Implicit), f!(I::CallFar, E::Ap), f!(I::Wait, E::Implicit),
        f!(I::Pushf, E::Implicit), f!(I::Popf, E::Implicit), f!(I::Sahf, E::Implicit), f!(I::Lahf, E::Implicit),
        // 0xA0
        f!(I::Mov, E::MoffsToAl), f!(I::Mov, E::MoffsToEax), f!(I::Mov, E::AlToMoffs), f!(I::Mov, E::EaxToMoffs),
        f!(I::Movs, E::StringOp), f!(I::Movs, E::StringOp), f!(I::Cmps, E::StringOp), f!(I::Cmps, E::StringOp),
        // 0xA8
        f!(I::Test, E::AlIb), f!(I::Test, E::EaxIz), f!(I::Stos, E::StringOp), f!(I::Stos, E::StringOp),
        f!(I::Lods, E::StringOp), f!(I::Lods, E::StringOp), f!(I::Scas, E::StringOp), f!(I::Scas, E::StringOp),
        // 0xB0
        f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb),
        f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb), f!(I::Mov, E::RegIb),
        // 0xB8
        f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv),
        f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv), f!(I::Mov, E::RegIv),
        // 0xC0
        g!(GroupId::Group2, E::GroupEIb), g!(GroupId::Group2, E::GroupEIb),
        f!(I::RetNear, E::ImmW), f!(I::RetNear, E::Implicit),
        f!(I::Les, E::GvMp), f!(I::Lds, E::GvMp), f!(I::Mov, E::GroupEbIb), f!(I::Mov, E::GroupEvIz),
        // 0xC8
        f!(I::Enter, E::IwIb), f!(I::Leave, E::Implicit), f!(I::RetFar, E::ImmW), f!(I::RetFar, E::Implicit),
        f!(I::Int3, E::Implicit), f!(I::Int, E::ImmB), f!(I::Into, E::Implicit), f!(I::Iret, E::Implicit),
        // 0xD0
        g!(GroupId::Group2, E::GroupE1), g!(GroupId::Group2, E::GroupE1),
        g!(GroupId::Group2, E::GroupECl), g!(GroupId::Group2, E::GroupECl),
        f!(I::Aam, E::ImmB), f!(I::Aad, E::ImmB), Op::Invalid, f!(I::Xlat, E::Implicit),
        // 0xD8
        Op::Final(I::Invalid, E::Fpu(0)), Op::Final(I::Invalid, E::Fpu(1)),
        Op::Final(I::Invalid, E::Fpu(2)), Op::Final(I::Invalid, E::Fpu(3)),
        Op::Final(I::Invalid, E::Fpu(4)), Op::Final(I::Invalid, E::Fpu(5)),
        Op::Final(I::Invalid, E::Fpu(6)), Op::Final(I::Invalid, E::Fpu(7)),
        // 0xE0
        f!(I::LoopNe, E::Jb), f!(I::LoopE, E::Jb), f!(I::Loop, E::Jb), f!(I::Jcxz, E::Jb),
        f!(I::In, E::AlIb), f!(I::In, E::EaxIb), f!(I::Out, E::IbAl), f!(I::Out, E::IbEax),
        // 0xE8
        f!(I::CallNear, E::Jz), f!(I::JmpNear, E::Jz), f!(I::JmpFar, E::Ap), f!(I::JmpNear, E::Jb),
        f!(I::In, E::Implicit), f!(I::In, E::Implicit), f!(I::Out, E::Implicit), f!(I::Out, E::Implicit),
        // 0xF0
        Op::Invalid, Op::Invalid, Op::Invalid, Op::Invalid,
        f!(I::Hlt, E::Implicit), f!(I::Cmc, E::Implicit),
        g!(GroupId::Group3, E::Group3Eb), g!(GroupId::Group3, E::Group3Ev),
        // 0xF8
        f!(I::Clc, E::Implicit), f!(I::Stc, E::Implicit), f!(I::Cli, E::Implicit), f!(I::Sti, E::Implicit),
        f!(I::Cld, E::Implicit), f!(I::Std, E::Implicit),
        g!(GroupId::Group4, E::GroupE), g!(GroupId::Group5, E::GroupE),
    ]
}
