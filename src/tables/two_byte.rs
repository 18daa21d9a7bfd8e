//! The two-byte (`0F xx`) opcode map, corresponding to the original's
//! `twoByteOpcodeMap[256]`. Coverage favors the instructions a general
//! decoder actually encounters (conditional branches/sets/moves, bit
//! manipulation, system/privileged instructions, core MMX) over the full
//! long tail of SSE2+ encodings, which the spec's Non-goals explicitly
//! exclude (see the `SSE-stub` redesign decision).

use super::groups::GroupId;
use super::{Encoding as E, OpcodeEntry as Op};
use crate::operand::{Condition as C, Operation as I};

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
macro_rules! cc {
    ($mk:ident, $enc:expr) => {
        [
            f!(I::$mk(C::O), $enc), f!(I::$mk(C::No), $enc), f!(I::$mk(C::B), $enc), f!(I::$mk(C::Ae), $enc),
            f!(I::$mk(C::E), $enc), f!(I::$mk(C::Ne), $enc), f!(I::$mk(C::Be), $enc), f!(I::$mk(C::A), $enc),
            f!(I::$mk(C::S), $enc), f!(I::$mk(C::Ns), $enc), f!(I::$mk(C::P), $enc), f!(I::$mk(C::Np), $enc),
            f!(I::$mk(C::L), $enc), f!(I::$mk(C::Ge), $enc), f!(I::$mk(C::Le), $enc), f!(I::$mk(C::G), $enc),
        ]
    };
}

pub const TWO_BYTE: [Op; 256] = build();

const fn build() -> [Op; 256] {
    let mut t = [Op::Invalid; 256];

    t[0x00] = g!(GroupId::Group6, E::GroupE);
    t[0x01] = g!(GroupId::Group7, E::GroupE);
    t[0x02] = f!(I::Lar, E::GvEv);
    t[0x03] = f!(I::Lsl, E::GvEv);
    t[0x05] = f!(I::Syscall, E::Implicit);
    t[0x10] = f!(I::Movups, E::VxWx);
    t[0x11] = f!(I::Movups, E::WxVx);
    t[0x12] = f!(I::Movlps, E::VxMq);
    t[0x13] = f!(I::Movlps, E::MqVx);
    t[0x16] = f!(I::Movhps, E::VxMq);
    t[0x17] = f!(I::Movhps, E::MqVx);
    t[0x06] = f!(I::Clts, E::Implicit);
    t[0x07] = f!(I::Sysret, E::Implicit);
    t[0x08] = f!(I::Invd, E::Implicit);
    t[0x09] = f!(I::Wbinvd, E::Implicit);
    t[0x0A] = f!(I::Femms, E::Implicit);
    t[0x0B] = f!(I::Ud2, E::Implicit);
    t[0x0D] = f!(I::Prefetch, E::GroupE); // AMD PREFETCH/PREFETCHW; reg field not distinguished here
    t[0x0F] = Op::Final(I::Invalid, E::ThreeDNow);
    t[0x1F] = f!(I::Nop, E::GroupE); // multi-byte NOP (Gv, Ev form, operand ignored)

    t[0x20] = f!(I::MovCr, E::GvCr);
    t[0x21] = f!(I::MovDr, E::GvCr);
    t[0x22] = f!(I::MovCr, E::CrGv);
    t[0x23] = f!(I::MovDr, E::CrGv);

    t[0x30] = f!(I::Wrmsr, E::Implicit);
    t[0x31] = f!(I::Rdtsc, E::Implicit);
    t[0x32] = f!(I::Rdmsr, E::Implicit);
    t[0x33] = f!(I::Rdpmc, E::Implicit);
    t[0x34] = f!(I::Sysenter, E::Implicit);
    t[0x35] = f!(I::Sysexit, E::Implicit);

    let cmovcc = cc!(CmovCc, E::CcGvEv);
    let mut i = 0;
    while i < 16 {
        t[0x40 + i] = cmovcc[i];
        i += 1;
    }

    t[0x28] = f!(I::Movaps, E::VxWx);
    t[0x29] = f!(I::Movaps, E::WxVx);

    t[0x6E] = f!(I::Movd, E::PqQq);
    t[0x6F] = f!(I::Movq, E::PqQq);
    t[0x7E] = f!(I::Movd, E::PqQq);
    t[0x7F] = f!(I::Movq, E::PqQq);

    let jcc = cc!(Jcc, E::CcJz);
    let mut i = 0;
    while i < 16 {
        t[0x80 + i] = jcc[i];
        i += 1;
    }
    let setcc = cc!(SetCc, E::CcGbEb);
    let mut i = 0;
    while i < 16 {
        t[0x90 + i] = setcc[i];
        i += 1;
    }

    t[0xA2] = f!(I::Cpuid, E::Implicit);
    t[0xA3] = f!(I::Bt, E::EvGv);
    t[0xA4] = f!(I::Shld, E::GroupEvIb);
    t[0xA5] = f!(I::Shld, E::GroupECl);
    t[0xAB] = f!(I::Bts, E::EvGv);
    t[0xB0] = f!(I::Cmpxchg, E::EbGb);
    t[0xB1] = f!(I::Cmpxchg, E::EvGv);
    t[0xAC] = f!(I::Shrd, E::GroupEvIb);
    t[0xAD] = f!(I::Shrd, E::GroupECl);
    t[0xAF] = f!(I::Imul, E::GvEv);
    t[0xB2] = f!(I::Lss, E::GvMp);
    t[0xB3] = f!(I::Btr, E::EvGv);
    t[0xB4] = f!(I::Lfs, E::GvMp);
    t[0xB5] = f!(I::Lgs, E::GvMp);
    t[0xB6] = f!(I::Movzx, E::GbEb);
    t[0xB7] = f!(I::Movzx, E::GvEw);
    t[0xBA] = g!(GroupId::Group8, E::GroupEIb);
    t[0xBB] = f!(I::Btc, E::EvGv);
    t[0xBC] = f!(I::Bsf, E::GvEv);
    t[0xBD] = f!(I::Bsr, E::GvEv);
    t[0xBE] = f!(I::Movsx, E::GbEb);
    t[0xBF] = f!(I::Movsx, E::GvEw);
    t[0xC0] = f!(I::Xadd, E::EbGb);
    t[0xC1] = f!(I::Xadd, E::EvGv);
    t[0xC7] = g!(GroupId::Group9, E::GroupE);

    let mut i = 0;
    while i < 8 {
        t[0xC8 + i] = f!(I::Bswap, E::Reg);
        i += 1;
    }

    t[0xDB] = f!(I::Pand, E::PqQq);
    t[0xDF] = f!(I::Pandn, E::PqQq);
    t[0xEB] = f!(I::Por, E::PqQq);
    t[0xEF] = f!(I::Pxor, E::PqQq);
    t[0xFC] = f!(I::Paddb, E::PqQq);
    t[0xFD] = f!(I::Paddw, E::PqQq);
    t[0xFE] = f!(I::Paddd, E::PqQq);
    t[0xF8] = f!(I::Psubb, E::PqQq);
    t[0xF9] = f!(I::Psubw, E::PqQq);
    t[0xFA] = f!(I::Psubd, E::PqQq);
    t[0x74] = f!(I::Pcmpeqb, E::PqQq);
    t[0x75] = f!(I::Pcmpeqw, E::PqQq);
    t[0x76] = f!(I::Pcmpeqd, E::PqQq);
    t[0x64] = f!(I::Pcmpgtb, E::PqQq);
    t[0x65] = f!(I::Pcmpgtw, E::PqQq);
    t[0x66] = f!(I::Pcmpgtd, E::PqQq);
    t[0x60] = f!(I::Punpcklbw, E::PqQq);
    t[0x61] = f!(I::Punpcklwd, E::PqQq);
    t[0x62] = f!(I::Punpckldq, E::PqQq);
    t[0x68] = f!(I::Punpckhbw, E::PqQq);
    t[0x69] = f!(I::Punpckhwd, E::PqQq);
    t[0x6A] = f!(I::Punpckhdq, E::PqQq);
    t[0x63] = f!(I::Packsswb, E::PqQq);
    t[0x6B] = f!(I::Packssdw, E::PqQq);
    t[0x67] = f!(I::Packuswb, E::PqQq);
    t[0xD5] = f!(I::Pmullw, E::PqQq);
    t[0xE5] = f!(I::Pmulhw, E::PqQq);
    t[0xF5] = f!(I::Pmaddwd, E::PqQq);
    t[0xF1] = f!(I::Psllw, E::PqQq);
    t[0xF2] = f!(I::Pslld, E::PqQq);
    t[0xF3] = f!(I::Psllq, E::PqQq);
    t[0xD1] = f!(I::Psrlw, E::PqQq);
    t[0xD2] = f!(I::Psrld, E::PqQq);
    t[0xD3] = f!(I::Psrlq, E::PqQq);
    t[0xE1] = f!(I::Psraw, E::PqQq);
    t[0xE2] = f!(I::Psrad, E::PqQq);
    t[0x77] = f!(I::Emms, E::Implicit);

    t
}
