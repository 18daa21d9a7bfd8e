//! ModR/M and SIB byte resolution into a memory or register operand.
//!
//! Generalizes the teacher's `ModRm`/`Sib` structs (`instruction_emulator.rs`),
//! which stopped at classifying the byte's fields, into full operand
//! construction: base/index register selection honoring REX.B/X,
//! RIP-relative addressing in 64-bit mode, and the mod==0/rm==5
//! absolute-disp32 special case in 16/32-bit mode.

use crate::error::{decode_err, DResult};
use crate::reader::Reader;
use crate::registers::{gpr, OpSize, Reg, SegReg};

#[derive(Debug, Clone, Copy)]
pub struct ModRmByte {
    pub md: u8,
    pub reg: u8,
    pub rm: u8,
}

impl ModRmByte {
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            md: (byte >> 6) & 0x3,
            reg: (byte >> 3) & 0x7,
            rm: byte & 0x7,
        }
    }

    pub const fn is_register(self) -> bool {
        self.md == 3
    }

    const fn needs_sib(self) -> bool {
        self.md != 3 && self.rm == 4
    }
}

#[derive(Debug, Clone, Copy)]
struct SibByte {
    scale: u8,
    index: u8,
    base: u8,
}

impl SibByte {
    const fn from_byte(byte: u8) -> Self {
        Self {
            scale: (byte >> 6) & 0x3,
            index: (byte >> 3) & 0x7,
            base: byte & 0x7,
        }
    }
}

/// A fully resolved r/m operand: either a plain register or a memory
/// reference, plus (for memory references addressed `[rip + disp32]`) the
/// raw displacement a caller must still finalize once the instruction's
/// total length is known.
pub struct ResolvedRm {
    pub reg: Option<Reg>,
    pub mem_base: Option<Reg>,
    pub mem_index: Option<Reg>,
    pub mem_scale: u8,
    pub mem_disp: i64,
    pub segment_override: Option<SegReg>,
    pub is_rip_relative: bool,
}

impl ResolvedRm {
    fn register(reg: Reg) -> Self {
        Self {
            reg: Some(reg),
            mem_base: None,
            mem_index: None,
            mem_scale: 0,
            mem_disp: 0,
            segment_override: None,
            is_rip_relative: false,
        }
    }

    fn memory(base: Option<Reg>, index: Option<Reg>, scale: u8, disp: i64, rip: bool) -> Self {
        Self {
            reg: None,
            mem_base: base,
            mem_index: index,
            mem_scale: scale,
            mem_disp: disp,
            segment_override: None,
            is_rip_relative: rip,
        }
    }

    pub const fn is_memory(&self) -> bool {
        self.reg.is_none()
    }
}

/// Which register file the r/m field names when `mod == 3`. Memory-form
/// addressing is unaffected by this — it always walks the GPR address
/// registers regardless of which file the *register* form would use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RmRegClass {
    #[default]
    Gpr,
    Mmx,
    Xmm,
}

/// Parameters threaded through from prefix/size resolution; kept as one
/// struct rather than four positional bools/enums so call sites at the
/// handler layer stay readable.
#[derive(Clone, Copy)]
pub struct RmContext {
    pub mode: crate::mode::CpuMode,
    pub address_size: OpSize,
    pub operand_size: OpSize,
    pub rex_r: bool,
    pub rex_x: bool,
    pub rex_b: bool,
    pub rex_present: bool,
    pub segment_override: Option<SegReg>,
    /// Register file the r/m field resolves to under `mod == 3`; defaults
    /// to the GPR file used by almost every encoding. MMX/XMM-operand
    /// handlers (`Pq/Qq`, `Vx/Wx`, ...) override this per call.
    pub rm_reg_class: RmRegClass,
}

/// Read the ModR/M byte (and SIB/displacement if the encoding calls for
/// them) and resolve the r/m field into a register or memory operand. The
/// reg field is returned separately, resolved against `operand_size` (or
/// left to the caller to reinterpret, e.g. as a group opcode selector).
pub fn read_modrm(reader: &mut Reader, ctx: &RmContext) -> DResult<(ModRmByte, ResolvedRm)> {
    let byte = reader.read8()?;
    let modrm = ModRmByte::from_byte(byte);

    if modrm.is_register() {
        let idx = (modrm.rm & 0x7) | if ctx.rex_b { 0x8 } else { 0 };
        let reg = match ctx.rm_reg_class {
            RmRegClass::Gpr => gpr(modrm.rm, ctx.rex_b, ctx.operand_size, ctx.rex_present),
            RmRegClass::Mmx => Reg::Mmx(modrm.rm & 0x7),
            RmRegClass::Xmm => Reg::Xmm(idx),
        };
        return Ok((modrm, ResolvedRm::register(reg)));
    }

    if ctx.address_size == OpSize::Word {
        return Ok((modrm, resolve_16bit_mem(reader, modrm)?));
    }

    // 32- or 64-bit addressing.
    let addr_size = ctx.address_size;
    let mut rm = ResolvedRm::memory(None, None, 0, 0, false);

    if modrm.needs_sib() {
        let sib_byte = SibByte::from_byte(reader.read8()?);
        let has_index = !(sib_byte.index == 4 && !ctx.rex_x);
        if has_index {
            rm.mem_index = Some(gpr(sib_byte.index, ctx.rex_x, addr_size, true));
            rm.mem_scale = 1 << sib_byte.scale;
        }
        if sib_byte.base == 5 && modrm.md == 0 {
            rm.mem_disp = reader.read_signed32()?;
            rm.mem_base = None;
        } else {
            rm.mem_base = Some(gpr(sib_byte.base, ctx.rex_b, addr_size, true));
        }
    } else if modrm.md == 0 && modrm.rm == 5 {
        // disp32, RIP-relative in 64-bit mode, absolute in 32-bit mode.
        let disp = reader.read_signed32()?;
        rm.mem_disp = disp;
        rm.is_rip_relative = ctx.mode.is_long_mode();
    } else {
        rm.mem_base = Some(gpr(modrm.rm, ctx.rex_b, addr_size, true));
    }

    match modrm.md {
        1 => rm.mem_disp = reader.read_signed8()?,
        2 if !(modrm.needs_sib() && modrm.rm == 4 && rm.mem_base.is_none()) => {
            rm.mem_disp = reader.read_signed32()?
        }
        _ => {}
    }

    rm.segment_override = ctx.segment_override;
    Ok((modrm, rm))
}

fn resolve_16bit_mem(reader: &mut Reader, modrm: ModRmByte) -> DResult<ResolvedRm> {
    // 16-bit addressing has a fixed 8-entry base/index pairing table; there
    // is no SIB byte and no RIP-relative form.
    const BASE: [Option<u8>; 8] = [
        Some(3), // BX + SI
        Some(3), // BX + DI
        Some(5), // BP + SI
        Some(5), // BP + DI
        None,    // SI
        None,    // DI
        Some(5), // BP (disp only in mod==0)
        Some(3), // BX
    ];
    const INDEX: [Option<u8>; 8] = [
        Some(6),
        Some(7),
        Some(6),
        Some(7),
        Some(6),
        Some(7),
        None,
        None,
    ];

    if modrm.md == 0 && modrm.rm == 6 {
        let disp = reader.read_signed16()?;
        return Ok(ResolvedRm::memory(None, None, 0, disp, false));
    }

    let base = BASE[modrm.rm as usize].map(|i| gpr(i, false, OpSize::Word, false));
    let index = INDEX[modrm.rm as usize].map(|i| gpr(i, false, OpSize::Word, false));

    let disp = match modrm.md {
        0 => 0,
        1 => reader.read_signed8()?,
        2 => reader.read_signed16()?,
        _ => decode_err!("resolve_16bit_mem: mod==3 handled earlier"),
    };

    Ok(ResolvedRm::memory(base, index, if index.is_some() { 1 } else { 0 }, disp, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::CpuMode;

    fn ctx32() -> RmContext {
        RmContext {
            mode: CpuMode::Bits32,
            address_size: OpSize::Dword,
            operand_size: OpSize::Dword,
            rex_r: false,
            rex_x: false,
            rex_b: false,
            rex_present: false,
            segment_override: None,
            rm_reg_class: RmRegClass::Gpr,
        }
    }

    #[test]
    fn register_direct_mode() {
        let mut r = Reader::new(&[0xD8]); // mod=11 reg=3 rm=0
        let (modrm, rm) = read_modrm(&mut r, &ctx32()).unwrap();
        assert_eq!(modrm.reg, 3);
        assert!(!rm.is_memory());
        assert_eq!(rm.reg.unwrap().name(), "eax");
    }

    #[test]
    fn sib_disp32_no_base() {
        // mod=00 rm=100 (SIB), SIB: scale=00 index=100(none) base=101 -> disp32 only
        let mut r = Reader::new(&[0x04, 0x25, 0x78, 0x56, 0x34, 0x12]);
        let (_, rm) = read_modrm(&mut r, &ctx32()).unwrap();
        assert!(rm.is_memory());
        assert!(rm.mem_base.is_none());
        assert!(rm.mem_index.is_none());
        assert_eq!(rm.mem_disp, 0x1234_5678);
    }

    #[test]
    fn rip_relative_in_64bit_mode() {
        let mut ctx = ctx32();
        ctx.mode = CpuMode::Bits64;
        ctx.address_size = OpSize::Qword;
        let mut r = Reader::new(&[0x05, 0x78, 0x56, 0x34, 0x12]); // mod=00 rm=101
        let (_, rm) = read_modrm(&mut r, &ctx).unwrap();
        assert!(rm.is_rip_relative);
        assert_eq!(rm.mem_disp, 0x1234_5678);
    }

    #[test]
    fn sixteen_bit_bp_disp_only() {
        let mut r = Reader::new(&[0x46, 0x05]); // mod=01 rm=110 (BP + disp8)
        let mut ctx = ctx32();
        ctx.address_size = OpSize::Word;
        let (_, rm) = read_modrm(&mut r, &ctx).unwrap();
        assert!(rm.is_memory());
        assert_eq!(rm.mem_base.unwrap().name(), "bp");
        assert_eq!(rm.mem_disp, 5);
    }
}
