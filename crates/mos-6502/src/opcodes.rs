//! Opcode decode table.
//!
//! Maps every opcode byte to its mnemonic, addressing mode and base cycle
//! count. The 151 documented NMOS opcodes carry their historical timings;
//! the other 105 byte values all decode to [`Mnemonic::Illegal`], a
//! 2-cycle implied no-op.

use std::fmt;

/// Instruction mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Any undocumented opcode.
    Illegal,
}

impl Mnemonic {
    /// Assembler name, `???` for undocumented opcodes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Illegal => "???",
        }
    }

    /// Whether an indexed access that crosses a page costs one more cycle.
    ///
    /// Only reads pay it. Stores and read-modify-write instructions always
    /// take the slow path and have it folded into their base cycles.
    #[must_use]
    pub const fn has_page_penalty(self) -> bool {
        matches!(
            self,
            Self::Adc
                | Self::And
                | Self::Cmp
                | Self::Eor
                | Self::Lda
                | Self::Ldx
                | Self::Ldy
                | Self::Ora
                | Self::Sbc
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand (CLC, RTS, ...).
    Implied,
    /// Operates on A (ASL A, ...).
    Accumulator,
    /// `#$nn`
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,X`, wraps in page zero.
    ZeroPageX,
    /// `$nn,Y`, wraps in page zero.
    ZeroPageY,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,X`
    AbsoluteX,
    /// `$nnnn,Y`
    AbsoluteY,
    /// `($nnnn)`, JMP only.
    Indirect,
    /// `($nn,X)`
    IndexedIndirect,
    /// `($nn),Y`
    IndirectIndexed,
    /// Signed branch offset.
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    #[must_use]
    pub const fn operand_len(self) -> u8 {
        match self {
            Self::Implied | Self::Accumulator => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }

    /// Whether the instruction works on A rather than memory.
    #[must_use]
    pub const fn targets_accumulator(self) -> bool {
        matches!(self, Self::Implied | Self::Accumulator)
    }
}

/// A decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base cycles, before page-crossing and branch penalties.
    pub cycles: u8,
}

impl Opcode {
    /// Sentinel for every undocumented opcode.
    pub const ILLEGAL: Self = Self::new(Mnemonic::Illegal, AddressingMode::Implied, 2);

    #[must_use]
    pub const fn new(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Self {
        Self {
            mnemonic,
            mode,
            cycles,
        }
    }

    /// Instruction length in bytes, opcode included.
    #[must_use]
    pub const fn size(self) -> u8 {
        1 + self.mode.operand_len()
    }

    #[must_use]
    pub const fn is_illegal(self) -> bool {
        matches!(self.mnemonic, Mnemonic::Illegal)
    }
}

impl Default for Opcode {
    fn default() -> Self {
        Self::ILLEGAL
    }
}

/// The full decode table, indexed by opcode byte.
pub static OPCODES: [Opcode; 256] = build_table();

/// Look up an opcode byte. Never fails.
#[must_use]
pub fn decode(opcode: u8) -> Opcode {
    OPCODES[usize::from(opcode)]
}

const fn build_table() -> [Opcode; 256] {
    let mut table = [Opcode::ILLEGAL; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = entry(i as u8);
        i += 1;
    }
    table
}

#[allow(clippy::enum_glob_use)]
const fn entry(opcode: u8) -> Opcode {
    use AddressingMode::*;
    use Mnemonic::*;

    const fn op(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Opcode {
        Opcode::new(mnemonic, mode, cycles)
    }

    match opcode {
        0x00 => op(Brk, Implied, 7),
        0x01 => op(Ora, IndexedIndirect, 6),
        0x05 => op(Ora, ZeroPage, 3),
        0x06 => op(Asl, ZeroPage, 5),
        0x08 => op(Php, Implied, 3),
        0x09 => op(Ora, Immediate, 2),
        0x0A => op(Asl, Accumulator, 2),
        0x0D => op(Ora, Absolute, 4),
        0x0E => op(Asl, Absolute, 6),

        0x10 => op(Bpl, Relative, 2),
        0x11 => op(Ora, IndirectIndexed, 5),
        0x15 => op(Ora, ZeroPageX, 4),
        0x16 => op(Asl, ZeroPageX, 6),
        0x18 => op(Clc, Implied, 2),
        0x19 => op(Ora, AbsoluteY, 4),
        0x1D => op(Ora, AbsoluteX, 4),
        0x1E => op(Asl, AbsoluteX, 7),

        0x20 => op(Jsr, Absolute, 6),
        0x21 => op(And, IndexedIndirect, 6),
        0x24 => op(Bit, ZeroPage, 3),
        0x25 => op(And, ZeroPage, 3),
        0x26 => op(Rol, ZeroPage, 5),
        0x28 => op(Plp, Implied, 4),
        0x29 => op(And, Immediate, 2),
        0x2A => op(Rol, Accumulator, 2),
        0x2C => op(Bit, Absolute, 4),
        0x2D => op(And, Absolute, 4),
        0x2E => op(Rol, Absolute, 6),

        0x30 => op(Bmi, Relative, 2),
        0x31 => op(And, IndirectIndexed, 5),
        0x35 => op(And, ZeroPageX, 4),
        0x36 => op(Rol, ZeroPageX, 6),
        0x38 => op(Sec, Implied, 2),
        0x39 => op(And, AbsoluteY, 4),
        0x3D => op(And, AbsoluteX, 4),
        0x3E => op(Rol, AbsoluteX, 7),

        0x40 => op(Rti, Implied, 6),
        0x41 => op(Eor, IndexedIndirect, 6),
        0x45 => op(Eor, ZeroPage, 3),
        0x46 => op(Lsr, ZeroPage, 5),
        0x48 => op(Pha, Implied, 3),
        0x49 => op(Eor, Immediate, 2),
        0x4A => op(Lsr, Accumulator, 2),
        0x4C => op(Jmp, Absolute, 3),
        0x4D => op(Eor, Absolute, 4),
        0x4E => op(Lsr, Absolute, 6),

        0x50 => op(Bvc, Relative, 2),
        0x51 => op(Eor, IndirectIndexed, 5),
        0x55 => op(Eor, ZeroPageX, 4),
        0x56 => op(Lsr, ZeroPageX, 6),
        0x58 => op(Cli, Implied, 2),
        0x59 => op(Eor, AbsoluteY, 4),
        0x5D => op(Eor, AbsoluteX, 4),
        0x5E => op(Lsr, AbsoluteX, 7),

        0x60 => op(Rts, Implied, 6),
        0x61 => op(Adc, IndexedIndirect, 6),
        0x65 => op(Adc, ZeroPage, 3),
        0x66 => op(Ror, ZeroPage, 5),
        0x68 => op(Pla, Implied, 4),
        0x69 => op(Adc, Immediate, 2),
        0x6A => op(Ror, Accumulator, 2),
        0x6C => op(Jmp, Indirect, 5),
        0x6D => op(Adc, Absolute, 4),
        0x6E => op(Ror, Absolute, 6),

        0x70 => op(Bvs, Relative, 2),
        0x71 => op(Adc, IndirectIndexed, 5),
        0x75 => op(Adc, ZeroPageX, 4),
        0x76 => op(Ror, ZeroPageX, 6),
        0x78 => op(Sei, Implied, 2),
        0x79 => op(Adc, AbsoluteY, 4),
        0x7D => op(Adc, AbsoluteX, 4),
        0x7E => op(Ror, AbsoluteX, 7),

        0x81 => op(Sta, IndexedIndirect, 6),
        0x84 => op(Sty, ZeroPage, 3),
        0x85 => op(Sta, ZeroPage, 3),
        0x86 => op(Stx, ZeroPage, 3),
        0x88 => op(Dey, Implied, 2),
        0x8A => op(Txa, Implied, 2),
        0x8C => op(Sty, Absolute, 4),
        0x8D => op(Sta, Absolute, 4),
        0x8E => op(Stx, Absolute, 4),

        0x90 => op(Bcc, Relative, 2),
        0x91 => op(Sta, IndirectIndexed, 6),
        0x94 => op(Sty, ZeroPageX, 4),
        0x95 => op(Sta, ZeroPageX, 4),
        0x96 => op(Stx, ZeroPageY, 4),
        0x98 => op(Tya, Implied, 2),
        0x99 => op(Sta, AbsoluteY, 5),
        0x9A => op(Txs, Implied, 2),
        0x9D => op(Sta, AbsoluteX, 5),

        0xA0 => op(Ldy, Immediate, 2),
        0xA1 => op(Lda, IndexedIndirect, 6),
        0xA2 => op(Ldx, Immediate, 2),
        0xA4 => op(Ldy, ZeroPage, 3),
        0xA5 => op(Lda, ZeroPage, 3),
        0xA6 => op(Ldx, ZeroPage, 3),
        0xA8 => op(Tay, Implied, 2),
        0xA9 => op(Lda, Immediate, 2),
        0xAA => op(Tax, Implied, 2),
        0xAC => op(Ldy, Absolute, 4),
        0xAD => op(Lda, Absolute, 4),
        0xAE => op(Ldx, Absolute, 4),

        0xB0 => op(Bcs, Relative, 2),
        0xB1 => op(Lda, IndirectIndexed, 5),
        0xB4 => op(Ldy, ZeroPageX, 4),
        0xB5 => op(Lda, ZeroPageX, 4),
        0xB6 => op(Ldx, ZeroPageY, 4),
        0xB8 => op(Clv, Implied, 2),
        0xB9 => op(Lda, AbsoluteY, 4),
        0xBA => op(Tsx, Implied, 2),
        0xBC => op(Ldy, AbsoluteX, 4),
        0xBD => op(Lda, AbsoluteX, 4),
        0xBE => op(Ldx, AbsoluteY, 4),

        0xC0 => op(Cpy, Immediate, 2),
        0xC1 => op(Cmp, IndexedIndirect, 6),
        0xC4 => op(Cpy, ZeroPage, 3),
        0xC5 => op(Cmp, ZeroPage, 3),
        0xC6 => op(Dec, ZeroPage, 5),
        0xC8 => op(Iny, Implied, 2),
        0xC9 => op(Cmp, Immediate, 2),
        0xCA => op(Dex, Implied, 2),
        0xCC => op(Cpy, Absolute, 4),
        0xCD => op(Cmp, Absolute, 4),
        0xCE => op(Dec, Absolute, 6),

        0xD0 => op(Bne, Relative, 2),
        0xD1 => op(Cmp, IndirectIndexed, 5),
        0xD5 => op(Cmp, ZeroPageX, 4),
        0xD6 => op(Dec, ZeroPageX, 6),
        0xD8 => op(Cld, Implied, 2),
        0xD9 => op(Cmp, AbsoluteY, 4),
        0xDD => op(Cmp, AbsoluteX, 4),
        0xDE => op(Dec, AbsoluteX, 7),

        0xE0 => op(Cpx, Immediate, 2),
        0xE1 => op(Sbc, IndexedIndirect, 6),
        0xE4 => op(Cpx, ZeroPage, 3),
        0xE5 => op(Sbc, ZeroPage, 3),
        0xE6 => op(Inc, ZeroPage, 5),
        0xE8 => op(Inx, Implied, 2),
        0xE9 => op(Sbc, Immediate, 2),
        0xEA => op(Nop, Implied, 2),
        0xEC => op(Cpx, Absolute, 4),
        0xED => op(Sbc, Absolute, 4),
        0xEE => op(Inc, Absolute, 6),

        0xF0 => op(Beq, Relative, 2),
        0xF1 => op(Sbc, IndirectIndexed, 5),
        0xF5 => op(Sbc, ZeroPageX, 4),
        0xF6 => op(Inc, ZeroPageX, 6),
        0xF8 => op(Sed, Implied, 2),
        0xF9 => op(Sbc, AbsoluteY, 4),
        0xFD => op(Sbc, AbsoluteX, 4),
        0xFE => op(Inc, AbsoluteX, 7),

        _ => Opcode::ILLEGAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcode_count() {
        let legal = OPCODES.iter().filter(|op| !op.is_illegal()).count();
        assert_eq!(legal, 151);
    }

    #[test]
    fn every_mnemonic_is_reachable() {
        let mut seen: Vec<Mnemonic> = OPCODES.iter().map(|op| op.mnemonic).collect();
        seen.sort_by_key(|m| m.name());
        seen.dedup();
        // 56 documented mnemonics plus the illegal sentinel
        assert_eq!(seen.len(), 57);
    }

    #[test]
    fn undocumented_bytes_decode_to_sentinel() {
        for byte in [0x02, 0x1A, 0x80, 0xC2, 0xFF] {
            let op = decode(byte);
            assert_eq!(op, Opcode::ILLEGAL, "{byte:#04X}");
            assert_eq!(op.mnemonic.to_string(), "???");
            assert_eq!(op.cycles, 2);
        }
    }

    #[test]
    fn spot_check_timings() {
        assert_eq!(
            decode(0xA9),
            Opcode::new(Mnemonic::Lda, AddressingMode::Immediate, 2)
        );
        assert_eq!(
            decode(0x6C),
            Opcode::new(Mnemonic::Jmp, AddressingMode::Indirect, 5)
        );
        assert_eq!(decode(0x91).cycles, 6);
        assert_eq!(decode(0xFE).cycles, 7);
        assert_eq!(decode(0x00).cycles, 7);
    }

    #[test]
    fn lengths_follow_mode() {
        assert_eq!(decode(0xEA).size(), 1);
        assert_eq!(decode(0x0A).size(), 1);
        assert_eq!(decode(0xD0).size(), 2);
        assert_eq!(decode(0xB1).size(), 2);
        assert_eq!(decode(0x4C).size(), 3);
        assert_eq!(decode(0x6C).size(), 3);
    }

    #[test]
    fn only_reads_pay_page_penalty() {
        assert!(Mnemonic::Lda.has_page_penalty());
        assert!(Mnemonic::Sbc.has_page_penalty());
        assert!(!Mnemonic::Sta.has_page_penalty());
        assert!(!Mnemonic::Inc.has_page_penalty());
        assert!(!Mnemonic::Asl.has_page_penalty());
    }
}
