//! Per-instruction trace snapshots.
//!
//! A snapshot is taken on the cycle an instruction is decoded: the raw
//! instruction bytes as they were before it ran, and the registers as
//! they are after. Its `Display` renders one fixed-column trace line:
//!
//! ```text
//! 0401 A2 FF     LDX #$FF      |00 FF 00 FF|100100|2
//! ```
//!
//! Columns are address, bytes, disassembly, `A X Y S`, the `NVDIZC` flags
//! and the cycles the instruction costs.

use std::fmt::{self, Write as _};

use crate::Registers;
use crate::flags::{C, D, I, N, V, Z};
use crate::opcodes::{AddressingMode, Mnemonic, Opcode};

/// One decoded and executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSnapshot {
    /// Address of the opcode byte.
    pub address: u16,
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Operand as written in the disassembly. Branches hold the target
    /// address, not the raw offset.
    pub operand: u16,
    /// Registers after the instruction executed.
    pub registers: Registers,
    /// Total cycles including penalties.
    pub cycles: u8,
    bytes: [u8; 3],
    len: u8,
}

impl TraceSnapshot {
    pub(crate) fn capture(
        address: u16,
        bytes: [u8; 3],
        opcode: Opcode,
        registers: Registers,
        cycles: u8,
    ) -> Self {
        let byte = u16::from(bytes[1]);
        let word = u16::from_le_bytes([bytes[1], bytes[2]]);
        let operand = match opcode.mode {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => byte,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => word,
            AddressingMode::Relative => {
                let offset = bytes[1] as i8;
                address.wrapping_add(2).wrapping_add(offset as u16)
            }
        };

        Self {
            address,
            mnemonic: opcode.mnemonic,
            mode: opcode.mode,
            operand,
            registers,
            cycles,
            bytes,
            len: opcode.size(),
        }
    }

    /// The instruction's bytes, opcode first.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Assembly text, e.g. `LDA ($20),Y`.
    #[must_use]
    pub fn disassembly(&self) -> String {
        let name = self.mnemonic.name();
        let op = self.operand;
        match self.mode {
            AddressingMode::Implied => name.to_string(),
            AddressingMode::Accumulator => format!("{name} A"),
            AddressingMode::Immediate => format!("{name} #${op:02X}"),
            AddressingMode::ZeroPage => format!("{name} ${op:02X}"),
            AddressingMode::ZeroPageX => format!("{name} ${op:02X},X"),
            AddressingMode::ZeroPageY => format!("{name} ${op:02X},Y"),
            AddressingMode::Absolute | AddressingMode::Relative => format!("{name} ${op:04X}"),
            AddressingMode::AbsoluteX => format!("{name} ${op:04X},X"),
            AddressingMode::AbsoluteY => format!("{name} ${op:04X},Y"),
            AddressingMode::Indirect => format!("{name} (${op:04X})"),
            AddressingMode::IndexedIndirect => format!("{name} (${op:02X},X)"),
            AddressingMode::IndirectIndexed => format!("{name} (${op:02X}),Y"),
        }
    }
}

impl fmt::Display for TraceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = String::with_capacity(9);
        for byte in self.bytes() {
            write!(raw, "{byte:02X} ")?;
        }

        let r = &self.registers;
        let flag = |bit: u8| u8::from(r.p.is_set(bit));

        write!(
            f,
            "{:04X} {raw:<9} {:<14}|{:02X} {:02X} {:02X} {:02X}|{}{}{}{}{}{}|{}",
            self.address,
            self.disassembly(),
            r.a,
            r.x,
            r.y,
            r.s,
            flag(N),
            flag(V),
            flag(D),
            flag(I),
            flag(Z),
            flag(C),
            self.cycles,
        )
    }
}
