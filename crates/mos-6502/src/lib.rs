//! Cycle-stepped MOS 6502 instruction-set simulator.
//!
//! Each `step()` advances one clock cycle. An instruction is fetched,
//! decoded and executed in full on the cycle where the previous one has
//! run out; the cycles it costs are then counted down by later steps.
//!
//! The 151 documented opcodes are implemented bit-exactly, including the
//! indirect `JMP` page-wrap bug, NMOS decimal mode and page-crossing
//! penalties. Every undocumented opcode decodes to a single 2-cycle no-op.

mod addressing;
mod cpu;
pub mod flags;
mod instructions;
mod opcodes;
mod registers;
mod trace;

pub use cpu::{CpuState, IRQ_VECTOR, Mos6502, NMI_VECTOR, RESET_CYCLES, RESET_VECTOR, Step};
pub use flags::Status;
pub use opcodes::{AddressingMode, Mnemonic, OPCODES, Opcode, decode};
pub use registers::{Registers, STACK_BASE};
pub use trace::TraceSnapshot;
