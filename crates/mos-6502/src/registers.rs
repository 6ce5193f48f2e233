//! 6502 CPU registers.

use crate::Status;
use crate::flags::{I, U};

/// Base address of the hardware stack page ($0100-$01FF).
pub const STACK_BASE: u16 = 0x0100;

/// 6502 CPU register set.
///
/// The 6502 has minimal registers:
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - S: 8-bit stack pointer (stack is at $0100-$01FF)
/// - PC: 16-bit program counter
/// - P: 8-bit processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (points to next free location).
    pub s: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status flags.
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers as left by the reset sequence, minus the PC which comes
    /// from the reset vector.
    ///
    /// A, X, Y are cleared, S starts at $FF and only I and U are set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            pc: 0,
            p: Status(U | I),
        }
    }

    /// Address for the next push; decrements S.
    pub fn push(&mut self) -> u16 {
        let addr = STACK_BASE | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Address for the next pull; increments S first.
    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        STACK_BASE | u16::from(self.s)
    }
}
