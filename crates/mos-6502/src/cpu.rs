//! 6502 CPU state machine.
//!
//! Each `step()` is one clock cycle. When no cycles are pending the whole
//! next instruction runs: fetch, decode, resolve the operand address,
//! execute, then load the pending counter with the base cycles plus any
//! page-crossing or branch penalty. Later steps only count it down.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::Registers;
use crate::flags::{self, C, D, I, N, U, V, Z};
use crate::opcodes::{Opcode, decode};
use crate::trace::TraceSnapshot;

/// NMI vector ($FFFA-$FFFB).
pub const NMI_VECTOR: u16 = 0xFFFA;

/// Reset vector ($FFFC-$FFFD).
pub const RESET_VECTOR: u16 = 0xFFFC;

/// IRQ and BRK vector ($FFFE-$FFFF).
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles charged by an explicit `reset()`.
pub const RESET_CYCLES: u8 = 8;

/// Cycles charged by IRQ/NMI entry.
const INTERRUPT_CYCLES: u8 = 7;

/// Result of one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Cycles left in the current instruction. Zero marks an instruction
    /// boundary: the next step fetches.
    pub cycles_remaining: u8,
    /// Present only on the cycle that decoded an instruction, and only
    /// while tracing is enabled.
    pub trace: Option<TraceSnapshot>,
}

/// Read-only view of the architectural state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    /// The most recently decoded instruction.
    pub instruction: Opcode,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
}

/// The MOS 6502 CPU.
///
/// Owns the bus it reads and writes through. Memory is only ever touched
/// while an instruction or interrupt entry is executing.
pub struct Mos6502<B> {
    /// CPU registers.
    pub regs: Registers,

    bus: B,

    /// Set by the addressing resolver, consumed by the instruction.
    pub(crate) effective_address: u16,

    /// Current instruction, kept for inspection only.
    pub(crate) instruction: Opcode,

    /// Remaining cycles of the in-flight instruction.
    pending_cycles: u8,

    /// Instruction bytes read so far, opcode first.
    fetched: [u8; 3],
    fetched_len: u8,

    /// Whether `step()` produces trace snapshots.
    trace: bool,

    /// Cycles stepped since construction.
    total_cycles: u64,
}

impl<B: Bus> Mos6502<B> {
    /// Create a CPU on `bus` and run the reset sequence.
    ///
    /// Unlike [`reset`](Self::reset) this does not charge the startup
    /// cycles: the first `step()` executes the instruction at the reset
    /// vector.
    #[must_use]
    pub fn new(bus: B) -> Self {
        let mut cpu = Self {
            regs: Registers::new(),
            bus,
            effective_address: 0,
            instruction: Opcode::ILLEGAL,
            pending_cycles: 0,
            fetched: [0; 3],
            fetched_len: 0,
            trace: false,
            total_cycles: 0,
        };
        cpu.power_on();
        cpu
    }

    /// Enable or disable trace snapshots.
    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Enable or disable trace snapshots in place.
    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    /// Advance one clock cycle.
    pub fn step(&mut self) -> Step {
        self.total_cycles += 1;

        let trace = if self.pending_cycles == 0 {
            self.execute_next()
        } else {
            None
        };

        self.pending_cycles = self.pending_cycles.saturating_sub(1);
        Step {
            cycles_remaining: self.pending_cycles,
            trace,
        }
    }

    /// Fetch, decode and run one instruction.
    fn execute_next(&mut self) -> Option<TraceSnapshot> {
        let address = self.regs.pc;
        self.fetched = [0; 3];
        self.fetched_len = 0;
        let opcode = self.fetch();
        let op = decode(opcode);

        if op.is_illegal() {
            log::trace!("illegal opcode ${opcode:02X} at ${address:04X}");
        }

        self.instruction = op;
        let page_penalty = self.resolve(op);
        let branch_penalty = self.execute(op.mnemonic, op.mode);
        self.regs.p.set(U);

        self.pending_cycles = op.cycles + page_penalty + branch_penalty;

        self.trace.then(|| {
            TraceSnapshot::capture(address, self.fetched, op, self.regs, self.pending_cycles)
        })
    }

    /// Keep an instruction byte for the trace. Bytes past the third are
    /// never instruction bytes and are dropped.
    pub(crate) fn record_fetched(&mut self, value: u8) {
        if let Some(slot) = self.fetched.get_mut(usize::from(self.fetched_len)) {
            *slot = value;
            self.fetched_len += 1;
        }
    }

    /// Reset sequence without the startup cost.
    fn power_on(&mut self) {
        self.regs = Registers::new();
        self.regs.pc = self.read_word(RESET_VECTOR);
        self.effective_address = 0;
        self.instruction = Opcode::ILLEGAL;
        self.pending_cycles = 0;
        log::debug!("reset: PC=${:04X}", self.regs.pc);
    }

    /// Run the reset sequence and charge its 8 startup cycles.
    ///
    /// PC is loaded from $FFFC/$FFFD, S becomes $FF, A/X/Y are cleared and
    /// only I and U remain set.
    pub fn reset(&mut self) {
        self.power_on();
        self.pending_cycles = RESET_CYCLES;
    }

    /// Take a maskable interrupt. Returns false, doing nothing, while I is
    /// set.
    pub fn irq(&mut self) -> bool {
        if self.regs.p.is_set(I) {
            log::debug!("IRQ masked at PC=${:04X}", self.regs.pc);
            return false;
        }
        log::debug!("IRQ at PC=${:04X}", self.regs.pc);
        self.interrupt(IRQ_VECTOR);
        true
    }

    /// Take a non-maskable interrupt.
    pub fn nmi(&mut self) {
        log::debug!("NMI at PC=${:04X}", self.regs.pc);
        self.interrupt(NMI_VECTOR);
    }

    /// IRQ/NMI entry: push PC and P (B clear), set I, jump through `vector`.
    fn interrupt(&mut self, vector: u16) {
        self.push_word(self.regs.pc);
        self.push(self.regs.p.to_byte_irq());
        self.regs.p.set(I);
        self.regs.pc = self.read_word(vector);
        self.pending_cycles = self.pending_cycles.saturating_add(INTERRUPT_CYCLES);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[must_use]
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Snapshot of the architectural state and the last decoded instruction.
    #[must_use]
    pub fn state(&self) -> CpuState {
        CpuState {
            instruction: self.instruction,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            pc: self.regs.pc,
            sp: self.regs.s,
            status: self.regs.p.0,
        }
    }

    #[must_use]
    pub fn pending_cycles(&self) -> u8 {
        self.pending_cycles
    }

    /// True between instructions: the next step fetches.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.pending_cycles == 0
    }

    /// Cycles stepped since construction, reset and interrupt costs included.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Bus access for the resolver and instruction implementations.
    pub(crate) fn read(&mut self, address: u16) -> u8 {
        self.bus.read(address)
    }

    pub(crate) fn write(&mut self, address: u16, value: u8) {
        self.bus.write(address, value);
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl<B: Bus> Cpu for Mos6502<B> {
    type Registers = Registers;
    type Step = Step;

    fn step(&mut self) -> Step {
        Mos6502::step(self)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn irq(&mut self) -> bool {
        Mos6502::irq(self)
    }

    fn nmi(&mut self) {
        Mos6502::nmi(self);
    }

    fn reset(&mut self) {
        Mos6502::reset(self);
    }
}

impl<B: Bus> Observable for Mos6502<B> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" | "c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" | "z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" | "i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" | "d" => Some(self.regs.p.is_set(D).into()),
            "flags.b" | "b" => Some(self.regs.p.is_set(flags::B).into()),
            "flags.v" | "v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" | "n" => Some(self.regs.p.is_set(N).into()),
            "instruction" => Some(self.instruction.mnemonic.name().into()),
            "cycles.pending" => Some(self.pending_cycles.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.b",
            "flags.v",
            "flags.n",
            "instruction",
            "cycles.pending",
        ]
    }
}
