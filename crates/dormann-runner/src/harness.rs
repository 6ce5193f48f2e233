//! Run loop: steps the CPU one cycle at a time until the image traps,
//! reaches its success address or runs out of budget.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use emu_core::Bus;
use mos_6502::{Mnemonic, Mos6502};

/// How often the wall clock is checked and progress is logged.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Stopping conditions.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Address whose execution means the image passed.
    pub success: u16,
    pub max_instructions: u64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instruction at the success address was reached.
    Success,
    /// An instruction jumped or branched to itself somewhere else.
    Trapped { pc: u16 },
    InstructionLimit,
    Timeout,
}

/// Counters reported once the run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    pub instructions: u64,
    pub cycles: u64,
    pub elapsed: Duration,
}

impl Report {
    /// Effective emulation speed in MHz.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mhz(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.cycles as f64 / self.elapsed.as_secs_f64() / 1_000_000.0
    }
}

/// Run `cpu` until an [`Outcome`] is reached, writing one trace line per
/// instruction to `trace` if given. Switches tracing on.
pub fn run<B: Bus>(
    cpu: &mut Mos6502<B>,
    limits: &Limits,
    mut trace: Option<&mut dyn Write>,
) -> io::Result<Report> {
    let start = Instant::now();
    let start_cycles = cpu.total_cycles();
    let mut instructions: u64 = 0;
    cpu.set_trace(true);

    let outcome = loop {
        let step = cpu.step();

        let Some(snapshot) = step.trace else {
            continue;
        };
        instructions += 1;

        if let Some(out) = trace.as_mut() {
            writeln!(out, "{snapshot}")?;
            if snapshot.mnemonic == Mnemonic::Brk {
                writeln!(out, "* BRK at {:04X} => {:04X}", snapshot.address, cpu.pc())?;
            }
        }

        if snapshot.address == limits.success {
            break Outcome::Success;
        }
        if cpu.pc() == snapshot.address {
            break Outcome::Trapped {
                pc: snapshot.address,
            };
        }
        if instructions >= limits.max_instructions {
            break Outcome::InstructionLimit;
        }
        if instructions % PROGRESS_INTERVAL == 0 {
            log::debug!(
                "{} million instructions, PC=${:04X}",
                instructions / PROGRESS_INTERVAL,
                cpu.pc()
            );
            if start.elapsed() >= limits.timeout {
                break Outcome::Timeout;
            }
        }
    };

    // Let the final instruction's cycles run out
    while !cpu.is_instruction_complete() {
        cpu.step();
    }

    Ok(Report {
        outcome,
        instructions,
        cycles: cpu.total_cycles() - start_cycles,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;
    use mos_6502::RESET_VECTOR;

    fn cpu_with(program: &[u8]) -> Mos6502<SimpleBus> {
        let mut bus = SimpleBus::new();
        bus.load(0x0400, program);
        bus.poke_word(RESET_VECTOR, 0x0400);
        bus.poke_word(0xFFFE, 0x0500);
        Mos6502::new(bus)
    }

    fn limits(success: u16) -> Limits {
        Limits {
            success,
            max_instructions: 1_000,
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn reaches_success_address() {
        // LDX #$03; DEX; BNE -3; JMP $0407 (self)
        let mut cpu = cpu_with(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD, 0x4C, 0x05, 0x04]);
        let mut out = Vec::new();
        let report = run(&mut cpu, &limits(0x0405), Some(&mut out)).expect("in-memory trace");

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.instructions, 1 + 3 + 3 + 1);
        // 2 + 3*2 + 2*3 + 2 + 3
        assert_eq!(report.cycles, 19);

        let text = String::from_utf8(out).expect("ascii trace");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0],
            "0400 A2 03     LDX #$03      |00 03 00 FF|000100|2"
        );
        assert_eq!(
            lines[2],
            "0403 D0 FD     BNE $0402     |00 02 00 FF|000100|3"
        );
        assert!(lines[7].starts_with("0405 4C 05 04  JMP $0405"));
    }

    #[test]
    fn detects_trap_elsewhere() {
        // BNE to itself with Z clear
        let mut cpu = cpu_with(&[0xD0, 0xFE]);
        let report = run(&mut cpu, &limits(0x3469), None).expect("no trace");
        assert_eq!(report.outcome, Outcome::Trapped { pc: 0x0400 });
        assert_eq!(report.instructions, 1);
    }

    #[test]
    fn stops_at_instruction_limit() {
        // NOP; JMP $0400
        let mut cpu = cpu_with(&[0xEA, 0x4C, 0x00, 0x04]);
        let mut limits = limits(0x3469);
        limits.max_instructions = 10;
        let report = run(&mut cpu, &limits, None).expect("no trace");
        assert_eq!(report.outcome, Outcome::InstructionLimit);
        assert_eq!(report.instructions, 10);
    }

    #[test]
    fn annotates_brk() {
        let mut cpu = cpu_with(&[0x00, 0xEA]);
        cpu.bus_mut().load(0x0500, &[0x4C, 0x00, 0x05]);
        let mut out = Vec::new();
        let report = run(&mut cpu, &limits(0x3469), Some(&mut out)).expect("in-memory trace");
        assert_eq!(report.outcome, Outcome::Trapped { pc: 0x0500 });

        let text = String::from_utf8(out).expect("ascii trace");
        assert!(text.lines().any(|line| line == "* BRK at 0400 => 0500"));
    }
}
