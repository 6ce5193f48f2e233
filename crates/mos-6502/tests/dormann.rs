//! Klaus Dormann's 6502 functional test harness.
//!
//! The functional test exercises all documented 6502 opcodes.
//! Test binary should be assembled with load address $0000.
//!
//! Test structure:
//! - $0400: Test entry point
//! - Test completes when PC gets stuck (trap - branches to itself)
//! - Success: PC reaches $3469
//! - Failure: PC reaches any other trap address

use emu_core::SimpleBus;
use mos_6502::{Mos6502, RESET_VECTOR};

/// Outcome of running a test image until it traps.
struct Trap {
    pc: u16,
    instructions: u64,
    cycles: u64,
}

/// Load `binary` at $0000, start at `entry` and run until an instruction
/// jumps or branches to itself.
fn run_until_trap(binary: &[u8], entry: u16, limit: u64) -> (Option<Trap>, Mos6502<SimpleBus>) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, binary);
    bus.poke_word(RESET_VECTOR, entry);

    let mut cpu = Mos6502::new(bus);
    let mut cycles: u64 = 0;
    let mut instructions: u64 = 0;

    loop {
        let start_pc = cpu.pc();

        // Run one instruction
        loop {
            cycles += 1;
            if cpu.step().cycles_remaining == 0 {
                break;
            }
        }
        instructions += 1;

        if cpu.pc() == start_pc {
            let trap = Trap {
                pc: start_pc,
                instructions,
                cycles,
            };
            return (Some(trap), cpu);
        }

        // Progress every 1M instructions
        if instructions % 1_000_000 == 0 {
            eprint!("\r[{instructions} instructions, PC=${:04X}]", cpu.pc());
        }

        if instructions > limit {
            eprintln!("\nTest exceeded {limit} instructions limit");
            return (None, cpu);
        }
    }
}

#[test]
#[ignore = "requires tests/data/6502_functional_test.bin"]
fn dormann_functional() {
    let binary = std::fs::read("tests/data/6502_functional_test.bin").expect(
        "tests/data/6502_functional_test.bin not found - download from Klaus Dormann's repository",
    );

    let (trap, _) = run_until_trap(&binary, 0x0400, 100_000_000);
    let trap = trap.expect("functional test never trapped");
    eprintln!(
        "\nTrapped at ${:04X} after {} instructions ({} cycles)",
        trap.pc, trap.instructions, trap.cycles
    );
    assert_eq!(trap.pc, 0x3469, "Klaus Dormann 6502 functional test failed");
}

#[test]
#[ignore = "requires tests/data/6502_decimal_test.bin"]
fn dormann_decimal() {
    let binary = std::fs::read("tests/data/6502_decimal_test.bin")
        .expect("tests/data/6502_decimal_test.bin not found");

    // Zero-page layout from test:
    // $00=N1, $01=N2, $02=HA, $03=HNVZC, $04=DA, $05=DNVZC
    // $06=AR, $07=NF, $08=VF, $09=ZF, $0A=CF, $0B=ERROR
    let (trap, cpu) = run_until_trap(&binary, 0x0200, 50_000_000);
    let trap = trap.expect("decimal test never trapped");

    let bus = cpu.bus();
    let error = bus.peek(0x000B);
    if error != 0 {
        eprintln!("Test state at failure (PC=${:04X}):", trap.pc);
        eprintln!(
            "  N1=${:02X}, N2=${:02X}, Y(carry_in)={}",
            bus.peek(0x00),
            bus.peek(0x01),
            cpu.regs.y
        );
        eprintln!(
            "  Actual: A=${:02X}, Flags=${:02X}",
            bus.peek(0x04),
            bus.peek(0x05)
        );
        eprintln!(
            "  Predicted: A=${:02X}, C_flag=${:02X}",
            bus.peek(0x06),
            bus.peek(0x0A)
        );
    }
    assert_eq!(error, 0, "Klaus Dormann decimal test failed");
}
