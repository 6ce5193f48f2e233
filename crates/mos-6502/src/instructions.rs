//! Instruction semantics.
//!
//! Each mnemonic operates on the effective address left by the resolver.
//! `execute` returns the extra cycles the instruction itself adds, which
//! only taken branches do.

use emu_core::Bus;

use crate::cpu::IRQ_VECTOR;
use crate::flags::{C, D, I, N, V, Z};
use crate::opcodes::{AddressingMode, Mnemonic};
use crate::{Mos6502, Status};

impl<B: Bus> Mos6502<B> {
    /// Run `mnemonic` against the resolved effective address.
    pub(crate) fn execute(&mut self, mnemonic: Mnemonic, mode: AddressingMode) -> u8 {
        match mnemonic {
            // Loads and stores
            Mnemonic::Lda => {
                self.regs.a = self.operand();
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Ldx => {
                self.regs.x = self.operand();
                self.regs.p.update_nz(self.regs.x);
            }
            Mnemonic::Ldy => {
                self.regs.y = self.operand();
                self.regs.p.update_nz(self.regs.y);
            }
            Mnemonic::Sta => self.write(self.effective_address, self.regs.a),
            Mnemonic::Stx => self.write(self.effective_address, self.regs.x),
            Mnemonic::Sty => self.write(self.effective_address, self.regs.y),

            // Arithmetic and logic
            Mnemonic::Adc => {
                let value = self.operand();
                self.do_adc(value);
            }
            Mnemonic::Sbc => {
                let value = self.operand();
                self.do_sbc(value);
            }
            Mnemonic::And => {
                let value = self.operand();
                self.regs.a &= value;
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Ora => {
                let value = self.operand();
                self.regs.a |= value;
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Eor => {
                let value = self.operand();
                self.regs.a ^= value;
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Cmp => {
                let value = self.operand();
                self.compare(self.regs.a, value);
            }
            Mnemonic::Cpx => {
                let value = self.operand();
                self.compare(self.regs.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.operand();
                self.compare(self.regs.y, value);
            }
            Mnemonic::Bit => {
                let value = self.operand();
                self.do_bit(value);
            }

            // Read-modify-write
            Mnemonic::Asl => self.modify(mode, Self::do_asl),
            Mnemonic::Lsr => self.modify(mode, Self::do_lsr),
            Mnemonic::Rol => self.modify(mode, Self::do_rol),
            Mnemonic::Ror => self.modify(mode, Self::do_ror),
            Mnemonic::Inc => self.modify(mode, |cpu, value| {
                let result = value.wrapping_add(1);
                cpu.regs.p.update_nz(result);
                result
            }),
            Mnemonic::Dec => self.modify(mode, |cpu, value| {
                let result = value.wrapping_sub(1);
                cpu.regs.p.update_nz(result);
                result
            }),

            // Register increments and transfers
            Mnemonic::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Mnemonic::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Mnemonic::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Mnemonic::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Mnemonic::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Mnemonic::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Mnemonic::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            // TXS does not touch flags
            Mnemonic::Txs => self.regs.s = self.regs.x,

            // Branches
            Mnemonic::Bcc => return self.branch(!self.regs.p.is_set(C)),
            Mnemonic::Bcs => return self.branch(self.regs.p.is_set(C)),
            Mnemonic::Bne => return self.branch(!self.regs.p.is_set(Z)),
            Mnemonic::Beq => return self.branch(self.regs.p.is_set(Z)),
            Mnemonic::Bpl => return self.branch(!self.regs.p.is_set(N)),
            Mnemonic::Bmi => return self.branch(self.regs.p.is_set(N)),
            Mnemonic::Bvc => return self.branch(!self.regs.p.is_set(V)),
            Mnemonic::Bvs => return self.branch(self.regs.p.is_set(V)),

            // Jumps and subroutines
            Mnemonic::Jmp => self.regs.pc = self.effective_address,
            Mnemonic::Jsr => {
                self.push_word(self.regs.pc.wrapping_sub(1));
                self.regs.pc = self.effective_address;
            }
            Mnemonic::Rts => self.regs.pc = self.pull_word().wrapping_add(1),
            Mnemonic::Rti => {
                let p = self.pull();
                self.regs.p = Status::from_byte(p);
                self.regs.pc = self.pull_word();
            }
            Mnemonic::Brk => self.do_brk(),

            // Stack
            Mnemonic::Pha => self.push(self.regs.a),
            Mnemonic::Php => self.push(self.regs.p.to_byte_brk()),
            Mnemonic::Pla => {
                self.regs.a = self.pull();
                self.regs.p.update_nz(self.regs.a);
            }
            Mnemonic::Plp => {
                let p = self.pull();
                self.regs.p = Status::from_byte(p);
            }

            // Flags
            Mnemonic::Clc => self.regs.p.clear(C),
            Mnemonic::Sec => self.regs.p.set(C),
            Mnemonic::Cli => self.regs.p.clear(I),
            Mnemonic::Sei => self.regs.p.set(I),
            Mnemonic::Cld => self.regs.p.clear(D),
            Mnemonic::Sed => self.regs.p.set(D),
            Mnemonic::Clv => self.regs.p.clear(V),

            Mnemonic::Nop | Mnemonic::Illegal => {}
        }
        0
    }

    /// Byte at the effective address.
    fn operand(&mut self) -> u8 {
        let value = self.read(self.effective_address);
        if self.instruction.mode == AddressingMode::Immediate {
            self.record_fetched(value);
        }
        value
    }

    /// Apply `op` to A (accumulator/implied forms) or to memory at the
    /// effective address.
    fn modify(&mut self, mode: AddressingMode, op: impl FnOnce(&mut Self, u8) -> u8) {
        if mode.targets_accumulator() {
            let a = self.regs.a;
            self.regs.a = op(self, a);
        } else {
            let addr = self.effective_address;
            let value = self.read(addr);
            let result = op(self, value);
            self.write(addr, result);
        }
    }

    /// Taken branches cost one cycle, two if the target is on another page.
    fn branch(&mut self, taken: bool) -> u8 {
        if !taken {
            return 0;
        }
        let old = self.regs.pc;
        self.regs.pc = old.wrapping_add(self.effective_address);
        if (old & 0xFF00) == (self.regs.pc & 0xFF00) {
            1
        } else {
            2
        }
    }

    /// BRK skips its padding byte, pushes PC and P (with B), then takes
    /// the IRQ vector. B is only set in the pushed copy.
    fn do_brk(&mut self) {
        log::trace!("BRK at ${:04X}", self.regs.pc.wrapping_sub(1));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.push_word(self.regs.pc);
        self.push(self.regs.p.to_byte_brk());
        self.regs.p.set(I);
        self.regs.pc = self.read_word(IRQ_VECTOR);
    }

    // =========================================================================
    // ALU operations
    // =========================================================================

    fn do_adc(&mut self, val: u8) {
        if self.regs.p.is_set(D) {
            self.do_adc_decimal(val);
        } else {
            self.do_adc_binary(val);
        }
    }

    fn do_adc_binary(&mut self, val: u8) {
        let a = self.regs.a;
        let sum = u16::from(a) + u16::from(val) + u16::from(self.regs.p.carry());
        let result = sum as u8;

        self.regs.p.set_if(C, sum > 0xFF);
        self.regs.p.set_if(V, (a ^ result) & (val ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    fn do_adc_decimal(&mut self, val: u8) {
        let a = self.regs.a;
        let carry = self.regs.p.carry();

        let mut lo = (a & 0x0F) + (val & 0x0F) + carry;
        if lo > 9 {
            lo += 6;
        }

        let mut hi = (a >> 4) + (val >> 4) + u8::from(lo > 0x0F);

        // NMOS: Z and V from the binary sum, N from the unadjusted high nibble
        let bin_result = (u16::from(a) + u16::from(val) + u16::from(carry)) as u8;
        self.regs.p.set_if(Z, bin_result == 0);
        self.regs.p.set_if(N, hi & 0x08 != 0);
        self.regs
            .p
            .set_if(V, (a ^ bin_result) & (val ^ bin_result) & 0x80 != 0);

        if hi > 9 {
            hi += 6;
        }

        self.regs.p.set_if(C, hi > 0x0F);
        self.regs.a = (hi << 4) | (lo & 0x0F);
    }

    fn do_sbc(&mut self, val: u8) {
        if self.regs.p.is_set(D) {
            self.do_sbc_decimal(val);
        } else {
            // SBC is ADC with inverted operand
            self.do_adc_binary(!val);
        }
    }

    fn do_sbc_decimal(&mut self, val: u8) {
        let a = self.regs.a;
        let borrow = i16::from(1 - self.regs.p.carry());

        // Flags come from the binary result
        let bin_result = i16::from(a) - i16::from(val) - borrow;
        self.regs.p.set_if(C, bin_result >= 0);
        self.regs.p.set_if(Z, (bin_result as u8) == 0);
        self.regs.p.set_if(N, bin_result & 0x80 != 0);
        self.regs.p.set_if(
            V,
            (i16::from(a) ^ bin_result) & (i16::from(a) ^ i16::from(val)) & 0x80 != 0,
        );

        let mut lo = i16::from(a & 0x0F) - i16::from(val & 0x0F) - borrow;
        let mut hi = i16::from(a >> 4) - i16::from(val >> 4);

        if lo < 0 {
            lo -= 6;
            hi -= 1;
        }
        if hi < 0 {
            hi -= 6;
        }

        self.regs.a = ((hi << 4) as u8) | ((lo & 0x0F) as u8);
    }

    fn compare(&mut self, reg: u8, val: u8) {
        self.regs.p.set_if(C, reg >= val);
        self.regs.p.update_nz(reg.wrapping_sub(val));
    }

    fn do_bit(&mut self, val: u8) {
        self.regs.p.set_if(Z, self.regs.a & val == 0);
        self.regs.p.set_if(N, val & 0x80 != 0);
        self.regs.p.set_if(V, val & 0x40 != 0);
    }

    fn do_asl(&mut self, val: u8) -> u8 {
        self.regs.p.set_if(C, val & 0x80 != 0);
        let result = val << 1;
        self.regs.p.update_nz(result);
        result
    }

    fn do_lsr(&mut self, val: u8) -> u8 {
        self.regs.p.set_if(C, val & 0x01 != 0);
        let result = val >> 1;
        self.regs.p.update_nz(result);
        result
    }

    fn do_rol(&mut self, val: u8) -> u8 {
        let carry_in = self.regs.p.carry();
        self.regs.p.set_if(C, val & 0x80 != 0);
        let result = (val << 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    fn do_ror(&mut self, val: u8) -> u8 {
        let carry_in = self.regs.p.carry() << 7;
        self.regs.p.set_if(C, val & 0x01 != 0);
        let result = (val >> 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }
}

#[cfg(test)]
mod tests {
    use emu_core::SimpleBus;

    use crate::flags::{C, D, N, V, Z};
    use crate::{Mos6502, RESET_VECTOR};

    /// Run `program` from $0200 until `count` instructions have completed.
    fn run(
        program: &[u8],
        count: usize,
        setup: impl FnOnce(&mut Mos6502<SimpleBus>),
    ) -> Mos6502<SimpleBus> {
        let mut bus = SimpleBus::new();
        bus.load(0x0200, program);
        bus.poke_word(RESET_VECTOR, 0x0200);
        let mut cpu = Mos6502::new(bus);
        setup(&mut cpu);
        for _ in 0..count {
            while cpu.step().cycles_remaining != 0 {}
        }
        cpu
    }

    #[test]
    fn adc_binary_overflow() {
        // CLC; LDA #$50; ADC #$50
        let cpu = run(&[0x18, 0xA9, 0x50, 0x69, 0x50], 3, |_| {});
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.p.is_set(V));
        assert!(cpu.regs.p.is_set(N));
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn adc_decimal_carries_between_nibbles() {
        // SED; CLC; LDA #$09; ADC #$01
        let cpu = run(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01], 4, |_| {});
        assert_eq!(cpu.regs.a, 0x10);
        assert!(!cpu.regs.p.is_set(C));

        // SED; CLC; LDA #$99; ADC #$01 wraps to $00 with carry
        let cpu = run(&[0xF8, 0x18, 0xA9, 0x99, 0x69, 0x01], 4, |_| {});
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn sbc_binary_and_decimal() {
        // SEC; LDA #$10; SBC #$01
        let cpu = run(&[0x38, 0xA9, 0x10, 0xE9, 0x01], 3, |_| {});
        assert_eq!(cpu.regs.a, 0x0F);
        assert!(cpu.regs.p.is_set(C));

        // Same in decimal mode
        let cpu = run(&[0xF8, 0x38, 0xA9, 0x10, 0xE9, 0x01], 4, |_| {});
        assert_eq!(cpu.regs.a, 0x09);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(D));

        // SEC; LDA #$00; SBC #$01 borrows
        let cpu = run(&[0x38, 0xA9, 0x00, 0xE9, 0x01], 3, |_| {});
        assert_eq!(cpu.regs.a, 0xFF);
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn bit_copies_operand_bits() {
        // LDA #$01; BIT $10 with $10=$C0
        let cpu = run(&[0xA9, 0x01, 0x24, 0x10], 2, |cpu| {
            cpu.bus_mut().poke(0x10, 0xC0);
        });
        assert!(cpu.regs.p.is_set(Z));
        assert!(cpu.regs.p.is_set(N));
        assert!(cpu.regs.p.is_set(V));
        assert_eq!(cpu.regs.a, 0x01);
    }

    #[test]
    fn shifts_on_accumulator_and_memory() {
        // LDA #$81; ASL A
        let cpu = run(&[0xA9, 0x81, 0x0A], 2, |_| {});
        assert_eq!(cpu.regs.a, 0x02);
        assert!(cpu.regs.p.is_set(C));

        // SEC; ROR $10 with $10=$02
        let cpu = run(&[0x38, 0x66, 0x10], 2, |cpu| cpu.bus_mut().poke(0x10, 0x02));
        assert_eq!(cpu.bus().peek(0x10), 0x81);
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn inc_dec_memory_wrap() {
        // INC $10 ($FF -> $00); DEC $11 ($00 -> $FF)
        let cpu = run(&[0xE6, 0x10, 0xC6, 0x11], 1, |cpu| {
            cpu.bus_mut().poke(0x10, 0xFF);
        });
        assert_eq!(cpu.bus().peek(0x10), 0x00);
        assert!(cpu.regs.p.is_set(Z));

        let cpu = run(&[0xE6, 0x10, 0xC6, 0x11], 2, |cpu| {
            cpu.bus_mut().poke(0x10, 0xFF);
        });
        assert_eq!(cpu.bus().peek(0x11), 0xFF);
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn compare_sets_carry_on_greater_or_equal() {
        // LDX #$40; CPX #$40
        let cpu = run(&[0xA2, 0x40, 0xE0, 0x40], 2, |_| {});
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));

        // LDY #$10; CPY #$20
        let cpu = run(&[0xA0, 0x10, 0xC0, 0x20], 2, |_| {});
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn txs_leaves_flags_alone() {
        // LDX #$00 sets Z; TXS must keep it
        let cpu = run(&[0xA2, 0x00, 0x9A], 2, |_| {});
        assert_eq!(cpu.regs.s, 0x00);
        assert!(cpu.regs.p.is_set(Z));
    }
}
