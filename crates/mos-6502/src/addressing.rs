//! 6502 addressing modes.
//!
//! Every instruction resolves its operand address before it executes. The
//! resolver consumes the operand bytes after the opcode, leaves the result
//! in `effective_address` and returns the extra cycle a page crossing
//! costs, if any.
//!
//! - Implied / Accumulator: no operand
//! - Immediate: #$nn (the operand byte's own address)
//! - Zero Page: $nn
//! - Zero Page,X / Zero Page,Y: wraps within page zero
//! - Absolute: $nnnn
//! - Absolute,X / Absolute,Y: may cross a page
//! - Indirect: ($nnnn) (JMP only, buggy page boundary behavior)
//! - Indexed Indirect: ($nn,X)
//! - Indirect Indexed: ($nn),Y
//! - Relative: sign-extended branch offset

use emu_core::Bus;

use crate::Mos6502;
use crate::opcodes::{AddressingMode, Opcode};

/// True when `base` and `addr` fall in different 256-byte pages.
fn page_crossed(base: u16, addr: u16) -> bool {
    (base & 0xFF00) != (addr & 0xFF00)
}

impl<B: Bus> Mos6502<B> {
    /// Fetch the next byte at PC and increment PC.
    pub(crate) fn fetch(&mut self) -> u8 {
        let value = self.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.record_fetched(value);
        value
    }

    /// Fetch a 16-bit word (little-endian) at PC.
    pub(crate) fn fetch_word(&mut self) -> u16 {
        let low = self.fetch();
        let high = self.fetch();
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word from memory (little-endian).
    pub(crate) fn read_word(&mut self, addr: u16) -> u16 {
        let low = self.read(addr);
        let high = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word with the 6502 page boundary bug (indirect JMP).
    /// If addr is $xxFF, the high byte comes from $xx00.
    pub(crate) fn read_word_page_bug(&mut self, addr: u16) -> u16 {
        let low = self.read(addr);
        let high_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let high = self.read(high_addr);
        u16::from_le_bytes([low, high])
    }

    /// Read a pointer from zero page; the high byte wraps to $00.
    fn read_zero_page_word(&mut self, ptr: u8) -> u16 {
        let low = self.read(u16::from(ptr));
        let high = self.read(u16::from(ptr.wrapping_add(1)));
        u16::from_le_bytes([low, high])
    }

    /// Push a byte onto the stack.
    pub(crate) fn push(&mut self, value: u8) {
        let addr = self.regs.push();
        self.write(addr, value);
    }

    /// Pull a byte from the stack.
    pub(crate) fn pull(&mut self) -> u8 {
        let addr = self.regs.pop();
        self.read(addr)
    }

    /// Push a 16-bit word onto the stack (high byte first).
    pub(crate) fn push_word(&mut self, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.push(high);
        self.push(low);
    }

    /// Pull a 16-bit word from the stack (low byte first).
    pub(crate) fn pull_word(&mut self) -> u16 {
        let low = self.pull();
        let high = self.pull();
        u16::from_le_bytes([low, high])
    }

    // =========================================================================
    // Resolver
    // =========================================================================

    /// Resolve the operand address for `op`. Returns the page-crossing
    /// penalty, which only read-class mnemonics pay.
    pub(crate) fn resolve(&mut self, op: Opcode) -> u8 {
        let penalty = op.mnemonic.has_page_penalty();
        let crossed = match op.mode {
            AddressingMode::Implied | AddressingMode::Accumulator => {
                self.effective_address = 0;
                false
            }
            AddressingMode::Immediate => self.addr_immediate(),
            AddressingMode::ZeroPage => self.addr_zero_page(),
            AddressingMode::ZeroPageX => self.addr_zero_page_indexed(self.regs.x),
            AddressingMode::ZeroPageY => self.addr_zero_page_indexed(self.regs.y),
            AddressingMode::Absolute => self.addr_absolute(),
            AddressingMode::AbsoluteX => self.addr_absolute_indexed(self.regs.x),
            AddressingMode::AbsoluteY => self.addr_absolute_indexed(self.regs.y),
            AddressingMode::Indirect => self.addr_indirect(),
            AddressingMode::IndexedIndirect => self.addr_indexed_indirect(),
            AddressingMode::IndirectIndexed => self.addr_indirect_indexed(),
            AddressingMode::Relative => self.addr_relative(),
        };
        u8::from(crossed && penalty)
    }

    /// Immediate: #$nn
    fn addr_immediate(&mut self) -> bool {
        self.effective_address = self.regs.pc;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        false
    }

    /// Zero Page: $nn
    fn addr_zero_page(&mut self) -> bool {
        self.effective_address = u16::from(self.fetch());
        false
    }

    /// Zero Page,X / Zero Page,Y: wraps within zero page.
    fn addr_zero_page_indexed(&mut self, index: u8) -> bool {
        let base = self.fetch();
        self.effective_address = u16::from(base.wrapping_add(index));
        false
    }

    /// Absolute: $nnnn
    fn addr_absolute(&mut self) -> bool {
        self.effective_address = self.fetch_word();
        false
    }

    /// Absolute,X / Absolute,Y
    fn addr_absolute_indexed(&mut self, index: u8) -> bool {
        let base = self.fetch_word();
        let addr = base.wrapping_add(u16::from(index));
        self.effective_address = addr;
        page_crossed(base, addr)
    }

    /// Indirect: ($nnnn)
    fn addr_indirect(&mut self) -> bool {
        let ptr = self.fetch_word();
        self.effective_address = self.read_word_page_bug(ptr);
        false
    }

    /// Indexed Indirect: ($nn,X)
    /// The pointer is at zero page address (operand + X), wrapping within ZP.
    fn addr_indexed_indirect(&mut self) -> bool {
        let ptr = self.fetch().wrapping_add(self.regs.x);
        self.effective_address = self.read_zero_page_word(ptr);
        false
    }

    /// Indirect Indexed: ($nn),Y
    fn addr_indirect_indexed(&mut self) -> bool {
        let ptr = self.fetch();
        let base = self.read_zero_page_word(ptr);
        let addr = base.wrapping_add(u16::from(self.regs.y));
        self.effective_address = addr;
        page_crossed(base, addr)
    }

    /// Relative: the offset, sign-extended. Branches add it to PC.
    fn addr_relative(&mut self) -> bool {
        let offset = self.fetch();
        self.effective_address = u16::from(offset);
        if offset & 0x80 != 0 {
            self.effective_address |= 0xFF00;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use emu_core::SimpleBus;

    use crate::opcodes::decode;
    use crate::{Mos6502, RESET_VECTOR};

    fn cpu_at(program: &[u8]) -> Mos6502<SimpleBus> {
        let mut bus = SimpleBus::new();
        bus.load(0x0200, program);
        bus.poke_word(RESET_VECTOR, 0x0200);
        Mos6502::new(bus)
    }

    /// Fetch and resolve the instruction at PC without executing it.
    fn resolve(cpu: &mut Mos6502<SimpleBus>) -> u8 {
        let opcode = cpu.fetch();
        cpu.resolve(decode(opcode))
    }

    #[test]
    fn immediate_points_at_operand() {
        let mut cpu = cpu_at(&[0xA9, 0x42]);
        assert_eq!(resolve(&mut cpu), 0);
        assert_eq!(cpu.effective_address, 0x0201);
        assert_eq!(cpu.pc(), 0x0202);
    }

    #[test]
    fn zero_page_indexed_wraps() {
        // LDA $F0,X with X=$20
        let mut cpu = cpu_at(&[0xB5, 0xF0]);
        cpu.regs.x = 0x20;
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0x0010);

        // LDX $FF,Y with Y=$01
        let mut cpu = cpu_at(&[0xB6, 0xFF]);
        cpu.regs.y = 0x01;
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0x0000);
    }

    #[test]
    fn absolute_indexed_page_penalty_for_reads_only() {
        // LDA $12FF,X with X=1 crosses into $1300
        let mut cpu = cpu_at(&[0xBD, 0xFF, 0x12]);
        cpu.regs.x = 1;
        assert_eq!(resolve(&mut cpu), 1);
        assert_eq!(cpu.effective_address, 0x1300);

        // STA $12FF,X pays nothing extra
        let mut cpu = cpu_at(&[0x9D, 0xFF, 0x12]);
        cpu.regs.x = 1;
        assert_eq!(resolve(&mut cpu), 0);
        assert_eq!(cpu.effective_address, 0x1300);

        // LDA $1200,Y without crossing
        let mut cpu = cpu_at(&[0xB9, 0x00, 0x12]);
        cpu.regs.y = 0x10;
        assert_eq!(resolve(&mut cpu), 0);
        assert_eq!(cpu.effective_address, 0x1210);
    }

    #[test]
    fn indirect_jmp_page_bug() {
        // JMP ($30FF): low from $30FF, high from $3000
        let mut cpu = cpu_at(&[0x6C, 0xFF, 0x30]);
        cpu.bus_mut().poke(0x30FF, 0x01);
        cpu.bus_mut().poke(0x3000, 0x02);
        cpu.bus_mut().poke(0x3100, 0x99);
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0x0201);
    }

    #[test]
    fn indexed_indirect_wraps_pointer() {
        // LDA ($FE,X) with X=1: pointer at $FF/$00
        let mut cpu = cpu_at(&[0xA1, 0xFE]);
        cpu.regs.x = 1;
        cpu.bus_mut().poke(0x00FF, 0x34);
        cpu.bus_mut().poke(0x0000, 0x12);
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0x1234);
    }

    #[test]
    fn indirect_indexed_adds_y_and_penalty() {
        // LDA ($40),Y with ($40)=$20F0, Y=$20
        let mut cpu = cpu_at(&[0xB1, 0x40]);
        cpu.regs.y = 0x20;
        cpu.bus_mut().poke_word(0x0040, 0x20F0);
        assert_eq!(resolve(&mut cpu), 1);
        assert_eq!(cpu.effective_address, 0x2110);
    }

    #[test]
    fn relative_sign_extends() {
        let mut cpu = cpu_at(&[0xD0, 0xF4]);
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0xFFF4);

        let mut cpu = cpu_at(&[0xD0, 0x10]);
        resolve(&mut cpu);
        assert_eq!(cpu.effective_address, 0x0010);
    }

    #[test]
    fn stack_words_are_high_byte_first() {
        let mut cpu = cpu_at(&[]);
        cpu.push_word(0xABCD);
        assert_eq!(cpu.bus().peek(0x01FF), 0xAB);
        assert_eq!(cpu.bus().peek(0x01FE), 0xCD);
        assert_eq!(cpu.pull_word(), 0xABCD);
        assert_eq!(cpu.regs.s, 0xFF);
    }
}
