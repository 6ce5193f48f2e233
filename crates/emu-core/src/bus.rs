//! Memory bus interface.

use std::fmt;

/// Size of the flat 16-bit address space.
pub const ADDRESS_SPACE: usize = 0x1_0000;

/// Memory bus interface.
///
/// The CPU reaches memory only through this trait. Reads are expected to be
/// free of side effects that call back into the CPU.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&mut self, address: u16) -> u8 {
        (**self).read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value);
    }
}

/// Flat 64 KiB RAM with no I/O mapping.
#[derive(Clone)]
pub struct SimpleBus {
    ram: Box<[u8; ADDRESS_SPACE]>,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimpleBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleBus")
            .field("len", &ADDRESS_SPACE)
            .finish_non_exhaustive()
    }
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; ADDRESS_SPACE]),
        }
    }

    /// Copy `data` into memory starting at `address`.
    ///
    /// Bytes past $FFFF wrap around to $0000, the same way the CPU's own
    /// address arithmetic does.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read without going through the [`Bus`] trait.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    /// Write without going through the [`Bus`] trait.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    /// Little-endian word at `address`, high byte from `address + 1`.
    #[must_use]
    pub fn peek_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }

    /// Store a little-endian word, e.g. a reset vector.
    pub fn poke_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.poke(address, lo);
        self.poke(address.wrapping_add(1), hi);
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

/// Adapts a pair of closures to the [`Bus`] trait.
///
/// Useful when the memory lives somewhere the caller already owns, e.g. a
/// shared `Rc<RefCell<..>>` inspected between steps.
pub struct FnBus<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnBus<R, W>
where
    R: FnMut(u16) -> u8,
    W: FnMut(u16, u8),
{
    #[must_use]
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> Bus for FnBus<R, W>
where
    R: FnMut(u16) -> u8,
    W: FnMut(u16, u8),
{
    fn read(&mut self, address: u16) -> u8 {
        (self.read)(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        (self.write)(address, value);
    }
}

impl<R, W> fmt::Debug for FnBus<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnBus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn load_wraps_past_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFE, &[0x11, 0x22, 0x33]);
        assert_eq!(bus.peek(0xFFFE), 0x11);
        assert_eq!(bus.peek(0xFFFF), 0x22);
        assert_eq!(bus.peek(0x0000), 0x33);
    }

    #[test]
    fn words_are_little_endian() {
        let mut bus = SimpleBus::new();
        bus.poke_word(0xFFFC, 0x0400);
        assert_eq!(bus.peek(0xFFFC), 0x00);
        assert_eq!(bus.peek(0xFFFD), 0x04);
        assert_eq!(bus.peek_word(0xFFFC), 0x0400);
    }

    #[test]
    fn fn_bus_forwards_to_closures() {
        let ram = Rc::new(RefCell::new(vec![0u8; ADDRESS_SPACE]));
        let reader = Rc::clone(&ram);
        let writer = Rc::clone(&ram);
        let mut bus = FnBus::new(
            move |addr| reader.borrow()[usize::from(addr)],
            move |addr, value| writer.borrow_mut()[usize::from(addr)] = value,
        );

        bus.write(0x1234, 0xAB);
        assert_eq!(bus.read(0x1234), 0xAB);
        assert_eq!(ram.borrow()[0x1234], 0xAB);
    }

    #[test]
    fn mutable_reference_is_a_bus() {
        fn store<B: Bus>(mut bus: B) {
            bus.write(0x0010, 0x55);
        }

        let mut bus = SimpleBus::new();
        store(&mut bus);
        assert_eq!(bus.peek(0x0010), 0x55);
    }
}
