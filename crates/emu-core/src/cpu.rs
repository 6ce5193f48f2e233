//! CPU core trait.

/// A CPU core.
///
/// The core owns its bus and advances exactly one clock cycle per `step()`.
/// A whole instruction executes on the cycle it is fetched; the remaining
/// cycles of that instruction are counted down by the following steps.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// What a single `step()` reports back to the caller.
    type Step;

    /// Advance the CPU by one clock cycle.
    fn step(&mut self) -> Self::Step;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Take a maskable interrupt. Returns true if accepted.
    fn irq(&mut self) -> bool;

    /// Take a non-maskable interrupt.
    fn nmi(&mut self);

    /// Run the reset sequence.
    fn reset(&mut self);
}
