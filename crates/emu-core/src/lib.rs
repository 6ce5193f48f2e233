//! Core traits and types for cycle-stepped emulation.
//!
//! A CPU core owns the bus it was constructed with and reaches memory only
//! through the [`Bus`] trait. Everything else (ROM loading, tracing output,
//! timeouts) lives with the caller.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, FnBus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
