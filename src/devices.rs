// Device capabilities the kernel core drives
use crate::console::Console;

/// A timer that raises a periodic interrupt.
pub trait PeriodicTimer {
    /// Program periodic mode at `hz`, enable the timer and its interrupt.
    fn start_periodic(&mut self, hz: u32);

    /// Clear the timer's interrupt-pending flag.
    fn clear_interrupt(&mut self);
}

/// The interrupt controller in front of the processor.
pub trait InterruptController {
    /// Unmask `source` and enable forwarding to the processor.
    fn enable(&mut self, source: u32);

    /// Signal that handling of `source` is complete.
    fn end_of_interrupt(&mut self, source: u32);
}

/// Byte access to the flat address space shared by all processes.
pub trait StackMemory {
    fn read_byte(&self, addr: u64) -> u8;

    /// Copy `len` bytes from `src` to `dst`. Regions never overlap.
    fn copy(&mut self, src: u64, dst: u64, len: u64);
}

/// The set of devices a kernel instance runs on.
pub trait Platform {
    type Console: Console;
    type Timer: PeriodicTimer;
    type Irq: InterruptController;
    type Memory: StackMemory;
}

/// Owned device instances for a [`Platform`].
pub struct Devices<P: Platform> {
    pub console: P::Console,
    pub timer: P::Timer,
    pub irq: P::Irq,
    pub memory: P::Memory,
}
