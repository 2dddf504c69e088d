// Kernel configuration
use crate::process::Pid;

/// Default process table capacity
pub const MAX_PROCS: usize = 20;

/// Bytes reserved for each slot's private stack
pub const STACK_SIZE: u64 = 0x0000_1000;

/// Interrupt vector the PIT timer is wired to (IRQ0 behind the remapped PIC)
pub const TIMER_SOURCE: u32 = 32;

/// Status register for a fresh process: IF set, reserved bit 1 set
pub const INITIAL_STATUS: u64 = 0x202;

/// Timer frequency in Hertz
pub const TIMER_HZ: u32 = 100;

/// Values supplied by the boot entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootParams {
    /// Entry address of the first user program (the console)
    pub console_entry: u64,
    /// Shared top-of-stack base; slot `i` owns `[base - (i + 1) * size, base - i * size)`
    pub stack_base: u64,
}

/// Tunables for a kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub stack_size: u64,
    pub timer_hz: u32,
    pub timer_source: u32,
    pub initial_status: u64,
    pub default_priority: u32,
    /// Bytes below the top of stack where a fresh image starts, for ABIs
    /// that expect a return-address slot at entry
    pub entry_stack_offset: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            stack_size: STACK_SIZE,
            timer_hz: TIMER_HZ,
            timer_source: TIMER_SOURCE,
            initial_status: INITIAL_STATUS,
            default_priority: 1,
            entry_stack_offset: 0,
        }
    }
}

impl KernelConfig {
    /// Top-of-stack address for the slot owned by `pid`.
    pub fn top_of_stack(&self, boot: &BootParams, pid: Pid) -> u64 {
        boot.stack_base - pid.as_u64() * self.stack_size
    }

    /// Stack pointer a fresh image starts with in the region topped by `tos`.
    pub fn entry_sp(&self, tos: u64) -> u64 {
        tos - self.entry_stack_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_regions_are_disjoint() {
        let config = KernelConfig::default();
        let boot = BootParams { console_entry: 0, stack_base: 0x10_0000 };

        let first = config.top_of_stack(&boot, Pid::new(0));
        let second = config.top_of_stack(&boot, Pid::new(1));
        assert_eq!(first, 0x10_0000);
        assert_eq!(first - second, config.stack_size);
    }

    #[test]
    fn entry_sp_leaves_the_configured_gap() {
        let config = KernelConfig { entry_stack_offset: 8, ..KernelConfig::default() };
        assert_eq!(config.entry_sp(0x10_0000), 0x0f_fff8);
        assert_eq!(KernelConfig::default().entry_sp(0x10_0000), 0x10_0000);
    }
}
