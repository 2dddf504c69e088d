// Core of the pkos preemptive kernel
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", feature(abi_x86_interrupt))]

pub mod config;
pub mod console;
pub mod devices;
pub mod interrupts;
pub mod kernel;
pub mod process;
pub mod programs;
pub mod syscalls;

#[cfg(not(target_os = "none"))]
pub mod hosted;

pub mod hw;
#[cfg(target_os = "none")]
pub mod user;

pub use config::{BootParams, KernelConfig, MAX_PROCS};
pub use devices::{InterruptController, PeriodicTimer, Platform, StackMemory};
pub use console::Console;
pub use kernel::Kernel;
pub use process::{ExecutionContext, Pid, ProcessControlBlock, ProcessError, ProcessState, ProcessTable};
pub use syscalls::{SyscallError, SyscallNumber, SyscallResult};

/// Halt the processor until the next interrupt, forever.
#[cfg(target_os = "none")]
pub fn hlt_loop() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}
