// Device doubles for running the kernel core on a host
//
// Used by the unit tests, the scenario tests under tests/ and the hosted
// simulation binary.
use std::string::String;
use std::vec::Vec;

use crate::config::{BootParams, KernelConfig};
use crate::console::Console;
use crate::devices::{Devices, InterruptController, PeriodicTimer, Platform, StackMemory};
use crate::kernel::Kernel;
use crate::process::{ExecutionContext, Pid, ProcessControlBlock, ProcessState};

/// Entry address given to the console at boot
pub const CONSOLE_ENTRY: u64 = 0x0001_0000;

/// Shared top-of-stack base
pub const STACK_BASE: u64 = 0x0080_0000;

/// Console that records everything written to it.
#[derive(Debug, Default)]
pub struct BufferConsole {
    bytes: Vec<u8>,
}

impl BufferConsole {
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Return and forget everything written so far.
    pub fn take(&mut self) -> String {
        let out = self.output();
        self.bytes.clear();
        out
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Console for BufferConsole {
    fn put_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }
}

/// Timer that records how it was programmed.
#[derive(Debug, Default)]
pub struct SimTimer {
    pub hz: Option<u32>,
    pub cleared: usize,
}

impl PeriodicTimer for SimTimer {
    fn start_periodic(&mut self, hz: u32) {
        self.hz = Some(hz);
    }

    fn clear_interrupt(&mut self) {
        self.cleared += 1;
    }
}

/// Interrupt controller that records enables and end-of-interrupts.
#[derive(Debug, Default)]
pub struct SimIrq {
    pub enabled: Vec<u32>,
    pub eoi: Vec<u32>,
}

impl InterruptController for SimIrq {
    fn enable(&mut self, source: u32) {
        self.enabled.push(source);
    }

    fn end_of_interrupt(&mut self, source: u32) {
        self.eoi.push(source);
    }
}

/// A window `[base, base + len)` of the flat address space.
///
/// Reads outside the window return 0 and writes outside it are dropped.
#[derive(Debug)]
pub struct SimMemory {
    base: u64,
    bytes: Vec<u8>,
}

impl SimMemory {
    pub fn new(base: u64, len: usize) -> Self {
        Self { base, bytes: vec![0; len] }
    }

    fn offset(&self, addr: u64) -> Option<usize> {
        let offset = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        (offset < self.bytes.len()).then_some(offset)
    }

    pub fn write(&mut self, addr: u64, data: &[u8]) {
        for (addr, &byte) in (addr..).zip(data) {
            if let Some(offset) = self.offset(addr) {
                self.bytes[offset] = byte;
            }
        }
    }

    pub fn read(&self, addr: u64, len: usize) -> Vec<u8> {
        (addr..addr + len as u64).map(|addr| self.read_byte(addr)).collect()
    }
}

impl StackMemory for SimMemory {
    fn read_byte(&self, addr: u64) -> u8 {
        self.offset(addr).map_or(0, |offset| self.bytes[offset])
    }

    fn copy(&mut self, src: u64, dst: u64, len: u64) {
        let data = self.read(src, len as usize);
        self.write(dst, &data);
    }
}

/// Host platform built from the doubles above.
pub struct SimPlatform;

impl Platform for SimPlatform {
    type Console = BufferConsole;
    type Timer = SimTimer;
    type Irq = SimIrq;
    type Memory = SimMemory;
}

/// Devices whose memory covers every slot's stack for a table of `N`.
pub fn devices<const N: usize>(config: &KernelConfig) -> Devices<SimPlatform> {
    let len = N as u64 * config.stack_size;
    Devices {
        console: BufferConsole::default(),
        timer: SimTimer::default(),
        irq: SimIrq::default(),
        memory: SimMemory::new(STACK_BASE - len, len as usize),
    }
}

pub fn boot_params() -> BootParams {
    BootParams {
        console_entry: CONSOLE_ENTRY,
        stack_base: STACK_BASE,
    }
}

/// A kernel on simulated devices, not yet reset.
pub fn kernel<const N: usize>() -> Kernel<SimPlatform, N> {
    kernel_with::<N>(KernelConfig::default())
}

pub fn kernel_with<const N: usize>(config: KernelConfig) -> Kernel<SimPlatform, N> {
    Kernel::new(devices::<N>(&config), config, boot_params())
}

/// A reset kernel and the context it dispatched the console into.
pub fn booted_with_ctx<const N: usize>() -> (Kernel<SimPlatform, N>, ExecutionContext) {
    let mut kernel = kernel::<N>();
    let mut ctx = ExecutionContext::default();
    // a fresh table always has the console to dispatch
    let _ = kernel.reset(&mut ctx);
    (kernel, ctx)
}

pub fn booted<const N: usize>() -> Kernel<SimPlatform, N> {
    booted_with_ctx::<N>().0
}

/// A Ready slot for `index` with its own stack, as fork would have built it.
pub fn ready_slot<const N: usize>(kernel: &Kernel<SimPlatform, N>, index: usize, priority: u32) -> ProcessControlBlock {
    let pid = Pid::new(index);
    let tos = kernel.config().top_of_stack(&kernel.boot, pid);
    ProcessControlBlock {
        pid,
        state: ProcessState::Ready,
        tos,
        ctx: ExecutionContext::fresh(kernel.config().initial_status, CONSOLE_ENTRY, tos),
        base_priority: priority,
        age: 0,
    }
}
