// Flat physical memory and the process stack area
use crate::config::{MAX_PROCS, STACK_SIZE};
use crate::devices::StackMemory;

const STACK_AREA: usize = MAX_PROCS * STACK_SIZE as usize;

#[repr(C, align(16))]
struct ProcessStacks([u8; STACK_AREA]);

static mut PROCESS_STACKS: ProcessStacks = ProcessStacks([0; STACK_AREA]);

/// Shared top-of-stack base: one past the end of the stack area.
pub fn stack_base() -> u64 {
    let start = core::ptr::addr_of!(PROCESS_STACKS) as u64;
    start + STACK_AREA as u64
}

/// Direct access to the single address space every process runs in.
pub struct FlatMemory;

impl StackMemory for FlatMemory {
    fn read_byte(&self, addr: u64) -> u8 {
        unsafe { (addr as *const u8).read_volatile() }
    }

    fn copy(&mut self, src: u64, dst: u64, len: u64) {
        let src = src as *const u8;
        let dst = dst as *mut u8;
        for i in 0..len as usize {
            unsafe {
                dst.add(i).write_volatile(src.add(i).read_volatile());
            }
        }
    }
}
