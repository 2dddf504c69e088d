// Syscall wrappers for processes running on the kernel
use core::arch::asm;

use crate::syscalls::{SyscallError, SyscallNumber, SyscallResult};

/// Trap into the kernel with `number` and three arguments.
#[inline(always)]
unsafe fn syscall(number: SyscallNumber, arg0: u64, arg1: u64, arg2: u64) -> u64 {
    let result: u64;
    asm!(
        "int 0x80",
        inlateout("rax") number as u64 => result,
        in("rdi") arg0,
        in("rsi") arg1,
        in("rdx") arg2,
    );
    result
}

pub fn yield_now() {
    unsafe {
        syscall(SyscallNumber::Yield, 0, 0, 0);
    }
}

/// Write `buf` to the console; returns the number of bytes written.
pub fn write(fd: u64, buf: &[u8]) -> u64 {
    unsafe { syscall(SyscallNumber::Write, fd, buf.as_ptr() as u64, buf.len() as u64) }
}

/// Returns the child's pid in the parent and 0 in the child.
pub fn fork() -> Result<u64, SyscallError> {
    let result = unsafe { syscall(SyscallNumber::Fork, 0, 0, 0) };
    match SyscallResult::from(result) {
        SyscallResult::Success(pid) => Ok(pid),
        SyscallResult::Error(err) => Err(err),
    }
}

pub fn exit() -> ! {
    unsafe {
        syscall(SyscallNumber::Exit, 0, 0, 0);
    }
    unreachable!("exited process resumed");
}

/// Replace the calling process's image with the program at `entry`.
pub fn exec(entry: u64) -> ! {
    unsafe {
        syscall(SyscallNumber::Exec, entry, 0, 0);
    }
    unreachable!("exec returned");
}

pub fn kill(pid: u64) {
    unsafe {
        syscall(SyscallNumber::Kill, pid, 0, 0);
    }
}

pub fn nice(pid: u64, priority: u64) {
    unsafe {
        syscall(SyscallNumber::Nice, pid, priority, 0);
    }
}
