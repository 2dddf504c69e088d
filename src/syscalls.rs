// src/syscalls.rs
use core::fmt;

use crate::devices::{Platform, StackMemory};
use crate::console::Console;
use crate::kernel::Kernel;
use crate::process::{ExecutionContext, Pid, ProcessControlBlock, ProcessError, ProcessState};

/// System call numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SyscallNumber {
    Yield = 0,
    Write = 1,
    Fork = 3,
    Exit = 4,
    Exec = 5,
    Kill = 6,
    Nice = 7,
}

impl TryFrom<u64> for SyscallNumber {
    type Error = SyscallError;

    fn try_from(id: u64) -> Result<Self, SyscallError> {
        match id {
            0 => Ok(SyscallNumber::Yield),
            1 => Ok(SyscallNumber::Write),
            3 => Ok(SyscallNumber::Fork),
            4 => Ok(SyscallNumber::Exit),
            5 => Ok(SyscallNumber::Exec),
            6 => Ok(SyscallNumber::Kill),
            7 => Ok(SyscallNumber::Nice),
            _ => Err(SyscallError::InvalidSyscall),
        }
    }
}

/// System call arguments, read from the trapped context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallArgs {
    pub arg0: u64,
    pub arg1: u64,
    pub arg2: u64,
}

impl From<&ExecutionContext> for SyscallArgs {
    fn from(ctx: &ExecutionContext) -> Self {
        Self {
            arg0: ctx.arg(0),
            arg1: ctx.arg(1),
            arg2: ctx.arg(2),
        }
    }
}

/// System call result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallResult {
    Success(u64),
    Error(SyscallError),
}

/// System call errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SyscallError {
    InvalidSyscall = 1,
    TableFull = 2,
    InvalidProcessId = 3,
    NoCurrentProcess = 4,
    NoRunnableProcess = 5,
    StackOutOfBounds = 6,
    InvalidPriority = 7,
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyscallError::InvalidSyscall => write!(f, "Invalid syscall number"),
            SyscallError::TableFull => write!(f, "No free process slot"),
            SyscallError::InvalidProcessId => write!(f, "Invalid process ID"),
            SyscallError::NoCurrentProcess => write!(f, "No current process"),
            SyscallError::NoRunnableProcess => write!(f, "No runnable process"),
            SyscallError::StackOutOfBounds => write!(f, "Stack pointer out of bounds"),
            SyscallError::InvalidPriority => write!(f, "Priority out of range"),
        }
    }
}

impl From<ProcessError> for SyscallError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::TableFull => SyscallError::TableFull,
            ProcessError::InvalidProcessId => SyscallError::InvalidProcessId,
            ProcessError::NoCurrentProcess => SyscallError::NoCurrentProcess,
            ProcessError::NoRunnableProcess => SyscallError::NoRunnableProcess,
            ProcessError::StackOutOfBounds => SyscallError::StackOutOfBounds,
            ProcessError::InvalidPriority => SyscallError::InvalidPriority,
        }
    }
}

impl From<Result<Pid, ProcessError>> for SyscallResult {
    fn from(result: Result<Pid, ProcessError>) -> Self {
        match result {
            Ok(pid) => SyscallResult::Success(pid.as_u64()),
            Err(err) => SyscallResult::Error(err.into()),
        }
    }
}

/// High bit marks an error; never a valid pid or byte count
pub const ERROR_BIT: u64 = 0x8000_0000_0000_0000;

/// Convert syscall result to u64 for the result register
impl From<SyscallResult> for u64 {
    fn from(result: SyscallResult) -> u64 {
        match result {
            SyscallResult::Success(value) => value,
            SyscallResult::Error(err) => ERROR_BIT | (err as u64),
        }
    }
}

/// Decode a result register as seen by the calling process
impl From<u64> for SyscallResult {
    fn from(word: u64) -> SyscallResult {
        if word & ERROR_BIT == 0 {
            return SyscallResult::Success(word);
        }
        let err = match word & !ERROR_BIT {
            2 => SyscallError::TableFull,
            3 => SyscallError::InvalidProcessId,
            4 => SyscallError::NoCurrentProcess,
            5 => SyscallError::NoRunnableProcess,
            6 => SyscallError::StackOutOfBounds,
            7 => SyscallError::InvalidPriority,
            _ => SyscallError::InvalidSyscall,
        };
        SyscallResult::Error(err)
    }
}

impl<P: Platform, const N: usize> Kernel<P, N> {
    /// Handle a software trap raised by the executing process.
    ///
    /// Unknown ids and invalid kill/nice targets are ignored. The only error
    /// surfaced to the caller is a scheduling failure, which leaves nothing to
    /// resume.
    pub fn handle_syscall(&mut self, ctx: &mut ExecutionContext, id: u64) -> Result<(), ProcessError> {
        let number = match SyscallNumber::try_from(id) {
            Ok(number) => number,
            Err(_) => return Ok(()),
        };
        let args = SyscallArgs::from(&*ctx);

        match number {
            SyscallNumber::Yield => {
                crate::kprint!(&mut self.devices.console, "[YIELD]");
                self.schedule(ctx)?;
            }
            SyscallNumber::Write => {
                let written = self.sys_write(args);
                ctx.set_result(written);
            }
            SyscallNumber::Fork => {
                crate::kprintln!(&mut self.devices.console, "[FORK]");
                let result = SyscallResult::from(self.sys_fork(ctx));
                ctx.set_result(result.into());
            }
            SyscallNumber::Exit => {
                crate::kprint!(&mut self.devices.console, "[EXIT]");
                self.sys_exit(ctx)?;
            }
            SyscallNumber::Exec => {
                crate::kprint!(&mut self.devices.console, "[EXECUTE]");
                self.sys_exec(ctx, args.arg0)?;
            }
            SyscallNumber::Kill => {
                crate::kprint!(&mut self.devices.console, "[KILL]");
                // unknown targets are ignored
                let _ = self.sys_kill(args.arg0);
            }
            SyscallNumber::Nice => {
                crate::kprint!(&mut self.devices.console, "[NICE]");
                // invalid targets are ignored
                if self.sys_nice(args.arg0, args.arg1).is_ok() {
                    self.schedule(ctx)?;
                }
            }
        }
        Ok(())
    }

    fn sys_write(&mut self, args: SyscallArgs) -> u64 {
        let SyscallArgs { arg1: buf, arg2: len, .. } = args;
        for offset in 0..len {
            let byte = self.devices.memory.read_byte(buf.wrapping_add(offset));
            self.devices.console.put_byte(byte);
        }
        len
    }

    /// Duplicate the executing process into the lowest free slot.
    ///
    /// A caller that killed itself still owns its slot until the next
    /// scheduling point, so that slot is never chosen for the child.
    fn sys_fork(&mut self, ctx: &ExecutionContext) -> Result<Pid, ProcessError> {
        let parent = self.current()?;
        let child = self.table.find_free_except(parent)?;

        let parent_tos = self.table[parent].tos;
        let depth = parent_tos
            .checked_sub(ctx.sp)
            .filter(|&depth| depth <= self.config.stack_size)
            .ok_or(ProcessError::StackOutOfBounds)?;

        let child_tos = self.config.top_of_stack(&self.boot, child);
        let child_sp = child_tos - depth;
        self.devices.memory.copy(ctx.sp, child_sp, depth);

        let mut child_ctx = *ctx;
        child_ctx.status = self.config.initial_status;
        child_ctx.sp = child_sp;
        child_ctx.set_result(0);

        self.table[child] = ProcessControlBlock {
            pid: child,
            state: ProcessState::Created,
            tos: child_tos,
            ctx: child_ctx,
            base_priority: self.config.default_priority,
            age: 0,
        };
        Ok(child)
    }

    fn sys_exit(&mut self, ctx: &mut ExecutionContext) -> Result<(), ProcessError> {
        let pid = self.current()?;
        self.table[pid].wipe();
        self.schedule(ctx)?;
        Ok(())
    }

    /// Replace the image of the executing process, discarding its stack.
    fn sys_exec(&mut self, ctx: &mut ExecutionContext, entry: u64) -> Result<(), ProcessError> {
        let pid = self.current()?;
        ctx.pc = entry;
        ctx.sp = self.config.entry_sp(self.table[pid].tos);
        Ok(())
    }

    /// Free `raw`'s slot. An executing target keeps running until the next
    /// scheduling point, which skips it.
    fn sys_kill(&mut self, raw: u64) -> Result<(), ProcessError> {
        let pid = self.table.lookup(raw)?;
        if self.table[pid].state != ProcessState::Terminated {
            self.table[pid].wipe();
        }
        Ok(())
    }

    fn sys_nice(&mut self, raw: u64, priority: u64) -> Result<(), ProcessError> {
        let pid = self.table.lookup(raw)?;
        let priority = u32::try_from(priority)
            .ok()
            .filter(|&priority| priority as usize <= N)
            .ok_or(ProcessError::InvalidPriority)?;
        self.table[pid].base_priority = priority;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::hosted;

    fn trap(kernel: &mut Kernel<hosted::SimPlatform, 4>, ctx: &mut ExecutionContext, number: SyscallNumber, args: [u64; 3]) {
        ctx.gpr[ExecutionContext::ARG0..ExecutionContext::ARG0 + 3].copy_from_slice(&args);
        kernel.handle_syscall(ctx, number as u64).unwrap();
    }

    #[test]
    fn syscall_ids_decode() {
        assert_eq!(SyscallNumber::try_from(0), Ok(SyscallNumber::Yield));
        assert_eq!(SyscallNumber::try_from(7), Ok(SyscallNumber::Nice));
        assert_eq!(SyscallNumber::try_from(2), Err(SyscallError::InvalidSyscall));
    }

    #[test]
    fn error_results_set_high_bit() {
        let word: u64 = SyscallResult::Error(SyscallError::TableFull).into();
        assert_eq!(word, ERROR_BIT | 2);
        assert_eq!(u64::from(SyscallResult::Success(3)), 3);
    }

    #[test]
    fn result_words_decode() {
        assert_eq!(SyscallResult::from(5), SyscallResult::Success(5));
        assert_eq!(
            SyscallResult::from(ERROR_BIT | 6),
            SyscallResult::Error(SyscallError::StackOutOfBounds)
        );
    }

    #[test]
    fn write_copies_bytes_to_console() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let buf = ctx.sp - 64;
        kernel.devices_mut().memory.write(buf, b"P3");
        kernel.devices_mut().console.clear();

        trap(&mut kernel, &mut ctx, SyscallNumber::Write, [1, buf, 2]);

        assert_eq!(ctx.result(), 2);
        assert_eq!(kernel.devices().console.output(), "P3");
    }

    #[test]
    fn unknown_syscall_is_ignored() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        ctx.set_result(2);
        let table = kernel.table().clone();

        kernel.handle_syscall(&mut ctx, 2).unwrap();
        kernel.handle_syscall(&mut ctx, 99).unwrap();

        assert_eq!(ctx.result(), 2);
        assert_eq!(kernel.table(), &table);
    }

    #[test]
    fn fork_fills_lowest_free_slot() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        ctx.sp -= 16;
        kernel.devices_mut().memory.write(ctx.sp, &[7; 16]);

        trap(&mut kernel, &mut ctx, SyscallNumber::Fork, [0; 3]);

        let child = &kernel.table()[Pid::new(1)];
        assert_eq!(ctx.result(), 1);
        assert_eq!(child.state, ProcessState::Created);
        assert_eq!(child.ctx.result(), 0);
        assert_eq!(child.ctx.pc, ctx.pc);
        assert_eq!(child.tos - child.ctx.sp, 16);
        assert_eq!(kernel.devices().memory.read(child.ctx.sp, 16), vec![7; 16]);
        assert_eq!(kernel.executing(), Some(Pid::new(0)));
        assert!(kernel.devices().console.output().ends_with("[FORK]\n"));
    }

    #[test]
    fn fork_with_full_table_returns_error() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<2>();
        kernel.handle_syscall(&mut ctx, SyscallNumber::Fork as u64).unwrap();
        assert_eq!(ctx.result(), 1);

        kernel.handle_syscall(&mut ctx, SyscallNumber::Fork as u64).unwrap();
        assert_eq!(ctx.result(), ERROR_BIT | SyscallError::TableFull as u64);
        assert_eq!(kernel.table().live_count(), 2);
    }

    #[test]
    fn fork_rejects_stack_pointer_outside_region() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        ctx.sp += 8;

        trap(&mut kernel, &mut ctx, SyscallNumber::Fork, [0; 3]);

        assert_eq!(ctx.result(), ERROR_BIT | SyscallError::StackOutOfBounds as u64);
        assert_eq!(kernel.table().live_count(), 1);
    }

    #[test]
    fn exec_resets_pc_and_stack() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let tos = kernel.table()[Pid::new(0)].tos;
        ctx.sp -= 128;

        trap(&mut kernel, &mut ctx, SyscallNumber::Exec, [0x5000, 0, 0]);

        assert_eq!(ctx.pc, 0x5000);
        assert_eq!(ctx.sp, tos);
    }

    #[test]
    fn exec_honours_the_entry_offset() {
        let config = KernelConfig { entry_stack_offset: 8, ..KernelConfig::default() };
        let mut kernel = hosted::kernel_with::<4>(config);
        let mut ctx = ExecutionContext::default();
        kernel.reset(&mut ctx).unwrap();
        let tos = kernel.table()[Pid::new(0)].tos;

        trap(&mut kernel, &mut ctx, SyscallNumber::Exec, [0x5000, 0, 0]);

        assert_eq!(ctx.sp, tos - 8);
    }

    #[test]
    fn exit_frees_slot_and_switches_away() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        trap(&mut kernel, &mut ctx, SyscallNumber::Fork, [0; 3]);
        trap(&mut kernel, &mut ctx, SyscallNumber::Yield, [0; 3]);
        assert_eq!(kernel.executing(), Some(Pid::new(1)));

        trap(&mut kernel, &mut ctx, SyscallNumber::Exit, [0; 3]);

        assert_eq!(kernel.table()[Pid::new(1)].state, ProcessState::Terminated);
        assert_eq!(kernel.executing(), Some(Pid::new(0)));
        assert_eq!(kernel.table()[Pid::new(0)].state, ProcessState::Executing);
        assert!(kernel.devices().console.output().ends_with("[EXIT][1->0]\n"));
    }

    #[test]
    fn kill_of_free_or_unknown_slot_changes_nothing() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let table = kernel.table().clone();

        trap(&mut kernel, &mut ctx, SyscallNumber::Kill, [3, 0, 0]);
        trap(&mut kernel, &mut ctx, SyscallNumber::Kill, [40, 0, 0]);

        assert_eq!(kernel.table(), &table);
    }

    #[test]
    fn nice_out_of_range_is_ignored() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let table = kernel.table().clone();
        kernel.devices_mut().console.clear();

        trap(&mut kernel, &mut ctx, SyscallNumber::Nice, [0, 5, 0]);
        trap(&mut kernel, &mut ctx, SyscallNumber::Nice, [4, 1, 0]);

        assert_eq!(kernel.table(), &table);
        assert_eq!(kernel.devices().console.output(), "[NICE][NICE]");
    }

    #[test]
    fn nice_at_capacity_bound_is_applied() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();

        trap(&mut kernel, &mut ctx, SyscallNumber::Nice, [0, 4, 0]);

        assert_eq!(kernel.table()[Pid::new(0)].base_priority, 4);
        assert!(kernel.devices().console.output().ends_with("[NICE][0->0]\n"));
    }
}
