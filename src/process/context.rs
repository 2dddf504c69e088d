// Saved processor state of a process

/// Number of general-purpose registers saved per context
pub const GPR_COUNT: usize = 15;

/// Register snapshot needed to resume a process.
///
/// Either freshly built for a new process (`pc` at its entry point, `sp` at the
/// top of its private stack) or copied verbatim from a trapped processor state.
/// Saving and restoring is plain assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct ExecutionContext {
    pub status: u64,
    pub pc: u64,
    pub gpr: [u64; GPR_COUNT],
    pub sp: u64,
    /// Link register. Zero on architectures that keep the return address on the stack.
    pub lr: u64,
}

impl ExecutionContext {
    /// Register that carries the syscall id in and the result out
    pub const RESULT: usize = 0;
    /// First of the three syscall argument registers
    pub const ARG0: usize = 1;

    /// Context for a process that has not run yet.
    pub const fn fresh(status: u64, entry: u64, sp: u64) -> Self {
        Self {
            status,
            pc: entry,
            gpr: [0; GPR_COUNT],
            sp,
            lr: 0,
        }
    }

    /// Syscall argument `n` (0..3).
    pub fn arg(&self, n: usize) -> u64 {
        debug_assert!(n < 3);
        self.gpr[Self::ARG0 + n]
    }

    pub fn result(&self) -> u64 {
        self.gpr[Self::RESULT]
    }

    pub fn set_result(&mut self, value: u64) {
        self.gpr[Self::RESULT] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_and_result_use_distinct_registers() {
        let mut ctx = ExecutionContext::fresh(0x202, 0x4000, 0x8000);
        ctx.gpr[1] = 10;
        ctx.gpr[2] = 20;
        ctx.gpr[3] = 30;
        ctx.set_result(7);

        assert_eq!((ctx.arg(0), ctx.arg(1), ctx.arg(2)), (10, 20, 30));
        assert_eq!(ctx.result(), 7);
        assert_eq!(ctx.pc, 0x4000);
        assert_eq!(ctx.sp, 0x8000);
    }
}
