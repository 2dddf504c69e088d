// Process Control Block (PCB) for pkos
use core::fmt;

use super::context::ExecutionContext;

/// Process ID, equal to the index of the owning table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pid(usize);

impl Pid {
    pub const fn new(index: usize) -> Self {
        Pid(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    /// Slot never initialised (power-on)
    #[default]
    Invalid,
    /// Built by bootstrap or fork, not yet run
    Created,
    /// Free slot, available for fork
    Terminated,
    Ready,
    Executing,
    /// Reserved, never entered by the kernel
    Waiting,
}

impl ProcessState {
    pub fn is_live(self) -> bool {
        self != ProcessState::Terminated
    }
}

/// Process Control Block (PCB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessControlBlock {
    pub pid: Pid,
    pub state: ProcessState,
    /// Top of the private stack region `[tos - stack_size, tos)`
    pub tos: u64,
    pub ctx: ExecutionContext,
    pub base_priority: u32,
    /// Scheduling rounds since this process was last chosen
    pub age: u32,
}

impl ProcessControlBlock {
    /// A free slot: everything zeroed except the slot's identity and stack top.
    pub fn free(pid: Pid, tos: u64) -> Self {
        Self {
            pid,
            state: ProcessState::Terminated,
            tos,
            ..Self::default()
        }
    }

    /// Selection key used by the scheduler.
    pub fn effective_priority(&self) -> u32 {
        self.base_priority.saturating_add(self.age)
    }

    /// Reset this slot to free, keeping its identity.
    pub fn wipe(&mut self) {
        *self = Self::free(self.pid, self.tos);
    }
}

/// Process management errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    /// Every slot is live
    TableFull,
    /// Id outside the table
    InvalidProcessId,
    /// No process is executing
    NoCurrentProcess,
    /// Scheduling found no live slot
    NoRunnableProcess,
    /// Stack pointer outside the caller's stack region
    StackOutOfBounds,
    /// Base priority above the table capacity
    InvalidPriority,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessError::TableFull => write!(f, "Process table full"),
            ProcessError::InvalidProcessId => write!(f, "Invalid process ID"),
            ProcessError::NoCurrentProcess => write!(f, "No current process"),
            ProcessError::NoRunnableProcess => write!(f, "No runnable process"),
            ProcessError::StackOutOfBounds => write!(f, "Stack pointer out of bounds"),
            ProcessError::InvalidPriority => write!(f, "Priority out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wipe_keeps_identity() {
        let mut pcb = ProcessControlBlock {
            pid: Pid::new(3),
            state: ProcessState::Executing,
            tos: 0x9000,
            ctx: ExecutionContext::fresh(0x202, 0x1234, 0x8ff0),
            base_priority: 5,
            age: 2,
        };
        pcb.wipe();

        assert_eq!(pcb, ProcessControlBlock::free(Pid::new(3), 0x9000));
        assert_eq!(pcb.effective_priority(), 0);
    }

    #[test]
    fn effective_priority_saturates() {
        let pcb = ProcessControlBlock {
            base_priority: u32::MAX,
            age: 1,
            ..ProcessControlBlock::default()
        };
        assert_eq!(pcb.effective_priority(), u32::MAX);
    }
}
