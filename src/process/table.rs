// Fixed-capacity process table
use super::pcb::{Pid, ProcessControlBlock, ProcessError, ProcessState};

/// N process control blocks, indexed by pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTable<const N: usize> {
    slots: [ProcessControlBlock; N],
}

impl<const N: usize> ProcessTable<N> {
    /// Power-on table: every slot Invalid.
    pub fn new() -> Self {
        Self {
            slots: [ProcessControlBlock::default(); N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Look up a slot; `None` outside the table.
    pub fn get(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.slots.get(pid.index())
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut ProcessControlBlock> {
        self.slots.get_mut(pid.index())
    }

    /// Pid for a raw syscall argument, if it names a slot.
    pub fn lookup(&self, raw: u64) -> Result<Pid, ProcessError> {
        usize::try_from(raw)
            .ok()
            .filter(|&index| index < N)
            .map(Pid::new)
            .ok_or(ProcessError::InvalidProcessId)
    }

    /// Lowest-id free slot.
    pub fn find_free(&self) -> Result<Pid, ProcessError> {
        self.slots
            .iter()
            .position(|pcb| pcb.state == ProcessState::Terminated)
            .map(Pid::new)
            .ok_or(ProcessError::TableFull)
    }

    /// Lowest-id free slot other than `pid`.
    pub fn find_free_except(&self, pid: Pid) -> Result<Pid, ProcessError> {
        self.slots
            .iter()
            .enumerate()
            .position(|(index, pcb)| pcb.state == ProcessState::Terminated && index != pid.index())
            .map(Pid::new)
            .ok_or(ProcessError::TableFull)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessControlBlock> {
        self.slots.iter_mut()
    }

    /// Number of slots not free.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|pcb| pcb.state.is_live()).count()
    }

    /// Number of slots in `state`.
    pub fn count(&self, state: ProcessState) -> usize {
        self.slots.iter().filter(|pcb| pcb.state == state).count()
    }
}

impl<const N: usize> Default for ProcessTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::ops::Index<Pid> for ProcessTable<N> {
    type Output = ProcessControlBlock;

    fn index(&self, pid: Pid) -> &ProcessControlBlock {
        &self.slots[pid.index()]
    }
}

impl<const N: usize> core::ops::IndexMut<Pid> for ProcessTable<N> {
    fn index_mut(&mut self, pid: Pid) -> &mut ProcessControlBlock {
        &mut self.slots[pid.index()]
    }
}
