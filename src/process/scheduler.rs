// Priority + aging scheduler for pkos
use crate::devices::Platform;
use crate::kernel::Kernel;

use super::context::ExecutionContext;
use super::pcb::{Pid, ProcessError, ProcessState};
use super::table::ProcessTable;

/// Pick the live slot with the highest base priority + age.
///
/// Slots are scanned in increasing id order against a running best that
/// starts at 0, and a slot replaces the best when it reaches *or* exceeds it.
/// Ties therefore go to the highest id among the tied slots.
pub fn select_next<const N: usize>(table: &ProcessTable<N>) -> Option<Pid> {
    let mut next = None;
    let mut best = 0;
    for pcb in table.iter().filter(|pcb| pcb.state.is_live()) {
        let priority = pcb.effective_priority();
        if best <= priority {
            best = priority;
            next = Some(pcb.pid);
        }
    }
    next
}

/// Reset `chosen`'s age and age every other live slot by one round.
pub fn age_all<const N: usize>(table: &mut ProcessTable<N>, chosen: Pid) {
    for pcb in table.iter_mut().filter(|pcb| pcb.state.is_live()) {
        if pcb.pid == chosen {
            pcb.age = 0;
        } else {
            pcb.age = pcb.age.saturating_add(1);
        }
    }
}

impl<P: Platform, const N: usize> Kernel<P, N> {
    /// Decide which process resumes on return from the current handler and
    /// switch `ctx` to it.
    pub fn schedule(&mut self, ctx: &mut ExecutionContext) -> Result<Pid, ProcessError> {
        let next = select_next(&self.table).ok_or(ProcessError::NoRunnableProcess)?;
        age_all(&mut self.table, next);

        let prev = self.executing;
        self.dispatch(ctx, prev, Some(next));

        if let Some(pcb) = prev.and_then(|pid| self.table.get_mut(pid)) {
            if pcb.state != ProcessState::Terminated {
                pcb.state = ProcessState::Ready;
            }
        }
        self.table[next].state = ProcessState::Executing;

        Ok(next)
    }
}
