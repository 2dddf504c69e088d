// Context switching between table slots
use crate::devices::Platform;
use crate::kernel::Kernel;

use super::context::ExecutionContext;
use super::pcb::Pid;

impl<P: Platform, const N: usize> Kernel<P, N> {
    /// Suspend `prev` and resume `next`.
    ///
    /// `ctx` is the trapped processor state: it is preserved into `prev`, then
    /// overwritten with `next`'s saved context so the handler returns into
    /// `next`. `next` must name a live slot.
    pub fn dispatch(&mut self, ctx: &mut ExecutionContext, prev: Option<Pid>, next: Option<Pid>) {
        if let Some(pcb) = prev.and_then(|pid| self.table.get_mut(pid)) {
            pcb.ctx = *ctx;
        }
        if let Some(pcb) = next.and_then(|pid| self.table.get(pid)) {
            *ctx = pcb.ctx;
        }

        let console = &mut self.devices.console;
        crate::kprint!(console, "[");
        match prev {
            Some(pid) => crate::kprint!(console, "{}", pid),
            None => crate::kprint!(console, "?"),
        }
        crate::kprint!(console, "->");
        match next {
            Some(pid) => crate::kprint!(console, "{}", pid),
            None => crate::kprint!(console, "?"),
        }
        crate::kprintln!(console, "]");

        self.executing = next;
    }
}
