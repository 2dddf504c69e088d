// Kernel state and bootstrap
use crate::config::{BootParams, KernelConfig, MAX_PROCS};
use crate::devices::{Devices, InterruptController, PeriodicTimer, Platform};
use crate::process::{ExecutionContext, Pid, ProcessControlBlock, ProcessError, ProcessState, ProcessTable};

/// The whole mutable state of the kernel.
///
/// Only the trap and interrupt handlers call into this, one at a time and to
/// completion, so `&mut self` is the only synchronisation it needs.
pub struct Kernel<P: Platform, const N: usize = MAX_PROCS> {
    pub(crate) table: ProcessTable<N>,
    pub(crate) executing: Option<Pid>,
    pub(crate) devices: Devices<P>,
    pub(crate) config: KernelConfig,
    pub(crate) boot: BootParams,
}

impl<P: Platform, const N: usize> Kernel<P, N> {
    /// A kernel with a power-on table. Nothing runs until [`Kernel::reset`].
    pub fn new(devices: Devices<P>, config: KernelConfig, boot: BootParams) -> Self {
        Self {
            table: ProcessTable::new(),
            executing: None,
            devices,
            config,
            boot,
        }
    }

    /// One-time initialisation: start the timer, seed the table with the
    /// console in slot 0 and every other slot free, and dispatch the console
    /// into `ctx`.
    pub fn reset(&mut self, ctx: &mut ExecutionContext) -> Result<Pid, ProcessError> {
        self.devices.timer.start_periodic(self.config.timer_hz);
        self.devices.irq.enable(self.config.timer_source);

        for pcb in self.table.iter_mut() {
            pcb.state = ProcessState::Invalid;
        }

        let console = Pid::new(0);
        let tos = self.config.top_of_stack(&self.boot, console);
        self.table[console] = ProcessControlBlock {
            pid: console,
            state: ProcessState::Created,
            tos,
            ctx: ExecutionContext::fresh(
                self.config.initial_status,
                self.boot.console_entry,
                self.config.entry_sp(tos),
            ),
            base_priority: self.config.default_priority,
            age: 0,
        };

        for index in 1..N {
            let pid = Pid::new(index);
            let tos = self.config.top_of_stack(&self.boot, pid);
            self.table[pid] = ProcessControlBlock::free(pid, tos);
        }

        // highest effective priority among live slots, first one wins ties
        let mut first = None;
        let mut best = 0;
        for pcb in self.table.iter().filter(|pcb| pcb.state.is_live()) {
            if first.is_none() || best < pcb.effective_priority() {
                first = Some(pcb.pid);
                best = pcb.effective_priority();
            }
        }
        let first = first.ok_or(ProcessError::NoRunnableProcess)?;

        self.dispatch(ctx, None, Some(first));
        self.table[first].state = ProcessState::Executing;
        Ok(first)
    }

    pub fn table(&self) -> &ProcessTable<N> {
        &self.table
    }

    /// The process the processor will resume on leaving the current handler.
    pub fn executing(&self) -> Option<Pid> {
        self.executing
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn devices(&self) -> &Devices<P> {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices<P> {
        &mut self.devices
    }

    /// The executing process, failing if there is none.
    pub(crate) fn current(&self) -> Result<Pid, ProcessError> {
        self.executing.ok_or(ProcessError::NoCurrentProcess)
    }
}
