// src/interrupts.rs
use crate::devices::{InterruptController, PeriodicTimer, Platform};
use crate::kernel::Kernel;
use crate::process::{ExecutionContext, ProcessError};

impl<P: Platform, const N: usize> Kernel<P, N> {
    /// Handle a hardware interrupt from `source`.
    ///
    /// A timer tick reschedules. Every source, known or not, is signalled
    /// end-of-interrupt so the controller keeps forwarding it.
    pub fn handle_irq(&mut self, ctx: &mut ExecutionContext, source: u32) -> Result<(), ProcessError> {
        let result = if source == self.config.timer_source {
            crate::kprintln!(&mut self.devices.console, "[TIMER]");
            let result = self.schedule(ctx).map(drop);
            self.devices.timer.clear_interrupt();
            result
        } else {
            Ok(())
        };

        self.devices.irq.end_of_interrupt(source);
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::hosted;
    use crate::process::Pid;

    #[test]
    fn timer_tick_reschedules_and_acknowledges() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let timer = kernel.config().timer_source;
        kernel.devices_mut().console.clear();

        kernel.handle_irq(&mut ctx, timer).unwrap();

        assert_eq!(kernel.devices().console.output(), "[TIMER]\n[0->0]\n");
        assert_eq!(kernel.devices().timer.cleared, 1);
        assert_eq!(kernel.devices().irq.eoi, vec![timer]);
        assert_eq!(kernel.executing(), Some(Pid::new(0)));
    }

    #[test]
    fn unknown_source_is_only_acknowledged() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let before = ctx;
        kernel.devices_mut().console.clear();

        kernel.handle_irq(&mut ctx, 33).unwrap();

        assert_eq!(ctx, before);
        assert_eq!(kernel.devices().console.output(), "");
        assert_eq!(kernel.devices().timer.cleared, 0);
        assert_eq!(kernel.devices().irq.eoi, vec![33]);
    }

    #[test]
    fn timer_interrupt_is_acknowledged_even_when_nothing_can_run() {
        let (mut kernel, mut ctx) = hosted::booted_with_ctx::<4>();
        let timer = kernel.config().timer_source;
        kernel.table[Pid::new(0)].wipe();

        assert!(kernel.handle_irq(&mut ctx, timer).is_err());
        assert_eq!(kernel.devices().irq.eoi, vec![timer]);
    }
}
