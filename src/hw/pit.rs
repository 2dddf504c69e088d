// 8253/8254 programmable interval timer
use x86_64::instructions::port::Port;

use crate::devices::PeriodicTimer;

/// PIT input clock in Hertz
const PIT_FREQUENCY: u32 = 1_193_182;

/// Channel 0, low/high byte access, mode 2 (rate generator), binary
const CHANNEL0_RATE_GENERATOR: u8 = 0x36;

pub struct Pit;

impl PeriodicTimer for Pit {
    fn start_periodic(&mut self, hz: u32) {
        let divisor = (PIT_FREQUENCY / hz.max(1)).min(u32::from(u16::MAX)) as u16;
        let mut command = Port::<u8>::new(0x43);
        let mut channel0 = Port::<u8>::new(0x40);
        unsafe {
            command.write(CHANNEL0_RATE_GENERATOR);
            channel0.write((divisor & 0xFF) as u8);
            channel0.write((divisor >> 8) as u8);
        }
    }

    // The PIT has no pending latch; IRQ0 is re-armed by the PIC's EOI.
    fn clear_interrupt(&mut self) {}
}
