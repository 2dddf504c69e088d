// PC hardware the kernel core runs on
//
// Everything but the vector layout needs the bare-metal target.
pub mod vectors;

#[cfg(target_os = "none")]
pub mod gdt;
#[cfg(target_os = "none")]
pub mod memory;
#[cfg(target_os = "none")]
pub mod pic;
#[cfg(target_os = "none")]
pub mod pit;
#[cfg(target_os = "none")]
pub mod serial;
#[cfg(target_os = "none")]
pub mod trap;

#[cfg(target_os = "none")]
pub use self::pc::*;

#[cfg(target_os = "none")]
mod pc {
    use lazy_static::lazy_static;
    use spin::Mutex;

    use super::{gdt, pic, trap};
    use crate::config::KernelConfig;
    use crate::devices::{Devices, Platform};
    use crate::kernel::Kernel;

    pub use super::memory::{stack_base, FlatMemory};
    pub use super::pic::Pic;
    pub use super::pit::Pit;
    pub use super::serial::SerialConsole;

    pub struct PcPlatform;

    impl Platform for PcPlatform {
        type Console = SerialConsole;
        type Timer = Pit;
        type Irq = Pic;
        type Memory = FlatMemory;
    }

    pub type PcKernel = Kernel<PcPlatform>;

    lazy_static! {
        /// Locked only from interrupt gates, which run with interrupts masked.
        pub static ref KERNEL: Mutex<Option<PcKernel>> = Mutex::new(None);
    }

    /// Tunables for this machine.
    pub fn config() -> KernelConfig {
        KernelConfig {
            // SysV entry: rsp + 8 is 16-byte aligned
            entry_stack_offset: 8,
            ..KernelConfig::default()
        }
    }

    pub fn devices() -> Devices<PcPlatform> {
        Devices {
            console: SerialConsole,
            timer: Pit,
            irq: Pic,
            memory: FlatMemory,
        }
    }

    /// Load the GDT and IDT and bring up the interrupt controllers, all lines
    /// masked.
    pub fn init() {
        gdt::init();
        trap::init_idt();
        pic::init();
    }
}
