#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod bare {
    use bootloader::{entry_point, BootInfo};
    use core::panic::PanicInfo;

    use pkos::hw::{self, KERNEL};
    use pkos::programs::{Program, ProgramTable};
    use pkos::{serial_println, user};
    use pkos::{BootParams, ExecutionContext, Kernel};

    entry_point!(kernel_main);

    fn kernel_main(_boot_info: &'static BootInfo) -> ! {
        serial_println!("Welcome to pkos!");
        hw::init();

        let boot = BootParams {
            console_entry: main_console as usize as u64,
            stack_base: hw::stack_base(),
        };
        let mut kernel = Kernel::new(hw::devices(), hw::config(), boot);
        let mut ctx = ExecutionContext::default();
        if let Err(err) = kernel.reset(&mut ctx) {
            panic!("bootstrap failed: {}", err);
        }
        *KERNEL.lock() = Some(kernel);

        hw::trap::enter_first(&ctx)
    }

    /// This function is called on panic.
    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        serial_println!("{}", info);
        pkos::hlt_loop();
    }

    fn programs() -> [Program; 2] {
        [
            Program { name: "P3", entry: main_p3 as usize as u64 },
            Program { name: "P4", entry: main_p4 as usize as u64 },
        ]
    }

    /// Start every known program once, then stay out of the way.
    extern "C" fn main_console() -> ! {
        let programs = programs();
        for program in ProgramTable::new(&programs).iter() {
            if let Ok(0) = user::fork() {
                user::exec(program.entry);
            }
        }
        loop {
            user::yield_now();
        }
    }

    extern "C" fn main_p3() -> ! {
        loop {
            user::write(0, b"P3");
        }
    }

    extern "C" fn main_p4() -> ! {
        for _ in 0..1000 {
            user::write(0, b"P4");
        }
        user::exit()
    }
}

#[cfg(not(target_os = "none"))]
mod sim {
    use std::collections::BTreeMap;

    use pkos::hosted::{self, SimPlatform, CONSOLE_ENTRY};
    use pkos::programs::{Program, ProgramTable};
    use pkos::syscalls::SyscallNumber;
    use pkos::{ExecutionContext, Kernel, Pid, ProcessError, MAX_PROCS};

    const PROGRAMS: &[Program] = &[
        Program { name: "P3", entry: 0x0003_0000 },
        Program { name: "P4", entry: 0x0004_0000 },
        Program { name: "P5", entry: 0x0005_0000 },
    ];

    const SESSION: &[&str] = &[
        "execute P3",
        "execute P4",
        "nice 1 5",
        "execute P9",
        "terminate 2",
        "execute P5",
    ];

    /// Replays a console session, one action of the executing process per
    /// timer tick, and prints the kernel's output.
    pub struct Machine {
        kernel: Kernel<SimPlatform, MAX_PROCS>,
        ctx: ExecutionContext,
        programs: ProgramTable<'static>,
        pending_exec: BTreeMap<Pid, u64>,
        script: std::slice::Iter<'static, &'static str>,
    }

    impl Machine {
        pub fn boot() -> Result<Self, ProcessError> {
            let mut kernel = hosted::kernel::<MAX_PROCS>();
            let mut ctx = ExecutionContext::default();
            kernel.reset(&mut ctx)?;
            Ok(Self {
                kernel,
                ctx,
                programs: ProgramTable::new(PROGRAMS),
                pending_exec: BTreeMap::new(),
                script: SESSION.iter(),
            })
        }

        fn trap(&mut self, number: SyscallNumber, args: [u64; 3]) -> Result<u64, ProcessError> {
            let first = ExecutionContext::ARG0;
            self.ctx.gpr[first..first + 3].copy_from_slice(&args);
            self.kernel.handle_syscall(&mut self.ctx, number as u64)?;
            Ok(self.ctx.result())
        }

        fn write(&mut self, text: &str) -> Result<(), ProcessError> {
            let buf = self.ctx.sp - 64;
            self.kernel.devices_mut().memory.write(buf, text.as_bytes());
            self.trap(SyscallNumber::Write, [1, buf, text.len() as u64])?;
            Ok(())
        }

        fn console_step(&mut self) -> Result<(), ProcessError> {
            let Some(line) = self.script.next() else {
                return Ok(());
            };
            self.write(&format!("console$ {}\n", line))?;

            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["execute", name] => match self.programs.lookup(name) {
                    Some(entry) => {
                        let child = self.trap(SyscallNumber::Fork, [0; 3])?;
                        self.pending_exec.insert(Pid::new(child as usize), entry);
                    }
                    None => self.write("unknown program\n")?,
                },
                ["terminate", pid] => {
                    let pid = pid.parse().unwrap_or(u64::MAX);
                    self.trap(SyscallNumber::Kill, [pid, 0, 0])?;
                }
                ["nice", pid, priority] => {
                    let pid = pid.parse().unwrap_or(u64::MAX);
                    let priority = priority.parse().unwrap_or(u64::MAX);
                    self.trap(SyscallNumber::Nice, [pid, priority, 0])?;
                }
                _ => self.write("unknown command\n")?,
            }
            Ok(())
        }

        /// Let the executing process do one thing, then deliver a timer tick.
        pub fn step(&mut self) -> Result<(), ProcessError> {
            let Some(pid) = self.kernel.executing() else {
                return Err(ProcessError::NoCurrentProcess);
            };
            let pc = self.ctx.pc;
            let running = self.programs.iter().find(|program| program.entry == pc);

            if let Some(entry) = self.pending_exec.remove(&pid) {
                self.trap(SyscallNumber::Exec, [entry, 0, 0])?;
            } else if pc == CONSOLE_ENTRY {
                self.console_step()?;
            } else if let Some(program) = running {
                self.write(program.name)?;
            }

            let timer = self.kernel.config().timer_source;
            self.kernel.handle_irq(&mut self.ctx, timer)?;
            Ok(())
        }

        pub fn drain_output(&mut self) -> String {
            self.kernel.devices_mut().console.take()
        }
    }

    pub fn run() -> Result<(), ProcessError> {
        let mut machine = Machine::boot()?;
        print!("{}", machine.drain_output());
        for _ in 0..40 {
            machine.step()?;
            print!("{}", machine.drain_output());
        }
        println!();
        Ok(())
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    if let Err(err) = sim::run() {
        eprintln!("pkos: {}", err);
        std::process::exit(1);
    }
}
