// Trap entry/exit for the timer and syscall vectors
use core::arch::asm;

use lazy_static::lazy_static;
use x86_64::instructions::segmentation::{Segment, CS, SS};
use x86_64::registers::control::Cr2;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame, PageFaultErrorCode};
use x86_64::VirtAddr;

use super::gdt::{DOUBLE_FAULT_IST_INDEX, TRAP_IST_INDEX};
use super::vectors::PIC_1_OFFSET;
use super::KERNEL;
use crate::hlt_loop;
use crate::process::{ExecutionContext, GPR_COUNT, ProcessError};

pub const TIMER_VECTOR: usize = PIC_1_OFFSET as usize;
pub const SYSCALL_VECTOR: usize = 0x80;

/// Registers as laid out on the stack by the entry stubs.
///
/// The stub pushes r15 first and rax last; the CPU frame above it is what
/// `iretq` resumes from.
#[derive(Debug)]
#[repr(C)]
pub struct TrapFrame {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

impl TrapFrame {
    /// rax carries the result, rdi/rsi/rdx the syscall arguments.
    fn gprs(&self) -> [u64; GPR_COUNT] {
        [
            self.rax, self.rdi, self.rsi, self.rdx, self.rcx, self.rbx, self.rbp, self.r8,
            self.r9, self.r10, self.r11, self.r12, self.r13, self.r14, self.r15,
        ]
    }

    pub fn to_context(&self) -> ExecutionContext {
        ExecutionContext {
            status: self.rflags,
            pc: self.rip,
            gpr: self.gprs(),
            sp: self.rsp,
            lr: 0,
        }
    }

    pub fn load_context(&mut self, ctx: &ExecutionContext) {
        let [rax, rdi, rsi, rdx, rcx, rbx, rbp, r8, r9, r10, r11, r12, r13, r14, r15] = ctx.gpr;
        self.rax = rax;
        self.rdi = rdi;
        self.rsi = rsi;
        self.rdx = rdx;
        self.rcx = rcx;
        self.rbx = rbx;
        self.rbp = rbp;
        self.r8 = r8;
        self.r9 = r9;
        self.r10 = r10;
        self.r11 = r11;
        self.r12 = r12;
        self.r13 = r13;
        self.r14 = r14;
        self.r15 = r15;
        self.rflags = ctx.status;
        self.rip = ctx.pc;
        self.rsp = ctx.sp;
    }
}

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        idt.page_fault.set_handler_fn(page_fault_handler);
        idt.general_protection_fault.set_handler_fn(general_protection_handler);
        unsafe {
            idt.double_fault
                .set_handler_fn(double_fault_handler)
                .set_stack_index(DOUBLE_FAULT_IST_INDEX);
            idt[TIMER_VECTOR]
                .set_handler_addr(VirtAddr::new(timer_entry as u64))
                .set_stack_index(TRAP_IST_INDEX);
            idt[SYSCALL_VECTOR]
                .set_handler_addr(VirtAddr::new(syscall_entry as u64))
                .set_stack_index(TRAP_IST_INDEX);
        }
        idt
    };
}

pub fn init_idt() {
    IDT.load();
}

extern "x86-interrupt" fn breakpoint_handler(stack_frame: InterruptStackFrame) {
    crate::serial_println!("EXCEPTION: BREAKPOINT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn page_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: PageFaultErrorCode,
) {
    crate::serial_println!("[HALT] EXCEPTION: PAGE FAULT");
    crate::serial_println!("Accessed Address: {:?}", Cr2::read());
    crate::serial_println!("Error Code: {:?}", error_code);
    crate::serial_println!("{:#?}", stack_frame);
    hlt_loop();
}

extern "x86-interrupt" fn general_protection_handler(stack_frame: InterruptStackFrame, error_code: u64) {
    crate::serial_println!("[HALT] EXCEPTION: GENERAL PROTECTION ({:#x})\n{:#?}", error_code, stack_frame);
    hlt_loop();
}

extern "x86-interrupt" fn double_fault_handler(stack_frame: InterruptStackFrame, _error_code: u64) -> ! {
    crate::serial_println!("[HALT] EXCEPTION: DOUBLE FAULT\n{:#?}", stack_frame);
    hlt_loop();
}

/// Save every general-purpose register below the CPU frame, hand the frame
/// to `$handler`, then resume whatever the handler left in it.
///
/// Both gates switch to the trap IST stack, so the frame and the handler's
/// own frames never touch a process stack.
macro_rules! trap_stub {
    ($name:ident, $handler:ident) => {
        #[unsafe(naked)]
        extern "C" fn $name() -> ! {
            core::arch::naked_asm!(
                "push r15",
                "push r14",
                "push r13",
                "push r12",
                "push r11",
                "push r10",
                "push r9",
                "push r8",
                "push rbp",
                "push rdi",
                "push rsi",
                "push rdx",
                "push rcx",
                "push rbx",
                "push rax",
                // 5 CPU words + 15 pushes keep rsp 16-byte aligned
                "mov rdi, rsp",
                "call {handler}",
                "pop rax",
                "pop rbx",
                "pop rcx",
                "pop rdx",
                "pop rsi",
                "pop rdi",
                "pop rbp",
                "pop r8",
                "pop r9",
                "pop r10",
                "pop r11",
                "pop r12",
                "pop r13",
                "pop r14",
                "pop r15",
                "iretq",
                handler = sym $handler,
            );
        }
    };
}

trap_stub!(timer_entry, timer_trap);
trap_stub!(syscall_entry, syscall_trap);

extern "C" fn timer_trap(frame: &mut TrapFrame) {
    with_kernel(frame, |kernel, ctx| kernel.handle_irq(ctx, TIMER_VECTOR as u32));
}

extern "C" fn syscall_trap(frame: &mut TrapFrame) {
    let id = frame.rax;
    with_kernel(frame, |kernel, ctx| kernel.handle_syscall(ctx, id));
}

fn with_kernel<F>(frame: &mut TrapFrame, handler: F)
where
    F: FnOnce(&mut super::PcKernel, &mut ExecutionContext) -> Result<(), ProcessError>,
{
    let mut ctx = frame.to_context();
    let result = match KERNEL.lock().as_mut() {
        Some(kernel) => handler(kernel, &mut ctx),
        None => Ok(()),
    };
    if let Err(err) = result {
        crate::serial_println!("[HALT] {}", err);
        hlt_loop();
    }
    frame.load_context(&ctx);
}

/// Leave the kernel for the first time, resuming `ctx` in ring 0.
pub fn enter_first(ctx: &ExecutionContext) -> ! {
    let cs = u64::from(CS::get_reg().0);
    let ss = u64::from(SS::get_reg().0);

    unsafe {
        asm!(
            // IRETQ frame: SS, RSP, RFLAGS, CS, RIP
            "push {ss}",
            "push {rsp}",
            "push {rflags}",
            "push {cs}",
            "push {rip}",
            "iretq",
            ss     = in(reg) ss,
            rsp    = in(reg) ctx.sp,
            rflags = in(reg) ctx.status,
            cs     = in(reg) cs,
            rip    = in(reg) ctx.pc,
            options(noreturn)
        );
    }
}
