// Chained 8259 interrupt controllers
use pic8259::ChainedPics;
use x86_64::instructions::port::Port;

use super::vectors::{PicLine, CASCADE_LINE, PIC_1_OFFSET, PIC_2_OFFSET};
use crate::devices::InterruptController;

const PIC_1_DATA: u16 = 0x21;
const PIC_2_DATA: u16 = 0xA1;

pub static PICS: spin::Mutex<ChainedPics> =
    spin::Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

/// Remap both PICs and mask every line.
pub fn init() {
    let mut pics = PICS.lock();
    unsafe {
        pics.initialize();
        Port::<u8>::new(PIC_1_DATA).write(0xFF);
        Port::<u8>::new(PIC_2_DATA).write(0xFF);
    }
}

fn unmask(port: u16, line: u8) {
    let mut data = Port::<u8>::new(port);
    unsafe {
        let mask: u8 = data.read();
        data.write(mask & !(1 << line));
    }
}

pub struct Pic;

impl InterruptController for Pic {
    fn enable(&mut self, source: u32) {
        match PicLine::from_source(source) {
            Some(PicLine::Primary(line)) => unmask(PIC_1_DATA, line),
            Some(PicLine::Secondary(line)) => {
                unmask(PIC_1_DATA, CASCADE_LINE);
                unmask(PIC_2_DATA, line);
            }
            None => {}
        }
    }

    fn end_of_interrupt(&mut self, source: u32) {
        if let Some(line) = PicLine::from_source(source) {
            unsafe {
                PICS.lock().notify_end_of_interrupt(line.vector());
            }
        }
    }
}
