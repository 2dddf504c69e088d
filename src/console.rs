// Console output sink and diagnostic printing
use core::fmt;

/// A byte-oriented output device.
pub trait Console {
    fn put_byte(&mut self, byte: u8);

    fn put_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.put_byte(byte);
        }
    }
}

struct Writer<'a, C: Console + ?Sized>(&'a mut C);

impl<C: Console + ?Sized> fmt::Write for Writer<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_str(s);
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print<C: Console + ?Sized>(console: &mut C, args: fmt::Arguments) {
    use core::fmt::Write;
    // Writer never fails
    let _ = Writer(console).write_fmt(args);
}

/// Prints to the given console.
#[macro_export]
macro_rules! kprint {
    ($console:expr, $($arg:tt)*) => ($crate::console::_print($console, format_args!($($arg)*)));
}

/// Prints to the given console, appending a newline.
#[macro_export]
macro_rules! kprintln {
    ($console:expr) => ($crate::kprint!($console, "\n"));
    ($console:expr, $($arg:tt)*) => ($crate::kprint!($console, "{}\n", format_args!($($arg)*)));
}
