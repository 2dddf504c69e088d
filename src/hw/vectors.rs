// Interrupt vector layout of the remapped 8259 pair

pub const PIC_1_OFFSET: u8 = 32;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// Line on the primary PIC the secondary cascades through
pub const CASCADE_LINE: u8 = 2;

/// An IRQ line on one of the two chained controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicLine {
    Primary(u8),
    Secondary(u8),
}

impl PicLine {
    /// The line that raises interrupt source `source`, if a PIC raises it.
    pub fn from_source(source: u32) -> Option<Self> {
        let vector = u8::try_from(source).ok()?;
        if (PIC_1_OFFSET..PIC_2_OFFSET).contains(&vector) {
            Some(PicLine::Primary(vector - PIC_1_OFFSET))
        } else if (PIC_2_OFFSET..PIC_2_OFFSET + 8).contains(&vector) {
            Some(PicLine::Secondary(vector - PIC_2_OFFSET))
        } else {
            None
        }
    }

    pub fn vector(self) -> u8 {
        match self {
            PicLine::Primary(line) => PIC_1_OFFSET + line,
            PicLine::Secondary(line) => PIC_2_OFFSET + line,
        }
    }
}
