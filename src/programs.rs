// Fixed set of program images known at build time

/// A loadable program: a name and its entry address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Program {
    pub name: &'static str,
    pub entry: u64,
}

/// The images the console can `execute` by name.
#[derive(Debug, Clone, Copy)]
pub struct ProgramTable<'a> {
    programs: &'a [Program],
}

impl<'a> ProgramTable<'a> {
    pub const fn new(programs: &'a [Program]) -> Self {
        Self { programs }
    }

    /// Entry address for `name`, if it is a known program.
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.programs
            .iter()
            .find(|program| program.name == name)
            .map(|program| program.entry)
    }

    pub fn iter(&self) -> core::slice::Iter<'a, Program> {
        self.programs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAMS: &[Program] = &[
        Program { name: "P3", entry: 0x3000 },
        Program { name: "DP", entry: 0x9000 },
    ];

    #[test]
    fn lookup_by_exact_name() {
        let table = ProgramTable::new(PROGRAMS);
        assert_eq!(table.lookup("DP"), Some(0x9000));
        assert_eq!(table.lookup("dp"), None);
        assert_eq!(table.lookup("P4"), None);
    }
}
