use std::io::{self, Write};

/// Line-oriented writer for SPIM assembly.
///
/// Labels start in column 0, everything else is indented.
pub struct AsmWriter<W: Write> {
    writer: W,
}

impl<W: Write> AsmWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_inst(&mut self, inst: &str, args: &[&str]) -> io::Result<()> {
        write!(self.writer, "    {}", inst)?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                write!(self.writer, ",")?;
            }
            write!(self.writer, " {}", arg)?;
        }
        writeln!(self.writer)
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.writer, "{}:", label)
    }

    pub fn write_directive(&mut self, directive: &str, args: &[&str]) -> io::Result<()> {
        write!(self.writer, "    .{}", directive)?;
        if !args.is_empty() {
            write!(self.writer, " {}", args.join(", "))?;
        }
        writeln!(self.writer)
    }

    /// `label: .directive args` on one line, for data definitions
    pub fn write_data(&mut self, label: &str, directive: &str, args: &[&str]) -> io::Result<()> {
        writeln!(self.writer, "{}: .{} {}", label, directive, args.join(", "))
    }

    pub fn write_comment(&mut self, comment: &str) -> io::Result<()> {
        writeln!(self.writer, "# {}", comment)
    }

    pub fn write_blank_line(&mut self) -> io::Result<()> {
        writeln!(self.writer)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
