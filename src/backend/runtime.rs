//! Hand-written assembly every program is linked with.

use std::io::{self, Write};

use crate::backend::asm_writer::AsmWriter;

/// Label SPIM jumps to on start-up
pub const ENTRY_LABEL: &str = "main";

// `.` cannot occur in a g2 identifier, so no `_name` label can clash with this
const NEWLINE_LABEL: &str = "_rt.nl";

/// Writes `_println` and the start-up stub that jumps to the program's
/// `main` function.
///
/// `_println` follows the normal calling convention: its single argument
/// is the word on top of the stack and the caller pops it.
pub fn write_preamble<W: Write>(asm: &mut AsmWriter<W>) -> io::Result<()> {
    asm.write_comment("runtime: println")?;
    asm.write_directive("data", &[])?;
    asm.write_directive("align", &["2"])?;
    asm.write_data(NEWLINE_LABEL, "asciiz", &["\"\\n\""])?;
    asm.write_directive("text", &[])?;
    asm.write_directive("align", &["2"])?;
    asm.write_label("_println")?;
    // print_int
    asm.write_inst("li", &["$v0", "1"])?;
    asm.write_inst("lw", &["$a0", "0($sp)"])?;
    asm.write_inst("syscall", &[])?;
    // print_string
    asm.write_inst("li", &["$v0", "4"])?;
    asm.write_inst("la", &["$a0", NEWLINE_LABEL])?;
    asm.write_inst("syscall", &[])?;
    asm.write_inst("jr", &["$ra"])?;
    asm.write_blank_line()?;

    asm.write_comment("entry point")?;
    asm.write_directive("text", &[])?;
    asm.write_directive("align", &["2"])?;
    asm.write_label(ENTRY_LABEL)?;
    asm.write_inst("j", &["_main"])?;
    asm.write_blank_line()
}
