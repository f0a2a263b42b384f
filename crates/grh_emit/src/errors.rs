//! Diagnostic codes for the SystemVerilog emitter.

use grh_diagnostics::{Category, Diagnostic, DiagnosticCode};
use grh_source::Span;

/// A name collision was resolved by uniquification.
pub const M_NAME_COLLISION: DiagnosticCode = DiagnosticCode::new(Category::Emission, 100);
/// A requested top graph does not exist in the netlist.
pub const M_UNKNOWN_TOP: DiagnosticCode = DiagnosticCode::new(Category::Emission, 101);
/// Writing the output file failed.
pub const M_IO_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Emission, 102);
/// A concat or replicate's bit-sum overflowed its target and was captured
/// into a `__concat_tmp_N` temporary.
pub const M_CONCAT_OVERFLOW: DiagnosticCode = DiagnosticCode::new(Category::Emission, 103);

/// Diagnostic noting that `original` collided with an already-used module
/// name and was renamed to `renamed`.
pub fn name_collision(original: &str, renamed: &str) -> Diagnostic {
    Diagnostic::warning(
        M_NAME_COLLISION,
        format!("module name `{original}` collided with an existing module; renamed to `{renamed}`"),
        Span::DUMMY,
    )
}

/// Diagnostic for a `--top` override naming a graph absent from the netlist.
pub fn unknown_top(name: &str) -> Diagnostic {
    Diagnostic::error(M_UNKNOWN_TOP, format!("unknown top module `{name}`"), Span::DUMMY)
}

/// Diagnostic for a filesystem failure while writing emitted output.
pub fn io_error(path: &str, reason: &str) -> Diagnostic {
    Diagnostic::error(M_IO_ERROR, format!("failed to write `{path}`: {reason}"), Span::DUMMY)
}
