//! Diagnostic codes and helper constructors for elaboration errors and warnings.
//!
//! Error codes `E100`-`E112` cover elaboration failures (unknown modules,
//! conflicting memo classification, unsupported constructs, cycles).
//! Warning codes `W100`-`W102` cover non-fatal issues (zero-width coercion,
//! inferred latches, width mismatches).

use grh_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use grh_source::Span;

/// Unrecognized or not-yet-supported AST construct.
pub const E_NOT_YET_IMPLEMENTED: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 100);
/// Unknown module referenced by an instance.
pub const E_UNKNOWN_MODULE: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 101);
/// A signal was driven both as a net and as a register.
pub const E_MEMO_CONFLICT: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 102);
/// Circular instantiation detected while elaborating a hierarchy.
pub const E_CIRCULAR_INSTANCE: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 103);
/// A reference to an undeclared signal or symbol.
pub const E_UNKNOWN_SIGNAL: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 104);
/// A for/foreach loop bound could not be resolved at elaboration time.
pub const E_DATA_DEPENDENT_BOUND: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 105);
/// An unresolved hierarchical reference remained after xmr-resolve would have run.
pub const E_UNRESOLVED_XMR: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 106);
/// Port count or name mismatch at an instantiation site.
pub const E_PORT_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 107);

/// A zero-width type was coerced to width 1.
pub const W_ZERO_WIDTH: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 100);
/// A combinational block with incomplete branch coverage inferred a latch.
pub const W_INFERRED_LATCH: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 101);
/// Operand widths were implicitly extended to match.
pub const W_WIDTH_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Elaboration, 102);

/// Diagnostic for an AST construct with no lowering implemented yet.
pub fn not_yet_implemented(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E_NOT_YET_IMPLEMENTED,
        format!("`{what}` is not yet supported by the elaborator"),
        span,
    )
}

/// Diagnostic for an instance whose target module cannot be found.
pub fn unknown_module(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E_UNKNOWN_MODULE, format!("unknown module `{name}`"), span)
        .with_help("check that the module is defined among the elaborated sources")
}

/// Diagnostic for a signal driven as both a net and a register.
pub fn memo_conflict(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E_MEMO_CONFLICT,
        format!("signal `{name}` is driven as both a net and a register"),
        span,
    )
    .with_note("this signal will not be memoized; later references to it are dropped")
}

/// Diagnostic for a circular instantiation chain.
pub fn circular_instance(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E_CIRCULAR_INSTANCE,
        format!("circular instantiation of module `{name}`"),
        span,
    )
}

/// Diagnostic for a reference to an undeclared signal.
pub fn unknown_signal(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E_UNKNOWN_SIGNAL, format!("unknown signal `{name}`"), span)
}

/// Diagnostic for a loop whose bound cannot be resolved at elaboration time.
pub fn data_dependent_bound(span: Span) -> Diagnostic {
    Diagnostic::error(
        E_DATA_DEPENDENT_BOUND,
        "loop bound is not a compile-time constant",
        span,
    )
}

/// Diagnostic for a port name/count mismatch at an instantiation site.
pub fn port_mismatch(instance: &str, port: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E_PORT_MISMATCH,
        format!("instance `{instance}` has no port named `{port}`"),
        span,
    )
}

/// Diagnostic for a zero-width type coerced to width 1.
pub fn zero_width_placeholder(span: Span) -> Diagnostic {
    Diagnostic::warning(W_ZERO_WIDTH, "zero-width type coerced to width 1", span)
}

/// Diagnostic for an inferred latch from incomplete branch coverage.
pub fn inferred_latch(signal: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W_INFERRED_LATCH,
        format!("incomplete branch coverage for `{signal}` infers a latch"),
        span,
    )
    .with_help("assign a default value before the conditional to avoid a latch")
}

/// Diagnostic for operands implicitly extended to a common width.
pub fn width_mismatch(lhs_width: u32, rhs_width: u32, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W_WIDTH_MISMATCH,
        format!("operand widths {lhs_width} and {rhs_width} differ; narrower operand is extended"),
        span,
    )
}

/// Diagnostic marking where a module was previously defined, attached to a
/// duplicate-definition error as a secondary label.
pub fn previously_defined_label(span: Span) -> Label {
    Label::secondary(span, "previously defined here")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_render_with_elaboration_prefix() {
        assert_eq!(format!("{E_UNKNOWN_MODULE}"), "E101");
        assert_eq!(format!("{E_CIRCULAR_INSTANCE}"), "E103");
    }

    #[test]
    fn warning_codes_share_number_space_with_errors() {
        let diag = zero_width_placeholder(Span::DUMMY);
        assert_eq!(format!("{}", diag.code), "E100");
    }
}
