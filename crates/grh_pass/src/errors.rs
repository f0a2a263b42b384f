//! Diagnostic codes for the pass pipeline.

use grh_diagnostics::{Category, Diagnostic, DiagnosticCode};
use grh_source::Span;

/// Per-pass wall-clock timing, reported at `Info` level.
pub const P_PASS_TIMING: DiagnosticCode = DiagnosticCode::new(Category::Pass, 100);
/// An unresolved XMR remained after `xmr-resolve` ran.
pub const P_UNRESOLVED_XMR: DiagnosticCode = DiagnosticCode::new(Category::Pass, 101);
/// A memory's `init*` attribute vectors failed validation.
pub const P_BAD_MEMORY_INIT: DiagnosticCode = DiagnosticCode::new(Category::Pass, 102);
/// Read-only per-op-kind counts emitted by the `stats` pass.
pub const P_STATS: DiagnosticCode = DiagnosticCode::new(Category::Pass, 103);

/// Diagnostic reporting how long a pass took to run.
pub fn pass_timing(pass_id: &str, millis: u128) -> Diagnostic {
    Diagnostic::info(
        P_PASS_TIMING,
        format!("pass `{pass_id}` completed in {millis}ms"),
        Span::DUMMY,
    )
}

/// Diagnostic for an XMR left unresolved after `xmr-resolve`.
pub fn unresolved_xmr(graph: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        P_UNRESOLVED_XMR,
        format!("unresolved hierarchical reference remains in graph `{graph}`"),
        span,
    )
}

/// Diagnostic for a malformed memory initializer.
pub fn bad_memory_init(memory: &str, reason: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        P_BAD_MEMORY_INIT,
        format!("memory `{memory}` has an invalid initializer: {reason}"),
        span,
    )
}

/// Diagnostic carrying the per-op-kind counts the `stats` pass collected.
pub fn stats_summary(summary: &str) -> Diagnostic {
    Diagnostic::info(P_STATS, summary, Span::DUMMY)
}
