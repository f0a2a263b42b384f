//! The [`Pass`] trait and its execution context (§4.8).

use grh_diagnostics::DiagnosticSink;
use grh_ir::Netlist;

/// Mutable state handed to a pass for the duration of one `run()` call.
pub struct PassContext<'a> {
    /// The netlist under transformation.
    pub netlist: &'a mut Netlist,
    /// The diagnostic sink passes report into.
    pub sink: &'a DiagnosticSink,
}

/// The outcome of running one pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PassResult {
    /// Whether the pass mutated the netlist.
    pub changed: bool,
    /// Whether the pass encountered a failure it could not recover from.
    pub failed: bool,
}

impl PassResult {
    /// A result indicating no change and no failure.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// A result indicating the netlist was mutated.
    pub fn changed() -> Self {
        Self {
            changed: true,
            failed: false,
        }
    }

    /// A result indicating the pass failed.
    pub fn failure() -> Self {
        Self {
            changed: false,
            failed: true,
        }
    }
}

/// A single, independently identifiable transformation or analysis over a [`Netlist`].
///
/// Passes are stored as owning trait objects in [`crate::manager::PassManager`];
/// identity is carried by `id()`, never by downcasting or RTTI.
pub trait Pass {
    /// A short, stable identifier used by `--pass`/`--no-pass` and logs.
    fn id(&self) -> &str;

    /// A human-readable name.
    fn name(&self) -> &str;

    /// A one-line description of what the pass does.
    fn description(&self) -> &str;

    /// Runs the pass over every graph in `ctx.netlist`.
    fn run(&self, ctx: &mut PassContext) -> PassResult;
}
