//! [`PassManager`] — ordered pass execution with early-exit on error (§4.8).

use std::time::Instant;

use grh_diagnostics::DiagnosticSink;
use grh_ir::Netlist;

use crate::errors;
use crate::pass::{Pass, PassContext};

/// The outcome of running an entire pipeline.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PassManagerResult {
    /// `true` unless a pass failed or emitted an error-level diagnostic
    /// while `stop_on_error` was set.
    pub success: bool,
    /// Whether any pass in the pipeline reported a change.
    pub changed: bool,
}

/// Runs an ordered list of [`Pass`]es over a [`Netlist`].
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// Whether to stop the pipeline after the first pass failure or error diagnostic.
    pub stop_on_error: bool,
}

impl PassManager {
    /// Creates an empty pass manager; `stop_on_error` defaults to `true`.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            stop_on_error: true,
        }
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Removes every pass matching `id` from the pipeline.
    pub fn remove_pass(&mut self, id: &str) {
        self.passes.retain(|p| p.id() != id);
    }

    /// The pass ids in pipeline order.
    pub fn pass_ids(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.id()).collect()
    }

    /// Runs every pass in order, measuring wall time and reporting it at
    /// `Info` level via `sink`. Stops early if `stop_on_error` is set and a
    /// pass fails or the sink already carries an error.
    pub fn run(&self, netlist: &mut Netlist, sink: &DiagnosticSink) -> PassManagerResult {
        let mut any_failure = false;
        let mut any_changed = false;

        for pass in &self.passes {
            let start = Instant::now();
            let mut ctx = PassContext { netlist, sink };
            let result = pass.run(&mut ctx);
            let elapsed = start.elapsed().as_millis();
            sink.emit(errors::pass_timing(pass.id(), elapsed));

            any_changed |= result.changed;
            if result.failed {
                any_failure = true;
            }
            if self.stop_on_error && (result.failed || sink.has_errors()) {
                break;
            }
        }

        PassManagerResult {
            success: !any_failure && !sink.has_errors(),
            changed: any_changed,
        }
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
