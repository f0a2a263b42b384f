//! The SystemVerilog emitter: renders an elaborated, pass-pipelined
//! [`grh_ir::Netlist`] to a single text file (§4.9).

#![warn(missing_docs)]

pub mod classify;
pub mod errors;
pub mod expr;
pub mod json;
pub mod mask;
pub mod module;
pub mod sequential;
pub mod tokens;

use std::collections::HashSet;

use grh_diagnostics::DiagnosticSink;
use grh_ir::Netlist;

pub use json::render_json;
pub use module::render_module;

/// The outcome of an emission run.
pub struct EmitResult {
    /// `false` if any error-severity diagnostic was emitted; the text is
    /// still returned (whatever was flushed), but is not guaranteed
    /// parseable (§7 "Propagation policy").
    pub success: bool,
    /// The accumulated output text.
    pub text: String,
}

/// Picks a unique module name for `symbol`, preferring its alias (if any and
/// not already taken), falling back to the symbol text, uniquified with a
/// `_<suffix>` when it collides (§4.9 "Module selection and naming").
fn pick_module_name(base: &str, used: &mut HashSet<String>, sink: &DiagnosticSink) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}_{suffix}");
        if used.insert(candidate.clone()) {
            sink.emit(errors::name_collision(base, &candidate));
            return candidate;
        }
        suffix += 1;
    }
}

/// Renders every graph in `netlist` to a single SystemVerilog text, in
/// `graphOrder`. `top_override`, if non-empty, is validated against the
/// netlist's known graphs and reported via `sink` when a name is unknown;
/// it does not otherwise affect which graphs are emitted (every graph in
/// the netlist is emitted, §4.9 "Module selection and naming").
pub fn emit(netlist: &Netlist, top_override: &[String], sink: &DiagnosticSink) -> EmitResult {
    for name in top_override {
        let known = netlist
            .iter_in_emission_order()
            .any(|(symbol, _)| symbol.as_str() == name);
        if !known {
            sink.emit(errors::unknown_top(name));
        }
    }

    let mut used_names = HashSet::new();
    let mut text = String::new();
    let mut first = true;
    for (symbol, graph) in netlist.iter_in_emission_order() {
        let base = netlist.alias_for(symbol).unwrap_or(symbol.as_str());
        let module_name = pick_module_name(base, &mut used_names, sink);
        if !first {
            text.push('\n');
        }
        first = false;
        text.push_str(&render_module(graph, &module_name));
    }

    EmitResult {
        success: !sink.has_errors(),
        text,
    }
}
