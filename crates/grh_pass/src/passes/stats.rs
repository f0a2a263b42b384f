//! Read-only pass emitting per-op-kind counts via the log sink (§4.8).

use std::collections::BTreeMap;

use crate::errors;
use crate::pass::{Pass, PassContext, PassResult};

/// The stats pass. Never mutates the netlist.
pub struct Stats;

impl Pass for Stats {
    fn id(&self) -> &str {
        "stats"
    }

    fn name(&self) -> &str {
        "Statistics"
    }

    fn description(&self) -> &str {
        "reports per-op-kind counts across the whole netlist; never mutates"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (_, graph) in ctx.netlist.iter_in_emission_order() {
            for (_, op) in graph.operations_in_order() {
                *counts.entry(kind_name(op.kind())).or_insert(0) += 1;
            }
        }
        let summary = counts
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.sink.emit(errors::stats_summary(&summary));
        PassResult {
            changed: false,
            failed: false,
        }
    }
}

fn kind_name(kind: grh_ir::OperationKind) -> &'static str {
    use grh_ir::OperationKind::*;
    match kind {
        Constant => "Constant",
        Add => "Add",
        Sub => "Sub",
        Mul => "Mul",
        Div => "Div",
        Mod => "Mod",
        And => "And",
        Or => "Or",
        Xor => "Xor",
        Xnor => "Xnor",
        Not => "Not",
        LogicAnd => "LogicAnd",
        LogicOr => "LogicOr",
        LogicNot => "LogicNot",
        Shl => "Shl",
        LShr => "LShr",
        AShr => "AShr",
        Eq => "Eq",
        Ne => "Ne",
        CaseEq => "CaseEq",
        CaseNe => "CaseNe",
        WildcardEq => "WildcardEq",
        WildcardNe => "WildcardNe",
        Lt => "Lt",
        Le => "Le",
        Gt => "Gt",
        Ge => "Ge",
        ReduceAnd => "ReduceAnd",
        ReduceOr => "ReduceOr",
        ReduceXor => "ReduceXor",
        ReduceNor => "ReduceNor",
        ReduceNand => "ReduceNand",
        ReduceXnor => "ReduceXnor",
        Mux => "Mux",
        Assign => "Assign",
        Concat => "Concat",
        Replicate => "Replicate",
        SliceStatic => "SliceStatic",
        SliceDynamic => "SliceDynamic",
        SliceArray => "SliceArray",
        Register => "Register",
        Latch => "Latch",
        Memory => "Memory",
        RegisterReadPort => "RegisterReadPort",
        RegisterWritePort => "RegisterWritePort",
        LatchReadPort => "LatchReadPort",
        LatchWritePort => "LatchWritePort",
        MemoryReadPort => "MemoryReadPort",
        MemoryWritePort => "MemoryWritePort",
        Instance => "Instance",
        Blackbox => "Blackbox",
        Display => "Display",
        Assert => "Assert",
        SystemTask => "SystemTask",
        SystemFunction => "SystemFunction",
        DpicImport => "DpicImport",
        DpicCall => "DpicCall",
        XMRRead => "XMRRead",
        XMRWrite => "XMRWrite",
    }
}
