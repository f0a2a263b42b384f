//! Per-module text assembly: declarations, instances, DPI, assigns, and
//! sequential blocks in the fixed order of §6 "Emitted SystemVerilog".

use std::collections::BTreeSet;

use grh_ir::{Graph, OperationKind, ValueId};

use crate::classify::{classify, DeclKind};
use crate::expr::{render_rhs, value_name};
use crate::sequential::{plan_sequential_groups, render_latch_write, render_memory_write, render_register_write};

/// Renders one module's full text, not including the trailing blank-line
/// separator between modules.
pub fn render_module(graph: &Graph, module_name: &str) -> String {
    let mut out = String::new();
    render_header(graph, module_name, &mut out);
    render_declarations(graph, &mut out);
    render_memories(graph, &mut out);
    render_instances(graph, &mut out);
    render_dpi_imports(graph, &mut out);
    render_assigns(graph, &mut out);
    render_latches(graph, &mut out);
    render_sequential_blocks(graph, &mut out);
    out.push_str("endmodule\n");
    out
}

fn port_decl_keyword(kind: DeclKind) -> &'static str {
    match kind {
        DeclKind::InputPort => "input",
        DeclKind::OutputPort => "output",
        DeclKind::OutputReg => "output reg",
        DeclKind::InoutPort => "inout",
        _ => "",
    }
}

fn width_suffix(graph: &Graph, value: ValueId) -> String {
    let width = graph.value(value).map(|v| v.width()).unwrap_or(1);
    if width <= 1 {
        String::new()
    } else {
        format!("[{}:0] ", width - 1)
    }
}

fn render_header(graph: &Graph, module_name: &str, out: &mut String) {
    let mut port_names = Vec::new();
    for p in graph.input_ports() {
        port_names.push(graph.resolve_symbol(p.name).to_string());
    }
    for p in graph.output_ports() {
        port_names.push(graph.resolve_symbol(p.name).to_string());
    }
    for p in graph.inout_ports() {
        port_names.push(graph.resolve_symbol(p.name).to_string());
    }
    out.push_str(&format!("module {module_name} (\n"));
    for (i, name) in port_names.iter().enumerate() {
        let sep = if i + 1 == port_names.len() { "" } else { "," };
        out.push_str(&format!("  {name}{sep}\n"));
    }
    out.push_str(");\n");

    for p in graph.input_ports() {
        let w = width_suffix(graph, p.value);
        out.push_str(&format!("  input {w}{};\n", graph.resolve_symbol(p.name)));
    }
    for p in graph.output_ports() {
        let kw = port_decl_keyword(classify(graph, p.value));
        let w = width_suffix(graph, p.value);
        out.push_str(&format!("  {kw} {w}{};\n", graph.resolve_symbol(p.name)));
    }
    for p in graph.inout_ports() {
        let w = width_suffix(graph, p.input);
        out.push_str(&format!("  inout {w}{};\n", graph.resolve_symbol(p.name)));
    }
}

fn render_declarations(graph: &Graph, out: &mut String) {
    let mut wires = Vec::new();
    let mut regs = Vec::new();
    let mut vars = Vec::new();
    for (id, _) in graph.values_in_order() {
        match classify(graph, id) {
            DeclKind::Wire => wires.push(id),
            DeclKind::Reg => regs.push(id),
            DeclKind::Variable => vars.push(id),
            _ => {}
        }
    }
    for v in wires {
        out.push_str(&format!("  wire {}{};\n", width_suffix(graph, v), value_name(graph, v)));
    }
    for v in regs {
        out.push_str(&format!("  reg {}{};\n", width_suffix(graph, v), value_name(graph, v)));
    }
    for v in vars {
        let keyword = match graph.value(v).map(|val| val.ty()) {
            Some(grh_ir::ValueType::Real) => "real",
            _ => "string",
        };
        out.push_str(&format!("  {keyword} {};\n", value_name(graph, v)));
    }
    for inout_p in graph.inout_ports() {
        out.push_str(&format!(
            "  wire {}_in, {}_out, {}_oe;\n",
            graph.resolve_symbol(inout_p.name),
            graph.resolve_symbol(inout_p.name),
            graph.resolve_symbol(inout_p.name)
        ));
        out.push_str(&format!(
            "  assign {} = {}_oe ? {}_out : 1'bz;\n",
            graph.resolve_symbol(inout_p.name),
            graph.resolve_symbol(inout_p.name),
            graph.resolve_symbol(inout_p.name)
        ));
        out.push_str(&format!(
            "  assign {}_in = {};\n",
            graph.resolve_symbol(inout_p.name),
            graph.resolve_symbol(inout_p.name)
        ));
    }
}

fn render_memories(graph: &Graph, out: &mut String) {
    for (_, op) in graph.operations_in_order() {
        if op.kind() != OperationKind::Memory {
            continue;
        }
        let Some(sym) = op.symbol() else { continue };
        let name = graph.resolve_symbol(sym);
        let width = op.attributes().get("width").and_then(|a| a.as_int()).unwrap_or(1);
        let row = op.attributes().get("row").and_then(|a| a.as_int()).unwrap_or(1);
        let w = if width > 1 { format!("[{}:0] ", width - 1) } else { String::new() };
        out.push_str(&format!("  reg {w}{name} [0:{}];\n", row - 1));
    }
}

fn render_instances(graph: &Graph, out: &mut String) {
    for (_, op) in graph.operations_in_order() {
        if !matches!(op.kind(), OperationKind::Instance | OperationKind::Blackbox) {
            continue;
        }
        let attrs = op.attributes();
        let module_name = attrs.get("moduleName").and_then(|a| a.as_str()).unwrap_or("<?>");
        let instance_name = attrs.get("instanceName").and_then(|a| a.as_str()).unwrap_or("<?>");
        let input_names = attrs.get("inputPortName").and_then(|a| a.as_vec_str()).unwrap_or(&[]);
        let output_names = attrs.get("outputPortName").and_then(|a| a.as_vec_str()).unwrap_or(&[]);
        let inout_names = attrs.get("inoutPortName").and_then(|a| a.as_vec_str()).unwrap_or(&[]);

        out.push_str(&format!("  {module_name} "));
        if op.kind() == OperationKind::Blackbox {
            let param_names = attrs.get("parameterNames").and_then(|a| a.as_vec_str());
            let param_values = attrs.get("parameterValues").and_then(|a| a.as_vec_str());
            if let (Some(names), Some(values)) = (param_names, param_values) {
                if !names.is_empty() {
                    let params: Vec<String> = names
                        .iter()
                        .zip(values.iter())
                        .map(|(n, v)| format!(".{n}({v})"))
                        .collect();
                    out.push_str(&format!("#(\n    {}\n  ) ", params.join(",\n    ")));
                }
            }
        }
        out.push_str(&format!("{instance_name} (\n"));

        let operands = op.operands();
        let results = op.results();
        let n_in = input_names.len();
        let n_inout = inout_names.len();
        let mut lines = Vec::new();
        for (i, name) in input_names.iter().enumerate() {
            if let Some(&v) = operands.get(i) {
                lines.push(format!(".{name}({})", value_name(graph, v)));
            }
        }
        for (i, name) in inout_names.iter().enumerate() {
            if let Some(&v) = operands.get(n_in + i) {
                lines.push(format!(".{name}({})", value_name(graph, v)));
            }
        }
        for (i, name) in output_names.iter().enumerate() {
            if let Some(&v) = results.get(i) {
                lines.push(format!(".{name}({})", value_name(graph, v)));
            }
        }
        let _ = n_inout;
        out.push_str(&lines.iter().map(|l| format!("    {l}")).collect::<Vec<_>>().join(",\n"));
        out.push_str("\n  );\n");
    }
}

fn render_dpi_imports(graph: &Graph, out: &mut String) {
    for (_, op) in graph.operations_in_order() {
        if op.kind() != OperationKind::DpicImport {
            continue;
        }
        let attrs = op.attributes();
        let Some(sym) = op.symbol() else { continue };
        let name = graph.resolve_symbol(sym);
        let has_return = attrs.get("hasReturn").and_then(|a| a.as_bool()).unwrap_or(false);
        let ret_ty = if has_return {
            let w = attrs.get("returnWidth").and_then(|a| a.as_int()).unwrap_or(1);
            if w > 1 { format!("logic [{}:0] ", w - 1) } else { "bit ".to_string() }
        } else {
            "void ".to_string()
        };
        let arg_names = attrs.get("argsName").and_then(|a| a.as_vec_str()).unwrap_or(&[]);
        let arg_dirs = attrs.get("argsDirection").and_then(|a| a.as_vec_str()).unwrap_or(&[]);
        let arg_widths = attrs.get("argsWidth").and_then(|a| a.as_vec_int()).unwrap_or(&[]);
        let args: Vec<String> = arg_names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let dir = arg_dirs.get(i).map(String::as_str).unwrap_or("input");
                let w = arg_widths.get(i).copied().unwrap_or(1);
                let ty = if w > 1 { format!("logic [{}:0]", w - 1) } else { "bit".to_string() };
                format!("{dir} {ty} {n}")
            })
            .collect();
        out.push_str(&format!(
            "  import \"DPI-C\" function {ret_ty}{name} ({});\n",
            args.join(", ")
        ));
    }
}

fn render_assigns(graph: &Graph, out: &mut String) {
    let port_binding: BTreeSet<ValueId> = graph
        .output_ports()
        .iter()
        .map(|p| p.value)
        .chain(graph.input_ports().iter().map(|p| p.value))
        .collect();

    let mut port_assigns = Vec::new();
    let mut other_assigns = Vec::new();
    for (_, op) in graph.operations_in_order() {
        let rendered = match op.kind() {
            OperationKind::MemoryReadPort => {
                let result = *op.results().first().unwrap_or(&ValueId::INVALID);
                let mem_name = op.attributes().get("memSymbol").and_then(|a| a.as_str()).unwrap_or("<?>");
                let addr = op.operands().first().copied();
                addr.map(|a| {
                    format!("  assign {} = {mem_name}[{}];\n", value_name(graph, result), value_name(graph, a))
                })
            }
            kind if is_combinational_producer(kind) => {
                let result = op.results().first().copied();
                result.and_then(|r| {
                    let width = graph.value(r).map(|v| v.width()).unwrap_or(1);
                    render_rhs(graph, op, width)
                        .map(|rhs| format!("  assign {} = {rhs};\n", value_name(graph, r)))
                })
            }
            _ => None,
        };
        let Some(line) = rendered else { continue };
        let is_port_binding = op
            .results()
            .first()
            .map(|r| port_binding.contains(r))
            .unwrap_or(false);
        if is_port_binding {
            port_assigns.push(line);
        } else {
            other_assigns.push(line);
        }
    }
    for l in port_assigns {
        out.push_str(&l);
    }
    for l in other_assigns {
        out.push_str(&l);
    }
}

fn is_combinational_producer(kind: OperationKind) -> bool {
    use OperationKind::*;
    matches!(
        kind,
        Constant
            | Assign
            | Concat
            | Replicate
            | SliceStatic
            | SliceDynamic
            | SliceArray
            | Mux
            | Add
            | Sub
            | Mul
            | Div
            | Mod
            | And
            | Or
            | Xor
            | Xnor
            | Not
            | LogicAnd
            | LogicOr
            | LogicNot
            | Shl
            | LShr
            | AShr
            | Eq
            | Ne
            | CaseEq
            | CaseNe
            | WildcardEq
            | WildcardNe
            | Lt
            | Le
            | Gt
            | Ge
            | ReduceAnd
            | ReduceOr
            | ReduceXor
            | ReduceNor
            | ReduceNand
            | ReduceXnor
    )
}

fn render_latches(graph: &Graph, out: &mut String) {
    for (_, op) in graph.operations_in_order() {
        if op.kind() != OperationKind::LatchWritePort {
            continue;
        }
        let (degenerate, body) = render_latch_write(graph, op);
        if body.is_empty() {
            continue;
        }
        if degenerate {
            out.push_str("  always_comb begin\n");
        } else {
            out.push_str("  always_latch begin\n");
        }
        for line in &body {
            out.push_str(&format!("    {line}\n"));
        }
        out.push_str("  end\n");
    }
}

fn render_sequential_blocks(graph: &Graph, out: &mut String) {
    for group in plan_sequential_groups(graph) {
        let mut body = Vec::new();
        for op_id in &group.ops {
            let Some(op) = graph.operation(*op_id) else { continue };
            let lines = match op.kind() {
                OperationKind::RegisterWritePort => render_register_write(graph, op),
                OperationKind::MemoryWritePort => render_memory_write(graph, op),
                _ => continue,
            };
            body.extend(lines);
        }
        if body.is_empty() {
            continue;
        }
        out.push_str(&format!("  always @({}) begin\n", group.sensitivity));
        for line in &body {
            out.push_str(&format!("    {line}\n"));
        }
        out.push_str("  end\n");
    }
}
