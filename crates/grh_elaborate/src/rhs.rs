//! RHS expression-to-GRH-subgraph converter (§4.4).
//!
//! Walks an already-bound [`AstExpr`] and emits the `Operation`/`Value` chain
//! computing it, returning the [`ValueId`] holding the result. Signal
//! references are resolved through a caller-supplied [`Scope`] rather than
//! baked into this module, so the same converter serves continuous assigns,
//! procedural RHSes, and DPI argument lowering alike.

use std::collections::HashMap;

use grh_ast::{AstExpr, BinaryOp, UnaryOp};
use grh_common::Ident;
use grh_diagnostics::DiagnosticSink;
use grh_ir::{Graph, OperationKind, ValueId, ValueType};
use grh_source::Span;

use crate::dpi::{self, DpiImportInfo};
use crate::errors;
use crate::memo::{MemoKind, SignalMemo};
use crate::ops;

/// Read-only context `convert` needs beyond the signal [`Scope`]: the DPI
/// import table (to lower a [`AstExpr::DpiCall`] met in expression position)
/// and the signal memo (to tell a memory-backed array base apart from an
/// ordinary vector when lowering `a[i]`).
///
/// Both fields are `Option` so the unit tests below, and any other caller
/// with no DPI imports or memory declarations in scope, can pass an empty
/// context without constructing throwaway tables.
#[derive(Default)]
pub struct RhsCtx<'a> {
    pub dpi_imports: Option<&'a HashMap<Ident, DpiImportInfo>>,
    pub memo: Option<&'a SignalMemo>,
}

/// Maps already-elaborated signal names to their current driving value.
///
/// Procedural lowering mutates its own scope as it processes sequential
/// statements (last-write-wins); continuous-assign lowering uses one fixed
/// for the whole RHS.
#[derive(Default, Clone)]
pub struct Scope {
    bindings: HashMap<Ident, ValueId>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, overwriting any previous binding.
    pub fn bind(&mut self, name: Ident, value: ValueId) {
        self.bindings.insert(name, value);
    }

    /// Looks up the current binding for `name`.
    pub fn lookup(&self, name: Ident) -> Option<ValueId> {
        self.bindings.get(&name).copied()
    }

    /// Iterates every current binding.
    pub fn bindings_iter(&self) -> impl Iterator<Item = (&Ident, &ValueId)> {
        self.bindings.iter()
    }
}

/// Converts `expr` into a GRH subgraph within `graph`, returning the value
/// holding its result, or `None` if a diagnostic was emitted instead
/// (unknown signal, unresolvable index, etc).
pub fn convert(
    expr: &AstExpr,
    graph: &mut Graph,
    scope: &Scope,
    cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> Option<ValueId> {
    match expr {
        AstExpr::Ref(name) => match scope.lookup(*name) {
            Some(v) => Some(v),
            None => {
                sink.emit(errors::unknown_signal(&format!("%{}", name.as_raw()), Span::DUMMY));
                None
            }
        },
        AstExpr::Const(text) => Some(convert_const(graph, text)),
        AstExpr::Unary { op, operand, .. } => convert_unary(*op, operand, graph, scope, cx, sink),
        AstExpr::Binary { op, lhs, rhs, .. } => convert_binary(*op, lhs, rhs, graph, scope, cx, sink),
        AstExpr::Ternary {
            cond,
            then_value,
            else_value,
            ..
        } => {
            let c = convert(cond, graph, scope, cx, sink)?;
            let t = convert(then_value, graph, scope, cx, sink)?;
            let e = convert(else_value, graph, scope, cx, sink)?;
            let width = graph.value(t)?.width().max(graph.value(e)?.width());
            let is_signed = graph.value(t)?.is_signed() && graph.value(e)?.is_signed();
            let result = ops::fresh_value(graph, "mux", width, is_signed);
            let op = graph.create_operation(OperationKind::Mux, None).ok()?;
            graph.add_operand(op, c).ok()?;
            graph.add_operand(op, t).ok()?;
            graph.add_operand(op, e).ok()?;
            graph.add_result(op, result).ok()?;
            Some(result)
        }
        AstExpr::Concat { parts, .. } => {
            let mut values = Vec::with_capacity(parts.len());
            for part in parts {
                values.push(convert(part, graph, scope, cx, sink)?);
            }
            Some(ops::emit_concat(graph, values))
        }
        AstExpr::Replicate { count, value, .. } => {
            let v = convert(value, graph, scope, cx, sink)?;
            if *count == 0 {
                return Some(ops::emit_zero(graph, 1));
            }
            let parts = std::iter::repeat(v).take(*count as usize).collect();
            Some(ops::emit_concat(graph, parts))
        }
        AstExpr::PartSelect { base, msb, lsb, span } => {
            let b = convert(base, graph, scope, cx, sink)?;
            let width = (*msb - *lsb + 1).max(0) as u32;
            let result = ops::fresh_value(graph, "slice", width, false);
            let op = graph.create_operation(OperationKind::SliceStatic, None).ok()?;
            graph.add_operand(op, b).ok()?;
            graph.add_result(op, result).ok()?;
            graph
                .operation_mut(op)?
                .attributes_mut()
                .insert("msb".to_string(), grh_ir::AttributeValue::Int(*msb));
            graph
                .operation_mut(op)?
                .attributes_mut()
                .insert("lsb".to_string(), grh_ir::AttributeValue::Int(*lsb));
            let _ = span;
            Some(result)
        }
        AstExpr::IndexedPartSelect {
            base,
            start,
            width,
            descending,
            ..
        } => {
            let b = convert(base, graph, scope, cx, sink)?;
            let s = convert(start, graph, scope, cx, sink)?;
            let result = ops::fresh_value(graph, "slice_dyn", *width, false);
            let op = graph.create_operation(OperationKind::SliceDynamic, None).ok()?;
            graph.add_operand(op, b).ok()?;
            graph.add_operand(op, s).ok()?;
            graph.add_result(op, result).ok()?;
            graph
                .operation_mut(op)?
                .attributes_mut()
                .insert("width".to_string(), grh_ir::AttributeValue::Int(*width as i64));
            graph.operation_mut(op)?.attributes_mut().insert(
                "descending".to_string(),
                grh_ir::AttributeValue::Bool(*descending),
            );
            Some(result)
        }
        AstExpr::Index { base, index, .. } => convert_index(base, index, graph, scope, cx, sink),
        AstExpr::HierRef { path, span } => {
            let result = ops::fresh_value(graph, "xmr", 1, false);
            let op = graph.create_operation(OperationKind::XMRRead, None).ok()?;
            graph.add_result(op, result).ok()?;
            let path_text = path
                .iter()
                .map(|i| format!("%{}", i.as_raw()))
                .collect::<Vec<_>>()
                .join(".");
            graph
                .operation_mut(op)?
                .attributes_mut()
                .insert("path".to_string(), grh_ir::AttributeValue::Str(path_text));
            let _ = span;
            Some(result)
        }
        AstExpr::DpiCall { target, args, span } => {
            let Some(imports) = cx.dpi_imports else {
                sink.emit(dpi::unresolved_dpi_call_diagnostic(*span));
                return None;
            };
            let Some(info) = imports.get(target) else {
                sink.emit(dpi::unresolved_dpi_call_diagnostic(*span));
                return None;
            };
            if info.arg_directions.iter().any(|d| !matches!(d, grh_ast::Direction::In)) {
                sink.emit(errors::not_yet_implemented(
                    "DPI call with an out/inout argument in expression position",
                    *span,
                ));
                return None;
            }
            let one = ops::emit_constant(graph, 1, false, "1'b1");
            dpi::lower_call(info.op, info.return_width, args, one, graph, scope, cx, sink)
        }
    }
}

/// Lowers `a[i]`: a memory/array-element read emits `MemoryReadPort` when
/// `base` names a declared memory (§4.9), and a width-correct `SliceArray`
/// when it names an ordinary array-typed net/reg whose element width was
/// recorded at classification time; any other base falls back to the
/// dynamic single-bit `SliceDynamic` (§4.4's plain bit-select reading).
fn convert_index(
    base: &AstExpr,
    index: &AstExpr,
    graph: &mut Graph,
    scope: &Scope,
    cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> Option<ValueId> {
    if let (AstExpr::Ref(name), Some(memo)) = (base, cx.memo) {
        if let Some(entry) = memo.get(*name) {
            if entry.kind == MemoKind::Mem {
                let Some(mem_op) = entry.state_op else { return None };
                let addr = convert(index, graph, scope, cx, sink)?;
                let enable = ops::emit_constant(graph, 1, false, "1'b1");
                let result = ops::fresh_value(graph, "mem_rd", entry.flat.total_width, entry.flat.is_signed);
                let op = graph.create_operation(OperationKind::MemoryReadPort, None).ok()?;
                graph.add_operand(op, addr).ok()?;
                graph.add_operand(op, enable).ok()?;
                graph.add_result(op, result).ok()?;
                let mem_symbol = graph.operation(mem_op)?.symbol()?;
                let mem_name_text = graph.resolve_symbol(mem_symbol).to_string();
                graph
                    .operation_mut(op)?
                    .attributes_mut()
                    .insert("memSymbol".to_string(), grh_ir::AttributeValue::Str(mem_name_text));
                return Some(result);
            }
            if let Some(elem_width) = entry.array_element_width {
                let b = convert(base, graph, scope, cx, sink)?;
                let i = convert(index, graph, scope, cx, sink)?;
                let result = ops::fresh_value(graph, "array_elem", elem_width, false);
                let op = graph.create_operation(OperationKind::SliceArray, None).ok()?;
                graph.add_operand(op, b).ok()?;
                graph.add_operand(op, i).ok()?;
                graph.add_result(op, result).ok()?;
                graph
                    .operation_mut(op)?
                    .attributes_mut()
                    .insert("width".to_string(), grh_ir::AttributeValue::Int(elem_width as i64));
                return Some(result);
            }
        }
    }
    let b = convert(base, graph, scope, cx, sink)?;
    let i = convert(index, graph, scope, cx, sink)?;
    let result = ops::fresh_value(graph, "index", 1, false);
    let op = graph.create_operation(OperationKind::SliceDynamic, None).ok()?;
    graph.add_operand(op, b).ok()?;
    graph.add_operand(op, i).ok()?;
    graph.add_result(op, result).ok()?;
    graph
        .operation_mut(op)?
        .attributes_mut()
        .insert("width".to_string(), grh_ir::AttributeValue::Int(1));
    Some(result)
}

fn convert_const(graph: &mut Graph, text: &str) -> ValueId {
    let width = parse_literal_width(text).unwrap_or(32);
    ops::emit_constant(graph, width, false, text)
}

/// Extracts the declared width from a sized literal (`8'hFF`), or `None` for
/// an unsized literal (`3`), which defaults to a 32-bit int per SV semantics.
fn parse_literal_width(text: &str) -> Option<u32> {
    let tick = text.find('\'')?;
    text[..tick].trim().parse().ok()
}

fn convert_unary(
    op: UnaryOp,
    operand: &AstExpr,
    graph: &mut Graph,
    scope: &Scope,
    cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> Option<ValueId> {
    let v = convert(operand, graph, scope, cx, sink)?;
    let operand_width = graph.value(v)?.width();
    let (kind, width) = match op {
        UnaryOp::Neg => (OperationKind::Sub, operand_width),
        UnaryOp::BitNot => (OperationKind::Not, operand_width),
        UnaryOp::LogicNot => (OperationKind::LogicNot, 1),
        UnaryOp::ReduceAnd => (OperationKind::ReduceAnd, 1),
        UnaryOp::ReduceOr => (OperationKind::ReduceOr, 1),
        UnaryOp::ReduceXor => (OperationKind::ReduceXor, 1),
        UnaryOp::ReduceNand => (OperationKind::ReduceNand, 1),
        UnaryOp::ReduceNor => (OperationKind::ReduceNor, 1),
        UnaryOp::ReduceXnor => (OperationKind::ReduceXnor, 1),
    };
    if op == UnaryOp::Neg {
        let zero = ops::emit_zero(graph, operand_width);
        let result = ops::fresh_value(graph, "neg", width, false);
        let gop = graph.create_operation(kind, None).ok()?;
        graph.add_operand(gop, zero).ok()?;
        graph.add_operand(gop, v).ok()?;
        graph.add_result(gop, result).ok()?;
        return Some(result);
    }
    let result = ops::fresh_value(graph, "unary", width, false);
    let gop = graph.create_operation(kind, None).ok()?;
    graph.add_operand(gop, v).ok()?;
    graph.add_result(gop, result).ok()?;
    Some(result)
}

fn convert_binary(
    op: BinaryOp,
    lhs: &AstExpr,
    rhs: &AstExpr,
    graph: &mut Graph,
    scope: &Scope,
    cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> Option<ValueId> {
    let l = convert(lhs, graph, scope, cx, sink)?;
    let r = convert(rhs, graph, scope, cx, sink)?;
    let lw = graph.value(l)?.width();
    let rw = graph.value(r)?.width();
    if lw != rw {
        sink.emit(errors::width_mismatch(lw, rw, Span::DUMMY));
    }
    let max_width = lw.max(rw);
    let (kind, width) = match op {
        BinaryOp::Add => (OperationKind::Add, max_width),
        BinaryOp::Sub => (OperationKind::Sub, max_width),
        BinaryOp::Mul => (OperationKind::Mul, max_width),
        BinaryOp::Div => (OperationKind::Div, max_width),
        BinaryOp::Mod => (OperationKind::Mod, max_width),
        BinaryOp::And => (OperationKind::And, max_width),
        BinaryOp::Or => (OperationKind::Or, max_width),
        BinaryOp::Xor => (OperationKind::Xor, max_width),
        BinaryOp::Xnor => (OperationKind::Xnor, max_width),
        BinaryOp::LogicAnd => (OperationKind::LogicAnd, 1),
        BinaryOp::LogicOr => (OperationKind::LogicOr, 1),
        BinaryOp::Shl => (OperationKind::Shl, lw),
        BinaryOp::LShr => (OperationKind::LShr, lw),
        BinaryOp::AShr => (OperationKind::AShr, lw),
        BinaryOp::Eq => (OperationKind::Eq, 1),
        BinaryOp::Ne => (OperationKind::Ne, 1),
        BinaryOp::CaseEq => (OperationKind::CaseEq, 1),
        BinaryOp::CaseNe => (OperationKind::CaseNe, 1),
        BinaryOp::WildcardEq => (OperationKind::WildcardEq, 1),
        BinaryOp::WildcardNe => (OperationKind::WildcardNe, 1),
        BinaryOp::Lt => (OperationKind::Lt, 1),
        BinaryOp::Le => (OperationKind::Le, 1),
        BinaryOp::Gt => (OperationKind::Gt, 1),
        BinaryOp::Ge => (OperationKind::Ge, 1),
    };
    let result = ops::fresh_value(graph, "bin", width, false);
    let gop = graph.create_operation(kind, None).ok()?;
    graph.add_operand(gop, l).ok()?;
    graph.add_operand(gop, r).ok()?;
    graph.add_result(gop, result).ok()?;
    Some(result)
}
