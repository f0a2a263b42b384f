//! DPI import/call lowering (§4.6).
//!
//! A `DpiImport` AST item becomes a single `DpicImport` declaration
//! operation describing the function's signature. Each call site — whether
//! a statement-position task call or an expression-position function call
//! with a return value — becomes a `DpicCall` operation whose `updateCond`
//! operand is the enclosing process's current condition (or a constant 1
//! for an unconditional/continuous call site).

use grh_ast::{AstExpr, AstItem, Direction};
use grh_diagnostics::DiagnosticSink;
use grh_ir::{AttributeValue, Graph, OperationId, OperationKind, ValueId};
use grh_source::Span;

use crate::flatten::flatten_type;
use crate::ops;
use crate::rhs::{self, RhsCtx, Scope};

/// The signature table entry recorded for one `DpiImport` item: the
/// declaration operation it lowered to, its return width (`0` if the import
/// has no return value), and its argument directions, consulted by
/// `rhs::convert`'s `DpiCall` arm to reject a call taking an `out`/`inout`
/// argument in expression position.
#[derive(Clone, Debug)]
pub struct DpiImportInfo {
    pub op: OperationId,
    pub return_width: u32,
    pub arg_directions: Vec<Direction>,
}

/// Lowers a `DpiImport` item into a `DpicImport` declaration operation.
///
/// Returns `None` (and does nothing) if `item` is not a `DpiImport`.
pub fn lower_import(item: &AstItem, graph: &mut Graph, sink: &DiagnosticSink) -> Option<OperationId> {
    let AstItem::DpiImport {
        name,
        arg_names,
        arg_directions,
        arg_types,
        return_type,
        span,
    } = item
    else {
        return None;
    };
    let symbol = graph.intern(&format!("__dpi_{}", name.as_raw()));
    let op = graph.create_operation(OperationKind::DpicImport, Some(symbol)).ok()?;

    let mut arg_widths = Vec::with_capacity(arg_types.len());
    let mut arg_signed = Vec::with_capacity(arg_types.len());
    let mut dir_strings = Vec::with_capacity(arg_directions.len());
    let mut name_strings = Vec::with_capacity(arg_names.len());
    for (i, ty) in arg_types.iter().enumerate() {
        let flat = flatten_type(ty, &format!("arg{i}"), *span, sink);
        arg_widths.push(flat.total_width as i64);
        arg_signed.push(flat.is_signed);
        dir_strings.push(direction_text(arg_directions[i]).to_string());
        name_strings.push(format!("%{}", arg_names[i].as_raw()));
    }

    let attrs = graph.operation_mut(op)?.attributes_mut();
    attrs.insert("argsName".to_string(), AttributeValue::VecStr(name_strings));
    attrs.insert("argsDirection".to_string(), AttributeValue::VecStr(dir_strings));
    attrs.insert("argsWidth".to_string(), AttributeValue::VecInt(arg_widths));
    attrs.insert("argsSigned".to_string(), AttributeValue::VecBool(arg_signed));
    attrs.insert(
        "hasReturn".to_string(),
        AttributeValue::Bool(return_type.is_some()),
    );
    if let Some(ret_ty) = return_type {
        let flat = flatten_type(ret_ty, "return", *span, sink);
        attrs.insert(
            "returnWidth".to_string(),
            AttributeValue::Int(flat.total_width as i64),
        );
        attrs.insert("returnSigned".to_string(), AttributeValue::Bool(flat.is_signed));
    }
    Some(op)
}

fn direction_text(dir: Direction) -> &'static str {
    match dir {
        Direction::In => "in",
        Direction::Out => "out",
        Direction::Inout => "inout",
    }
}

/// Whether a DPI call site is eligible to be lowered as a pure inline
/// expression (no `DpicCall` operand wiring for condition/event) rather than
/// a full procedural call: the import has a return value, takes no `out`/
/// `inout` arguments, and the call appears outside any clocked process.
///
/// `in_clocked_process` must reflect whether the call textually occurs
/// inside a clocked `always_ff`/`always` body (§4.6 rule 2).
pub fn inline_return_eligible(import: &AstItem, in_clocked_process: bool) -> bool {
    let AstItem::DpiImport {
        arg_directions,
        return_type,
        ..
    } = import
    else {
        return false;
    };
    return_type.is_some()
        && !in_clocked_process
        && arg_directions
            .iter()
            .all(|d| matches!(d, Direction::In))
}

/// Lowers a DPI call expression into a `DpicCall` operation, returning the
/// value carrying its return (or `None` if the import has no return value
/// or a diagnostic was emitted for an argument).
#[allow(clippy::too_many_arguments)]
pub fn lower_call(
    target_import_op: OperationId,
    return_width: u32,
    args: &[AstExpr],
    update_cond: ValueId,
    graph: &mut Graph,
    scope: &Scope,
    cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> Option<ValueId> {
    let op = graph.create_operation(OperationKind::DpicCall, None).ok()?;
    graph.add_operand(op, update_cond).ok()?;
    for arg in args {
        let v = rhs::convert(arg, graph, scope, cx, sink)?;
        graph.add_operand(op, v).ok()?;
    }
    let target_symbol = graph.operation(target_import_op)?.symbol()?;
    let target_text = graph.resolve_symbol(target_symbol).to_string();
    graph
        .operation_mut(op)?
        .attributes_mut()
        .insert("targetImportSymbol".to_string(), AttributeValue::Str(target_text));
    graph
        .operation_mut(op)?
        .attributes_mut()
        .insert("hasReturn".to_string(), AttributeValue::Bool(true));

    let result = ops::fresh_value(graph, "dpi_ret", return_width, false);
    graph.add_result(op, result).ok()?;
    Some(result)
}

/// Fallback used by [`crate::rhs::convert`] when it meets a
/// [`AstExpr::DpiCall`] it cannot resolve on its own (it has no access to
/// the import table); callers that do have one should intercept the
/// expression before delegating to `rhs::convert` and call [`lower_call`]
/// directly instead.
pub fn unresolved_dpi_call_diagnostic(span: Span) -> grh_diagnostics::Diagnostic {
    crate::errors::not_yet_implemented("DPI call without a resolved import", span)
}
