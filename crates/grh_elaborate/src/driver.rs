//! Whole-design elaboration driver (§4): the recursive entry point that
//! composes the type flattener, the signal memo, the RHS/procedural
//! lowerers, DPI, and instance specialization into one [`Netlist`].
//!
//! Every other module in this crate operates on a single module body (or
//! a single expression/statement) and knows nothing about how those
//! pieces are sequenced; this module is the thing that actually walks an
//! [`AstModule`]'s declarations and body in order, classifies each
//! user-declared signal exactly once, and defers materializing its driver
//! until every writer has been seen.

use std::collections::HashMap;

use grh_ast::{
    AlwaysKind, AstDesign, AstEdge, AstExpr, AstItem, AstModule, AstStmt, AstType, Direction,
};
use grh_common::Ident;
use grh_diagnostics::DiagnosticSink;
use grh_ir::{AttributeValue, Graph, ModuleSymbol, Netlist, OperationKind, ValueId, ValueType};
use grh_source::Span;

use crate::context::ElaborationContext;
use crate::dpi::{self, DpiImportInfo};
use crate::errors;
use crate::flatten::{flatten_type, FlatField, FlatType};
use crate::hierarchy;
use crate::memo::{MemoKind, SignalMemo, SliceRecord, WriteBackMemo, WriteKey};
use crate::ops;
use crate::procedural::{is_clocked, write_key_for};
use crate::rhs::{self, RhsCtx, Scope};

/// Elaborates every module reachable from `design`'s declared top (or, if
/// none is declared, every module in the design, in declaration order)
/// into a [`Netlist`].
///
/// `resolve_ident` recovers the declared text of an [`Ident`] — the AST
/// carries only opaque interned handles, so the caller supplies whatever
/// string table produced them.
pub fn elaborate_design(
    design: &AstDesign,
    resolve_ident: &dyn Fn(Ident) -> String,
    sink: &DiagnosticSink,
) -> Netlist {
    let mut ctx = ElaborationContext::new(sink);
    let tops: Vec<Ident> = match design.top {
        Some(top) => vec![top],
        None => design.modules.iter().map(|m| m.name).collect(),
    };
    for top in tops {
        if ctx.check_cache(top, &[]).is_some() {
            continue;
        }
        let Some(module_def) = design.find_module(top) else {
            sink.emit(errors::unknown_module(&resolve_ident(top), Span::DUMMY));
            continue;
        };
        let symbol = ModuleSymbol::new(hierarchy::specialized_name(&resolve_ident(top), &[], resolve_ident));
        elaborate_module_into(module_def, &[], symbol.clone(), design, &mut ctx, resolve_ident);
        ctx.insert_cache(top, &[], symbol.clone());
        ctx.netlist.mark_top(symbol);
    }
    ctx.netlist
}

/// Elaborates one module specialization into a fresh [`Graph`] and inserts
/// it into `ctx.netlist`. This is the `elaborate_body` callback
/// [`hierarchy::elaborate_instance`] expects, and is also called directly
/// by [`elaborate_design`] for each declared top.
fn elaborate_module_into(
    module: &AstModule,
    params: &[(Ident, String)],
    symbol: ModuleSymbol,
    design: &AstDesign,
    ctx: &mut ElaborationContext,
    resolve_ident: &dyn Fn(Ident) -> String,
) {
    let mut graph = Graph::new();
    elaborate_module_body(module, params, design, &mut graph, ctx, resolve_ident);
    ctx.netlist.insert(symbol, graph);
}

/// Recursively expands `Generate` items in place, preserving declaration order.
fn flatten_items(items: &[AstItem], out: &mut Vec<&AstItem>) {
    for item in items {
        if let AstItem::Generate { body, .. } = item {
            flatten_items(body, out);
        } else {
            out.push(item);
        }
    }
}

fn one_field_flat(name_text: &str, width: u32, is_signed: bool) -> FlatType {
    FlatType {
        total_width: width,
        is_signed,
        fields: vec![FlatField {
            path: name_text.to_string(),
            msb: width.saturating_sub(1),
            lsb: 0,
            is_signed,
        }],
    }
}

fn all_ones_literal(width: u32) -> String {
    format!("{width}'b{}", "1".repeat(width as usize))
}

/// Builds a literal mask with exactly `[msb:lsb]` set, or an all-ones mask
/// if `range` is `None` or already spans the whole signal (the common case
/// of a writer that drives every bit, where a real range-based mask would
/// be indistinguishable from all-ones anyway).
fn mask_literal_for_range(width: u32, range: Option<(u32, u32)>) -> String {
    match range {
        Some((msb, lsb)) if !(msb == width.saturating_sub(1) && lsb == 0) => {
            let mut bits = vec!['0'; width as usize];
            for b in lsb..=msb {
                if (b as usize) < bits.len() {
                    bits[width as usize - 1 - b as usize] = '1';
                }
            }
            format!("{width}'b{}", bits.into_iter().collect::<String>())
        }
        _ => all_ones_literal(width),
    }
}

/// The per-element width of a declared array type, or `None` for a scalar
/// type, consulted to populate [`SignalMemo::set_array_element_width`] so
/// `rhs::convert`'s `Index` arm can size an `a[i]` read's `SliceArray`
/// correctly instead of assuming width 1.
fn array_element_width(ty: &AstType, name_text: &str, span: Span, sink: &DiagnosticSink) -> Option<u32> {
    match ty {
        AstType::PackedArray { element, .. } | AstType::UnpackedArray { element, .. } => {
            Some(flatten_type(element, name_text, span, sink).total_width)
        }
        _ => None,
    }
}

/// Per-module elaboration state threaded through the single forward pass
/// over declarations and body items.
struct ModuleState<'g> {
    graph: &'g mut Graph,
    scope: Scope,
    memo: SignalMemo,
    writeback: WriteBackMemo,
    widths: HashMap<Ident, u32>,
    /// Values already materialized for a port, keyed by declaring ident, so
    /// that a later decl/write for the same name reuses the port's own
    /// carrier instead of creating a second one.
    port_values: HashMap<Ident, ValueId>,
    /// Names classified so far, in first-classification order, so the
    /// finalization pass can revisit exactly the signals that were seen
    /// (`SignalMemo` itself is keyed, not ordered).
    classified: Vec<Ident>,
    /// For `Reg`-classified names: whether the writer was an
    /// `always_latch` (vs. a clocked `always_ff`), plus the edge list a
    /// clocked writer used (for the event operands and sensitivity key).
    reg_shape: HashMap<Ident, (bool, Vec<AstEdge>)>,
    dpi_imports: HashMap<Ident, DpiImportInfo>,
    /// Per-bit write-enable contributions to a declared memory's procedural
    /// write, accumulated the same way `writeback` accumulates data slices
    /// (§4.9, review of scenario §8.3's `be[i]` mask).
    enable_memo: WriteBackMemo,
    /// The first address expression seen for each memory's procedural write
    /// site (one memory write port is emitted per site, not per statement).
    mem_write_addr: HashMap<Ident, ValueId>,
    /// `(memory, write key)` pairs touched by a procedural write, visited by
    /// `finalize_memory_writes` once every process has been lowered.
    mem_write_sites: Vec<(Ident, WriteKey)>,
    /// The `(msb, lsb)` bounding range a process actually wrote for a
    /// register/net target, used to mask a partial write instead of
    /// assuming the process drives the signal's full width.
    write_ranges: HashMap<(Ident, WriteKey), (u32, u32)>,
}

/// Elaborates `module`'s ports, declarations, and body into `graph`.
fn elaborate_module_body(
    module: &AstModule,
    _params: &[(Ident, String)],
    design: &AstDesign,
    graph: &mut Graph,
    ctx: &mut ElaborationContext,
    resolve_ident: &dyn Fn(Ident) -> String,
) {
    let sink = ctx.sink;
    let mut st = ModuleState {
        graph,
        scope: Scope::new(),
        memo: SignalMemo::new(),
        writeback: WriteBackMemo::new(),
        widths: HashMap::new(),
        port_values: HashMap::new(),
        classified: Vec::new(),
        reg_shape: HashMap::new(),
        dpi_imports: HashMap::new(),
        enable_memo: WriteBackMemo::new(),
        mem_write_addr: HashMap::new(),
        mem_write_sites: Vec::new(),
        write_ranges: HashMap::new(),
    };

    for port in &module.ports {
        let name_text = resolve_ident(port.name);
        let flat = flatten_type(&port.ty, &name_text, port.span, sink);
        st.widths.insert(port.name, flat.total_width);
        let symbol = st.graph.intern(&name_text);
        match port.direction {
            Direction::In => {
                let Ok(v) = st.graph.create_value(symbol, flat.total_width, flat.is_signed, ValueType::Logic) else {
                    continue;
                };
                let _ = st.graph.add_input_port(symbol, v);
                st.scope.bind(port.name, v);
                st.port_values.insert(port.name, v);
            }
            Direction::Out => {
                let Ok(v) = st.graph.create_value(symbol, flat.total_width, flat.is_signed, ValueType::Logic) else {
                    continue;
                };
                let _ = st.graph.add_output_port(symbol, v);
                st.port_values.insert(port.name, v);
            }
            Direction::Inout => {
                let Ok(v) = st.graph.create_value(symbol, flat.total_width, flat.is_signed, ValueType::Logic) else {
                    continue;
                };
                // The AST carries no distinct driver/output-enable expression
                // for an inout leg, so the reader/driver/enable triple all
                // resolve to the same pin-level value (§9 open question:
                // inout modeling).
                let _ = st.graph.add_inout_port(symbol, v, v, v);
                st.scope.bind(port.name, v);
                st.port_values.insert(port.name, v);
            }
        }
    }

    let mut items: Vec<&AstItem> = Vec::new();
    flatten_items(&module.decls, &mut items);
    flatten_items(&module.body, &mut items);

    for item in &items {
        process_item(item, design, &mut st, ctx, resolve_ident);
    }

    finalize_signals(&mut st);
}

fn get_or_create_named_value(
    st: &mut ModuleState,
    name: Ident,
    name_text: &str,
    flat: &FlatType,
) -> ValueId {
    if let Some(&v) = st.port_values.get(&name) {
        return v;
    }
    let symbol = st.graph.intern(name_text);
    match st.graph.create_value(symbol, flat.total_width, flat.is_signed, ValueType::Logic) {
        Ok(v) => v,
        // A value with this name already exists under another role (e.g. a
        // second decl for the same signal); reuse it rather than erroring.
        Err(_) => st.graph.find_value_by_symbol(symbol).unwrap_or(ValueId::INVALID),
    }
}

fn ensure_classified_net(st: &mut ModuleState, name: Ident, name_text: &str, flat: FlatType, span: Span, sink: &DiagnosticSink) {
    if st.memo.get(name).is_some() || st.memo.is_conflicted(name) {
        return;
    }
    if !st.memo.classify(name, name_text, MemoKind::Net, flat.clone(), span, sink) {
        return;
    }
    st.widths.entry(name).or_insert(flat.total_width);
    let value = get_or_create_named_value(st, name, name_text, &flat);
    st.memo.set_carrier(name, Some(value), None);
    st.scope.bind(name, value);
    st.classified.push(name);
}

fn ensure_classified_reg(
    st: &mut ModuleState,
    name: Ident,
    name_text: &str,
    flat: FlatType,
    is_latch: bool,
    edges: &[AstEdge],
    span: Span,
    sink: &DiagnosticSink,
) {
    if st.memo.get(name).is_some() || st.memo.is_conflicted(name) {
        return;
    }
    if !st.memo.classify(name, name_text, MemoKind::Reg, flat.clone(), span, sink) {
        return;
    }
    st.widths.entry(name).or_insert(flat.total_width);
    let q_value = get_or_create_named_value(st, name, name_text, &flat);
    let state_kind = if is_latch { OperationKind::Latch } else { OperationKind::Register };
    let Ok(state_op) = st.graph.create_operation(state_kind, None) else { return };
    let attrs = st.graph.operation_mut(state_op).expect("just created").attributes_mut();
    attrs.insert("width".to_string(), AttributeValue::Int(flat.total_width as i64));
    attrs.insert("isSigned".to_string(), AttributeValue::Bool(flat.is_signed));
    if st.graph.add_result(state_op, q_value).is_err() {
        return;
    }
    st.memo.set_carrier(name, Some(q_value), Some(state_op));
    st.scope.bind(name, q_value);
    st.reg_shape.insert(name, (is_latch, edges.to_vec()));
    st.classified.push(name);
}

fn ensure_memory(
    st: &mut ModuleState,
    name: Ident,
    name_text: &str,
    elem_flat: FlatType,
    depth: u32,
    span: Span,
    sink: &DiagnosticSink,
) {
    if st.memo.get(name).is_some() || st.memo.is_conflicted(name) {
        return;
    }
    if !st.memo.classify(name, name_text, MemoKind::Mem, elem_flat.clone(), span, sink) {
        return;
    }
    st.widths.entry(name).or_insert(elem_flat.total_width);
    let symbol = st.graph.intern(name_text);
    let Ok(mem_op) = st.graph.create_operation(OperationKind::Memory, Some(symbol)) else {
        return;
    };
    let attrs = st.graph.operation_mut(mem_op).expect("just created").attributes_mut();
    attrs.insert("width".to_string(), AttributeValue::Int(elem_flat.total_width as i64));
    attrs.insert("row".to_string(), AttributeValue::Int(depth as i64));
    attrs.insert("isSigned".to_string(), AttributeValue::Bool(elem_flat.is_signed));
    st.memo.set_carrier(name, None, Some(mem_op));
    st.classified.push(name);
}

/// Collects every plain whole-signal (`Ref`) assignment target within a
/// procedural body, matching exactly the targets `procedural::lower_stmt`
/// itself is able to bind (it reports `not_yet_implemented` for any other
/// target shape, so there is nothing further to classify for those).
fn collect_assign_targets(stmt: &AstStmt, out: &mut Vec<Ident>) {
    match stmt {
        AstStmt::Assign { target, .. } => {
            if let AstExpr::Ref(name) = target {
                if !out.contains(name) {
                    out.push(*name);
                }
            }
        }
        AstStmt::If { then_branch, else_branch, .. } => {
            collect_assign_targets(then_branch, out);
            if let Some(e) = else_branch {
                collect_assign_targets(e, out);
            }
        }
        AstStmt::Case { arms, .. } => {
            for arm in arms {
                collect_assign_targets(&arm.body, out);
            }
        }
        AstStmt::Block(stmts) => {
            for s in stmts {
                collect_assign_targets(s, out);
            }
        }
        AstStmt::Foreach { body, .. } | AstStmt::For { body, .. } => collect_assign_targets(body, out),
        AstStmt::Break(_) | AstStmt::Continue(_) | AstStmt::Display { .. } | AstStmt::Assert { .. } | AstStmt::Finish(_) => {}
    }
}

/// Extracts a plain or part-selected continuous-assign target, using
/// `widths` for a `Ref`'s full span. Returns `None` (with a diagnostic
/// already emitted) for any other target shape, e.g. a dynamic index on a
/// non-memory signal.
fn write_target(target: &AstExpr, widths: &HashMap<Ident, u32>, sink: &DiagnosticSink) -> Option<(Ident, u32, u32)> {
    match target {
        AstExpr::Ref(name) => {
            let width = widths.get(name).copied().unwrap_or(1);
            Some((*name, width.saturating_sub(1), 0))
        }
        AstExpr::PartSelect { base, msb, lsb, span } => {
            let AstExpr::Ref(name) = base.as_ref() else {
                sink.emit(errors::not_yet_implemented("part-select of a non-reference target", *span));
                return None;
            };
            Some((*name, (*msb).max(0) as u32, (*lsb).max(0) as u32))
        }
        other => {
            sink.emit(errors::not_yet_implemented(
                "dynamic-index or concat continuous-assign target",
                other.span().unwrap_or(Span::DUMMY),
            ));
            None
        }
    }
}

fn memory_write_target(target: &AstExpr, memo: &SignalMemo) -> Option<(Ident, &AstExpr)> {
    let AstExpr::Index { base, index, .. } = target else { return None };
    let AstExpr::Ref(name) = base.as_ref() else { return None };
    if memo.get(*name).map(|e| e.kind) == Some(MemoKind::Mem) {
        Some((*name, index.as_ref()))
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn process_item(
    item: &AstItem,
    design: &AstDesign,
    st: &mut ModuleState,
    ctx: &mut ElaborationContext,
    resolve_ident: &dyn Fn(Ident) -> String,
) {
    let sink = ctx.sink;
    match item {
        AstItem::NetDecl { name, ty, span } => {
            let name_text = resolve_ident(*name);
            let flat = flatten_type(ty, &name_text, *span, sink);
            ensure_classified_net(st, *name, &name_text, flat, *span, sink);
            if let Some(width) = array_element_width(ty, &name_text, *span, sink) {
                st.memo.set_array_element_width(*name, width);
            }
        }
        AstItem::RegDecl { name, ty, span } => {
            let name_text = resolve_ident(*name);
            let flat = flatten_type(ty, &name_text, *span, sink);
            // A plain RegDecl carries no event list of its own; its real
            // shape is only known once a writer (Always item) is seen. We
            // still materialize the carrier now so forward references
            // resolve, and let whichever Always item is seen first settle
            // the register/latch distinction.
            ensure_classified_reg(st, *name, &name_text, flat, false, &[], *span, sink);
            if let Some(width) = array_element_width(ty, &name_text, *span, sink) {
                st.memo.set_array_element_width(*name, width);
            }
        }
        AstItem::MemDecl { name, element_ty, depth, span } => {
            let name_text = resolve_ident(*name);
            let flat = flatten_type(element_ty, &name_text, *span, sink);
            ensure_memory(st, *name, &name_text, flat, *depth, *span, sink);
        }
        AstItem::DpiImport { name, arg_directions, arg_types: _, return_type, span, .. } => {
            if let Some(op) = dpi::lower_import(item, st.graph, sink) {
                let return_width = return_type
                    .as_ref()
                    .map(|ty| flatten_type(ty, "return", *span, sink).total_width)
                    .unwrap_or(0);
                st.dpi_imports.insert(
                    *name,
                    DpiImportInfo {
                        op,
                        return_width,
                        arg_directions: arg_directions.clone(),
                    },
                );
            }
        }
        AstItem::ContinuousAssign { target, value, span } => {
            process_continuous_assign(target, value, *span, st, sink);
        }
        AstItem::Always { kind, edges, body, .. } => {
            process_always(*kind, edges, body, st, sink);
        }
        AstItem::Instance { .. } => {
            let sink_copy = ctx.sink;
            hierarchy::elaborate_instance(
                item,
                st.graph,
                &st.scope,
                design,
                ctx,
                resolve_ident,
                &mut |module_def, params, symbol, ctx| {
                    elaborate_module_into(module_def, params, symbol, design, ctx, resolve_ident);
                },
                sink_copy,
            );
        }
        AstItem::Generate { .. } => unreachable!("flattened before processing"),
    }
}

fn process_continuous_assign(target: &AstExpr, value: &AstExpr, span: Span, st: &mut ModuleState, sink: &DiagnosticSink) {
    let cx = RhsCtx {
        dpi_imports: Some(&st.dpi_imports),
        memo: Some(&st.memo),
    };
    let rhs_value = match value {
        AstExpr::DpiCall { target: import_name, args, span } => {
            let Some(info) = st.dpi_imports.get(import_name).cloned() else {
                sink.emit(errors::not_yet_implemented("DPI call to an unknown import", *span));
                return;
            };
            let one = ops::emit_constant(st.graph, 1, false, "1'b1");
            dpi::lower_call(info.op, info.return_width, args, one, st.graph, &st.scope, &cx, sink)
        }
        _ => rhs::convert(value, st.graph, &st.scope, &cx, sink),
    };
    let Some(rhs_value) = rhs_value else { return };

    if let Some((mem_name, index_expr)) = memory_write_target(target, &st.memo) {
        let Some(addr) = rhs::convert(index_expr, st.graph, &st.scope, &cx, sink) else { return };
        let Some(entry) = st.memo.get(mem_name).cloned() else { return };
        let Some(mem_op) = entry.state_op else { return };
        let mem_symbol = st.graph.operation(mem_op).and_then(|op| op.symbol());
        let mem_name_text = mem_symbol.map(|s| st.graph.resolve_symbol(s).to_string()).unwrap_or_default();
        let one = ops::emit_constant(st.graph, 1, false, "1'b1");
        // A continuous assign's target grammar (`write_target`/
        // `memory_write_target`) admits no partial-write shape into a
        // memory row, so this write always drives every bit.
        let mask = ops::emit_constant(st.graph, entry.flat.total_width, false, &all_ones_literal(entry.flat.total_width));
        let Ok(op) = st.graph.create_operation(OperationKind::MemoryWritePort, None) else { return };
        let _ = st.graph.add_operand(op, one);
        let _ = st.graph.add_operand(op, addr);
        let _ = st.graph.add_operand(op, rhs_value);
        let _ = st.graph.add_operand(op, mask);
        st.graph
            .operation_mut(op)
            .expect("just created")
            .attributes_mut()
            .insert("memSymbol".to_string(), AttributeValue::Str(mem_name_text));
        return;
    }

    let Some((name, msb, lsb)) = write_target(target, &st.widths, sink) else { return };
    if st.memo.get(name).is_none() && !st.memo.is_conflicted(name) {
        let width = msb.max(lsb) + 1;
        let flat = one_field_flat(&format!("%{}", name.as_raw()), width, false);
        ensure_classified_net(st, name, &flat.fields[0].path.clone(), flat, span, sink);
    }
    if st.memo.get(name).map(|e| e.kind) != Some(MemoKind::Net) {
        return;
    }
    st.writeback.record(name, WriteKey::Continuous, SliceRecord { msb, lsb, source: rhs_value });
}

fn process_always(kind: AlwaysKind, edges: &[AstEdge], body: &AstStmt, st: &mut ModuleState, sink: &DiagnosticSink) {
    let mut targets = Vec::new();
    collect_assign_targets(body, &mut targets);
    let reg_like = matches!(kind, AlwaysKind::Latch) || (kind == AlwaysKind::Ff && is_clocked(edges));
    for name in &targets {
        if st.memo.get(*name).is_some() || st.memo.is_conflicted(*name) {
            continue;
        }
        let name_text = format!("%{}", name.as_raw());
        let width = st.widths.get(name).copied().unwrap_or(1);
        let flat = one_field_flat(&name_text, width, false);
        if reg_like {
            ensure_classified_reg(st, *name, &name_text, flat, matches!(kind, AlwaysKind::Latch), edges, Span::DUMMY, sink);
        } else {
            ensure_classified_net(st, *name, &name_text, flat, Span::DUMMY, sink);
        }
    }
    let widths = st.widths.clone();
    let widths_fn = move |n: Ident| widths.get(&n).copied().unwrap_or(1);
    let cx = RhsCtx {
        dpi_imports: Some(&st.dpi_imports),
        memo: Some(&st.memo),
    };
    let key = write_key_for(edges);
    let ranges = crate::procedural::lower_always(
        kind,
        edges,
        body,
        &st.scope,
        &widths_fn,
        st.graph,
        &mut st.writeback,
        &mut st.enable_memo,
        &mut st.mem_write_addr,
        &mut st.mem_write_sites,
        &cx,
        sink,
    );
    for (name, range) in ranges {
        st.write_ranges.insert((name, key.clone()), range);
    }
}

fn finalize_signals(st: &mut ModuleState) {
    let names = st.classified.clone();
    for name in names {
        let Some(entry) = st.memo.get(name).cloned() else { continue };
        match entry.kind {
            MemoKind::Net => {
                let Some(value) = entry.value else { continue };
                if st.graph.value(value).and_then(|v| v.defining_op()).is_some() {
                    continue;
                }
                let Some(driver) =
                    st.writeback.finalize(name, &WriteKey::Continuous, entry.flat.total_width, st.graph)
                else {
                    continue;
                };
                let Ok(op) = st.graph.create_operation(OperationKind::Assign, None) else { continue };
                let _ = st.graph.add_operand(op, driver);
                let _ = st.graph.add_result(op, value);
            }
            MemoKind::Reg => {
                let Some(q_value) = entry.value else { continue };
                let Some(state_op) = entry.state_op else { continue };
                let (is_latch, edges) = st.reg_shape.get(&name).cloned().unwrap_or((false, Vec::new()));
                let key = write_key_for(&edges);
                let Some(driver) = st.writeback.finalize(name, &key, entry.flat.total_width, st.graph) else {
                    continue;
                };
                let name_text = st
                    .graph
                    .value(q_value)
                    .map(|v| st.graph.resolve_symbol(v.symbol()).to_string())
                    .unwrap_or_default();
                let one = ops::emit_constant(st.graph, 1, false, "1'b1");
                let range = st.write_ranges.get(&(name, key.clone())).copied();
                let mask = ops::emit_constant(
                    st.graph,
                    entry.flat.total_width,
                    false,
                    &mask_literal_for_range(entry.flat.total_width, range),
                );
                let kind = if is_latch { OperationKind::LatchWritePort } else { OperationKind::RegisterWritePort };
                let Ok(op) = st.graph.create_operation(kind, None) else { continue };
                let _ = st.graph.add_operand(op, one);
                let _ = st.graph.add_operand(op, driver);
                let _ = st.graph.add_operand(op, mask);
                if !is_latch {
                    for edge in &edges {
                        if let Some(sig_value) = st.scope.lookup(edge.signal) {
                            let _ = st.graph.add_operand(op, sig_value);
                        }
                    }
                }
                let attrs = st.graph.operation_mut(op).expect("just created").attributes_mut();
                attrs.insert("regSymbol".to_string(), AttributeValue::Str(name_text));
                if !is_latch {
                    let tags: Vec<String> = edges
                        .iter()
                        .map(|e| match e.polarity {
                            grh_ast::EdgePolarity::Posedge => "posedge".to_string(),
                            grh_ast::EdgePolarity::Negedge => "negedge".to_string(),
                            grh_ast::EdgePolarity::Level => "level".to_string(),
                        })
                        .collect();
                    attrs.insert("eventEdge".to_string(), AttributeValue::VecStr(tags));
                }
                let _ = state_op;
            }
            MemoKind::Mem => {
                // A continuous write is materialized directly at its
                // `ContinuousAssign` site; a procedural write is finalized
                // below once every process has contributed to it.
            }
        }
    }
    finalize_memory_writes(st);
}

/// Emits the `MemoryWritePort` for each `(memory, write key)` site a
/// procedural process touched, combining that process's data/enable
/// contributions exactly the way a register's driver is combined (§4.9).
fn finalize_memory_writes(st: &mut ModuleState) {
    let sites = st.mem_write_sites.clone();
    for (mem_name, key) in sites {
        let Some(entry) = st.memo.get(mem_name).cloned() else { continue };
        if entry.kind != MemoKind::Mem {
            continue;
        }
        let Some(mem_op) = entry.state_op else { continue };
        let Some(&addr) = st.mem_write_addr.get(&mem_name) else { continue };
        let Some(data) = st.writeback.finalize(mem_name, &key, entry.flat.total_width, st.graph) else {
            continue;
        };
        let mask = st
            .enable_memo
            .finalize(mem_name, &key, entry.flat.total_width, st.graph)
            .unwrap_or_else(|| {
                ops::emit_constant(st.graph, entry.flat.total_width, false, &all_ones_literal(entry.flat.total_width))
            });
        let one = ops::emit_constant(st.graph, 1, false, "1'b1");
        let mem_symbol = st.graph.operation(mem_op).and_then(|op| op.symbol());
        let mem_name_text = mem_symbol.map(|s| st.graph.resolve_symbol(s).to_string()).unwrap_or_default();
        let Ok(op) = st.graph.create_operation(OperationKind::MemoryWritePort, None) else {
            continue;
        };
        let _ = st.graph.add_operand(op, one);
        let _ = st.graph.add_operand(op, addr);
        let _ = st.graph.add_operand(op, data);
        let _ = st.graph.add_operand(op, mask);
        st.graph
            .operation_mut(op)
            .expect("just created")
            .attributes_mut()
            .insert("memSymbol".to_string(), AttributeValue::Str(mem_name_text));
    }
}
