//! Procedural (`always*`) lowering (§4.5).
//!
//! The core technique is branch-merge-via-mux: each `if`/`case` arm is
//! lowered against its own copy of the running [`Scope`], and afterward
//! every signal the arms disagree on is combined with a `Mux` keyed on the
//! branch condition. A synchronous reset (`if (rst) q <= 0; else q <= d;`)
//! falls out of this mechanism for free — it is an ordinary two-arm `if`
//! whose `then` arm happens to be a constant; no special-casing is needed
//! here; downstream passes that want to recognize the reset shape do so by
//! pattern-matching the resulting `Mux` (§4.8 const-inline extension point).
//!
//! An `if` with no `else` inside a combinational process leaves the
//! pre-conditional value as the implicit "else", which synthesizes a level
//! latch; this module reports `W_INFERRED_LATCH` at that point rather than
//! silently doing so, matching external synthesis tool behavior.
//!
//! A second technique, orthogonal to the mux-merge above, handles `for`
//! loops and partial writes: an `if`/`for` whose condition is a compile-time
//! constant (§4.5 "For-loops with compile-time bounds are unrolled") is
//! resolved with a small constant-expression evaluator instead of emitting a
//! `Mux`, which is what lets a loop body's `break`/`continue` — statements
//! with no value-domain representation — actually terminate or skip an
//! unrolled iteration. Partial writes (`q[3:0] <= ...`, `mem[a][i] <= ...`)
//! are tracked per target as they're seen, so the final driver for a
//! register/net is masked to the bits actually written, and a memory's
//! procedural write gets a real per-bit enable rather than an all-ones mask.

use std::collections::HashMap;

use grh_ast::{AlwaysKind, AstEdge, AstExpr, AstStmt, BinaryOp, CaseArm, EdgePolarity, UnaryOp};
use grh_common::Ident;
use grh_diagnostics::DiagnosticSink;
use grh_ir::{Graph, OperationKind, ValueId};
use grh_source::Span;

use crate::errors;
use crate::memo::{MemoKind, SignalMemo, SliceRecord, WriteBackMemo, WriteKey};
use crate::ops;
use crate::rhs::{self, RhsCtx, Scope};

/// Builds the [`WriteKey`] a process's writes should be filed under.
///
/// `always_comb`/`always @*` processes and `always_latch` with only
/// level-sensitivity produce [`WriteKey::Continuous`]-shaped combinational
/// logic but are still kept distinct per declaring process via the edge
/// list (empty for pure comb), so two different comb processes writing
/// disjoint bits of the same signal don't collide.
pub fn write_key_for(edges: &[AstEdge]) -> WriteKey {
    if edges.is_empty() {
        return WriteKey::Continuous;
    }
    let tagged = edges
        .iter()
        .map(|e| {
            let tag = match e.polarity {
                EdgePolarity::Posedge => "posedge",
                EdgePolarity::Negedge => "negedge",
                EdgePolarity::Level => "level",
            };
            (tag.to_string(), e.signal)
        })
        .collect();
    WriteKey::Procedural(tagged)
}

/// Whether `edges` contains a clock edge, meaning this process is
/// sequential rather than combinational/latch.
pub fn is_clocked(edges: &[AstEdge]) -> bool {
    edges
        .iter()
        .any(|e| matches!(e.polarity, EdgePolarity::Posedge | EdgePolarity::Negedge))
}

/// A compile-time environment for genvar/loop-variable values, used to
/// resolve `for`/`if` conditions statically during unrolling.
type ConstEnv = HashMap<Ident, i64>;

/// How a lowered statement completed: fell through normally, or exited its
/// enclosing loop iteration via `break`/`continue`. Only meaningful while
/// unrolling a statically-bounded `for`/`foreach`; outside a loop a
/// `Break`/`Continue` is reported at the loop boundary that never ran.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
}

/// The per-call-site context `lower_stmt` needs beyond its scope/graph
/// arguments, bundled to keep the recursive signature manageable.
struct LowerCx<'a> {
    is_comb: bool,
    widths: &'a dyn Fn(Ident) -> u32,
    rhs: &'a RhsCtx<'a>,
}

/// Accumulates a procedural memory write's data/enable contributions as
/// they're seen, keyed by the enclosing process's [`WriteKey`] (mirroring
/// the register/net write-back memo, §4.9 "Memory ports").
struct MemWrites<'a> {
    data: &'a mut WriteBackMemo,
    mask: &'a mut WriteBackMemo,
    addrs: &'a mut HashMap<Ident, ValueId>,
    sites: &'a mut Vec<(Ident, WriteKey)>,
    key: WriteKey,
}

/// Lowers one `always*` process, writing the final per-target drivers into
/// `writeback` keyed by this process's [`WriteKey`], and returns the
/// `(msb, lsb)` bounding range actually written for each changed target
/// (used by the caller to mask a partial write instead of assuming the
/// process drives the signal's full width).
///
/// `initial` seeds the scope with each writable target's current value
/// (the register's own `Q` for a clocked process, or the net's prior
/// combinational driver, if any) so that branches which don't write a
/// target see its unchanged value rather than an unbound reference.
#[allow(clippy::too_many_arguments)]
pub fn lower_always(
    kind: AlwaysKind,
    edges: &[AstEdge],
    body: &AstStmt,
    initial: &Scope,
    widths: &dyn Fn(Ident) -> u32,
    graph: &mut Graph,
    writeback: &mut WriteBackMemo,
    mem_mask: &mut WriteBackMemo,
    mem_addrs: &mut HashMap<Ident, ValueId>,
    mem_sites: &mut Vec<(Ident, WriteKey)>,
    rhs_cx: &RhsCtx,
    sink: &DiagnosticSink,
) -> HashMap<Ident, (u32, u32)> {
    let is_comb = matches!(kind, AlwaysKind::Comb) || (!is_clocked(edges) && kind == AlwaysKind::Ff);
    let key = write_key_for(edges);
    let mut scope = initial.clone();
    let env = ConstEnv::new();
    let one = ops::emit_constant(graph, 1, false, "1'b1");
    let cx = LowerCx { is_comb, widths, rhs: rhs_cx };
    let mut written: HashMap<Ident, (u32, u32)> = HashMap::new();
    let mut mem = MemWrites { data: writeback, mask: mem_mask, addrs: mem_addrs, sites: mem_sites, key: key.clone() };
    let _ = lower_stmt(body, &mut scope, initial, &env, one, &cx, graph, &mut written, &mut mem, sink);

    for (&name, &value) in scope.bindings_iter() {
        if initial.lookup(name) == Some(value) {
            continue;
        }
        let width = widths(name);
        let (msb, lsb) = written.get(&name).copied().unwrap_or((width.saturating_sub(1), 0));
        let piece = if msb == width.saturating_sub(1) && lsb == 0 {
            value
        } else {
            ops::emit_slice_static(graph, value, msb, lsb)
        };
        writeback.record(name, key.clone(), SliceRecord { msb, lsb, source: piece });
    }
    written
}

/// Evaluates `expr` against `env`, returning `None` if it references
/// anything not resolvable at compile time (a signal not bound in `env`, a
/// division by zero, an unsupported reduction). Used both to resolve a
/// `for`/`if` condition statically and to step a loop's init/step assigns.
fn eval_const_expr(expr: &AstExpr, env: &ConstEnv) -> Option<i64> {
    match expr {
        AstExpr::Ref(name) => env.get(name).copied(),
        AstExpr::Const(text) => parse_const_value(text),
        AstExpr::Unary { op, operand, .. } => {
            let v = eval_const_expr(operand, env)?;
            Some(match op {
                UnaryOp::Neg => -v,
                UnaryOp::BitNot => !v,
                UnaryOp::LogicNot => (v == 0) as i64,
                UnaryOp::ReduceAnd
                | UnaryOp::ReduceOr
                | UnaryOp::ReduceXor
                | UnaryOp::ReduceNand
                | UnaryOp::ReduceNor
                | UnaryOp::ReduceXnor => return None,
            })
        }
        AstExpr::Binary { op, lhs, rhs, .. } => {
            let l = eval_const_expr(lhs, env)?;
            let r = eval_const_expr(rhs, env)?;
            Some(match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div if r != 0 => l / r,
                BinaryOp::Mod if r != 0 => l % r,
                BinaryOp::Div | BinaryOp::Mod => return None,
                BinaryOp::And => l & r,
                BinaryOp::Or => l | r,
                BinaryOp::Xor => l ^ r,
                BinaryOp::Xnor => !(l ^ r),
                BinaryOp::LogicAnd => ((l != 0) && (r != 0)) as i64,
                BinaryOp::LogicOr => ((l != 0) || (r != 0)) as i64,
                BinaryOp::Shl => l.wrapping_shl(r as u32),
                BinaryOp::LShr => ((l as u64) >> r) as i64,
                BinaryOp::AShr => l.wrapping_shr(r as u32),
                BinaryOp::Eq | BinaryOp::CaseEq | BinaryOp::WildcardEq => (l == r) as i64,
                BinaryOp::Ne | BinaryOp::CaseNe | BinaryOp::WildcardNe => (l != r) as i64,
                BinaryOp::Lt => (l < r) as i64,
                BinaryOp::Le => (l <= r) as i64,
                BinaryOp::Gt => (l > r) as i64,
                BinaryOp::Ge => (l >= r) as i64,
            })
        }
        AstExpr::Ternary { cond, then_value, else_value, .. } => {
            if eval_const_expr(cond, env)? != 0 {
                eval_const_expr(then_value, env)
            } else {
                eval_const_expr(else_value, env)
            }
        }
        _ => None,
    }
}

/// Parses a literal's plain integer value (ignoring its declared width),
/// e.g. `"8'hFF"` -> `255`, `"3"` -> `3`. Mirrors the radix-prefix grammar
/// `rhs::parse_literal_width` already reads the width half of.
fn parse_const_value(text: &str) -> Option<i64> {
    let digits = match text.find('\'') {
        Some(tick) => &text[tick + 1..],
        None => text,
    };
    let (radix, digits) = match digits.as_bytes().first() {
        Some(b'b') | Some(b'B') => (2, &digits[1..]),
        Some(b'o') | Some(b'O') => (8, &digits[1..]),
        Some(b'h') | Some(b'H') => (16, &digits[1..]),
        Some(b'd') | Some(b'D') => (10, &digits[1..]),
        _ => (10, digits),
    };
    i64::from_str_radix(&digits.replace('_', ""), radix).ok()
}

/// Evaluates and applies a `for` loop's init/step statement, which must be a
/// plain `Assign` to a `Ref` with a statically resolvable RHS. Returns
/// `false` (without mutating `env`) if it is anything else.
fn eval_const_assign(stmt: &AstStmt, env: &mut ConstEnv) -> bool {
    if let AstStmt::Assign { target: AstExpr::Ref(name), value, .. } = stmt {
        if let Some(v) = eval_const_expr(value, env) {
            env.insert(*name, v);
            return true;
        }
    }
    false
}

/// Materializes `var`'s current compile-time value as a fresh `Constant`
/// and binds it into `scope`, so an unrolled iteration's body can read the
/// loop variable like any other signal.
fn bind_loop_var(var: Ident, env: &ConstEnv, scope: &mut Scope, cx: &LowerCx, graph: &mut Graph, sink: &DiagnosticSink) {
    let Some(&v) = env.get(&var) else { return };
    if let Some(cv) = rhs::convert(&AstExpr::Const(format!("32'd{v}")), graph, scope, cx.rhs, sink) {
        scope.bind(var, cv);
    }
}

/// A classified procedural write target into a declared memory: either the
/// whole element at `addr`, or (resolved via `env`) a single bit of it.
enum MemTarget<'e> {
    WholeRow { mem: Ident, addr: &'e AstExpr },
    Bit { mem: Ident, addr: &'e AstExpr, bit: u32 },
}

/// Recognizes `mem[addr] <= ...` and `mem[addr][i] <= ...` shapes against
/// the signal memo, returning `None` for anything else (including a
/// dynamic-index bit-write into a memory, which falls through to
/// `resolve_signal_target`'s `not_yet_implemented` diagnostic).
fn classify_memory_target<'e>(target: &'e AstExpr, memo: Option<&SignalMemo>, env: &ConstEnv) -> Option<MemTarget<'e>> {
    let memo = memo?;
    let AstExpr::Index { base, index, .. } = target else { return None };
    if let AstExpr::Ref(name) = base.as_ref() {
        if memo.get(*name).map(|e| e.kind) == Some(MemoKind::Mem) {
            return Some(MemTarget::WholeRow { mem: *name, addr: index.as_ref() });
        }
    }
    if let AstExpr::Index { base: inner, index: addr, .. } = base.as_ref() {
        if let AstExpr::Ref(name) = inner.as_ref() {
            if memo.get(*name).map(|e| e.kind) == Some(MemoKind::Mem) {
                let bit = eval_const_expr(index, env)?;
                return Some(MemTarget::Bit { mem: *name, addr: addr.as_ref(), bit: bit.max(0) as u32 });
            }
        }
    }
    None
}

/// Recognizes a register/net procedural target shape (`Ref`, `PartSelect`
/// of a `Ref`, or a constant-index bit of a `Ref`), returning the target
/// name and the `(msb, lsb)` range written, or `None` for `Ref` (the whole
/// signal). Any other shape (concat LHS, dynamic index) is unsupported.
fn resolve_signal_target(target: &AstExpr, env: &ConstEnv) -> Option<(Ident, Option<(u32, u32)>)> {
    match target {
        AstExpr::Ref(name) => Some((*name, None)),
        AstExpr::PartSelect { base, msb, lsb, .. } => {
            let AstExpr::Ref(name) = base.as_ref() else { return None };
            Some((*name, Some(((*msb).max(0) as u32, (*lsb).max(0) as u32))))
        }
        AstExpr::Index { base, index, .. } => {
            let AstExpr::Ref(name) = base.as_ref() else { return None };
            let bit = eval_const_expr(index, env)?.max(0) as u32;
            Some((*name, Some((bit, bit))))
        }
        _ => None,
    }
}

/// Builds the full-width value for a partial write: `new_sub` spliced into
/// `prior` (or zero-filled, if this is the target's first write) at
/// `[msb:lsb]`, via `Concat` over `SliceStatic`s of the surviving bits.
fn splice_range(graph: &mut Graph, prior: Option<ValueId>, new_sub: ValueId, msb: u32, lsb: u32, width: u32) -> ValueId {
    let mut parts = Vec::new();
    if msb + 1 < width {
        let hi_width = width - 1 - msb;
        parts.push(match prior {
            Some(p) => ops::emit_slice_static(graph, p, width - 1, msb + 1),
            None => ops::emit_zero(graph, hi_width),
        });
    }
    parts.push(new_sub);
    if lsb > 0 {
        parts.push(match prior {
            Some(p) => ops::emit_slice_static(graph, p, lsb - 1, 0),
            None => ops::emit_zero(graph, lsb),
        });
    }
    ops::emit_concat(graph, parts)
}

fn lower_memory_assign(
    mt: MemTarget,
    value: &AstExpr,
    scope: &mut Scope,
    enable: ValueId,
    cx: &LowerCx,
    graph: &mut Graph,
    mem: &mut MemWrites,
    sink: &DiagnosticSink,
) {
    let (mem_name, addr_expr, bit) = match mt {
        MemTarget::WholeRow { mem, addr } => (mem, addr, None),
        MemTarget::Bit { mem, addr, bit } => (mem, addr, Some(bit)),
    };
    let Some(addr_v) = rhs::convert(addr_expr, graph, scope, cx.rhs, sink) else { return };
    mem.addrs.entry(mem_name).or_insert(addr_v);
    let Some(data_v) = rhs::convert(value, graph, scope, cx.rhs, sink) else { return };
    let elem_width = (cx.widths)(mem_name);
    let (msb, lsb) = match bit {
        Some(b) => (b, b),
        None => (elem_width.saturating_sub(1), 0),
    };
    // A whole-row write's enable covers every bit of the row, so it's
    // replicated to the row's width; a single-bit write's enable already is
    // that one mask bit.
    let mask_value = match bit {
        Some(_) => enable,
        None => ops::emit_concat(graph, std::iter::repeat(enable).take(elem_width as usize).collect()),
    };
    mem.data.record(mem_name, mem.key.clone(), SliceRecord { msb, lsb, source: data_v });
    mem.mask.record(mem_name, mem.key.clone(), SliceRecord { msb, lsb, source: mask_value });
    if !mem.sites.contains(&(mem_name, mem.key.clone())) {
        mem.sites.push((mem_name, mem.key.clone()));
    }
}

#[allow(clippy::too_many_arguments)]
fn lower_stmt(
    stmt: &AstStmt,
    scope: &mut Scope,
    outer: &Scope,
    env: &ConstEnv,
    enable: ValueId,
    cx: &LowerCx,
    graph: &mut Graph,
    written: &mut HashMap<Ident, (u32, u32)>,
    mem: &mut MemWrites,
    sink: &DiagnosticSink,
) -> Flow {
    match stmt {
        AstStmt::Assign { target, value, .. } => {
            if let Some(mt) = classify_memory_target(target, cx.rhs.memo, env) {
                lower_memory_assign(mt, value, scope, enable, cx, graph, mem, sink);
                return Flow::Normal;
            }
            let Some((name, range)) = resolve_signal_target(target, env) else {
                sink.emit(errors::not_yet_implemented(
                    "non-reference assignment target (slice/concat LHS)",
                    target.span().unwrap_or(Span::DUMMY),
                ));
                return Flow::Normal;
            };
            let Some(rhs_value) = rhs::convert(value, graph, scope, cx.rhs, sink) else {
                return Flow::Normal;
            };
            let width = (cx.widths)(name);
            let merged = match range {
                None => rhs_value,
                Some((msb, lsb)) => {
                    let prior = scope.lookup(name).or_else(|| outer.lookup(name));
                    splice_range(graph, prior, rhs_value, msb, lsb, width)
                }
            };
            scope.bind(name, merged);
            let (msb, lsb) = range.unwrap_or((width.saturating_sub(1), 0));
            written
                .entry(name)
                .and_modify(|(m, l)| {
                    *m = (*m).max(msb);
                    *l = (*l).min(lsb);
                })
                .or_insert((msb, lsb));
            Flow::Normal
        }
        AstStmt::If { cond, then_branch, else_branch, span } => {
            if let Some(c) = eval_const_expr(cond, env) {
                return if c != 0 {
                    lower_stmt(then_branch, scope, outer, env, enable, cx, graph, written, mem, sink)
                } else if let Some(else_branch) = else_branch {
                    lower_stmt(else_branch, scope, outer, env, enable, cx, graph, written, mem, sink)
                } else {
                    Flow::Normal
                };
            }
            let Some(cond_value) = rhs::convert(cond, graph, scope, cx.rhs, sink) else {
                return Flow::Normal;
            };
            let then_enable = ops::emit_and(graph, enable, cond_value);
            let not_cond = ops::emit_not(graph, cond_value);
            let else_enable = ops::emit_and(graph, enable, not_cond);

            let mut then_scope = scope.clone();
            let then_flow = lower_stmt(then_branch, &mut then_scope, scope, env, then_enable, cx, graph, written, mem, sink);
            let mut else_scope = scope.clone();
            let else_flow = if let Some(else_branch) = else_branch {
                lower_stmt(else_branch, &mut else_scope, scope, env, else_enable, cx, graph, written, mem, sink)
            } else {
                Flow::Normal
            };
            merge_branch(
                scope,
                outer,
                cond_value,
                &then_scope,
                &else_scope,
                else_branch.is_some(),
                cx.is_comb,
                *span,
                graph,
                sink,
            );

            if then_flow == Flow::Normal && else_flow == Flow::Normal {
                Flow::Normal
            } else if then_flow == else_flow {
                then_flow
            } else {
                // A runtime-conditioned break/continue has no value-domain
                // representation in this graph model.
                sink.emit(errors::data_dependent_bound(*span));
                Flow::Normal
            }
        }
        AstStmt::Case { selector, arms, span } => {
            lower_case(selector, arms, scope, outer, env, enable, cx, *span, graph, written, mem, sink);
            Flow::Normal
        }
        AstStmt::Block(stmts) => {
            for s in stmts {
                match lower_stmt(s, scope, outer, env, enable, cx, graph, written, mem, sink) {
                    Flow::Normal => {}
                    other => return other,
                }
            }
            Flow::Normal
        }
        AstStmt::Foreach { index, count, body, .. } => {
            let mut loop_env = env.clone();
            for i in 0..*count {
                let const_val = rhs::convert(&AstExpr::Const(format!("32'd{i}")), graph, scope, cx.rhs, sink);
                if let Some(v) = const_val {
                    scope.bind(*index, v);
                }
                loop_env.insert(*index, i as i64);
                match lower_stmt(body, scope, outer, &loop_env, enable, cx, graph, written, mem, sink) {
                    Flow::Break => break,
                    Flow::Continue | Flow::Normal => {}
                }
            }
            Flow::Normal
        }
        AstStmt::For { init, cond, step, body, span } => {
            let AstStmt::Assign { target: AstExpr::Ref(loop_var), .. } = init.as_ref() else {
                sink.emit(errors::data_dependent_bound(*span));
                return Flow::Normal;
            };
            let mut loop_env = env.clone();
            if !eval_const_assign(init, &mut loop_env) {
                sink.emit(errors::data_dependent_bound(*span));
                return Flow::Normal;
            }
            const MAX_ITERATIONS: u32 = 4096;
            let mut iterations = 0u32;
            loop {
                bind_loop_var(*loop_var, &loop_env, scope, cx, graph, sink);
                let Some(cond_value) = eval_const_expr(cond, &loop_env) else {
                    sink.emit(errors::data_dependent_bound(*span));
                    break;
                };
                if cond_value == 0 {
                    break;
                }
                iterations += 1;
                if iterations > MAX_ITERATIONS {
                    sink.emit(errors::data_dependent_bound(*span));
                    break;
                }
                match lower_stmt(body, scope, outer, &loop_env, enable, cx, graph, written, mem, sink) {
                    Flow::Break => break,
                    Flow::Continue | Flow::Normal => {}
                }
                if !eval_const_assign(step, &mut loop_env) {
                    sink.emit(errors::data_dependent_bound(*span));
                    break;
                }
            }
            Flow::Normal
        }
        AstStmt::Break(_) => Flow::Break,
        AstStmt::Continue(_) => Flow::Continue,
        AstStmt::Display { args, span } => {
            let op = match graph.create_operation(OperationKind::Display, None) {
                Ok(op) => op,
                Err(_) => return Flow::Normal,
            };
            for arg in args {
                if let Some(v) = rhs::convert(arg, graph, scope, cx.rhs, sink) {
                    let _ = graph.add_operand(op, v);
                }
            }
            let _ = span;
            Flow::Normal
        }
        AstStmt::Assert { cond, message, span } => {
            let Some(v) = rhs::convert(cond, graph, scope, cx.rhs, sink) else {
                return Flow::Normal;
            };
            if let Ok(op) = graph.create_operation(OperationKind::Assert, None) {
                let _ = graph.add_operand(op, v);
                if let Some(msg) = message {
                    graph
                        .operation_mut(op)
                        .unwrap()
                        .attributes_mut()
                        .insert("message".to_string(), grh_ir::AttributeValue::Str(msg.clone()));
                }
            }
            let _ = span;
            Flow::Normal
        }
        AstStmt::Finish(_) => Flow::Normal,
    }
}

#[allow(clippy::too_many_arguments)]
fn merge_branch(
    scope: &mut Scope,
    outer: &Scope,
    cond: ValueId,
    then_scope: &Scope,
    else_scope: &Scope,
    has_else: bool,
    is_comb: bool,
    span: Span,
    graph: &mut Graph,
    sink: &DiagnosticSink,
) {
    let mut changed: Vec<Ident> = then_scope
        .bindings_iter()
        .filter(|(n, v)| outer.lookup(**n) != Some(**v))
        .map(|(n, _)| *n)
        .collect();
    for (n, v) in else_scope.bindings_iter() {
        if outer.lookup(*n) != Some(*v) && !changed.contains(n) {
            changed.push(*n);
        }
    }

    for name in changed {
        let then_value = then_scope.lookup(name);
        let else_value = else_scope.lookup(name);
        let (then_v, else_v) = match (then_value, else_value) {
            (Some(t), Some(e)) => (t, e),
            (Some(t), None) | (None, Some(t)) => {
                if is_comb && outer.lookup(name).is_none() {
                    sink.emit(errors::inferred_latch(&format!("%{}", name.as_raw()), span));
                }
                match outer.lookup(name) {
                    Some(prior) => (t, prior),
                    None => continue,
                }
            }
            (None, None) => continue,
        };
        if !has_else && is_comb && outer.lookup(name).is_none() {
            sink.emit(errors::inferred_latch(&format!("%{}", name.as_raw()), span));
        }
        let width = graph.value(then_v).map(|v| v.width()).unwrap_or(1);
        let result = crate::ops::fresh_value(graph, "branch", width, false);
        let Ok(op) = graph.create_operation(OperationKind::Mux, None) else {
            continue;
        };
        let _ = graph.add_operand(op, cond);
        let _ = graph.add_operand(op, then_v);
        let _ = graph.add_operand(op, else_v);
        let _ = graph.add_result(op, result);
        scope.bind(name, result);
    }
}

#[allow(clippy::too_many_arguments)]
fn lower_case(
    selector: &AstExpr,
    arms: &[CaseArm],
    scope: &mut Scope,
    outer: &Scope,
    env: &ConstEnv,
    enable: ValueId,
    cx: &LowerCx,
    span: Span,
    graph: &mut Graph,
    written: &mut HashMap<Ident, (u32, u32)>,
    mem: &mut MemWrites,
    sink: &DiagnosticSink,
) {
    let Some(sel) = rhs::convert(selector, graph, scope, cx.rhs, sink) else {
        return;
    };
    let has_default = arms.iter().any(|a| a.labels.is_empty());

    // Lower arms in reverse so the first-declared arm wins ties, folding
    // each one in as the "else" of the arm before it (last-declared = innermost else).
    let mut acc = scope.clone();
    for arm in arms.iter().rev() {
        if arm.labels.is_empty() {
            let mut arm_scope = scope.clone();
            let _ = lower_stmt(&arm.body, &mut arm_scope, scope, env, enable, cx, graph, written, mem, sink);
            acc = arm_scope;
            continue;
        }
        let mut cond_value = None;
        for label in &arm.labels {
            let Some(label_v) = rhs::convert(label, graph, scope, cx.rhs, sink) else {
                continue;
            };
            let eq_result = crate::ops::fresh_value(graph, "case_eq", 1, false);
            if let Ok(op) = graph.create_operation(OperationKind::Eq, None) {
                let _ = graph.add_operand(op, sel);
                let _ = graph.add_operand(op, label_v);
                let _ = graph.add_result(op, eq_result);
            }
            cond_value = Some(match cond_value {
                None => eq_result,
                Some(prev) => {
                    let combined = crate::ops::fresh_value(graph, "case_or", 1, false);
                    if let Ok(op) = graph.create_operation(OperationKind::LogicOr, None) {
                        let _ = graph.add_operand(op, prev);
                        let _ = graph.add_operand(op, eq_result);
                        let _ = graph.add_result(op, combined);
                    }
                    combined
                }
            });
        }
        let Some(cond_value) = cond_value else { continue };
        let mut arm_scope = scope.clone();
        let _ = lower_stmt(&arm.body, &mut arm_scope, scope, env, enable, cx, graph, written, mem, sink);
        let mut next = scope.clone();
        merge_branch(
            &mut next, scope, cond_value, &arm_scope, &acc, true, cx.is_comb, span, graph, sink,
        );
        acc = next;
    }

    if !has_default && cx.is_comb {
        sink.emit(errors::inferred_latch("case selector", span));
    }

    for (name, value) in acc.bindings_iter() {
        scope.bind(*name, *value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_ir::ValueType;

    fn sym_value(g: &mut Graph, name: &str, width: u32) -> ValueId {
        let s = g.intern(name);
        g.create_value(s, width, false, ValueType::Logic).unwrap()
    }

    fn empty_mem<'a>(
        data: &'a mut WriteBackMemo,
        mask: &'a mut WriteBackMemo,
        addrs: &'a mut HashMap<Ident, ValueId>,
        sites: &'a mut Vec<(Ident, WriteKey)>,
    ) -> MemWrites<'a> {
        MemWrites { data, mask, addrs, sites, key: WriteKey::Continuous }
    }

    #[test]
    fn write_key_for_empty_edges_is_continuous() {
        assert_eq!(write_key_for(&[]), WriteKey::Continuous);
    }

    #[test]
    fn write_key_for_clocked_edges_is_procedural() {
        let edges = vec![AstEdge {
            polarity: EdgePolarity::Posedge,
            signal: Ident::from_raw(1),
        }];
        match write_key_for(&edges) {
            WriteKey::Procedural(tags) => assert_eq!(tags, vec![("posedge".to_string(), Ident::from_raw(1))]),
            _ => panic!("expected Procedural"),
        }
    }

    #[test]
    fn is_clocked_detects_posedge() {
        let edges = vec![AstEdge {
            polarity: EdgePolarity::Posedge,
            signal: Ident::from_raw(1),
        }];
        assert!(is_clocked(&edges));
        assert!(!is_clocked(&[]));
    }

    #[test]
    fn simple_assign_binds_target() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let d = sym_value(&mut g, "d", 8);
        let mut scope = Scope::new();
        let q = Ident::from_raw(1);
        let d_name = Ident::from_raw(2);
        scope.bind(d_name, d);
        let stmt = AstStmt::Assign {
            target: AstExpr::Ref(q),
            value: AstExpr::Ref(d_name),
            blocking: false,
            span: Span::DUMMY,
        };
        let outer = scope.clone();
        let env = ConstEnv::new();
        let rhs_cx = RhsCtx::default();
        let cx = LowerCx { is_comb: false, widths: &|_| 8, rhs: &rhs_cx };
        let mut written = HashMap::new();
        let mut data = WriteBackMemo::new();
        let mut mask = WriteBackMemo::new();
        let mut addrs = HashMap::new();
        let mut sites = Vec::new();
        let mut mem = empty_mem(&mut data, &mut mask, &mut addrs, &mut sites);
        let one = ops::emit_constant(&mut g, 1, false, "1'b1");
        lower_stmt(&stmt, &mut scope, &outer, &env, one, &cx, &mut g, &mut written, &mut mem, &sink);
        assert_eq!(scope.lookup(q), Some(d));
    }

    #[test]
    fn if_else_merges_via_mux() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let cond_sym = g.intern("sel");
        let cond = g.create_value(cond_sym, 1, false, ValueType::Logic).unwrap();
        let a = sym_value(&mut g, "a", 8);
        let b = sym_value(&mut g, "b", 8);
        let cond_name = Ident::from_raw(1);
        let a_name = Ident::from_raw(2);
        let b_name = Ident::from_raw(3);
        let q = Ident::from_raw(4);
        let mut scope = Scope::new();
        scope.bind(cond_name, cond);
        scope.bind(a_name, a);
        scope.bind(b_name, b);
        let outer = scope.clone();
        let stmt = AstStmt::If {
            cond: AstExpr::Ref(cond_name),
            then_branch: Box::new(AstStmt::Assign {
                target: AstExpr::Ref(q),
                value: AstExpr::Ref(a_name),
                blocking: false,
                span: Span::DUMMY,
            }),
            else_branch: Some(Box::new(AstStmt::Assign {
                target: AstExpr::Ref(q),
                value: AstExpr::Ref(b_name),
                blocking: false,
                span: Span::DUMMY,
            })),
            span: Span::DUMMY,
        };
        let env = ConstEnv::new();
        let rhs_cx = RhsCtx::default();
        let cx = LowerCx { is_comb: false, widths: &|_| 8, rhs: &rhs_cx };
        let mut written = HashMap::new();
        let mut data = WriteBackMemo::new();
        let mut mask = WriteBackMemo::new();
        let mut addrs = HashMap::new();
        let mut sites = Vec::new();
        let mut mem = empty_mem(&mut data, &mut mask, &mut addrs, &mut sites);
        let one = ops::emit_constant(&mut g, 1, false, "1'b1");
        lower_stmt(&stmt, &mut scope, &outer, &env, one, &cx, &mut g, &mut written, &mut mem, &sink);
        let result = scope.lookup(q).unwrap();
        assert_eq!(g.operation(g.value(result).unwrap().defining_op().unwrap()).unwrap().kind(), OperationKind::Mux);
        assert!(!sink.has_errors());
    }

    #[test]
    fn comb_if_without_else_infers_latch() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let cond_sym = g.intern("sel");
        let cond = g.create_value(cond_sym, 1, false, ValueType::Logic).unwrap();
        let a = sym_value(&mut g, "a", 8);
        let cond_name = Ident::from_raw(1);
        let a_name = Ident::from_raw(2);
        let q = Ident::from_raw(3);
        let mut scope = Scope::new();
        scope.bind(cond_name, cond);
        scope.bind(a_name, a);
        let outer = scope.clone();
        let stmt = AstStmt::If {
            cond: AstExpr::Ref(cond_name),
            then_branch: Box::new(AstStmt::Assign {
                target: AstExpr::Ref(q),
                value: AstExpr::Ref(a_name),
                blocking: true,
                span: Span::DUMMY,
            }),
            else_branch: None,
            span: Span::DUMMY,
        };
        let env = ConstEnv::new();
        let rhs_cx = RhsCtx::default();
        let cx = LowerCx { is_comb: true, widths: &|_| 8, rhs: &rhs_cx };
        let mut written = HashMap::new();
        let mut data = WriteBackMemo::new();
        let mut mask = WriteBackMemo::new();
        let mut addrs = HashMap::new();
        let mut sites = Vec::new();
        let mut mem = empty_mem(&mut data, &mut mask, &mut addrs, &mut sites);
        let one = ops::emit_constant(&mut g, 1, false, "1'b1");
        lower_stmt(&stmt, &mut scope, &outer, &env, one, &cx, &mut g, &mut written, &mut mem, &sink);
        assert!(sink.has_errors() || !sink.diagnostics().is_empty());
    }

    #[test]
    fn lower_always_records_writeback_for_changed_targets() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let d = sym_value(&mut g, "d", 8);
        let q_name = Ident::from_raw(1);
        let d_name = Ident::from_raw(2);
        let mut initial = Scope::new();
        initial.bind(d_name, d);
        let stmt = AstStmt::Assign {
            target: AstExpr::Ref(q_name),
            value: AstExpr::Ref(d_name),
            blocking: false,
            span: Span::DUMMY,
        };
        let mut wb = WriteBackMemo::new();
        let mut mem_mask = WriteBackMemo::new();
        let mut mem_addrs = HashMap::new();
        let mut mem_sites = Vec::new();
        let rhs_cx = RhsCtx::default();
        let edges = vec![AstEdge {
            polarity: EdgePolarity::Posedge,
            signal: Ident::from_raw(99),
        }];
        lower_always(
            AlwaysKind::Ff,
            &edges,
            &stmt,
            &initial,
            &|_| 8,
            &mut g,
            &mut wb,
            &mut mem_mask,
            &mut mem_addrs,
            &mut mem_sites,
            &rhs_cx,
            &sink,
        );
        let key = write_key_for(&edges);
        let result = wb.finalize(q_name, &key, 8, &mut g);
        assert_eq!(result, Some(d));
    }

    #[test]
    fn for_loop_unrolls_and_break_terminates_it() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let i = Ident::from_raw(1);
        let q = Ident::from_raw(2);
        // for (i = 0; i < 8; i = i + 1) begin
        //   if (i == 4) break;
        //   q = i;
        // end
        let body = AstStmt::Block(vec![
            AstStmt::If {
                cond: AstExpr::Binary {
                    op: BinaryOp::Eq,
                    lhs: Box::new(AstExpr::Ref(i)),
                    rhs: Box::new(AstExpr::Const("4".to_string())),
                    span: Span::DUMMY,
                },
                then_branch: Box::new(AstStmt::Break(Span::DUMMY)),
                else_branch: None,
                span: Span::DUMMY,
            },
            AstStmt::Assign {
                target: AstExpr::Ref(q),
                value: AstExpr::Ref(i),
                blocking: true,
                span: Span::DUMMY,
            },
        ]);
        let stmt = AstStmt::For {
            init: Box::new(AstStmt::Assign {
                target: AstExpr::Ref(i),
                value: AstExpr::Const("0".to_string()),
                blocking: true,
                span: Span::DUMMY,
            }),
            cond: AstExpr::Binary {
                op: BinaryOp::Lt,
                lhs: Box::new(AstExpr::Ref(i)),
                rhs: Box::new(AstExpr::Const("8".to_string())),
                span: Span::DUMMY,
            },
            step: Box::new(AstStmt::Assign {
                target: AstExpr::Ref(i),
                value: AstExpr::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(AstExpr::Ref(i)),
                    rhs: Box::new(AstExpr::Const("1".to_string())),
                    span: Span::DUMMY,
                },
                blocking: true,
                span: Span::DUMMY,
            }),
            body: Box::new(body),
            span: Span::DUMMY,
        };
        let mut scope = Scope::new();
        let outer = scope.clone();
        let env = ConstEnv::new();
        let rhs_cx = RhsCtx::default();
        let cx = LowerCx { is_comb: false, widths: &|_| 32, rhs: &rhs_cx };
        let mut written = HashMap::new();
        let mut data = WriteBackMemo::new();
        let mut mask = WriteBackMemo::new();
        let mut addrs = HashMap::new();
        let mut sites = Vec::new();
        let mut mem = empty_mem(&mut data, &mut mask, &mut addrs, &mut sites);
        let one = ops::emit_constant(&mut g, 1, false, "1'b1");
        lower_stmt(&stmt, &mut scope, &outer, &env, one, &cx, &mut g, &mut written, &mut mem, &sink);
        assert!(!sink.has_errors());
        let q_value = scope.lookup(q).expect("q bound by the unrolled loop");
        // The last iteration to run assigns q = i for i = 3 (break fires at i = 4).
        let op = g.value(q_value).unwrap().defining_op().unwrap();
        assert_eq!(g.operation(op).unwrap().kind(), OperationKind::Constant);
        assert_eq!(
            g.operation(op).unwrap().attributes().get("constValue").and_then(|v| v.as_str()),
            Some("32'd3")
        );
    }

    #[test]
    fn partial_bit_write_records_narrow_range() {
        let mut g = Graph::new();
        let sink = DiagnosticSink::new();
        let q = Ident::from_raw(1);
        let nibble = sym_value(&mut g, "nibble", 4);
        let nibble_name = Ident::from_raw(2);
        let mut scope = Scope::new();
        scope.bind(nibble_name, nibble);
        let outer = scope.clone();
        let stmt = AstStmt::Assign {
            target: AstExpr::PartSelect { base: Box::new(AstExpr::Ref(q)), msb: 3, lsb: 0, span: Span::DUMMY },
            value: AstExpr::Ref(nibble_name),
            blocking: false,
            span: Span::DUMMY,
        };
        let env = ConstEnv::new();
        let rhs_cx = RhsCtx::default();
        let cx = LowerCx { is_comb: false, widths: &|_| 8, rhs: &rhs_cx };
        let mut written = HashMap::new();
        let mut data = WriteBackMemo::new();
        let mut mask = WriteBackMemo::new();
        let mut addrs = HashMap::new();
        let mut sites = Vec::new();
        let mut mem = empty_mem(&mut data, &mut mask, &mut addrs, &mut sites);
        let one = ops::emit_constant(&mut g, 1, false, "1'b1");
        lower_stmt(&stmt, &mut scope, &outer, &env, one, &cx, &mut g, &mut written, &mut mem, &sink);
        assert_eq!(written.get(&q), Some(&(3, 0)));
    }
}
