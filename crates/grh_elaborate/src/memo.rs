//! Signal memo and write-back memo (§4.3).
//!
//! The elaborator classifies every user-declared signal into exactly one of
//! `netMemo`, `regMemo`, `memMemo` as it walks continuous assigns and
//! procedural blocks, then defers materializing each signal's driver until
//! every writer has been seen (the write-back memo).

use std::collections::HashMap;

use grh_common::Ident;
use grh_diagnostics::DiagnosticSink;
use grh_ir::{Graph, OperationId, ValueId};
use grh_source::Span;

use crate::errors;
use crate::flatten::FlatType;
use crate::ops;

/// Which memo a signal was classified into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoKind {
    /// Driven only by continuous assigns or `always_comb`/`always @*`.
    Net,
    /// Driven by a clocked procedural block.
    Reg,
    /// A multi-dimensional unpacked array of packed elements.
    Mem,
}

/// A classified signal: its flattened type plus its materialized carrier.
#[derive(Clone, Debug)]
pub struct MemoEntry {
    pub kind: MemoKind,
    pub flat: FlatType,
    /// The net/reg value, or `None` for a `Mem` entry (carried by `state_op` instead).
    pub value: Option<ValueId>,
    /// The `Register`/`Latch`/`Memory` declaration operation, for `Reg`/`Mem` entries.
    pub state_op: Option<OperationId>,
    /// For a `Net`/`Reg` entry declared as a packed/unpacked array (rather
    /// than a plain vector), the per-element width, so an `a[i]` read can
    /// size its `SliceArray` correctly instead of assuming width 1.
    pub array_element_width: Option<u32>,
}

/// Per-module signal classification, keyed by the declaring AST symbol.
#[derive(Default)]
pub struct SignalMemo {
    entries: HashMap<Ident, MemoEntry>,
    /// Signals seen as conflicting net/reg drivers; excluded from `entries`.
    conflicted: Vec<Ident>,
}

impl SignalMemo {
    /// Creates an empty signal memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `name` into `kind`, or records a conflict if it was
    /// already classified into a different kind.
    ///
    /// Reports `E102` and drops the memoization entirely on conflict, per
    /// §4.3 rule 4: "later uses see the signal as absent."
    pub fn classify(
        &mut self,
        name: Ident,
        name_text: &str,
        kind: MemoKind,
        flat: FlatType,
        span: Span,
        sink: &DiagnosticSink,
    ) -> bool {
        if self.conflicted.contains(&name) {
            return false;
        }
        if let Some(existing) = self.entries.get(&name) {
            if existing.kind != kind {
                sink.emit(errors::memo_conflict(name_text, span));
                self.entries.remove(&name);
                self.conflicted.push(name);
                return false;
            }
            return true;
        }
        self.entries.insert(
            name,
            MemoEntry {
                kind,
                flat,
                value: None,
                state_op: None,
                array_element_width: None,
            },
        );
        true
    }

    /// Attaches the materialized carrier to a previously classified signal.
    pub fn set_carrier(&mut self, name: Ident, value: Option<ValueId>, state_op: Option<OperationId>) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.value = value;
            entry.state_op = state_op;
        }
    }

    /// Records the per-element width of an array-typed net/reg, consulted by
    /// `rhs::convert`'s `Index` arm when sizing a `SliceArray`.
    pub fn set_array_element_width(&mut self, name: Ident, width: u32) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.array_element_width = Some(width);
        }
    }

    /// Looks up a signal's memo entry.
    pub fn get(&self, name: Ident) -> Option<&MemoEntry> {
        self.entries.get(&name)
    }

    /// Whether `name` was dropped due to a net/reg conflict.
    pub fn is_conflicted(&self, name: Ident) -> bool {
        self.conflicted.contains(&name)
    }
}

/// How a writer drove its target: unconditionally (continuous) or under a
/// specific procedural edge list (the block's "seq key", §4.5).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum WriteKey {
    Continuous,
    /// `(polarity-tag, signal)` pairs in event-control order.
    Procedural(Vec<(String, Ident)>),
}

/// One writer's contribution: the bits it drives and the value driving them.
#[derive(Clone, Debug)]
pub struct SliceRecord {
    pub msb: u32,
    pub lsb: u32,
    pub source: ValueId,
}

/// Aggregates per-target, per-key slice writes until finalization combines
/// them into a single driver (§4.3).
#[derive(Default)]
pub struct WriteBackMemo {
    writes: HashMap<(Ident, WriteKey), Vec<SliceRecord>>,
}

impl WriteBackMemo {
    /// Creates an empty write-back memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one writer's slice contribution to `target` under `key`.
    pub fn record(&mut self, target: Ident, key: WriteKey, slice: SliceRecord) {
        self.writes.entry((target, key)).or_default().push(slice);
    }

    /// Combines every slice for `(target, key)` MSB-first via `Concat`,
    /// zero-filling gaps with a fresh `Constant`. Returns `None` if there is
    /// no recorded write for this key.
    ///
    /// A single full-width slice is returned directly, skipping the concat
    /// (§4.3: "Full-width single slices skip the concat").
    pub fn finalize(
        &self,
        target: Ident,
        key: &WriteKey,
        total_width: u32,
        graph: &mut Graph,
    ) -> Option<ValueId> {
        let slices = self.writes.get(&(target, key.clone()))?;
        if slices.is_empty() {
            return None;
        }
        if slices.len() == 1 && slices[0].msb == total_width - 1 && slices[0].lsb == 0 {
            return Some(slices[0].source);
        }
        let mut sorted: Vec<&SliceRecord> = slices.iter().collect();
        sorted.sort_by(|a, b| b.msb.cmp(&a.msb));

        let mut parts = Vec::new();
        let mut next_msb = total_width - 1;
        for slice in sorted {
            if slice.msb < next_msb {
                let gap_width = next_msb - slice.msb;
                parts.push(ops::emit_zero(graph, gap_width));
            }
            parts.push(slice.source);
            next_msb = slice.lsb.wrapping_sub(1);
        }
        if slices.iter().map(|s| s.lsb).min().unwrap_or(0) > 0 {
            parts.push(ops::emit_zero(graph, slices.iter().map(|s| s.lsb).min().unwrap()));
        }
        Some(ops::emit_concat(graph, parts))
    }
}
