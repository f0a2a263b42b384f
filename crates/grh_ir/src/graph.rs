//! [`Graph`] — the per-module arena owning every [`Value`] and [`Operation`] (§4.1).

use crate::arena::Arena;
use crate::ids::{GraphId, OperationId, SymbolId, ValueId};
use crate::operation::{Operation, OperationKind};
use crate::value::{PortRole, Value, ValueType};
use lasso::Rodeo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named port binding to a single [`Value`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// The port's declared name.
    pub name: SymbolId,
    /// The value carrying the port's signal.
    pub value: ValueId,
}

/// The three-way inout binding: reader, driver, and output-enable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InoutPort {
    /// The port's declared name.
    pub name: SymbolId,
    /// The value the module reads the external driver through.
    pub input: ValueId,
    /// The value the module drives outward with.
    pub output: ValueId,
    /// The value selecting whether `output` is actively driving.
    pub output_enable: ValueId,
}

/// Errors returned by [`Graph`]'s mutating API (§4.1).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// A `createValue`/`createOperation` symbol collided with an existing
    /// value or operation symbol in this graph.
    #[error("symbol already resolves to a value or operation in this graph")]
    DuplicateSymbol,
    /// `addOperand`/`addResult` was given a value minted by a different graph.
    #[error("value belongs to a different graph")]
    ForeignValue,
    /// `addResult` targeted a value that already has a `definingOp`.
    #[error("value already has a defining operation")]
    AlreadyDefined,
    /// `replaceResult`/`setValueSymbol` referenced an operand/result index out of range.
    #[error("result index out of range")]
    ResultIndexOutOfRange,
    /// The referenced value or operation id does not resolve in this graph.
    #[error("id does not resolve to a live entity in this graph")]
    NotFound,
    /// A port name was registered more than once across the three port tables.
    #[error("port name already registered")]
    DuplicatePortName,
}

/// The single owner of every [`Value`] and [`Operation`] belonging to one
/// module instance body.
///
/// Enforces the invariants in §4.1: symbol injectivity (shared between
/// values and operations), def/use integrity, and port-name uniqueness.
#[derive(Debug, Serialize, Deserialize)]
pub struct Graph {
    id: GraphId,
    values: Arena<ValueId, Value>,
    operations: Arena<OperationId, Operation>,
    #[serde(skip)]
    symbols: Rodeo<SymbolId>,
    value_by_symbol: HashMap<SymbolId, ValueId>,
    op_by_symbol: HashMap<SymbolId, OperationId>,
    input_ports: Vec<Port>,
    output_ports: Vec<Port>,
    inout_ports: Vec<InoutPort>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates a new, empty graph with a fresh [`GraphId`].
    pub fn new() -> Self {
        Self {
            id: GraphId::fresh(),
            values: Arena::new(),
            operations: Arena::new(),
            symbols: Rodeo::new(),
            value_by_symbol: HashMap::new(),
            op_by_symbol: HashMap::new(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            inout_ports: Vec::new(),
        }
    }

    /// This graph's identity, embedded in every id it mints.
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Interns `text`, returning a [`SymbolId`] stable for this graph's lifetime.
    pub fn intern(&mut self, text: &str) -> SymbolId {
        self.symbols.get_or_intern(text)
    }

    /// Resolves a [`SymbolId`] back to its text.
    ///
    /// # Panics
    /// Panics if `symbol` was not interned by this graph.
    pub fn resolve_symbol(&self, symbol: SymbolId) -> &str {
        self.symbols.resolve(&symbol)
    }

    fn symbol_taken(&self, symbol: SymbolId) -> bool {
        self.value_by_symbol.contains_key(&symbol) || self.op_by_symbol.contains_key(&symbol)
    }

    /// Creates a value with the given symbol, width, signedness, and type.
    ///
    /// Fails with [`GraphError::DuplicateSymbol`] if `symbol` already names a
    /// value or operation in this graph. The result has no users, no
    /// defining op, and no port role.
    pub fn create_value(
        &mut self,
        symbol: SymbolId,
        width: u32,
        is_signed: bool,
        ty: ValueType,
    ) -> Result<ValueId, GraphError> {
        if self.symbol_taken(symbol) {
            return Err(GraphError::DuplicateSymbol);
        }
        let raw = self.values.alloc(Value::new(symbol, ty, width, is_signed));
        let id = ValueId::new(self.id, raw.index());
        self.value_by_symbol.insert(symbol, id);
        Ok(id)
    }

    /// Creates an operation of the given kind, optionally with a unique symbol.
    ///
    /// Fails with [`GraphError::DuplicateSymbol`] if `symbol` is `Some` and
    /// already names a value or operation in this graph.
    pub fn create_operation(
        &mut self,
        kind: OperationKind,
        symbol: Option<SymbolId>,
    ) -> Result<OperationId, GraphError> {
        if let Some(sym) = symbol {
            if self.symbol_taken(sym) {
                return Err(GraphError::DuplicateSymbol);
            }
        }
        let raw = self.operations.alloc(Operation::new(kind, symbol));
        let id = OperationId::new(self.id, raw.index());
        if let Some(sym) = symbol {
            self.op_by_symbol.insert(sym, id);
        }
        Ok(id)
    }

    /// Appends `value` to `op`'s operand list and records the use in
    /// `value`'s `users` set at the newly appended operand index.
    pub fn add_operand(&mut self, op: OperationId, value: ValueId) -> Result<(), GraphError> {
        if !value.belongs_to(self.id) || !op.belongs_to(self.id) {
            return Err(GraphError::ForeignValue);
        }
        let operand_index = self
            .operations
            .get(op)
            .ok_or(GraphError::NotFound)?
            .operands
            .len();
        self.operations
            .get_mut(op)
            .ok_or(GraphError::NotFound)?
            .operands
            .push(value);
        self.values
            .get_mut(value)
            .ok_or(GraphError::NotFound)?
            .users
            .push((op, operand_index));
        Ok(())
    }

    /// Appends `value` to `op`'s result list and sets `value.definingOp = op`.
    ///
    /// Fails with [`GraphError::AlreadyDefined`] if `value` already has a
    /// defining operation.
    pub fn add_result(&mut self, op: OperationId, value: ValueId) -> Result<(), GraphError> {
        if self.values.get(value).ok_or(GraphError::NotFound)?.defining_op.is_some() {
            return Err(GraphError::AlreadyDefined);
        }
        self.operations
            .get_mut(op)
            .ok_or(GraphError::NotFound)?
            .results
            .push(value);
        self.values.get_mut(value).ok_or(GraphError::NotFound)?.defining_op = Some(op);
        Ok(())
    }

    /// Replaces `op`'s result at `index` with `new_value`, transferring the
    /// `definingOp` pointer without touching any other consumer's `users` list.
    pub fn replace_result(
        &mut self,
        op: OperationId,
        index: usize,
        new_value: ValueId,
    ) -> Result<(), GraphError> {
        let slot = self
            .operations
            .get_mut(op)
            .ok_or(GraphError::NotFound)?
            .results
            .get_mut(index)
            .ok_or(GraphError::ResultIndexOutOfRange)?;
        let old_value = *slot;
        *slot = new_value;
        if let Some(old) = self.values.get_mut(old_value) {
            old.defining_op = None;
        }
        self.values.get_mut(new_value).ok_or(GraphError::NotFound)?.defining_op = Some(op);
        Ok(())
    }

    /// Replaces `op`'s operand at `index` with `new_value`, updating both
    /// values' `users` ledgers (removing the stale entry, recording the
    /// new one at the same operand index).
    pub fn replace_operand(
        &mut self,
        op: OperationId,
        index: usize,
        new_value: ValueId,
    ) -> Result<(), GraphError> {
        if !new_value.belongs_to(self.id) {
            return Err(GraphError::ForeignValue);
        }
        let slot = self
            .operations
            .get_mut(op)
            .ok_or(GraphError::NotFound)?
            .operands
            .get_mut(index)
            .ok_or(GraphError::ResultIndexOutOfRange)?;
        let old_value = *slot;
        *slot = new_value;
        if let Some(old) = self.values.get_mut(old_value) {
            old.users.retain(|(user, idx)| !(*user == op && *idx == index));
        }
        self.values
            .get_mut(new_value)
            .ok_or(GraphError::NotFound)?
            .users
            .push((op, index));
        Ok(())
    }

    /// Renames `value`'s symbol, preserving symbol injectivity.
    pub fn set_value_symbol(
        &mut self,
        value: ValueId,
        new_symbol: SymbolId,
    ) -> Result<(), GraphError> {
        if self.symbol_taken(new_symbol) {
            return Err(GraphError::DuplicateSymbol);
        }
        let old_symbol = self.values.get(value).ok_or(GraphError::NotFound)?.symbol;
        self.value_by_symbol.remove(&old_symbol);
        self.values.get_mut(value).ok_or(GraphError::NotFound)?.symbol = new_symbol;
        self.value_by_symbol.insert(new_symbol, value);
        Ok(())
    }

    /// Removes `op` from the `users` set of every operand and invalidates
    /// the `definingOp` of every result it produced. The result values
    /// themselves remain present unless separately erased.
    ///
    /// Returns `false` if `op` was not present.
    pub fn erase_op(&mut self, op: OperationId) -> bool {
        let Some(removed) = self.operations.erase(op) else {
            return false;
        };
        for operand in &removed.operands {
            if let Some(v) = self.values.get_mut(*operand) {
                v.users.retain(|(user, _)| *user != op);
            }
        }
        for result in &removed.results {
            if let Some(v) = self.values.get_mut(*result) {
                v.defining_op = None;
            }
        }
        if let Some(sym) = removed.symbol {
            self.op_by_symbol.remove(&sym);
        }
        true
    }

    /// Removes `value`, requiring its `users` set be empty and that no
    /// operation's results still reference it.
    ///
    /// Returns `false` if `value` was not present or the preconditions don't hold.
    pub fn erase_value(&mut self, value: ValueId) -> bool {
        let Some(v) = self.values.get(value) else {
            return false;
        };
        if !v.users.is_empty() || v.defining_op.is_some() {
            return false;
        }
        let symbol = v.symbol;
        self.values.erase(value);
        self.value_by_symbol.remove(&symbol);
        true
    }

    /// Looks up a value by id.
    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id)
    }

    /// Looks up an operation by id.
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id)
    }

    /// Looks up an operation mutably by id, primarily so callers can attach
    /// attributes after `createOperation` returns.
    pub fn operation_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.operations.get_mut(id)
    }

    /// Iterates operations in insertion order — the topological order the
    /// emitter relies on when breaking ties.
    pub fn operations_in_order(&self) -> impl Iterator<Item = (OperationId, &Operation)> {
        self.operations.iter()
    }

    /// Iterates live values in allocation order.
    pub fn values_in_order(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values.iter()
    }

    /// Finds the value with the given symbol, if any exists in this graph.
    pub fn find_value_by_symbol(&self, symbol: SymbolId) -> Option<ValueId> {
        self.value_by_symbol.get(&symbol).copied()
    }

    /// Finds the operation with the given symbol, if any exists in this graph.
    pub fn find_operation_by_symbol(&self, symbol: SymbolId) -> Option<OperationId> {
        self.op_by_symbol.get(&symbol).copied()
    }

    fn port_name_taken(&self, name: SymbolId) -> bool {
        self.input_ports.iter().any(|p| p.name == name)
            || self.output_ports.iter().any(|p| p.name == name)
            || self.inout_ports.iter().any(|p| p.name == name)
    }

    /// Registers `value` as an input port named `name`, flagging it accordingly.
    pub fn add_input_port(&mut self, name: SymbolId, value: ValueId) -> Result<(), GraphError> {
        if self.port_name_taken(name) {
            return Err(GraphError::DuplicatePortName);
        }
        self.values.get_mut(value).ok_or(GraphError::NotFound)?.port_role = PortRole::Input;
        self.input_ports.push(Port { name, value });
        Ok(())
    }

    /// Registers `value` as an output port named `name`, flagging it accordingly.
    pub fn add_output_port(&mut self, name: SymbolId, value: ValueId) -> Result<(), GraphError> {
        if self.port_name_taken(name) {
            return Err(GraphError::DuplicatePortName);
        }
        self.values.get_mut(value).ok_or(GraphError::NotFound)?.port_role = PortRole::Output;
        self.output_ports.push(Port { name, value });
        Ok(())
    }

    /// Registers the reader/driver/output-enable triple as an inout port
    /// named `name`, flagging all three values accordingly.
    pub fn add_inout_port(
        &mut self,
        name: SymbolId,
        input: ValueId,
        output: ValueId,
        output_enable: ValueId,
    ) -> Result<(), GraphError> {
        if self.port_name_taken(name) {
            return Err(GraphError::DuplicatePortName);
        }
        for v in [input, output, output_enable] {
            self.values.get_mut(v).ok_or(GraphError::NotFound)?.port_role = PortRole::Inout;
        }
        self.inout_ports.push(InoutPort {
            name,
            input,
            output,
            output_enable,
        });
        Ok(())
    }

    /// The ordered input port table.
    pub fn input_ports(&self) -> &[Port] {
        &self.input_ports
    }

    /// The ordered output port table.
    pub fn output_ports(&self) -> &[Port] {
        &self.output_ports
    }

    /// The ordered inout port table.
    pub fn inout_ports(&self) -> &[InoutPort] {
        &self.inout_ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_value_rejects_duplicate_symbol() {
        let mut g = Graph::new();
        let s = g.intern("a");
        g.create_value(s, 1, false, ValueType::Logic).unwrap();
        assert_eq!(
            g.create_value(s, 1, false, ValueType::Logic).unwrap_err(),
            GraphError::DuplicateSymbol
        );
    }

    #[test]
    fn symbol_space_shared_between_values_and_operations() {
        let mut g = Graph::new();
        let s = g.intern("x");
        g.create_value(s, 1, false, ValueType::Logic).unwrap();
        assert_eq!(
            g.create_operation(OperationKind::Add, Some(s)).unwrap_err(),
            GraphError::DuplicateSymbol
        );
    }

    #[test]
    fn add_operand_records_use_with_index() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let b_sym = g.intern("b");
        let a = g.create_value(a_sym, 8, false, ValueType::Logic).unwrap();
        let b = g.create_value(b_sym, 8, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Add, None).unwrap();
        g.add_operand(op, a).unwrap();
        g.add_operand(op, b).unwrap();
        assert_eq!(g.operation(op).unwrap().operands(), &[a, b]);
        assert_eq!(g.value(a).unwrap().users(), &[(op, 0)]);
        assert_eq!(g.value(b).unwrap().users(), &[(op, 1)]);
    }

    #[test]
    fn add_result_sets_defining_op_and_rejects_rebind() {
        let mut g = Graph::new();
        let r_sym = g.intern("r");
        let r = g.create_value(r_sym, 8, false, ValueType::Logic).unwrap();
        let op1 = g.create_operation(OperationKind::Add, None).unwrap();
        let op2 = g.create_operation(OperationKind::Sub, None).unwrap();
        g.add_result(op1, r).unwrap();
        assert_eq!(g.value(r).unwrap().defining_op(), Some(op1));
        assert_eq!(
            g.add_result(op2, r).unwrap_err(),
            GraphError::AlreadyDefined
        );
    }

    #[test]
    fn cross_graph_operand_rejected() {
        let mut g1 = Graph::new();
        let mut g2 = Graph::new();
        let s1 = g1.intern("a");
        let s2 = g2.intern("b");
        let v2 = g2.create_value(s2, 1, false, ValueType::Logic).unwrap();
        let op1 = g1.create_operation(OperationKind::Add, Some(s1)).unwrap();
        assert_eq!(
            g1.add_operand(op1, v2).unwrap_err(),
            GraphError::ForeignValue
        );
    }

    #[test]
    fn erase_op_clears_users_and_defining_op_but_keeps_result_value() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let r_sym = g.intern("r");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let r = g.create_value(r_sym, 1, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_operand(op, a).unwrap();
        g.add_result(op, r).unwrap();
        assert!(g.erase_op(op));
        assert!(g.value(a).unwrap().users().is_empty());
        assert!(g.value(r).unwrap().defining_op().is_none());
        assert!(g.value(r).is_some());
        assert!(!g.erase_op(op));
    }

    #[test]
    fn erase_value_requires_no_users_and_no_defining_op() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let r_sym = g.intern("r");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let r = g.create_value(r_sym, 1, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_operand(op, a).unwrap();
        g.add_result(op, r).unwrap();
        assert!(!g.erase_value(a));
        assert!(!g.erase_value(r));
        g.erase_op(op);
        assert!(g.erase_value(a));
        assert!(g.erase_value(r));
    }

    #[test]
    fn replace_result_transfers_defining_op_without_touching_other_users() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let b_sym = g.intern("b");
        let c_sym = g.intern("c");
        let consumer_sym = g.intern("consumer");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let b = g.create_value(b_sym, 1, false, ValueType::Logic).unwrap();
        let c = g.create_value(c_sym, 1, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_result(op, a).unwrap();
        let consumer = g
            .create_operation(OperationKind::Not, Some(consumer_sym))
            .unwrap();
        g.add_operand(consumer, b).unwrap();
        g.replace_result(op, 0, c).unwrap();
        assert_eq!(g.value(a).unwrap().defining_op(), None);
        assert_eq!(g.value(c).unwrap().defining_op(), Some(op));
        assert_eq!(g.value(b).unwrap().users(), &[(consumer, 0)]);
    }

    #[test]
    fn replace_operand_updates_users_at_same_index() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let b_sym = g.intern("b");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let b = g.create_value(b_sym, 1, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_operand(op, a).unwrap();
        g.replace_operand(op, 0, b).unwrap();
        assert!(g.value(a).unwrap().users().is_empty());
        assert_eq!(g.value(b).unwrap().users(), &[(op, 0)]);
        assert_eq!(g.operation(op).unwrap().operands(), &[b]);
    }

    #[test]
    fn ports_flag_role_and_reject_duplicate_names() {
        let mut g = Graph::new();
        let clk_sym = g.intern("clk");
        let q_sym = g.intern("q");
        let clk = g.create_value(clk_sym, 1, false, ValueType::Logic).unwrap();
        let q = g.create_value(q_sym, 1, false, ValueType::Logic).unwrap();
        g.add_input_port(clk_sym, clk).unwrap();
        g.add_output_port(q_sym, q).unwrap();
        assert_eq!(g.value(clk).unwrap().port_role(), PortRole::Input);
        assert_eq!(g.value(q).unwrap().port_role(), PortRole::Output);
        assert_eq!(
            g.add_output_port(clk_sym, q).unwrap_err(),
            GraphError::DuplicatePortName
        );
    }
}
