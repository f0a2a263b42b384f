//! [`Operation`] — a closed-kind, attributed node in the graph (§3 "Operation (node)").

use crate::attr::AttributeMap;
use crate::ids::{SymbolId, ValueId};
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// The closed set of operation kinds a [`Graph`](crate::graph::Graph) can hold.
///
/// Grouped to match the taxonomy: data producers, pure combinational ops,
/// state declarations, state ports, hierarchy, observer/effect nodes, DPI,
/// and the transient hierarchical-reference ops that must not survive past
/// the xmr-resolve pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OperationKind {
    // -- Data producers --
    /// A literal value. Carries `constValue: string`.
    Constant,

    // -- Pure combinational: arithmetic --
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // -- Pure combinational: bitwise --
    And,
    Or,
    Xor,
    Xnor,
    Not,

    // -- Pure combinational: logical --
    LogicAnd,
    LogicOr,
    LogicNot,

    // -- Pure combinational: shifts --
    Shl,
    LShr,
    AShr,

    // -- Pure combinational: comparisons --
    Eq,
    Ne,
    CaseEq,
    CaseNe,
    WildcardEq,
    WildcardNe,
    Lt,
    Le,
    Gt,
    Ge,

    // -- Pure combinational: reductions --
    ReduceAnd,
    ReduceOr,
    ReduceXor,
    ReduceNor,
    ReduceNand,
    ReduceXnor,

    // -- Pure combinational: selection --
    /// 3 operands: condition, then, else.
    Mux,

    // -- Pure combinational: structural --
    Assign,
    Concat,
    Replicate,
    SliceStatic,
    SliceDynamic,
    SliceArray,

    // -- State declarations --
    /// Attributes `width:int64, isSigned:bool`, optional `init*`.
    Register,
    /// Level-sensitive state declaration.
    Latch,
    /// Attributes `width, row, isSigned`, optional `initKind/initFile/initValue/initAddress`.
    Memory,

    // -- State ports --
    /// Operands: `updateCond, nextValue, mask, event*`; attrs include `regSymbol, eventEdge:vector<string>`.
    RegisterReadPort,
    RegisterWritePort,
    /// No event edges: level-sensitive.
    LatchReadPort,
    LatchWritePort,
    /// Operands: addr, enable.
    MemoryReadPort,
    /// Operands: updateCond, addr, data, mask, event*.
    MemoryWritePort,

    // -- Hierarchy --
    /// Attributes `moduleName, instanceName, inputPortName, outputPortName, inoutPortName, parameterNames, parameterValues`.
    Instance,
    Blackbox,

    // -- Observer/effect nodes --
    Display,
    Assert,
    /// Attr `name`.
    SystemTask,
    SystemFunction,

    // -- DPI --
    /// Attributes `argsName, argsDirection, argsWidth, argsType, argsSigned, hasReturn, returnWidth, returnSigned, returnType`.
    DpicImport,
    /// Operands: `updateCond, arg*, event*`; attrs `targetImportSymbol, inArgName, outArgName, inoutArgName, eventEdge, hasReturn`.
    DpicCall,

    // -- Hierarchical references (transient) --
    /// Must be resolved by the xmr-resolve pass; present at emission is a hard error.
    XMRRead,
    /// Must be resolved by the xmr-resolve pass; present at emission is a hard error.
    XMRWrite,
}

impl OperationKind {
    /// Whether this kind is one of the two transient XMR placeholder ops
    /// that the xmr-resolve pass must eliminate before emission.
    pub fn is_transient_xmr(self) -> bool {
        matches!(self, OperationKind::XMRRead | OperationKind::XMRWrite)
    }

    /// Whether this kind declares persistent state (register/latch/memory).
    pub fn is_state_decl(self) -> bool {
        matches!(
            self,
            OperationKind::Register | OperationKind::Latch | OperationKind::Memory
        )
    }
}

/// A node in the graph: a closed-kind operation with ordered operands,
/// ordered results, and an attribute map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Operation {
    pub(crate) kind: OperationKind,
    pub(crate) symbol: Option<SymbolId>,
    pub(crate) operands: Vec<ValueId>,
    pub(crate) results: Vec<ValueId>,
    pub(crate) attributes: AttributeMap,
    /// Source location used for provenance-only comments at emission.
    pub src_loc: Option<Span>,
}

impl Operation {
    /// Creates a new operation with no operands, results, or attributes.
    pub(crate) fn new(kind: OperationKind, symbol: Option<SymbolId>) -> Self {
        Self {
            kind,
            symbol,
            operands: Vec::new(),
            results: Vec::new(),
            attributes: AttributeMap::new(),
            src_loc: None,
        }
    }

    /// This operation's kind.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// This operation's (optional) unique symbol.
    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    /// The ordered list of operand values.
    pub fn operands(&self) -> &[ValueId] {
        &self.operands
    }

    /// The ordered list of result values.
    pub fn results(&self) -> &[ValueId] {
        &self.results
    }

    /// This operation's attribute map.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// A mutable view of this operation's attribute map.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_xmr_kinds() {
        assert!(OperationKind::XMRRead.is_transient_xmr());
        assert!(OperationKind::XMRWrite.is_transient_xmr());
        assert!(!OperationKind::Add.is_transient_xmr());
    }

    #[test]
    fn state_decl_kinds() {
        assert!(OperationKind::Register.is_state_decl());
        assert!(OperationKind::Latch.is_state_decl());
        assert!(OperationKind::Memory.is_state_decl());
        assert!(!OperationKind::RegisterReadPort.is_state_decl());
    }

    #[test]
    fn new_operation_has_no_operands_or_results() {
        let op = Operation::new(OperationKind::Add, None);
        assert!(op.operands().is_empty());
        assert!(op.results().is_empty());
        assert!(op.attributes().is_empty());
    }
}
