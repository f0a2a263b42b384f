//! Pre-scan declaration classification (§4.9 "Declarations").

use grh_ir::{Graph, OperationKind, PortRole, ValueId, ValueType};

/// The declaration bucket a named [`grh_ir::Value`] falls into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclKind {
    /// A module input port.
    InputPort,
    /// A module output port, not backed by state.
    OutputPort,
    /// A module output port backed by a `Register`/`Latch` — rendered `output reg`.
    OutputReg,
    /// An inout port leg.
    InoutPort,
    /// An ordinary combinational internal wire.
    Wire,
    /// A storage-backed internal signal (`Register`/`Latch` result).
    Reg,
    /// An opaque `Real`/`Str` scalar.
    Variable,
}

/// Whether `value`'s defining operation is a state declaration
/// (`Register`/`Latch`), i.e. it is the persistent-storage side of a signal.
pub fn is_state_backed(graph: &Graph, value: ValueId) -> bool {
    graph
        .value(value)
        .and_then(|v| v.defining_op())
        .and_then(|op| graph.operation(op))
        .map(|op| matches!(op.kind(), OperationKind::Register | OperationKind::Latch))
        .unwrap_or(false)
}

/// Classifies `value` for declaration purposes.
pub fn classify(graph: &Graph, value: ValueId) -> DeclKind {
    let Some(v) = graph.value(value) else {
        return DeclKind::Wire;
    };
    match v.port_role() {
        PortRole::Input => DeclKind::InputPort,
        PortRole::Inout => DeclKind::InoutPort,
        PortRole::Output => {
            if is_state_backed(graph, value) {
                DeclKind::OutputReg
            } else {
                DeclKind::OutputPort
            }
        }
        PortRole::None => {
            if v.ty() != ValueType::Logic {
                DeclKind::Variable
            } else if is_state_backed(graph, value) {
                DeclKind::Reg
            } else {
                DeclKind::Wire
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_ir::{Graph, OperationKind, ValueType};

    #[test]
    fn plain_input_port() {
        let mut g = Graph::new();
        let sym = g.intern("clk");
        let v = g.create_value(sym, 1, false, ValueType::Logic).unwrap();
        g.add_input_port(sym, v).unwrap();
        assert_eq!(classify(&g, v), DeclKind::InputPort);
    }

    #[test]
    fn output_backed_by_register_is_output_reg() {
        let mut g = Graph::new();
        let sym = g.intern("q");
        let v = g.create_value(sym, 8, false, ValueType::Logic).unwrap();
        let reg_op = g.create_operation(OperationKind::Register, None).unwrap();
        g.add_result(reg_op, v).unwrap();
        g.add_output_port(sym, v).unwrap();
        assert_eq!(classify(&g, v), DeclKind::OutputReg);
    }

    #[test]
    fn internal_register_result_is_reg() {
        let mut g = Graph::new();
        let sym = g.intern("state");
        let v = g.create_value(sym, 4, false, ValueType::Logic).unwrap();
        let reg_op = g.create_operation(OperationKind::Register, None).unwrap();
        g.add_result(reg_op, v).unwrap();
        assert_eq!(classify(&g, v), DeclKind::Reg);
    }

    #[test]
    fn plain_combinational_wire() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let out_sym = g.intern("b");
        let out = g.create_value(out_sym, 1, false, ValueType::Logic).unwrap();
        let not_op = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_operand(not_op, a).unwrap();
        g.add_result(not_op, out).unwrap();
        assert_eq!(classify(&g, out), DeclKind::Wire);
    }

    #[test]
    fn real_scalar_is_variable() {
        let mut g = Graph::new();
        let sym = g.intern("t");
        let v = g.create_value(sym, 1, false, ValueType::Real).unwrap();
        assert_eq!(classify(&g, v), DeclKind::Variable);
    }
}
