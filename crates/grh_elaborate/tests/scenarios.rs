//! End-to-end elaboration scenarios, each hand-building an `AstModule` (no
//! parser is available) and asserting on the resulting `Graph` shape.

use grh_ast::{
    AlwaysKind, AstDesign, AstEdge, AstExpr, AstItem, AstModule, AstPort, AstStmt, AstType,
    Direction, EdgePolarity,
};
use grh_common::Ident;
use grh_diagnostics::DiagnosticSink;
use grh_ir::{ModuleSymbol, OperationKind};
use grh_source::Span;

/// A growable name table; `push` returns the `Ident` for the pushed text.
#[derive(Default)]
struct Names(Vec<String>);

impl Names {
    fn push(&mut self, text: &str) -> Ident {
        self.0.push(text.to_string());
        Ident::from_raw((self.0.len() - 1) as u32)
    }

    fn resolver(&self) -> impl Fn(Ident) -> String + '_ {
        move |id: Ident| self.0[id.as_raw() as usize].clone()
    }
}

fn logic(width: u32, signed: bool) -> AstType {
    AstType::Logic { width, signed }
}

fn port(name: Ident, direction: Direction, ty: AstType) -> AstPort {
    AstPort { name, direction, ty, span: Span::DUMMY }
}

fn module(name: Ident, ports: Vec<AstPort>, decls: Vec<AstItem>, body: Vec<AstItem>) -> AstModule {
    AstModule { name, params: Vec::new(), ports, decls, body, span: Span::DUMMY }
}

fn design(top: Ident, modules: Vec<AstModule>) -> AstDesign {
    AstDesign { modules, top: Some(top) }
}

#[test]
fn inout_port_shares_one_value_across_the_triple() {
    let mut names = Names::default();
    let m = names.push("iobuf");
    let pad = names.push("pad");

    let module = module(m, vec![port(pad, Direction::Inout, logic(1, false))], vec![], vec![]);
    let d = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let netlist = grh_elaborate::elaborate_design(&d, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get(&ModuleSymbol::new("iobuf")).unwrap();
    assert_eq!(graph.inout_ports().len(), 1);
    let p = &graph.inout_ports()[0];
    assert_eq!(p.input, p.output);
    assert_eq!(p.output, p.output_enable);
}

#[test]
fn synchronous_reset_register_gets_a_register_write_port() {
    let mut names = Names::default();
    let m = names.push("reg_sync");
    let clk = names.push("clk");
    let rst = names.push("rst");
    let d = names.push("d");
    let q = names.push("q");

    let body = AstStmt::If {
        cond: AstExpr::Ref(rst),
        then_branch: Box::new(AstStmt::Assign {
            target: AstExpr::Ref(q),
            value: AstExpr::Const("8'd0".to_string()),
            blocking: false,
            span: Span::DUMMY,
        }),
        else_branch: Some(Box::new(AstStmt::Assign {
            target: AstExpr::Ref(q),
            value: AstExpr::Ref(d),
            blocking: false,
            span: Span::DUMMY,
        })),
        span: Span::DUMMY,
    };
    let always = AstItem::Always {
        kind: AlwaysKind::Ff,
        edges: vec![AstEdge { polarity: EdgePolarity::Posedge, signal: clk }],
        body,
        span: Span::DUMMY,
    };

    let ports = vec![
        port(clk, Direction::In, logic(1, false)),
        port(rst, Direction::In, logic(1, false)),
        port(d, Direction::In, logic(8, false)),
        port(q, Direction::Out, logic(8, false)),
    ];
    let module = module(m, ports, vec![], vec![always]);
    let des = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let netlist = grh_elaborate::elaborate_design(&des, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get(&ModuleSymbol::new("reg_sync")).unwrap();
    let register = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::Register)
        .expect("a Register state decl");
    let q_value = register.1.results()[0];
    assert_eq!(graph.value(q_value).unwrap().width(), 8);

    let write_port = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::RegisterWritePort)
        .expect("a RegisterWritePort")
        .1;
    assert_eq!(write_port.operands().len(), 4, "updateCond, nextValue, mask, posedge clk");
    assert_eq!(
        write_port.attributes().get("regSymbol").and_then(|v| v.as_str()),
        Some("q")
    );
    let edges = write_port.attributes().get("eventEdge").and_then(|v| v.as_vec_str());
    assert_eq!(edges, Some(&vec!["posedge".to_string()][..]));
}

#[test]
fn level_sensitive_latch_gets_a_latch_write_port_with_no_event_edges() {
    let mut names = Names::default();
    let m = names.push("latch_demo");
    let en = names.push("en");
    let d = names.push("d");
    let q = names.push("q");

    let body = AstStmt::If {
        cond: AstExpr::Ref(en),
        then_branch: Box::new(AstStmt::Assign {
            target: AstExpr::Ref(q),
            value: AstExpr::Ref(d),
            blocking: true,
            span: Span::DUMMY,
        }),
        else_branch: None,
        span: Span::DUMMY,
    };
    let always = AstItem::Always { kind: AlwaysKind::Latch, edges: vec![], body, span: Span::DUMMY };

    let ports = vec![
        port(en, Direction::In, logic(1, false)),
        port(d, Direction::In, logic(4, false)),
        port(q, Direction::Out, logic(4, false)),
    ];
    let module = module(m, ports, vec![], vec![always]);
    let des = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let netlist = grh_elaborate::elaborate_design(&des, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get(&ModuleSymbol::new("latch_demo")).unwrap();
    assert!(graph.operations_in_order().any(|(_, op)| op.kind() == OperationKind::Latch));

    let write_port = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::LatchWritePort)
        .expect("a LatchWritePort")
        .1;
    assert_eq!(write_port.operands().len(), 3, "updateCond, nextValue, mask; no event operands");
    assert!(write_port.attributes().get("eventEdge").is_none());
    assert_eq!(
        write_port.attributes().get("regSymbol").and_then(|v| v.as_str()),
        Some("q")
    );
}

#[test]
fn masked_memory_write_via_indexed_procedural_assign() {
    let mut names = Names::default();
    let m = names.push("mem_demo");
    let clk = names.push("clk");
    let addr = names.push("addr");
    let din = names.push("din");
    let be = names.push("be");
    let mem = names.push("mem");

    let mem_decl = AstItem::MemDecl { name: mem, element_ty: logic(2, false), depth: 16, span: Span::DUMMY };

    // always_ff @(posedge clk) begin
    //   if (be[0]) mem[addr][0] <= din[0];
    //   if (be[1]) mem[addr][1] <= din[1];
    // end
    let bit_write = |bit: i64| AstStmt::If {
        cond: AstExpr::Index {
            base: Box::new(AstExpr::Ref(be)),
            index: Box::new(AstExpr::Const(bit.to_string())),
            span: Span::DUMMY,
        },
        then_branch: Box::new(AstStmt::Assign {
            target: AstExpr::Index {
                base: Box::new(AstExpr::Index {
                    base: Box::new(AstExpr::Ref(mem)),
                    index: Box::new(AstExpr::Ref(addr)),
                    span: Span::DUMMY,
                }),
                index: Box::new(AstExpr::Const(bit.to_string())),
                span: Span::DUMMY,
            },
            value: AstExpr::Index {
                base: Box::new(AstExpr::Ref(din)),
                index: Box::new(AstExpr::Const(bit.to_string())),
                span: Span::DUMMY,
            },
            blocking: false,
            span: Span::DUMMY,
        }),
        else_branch: None,
        span: Span::DUMMY,
    };
    let always = AstItem::Always {
        kind: AlwaysKind::Ff,
        edges: vec![AstEdge { polarity: EdgePolarity::Posedge, signal: clk }],
        body: AstStmt::Block(vec![bit_write(0), bit_write(1)]),
        span: Span::DUMMY,
    };

    let ports = vec![
        port(clk, Direction::In, logic(1, false)),
        port(addr, Direction::In, logic(4, false)),
        port(din, Direction::In, logic(2, false)),
        port(be, Direction::In, logic(2, false)),
    ];
    let module = module(m, ports, vec![mem_decl], vec![always]);
    let des = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let netlist = grh_elaborate::elaborate_design(&des, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get(&ModuleSymbol::new("mem_demo")).unwrap();
    assert!(graph.operations_in_order().any(|(_, op)| op.kind() == OperationKind::Memory));
    let write_port = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::MemoryWritePort)
        .expect("a MemoryWritePort")
        .1;
    assert_eq!(write_port.operands().len(), 4, "updateCond, addr, data, mask");
    assert_eq!(
        write_port.attributes().get("memSymbol").and_then(|v| v.as_str()),
        Some("mem")
    );

    let mask_value = write_port.operands()[3];
    let mask_op = graph.value(mask_value).unwrap().defining_op().expect("mask is computed, not a bare port");
    assert_eq!(
        graph.operation(mask_op).unwrap().kind(),
        OperationKind::Concat,
        "a per-bit mask combines each guarded bit's enable, it is not a hard-coded all-ones literal"
    );
}

#[test]
fn dpi_call_with_inline_return_feeds_a_register_write_port() {
    let mut names = Names::default();
    let m = names.push("dpi_demo");
    let clk = names.push("clk");
    let calc = names.push("calc");
    let a = names.push("a");
    let b = names.push("b");
    let sum = names.push("sum");

    let import = AstItem::DpiImport {
        name: calc,
        arg_names: vec![a, b],
        arg_directions: vec![Direction::In, Direction::In],
        arg_types: vec![logic(8, false), logic(8, false)],
        return_type: Some(logic(8, false)),
        span: Span::DUMMY,
    };
    // always_ff @(posedge clk) sum <= calc(a, b);
    let always = AstItem::Always {
        kind: AlwaysKind::Ff,
        edges: vec![AstEdge { polarity: EdgePolarity::Posedge, signal: clk }],
        body: AstStmt::Assign {
            target: AstExpr::Ref(sum),
            value: AstExpr::DpiCall { target: calc, args: vec![AstExpr::Ref(a), AstExpr::Ref(b)], span: Span::DUMMY },
            blocking: false,
            span: Span::DUMMY,
        },
        span: Span::DUMMY,
    };

    let ports = vec![
        port(clk, Direction::In, logic(1, false)),
        port(a, Direction::In, logic(8, false)),
        port(b, Direction::In, logic(8, false)),
        port(sum, Direction::Out, logic(8, false)),
    ];
    let module = module(m, ports, vec![import], vec![always]);
    let des = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let netlist = grh_elaborate::elaborate_design(&des, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get(&ModuleSymbol::new("dpi_demo")).unwrap();
    let dpi_import = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::DpicImport)
        .expect("a DpicImport")
        .1;
    assert_eq!(dpi_import.attributes().get("hasReturn").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(dpi_import.attributes().get("returnWidth").and_then(|v| v.as_int()), Some(8));

    let dpi_call = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::DpicCall)
        .expect("a DpicCall")
        .1;
    let dpi_result = dpi_call.results()[0];

    let write_port = graph
        .operations_in_order()
        .find(|(_, op)| op.kind() == OperationKind::RegisterWritePort)
        .expect("a RegisterWritePort")
        .1;
    assert_eq!(
        write_port.operands()[1], dpi_result,
        "the DPI call's return feeds the register's next-value operand directly, not a continuous assign"
    );
    assert!(!graph.operations_in_order().any(|(_, op)| op.kind() == OperationKind::Assign));
}

#[test]
fn unrolled_generate_block_declares_every_iteration_wire() {
    let mut names = Names::default();
    let m = names.push("gen_demo");
    let genvar = names.push("i");
    let w0 = names.push("w0");
    let w1 = names.push("w1");

    let generate = AstItem::Generate {
        genvar,
        bound: 2,
        body: vec![
            AstItem::NetDecl { name: w0, ty: logic(1, false), span: Span::DUMMY },
            AstItem::ContinuousAssign {
                target: AstExpr::Ref(w0),
                value: AstExpr::Const("1'b1".to_string()),
                span: Span::DUMMY,
            },
            AstItem::NetDecl { name: w1, ty: logic(1, false), span: Span::DUMMY },
            AstItem::ContinuousAssign {
                target: AstExpr::Ref(w1),
                value: AstExpr::Const("1'b0".to_string()),
                span: Span::DUMMY,
            },
        ],
        span: Span::DUMMY,
    };

    let module = module(m, vec![], vec![], vec![generate]);
    let des = design(m, vec![module]);

    let sink = DiagnosticSink::new();
    let mut netlist = grh_elaborate::elaborate_design(&des, &names.resolver(), &sink);
    assert!(!sink.has_errors());

    let graph = netlist.get_mut(&ModuleSymbol::new("gen_demo")).unwrap();
    for wire in ["w0", "w1"] {
        let symbol = graph.intern(wire);
        let value = graph.find_value_by_symbol(symbol).expect("generate-unrolled wire should exist");
        assert!(graph.value(value).unwrap().defining_op().is_some());
    }
}
