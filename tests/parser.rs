use rust_decimal::Decimal;
use solfege::{
    ast::{BinaryOp, Literal, LogicalOp, Node, NodeKind, UnaryOp},
    diagnostics::DiagnosticKind,
    parser::parse_program,
};

fn parse(source: &str) -> Vec<Node> {
    parse_program("test", source)
        .expect("parse should succeed")
        .body
}

fn parse_one(source: &str) -> Node {
    let mut body = parse(source);
    assert_eq!(body.len(), 1, "expected a single statement");
    body.remove(0)
}

fn parse_error(source: &str) -> String {
    let err = parse_program("test", source).expect_err("parse should fail");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    err.message
}

fn number(node: &Node) -> Decimal {
    match &node.kind {
        NodeKind::Literal(Literal::Number(n)) => *n,
        other => panic!("expected number literal, found {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let node = parse_one("1 + 2 * 3");
    match node.kind {
        NodeKind::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } => {
            assert_eq!(number(&left), Decimal::from(1));
            assert!(matches!(
                right.kind,
                NodeKind::Binary {
                    op: BinaryOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn subtraction_is_left_associative() {
    let node = parse_one("8 - 4 - 2");
    match node.kind {
        NodeKind::Binary {
            op: BinaryOp::Subtract,
            left,
            right,
        } => {
            assert!(matches!(left.kind, NodeKind::Binary { .. }));
            assert_eq!(number(&right), Decimal::from(2));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn logical_operators_sit_below_comparison() {
    let node = parse_one("a < b or c and not d");
    match node.kind {
        NodeKind::Logical {
            op: LogicalOp::Or,
            left,
            right,
        } => {
            assert!(matches!(
                left.kind,
                NodeKind::Binary {
                    op: BinaryOp::LessThan,
                    ..
                }
            ));
            match right.kind {
                NodeKind::Logical {
                    op: LogicalOp::And,
                    right,
                    ..
                } => assert!(matches!(
                    right.kind,
                    NodeKind::Unary {
                        op: UnaryOp::Not,
                        ..
                    }
                )),
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn identifier_followed_by_assignment_is_a_variable_assignment() {
    let node = parse_one("total = 1");
    assert!(matches!(node.kind, NodeKind::Assign { ref name, .. } if name == "total"));
}

#[test]
fn compound_assignment_desugars() {
    let node = parse_one("x += 2");
    match node.kind {
        NodeKind::Assign { name, value } => {
            assert_eq!(name, "x");
            match value.kind {
                NodeKind::Binary {
                    op: BinaryOp::Add,
                    left,
                    right,
                } => {
                    assert!(matches!(left.kind, NodeKind::Variable(ref v) if v == "x"));
                    assert_eq!(number(&right), Decimal::from(2));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn indexed_and_member_targets() {
    let body = parse("a[0] = 1\no.name *= 3\n");
    assert!(matches!(body[0].kind, NodeKind::AssignArrayItem { .. }));
    match &body[1].kind {
        NodeKind::AssignMember { name, value, .. } => {
            assert_eq!(name, "name");
            assert!(matches!(
                value.kind,
                NodeKind::Binary {
                    op: BinaryOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn literal_target_is_rejected() {
    assert!(parse_error("1 = 2").contains("invalid left-hand side"));
}

#[test]
fn range_with_step() {
    let node = parse_one("10 to 0 step -2");
    match node.kind {
        NodeKind::InitArrayByTo { from, to, step } => {
            assert_eq!(number(&from), Decimal::from(10));
            assert_eq!(number(&to), Decimal::ZERO);
            let step = step.expect("step");
            assert!(matches!(
                step.kind,
                NodeKind::Unary {
                    op: UnaryOp::Negate,
                    ..
                }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn elif_chains_nest() {
    let node = parse_one("if a\n1\nelif b\n2\nelse\n3\nend");
    match node.kind {
        NodeKind::If {
            then_branch,
            otherwise,
            ..
        } => {
            assert!(matches!(then_branch.kind, NodeKind::Block(_)));
            let otherwise = otherwise.expect("elif arm");
            match otherwise.kind {
                NodeKind::If { otherwise, .. } => {
                    assert!(matches!(
                        otherwise.expect("else arm").kind,
                        NodeKind::Block(_)
                    ));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn for_forms() {
    let body = parse("for i = 0 to 2\ni\nend\nfor x in xs\nx\nend\nfor n < 3\nn += 1\nend\n");
    assert!(matches!(body[0].kind, NodeKind::ForEach { ref variable, .. } if variable == "i"));
    assert!(matches!(body[1].kind, NodeKind::ForEach { ref variable, .. } if variable == "x"));
    assert!(matches!(body[2].kind, NodeKind::For { .. }));
}

#[test]
fn function_definitions() {
    let body = parse("func add(a, b)\na + b\nend\nf = func()\n1\nend\n");
    match &body[0].kind {
        NodeKind::Function { name, params, .. } => {
            assert_eq!(name.as_deref(), Some("add"));
            assert_eq!(params, &["a", "b"]);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &body[1].kind {
        NodeKind::Assign { value, .. } => {
            assert!(matches!(value.kind, NodeKind::Function { name: None, .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn duplicate_parameters_are_rejected() {
    assert!(parse_error("func f(a, a)\nend").contains("duplicate parameter"));
}

#[test]
fn postfix_chains() {
    let node = parse_one("Console.WriteLine(xs[0])(1)");
    match node.kind {
        NodeKind::FunctionCall { function, args } => {
            assert_eq!(args.len(), 1);
            match function.kind {
                NodeKind::FunctionCall { function, args } => {
                    assert!(matches!(args[0].kind, NodeKind::ArrayItem { .. }));
                    assert!(matches!(function.kind, NodeKind::MemberAccess { ref name, .. } if name == "WriteLine"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn blank_lines_are_skipped() {
    assert_eq!(parse("\n\n1\n\n\n2\n\n").len(), 2);
    assert!(parse("").is_empty());
}

#[test]
fn statement_must_end_the_line() {
    let message = parse_error("1 2");
    assert_eq!(message, "expected end of line but found NumberLiteral");
}

#[test]
fn missing_end_is_reported() {
    let err = parse_program("test", "begin\n1\n").expect_err("missing end");
    assert_eq!(err.message, "expected End but found EndOfFile");
    let position = err.position.expect("position");
    assert_eq!(position.line, 3);
}

#[test]
fn missing_expression_is_reported() {
    assert_eq!(parse_error("x = )"), "expected expression but found ParenRight");
}

#[test]
fn grouping_overrides_precedence() {
    let node = parse_one("(1 + 2) * 3");
    assert!(matches!(
        node.kind,
        NodeKind::Binary {
            op: BinaryOp::Multiply,
            ..
        }
    ));
}
