use rust_decimal::Decimal;

use crate::diagnostics::SourcePosition;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Number(Decimal),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Ordered children of a block, an argument list or an array literal.
pub type AstList = Vec<Node>;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub position: SourcePosition,
}

impl Node {
    pub fn new(kind: NodeKind, position: SourcePosition) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Literal(Literal),
    Variable(String),
    Assign {
        name: String,
        value: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    MemberAccess {
        receiver: Box<Node>,
        name: String,
    },
    AssignMember {
        receiver: Box<Node>,
        name: String,
        value: Box<Node>,
    },
    FunctionCall {
        function: Box<Node>,
        args: AstList,
    },
    InitArray(AstList),
    InitArrayByTo {
        from: Box<Node>,
        to: Box<Node>,
        step: Option<Box<Node>>,
    },
    ArrayItem {
        array: Box<Node>,
        index: Box<Node>,
    },
    AssignArrayItem {
        array: Box<Node>,
        index: Box<Node>,
        value: Box<Node>,
    },
    /// `elif` chains nest as another `If` in `otherwise`.
    If {
        test: Box<Node>,
        then_branch: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    /// Conditional loop: `for <test> ... end`.
    For {
        test: Box<Node>,
        body: Box<Node>,
    },
    ForEach {
        variable: String,
        list: Box<Node>,
        body: Box<Node>,
    },
    Block(AstList),
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Box<Node>,
    },
}

/// Root block of a parsed source.
#[derive(Debug, Clone)]
pub struct Program {
    pub source_name: String,
    pub body: AstList,
}
