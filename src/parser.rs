use std::{fmt, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use tracing::trace;

use crate::{
    ast::{AstList, BinaryOp, Literal, LogicalOp, Node, NodeKind, Program, UnaryOp},
    diagnostics::Diagnostic,
    lexer::Lexer,
    lookahead::LookaheadBuffer,
    token::{Token, TokenKind},
};

/// Tokens of lookahead the grammar needs: `name =` is recognised by peeking
/// one token past the identifier.
const LOOKAHEAD: usize = 2;

pub fn parse_program(source_name: &str, source: &str) -> Result<Program, Diagnostic> {
    let lexer = Lexer::new(Arc::<str>::from(source_name), source);
    let mut parser = Parser::new(lexer)?;
    let body = parser.parse_lines(&[TokenKind::EndOfFile])?;
    Ok(Program {
        source_name: source_name.to_string(),
        body,
    })
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: LookaheadBuffer<Token, LOOKAHEAD>,
}

impl<'a> Parser<'a> {
    fn new(mut lexer: Lexer<'a>) -> Result<Self, Diagnostic> {
        let mut lookahead = LookaheadBuffer::new();
        for _ in 0..LOOKAHEAD {
            lookahead.push(lexer.next_token()?);
        }
        Ok(Self { lexer, lookahead })
    }

    fn peek(&self) -> &Token {
        &self.lookahead[0]
    }

    fn peek_kind(&self, i: usize) -> TokenKind {
        self.lookahead[i].kind
    }

    /// Consumes the head token, refilling the buffer from the lexer.
    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let next = self.lexer.next_token()?;
        match self.lookahead.push(next) {
            Some(token) => Ok(token),
            None => unreachable!("lookahead buffer is primed before parsing"),
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.peek_kind(0) != kind {
            return Err(self.unexpected(kind));
        }
        self.advance()
    }

    fn unexpected(&self, expected: impl fmt::Display) -> Diagnostic {
        let found = self.peek();
        Diagnostic::syntax(
            found.position.clone(),
            format!("expected {expected} but found {}", found.kind),
        )
    }

    /// Parses statements until the head token is one of `terminators`,
    /// which is left unconsumed. Blank lines are skipped.
    fn parse_lines(&mut self, terminators: &[TokenKind]) -> Result<AstList, Diagnostic> {
        let mut body = Vec::new();
        loop {
            while self.peek_kind(0) == TokenKind::EndOfLine {
                self.advance()?;
            }
            let kind = self.peek_kind(0);
            if terminators.contains(&kind) {
                return Ok(body);
            }
            if kind == TokenKind::EndOfFile {
                return Err(self.unexpected(terminators[0]));
            }
            body.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> Result<Node, Diagnostic> {
        let statement =
            if self.peek_kind(0) == TokenKind::Identifier && self.peek_kind(1).is_assignment() {
                self.parse_variable_assignment()?
            } else {
                let expr = self.parse_expression()?;
                if self.peek_kind(0).is_assignment() {
                    self.parse_target_assignment(expr)?
                } else {
                    expr
                }
            };
        let terminator = self.peek_kind(0);
        if !terminator.ends_statement() {
            return Err(self.unexpected("end of line"));
        }
        if terminator == TokenKind::EndOfLine {
            self.advance()?;
        }
        trace!(line = statement.position.line, "parsed statement");
        Ok(statement)
    }

    fn parse_variable_assignment(&mut self) -> Result<Node, Diagnostic> {
        let ident = self.consume(TokenKind::Identifier)?;
        let op = self.advance()?;
        let value = self.parse_expression()?;
        let current = Node::new(
            NodeKind::Variable(ident.text.clone()),
            ident.position.clone(),
        );
        let value = desugar_compound(&op, current, value);
        Ok(Node::new(
            NodeKind::Assign {
                name: ident.text,
                value: Box::new(value),
            },
            ident.position,
        ))
    }

    fn parse_target_assignment(&mut self, target: Node) -> Result<Node, Diagnostic> {
        let op = self.advance()?;
        let value = self.parse_expression()?;
        let position = target.position.clone();
        let kind = match target.kind {
            NodeKind::Variable(name) => {
                let current = Node::new(NodeKind::Variable(name.clone()), position.clone());
                NodeKind::Assign {
                    name,
                    value: Box::new(desugar_compound(&op, current, value)),
                }
            }
            NodeKind::ArrayItem { array, index } => {
                let current = Node::new(
                    NodeKind::ArrayItem {
                        array: array.clone(),
                        index: index.clone(),
                    },
                    position.clone(),
                );
                NodeKind::AssignArrayItem {
                    array,
                    index,
                    value: Box::new(desugar_compound(&op, current, value)),
                }
            }
            NodeKind::MemberAccess { receiver, name } => {
                let current = Node::new(
                    NodeKind::MemberAccess {
                        receiver: receiver.clone(),
                        name: name.clone(),
                    },
                    position.clone(),
                );
                NodeKind::AssignMember {
                    receiver,
                    name,
                    value: Box::new(desugar_compound(&op, current, value)),
                }
            }
            _ => {
                return Err(Diagnostic::syntax(
                    op.position,
                    "invalid left-hand side of assignment",
                ));
            }
        };
        Ok(Node::new(kind, position))
    }

    fn parse_expression(&mut self) -> Result<Node, Diagnostic> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_and()?;
        while self.peek_kind(0) == TokenKind::Or {
            let op = self.advance()?;
            let right = self.parse_and()?;
            expr = logical(LogicalOp::Or, expr, right, op);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_comparison()?;
        while self.peek_kind(0) == TokenKind::And {
            let op = self.advance()?;
            let right = self.parse_comparison()?;
            expr = logical(LogicalOp::And, expr, right, op);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_range()?;
        while self.peek_kind(0).is_comparison_op() {
            let op = self.advance()?;
            let right = self.parse_range()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_range(&mut self) -> Result<Node, Diagnostic> {
        let from = self.parse_term()?;
        if self.peek_kind(0) != TokenKind::To {
            return Ok(from);
        }
        let to_token = self.advance()?;
        let to = self.parse_term()?;
        let step = if self.peek_kind(0) == TokenKind::Step {
            self.advance()?;
            Some(Box::new(self.parse_term()?))
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::InitArrayByTo {
                from: Box::new(from),
                to: Box::new(to),
                step,
            },
            to_token.position,
        ))
    }

    fn parse_term(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_factor()?;
        while self.peek_kind(0).is_term_op() {
            let op = self.advance()?;
            let right = self.parse_factor()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_unary()?;
        while self.peek_kind(0).is_factor_op() {
            let op = self.advance()?;
            let right = self.parse_unary()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Node, Diagnostic> {
        let mut ops = Vec::new();
        while self.peek_kind(0).is_unary_op() {
            ops.push(self.advance()?);
        }
        let mut expr = self.parse_postfix()?;
        for token in ops.into_iter().rev() {
            let op = match token.kind {
                TokenKind::Not => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Negate,
                other => unreachable!("{other} is not a unary operator"),
            };
            expr = Node::new(
                NodeKind::Unary {
                    op,
                    operand: Box::new(expr),
                },
                token.position,
            );
        }
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind(0) {
                TokenKind::Dot => {
                    let dot = self.advance()?;
                    let name = self.consume(TokenKind::Identifier)?;
                    expr = Node::new(
                        NodeKind::MemberAccess {
                            receiver: Box::new(expr),
                            name: name.text,
                        },
                        dot.position,
                    );
                }
                TokenKind::ParenLeft => {
                    let paren = self.advance()?;
                    let args = self.parse_list(TokenKind::ParenRight)?;
                    expr = Node::new(
                        NodeKind::FunctionCall {
                            function: Box::new(expr),
                            args,
                        },
                        paren.position,
                    );
                }
                TokenKind::SquareBracketLeft => {
                    let bracket = self.advance()?;
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::SquareBracketRight)?;
                    expr = Node::new(
                        NodeKind::ArrayItem {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        bracket.position,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma separated expressions up to and including `close`.
    fn parse_list(&mut self, close: TokenKind) -> Result<AstList, Diagnostic> {
        let mut items = Vec::new();
        if self.peek_kind(0) == close {
            self.advance()?;
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            match self.peek_kind(0) {
                TokenKind::Comma => {
                    self.advance()?;
                }
                kind if kind == close => {
                    self.advance()?;
                    return Ok(items);
                }
                _ => return Err(self.unexpected(close)),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Node, Diagnostic> {
        match self.peek_kind(0) {
            kind if kind.is_literal() => self.parse_literal(),
            TokenKind::Identifier => {
                let ident = self.advance()?;
                Ok(Node::new(NodeKind::Variable(ident.text), ident.position))
            }
            TokenKind::SquareBracketLeft => {
                let bracket = self.advance()?;
                let items = self.parse_list(TokenKind::SquareBracketRight)?;
                Ok(Node::new(NodeKind::InitArray(items), bracket.position))
            }
            TokenKind::ParenLeft => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.consume(TokenKind::ParenRight)?;
                Ok(expr)
            }
            TokenKind::Begin => self.parse_begin(),
            TokenKind::If => {
                let node = self.parse_if_arm()?;
                self.consume(TokenKind::End)?;
                Ok(node)
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Func => self.parse_function(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_literal(&mut self) -> Result<Node, Diagnostic> {
        let token = self.advance()?;
        let literal = match token.kind {
            TokenKind::NoneLiteral => Literal::None,
            TokenKind::TrueLiteral => Literal::Bool(true),
            TokenKind::FalseLiteral => Literal::Bool(false),
            TokenKind::StringLiteral => Literal::String(token.text),
            TokenKind::NumberLiteral => match Decimal::from_str(&token.text) {
                Ok(number) => Literal::Number(number),
                Err(_) => {
                    return Err(Diagnostic::syntax(
                        token.position,
                        format!("invalid number literal `{}`", token.text),
                    ));
                }
            },
            other => unreachable!("{other} is not a literal"),
        };
        Ok(Node::new(NodeKind::Literal(literal), token.position))
    }

    /// Statements up to (not including) one of `terminators`, as a scope.
    fn parse_block_body(
        &mut self,
        opener: &Token,
        terminators: &[TokenKind],
    ) -> Result<Node, Diagnostic> {
        let body = self.parse_lines(terminators)?;
        Ok(Node::new(NodeKind::Block(body), opener.position.clone()))
    }

    fn parse_begin(&mut self) -> Result<Node, Diagnostic> {
        let begin = self.consume(TokenKind::Begin)?;
        self.consume(TokenKind::EndOfLine)?;
        let block = self.parse_block_body(&begin, &[TokenKind::End])?;
        self.consume(TokenKind::End)?;
        Ok(block)
    }

    /// `if`/`elif` arm; the closing `end` belongs to the outermost `if`.
    fn parse_if_arm(&mut self) -> Result<Node, Diagnostic> {
        let token = self.advance()?;
        let test = self.parse_expression()?;
        self.consume(TokenKind::EndOfLine)?;
        let then_branch = self.parse_block_body(
            &token,
            &[TokenKind::End, TokenKind::Elif, TokenKind::Else],
        )?;
        let otherwise = match self.peek_kind(0) {
            TokenKind::Elif => Some(Box::new(self.parse_if_arm()?)),
            TokenKind::Else => {
                let else_token = self.advance()?;
                self.consume(TokenKind::EndOfLine)?;
                Some(Box::new(
                    self.parse_block_body(&else_token, &[TokenKind::End])?,
                ))
            }
            _ => None,
        };
        Ok(Node::new(
            NodeKind::If {
                test: Box::new(test),
                then_branch: Box::new(then_branch),
                otherwise,
            },
            token.position,
        ))
    }

    fn parse_for(&mut self) -> Result<Node, Diagnostic> {
        let token = self.consume(TokenKind::For)?;
        let is_foreach = self.peek_kind(0) == TokenKind::Identifier
            && matches!(self.peek_kind(1), TokenKind::Assign | TokenKind::In);
        let kind = if is_foreach {
            let variable = self.advance()?;
            self.advance()?;
            let list = self.parse_expression()?;
            self.consume(TokenKind::EndOfLine)?;
            let body = self.parse_block_body(&token, &[TokenKind::End])?;
            NodeKind::ForEach {
                variable: variable.text,
                list: Box::new(list),
                body: Box::new(body),
            }
        } else {
            let test = self.parse_expression()?;
            self.consume(TokenKind::EndOfLine)?;
            let body = self.parse_block_body(&token, &[TokenKind::End])?;
            NodeKind::For {
                test: Box::new(test),
                body: Box::new(body),
            }
        };
        self.consume(TokenKind::End)?;
        Ok(Node::new(kind, token.position))
    }

    fn parse_function(&mut self) -> Result<Node, Diagnostic> {
        let token = self.consume(TokenKind::Func)?;
        let name = if self.peek_kind(0) == TokenKind::Identifier {
            Some(self.advance()?.text)
        } else {
            None
        };
        self.consume(TokenKind::ParenLeft)?;
        let mut params: Vec<String> = Vec::new();
        if self.peek_kind(0) != TokenKind::ParenRight {
            loop {
                let param = self.consume(TokenKind::Identifier)?;
                if params.contains(&param.text) {
                    return Err(Diagnostic::syntax(
                        param.position,
                        format!("duplicate parameter `{}`", param.text),
                    ));
                }
                params.push(param.text);
                if self.peek_kind(0) != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::ParenRight)?;
        self.consume(TokenKind::EndOfLine)?;
        let body = self.parse_block_body(&token, &[TokenKind::End])?;
        self.consume(TokenKind::End)?;
        Ok(Node::new(
            NodeKind::Function {
                name,
                params,
                body: Box::new(body),
            },
            token.position,
        ))
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Equals => BinaryOp::Equals,
        TokenKind::NotEquals => BinaryOp::NotEquals,
        TokenKind::LessThan => BinaryOp::LessThan,
        TokenKind::LessThanOrEquals => BinaryOp::LessThanOrEquals,
        TokenKind::GreaterThan => BinaryOp::GreaterThan,
        TokenKind::GreaterThanOrEquals => BinaryOp::GreaterThanOrEquals,
        other => unreachable!("{other} is not a binary operator"),
    }
}

fn binary(op: Token, left: Node, right: Node) -> Node {
    Node::new(
        NodeKind::Binary {
            op: binary_op(op.kind),
            left: Box::new(left),
            right: Box::new(right),
        },
        op.position,
    )
}

fn logical(op: LogicalOp, left: Node, right: Node, token: Token) -> Node {
    Node::new(
        NodeKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        token.position,
    )
}

/// `target op= value` reads as `target = target op value`.
fn desugar_compound(op: &Token, current: Node, value: Node) -> Node {
    match op.kind.compound_operator() {
        Some(kind) => Node::new(
            NodeKind::Binary {
                op: binary_op(kind),
                left: Box::new(current),
                right: Box::new(value),
            },
            op.position.clone(),
        ),
        None => value,
    }
}
