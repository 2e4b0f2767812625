//! Recursive descent parser for the JavaScript subset
//!
//! Every node records the byte range it was parsed from: `start` is the
//! first byte of its first token and `end` is one past its last token.
//! Declarations and expression statements include their semicolon.

use crate::error::ParseError;
use crate::lexer::{Lexer, Token};
use minjs_core::ast::{
    AssignmentOperator, BinaryOperator, DeclarationKind, Graph, Literal, LogicalOperator, Node,
    NodeId, UnaryOperator, UpdateOperator,
};
use std::ops::Range;
use tracing::{debug, trace};

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    graph: Graph,
    current: Option<Token<'a>>,
    /// Span of `current`
    span: Range<usize>,
    /// End offset of the last consumed token
    position: usize,
    /// Current parsing depth to prevent stack overflow
    depth: usize,
    /// Maximum allowed parsing depth
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Default maximum parsing depth
    const DEFAULT_MAX_DEPTH: usize = 512;

    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let span = if current.is_some() { lexer.span() } else { 0..0 };
        Self {
            source,
            lexer,
            graph: Graph::new(),
            current,
            span,
            position: 0,
            depth: 0,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum parsing depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn parse(mut self) -> ParseResult<Graph> {
        let mut body = Vec::new();
        while self.current.is_some() {
            body.push(self.parse_statement()?);
        }

        let root = self
            .graph
            .add_node_with_span(Node::Program { body }, 0, self.source.len())?;
        self.graph.root_id = Some(root);

        debug!(nodes = self.graph.nodes.len(), "parsed program");
        Ok(self.graph)
    }

    /// Check and increment depth, returning error if max depth exceeded
    fn enter_recursion(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Decrement depth when leaving a recursive call
    fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn guarded(&mut self, parse: fn(&mut Self) -> ParseResult<NodeId>) -> ParseResult<NodeId> {
        self.enter_recursion()?;
        let result = parse(self);
        self.exit_recursion();
        result
    }

    // ===== Statements =====

    fn parse_statement(&mut self) -> ParseResult<NodeId> {
        self.guarded(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        match self.current {
            Some(Token::LBrace) => self.parse_block(),
            Some(Token::Semicolon) => {
                self.advance();
                self.finish(Node::Empty, start)
            }
            Some(Token::Var | Token::Let | Token::Const) => {
                let (kind, declarations) = self.parse_declarators()?;
                self.consume_semicolon()?;
                let declaration = self.finish(Node::VariableDeclaration { kind, declarations }, start)?;
                self.check_initialized(declaration)?;
                Ok(declaration)
            }
            Some(Token::Function) => self.parse_function(true),
            Some(Token::Return) => {
                self.advance();
                let argument = match self.current {
                    Some(Token::Semicolon | Token::RBrace) | None => None,
                    _ => Some(self.parse_expression()?),
                };
                self.consume_semicolon()?;
                self.finish(Node::Return { argument }, start)
            }
            Some(Token::If) => {
                self.advance();
                let test = self.parse_condition()?;
                let consequent = self.parse_statement()?;
                let alternate = if matches!(self.current, Some(Token::Else)) {
                    self.advance();
                    Some(self.parse_statement()?)
                } else {
                    None
                };
                self.finish(
                    Node::If {
                        test,
                        consequent,
                        alternate,
                    },
                    start,
                )
            }
            Some(Token::For) => self.parse_for(),
            Some(Token::While) => {
                self.advance();
                let test = self.parse_condition()?;
                let body = self.parse_statement()?;
                self.finish(Node::While { test, body }, start)
            }
            Some(Token::Do) => {
                self.advance();
                let body = self.parse_statement()?;
                self.consume(Token::While)?;
                let test = self.parse_condition()?;
                if matches!(self.current, Some(Token::Semicolon)) {
                    self.advance();
                }
                self.finish(Node::DoWhile { body, test }, start)
            }
            Some(Token::Break) => {
                self.advance();
                self.consume_semicolon()?;
                self.finish(Node::Break, start)
            }
            Some(Token::Continue) => {
                self.advance();
                self.consume_semicolon()?;
                self.finish(Node::Continue, start)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                self.finish(Node::ExpressionStatement { expression }, start)
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        self.consume(Token::LBrace)?;
        let mut body = Vec::new();
        while !matches!(self.current, Some(Token::RBrace)) {
            if self.current.is_none() {
                return Err(ParseError::UnclosedDelimiter("{".to_string()));
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        self.finish(Node::Block { body }, start)
    }

    /// `( expression )` after `if`, `while` and `do ... while`
    fn parse_condition(&mut self) -> ParseResult<NodeId> {
        self.consume(Token::LParen)?;
        let test = self.parse_expression()?;
        self.close(Token::RParen, "(")?;
        Ok(test)
    }

    /// The declarators of a `var`/`let`/`const` declaration, without the
    /// trailing semicolon.
    fn parse_declarators(&mut self) -> ParseResult<(DeclarationKind, Vec<NodeId>)> {
        let kind = match self.current {
            Some(Token::Var) => DeclarationKind::Var,
            Some(Token::Let) => DeclarationKind::Let,
            Some(Token::Const) => DeclarationKind::Const,
            _ => return Err(self.unexpected("declaration")),
        };
        self.advance();

        let mut declarations = Vec::new();
        loop {
            let start = self.span.start;
            let id = self.parse_binding_identifier()?;
            let init = if matches!(self.current, Some(Token::Eq)) {
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(self.finish(Node::VariableDeclarator { id, init }, start)?);

            if !matches!(self.current, Some(Token::Comma)) {
                break;
            }
            self.advance();
        }
        Ok((kind, declarations))
    }

    /// `const` needs an initializer everywhere but the head of a for-in/of.
    fn check_initialized(&self, declaration: NodeId) -> ParseResult<()> {
        if let Some(Node::VariableDeclaration {
            kind: DeclarationKind::Const,
            declarations,
        }) = self.graph.get_node(declaration)
        {
            let missing = declarations.iter().any(|declarator| {
                matches!(
                    self.graph.get_node(*declarator),
                    Some(Node::VariableDeclarator { init: None, .. })
                )
            });
            if missing {
                return Err(ParseError::InvalidSyntax(
                    "Missing initializer in const declaration".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        self.consume(Token::For)?;
        self.consume(Token::LParen)?;

        let init = match self.current {
            Some(Token::Semicolon) => None,
            Some(Token::Var | Token::Let | Token::Const) => {
                let init_start = self.span.start;
                let (kind, declarations) = self.parse_declarators()?;
                Some(self.finish(Node::VariableDeclaration { kind, declarations }, init_start)?)
            }
            _ => Some(self.parse_expression()?),
        };

        if let Some(left) = init {
            let is_in = matches!(self.current, Some(Token::In));
            let is_of = matches!(self.current, Some(Token::Ident("of")));
            if is_in || is_of {
                self.check_for_left(left)?;
                self.advance();
                let right = if is_of {
                    self.parse_assignment()?
                } else {
                    self.parse_expression()?
                };
                self.close(Token::RParen, "(")?;
                let body = self.parse_statement()?;
                let node = if is_of {
                    Node::ForOf { left, right, body }
                } else {
                    Node::ForIn { left, right, body }
                };
                return self.finish(node, start);
            }
            self.check_initialized(left)?;
        }

        self.consume(Token::Semicolon)?;
        let test = match self.current {
            Some(Token::Semicolon) => None,
            _ => Some(self.parse_expression()?),
        };
        self.consume(Token::Semicolon)?;
        let update = match self.current {
            Some(Token::RParen) => None,
            _ => Some(self.parse_expression()?),
        };
        self.close(Token::RParen, "(")?;
        let body = self.parse_statement()?;

        self.finish(
            Node::For {
                init,
                test,
                update,
                body,
            },
            start,
        )
    }

    /// The left side of a for-in/of is a single uninitialized declarator or
    /// an assignable expression.
    fn check_for_left(&self, left: NodeId) -> ParseResult<()> {
        let valid = match self.graph.get_node(left) {
            Some(Node::VariableDeclaration { declarations, .. }) => {
                declarations.len() == 1
                    && matches!(
                        self.graph.get_node(declarations[0]),
                        Some(Node::VariableDeclarator { init: None, .. })
                    )
            }
            Some(Node::Identifier { .. } | Node::Member { .. }) => true,
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(
                "Invalid left-hand side in for-in/of loop".to_string(),
            ))
        }
    }

    fn parse_function(&mut self, declaration: bool) -> ParseResult<NodeId> {
        let start = self.span.start;
        self.consume(Token::Function)?;

        let id = match self.current {
            Some(Token::Ident(_)) => Some(self.parse_binding_identifier()?),
            _ if declaration => return Err(self.unexpected("function name")),
            _ => None,
        };

        self.consume(Token::LParen)?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;

        match (declaration, id) {
            (true, Some(id)) => self.finish(Node::FunctionDeclaration { id, params, body }, start),
            (_, id) => self.finish(Node::FunctionExpression { id, params, body }, start),
        }
    }

    /// Parameter names up to and including the closing `)`
    fn parse_params(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut params = Vec::new();
        while !matches!(self.current, Some(Token::RParen)) {
            params.push(self.parse_binding_identifier()?);
            if matches!(self.current, Some(Token::Comma)) {
                self.advance();
            } else {
                break;
            }
        }
        self.close(Token::RParen, "(")?;
        Ok(params)
    }

    fn parse_binding_identifier(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        match self.current {
            Some(Token::Ident(name)) => {
                self.advance();
                self.finish(
                    Node::Identifier {
                        name: name.to_string(),
                    },
                    start,
                )
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    // ===== Expressions =====

    fn parse_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let first = self.parse_assignment()?;
        if !matches!(self.current, Some(Token::Comma)) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while matches!(self.current, Some(Token::Comma)) {
            self.advance();
            expressions.push(self.parse_assignment()?);
        }
        self.finish(Node::Sequence { expressions }, start)
    }

    fn parse_assignment(&mut self) -> ParseResult<NodeId> {
        self.guarded(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> ParseResult<NodeId> {
        if self.at_arrow() {
            return self.parse_arrow();
        }

        let start = self.span.start;
        let target = self.parse_conditional()?;
        let operator = match self.current {
            Some(Token::Eq) => AssignmentOperator::Assign,
            Some(Token::PlusEq) => AssignmentOperator::AddAssign,
            Some(Token::MinusEq) => AssignmentOperator::SubAssign,
            Some(Token::StarEq) => AssignmentOperator::MulAssign,
            Some(Token::SlashEq) => AssignmentOperator::DivAssign,
            Some(Token::PercentEq) => AssignmentOperator::RemAssign,
            _ => return Ok(target),
        };
        self.check_assignable(target)?;
        self.advance();

        // Right-associative: a = b = c
        let value = self.parse_assignment()?;
        self.finish(
            Node::Assignment {
                operator,
                target,
                value,
            },
            start,
        )
    }

    fn check_assignable(&self, target: NodeId) -> ParseResult<()> {
        match self.graph.get_node(target) {
            Some(Node::Identifier { .. } | Node::Member { .. }) => Ok(()),
            _ => Err(ParseError::InvalidSyntax(
                "Invalid assignment target".to_string(),
            )),
        }
    }

    /// Looks past the current token for `=>` without consuming anything.
    fn at_arrow(&mut self) -> bool {
        match self.current {
            Some(Token::Ident(_)) => matches!(self.lexer.peek_token(), Some(Token::FatArrow)),
            Some(Token::LParen) => {
                let mut lookahead = self.lexer.clone();
                let mut depth = 1usize;
                while let Some(token) = lookahead.next_token() {
                    match token {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(lookahead.next_token(), Some(Token::FatArrow));
                            }
                        }
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let params = match self.current {
            Some(Token::Ident(_)) => vec![self.parse_binding_identifier()?],
            _ => {
                self.consume(Token::LParen)?;
                self.parse_params()?
            }
        };
        self.consume(Token::FatArrow)?;

        let body = if matches!(self.current, Some(Token::LBrace)) {
            self.parse_block()?
        } else {
            self.parse_assignment()?
        };
        trace!(params = params.len(), "parsed arrow function");
        self.finish(Node::ArrowFunction { params, body }, start)
    }

    fn parse_conditional(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let test = self.parse_or_expression()?;
        if !matches!(self.current, Some(Token::Question)) {
            return Ok(test);
        }
        self.advance();
        let consequent = self.parse_assignment()?;
        self.consume(Token::Colon)?;
        let alternate = self.parse_assignment()?;
        self.finish(
            Node::Conditional {
                test,
                consequent,
                alternate,
            },
            start,
        )
    }

    fn parse_or_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_and_expression()?;

        loop {
            let operator = match self.current {
                Some(Token::OrOr) => LogicalOperator::Or,
                Some(Token::QuestionQuestion) => LogicalOperator::Nullish,
                _ => break,
            };
            self.advance();
            let right = self.parse_and_expression()?;
            left = self.finish(
                Node::Logical {
                    operator,
                    left,
                    right,
                },
                start,
            )?;
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_equality_expression()?;

        while matches!(self.current, Some(Token::AndAnd)) {
            self.advance();
            let right = self.parse_equality_expression()?;
            left = self.finish(
                Node::Logical {
                    operator: LogicalOperator::And,
                    left,
                    right,
                },
                start,
            )?;
        }

        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_comparison_expression()?;

        loop {
            let operator = match self.current {
                Some(Token::EqEq) => BinaryOperator::Eq,
                Some(Token::NotEq) => BinaryOperator::NotEq,
                Some(Token::EqEqEq) => BinaryOperator::StrictEq,
                Some(Token::NotEqEq) => BinaryOperator::StrictNotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison_expression()?;
            left = self.binary(operator, left, right, start)?;
        }

        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_additive_expression()?;

        loop {
            let operator = match self.current {
                Some(Token::Less) => BinaryOperator::Lt,
                Some(Token::Greater) => BinaryOperator::Gt,
                Some(Token::LessEq) => BinaryOperator::LtEq,
                Some(Token::GreaterEq) => BinaryOperator::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expression()?;
            left = self.binary(operator, left, right, start)?;
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let operator = match self.current {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expression()?;
            left = self.binary(operator, left, right, start)?;
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut left = self.parse_unary_expression()?;

        loop {
            let operator = match self.current {
                Some(Token::Star) => BinaryOperator::Mul,
                Some(Token::Slash) => BinaryOperator::Div,
                Some(Token::Percent) => BinaryOperator::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expression()?;
            left = self.binary(operator, left, right, start)?;
        }

        Ok(left)
    }

    fn binary(
        &mut self,
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
        start: usize,
    ) -> ParseResult<NodeId> {
        self.finish(
            Node::Binary {
                operator,
                left,
                right,
            },
            start,
        )
    }

    fn parse_unary_expression(&mut self) -> ParseResult<NodeId> {
        self.guarded(Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let operator = match self.current {
            Some(Token::Bang) => UnaryOperator::Not,
            Some(Token::Minus) => UnaryOperator::Minus,
            Some(Token::Plus) => UnaryOperator::Plus,
            Some(Token::Tilde) => UnaryOperator::BitNot,
            Some(Token::TypeOf) => UnaryOperator::TypeOf,
            Some(Token::Void) => UnaryOperator::Void,
            Some(Token::Delete) => UnaryOperator::Delete,
            Some(Token::PlusPlus | Token::MinusMinus) => {
                let operator = if matches!(self.current, Some(Token::PlusPlus)) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.advance();
                let argument = self.parse_unary_expression()?;
                self.check_assignable(argument)?;
                return self.finish(
                    Node::Update {
                        operator,
                        prefix: true,
                        argument,
                    },
                    start,
                );
            }
            _ => return self.parse_postfix_expression(),
        };
        self.advance();
        let argument = self.parse_unary_expression()?;
        self.finish(Node::Unary { operator, argument }, start)
    }

    fn parse_postfix_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let argument = self.parse_call_expression()?;
        let operator = match self.current {
            Some(Token::PlusPlus) => UpdateOperator::Increment,
            Some(Token::MinusMinus) => UpdateOperator::Decrement,
            _ => return Ok(argument),
        };
        self.check_assignable(argument)?;
        self.advance();
        self.finish(
            Node::Update {
                operator,
                prefix: false,
                argument,
            },
            start,
        )
    }

    fn parse_call_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let mut expr = if matches!(self.current, Some(Token::Function)) {
            self.parse_function(false)?
        } else {
            self.parse_primary_expression()?
        };

        loop {
            match self.current {
                Some(Token::Dot) => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    expr = self.finish(
                        Node::Member {
                            object: expr,
                            property,
                            computed: false,
                        },
                        start,
                    )?;
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.close(Token::RBracket, "[")?;
                    expr = self.finish(
                        Node::Member {
                            object: expr,
                            property,
                            computed: true,
                        },
                        start,
                    )?;
                }
                Some(Token::LParen) => {
                    self.advance();
                    let arguments = self.parse_list(Token::RParen, "(")?;
                    expr = self.finish(
                        Node::Call {
                            callee: expr,
                            arguments,
                        },
                        start,
                    )?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Property after `.`; keywords are allowed as names.
    fn parse_property_name(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let name = match &self.current {
            Some(Token::Ident(name)) => name.to_string(),
            Some(token) => match token.keyword() {
                Some(keyword) => keyword.to_string(),
                None => return Err(self.unexpected("property name")),
            },
            None => return Err(ParseError::UnexpectedEof),
        };
        self.advance();
        self.finish(Node::Identifier { name }, start)
    }

    /// Comma separated expressions up to and including `close`; a trailing
    /// comma is allowed.
    fn parse_list(&mut self, close: Token<'a>, opener: &str) -> ParseResult<Vec<NodeId>> {
        let mut items = Vec::new();
        while self.current.as_ref() != Some(&close) {
            if self.current.is_none() {
                return Err(ParseError::UnclosedDelimiter(opener.to_string()));
            }
            items.push(self.parse_assignment()?);
            if matches!(self.current, Some(Token::Comma)) {
                self.advance();
            } else {
                break;
            }
        }
        self.close(close, opener)?;
        Ok(items)
    }

    fn parse_primary_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.span.start;
        let node = match &self.current {
            Some(Token::Number(n)) => Node::Literal(Literal::Number(*n)),
            Some(Token::String(s)) => Node::Literal(Literal::String(s.clone())),
            Some(Token::True) => Node::Literal(Literal::Boolean(true)),
            Some(Token::False) => Node::Literal(Literal::Boolean(false)),
            Some(Token::Null) => Node::Literal(Literal::Null),
            Some(Token::This) => Node::This,
            Some(Token::Ident(name)) => Node::Identifier {
                name: name.to_string(),
            },
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.close(Token::RParen, "(")?;
                return Ok(expr);
            }
            Some(Token::LBracket) => {
                self.advance();
                let elements = self.parse_list(Token::RBracket, "[")?;
                return self.finish(Node::Array { elements }, start);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        self.finish(node, start)
    }

    // ===== Token helpers =====

    fn advance(&mut self) {
        self.position = self.span.end;
        self.current = self.lexer.next_token();
        self.span = if self.current.is_some() {
            self.lexer.span()
        } else {
            self.position..self.position
        };
    }

    fn consume(&mut self, expected: Token<'a>) -> ParseResult<()> {
        if self.current.as_ref().map(std::mem::discriminant)
            == Some(std::mem::discriminant(&expected))
        {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    /// Like [`Parser::consume`] for a closing delimiter; running out of
    /// input reports the unclosed opener.
    fn close(&mut self, expected: Token<'a>, opener: &str) -> ParseResult<()> {
        if self.current.is_none() {
            return Err(ParseError::UnclosedDelimiter(opener.to_string()));
        }
        self.consume(expected)
    }

    /// A statement ends at `;`, before `}`, or at end of input.
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        match self.current {
            Some(Token::Semicolon) => {
                self.advance();
                Ok(())
            }
            Some(Token::RBrace) | None => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(Token::Error) => {
                let text = &self.source[self.span.clone()];
                if text.starts_with(|c: char| c.is_ascii_digit()) {
                    ParseError::InvalidNumber(text.to_string())
                } else {
                    ParseError::UnexpectedToken {
                        position: self.span.start,
                        expected: expected.to_string(),
                        found: format!("invalid token '{text}'"),
                    }
                }
            }
            Some(token) => ParseError::UnexpectedToken {
                position: self.span.start,
                expected: expected.to_string(),
                found: token.to_string(),
            },
            None => ParseError::UnexpectedEof,
        }
    }

    /// Adds a node spanning from `start` to the end of the last consumed
    /// token.
    fn finish(&mut self, node: Node, start: usize) -> ParseResult<NodeId> {
        Ok(self.graph.add_node_with_span(node, start, self.position)?)
    }
}
