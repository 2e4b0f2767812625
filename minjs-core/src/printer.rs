//! Compact source printer
//!
//! Renders a graph back to source text on a single line. Statements are
//! separated by one space, blocks print as `{ a; b; }` and expressions get
//! parentheses only where operator precedence requires them. The output is
//! deterministic so that transforms can be asserted against plain strings.

use crate::ast::{Graph, Literal, LogicalOperator, Node, NodeId, UnaryOperator};
use crate::error::{Error, Result};
use crate::value::number_to_string;

const SEQUENCE: u8 = 1;
const ASSIGNMENT: u8 = 2;
const CONDITIONAL: u8 = 3;
const UNARY: u8 = 14;
const POSTFIX: u8 = 16;
const CALL: u8 = 17;
const PRIMARY: u8 = 20;

/// Prints the whole program rooted at `graph.root_id`.
pub fn print(graph: &Graph) -> Result<String> {
    let root = graph.root_id.ok_or(Error::MissingRoot)?;
    print_node(graph, root)
}

/// Prints a single statement or expression subtree.
pub fn print_node(graph: &Graph, node: NodeId) -> Result<String> {
    let mut printer = Printer {
        graph,
        out: String::new(),
    };
    match graph.get_node(node).ok_or(Error::MissingNode(node))? {
        Node::Program { .. }
        | Node::ExpressionStatement { .. }
        | Node::Block { .. }
        | Node::Empty
        | Node::VariableDeclaration { .. }
        | Node::FunctionDeclaration { .. }
        | Node::Return { .. }
        | Node::If { .. }
        | Node::For { .. }
        | Node::ForIn { .. }
        | Node::ForOf { .. }
        | Node::While { .. }
        | Node::DoWhile { .. }
        | Node::Break
        | Node::Continue => printer.statement(node)?,
        Node::VariableDeclarator { .. } => printer.declarator(node)?,
        _ => printer.expression(node, SEQUENCE)?,
    }
    Ok(printer.out)
}

struct Printer<'a> {
    graph: &'a Graph,
    out: String,
}

impl<'a> Printer<'a> {
    fn node(&self, id: NodeId) -> Result<&'a Node> {
        self.graph.get_node(id).ok_or(Error::MissingNode(id))
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn statements(&mut self, body: &[NodeId]) -> Result<()> {
        for (index, statement) in body.iter().enumerate() {
            if index > 0 {
                self.push(" ");
            }
            self.statement(*statement)?;
        }
        Ok(())
    }

    fn block(&mut self, body: &[NodeId]) -> Result<()> {
        if body.is_empty() {
            self.push("{}");
            return Ok(());
        }
        self.push("{ ");
        self.statements(body)?;
        self.push(" }");
        Ok(())
    }

    fn statement(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)? {
            Node::Program { body } => self.statements(body)?,
            Node::Block { body } => self.block(body)?,
            Node::Empty => self.push(";"),
            Node::ExpressionStatement { expression } => {
                if self.starts_with_function(*expression)? {
                    self.push("(");
                    self.expression(*expression, SEQUENCE)?;
                    self.push(")");
                } else {
                    self.expression(*expression, SEQUENCE)?;
                }
                self.push(";");
            }
            Node::VariableDeclaration { .. } => {
                self.for_head(id)?;
                self.push(";");
            }
            Node::FunctionDeclaration { id: name, params, body } => {
                self.push("function ");
                self.expression(*name, PRIMARY)?;
                self.function_tail(params, *body)?;
            }
            Node::Return { argument } => match argument {
                Some(argument) => {
                    self.push("return ");
                    self.expression(*argument, SEQUENCE)?;
                    self.push(";");
                }
                None => self.push("return;"),
            },
            Node::If {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expression(*test, SEQUENCE)?;
                self.push(") ");
                self.statement(*consequent)?;
                if let Some(alternate) = alternate {
                    self.push(" else ");
                    self.statement(*alternate)?;
                }
            }
            Node::For {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                if let Some(init) = init {
                    self.for_head(*init)?;
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expression(*test, SEQUENCE)?;
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expression(*update, SEQUENCE)?;
                }
                self.push(") ");
                self.statement(*body)?;
            }
            Node::ForIn { left, right, body } | Node::ForOf { left, right, body } => {
                let keyword = if matches!(self.node(id)?, Node::ForIn { .. }) {
                    " in "
                } else {
                    " of "
                };
                self.push("for (");
                self.for_head(*left)?;
                self.push(keyword);
                self.expression(*right, ASSIGNMENT)?;
                self.push(") ");
                self.statement(*body)?;
            }
            Node::While { test, body } => {
                self.push("while (");
                self.expression(*test, SEQUENCE)?;
                self.push(") ");
                self.statement(*body)?;
            }
            Node::DoWhile { body, test } => {
                self.push("do ");
                self.statement(*body)?;
                self.push(" while (");
                self.expression(*test, SEQUENCE)?;
                self.push(");");
            }
            Node::Break => self.push("break;"),
            Node::Continue => self.push("continue;"),
            other => {
                return Err(Error::InvalidTree(format!(
                    "{} is not a statement",
                    other.kind_name()
                )))
            }
        }
        Ok(())
    }

    /// A declaration without its trailing semicolon, or an expression.
    fn for_head(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)? {
            Node::VariableDeclaration { kind, declarations } => {
                self.push(kind.as_str());
                self.push(" ");
                for (index, declarator) in declarations.iter().enumerate() {
                    if index > 0 {
                        self.push(", ");
                    }
                    self.declarator(*declarator)?;
                }
                Ok(())
            }
            _ => self.expression(id, SEQUENCE),
        }
    }

    fn declarator(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)? {
            Node::VariableDeclarator { id: name, init } => {
                self.expression(*name, PRIMARY)?;
                if let Some(init) = init {
                    self.push(" = ");
                    self.expression(*init, ASSIGNMENT)?;
                }
                Ok(())
            }
            other => Err(Error::InvalidTree(format!(
                "expected VariableDeclarator, found {}",
                other.kind_name()
            ))),
        }
    }

    fn function_tail(&mut self, params: &[NodeId], body: NodeId) -> Result<()> {
        self.push("(");
        self.list(params)?;
        self.push(") ");
        self.statement(body)
    }

    fn list(&mut self, items: &[NodeId]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.expression(*item, ASSIGNMENT)?;
        }
        Ok(())
    }

    /// Whether the leftmost token of an expression statement would be
    /// `function`, which must not start a statement.
    fn starts_with_function(&self, id: NodeId) -> Result<bool> {
        let mut current = id;
        loop {
            current = match self.node(current)? {
                Node::FunctionExpression { .. } => return Ok(true),
                Node::Call { callee, .. } => *callee,
                Node::Member { object, .. } => *object,
                Node::Binary { left, .. } | Node::Logical { left, .. } => *left,
                Node::Conditional { test, .. } => *test,
                Node::Assignment { target, .. } => *target,
                Node::Sequence { expressions } => match expressions.first() {
                    Some(first) => *first,
                    None => return Ok(false),
                },
                Node::Update {
                    prefix: false,
                    argument,
                    ..
                } => *argument,
                _ => return Ok(false),
            };
        }
    }

    fn expression(&mut self, id: NodeId, min: u8) -> Result<()> {
        let node = self.node(id)?;
        let own = precedence(node);
        let wrap = own < min;
        if wrap {
            self.push("(");
        }

        match node {
            Node::Identifier { name } => self.push(name),
            Node::Literal(literal) => self.literal(literal),
            Node::This => self.push("this"),
            Node::Array { elements } => {
                self.push("[");
                self.list(elements)?;
                self.push("]");
            }
            Node::FunctionExpression { id: name, params, body } => {
                self.push("function");
                if let Some(name) = name {
                    self.push(" ");
                    self.expression(*name, PRIMARY)?;
                }
                self.function_tail(params, *body)?;
            }
            Node::ArrowFunction { params, body } => {
                self.push("(");
                self.list(params)?;
                self.push(") => ");
                if matches!(self.node(*body)?, Node::Block { .. }) {
                    self.statement(*body)?;
                } else {
                    self.expression(*body, ASSIGNMENT)?;
                }
            }
            Node::Sequence { expressions } => {
                for (index, expression) in expressions.iter().enumerate() {
                    if index > 0 {
                        self.push(", ");
                    }
                    self.expression(*expression, ASSIGNMENT)?;
                }
            }
            Node::Assignment {
                operator,
                target,
                value,
            } => {
                self.expression(*target, CALL)?;
                self.push(" ");
                self.push(operator.as_str());
                self.push(" ");
                self.expression(*value, ASSIGNMENT)?;
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expression(*test, CONDITIONAL + 1)?;
                self.push(" ? ");
                self.expression(*consequent, ASSIGNMENT)?;
                self.push(" : ");
                self.expression(*alternate, ASSIGNMENT)?;
            }
            Node::Logical {
                operator,
                left,
                right,
            } => {
                self.logical_operand(*operator, *left, own)?;
                self.push(" ");
                self.push(operator.as_str());
                self.push(" ");
                self.logical_operand(*operator, *right, own + 1)?;
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                self.expression(*left, own)?;
                self.push(" ");
                self.push(operator.as_str());
                self.push(" ");
                self.expression(*right, own + 1)?;
            }
            Node::Unary { operator, argument } => {
                self.push(operator.as_str());
                let start = self.out.len();
                if operator.is_keyword() {
                    self.push(" ");
                }
                self.expression(*argument, UNARY)?;
                // `- -x` and `+ +x` must not fuse into `--x` / `++x`
                let sign = match operator {
                    UnaryOperator::Minus => Some('-'),
                    UnaryOperator::Plus => Some('+'),
                    _ => None,
                };
                if let Some(sign) = sign {
                    if self.out[start..].starts_with(sign) {
                        self.out.insert(start, ' ');
                    }
                }
            }
            Node::Update {
                operator,
                prefix,
                argument,
            } => {
                if *prefix {
                    self.push(operator.as_str());
                    self.expression(*argument, UNARY)?;
                } else {
                    self.expression(*argument, POSTFIX + 1)?;
                    self.push(operator.as_str());
                }
            }
            Node::Call { callee, arguments } => {
                self.expression(*callee, CALL)?;
                self.push("(");
                self.list(arguments)?;
                self.push(")");
            }
            Node::Member {
                object,
                property,
                computed,
            } => {
                let object_start = self.out.len();
                self.expression(*object, CALL)?;
                if *computed {
                    self.push("[");
                    self.expression(*property, SEQUENCE)?;
                    self.push("]");
                } else {
                    // `1.toString` would lex as a number
                    if matches!(self.node(*object)?, Node::Literal(Literal::Number(_)))
                        && !self.out[object_start..].contains('.')
                    {
                        self.push(".");
                    }
                    self.push(".");
                    self.expression(*property, PRIMARY)?;
                }
            }
            other => {
                return Err(Error::InvalidTree(format!(
                    "{} is not an expression",
                    other.kind_name()
                )))
            }
        }

        if wrap {
            self.push(")");
        }
        Ok(())
    }

    /// `??` cannot be mixed with `&&` or `||` without parentheses.
    fn logical_operand(&mut self, operator: LogicalOperator, id: NodeId, min: u8) -> Result<()> {
        let mixes = match self.node(id)? {
            Node::Logical { operator: inner, .. } => {
                (operator == LogicalOperator::Nullish) != (*inner == LogicalOperator::Nullish)
            }
            _ => false,
        };
        if mixes {
            self.push("(");
            self.expression(id, SEQUENCE)?;
            self.push(")");
            Ok(())
        } else {
            self.expression(id, min)
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Number(n) => self.push(&number_to_string(*n)),
            Literal::String(s) => {
                let quoted = quote(s);
                self.push(&quoted);
            }
            Literal::Boolean(b) => self.push(if *b { "true" } else { "false" }),
            Literal::Null => self.push("null"),
        }
    }
}

fn precedence(node: &Node) -> u8 {
    use crate::ast::BinaryOperator::*;

    match node {
        Node::Sequence { .. } => SEQUENCE,
        Node::Assignment { .. } | Node::ArrowFunction { .. } => ASSIGNMENT,
        Node::Conditional { .. } => CONDITIONAL,
        Node::Logical { operator, .. } => match operator {
            LogicalOperator::Or | LogicalOperator::Nullish => 4,
            LogicalOperator::And => 5,
        },
        Node::Binary { operator, .. } => match operator {
            Eq | NotEq | StrictEq | StrictNotEq => 9,
            Lt | Gt | LtEq | GtEq => 10,
            Add | Sub => 12,
            Mul | Div | Rem => 13,
        },
        Node::Unary { .. } => UNARY,
        Node::Update { prefix: true, .. } => UNARY,
        Node::Update { prefix: false, .. } => POSTFIX,
        Node::Call { .. } | Node::Member { .. } => CALL,
        _ => PRIMARY,
    }
}

/// Double-quoted string literal with the usual escapes
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if (c as u32) < 0x20 => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
