//! Constant evaluation of pure expressions
//!
//! The evaluator folds literals, operators and reads of constant bindings. It
//! reports whether the result is *confident*; anything it cannot prove
//! (calls, reassigned bindings, reads that may happen before initialization)
//! deopts and leaves `confident` false.

use crate::ast::{
    AstHashSet, BinaryOperator, Graph, Literal, LogicalOperator, Node, NodeId, UnaryOperator,
};
use crate::scope::{Binding, BindingKind, ScopeTree};
use crate::value::Value;
use tracing::trace;

/// Evaluation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Account for the temporal dead zone when folding binding reads.
    ///
    /// When set, reads of `let`/`const` bindings that may run before the
    /// declaration deopt, and reads of a hoisted `var` before its declaration
    /// in the same function fold to `undefined`.
    pub tdz: bool,
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub confident: bool,
    pub value: Option<Value>,
    /// Node that made evaluation give up
    pub deopt: Option<NodeId>,
}

impl Evaluation {
    fn confident(value: Value) -> Self {
        Self {
            confident: true,
            value: Some(value),
            deopt: None,
        }
    }

    fn deopt(node: NodeId) -> Self {
        Self {
            confident: false,
            value: None,
            deopt: Some(node),
        }
    }

    /// Confidently `undefined`
    pub fn is_undefined(&self) -> bool {
        self.confident && matches!(self.value, Some(Value::Undefined))
    }
}

/// Evaluates `node` to a primitive value if that can be proven.
pub fn evaluate(
    graph: &Graph,
    scopes: &ScopeTree,
    node: NodeId,
    options: EvaluateOptions,
) -> Evaluation {
    let mut evaluator = Evaluator {
        graph,
        scopes,
        options,
        resolving: AstHashSet::default(),
        deopt: None,
    };
    match evaluator.eval(node) {
        Some(value) => Evaluation::confident(value),
        None => {
            let deopt = evaluator.deopt.unwrap_or(node);
            trace!(node = %node, deopt = %deopt, "evaluation deopted");
            Evaluation::deopt(deopt)
        }
    }
}

struct Evaluator<'a> {
    graph: &'a Graph,
    scopes: &'a ScopeTree,
    options: EvaluateOptions,
    /// Declarators whose initializers are being evaluated
    resolving: AstHashSet<NodeId>,
    deopt: Option<NodeId>,
}

impl<'a> Evaluator<'a> {
    fn bail(&mut self, node: NodeId) -> Option<Value> {
        self.deopt.get_or_insert(node);
        None
    }

    fn eval(&mut self, node: NodeId) -> Option<Value> {
        let graph = self.graph;
        let Some(data) = graph.get_node(node) else {
            return self.bail(node);
        };

        match data {
            Node::Literal(literal) => Some(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),
            Node::Identifier { name } => self.eval_identifier(node, name),
            Node::Unary { operator, argument } => self.eval_unary(node, *operator, *argument),
            Node::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.eval(*left)?;
                let right = self.eval(*right)?;
                Some(binary(*operator, &left, &right))
            }
            Node::Logical {
                operator,
                left,
                right,
            } => {
                let left_value = self.eval(*left)?;
                let short_circuits = match operator {
                    LogicalOperator::And => !left_value.is_truthy(),
                    LogicalOperator::Or => left_value.is_truthy(),
                    LogicalOperator::Nullish => !left_value.is_nullish(),
                };
                if short_circuits {
                    Some(left_value)
                } else {
                    self.eval(*right)
                }
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(*test)?.is_truthy() {
                    self.eval(*consequent)
                } else {
                    self.eval(*alternate)
                }
            }
            Node::Sequence { expressions } => match expressions.last() {
                Some(last) => self.eval(*last),
                None => self.bail(node),
            },
            _ => self.bail(node),
        }
    }

    fn eval_unary(&mut self, node: NodeId, operator: UnaryOperator, argument: NodeId) -> Option<Value> {
        match operator {
            UnaryOperator::Void => Some(Value::Undefined),
            UnaryOperator::Delete => self.bail(node),
            UnaryOperator::TypeOf => {
                if let Some(data) = self.graph.get_node(argument) {
                    if data.is_function() {
                        return Some(Value::String("function".to_string()));
                    }
                }
                let value = self.eval(argument)?;
                Some(Value::String(value.type_of().to_string()))
            }
            UnaryOperator::Not => Some(Value::Boolean(!self.eval(argument)?.is_truthy())),
            UnaryOperator::Minus => Some(Value::Number(-self.eval(argument)?.to_number())),
            UnaryOperator::Plus => Some(Value::Number(self.eval(argument)?.to_number())),
            UnaryOperator::BitNot => {
                let n = self.eval(argument)?.to_number();
                Some(Value::Number(f64::from(!to_int32(n))))
            }
        }
    }

    fn eval_identifier(&mut self, node: NodeId, name: &str) -> Option<Value> {
        let scopes = self.scopes;
        let binding = scopes
            .scope_of(self.graph, node)
            .and_then(|scope| scopes.get_binding(scope, name));

        let Some(binding_id) = binding else {
            return match name {
                "undefined" => Some(Value::Undefined),
                "NaN" => Some(Value::Number(f64::NAN)),
                "Infinity" => Some(Value::Number(f64::INFINITY)),
                _ => self.bail(node),
            };
        };

        let binding = scopes.binding(binding_id);
        if !binding.is_constant() {
            return self.bail(binding.path);
        }

        if self.options.tdz {
            if let Some(flow) = self.eval_by_control_flow(node, binding) {
                return flow;
            }
        } else {
            let read_after_declaration = match (self.graph.start(node), self.graph.end(binding.path)) {
                (Some(read), Some(declared)) => read >= declared,
                _ => false,
            };
            if !read_after_declaration {
                return self.bail(node);
            }
        }

        self.resolve_binding(node, binding)
    }

    /// TDZ-aware handling of a read. `Some` is a final verdict; `None`
    /// falls through to resolving the binding's initializer.
    fn eval_by_control_flow(&mut self, node: NodeId, binding: &Binding) -> Option<Option<Value>> {
        let same_function =
            self.graph.function_parent(node) == self.graph.function_parent(binding.path);
        let read = self.graph.start(node);
        let declared_start = self.graph.start(binding.path);
        let declared_end = self.graph.end(binding.path);

        match binding.kind {
            BindingKind::Let | BindingKind::Const => {
                let initialized = same_function
                    && matches!((read, declared_end), (Some(read), Some(end)) if read >= end);
                if initialized {
                    None
                } else {
                    Some(self.bail(node))
                }
            }
            BindingKind::Var => match (read, declared_start) {
                (Some(read), Some(start)) if same_function && read < start => {
                    if self.shared_loop(node, binding.path) {
                        // A later iteration reads the previous iteration's value
                        return Some(self.bail(node));
                    }
                    Some(Some(Value::Undefined))
                }
                (Some(read), Some(_)) if same_function && declared_end.map_or(false, |end| read >= end) => {
                    None
                }
                _ => Some(self.bail(node)),
            },
            _ => Some(self.bail(node)),
        }
    }

    /// Whether a loop inside the enclosing function holds both `read` and
    /// `declaration`.
    fn shared_loop(&self, read: NodeId, declaration: NodeId) -> bool {
        let graph = self.graph;
        let mut current = read;
        while let Some(found) = graph.find_parent(current, |_, data| data.is_loop() || data.is_function()) {
            if graph.get_node(found).map_or(true, |data| data.is_function()) {
                return false;
            }
            if graph.find_parent(declaration, |id, _| id == found).is_some() {
                trace!(read = %read, loop_node = %found, "read and declaration share a loop");
                return true;
            }
            current = found;
        }
        false
    }

    fn resolve_binding(&mut self, node: NodeId, binding: &Binding) -> Option<Value> {
        let init = match self.graph.get_node(binding.path) {
            Some(Node::VariableDeclarator { init: Some(init), .. }) => *init,
            _ => return self.bail(node),
        };
        if !self.resolving.insert(binding.path) {
            return self.bail(node);
        }
        let value = self.eval(init);
        self.resolving.remove(&binding.path);
        value
    }
}

fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    if wrapped >= 2_147_483_648.0 {
        (wrapped - 4_294_967_296.0) as i32
    } else {
        wrapped as i32
    }
}

fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Value {
    use BinaryOperator::*;

    match operator {
        Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", left.to_js_string(), right.to_js_string()))
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        Sub => Value::Number(left.to_number() - right.to_number()),
        Mul => Value::Number(left.to_number() * right.to_number()),
        Div => Value::Number(left.to_number() / right.to_number()),
        Rem => Value::Number(left.to_number() % right.to_number()),
        Eq => Value::Boolean(left.loose_equals(right)),
        NotEq => Value::Boolean(!left.loose_equals(right)),
        StrictEq => Value::Boolean(left.strict_equals(right)),
        StrictNotEq => Value::Boolean(!left.strict_equals(right)),
        Lt | Gt | LtEq | GtEq => Value::Boolean(compare(operator, left, right)),
    }
}

fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match operator {
            BinaryOperator::Lt => a < b,
            BinaryOperator::Gt => a > b,
            BinaryOperator::LtEq => a <= b,
            _ => a >= b,
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match operator {
        BinaryOperator::Lt => a < b,
        BinaryOperator::Gt => a > b,
        BinaryOperator::LtEq => a <= b,
        _ => a >= b,
    }
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod tests;
