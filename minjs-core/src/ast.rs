//! AST representation using an arena graph structure
//!
//! Nodes are stored in a flat table keyed by [`NodeId`] and refer to their
//! children by id. Parent links live in a side table so that analyses can
//! walk outward from any node without owning back-pointers.

use crate::error::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Type alias for the HashMap implementation used in the AST
pub type AstHashMap<K, V> = FxHashMap<K, V>;

/// Type alias for the HashSet implementation used in the AST
pub type AstHashSet<T> = FxHashSet<T>;

/// Node identifier in the AST graph
///
/// Uses NonZeroU32 internally to enable null pointer optimization for Option<NodeId>.
/// NodeId(0) is reserved as an invalid/null node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub NonZeroU32);

impl NodeId {
    /// Creates a new NodeId from a u32.
    /// Returns None if the value is 0.
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(NodeId)
    }

    /// Gets the inner u32 value
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Source position of a node as byte offsets into the original text.
///
/// Nodes synthesized by transforms have no metadata at all, and hosts may
/// provide a start without an end. Consumers must treat a missing offset as
/// unknown, never infer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Offset of the first byte of the node
    pub start: Option<usize>,
    /// Offset one past the last byte of the node
    pub end: Option<usize>,
}

/// AST graph representation
///
/// # Invariants
/// - `next_id` monotonically increases and is never reused
/// - NodeIds are unique within a graph
/// - Every child id of a node present in the graph is itself present
/// - `parents` maps each reachable non-root node to the node that owns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: AstHashMap<NodeId, Node>,
    pub root_id: Option<NodeId>,
    /// Next ID to assign. Starts at 1 and monotonically increases.
    next_id: u32,
    /// Source positions for nodes that came from text
    pub metadata: AstHashMap<NodeId, NodeMetadata>,
    #[serde(skip)]
    parents: AstHashMap<NodeId, NodeId>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: AstHashMap::default(),
            root_id: None,
            next_id: 1, // Start at 1 since 0 is reserved for null
            metadata: AstHashMap::default(),
            parents: AstHashMap::default(),
        }
    }

    /// Adds a node and claims its children as the node's own.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        if self.next_id == u32::MAX {
            return Err(Error::GraphNodeIdOverflow);
        }

        let id = NodeId::new(self.next_id).ok_or(Error::GraphNodeIdOverflow)?;
        self.next_id += 1;
        for child in node.children() {
            self.parents.insert(child, id);
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Adds a node that spans `start..end` in the source text.
    pub fn add_node_with_span(&mut self, node: Node, start: usize, end: usize) -> Result<NodeId> {
        let id = self.add_node(node)?;
        self.set_span(id, start, end);
        Ok(id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Gets mutable reference to a node
    ///
    /// Callers that re-point child ids must call [`Graph::rebuild_parents`]
    /// afterwards.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Gets metadata for a node
    pub fn get_metadata(&self, id: NodeId) -> Option<&NodeMetadata> {
        self.metadata.get(&id)
    }

    /// Gets or creates metadata for a node
    pub fn metadata_mut(&mut self, id: NodeId) -> &mut NodeMetadata {
        self.metadata.entry(id).or_default()
    }

    pub fn set_span(&mut self, id: NodeId, start: usize, end: usize) {
        let meta = self.metadata_mut(id);
        meta.start = Some(start);
        meta.end = Some(end);
    }

    /// Start offset of a node, if it is known
    pub fn start(&self, id: NodeId) -> Option<usize> {
        self.metadata.get(&id).and_then(|m| m.start)
    }

    /// End offset of a node, if it is known
    pub fn end(&self, id: NodeId) -> Option<usize> {
        self.metadata.get(&id).and_then(|m| m.end)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Children of a node in source order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get_node(id).map(Node::children).unwrap_or_default()
    }

    /// Finds the nearest strict ancestor of `id` satisfying `pred`.
    pub fn find_parent<F>(&self, id: NodeId, mut pred: F) -> Option<NodeId>
    where
        F: FnMut(NodeId, &Node) -> bool,
    {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if let Some(node) = self.get_node(candidate) {
                if pred(candidate, node) {
                    return Some(candidate);
                }
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Nearest enclosing function node of `id`
    pub fn function_parent(&self, id: NodeId) -> Option<NodeId> {
        self.find_parent(id, |_, node| node.is_function())
    }

    /// The root program node that contains `id`
    pub fn program_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        match self.get_node(current) {
            Some(Node::Program { .. }) => Some(current),
            _ => None,
        }
    }

    /// All nodes of the subtree rooted at `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get_node(current) {
                order.push(current);
                for child in node.children().into_iter().rev() {
                    stack.push(child);
                }
            }
        }
        order
    }

    /// Removes a node and everything below it from the graph.
    ///
    /// The owner's reference to `id` is left to the caller.
    pub fn remove_subtree(&mut self, id: NodeId) {
        for node_id in self.descendants(id) {
            self.nodes.remove(&node_id);
            self.metadata.remove(&node_id);
            self.parents.remove(&node_id);
        }
    }

    /// Recomputes parent links from the root.
    pub fn rebuild_parents(&mut self) {
        self.parents.clear();
        let Some(root) = self.root_id else {
            return;
        };
        for node_id in self.descendants(root) {
            if let Some(node) = self.nodes.get(&node_id) {
                for child in node.children() {
                    self.parents.insert(child, node_id);
                }
            }
        }
    }

    /// Points whichever field of `parent` refers to `old` at `new` instead.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&parent)
            .ok_or(Error::MissingNode(parent))?;
        let slot = node
            .children_mut()
            .into_iter()
            .find(|slot| **slot == old)
            .ok_or_else(|| Error::InvalidTree(format!("{old} is not a child of {parent}")))?;
        *slot = new;
        self.parents.remove(&old);
        self.parents.insert(new, parent);
        Ok(())
    }
}

/// Kind of a variable declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignmentOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubAssign => "-=",
            AssignmentOperator::MulAssign => "*=",
            AssignmentOperator::DivAssign => "/=",
            AssignmentOperator::RemAssign => "%=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::BitNot => "~",
            UnaryOperator::TypeOf => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }

    /// Keyword operators need a space before their operand
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            UnaryOperator::TypeOf | UnaryOperator::Void | UnaryOperator::Delete
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::StrictNotEq => "!==",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
    Nullish,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::Nullish => "??",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// AST node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Program {
        body: Vec<NodeId>,
    },

    // Statements
    ExpressionStatement {
        expression: NodeId,
    },
    Block {
        body: Vec<NodeId>,
    },
    Empty,
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    FunctionDeclaration {
        id: NodeId,
        params: Vec<NodeId>,
        body: NodeId,
    },
    Return {
        argument: Option<NodeId>,
    },
    If {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOf {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        test: NodeId,
    },
    Break,
    Continue,

    // Expressions
    Identifier {
        name: String,
    },
    Literal(Literal),
    This,
    Array {
        elements: Vec<NodeId>,
    },
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
    },
    /// Body is either a `Block` or a bare expression
    ArrowFunction {
        params: Vec<NodeId>,
        body: NodeId,
    },
    Sequence {
        expressions: Vec<NodeId>,
    },
    Assignment {
        operator: AssignmentOperator,
        target: NodeId,
        value: NodeId,
    },
    Update {
        operator: UpdateOperator,
        prefix: bool,
        argument: NodeId,
    },
    Unary {
        operator: UnaryOperator,
        argument: NodeId,
    },
    Binary {
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
    },
    Logical {
        operator: LogicalOperator,
        left: NodeId,
        right: NodeId,
    },
    Conditional {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    /// Non-computed members hold an `Identifier` property that is not a
    /// variable reference
    Member {
        object: NodeId,
        property: NodeId,
        computed: bool,
    },
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program { .. } => "Program",
            Node::ExpressionStatement { .. } => "ExpressionStatement",
            Node::Block { .. } => "BlockStatement",
            Node::Empty => "EmptyStatement",
            Node::VariableDeclaration { .. } => "VariableDeclaration",
            Node::VariableDeclarator { .. } => "VariableDeclarator",
            Node::FunctionDeclaration { .. } => "FunctionDeclaration",
            Node::Return { .. } => "ReturnStatement",
            Node::If { .. } => "IfStatement",
            Node::For { .. } => "ForStatement",
            Node::ForIn { .. } => "ForInStatement",
            Node::ForOf { .. } => "ForOfStatement",
            Node::While { .. } => "WhileStatement",
            Node::DoWhile { .. } => "DoWhileStatement",
            Node::Break => "BreakStatement",
            Node::Continue => "ContinueStatement",
            Node::Identifier { .. } => "Identifier",
            Node::Literal(_) => "Literal",
            Node::This => "ThisExpression",
            Node::Array { .. } => "ArrayExpression",
            Node::FunctionExpression { .. } => "FunctionExpression",
            Node::ArrowFunction { .. } => "ArrowFunctionExpression",
            Node::Sequence { .. } => "SequenceExpression",
            Node::Assignment { .. } => "AssignmentExpression",
            Node::Update { .. } => "UpdateExpression",
            Node::Unary { .. } => "UnaryExpression",
            Node::Binary { .. } => "BinaryExpression",
            Node::Logical { .. } => "LogicalExpression",
            Node::Conditional { .. } => "ConditionalExpression",
            Node::Call { .. } => "CallExpression",
            Node::Member { .. } => "MemberExpression",
        }
    }

    /// Function boundary: anything with its own body and parameter scope
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Node::FunctionDeclaration { .. }
                | Node::FunctionExpression { .. }
                | Node::ArrowFunction { .. }
        )
    }

    /// Loop boundary
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Node::For { .. }
                | Node::ForIn { .. }
                | Node::ForOf { .. }
                | Node::While { .. }
                | Node::DoWhile { .. }
        )
    }

    pub fn is_identifier_named(&self, expected: &str) -> bool {
        matches!(self, Node::Identifier { name } if name == expected)
    }

    /// Child ids in source order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Program { body } | Node::Block { body } => body.clone(),
            Node::ExpressionStatement { expression } => vec![*expression],
            Node::VariableDeclaration { declarations, .. } => declarations.clone(),
            Node::VariableDeclarator { id, init } => {
                let mut children = vec![*id];
                children.extend(*init);
                children
            }
            Node::FunctionDeclaration { id, params, body } => {
                let mut children = vec![*id];
                children.extend(params.iter().copied());
                children.push(*body);
                children
            }
            Node::FunctionExpression { id, params, body } => {
                let mut children: Vec<NodeId> = id.iter().copied().collect();
                children.extend(params.iter().copied());
                children.push(*body);
                children
            }
            Node::ArrowFunction { params, body } => {
                let mut children = params.clone();
                children.push(*body);
                children
            }
            Node::Return { argument } => argument.iter().copied().collect(),
            Node::If {
                test,
                consequent,
                alternate,
            } => {
                let mut children = vec![*test, *consequent];
                children.extend(*alternate);
                children
            }
            Node::For {
                init,
                test,
                update,
                body,
            } => {
                let mut children: Vec<NodeId> = [*init, *test, *update].into_iter().flatten().collect();
                children.push(*body);
                children
            }
            Node::ForIn { left, right, body } | Node::ForOf { left, right, body } => {
                vec![*left, *right, *body]
            }
            Node::While { test, body } => vec![*test, *body],
            Node::DoWhile { body, test } => vec![*body, *test],
            Node::Array { elements } => elements.clone(),
            Node::Sequence { expressions } => expressions.clone(),
            Node::Assignment { target, value, .. } => vec![*target, *value],
            Node::Update { argument, .. } | Node::Unary { argument, .. } => vec![*argument],
            Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
                vec![*left, *right]
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => vec![*test, *consequent, *alternate],
            Node::Call { callee, arguments } => {
                let mut children = vec![*callee];
                children.extend(arguments.iter().copied());
                children
            }
            Node::Member {
                object, property, ..
            } => vec![*object, *property],
            Node::Empty
            | Node::Break
            | Node::Continue
            | Node::Identifier { .. }
            | Node::Literal(_)
            | Node::This => Vec::new(),
        }
    }

    /// Mutable child slots, in the same order as [`Node::children`]
    pub fn children_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            Node::Program { body } | Node::Block { body } => body.iter_mut().collect(),
            Node::ExpressionStatement { expression } => vec![expression],
            Node::VariableDeclaration { declarations, .. } => declarations.iter_mut().collect(),
            Node::VariableDeclarator { id, init } => {
                let mut slots = vec![id];
                slots.extend(init.as_mut());
                slots
            }
            Node::FunctionDeclaration { id, params, body } => {
                let mut slots = vec![id];
                slots.extend(params.iter_mut());
                slots.push(body);
                slots
            }
            Node::FunctionExpression { id, params, body } => {
                let mut slots: Vec<&mut NodeId> = id.iter_mut().collect();
                slots.extend(params.iter_mut());
                slots.push(body);
                slots
            }
            Node::ArrowFunction { params, body } => {
                let mut slots: Vec<&mut NodeId> = params.iter_mut().collect();
                slots.push(body);
                slots
            }
            Node::Return { argument } => argument.iter_mut().collect(),
            Node::If {
                test,
                consequent,
                alternate,
            } => {
                let mut slots = vec![test, consequent];
                slots.extend(alternate.as_mut());
                slots
            }
            Node::For {
                init,
                test,
                update,
                body,
            } => {
                let mut slots: Vec<&mut NodeId> = Vec::new();
                slots.extend(init.as_mut());
                slots.extend(test.as_mut());
                slots.extend(update.as_mut());
                slots.push(body);
                slots
            }
            Node::ForIn { left, right, body } | Node::ForOf { left, right, body } => {
                vec![left, right, body]
            }
            Node::While { test, body } => vec![test, body],
            Node::DoWhile { body, test } => vec![body, test],
            Node::Array { elements } => elements.iter_mut().collect(),
            Node::Sequence { expressions } => expressions.iter_mut().collect(),
            Node::Assignment { target, value, .. } => vec![target, value],
            Node::Update { argument, .. } | Node::Unary { argument, .. } => vec![argument],
            Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
                vec![left, right]
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => vec![test, consequent, alternate],
            Node::Call { callee, arguments } => {
                let mut slots = vec![callee];
                slots.extend(arguments.iter_mut());
                slots
            }
            Node::Member {
                object, property, ..
            } => vec![object, property],
            Node::Empty
            | Node::Break
            | Node::Continue
            | Node::Identifier { .. }
            | Node::Literal(_)
            | Node::This => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "ast_tests.rs"]
mod tests;
