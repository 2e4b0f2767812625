//! Lexical scopes and resolved bindings
//!
//! [`ScopeTree::build`] crawls a program graph once for declarations and once
//! for references, producing an index of every scope, every binding, and for
//! each binding the identifiers that read it and the nodes that reassign it.
//! Scopes and bindings live in flat tables addressed by [`ScopeId`] and
//! [`BindingId`]; nodes are linked back to their owning binding through a
//! side map instead of pointers.

use crate::ast::{AssignmentOperator, AstHashMap, AstHashSet, DeclarationKind, Graph, Node, NodeId};
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Names the host environment provides without a declaration
pub const IMPLICIT_GLOBALS: &[&str] = &["undefined", "NaN", "Infinity", "arguments"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

impl BindingId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
}

impl ScopeKind {
    /// Program and function scopes can hold hoisted bindings
    pub fn is_function_like(&self) -> bool {
        matches!(self, ScopeKind::Program | ScopeKind::Function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    /// Function declaration
    Function,
    Param,
    /// Name of a named function expression, visible only inside it
    Local,
}

impl BindingKind {
    pub fn is_block_scoped(&self) -> bool {
        matches!(self, BindingKind::Let | BindingKind::Const)
    }
}

impl From<DeclarationKind> for BindingKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Var => BindingKind::Var,
            DeclarationKind::Let => BindingKind::Let,
            DeclarationKind::Const => BindingKind::Const,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Node that introduces the scope
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    bindings: AstHashMap<String, BindingId>,
}

impl Scope {
    pub fn own_binding(&self, name: &str) -> Option<BindingId> {
        self.bindings.get(name).copied()
    }

    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

/// One declared name within one scope
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    /// Declaring node: a declarator, function, or parameter identifier
    pub path: NodeId,
    /// The binding identifier itself
    pub identifier: NodeId,
    /// Nodes that reassign the binding, in source order
    pub constant_violations: Vec<NodeId>,
    /// Identifiers that read the binding, in source order
    pub references: Vec<NodeId>,
}

impl Binding {
    pub fn is_constant(&self) -> bool {
        self.constant_violations.is_empty()
    }
}

/// Scope and binding index for one program graph
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    node_scopes: AstHashMap<NodeId, ScopeId>,
    owners: AstHashMap<NodeId, BindingId>,
    globals: AstHashSet<String>,
}

impl ScopeTree {
    /// Crawls `graph` from its root program node.
    pub fn build(graph: &Graph) -> Result<Self> {
        let root = graph.root_id.ok_or(Error::MissingRoot)?;
        match graph.get_node(root) {
            Some(Node::Program { .. }) => {}
            Some(other) => {
                return Err(Error::InvalidTree(format!(
                    "root must be a Program, found {}",
                    other.kind_name()
                )))
            }
            None => return Err(Error::MissingNode(root)),
        }

        let mut tree = Self::default();
        let program = tree.push_scope(ScopeKind::Program, root, None);
        tree.declare_children(graph, root, program)?;
        tree.resolve(graph, root, program);

        debug!(
            scopes = tree.scopes.len(),
            bindings = tree.bindings.len(),
            globals = tree.globals.len(),
            "built scope tree"
        );
        Ok(tree)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| (BindingId(index as u32), binding))
    }

    pub fn program_scope(&self) -> Option<ScopeId> {
        self.scopes.first().map(|_| ScopeId(0))
    }

    /// Scope introduced by `node` itself, if any
    pub fn scope_for_node(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// Innermost scope containing `node`; a scope-introducing node maps to
    /// its own scope.
    pub fn scope_of(&self, graph: &Graph, node: NodeId) -> Option<ScopeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(scope) = self.node_scopes.get(&id) {
                return Some(*scope);
            }
            current = graph.parent(id);
        }
        None
    }

    /// Nearest program or function scope at or above `scope`
    pub fn function_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let data = self.scope(current);
            match data.parent {
                Some(parent) if !data.kind.is_function_like() => current = parent,
                _ => return current,
            }
        }
    }

    /// Resolves `name` from `scope` outward.
    pub fn get_binding(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scope(id);
            if let Some(binding) = data.own_binding(name) {
                return Some(binding);
            }
            current = data.parent;
        }
        None
    }

    /// Whether `name` is visible from `scope`. With `no_globals`, only
    /// declared bindings count.
    pub fn has_binding(&self, scope: ScopeId, name: &str, no_globals: bool) -> bool {
        if self.get_binding(scope, name).is_some() {
            return true;
        }
        !no_globals && (self.globals.contains(name) || IMPLICIT_GLOBALS.contains(&name))
    }

    /// Undeclared names that the program reads or writes
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    /// Binding that a reference or violation node belongs to
    pub fn owner_of(&self, node: NodeId) -> Option<BindingId> {
        self.owners.get(&node).copied()
    }

    /// Records an additional reassignment site for `binding`.
    pub fn register_constant_violation(&mut self, binding: BindingId, node: NodeId) {
        self.bindings[binding.index()].constant_violations.push(node);
        self.owners.insert(node, binding);
    }

    fn push_scope(&mut self, kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            node,
            parent,
            bindings: AstHashMap::default(),
        });
        self.node_scopes.insert(node, id);
        id
    }

    fn register_binding(
        &mut self,
        graph: &Graph,
        scope: ScopeId,
        kind: BindingKind,
        path: NodeId,
        identifier: NodeId,
    ) -> Result<()> {
        let name = match graph.get_node(identifier) {
            Some(Node::Identifier { name }) => name.clone(),
            Some(other) => {
                return Err(Error::InvalidTree(format!(
                    "binding target must be an Identifier, found {}",
                    other.kind_name()
                )))
            }
            None => return Err(Error::MissingNode(identifier)),
        };

        if let Some(existing) = self.scope(scope).own_binding(&name) {
            let local = self.binding(existing);
            if kind.is_block_scoped() || local.kind.is_block_scoped() {
                return Err(Error::InvalidTree(format!(
                    "duplicate declaration of '{name}'"
                )));
            }
            trace!(%name, node = %path, "redeclaration recorded as violation");
            self.register_constant_violation(existing, path);
            return Ok(());
        }

        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding {
            name: name.clone(),
            kind,
            scope,
            path,
            identifier,
            constant_violations: Vec::new(),
            references: Vec::new(),
        });
        self.scopes[scope.index()].bindings.insert(name, id);
        Ok(())
    }

    fn declare_children(&mut self, graph: &Graph, node: NodeId, scope: ScopeId) -> Result<()> {
        for child in graph.children(node) {
            self.declare(graph, child, scope)?;
        }
        Ok(())
    }

    /// Declares a function's parameters and walks its body without giving
    /// the body block a scope of its own.
    fn declare_function_body(
        &mut self,
        graph: &Graph,
        params: &[NodeId],
        body: NodeId,
        scope: ScopeId,
    ) -> Result<()> {
        for param in params {
            self.register_binding(graph, scope, BindingKind::Param, *param, *param)?;
        }
        match graph.get_node(body) {
            Some(Node::Block { .. }) => self.declare_children(graph, body, scope),
            Some(_) => self.declare(graph, body, scope),
            None => Err(Error::MissingNode(body)),
        }
    }

    fn declare(&mut self, graph: &Graph, node: NodeId, scope: ScopeId) -> Result<()> {
        let Some(data) = graph.get_node(node) else {
            return Err(Error::MissingNode(node));
        };

        match data {
            Node::VariableDeclaration { kind, declarations } => {
                let target = match kind {
                    DeclarationKind::Var => self.function_scope(scope),
                    DeclarationKind::Let | DeclarationKind::Const => scope,
                };
                for declarator in declarations {
                    match graph.get_node(*declarator) {
                        Some(Node::VariableDeclarator { id, init }) => {
                            self.register_binding(graph, target, (*kind).into(), *declarator, *id)?;
                            if let Some(init) = init {
                                self.declare(graph, *init, scope)?;
                            }
                        }
                        Some(other) => {
                            return Err(Error::InvalidTree(format!(
                                "expected VariableDeclarator, found {}",
                                other.kind_name()
                            )))
                        }
                        None => return Err(Error::MissingNode(*declarator)),
                    }
                }
                Ok(())
            }
            Node::FunctionDeclaration { id, params, body } => {
                self.register_binding(graph, scope, BindingKind::Function, node, *id)?;
                let inner = self.push_scope(ScopeKind::Function, node, Some(scope));
                self.declare_function_body(graph, params, *body, inner)
            }
            Node::FunctionExpression { id, params, body } => {
                let inner = self.push_scope(ScopeKind::Function, node, Some(scope));
                if let Some(id) = id {
                    self.register_binding(graph, inner, BindingKind::Local, node, *id)?;
                }
                self.declare_function_body(graph, params, *body, inner)
            }
            Node::ArrowFunction { params, body } => {
                let inner = self.push_scope(ScopeKind::Function, node, Some(scope));
                self.declare_function_body(graph, params, *body, inner)
            }
            Node::Block { .. } | Node::For { .. } | Node::ForIn { .. } | Node::ForOf { .. } => {
                let inner = self.push_scope(ScopeKind::Block, node, Some(scope));
                self.declare_children(graph, node, inner)
            }
            _ => self.declare_children(graph, node, scope),
        }
    }

    fn reference(&mut self, node: NodeId, name: &str, scope: ScopeId) {
        match self.get_binding(scope, name) {
            Some(binding) => {
                self.bindings[binding.index()].references.push(node);
                self.owners.insert(node, binding);
            }
            None => {
                self.globals.insert(name.to_string());
            }
        }
    }

    fn violation(&mut self, node: NodeId, name: &str, scope: ScopeId) {
        match self.get_binding(scope, name) {
            Some(binding) => self.register_constant_violation(binding, node),
            None => {
                self.globals.insert(name.to_string());
            }
        }
    }

    fn resolve(&mut self, graph: &Graph, node: NodeId, scope: ScopeId) {
        let scope = self.node_scopes.get(&node).copied().unwrap_or(scope);
        let Some(data) = graph.get_node(node) else {
            return;
        };

        match data {
            Node::Identifier { name } => self.reference(node, name, scope),
            Node::VariableDeclarator { init, .. } => {
                if let Some(init) = init {
                    self.resolve(graph, *init, scope);
                }
            }
            Node::FunctionDeclaration { body, .. }
            | Node::FunctionExpression { body, .. }
            | Node::ArrowFunction { body, .. } => self.resolve(graph, *body, scope),
            Node::Member {
                object,
                property,
                computed,
            } => {
                self.resolve(graph, *object, scope);
                if *computed {
                    self.resolve(graph, *property, scope);
                }
            }
            Node::Assignment {
                operator,
                target,
                value,
            } => {
                match graph.get_node(*target) {
                    Some(Node::Identifier { name }) => {
                        self.violation(node, name, scope);
                        // `x += 1` reads `x` as well
                        if *operator != AssignmentOperator::Assign {
                            self.reference(*target, name, scope);
                        }
                    }
                    _ => self.resolve(graph, *target, scope),
                }
                self.resolve(graph, *value, scope);
            }
            Node::Update { argument, .. } => match graph.get_node(*argument) {
                Some(Node::Identifier { name }) => {
                    self.violation(node, name, scope);
                    self.reference(*argument, name, scope);
                }
                _ => self.resolve(graph, *argument, scope),
            },
            Node::ForIn { left, right, body } | Node::ForOf { left, right, body } => {
                match graph.get_node(*left) {
                    Some(Node::Identifier { name }) => self.violation(*left, name, scope),
                    _ => self.resolve(graph, *left, scope),
                }
                self.resolve(graph, *right, scope);
                self.resolve(graph, *body, scope);
            }
            _ => {
                for child in data.children() {
                    self.resolve(graph, child, scope);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
