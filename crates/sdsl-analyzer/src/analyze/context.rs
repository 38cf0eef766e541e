//! Ambient state threaded through the recursive visit.

use crate::ast::{DeclId, NodeId, NodeRef};

/// Direction of the access being visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AssignStatus {
    #[default]
    Read,
    Write,
    ReadWrite,
}

impl AssignStatus {
    pub(crate) fn is_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Syntactic position of the node being visited, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    /// Direct initializer of a variable, or a member of a declaration.
    Decl(DeclId),
    Stmt(NodeId),
    Expr(NodeId),
    /// Target of the member access with this id.
    MemberTarget(NodeId),
    /// Target of the invocation with this id.
    CallTarget(NodeId),
}

impl Parent {
    pub(crate) fn node_ref(self) -> NodeRef {
        match self {
            Parent::Decl(id) => NodeRef::Decl(id),
            Parent::Stmt(id)
            | Parent::Expr(id)
            | Parent::MemberTarget(id)
            | Parent::CallTarget(id) => NodeRef::Node(id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct VisitCtx {
    /// Method whose body is being visited.
    pub(crate) method: Option<DeclId>,
    pub(crate) parent: Parent,
    pub(crate) assign: AssignStatus,
    /// Inside either side of an assignment expression.
    pub(crate) in_assignment: bool,
    /// Inside a sampler state initializer, where state names are not declared.
    pub(crate) in_sampler: bool,
}

impl VisitCtx {
    pub(crate) fn member(shader: DeclId) -> Self {
        Self {
            method: None,
            parent: Parent::Decl(shader),
            assign: AssignStatus::Read,
            in_assignment: false,
            in_sampler: false,
        }
    }

    pub(crate) fn with_parent(self, parent: Parent) -> Self {
        Self { parent, ..self }
    }

    pub(crate) fn reading(self) -> Self {
        Self {
            assign: AssignStatus::Read,
            ..self
        }
    }

    /// Context for a fresh statement: no assignment in progress.
    pub(crate) fn statement(self, stmt: NodeId) -> Self {
        Self {
            parent: Parent::Stmt(stmt),
            assign: AssignStatus::Read,
            in_assignment: false,
            ..self
        }
    }
}
