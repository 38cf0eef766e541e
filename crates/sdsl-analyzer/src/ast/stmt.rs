use rowan::TextRange;

use super::decl::DeclId;
use super::expr::{Expr, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub span: TextRange,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// Local variable or typedef declarations.
    Declare(Vec<DeclId>),
    Block(Vec<Stmt>),
    /// Flat statement sequence that opens no scope; produced by foreach expansion.
    List(Vec<Stmt>),
    If(Box<IfStmt>),
    For(Box<ForStmt>),
    While(Box<WhileStmt>),
    ForEach(Box<ForEachStmt>),
    Return(Option<Expr>),
    Break,
    Continue,
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then: Stmt,
    pub otherwise: Option<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Stmt>,
    pub condition: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Stmt,
    pub do_while: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStmt {
    pub variable: DeclId,
    pub collection: Expr,
    pub body: Stmt,
}
