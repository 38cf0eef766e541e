//! Arena-backed AST for SDSL shader modules.
//!
//! Declarations live in one [`Ast`] arena and are addressed by [`DeclId`].
//! Expressions and statements are owned trees, each node stamped with a
//! [`NodeId`] so the analysis record can refer to occurrences without
//! borrowing the tree.

mod arena;
mod build;
mod clone;
mod decl;
mod expr;
mod stmt;
mod types;
mod visitor;


pub use arena::Ast;
pub use decl::{
    Decl, DeclId, Interface, Method, Qualifiers, ShaderClass, StructDecl, Technique, Typedef,
    VTableSlot, Variable,
};
pub use expr::{
    Assign, AssignOp, Binary, BinaryOp, Call, Cast, Classification, Conditional, Expr, ExprKind,
    IndexAccess, Keyword, Literal, MemberAccess, Name, NodeId, NodeRef, TypeInference, UnaryOp,
};
pub use stmt::{ForEachStmt, ForStmt, IfStmt, Stmt, StmtKind, WhileStmt};
pub use types::{ObjectKind, ScalarKind, StreamsKind, TypeName, TypeRef};
pub use visitor::{VisitorMut, walk_expr_mut, walk_stmt_mut};
