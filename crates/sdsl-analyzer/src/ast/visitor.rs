//! Mutable AST visitor.
//!
//! Implement [`VisitorMut`] and override `visit_*` methods to add logic. Call
//! the matching `walk_*_mut` function inside an override to keep descending,
//! or omit it to stop.
//!
//! ```ignore
//! impl VisitorMut for Renumber<'_> {
//!     fn visit_expr(&mut self, expr: &mut Expr) {
//!         expr.id = self.ast.next_node_id();
//!         walk_expr_mut(self, expr);
//!     }
//! }
//! ```
//!
//! Declarations introduced inside bodies are arena entries, so the walker
//! only hands out their ids through [`VisitorMut::visit_decl`].

use super::decl::DeclId;
use super::expr::{Expr, ExprKind};
use super::stmt::{Stmt, StmtKind};
use super::types::TypeRef;

pub trait VisitorMut: Sized {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_decl(&mut self, _decl: &mut DeclId) {}

    fn visit_type(&mut self, _ty: &mut TypeRef) {}
}

pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Declare(decls) => {
            for decl in decls {
                visitor.visit_decl(decl);
            }
        }
        StmtKind::Block(stmts) | StmtKind::List(stmts) => {
            for stmt in stmts {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::If(node) => {
            visitor.visit_expr(&mut node.condition);
            visitor.visit_stmt(&mut node.then);
            if let Some(otherwise) = &mut node.otherwise {
                visitor.visit_stmt(otherwise);
            }
        }
        StmtKind::For(node) => {
            if let Some(init) = &mut node.init {
                visitor.visit_stmt(init);
            }
            if let Some(condition) = &mut node.condition {
                visitor.visit_expr(condition);
            }
            if let Some(step) = &mut node.step {
                visitor.visit_expr(step);
            }
            visitor.visit_stmt(&mut node.body);
        }
        StmtKind::While(node) => {
            visitor.visit_expr(&mut node.condition);
            visitor.visit_stmt(&mut node.body);
        }
        StmtKind::ForEach(node) => {
            visitor.visit_decl(&mut node.variable);
            visitor.visit_expr(&mut node.collection);
            visitor.visit_stmt(&mut node.body);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard => {}
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) => {}
        ExprKind::Member(node) => visitor.visit_expr(&mut node.target),
        ExprKind::Index(node) => {
            visitor.visit_expr(&mut node.target);
            visitor.visit_expr(&mut node.index);
        }
        ExprKind::Call(node) => {
            visitor.visit_expr(&mut node.target);
            for arg in &mut node.arguments {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Assign(node) => {
            visitor.visit_expr(&mut node.target);
            visitor.visit_expr(&mut node.value);
        }
        ExprKind::Binary(node) => {
            visitor.visit_expr(&mut node.left);
            visitor.visit_expr(&mut node.right);
        }
        ExprKind::Unary(_, operand) => visitor.visit_expr(operand),
        ExprKind::Conditional(node) => {
            visitor.visit_expr(&mut node.condition);
            visitor.visit_expr(&mut node.then);
            visitor.visit_expr(&mut node.otherwise);
        }
        ExprKind::Cast(node) => {
            visitor.visit_type(&mut node.ty);
            visitor.visit_expr(&mut node.value);
        }
        ExprKind::Construct(ty, args) => {
            visitor.visit_type(ty);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Initializer(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
    }
}
