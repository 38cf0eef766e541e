//! Deep cloning with fresh identities.
//!
//! A cloned subtree must not share node ids or local declarations with its
//! source: the analysis record keys occurrences by [`NodeId`], and each clone
//! of a loop body resolves its locals independently.

use std::collections::HashMap;

use sdsl_core::Symbol;

use super::arena::Ast;
use super::decl::{Decl, DeclId};
use super::expr::{Expr, ExprKind, Name};
use super::stmt::Stmt;
use super::visitor::{VisitorMut, walk_expr_mut, walk_stmt_mut};

impl Ast {
    /// Clone a statement, renumbering every node and duplicating every
    /// declaration it introduces.
    pub fn clone_stmt(&mut self, stmt: &Stmt) -> Stmt {
        let mut copy = stmt.clone();
        Refresh::new(self).visit_stmt(&mut copy);
        copy
    }

    pub fn clone_expr(&mut self, expr: &Expr) -> Expr {
        let mut copy = expr.clone();
        Refresh::new(self).visit_expr(&mut copy);
        copy
    }

    /// Replace references to `variable` (by declaration, or by `name` while
    /// still unresolved) with fresh clones of `replacement`.
    pub fn substitute_variable(
        &mut self,
        stmt: &mut Stmt,
        variable: DeclId,
        name: Symbol,
        replacement: &Expr,
    ) {
        let mut pass = Substitute {
            ast: self,
            variable,
            name,
            replacement,
        };
        pass.visit_stmt(stmt);
    }
}

struct Refresh<'a> {
    ast: &'a mut Ast,
    remap: HashMap<DeclId, DeclId>,
}

impl<'a> Refresh<'a> {
    fn new(ast: &'a mut Ast) -> Self {
        Self {
            ast,
            remap: HashMap::new(),
        }
    }
}

impl VisitorMut for Refresh<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        stmt.id = self.ast.next_node_id();
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        expr.id = self.ast.next_node_id();
        if let Some(decl) = expr.inference.declaration {
            if let Some(&fresh) = self.remap.get(&decl) {
                expr.inference.declaration = Some(fresh);
            }
        }
        walk_expr_mut(self, expr);
    }

    fn visit_decl(&mut self, decl: &mut DeclId) {
        let mut copy = self.ast.decl(*decl).clone();
        if let Decl::Variable(var) = &mut copy {
            if let Some(init) = &mut var.initial_value {
                self.visit_expr(init);
            }
        }
        let fresh = self.ast.alloc(copy);
        self.remap.insert(*decl, fresh);
        *decl = fresh;
    }
}

struct Substitute<'a> {
    ast: &'a mut Ast,
    variable: DeclId,
    name: Symbol,
    replacement: &'a Expr,
}

impl Substitute<'_> {
    fn is_loop_variable(&self, expr: &Expr) -> bool {
        match expr.kind {
            ExprKind::Variable(Name::Ident(name)) => match expr.inference.declaration {
                Some(decl) => decl == self.variable,
                None => name == self.name,
            },
            _ => false,
        }
    }
}

impl VisitorMut for Substitute<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if self.is_loop_variable(expr) {
            let span = expr.span;
            *expr = self.ast.clone_expr(self.replacement).with_span(span);
            return;
        }
        walk_expr_mut(self, expr);
    }

    fn visit_decl(&mut self, decl: &mut DeclId) {
        let Some(mut init) = self
            .ast
            .variable_mut(*decl)
            .and_then(|v| v.initial_value.take())
        else {
            return;
        };
        self.visit_expr(&mut init);
        if let Some(var) = self.ast.variable_mut(*decl) {
            var.initial_value = Some(init);
        }
    }
}
