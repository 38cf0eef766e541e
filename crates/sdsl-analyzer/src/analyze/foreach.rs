//! Foreach statements: unrolling over fixed arrays, or binding in place.

use super::analyzer::{Analyzer, VarRole};
use super::context::VisitCtx;
use super::expressions::index_type;
use super::record::ForEachOccurrence;
use super::scope::ScopeKind;
use crate::ast::{Expr, ExprKind, ForEachStmt, NodeId, Qualifiers, Stmt, StmtKind, TypeRef};
use crate::diagnostics::DiagnosticKind;

impl Analyzer<'_> {
    pub(super) fn visit_foreach(&mut self, stmt: &mut Stmt, ctx: VisitCtx) {
        let here = ctx.statement(stmt.id);
        let StmtKind::ForEach(node) = &mut stmt.kind else {
            return;
        };

        if self.config.expand_foreach {
            self.visit_expr(&mut node.collection, here);
            if let Some(unrolled) = self.unroll(node) {
                for id in chain_ids(&node.collection) {
                    self.record.pools.forget(id);
                }
                tracing::debug!(
                    statement = stmt.id.index(),
                    copies = unrolled.len(),
                    "foreach expanded"
                );
                stmt.kind = StmtKind::List(unrolled);
                self.visit_stmt(stmt, ctx);
                return;
            }
        }

        let collection_visited = self.config.expand_foreach;
        self.with_scope(ScopeKind::Block, |this| {
            if !collection_visited {
                this.visit_expr(&mut node.collection, here);
            }
            this.bind_loop_variable(node);
            this.visit_variable(node.variable, VarRole::ForEachBinding, here);
            let name = this.ast.decl(node.variable).name();
            this.scopes.declare(name, node.variable);
            this.visit_stmt(&mut node.body, here);
        });

        self.record.foreach_statements.insert(ForEachOccurrence {
            statement: stmt.id,
            parent: ctx.parent.node_ref(),
        });
    }

    /// Give a `var` loop variable the element type, and carry `extern` over
    /// from a composition array.
    fn bind_loop_variable(&mut self, node: &ForEachStmt) {
        let collection = &node.collection.inference;
        let element = collection
            .target_type
            .as_ref()
            .and_then(|t| index_type(&t.resolve(self.ast)));
        let is_extern = collection
            .declaration
            .and_then(|d| self.ast.variable(d))
            .is_some_and(|v| v.is_extern());

        let Some(var) = self.ast.variable_mut(node.variable) else {
            return;
        };
        if var.ty == TypeRef::Var {
            if let Some(element) = element {
                var.ty = element;
            }
        }
        if is_extern {
            var.qualifiers.insert(Qualifiers::EXTERN);
        }
    }

    /// One body copy per element of a sized one-dimensional array, with the
    /// loop variable replaced by `collection[i]`.
    ///
    /// Returns `None` when the loop has to stay as written.
    fn unroll(&mut self, node: &ForEachStmt) -> Option<Vec<Stmt>> {
        let array = node.collection.inference.declaration?;
        let var = self.ast.variable(array)?;
        let TypeRef::Array(_, dims) = var.ty.resolve(self.ast) else {
            return None;
        };
        let (array_name, span) = (var.name, node.collection.span);

        let size = match dims.as_slice() {
            [Some(size)] => *size,
            [None] => {
                self.report_named(DiagnosticKind::UnsizedForEach, span, array_name);
                return None;
            }
            _ => {
                self.report_named(DiagnosticKind::MultiDimForEach, span, array_name);
                return None;
            }
        };

        let variable = node.variable;
        let name = self.ast.decl(variable).name();
        let mut copies = Vec::with_capacity(size as usize);
        for i in 0..size {
            let mut body = self.ast.clone_stmt(&node.body);
            let collection = self.ast.clone_expr(&node.collection);
            let index = self.ast.int(i64::from(i)).with_span(span);
            let element = self.ast.index(collection, index).with_span(span);
            self.ast.substitute_variable(&mut body, variable, name, &element);
            copies.push(body);
        }
        Some(copies)
    }
}

/// Nodes of a member/index chain, outermost first.
fn chain_ids(expr: &Expr) -> Vec<NodeId> {
    let mut ids = vec![expr.id];
    match &expr.kind {
        ExprKind::Member(node) => ids.extend(chain_ids(&node.target)),
        ExprKind::Index(node) => {
            ids.extend(chain_ids(&node.target));
            ids.extend(chain_ids(&node.index));
        }
        _ => {}
    }
    ids
}
