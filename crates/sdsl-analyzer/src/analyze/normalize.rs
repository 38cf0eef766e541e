//! Keyword normalization.
//!
//! `base`, `this`, `stage` and `streams` arrive from the parser as ordinary
//! identifiers. They are rewritten to [`Name::Keyword`] once, across every
//! initializer and method body in the arena, so later passes match on the
//! enum instead of comparing text.

use sdsl_core::Symbol;

use crate::ast::{Ast, Decl, Expr, ExprKind, Keyword, Name, VisitorMut, walk_expr_mut};

pub(crate) fn normalize_keywords(ast: &mut Ast) {
    let keywords: Vec<(Symbol, Keyword)> = Keyword::ALL
        .iter()
        .filter_map(|&k| Some((ast.interner().get(k.as_str())?, k)))
        .collect();

    let mut pass = Normalize {
        keywords,
        rewritten: 0,
    };
    for id in ast.decl_ids() {
        match ast.decl_mut(id) {
            Decl::Variable(var) => {
                if let Some(init) = &mut var.initial_value {
                    pass.visit_expr(init);
                }
            }
            Decl::Method(method) => {
                for stmt in method.body.iter_mut().flatten() {
                    pass.visit_stmt(stmt);
                }
            }
            _ => {}
        }
    }

    tracing::trace!(rewritten = pass.rewritten, "keywords normalized");
}

struct Normalize {
    keywords: Vec<(Symbol, Keyword)>,
    rewritten: usize,
}

impl VisitorMut for Normalize {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Variable(Name::Ident(sym)) = expr.kind {
            if let Some(&(_, keyword)) = self.keywords.iter().find(|(s, _)| *s == sym) {
                expr.kind = ExprKind::Variable(Name::Keyword(keyword));
                self.rewritten += 1;
            }
            return;
        }
        walk_expr_mut(self, expr);
    }
}
