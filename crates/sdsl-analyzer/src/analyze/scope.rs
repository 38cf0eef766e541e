//! Lexical scope stack used for plain name lookup.

use indexmap::IndexMap;
use sdsl_core::Symbol;

use crate::ast::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// `streams` and intrinsic methods.
    Builtin,
    /// Shader classes of the whole compilation group.
    Group,
    /// Flattened members of the analyzed module and its ancestors' classes.
    Module,
    Method,
    Block,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    bindings: IndexMap<Symbol, Vec<DeclId>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            bindings: IndexMap::new(),
        });
    }

    pub fn pop(&mut self) -> Option<ScopeKind> {
        self.scopes.pop().map(|s| s.kind)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn innermost(&self) -> Option<ScopeKind> {
        self.scopes.last().map(|s| s.kind)
    }

    /// Bind `decl` under `name` in the innermost scope.
    ///
    /// Rebinding the same declaration is a no-op; distinct declarations under
    /// one name accumulate (overloads, diamond members).
    pub fn declare(&mut self, name: Symbol, decl: DeclId) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        let slot = scope.bindings.entry(name).or_default();
        if !slot.contains(&decl) {
            slot.push(decl);
        }
    }

    /// Every declaration visible under `name`, innermost scope first.
    pub fn lookup(&self, name: Symbol) -> Vec<DeclId> {
        self.scopes
            .iter()
            .rev()
            .filter_map(|s| s.bindings.get(&name))
            .flatten()
            .copied()
            .collect()
    }

    /// First declaration visible under `name` that satisfies `accept`.
    pub fn find(&self, name: Symbol, mut accept: impl FnMut(DeclId) -> bool) -> Option<DeclId> {
        self.scopes
            .iter()
            .rev()
            .filter_map(|s| s.bindings.get(&name))
            .flatten()
            .copied()
            .find(|d| accept(*d))
    }
}
