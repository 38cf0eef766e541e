//! Aggregate output of one analysis run.

use indexmap::IndexSet;
use rowan::TextRange;

use super::pools::{Occurrence, ReferencePools};
use crate::ast::{Ast, DeclId, NodeId, NodeRef};
use crate::mixin::{CompilationGroup, ModuleId};

/// A resolved reference kept for go-to-definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigableNode {
    pub span: TextRange,
    pub declaration: DeclId,
}

/// A foreach statement left in place, with its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForEachOccurrence {
    pub statement: NodeId,
    pub parent: NodeRef,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisRecord {
    pub(crate) pools: ReferencePools,
    pub(crate) stage_initialized: IndexSet<DeclId>,
    pub(crate) typedefs: IndexSet<DeclId>,
    pub(crate) structs: IndexSet<DeclId>,
    pub(crate) base_method_calls: IndexSet<NodeId>,
    pub(crate) this_method_calls: IndexSet<NodeId>,
    pub(crate) stage_method_calls: IndexSet<NodeId>,
    pub(crate) foreach_statements: IndexSet<ForEachOccurrence>,
    pub(crate) navigable: IndexSet<NavigableNode>,
    pub(crate) static_classes: IndexSet<ModuleId>,
}

impl AnalysisRecord {
    pub fn pools(&self) -> &ReferencePools {
        &self.pools
    }

    pub fn stage_initialized(&self) -> &IndexSet<DeclId> {
        &self.stage_initialized
    }

    pub fn typedefs(&self) -> &IndexSet<DeclId> {
        &self.typedefs
    }

    pub fn structs(&self) -> &IndexSet<DeclId> {
        &self.structs
    }

    pub fn base_method_calls(&self) -> &IndexSet<NodeId> {
        &self.base_method_calls
    }

    pub fn this_method_calls(&self) -> &IndexSet<NodeId> {
        &self.this_method_calls
    }

    pub fn stage_method_calls(&self) -> &IndexSet<NodeId> {
        &self.stage_method_calls
    }

    pub fn foreach_statements(&self) -> &IndexSet<ForEachOccurrence> {
        &self.foreach_statements
    }

    pub fn navigable(&self) -> &IndexSet<NavigableNode> {
        &self.navigable
    }

    /// Modules reached only through static references.
    pub fn static_classes(&self) -> &IndexSet<ModuleId> {
        &self.static_classes
    }

    pub(crate) fn file(
        &mut self,
        kind: crate::ast::Classification,
        decl: DeclId,
        occurrence: Occurrence,
        is_method: bool,
    ) {
        let pool = self.pools.get_mut(kind);
        if is_method {
            pool.insert_method(decl, occurrence);
        } else {
            pool.insert_variable(decl, occurrence);
        }
    }

    pub(crate) fn finalize(&mut self, ast: &Ast, group: &CompilationGroup, analyzed: ModuleId) {
        let statics = self.pools.static_refs();
        self.static_classes = statics
            .variables()
            .chain(statics.methods())
            .filter_map(|(decl, _)| ast.decl(decl).owner())
            .filter_map(|shader| group.find_by_shader(shader))
            .filter(|id| *id != analyzed)
            .collect();

        tracing::debug!(
            class = self.pools.class().occurrence_count(),
            static_refs = self.pools.static_refs().occurrence_count(),
            extern_refs = self.pools.extern_refs().occurrence_count(),
            stage_init = self.pools.stage_init().occurrence_count(),
            static_classes = self.static_classes.len(),
            "analysis record finalized"
        );
    }
}
