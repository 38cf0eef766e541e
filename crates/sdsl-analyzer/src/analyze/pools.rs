//! Reference classification pools.
//!
//! Each resolved reference to a module member is filed into exactly one of
//! four pools, keyed by the referenced declaration.

use indexmap::{IndexMap, IndexSet};

use crate::ast::{Classification, DeclId, NodeId, NodeRef};

/// One referencing expression together with its parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub expression: NodeId,
    pub parent: NodeRef,
}

#[derive(Debug, Clone, Default)]
pub struct ReferencePool {
    variables: IndexMap<DeclId, IndexSet<Occurrence>>,
    methods: IndexMap<DeclId, IndexSet<Occurrence>>,
}

impl ReferencePool {
    /// Make `decl` enumerable even if it is never referenced.
    pub(crate) fn register_variable(&mut self, decl: DeclId) {
        self.variables.entry(decl).or_default();
    }

    pub(crate) fn register_method(&mut self, decl: DeclId) {
        self.methods.entry(decl).or_default();
    }

    pub(crate) fn insert_variable(&mut self, decl: DeclId, occurrence: Occurrence) -> bool {
        self.variables.entry(decl).or_default().insert(occurrence)
    }

    pub(crate) fn insert_method(&mut self, decl: DeclId, occurrence: Occurrence) -> bool {
        self.methods.entry(decl).or_default().insert(occurrence)
    }

    pub fn variables(&self) -> impl Iterator<Item = (DeclId, &IndexSet<Occurrence>)> {
        self.variables.iter().map(|(d, o)| (*d, o))
    }

    pub fn methods(&self) -> impl Iterator<Item = (DeclId, &IndexSet<Occurrence>)> {
        self.methods.iter().map(|(d, o)| (*d, o))
    }

    pub fn variable_occurrences(&self, decl: DeclId) -> Option<&IndexSet<Occurrence>> {
        self.variables.get(&decl)
    }

    pub fn method_occurrences(&self, decl: DeclId) -> Option<&IndexSet<Occurrence>> {
        self.methods.get(&decl)
    }

    pub fn contains_variable(&self, decl: DeclId) -> bool {
        self.variables.contains_key(&decl)
    }

    pub fn contains_method(&self, decl: DeclId) -> bool {
        self.methods.contains_key(&decl)
    }

    pub fn occurrence_count(&self) -> usize {
        self.variables.values().map(IndexSet::len).sum::<usize>()
            + self.methods.values().map(IndexSet::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.methods.is_empty()
    }

    fn forget(&mut self, expression: NodeId) {
        for occurrences in self.variables.values_mut().chain(self.methods.values_mut()) {
            occurrences.retain(|o| o.expression != expression);
        }
    }

    fn holds(&self, expression: NodeId) -> bool {
        self.variables
            .values()
            .chain(self.methods.values())
            .flatten()
            .any(|o| o.expression == expression)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferencePools {
    class: ReferencePool,
    static_refs: ReferencePool,
    extern_refs: ReferencePool,
    stage_init: ReferencePool,
}

impl ReferencePools {
    pub fn get(&self, kind: Classification) -> &ReferencePool {
        match kind {
            Classification::Class => &self.class,
            Classification::Static => &self.static_refs,
            Classification::Extern => &self.extern_refs,
            Classification::StageInit => &self.stage_init,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: Classification) -> &mut ReferencePool {
        match kind {
            Classification::Class => &mut self.class,
            Classification::Static => &mut self.static_refs,
            Classification::Extern => &mut self.extern_refs,
            Classification::StageInit => &mut self.stage_init,
        }
    }

    pub fn class(&self) -> &ReferencePool {
        &self.class
    }

    pub fn static_refs(&self) -> &ReferencePool {
        &self.static_refs
    }

    pub fn extern_refs(&self) -> &ReferencePool {
        &self.extern_refs
    }

    pub fn stage_init(&self) -> &ReferencePool {
        &self.stage_init
    }

    /// Total occurrences across all four pools.
    pub fn occurrence_count(&self) -> usize {
        self.iter().map(|(_, p)| p.occurrence_count()).sum()
    }

    /// Pools holding an occurrence of `expression`.
    pub fn classify(&self, expression: NodeId) -> Vec<Classification> {
        self.iter()
            .filter(|(_, p)| p.holds(expression))
            .map(|(k, _)| k)
            .collect()
    }

    /// Drop every occurrence of `expression`, for nodes removed from the tree.
    pub(crate) fn forget(&mut self, expression: NodeId) {
        for pool in [
            &mut self.class,
            &mut self.static_refs,
            &mut self.extern_refs,
            &mut self.stage_init,
        ] {
            pool.forget(expression);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Classification, &ReferencePool)> {
        [
            (Classification::Class, &self.class),
            (Classification::Static, &self.static_refs),
            (Classification::Extern, &self.extern_refs),
            (Classification::StageInit, &self.stage_init),
        ]
        .into_iter()
    }
}
