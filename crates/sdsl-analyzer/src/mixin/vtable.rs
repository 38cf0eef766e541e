use indexmap::IndexMap;
use sdsl_core::Symbol;

use crate::ast::DeclId;

/// Members of a module keyed by name.
///
/// A name maps to several declarations when the table is flattened across a
/// diamond (variables) or holds overloads (methods).
#[derive(Debug, Clone, Default)]
pub struct VirtualTable {
    variables: IndexMap<Symbol, Vec<DeclId>>,
    methods: IndexMap<Symbol, Vec<DeclId>>,
    typedefs: Vec<DeclId>,
    structs: Vec<DeclId>,
}

impl VirtualTable {
    pub fn add_variable(&mut self, name: Symbol, decl: DeclId) {
        let slot = self.variables.entry(name).or_default();
        if !slot.contains(&decl) {
            slot.push(decl);
        }
    }

    pub fn add_method(&mut self, name: Symbol, decl: DeclId) {
        let slot = self.methods.entry(name).or_default();
        if !slot.contains(&decl) {
            slot.push(decl);
        }
    }

    /// Put `new` in the slot held by `old`. Returns false if `old` is absent.
    pub fn replace_method(&mut self, name: Symbol, old: DeclId, new: DeclId) -> bool {
        let Some(slot) = self.methods.get_mut(&name) else {
            return false;
        };
        match slot.iter_mut().find(|d| **d == old) {
            Some(entry) => {
                *entry = new;
                true
            }
            None => false,
        }
    }

    /// Drop `decl` from the overloads of `name`. Returns false if absent.
    pub fn remove_method(&mut self, name: Symbol, decl: DeclId) -> bool {
        let Some(slot) = self.methods.get_mut(&name) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|d| *d != decl);
        before != slot.len()
    }

    pub fn add_typedef(&mut self, decl: DeclId) {
        self.typedefs.push(decl);
    }

    pub fn add_struct(&mut self, decl: DeclId) {
        self.structs.push(decl);
    }

    pub fn variables_named(&self, name: Symbol) -> &[DeclId] {
        self.variables.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn methods_named(&self, name: Symbol) -> &[DeclId] {
        self.methods.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn variables(&self) -> impl Iterator<Item = (Symbol, DeclId)> + '_ {
        self.variables
            .iter()
            .flat_map(|(name, decls)| decls.iter().map(move |d| (*name, *d)))
    }

    pub fn methods(&self) -> impl Iterator<Item = (Symbol, DeclId)> + '_ {
        self.methods
            .iter()
            .flat_map(|(name, decls)| decls.iter().map(move |d| (*name, *d)))
    }

    pub fn typedefs(&self) -> &[DeclId] {
        &self.typedefs
    }

    pub fn structs(&self) -> &[DeclId] {
        &self.structs
    }
}
