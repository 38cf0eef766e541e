//! Mixin modules as produced by the linker.
//!
//! The analyzer consumes these read-only: a module names its shader class,
//! the members it declares itself, the flattened members visible after
//! inheritance and overriding, and its ancestors nearest-first.

mod vtable;


use sdsl_core::Symbol;

use crate::ast::DeclId;

pub use vtable::VirtualTable;

/// Index of a module inside its [`CompilationGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct MixinModule {
    pub name: Symbol,
    /// The module's shader class declaration.
    pub shader: DeclId,
    /// Members declared directly by this module.
    pub local: VirtualTable,
    /// Members visible after flattening, one per logical slot.
    pub virtual_table: VirtualTable,
    /// Ancestors, nearest first.
    pub inheritance: Vec<ModuleId>,
}

impl MixinModule {
    pub fn new(name: Symbol, shader: DeclId) -> Self {
        Self {
            name,
            shader,
            local: VirtualTable::default(),
            virtual_table: VirtualTable::default(),
            inheritance: Vec::new(),
        }
    }
}

/// All modules of one compilation unit.
///
/// Modules other than the analyzed one and its ancestors are visible by name
/// but not inherited.
#[derive(Debug, Clone, Default)]
pub struct CompilationGroup {
    modules: Vec<MixinModule>,
}

impl CompilationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: MixinModule) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    pub fn get(&self, id: ModuleId) -> Option<&MixinModule> {
        self.modules.get(id.index())
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut MixinModule> {
        self.modules.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &MixinModule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn find_by_shader(&self, shader: DeclId) -> Option<ModuleId> {
        self.iter().find(|(_, m)| m.shader == shader).map(|(id, _)| id)
    }

    pub fn find_by_name(&self, name: Symbol) -> Option<ModuleId> {
        self.iter().find(|(_, m)| m.name == name).map(|(id, _)| id)
    }
}
