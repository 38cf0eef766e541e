//! Test fixture: declares shaders into an arena and links them into a
//! compilation group the way the upstream linker does.

use std::ops::{Deref, DerefMut};

use rowan::TextRange;

use crate::analyze::{AnalysisConfig, AnalysisRecord, ReferencePool, analyze};
use crate::ast::{
    Ast, Decl, DeclId, Expr, Method, Qualifiers, ShaderClass, Stmt, StmtKind, TypeName, TypeRef,
    VTableSlot, Variable,
};
use crate::diagnostics::Diagnostics;
use crate::mixin::{CompilationGroup, MixinModule, ModuleId, VirtualTable};

pub fn span(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

/// Occurrences of `decl` as a variable in `pool`, zero when never registered.
pub fn variable_refs(pool: &ReferencePool, decl: DeclId) -> usize {
    pool.variable_occurrences(decl).map_or(0, |o| o.len())
}

pub fn method_refs(pool: &ReferencePool, decl: DeclId) -> usize {
    pool.method_occurrences(decl).map_or(0, |o| o.len())
}

#[derive(Default)]
pub struct Fixture {
    ast: Ast,
    shaders: Vec<(DeclId, Vec<DeclId>)>,
}

impl Deref for Fixture {
    type Target = Ast;

    fn deref(&self) -> &Ast {
        &self.ast
    }
}

impl DerefMut for Fixture {
    fn deref_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a shader class deriving from `bases`, nearest first.
    pub fn class(&mut self, name: &str, bases: &[DeclId]) -> DeclId {
        let sym = self.ast.intern(name);
        let base_classes = bases
            .iter()
            .map(|&b| TypeName::new(self.ast.decl(b).name()))
            .collect();
        let id = self.ast.alloc(Decl::Shader(ShaderClass {
            name: sym,
            span: TextRange::default(),
            base_classes,
            members: Vec::new(),
        }));
        self.shaders.push((id, bases.to_vec()));
        id
    }

    /// Add `decl` to `shader`'s members and tag it with its owner.
    pub fn add_member(&mut self, shader: DeclId, decl: Decl) -> DeclId {
        let mut decl = decl;
        match &mut decl {
            Decl::Variable(v) => v.owner = Some(shader),
            Decl::Method(m) => m.owner = Some(shader),
            Decl::Struct(s) => s.owner = Some(shader),
            Decl::Typedef(t) => t.owner = Some(shader),
            _ => {}
        }
        let id = self.ast.alloc(decl);
        if let Decl::Shader(class) = self.ast.decl_mut(shader) {
            class.members.push(id);
        }
        id
    }

    pub fn var(&mut self, shader: DeclId, name: &str, ty: TypeRef) -> DeclId {
        self.var_with(shader, name, ty, Qualifiers::NONE)
    }

    pub fn var_with(
        &mut self,
        shader: DeclId,
        name: &str,
        ty: TypeRef,
        qualifiers: Qualifiers,
    ) -> DeclId {
        let sym = self.ast.intern(name);
        let var = Variable::new(sym, ty).with_qualifiers(qualifiers);
        self.add_member(shader, Decl::Variable(var))
    }

    pub fn define(&mut self, shader: DeclId, method: Method) -> DeclId {
        self.add_member(shader, Decl::Method(method))
    }

    /// A parameter or local, not owned by any shader.
    pub fn local(&mut self, name: &str, ty: TypeRef) -> DeclId {
        let sym = self.ast.intern(name);
        self.ast.add_variable(Variable::new(sym, ty))
    }

    pub fn local_init(&mut self, name: &str, ty: TypeRef, init: Expr) -> DeclId {
        let sym = self.ast.intern(name);
        self.ast
            .add_variable(Variable::new(sym, ty).with_initial_value(init))
    }

    /// Statement `index` of `method`'s body.
    pub fn stmt_at(&self, method: DeclId, index: usize) -> &Stmt {
        let body = self
            .ast
            .method(method)
            .and_then(|m| m.body.as_ref())
            .expect("method has a body");
        &body[index]
    }

    /// Expression of the expression statement `index` in `method`'s body.
    pub fn expr_at(&self, method: DeclId, index: usize) -> &Expr {
        match &self.stmt_at(method, index).kind {
            StmtKind::Expr(expr) => expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    /// Expression statement reading `name`.
    pub fn ident_stmt(&mut self, name: &str) -> Stmt {
        let expr = self.ast.ident(name);
        self.ast.expr_stmt(expr)
    }

    pub fn new_method(&mut self, name: &str, return_type: TypeRef) -> Method {
        let sym = self.ast.intern(name);
        Method::new(sym, return_type)
    }

    pub fn module_id(&self, shader: DeclId) -> ModuleId {
        self.link()
            .find_by_shader(shader)
            .expect("shader was declared through the fixture")
    }

    /// Build the compilation group: inheritance lists nearest first,
    /// flattened tables with overrides replacing the slot they override.
    pub fn link(&self) -> CompilationGroup {
        let mut group = CompilationGroup::new();
        let ids: Vec<ModuleId> = self
            .shaders
            .iter()
            .map(|(shader, _)| group.add(MixinModule::new(self.ast.decl(*shader).name(), *shader)))
            .collect();

        for (index, (shader, _)) in self.shaders.iter().enumerate() {
            let ancestors = self.ancestors(index);
            let mut flat = VirtualTable::default();
            for &ancestor in ancestors.iter().rev() {
                self.flatten_into(&mut flat, self.shaders[ancestor].0);
            }
            self.flatten_into(&mut flat, *shader);

            let module = group
                .get_mut(ids[index])
                .expect("module was just added");
            module.inheritance = ancestors.iter().map(|&i| ids[i]).collect();
            module.local = self.local_table(*shader);
            module.virtual_table = flat;
        }
        group
    }

    /// Assign vtable slots: overrides reuse the slot of the nearest ancestor
    /// method with the same signature.
    pub fn assign_slots(&mut self) {
        for index in 0..self.shaders.len() {
            let (shader, _) = self.shaders[index];
            let ancestors = self.ancestors(index);
            let members = self.members(shader);
            let mut next = 0;
            for member in members {
                let Some(method) = self.ast.method(member) else {
                    continue;
                };
                let inherited = if method.qualifiers.contains(Qualifiers::OVERRIDE) {
                    ancestors
                        .iter()
                        .flat_map(|&a| self.members(self.shaders[a].0))
                        .find(|&m| self.same_signature(m, member))
                        .and_then(|m| self.ast.method(m).and_then(|m| m.slot))
                } else {
                    None
                };
                let slot = inherited.unwrap_or_else(|| {
                    next += 1;
                    VTableSlot {
                        shader,
                        index: next - 1,
                    }
                });
                if let Some(method) = self.ast.method_mut(member) {
                    method.slot = Some(slot);
                }
            }
        }
    }

    pub fn analyze(&mut self, shader: DeclId) -> (AnalysisRecord, Diagnostics) {
        self.analyze_with(shader, AnalysisConfig::default())
    }

    pub fn analyze_with(
        &mut self,
        shader: DeclId,
        config: AnalysisConfig,
    ) -> (AnalysisRecord, Diagnostics) {
        self.assign_slots();
        let group = self.link();
        let module = group
            .find_by_shader(shader)
            .expect("shader was declared through the fixture");
        analyze(&mut self.ast, &group, module, config).expect("fixture input is well formed")
    }

    fn index_of(&self, shader: DeclId) -> usize {
        self.shaders
            .iter()
            .position(|(s, _)| *s == shader)
            .expect("base shader was declared through the fixture")
    }

    /// Breadth-first over bases: nearest ancestors first, each once.
    fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::new();
        let mut queue: Vec<usize> = self.shaders[index]
            .1
            .iter()
            .map(|&b| self.index_of(b))
            .collect();
        while !queue.is_empty() {
            let mut next = Vec::new();
            for i in queue {
                if order.contains(&i) || i == index {
                    continue;
                }
                order.push(i);
                next.extend(self.shaders[i].1.iter().map(|&b| self.index_of(b)));
            }
            queue = next;
        }
        order
    }

    fn members(&self, shader: DeclId) -> Vec<DeclId> {
        self.ast
            .shader(shader)
            .map(|s| s.members.clone())
            .unwrap_or_default()
    }

    fn local_table(&self, shader: DeclId) -> VirtualTable {
        let mut table = VirtualTable::default();
        self.flatten_into(&mut table, shader);
        table
    }

    fn flatten_into(&self, table: &mut VirtualTable, shader: DeclId) {
        for member in self.members(shader) {
            let decl = self.ast.decl(member);
            let name = decl.name();
            match decl {
                Decl::Variable(_) => table.add_variable(name, member),
                Decl::Method(method) => {
                    let overridden: Vec<DeclId> = table
                        .methods_named(name)
                        .iter()
                        .copied()
                        .filter(|&m| self.same_signature(m, member))
                        .collect();
                    match overridden.split_first() {
                        Some((&first, rest))
                            if method.qualifiers.contains(Qualifiers::OVERRIDE) =>
                        {
                            table.replace_method(name, first, member);
                            for &other in rest {
                                table.remove_method(name, other);
                            }
                        }
                        _ => table.add_method(name, member),
                    }
                }
                Decl::Typedef(_) => table.add_typedef(member),
                Decl::Struct(_) => table.add_struct(member),
                _ => {}
            }
        }
    }

    fn same_signature(&self, a: DeclId, b: DeclId) -> bool {
        let params = |m: DeclId| -> Vec<TypeRef> {
            self.ast
                .method(m)
                .map(|m| {
                    m.parameters
                        .iter()
                        .filter_map(|&p| self.ast.variable(p))
                        .map(|p| p.ty.clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        self.ast.decl(a).name() == self.ast.decl(b).name() && params(a) == params(b)
    }
}
