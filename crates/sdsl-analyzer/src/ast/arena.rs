use sdsl_core::{Interner, Symbol};

use super::decl::{Decl, DeclId, Method, ShaderClass, Variable};
use super::expr::{Keyword, NodeId};
use super::types::{StreamsKind, TypeRef};

/// Owner of every declaration, the identifier interner, and the node id
/// counter for one compilation.
///
/// A fresh arena already contains the builtin `streams` object.
#[derive(Debug, Clone)]
pub struct Ast {
    decls: Vec<Decl>,
    interner: Interner,
    next_node: u32,
    streams: DeclId,
    builtin_methods: Vec<DeclId>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Self {
            decls: Vec::new(),
            interner: Interner::new(),
            next_node: 0,
            streams: DeclId(0),
            builtin_methods: Vec::new(),
        };
        let name = ast.intern(Keyword::Streams.as_str());
        ast.streams = ast.alloc(Decl::Variable(Variable::new(
            name,
            TypeRef::Streams(StreamsKind::Streams),
        )));
        ast
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn decl_name(&self, id: DeclId) -> &str {
        self.name(self.decl(id).name())
    }

    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn add_variable(&mut self, variable: Variable) -> DeclId {
        self.alloc(Decl::Variable(variable))
    }

    pub fn add_method(&mut self, method: Method) -> DeclId {
        self.alloc(Decl::Method(method))
    }

    /// Register an intrinsic. Builtins have no owning shader and are visible
    /// from every module.
    pub fn add_builtin_method(
        &mut self,
        name: &str,
        return_type: TypeRef,
        parameters: &[TypeRef],
    ) -> DeclId {
        let name = self.intern(name);
        let params = parameters
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let param = self.intern(&format!("p{i}"));
                self.add_variable(Variable::new(param, ty.clone()))
            })
            .collect();
        let id = self.add_method(Method::new(name, return_type).with_parameters(params));
        self.builtin_methods.push(id);
        id
    }

    pub fn builtin_methods(&self) -> &[DeclId] {
        &self.builtin_methods
    }

    pub fn streams_variable(&self) -> DeclId {
        self.streams
    }

    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    pub fn variable(&self, id: DeclId) -> Option<&Variable> {
        match self.decl(id) {
            Decl::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn variable_mut(&mut self, id: DeclId) -> Option<&mut Variable> {
        match self.decl_mut(id) {
            Decl::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn method(&self, id: DeclId) -> Option<&Method> {
        match self.decl(id) {
            Decl::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, id: DeclId) -> Option<&mut Method> {
        match self.decl_mut(id) {
            Decl::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn shader(&self, id: DeclId) -> Option<&ShaderClass> {
        match self.decl(id) {
            Decl::Shader(s) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> + use<> {
        (0..self.decls.len() as u32).map(DeclId)
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }
}
