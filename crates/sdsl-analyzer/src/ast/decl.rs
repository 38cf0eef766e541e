//! Declaration nodes stored in the arena.

use std::ops::BitOr;

use rowan::TextRange;
use sdsl_core::Symbol;

use super::expr::{Expr, ExprKind, Keyword, Name};
use super::stmt::Stmt;
use super::types::TypeRef;

/// Stable index of a declaration in the [`Ast`](super::Ast) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub(super) u32);

impl DeclId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage and composition qualifiers attached to variables and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Qualifiers(u16);

impl Qualifiers {
    pub const NONE: Self = Self(0);
    pub const EXTERN: Self = Self(1 << 0);
    pub const STATIC: Self = Self(1 << 1);
    pub const STREAM: Self = Self(1 << 2);
    pub const PATCH_STREAM: Self = Self(1 << 3);
    pub const STAGE: Self = Self(1 << 4);
    pub const ABSTRACT: Self = Self(1 << 5);
    pub const OVERRIDE: Self = Self(1 << 6);
    pub const CONST: Self = Self(1 << 7);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Qualifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Linker-assigned slot of a method in the flattened virtual table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VTableSlot {
    /// Shader class that introduced the slot.
    pub shader: DeclId,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(Variable),
    Method(Method),
    Shader(ShaderClass),
    Struct(StructDecl),
    Typedef(Typedef),
    Interface(Interface),
    Technique(Technique),
}

impl Decl {
    pub fn name(&self) -> Symbol {
        match self {
            Decl::Variable(v) => v.name,
            Decl::Method(m) => m.name,
            Decl::Shader(s) => s.name,
            Decl::Struct(s) => s.name,
            Decl::Typedef(t) => t.name,
            Decl::Interface(i) => i.name,
            Decl::Technique(t) => t.name,
        }
    }

    pub fn span(&self) -> TextRange {
        match self {
            Decl::Variable(v) => v.span,
            Decl::Method(m) => m.span,
            Decl::Shader(s) => s.span,
            Decl::Struct(s) => s.span,
            Decl::Typedef(t) => t.span,
            Decl::Interface(i) => i.span,
            Decl::Technique(t) => t.span,
        }
    }

    /// Shader class that declared this member, as tagged by the linker.
    pub fn owner(&self) -> Option<DeclId> {
        match self {
            Decl::Variable(v) => v.owner,
            Decl::Method(m) => m.owner,
            Decl::Struct(s) => s.owner,
            Decl::Typedef(t) => t.owner,
            Decl::Shader(_) | Decl::Interface(_) | Decl::Technique(_) => None,
        }
    }

    /// Whether the declaration can stand where a type is expected.
    pub fn is_type(&self) -> bool {
        matches!(self, Decl::Shader(_) | Decl::Struct(_) | Decl::Typedef(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Symbol,
    pub span: TextRange,
    pub ty: TypeRef,
    pub qualifiers: Qualifiers,
    pub initial_value: Option<Expr>,
    pub owner: Option<DeclId>,
}

impl Variable {
    pub fn new(name: Symbol, ty: TypeRef) -> Self {
        Self {
            name,
            span: TextRange::default(),
            ty,
            qualifiers: Qualifiers::NONE,
            initial_value: None,
            owner: None,
        }
    }

    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_initial_value(mut self, value: Expr) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = span;
        self
    }

    pub fn is_extern(&self) -> bool {
        self.qualifiers.contains(Qualifiers::EXTERN)
    }

    pub fn is_static(&self) -> bool {
        self.qualifiers.contains(Qualifiers::STATIC)
    }

    /// Stream and patch-stream variables must be reached through `streams`.
    pub fn is_stream(&self) -> bool {
        self.qualifiers
            .intersects(Qualifiers::STREAM | Qualifiers::PATCH_STREAM)
    }

    /// An extern composition whose initializer is the bare `stage` keyword.
    pub fn is_stage_initialized(&self) -> bool {
        self.is_extern()
            && matches!(
                self.initial_value.as_ref().map(|e| &e.kind),
                Some(ExprKind::Variable(Name::Keyword(Keyword::Stage)))
            )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: Symbol,
    pub span: TextRange,
    pub return_type: TypeRef,
    pub parameters: Vec<DeclId>,
    pub qualifiers: Qualifiers,
    /// `None` for a bodiless (abstract) declaration.
    pub body: Option<Vec<Stmt>>,
    pub owner: Option<DeclId>,
    pub slot: Option<VTableSlot>,
}

impl Method {
    pub fn new(name: Symbol, return_type: TypeRef) -> Self {
        Self {
            name,
            span: TextRange::default(),
            return_type,
            parameters: Vec::new(),
            qualifiers: Qualifiers::NONE,
            body: None,
            owner: None,
            slot: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<DeclId>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = span;
        self
    }

    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_static(&self) -> bool {
        self.qualifiers.contains(Qualifiers::STATIC)
    }

    pub fn is_stage(&self) -> bool {
        self.qualifiers.contains(Qualifiers::STAGE)
    }

    pub fn is_builtin(&self) -> bool {
        self.owner.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderClass {
    pub name: Symbol,
    pub span: TextRange,
    pub base_classes: Vec<super::types::TypeName>,
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Symbol,
    pub span: TextRange,
    pub fields: Vec<DeclId>,
    pub owner: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub name: Symbol,
    pub span: TextRange,
    pub ty: TypeRef,
    pub owner: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: Symbol,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    pub name: Symbol,
    pub span: TextRange,
}
