//! Type references.
//!
//! A declared type starts out as written (possibly a [`TypeRef::Name`]) and is
//! canonicalized by [`TypeRef::resolve`] once its name slot is filled in.

use rowan::TextRange;
use sdsl_core::Symbol;

use super::arena::Ast;
use super::decl::{Decl, DeclId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Half,
    Float,
    Double,
}

impl ScalarKind {
    pub fn is_float(self) -> bool {
        matches!(self, Self::Half | Self::Float | Self::Double)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::UInt)
    }

    /// Promotion rank used when two numeric operands meet.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Bool => 0,
            Self::Int => 1,
            Self::UInt => 2,
            Self::Half => 3,
            Self::Float => 4,
            Self::Double => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Texture2DArray,
    Buffer,
    RWBuffer,
    StructuredBuffer,
    RWStructuredBuffer,
    SamplerState,
    SamplerComparisonState,
    InputPatch,
    OutputPatch,
    PointStream,
    LineStream,
    TriangleStream,
}

impl ObjectKind {
    pub fn is_sampler(self) -> bool {
        matches!(self, Self::SamplerState | Self::SamplerComparisonState)
    }

    /// Textures and typed buffers lose their element argument when declared
    /// through `var`.
    pub fn collapses_to_non_generic(self) -> bool {
        matches!(
            self,
            Self::Texture1D
                | Self::Texture2D
                | Self::Texture3D
                | Self::TextureCube
                | Self::Texture2DArray
                | Self::Buffer
                | Self::RWBuffer
        )
    }

    /// Indexing yields the first generic argument.
    pub fn indexes_to_argument(self) -> bool {
        matches!(
            self,
            Self::InputPatch
                | Self::OutputPatch
                | Self::PointStream
                | Self::LineStream
                | Self::TriangleStream
                | Self::StructuredBuffer
                | Self::RWStructuredBuffer
                | Self::Buffer
                | Self::RWBuffer
        )
    }
}

/// The implicit per-invocation stream objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamsKind {
    /// The read/write `streams` object.
    Streams,
    Input,
    Input2,
    Output,
    Constants,
}

impl StreamsKind {
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Input | Self::Input2 | Self::Constants)
    }
}

/// A type written by name, with the declaration it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: Symbol,
    pub span: TextRange,
    pub declaration: Option<DeclId>,
}

impl TypeName {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            span: TextRange::default(),
            declaration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Void,
    /// Placeholder of a `var` declaration.
    Var,
    Scalar(ScalarKind),
    Vector(ScalarKind, u8),
    /// Rows, then columns.
    Matrix(ScalarKind, u8, u8),
    /// Element type and per-dimension sizes; `None` for an unsized dimension.
    Array(Box<TypeRef>, Vec<Option<u32>>),
    Object(ObjectKind),
    Generic(ObjectKind, Vec<TypeRef>),
    Streams(StreamsKind),
    Name(TypeName),
    Shader(DeclId),
    Struct(DeclId),
}

/// Bound on typedef chains followed by [`TypeRef::resolve`].
const MAX_ALIAS_DEPTH: usize = 32;

impl TypeRef {
    pub fn array(element: TypeRef, size: u32) -> Self {
        Self::Array(Box::new(element), vec![Some(size)])
    }

    /// Canonical form: resolved names become `Shader`/`Struct`, typedefs are
    /// followed to their target.
    pub fn resolve(&self, ast: &Ast) -> TypeRef {
        let mut current = self;
        for _ in 0..MAX_ALIAS_DEPTH {
            match current {
                TypeRef::Name(TypeName {
                    declaration: Some(id),
                    ..
                }) => match ast.decl(*id) {
                    Decl::Shader(_) => return TypeRef::Shader(*id),
                    Decl::Struct(_) => return TypeRef::Struct(*id),
                    Decl::Typedef(t) => current = &t.ty,
                    _ => return current.clone(),
                },
                TypeRef::Array(element, dims) => {
                    return TypeRef::Array(Box::new(element.resolve(ast)), dims.clone());
                }
                other => return other.clone(),
            }
        }
        current.clone()
    }

    /// Shader class named by this type, looking through one array level.
    pub fn shader_class(&self, ast: &Ast) -> Option<DeclId> {
        match self.resolve(ast) {
            TypeRef::Shader(id) => Some(id),
            TypeRef::Array(element, _) => match *element {
                TypeRef::Shader(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    /// Element type of an array, the type itself otherwise.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Array(element, _) => element,
            other => other,
        }
    }

    pub fn to_non_generic(&self) -> TypeRef {
        match self {
            TypeRef::Generic(kind, _) if kind.collapses_to_non_generic() => TypeRef::Object(*kind),
            other => other.clone(),
        }
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeRef::Scalar(k) | TypeRef::Vector(k, _) | TypeRef::Matrix(k, _, _) => Some(*k),
            _ => None,
        }
    }

    /// Numeric shape as (rows, columns); vectors are column-less.
    pub fn shape(&self) -> Option<(u8, u8)> {
        match self {
            TypeRef::Scalar(_) => Some((1, 1)),
            TypeRef::Vector(_, n) => Some((*n, 1)),
            TypeRef::Matrix(_, r, c) => Some((*r, *c)),
            _ => None,
        }
    }

    /// Same shape with a different scalar kind.
    pub fn with_scalar(&self, kind: ScalarKind) -> TypeRef {
        match self {
            TypeRef::Scalar(_) => TypeRef::Scalar(kind),
            TypeRef::Vector(_, n) => TypeRef::Vector(kind, *n),
            TypeRef::Matrix(_, r, c) => TypeRef::Matrix(kind, *r, *c),
            other => other.clone(),
        }
    }

    pub fn is_vector_or_matrix(&self) -> bool {
        matches!(self, TypeRef::Vector(..) | TypeRef::Matrix(..))
    }

    pub fn streams_kind(&self) -> Option<StreamsKind> {
        match self {
            TypeRef::Streams(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self, TypeRef::Object(kind) if kind.is_sampler())
    }

    /// Textures, buffers, samplers and other opaque objects.
    pub(crate) fn is_object_like(&self) -> bool {
        matches!(
            self,
            TypeRef::Object(_) | TypeRef::Generic(..) | TypeRef::Shader(_)
        )
    }
}
