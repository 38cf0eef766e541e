//! Expression nodes and their inference slots.

use rowan::TextRange;
use sdsl_core::Symbol;

use super::decl::{DeclId, VTableSlot};
use super::types::TypeRef;

/// Identity of an expression or statement node, unique within one [`Ast`](super::Ast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(super) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Either an expression/statement node or a declaration, used as the parent
/// half of a reference occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Decl(DeclId),
}

/// Identifiers with fixed meaning, recognized once during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Base,
    This,
    Stage,
    Streams,
}

impl Keyword {
    pub const ALL: [Keyword; 4] = [Self::Base, Self::This, Self::Stage, Self::Streams];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::This => "this",
            Self::Stage => "stage",
            Self::Streams => "streams",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Name {
    Ident(Symbol),
    Keyword(Keyword),
}

/// Reference pool an occurrence was filed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    Class,
    Static,
    Extern,
    StageInit,
}

/// What an expression resolved to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeInference {
    pub declaration: Option<DeclId>,
    pub target_type: Option<TypeRef>,
    /// Set when resolution failed and a diagnostic was emitted for it.
    pub unresolved: bool,
}

impl TypeInference {
    pub fn resolved(declaration: Option<DeclId>, target_type: Option<TypeRef>) -> Self {
        Self {
            declaration,
            target_type,
            unresolved: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.declaration.is_some() || self.target_type.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    pub fn is_compound(self) -> bool {
        !matches!(self, Self::Assign)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Eq,
    NotEq,
}

impl BinaryOp {
    /// Comparison and logical operators produce booleans.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::And
                | Self::Or
                | Self::Less
                | Self::Greater
                | Self::LessEq
                | Self::GreaterEq
                | Self::Eq
                | Self::NotEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: TextRange,
    pub kind: ExprKind,
    pub inference: TypeInference,
    pub classification: Option<Classification>,
}

impl Expr {
    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = span;
        self
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            ExprKind::Variable(Name::Keyword(k)) => Some(k),
            _ => None,
        }
    }

    /// Innermost target of a member/index chain.
    pub fn chain_root(&self) -> &Expr {
        match &self.kind {
            ExprKind::Member(m) => m.target.chain_root(),
            ExprKind::Index(i) => i.target.chain_root(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Variable(Name),
    Member(Box<MemberAccess>),
    Index(Box<IndexAccess>),
    Call(Box<Call>),
    Assign(Box<Assign>),
    Binary(Box<Binary>),
    Unary(UnaryOp, Box<Expr>),
    Conditional(Box<Conditional>),
    Cast(Box<Cast>),
    /// Constructor call such as `float4(a, b)`.
    Construct(TypeRef, Vec<Expr>),
    /// Brace initializer, also used for sampler state blocks.
    Initializer(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub target: Expr,
    pub member: Symbol,
    pub member_span: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexAccess {
    pub target: Expr,
    pub index: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub target: Expr,
    pub arguments: Vec<Expr>,
    /// Virtual table slot of the resolved method, copied from its declaration.
    pub slot: Option<VTableSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub op: AssignOp,
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expr,
    pub then: Expr,
    pub otherwise: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub ty: TypeRef,
    pub value: Expr,
}
