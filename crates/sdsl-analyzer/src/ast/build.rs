//! Node factories.
//!
//! Every node gets a fresh [`NodeId`](super::NodeId) and an empty span; callers
//! attach source positions with `with_span`.

use rowan::TextRange;

use super::arena::Ast;
use super::decl::DeclId;
use super::expr::{
    Assign, AssignOp, Binary, BinaryOp, Call, Cast, Conditional, Expr, ExprKind, IndexAccess,
    Keyword, Literal, MemberAccess, Name, TypeInference, UnaryOp,
};
use super::stmt::{ForEachStmt, IfStmt, Stmt, StmtKind};
use super::types::{TypeName, TypeRef};

impl Ast {
    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_node_id(),
            span: TextRange::default(),
            kind,
            inference: TypeInference::default(),
            classification: None,
        }
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        let sym = self.intern(name);
        self.expr(ExprKind::Variable(Name::Ident(sym)))
    }

    pub fn keyword(&mut self, keyword: Keyword) -> Expr {
        self.expr(ExprKind::Variable(Name::Keyword(keyword)))
    }

    pub fn member(&mut self, target: Expr, member: &str) -> Expr {
        let member = self.intern(member);
        self.expr(ExprKind::Member(Box::new(MemberAccess {
            target,
            member,
            member_span: TextRange::default(),
        })))
    }

    pub fn index(&mut self, target: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index(Box::new(IndexAccess { target, index })))
    }

    pub fn call(&mut self, target: Expr, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call(Box::new(Call {
            target,
            arguments,
            slot: None,
        })))
    }

    /// Plain call `name(arguments)`.
    pub fn call_named(&mut self, name: &str, arguments: Vec<Expr>) -> Expr {
        let target = self.ident(name);
        self.call(target, arguments)
    }

    pub fn assign(&mut self, target: Expr, value: Expr) -> Expr {
        self.assign_op(AssignOp::Assign, target, value)
    }

    pub fn assign_op(&mut self, op: AssignOp, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign(Box::new(Assign { op, target, value })))
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary(Box::new(Binary { op, left, right })))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary(op, Box::new(operand)))
    }

    pub fn conditional(&mut self, condition: Expr, then: Expr, otherwise: Expr) -> Expr {
        self.expr(ExprKind::Conditional(Box::new(Conditional {
            condition,
            then,
            otherwise,
        })))
    }

    pub fn cast(&mut self, ty: TypeRef, value: Expr) -> Expr {
        self.expr(ExprKind::Cast(Box::new(Cast { ty, value })))
    }

    pub fn construct(&mut self, ty: TypeRef, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Construct(ty, arguments))
    }

    pub fn initializer(&mut self, items: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Initializer(items))
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Float(value)))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn type_name(&mut self, name: &str) -> TypeRef {
        let sym = self.intern(name);
        TypeRef::Name(TypeName::new(sym))
    }

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_node_id(),
            span: TextRange::default(),
            kind,
        }
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn declare(&mut self, decls: Vec<DeclId>) -> Stmt {
        self.stmt(StmtKind::Declare(decls))
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(stmts))
    }

    pub fn if_stmt(&mut self, condition: Expr, then: Stmt, otherwise: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If(Box::new(IfStmt {
            condition,
            then,
            otherwise,
        })))
    }

    pub fn foreach(&mut self, variable: DeclId, collection: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::ForEach(Box::new(ForEachStmt {
            variable,
            collection,
            body,
        })))
    }

    pub fn return_stmt(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }
}
