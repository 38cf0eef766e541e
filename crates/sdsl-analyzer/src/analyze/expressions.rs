//! Expression analysis: name and member resolution, typing, classification.

use rowan::TextRange;
use sdsl_core::Symbol;

use super::analyzer::Analyzer;
use super::context::{AssignStatus, Parent, VisitCtx};
use super::pools::Occurrence;
use super::record::NavigableNode;
use crate::ast::{
    BinaryOp, Classification, Decl, DeclId, Expr, ExprKind, Keyword, Literal, Name, ScalarKind,
    TypeInference, TypeRef, UnaryOp,
};
use crate::diagnostics::DiagnosticKind;

impl Analyzer<'_> {
    pub(super) fn visit_expr(&mut self, expr: &mut Expr, ctx: VisitCtx) {
        match expr.kind {
            ExprKind::Variable(Name::Keyword(keyword)) => self.visit_keyword(expr, keyword, ctx),
            ExprKind::Variable(Name::Ident(name)) => self.visit_identifier(expr, name, ctx),
            ExprKind::Member(_) => self.visit_member(expr, ctx),
            ExprKind::Index(_) => self.visit_index(expr, ctx),
            ExprKind::Call(_) => self.visit_call(expr, ctx),
            _ => self.visit_operator(expr, ctx),
        }
    }

    fn visit_keyword(&mut self, expr: &mut Expr, keyword: Keyword, ctx: VisitCtx) {
        match keyword {
            Keyword::Base | Keyword::This => {
                let shader = self.module.shader;
                expr.inference = TypeInference::resolved(Some(shader), Some(TypeRef::Shader(shader)));
            }
            Keyword::Stage => match ctx.parent {
                // `stage` points at the composition it initializes.
                Parent::Decl(decl) if self.ast.variable(decl).is_some() => {
                    expr.inference = TypeInference::resolved(Some(decl), None);
                }
                _ => {
                    self.diag
                        .report(DiagnosticKind::StageOutsideVariable, expr.span)
                        .emit();
                    expr.inference.unresolved = true;
                }
            },
            Keyword::Streams => {
                let streams = self.ast.streams_variable();
                let ty = self.ast.variable(streams).map(|v| v.ty.clone());
                expr.inference = TypeInference::resolved(Some(streams), ty);
                self.record.navigable.insert(NavigableNode {
                    span: expr.span,
                    declaration: streams,
                });
            }
        }
    }

    fn visit_identifier(&mut self, expr: &mut Expr, name: Symbol, ctx: VisitCtx) {
        let ast = &*self.ast;
        let is_value = |d: DeclId| !matches!(ast.decl(d), Decl::Method(_));
        let found = expr
            .inference
            .declaration
            .filter(|d| is_value(*d))
            .or_else(|| self.scopes.find(name, is_value));

        let Some(decl) = found else {
            // Called method names are resolved by the call, never here.
            if !ctx.in_sampler {
                self.report_named(DiagnosticKind::UndefinedVariable, expr.span, name);
                expr.inference.unresolved = true;
            }
            return;
        };

        self.check_name_conflict(name, decl, expr.span);

        let stream_member = self
            .ast
            .variable(decl)
            .is_some_and(|v| v.owner.is_some() && v.is_stream());
        if stream_member {
            self.report_named(DiagnosticKind::MissingStreamsStruct, expr.span, name);
        }

        let ty = match self.ast.decl(decl) {
            Decl::Variable(var) => Some(var.ty.resolve(self.ast)),
            Decl::Shader(_) => Some(TypeRef::Shader(decl)),
            Decl::Struct(_) => Some(TypeRef::Struct(decl)),
            Decl::Typedef(t) => Some(t.ty.resolve(self.ast)),
            _ => None,
        };
        expr.inference = TypeInference::resolved(Some(decl), ty);

        self.check_static_access(
            decl,
            expr.span,
            ctx,
            DiagnosticKind::NonStaticReferenceInStaticMethod,
        );
        self.file_reference(expr, decl, ctx, None);
    }

    /// Several ancestors declaring the same variable, with no local
    /// redeclaration to pick one.
    fn check_name_conflict(&mut self, name: Symbol, decl: DeclId, span: TextRange) {
        let Some(var) = self.ast.variable(decl) else {
            return;
        };
        if var.owner.is_none() || self.module.local.variables_named(name).len() == 1 {
            return;
        }
        let candidates = self.module.virtual_table.variables_named(name);
        if candidates.len() <= 1 {
            return;
        }

        let mut builder = self
            .diag
            .report(DiagnosticKind::VariableNameAmbiguity, span)
            .message(self.ast.name(name));
        for &candidate in candidates {
            let decl = self.ast.decl(candidate);
            let owner = decl.owner().map(|o| self.ast.decl_name(o)).unwrap_or("?");
            builder = builder.related_to(format!("declared in `{owner}`"), decl.span());
        }
        builder.emit();
    }

    /// Instance members inherited from ancestors are unreachable from a
    /// static method.
    pub(super) fn check_static_access(
        &mut self,
        decl: DeclId,
        span: TextRange,
        ctx: VisitCtx,
        kind: DiagnosticKind,
    ) {
        let Some(method) = ctx.method else {
            return;
        };
        if !self.ast.method(method).is_some_and(|m| m.is_static()) {
            return;
        }
        let (owner, is_static) = match self.ast.decl(decl) {
            Decl::Variable(v) => (v.owner, v.is_static()),
            Decl::Method(m) => (m.owner, m.is_static()),
            _ => return,
        };
        let Some(owner) = owner else {
            return;
        };
        if is_static || owner == self.module.shader {
            return;
        }
        let name = self.ast.decl(decl).name();
        self.report_named(kind, span, name);
    }

    /// File a resolved reference into a pool, or into the navigable list when
    /// the declaration belongs to no shader.
    pub(super) fn file_reference(
        &mut self,
        expr: &mut Expr,
        decl: DeclId,
        ctx: VisitCtx,
        marker: Option<Classification>,
    ) {
        let (owned, is_static, is_method) = match self.ast.decl(decl) {
            Decl::Variable(v) => (v.owner.is_some(), v.is_static(), false),
            Decl::Method(m) => (m.owner.is_some(), m.is_static(), true),
            _ => (false, false, false),
        };
        if !owned {
            self.record.navigable.insert(NavigableNode {
                span: expr.span,
                declaration: decl,
            });
            return;
        }

        let kind = expr.classification.unwrap_or(match marker {
            _ if is_static => Classification::Static,
            Some(marker) => marker,
            None => Classification::Class,
        });
        let occurrence = Occurrence {
            expression: expr.id,
            parent: ctx.parent.node_ref(),
        };
        self.record.file(kind, decl, occurrence, is_method);
        expr.classification = Some(kind);
        tracing::trace!(
            name = self.ast.decl_name(decl),
            ?kind,
            node = expr.id.index(),
            "reference filed"
        );
    }

    /// Composition variable and its shader class, when `target` is an extern
    /// slot (or an element of an extern array).
    pub(super) fn composition_of(&self, target: &Expr) -> Option<(DeclId, DeclId)> {
        if let ExprKind::Index(node) = &target.kind {
            return self.composition_of(&node.target);
        }
        let decl = target.inference.declaration?;
        let var = self.ast.variable(decl)?;
        if !var.is_extern() {
            return None;
        }
        Some((decl, var.ty.shader_class(self.ast)?))
    }

    /// Whether a composition on the chain ending in `target` was initialized
    /// with `stage`.
    pub(super) fn is_stage_init_chain(&self, target: &Expr) -> bool {
        let stage_initialized = target.inference.declaration.is_some_and(|d| {
            self.record.stage_initialized.contains(&d)
                || self.ast.variable(d).is_some_and(|v| v.is_stage_initialized())
        });
        if stage_initialized {
            return true;
        }
        match &target.kind {
            ExprKind::Member(node) => self.is_stage_init_chain(&node.target),
            ExprKind::Index(node) => self.is_stage_init_chain(&node.target),
            _ => false,
        }
    }

    fn visit_member(&mut self, expr: &mut Expr, ctx: VisitCtx) {
        let id = expr.id;
        let span = expr.span;
        let ExprKind::Member(node) = &mut expr.kind else {
            return;
        };
        let member = node.member;
        self.visit_expr(&mut node.target, ctx.with_parent(Parent::MemberTarget(id)));

        let target = &node.target;
        let target_ty = target.inference.target_type.clone();
        let through_streams = target_ty.as_ref().and_then(TypeRef::streams_kind);
        let through_vector = target_ty.as_ref().is_some_and(TypeRef::is_vector_or_matrix);

        let mut resolved: Option<(Option<DeclId>, Option<TypeRef>)> = None;
        let mut marker = None;
        let mut store = true;
        let mut reported = false;

        if let Some((_, shader)) = self.composition_of(target) {
            match self.members_of_composition(shader, member) {
                Some(decl) => {
                    let ty = self.ast.variable(decl).map(|v| v.ty.resolve(self.ast));
                    let is_composition = ty
                        .as_ref()
                        .and_then(|t| t.shader_class(self.ast))
                        .is_some();
                    store = !(is_composition && matches!(ctx.parent, Parent::MemberTarget(_)));
                    marker = Some(if self.is_stage_init_chain(target) {
                        Classification::StageInit
                    } else {
                        Classification::Extern
                    });
                    resolved = Some((Some(decl), ty));
                }
                None if !matches!(ctx.parent, Parent::CallTarget(_)) => {
                    self.report_named(DiagnosticKind::ExternMemberNotFound, span, member);
                    reported = true;
                }
                None => {}
            }
        } else if let Some(TypeRef::Shader(shader)) = &target_ty {
            let shader = *shader;
            if let Some(decl) = self.resolve_class_member(shader, member) {
                let ty = match self.ast.decl(decl) {
                    Decl::Shader(_) => Some(TypeRef::Shader(decl)),
                    _ => self.ast.variable(decl).map(|v| v.ty.resolve(self.ast)),
                };
                if !self.is_in_hierarchy(shader) {
                    marker = Some(Classification::Static);
                }
                resolved = Some((Some(decl), ty));
            }
        } else if let Some(kind) = through_streams {
            match self.scopes.find(member, |d| self.ast.variable(d).is_some()) {
                None => {
                    self.report_named(DiagnosticKind::UndefinedStream, span, member);
                    reported = true;
                }
                Some(decl) => {
                    let var = self.ast.variable(decl);
                    let is_stream = var.is_some_and(|v| v.is_stream());
                    let ty = var.map(|v| v.ty.resolve(self.ast));
                    if !is_stream {
                        self.report_named(DiagnosticKind::ExtraStreamsPrefix, span, member);
                        reported = true;
                    } else if kind.is_read_only() && ctx.assign.is_write() {
                        self.report_named(DiagnosticKind::ReadOnlyStreamWrite, span, member);
                        reported = true;
                    }
                    resolved = Some((Some(decl), ty));
                }
            }
        } else if let Some(ty) = &target_ty {
            resolved = self
                .member_of_type(ty, member)
                .map(|(decl, ty)| (decl, Some(ty)));
        }

        let Some((decl, ty)) = resolved else {
            let target_resolved = target.inference.is_resolved();
            if !reported && target_resolved && !matches!(ctx.parent, Parent::CallTarget(_)) {
                self.diag
                    .report(DiagnosticKind::UnresolvedMemberType, span)
                    .message(self.ast.name(member))
                    .emit();
                reported = true;
            }
            expr.inference.unresolved = reported || !target_resolved;
            return;
        };

        expr.inference = TypeInference::resolved(decl, ty);
        let Some(decl) = decl else {
            return;
        };

        let stream_var = self
            .ast
            .variable(decl)
            .is_some_and(|v| v.owner.is_some() && v.is_stream());
        if stream_var && through_streams.is_none() && !through_vector {
            self.report_named(DiagnosticKind::MissingStreamsStruct, span, member);
        }

        if marker.is_none() {
            self.check_static_access(
                decl,
                span,
                ctx,
                DiagnosticKind::NonStaticReferenceInStaticMethod,
            );
        }
        if store {
            self.file_reference(expr, decl, ctx, marker);
        }
    }

    /// Variable named `member` in a composed shader's flattened members.
    ///
    /// Stream variables are returned too; reaching them through a
    /// composition is reported once the access resolves.
    fn members_of_composition(&self, shader: DeclId, member: Symbol) -> Option<DeclId> {
        let module = self.group.get(self.group.find_by_shader(shader)?)?;
        module
            .virtual_table
            .variables_named(member)
            .iter()
            .copied()
            .find(|&d| self.ast.variable(d).is_some())
    }

    /// `member` of a shader class reached by name, `base` or `this`.
    fn resolve_class_member(&self, shader: DeclId, member: Symbol) -> Option<DeclId> {
        let module = self.group.get(self.group.find_by_shader(shader)?)?;
        let ancestor = module
            .inheritance
            .iter()
            .filter_map(|id| self.group.get(*id))
            .find(|m| m.name == member)
            .map(|m| m.shader);
        ancestor.or_else(|| module.virtual_table.variables_named(member).first().copied())
    }

    /// Struct fields and vector/matrix swizzles.
    fn member_of_type(&self, ty: &TypeRef, member: Symbol) -> Option<(Option<DeclId>, TypeRef)> {
        match ty {
            TypeRef::Struct(decl) => {
                let Decl::Struct(def) = self.ast.decl(*decl) else {
                    return None;
                };
                def.fields
                    .iter()
                    .copied()
                    .find(|&f| self.ast.decl(f).name() == member)
                    .and_then(|f| Some((Some(f), self.ast.variable(f)?.ty.resolve(self.ast))))
            }
            TypeRef::Scalar(kind) => swizzle(*kind, 1, self.ast.name(member)).map(|t| (None, t)),
            TypeRef::Vector(kind, n) => {
                swizzle(*kind, *n, self.ast.name(member)).map(|t| (None, t))
            }
            TypeRef::Matrix(kind, rows, cols) => {
                matrix_swizzle(*kind, *rows, *cols, self.ast.name(member)).map(|t| (None, t))
            }
            _ => None,
        }
    }

    fn visit_index(&mut self, expr: &mut Expr, ctx: VisitCtx) {
        let id = expr.id;
        let span = expr.span;
        let ExprKind::Index(node) = &mut expr.kind else {
            return;
        };
        let inner = ctx.with_parent(Parent::Expr(id));
        self.visit_expr(&mut node.target, inner);
        self.visit_expr(&mut node.index, inner.reading());

        let is_composition = self.composition_of(&node.target).is_some()
            && matches!(node.target.kind, ExprKind::Variable(_) | ExprKind::Member(_));
        if is_composition && !node.index.is_literal() {
            self.diag
                .report(DiagnosticKind::IndexerNotLiteral, node.index.span)
                .emit();
        }

        let ty = node
            .target
            .inference
            .target_type
            .as_ref()
            .and_then(|t| index_type(&t.resolve(self.ast)));
        match ty {
            Some(ty) => expr.inference.target_type = Some(ty),
            None => expr.inference.unresolved = !node.target.inference.is_resolved(),
        }
        tracing::trace!(node = id.index(), ?span, "indexer typed");
    }

    fn visit_operator(&mut self, expr: &mut Expr, ctx: VisitCtx) {
        let id = expr.id;
        let span = expr.span;
        let inner = ctx.with_parent(Parent::Expr(id)).reading();

        let ty = match &mut expr.kind {
            ExprKind::Literal(literal) => Some(TypeRef::Scalar(match literal {
                Literal::Bool(_) => ScalarKind::Bool,
                Literal::Int(_) => ScalarKind::Int,
                Literal::UInt(_) => ScalarKind::UInt,
                Literal::Float(_) => ScalarKind::Float,
            })),
            ExprKind::Assign(node) => {
                if ctx.in_assignment {
                    self.diag
                        .report(DiagnosticKind::NestedAssignment, span)
                        .emit();
                }
                let nested = VisitCtx {
                    in_assignment: true,
                    ..inner
                };
                self.visit_expr(&mut node.value, nested);
                let assign = if node.op.is_compound() {
                    AssignStatus::ReadWrite
                } else {
                    AssignStatus::Write
                };
                self.visit_expr(&mut node.target, VisitCtx { assign, ..nested });
                node.target.inference.target_type.clone()
            }
            ExprKind::Binary(node) => {
                self.visit_expr(&mut node.left, inner);
                self.visit_expr(&mut node.right, inner);
                binary_type(
                    node.op,
                    node.left.inference.target_type.as_ref(),
                    node.right.inference.target_type.as_ref(),
                )
            }
            ExprKind::Unary(op, operand) => {
                let operand_ctx = match op {
                    UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                        VisitCtx {
                            assign: AssignStatus::ReadWrite,
                            ..inner
                        }
                    }
                    _ => inner,
                };
                self.visit_expr(operand, operand_ctx);
                operand.inference.target_type.as_ref().map(|t| match op {
                    UnaryOp::Not if t.streams_kind().is_none() => t.with_scalar(ScalarKind::Bool),
                    _ => t.clone(),
                })
            }
            ExprKind::Conditional(node) => {
                self.visit_expr(&mut node.condition, inner);
                self.visit_expr(&mut node.then, inner);
                self.visit_expr(&mut node.otherwise, inner);
                node.then
                    .inference
                    .target_type
                    .clone()
                    .or_else(|| node.otherwise.inference.target_type.clone())
            }
            ExprKind::Cast(node) => {
                self.resolve_type(&mut node.ty);
                self.visit_expr(&mut node.value, inner);
                Some(node.ty.resolve(self.ast))
            }
            ExprKind::Construct(ty, arguments) => {
                self.resolve_type(ty);
                for argument in arguments.iter_mut() {
                    self.visit_expr(argument, inner);
                }
                Some(ty.resolve(self.ast))
            }
            ExprKind::Initializer(items) => {
                for item in items.iter_mut() {
                    self.visit_expr(item, inner);
                }
                None
            }
            ExprKind::Variable(_) | ExprKind::Member(_) | ExprKind::Index(_) | ExprKind::Call(_) => {
                None
            }
        };

        if ty.is_some() {
            expr.inference.target_type = ty;
        }
    }
}

/// Type produced by indexing a value of type `ty`.
pub(super) fn index_type(ty: &TypeRef) -> Option<TypeRef> {
    match ty {
        TypeRef::Array(element, dims) => match dims.as_slice() {
            [] | [_] => Some((**element).clone()),
            [_, rest @ ..] => Some(TypeRef::Array(element.clone(), rest.to_vec())),
        },
        TypeRef::Vector(kind, _) => Some(TypeRef::Scalar(*kind)),
        TypeRef::Matrix(kind, _, cols) => Some(TypeRef::Vector(*kind, *cols)),
        TypeRef::Generic(kind, arguments) if kind.indexes_to_argument() => arguments.first().cloned(),
        _ => None,
    }
}

fn component_count(ty: &TypeRef) -> u16 {
    ty.shape().map_or(0, |(r, c)| u16::from(r) * u16::from(c))
}

fn binary_type(op: BinaryOp, left: Option<&TypeRef>, right: Option<&TypeRef>) -> Option<TypeRef> {
    if let Some(streams) = [left, right]
        .into_iter()
        .flatten()
        .find(|t| t.streams_kind().is_some())
    {
        return Some(streams.clone());
    }

    let (left, right) = (left?, right?);
    let (lk, rk) = (left.scalar_kind()?, right.scalar_kind()?);
    let kind = if lk.rank() >= rk.rank() { lk } else { rk };

    let shape = match (left.shape()?, right.shape()?) {
        ((1, 1), _) => right,
        (_, (1, 1)) => left,
        (l, r) if l == r => left,
        _ if component_count(left) <= component_count(right) => left,
        _ => right,
    };

    Some(if op.is_boolean() {
        shape.with_scalar(ScalarKind::Bool)
    } else {
        shape.with_scalar(kind)
    })
}

/// `xyzw`/`rgba` component selection on a scalar or vector of `size`.
fn swizzle(kind: ScalarKind, size: u8, member: &str) -> Option<TypeRef> {
    const SETS: [&str; 2] = ["xyzw", "rgba"];
    if member.is_empty() || member.len() > 4 {
        return None;
    }
    let fits = SETS.iter().any(|set| {
        member
            .chars()
            .all(|c| set.find(c).is_some_and(|i| i < usize::from(size)))
    });
    if !fits {
        return None;
    }
    Some(match member.len() {
        1 => TypeRef::Scalar(kind),
        n => TypeRef::Vector(kind, n as u8),
    })
}

/// `_m00`-style (zero-based) or `_11`-style (one-based) matrix components.
fn matrix_swizzle(kind: ScalarKind, rows: u8, cols: u8, member: &str) -> Option<TypeRef> {
    let parts: Vec<&str> = member.split('_').skip(1).collect();
    if !member.starts_with('_') || parts.is_empty() || parts.len() > 4 {
        return None;
    }
    for part in &parts {
        let (digits, base) = match part.strip_prefix('m') {
            Some(digits) => (digits, 0),
            None => (*part, 1),
        };
        let bytes = digits.as_bytes();
        let [r, c] = bytes else {
            return None;
        };
        let (r, c) = (r.checked_sub(b'0')?, c.checked_sub(b'0')?);
        let (r, c) = (r.checked_sub(base)?, c.checked_sub(base)?);
        if r >= rows || c >= cols {
            return None;
        }
    }
    Some(match parts.len() {
        1 => TypeRef::Scalar(kind),
        n => TypeRef::Vector(kind, n as u8),
    })
}
