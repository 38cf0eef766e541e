//! Method invocation resolution and dispatch bookkeeping.

use rowan::TextRange;
use sdsl_core::Symbol;

use super::analyzer::Analyzer;
use super::context::{Parent, VisitCtx};
use super::overload::{Selection, same_signature, select};
use crate::ast::{Classification, DeclId, Expr, ExprKind, Keyword, Name, TypeInference, TypeRef};
use crate::diagnostics::DiagnosticKind;
use crate::mixin::ModuleId;

/// Syntactic shape of a call target.
#[derive(Debug, Clone, Copy)]
enum CallForm {
    /// `M(..)`
    Plain(Symbol),
    /// `base.M(..)`
    Base(Symbol),
    /// `this.M(..)`
    This(Symbol),
    /// `x.M(..)` for any other receiver.
    Member(Symbol),
    Invalid,
}

impl CallForm {
    fn of(target: &Expr) -> Self {
        match &target.kind {
            ExprKind::Variable(Name::Ident(name)) => Self::Plain(*name),
            ExprKind::Member(node) => match node.target.keyword() {
                Some(Keyword::Base) => Self::Base(node.member),
                Some(Keyword::This) => Self::This(node.member),
                _ => Self::Member(node.member),
            },
            _ => Self::Invalid,
        }
    }
}

/// What the receiver of a member call denotes.
enum Receiver {
    Composition { shader: DeclId, stage: bool },
    Shader(DeclId),
    Other,
}

/// Outcome of looking a call up, before bookkeeping.
struct Resolution {
    method: Option<DeclId>,
    marker: Option<Classification>,
    reported: bool,
}

impl Resolution {
    fn found(method: DeclId, marker: Option<Classification>) -> Self {
        Self {
            method: Some(method),
            marker,
            reported: false,
        }
    }

    fn silent() -> Self {
        Self {
            method: None,
            marker: None,
            reported: false,
        }
    }

    fn reported() -> Self {
        Self {
            method: None,
            marker: None,
            reported: true,
        }
    }
}

impl Analyzer<'_> {
    pub(super) fn visit_call(&mut self, expr: &mut Expr, ctx: VisitCtx) {
        let id = expr.id;
        let span = expr.span;
        let ExprKind::Call(call) = &mut expr.kind else {
            return;
        };

        let inner = ctx.with_parent(Parent::Expr(id)).reading();
        for argument in call.arguments.iter_mut() {
            self.visit_expr(argument, inner);
        }
        let arguments: Vec<Option<TypeRef>> = call
            .arguments
            .iter()
            .map(|a| a.inference.target_type.clone())
            .collect();

        let form = CallForm::of(&call.target);
        let target_id = call.target.id;
        if let ExprKind::Member(node) = &mut call.target.kind {
            self.visit_expr(&mut node.target, inner.with_parent(Parent::MemberTarget(target_id)));
        }

        let resolution = match form {
            CallForm::Plain(name) => self.resolve_plain_call(name, span, &arguments),
            CallForm::Base(name) => {
                self.record.base_method_calls.insert(id);
                self.resolve_base_call(name, span, &arguments)
            }
            CallForm::This(name) => {
                let target_span = call.target.span;
                call.target = self
                    .ast
                    .expr(ExprKind::Variable(Name::Ident(name)))
                    .with_span(target_span);
                tracing::debug!(method = self.ast.name(name), "rewrote `this` call");
                self.resolve_virtual_call(name, span, &arguments)
            }
            CallForm::Member(name) => {
                let receiver = match &call.target.kind {
                    ExprKind::Member(node) => self.receiver_of(&node.target),
                    _ => Receiver::Other,
                };
                self.resolve_member_call(receiver, name, span, &arguments)
            }
            CallForm::Invalid => {
                self.diag.report(DiagnosticKind::MissingMethod, span).emit();
                Resolution::reported()
            }
        };

        let Some(method) = resolution.method else {
            // A miss against intrinsics is silent; only an unresolved receiver
            // taints the call.
            let receiver_unresolved = match &call.target.kind {
                ExprKind::Member(node) => node.target.inference.unresolved,
                _ => false,
            };
            expr.inference.unresolved = resolution.reported || receiver_unresolved;
            return;
        };

        let Some(decl) = self.ast.method(method) else {
            return;
        };
        let return_type = decl.return_type.resolve(self.ast);
        let (name, decl_span) = (decl.name, decl.span);
        let (is_builtin, is_stage, slot) = (decl.is_builtin(), decl.is_stage(), decl.slot);

        call.slot = slot;
        call.target.inference = TypeInference::resolved(Some(method), Some(return_type.clone()));
        expr.inference = TypeInference::resolved(Some(method), Some(return_type));

        if ctx.method == Some(method) {
            self.diag
                .report(DiagnosticKind::CyclicMethod, span)
                .message(self.ast.name(name))
                .related_to("declared here", decl_span)
                .emit();
        }

        let is_base = matches!(form, CallForm::Base(_));
        if resolution.marker.is_none() {
            if !is_builtin && !is_base {
                self.record.this_method_calls.insert(id);
                if is_stage {
                    self.record.stage_method_calls.insert(id);
                }
            }
            self.check_static_access(
                method,
                span,
                ctx,
                DiagnosticKind::NonStaticCallInStaticMethod,
            );
        }

        let call_ctx = ctx.with_parent(Parent::CallTarget(id));
        self.file_reference(&mut call.target, method, call_ctx, resolution.marker);
    }

    fn receiver_of(&self, target: &Expr) -> Receiver {
        if let Some((_, shader)) = self.composition_of(target) {
            return Receiver::Composition {
                shader,
                stage: self.is_stage_init_chain(target),
            };
        }
        match target.inference.target_type {
            Some(TypeRef::Shader(shader)) => Receiver::Shader(shader),
            _ => Receiver::Other,
        }
    }

    fn resolve_plain_call(
        &mut self,
        name: Symbol,
        span: TextRange,
        arguments: &[Option<TypeRef>],
    ) -> Resolution {
        let candidates: Vec<DeclId> = self
            .scopes
            .lookup(name)
            .into_iter()
            .filter(|&d| self.ast.method(d).is_some())
            .collect();

        match select(self.ast, &candidates, arguments) {
            Selection::Found(method) => {
                self.check_method_conflict(name, method, span);
                Resolution::found(method, None)
            }
            Selection::NoCandidates => {
                self.report_named(DiagnosticKind::MissingMethod, span, name);
                Resolution::reported()
            }
            Selection::NoMatch => {
                self.report_named(DiagnosticKind::NoMatchingOverload, span, name);
                Resolution::reported()
            }
        }
    }

    /// The same signature reached through several ancestors with no override
    /// in between.
    fn check_method_conflict(&mut self, name: Symbol, method: DeclId, span: TextRange) {
        let same: Vec<DeclId> = self
            .module
            .virtual_table
            .methods_named(name)
            .iter()
            .copied()
            .filter(|&m| same_signature(self.ast, m, method))
            .collect();
        if same.len() > 1 {
            self.report_method_conflict(name, &same, span);
        }
    }

    fn report_method_conflict(&mut self, name: Symbol, candidates: &[DeclId], span: TextRange) {
        let mut builder = self
            .diag
            .report(DiagnosticKind::MethodNameAmbiguity, span)
            .message(self.ast.name(name));
        for &candidate in candidates {
            let decl = self.ast.decl(candidate);
            let owner = decl.owner().map(|o| self.ast.decl_name(o)).unwrap_or("?");
            builder = builder.related_to(format!("declared in `{owner}`"), decl.span());
        }
        builder.emit();
    }

    /// Whether one module inherits from the other.
    fn are_related(&self, a: ModuleId, b: ModuleId) -> bool {
        let inherits = |from: ModuleId, to: ModuleId| {
            self.group
                .get(from)
                .is_some_and(|m| m.inheritance.contains(&to))
        };
        inherits(a, b) || inherits(b, a)
    }

    /// Nearest ancestor implementation. Another ancestor outside that one's
    /// line offering the same signature makes the call ambiguous.
    fn resolve_base_call(
        &mut self,
        name: Symbol,
        span: TextRange,
        arguments: &[Option<TypeRef>],
    ) -> Resolution {
        let found: Vec<(ModuleId, DeclId)> = self
            .module
            .inheritance
            .iter()
            .filter_map(|&id| {
                let ancestor = self.group.get(id)?;
                match select(self.ast, ancestor.local.methods_named(name), arguments) {
                    Selection::Found(method) => Some((id, method)),
                    Selection::NoCandidates | Selection::NoMatch => None,
                }
            })
            .collect();
        let Some(&(nearest, method)) = found.first() else {
            self.report_named(DiagnosticKind::ImpossibleBaseCall, span, name);
            return Resolution::reported();
        };

        let rivals: Vec<DeclId> = found[1..]
            .iter()
            .filter(|&&(id, m)| {
                same_signature(self.ast, m, method) && !self.are_related(nearest, id)
            })
            .map(|&(_, m)| m)
            .collect();
        if !rivals.is_empty() {
            let mut candidates = vec![method];
            candidates.extend(rivals);
            self.report_method_conflict(name, &candidates, span);
        }
        Resolution::found(method, None)
    }

    fn resolve_virtual_call(
        &mut self,
        name: Symbol,
        span: TextRange,
        arguments: &[Option<TypeRef>],
    ) -> Resolution {
        let module = self.module;
        match select(self.ast, module.virtual_table.methods_named(name), arguments) {
            Selection::Found(method) => {
                self.check_method_conflict(name, method, span);
                Resolution::found(method, None)
            }
            Selection::NoCandidates | Selection::NoMatch => {
                self.report_named(DiagnosticKind::ImpossibleVirtualCall, span, name);
                Resolution::reported()
            }
        }
    }

    fn resolve_member_call(
        &mut self,
        receiver: Receiver,
        name: Symbol,
        span: TextRange,
        arguments: &[Option<TypeRef>],
    ) -> Resolution {
        let (shader, marker) = match receiver {
            Receiver::Composition { shader, stage } => {
                let marker = if stage {
                    Classification::StageInit
                } else {
                    Classification::Extern
                };
                (shader, Some(marker))
            }
            Receiver::Shader(shader) => {
                let marker = (!self.is_in_hierarchy(shader)).then_some(Classification::Static);
                (shader, marker)
            }
            Receiver::Other => return self.resolve_intrinsic_member(name, arguments),
        };

        let Some(module) = self
            .group
            .find_by_shader(shader)
            .and_then(|id| self.group.get(id))
        else {
            return Resolution::silent();
        };

        match select(self.ast, module.virtual_table.methods_named(name), arguments) {
            Selection::Found(method) => Resolution::found(method, marker),
            Selection::NoCandidates => {
                let kind = if is_composition(marker) {
                    DiagnosticKind::ExternMemberNotFound
                } else {
                    DiagnosticKind::MissingMethod
                };
                self.report_named(kind, span, name);
                Resolution::reported()
            }
            Selection::NoMatch => {
                self.report_named(DiagnosticKind::NoMatchingOverload, span, name);
                Resolution::reported()
            }
        }
    }

    /// Methods on textures, buffers and other objects are matched against the
    /// intrinsics by name; anything else stays unresolved without a report.
    fn resolve_intrinsic_member(&self, name: Symbol, arguments: &[Option<TypeRef>]) -> Resolution {
        let candidates: Vec<DeclId> = self
            .ast
            .builtin_methods()
            .iter()
            .copied()
            .filter(|&m| self.ast.decl(m).name() == name)
            .collect();
        match select(self.ast, &candidates, arguments) {
            Selection::Found(method) => Resolution::found(method, None),
            Selection::NoCandidates | Selection::NoMatch => Resolution::silent(),
        }
    }
}

/// Whether the marker came from a composition receiver.
fn is_composition(marker: Option<Classification>) -> bool {
    matches!(
        marker,
        Some(Classification::Extern | Classification::StageInit)
    )
}
