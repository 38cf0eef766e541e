//! Declaration and statement analysis.
//!
//! Expressions live in `expressions.rs`, invocations in `invocation.rs`, and
//! foreach handling in `foreach.rs`; all of them extend [`Analyzer`].

use rowan::TextRange;
use sdsl_core::Symbol;

use super::AnalysisConfig;
use super::invariants;
use super::context::{Parent, VisitCtx};
use super::record::{AnalysisRecord, NavigableNode};
use super::scope::{ScopeKind, ScopeStack};
use crate::ast::{
    Ast, Classification, Decl, DeclId, Expr, Keyword, Qualifiers, Stmt, StmtKind, TypeRef,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::mixin::{CompilationGroup, MixinModule, ModuleId};

/// Where a variable declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarRole {
    Member,
    Parameter,
    Local,
    ForEachBinding,
    Field,
}

pub(crate) struct Analyzer<'a> {
    pub(super) ast: &'a mut Ast,
    pub(super) group: &'a CompilationGroup,
    pub(super) module_id: ModuleId,
    pub(super) module: &'a MixinModule,
    pub(super) config: AnalysisConfig,
    pub(super) scopes: ScopeStack,
    pub(super) record: AnalysisRecord,
    pub(super) diag: Diagnostics,
}

impl<'a> Analyzer<'a> {
    pub(super) fn new(
        ast: &'a mut Ast,
        group: &'a CompilationGroup,
        module_id: ModuleId,
        module: &'a MixinModule,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            ast,
            group,
            module_id,
            module,
            config,
            scopes: ScopeStack::new(),
            record: AnalysisRecord::default(),
            diag: Diagnostics::new(),
        }
    }

    pub(super) fn run(mut self) -> (AnalysisRecord, Diagnostics) {
        self.seed_scopes();
        self.visit_shader_class(self.module.shader);
        invariants::assert_scopes_unwound(&self.scopes);
        self.record.finalize(self.ast, self.group, self.module_id);
        (self.record, self.diag)
    }

    fn seed_scopes(&mut self) {
        self.scopes.push(ScopeKind::Builtin);
        let streams = self.ast.streams_variable();
        self.scopes.declare(self.ast.decl(streams).name(), streams);
        for &method in self.ast.builtin_methods() {
            self.scopes.declare(self.ast.decl(method).name(), method);
        }

        self.scopes.push(ScopeKind::Group);
        for (_, module) in self.group.iter() {
            self.scopes.declare(module.name, module.shader);
        }

        self.scopes.push(ScopeKind::Module);
        // Own members first so they win over inherited ones of the same name.
        let (local, table) = (&self.module.local, &self.module.virtual_table);
        for &decl in table.typedefs().iter().chain(table.structs()) {
            self.scopes.declare(self.ast.decl(decl).name(), decl);
        }
        let members = local
            .variables()
            .chain(local.methods())
            .chain(table.variables())
            .chain(table.methods());
        for (name, decl) in members {
            self.scopes.declare(name, decl);
        }
        for ancestor in self.ancestors() {
            self.scopes.declare(ancestor.name, ancestor.shader);
        }

        tracing::debug!(
            module = self.ast.name(self.module.name),
            depth = self.scopes.depth(),
            "scopes seeded"
        );
    }

    pub(super) fn ancestors(&self) -> impl Iterator<Item = &'a MixinModule> + use<'a> {
        let group = self.group;
        let module = self.module;
        module
            .inheritance
            .iter()
            .filter_map(move |id| group.get(*id))
    }

    /// The analyzed shader or one of its ancestors.
    pub(super) fn is_in_hierarchy(&self, shader: DeclId) -> bool {
        shader == self.module.shader || self.ancestors().any(|m| m.shader == shader)
    }

    pub(super) fn with_scope<T>(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(kind);
        let result = f(self);
        self.scopes.pop();
        result
    }

    pub(super) fn report_named(&mut self, kind: DiagnosticKind, range: TextRange, name: Symbol) {
        let name = self.ast.name(name).to_string();
        self.diag.report(kind, range).message(name).emit();
    }

    fn visit_shader_class(&mut self, shader: DeclId) {
        let Some(class) = self.ast.shader(shader) else {
            return;
        };
        let members = class.members.clone();
        let mut bases = class.base_classes.clone();

        for base in &mut bases {
            if base.declaration.is_none() {
                base.declaration = self
                    .ancestors()
                    .find(|m| m.name == base.name)
                    .map(|m| m.shader);
            }
            match base.declaration {
                Some(declaration) => {
                    self.record.navigable.insert(NavigableNode {
                        span: base.span,
                        declaration,
                    });
                }
                None => tracing::warn!(
                    base = self.ast.name(base.name),
                    "base class missing from inheritance list"
                ),
            }
        }
        if let Decl::Shader(class) = self.ast.decl_mut(shader) {
            class.base_classes = bases;
        }

        for member in members {
            self.visit_member_decl(member);
        }
    }

    fn visit_member_decl(&mut self, id: DeclId) {
        let ctx = VisitCtx::member(self.module.shader);
        match self.ast.decl(id) {
            Decl::Variable(_) => self.visit_variable(id, VarRole::Member, ctx),
            Decl::Method(_) => self.visit_method(id),
            Decl::Typedef(_) => self.visit_typedef(id, ctx),
            Decl::Struct(_) => self.visit_struct(id),
            Decl::Interface(i) => {
                let (span, name) = (i.span, i.name);
                self.report_named(DiagnosticKind::InterfaceFound, span, name);
            }
            Decl::Technique(t) => {
                let (span, name) = (t.span, t.name);
                self.report_named(DiagnosticKind::TechniqueFound, span, name);
            }
            Decl::Shader(_) => {}
        }
    }

    pub(super) fn visit_variable(&mut self, id: DeclId, role: VarRole, ctx: VisitCtx) {
        let Some(var) = self.ast.variable_mut(id) else {
            return;
        };
        let name = var.name;
        let span = var.span;
        let qualifiers = var.qualifiers;
        let owner = var.owner;
        let mut ty = std::mem::replace(&mut var.ty, TypeRef::Void);
        let mut init = var.initial_value.take();

        self.resolve_type(&mut ty);

        if let Some(expr) = &mut init {
            let init_ctx = VisitCtx {
                parent: Parent::Decl(id),
                in_sampler: ctx.in_sampler || ty.is_sampler(),
                ..ctx.reading()
            };
            self.visit_expr(expr, init_ctx);
        }

        if role == VarRole::Member {
            self.check_composition_member(id, name, span, qualifiers, &ty, init.as_ref());
        }

        if ty == TypeRef::Var && role != VarRole::ForEachBinding {
            match init.as_ref().map(|e| e.inference.target_type.as_ref()) {
                None => self.report_named(DiagnosticKind::VarWithoutInitializer, span, name),
                Some(None) => self.report_named(DiagnosticKind::VarTypeNotInferred, span, name),
                Some(Some(inferred)) => ty = inferred.resolve(self.ast).to_non_generic(),
            }
        }

        if owner.is_some() {
            self.record.pools.get_mut(Classification::Class).register_variable(id);
        }

        if role == VarRole::Local && ty.shader_class(self.ast).is_some() {
            self.report_named(DiagnosticKind::ShaderVariableInMethod, span, name);
        }

        if let Some(var) = self.ast.variable_mut(id) {
            var.ty = ty;
            var.initial_value = init;
        }
    }

    fn check_composition_member(
        &mut self,
        id: DeclId,
        name: Symbol,
        span: TextRange,
        qualifiers: Qualifiers,
        ty: &TypeRef,
        init: Option<&Expr>,
    ) {
        let is_extern = qualifiers.contains(Qualifiers::EXTERN);
        let is_class = matches!(ty.resolve(self.ast), TypeRef::Shader(_));

        if init.and_then(|e| e.keyword()) == Some(Keyword::Stage) {
            if is_extern && is_class {
                self.record.stage_initialized.insert(id);
            } else {
                self.report_named(DiagnosticKind::StageInitNotClassType, span, name);
            }
        }

        if is_extern {
            if ty.shader_class(self.ast).is_none() {
                self.report_named(DiagnosticKind::ExternNotClassType, span, name);
            }
        } else if is_class {
            self.report_named(DiagnosticKind::MissingExtern, span, name);
        }
    }

    fn visit_method(&mut self, id: DeclId) {
        let Some(method) = self.ast.method_mut(id) else {
            return;
        };
        let name = method.name;
        let span = method.span;
        let qualifiers = method.qualifiers;
        let parameters = method.parameters.clone();
        let mut return_type = std::mem::replace(&mut method.return_type, TypeRef::Void);
        let mut body = method.body.take();

        if body.is_none() {
            if !qualifiers.contains(Qualifiers::ABSTRACT) {
                self.report_named(DiagnosticKind::MissingAbstract, span, name);
            }
            if qualifiers.contains(Qualifiers::OVERRIDE) {
                self.report_named(DiagnosticKind::UnnecessaryOverride, span, name);
            }
        } else if qualifiers.contains(Qualifiers::ABSTRACT) {
            self.report_named(DiagnosticKind::UnnecessaryAbstract, span, name);
        }

        self.record
            .pools
            .get_mut(Classification::Class)
            .register_method(id);

        self.resolve_type(&mut return_type);
        if return_type.shader_class(self.ast).is_some() {
            self.report_named(DiagnosticKind::ShaderClassReturnType, span, name);
        }

        let ctx = VisitCtx {
            method: Some(id),
            ..VisitCtx::member(id)
        };
        self.with_scope(ScopeKind::Method, |this| {
            for &param in &parameters {
                this.visit_variable(param, VarRole::Parameter, ctx);
                this.check_parameter(param);
                let param_name = this.ast.decl(param).name();
                this.scopes.declare(param_name, param);
            }
            if let Some(body) = &mut body {
                for stmt in body {
                    this.visit_stmt(stmt, ctx);
                }
            }
        });

        if let Some(method) = self.ast.method_mut(id) {
            method.return_type = return_type;
            method.body = body;
        }
    }

    fn check_parameter(&mut self, param: DeclId) {
        let Some(var) = self.ast.variable(param) else {
            return;
        };
        if var.ty.shader_class(self.ast).is_some() {
            let (span, name) = (var.span, var.name);
            self.report_named(DiagnosticKind::ShaderClassParameter, span, name);
        }
    }

    fn visit_typedef(&mut self, id: DeclId, ctx: VisitCtx) {
        let Decl::Typedef(typedef) = self.ast.decl_mut(id) else {
            return;
        };
        let (name, span) = (typedef.name, typedef.span);
        let mut ty = std::mem::replace(&mut typedef.ty, TypeRef::Void);

        self.resolve_type(&mut ty);
        if let Decl::Typedef(typedef) = self.ast.decl_mut(id) {
            typedef.ty = ty;
        }

        if ctx.method.is_some() {
            self.report_named(DiagnosticKind::TypedefInMethod, span, name);
        }
        self.record.typedefs.insert(id);
    }

    fn visit_struct(&mut self, id: DeclId) {
        let Decl::Struct(decl) = self.ast.decl(id) else {
            return;
        };
        let fields = decl.fields.clone();
        let owner = decl.owner;

        let ctx = VisitCtx::member(id);
        for field in fields {
            self.visit_variable(field, VarRole::Field, ctx);
        }
        if owner.is_some() {
            self.record.structs.insert(id);
        }
    }

    /// Fill in declarations of the type names inside `ty`.
    pub(super) fn resolve_type(&mut self, ty: &mut TypeRef) {
        match ty {
            TypeRef::Name(type_name) => {
                if type_name.declaration.is_none() {
                    let ast = &*self.ast;
                    type_name.declaration =
                        self.scopes.find(type_name.name, |d| ast.decl(d).is_type());
                    if type_name.declaration.is_none() {
                        self.report_named(
                            DiagnosticKind::UndefinedType,
                            type_name.span,
                            type_name.name,
                        );
                    }
                }
                if let Some(declaration) = type_name.declaration {
                    self.record.navigable.insert(NavigableNode {
                        span: type_name.span,
                        declaration,
                    });
                }
            }
            TypeRef::Array(element, _) => self.resolve_type(element),
            TypeRef::Generic(_, arguments) => {
                for argument in arguments {
                    self.resolve_type(argument);
                    if let TypeRef::Shader(shader) = argument.resolve(self.ast) {
                        let span = match argument {
                            TypeRef::Name(type_name) => type_name.span,
                            _ => TextRange::default(),
                        };
                        let name = self.ast.decl(shader).name();
                        self.report_named(DiagnosticKind::MixinAsGeneric, span, name);
                    }
                }
            }
            _ => {}
        }
    }

    pub(super) fn visit_stmt(&mut self, stmt: &mut Stmt, ctx: VisitCtx) {
        if matches!(stmt.kind, StmtKind::ForEach(_)) {
            self.visit_foreach(stmt, ctx);
            return;
        }

        let here = ctx.statement(stmt.id);
        match &mut stmt.kind {
            StmtKind::Expr(expr) => self.visit_expr(expr, here),
            StmtKind::Declare(decls) => {
                for &decl in decls.iter() {
                    self.visit_local_decl(decl, here);
                }
            }
            StmtKind::Block(stmts) => self.with_scope(ScopeKind::Block, |this| {
                for stmt in stmts {
                    this.visit_stmt(stmt, here);
                }
            }),
            StmtKind::List(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt, here);
                }
            }
            StmtKind::If(node) => {
                self.visit_expr(&mut node.condition, here);
                self.visit_stmt(&mut node.then, here);
                if let Some(otherwise) = &mut node.otherwise {
                    self.visit_stmt(otherwise, here);
                }
            }
            StmtKind::For(node) => self.with_scope(ScopeKind::Block, |this| {
                if let Some(init) = &mut node.init {
                    this.visit_stmt(init, here);
                }
                if let Some(condition) = &mut node.condition {
                    this.visit_expr(condition, here);
                }
                if let Some(step) = &mut node.step {
                    this.visit_expr(step, here);
                }
                this.visit_stmt(&mut node.body, here);
            }),
            StmtKind::While(node) => {
                self.visit_expr(&mut node.condition, here);
                self.visit_stmt(&mut node.body, here);
            }
            StmtKind::Return(Some(value)) => self.visit_expr(value, here),
            StmtKind::ForEach(_)
            | StmtKind::Return(None)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Discard => {}
        }
    }

    fn visit_local_decl(&mut self, decl: DeclId, ctx: VisitCtx) {
        match self.ast.decl(decl) {
            Decl::Variable(_) => self.visit_variable(decl, VarRole::Local, ctx),
            Decl::Typedef(_) => self.visit_typedef(decl, ctx),
            _ => return,
        }
        let name = self.ast.decl(decl).name();
        self.scopes.declare(name, decl);
    }
}
