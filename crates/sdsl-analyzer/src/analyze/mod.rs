//! Semantic analysis of one mixin module.
//!
//! The pass walks the module's shader class once, in declaration order:
//! - Name resolution against the scope stack (builtins, the compilation
//!   group, the flattened virtual table, then method and block scopes)
//! - Member resolution through compositions, `base`, `this` and `streams`
//! - Method dispatch: `base` and `this` calls, overload selection, static
//!   method isolation
//! - Reference classification into the four pools of [`AnalysisRecord`]
//! - Optional unrolling of `foreach` over fixed-size arrays
//!
//! Every problem is reported as a diagnostic; the walk never stops early.
//!
//! ```ignore
//! let (record, diagnostics) = AnalysisBuilder::new(&mut ast, &group, module)
//!     .expand_foreach(true)
//!     .run()?;
//! ```

mod analyzer;
mod context;
mod expressions;
mod foreach;
mod invariants;
mod invocation;
mod normalize;
mod overload;
mod pools;
mod record;
mod scope;

#[cfg(test)]
mod dispatch_tests;
#[cfg(test)]
mod expressions_tests;

use serde::{Deserialize, Serialize};

use crate::ast::{Ast, Decl};
use crate::mixin::{CompilationGroup, ModuleId};
use crate::{Error, PassResult};

use analyzer::Analyzer;

pub use pools::{Occurrence, ReferencePool, ReferencePools};
pub use record::{AnalysisRecord, ForEachOccurrence, NavigableNode};
pub use scope::{ScopeKind, ScopeStack};

/// Caller-selected analysis options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Unroll `foreach` over sized one-dimensional arrays instead of
    /// recording the statement.
    pub expand_foreach: bool,
}

/// Builder for one analysis run.
pub struct AnalysisBuilder<'a> {
    ast: &'a mut Ast,
    group: &'a CompilationGroup,
    module: ModuleId,
    config: AnalysisConfig,
}

impl<'a> AnalysisBuilder<'a> {
    pub fn new(ast: &'a mut Ast, group: &'a CompilationGroup, module: ModuleId) -> Self {
        Self {
            ast,
            group,
            module,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn expand_foreach(mut self, value: bool) -> Self {
        self.config.expand_foreach = value;
        self
    }

    /// Analyze the module, returning the record and every diagnostic found.
    ///
    /// Fails only on malformed input: a module id outside the group, a
    /// module whose shader is not a shader class, or a dangling ancestor.
    #[tracing::instrument(skip_all, fields(module = self.module.index()))]
    pub fn run(self) -> PassResult<AnalysisRecord> {
        let module = self
            .group
            .get(self.module)
            .ok_or(Error::UnknownModule(self.module))?;
        match self.ast.get(module.shader) {
            Some(Decl::Shader(_)) => {}
            _ => return Err(Error::NotAShaderClass(module.shader)),
        }
        if let Some(&ancestor) = module
            .inheritance
            .iter()
            .find(|id| self.group.get(**id).is_none())
        {
            return Err(Error::UnknownAncestor {
                module: self.module,
                ancestor,
            });
        }

        normalize::normalize_keywords(self.ast);

        let (record, diagnostics) =
            Analyzer::new(self.ast, self.group, self.module, module, self.config).run();
        tracing::debug!(
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "analysis finished"
        );
        Ok((record, diagnostics))
    }

    /// Like [`run`](Self::run), but any error diagnostic fails the call.
    pub fn run_strict(self) -> crate::Result<AnalysisRecord> {
        let (record, diagnostics) = self.run()?;
        if diagnostics.has_errors() {
            return Err(Error::AnalysisFailed(diagnostics));
        }
        Ok(record)
    }
}

/// Analyze `module` with `config`.
pub fn analyze(
    ast: &mut Ast,
    group: &CompilationGroup,
    module: ModuleId,
    config: AnalysisConfig,
) -> PassResult<AnalysisRecord> {
    AnalysisBuilder::new(ast, group, module)
        .with_config(config)
        .run()
}
