//! Semantic analysis for SDSL shader mixins.
//!
//! The linker hands over a [`CompilationGroup`] of [`MixinModule`]s whose
//! declarations live in one [`Ast`] arena. Analysis resolves every name in
//! one module's shader class, fills the inference slot of each expression,
//! classifies member references for code generation, and reports problems.
//!
//! # Example
//!
//! ```ignore
//! use sdsl_analyzer::{AnalysisConfig, analyze};
//!
//! let (record, diagnostics) = analyze(&mut ast, &group, module, AnalysisConfig::default())?;
//! eprintln!("{}", diagnostics.printer().source(source).render());
//! for (decl, occurrences) in record.pools().extern_refs().variables() {
//!     // ...
//! }
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod ast;
pub mod diagnostics;
pub mod mixin;

#[cfg(test)]
pub(crate) mod test_utils;

/// Result type for analysis passes that produce both output and diagnostics.
///
/// The pass returns its typed output alongside any diagnostics it collected.
/// Malformed input from the linker uses the outer `Result`.
pub type PassResult<T> = std::result::Result<(T, Diagnostics), Error>;

pub use analyze::{AnalysisBuilder, AnalysisConfig, AnalysisRecord, analyze};
pub use ast::{Ast, Classification, DeclId, NodeId};
pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use mixin::{CompilationGroup, MixinModule, ModuleId, VirtualTable};

/// Errors that stop an analysis run before it starts, or fail a strict run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("module {} is not part of the compilation group", .0.index())]
    UnknownModule(ModuleId),

    #[error("declaration {} is not a shader class", .0.index())]
    NotAShaderClass(DeclId),

    #[error(
        "module {} inherits from module {}, which is not part of the compilation group",
        .module.index(),
        .ancestor.index()
    )]
    UnknownAncestor { module: ModuleId, ancestor: ModuleId },

    #[error("analysis failed with {} errors", .0.error_count())]
    AnalysisFailed(Diagnostics),
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;
