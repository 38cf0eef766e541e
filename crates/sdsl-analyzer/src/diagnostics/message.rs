use rowan::TextRange;

/// Diagnostic kinds ordered by priority (highest priority first).
///
/// When two diagnostics share a span, the higher-priority one suppresses the
/// lower-priority one in filtered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Resolution failures, usually the root of everything else at that spot
    UndefinedVariable,
    UndefinedType,
    UndefinedStream,
    ExternMemberNotFound,
    VariableNameAmbiguity,
    MethodNameAmbiguity,

    // Dispatch
    ImpossibleBaseCall,
    ImpossibleVirtualCall,
    CyclicMethod,
    NonStaticReferenceInStaticMethod,
    NonStaticCallInStaticMethod,

    // Stream scope discipline
    MissingStreamsStruct,
    ExtraStreamsPrefix,
    ReadOnlyStreamWrite,
    StageOutsideVariable,

    // Composition typing
    StageInitNotClassType,
    ExternNotClassType,
    MissingExtern,
    ShaderVariableInMethod,
    ShaderClassParameter,
    ShaderClassReturnType,
    MixinAsGeneric,
    IndexerNotLiteral,

    // Declaration form
    MissingAbstract,
    UnnecessaryOverride,
    UnnecessaryAbstract,
    TypedefInMethod,

    // Structural
    NestedAssignment,
    VarWithoutInitializer,
    InterfaceFound,
    TechniqueFound,
    MultiDimForEach,
    UnsizedForEach,

    // Often consequences of an unresolved name
    MissingMethod,
    NoMatchingOverload,
    VarTypeNotInferred,
    UnresolvedMemberType,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnresolvedMemberType => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind suppresses `other` when spans overlap.
    ///
    /// Lower discriminant means higher priority.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// A name that did not resolve; anything else reported inside its span is noise.
    pub fn is_root_cause_error(&self) -> bool {
        matches!(
            self,
            Self::UndefinedVariable
                | Self::UndefinedType
                | Self::UndefinedStream
                | Self::ExternMemberNotFound
        )
    }

    pub fn is_consequence_error(&self) -> bool {
        matches!(
            self,
            Self::MissingMethod
                | Self::NoMatchingOverload
                | Self::VarTypeNotInferred
                | Self::UnresolvedMemberType
        )
    }

    pub fn default_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingStreamsStruct => Some("write `streams.<name>`"),
            Self::ExtraStreamsPrefix => Some("remove the `streams.` prefix"),
            Self::MissingAbstract => Some("add `abstract` or give the method a body"),
            Self::VariableNameAmbiguity | Self::MethodNameAmbiguity => {
                Some("redeclare or override the member in this mixin to pick one")
            }
            Self::StageOutsideVariable => Some("use `stage` only as `extern T x = stage;`"),
            _ => None,
        }
    }

    /// Base message for this kind, used when no detail is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            // Resolution
            Self::UndefinedVariable => "undefined variable",
            Self::UndefinedType => "undefined type",
            Self::UndefinedStream => "undefined stream",
            Self::ExternMemberNotFound => "member not found in composition",
            Self::VariableNameAmbiguity => "ambiguous variable name",
            Self::MethodNameAmbiguity => "ambiguous method",

            // Dispatch
            Self::ImpossibleBaseCall => "no base method to call",
            Self::ImpossibleVirtualCall => "no virtual method to call",
            Self::CyclicMethod => "recursive method call",
            Self::NonStaticReferenceInStaticMethod => {
                "instance variable referenced from static method"
            }
            Self::NonStaticCallInStaticMethod => "instance method called from static method",

            // Streams
            Self::MissingStreamsStruct => "stream variable used without `streams`",
            Self::ExtraStreamsPrefix => "`streams` prefix on a non-stream variable",
            Self::ReadOnlyStreamWrite => "write through a read-only stream",
            Self::StageOutsideVariable => "`stage` outside a composition initializer",

            // Composition typing
            Self::StageInitNotClassType => "`stage` initializer requires an extern shader class",
            Self::ExternNotClassType => "extern variable must have a shader class type",
            Self::MissingExtern => "shader class variable is missing `extern`",
            Self::ShaderVariableInMethod => "shader class variable inside method body",
            Self::ShaderClassParameter => "shader class used as parameter type",
            Self::ShaderClassReturnType => "shader class used as return type",
            Self::MixinAsGeneric => "shader class used as generic argument",
            Self::IndexerNotLiteral => "composition array indexed with a non-literal",

            // Declarations
            Self::MissingAbstract => "method declaration must be abstract",
            Self::UnnecessaryOverride => "abstract declaration cannot override",
            Self::UnnecessaryAbstract => "method with a body cannot be abstract",
            Self::TypedefInMethod => "typedef inside method body",

            // Structural
            Self::NestedAssignment => "nested assignment",
            Self::VarWithoutInitializer => "`var` declaration without initializer",
            Self::InterfaceFound => "interfaces are not supported",
            Self::TechniqueFound => "techniques are not supported",
            Self::MultiDimForEach => "foreach expansion over multi-dimensional array",
            Self::UnsizedForEach => "foreach expansion over unsized array",

            // Consequences
            Self::MissingMethod => "no matching method",
            Self::NoMatchingOverload => "no matching overload",
            Self::VarTypeNotInferred => "cannot infer `var` type",
            Self::UnresolvedMemberType => "cannot infer member type",
        }
    }

    /// Template for custom messages. Contains a `{}` placeholder for the detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UndefinedVariable => "`{}` is not defined".to_string(),
            Self::UndefinedType => "type `{}` is not defined".to_string(),
            Self::UndefinedStream => "stream `{}` is not defined".to_string(),
            Self::ExternMemberNotFound => "composition has no member `{}`".to_string(),
            Self::VariableNameAmbiguity => {
                "`{}` is declared by several mixins in the hierarchy".to_string()
            }
            Self::MethodNameAmbiguity => {
                "method `{}` is declared by several mixins in the hierarchy".to_string()
            }
            Self::ImpossibleBaseCall => {
                "no base implementation of `{}` in the inheritance chain".to_string()
            }
            Self::ImpossibleVirtualCall => "no method `{}` in the virtual table".to_string(),
            Self::CyclicMethod => "method `{}` calls itself".to_string(),
            Self::NonStaticReferenceInStaticMethod => {
                "static method cannot reference instance variable `{}`".to_string()
            }
            Self::NonStaticCallInStaticMethod => {
                "static method cannot call instance method `{}`".to_string()
            }
            Self::MissingStreamsStruct => {
                "stream variable `{}` must be accessed through `streams`".to_string()
            }
            Self::ExtraStreamsPrefix => "`{}` is not a stream variable".to_string(),
            Self::ReadOnlyStreamWrite => {
                "cannot write `{}` through a read-only stream".to_string()
            }
            Self::StageInitNotClassType => {
                "`{}` must be an extern shader class to be initialized with `stage`".to_string()
            }
            Self::ExternNotClassType => {
                "extern variable `{}` must have a shader class type".to_string()
            }
            Self::MissingExtern => {
                "variable `{}` has a shader class type but is not extern".to_string()
            }
            Self::ShaderVariableInMethod => {
                "variable `{}` cannot have a shader class type inside a method".to_string()
            }
            Self::ShaderClassParameter => {
                "parameter `{}` cannot have a shader class type".to_string()
            }
            Self::ShaderClassReturnType => "method `{}` cannot return a shader class".to_string(),
            Self::MixinAsGeneric => "shader class `{}` cannot be a generic argument".to_string(),
            Self::MissingAbstract => {
                "method `{}` has no body and must be declared `abstract`".to_string()
            }
            Self::UnnecessaryOverride => {
                "abstract method `{}` cannot be marked `override`".to_string()
            }
            Self::UnnecessaryAbstract => {
                "method `{}` has a body and cannot be `abstract`".to_string()
            }
            Self::TypedefInMethod => "typedef `{}` cannot be declared inside a method".to_string(),
            Self::VarWithoutInitializer => "`var` variable `{}` needs an initial value".to_string(),
            Self::InterfaceFound => "interface `{}` is not supported".to_string(),
            Self::TechniqueFound => "technique `{}` is not supported".to_string(),
            Self::MultiDimForEach => {
                "cannot expand foreach over multi-dimensional array `{}`".to_string()
            }
            Self::UnsizedForEach => "cannot expand foreach over unsized array `{}`".to_string(),
            Self::MissingMethod => "no method matches the call to `{}`".to_string(),
            Self::NoMatchingOverload => "no overload of `{}` accepts these arguments".to_string(),
            Self::VarTypeNotInferred => {
                "cannot infer the type of `var` variable `{}`".to_string()
            }
            Self::UnresolvedMemberType => "cannot infer the type of member `{}`".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

/// One entry of the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub(crate) kind: DiagnosticKind,
    /// The range shown to the user.
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
    pub(crate) hints: Vec<String>,
}

impl Diagnostic {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        let hints = kind
            .default_hint()
            .map(|h| vec![h.to_string()])
            .unwrap_or_default();
        Self {
            kind,
            range,
            message: message.into(),
            related: Vec::new(),
            hints,
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}
