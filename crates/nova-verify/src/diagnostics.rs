use std::collections::HashSet;

use nova_types::{
    erase_method, format_class_decl, format_method, format_type, ClassId, ClassKind, Diagnostic,
    MethodId, Severity, Span, Type, TypeEnv,
};
use serde::Serialize;

use crate::config::{ComplianceLevel, ReportLevel, VerifyConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticKind {
    // Structural: always reported.
    NameClash,
    DuplicateMethod,
    MustImplementAbstractMethod,
    IncompatibleReturnType,
    IncompatibleInheritedReturnTypes,
    CannotOverrideFinal,
    CannotReduceVisibility,
    IncompatibleThrowsClause,
    StaticInstanceMismatch,
    MethodMustOverride,
    InconsistentSupertypeArguments,
    // Advisory: gated by `VerifyConfig`.
    UncheckedReturnConversion,
    RawTypeReference,
    VarargsOverrideMismatch,
    MissingOverrideAnnotation,
    OverridingWithoutSuperCall,
    MissingSynchronizedOnOverride,
    ShouldDeclareHashCode,
    SyntheticAccessEmulation,
}

impl DiagnosticKind {
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            DiagnosticKind::UncheckedReturnConversion
                | DiagnosticKind::RawTypeReference
                | DiagnosticKind::VarargsOverrideMismatch
                | DiagnosticKind::MissingOverrideAnnotation
                | DiagnosticKind::OverridingWithoutSuperCall
                | DiagnosticKind::MissingSynchronizedOnOverride
                | DiagnosticKind::ShouldDeclareHashCode
                | DiagnosticKind::SyntheticAccessEmulation
        )
    }

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::NameClash => "METHOD_NAME_CLASH",
            DiagnosticKind::DuplicateMethod => "METHOD_DUPLICATE",
            DiagnosticKind::MustImplementAbstractMethod => "METHOD_MUST_IMPLEMENT_ABSTRACT",
            DiagnosticKind::IncompatibleReturnType => "METHOD_INCOMPATIBLE_RETURN",
            DiagnosticKind::IncompatibleInheritedReturnTypes => {
                "METHOD_INCOMPATIBLE_INHERITED_RETURNS"
            }
            DiagnosticKind::CannotOverrideFinal => "METHOD_OVERRIDES_FINAL",
            DiagnosticKind::CannotReduceVisibility => "METHOD_REDUCES_VISIBILITY",
            DiagnosticKind::IncompatibleThrowsClause => "METHOD_INCOMPATIBLE_THROWS",
            DiagnosticKind::StaticInstanceMismatch => "METHOD_STATIC_INSTANCE_MISMATCH",
            DiagnosticKind::MethodMustOverride => "METHOD_MUST_OVERRIDE",
            DiagnosticKind::InconsistentSupertypeArguments => "TYPE_INCONSISTENT_SUPERTYPE_ARGS",
            DiagnosticKind::UncheckedReturnConversion => "METHOD_UNCHECKED_RETURN",
            DiagnosticKind::RawTypeReference => "TYPE_RAW_REFERENCE",
            DiagnosticKind::VarargsOverrideMismatch => "METHOD_VARARGS_OVERRIDE",
            DiagnosticKind::MissingOverrideAnnotation => "METHOD_MISSING_OVERRIDE_ANNOTATION",
            DiagnosticKind::OverridingWithoutSuperCall => "METHOD_OVERRIDE_WITHOUT_SUPER",
            DiagnosticKind::MissingSynchronizedOnOverride => "METHOD_MISSING_SYNCHRONIZED",
            DiagnosticKind::ShouldDeclareHashCode => "TYPE_MISSING_HASHCODE",
            DiagnosticKind::SyntheticAccessEmulation => "TYPE_SYNTHETIC_ACCESS",
        }
    }
}

/// Which source range a diagnostic underlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Anchor {
    MethodName,
    ParameterList,
    TypeDeclaration,
}

/// Kind-specific facts carried alongside the offending methods.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Detail {
    None,
    /// Both methods were inherited; the clash is blamed on the type that combines them.
    Inherited,
    /// Both methods are declared by the verified type.
    SameType,
    /// A static method with the same erasure as, but no subsignature of, a supertype method.
    StaticHiding,
    StaticHidesInstance,
    InstanceOverridesStatic,
    UncoveredException(Type),
    Instantiations(Type, Type),
    RawType(ClassId),
}

/// One fact produced by the verifier, before rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// The type the diagnostic is reported against.
    pub class: ClassId,
    /// The offending method (declared by `class`, or inherited into it).
    pub method: Option<MethodId>,
    /// The supertype (or sibling) method the offending one was compared with.
    pub other: Option<MethodId>,
    pub anchor: Anchor,
    pub span: Option<Span>,
    pub detail: Detail,
}

/// Per-type collector enforcing the reporting policy: advisories below `ignore` never enter, a
/// method pair gets at most one structural diagnostic, and a structural diagnostic on a pair
/// suppresses advisories on that pair.
pub struct DiagnosticSink<'a> {
    env: &'a dyn TypeEnv,
    config: &'a VerifyConfig,
    class: ClassId,
    diagnostics: Vec<VerifyDiagnostic>,
    fatal_pairs: HashSet<(MethodId, MethodId)>,
}

fn pair_key(a: MethodId, b: MethodId) -> (MethodId, MethodId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<'a> DiagnosticSink<'a> {
    pub fn new(env: &'a dyn TypeEnv, config: &'a VerifyConfig, class: ClassId) -> Self {
        Self {
            env,
            config,
            class,
            diagnostics: Vec::new(),
            fatal_pairs: HashSet::new(),
        }
    }

    pub fn config(&self) -> &VerifyConfig {
        self.config
    }

    /// Record a diagnostic. Returns `false` if policy dropped it.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        method: Option<MethodId>,
        other: Option<MethodId>,
        anchor: Anchor,
        detail: Detail,
    ) -> bool {
        let severity = match self.config.level_for(kind) {
            None => Severity::Error,
            Some(ReportLevel::Ignore) => return false,
            Some(ReportLevel::Warning) => Severity::Warning,
            Some(ReportLevel::Error) => Severity::Error,
        };

        if let (Some(a), Some(b)) = (method, other) {
            let key = pair_key(a, b);
            if self.fatal_pairs.contains(&key) {
                return false;
            }
            if kind.is_fatal() {
                self.fatal_pairs.insert(key);
                self.diagnostics.retain(|d| match (d.method, d.other) {
                    (Some(x), Some(y)) => d.kind.is_fatal() || pair_key(x, y) != key,
                    _ => true,
                });
            } else if self.diagnostics.iter().any(|d| {
                d.kind == kind
                    && matches!((d.method, d.other), (Some(x), Some(y)) if pair_key(x, y) == key)
            }) {
                return false;
            }
        } else if self.diagnostics.iter().any(|d| {
            d.kind == kind && d.method == method && d.other == other && d.detail == detail
        }) {
            return false;
        }

        let span = self.span_for(anchor, method);
        tracing::trace!(
            target: "nova.verify",
            kind = ?kind,
            ?method,
            ?other,
            "diagnostic"
        );
        self.diagnostics.push(VerifyDiagnostic {
            kind,
            severity,
            class: self.class,
            method,
            other,
            anchor,
            span,
            detail,
        });
        true
    }

    pub fn has_fatal(&self, a: MethodId, b: MethodId) -> bool {
        self.fatal_pairs.contains(&pair_key(a, b))
    }

    pub fn finish(self) -> Vec<VerifyDiagnostic> {
        self.diagnostics
    }

    fn span_for(&self, anchor: Anchor, method: Option<MethodId>) -> Option<Span> {
        let method = method.and_then(|id| self.env.method(id));
        match anchor {
            Anchor::MethodName => method.and_then(|m| m.name_span),
            Anchor::ParameterList => method.and_then(|m| m.params_span.or(m.name_span)),
            Anchor::TypeDeclaration => self.env.class(self.class).and_then(|c| c.name_span),
        }
    }
}

impl VerifyDiagnostic {
    /// Render into a user-facing [`Diagnostic`]. Wording follows ECJ and depends on the
    /// configured compliance level.
    pub fn render(&self, env: &dyn TypeEnv, config: &VerifyConfig) -> Diagnostic {
        let message = self.message(env, config.source_compliance_level);
        match self.severity {
            Severity::Error => Diagnostic::error(self.kind.code(), message, self.span),
            _ => Diagnostic::warning(self.kind.code(), message, self.span),
        }
    }

    fn message(&self, env: &dyn TypeEnv, compliance: ComplianceLevel) -> String {
        let ty = format_class_decl(env, self.class);
        let m = self.method.map(|id| describe(env, id)).unwrap_or_default();
        let n = self.other.map(|id| describe(env, id)).unwrap_or_default();

        match self.kind {
            DiagnosticKind::NameClash => match &self.detail {
                Detail::SameType => format!(
                    "Method {} has the same erasure {} as another method in type {ty}",
                    m.signature,
                    self.method.map(|id| erased_signature(env, id)).unwrap_or_default(),
                ),
                Detail::StaticHiding if compliance >= ComplianceLevel::Jdk1_7 => format!(
                    "Name clash: The static method {} of type {} has the same erasure as {} of type {} but does not hide it",
                    m.signature, m.owner, n.signature, n.owner
                ),
                _ => format!(
                    "Name clash: The method {} of type {} has the same erasure as {} of type {} but does not override it",
                    m.signature, m.owner, n.signature, n.owner
                ),
            },
            DiagnosticKind::DuplicateMethod => {
                format!("Duplicate method {} in type {ty}", m.signature)
            }
            DiagnosticKind::MustImplementAbstractMethod => format!(
                "The type {ty} must implement the inherited abstract method {}.{}",
                m.owner, m.signature
            ),
            DiagnosticKind::IncompatibleReturnType => match self.detail {
                Detail::Inherited => format!(
                    "The return type is incompatible with {}.{}, {}.{}",
                    n.owner, n.signature, m.owner, m.signature
                ),
                _ => format!("The return type is incompatible with {}.{}", n.owner, n.signature),
            },
            DiagnosticKind::IncompatibleInheritedReturnTypes => format!(
                "The return types are incompatible for the inherited methods {}.{}, {}.{}",
                m.owner, m.signature, n.owner, n.signature
            ),
            DiagnosticKind::CannotOverrideFinal => {
                format!("Cannot override the final method from {}", n.owner)
            }
            DiagnosticKind::CannotReduceVisibility => match self.detail {
                Detail::Inherited => format!(
                    "The inherited method {}.{} cannot hide the public abstract method in {}",
                    m.owner, m.signature, n.owner
                ),
                _ => format!(
                    "Cannot reduce the visibility of the inherited method from {}",
                    n.owner
                ),
            },
            DiagnosticKind::IncompatibleThrowsClause => {
                let exception = match &self.detail {
                    Detail::UncoveredException(ty) => format_type(env, ty),
                    _ => String::new(),
                };
                format!(
                    "Exception {exception} is not compatible with throws clause in {}.{}",
                    n.owner, n.signature
                )
            }
            DiagnosticKind::StaticInstanceMismatch => match self.detail {
                Detail::StaticHidesInstance => format!(
                    "This static method cannot hide the instance method from {}",
                    n.owner
                ),
                Detail::Inherited => format!(
                    "The static method {} conflicts with the abstract method in {}",
                    m.signature, n.owner
                ),
                _ => format!(
                    "This instance method cannot override the static method from {}",
                    n.owner
                ),
            },
            DiagnosticKind::MethodMustOverride => {
                if compliance >= ComplianceLevel::Jdk1_6 {
                    format!(
                        "The method {} of type {ty} must override or implement a supertype method",
                        m.signature
                    )
                } else {
                    format!(
                        "The method {} of type {ty} must override a superclass method",
                        m.signature
                    )
                }
            }
            DiagnosticKind::InconsistentSupertypeArguments => {
                let (first, second) = match &self.detail {
                    Detail::Instantiations(a, b) => (format_type(env, a), format_type(env, b)),
                    _ => (String::new(), String::new()),
                };
                format!(
                    "The type {ty} cannot inherit a supertype more than once with different arguments: {first} and {second}"
                )
            }
            DiagnosticKind::UncheckedReturnConversion => {
                let (r1, r2) = match (self.method, self.other) {
                    (Some(a), Some(b)) => (return_type(env, a), return_type(env, b)),
                    _ => (String::new(), String::new()),
                };
                format!(
                    "Type safety: The return type {r1} for {} from the type {} needs unchecked conversion to conform to {r2} from the type {}",
                    m.signature, m.owner, n.owner
                )
            }
            DiagnosticKind::RawTypeReference => {
                let raw = match self.detail {
                    Detail::RawType(id) => (
                        env.class(id)
                            .map(|c| c.simple_name().to_string())
                            .unwrap_or_default(),
                        format_class_decl(env, id),
                    ),
                    _ => (String::new(), String::new()),
                };
                format!(
                    "{} is a raw type. References to generic type {} should be parameterized",
                    raw.0, raw.1
                )
            }
            DiagnosticKind::VarargsOverrideMismatch => format!(
                "Varargs methods should only override or be overridden by other varargs methods unlike {}.{} and {}.{}",
                m.owner, m.signature, n.owner, n.signature
            ),
            DiagnosticKind::MissingOverrideAnnotation => {
                let target = match self.other.and_then(|id| env.class(id.class)) {
                    Some(c) if c.kind == ClassKind::Interface => "superinterface",
                    _ => "superclass",
                };
                format!(
                    "The method {} of type {ty} should be tagged with @Override since it actually overrides a {target} method",
                    m.signature
                )
            }
            DiagnosticKind::OverridingWithoutSuperCall => format!(
                "The method {}.{} is overriding a method without making a super invocation",
                m.owner, m.signature
            ),
            DiagnosticKind::MissingSynchronizedOnOverride => format!(
                "The method {}.{} is overriding a synchronized method without being synchronized",
                m.owner, m.signature
            ),
            DiagnosticKind::ShouldDeclareHashCode => format!(
                "The type {ty} should also implement hashCode() since it overrides Object.equals()"
            ),
            DiagnosticKind::SyntheticAccessEmulation => format!(
                "Access to the method {}.{} from the non-public type {} is emulated by a synthetic bridge in {ty}",
                n.owner, n.signature, n.owner
            ),
        }
    }
}

#[derive(Default)]
struct MethodDescription {
    owner: String,
    signature: String,
}

fn describe(env: &dyn TypeEnv, id: MethodId) -> MethodDescription {
    MethodDescription {
        owner: format_class_decl(env, id.class),
        signature: env
            .method(id)
            .map(|m| format_method(env, m))
            .unwrap_or_default(),
    }
}

fn return_type(env: &dyn TypeEnv, id: MethodId) -> String {
    env.method(id)
        .map(|m| format_type(env, &m.return_type))
        .unwrap_or_default()
}

fn erased_signature(env: &dyn TypeEnv, id: MethodId) -> String {
    let Some(method) = env.method(id) else {
        return String::new();
    };
    let erasure = erase_method(env, method);
    let params: Vec<String> = erasure
        .params
        .iter()
        .map(|p| format_type(env, &p.to_type()))
        .collect();
    format!("{}({})", erasure.name, params.join(", "))
}
