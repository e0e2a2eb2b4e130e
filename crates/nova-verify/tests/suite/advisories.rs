use nova_types::{MethodDef, Severity, Span, Type, TypeEnv};
use nova_verify::{Anchor, ComplianceLevel, DiagnosticKind, Relation, ReportLevel, VerifyConfig};
use pretty_assertions::assert_eq;

use super::fixture::{abstract_method, kinds, method, void, Fixture};

fn annotation_config() -> VerifyConfig {
    VerifyConfig {
        report_missing_override_annotation: ReportLevel::Warning,
        ..VerifyConfig::default()
    }
}

#[test]
fn missing_override_annotation_is_gated_by_config() {
    let mut fx = Fixture::new();
    let x = fx.class("X").method(void("foo", vec![])).build();
    let plain = fx
        .class("Plain")
        .extends(Type::class(x, vec![]))
        .method(void("foo", vec![]))
        .build();
    let annotated = fx
        .class("Annotated")
        .extends(Type::class(x, vec![]))
        .method(MethodDef {
            has_override_annotation: true,
            ..void("foo", vec![])
        })
        .build();

    assert!(fx.verify(plain).diagnostics.is_empty());

    let config = annotation_config();
    let verification = fx.verify_with(plain, &config);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::MissingOverrideAnnotation]);
    assert_eq!(verification.diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        fx.messages(&verification, &config),
        vec!["The method foo() of type Plain should be tagged with @Override since it actually overrides a superclass method"
            .to_string()]
    );

    assert!(fx.verify_with(annotated, &config).diagnostics.is_empty());

    let error = VerifyConfig {
        report_missing_override_annotation: ReportLevel::Error,
        ..VerifyConfig::default()
    };
    assert_eq!(
        fx.verify_with(plain, &error).diagnostics[0].severity,
        Severity::Error
    );
}

#[test]
fn missing_override_annotation_names_superinterfaces() {
    let mut fx = Fixture::new();
    let task = fx
        .interface("Task")
        .method(abstract_method("run", vec![], Type::Void))
        .build();
    let job = fx
        .class("Job")
        .implements(Type::class(task, vec![]))
        .method(void("run", vec![]))
        .build();

    let config = annotation_config();
    let verification = fx.verify_with(job, &config);
    assert_eq!(
        fx.messages(&verification, &config),
        vec!["The method run() of type Job should be tagged with @Override since it actually overrides a superinterface method"
            .to_string()]
    );
}

#[test]
fn structural_error_suppresses_advisories_on_the_same_pair() {
    let mut fx = Fixture::new();
    let x = fx
        .class("X")
        .method(MethodDef {
            is_final: true,
            ..void("foo", vec![])
        })
        .build();
    let y = fx
        .class("Y")
        .extends(Type::class(x, vec![]))
        .method(void("foo", vec![]))
        .build();

    let config = VerifyConfig::with_all_advisories(ReportLevel::Warning);
    let verification = fx.verify_with(y, &config);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::CannotOverrideFinal]);
}

#[test]
fn overriding_without_super_call() {
    let mut fx = Fixture::new();
    let x = fx.class("X").method(void("foo", vec![])).build();
    let silent = fx
        .class("Silent")
        .extends(Type::class(x, vec![]))
        .method(void("foo", vec![]))
        .build();
    let delegating = fx
        .class("Delegating")
        .extends(Type::class(x, vec![]))
        .method(MethodDef {
            calls_super: true,
            ..void("foo", vec![])
        })
        .build();
    let task = fx
        .interface("Task")
        .method(abstract_method("run", vec![], Type::Void))
        .build();
    let job = fx
        .class("Job")
        .implements(Type::class(task, vec![]))
        .method(void("run", vec![]))
        .build();

    let config = VerifyConfig {
        report_overriding_without_super_call: ReportLevel::Warning,
        ..VerifyConfig::default()
    };
    let verification = fx.verify_with(silent, &config);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::OverridingWithoutSuperCall]);
    assert_eq!(
        fx.messages(&verification, &config),
        vec!["The method Silent.foo() is overriding a method without making a super invocation"
            .to_string()]
    );
    assert!(fx.verify_with(delegating, &config).diagnostics.is_empty());
    assert!(fx.verify_with(job, &config).diagnostics.is_empty());
}

#[test]
fn overriding_a_synchronized_method() {
    let mut fx = Fixture::new();
    let x = fx
        .class("X")
        .method(MethodDef {
            is_synchronized: true,
            ..void("foo", vec![])
        })
        .build();
    let y = fx
        .class("Y")
        .extends(Type::class(x, vec![]))
        .method(void("foo", vec![]))
        .build();
    let z = fx
        .class("Z")
        .extends(Type::class(x, vec![]))
        .method(MethodDef {
            is_synchronized: true,
            ..void("foo", vec![])
        })
        .build();

    let config = VerifyConfig {
        report_missing_synchronized_on_override: ReportLevel::Warning,
        ..VerifyConfig::default()
    };
    assert_eq!(
        kinds(&fx.verify_with(y, &config)),
        vec![DiagnosticKind::MissingSynchronizedOnOverride]
    );
    assert!(fx.verify_with(z, &config).diagnostics.is_empty());
}

#[test]
fn equals_without_hash_code() {
    let mut fx = Fixture::new();
    let object = fx.object();
    let partial = fx
        .class("Partial")
        .method(method("equals", vec![object.clone()], Type::boolean()))
        .build();
    let complete = fx
        .class("Complete")
        .method(method("equals", vec![object], Type::boolean()))
        .method(method("hashCode", vec![], Type::int()))
        .build();

    let config = VerifyConfig {
        report_missing_hash_code_when_equals_overridden: ReportLevel::Warning,
        ..VerifyConfig::default()
    };
    let verification = fx.verify_with(partial, &config);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::ShouldDeclareHashCode]);
    assert_eq!(
        fx.messages(&verification, &config),
        vec!["The type Partial should also implement hashCode() since it overrides Object.equals()"
            .to_string()]
    );
    assert!(fx.verify_with(complete, &config).diagnostics.is_empty());
    assert!(fx.verify(partial).diagnostics.is_empty());
}

#[test]
fn raw_parameter_types_are_reported_on_the_parameter_list() {
    let mut fx = Fixture::new();
    let raw = fx.raw_list();
    let holder = fx
        .class("Holder")
        .method(MethodDef {
            name_span: Some(Span::new(10, 14)),
            params_span: Some(Span::new(14, 22)),
            ..void("take", vec![raw])
        })
        .build();

    let verification = fx.verify(holder);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::RawTypeReference]);
    let raw_use = &verification.diagnostics[0];
    assert_eq!(raw_use.anchor, Anchor::ParameterList);
    assert_eq!(raw_use.span, Some(Span::new(14, 22)));
    assert_eq!(raw_use.severity, Severity::Warning);
    assert_eq!(
        fx.messages(&verification, &VerifyConfig::default()),
        vec!["List is a raw type. References to generic type List<E> should be parameterized"
            .to_string()]
    );

    let error = VerifyConfig {
        report_raw_type_usage: ReportLevel::Error,
        ..VerifyConfig::default()
    };
    assert_eq!(
        fx.verify_with(holder, &error).diagnostics[0].severity,
        Severity::Error
    );
    let ignore = VerifyConfig {
        report_raw_type_usage: ReportLevel::Ignore,
        ..VerifyConfig::default()
    };
    assert!(fx.verify_with(holder, &ignore).diagnostics.is_empty());
}

#[test]
fn overrides_repeat_raw_signatures_without_a_report() {
    let mut fx = Fixture::new();
    let raw = fx.raw_list();
    let x = fx
        .class("X")
        .method(void("take", vec![raw.clone()]))
        .build();
    let y = fx
        .class("Y")
        .extends(Type::class(x, vec![]))
        .method(void("take", vec![raw]))
        .build();

    assert_eq!(kinds(&fx.verify(x)), vec![DiagnosticKind::RawTypeReference]);
    assert!(fx.verify(y).diagnostics.is_empty());
}

#[test]
fn raw_supertype_is_reported_on_the_type_declaration() {
    let mut fx = Fixture::new();
    let comparable = fx.store.well_known().comparable;
    let sorted = fx
        .class("Sorted")
        .abstract_()
        .name_span(0, 6)
        .implements(Type::class(comparable, vec![]))
        .build();

    let verification = fx.verify(sorted);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::RawTypeReference]);
    assert_eq!(verification.diagnostics[0].anchor, Anchor::TypeDeclaration);
    assert_eq!(verification.diagnostics[0].span, Some(Span::new(0, 6)));
}

#[test]
fn raw_return_type_override_needs_unchecked_conversion() {
    let mut fx = Fixture::new();
    let strings = fx.list_of(fx.string());
    let raw = fx.raw_list();
    let x = fx
        .class("X")
        .method(method("items", vec![], strings))
        .build();
    let y = fx
        .class("Y")
        .extends(Type::class(x, vec![]))
        .method(method("items", vec![], raw))
        .build();

    let verification = fx.verify(y);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::UncheckedReturnConversion]);
    assert!(verification.facts[0].flags.unchecked_return);
    assert_eq!(
        fx.messages(&verification, &VerifyConfig::default()),
        vec!["Type safety: The return type List for items() from the type Y needs unchecked conversion to conform to List<String> from the type X"
            .to_string()]
    );

    let quiet = VerifyConfig {
        report_unchecked_type_operation: ReportLevel::Ignore,
        ..VerifyConfig::default()
    };
    assert!(fx.verify_with(y, &quiet).diagnostics.is_empty());
}

#[test]
fn concrete_return_for_a_generic_method_needs_unchecked_conversion() {
    // interface I { <T> T get(); }  class C implements I { public String get() }
    let mut fx = Fixture::new();
    let string = fx.string();
    let t = fx.type_param("T");
    let i = fx
        .interface("I")
        .method(MethodDef {
            type_params: vec![t],
            ..abstract_method("get", vec![], Type::TypeVar(t))
        })
        .build();
    let c = fx
        .class("C")
        .implements(Type::class(i, vec![]))
        .method(method("get", vec![], string.clone()))
        .build();

    let verification = fx.verify(c);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::UncheckedReturnConversion]);
    assert_eq!(verification.facts[0].relation, Relation::Implements);
    assert!(verification.facts[0].flags.unchecked_return);
    assert_eq!(
        fx.messages(&verification, &VerifyConfig::default()),
        vec!["Type safety: The return type String for get() from the type C needs unchecked conversion to conform to T from the type I"
            .to_string()]
    );

    // Still incompatible when the return is outside the erasure of the bound.
    let number = Type::class(fx.store.well_known().number, vec![]);
    let n = fx.store.add_type_param("N", vec![number]);
    let counter = fx
        .interface("Counter")
        .method(MethodDef {
            type_params: vec![n],
            ..abstract_method("count", vec![], Type::TypeVar(n))
        })
        .build();
    let broken = fx
        .class("Broken")
        .implements(Type::class(counter, vec![]))
        .method(method("count", vec![], string))
        .build();
    assert_eq!(
        kinds(&fx.verify(broken)),
        vec![DiagnosticKind::IncompatibleReturnType]
    );
}

#[test]
fn varargs_must_match_between_override_and_overridden() {
    let mut fx = Fixture::new();
    let strings = Type::array(fx.string());
    let x = fx
        .class("X")
        .method(MethodDef {
            is_varargs: true,
            ..void("log", vec![strings.clone()])
        })
        .build();
    let y = fx
        .class("Y")
        .extends(Type::class(x, vec![]))
        .method(void("log", vec![strings]))
        .build();

    let verification = fx.verify(y);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::VarargsOverrideMismatch]);
    assert_eq!(
        fx.messages(&verification, &VerifyConfig::default()),
        vec!["Varargs methods should only override or be overridden by other varargs methods unlike Y.log(String[]) and X.log(String...)"
            .to_string()]
    );
}

#[test]
fn override_annotation_without_a_supertype_method() {
    let mut fx = Fixture::new();
    let string = fx.string();
    let lonely = fx
        .class("Lonely")
        .method(MethodDef {
            has_override_annotation: true,
            ..void("foo", vec![])
        })
        .build();
    let described = fx
        .interface("Described")
        .method(MethodDef {
            has_override_annotation: true,
            is_abstract: true,
            ..method("toString", vec![], string)
        })
        .build();

    // Structural: reported even with every advisory off.
    let quiet = VerifyConfig::with_all_advisories(ReportLevel::Ignore);
    let verification = fx.verify_with(lonely, &quiet);
    assert_eq!(kinds(&verification), vec![DiagnosticKind::MethodMustOverride]);
    assert_eq!(verification.diagnostics[0].severity, Severity::Error);

    let modern = quiet.clone().with_compliance(ComplianceLevel::Jdk1_6);
    assert_eq!(
        fx.messages(&verification, &modern),
        vec!["The method foo() of type Lonely must override or implement a supertype method"
            .to_string()]
    );
    let legacy = quiet.with_compliance(ComplianceLevel::Jdk1_5);
    assert_eq!(
        fx.messages(&verification, &legacy),
        vec!["The method foo() of type Lonely must override a superclass method".to_string()]
    );

    // Interfaces implicitly declare the public members of Object.
    assert!(fx.verify(described).diagnostics.is_empty());
}
