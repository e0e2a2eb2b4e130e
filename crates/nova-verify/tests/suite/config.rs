use nova_verify::{
    json_schema, ComplianceLevel, ConfigError, DiagnosticKind, ReportLevel, VerifyConfig,
};
use pretty_assertions::assert_eq;

#[test]
fn defaults_report_type_safety_advisories_only() {
    let config = VerifyConfig::default();
    assert_eq!(config.source_compliance_level, ComplianceLevel::Jdk1_8);
    assert_eq!(
        config.level_for(DiagnosticKind::RawTypeReference),
        Some(ReportLevel::Warning)
    );
    assert_eq!(
        config.level_for(DiagnosticKind::UncheckedReturnConversion),
        Some(ReportLevel::Warning)
    );
    assert_eq!(
        config.level_for(DiagnosticKind::MissingOverrideAnnotation),
        Some(ReportLevel::Ignore)
    );
    assert_eq!(config.level_for(DiagnosticKind::NameClash), None);
    assert_eq!(config.level_for(DiagnosticKind::MethodMustOverride), None);
}

#[test]
fn toml_accepts_snake_case_and_eclipse_style_keys() {
    let text = r#"
source_compliance_level = "1.7"
report_raw_type_usage = "error"
reportMissingOverrideAnnotation = "warning"
reportOverridingWithoutSuperCall = "warn"
"#;
    let (config, unknown) = VerifyConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(unknown, Vec::<String>::new());
    assert_eq!(
        config,
        VerifyConfig {
            source_compliance_level: ComplianceLevel::Jdk1_7,
            report_raw_type_usage: ReportLevel::Error,
            report_missing_override_annotation: ReportLevel::Warning,
            report_overriding_without_super_call: ReportLevel::Warning,
            ..VerifyConfig::default()
        }
    );
}

#[test]
fn unknown_keys_are_collected_not_rejected() {
    let text = r#"
report_raw_type_usage = "ignore"
reportEverything = "error"
"#;
    let (config, unknown) = VerifyConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(unknown, vec!["reportEverything".to_string()]);
    assert_eq!(config.report_raw_type_usage, ReportLevel::Ignore);
}

#[test]
fn invalid_level_is_a_parse_error() {
    let err = VerifyConfig::load_from_str_with_diagnostics(r#"report_raw_type_usage = "loud""#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}

#[test]
fn load_from_path_reads_toml_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verify.toml");
    std::fs::write(
        &path,
        "source_compliance_level = \"1.5\"\nreport_missing_hash_code_when_equals_overridden = \"error\"\n",
    )
    .unwrap();

    let config = VerifyConfig::load_from_path(&path).unwrap();
    assert_eq!(config.source_compliance_level, ComplianceLevel::Jdk1_5);
    assert_eq!(
        config.level_for(DiagnosticKind::ShouldDeclareHashCode),
        Some(ReportLevel::Error)
    );

    let missing = VerifyConfig::load_from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }), "{missing:?}");
}

#[test]
fn every_advisory_can_be_set_at_once() {
    let config = VerifyConfig::with_all_advisories(ReportLevel::Error);
    for kind in [
        DiagnosticKind::UncheckedReturnConversion,
        DiagnosticKind::RawTypeReference,
        DiagnosticKind::VarargsOverrideMismatch,
        DiagnosticKind::MissingOverrideAnnotation,
        DiagnosticKind::OverridingWithoutSuperCall,
        DiagnosticKind::MissingSynchronizedOnOverride,
        DiagnosticKind::ShouldDeclareHashCode,
        DiagnosticKind::SyntheticAccessEmulation,
    ] {
        assert!(!kind.is_fatal(), "{kind:?}");
        assert_eq!(config.level_for(kind), Some(ReportLevel::Error), "{kind:?}");
    }
}

#[test]
fn json_schema_lists_every_option() {
    let schema = serde_json::to_value(json_schema()).unwrap();
    let properties = schema
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("schema has properties");

    for key in [
        "source_compliance_level",
        "report_raw_type_usage",
        "report_missing_override_annotation",
        "report_synthetic_access_emulation",
        "report_overriding_without_super_call",
        "report_missing_synchronized_on_override",
        "report_missing_hash_code_when_equals_overridden",
        "report_unchecked_type_operation",
        "report_varargs_override_mismatch",
    ] {
        assert!(properties.contains_key(key), "missing {key}");
    }
}
