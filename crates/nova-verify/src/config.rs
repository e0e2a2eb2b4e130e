use std::path::Path;

use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::DiagnosticKind;

/// Source compliance level. Only affects message wording.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum ComplianceLevel {
    #[serde(rename = "1.5")]
    Jdk1_5,
    #[serde(rename = "1.6")]
    Jdk1_6,
    #[serde(rename = "1.7")]
    Jdk1_7,
    #[default]
    #[serde(rename = "1.8")]
    Jdk1_8,
}

/// Severity for an advisory check. `Ignore` drops the fact at the source.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    #[default]
    Ignore,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

/// Options consumed by the method verifier.
///
/// Keys are snake_case; the camelCase names used by Eclipse-style option files are accepted as
/// aliases.
///
/// ```toml
/// source_compliance_level = "1.7"
/// report_raw_type_usage = "error"
/// reportMissingOverrideAnnotation = "warning"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(deny_unknown_fields)]
pub struct VerifyConfig {
    #[serde(alias = "sourceComplianceLevel")]
    pub source_compliance_level: ComplianceLevel,
    /// Raw references to generic types in method signatures and supertype clauses.
    #[serde(alias = "reportRawTypeUsage")]
    pub report_raw_type_usage: ReportLevel,
    /// Overriding methods that lack `@Override`.
    #[serde(alias = "reportMissingOverrideAnnotation")]
    pub report_missing_override_annotation: ReportLevel,
    /// Synthetic visibility bridges emitted for public methods of non-public superclasses.
    #[serde(alias = "reportSyntheticAccessEmulation")]
    pub report_synthetic_access_emulation: ReportLevel,
    /// Overrides of concrete methods that never call `super.<name>(...)`.
    #[serde(alias = "reportOverridingWithoutSuperCall")]
    pub report_overriding_without_super_call: ReportLevel,
    /// Overrides of `synchronized` methods that drop the modifier.
    #[serde(alias = "reportMissingSynchronizedOnOverride")]
    pub report_missing_synchronized_on_override: ReportLevel,
    /// Types overriding `equals(Object)` without `hashCode()`.
    #[serde(alias = "reportMissingHashCodeWhenEqualsOverridden")]
    pub report_missing_hash_code_when_equals_overridden: ReportLevel,
    /// Overrides whose return type needs an unchecked conversion.
    #[serde(alias = "reportUncheckedTypeOperation")]
    pub report_unchecked_type_operation: ReportLevel,
    /// Overrides that disagree with the overridden method on variable arity.
    #[serde(alias = "reportVarargsOverrideMismatch")]
    pub report_varargs_override_mismatch: ReportLevel,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            source_compliance_level: ComplianceLevel::default(),
            report_raw_type_usage: ReportLevel::Warning,
            report_missing_override_annotation: ReportLevel::Ignore,
            report_synthetic_access_emulation: ReportLevel::Ignore,
            report_overriding_without_super_call: ReportLevel::Ignore,
            report_missing_synchronized_on_override: ReportLevel::Ignore,
            report_missing_hash_code_when_equals_overridden: ReportLevel::Ignore,
            report_unchecked_type_operation: ReportLevel::Warning,
            report_varargs_override_mismatch: ReportLevel::Warning,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read verifier config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep just the message; the default `Display` embeds a source snippet.
        ConfigError::Toml(err.message().to_string())
    }
}

impl VerifyConfig {
    /// Every advisory check at `level`, everything else default.
    pub fn with_all_advisories(level: ReportLevel) -> Self {
        Self {
            report_raw_type_usage: level,
            report_missing_override_annotation: level,
            report_synthetic_access_emulation: level,
            report_overriding_without_super_call: level,
            report_missing_synchronized_on_override: level,
            report_missing_hash_code_when_equals_overridden: level,
            report_unchecked_type_operation: level,
            report_varargs_override_mismatch: level,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_compliance(mut self, level: ComplianceLevel) -> Self {
        self.source_compliance_level = level;
        self
    }

    /// The level gating `kind`, or `None` for structural kinds, which are never gated.
    pub fn level_for(&self, kind: DiagnosticKind) -> Option<ReportLevel> {
        let level = match kind {
            DiagnosticKind::RawTypeReference => self.report_raw_type_usage,
            DiagnosticKind::MissingOverrideAnnotation => self.report_missing_override_annotation,
            DiagnosticKind::SyntheticAccessEmulation => self.report_synthetic_access_emulation,
            DiagnosticKind::OverridingWithoutSuperCall => self.report_overriding_without_super_call,
            DiagnosticKind::MissingSynchronizedOnOverride => {
                self.report_missing_synchronized_on_override
            }
            DiagnosticKind::ShouldDeclareHashCode => {
                self.report_missing_hash_code_when_equals_overridden
            }
            DiagnosticKind::UncheckedReturnConversion => self.report_unchecked_type_operation,
            DiagnosticKind::VarargsOverrideMismatch => self.report_varargs_override_mismatch,
            DiagnosticKind::NameClash
            | DiagnosticKind::DuplicateMethod
            | DiagnosticKind::MustImplementAbstractMethod
            | DiagnosticKind::IncompatibleReturnType
            | DiagnosticKind::IncompatibleInheritedReturnTypes
            | DiagnosticKind::CannotOverrideFinal
            | DiagnosticKind::CannotReduceVisibility
            | DiagnosticKind::IncompatibleThrowsClause
            | DiagnosticKind::StaticInstanceMismatch
            | DiagnosticKind::MethodMustOverride
            | DiagnosticKind::InconsistentSupertypeArguments => return None,
        };
        Some(level)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (config, unknown_keys) = Self::load_from_str_with_diagnostics(&text)?;
        for key in &unknown_keys {
            tracing::warn!(
                target: "nova.verify",
                path = %path.display(),
                key = %key,
                "unknown verifier config key"
            );
        }
        Ok(config)
    }

    /// Load a config from a TOML string and return the keys that were not recognized.
    pub fn load_from_str_with_diagnostics(text: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let (config, unknown_keys) = deserialize_toml_with_unknown_keys::<VerifyConfig>(text)?;
        Ok((config, unknown_keys))
    }
}

fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        // `serde_ignored` renders root paths with a leading `.`.
        unknown.push(path.to_string().trim_start_matches('.').to_string());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

/// JSON schema for the verifier options table.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(VerifyConfig)
}
