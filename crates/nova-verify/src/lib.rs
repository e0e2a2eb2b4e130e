//! Method verification for resolved Java type graphs.
//!
//! For every type the verifier decides how each declared or inherited method relates to every
//! other method reachable from it: overriding, hiding, implementing, or clashing by erasure. It
//! reports the structural errors and severity-gated advisories that follow, and plans the bridge
//! methods a code generator must emit.
//!
//! The type graph is read-only, so types are verified independently and in parallel; results are
//! merged in declaration order.

use std::sync::atomic::{AtomicBool, Ordering};

use nova_types::{ClassId, Diagnostic, SupertypeTable, TypeEnv, TypeStore};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

mod bridge;
mod clash;
mod config;
mod diagnostics;
mod matcher;
mod resolver;
mod views;

pub use bridge::{BridgeKind, BridgeMethod, BridgeMethodPlanner, BridgePlan};
pub use clash::ClashDetector;
pub use config::{json_schema, ComplianceLevel, ConfigError, ReportLevel, VerifyConfig};
pub use diagnostics::{Anchor, Detail, DiagnosticKind, DiagnosticSink, VerifyDiagnostic};
pub use matcher::{ReturnCompat, SignatureMatcher};
pub use resolver::{FactFlags, OverrideFact, OverrideResolver, Relation, Resolution};
pub use views::{InheritedMethodView, MethodTable};

/// Everything the verifier learned about one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeVerification {
    pub class: ClassId,
    pub facts: Vec<OverrideFact>,
    pub diagnostics: Vec<VerifyDiagnostic>,
    pub bridges: BridgePlan,
}

impl TypeVerification {
    fn empty(class: ClassId) -> Self {
        Self {
            class,
            facts: Vec::new(),
            diagnostics: Vec::new(),
            bridges: BridgePlan {
                class,
                bridges: Vec::new(),
            },
        }
    }
}

/// Results of a whole pass, one entry per type in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyOutput {
    pub types: Vec<TypeVerification>,
}

impl VerifyOutput {
    pub fn get(&self, class: ClassId) -> Option<&TypeVerification> {
        self.types.iter().find(|ty| ty.class == class)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &VerifyDiagnostic> + '_ {
        self.types.iter().flat_map(|ty| ty.diagnostics.iter())
    }

    /// Render every diagnostic in output order.
    pub fn render(&self, env: &dyn TypeEnv, config: &VerifyConfig) -> Vec<Diagnostic> {
        self.diagnostics()
            .map(|diagnostic| diagnostic.render(env, config))
            .collect()
    }
}

/// The whole pass was abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("method verification was cancelled")]
pub struct Cancelled;

/// Verify a single type against its supertypes.
pub fn verify_type(
    env: &dyn TypeEnv,
    supertypes: &SupertypeTable,
    class: ClassId,
    config: &VerifyConfig,
) -> TypeVerification {
    let Some(class_def) = env.class(class) else {
        tracing::debug!(target: "nova.verify", ?class, "unknown class id");
        return TypeVerification::empty(class);
    };
    let _span = tracing::debug_span!(target: "nova.verify", "verify_type", class = %class_def.name)
        .entered();

    let mut sink = DiagnosticSink::new(env, config, class);
    let methods = MethodTable::collect(env, supertypes, class, class_def);

    let mut resolution =
        OverrideResolver::new(env, supertypes, class, class_def, &methods).resolve(&mut sink);
    ClashDetector::new(env, supertypes, class, &methods).detect(&mut resolution, &mut sink);
    let bridges = BridgeMethodPlanner::new(env, supertypes, class, class_def, &methods)
        .plan(&resolution, &mut sink);

    TypeVerification {
        class,
        facts: resolution.facts,
        diagnostics: sink.finish(),
        bridges,
    }
}

/// Verify every type in `store` on the rayon pool.
pub fn verify_all(store: &TypeStore, config: &VerifyConfig) -> VerifyOutput {
    let supertypes = SupertypeTable::build(store);
    let classes: Vec<ClassId> = store.class_ids().collect();
    let types: Vec<TypeVerification> = classes
        .par_iter()
        .map(|&class| verify_type(store, &supertypes, class, config))
        .collect();
    log_summary(&types);
    VerifyOutput { types }
}

/// [`verify_all`], checking `cancel` before each type. A set flag abandons the whole pass.
pub fn verify_all_with_cancellation(
    store: &TypeStore,
    config: &VerifyConfig,
    cancel: &AtomicBool,
) -> Result<VerifyOutput, Cancelled> {
    if cancel.load(Ordering::Relaxed) {
        return Err(Cancelled);
    }
    let supertypes = SupertypeTable::build(store);
    let classes: Vec<ClassId> = store.class_ids().collect();
    let types = classes
        .par_iter()
        .map(|&class| {
            if cancel.load(Ordering::Relaxed) {
                return Err(Cancelled);
            }
            Ok(verify_type(store, &supertypes, class, config))
        })
        .collect::<Result<Vec<_>, Cancelled>>();

    match types {
        Ok(types) => {
            log_summary(&types);
            Ok(VerifyOutput { types })
        }
        Err(err) => {
            tracing::debug!(target: "nova.verify", "verification pass cancelled");
            Err(err)
        }
    }
}

fn log_summary(types: &[TypeVerification]) {
    let diagnostics: usize = types.iter().map(|ty| ty.diagnostics.len()).sum();
    let bridges: usize = types.iter().map(|ty| ty.bridges.bridges.len()).sum();
    tracing::debug!(
        target: "nova.verify",
        types = types.len(),
        diagnostics,
        bridges,
        "verification pass finished"
    );
}
