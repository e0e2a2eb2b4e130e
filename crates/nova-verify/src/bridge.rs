//! Synthetic bridge methods a class must emit so that runtime dispatch, which works on erased
//! signatures, reaches overrides whose erasure differs from the method they override.

use nova_types::{
    ClassDef, ClassId, ErasedType, MethodId, SupertypeTable, Type, TypeEnv, Visibility,
};
use serde::Serialize;

use crate::diagnostics::{Anchor, Detail, DiagnosticKind, DiagnosticSink};
use crate::matcher::SignatureMatcher;
use crate::resolver::Resolution;
use crate::views::{InheritedMethodView, MethodTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BridgeKind {
    /// Covariant return or a type variable materialized to a narrower erasure.
    Erasure,
    /// Re-exposes a public method declared by a non-public superclass.
    Visibility,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BridgeMethod {
    pub name: String,
    pub params: Vec<ErasedType>,
    pub return_type: ErasedType,
    /// The real method the bridge forwards to.
    pub target: MethodId,
    pub throws: Vec<Type>,
    pub kind: BridgeKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BridgePlan {
    pub class: ClassId,
    pub bridges: Vec<BridgeMethod>,
}

impl BridgePlan {
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    fn contains(&self, name: &str, params: &[ErasedType], return_type: &ErasedType) -> bool {
        self.bridges
            .iter()
            .any(|b| b.name == name && b.params == params && b.return_type == *return_type)
    }
}

pub struct BridgeMethodPlanner<'a, 'env> {
    env: &'env dyn TypeEnv,
    supertypes: &'a SupertypeTable,
    class_id: ClassId,
    class: &'env ClassDef,
    methods: &'a MethodTable<'env>,
    matcher: SignatureMatcher<'env>,
}

impl<'a, 'env> BridgeMethodPlanner<'a, 'env> {
    pub fn new(
        env: &'env dyn TypeEnv,
        supertypes: &'a SupertypeTable,
        class_id: ClassId,
        class: &'env ClassDef,
        methods: &'a MethodTable<'env>,
    ) -> Self {
        Self {
            env,
            supertypes,
            class_id,
            class,
            methods,
            matcher: SignatureMatcher::new(env),
        }
    }

    pub fn plan(&self, resolution: &Resolution, sink: &mut DiagnosticSink<'_>) -> BridgePlan {
        let mut plan = BridgePlan {
            class: self.class_id,
            bridges: Vec::new(),
        };
        if self.class.is_interface() {
            return plan;
        }

        for (idx, method) in self.methods.own.iter().enumerate() {
            if method.well_formed && method.is_concrete_class_method() {
                self.plan_for_own(idx, method, resolution, sink, &mut plan);
            }
        }
        self.plan_for_inherited(resolution, &mut plan);
        self.plan_visibility(resolution, sink, &mut plan);

        if !plan.is_empty() {
            tracing::debug!(
                target: "nova.verify",
                class = %self.class.name,
                bridges = plan.bridges.len(),
                "planned bridge methods"
            );
        }
        plan
    }

    /// One bridge per distinct erasure among the methods `method` overrides, unless the class
    /// declares that erasure itself or a superclass already bridges it to a method `method` in
    /// turn overrides.
    fn plan_for_own(
        &self,
        idx: usize,
        method: &InheritedMethodView<'env>,
        resolution: &Resolution,
        sink: &DiagnosticSink<'_>,
        plan: &mut BridgePlan,
    ) {
        let inherited = &self.methods.inherited;
        let overridden = &resolution.overridden[idx];

        for &k in overridden {
            let target = &inherited[k];
            if target.is_static()
                || target.erased_signature() == method.erased_signature()
                || sink.has_fatal(method.id, target.id)
            {
                continue;
            }
            if self.declares_erasure(method.id, target) {
                continue;
            }
            let bridged_above = overridden.iter().any(|&q| {
                let ancestor = &inherited[q];
                ancestor.is_concrete_class_method()
                    && ancestor.erased_signature() != target.erased_signature()
                    && resolution.inherited_overrides[q].contains(&k)
            });
            if bridged_above {
                continue;
            }
            push_bridge(plan, target, method, BridgeKind::Erasure);
        }
    }

    /// A concrete method inherited from a superclass that implements an interface method the
    /// superclass never saw: the bridge lives in the first class combining the two.
    fn plan_for_inherited(&self, resolution: &Resolution, plan: &mut BridgePlan) {
        let inherited = &self.methods.inherited;
        for (j, concrete) in inherited.iter().enumerate() {
            if resolution.shadowed[j]
                || !concrete.well_formed
                || !concrete.is_concrete_class_method()
                || resolution.is_overridden(j)
            {
                continue;
            }
            for target in inherited.iter() {
                if !target.from_interface()
                    || !target.well_formed
                    || target.name() != concrete.name()
                    || target.erased_signature() == concrete.erased_signature()
                    || self.supertypes.is_subclass(concrete.owner_id(), target.owner_id())
                    || !self.matcher.is_subsignature(concrete, target)
                {
                    continue;
                }
                if concrete.combines_with(target, self.env, self.supertypes, self.class_id) {
                    continue;
                }
                if self.declares_erasure(concrete.id, target) {
                    continue;
                }
                push_bridge(plan, target, concrete, BridgeKind::Erasure);
            }
        }
    }

    /// Public methods of a non-public superclass are re-declared in the first public subclass so
    /// that callers outside the package can reach them reflectively.
    fn plan_visibility(
        &self,
        resolution: &Resolution,
        sink: &mut DiagnosticSink<'_>,
        plan: &mut BridgePlan,
    ) {
        if self.class.visibility != Visibility::Public {
            return;
        }
        for (j, method) in self.methods.inherited.iter().enumerate() {
            if resolution.shadowed[j]
                || !method.well_formed
                || !method.is_concrete_class_method()
                || method.def.visibility != Visibility::Public
                || method.owner.visibility == Visibility::Public
                || resolution.is_overridden(j)
            {
                continue;
            }
            if self.public_class_between(method.owner_id()) {
                continue;
            }
            if self.declares_erasure(method.id, method) {
                continue;
            }
            if push_bridge(plan, method, method, BridgeKind::Visibility) {
                sink.report(
                    DiagnosticKind::SyntheticAccessEmulation,
                    None,
                    Some(method.id),
                    Anchor::TypeDeclaration,
                    Detail::None,
                );
            }
        }
    }

    /// A public class strictly between the verified class and `owner` that already re-exposes
    /// `owner`'s methods.
    fn public_class_between(&self, owner: ClassId) -> bool {
        self.supertypes.instances(self.class_id).iter().any(|instance| {
            instance.ty.def != owner
                && self.supertypes.is_subclass(instance.ty.def, owner)
                && self.env.class(instance.ty.def).is_some_and(|class| {
                    !class.is_interface() && class.visibility == Visibility::Public
                })
        })
    }

    /// Another declared method already has the bridge's erased parameter list; that is a
    /// duplicate or a clash, never a bridge.
    fn declares_erasure(&self, except: MethodId, target: &InheritedMethodView<'env>) -> bool {
        self.methods.own.iter().any(|own| {
            own.id != except
                && own.name() == target.name()
                && own.declared_erasure == target.declared_erasure
        })
    }
}

/// Adds a bridge with `shape`'s erased signature forwarding to `target`. Returns `false` for a
/// signature already planned.
fn push_bridge(
    plan: &mut BridgePlan,
    shape: &InheritedMethodView<'_>,
    target: &InheritedMethodView<'_>,
    kind: BridgeKind,
) -> bool {
    let (name, params, return_type) = shape.erased_signature();
    if plan.contains(name, params, return_type) {
        return false;
    }
    plan.bridges.push(BridgeMethod {
        name: name.to_string(),
        params: params.to_vec(),
        return_type: return_type.clone(),
        target: target.id,
        throws: target.throws.clone(),
        kind,
    });
    true
}
