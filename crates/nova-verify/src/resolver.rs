//! Override, hiding and implementation relations between a type's methods and the members it
//! inherits.
//!
//! Every inherited view is first checked against views from more specific supertypes: a view
//! overridden along the way (`A.foo` when `B extends A` redeclares `foo`) is *shadowed*. Own
//! methods are classified against unshadowed views only, so `C extends B` is checked against
//! `B.foo` and never reports a second, transitive diagnostic against `A.foo`.

use nova_types::{
    erase_params, is_checked_exception, is_subtype, raw_reference, ClassDef, ClassId, MethodId,
    SupertypeTable, Type, TypeEnv, Visibility,
};
use serde::Serialize;

use crate::diagnostics::{Anchor, Detail, DiagnosticKind, DiagnosticSink};
use crate::matcher::{ReturnCompat, SignatureMatcher};
use crate::views::{combined_by_supertype, InheritedMethodView, MethodTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    Overrides,
    Implements,
    Hides,
    NameClash,
    Unrelated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FactFlags {
    /// The overriding method's erasure differs from the overridden one's.
    pub needs_bridge: bool,
    pub unchecked_return: bool,
    pub visibility_reduced: bool,
    pub throws_incompatible: bool,
}

/// How `sub` relates to `sup`, both seen from the verified type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverrideFact {
    pub sub: MethodId,
    pub sup: MethodId,
    pub relation: Relation,
    pub flags: FactFlags,
}

/// Output of [`OverrideResolver::resolve`], indexed like [`MethodTable`].
#[derive(Debug, Default)]
pub struct Resolution {
    pub facts: Vec<OverrideFact>,
    /// `shadowed[j]`: inherited view `j` is overridden by a view from a more specific supertype.
    pub shadowed: Vec<bool>,
    /// `inherited_overrides[i]`: inherited views that inherited view `i` overrides.
    pub inherited_overrides: Vec<Vec<usize>>,
    /// `overridden[i]`: inherited views (shadowed ones included) own method `i` overrides, hides or
    /// implements.
    pub overridden: Vec<Vec<usize>>,
}

impl Resolution {
    /// Some own method overrides, hides or implements inherited view `idx`.
    pub fn is_overridden(&self, idx: usize) -> bool {
        self.overridden.iter().any(|targets| targets.contains(&idx))
    }

    pub(crate) fn record_clash(&mut self, sub: MethodId, sup: MethodId) {
        match self
            .facts
            .iter_mut()
            .find(|fact| fact.sub == sub && fact.sup == sup)
        {
            Some(fact) => fact.relation = Relation::NameClash,
            None => self.facts.push(OverrideFact {
                sub,
                sup,
                relation: Relation::NameClash,
                flags: FactFlags::default(),
            }),
        }
    }
}

pub struct OverrideResolver<'a, 'env> {
    env: &'env dyn TypeEnv,
    supertypes: &'a SupertypeTable,
    class_id: ClassId,
    class: &'env ClassDef,
    methods: &'a MethodTable<'env>,
    matcher: SignatureMatcher<'env>,
}

impl<'a, 'env> OverrideResolver<'a, 'env> {
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

    pub fn resolve(&self, sink: &mut DiagnosticSink<'_>) -> Resolution {
        let mut resolution = Resolution {
            overridden: vec![Vec::new(); self.methods.own.len()],
            ..Resolution::default()
        };
        self.compute_shadowing(&mut resolution);

        for (idx, method) in self.methods.own.iter().enumerate() {
            self.resolve_own(idx, method, &mut resolution, sink);
        }

        self.check_override_annotations(&resolution, sink);
        self.check_raw_types(&resolution, sink);
        self.check_inherited_pairs(&mut resolution, sink);
        self.check_supertype_arguments(sink);
        self.check_abstract_completeness(&resolution, sink);
        self.check_hash_code(sink);
        resolution
    }

    fn compute_shadowing(&self, resolution: &mut Resolution) {
        let inherited = &self.methods.inherited;
        resolution.shadowed = vec![false; inherited.len()];
        resolution.inherited_overrides = vec![Vec::new(); inherited.len()];

        for (i, sub) in inherited.iter().enumerate() {
            if !sub.well_formed {
                continue;
            }
            for (j, sup) in inherited.iter().enumerate() {
                if i == j
                    || !sup.well_formed
                    || sub.name() != sup.name()
                    || sub.owner_id() == sup.owner_id()
                    || sub.is_static() != sup.is_static()
                    || !self.supertypes.is_subclass(sub.owner_id(), sup.owner_id())
                {
                    continue;
                }
                if self.matcher.is_subsignature(sub, sup) {
                    resolution.inherited_overrides[i].push(j);
                    resolution.shadowed[j] = true;
                }
            }
        }
    }

    fn resolve_own(
        &self,
        idx: usize,
        method: &InheritedMethodView<'env>,
        resolution: &mut Resolution,
        sink: &mut DiagnosticSink<'_>,
    ) {
        if !method.well_formed {
            tracing::debug!(
                target: "nova.verify",
                method = %method.name(),
                "skipping method with unresolved signature"
            );
            return;
        }

        let mut annotation_reported = false;
        for (j, other) in self.methods.inherited.iter().enumerate() {
            if other.name() != method.name() {
                continue;
            }
            if !other.well_formed {
                tracing::debug!(
                    target: "nova.verify",
                    method = %method.name(),
                    owner = %other.owner.name,
                    "skipping pair with unresolved signature"
                );
                continue;
            }

            if !self.matcher.is_subsignature(method, other) {
                if !resolution.shadowed[j] {
                    resolution.facts.push(OverrideFact {
                        sub: method.id,
                        sup: other.id,
                        relation: Relation::Unrelated,
                        flags: FactFlags::default(),
                    });
                }
                continue;
            }

            resolution.overridden[idx].push(j);
            if resolution.shadowed[j] {
                continue;
            }
            let fact = self.classify(method, other, sink, &mut annotation_reported);
            tracing::trace!(
                target: "nova.verify",
                method = %method.name(),
                owner = %other.owner.name,
                relation = ?fact.relation,
                "classified pair"
            );
            resolution.facts.push(fact);
        }
    }

    /// `method` is a subsignature of `other`: decide between overriding, implementing and hiding,
    /// then run the structural checks in a fixed order. The sink keeps the first structural
    /// diagnostic of the pair.
    fn classify(
        &self,
        method: &InheritedMethodView<'env>,
        other: &InheritedMethodView<'env>,
        sink: &mut DiagnosticSink<'_>,
        annotation_reported: &mut bool,
    ) -> OverrideFact {
        let returns = self.matcher.return_compat(method, other);
        let uncovered = uncovered_exception(self.env, method, other);
        let relation = match (method.is_static(), other.is_static()) {
            (true, true) => Relation::Hides,
            _ if other.is_abstract() => Relation::Implements,
            _ => Relation::Overrides,
        };
        let flags = FactFlags {
            needs_bridge: relation != Relation::Hides
                && !self.class.is_interface()
                && method.is_concrete_class_method()
                && method.erased_signature() != other.erased_signature(),
            unchecked_return: returns == ReturnCompat::Unchecked,
            visibility_reduced: method.def.visibility < other.def.visibility,
            throws_incompatible: uncovered.is_some(),
        };

        let (m, n) = (Some(method.id), Some(other.id));
        if method.is_static() != other.is_static() {
            let detail = if method.is_static() {
                Detail::StaticHidesInstance
            } else {
                Detail::InstanceOverridesStatic
            };
            sink.report(
                DiagnosticKind::StaticInstanceMismatch,
                m,
                n,
                Anchor::MethodName,
                detail,
            );
        }
        if other.def.is_final {
            sink.report(
                DiagnosticKind::CannotOverrideFinal,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if !returns.is_compatible() {
            sink.report(
                DiagnosticKind::IncompatibleReturnType,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if flags.visibility_reduced {
            sink.report(
                DiagnosticKind::CannotReduceVisibility,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if let Some(exception) = uncovered {
            sink.report(
                DiagnosticKind::IncompatibleThrowsClause,
                m,
                n,
                Anchor::MethodName,
                Detail::UncoveredException(exception),
            );
        }

        if !method.is_static() && !other.is_static() {
            self.report_advisories(method, other, returns, sink, annotation_reported);
        }

        OverrideFact {
            sub: method.id,
            sup: other.id,
            relation,
            flags,
        }
    }

    fn report_advisories(
        &self,
        method: &InheritedMethodView<'env>,
        other: &InheritedMethodView<'env>,
        returns: ReturnCompat,
        sink: &mut DiagnosticSink<'_>,
        annotation_reported: &mut bool,
    ) {
        let (m, n) = (Some(method.id), Some(other.id));
        if returns == ReturnCompat::Unchecked {
            sink.report(
                DiagnosticKind::UncheckedReturnConversion,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if method.def.is_varargs != other.def.is_varargs {
            sink.report(
                DiagnosticKind::VarargsOverrideMismatch,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        // Once per method, even when it implements several supertypes at once.
        if !method.def.has_override_annotation && !*annotation_reported {
            *annotation_reported = sink.report(
                DiagnosticKind::MissingOverrideAnnotation,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if !other.is_abstract() && !method.is_abstract() && !method.def.calls_super {
            sink.report(
                DiagnosticKind::OverridingWithoutSuperCall,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
        if other.def.is_synchronized && !method.def.is_synchronized {
            sink.report(
                DiagnosticKind::MissingSynchronizedOnOverride,
                m,
                n,
                Anchor::MethodName,
                Detail::None,
            );
        }
    }

    fn check_override_annotations(&self, resolution: &Resolution, sink: &mut DiagnosticSink<'_>) {
        for (idx, method) in self.methods.own.iter().enumerate() {
            if !method.def.has_override_annotation || !method.well_formed {
                continue;
            }
            let overrides = !method.is_static()
                && resolution.overridden[idx]
                    .iter()
                    .any(|&j| !self.methods.inherited[j].is_static());
            if overrides
                || self.has_malformed_namesake(method.name())
                || self.overrides_object_member(method)
            {
                continue;
            }
            sink.report(
                DiagnosticKind::MethodMustOverride,
                Some(method.id),
                None,
                Anchor::MethodName,
                Detail::None,
            );
        }
    }

    /// Interfaces implicitly declare the public members of `Object` (JLS 9.2).
    fn overrides_object_member(&self, method: &InheritedMethodView<'env>) -> bool {
        if !self.class.is_interface() || method.is_static() {
            return false;
        }
        let Some(object) = self.env.class(self.env.well_known().object) else {
            return false;
        };
        object.methods.iter().any(|member| {
            member.visibility == Visibility::Public
                && !member.is_static
                && member.name == method.name()
                && erase_params(self.env, &member.params) == method.declared_erasure
        })
    }

    fn has_malformed_namesake(&self, name: &str) -> bool {
        self.methods
            .own
            .iter()
            .chain(self.methods.inherited.iter())
            .any(|view| !view.well_formed && view.name() == name)
    }

    /// Raw references in supertype clauses and in the signatures of methods that override
    /// nothing (an override has to repeat whatever its supertype declares).
    fn check_raw_types(&self, resolution: &Resolution, sink: &mut DiagnosticSink<'_>) {
        for edge in self.class.super_class.iter().chain(&self.class.interfaces) {
            if let Some(raw) = raw_reference(self.env, edge) {
                sink.report(
                    DiagnosticKind::RawTypeReference,
                    None,
                    None,
                    Anchor::TypeDeclaration,
                    Detail::RawType(raw),
                );
            }
        }

        for (idx, method) in self.methods.own.iter().enumerate() {
            if !method.well_formed || !resolution.overridden[idx].is_empty() {
                continue;
            }
            if let Some(raw) = method
                .def
                .params
                .iter()
                .find_map(|param| raw_reference(self.env, param))
            {
                sink.report(
                    DiagnosticKind::RawTypeReference,
                    Some(method.id),
                    None,
                    Anchor::ParameterList,
                    Detail::RawType(raw),
                );
            }
            if let Some(raw) = raw_reference(self.env, &method.def.return_type) {
                sink.report(
                    DiagnosticKind::RawTypeReference,
                    Some(method.id),
                    None,
                    Anchor::MethodName,
                    Detail::RawType(raw),
                );
            }
        }
    }

    /// Pairs of inherited members the type itself does not override: a class method implementing
    /// an interface method on the type's behalf, and abstract methods whose return types cannot be
    /// reconciled.
    fn check_inherited_pairs(&self, resolution: &mut Resolution, sink: &mut DiagnosticSink<'_>) {
        let inherited = &self.methods.inherited;
        let live: Vec<usize> = (0..inherited.len())
            .filter(|&j| {
                !resolution.shadowed[j] && inherited[j].well_formed && !resolution.is_overridden(j)
            })
            .collect();

        for (pos, &i) in live.iter().enumerate() {
            for &j in &live[pos + 1..] {
                let (a, b) = (&inherited[i], &inherited[j]);
                if a.name() != b.name() || a.id == b.id {
                    continue;
                }
                if a.combines_with(b, self.env, self.supertypes, self.class_id) {
                    continue;
                }

                if let Some((concrete, abstract_method)) = implementing_pair(a, b) {
                    if self.matcher.is_subsignature(concrete, abstract_method) {
                        let fact =
                            self.check_inherited_implementation(concrete, abstract_method, sink);
                        resolution.facts.push(fact);
                    }
                    continue;
                }

                if a.is_abstract()
                    && b.is_abstract()
                    && self.matcher.override_equivalent(a, b)
                    && !self.implemented_by_inherited(a, &live)
                    && !self.matcher.return_compat(a, b).is_compatible()
                    && !self.matcher.return_compat(b, a).is_compatible()
                {
                    sink.report(
                        DiagnosticKind::IncompatibleInheritedReturnTypes,
                        Some(a.id),
                        Some(b.id),
                        Anchor::TypeDeclaration,
                        Detail::None,
                    );
                }
            }
        }
    }

    fn check_inherited_implementation(
        &self,
        concrete: &InheritedMethodView<'env>,
        abstract_method: &InheritedMethodView<'env>,
        sink: &mut DiagnosticSink<'_>,
    ) -> OverrideFact {
        let returns = self.matcher.return_compat(concrete, abstract_method);
        let uncovered = uncovered_exception(self.env, concrete, abstract_method);
        let flags = FactFlags {
            needs_bridge: !self.class.is_interface()
                && concrete.is_concrete_class_method()
                && concrete.erased_signature() != abstract_method.erased_signature(),
            unchecked_return: returns == ReturnCompat::Unchecked,
            visibility_reduced: concrete.def.visibility < abstract_method.def.visibility,
            throws_incompatible: uncovered.is_some(),
        };

        let (c, x) = (Some(concrete.id), Some(abstract_method.id));
        if concrete.is_static() {
            sink.report(
                DiagnosticKind::StaticInstanceMismatch,
                c,
                x,
                Anchor::TypeDeclaration,
                Detail::Inherited,
            );
        }
        if !returns.is_compatible() {
            sink.report(
                DiagnosticKind::IncompatibleReturnType,
                c,
                x,
                Anchor::TypeDeclaration,
                Detail::Inherited,
            );
        }
        if flags.visibility_reduced {
            sink.report(
                DiagnosticKind::CannotReduceVisibility,
                c,
                x,
                Anchor::TypeDeclaration,
                Detail::Inherited,
            );
        }
        if let Some(exception) = uncovered {
            sink.report(
                DiagnosticKind::IncompatibleThrowsClause,
                c,
                x,
                Anchor::TypeDeclaration,
                Detail::UncoveredException(exception),
            );
        }
        if returns == ReturnCompat::Unchecked {
            sink.report(
                DiagnosticKind::UncheckedReturnConversion,
                c,
                x,
                Anchor::TypeDeclaration,
                Detail::Inherited,
            );
        }

        OverrideFact {
            sub: concrete.id,
            sup: abstract_method.id,
            relation: Relation::Implements,
            flags,
        }
    }

    fn implemented_by_inherited(
        &self,
        abstract_method: &InheritedMethodView<'env>,
        live: &[usize],
    ) -> bool {
        live.iter().any(|&k| {
            let candidate = &self.methods.inherited[k];
            !candidate.from_interface()
                && !candidate.def.is_abstract
                && self.matcher.is_subsignature(candidate, abstract_method)
        })
    }

    /// A generic declaration reached with two different argument lists, reported against the
    /// first type that combines them.
    fn check_supertype_arguments(&self, sink: &mut DiagnosticSink<'_>) {
        let instances = self.supertypes.instances(self.class_id);
        let mut seen: Vec<ClassId> = Vec::new();
        for (pos, first) in instances.iter().enumerate() {
            if seen.contains(&first.ty.def) {
                continue;
            }
            let Some(second) = instances[pos + 1..]
                .iter()
                .find(|other| other.ty.def == first.ty.def)
            else {
                continue;
            };
            seen.push(first.ty.def);
            if combined_by_supertype(
                self.env,
                self.supertypes,
                self.class_id,
                (&first.ty, first.raw),
                (&second.ty, second.raw),
            ) {
                continue;
            }
            sink.report(
                DiagnosticKind::InconsistentSupertypeArguments,
                None,
                None,
                Anchor::TypeDeclaration,
                Detail::Instantiations(
                    Type::Class(first.ty.clone()),
                    Type::Class(second.ty.clone()),
                ),
            );
        }
    }

    /// A concrete class needs an implementation of every abstract member it inherits. Reported
    /// once per override-equivalent group, naming the most specific declaration.
    fn check_abstract_completeness(&self, resolution: &Resolution, sink: &mut DiagnosticSink<'_>) {
        if !self.class.is_concrete() {
            return;
        }
        let inherited = &self.methods.inherited;
        let mut reported: Vec<&InheritedMethodView<'env>> = Vec::new();

        for (j, required) in inherited.iter().enumerate() {
            if resolution.shadowed[j]
                || !required.well_formed
                || !required.is_abstract()
                || required.is_static()
                || resolution.is_overridden(j)
            {
                continue;
            }
            let implemented = inherited.iter().enumerate().any(|(k, candidate)| {
                !resolution.shadowed[k]
                    && candidate.well_formed
                    && !candidate.from_interface()
                    && !candidate.def.is_abstract
                    && self.matcher.is_subsignature(candidate, required)
            });
            // A malformed namesake may well be the implementation; stay quiet.
            if implemented || self.has_malformed_namesake(required.name()) {
                continue;
            }
            if reported
                .iter()
                .any(|earlier| self.matcher.override_equivalent(earlier, required))
            {
                continue;
            }
            sink.report(
                DiagnosticKind::MustImplementAbstractMethod,
                Some(required.id),
                None,
                Anchor::TypeDeclaration,
                Detail::None,
            );
            reported.push(required);
        }
    }

    fn check_hash_code(&self, sink: &mut DiagnosticSink<'_>) {
        if self.class.is_interface() {
            return;
        }
        let object = Type::class(self.env.well_known().object, vec![]);
        let Some(equals) = self.methods.own.iter().find(|method| {
            method.name() == "equals"
                && !method.is_static()
                && matches!(method.def.params.as_slice(), [param] if *param == object)
        }) else {
            return;
        };
        let has_hash_code = self.methods.own.iter().any(|method| {
            method.name() == "hashCode" && !method.is_static() && method.def.params.is_empty()
        });
        if !has_hash_code {
            sink.report(
                DiagnosticKind::ShouldDeclareHashCode,
                Some(equals.id),
                None,
                Anchor::TypeDeclaration,
                Detail::None,
            );
        }
    }
}

/// A class method standing in for an abstract method, in either order.
fn implementing_pair<'v, 'env>(
    a: &'v InheritedMethodView<'env>,
    b: &'v InheritedMethodView<'env>,
) -> Option<(&'v InheritedMethodView<'env>, &'v InheritedMethodView<'env>)> {
    let implements = |concrete: &InheritedMethodView<'env>, other: &InheritedMethodView<'env>| {
        !concrete.from_interface() && !concrete.def.is_abstract && other.is_abstract()
    };
    if implements(a, b) {
        Some((a, b))
    } else if implements(b, a) {
        Some((b, a))
    } else {
        None
    }
}

/// The first checked exception `method` throws that `other`'s throws clause does not cover.
fn uncovered_exception(
    env: &dyn TypeEnv,
    method: &InheritedMethodView<'_>,
    other: &InheritedMethodView<'_>,
) -> Option<Type> {
    method
        .throws
        .iter()
        .find(|thrown| {
            is_checked_exception(env, thrown)
                && !other
                    .throws
                    .iter()
                    .any(|allowed| is_subtype(env, thrown, allowed))
        })
        .cloned()
}
