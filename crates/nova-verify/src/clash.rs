//! Erasure clashes: methods that would collapse to one runtime signature without being in an
//! override relation (JLS 8.4.8.3).

use nova_types::{ClassId, ErasedType, SupertypeTable, TypeEnv};

use crate::diagnostics::{Anchor, Detail, DiagnosticKind, DiagnosticSink};
use crate::matcher::SignatureMatcher;
use crate::resolver::Resolution;
use crate::views::{InheritedMethodView, MethodTable};

pub struct ClashDetector<'a, 'env> {
    env: &'env dyn TypeEnv,
    supertypes: &'a SupertypeTable,
    class_id: ClassId,
    methods: &'a MethodTable<'env>,
    matcher: SignatureMatcher<'env>,
}

impl<'a, 'env> ClashDetector<'a, 'env> {
    pub fn new(
        env: &'env dyn TypeEnv,
        supertypes: &'a SupertypeTable,
        class_id: ClassId,
        methods: &'a MethodTable<'env>,
    ) -> Self {
        Self {
            env,
            supertypes,
            class_id,
            methods,
            matcher: SignatureMatcher::new(env),
        }
    }

    /// Runs after override resolution; only pairs the resolver left unrelated can clash.
    pub fn detect(&self, resolution: &mut Resolution, sink: &mut DiagnosticSink<'_>) {
        let mut clashed = vec![false; self.methods.own.len()];
        self.own_against_own(resolution, &mut clashed, sink);
        self.own_against_inherited(resolution, &mut clashed, sink);
        self.inherited_against_inherited(resolution, sink);
    }

    /// Two declarations of the type itself: identical signatures are duplicates, equal erasures
    /// are a clash. Reported on the later declaration.
    fn own_against_own(
        &self,
        resolution: &mut Resolution,
        clashed: &mut [bool],
        sink: &mut DiagnosticSink<'_>,
    ) {
        let own = &self.methods.own;
        for (j, later) in own.iter().enumerate() {
            if !later.well_formed {
                continue;
            }
            for earlier in own[..j].iter().filter(|m| m.well_formed) {
                if earlier.name() != later.name() {
                    continue;
                }
                let duplicate = self.matcher.is_subsignature(later, earlier)
                    && self.matcher.is_subsignature(earlier, later);
                if duplicate {
                    sink.report(
                        DiagnosticKind::DuplicateMethod,
                        Some(later.id),
                        Some(earlier.id),
                        Anchor::MethodName,
                        Detail::None,
                    );
                    clashed[j] = true;
                    break;
                }
                if self.matcher.same_erasure(later, earlier)
                    && sink.report(
                        DiagnosticKind::NameClash,
                        Some(later.id),
                        Some(earlier.id),
                        Anchor::MethodName,
                        Detail::SameType,
                    )
                {
                    resolution.record_clash(later.id, earlier.id);
                    clashed[j] = true;
                    break;
                }
            }
        }
    }

    /// An own method against every inherited member it does not override, including members
    /// shadowed further down the hierarchy. Erasures of what either side overrides count too.
    fn own_against_inherited(
        &self,
        resolution: &mut Resolution,
        clashed: &mut [bool],
        sink: &mut DiagnosticSink<'_>,
    ) {
        let inherited = &self.methods.inherited;
        for (idx, method) in self.methods.own.iter().enumerate() {
            if clashed[idx] || !method.well_formed {
                continue;
            }
            let method_erasures = erasures(method, &resolution.overridden[idx], inherited);

            for (j, other) in inherited.iter().enumerate() {
                if other.name() != method.name()
                    || !other.well_formed
                    || resolution.overridden[idx].contains(&j)
                    || self.matcher.is_subsignature(method, other)
                {
                    continue;
                }
                let other_erasures = erasures(other, &resolution.inherited_overrides[j], inherited);
                if !method_erasures.iter().any(|e| other_erasures.contains(e)) {
                    continue;
                }

                let detail = if method.is_static() {
                    Detail::StaticHiding
                } else {
                    Detail::None
                };
                if sink.report(
                    DiagnosticKind::NameClash,
                    Some(method.id),
                    Some(other.id),
                    Anchor::MethodName,
                    detail,
                ) {
                    tracing::trace!(
                        target: "nova.verify",
                        method = %method.name(),
                        owner = %other.owner.name,
                        "name clash"
                    );
                    resolution.record_clash(method.id, other.id);
                    clashed[idx] = true;
                    break;
                }
            }
        }
    }

    /// Two inherited members neither of which overrides the other, e.g. `I<A>.foo(A)` and
    /// `J<B>.foo(B)` both erasing to `foo(Object)`. Blamed on the first type that combines them.
    fn inherited_against_inherited(
        &self,
        resolution: &mut Resolution,
        sink: &mut DiagnosticSink<'_>,
    ) {
        let inherited = &self.methods.inherited;
        let live: Vec<usize> = (0..inherited.len())
            .filter(|&j| {
                !resolution.shadowed[j] && inherited[j].well_formed && !resolution.is_overridden(j)
            })
            .collect();

        for (pos, &i) in live.iter().enumerate() {
            for &j in &live[pos + 1..] {
                let (a, b) = (&inherited[i], &inherited[j]);
                if a.name() != b.name()
                    || a.id == b.id
                    || !self.matcher.same_erasure(a, b)
                    || self.matcher.override_equivalent(a, b)
                {
                    continue;
                }
                if a.combines_with(b, self.env, self.supertypes, self.class_id) {
                    continue;
                }
                if sink.report(
                    DiagnosticKind::NameClash,
                    Some(a.id),
                    Some(b.id),
                    Anchor::TypeDeclaration,
                    Detail::Inherited,
                ) {
                    resolution.record_clash(a.id, b.id);
                }
            }
        }
    }
}

/// Declared parameter erasures of `view` and of every inherited view it overrides.
fn erasures<'v>(
    view: &'v InheritedMethodView<'_>,
    overridden: &[usize],
    inherited: &'v [InheritedMethodView<'_>],
) -> Vec<&'v [ErasedType]> {
    std::iter::once(view.declared_erasure.as_slice())
        .chain(
            overridden
                .iter()
                .map(|&k| inherited[k].declared_erasure.as_slice()),
        )
        .collect()
}
