//! Pairwise signature relations between a subtype method `m` and a supertype method `n`.

use nova_types::{
    erase, erase_to_type, is_subtype, is_subtype_checked, is_unchecked_subtype, ErasedType,
    Substitution, Type, TypeEnv,
};

use crate::views::InheritedMethodView;

/// How `m`'s return type relates to `n`'s (JLS 8.4.8.3, return-type-substitutable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnCompat {
    Same,
    Covariant,
    /// Allowed, but needs an unchecked conversion.
    Unchecked,
    Incompatible,
}

impl ReturnCompat {
    pub fn is_compatible(self) -> bool {
        self != ReturnCompat::Incompatible
    }
}

#[derive(Clone, Copy)]
pub struct SignatureMatcher<'env> {
    env: &'env dyn TypeEnv,
}

impl<'env> SignatureMatcher<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self { env }
    }

    /// Both methods have the same name and the same declared parameter erasure.
    pub fn same_erasure(&self, m: &InheritedMethodView<'_>, n: &InheritedMethodView<'_>) -> bool {
        m.name() == n.name() && m.declared_erasure == n.declared_erasure
    }

    /// `m` is a subsignature of `n` (JLS 8.4.2): after renaming `n`'s method type parameters to
    /// `m`'s the parameter lists are equal, or `m` is not generic and its parameter list equals the
    /// erasure of `n`'s.
    pub fn is_subsignature(
        &self,
        m: &InheritedMethodView<'_>,
        n: &InheritedMethodView<'_>,
    ) -> bool {
        if m.name() != n.name() || m.params.len() != n.params.len() {
            return false;
        }

        if let Some(adapt) = self.adapt_type_params(m, n) {
            if m.params == adapt.apply_all(&n.params) {
                return true;
            }
        }

        m.type_params.is_empty()
            && m
                .params
                .iter()
                .zip(&n.params)
                .all(|(mp, np)| *mp == erase_to_type(self.env, np))
    }

    /// `m` and `n` are override-equivalent: one is a subsignature of the other.
    pub fn override_equivalent(
        &self,
        m: &InheritedMethodView<'_>,
        n: &InheritedMethodView<'_>,
    ) -> bool {
        self.is_subsignature(m, n) || self.is_subsignature(n, m)
    }

    /// Renaming of `n`'s method type parameters to `m`'s, when both declare the same number of
    /// parameters with matching bounds (as seen from the verified type). Two non-generic methods
    /// adapt trivially.
    fn adapt_type_params(
        &self,
        m: &InheritedMethodView<'_>,
        n: &InheritedMethodView<'_>,
    ) -> Option<Substitution> {
        if m.type_params.len() != n.type_params.len() {
            return None;
        }
        let adapt = Substitution::from_pairs(
            n.type_params
                .iter()
                .zip(&m.type_params)
                .map(|(nv, mv)| (*nv, Type::TypeVar(*mv))),
        );
        for (n_bounds, m_bounds) in n.type_param_bounds.iter().zip(&m.type_param_bounds) {
            let n_bounds = adapt.apply_all(n_bounds);
            if !same_bounds(self.env, m_bounds, &n_bounds) {
                return None;
            }
        }
        Some(adapt)
    }

    /// Return-type substitutability of `m` for `n`.
    pub fn return_compat(
        &self,
        m: &InheritedMethodView<'_>,
        n: &InheritedMethodView<'_>,
    ) -> ReturnCompat {
        let r1 = &m.return_type;
        let adapt = self.adapt_type_params(m, n);
        let r2 = match &adapt {
            Some(adapt) => adapt.apply(&n.return_type),
            None => n.return_type.clone(),
        };

        if *r1 == r2 {
            return ReturnCompat::Same;
        }
        if !r1.is_reference() || !r2.is_reference() {
            return ReturnCompat::Incompatible;
        }

        match is_subtype_checked(self.env, r1, &r2) {
            Some(true) => return ReturnCompat::Covariant,
            Some(false) => {}
            None => {
                tracing::debug!(
                    target: "nova.verify",
                    method = %m.name(),
                    "return type check hit the recursion ceiling; comparing erasures"
                );
                return self.erased_return_compat(r1, &r2);
            }
        }

        if is_unchecked_subtype(self.env, r1, &r2) {
            return ReturnCompat::Unchecked;
        }

        // `m` overrides `n` only through the erasure of `n`'s signature: `m` may return a subtype
        // of `|R2|`.
        let same_signature = adapt.is_some_and(|adapt| m.params == adapt.apply_all(&n.params));
        if !same_signature && is_subtype(self.env, r1, &erase_to_type(self.env, &r2)) {
            return ReturnCompat::Unchecked;
        }

        ReturnCompat::Incompatible
    }

    fn erased_return_compat(&self, r1: &Type, r2: &Type) -> ReturnCompat {
        let e1 = erase(self.env, r1);
        let e2 = erase(self.env, r2);
        if e1 == e2 {
            return ReturnCompat::Same;
        }
        if matches!(e1, ErasedType::Error) || matches!(e2, ErasedType::Error) {
            return ReturnCompat::Same;
        }
        if is_subtype(self.env, &e1.to_type(), &e2.to_type()) {
            ReturnCompat::Covariant
        } else {
            ReturnCompat::Incompatible
        }
    }
}

/// Bounds are compared as sets; an absent bound list equals an explicit `Object`.
fn same_bounds(env: &dyn TypeEnv, a: &[Type], b: &[Type]) -> bool {
    let object = Type::class(env.well_known().object, vec![]);
    let normalize = |bounds: &[Type]| -> Vec<Type> {
        if bounds.is_empty() {
            vec![object.clone()]
        } else {
            bounds.to_vec()
        }
    };
    let a = normalize(a);
    let b = normalize(b);
    a.len() == b.len() && a.iter().all(|ty| b.contains(ty))
}
