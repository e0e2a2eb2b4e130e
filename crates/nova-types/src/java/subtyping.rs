use crate::{instantiate_as_supertype, ClassType, Type, TypeEnv, WildcardBound};

/// Recursion ceiling for subtype checks over self-referential bounds.
pub const MAX_SUBTYPE_DEPTH: usize = 48;

/// `sub <: sup`. Checks that hit the recursion ceiling answer `false`.
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    is_subtype_checked(env, sub, sup).unwrap_or(false)
}

/// `sub <: sup`, or `None` when the check could not be decided within [`MAX_SUBTYPE_DEPTH`].
pub fn is_subtype_checked(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> Option<bool> {
    Subtyping { env }.check(sub, sup, 0)
}

/// `sub` only reaches `sup` through an unchecked conversion from a raw type (JLS 5.1.9), e.g. a
/// raw `List` against `List<String>`.
pub fn is_unchecked_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    match (sub, sup) {
        (Type::Array(a), Type::Array(b)) => is_unchecked_subtype(env, a, b),
        (_, Type::Class(ClassType { def, args })) if !args.is_empty() => {
            if is_subtype(env, sub, sup) {
                return false;
            }
            matches!(
                instantiate_as_supertype(env, sub, *def),
                Some(Type::Class(ClassType { args, .. })) if args.is_empty()
            )
        }
        _ => false,
    }
}

/// A checked exception type: a `Throwable` that is neither a `RuntimeException` nor an `Error`.
pub fn is_checked_exception(env: &dyn TypeEnv, ty: &Type) -> bool {
    let wk = env.well_known();
    is_subtype(env, ty, &Type::class(wk.throwable, vec![]))
        && !is_subtype(env, ty, &Type::class(wk.runtime_exception, vec![]))
        && !is_subtype(env, ty, &Type::class(wk.error, vec![]))
}

struct Subtyping<'a> {
    env: &'a dyn TypeEnv,
}

impl Subtyping<'_> {
    fn check(&self, sub: &Type, sup: &Type, depth: usize) -> Option<bool> {
        if depth > MAX_SUBTYPE_DEPTH {
            return None;
        }
        if sub == sup {
            return Some(true);
        }

        let object = self.env.well_known().object;
        match (sub, sup) {
            // Unresolved types never produce follow-up errors.
            (Type::Error, _) | (_, Type::Error) => Some(true),
            (Type::Void, _) | (_, Type::Void) => Some(false),
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => Some(false),
            (Type::Wildcard(WildcardBound::Extends(upper)), _) => self.check(upper, sup, depth + 1),
            (Type::Wildcard(_), _) => Some(self.is_object(sup)),
            (_, Type::Class(ClassType { def, .. })) if *def == object => Some(true),
            (Type::TypeVar(id), _) => {
                let Some(param) = self.env.type_param(*id) else {
                    return Some(false);
                };
                let mut undecided = false;
                for bound in &param.upper_bounds {
                    match self.check(bound, sup, depth + 1) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => undecided = true,
                    }
                }
                if undecided {
                    None
                } else {
                    Some(false)
                }
            }
            (_, Type::TypeVar(_)) | (_, Type::Wildcard(_)) => Some(false),
            (Type::Array(a), Type::Array(b)) => {
                if a.is_reference() && b.is_reference() {
                    self.check(a, b, depth + 1)
                } else {
                    Some(false)
                }
            }
            (Type::Array(_), Type::Class(ClassType { def, .. })) => {
                let wk = self.env.well_known();
                Some(*def == wk.cloneable || *def == wk.serializable)
            }
            (Type::Class(_), Type::Array(_)) => Some(false),
            (Type::Class(_), Type::Class(target)) => {
                let Some(Type::Class(found)) = instantiate_as_supertype(self.env, sub, target.def)
                else {
                    return Some(false);
                };
                if target.args.is_empty() {
                    return Some(true);
                }
                if found.args.len() != target.args.len() {
                    return Some(false);
                }
                let mut undecided = false;
                for (arg, formal) in found.args.iter().zip(&target.args) {
                    match self.contains(arg, formal, depth + 1) {
                        Some(true) => {}
                        Some(false) => return Some(false),
                        None => undecided = true,
                    }
                }
                if undecided {
                    None
                } else {
                    Some(true)
                }
            }
        }
    }

    /// Type argument containment (JLS 4.5.1).
    fn contains(&self, arg: &Type, formal: &Type, depth: usize) -> Option<bool> {
        if arg == formal || matches!(arg, Type::Error) || matches!(formal, Type::Error) {
            return Some(true);
        }
        match formal {
            Type::Wildcard(WildcardBound::Unbounded) => Some(true),
            Type::Wildcard(WildcardBound::Extends(upper)) => match arg {
                Type::Wildcard(WildcardBound::Extends(inner)) => {
                    self.check(inner, upper, depth + 1)
                }
                Type::Wildcard(_) => Some(self.is_object(upper)),
                other => self.check(other, upper, depth + 1),
            },
            Type::Wildcard(WildcardBound::Super(lower)) => match arg {
                Type::Wildcard(WildcardBound::Super(inner)) => self.check(lower, inner, depth + 1),
                Type::Wildcard(_) => Some(false),
                other => self.check(lower, other, depth + 1),
            },
            _ => Some(false),
        }
    }

    fn is_object(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(ClassType { def, .. }) if *def == self.env.well_known().object)
    }
}
