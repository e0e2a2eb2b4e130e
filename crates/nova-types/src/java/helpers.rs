use std::collections::{HashSet, VecDeque};

use crate::{ClassDef, ClassId, ClassType, Substitution, Type, TypeEnv, TypeStore, TypeVarId};

/// Inheritance chains deeper than this are cut off (well-formed input never gets close).
pub const MAX_SUPERTYPE_DEPTH: usize = 64;

/// One supertype reached from a class, expressed in that class's own type-argument basis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupertypeInstance {
    pub ty: ClassType,
    /// Reached through a raw edge (or is itself a raw reference): its members are seen erased.
    pub raw: bool,
    /// Number of inheritance edges between the class and this supertype.
    pub depth: usize,
}

/// The class viewed from inside its own body: `class Y<T>` yields `Y<T>`.
pub fn own_type(env: &dyn TypeEnv, class: ClassId) -> ClassType {
    let args = env
        .class(class)
        .map(|def| def.type_params.iter().map(|tp| Type::TypeVar(*tp)).collect())
        .unwrap_or_default();
    ClassType { def: class, args }
}

/// Breadth-first walk over the supertypes of `start`, applying type argument substitution along
/// each edge. Direct supertypes come first, superclass before interfaces, interfaces in declaration
/// order. Every distinct instantiation is visited once; `visit` returning `true` stops the walk.
fn walk_supertypes(
    env: &dyn TypeEnv,
    start: ClassType,
    mut visit: impl FnMut(&SupertypeInstance) -> bool,
) {
    let root = start.def;
    let mut seen: HashSet<ClassType> = HashSet::new();
    seen.insert(start.clone());
    let mut queue: VecDeque<(ClassType, bool, usize)> = VecDeque::new();
    queue.push_back((start, false, 0));

    while let Some((current, raw, depth)) = queue.pop_front() {
        let Some(class_def) = env.class(current.def) else {
            continue;
        };
        if depth >= MAX_SUPERTYPE_DEPTH {
            tracing::debug!(
                target: "nova.types",
                class = %class_def.name,
                "supertype walk hit the depth ceiling"
            );
            continue;
        }

        // Members of a raw type are erased, and so is everything above it.
        let raw_here = raw || (current.args.is_empty() && class_def.is_generic());
        let subst = (!raw_here).then(|| Substitution::for_class_type(env, &current));

        for edge in class_def.super_class.iter().chain(class_def.interfaces.iter()) {
            let Type::Class(edge) = edge else {
                continue;
            };
            if edge.def == root {
                continue;
            }
            let next = match &subst {
                Some(subst) => subst.apply_class(edge),
                None => ClassType {
                    def: edge.def,
                    args: Vec::new(),
                },
            };
            let next_raw = raw_here
                || (next.args.is_empty() && env.class(next.def).is_some_and(ClassDef::is_generic));
            if !seen.insert(next.clone()) {
                continue;
            }

            let instance = SupertypeInstance {
                ty: next.clone(),
                raw: next_raw,
                depth: depth + 1,
            };
            if visit(&instance) {
                return;
            }
            queue.push_back((next, next_raw, depth + 1));
        }
    }
}

/// All distinct supertype instantiations of `class` (excluding `class` itself).
///
/// A declaration reached through several paths with different argument lists appears once per
/// distinct instantiation.
pub fn supertype_instances(env: &dyn TypeEnv, class: ClassId) -> Vec<SupertypeInstance> {
    let mut out = Vec::new();
    walk_supertypes(env, own_type(env, class), |instance| {
        out.push(instance.clone());
        false
    });
    out
}

/// Substitution taking the formals of `sup` to the arguments `sub` supplies for them, composed
/// along the first inheritance path that reaches `sup`.
pub fn path_substitution(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> Option<Substitution> {
    if sub == sup {
        return Some(Substitution::new());
    }
    let mut found = None;
    walk_supertypes(env, own_type(env, sub), |instance| {
        if instance.ty.def == sup {
            found = Some(Substitution::for_class_type(env, &instance.ty));
            return true;
        }
        false
    });
    found
}

/// Return `ty` viewed as `target` by walking the supertype graph and applying type argument
/// substitution along the way.
///
/// Example: `ArrayList<String>` instantiated as `List` returns `List<String>`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<Type> {
        match ty {
            Type::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(Type::class(target, vec![]));
                }
                None
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let found = env.type_param(*id).and_then(|tp| {
                    tp.upper_bounds
                        .iter()
                        .find_map(|bound| inner(env, bound, target, seen_type_vars))
                });
                seen_type_vars.remove(id);
                found
            }
            Type::Class(class_ty) => {
                if class_ty.def == target {
                    return Some(ty.clone());
                }
                let mut found = None;
                walk_supertypes(env, class_ty.clone(), |instance| {
                    if instance.ty.def == target {
                        found = Some(Type::Class(instance.ty.clone()));
                        return true;
                    }
                    false
                });
                found
            }
            _ => None,
        }
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

/// Supertype instantiations of every class in a store, computed once and shared read-only.
///
/// Lookups are keyed by declaration id; classes added to the store after the table was built have
/// no entries.
#[derive(Clone, Debug, Default)]
pub struct SupertypeTable {
    entries: Vec<Vec<SupertypeInstance>>,
}

impl SupertypeTable {
    pub fn build(store: &TypeStore) -> Self {
        let entries = store
            .class_ids()
            .map(|id| supertype_instances(store, id))
            .collect();
        Self { entries }
    }

    pub fn instances(&self, class: ClassId) -> &[SupertypeInstance] {
        self.entries
            .get(class.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reflexive declaration-level subtyping: `sub == sup` or `sup` is reachable from `sub`.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup
            || self
                .instances(sub)
                .iter()
                .any(|instance| instance.ty.def == sup)
    }

    /// Every distinct instantiation of `decl` reachable from `sub`.
    pub fn instantiations_of(
        &self,
        sub: ClassId,
        decl: ClassId,
    ) -> impl Iterator<Item = &SupertypeInstance> + '_ {
        self.instances(sub)
            .iter()
            .filter(move |instance| instance.ty.def == decl)
    }
}
