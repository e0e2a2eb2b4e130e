use std::collections::HashMap;

use crate::{erase_to_type, ClassType, Type, TypeEnv, TypeVarId, WildcardBound};

/// A mapping from type variables to types.
///
/// Application is a single structural pass: the replacement types are not revisited, so a
/// substitution whose range mentions its own domain (`T -> List<T>`) still terminates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<TypeVarId, Type>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (TypeVarId, Type)>) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    /// Substitution from the formals of `ty`'s declaration to `ty`'s arguments.
    ///
    /// A raw reference maps every formal to its erasure, which is how members of a raw type are
    /// seen (JLS 4.8).
    pub fn for_class_type(env: &dyn TypeEnv, ty: &ClassType) -> Self {
        let Some(class_def) = env.class(ty.def) else {
            return Self::new();
        };

        let mut map = HashMap::with_capacity(class_def.type_params.len());
        if ty.args.is_empty() {
            for formal in &class_def.type_params {
                map.insert(*formal, erase_to_type(env, &Type::TypeVar(*formal)));
            }
        } else {
            for (formal, arg) in class_def.type_params.iter().zip(&ty.args) {
                map.insert(*formal, arg.clone());
            }
        }
        Self { map }
    }

    pub fn insert(&mut self, var: TypeVarId, ty: Type) {
        self.map.insert(var, ty);
    }

    pub fn get(&self, var: TypeVarId) -> Option<&Type> {
        self.map.get(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn apply(&self, ty: &Type) -> Type {
        if self.map.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::TypeVar(id) => self.map.get(id).cloned().unwrap_or_else(|| ty.clone()),
            Type::Class(ClassType { def, args }) => {
                Type::class(*def, args.iter().map(|arg| self.apply(arg)).collect())
            }
            Type::Array(elem) => Type::Array(Box::new(self.apply(elem))),
            Type::Wildcard(WildcardBound::Extends(upper)) => {
                Type::Wildcard(WildcardBound::Extends(Box::new(self.apply(upper))))
            }
            Type::Wildcard(WildcardBound::Super(lower)) => {
                Type::Wildcard(WildcardBound::Super(Box::new(self.apply(lower))))
            }
            _ => ty.clone(),
        }
    }

    pub fn apply_all(&self, tys: &[Type]) -> Vec<Type> {
        tys.iter().map(|ty| self.apply(ty)).collect()
    }

    pub fn apply_class(&self, ty: &ClassType) -> ClassType {
        ClassType {
            def: ty.def,
            args: self.apply_all(&ty.args),
        }
    }

    /// Compose: the result applied to `t` equals `next.apply(&self.apply(t))`.
    #[must_use]
    pub fn then(&self, next: &Substitution) -> Substitution {
        let mut map: HashMap<TypeVarId, Type> = self
            .map
            .iter()
            .map(|(var, ty)| (*var, next.apply(ty)))
            .collect();
        for (var, ty) in &next.map {
            map.entry(*var).or_insert_with(|| ty.clone());
        }
        Substitution { map }
    }
}
