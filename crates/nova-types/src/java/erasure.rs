use serde::{Deserialize, Serialize};

use crate::{ClassId, ClassType, MethodDef, PrimitiveType, Type, TypeEnv, TypeVarId, WildcardBound};

/// Longest chain of variable-to-variable bounds followed before giving up on a variable and
/// erasing it to `Object`.
const MAX_BOUND_DEPTH: usize = 32;

/// The runtime (erased) form of a type (JLS 4.6).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErasedType {
    Void,
    Primitive(PrimitiveType),
    Class(ClassId),
    Array(Box<ErasedType>),
    Error,
}

impl ErasedType {
    /// The erased type expressed back as a (raw) [`Type`].
    pub fn to_type(&self) -> Type {
        match self {
            ErasedType::Void => Type::Void,
            ErasedType::Primitive(p) => Type::Primitive(*p),
            ErasedType::Class(def) => Type::class(*def, vec![]),
            ErasedType::Array(elem) => Type::Array(Box::new(elem.to_type())),
            ErasedType::Error => Type::Error,
        }
    }
}

/// Erase `ty`: parameterized references lose their arguments and type variables become the
/// erasure of their leftmost bound (or `Object`).
pub fn erase(env: &dyn TypeEnv, ty: &Type) -> ErasedType {
    let mut visiting = Vec::new();
    erase_inner(env, ty, &mut visiting)
}

fn erase_inner(env: &dyn TypeEnv, ty: &Type, visiting: &mut Vec<TypeVarId>) -> ErasedType {
    let object = env.well_known().object;
    match ty {
        Type::Void => ErasedType::Void,
        Type::Primitive(p) => ErasedType::Primitive(*p),
        Type::Class(ClassType { def, .. }) => ErasedType::Class(*def),
        Type::Array(elem) => ErasedType::Array(Box::new(erase_inner(env, elem, visiting))),
        Type::TypeVar(id) => {
            if visiting.contains(id) || visiting.len() >= MAX_BOUND_DEPTH {
                tracing::debug!(
                    target: "nova.types",
                    var = id.to_raw(),
                    "type variable bound chain has no class anchor; erasing to Object"
                );
                return ErasedType::Class(object);
            }
            let Some(param) = env.type_param(*id) else {
                return ErasedType::Error;
            };
            let Some(first) = param.upper_bounds.first() else {
                return ErasedType::Class(object);
            };
            visiting.push(*id);
            let erased = erase_inner(env, first, visiting);
            visiting.pop();
            erased
        }
        Type::Wildcard(WildcardBound::Extends(upper)) => erase_inner(env, upper, visiting),
        Type::Wildcard(_) => ErasedType::Class(object),
        Type::Error => ErasedType::Error,
    }
}

pub fn erase_to_type(env: &dyn TypeEnv, ty: &Type) -> Type {
    erase(env, ty).to_type()
}

pub fn erase_params(env: &dyn TypeEnv, params: &[Type]) -> Vec<ErasedType> {
    params.iter().map(|p| erase(env, p)).collect()
}

/// Erasure of a declared method signature. Only the parameter list takes part in clash
/// comparisons; the return type is kept for bridge planning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodErasure {
    pub name: String,
    pub params: Vec<ErasedType>,
    pub return_type: ErasedType,
}

pub fn erase_method(env: &dyn TypeEnv, method: &MethodDef) -> MethodErasure {
    MethodErasure {
        name: method.name.clone(),
        params: erase_params(env, &method.params),
        return_type: erase(env, &method.return_type),
    }
}
