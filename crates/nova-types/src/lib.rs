//! Shared Java type model used across Nova crates.
//!
//! Classes, type parameters and methods live in arenas inside [`TypeStore`] and are addressed by
//! small integer ids. Bounds such as `<T extends Comparable<T>>` therefore refer back to their own
//! variable through a [`TypeVarId`] instead of a structural pointer, which keeps the bound graph
//! cyclic-by-index while the store itself stays a plain tree of owned data.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod java;
mod store;

pub use java::erasure::{
    erase, erase_method, erase_params, erase_to_type, ErasedType, MethodErasure,
};
pub use java::format::{format_class_decl, format_method, format_type};
pub use java::helpers::{
    instantiate_as_supertype, own_type, path_substitution, supertype_instances, SupertypeInstance,
    SupertypeTable, MAX_SUPERTYPE_DEPTH,
};
pub use java::subst::Substitution;
pub use java::subtyping::{
    is_checked_exception, is_subtype, is_subtype_checked, is_unchecked_subtype, MAX_SUBTYPE_DEPTH,
};
pub use store::{TypeStore, WellKnownTypes};

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A method declaration, addressed by its declaring class and its position in
/// [`ClassDef::methods`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    pub class: ClassId,
    pub index: u32,
}

impl MethodId {
    pub const fn new(class: ClassId, index: u32) -> Self {
        Self { class, index }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    /// Type arguments. Empty on a generic declaration means a raw reference.
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A resolved type reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Class(ClassType),
    TypeVar(TypeVarId),
    Array(Box<Type>),
    Wildcard(WildcardBound),
    /// Sentinel for references the binder could not resolve. Its erasure is itself.
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn boolean() -> Type {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> Type {
        Type::Primitive(PrimitiveType::Long)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::TypeVar(_) | Type::Array(_) | Type::Wildcard(_)
        )
    }

    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error => true,
            Type::Class(ClassType { args, .. }) => args.iter().any(Type::contains_error),
            Type::Array(elem) => elem.contains_error(),
            Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
                b.contains_error()
            }
            _ => false,
        }
    }

    pub fn mentions_type_var(&self, var: TypeVarId) -> bool {
        match self {
            Type::TypeVar(id) => *id == var,
            Type::Class(ClassType { args, .. }) => args.iter().any(|a| a.mentions_type_var(var)),
            Type::Array(elem) => elem.mentions_type_var(var),
            Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
                b.mentions_type_var(var)
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

/// Access level, ordered from most to least restrictive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    #[default]
    Public,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Package => "package-private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    /// Declared bounds. The first entry drives erasure; an empty list means `Object`.
    pub upper_bounds: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    /// The last parameter is declared with `...`.
    pub is_varargs: bool,
    pub is_synchronized: bool,
    pub has_override_annotation: bool,
    /// The body contains a `super.<name>(...)` invocation.
    pub calls_super: bool,
    pub name_span: Option<Span>,
    pub params_span: Option<Span>,
}

impl Default for MethodDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: Type::Void,
            throws: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            is_varargs: false,
            is_synchronized: false,
            has_override_annotation: false,
            calls_super: false,
            name_span: None,
            params_span: None,
        }
    }
}

impl MethodDef {
    pub fn new(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `com.example.Foo`.
    pub name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_final: bool,
    pub type_params: Vec<TypeVarId>,
    /// `None` only for `java.lang.Object` and interfaces.
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<MethodDef>,
    pub name_span: Option<Span>,
}

impl ClassDef {
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// A class that must provide an implementation for every inherited abstract method.
    pub fn is_concrete(&self) -> bool {
        !self.is_interface() && !self.is_abstract
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn package(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }

    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }

    pub fn method_ids(&self, id: ClassId) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len()).map(move |idx| MethodId::new(id, idx as u32))
    }
}

/// Read-only view of a resolved type graph.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    fn method(&self, id: MethodId) -> Option<&MethodDef> {
        self.class(id.class)?.methods.get(id.index as usize)
    }
}

/// Returns `false` when `ty` contains the error sentinel, refers to an unknown declaration or
/// variable, or applies the wrong number of type arguments to a generic declaration.
pub fn is_well_formed(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::Error => false,
        Type::Void | Type::Primitive(_) => true,
        Type::TypeVar(id) => env.type_param(*id).is_some(),
        Type::Array(elem) => is_well_formed(env, elem),
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
            is_well_formed(env, b)
        }
        Type::Class(ClassType { def, args }) => {
            let Some(class_def) = env.class(*def) else {
                return false;
            };
            if !args.is_empty() && args.len() != class_def.type_params.len() {
                return false;
            }
            args.iter().all(|arg| is_well_formed(env, arg))
        }
    }
}

/// The first generic declaration `ty` mentions without type arguments, if any.
pub fn raw_reference(env: &dyn TypeEnv, ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Class(ClassType { def, args }) => {
            if args.is_empty() {
                return env
                    .class(*def)
                    .is_some_and(ClassDef::is_generic)
                    .then_some(*def);
            }
            args.iter().find_map(|arg| raw_reference(env, arg))
        }
        Type::Array(elem) => raw_reference(env, elem),
        Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
            raw_reference(env, b)
        }
        _ => None,
    }
}
