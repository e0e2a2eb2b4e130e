//! Java-like rendering of types and signatures for diagnostics.
//!
//! Declarations are printed by simple name (`List<String>`, not `java.util.List<java.lang.String>`)
//! to match what javac and ECJ show in method-verification messages.

use crate::{ClassId, ClassType, MethodDef, Type, TypeEnv, WildcardBound};

pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, &mut out);
    out
}

fn write_type(env: &dyn TypeEnv, ty: &Type, out: &mut String) {
    match ty {
        Type::Void => out.push_str("void"),
        Type::Primitive(p) => out.push_str(p.name()),
        Type::Class(ClassType { def, args }) => {
            match env.class(*def) {
                Some(class_def) => out.push_str(class_def.simple_name()),
                None => out.push_str("<unknown>"),
            }
            if !args.is_empty() {
                out.push('<');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    write_type(env, arg, out);
                }
                out.push('>');
            }
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(param) => out.push_str(&param.name),
            None => out.push_str("<unknown>"),
        },
        Type::Array(elem) => {
            write_type(env, elem, out);
            out.push_str("[]");
        }
        Type::Wildcard(WildcardBound::Unbounded) => out.push('?'),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            out.push_str("? extends ");
            write_type(env, upper, out);
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            out.push_str("? super ");
            write_type(env, lower, out);
        }
        Type::Error => out.push_str("<error>"),
    }
}

/// `foo(T, int...)`: the name and declared parameter list of `method`.
pub fn format_method(env: &dyn TypeEnv, method: &MethodDef) -> String {
    let mut out = String::new();
    out.push_str(&method.name);
    out.push('(');
    let last = method.params.len().saturating_sub(1);
    for (idx, param) in method.params.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        match param {
            Type::Array(elem) if method.is_varargs && idx == last => {
                write_type(env, elem, &mut out);
                out.push_str("...");
            }
            _ => write_type(env, param, &mut out),
        }
    }
    out.push(')');
    out
}

/// `Y<T>`: a declaration with its own type parameters.
pub fn format_class_decl(env: &dyn TypeEnv, class: ClassId) -> String {
    let Some(class_def) = env.class(class) else {
        return "<unknown>".to_string();
    };
    let args = class_def
        .type_params
        .iter()
        .map(|tp| Type::TypeVar(*tp))
        .collect();
    format_type(env, &Type::class(class, args))
}
