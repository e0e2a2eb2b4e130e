use nova_types::{
    format_class_decl, format_method, format_type, MethodDef, Type, TypeEnv, TypeStore,
    WildcardBound,
};
use pretty_assertions::assert_eq;

#[test]
fn types_render_with_simple_names() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let number = Type::class(wk.number, vec![]);
    let wildcard_list = Type::class(
        wk.list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(number)))],
    );

    assert_eq!(format_type(&env, &wildcard_list), "List<? extends Number>");
    assert_eq!(format_type(&env, &Type::array(Type::int())), "int[]");
    assert_eq!(format_type(&env, &Type::Error), "<error>");
    assert_eq!(format_class_decl(&env, wk.comparable), "Comparable<T>");
}

#[test]
fn varargs_parameter_renders_with_ellipsis() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let method = MethodDef {
        is_varargs: true,
        ..MethodDef::new(
            "format",
            vec![
                Type::class(wk.string, vec![]),
                Type::array(Type::class(wk.object, vec![])),
            ],
            Type::class(wk.string, vec![]),
        )
    };

    assert_eq!(format_method(&env, &method), "format(String, Object...)");
}
