use nova_types::{
    instantiate_as_supertype, raw_reference, supertype_instances, ClassDef, ClassId, ClassKind,
    SupertypeTable, Type, TypeEnv, TypeStore, TypeVarId, MAX_SUPERTYPE_DEPTH,
};
use pretty_assertions::assert_eq;

fn class(env: &mut TypeStore, name: &str, super_class: Type, interfaces: Vec<Type>) -> ClassId {
    env.add_class(ClassDef {
        name: name.to_string(),
        super_class: Some(super_class),
        interfaces,
        ..ClassDef::default()
    })
}

fn interface(
    env: &mut TypeStore,
    name: &str,
    type_params: Vec<TypeVarId>,
    interfaces: Vec<Type>,
) -> ClassId {
    env.add_class(ClassDef {
        name: name.to_string(),
        kind: ClassKind::Interface,
        is_abstract: true,
        type_params,
        interfaces,
        ..ClassDef::default()
    })
}

fn defs(env: &TypeStore, class: ClassId) -> Vec<String> {
    supertype_instances(env, class)
        .iter()
        .map(|instance| {
            env.class(instance.ty.def)
                .expect("known class")
                .simple_name()
                .to_string()
        })
        .collect()
}

#[test]
fn superclass_comes_before_interfaces_in_declaration_order() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);

    let i = interface(&mut env, "p.I", vec![], vec![]);
    let j = interface(&mut env, "p.J", vec![], vec![]);
    let a = class(&mut env, "p.A", object, vec![]);
    let b = class(&mut env, "p.B", Type::class(a, vec![]), vec![]);
    let c = class(
        &mut env,
        "p.C",
        Type::class(b, vec![]),
        vec![Type::class(i, vec![]), Type::class(j, vec![])],
    );

    assert_eq!(defs(&env, c), vec!["B", "I", "J", "A", "Object"]);
}

#[test]
fn diamond_records_each_distinct_instantiation() {
    let mut env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let object = Type::class(wk.object, vec![]);
    let string = Type::class(wk.string, vec![]);
    let integer = Type::class(wk.integer, vec![]);

    let t = env.add_type_param("T", vec![]);
    let i = interface(&mut env, "p.I", vec![t], vec![]);
    let j = interface(&mut env, "p.J", vec![], vec![Type::class(i, vec![string.clone()])]);
    let k = interface(&mut env, "p.K", vec![], vec![Type::class(i, vec![integer.clone()])]);
    let same = interface(&mut env, "p.Same", vec![], vec![Type::class(i, vec![string.clone()])]);
    let c = class(
        &mut env,
        "p.C",
        object.clone(),
        vec![Type::class(j, vec![]), Type::class(k, vec![])],
    );
    let d = class(
        &mut env,
        "p.D",
        object,
        vec![Type::class(j, vec![]), Type::class(same, vec![])],
    );

    let table = SupertypeTable::build(&env);
    let reached: Vec<Type> = table
        .instantiations_of(c, i)
        .map(|instance| Type::Class(instance.ty.clone()))
        .collect();
    assert_eq!(
        reached,
        vec![Type::class(i, vec![string.clone()]), Type::class(i, vec![integer])]
    );
    assert_eq!(table.instantiations_of(d, i).count(), 1);
    assert!(table.is_subclass(c, i));
    assert!(table.is_subclass(c, c));
    assert!(!table.is_subclass(i, c));
}

#[test]
fn raw_edges_make_everything_above_raw() {
    let mut env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let object = Type::class(wk.object, vec![]);

    // interface Box<T> extends List<T> {}  class C implements Box {}
    let t = env.add_type_param("T", vec![]);
    let boxed = interface(
        &mut env,
        "p.Box",
        vec![t],
        vec![Type::class(wk.list, vec![Type::TypeVar(t)])],
    );
    let raw_box = Type::class(boxed, vec![]);
    let c = class(&mut env, "p.C", object, vec![raw_box.clone()]);

    let instances = supertype_instances(&env, c);
    let list = instances
        .iter()
        .find(|instance| instance.ty.def == wk.list)
        .expect("List is reachable");
    assert!(list.raw);
    assert!(list.ty.args.is_empty());
    assert_eq!(raw_reference(&env, &raw_box), Some(boxed));
}

#[test]
fn instantiate_as_supertype_substitutes_along_the_path() {
    let mut env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let string = Type::class(wk.string, vec![]);

    let t = env.add_type_param("T", vec![]);
    let boxed = interface(
        &mut env,
        "p.Box",
        vec![t],
        vec![Type::class(wk.list, vec![Type::TypeVar(t)])],
    );

    assert_eq!(
        instantiate_as_supertype(&env, &Type::class(boxed, vec![string.clone()]), wk.list),
        Some(Type::class(wk.list, vec![string]))
    );
    assert_eq!(
        instantiate_as_supertype(&env, &Type::array(Type::int()), wk.cloneable),
        Some(Type::class(wk.cloneable, vec![]))
    );
    assert_eq!(
        instantiate_as_supertype(&env, &Type::class(wk.string, vec![]), wk.list),
        None
    );
}

#[test]
fn deep_hierarchies_are_cut_at_the_depth_ceiling() {
    let mut env = TypeStore::with_minimal_jdk();
    let mut parent = Type::class(env.well_known().object, vec![]);
    let mut leaf = env.well_known().object;
    for idx in (0..MAX_SUPERTYPE_DEPTH + 20).rev() {
        leaf = class(&mut env, &format!("deep.C{idx}"), parent, vec![]);
        parent = Type::class(leaf, vec![]);
    }

    let instances = supertype_instances(&env, leaf);
    assert_eq!(instances.len(), MAX_SUPERTYPE_DEPTH);
    assert!(instances
        .iter()
        .all(|instance| instance.depth <= MAX_SUPERTYPE_DEPTH));
}
