use std::collections::HashMap;

use crate::{
    ClassDef, ClassId, ClassKind, MethodDef, Type, TypeEnv, TypeParamDef, TypeVarId, Visibility,
};

/// Ids of the handful of JDK declarations the verifier reasons about directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub integer: ClassId,
    pub comparable: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub error: ClassId,
    pub io_exception: ClassId,
    pub clone_not_supported: ClassId,
    pub list: ClassId,
}

/// Arena-backed [`TypeEnv`] built once by the binder and read-only afterwards.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store seeded with the minimal slice of `java.lang`/`java.util`/`java.io` needed to
    /// verify user declarations: `Object` with its overridable members, the throwable hierarchy,
    /// and a few generic library types.
    pub fn with_minimal_jdk() -> Self {
        let mut store = Self {
            classes: Vec::new(),
            type_params: Vec::new(),
            by_name: HashMap::new(),
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                integer: ClassId(0),
                comparable: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
                throwable: ClassId(0),
                exception: ClassId(0),
                runtime_exception: ClassId(0),
                error: ClassId(0),
                io_exception: ClassId(0),
                clone_not_supported: ClassId(0),
                list: ClassId(0),
            },
        };

        let object = store.intern_class_id("java.lang.Object");
        let string = store.intern_class_id("java.lang.String");
        let number = store.intern_class_id("java.lang.Number");
        let integer = store.intern_class_id("java.lang.Integer");
        let comparable = store.intern_class_id("java.lang.Comparable");
        let cloneable = store.intern_class_id("java.lang.Cloneable");
        let serializable = store.intern_class_id("java.io.Serializable");
        let throwable = store.intern_class_id("java.lang.Throwable");
        let exception = store.intern_class_id("java.lang.Exception");
        let runtime_exception = store.intern_class_id("java.lang.RuntimeException");
        let error = store.intern_class_id("java.lang.Error");
        let io_exception = store.intern_class_id("java.io.IOException");
        let clone_not_supported = store.intern_class_id("java.lang.CloneNotSupportedException");
        let list = store.intern_class_id("java.util.List");

        store.well_known = WellKnownTypes {
            object,
            string,
            number,
            integer,
            comparable,
            cloneable,
            serializable,
            throwable,
            exception,
            runtime_exception,
            error,
            io_exception,
            clone_not_supported,
            list,
        };

        let object_ty = Type::class(object, vec![]);
        let string_ty = Type::class(string, vec![]);

        store.define_class(
            object,
            ClassDef {
                name: "java.lang.Object".to_string(),
                super_class: None,
                methods: vec![
                    MethodDef::new("equals", vec![object_ty.clone()], Type::boolean()),
                    MethodDef::new("hashCode", vec![], Type::int()),
                    MethodDef::new("toString", vec![], string_ty.clone()),
                    MethodDef {
                        visibility: Visibility::Protected,
                        throws: vec![Type::class(clone_not_supported, vec![])],
                        ..MethodDef::new("clone", vec![], object_ty.clone())
                    },
                ],
                ..ClassDef::default()
            },
        );

        for (id, name) in [
            (cloneable, "java.lang.Cloneable"),
            (serializable, "java.io.Serializable"),
        ] {
            store.define_class(
                id,
                ClassDef {
                    name: name.to_string(),
                    kind: ClassKind::Interface,
                    is_abstract: true,
                    ..ClassDef::default()
                },
            );
        }

        // interface Comparable<T> { int compareTo(T o); }
        let comparable_t = store.add_type_param("T", vec![object_ty.clone()]);
        store.define_class(
            comparable,
            ClassDef {
                name: "java.lang.Comparable".to_string(),
                kind: ClassKind::Interface,
                is_abstract: true,
                type_params: vec![comparable_t],
                methods: vec![MethodDef {
                    is_abstract: true,
                    ..MethodDef::new("compareTo", vec![Type::TypeVar(comparable_t)], Type::int())
                }],
                ..ClassDef::default()
            },
        );

        store.define_class(
            string,
            ClassDef {
                name: "java.lang.String".to_string(),
                is_final: true,
                super_class: Some(object_ty.clone()),
                interfaces: vec![
                    Type::class(serializable, vec![]),
                    Type::class(comparable, vec![string_ty.clone()]),
                ],
                methods: vec![MethodDef::new(
                    "compareTo",
                    vec![string_ty.clone()],
                    Type::int(),
                )],
                ..ClassDef::default()
            },
        );

        store.define_class(
            number,
            ClassDef {
                name: "java.lang.Number".to_string(),
                is_abstract: true,
                super_class: Some(object_ty.clone()),
                interfaces: vec![Type::class(serializable, vec![])],
                methods: vec![MethodDef {
                    is_abstract: true,
                    ..MethodDef::new("intValue", vec![], Type::int())
                }],
                ..ClassDef::default()
            },
        );

        let integer_ty = Type::class(integer, vec![]);
        store.define_class(
            integer,
            ClassDef {
                name: "java.lang.Integer".to_string(),
                is_final: true,
                super_class: Some(Type::class(number, vec![])),
                interfaces: vec![Type::class(comparable, vec![integer_ty.clone()])],
                methods: vec![
                    MethodDef::new("intValue", vec![], Type::int()),
                    MethodDef::new("compareTo", vec![integer_ty], Type::int()),
                ],
                ..ClassDef::default()
            },
        );

        store.define_class(
            throwable,
            ClassDef {
                name: "java.lang.Throwable".to_string(),
                super_class: Some(object_ty.clone()),
                interfaces: vec![Type::class(serializable, vec![])],
                ..ClassDef::default()
            },
        );
        for (id, name, parent) in [
            (exception, "java.lang.Exception", throwable),
            (runtime_exception, "java.lang.RuntimeException", exception),
            (error, "java.lang.Error", throwable),
            (io_exception, "java.io.IOException", exception),
            (
                clone_not_supported,
                "java.lang.CloneNotSupportedException",
                exception,
            ),
        ] {
            store.define_class(
                id,
                ClassDef {
                    name: name.to_string(),
                    super_class: Some(Type::class(parent, vec![])),
                    ..ClassDef::default()
                },
            );
        }

        // interface List<E> { boolean add(E e); E get(int index); int size(); }
        let list_e = store.add_type_param("E", vec![object_ty]);
        store.define_class(
            list,
            ClassDef {
                name: "java.util.List".to_string(),
                kind: ClassKind::Interface,
                is_abstract: true,
                type_params: vec![list_e],
                methods: vec![
                    MethodDef {
                        is_abstract: true,
                        ..MethodDef::new("add", vec![Type::TypeVar(list_e)], Type::boolean())
                    },
                    MethodDef {
                        is_abstract: true,
                        ..MethodDef::new("get", vec![Type::int()], Type::TypeVar(list_e))
                    },
                    MethodDef {
                        is_abstract: true,
                        ..MethodDef::new("size", vec![], Type::int())
                    },
                ],
                ..ClassDef::default()
            },
        );

        store
    }

    /// Return the id for `name`, allocating a placeholder declaration if it is not known yet.
    ///
    /// Placeholders let callers build mutually referencing declarations (`A` mentioning `B` in a
    /// signature and vice versa) before defining either of them with [`TypeStore::define_class`].
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef {
            name: name.to_string(),
            ..ClassDef::default()
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Replace the declaration stored at `id`.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let Some(slot) = self.classes.get_mut(id.index()) else {
            return;
        };
        if slot.name != def.name {
            self.by_name.remove(&slot.name);
            self.by_name.insert(def.name.clone(), id);
        }
        *slot = def;
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_type_param(
        &mut self,
        name: impl Into<String>,
        upper_bounds: Vec<Type>,
    ) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
        });
        id
    }

    /// Set the bounds of an already allocated variable, e.g. for `<T extends Comparable<T>>`.
    pub fn set_type_param_bounds(&mut self, id: TypeVarId, upper_bounds: Vec<Type>) {
        if let Some(def) = self.type_params.get_mut(id.index()) {
            def.upper_bounds = upper_bounds;
        }
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// All class ids in allocation (declaration) order.
    pub fn class_ids(&self) -> impl ExactSizeIterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|idx| ClassId(idx as u32))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
