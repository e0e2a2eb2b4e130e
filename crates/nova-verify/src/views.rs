use nova_types::{
    erase, erase_params, erase_to_type, is_well_formed, ClassDef, ClassId, ClassKind, ClassType,
    ErasedType, MethodDef, MethodId, Substitution, SupertypeInstance, SupertypeTable, Type,
    TypeEnv, TypeVarId, Visibility,
};

/// A method as seen from the type being verified: the declaring type's arguments (as supplied along
/// the inheritance path) are applied to its signature.
///
/// Views are derived data. They are rebuilt for every verified type and never mutated.
#[derive(Clone, Debug)]
pub struct InheritedMethodView<'env> {
    pub id: MethodId,
    pub def: &'env MethodDef,
    pub owner: &'env ClassDef,
    /// Instantiation of the declaring type in the verified type's basis.
    pub declaring_type: ClassType,
    /// Seen through a raw supertype: the whole signature is erased.
    pub raw: bool,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub type_params: Vec<TypeVarId>,
    /// Upper bounds of `type_params`, with the declaring type's arguments applied.
    pub type_param_bounds: Vec<Vec<Type>>,
    /// Erasure of the parameter list as declared, independent of the instantiation.
    pub declared_erasure: Vec<ErasedType>,
    pub declared_return_erasure: ErasedType,
    /// False when any part of the signature is unresolved; such views take part in no relation.
    pub well_formed: bool,
}

impl<'env> InheritedMethodView<'env> {
    fn new(
        env: &'env dyn TypeEnv,
        id: MethodId,
        def: &'env MethodDef,
        owner: &'env ClassDef,
        declaring_type: ClassType,
        raw: bool,
    ) -> Self {
        let well_formed = def
            .params
            .iter()
            .chain(std::iter::once(&def.return_type))
            .chain(def.throws.iter())
            .all(|ty| is_well_formed(env, ty))
            && declaring_type.args.iter().all(|ty| is_well_formed(env, ty));

        let (params, return_type, throws, type_params, type_param_bounds) = if raw {
            (
                def.params.iter().map(|p| erase_to_type(env, p)).collect(),
                erase_to_type(env, &def.return_type),
                def.throws.iter().map(|t| erase_to_type(env, t)).collect(),
                Vec::new(),
                Vec::new(),
            )
        } else {
            let subst = Substitution::for_class_type(env, &declaring_type);
            let bounds = def
                .type_params
                .iter()
                .map(|var| {
                    env.type_param(*var)
                        .map(|param| subst.apply_all(&param.upper_bounds))
                        .unwrap_or_default()
                })
                .collect();
            (
                subst.apply_all(&def.params),
                subst.apply(&def.return_type),
                subst.apply_all(&def.throws),
                def.type_params.clone(),
                bounds,
            )
        };

        Self {
            id,
            def,
            owner,
            declaring_type,
            raw,
            params,
            return_type,
            throws,
            type_params,
            type_param_bounds,
            declared_erasure: erase_params(env, &def.params),
            declared_return_erasure: erase(env, &def.return_type),
            well_formed,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn owner_id(&self) -> ClassId {
        self.id.class
    }

    pub fn is_static(&self) -> bool {
        self.def.is_static
    }

    /// Declared `abstract`, or an instance method of an interface.
    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract || (self.from_interface() && !self.def.is_static)
    }

    pub fn from_interface(&self) -> bool {
        self.owner.kind == ClassKind::Interface
    }

    /// A concrete instance method declared by a class.
    pub fn is_concrete_class_method(&self) -> bool {
        !self.def.is_abstract && !self.def.is_static && !self.from_interface()
    }

    /// Both views were already inherited together by a proper supertype of `class`.
    pub fn combines_with(
        &self,
        other: &InheritedMethodView<'_>,
        env: &dyn TypeEnv,
        supertypes: &SupertypeTable,
        class: ClassId,
    ) -> bool {
        combined_by_supertype(
            env,
            supertypes,
            class,
            (&self.declaring_type, self.raw),
            (&other.declaring_type, other.raw),
        )
    }

    /// Erased name, parameters and return type: the shape the runtime dispatches on.
    pub fn erased_signature(&self) -> (&str, &[ErasedType], &ErasedType) {
        (
            self.name(),
            &self.declared_erasure,
            &self.declared_return_erasure,
        )
    }
}

/// The methods visible in one type: its own declarations plus every inherited member of every
/// supertype instantiation, in supertype declaration order.
#[derive(Debug)]
pub struct MethodTable<'env> {
    pub own: Vec<InheritedMethodView<'env>>,
    pub inherited: Vec<InheritedMethodView<'env>>,
}

impl<'env> MethodTable<'env> {
    pub fn collect(
        env: &'env dyn TypeEnv,
        table: &SupertypeTable,
        class_id: ClassId,
        class: &'env ClassDef,
    ) -> Self {
        let own_type = nova_types::own_type(env, class_id);
        let own = class
            .method_ids(class_id)
            .zip(&class.methods)
            .map(|(id, def)| InheritedMethodView::new(env, id, def, class, own_type.clone(), false))
            .collect();

        let mut inherited = Vec::new();
        for instance in table.instances(class_id) {
            let Some(owner) = env.class(instance.ty.def) else {
                continue;
            };
            for (id, def) in owner.method_ids(instance.ty.def).zip(&owner.methods) {
                if !is_inherited(class, owner, def) {
                    continue;
                }
                inherited.push(InheritedMethodView::new(
                    env,
                    id,
                    def,
                    owner,
                    instance.ty.clone(),
                    instance.raw,
                ));
            }
        }

        Self { own, inherited }
    }
}

/// Member inheritance (JLS 8.4.8): private members never are, static interface methods are not,
/// and package-private members only within the same package.
fn is_inherited(class: &ClassDef, owner: &ClassDef, method: &MethodDef) -> bool {
    match method.visibility {
        Visibility::Private => false,
        _ if method.is_static && owner.kind == ClassKind::Interface => false,
        Visibility::Package => class.package() == owner.package(),
        Visibility::Protected | Visibility::Public => true,
    }
}

/// Whether the supertype instance `via` reaches the instantiation `decl` (expressed in the verified
/// type's basis). Raw paths compare declarations only.
fn reaches(
    env: &dyn TypeEnv,
    supertypes: &SupertypeTable,
    via: &SupertypeInstance,
    decl: &ClassType,
    raw: bool,
) -> bool {
    if via.ty.def == decl.def {
        return via.ty == *decl || (via.raw && raw);
    }
    let subst = (!via.raw).then(|| Substitution::for_class_type(env, &via.ty));
    supertypes
        .instantiations_of(via.ty.def, decl.def)
        .any(|above| match &subst {
            _ if above.raw || via.raw => raw,
            Some(subst) => subst.apply_class(&above.ty) == *decl,
            None => false,
        })
}

/// A proper supertype of `class` that already inherits both instantiations. Pairwise checks
/// between inherited members are reported only against the first type that combines them.
pub fn combined_by_supertype(
    env: &dyn TypeEnv,
    supertypes: &SupertypeTable,
    class: ClassId,
    a: (&ClassType, bool),
    b: (&ClassType, bool),
) -> bool {
    supertypes.instances(class).iter().any(|via| {
        reaches(env, supertypes, via, a.0, a.1) && reaches(env, supertypes, via, b.0, b.1)
    })
}
