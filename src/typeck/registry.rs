use std::collections::{BTreeMap, HashMap};

use crate::ast::{ExprId, FunctionId};
use crate::span::Span;

use super::generics::{CellOrigin, GenericCells};
use super::types::*;

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldSignature {
    pub name: String,
    pub span: Span,
    pub ty: Type,
    pub is_pub: bool,
    pub is_mut: bool,
    pub is_static: bool,
    /// Position among the fields of the owning class or variant.
    pub index: u32,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone)]
pub struct ClassSignature {
    pub id: ClassId,
    pub name: String,
    pub span: Span,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<FieldSignature>,
    pub functions: Vec<FnSigId>,
    pub builtin: bool,
}

impl ClassSignature {
    pub fn field(&self, name: &str) -> Option<&FieldSignature> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum VariantKind {
    Unit,
    /// Tuple variants are constructed by calling `create`.
    Tuple { members: Vec<Type>, create: FnSigId },
    Class { fields: Vec<FieldSignature> },
}


#[derive(Debug, Clone)]
pub struct VariantSignature {
    pub name: String,
    pub span: Span,
    pub kind: VariantKind,
}

#[derive(Debug, Clone)]
pub struct UnionSignature {
    pub id: UnionId,
    pub name: String,
    pub span: Span,
    pub type_params: Vec<TypeParam>,
    pub variants: Vec<VariantSignature>,
    pub functions: Vec<FnSigId>,
    pub builtin: bool,
}

impl UnionSignature {
    pub fn variant(&self, name: &str) -> Option<(u32, &VariantSignature)> {
        self.variants
            .iter()
            .enumerate()
            .find(|(_, v)| v.name == name)
            .map(|(i, v)| (i as u32, v))
    }
}

#[derive(Debug, Clone)]
pub struct ParamSignature {
    pub name: String,
    pub span: Span,
    pub ty: Type,
    pub is_mut: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub id: FnSigId,
    pub name: String,
    pub span: Span,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<ParamSignature>,
    pub return_type: Type,
    pub is_static: bool,
    pub is_mut: bool,
    pub is_pub: bool,
    pub owner: Option<TypeOwner>,
    /// Enclosing function for local functions.
    pub parent: Option<FnSigId>,
    /// `None` for builtins and tuple-variant constructors.
    pub decl: Option<FunctionId>,
    /// Functions declared directly in the body.
    pub local_functions: Vec<FnSigId>,
    /// Every local variable declared in the body, including nested blocks
    /// and pattern bindings.
    pub locals: Vec<VariableId>,
    /// Outer variables referenced from the body or from nested local functions.
    pub captures: Vec<VariableId>,
}

impl FunctionSignature {
    pub fn new(id: FnSigId, name: impl Into<String>, span: Span) -> Self {
        Self {
            id,
            name: name.into(),
            span,
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: Type::Unknown,
            is_static: false,
            is_mut: false,
            is_pub: false,
            owner: None,
            parent: None,
            decl: None,
            local_functions: Vec::new(),
            locals: Vec::new(),
            captures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub unit: ClassId,
    pub string: ClassId,
    pub int: ClassId,
    pub bool: ClassId,
    pub never: ClassId,
    pub result: UnionId,
    pub result_ok: FnSigId,
    pub result_error: FnSigId,
    pub printf: FnSigId,
}

/// Every class, union and function signature known to the checker.
#[derive(Debug, Clone)]
pub struct Registry {
    classes: Vec<ClassSignature>,
    unions: Vec<UnionSignature>,
    functions: Vec<FunctionSignature>,
    types_by_name: HashMap<String, TypeOwner>,
    by_decl: HashMap<FunctionId, FnSigId>,
    tuples: BTreeMap<usize, ClassId>,
    function_objects: BTreeMap<usize, ClassId>,
    pub builtins: Builtins,
}

pub const RESULT_OK: &str = "Ok";
pub const RESULT_ERROR: &str = "Error";

impl Registry {
    /// Registry seeded with the builtin types and `printf`.
    pub fn new(cells: &mut GenericCells) -> Self {
        let mut registry = Registry {
            classes: Vec::new(),
            unions: Vec::new(),
            functions: Vec::new(),
            types_by_name: HashMap::new(),
            by_decl: HashMap::new(),
            tuples: BTreeMap::new(),
            function_objects: BTreeMap::new(),
            builtins: Builtins {
                unit: ClassId(0),
                string: ClassId(0),
                int: ClassId(0),
                bool: ClassId(0),
                never: ClassId(0),
                result: UnionId(0),
                result_ok: FnSigId(0),
                result_error: FnSigId(0),
                printf: FnSigId(0),
            },
        };

        let builtin_class = |registry: &mut Registry, name: &str| {
            let id = registry.add_class(name, Span::dummy(), Vec::new());
            registry.class_mut(id).builtin = true;
            registry.types_by_name.insert(name.to_string(), TypeOwner::Class(id));
            id
        };
        registry.builtins.unit = builtin_class(&mut registry, "unit");
        registry.builtins.string = builtin_class(&mut registry, "string");
        registry.builtins.int = builtin_class(&mut registry, "int");
        registry.builtins.bool = builtin_class(&mut registry, "bool");
        registry.builtins.never = builtin_class(&mut registry, "never");

        let type_params = ["TValue", "TError"]
            .iter()
            .map(|n| TypeParam { name: n.to_string(), span: Span::dummy() })
            .collect();
        let result = registry.add_union("result", Span::dummy(), type_params);
        registry.union_mut(result).builtin = true;
        registry.types_by_name.insert("result".to_string(), TypeOwner::Union(result));
        let self_instance = Type::Union(Instance {
            id: result,
            args: (0..2)
                .map(|index| {
                    let placeholder = Placeholder { owner: GenericOwner::Union(result), index };
                    let cell = cells.fresh(CellOrigin::TypeArgument {
                        owner: GenericOwner::Union(result),
                        name: registry.placeholder_name(placeholder).to_string(),
                    });
                    cells.resolve(cell, Type::Placeholder(placeholder));
                    cell
                })
                .collect(),
        });
        for (index, name) in [RESULT_OK, RESULT_ERROR].into_iter().enumerate() {
            let member = Type::Placeholder(Placeholder { owner: GenericOwner::Union(result), index: index as u32 });
            let create = registry.add_tuple_constructor(result, name, &[member.clone()], self_instance.clone());
            registry.union_mut(result).variants.push(VariantSignature {
                name: name.to_string(),
                span: Span::dummy(),
                kind: VariantKind::Tuple { members: vec![member], create },
            });
            if index == 0 {
                registry.builtins.result_ok = create;
            } else {
                registry.builtins.result_error = create;
            }
        }

        let printf = registry.add_function("printf", Span::dummy());
        {
            let string = Type::class(registry.builtins.string);
            let unit = Type::class(registry.builtins.unit);
            let sig = registry.function_mut(printf);
            sig.is_static = true;
            sig.is_pub = true;
            sig.params.push(ParamSignature {
                name: "format".to_string(),
                span: Span::dummy(),
                ty: string,
                is_mut: false,
            });
            sig.return_type = unit;
        }
        registry.builtins.printf = printf;
        registry
    }

    pub fn add_class(&mut self, name: &str, span: Span, type_params: Vec<TypeParam>) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassSignature {
            id,
            name: name.to_string(),
            span,
            type_params,
            fields: Vec::new(),
            functions: Vec::new(),
            builtin: false,
        });
        id
    }

    pub fn add_union(&mut self, name: &str, span: Span, type_params: Vec<TypeParam>) -> UnionId {
        let id = UnionId(self.unions.len() as u32);
        self.unions.push(UnionSignature {
            id,
            name: name.to_string(),
            span,
            type_params,
            variants: Vec::new(),
            functions: Vec::new(),
            builtin: false,
        });
        id
    }

    pub fn add_function(&mut self, name: &str, span: Span) -> FnSigId {
        let id = FnSigId(self.functions.len() as u32);
        self.functions.push(FunctionSignature::new(id, name, span));
        id
    }

    /// Static function building tuple variant `name` of `union` from its
    /// members, named `Item0`, `Item1`, ...
    pub fn add_tuple_constructor(&mut self, union: UnionId, name: &str, members: &[Type], ret: Type) -> FnSigId {
        let create = self.add_function(name, Span::dummy());
        let sig = self.function_mut(create);
        sig.is_static = true;
        sig.is_pub = true;
        sig.owner = Some(TypeOwner::Union(union));
        sig.return_type = ret;
        sig.params = members
            .iter()
            .enumerate()
            .map(|(i, ty)| ParamSignature {
                name: format!("Item{i}"),
                span: Span::dummy(),
                ty: ty.clone(),
                is_mut: false,
            })
            .collect();
        create
    }

    /// Registers `name` for `owner`. Returns `false` when the name is taken.
    pub fn register_type_name(&mut self, name: &str, owner: TypeOwner) -> bool {
        if self.types_by_name.contains_key(name) {
            return false;
        }
        self.types_by_name.insert(name.to_string(), owner);
        true
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeOwner> {
        self.types_by_name.get(name).copied()
    }

    pub fn bind_decl(&mut self, decl: FunctionId, sig: FnSigId) {
        self.by_decl.insert(decl, sig);
        self.function_mut(sig).decl = Some(decl);
    }

    pub fn signature_for(&self, decl: FunctionId) -> Option<FnSigId> {
        self.by_decl.get(&decl).copied()
    }

    pub fn class(&self, id: ClassId) -> &ClassSignature {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassSignature {
        &mut self.classes[id.index()]
    }

    pub fn union(&self, id: UnionId) -> &UnionSignature {
        &self.unions[id.index()]
    }

    pub fn union_mut(&mut self, id: UnionId) -> &mut UnionSignature {
        &mut self.unions[id.index()]
    }

    pub fn function(&self, id: FnSigId) -> &FunctionSignature {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FnSigId) -> &mut FunctionSignature {
        &mut self.functions[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSignature> {
        self.classes.iter()
    }

    pub fn unions(&self) -> impl Iterator<Item = &UnionSignature> {
        self.unions.iter()
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter()
    }

    pub fn type_name(&self, owner: TypeOwner) -> &str {
        match owner {
            TypeOwner::Class(id) => &self.class(id).name,
            TypeOwner::Union(id) => &self.union(id).name,
        }
    }

    pub fn type_params(&self, owner: GenericOwner) -> &[TypeParam] {
        match owner {
            GenericOwner::Class(id) => &self.class(id).type_params,
            GenericOwner::Union(id) => &self.union(id).type_params,
            GenericOwner::Function(id) => &self.function(id).type_params,
        }
    }

    pub fn placeholders(&self, owner: GenericOwner) -> Vec<Placeholder> {
        (0..self.type_params(owner).len() as u32)
            .map(|index| Placeholder { owner, index })
            .collect()
    }

    pub fn placeholder_name(&self, placeholder: Placeholder) -> &str {
        self.type_params(placeholder.owner)
            .get(placeholder.index as usize)
            .map(|p| p.name.as_str())
            .unwrap_or("?")
    }

    /// Functions declared on a class or union, by name.
    pub fn member_function(&self, owner: TypeOwner, name: &str) -> Option<(u32, FnSigId)> {
        let functions = match owner {
            TypeOwner::Class(id) => &self.class(id).functions,
            TypeOwner::Union(id) => &self.union(id).functions,
        };
        functions
            .iter()
            .enumerate()
            .find(|(_, f)| self.function(**f).name == name)
            .map(|(i, f)| (i as u32, *f))
    }

    /// Class `Tuple`N` with type parameters `T0..TN` and public fields
    /// `Item0..ItemN`, created on first use.
    pub fn tuple_class(&mut self, arity: usize) -> ClassId {
        if let Some(id) = self.tuples.get(&arity) {
            return *id;
        }
        let type_params = (0..arity)
            .map(|i| TypeParam { name: format!("T{i}"), span: Span::dummy() })
            .collect();
        let id = self.add_class(&format!("Tuple`{arity}"), Span::dummy(), type_params);
        let class = self.class_mut(id);
        class.builtin = true;
        class.fields = (0..arity)
            .map(|i| FieldSignature {
                name: format!("Item{i}"),
                span: Span::dummy(),
                ty: Type::Placeholder(Placeholder { owner: GenericOwner::Class(id), index: i as u32 }),
                is_pub: true,
                is_mut: false,
                is_static: false,
                index: i as u32,
                initializer: None,
            })
            .collect();
        self.tuples.insert(arity, id);
        id
    }

    /// Class `Function`N` for function values taking `param_count`
    /// arguments: type parameters `TParam0..` and `TReturn`, and an instance
    /// function `Call`. Created on first use.
    pub fn function_class(&mut self, param_count: usize) -> ClassId {
        if let Some(id) = self.function_objects.get(&param_count) {
            return *id;
        }
        let type_params = (0..param_count)
            .map(|i| format!("TParam{i}"))
            .chain(std::iter::once("TReturn".to_string()))
            .map(|name| TypeParam { name, span: Span::dummy() })
            .collect();
        let id = self.add_class(&format!("Function`{}", param_count + 1), Span::dummy(), type_params);
        let placeholder = |index: usize| Type::Placeholder(Placeholder { owner: GenericOwner::Class(id), index: index as u32 });

        let call = self.add_function("Call", Span::dummy());
        let sig = self.function_mut(call);
        sig.is_pub = true;
        sig.owner = Some(TypeOwner::Class(id));
        sig.return_type = placeholder(param_count);
        sig.params = (0..param_count)
            .map(|i| ParamSignature { name: format!("arg{i}"), span: Span::dummy(), ty: placeholder(i), is_mut: false })
            .collect();

        let class = self.class_mut(id);
        class.builtin = true;
        class.functions.push(call);
        self.function_objects.insert(param_count, id);
        id
    }

    pub fn is_function_class(&self, id: ClassId) -> bool {
        self.function_objects.values().any(|f| *f == id)
    }

    pub fn is_tuple(&self, id: ClassId) -> bool {
        self.tuples.values().any(|t| *t == id)
    }

    pub fn unit(&self) -> Type {
        Type::class(self.builtins.unit)
    }

    pub fn int(&self) -> Type {
        Type::class(self.builtins.int)
    }

    pub fn string(&self) -> Type {
        Type::class(self.builtins.string)
    }

    pub fn boolean(&self) -> Type {
        Type::class(self.builtins.bool)
    }

    pub fn never(&self) -> Type {
        Type::class(self.builtins.never)
    }
}
