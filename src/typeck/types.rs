use std::fmt;

use serde::Serialize;

use super::generics::GenericCells;
use super::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FnSigId(pub u32);

/// Handle of an inference cell in [`GenericCells`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariableId(pub u32);

macro_rules! impl_index {
    ($($id:ident),*) => {
        $(impl $id {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        })*
    };
}

impl_index!(ClassId, UnionId, FnSigId, CellId, VariableId);

/// A class or union declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeOwner {
    Class(ClassId),
    Union(UnionId),
}

/// Anything that can declare type parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GenericOwner {
    Class(ClassId),
    Union(UnionId),
    Function(FnSigId),
}

impl From<TypeOwner> for GenericOwner {
    fn from(owner: TypeOwner) -> Self {
        match owner {
            TypeOwner::Class(id) => GenericOwner::Class(id),
            TypeOwner::Union(id) => GenericOwner::Union(id),
        }
    }
}

/// A declared type parameter seen from inside its declaration, e.g. `T`
/// within the body of `fn first<T>(...)`. Only equal to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Placeholder {
    pub owner: GenericOwner,
    pub index: u32,
}

/// A generic class or union applied to type arguments. Each argument is an
/// inference cell so instances created without explicit arguments can be
/// resolved later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance<Id> {
    pub id: Id,
    pub args: Vec<CellId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnParam {
    pub ty: Type,
    pub is_mut: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnType {
    pub params: Vec<FnParam>,
    pub ret: Box<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Class(Instance<ClassId>),
    Union(Instance<UnionId>),
    Function(FnType),
    /// Inference cell; see [`GenericCells`].
    Cell(CellId),
    Placeholder(Placeholder),
    /// Produced after an error was reported. Unifies with everything.
    Unknown,
}

impl Type {
    pub fn class(id: ClassId) -> Self {
        Type::Class(Instance { id, args: Vec::new() })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn as_class(&self) -> Option<&Instance<ClassId>> {
        match self {
            Type::Class(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Instance<UnionId>> {
        match self {
            Type::Union(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn is_class(&self, id: ClassId) -> bool {
        matches!(self, Type::Class(instance) if instance.id == id)
    }

    /// Applies `f` to every placeholder, rebuilding the type around the
    /// results. Resolved cells are looked through; a type argument whose
    /// resolution changes gets a fresh cell so the original stays untouched.
    pub fn substitute(&self, cells: &mut GenericCells, f: &impl Fn(Placeholder) -> Option<Type>) -> Type {
        match self {
            Type::Placeholder(p) => f(*p).unwrap_or(Type::Placeholder(*p)),
            Type::Class(instance) => Type::Class(Instance {
                id: instance.id,
                args: substitute_args(&instance.args, cells, f),
            }),
            Type::Union(instance) => Type::Union(Instance {
                id: instance.id,
                args: substitute_args(&instance.args, cells, f),
            }),
            Type::Function(fn_type) => Type::Function(FnType {
                params: fn_type
                    .params
                    .iter()
                    .map(|p| FnParam { ty: p.ty.substitute(cells, f), is_mut: p.is_mut })
                    .collect(),
                ret: Box::new(fn_type.ret.substitute(cells, f)),
            }),
            Type::Cell(cell) => match cells.resolved(*cell).cloned() {
                Some(resolved) => {
                    let substituted = resolved.substitute(cells, f);
                    if substituted == resolved { Type::Cell(*cell) } else { substituted }
                }
                None => Type::Cell(*cell),
            },
            Type::Unknown => Type::Unknown,
        }
    }
}

fn substitute_args(
    args: &[CellId],
    cells: &mut GenericCells,
    f: &impl Fn(Placeholder) -> Option<Type>,
) -> Vec<CellId> {
    args.iter()
        .map(|&arg| {
            let Some(resolved) = cells.resolved(arg).cloned() else {
                return arg;
            };
            let substituted = resolved.substitute(cells, f);
            if substituted == resolved {
                arg
            } else {
                let origin = cells.origin(arg).clone();
                let cell = cells.fresh(origin);
                cells.resolve(cell, substituted);
                cell
            }
        })
        .collect()
}

/// Human-readable rendering of a [`Type`], following resolved cells.
pub struct TypeDisplay<'a> {
    pub ty: &'a Type,
    pub registry: &'a Registry,
    pub cells: &'a GenericCells,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(ty: &'a Type, registry: &'a Registry, cells: &'a GenericCells) -> Self {
        Self { ty, registry, cells }
    }

    fn nested(&self, ty: &'a Type) -> Self {
        Self { ty, registry: self.registry, cells: self.cells }
    }

    fn write_args(&self, f: &mut fmt::Formatter<'_>, args: &[CellId]) -> fmt::Result {
        if args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_cell(f, self.registry, self.cells, *arg)?;
        }
        f.write_str(">")
    }
}

fn write_cell(f: &mut fmt::Formatter<'_>, registry: &Registry, cells: &GenericCells, cell: CellId) -> fmt::Result {
    match cells.resolved(cell) {
        Some(resolved) => write!(f, "{}", TypeDisplay::new(resolved, registry, cells)),
        None => write!(f, "?{}", cells.origin(cell).name()),
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Class(instance) => {
                if self.registry.is_tuple(instance.id) {
                    f.write_str("(")?;
                    for (i, arg) in instance.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write_cell(f, self.registry, self.cells, *arg)?;
                    }
                    return f.write_str(")");
                }
                f.write_str(&self.registry.class(instance.id).name)?;
                self.write_args(f, &instance.args)
            }
            Type::Union(instance) => {
                f.write_str(&self.registry.union(instance.id).name)?;
                self.write_args(f, &instance.args)
            }
            Type::Function(fn_type) => {
                f.write_str("Fn(")?;
                for (i, param) in fn_type.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if param.is_mut {
                        f.write_str("mut ")?;
                    }
                    write!(f, "{}", self.nested(&param.ty))?;
                }
                write!(f, "): {}", self.nested(&fn_type.ret))
            }
            Type::Cell(cell) => write_cell(f, self.registry, self.cells, *cell),
            Type::Placeholder(p) => f.write_str(self.registry.placeholder_name(*p)),
            Type::Unknown => f.write_str("unknown"),
        }
    }
}
