//! Type-expression resolution and instantiation of generic signatures.

use serde::Serialize;
use tracing::trace;

use crate::ast::TypeExpr;
use crate::diagnostics::TypeError;
use crate::span::{Span, Spanned};

use super::generics::{CellOrigin, GenericCells};
use super::types::*;
use super::Checker;

/// A function signature with its type parameters bound to cells.
///
/// `owner_args` are the arguments of the class or union the function was
/// reached through; `type_args` belong to the function itself. `params` and
/// `ret` already have both substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantiatedFunction {
    pub sig: FnSigId,
    pub type_args: Vec<CellId>,
    pub owner_args: Vec<CellId>,
    #[serde(skip)]
    pub params: Vec<FnParam>,
    #[serde(skip)]
    pub ret: Type,
}

impl InstantiatedFunction {
    pub fn fn_type(&self) -> Type {
        Type::Function(FnType { params: self.params.clone(), ret: Box::new(self.ret.clone()) })
    }
}

/// Replaces the placeholders of `owner` and of `function` with the matching cells.
fn bind_placeholders(
    ty: &Type,
    cells: &mut GenericCells,
    owner: Option<(GenericOwner, &[CellId])>,
    function: (GenericOwner, &[CellId]),
) -> Type {
    ty.substitute(cells, &|p: Placeholder| {
        let args = if p.owner == function.0 {
            function.1
        } else {
            match owner {
                Some((owner, args)) if p.owner == owner => args,
                _ => return None,
            }
        };
        args.get(p.index as usize).map(|cell| Type::Cell(*cell))
    })
}

impl Checker<'_> {
    pub(crate) fn resolve_type(&mut self, ty: &Spanned<TypeExpr>) -> Type {
        match &ty.node {
            TypeExpr::Named { name, type_args } => {
                let args: Vec<(Type, Span)> =
                    type_args.iter().map(|arg| (self.resolve_type(arg), arg.span)).collect();
                if let Some(owner) = self.registry.lookup_type(name) {
                    return self.instantiate_owner(owner, &args, ty.span);
                }
                let placeholder = self
                    .env
                    .placeholders()
                    .iter()
                    .rev()
                    .find(|p| self.registry.placeholder_name(**p) == name)
                    .copied();
                match placeholder {
                    Some(placeholder) => {
                        if !args.is_empty() {
                            self.report(
                                TypeError::IncorrectNumberOfTypeArguments { expected: 0, found: args.len() },
                                ty.span,
                            );
                        }
                        Type::Placeholder(placeholder)
                    }
                    None => {
                        self.report(TypeError::SymbolNotFound { name: name.clone() }, ty.span);
                        Type::Unknown
                    }
                }
            }
            TypeExpr::Fn { params, return_type } => {
                let params = params
                    .iter()
                    .map(|p| FnParam { ty: self.resolve_type(&p.ty), is_mut: p.is_mut })
                    .collect();
                let ret = match return_type {
                    Some(ret) => self.resolve_type(ret),
                    None => self.registry.unit(),
                };
                Type::Function(FnType { params, ret: Box::new(ret) })
            }
            TypeExpr::Tuple(members) => {
                let members: Vec<(Type, Span)> =
                    members.iter().map(|m| (self.resolve_type(m), m.span)).collect();
                self.instantiate_tuple(members, ty.span)
            }
            TypeExpr::Unit => self.registry.unit(),
        }
    }

    /// Fresh cells for the type parameters of `owner`, unified with `args`
    /// when any are given.
    pub(crate) fn instantiate(&mut self, owner: GenericOwner, args: &[(Type, Span)], span: Span) -> Vec<CellId> {
        let cells: Vec<CellId> = self
            .registry
            .type_params(owner)
            .iter()
            .map(|param| CellOrigin::TypeArgument { owner, name: param.name.clone() })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|origin| self.cells.fresh(origin))
            .collect();
        if args.is_empty() {
            return cells;
        }
        if args.len() != cells.len() {
            self.report(
                TypeError::IncorrectNumberOfTypeArguments { expected: cells.len(), found: args.len() },
                span,
            );
        }
        for (cell, (arg, arg_span)) in cells.iter().zip(args) {
            self.expect_type(arg, &Type::Cell(*cell), *arg_span, true);
        }
        cells
    }

    pub(crate) fn instantiate_owner(&mut self, owner: TypeOwner, args: &[(Type, Span)], span: Span) -> Type {
        let cells = self.instantiate(owner.into(), args, span);
        match owner {
            TypeOwner::Class(id) => Type::Class(Instance { id, args: cells }),
            TypeOwner::Union(id) => Type::Union(Instance { id, args: cells }),
        }
    }

    /// A tuple of `members`. One member is just that member; none is unit.
    pub(crate) fn instantiate_tuple(&mut self, members: Vec<(Type, Span)>, span: Span) -> Type {
        match members.len() {
            0 => self.registry.unit(),
            1 => members.into_iter().next().map(|(ty, _)| ty).unwrap_or(Type::Unknown),
            len if len > self.options.max_tuple_arity => {
                self.report(
                    TypeError::TooManyTupleMembers { max: self.options.max_tuple_arity, found: len },
                    span,
                );
                Type::Unknown
            }
            len => {
                let id = self.registry.tuple_class(len);
                self.instantiate_owner(TypeOwner::Class(id), &members, span)
            }
        }
    }

    /// The type of `this` inside `owner`: its own placeholders as arguments.
    pub(crate) fn self_instance(&mut self, owner: TypeOwner) -> Type {
        let generic: GenericOwner = owner.into();
        let args = self
            .registry
            .placeholders(generic)
            .into_iter()
            .map(|placeholder| {
                let cell = self.cells.fresh(CellOrigin::TypeArgument {
                    owner: generic,
                    name: self.registry.placeholder_name(placeholder).to_string(),
                });
                self.cells.resolve(cell, Type::Placeholder(placeholder));
                cell
            })
            .collect();
        match owner {
            TypeOwner::Class(id) => Type::Class(Instance { id, args }),
            TypeOwner::Union(id) => Type::Union(Instance { id, args }),
        }
    }

    /// Binds the type parameters of `sig`. Explicit `type_args` are unified
    /// with the fresh cells; without them the cells are left for inference.
    pub(crate) fn instantiate_function(
        &mut self,
        sig: FnSigId,
        owner_args: Vec<CellId>,
        type_args: Option<&[Spanned<TypeExpr>]>,
        span: Span,
    ) -> InstantiatedFunction {
        let args: Vec<(Type, Span)> = type_args
            .unwrap_or_default()
            .iter()
            .map(|arg| (self.resolve_type(arg), arg.span))
            .collect();
        let function_owner = GenericOwner::Function(sig);
        let type_cells = self.instantiate(function_owner, &args, span);

        let signature = self.registry.function(sig);
        let owner = signature.owner.map(GenericOwner::from);
        let params: Vec<(Type, bool)> = signature.params.iter().map(|p| (p.ty.clone(), p.is_mut)).collect();
        let ret = signature.return_type.clone();
        trace!(function = %signature.name, type_args = type_cells.len(), "instantiating function");

        let owner_binding = owner.map(|owner| (owner, owner_args.as_slice()));
        let params = params
            .into_iter()
            .map(|(ty, is_mut)| FnParam {
                ty: bind_placeholders(&ty, &mut self.cells, owner_binding, (function_owner, &type_cells)),
                is_mut,
            })
            .collect();
        let ret = bind_placeholders(&ret, &mut self.cells, owner_binding, (function_owner, &type_cells));
        InstantiatedFunction { sig, type_args: type_cells, owner_args, params, ret }
    }

    /// `ty` as seen through an instance whose arguments are `args`.
    pub(crate) fn member_type(&mut self, ty: &Type, owner: TypeOwner, args: &[CellId]) -> Type {
        let owner: GenericOwner = owner.into();
        ty.substitute(&mut self.cells, &|p: Placeholder| {
            if p.owner == owner {
                args.get(p.index as usize).map(|cell| Type::Cell(*cell))
            } else {
                None
            }
        })
    }
}
