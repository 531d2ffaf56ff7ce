//! Type compatibility checks that double as generic inference.

use tracing::trace;

use crate::ast::ExprId;
use crate::diagnostics::{CompileError, TypeError};
use crate::span::Span;

use super::types::*;
use super::Checker;

impl Checker<'_> {
    /// Checks that a value of type `actual` can be used where `expected` is
    /// required. Unresolved cells on either side are solved or linked along
    /// the way. Reports a single `MismatchedTypes` on failure when `report`
    /// is set.
    pub(crate) fn expect_type(&mut self, actual: &Type, expected: &Type, span: Span, report: bool) -> bool {
        if self.unify(actual, expected) {
            return true;
        }
        if report {
            let error = TypeError::MismatchedTypes { expected: self.display(expected), found: self.display(actual) };
            self.report(error, span);
        }
        false
    }

    /// [`Self::expect_type`] against the already-checked type of `expr`.
    pub(crate) fn expect_expr(&mut self, expected: &Type, expr: ExprId) -> Result<bool, CompileError> {
        let actual = self.type_of(expr)?;
        Ok(self.expect_type(&actual, expected, self.program.expr_span(expr), true))
    }

    fn is_never(&self, ty: &Type) -> bool {
        ty.is_class(self.registry.builtins.never)
    }

    fn unify(&mut self, actual: &Type, expected: &Type) -> bool {
        let actual = self.cells.shallow_resolve(actual);
        let expected = self.cells.shallow_resolve(expected);

        if self.is_never(&actual) || self.is_never(&expected) {
            return true;
        }

        match (&actual, &expected) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Cell(a), Type::Cell(b)) => {
                self.cells.link(*b, *a);
                true
            }
            (Type::Cell(cell), other) | (other, Type::Cell(cell)) => {
                if self.cells.occurs(*cell, other) {
                    return false;
                }
                trace!(cell = cell.0, "resolving inference cell");
                self.cells.resolve(*cell, other.clone());
                true
            }
            (Type::Placeholder(a), Type::Placeholder(b)) => a == b,
            (Type::Class(a), Type::Class(b)) => a.id == b.id && self.unify_args(&a.args, &b.args),
            (Type::Union(a), Type::Union(b)) => a.id == b.id && self.unify_args(&a.args, &b.args),
            (Type::Function(a), Type::Function(b)) => {
                if a.params.len() != b.params.len() {
                    return false;
                }
                let mut ok = true;
                for (pa, pb) in a.params.iter().zip(&b.params) {
                    ok &= pa.is_mut == pb.is_mut;
                    ok &= self.unify(&pa.ty, &pb.ty);
                }
                ok & self.unify(&a.ret, &b.ret)
            }
            _ => false,
        }
    }

    /// Pairwise unification of type arguments. Every pair is attempted so
    /// cells still get solved when an earlier pair fails.
    fn unify_args(&mut self, actual: &[CellId], expected: &[CellId]) -> bool {
        let mut ok = actual.len() == expected.len();
        for (a, b) in actual.iter().zip(expected) {
            ok &= self.unify(&Type::Cell(*a), &Type::Cell(*b));
        }
        ok
    }
}
