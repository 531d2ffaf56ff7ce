//! Read-only traversal over the arena AST.
//!
//! Implement [`Visitor`] for a pass, overriding only the methods you need, and
//! call the matching `walk_*` function inside an override to keep the default
//! recursion. Omitting the walk call prunes traversal at that node.
//!
//! ```rust
//! use reef::ast::{Expr, ExprId, Program};
//! use reef::visit::{walk_expr, Visitor};
//!
//! struct CountReturns(usize);
//!
//! impl Visitor for CountReturns {
//!     fn visit_expr(&mut self, program: &Program, id: ExprId) {
//!         if let Expr::Return(_) = program.expr(id).node {
//!             self.0 += 1;
//!         }
//!         walk_expr(self, program, id);
//!     }
//! }
//! ```
//!
//! ## When to Use
//!
//! The first checking pass dispatches with a manual `match` because almost
//! every arm has its own logic. Passes that mostly recurse (the post-inference
//! validator, collectors) go through the visitor.

use crate::ast::*;

pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_class(&mut self, program: &Program, class: &ClassDecl) {
        walk_class(self, program, class);
    }

    fn visit_union(&mut self, program: &Program, union: &UnionDecl) {
        walk_union(self, program, union);
    }

    fn visit_function(&mut self, program: &Program, id: FunctionId) {
        walk_function(self, program, id);
    }

    fn visit_block(&mut self, program: &Program, block: &Block) {
        walk_block(self, program, block);
    }

    fn visit_expr(&mut self, program: &Program, id: ExprId) {
        walk_expr(self, program, id);
    }

    fn visit_pattern(&mut self, program: &Program, id: PatternId) {
        walk_pattern(self, program, id);
    }
}

/// Unions, then classes, then top-level functions, then top-level expressions.
pub fn walk_program<V: Visitor>(v: &mut V, program: &Program) {
    for union in &program.unions {
        v.visit_union(program, union);
    }
    for class in &program.classes {
        v.visit_class(program, class);
    }
    for &function in &program.top_level_functions {
        v.visit_function(program, function);
    }
    for &expr in &program.top_level {
        v.visit_expr(program, expr);
    }
}

pub fn walk_union<V: Visitor>(v: &mut V, program: &Program, union: &UnionDecl) {
    for &function in &union.functions {
        v.visit_function(program, function);
    }
}

/// Functions first, then field initializers.
pub fn walk_class<V: Visitor>(v: &mut V, program: &Program, class: &ClassDecl) {
    for &function in &class.functions {
        v.visit_function(program, function);
    }
    for initializer in class.fields.iter().filter_map(|f| f.initializer) {
        v.visit_expr(program, initializer);
    }
}

pub fn walk_function<V: Visitor>(v: &mut V, program: &Program, id: FunctionId) {
    v.visit_block(program, &program.function(id).body);
}

/// Local functions of a block are visited before its expressions.
pub fn walk_block<V: Visitor>(v: &mut V, program: &Program, block: &Block) {
    for &function in &block.functions {
        v.visit_function(program, function);
    }
    for &expr in &block.exprs {
        v.visit_expr(program, expr);
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, program: &Program, id: ExprId) {
    match &program.expr(id).node {
        Expr::Literal(_)
        | Expr::Variable { .. }
        | Expr::Todo
        | Expr::StaticMemberAccess { .. }
        | Expr::Break
        | Expr::Continue => {}
        Expr::VariableDeclaration { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(program, *value);
            }
        }
        Expr::Binary { left, right, .. } => {
            v.visit_expr(program, *left);
            v.visit_expr(program, *right);
        }
        Expr::Unary { operand, .. } => v.visit_expr(program, *operand),
        Expr::MemberAccess { owner, .. } => v.visit_expr(program, *owner),
        Expr::Call { callee, args } => {
            v.visit_expr(program, *callee);
            for &arg in args {
                v.visit_expr(program, arg);
            }
        }
        Expr::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(program, *value);
            }
        }
        Expr::Block(block) => v.visit_block(program, block),
        Expr::If { check, body, else_ifs, else_body } => {
            v.visit_expr(program, *check);
            if let Some(body) = body {
                v.visit_expr(program, *body);
            }
            for branch in else_ifs {
                v.visit_expr(program, branch.check);
                if let Some(body) = branch.body {
                    v.visit_expr(program, body);
                }
            }
            if let Some(else_body) = else_body {
                v.visit_expr(program, *else_body);
            }
        }
        Expr::While { check, body } => {
            v.visit_expr(program, *check);
            if let Some(body) = body {
                v.visit_expr(program, *body);
            }
        }
        Expr::Tuple(values) => {
            for &value in values {
                v.visit_expr(program, value);
            }
        }
        Expr::ObjectInitializer { fields, .. } | Expr::VariantInitializer { fields, .. } => {
            for value in fields.iter().filter_map(|f| f.value) {
                v.visit_expr(program, value);
            }
        }
        Expr::Matches { value, pattern } => {
            v.visit_expr(program, *value);
            if let Some(pattern) = pattern {
                v.visit_pattern(program, *pattern);
            }
        }
        Expr::Match { value, arms } => {
            v.visit_expr(program, *value);
            for arm in arms {
                v.visit_pattern(program, arm.pattern);
                if let Some(body) = arm.body {
                    v.visit_expr(program, body);
                }
            }
        }
    }
}

pub fn walk_pattern<V: Visitor>(v: &mut V, program: &Program, id: PatternId) {
    match &program.pattern(id).node {
        Pattern::Discard
        | Pattern::Variable { .. }
        | Pattern::Type { .. }
        | Pattern::UnionVariant { .. } => {}
        Pattern::UnionTupleVariant { members, .. } => {
            for &member in members {
                v.visit_pattern(program, member);
            }
        }
        Pattern::UnionClassVariant { fields, .. } | Pattern::Class { fields, .. } => {
            for pattern in fields.iter().filter_map(|f| f.pattern) {
                v.visit_pattern(program, pattern);
            }
        }
    }
}
