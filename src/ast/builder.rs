//! Programmatic construction of [`Program`] trees.
//!
//! Parsing happens outside this crate; the builder is what drivers without a
//! parser, tests and benchmarks use to assemble an arena. Every node gets a
//! distinct synthetic span so diagnostics can be traced back to the node that
//! produced them.

use crate::span::{Span, Spanned};

use super::*;

/// Named type, e.g. `int` or `Box`.
pub fn named(name: &str) -> TypeExpr {
    TypeExpr::Named { name: name.to_string(), type_args: Vec::new() }
}

/// Named type with type arguments, e.g. `result<int, string>`.
pub fn generic(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Named {
        name: name.to_string(),
        type_args: args.into_iter().map(Spanned::dummy).collect(),
    }
}

/// Function type. Use [`func_mut`] when a parameter has to be `mut`.
pub fn func(params: Vec<TypeExpr>, ret: Option<TypeExpr>) -> TypeExpr {
    func_mut(params.into_iter().map(|ty| (ty, false)).collect(), ret)
}

pub fn func_mut(params: Vec<(TypeExpr, bool)>, ret: Option<TypeExpr>) -> TypeExpr {
    TypeExpr::Fn {
        params: params
            .into_iter()
            .map(|(ty, is_mut)| FnTypeParam { ty: Spanned::dummy(ty), is_mut })
            .collect(),
        return_type: ret.map(|r| Box::new(Spanned::dummy(r))),
    }
}

pub fn tuple_ty(members: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Tuple(members.into_iter().map(Spanned::dummy).collect())
}

pub fn unit_ty() -> TypeExpr {
    TypeExpr::Unit
}

#[derive(Debug, Clone)]
struct ParamSpec {
    name: String,
    ty: Option<TypeExpr>,
    is_mut: bool,
}

/// Declaration of a function, method or local function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    name: String,
    is_pub: bool,
    is_static: bool,
    is_mut: bool,
    type_params: Vec<String>,
    params: Vec<ParamSpec>,
    return_type: Option<TypeExpr>,
    body: Vec<ExprId>,
    functions: Vec<FunctionId>,
}

impl FunctionSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_pub: false,
            is_static: false,
            is_mut: false,
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: None,
            body: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.is_pub = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.is_mut = true;
        self
    }

    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.to_string());
        self
    }

    pub fn param(mut self, name: &str, ty: TypeExpr) -> Self {
        self.params.push(ParamSpec { name: name.to_string(), ty: Some(ty), is_mut: false });
        self
    }

    pub fn mut_param(mut self, name: &str, ty: TypeExpr) -> Self {
        self.params.push(ParamSpec { name: name.to_string(), ty: Some(ty), is_mut: true });
        self
    }

    /// Parameter whose type the parser could not read.
    pub fn untyped_param(mut self, name: &str) -> Self {
        self.params.push(ParamSpec { name: name.to_string(), ty: None, is_mut: false });
        self
    }

    pub fn returns(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn body(mut self, exprs: Vec<ExprId>) -> Self {
        self.body = exprs;
        self
    }

    /// Local function declared directly in this function's body.
    pub fn local(mut self, function: FunctionId) -> Self {
        self.functions.push(function);
        self
    }
}

/// Declaration of a class field or a field of a class variant.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    ty: Option<TypeExpr>,
    is_pub: bool,
    is_mut: bool,
    is_static: bool,
    initializer: Option<ExprId>,
}

impl FieldSpec {
    /// Public, immutable instance field.
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: name.to_string(),
            ty: Some(ty),
            is_pub: true,
            is_mut: false,
            is_static: false,
            initializer: None,
        }
    }

    pub fn private(mut self) -> Self {
        self.is_pub = false;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.is_mut = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn initializer(mut self, value: ExprId) -> Self {
        self.initializer = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClassSpec {
    name: String,
    type_params: Vec<String>,
    fields: Vec<FieldSpec>,
    functions: Vec<FunctionId>,
}

impl ClassSpec {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), type_params: Vec::new(), fields: Vec::new(), functions: Vec::new() }
    }

    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.to_string());
        self
    }

    pub fn field(mut self, name: &str, ty: TypeExpr) -> Self {
        self.fields.push(FieldSpec::new(name, ty));
        self
    }

    pub fn field_spec(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn function(mut self, function: FunctionId) -> Self {
        self.functions.push(function);
        self
    }
}

#[derive(Debug, Clone)]
enum VariantSpec {
    Unit(String),
    Tuple(String, Vec<TypeExpr>),
    Class(String, Vec<FieldSpec>),
}

#[derive(Debug, Clone)]
pub struct UnionSpec {
    name: String,
    type_params: Vec<String>,
    variants: Vec<VariantSpec>,
    functions: Vec<FunctionId>,
}

impl UnionSpec {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), type_params: Vec::new(), variants: Vec::new(), functions: Vec::new() }
    }

    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.to_string());
        self
    }

    pub fn unit(mut self, name: &str) -> Self {
        self.variants.push(VariantSpec::Unit(name.to_string()));
        self
    }

    pub fn tuple(mut self, name: &str, members: Vec<TypeExpr>) -> Self {
        self.variants.push(VariantSpec::Tuple(name.to_string(), members));
        self
    }

    pub fn class_variant(mut self, name: &str, fields: Vec<(&str, TypeExpr)>) -> Self {
        let fields = fields.into_iter().map(|(n, ty)| FieldSpec::new(n, ty)).collect();
        self.variants.push(VariantSpec::Class(name.to_string(), fields));
        self
    }

    pub fn function(mut self, function: FunctionId) -> Self {
        self.functions.push(function);
        self
    }
}

/// Incrementally assembles a [`Program`].
///
/// Children are built before their parents: create the operand expressions,
/// then the expression using them, then the function owning the body.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    offset: usize,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Program {
        self.program
    }

    /// Span of an expression already added to the arena.
    pub fn span_of(&self, id: ExprId) -> Span {
        self.program.expr_span(id)
    }

    pub fn pattern_span_of(&self, id: PatternId) -> Span {
        self.program.pattern_span(id)
    }

    fn next_span(&mut self) -> Span {
        let span = Span::new(self.offset, self.offset + 1);
        self.offset += 2;
        span
    }

    fn spanned<T>(&mut self, node: T) -> Spanned<T> {
        let span = self.next_span();
        Spanned::new(node, span)
    }

    fn ident(&mut self, name: &str) -> Spanned<String> {
        self.spanned(name.to_string())
    }

    fn type_args(&mut self, args: Option<Vec<TypeExpr>>) -> Option<Vec<Spanned<TypeExpr>>> {
        args.map(|args| args.into_iter().map(|a| self.spanned(a)).collect())
    }

    fn field_inits(&mut self, fields: Vec<(&str, ExprId)>) -> Vec<FieldInit> {
        fields
            .into_iter()
            .map(|(name, value)| FieldInit { name: self.ident(name), value: Some(value) })
            .collect()
    }

    fn binding(&mut self, name: Option<&str>, is_mut: bool) -> Option<Binding> {
        name.map(|n| Binding { name: self.ident(n), is_mut })
    }

    fn field_patterns(&mut self, fields: Vec<(&str, Option<PatternId>)>) -> Vec<FieldPattern> {
        fields
            .into_iter()
            .map(|(name, pattern)| FieldPattern { name: self.ident(name), pattern })
            .collect()
    }

    fn field_decl(&mut self, spec: FieldSpec) -> FieldDecl {
        FieldDecl {
            name: self.ident(&spec.name),
            is_pub: spec.is_pub,
            is_mut: spec.is_mut,
            is_static: spec.is_static,
            ty: spec.ty.map(|ty| self.spanned(ty)),
            initializer: spec.initializer,
        }
    }

    /// Adds a raw expression node.
    pub fn expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.program.exprs.len() as u32);
        let node = self.spanned(expr);
        self.program.exprs.push(node);
        id
    }

    /// Adds a raw pattern node.
    pub fn pattern(&mut self, pattern: Pattern) -> PatternId {
        let id = PatternId(self.program.patterns.len() as u32);
        let node = self.spanned(pattern);
        self.program.patterns.push(node);
        id
    }

    /// Appends an expression to the top-level sequence.
    pub fn push(&mut self, expr: ExprId) {
        self.program.top_level.push(expr);
    }

    // ---- Expressions ----

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(Expr::Literal(Literal::Int(value)))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.expr(Expr::Literal(Literal::String(value.to_string())))
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(Expr::Literal(Literal::Bool(value)))
    }

    pub fn todo(&mut self) -> ExprId {
        self.expr(Expr::Todo)
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        self.expr(Expr::Variable { name: name.to_string(), type_args: None })
    }

    pub fn var_with_args(&mut self, name: &str, args: Vec<TypeExpr>) -> ExprId {
        let type_args = self.type_args(Some(args));
        self.expr(Expr::Variable { name: name.to_string(), type_args })
    }

    pub fn this(&mut self) -> ExprId {
        self.var("this")
    }

    /// `var name = value;`
    pub fn declare(&mut self, name: &str, value: ExprId) -> ExprId {
        self.declaration(name, false, None, Some(value))
    }

    /// `var mut name = value;`
    pub fn declare_mut(&mut self, name: &str, value: ExprId) -> ExprId {
        self.declaration(name, true, None, Some(value))
    }

    /// `var name;`
    pub fn declare_uninit(&mut self, name: &str) -> ExprId {
        self.declaration(name, false, None, None)
    }

    pub fn declaration(
        &mut self,
        name: &str,
        is_mut: bool,
        ty: Option<TypeExpr>,
        value: Option<ExprId>,
    ) -> ExprId {
        let name = self.ident(name);
        let ty = ty.map(|t| self.spanned(t));
        self.expr(Expr::VariableDeclaration { name, is_mut, ty, value })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.binary(BinaryOp::Assign, target, value)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(Expr::Binary { op, left, right })
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.expr(Expr::Unary { op: UnaryOp::Not, operand })
    }

    pub fn fallout(&mut self, operand: ExprId) -> ExprId {
        self.expr(Expr::Unary { op: UnaryOp::Fallout, operand })
    }

    pub fn member(&mut self, owner: ExprId, name: &str) -> ExprId {
        let member = self.ident(name);
        self.expr(Expr::MemberAccess { owner, member, type_args: None })
    }

    pub fn member_with_args(&mut self, owner: ExprId, name: &str, args: Vec<TypeExpr>) -> ExprId {
        let member = self.ident(name);
        let type_args = self.type_args(Some(args));
        self.expr(Expr::MemberAccess { owner, member, type_args })
    }

    /// `Type::member`
    pub fn static_member(&mut self, ty: TypeExpr, name: &str) -> ExprId {
        let ty = self.spanned(ty);
        let member = self.ident(name);
        self.expr(Expr::StaticMemberAccess { ty, member, type_args: None })
    }

    pub fn static_member_with_args(&mut self, ty: TypeExpr, name: &str, args: Vec<TypeExpr>) -> ExprId {
        let ty = self.spanned(ty);
        let member = self.ident(name);
        let type_args = self.type_args(Some(args));
        self.expr(Expr::StaticMemberAccess { ty, member, type_args })
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        self.expr(Expr::Call { callee, args })
    }

    /// Call of a function referenced by name.
    pub fn call_named(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let callee = self.var(name);
        self.call(callee, args)
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> ExprId {
        self.expr(Expr::Return(value))
    }

    pub fn block(&mut self, exprs: Vec<ExprId>) -> ExprId {
        self.expr(Expr::Block(Block { exprs, functions: Vec::new() }))
    }

    pub fn block_with_functions(&mut self, exprs: Vec<ExprId>, functions: Vec<FunctionId>) -> ExprId {
        self.expr(Expr::Block(Block { exprs, functions }))
    }

    pub fn if_(&mut self, check: ExprId, body: ExprId) -> ExprId {
        self.if_full(check, Some(body), Vec::new(), None)
    }

    pub fn if_else(&mut self, check: ExprId, body: ExprId, else_body: ExprId) -> ExprId {
        self.if_full(check, Some(body), Vec::new(), Some(else_body))
    }

    pub fn if_full(
        &mut self,
        check: ExprId,
        body: Option<ExprId>,
        else_ifs: Vec<(ExprId, Option<ExprId>)>,
        else_body: Option<ExprId>,
    ) -> ExprId {
        let else_ifs = else_ifs.into_iter().map(|(check, body)| ElseIf { check, body }).collect();
        self.expr(Expr::If { check, body, else_ifs, else_body })
    }

    pub fn while_(&mut self, check: ExprId, body: ExprId) -> ExprId {
        self.expr(Expr::While { check, body: Some(body) })
    }

    pub fn break_(&mut self) -> ExprId {
        self.expr(Expr::Break)
    }

    pub fn continue_(&mut self) -> ExprId {
        self.expr(Expr::Continue)
    }

    pub fn tuple(&mut self, values: Vec<ExprId>) -> ExprId {
        self.expr(Expr::Tuple(values))
    }

    /// `new Type { field = value, ... }`
    pub fn object(&mut self, ty: TypeExpr, fields: Vec<(&str, ExprId)>) -> ExprId {
        let ty = self.spanned(ty);
        let fields = self.field_inits(fields);
        self.expr(Expr::ObjectInitializer { ty, fields })
    }

    /// `new Union::Variant { field = value, ... }`
    pub fn variant_init(&mut self, ty: TypeExpr, variant: &str, fields: Vec<(&str, ExprId)>) -> ExprId {
        let ty = self.spanned(ty);
        let variant = self.ident(variant);
        let fields = self.field_inits(fields);
        self.expr(Expr::VariantInitializer { ty, variant, fields })
    }

    pub fn matches(&mut self, value: ExprId, pattern: Option<PatternId>) -> ExprId {
        self.expr(Expr::Matches { value, pattern })
    }

    pub fn match_(&mut self, value: ExprId, arms: Vec<(PatternId, ExprId)>) -> ExprId {
        let arms = arms
            .into_iter()
            .map(|(pattern, body)| MatchArm { pattern, body: Some(body) })
            .collect();
        self.expr(Expr::Match { value, arms })
    }

    // ---- Patterns ----

    pub fn discard(&mut self) -> PatternId {
        self.pattern(Pattern::Discard)
    }

    /// `var name`
    pub fn bind(&mut self, name: &str) -> PatternId {
        let name = self.ident(name);
        self.pattern(Pattern::Variable { name, is_mut: false })
    }

    /// `var mut name`
    pub fn bind_mut(&mut self, name: &str) -> PatternId {
        let name = self.ident(name);
        self.pattern(Pattern::Variable { name, is_mut: true })
    }

    pub fn type_pattern(&mut self, ty: TypeExpr, binding: Option<&str>) -> PatternId {
        let ty = self.spanned(ty);
        let binding = self.binding(binding, false);
        self.pattern(Pattern::Type { ty, binding })
    }

    /// `Union::Variant var binding`, or `Union var binding` when `variant` is `None`.
    pub fn variant_pattern(&mut self, ty: TypeExpr, variant: Option<&str>, binding: Option<&str>) -> PatternId {
        let ty = self.spanned(ty);
        let variant = variant.map(|v| self.ident(v));
        let binding = self.binding(binding, false);
        self.pattern(Pattern::UnionVariant { ty, variant, binding })
    }

    pub fn tuple_variant_pattern(&mut self, ty: TypeExpr, variant: &str, members: Vec<PatternId>) -> PatternId {
        let ty = self.spanned(ty);
        let variant = self.ident(variant);
        self.pattern(Pattern::UnionTupleVariant { ty, variant, members, binding: None })
    }

    pub fn class_variant_pattern(
        &mut self,
        ty: TypeExpr,
        variant: &str,
        fields: Vec<(&str, Option<PatternId>)>,
        rest_discarded: bool,
    ) -> PatternId {
        let ty = self.spanned(ty);
        let variant = self.ident(variant);
        let fields = self.field_patterns(fields);
        self.pattern(Pattern::UnionClassVariant { ty, variant, fields, rest_discarded, binding: None })
    }

    pub fn class_pattern(
        &mut self,
        ty: TypeExpr,
        fields: Vec<(&str, Option<PatternId>)>,
        rest_discarded: bool,
    ) -> PatternId {
        let ty = self.spanned(ty);
        let fields = self.field_patterns(fields);
        self.pattern(Pattern::Class { ty, fields, rest_discarded, binding: None })
    }

    /// Adds `var [mut] name` to a pattern created by this builder.
    pub fn with_binding(&mut self, pattern: PatternId, name: &str, is_mut: bool) -> PatternId {
        let new_binding = self.binding(Some(name), is_mut);
        match &mut self.program.patterns[pattern.index()].node {
            Pattern::Type { binding, .. }
            | Pattern::UnionVariant { binding, .. }
            | Pattern::UnionTupleVariant { binding, .. }
            | Pattern::UnionClassVariant { binding, .. }
            | Pattern::Class { binding, .. } => *binding = new_binding,
            Pattern::Discard | Pattern::Variable { .. } => {}
        }
        pattern
    }

    // ---- Declarations ----

    /// Adds a function without registering it anywhere. Attach it to a
    /// class, union, function body or block afterwards.
    pub fn function(&mut self, spec: FunctionSpec) -> FunctionId {
        let id = FunctionId(self.program.functions.len() as u32);
        let name = self.ident(&spec.name);
        let type_params = spec.type_params.iter().map(|t| self.ident(t)).collect();
        let params = spec
            .params
            .into_iter()
            .map(|p| Param {
                name: self.ident(&p.name),
                ty: p.ty.map(|t| self.spanned(t)),
                is_mut: p.is_mut,
            })
            .collect();
        let return_type = spec.return_type.map(|t| self.spanned(t));
        self.program.functions.push(Function {
            name,
            is_pub: spec.is_pub,
            is_static: spec.is_static,
            is_mut: spec.is_mut,
            type_params,
            params,
            return_type,
            body: Block { exprs: spec.body, functions: spec.functions },
        });
        id
    }

    /// Adds a function and registers it at the top level.
    pub fn top_function(&mut self, spec: FunctionSpec) -> FunctionId {
        let id = self.function(spec);
        self.program.top_level_functions.push(id);
        id
    }

    pub fn class(&mut self, spec: ClassSpec) {
        let name = self.ident(&spec.name);
        let type_params = spec.type_params.iter().map(|t| self.ident(t)).collect();
        let fields = spec.fields.into_iter().map(|f| self.field_decl(f)).collect();
        self.program.classes.push(ClassDecl { name, type_params, fields, functions: spec.functions });
    }

    pub fn union(&mut self, spec: UnionSpec) {
        let name = self.ident(&spec.name);
        let type_params = spec.type_params.iter().map(|t| self.ident(t)).collect();
        let variants = spec
            .variants
            .into_iter()
            .map(|variant| match variant {
                VariantSpec::Unit(n) => VariantDecl { name: self.ident(&n), kind: VariantDeclKind::Unit },
                VariantSpec::Tuple(n, members) => VariantDecl {
                    name: self.ident(&n),
                    kind: VariantDeclKind::Tuple(members.into_iter().map(|m| self.spanned(m)).collect()),
                },
                VariantSpec::Class(n, fields) => VariantDecl {
                    name: self.ident(&n),
                    kind: VariantDeclKind::Class(fields.into_iter().map(|f| self.field_decl(f)).collect()),
                },
            })
            .collect();
        self.program.unions.push(UnionDecl { name, type_params, variants, functions: spec.functions });
    }
}
