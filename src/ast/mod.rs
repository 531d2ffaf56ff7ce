//! Arena-allocated syntax tree consumed by the checker.
//!
//! Expressions, patterns and functions live in flat vectors on [`Program`] and
//! refer to each other through [`ExprId`], [`PatternId`] and [`FunctionId`].
//! Nodes carry no checker state; everything the checker learns about them is
//! recorded in side tables keyed by these ids.

pub mod builder;

use serde::{Deserialize, Serialize};

use crate::span::{Span, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PatternId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub exprs: Vec<Spanned<Expr>>,
    pub patterns: Vec<Spanned<Pattern>>,
    pub functions: Vec<Function>,
    pub classes: Vec<ClassDecl>,
    pub unions: Vec<UnionDecl>,
    /// Functions declared at the top level, in source order.
    pub top_level_functions: Vec<FunctionId>,
    /// Expressions evaluated at the top level, in source order.
    pub top_level: Vec<ExprId>,
}

impl Program {
    pub fn expr(&self, id: ExprId) -> &Spanned<Expr> {
        &self.exprs[id.index()]
    }

    pub fn pattern(&self, id: PatternId) -> &Spanned<Pattern> {
        &self.patterns[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn expr_span(&self, id: ExprId) -> Span {
        self.expr(id).span
    }

    pub fn pattern_span(&self, id: PatternId) -> Span {
        self.pattern(id).span
    }

    /// Whether evaluating `id` always transfers control out of the enclosing
    /// function. Purely syntactic: a `return` anywhere on every path counts,
    /// conditions and loops are not evaluated.
    pub fn diverges(&self, id: ExprId) -> bool {
        match &self.expr(id).node {
            Expr::Return(_) => true,
            Expr::Block(block) => self.any_diverges(block.exprs.iter().copied()),
            Expr::If { check, body, else_ifs, else_body } => {
                if self.diverges(*check) {
                    return true;
                }
                let body = body.is_some_and(|b| self.diverges(b));
                let else_body = else_body.is_some_and(|b| self.diverges(b));
                let else_ifs = else_ifs
                    .iter()
                    .all(|branch| branch.body.is_some_and(|b| self.diverges(b)));
                body && else_body && else_ifs
            }
            Expr::Match { value, arms } => {
                self.diverges(*value)
                    || (!arms.is_empty()
                        && arms.iter().all(|arm| arm.body.is_some_and(|b| self.diverges(b))))
            }
            Expr::Call { callee, args } => {
                self.diverges(*callee) || self.any_diverges(args.iter().copied())
            }
            Expr::Binary { left, right, .. } => self.diverges(*left) || self.diverges(*right),
            Expr::Unary { operand, .. } => self.diverges(*operand),
            Expr::MemberAccess { owner, .. } => self.diverges(*owner),
            Expr::VariableDeclaration { value, .. } => value.is_some_and(|v| self.diverges(v)),
            Expr::Tuple(values) => self.any_diverges(values.iter().copied()),
            Expr::ObjectInitializer { fields, .. } | Expr::VariantInitializer { fields, .. } => {
                self.any_diverges(fields.iter().filter_map(|f| f.value))
            }
            Expr::Matches { value, .. } => self.diverges(*value),
            Expr::While { check, .. } => self.diverges(*check),
            Expr::Literal(_)
            | Expr::Variable { .. }
            | Expr::Todo
            | Expr::StaticMemberAccess { .. }
            | Expr::Break
            | Expr::Continue => false,
        }
    }

    fn any_diverges(&self, ids: impl IntoIterator<Item = ExprId>) -> bool {
        ids.into_iter().any(|id| self.diverges(id))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub exprs: Vec<ExprId>,
    pub functions: Vec<FunctionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: Spanned<String>,
    pub is_pub: bool,
    pub is_static: bool,
    pub is_mut: bool,
    pub type_params: Vec<Spanned<String>>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Spanned<String>,
    /// `None` when the parser could not read a type; checked as unknown.
    pub ty: Option<Spanned<TypeExpr>>,
    pub is_mut: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<String>>,
    pub fields: Vec<FieldDecl>,
    pub functions: Vec<FunctionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Spanned<String>,
    pub is_pub: bool,
    pub is_mut: bool,
    pub is_static: bool,
    pub ty: Option<Spanned<TypeExpr>>,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionDecl {
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<String>>,
    pub variants: Vec<VariantDecl>,
    pub functions: Vec<FunctionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: Spanned<String>,
    pub kind: VariantDeclKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VariantDeclKind {
    Unit,
    Tuple(Vec<Spanned<TypeExpr>>),
    Class(Vec<FieldDecl>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named {
        name: String,
        type_args: Vec<Spanned<TypeExpr>>,
    },
    Fn {
        params: Vec<FnTypeParam>,
        return_type: Option<Box<Spanned<TypeExpr>>>,
    },
    Tuple(Vec<Spanned<TypeExpr>>),
    Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnTypeParam {
    pub ty: Spanned<TypeExpr>,
    pub is_mut: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    LessThan,
    GreaterThan,
    Plus,
    Minus,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    And,
    Or,
    Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    /// Postfix `?`: unwraps a result or returns its error from the enclosing function.
    Fallout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Variable {
        name: String,
        type_args: Option<Vec<Spanned<TypeExpr>>>,
    },
    Todo,
    VariableDeclaration {
        name: Spanned<String>,
        is_mut: bool,
        ty: Option<Spanned<TypeExpr>>,
        value: Option<ExprId>,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    MemberAccess {
        owner: ExprId,
        member: Spanned<String>,
        type_args: Option<Vec<Spanned<TypeExpr>>>,
    },
    StaticMemberAccess {
        ty: Spanned<TypeExpr>,
        member: Spanned<String>,
        type_args: Option<Vec<Spanned<TypeExpr>>>,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Return(Option<ExprId>),
    Block(Block),
    If {
        check: ExprId,
        body: Option<ExprId>,
        else_ifs: Vec<ElseIf>,
        else_body: Option<ExprId>,
    },
    While {
        check: ExprId,
        body: Option<ExprId>,
    },
    Break,
    Continue,
    Tuple(Vec<ExprId>),
    ObjectInitializer {
        ty: Spanned<TypeExpr>,
        fields: Vec<FieldInit>,
    },
    VariantInitializer {
        ty: Spanned<TypeExpr>,
        variant: Spanned<String>,
        fields: Vec<FieldInit>,
    },
    Matches {
        value: ExprId,
        pattern: Option<PatternId>,
    },
    Match {
        value: ExprId,
        arms: Vec<MatchArm>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElseIf {
    pub check: ExprId,
    pub body: Option<ExprId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: Spanned<String>,
    pub value: Option<ExprId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: PatternId,
    pub body: Option<ExprId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub name: Spanned<String>,
    pub is_mut: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPattern {
    pub name: Spanned<String>,
    /// `None` binds a variable named after the field.
    pub pattern: Option<PatternId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pattern {
    Discard,
    Variable {
        name: Spanned<String>,
        is_mut: bool,
    },
    Type {
        ty: Spanned<TypeExpr>,
        binding: Option<Binding>,
    },
    UnionVariant {
        ty: Spanned<TypeExpr>,
        variant: Option<Spanned<String>>,
        binding: Option<Binding>,
    },
    UnionTupleVariant {
        ty: Spanned<TypeExpr>,
        variant: Spanned<String>,
        members: Vec<PatternId>,
        binding: Option<Binding>,
    },
    UnionClassVariant {
        ty: Spanned<TypeExpr>,
        variant: Spanned<String>,
        fields: Vec<FieldPattern>,
        rest_discarded: bool,
        binding: Option<Binding>,
    },
    Class {
        ty: Spanned<TypeExpr>,
        fields: Vec<FieldPattern>,
        rest_discarded: bool,
        binding: Option<Binding>,
    },
}
