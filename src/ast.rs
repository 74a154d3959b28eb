use std::rc::Rc;

use crate::diagnostic::Span;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Greater,
    Less,
    GreaterEq,
    LessEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Value),
    Identifier(Rc<str>),
    List {
        elements: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// `fn(a, b) -> expr` or `lambda a, b: expr`
    Lambda {
        params: Vec<Rc<str>>,
        body: Rc<Expr>,
    },
    Grouped(Box<Expr>),
}

/// Statements of the Alex dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { name: Rc<str>, value: Expr },
    Expr(Expr),
    Print(Expr),
    If { condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    While { condition: Expr, body: Vec<Stmt> },
    For { var: Rc<str>, iterable: Expr, body: Vec<Stmt> },
    Function { name: Rc<str>, params: Vec<Rc<str>>, body: Rc<[Stmt]> },
    Return(Option<Expr>),
    Pass,
    Break,
    Continue,
}

impl Stmt {
    /// Short name used in trace output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Assign { .. } => "assign",
            Stmt::Expr(_) => "expr",
            Stmt::Print(_) => "print",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::For { .. } => "for",
            Stmt::Function { .. } => "def",
            Stmt::Return(_) => "return",
            Stmt::Pass => "pass",
            Stmt::Break => "break",
            Stmt::Continue => "continue",
        }
    }
}
