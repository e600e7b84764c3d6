//! Abstract syntax tree produced by the parser and walked by the evaluator.
//!
//! Expressions and statements are two closed enums. Function literals are
//! reference-counted so that runtime function values can keep their
//! definition alive independently of the program that introduced it, which
//! matters for REPL sessions and cached modules.

use std::rc::Rc;

use strum::Display;

/// A parsed compilation unit: the imports in source order plus the top-level
/// statement list.
#[derive(Debug)]
pub(crate) struct Program {
    pub imports: Vec<Import>,
    pub body: Vec<Stmt>,
}

/// `import a.b.c as alias;`
#[derive(Debug, Clone)]
pub(crate) struct Import {
    /// Dotted path segments, e.g. `["std", "math"]`.
    pub path: Vec<String>,
    pub alias: String,
}

/// A function literal: `function name(params) { body }` or its anonymous
/// form. Named statements and anonymous expressions share this shape.
#[derive(Debug)]
pub(crate) struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "++")]
    Increment,
    #[strum(serialize = "--")]
    Decrement,
    #[strum(serialize = "delete")]
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Rem,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtEq,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtEq,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    /// Reserved. The lexer never emits `<<`, so this is parseable in
    /// principle but unreachable in practice.
    #[strum(serialize = "<<")]
    Shl,
    /// Reserved, same as `Shl`.
    #[strum(serialize = ">>")]
    Shr,
}

/// Assignment operators. The compound forms carry the binary operator they
/// apply between the old value and the right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

#[derive(Debug)]
pub(crate) enum Expr {
    Null,
    Bool(bool),
    /// The textual numeral. It is converted to a number at evaluate time.
    Number(String),
    Str(String),
    Ident(String),
    This,
    Array(Vec<Expr>),
    /// Key/value pairs in source order. Duplicate keys resolve last-wins at
    /// evaluate time.
    Object(Vec<(String, Expr)>),
    Function(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        postfix: bool,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Dot {
        object: Box<Expr>,
        name: String,
    },
    Bracket {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `test ? then : otherwise`, only the taken branch is evaluated.
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Comma expression, evaluates left to right to the last value.
    Sequence(Vec<Expr>),
    /// A single `let` binding. Appears inside variable statements and `for`
    /// initializers.
    Variable {
        name: String,
        init: Option<Box<Expr>>,
    },
}

#[derive(Debug)]
pub(crate) enum Stmt {
    Block(Vec<Stmt>),
    Expr(Expr),
    /// `let a = 1, b;` as a list of `Expr::Variable`.
    Variable(Vec<Expr>),
    If {
        test: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Option<Expr>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        /// Identifier, Dot, Bracket or Variable expression.
        target: Expr,
        source: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
    Try {
        body: Box<Stmt>,
        catch_name: String,
        catch_body: Box<Stmt>,
        finally: Option<Box<Stmt>>,
    },
    /// A named function statement. Hoisted at program and module top level.
    Function(Rc<FunctionDef>),
}
