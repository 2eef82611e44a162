//! **Abstract syntax tree** for Rox programs.
//!
//! Both node families are closed sum types; the resolver and interpreter
//! dispatch over them with exhaustive `match`es. Nodes borrow their tokens
//! from the token buffer produced by the scanner, hence the `'a` lifetime.

use crate::token::Token;

/// Identity of a reference expression (variable read, assignment, `this`,
/// `super`). Assigned by the parser, unique within one parse, and used as
/// the key of the resolver's distance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Bool(bool),

    Nil,
}

/// Parameters and body shared by function declarations, methods and
/// anonymous `fun` expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<'a> {
    /// `None` for anonymous functions.
    pub name: Option<&'a Token<'a>>,

    pub params: Vec<&'a Token<'a>>,

    pub body: Vec<Stmt<'a>>,
}

impl<'a> FunctionDecl<'a> {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn display_name(&self) -> &'a str {
        self.name.map_or("anonymous", |t| t.lexeme)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl<'a> {
    pub name: &'a Token<'a>,

    /// Always an [`Expr::Variable`] when present.
    pub superclass: Option<Expr<'a>>,

    pub methods: Vec<FunctionDecl<'a>>,

    pub static_methods: Vec<FunctionDecl<'a>>,
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Variable access.
    Variable { id: ExprId, name: &'a Token<'a> },

    /// `identifier "=" expression`
    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr<'a>>,
        then_branch: Box<Expr<'a>>,
        else_branch: Box<Expr<'a>>,
    },

    /// Infix binary operator expression, e.g. `a + b`, `x <= y`.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Prefix `!` or `-`.
    Unary {
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr<'a>>),

    /// Function‑ or method‑call expression.
    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// Anonymous `fun (params) { body }`.
    Function(FunctionDecl<'a>),

    /// object.property
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// object.property = value
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    This { id: ExprId, keyword: &'a Token<'a> },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
    },
}

/// Every kind of *statement*. A program is a sequence of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression(Expr<'a>),

    Print(Expr<'a>),

    /// Produced by both `var x = …;` and `x := …;`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `increment` is only set by `for` desugaring; it runs after each
    /// iteration, including ones cut short by `continue`.
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
        increment: Option<Expr<'a>>,
    },

    Break(&'a Token<'a>),

    Continue(&'a Token<'a>),

    Function(FunctionDecl<'a>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },

    Class(ClassDecl<'a>),
}
