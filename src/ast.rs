//! Intermediate representation produced by the parser.
//! One `Instruction` corresponds to one executable source line.

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Accepted by the patterns but has no evaluation rule; the
    /// interpreter rejects it with `unknown-operator`.
    Div,
}

impl BinOp {
    /// The source symbol for this operator.
    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }

    pub fn from_symbol(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(BinOp::Add),
            '-' => Some(BinOp::Sub),
            '*' => Some(BinOp::Mul),
            '/' => Some(BinOp::Div),
            _ => None,
        }
    }
}

/// A typed expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    /// Any bare token that is neither a number nor an identifier
    /// (color hex codes, opaque tags).
    Str(String),
    /// A variable lookup by name.
    Variable(String),
    /// `Ident(args)` — only `Vec2` is a recognized constructor.
    FunctionCall { name: String, args: Vec<Expression> },
    /// `left <op> right`, split once at the first operator found.
    Operation {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `ident.method(args)`
    MethodCall {
        variable: String,
        method: String,
        args: Vec<Expression>,
    },
    /// `ident.property`
    PropertyAccess { variable: String, property: String },
}

/// A trailing, comma-separated option attached to an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// Bare word or color literal (`interactive`, `reference`, `#CC3344`).
    Flag(String),
    /// `key: v1 v2 …` or `key(v1, v2)` — only `origin` is recognized
    /// semantically.
    PropertyFunction { name: String, args: Vec<Expression> },
}

/// What a single source line parsed into.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// `name = expr[, modifiers…]`
    Assignment {
        variable: String,
        expr: Expression,
        modifiers: Vec<Modifier>,
    },
    /// `name.property = expr`
    PropertyModification {
        variable: String,
        property: String,
        expr: Expression,
    },
    /// `name.method(args)`
    MethodCall {
        variable: String,
        method: String,
        args: Vec<Expression>,
    },
}

/// One parsed, executable unit plus its source attribution.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub kind: InstructionKind,
    /// 1-based source line number.
    pub line: usize,
    /// The original (trimmed) line text, kept for diagnostics.
    pub source: String,
}
