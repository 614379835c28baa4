//! Syntax tree for the supported Python subset
//!
//! The tree is deliberately close to Python's own `ast` module so that the
//! printer can round-trip anything the front-end accepts.

/// A whole source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Top-level statements in source order
    pub body: Vec<Stmt>,
}

impl Module {
    /// Class definitions at module level
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::ClassDef(class) => Some(class),
            _ => None,
        })
    }
}

/// Class definition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub decorators: Vec<Expr>,
    pub bases: Vec<Arg>,
    pub body: Vec<Stmt>,
}

/// Function or method definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub decorators: Vec<Expr>,
    pub params: Vec<Param>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

impl FunctionDef {
    /// Plain `def name(self): pass`
    #[must_use]
    pub fn method(name: impl Into<String>, self_name: &str) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            params: vec![Param::regular(self_name)],
            returns: None,
            body: vec![Stmt::Pass],
            is_async: false,
        }
    }

    /// Name bound to the instance: the first positional parameter
    #[must_use]
    pub fn self_name(&self) -> Option<&str> {
        self.params
            .first()
            .filter(|p| p.kind == ParamKind::Regular)
            .map(|p| p.name.as_str())
    }

    /// Parameters after the instance parameter
    #[must_use]
    pub fn signature(&self) -> Signature {
        let skip = usize::from(self.self_name().is_some());
        Signature {
            params: self
                .params
                .iter()
                .skip(skip)
                .map(|p| (p.name.clone(), p.kind, p.default.is_some()))
                .collect(),
        }
    }
}

/// Shape of a parameter list, used to compare members across versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    /// `(name, kind, has_default)` per parameter
    pub params: Vec<(String, ParamKind, bool)>,
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .params
            .iter()
            .map(|(name, kind, default)| {
                let mut s = match kind {
                    ParamKind::Regular => name.clone(),
                    ParamKind::VarArgs => format!("*{name}"),
                    ParamKind::KwArgs => format!("**{name}"),
                    ParamKind::KwOnlyMarker => "*".to_string(),
                    ParamKind::PosOnlyMarker => "/".to_string(),
                };
                if *default {
                    s.push_str("=…");
                }
                s
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

impl Param {
    /// Plain positional-or-keyword parameter
    #[must_use]
    pub fn regular(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Regular,
            annotation: None,
            default: None,
        }
    }
}

/// Parameter flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Regular,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
    /// Bare `*`
    KwOnlyMarker,
    /// Bare `/`
    PosOnlyMarker,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `t1 = t2 = value`
    Assign { targets: Vec<Expr>, value: Expr },
    AugAssign { target: Expr, op: BinOp, value: Expr },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        is_async: bool,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Assert { test: Expr, msg: Option<Expr> },
    Delete(Vec<Expr>),
    Pass,
    Break,
    Continue,
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    /// Import statement kept as source text
    Import(String),
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
}

/// `with` item
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub alias: Option<Expr>,
}

/// `except` clause
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Constant(Constant),
    /// f-string: literal source slices interleaved with interpolations
    FString(Vec<FPart>),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    IfExp {
        body: Box<Expr>,
        test: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<DictItem>),
    Starred(Box<Expr>),
    Comprehension {
        kind: CompKind,
        element: Box<Expr>,
        /// Value half of a dict comprehension
        value: Option<Box<Expr>>,
        generators: Vec<Generator>,
    },
    Await(Box<Expr>),
    /// `name := value`
    NamedExpr {
        target: String,
        value: Box<Expr>,
    },
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
}

impl Expr {
    /// Bare identifier
    #[inline]
    #[must_use]
    pub fn name(id: impl Into<String>) -> Self {
        Self::Name(id.into())
    }

    /// `value.attr`
    #[inline]
    #[must_use]
    pub fn attr(value: Expr, attr: impl Into<String>) -> Self {
        Self::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
    }

    /// `func(args...)`
    #[inline]
    #[must_use]
    pub fn call(func: Expr, args: Vec<Arg>) -> Self {
        Self::Call {
            func: Box::new(func),
            args,
        }
    }

    /// `value[index]`
    #[inline]
    #[must_use]
    pub fn subscript(value: Expr, index: Expr) -> Self {
        Self::Subscript {
            value: Box::new(value),
            index: Box::new(index),
        }
    }

    /// Integer literal
    #[inline]
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Constant(Constant::Int(value.to_string()))
    }

    /// `left op right`
    #[inline]
    #[must_use]
    pub fn binop(left: Expr, op: BinOp, right: Expr) -> Self {
        Self::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// If this is `<owner>.<attr>` with `owner` a bare name, return `attr`
    #[must_use]
    pub fn as_attr_of(&self, owner: &str) -> Option<&str> {
        match self {
            Expr::Attribute { value, attr } => match value.as_ref() {
                Expr::Name(id) if id == owner => Some(attr.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Names and constants can be duplicated without changing evaluation
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        matches!(self, Expr::Name(_) | Expr::Constant(_))
    }
}

/// Literal constant; numbers and strings keep their source spelling
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(String),
    Float(String),
    /// Full literal including prefix and quotes
    Str(String),
    Bool(bool),
    None,
    Ellipsis,
}

/// Piece of an f-string
#[derive(Debug, Clone, PartialEq)]
pub enum FPart {
    /// Verbatim source text
    Text(String),
    /// `{expr<suffix>}` where suffix holds `!r`, `=`, `:fmt` as written
    Interpolation { expr: Box<Expr>, suffix: String },
}

/// Call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
    Star(Expr),
    DoubleStar(Expr),
}

impl Arg {
    /// Argument value regardless of form
    #[must_use]
    pub fn value(&self) -> &Expr {
        match self {
            Arg::Positional(e) | Arg::Keyword(_, e) | Arg::Star(e) | Arg::DoubleStar(e) => e,
        }
    }

    /// Mutable argument value regardless of form
    pub fn value_mut(&mut self) -> &mut Expr {
        match self {
            Arg::Positional(e) | Arg::Keyword(_, e) | Arg::Star(e) | Arg::DoubleStar(e) => e,
        }
    }
}

/// Dictionary display entry
#[derive(Debug, Clone, PartialEq)]
pub enum DictItem {
    Pair(Expr, Expr),
    Splat(Expr),
}

/// Comprehension flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    Dict,
    Generator,
}

/// `for target in iter if cond...` clause
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    /// Source spelling
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::MatMult => "@",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
        }
    }

    /// Parse a binary or augmented operator token (`+` or `+=`)
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.strip_suffix('=').unwrap_or(symbol) {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mult,
            "@" => BinOp::MatMult,
            "/" => BinOp::Div,
            "//" => BinOp::FloorDiv,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            "<<" => BinOp::LShift,
            ">>" => BinOp::RShift,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            "&" => BinOp::BitAnd,
            _ => return None,
        };
        Some(op)
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

/// Short-circuit operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    /// Source spelling
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }

    /// Parse an operator as spelled in source
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => CmpOp::Eq,
            "!=" | "<>" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtE,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtE,
            "is" => CmpOp::Is,
            "is not" => CmpOp::IsNot,
            "in" => CmpOp::In,
            "not in" => CmpOp::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_symbols_round_trip() {
        for op in [BinOp::Add, BinOp::FloorDiv, BinOp::Pow, BinOp::MatMult, BinOp::RShift] {
            assert_eq!(BinOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinOp::from_symbol("+="), Some(BinOp::Add));
        assert_eq!(BinOp::from_symbol("**="), Some(BinOp::Pow));
        assert_eq!(BinOp::from_symbol("and"), None);
    }

    #[test]
    fn self_name_and_signature() {
        let mut f = FunctionDef::method("get", "self");
        f.params.push(Param::regular("key"));
        f.params.push(Param {
            default: Some(Expr::Constant(Constant::None)),
            ..Param::regular("fallback")
        });
        assert_eq!(f.self_name(), Some("self"));
        assert_eq!(f.signature().to_string(), "(key, fallback=…)");
    }

    #[test]
    fn attr_of_owner() {
        let e = Expr::attr(Expr::name("self"), "x");
        assert_eq!(e.as_attr_of("self"), Some("x"));
        assert_eq!(e.as_attr_of("other"), None);
        assert_eq!(Expr::name("x").as_attr_of("self"), None);
    }
}
