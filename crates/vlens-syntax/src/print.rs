//! Source printer
//!
//! Emits Python source from the syntax tree with four-space indentation,
//! inserting parentheses only where operator precedence requires them.

use crate::ast::{
    Arg, BinOp, BoolOp, ClassDef, CompKind, Constant, DictItem, Expr, FPart, FunctionDef,
    Generator, Module, Param, ParamKind, Stmt, UnaryOp,
};

const INDENT: &str = "    ";

/// Print a whole module
#[must_use]
pub fn print_module(module: &Module) -> String {
    let mut p = Printer::default();
    p.suite(&module.body, 2);
    p.out
}

/// Print one class definition, decorators included
#[must_use]
pub fn print_class(class: &ClassDef) -> String {
    let mut p = Printer::default();
    p.class(class);
    p.out
}

/// Print one function definition, decorators included
#[must_use]
pub fn print_function(f: &FunctionDef) -> String {
    let mut p = Printer::default();
    p.function(f);
    p.out
}

/// Print a statement list at column zero
#[must_use]
pub fn print_body(body: &[Stmt]) -> String {
    let mut p = Printer::default();
    p.suite(body, 0);
    p.out
}

/// Print an expression as it would appear on the right of `=`
#[must_use]
pub fn print_expr(expr: &Expr) -> String {
    top(expr)
}

// Binding strength, loosest first
const LAMBDA: u8 = 0;
const IFEXP: u8 = 1;
const OR: u8 = 2;
const AND: u8 = 3;
const NOT: u8 = 4;
const CMP: u8 = 5;
const BOR: u8 = 6;
const FACTOR: u8 = 12;
const POW: u8 = 13;
const AWAIT: u8 = 14;
const PRIMARY: u8 = 15;
const ATOM: u8 = 16;

fn binop_prec(op: BinOp) -> u8 {
    match op {
        BinOp::BitOr => BOR,
        BinOp::BitXor => 7,
        BinOp::BitAnd => 8,
        BinOp::LShift | BinOp::RShift => 9,
        BinOp::Add | BinOp::Sub => 10,
        BinOp::Mult | BinOp::MatMult | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 11,
        BinOp::Pow => POW,
    }
}

fn prec(e: &Expr) -> u8 {
    match e {
        Expr::Lambda { .. } | Expr::Yield(_) | Expr::YieldFrom(_) => LAMBDA,
        Expr::IfExp { .. } => IFEXP,
        Expr::BoolOp { op: BoolOp::Or, .. } => OR,
        Expr::BoolOp { op: BoolOp::And, .. } => AND,
        Expr::UnaryOp { op: UnaryOp::Not, .. } => NOT,
        Expr::UnaryOp { .. } => FACTOR,
        Expr::Compare { .. } => CMP,
        Expr::BinOp { op, .. } => binop_prec(*op),
        Expr::Await(_) => AWAIT,
        Expr::Attribute { .. } | Expr::Subscript { .. } | Expr::Call { .. } => PRIMARY,
        _ => ATOM,
    }
}

/// Expression in a context that tolerates a bare tuple
fn top(e: &Expr) -> String {
    match e {
        Expr::Tuple(items) if !items.is_empty() => tuple_items(items),
        _ => at(e, LAMBDA),
    }
}

fn tuple_items(items: &[Expr]) -> String {
    if let [one] = items {
        format!("{},", at(one, LAMBDA))
    } else {
        items.iter().map(|i| at(i, LAMBDA)).collect::<Vec<_>>().join(", ")
    }
}

/// Expression that must bind at least as tightly as `min`
fn at(e: &Expr, min: u8) -> String {
    let s = bare(e);
    if prec(e) < min {
        format!("({s})")
    } else {
        s
    }
}

fn bare(e: &Expr) -> String {
    match e {
        Expr::Name(id) => id.clone(),
        Expr::Constant(c) => constant(c),
        Expr::FString(parts) => parts
            .iter()
            .map(|p| match p {
                FPart::Text(t) => t.clone(),
                FPart::Interpolation { expr, suffix } => {
                    let inner = top(expr);
                    if inner.starts_with('{') {
                        format!("{{ {inner}{suffix}}}")
                    } else {
                        format!("{{{inner}{suffix}}}")
                    }
                }
            })
            .collect(),
        Expr::Attribute { value, attr } => format!("{}.{attr}", at(value, PRIMARY)),
        Expr::Subscript { value, index } => format!("{}[{}]", at(value, PRIMARY), top(index)),
        Expr::Slice { lower, upper, step } => {
            let part = |p: &Option<Box<Expr>>| p.as_ref().map_or_else(String::new, |e| at(e, IFEXP));
            match step {
                Some(_) => format!("{}:{}:{}", part(lower), part(upper), part(step)),
                None => format!("{}:{}", part(lower), part(upper)),
            }
        }
        Expr::Call { func, args } => format!("{}({})", at(func, PRIMARY), call_args(args)),
        Expr::BinOp { left, op, right } => {
            let p = binop_prec(*op);
            let (l, r) = if *op == BinOp::Pow {
                (at(left, AWAIT), at(right, FACTOR))
            } else {
                (at(left, p), at(right, p + 1))
            };
            format!("{l} {} {r}", op.symbol())
        }
        Expr::UnaryOp { op, operand } => match op {
            UnaryOp::Not => format!("not {}", at(operand, NOT)),
            UnaryOp::Neg => format!("-{}", at(operand, FACTOR)),
            UnaryOp::Pos => format!("+{}", at(operand, FACTOR)),
            UnaryOp::Invert => format!("~{}", at(operand, FACTOR)),
        },
        Expr::BoolOp { op, left, right } => {
            let (p, word) = match op {
                BoolOp::Or => (OR, "or"),
                BoolOp::And => (AND, "and"),
            };
            format!("{} {word} {}", at(left, p), at(right, p + 1))
        }
        Expr::Compare { left, ops } => {
            let mut s = at(left, BOR);
            for (op, operand) in ops {
                s.push_str(&format!(" {} {}", op.symbol(), at(operand, BOR)));
            }
            s
        }
        Expr::IfExp { body, test, orelse } => format!(
            "{} if {} else {}",
            at(body, OR),
            at(test, OR),
            at(orelse, IFEXP)
        ),
        Expr::Lambda { params, body } => {
            if params.is_empty() {
                format!("lambda: {}", at(body, LAMBDA))
            } else {
                format!("lambda {}: {}", param_list(params), at(body, LAMBDA))
            }
        }
        Expr::Tuple(items) => {
            if items.is_empty() {
                "()".into()
            } else {
                format!("({})", tuple_items(items))
            }
        }
        Expr::List(items) => format!("[{}]", comma(items)),
        Expr::Set(items) if items.is_empty() => "set()".into(),
        Expr::Set(items) => format!("{{{}}}", comma(items)),
        Expr::Dict(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    DictItem::Pair(k, v) => format!("{}: {}", at(k, LAMBDA), at(v, LAMBDA)),
                    DictItem::Splat(e) => format!("**{}", at(e, BOR)),
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Expr::Starred(value) => format!("*{}", at(value, BOR)),
        Expr::Comprehension {
            kind,
            element,
            value,
            generators,
        } => {
            let head = match value {
                Some(v) => format!("{}: {}", at(element, LAMBDA), at(v, LAMBDA)),
                None => at(element, LAMBDA),
            };
            let inner = format!("{head}{}", clauses(generators));
            match kind {
                CompKind::List => format!("[{inner}]"),
                CompKind::Set | CompKind::Dict => format!("{{{inner}}}"),
                CompKind::Generator => format!("({inner})"),
            }
        }
        Expr::Await(value) => format!("await {}", at(value, PRIMARY)),
        Expr::NamedExpr { target, value } => format!("({target} := {})", at(value, LAMBDA)),
        Expr::Yield(None) => "(yield)".into(),
        Expr::Yield(Some(value)) => format!("(yield {})", top(value)),
        Expr::YieldFrom(value) => format!("(yield from {})", at(value, LAMBDA)),
    }
}

/// Yield expressions print without parentheses where a statement allows it
fn statement_value(e: &Expr) -> String {
    match e {
        Expr::Yield(None) => "yield".into(),
        Expr::Yield(Some(value)) => format!("yield {}", top(value)),
        Expr::YieldFrom(value) => format!("yield from {}", at(value, LAMBDA)),
        _ => top(e),
    }
}

fn comma(items: &[Expr]) -> String {
    items.iter().map(|i| at(i, LAMBDA)).collect::<Vec<_>>().join(", ")
}

fn clauses(generators: &[Generator]) -> String {
    let mut s = String::new();
    for g in generators {
        let kw = if g.is_async { " async for " } else { " for " };
        s.push_str(&format!("{kw}{} in {}", top(&g.target), at(&g.iter, OR)));
        for cond in &g.ifs {
            s.push_str(&format!(" if {}", at(cond, OR)));
        }
    }
    s
}

fn call_args(args: &[Arg]) -> String {
    if let [Arg::Positional(gen @ Expr::Comprehension { kind: CompKind::Generator, .. })] = args {
        let s = bare(gen);
        return s[1..s.len() - 1].to_string();
    }
    args.iter()
        .map(|a| match a {
            Arg::Positional(e) => at(e, LAMBDA),
            Arg::Keyword(k, e) => format!("{k}={}", at(e, LAMBDA)),
            Arg::Star(e) => format!("*{}", at(e, BOR)),
            Arg::DoubleStar(e) => format!("**{}", at(e, BOR)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn param_list(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| {
            let mut s = match p.kind {
                ParamKind::Regular => p.name.clone(),
                ParamKind::VarArgs => format!("*{}", p.name),
                ParamKind::KwArgs => format!("**{}", p.name),
                ParamKind::KwOnlyMarker => return "*".to_string(),
                ParamKind::PosOnlyMarker => return "/".to_string(),
            };
            if let Some(a) = &p.annotation {
                s.push_str(&format!(": {}", at(a, LAMBDA)));
            }
            if let Some(d) = &p.default {
                if p.annotation.is_some() {
                    s.push_str(&format!(" = {}", at(d, LAMBDA)));
                } else {
                    s.push_str(&format!("={}", at(d, LAMBDA)));
                }
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn constant(c: &Constant) -> String {
    match c {
        Constant::Int(s) | Constant::Float(s) | Constant::Str(s) => s.clone(),
        Constant::Bool(true) => "True".into(),
        Constant::Bool(false) => "False".into(),
        Constant::None => "None".into(),
        Constant::Ellipsis => "...".into(),
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    level: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn indented(&mut self, body: &[Stmt]) {
        self.level += 1;
        if body.is_empty() {
            self.line("pass");
        } else {
            self.suite(body, 1);
        }
        self.level -= 1;
    }

    /// Statements, with `gap` blank lines around definitions
    fn suite(&mut self, body: &[Stmt], gap: usize) {
        for (i, stmt) in body.iter().enumerate() {
            let is_def = matches!(stmt, Stmt::FunctionDef(_) | Stmt::ClassDef(_));
            let prev_def = i > 0 && matches!(body[i - 1], Stmt::FunctionDef(_) | Stmt::ClassDef(_));
            if i > 0 && (is_def || prev_def) {
                for _ in 0..gap {
                    self.blank();
                }
            }
            self.stmt(stmt);
        }
    }

    fn decorators(&mut self, decorators: &[Expr]) {
        for d in decorators {
            self.line(&format!("@{}", at(d, LAMBDA)));
        }
    }

    fn function(&mut self, f: &FunctionDef) {
        self.decorators(&f.decorators);
        let prefix = if f.is_async { "async def" } else { "def" };
        let returns = f
            .returns
            .as_ref()
            .map_or_else(String::new, |r| format!(" -> {}", at(r, LAMBDA)));
        self.line(&format!("{prefix} {}({}){returns}:", f.name, param_list(&f.params)));
        self.indented(&f.body);
    }

    fn class(&mut self, c: &ClassDef) {
        self.decorators(&c.decorators);
        if c.bases.is_empty() {
            self.line(&format!("class {}:", c.name));
        } else {
            self.line(&format!("class {}({}):", c.name, call_args(&c.bases)));
        }
        self.indented(&c.body);
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => self.line(&statement_value(e)),
            Stmt::Assign { targets, value } => {
                let mut s: Vec<String> = targets.iter().map(top).collect();
                s.push(statement_value(value));
                self.line(&s.join(" = "));
            }
            Stmt::AugAssign { target, op, value } => {
                self.line(&format!("{} {}= {}", top(target), op.symbol(), statement_value(value)));
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let mut s = format!("{}: {}", at(target, PRIMARY), at(annotation, LAMBDA));
                if let Some(v) = value {
                    s.push_str(&format!(" = {}", statement_value(v)));
                }
                self.line(&s);
            }
            Stmt::Return(None) => self.line("return"),
            Stmt::Return(Some(v)) => self.line(&format!("return {}", top(v))),
            Stmt::If { test, body, orelse } => self.if_chain("if", test, body, orelse),
            Stmt::While { test, body, orelse } => {
                self.line(&format!("while {}:", at(test, LAMBDA)));
                self.indented(body);
                self.else_block(orelse);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => {
                let kw = if *is_async { "async for" } else { "for" };
                self.line(&format!("{kw} {} in {}:", top(target), top(iter)));
                self.indented(body);
                self.else_block(orelse);
            }
            Stmt::With {
                items,
                body,
                is_async,
            } => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| match &item.alias {
                        Some(alias) => format!("{} as {}", at(&item.context, LAMBDA), at(alias, PRIMARY)),
                        None => at(&item.context, LAMBDA),
                    })
                    .collect();
                let kw = if *is_async { "async with" } else { "with" };
                self.line(&format!("{kw} {}:", items.join(", ")));
                self.indented(body);
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.line("try:");
                self.indented(body);
                for h in handlers {
                    let head = match (&h.kind, &h.name) {
                        (Some(k), Some(n)) => format!("except {} as {n}:", at(k, LAMBDA)),
                        (Some(k), None) => format!("except {}:", at(k, LAMBDA)),
                        (None, _) => "except:".to_string(),
                    };
                    self.line(&head);
                    self.indented(&h.body);
                }
                self.else_block(orelse);
                if !finalbody.is_empty() {
                    self.line("finally:");
                    self.indented(finalbody);
                }
            }
            Stmt::Raise { exc, cause } => {
                let mut s = "raise".to_string();
                if let Some(e) = exc {
                    s.push_str(&format!(" {}", at(e, LAMBDA)));
                }
                if let Some(c) = cause {
                    s.push_str(&format!(" from {}", at(c, LAMBDA)));
                }
                self.line(&s);
            }
            Stmt::Assert { test, msg } => match msg {
                Some(m) => self.line(&format!("assert {}, {}", at(test, LAMBDA), at(m, LAMBDA))),
                None => self.line(&format!("assert {}", at(test, LAMBDA))),
            },
            Stmt::Delete(targets) => self.line(&format!("del {}", comma(targets))),
            Stmt::Pass => self.line("pass"),
            Stmt::Break => self.line("break"),
            Stmt::Continue => self.line("continue"),
            Stmt::Global(names) => self.line(&format!("global {}", names.join(", "))),
            Stmt::Nonlocal(names) => self.line(&format!("nonlocal {}", names.join(", "))),
            Stmt::Import(text) => self.line(text),
            Stmt::FunctionDef(f) => self.function(f),
            Stmt::ClassDef(c) => self.class(c),
        }
    }

    fn if_chain(&mut self, kw: &str, test: &Expr, body: &[Stmt], orelse: &[Stmt]) {
        self.line(&format!("{kw} {}:", at(test, LAMBDA)));
        self.indented(body);
        match orelse {
            [] => {}
            [Stmt::If { test, body, orelse }] => self.if_chain("elif", test, body, orelse),
            _ => {
                self.line("else:");
                self.indented(orelse);
            }
        }
    }

    fn else_block(&mut self, orelse: &[Stmt]) {
        if !orelse.is_empty() {
            self.line("else:");
            self.indented(orelse);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_expr, parse_module};
    use pretty_assertions::assert_eq;

    fn round_trip(src: &str) -> String {
        print_module(&parse_module(src).unwrap())
    }

    #[test]
    fn keeps_needed_parentheses_only() {
        for src in [
            "(a + b) * c",
            "a + b * c",
            "a - (b - c)",
            "a ** -b",
            "(a ** b) ** c",
            "-(a + b)",
            "not (a and b)",
            "(lambda: 1)()",
            "(a, b)[0]",
            "(x if c else y) if d else z",
        ] {
            assert_eq!(print_expr(&parse_expr(src).unwrap()), src);
        }
    }

    #[test]
    fn drops_redundant_parentheses() {
        assert_eq!(print_expr(&parse_expr("(a * b) + c").unwrap()), "a * b + c");
        assert_eq!(print_expr(&parse_expr("x if c else (y if d else z)").unwrap()), "x if c else y if d else z");
        assert_eq!(print_expr(&parse_expr("((x))").unwrap()), "x");
    }

    #[test]
    fn statement_forms_round_trip() {
        let src = "\
class C(Base, metaclass=M):
    def m(self, a, *args, k=1, **kw):
        self.x, y = a, 1
        self.n += 1
        for i, v in enumerate(args):
            if v:
                continue
            elif i:
                break
            else:
                pass
        with open(a) as fh, lock:
            return [v for v in fh if v]
        try:
            raise ValueError('x') from None
        except (KeyError, ValueError) as err:
            del y
        finally:
            assert a, 'msg'

    async def n(self):
        await self.m(1)
";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn empty_body_prints_pass() {
        let f = FunctionDef::method("noop", "self");
        assert_eq!(print_function(&FunctionDef { body: Vec::new(), ..f }), "def noop(self):\n    pass\n");
    }

    #[test]
    fn singleton_tuple_and_generator_argument() {
        assert_eq!(round_trip("x = 1,\n"), "x = 1,\n");
        assert_eq!(round_trip("sum(v for v in xs)\n"), "sum(v for v in xs)\n");
        assert_eq!(round_trip("f((1,))\n"), "f((1,))\n");
    }

    #[test]
    fn fstring_survives() {
        assert_eq!(round_trip("s = f'{self.x!r} and {y:>3}'\n"), "s = f'{self.x!r} and {y:>3}'\n");
    }
}
