//! tree-sitter-python front-end
//!
//! Converts a concrete tree-sitter parse into the [`crate::ast`] tree. Only
//! the subset the printer can reproduce is accepted; anything else is
//! reported as [`ParseError::Unsupported`] with its line.

use crate::ast::{
    Arg, BinOp, BoolOp, ClassDef, CmpOp, CompKind, Constant, DictItem, ExceptHandler, Expr,
    FPart, FunctionDef, Generator, Module, Param, ParamKind, Stmt, UnaryOp, WithItem,
};
use crate::error::ParseError;
use tree_sitter::Node;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a Python module
///
/// # Errors
/// Returns an error if tree-sitter cannot be initialised, the source has a
/// syntax error, or it uses syntax outside the supported subset.
pub fn parse_module(source: &str) -> Result<Module> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError::ParserInit(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ParseError::ParseFailed)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root).map_or_else(
            || ParseError::syntax(&root, "invalid syntax"),
            |node| {
                if node.is_missing() {
                    ParseError::syntax(&node, format!("missing `{}`", node.kind()))
                } else {
                    ParseError::syntax(&node, "invalid syntax")
                }
            },
        ));
    }

    let body = Converter { src: source }.block(root)?;
    tracing::debug!(statements = body.len(), "parsed module");
    Ok(Module { body })
}

/// Parse a single expression, e.g. a decorator argument or a test snippet
///
/// # Errors
/// Same conditions as [`parse_module`], plus a source that is not exactly
/// one expression statement.
pub fn parse_expr(source: &str) -> Result<Expr> {
    let module = parse_module(source)?;
    match <[Stmt; 1]>::try_from(module.body) {
        Ok([Stmt::Expr(e)]) => Ok(e),
        _ => Err(ParseError::SyntaxError {
            line: 1,
            column: 1,
            message: "expected a single expression".into(),
        }),
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

/// Named children without comments
fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

fn field_all<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(name, &mut cursor).collect();
    children
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

struct Converter<'s> {
    src: &'s str,
}

impl<'s> Converter<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.src.get(node.byte_range()).unwrap_or("")
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name)
            .ok_or_else(|| ParseError::syntax(&node, format!("`{}` without {name}", node.kind())))
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>> {
        named(node)
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::syntax(&node, format!("empty `{}`", node.kind())))
    }

    fn block(&self, node: Node<'_>) -> Result<Vec<Stmt>> {
        named(node).into_iter().map(|n| self.stmt(n)).collect()
    }

    // ---- statements ----

    fn stmt(&self, node: Node<'_>) -> Result<Stmt> {
        let stmt = match node.kind() {
            "expression_statement" => {
                let children = named(node);
                match children.as_slice() {
                    [one] if one.kind() == "assignment" => self.assignment(*one)?,
                    [one] if one.kind() == "augmented_assignment" => self.aug_assignment(*one)?,
                    [one] => Stmt::Expr(self.expr(*one)?),
                    many => Stmt::Expr(Expr::Tuple(self.exprs(many)?)),
                }
            }
            "return_statement" => Stmt::Return(self.opt_expr(named(node).first().copied())?),
            "pass_statement" => Stmt::Pass,
            "break_statement" => Stmt::Break,
            "continue_statement" => Stmt::Continue,
            "delete_statement" => {
                let target = self.first_named(node)?;
                let targets = match self.expr(target)? {
                    Expr::Tuple(items) if target.kind() == "expression_list" => items,
                    single => vec![single],
                };
                Stmt::Delete(targets)
            }
            "raise_statement" => {
                let cause = node.child_by_field_name("cause");
                let exc = named(node)
                    .into_iter()
                    .find(|c| Some(c.id()) != cause.map(|n| n.id()));
                Stmt::Raise {
                    exc: self.opt_expr(exc)?,
                    cause: self.opt_expr(cause)?,
                }
            }
            "assert_statement" => {
                let parts = named(node);
                let test = self.expr(*parts.first().ok_or_else(|| ParseError::syntax(&node, "empty assert"))?)?;
                Stmt::Assert {
                    test,
                    msg: self.opt_expr(parts.get(1).copied())?,
                }
            }
            "global_statement" | "nonlocal_statement" => {
                let names = named(node)
                    .into_iter()
                    .map(|n| self.text(n).to_string())
                    .collect();
                if node.kind() == "global_statement" {
                    Stmt::Global(names)
                } else {
                    Stmt::Nonlocal(names)
                }
            }
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                Stmt::Import(self.text(node).split_whitespace().collect::<Vec<_>>().join(" "))
            }
            "if_statement" => self.if_statement(node)?,
            "while_statement" => Stmt::While {
                test: self.expr(self.field(node, "condition")?)?,
                body: self.block(self.field(node, "body")?)?,
                orelse: self.else_body(node.child_by_field_name("alternative"))?,
            },
            "for_statement" => Stmt::For {
                target: self.expr(self.field(node, "left")?)?,
                iter: self.expr(self.field(node, "right")?)?,
                body: self.block(self.field(node, "body")?)?,
                orelse: self.else_body(node.child_by_field_name("alternative"))?,
                is_async: has_token(node, "async"),
            },
            "with_statement" => self.with_statement(node)?,
            "try_statement" => self.try_statement(node)?,
            "function_definition" => Stmt::FunctionDef(self.function(node, Vec::new())?),
            "class_definition" => Stmt::ClassDef(self.class(node, Vec::new())?),
            "decorated_definition" => {
                let mut decorators = Vec::new();
                for child in named(node) {
                    if child.kind() == "decorator" {
                        decorators.push(self.expr(self.first_named(child)?)?);
                    }
                }
                let def = self.field(node, "definition")?;
                match def.kind() {
                    "function_definition" => Stmt::FunctionDef(self.function(def, decorators)?),
                    "class_definition" => Stmt::ClassDef(self.class(def, decorators)?),
                    _ => return Err(ParseError::unsupported(&def)),
                }
            }
            _ => return Err(ParseError::unsupported(&node)),
        };
        Ok(stmt)
    }

    fn assignment(&self, node: Node<'_>) -> Result<Stmt> {
        let left = self.expr(self.field(node, "left")?)?;
        if let Some(ty) = node.child_by_field_name("type") {
            return Ok(Stmt::AnnAssign {
                target: left,
                annotation: self.expr(ty)?,
                value: self.opt_expr(node.child_by_field_name("right"))?,
            });
        }

        let mut targets = vec![left];
        let mut right = self.field(node, "right")?;
        while right.kind() == "assignment" && right.child_by_field_name("type").is_none() {
            targets.push(self.expr(self.field(right, "left")?)?);
            right = self.field(right, "right")?;
        }
        Ok(Stmt::Assign {
            targets,
            value: self.expr(right)?,
        })
    }

    fn aug_assignment(&self, node: Node<'_>) -> Result<Stmt> {
        let op_node = self.field(node, "operator")?;
        let op = BinOp::from_symbol(self.text(op_node))
            .ok_or_else(|| ParseError::unsupported(&op_node))?;
        Ok(Stmt::AugAssign {
            target: self.expr(self.field(node, "left")?)?,
            op,
            value: self.expr(self.field(node, "right")?)?,
        })
    }

    fn if_statement(&self, node: Node<'_>) -> Result<Stmt> {
        let test = self.expr(self.field(node, "condition")?)?;
        let body = self.block(self.field(node, "consequence")?)?;

        // elif chains nest as a single `if` in the else branch
        let mut orelse = Vec::new();
        for alt in field_all(node, "alternative").into_iter().rev() {
            orelse = match alt.kind() {
                "else_clause" => self.block(self.field(alt, "body")?)?,
                "elif_clause" => vec![Stmt::If {
                    test: self.expr(self.field(alt, "condition")?)?,
                    body: self.block(self.field(alt, "consequence")?)?,
                    orelse,
                }],
                _ => return Err(ParseError::unsupported(&alt)),
            };
        }
        Ok(Stmt::If { test, body, orelse })
    }

    fn else_body(&self, clause: Option<Node<'_>>) -> Result<Vec<Stmt>> {
        match clause {
            Some(c) => self.block(self.field(c, "body")?),
            None => Ok(Vec::new()),
        }
    }

    fn with_statement(&self, node: Node<'_>) -> Result<Stmt> {
        let mut items = Vec::new();
        for clause in named(node).into_iter().filter(|c| c.kind() == "with_clause") {
            for item in named(clause) {
                let value = self.field(item, "value")?;
                items.push(if value.kind() == "as_pattern" {
                    let context = self.expr(self.first_named(value)?)?;
                    let alias = self.field(value, "alias")?;
                    WithItem {
                        context,
                        alias: Some(self.expr(alias)?),
                    }
                } else {
                    WithItem {
                        context: self.expr(value)?,
                        alias: None,
                    }
                });
            }
        }
        Ok(Stmt::With {
            items,
            body: self.block(self.field(node, "body")?)?,
            is_async: has_token(node, "async"),
        })
    }

    fn try_statement(&self, node: Node<'_>) -> Result<Stmt> {
        let body = self.block(self.field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        for clause in named(node) {
            match clause.kind() {
                "block" => {}
                "except_clause" => handlers.push(self.except_clause(clause)?),
                "else_clause" => orelse = self.block(self.field(clause, "body")?)?,
                "finally_clause" => {
                    let block = named(clause)
                        .into_iter()
                        .find(|c| c.kind() == "block")
                        .ok_or_else(|| ParseError::syntax(&clause, "finally without body"))?;
                    finalbody = self.block(block)?;
                }
                _ => return Err(ParseError::unsupported(&clause)),
            }
        }
        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }

    fn except_clause(&self, node: Node<'_>) -> Result<ExceptHandler> {
        let mut kind = None;
        let mut name = None;
        let mut body = Vec::new();
        for child in named(node) {
            match child.kind() {
                "block" => body = self.block(child)?,
                "as_pattern" => {
                    kind = Some(self.expr(self.first_named(child)?)?);
                    let alias = self.field(child, "alias")?;
                    name = Some(self.text(alias).to_string());
                }
                _ if kind.is_none() => kind = Some(self.expr(child)?),
                _ => name = Some(self.text(child).to_string()),
            }
        }
        Ok(ExceptHandler { kind, name, body })
    }

    fn function(&self, node: Node<'_>, decorators: Vec<Expr>) -> Result<FunctionDef> {
        Ok(FunctionDef {
            name: self.text(self.field(node, "name")?).to_string(),
            decorators,
            params: self.params(self.field(node, "parameters")?)?,
            returns: self.opt_expr(node.child_by_field_name("return_type"))?,
            body: self.block(self.field(node, "body")?)?,
            is_async: has_token(node, "async"),
        })
    }

    fn class(&self, node: Node<'_>, decorators: Vec<Expr>) -> Result<ClassDef> {
        if let Some(tp) = node.child_by_field_name("type_parameters") {
            return Err(ParseError::unsupported(&tp));
        }
        let bases = match node.child_by_field_name("superclasses") {
            Some(list) => self.args(list)?,
            None => Vec::new(),
        };
        Ok(ClassDef {
            name: self.text(self.field(node, "name")?).to_string(),
            decorators,
            bases,
            body: self.block(self.field(node, "body")?)?,
        })
    }

    fn params(&self, node: Node<'_>) -> Result<Vec<Param>> {
        named(node).into_iter().map(|p| self.param(p)).collect()
    }

    fn param(&self, node: Node<'_>) -> Result<Param> {
        let param = match node.kind() {
            "identifier" => Param::regular(self.text(node)),
            "typed_parameter" => {
                let mut param = self.param(self.first_named(node)?)?;
                param.annotation = Some(self.expr(self.field(node, "type")?)?);
                param
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = self.field(node, "name")?;
                if name.kind() != "identifier" {
                    return Err(ParseError::unsupported(&name));
                }
                Param {
                    annotation: self.opt_expr(node.child_by_field_name("type"))?,
                    default: Some(self.expr(self.field(node, "value")?)?),
                    ..Param::regular(self.text(name))
                }
            }
            "list_splat_pattern" => Param {
                kind: ParamKind::VarArgs,
                ..Param::regular(self.text(self.first_named(node)?))
            },
            "dictionary_splat_pattern" => Param {
                kind: ParamKind::KwArgs,
                ..Param::regular(self.text(self.first_named(node)?))
            },
            "keyword_separator" => Param {
                kind: ParamKind::KwOnlyMarker,
                ..Param::regular("")
            },
            "positional_separator" => Param {
                kind: ParamKind::PosOnlyMarker,
                ..Param::regular("")
            },
            _ => return Err(ParseError::unsupported(&node)),
        };
        Ok(param)
    }

    // ---- expressions ----

    fn opt_expr(&self, node: Option<Node<'_>>) -> Result<Option<Expr>> {
        node.map(|n| self.expr(n)).transpose()
    }

    fn boxed(&self, node: Node<'_>) -> Result<Box<Expr>> {
        self.expr(node).map(Box::new)
    }

    fn exprs(&self, nodes: &[Node<'_>]) -> Result<Vec<Expr>> {
        nodes.iter().map(|n| self.expr(*n)).collect()
    }

    fn expr(&self, node: Node<'_>) -> Result<Expr> {
        let expr = match node.kind() {
            "identifier" | "keyword_identifier" => Expr::Name(self.text(node).to_string()),
            "integer" => Expr::Constant(Constant::Int(self.text(node).to_string())),
            "float" => Expr::Constant(Constant::Float(self.text(node).to_string())),
            "true" => Expr::Constant(Constant::Bool(true)),
            "false" => Expr::Constant(Constant::Bool(false)),
            "none" => Expr::Constant(Constant::None),
            "ellipsis" => Expr::Constant(Constant::Ellipsis),
            "string" => self.string(node)?,
            "concatenated_string" => self.concatenated(node)?,
            "parenthesized_expression" | "type" | "as_pattern_target" | "parenthesized_list_splat" => {
                match named(node).first() {
                    Some(inner) => self.expr(*inner)?,
                    None => Expr::Name(self.text(node).to_string()),
                }
            }
            "attribute" => Expr::Attribute {
                value: self.boxed(self.field(node, "object")?)?,
                attr: self.text(self.field(node, "attribute")?).to_string(),
            },
            "subscript" => {
                let indices = field_all(node, "subscript");
                let index = match indices.as_slice() {
                    [one] => self.expr(*one)?,
                    many => Expr::Tuple(self.exprs(many)?),
                };
                Expr::subscript(self.expr(self.field(node, "value")?)?, index)
            }
            "slice" => self.slice(node)?,
            "call" => {
                let func = self.boxed(self.field(node, "function")?)?;
                let arguments = self.field(node, "arguments")?;
                let args = if arguments.kind() == "generator_expression" {
                    vec![Arg::Positional(self.expr(arguments)?)]
                } else {
                    self.args(arguments)?
                };
                Expr::Call { func, args }
            }
            "binary_operator" => {
                let op_node = self.field(node, "operator")?;
                let op = BinOp::from_symbol(self.text(op_node))
                    .ok_or_else(|| ParseError::unsupported(&op_node))?;
                Expr::BinOp {
                    left: self.boxed(self.field(node, "left")?)?,
                    op,
                    right: self.boxed(self.field(node, "right")?)?,
                }
            }
            "unary_operator" => {
                let op = match self.text(self.field(node, "operator")?) {
                    "-" => UnaryOp::Neg,
                    "+" => UnaryOp::Pos,
                    "~" => UnaryOp::Invert,
                    _ => return Err(ParseError::unsupported(&node)),
                };
                Expr::UnaryOp {
                    op,
                    operand: self.boxed(self.field(node, "argument")?)?,
                }
            }
            "not_operator" => Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: self.boxed(self.field(node, "argument")?)?,
            },
            "boolean_operator" => {
                let op = match self.text(self.field(node, "operator")?) {
                    "and" => BoolOp::And,
                    _ => BoolOp::Or,
                };
                Expr::BoolOp {
                    op,
                    left: self.boxed(self.field(node, "left")?)?,
                    right: self.boxed(self.field(node, "right")?)?,
                }
            }
            "comparison_operator" => self.comparison(node)?,
            "conditional_expression" => {
                let parts = named(node);
                let [body, test, orelse] = parts.as_slice() else {
                    return Err(ParseError::syntax(&node, "malformed conditional expression"));
                };
                Expr::IfExp {
                    body: self.boxed(*body)?,
                    test: self.boxed(*test)?,
                    orelse: self.boxed(*orelse)?,
                }
            }
            "lambda" => Expr::Lambda {
                params: match node.child_by_field_name("parameters") {
                    Some(p) => self.params(p)?,
                    None => Vec::new(),
                },
                body: self.boxed(self.field(node, "body")?)?,
            },
            "tuple" | "expression_list" | "pattern_list" | "tuple_pattern" => {
                Expr::Tuple(self.exprs(&named(node))?)
            }
            "list" | "list_pattern" => Expr::List(self.exprs(&named(node))?),
            "generic_type" => {
                let parts = named(node);
                let base = self.first_named(node)?;
                let mut args = match parts.iter().find(|p| p.kind() == "type_parameter") {
                    Some(params) => self.exprs(&named(*params))?,
                    None => Vec::new(),
                };
                let index = if args.len() == 1 {
                    args.remove(0)
                } else {
                    Expr::Tuple(args)
                };
                Expr::subscript(self.expr(base)?, index)
            }
            "union_type" => {
                let parts = named(node);
                let [left, right] = parts.as_slice() else {
                    return Err(ParseError::unsupported(&node));
                };
                Expr::binop(self.expr(*left)?, BinOp::BitOr, self.expr(*right)?)
            }
            "member_type" => {
                let parts = named(node);
                let [value, attr] = parts.as_slice() else {
                    return Err(ParseError::unsupported(&node));
                };
                Expr::attr(self.expr(*value)?, self.text(*attr))
            }
            "set" => Expr::Set(self.exprs(&named(node))?),
            "dictionary" => Expr::Dict(
                named(node)
                    .into_iter()
                    .map(|item| self.dict_item(item))
                    .collect::<Result<_>>()?,
            ),
            "list_splat" | "list_splat_pattern" => Expr::Starred(self.boxed(self.first_named(node)?)?),
            "list_comprehension" => self.comprehension(node, CompKind::List)?,
            "set_comprehension" => self.comprehension(node, CompKind::Set)?,
            "dictionary_comprehension" => self.comprehension(node, CompKind::Dict)?,
            "generator_expression" => self.comprehension(node, CompKind::Generator)?,
            "await" => Expr::Await(self.boxed(self.first_named(node)?)?),
            "named_expression" => Expr::NamedExpr {
                target: self.text(self.field(node, "name")?).to_string(),
                value: self.boxed(self.field(node, "value")?)?,
            },
            "yield" => {
                let value = named(node).first().copied();
                if has_token(node, "from") {
                    let value = value.ok_or_else(|| ParseError::syntax(&node, "yield from without value"))?;
                    Expr::YieldFrom(self.boxed(value)?)
                } else {
                    Expr::Yield(value.map(|v| self.boxed(v)).transpose()?)
                }
            }
            _ => return Err(ParseError::unsupported(&node)),
        };
        Ok(expr)
    }

    fn args(&self, node: Node<'_>) -> Result<Vec<Arg>> {
        named(node)
            .into_iter()
            .map(|a| {
                Ok(match a.kind() {
                    "keyword_argument" => Arg::Keyword(
                        self.text(self.field(a, "name")?).to_string(),
                        self.expr(self.field(a, "value")?)?,
                    ),
                    "list_splat" => Arg::Star(self.expr(self.first_named(a)?)?),
                    "dictionary_splat" => Arg::DoubleStar(self.expr(self.first_named(a)?)?),
                    _ => Arg::Positional(self.expr(a)?),
                })
            })
            .collect()
    }

    fn dict_item(&self, node: Node<'_>) -> Result<DictItem> {
        match node.kind() {
            "pair" => Ok(DictItem::Pair(
                self.expr(self.field(node, "key")?)?,
                self.expr(self.field(node, "value")?)?,
            )),
            "dictionary_splat" => Ok(DictItem::Splat(self.expr(self.first_named(node)?)?)),
            _ => Err(ParseError::unsupported(&node)),
        }
    }

    fn slice(&self, node: Node<'_>) -> Result<Expr> {
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut slot = 0;
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            if !child.is_named() && child.kind() == ":" {
                slot += 1;
            } else if child.is_named() && child.kind() != "comment" && slot < 3 {
                parts[slot] = Some(self.boxed(child)?);
            }
        }
        let [lower, upper, step] = parts;
        Ok(Expr::Slice { lower, upper, step })
    }

    fn comparison(&self, node: Node<'_>) -> Result<Expr> {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        let mut left = None;
        let mut ops = Vec::new();
        let mut pending = None;
        for child in children {
            if child.is_named() {
                if child.kind() == "comment" {
                    continue;
                }
                let operand = self.expr(child)?;
                match pending.take() {
                    Some(op) => ops.push((op, operand)),
                    None => left = Some(operand),
                }
            } else {
                let spelled = self.text(child).split_whitespace().collect::<Vec<_>>().join(" ");
                pending = Some(CmpOp::from_symbol(&spelled).ok_or_else(|| ParseError::unsupported(&child))?);
            }
        }
        let left = left.ok_or_else(|| ParseError::syntax(&node, "comparison without operand"))?;
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
        })
    }

    fn comprehension(&self, node: Node<'_>, kind: CompKind) -> Result<Expr> {
        let body = self.field(node, "body")?;
        let (element, value) = if kind == CompKind::Dict {
            (
                self.boxed(self.field(body, "key")?)?,
                Some(self.boxed(self.field(body, "value")?)?),
            )
        } else {
            (self.boxed(body)?, None)
        };

        let mut generators: Vec<Generator> = Vec::new();
        for clause in named(node) {
            match clause.kind() {
                "for_in_clause" => {
                    let rights = field_all(clause, "right");
                    let iter = match rights.as_slice() {
                        [one] => self.expr(*one)?,
                        many => Expr::Tuple(self.exprs(many)?),
                    };
                    generators.push(Generator {
                        target: self.expr(self.field(clause, "left")?)?,
                        iter,
                        ifs: Vec::new(),
                        is_async: has_token(clause, "async"),
                    });
                }
                "if_clause" => {
                    let cond = self.expr(self.first_named(clause)?)?;
                    generators
                        .last_mut()
                        .ok_or_else(|| ParseError::syntax(&clause, "`if` before `for` in comprehension"))?
                        .ifs
                        .push(cond);
                }
                _ => {}
            }
        }
        Ok(Expr::Comprehension {
            kind,
            element,
            value,
            generators,
        })
    }

    fn string(&self, node: Node<'_>) -> Result<Expr> {
        let interpolations: Vec<_> = named(node)
            .into_iter()
            .filter(|c| c.kind() == "interpolation")
            .collect();
        if interpolations.is_empty() {
            return Ok(Expr::Constant(Constant::Str(self.text(node).to_string())));
        }

        let mut parts = Vec::new();
        let mut pos = node.start_byte();
        for interp in interpolations {
            parts.push(FPart::Text(self.src.get(pos..interp.start_byte()).unwrap_or("").to_string()));
            let inner = match interp.child_by_field_name("expression") {
                Some(e) => e,
                None => self.first_named(interp)?,
            };
            // everything between the expression and the closing brace
            let suffix = self
                .src
                .get(inner.end_byte()..interp.end_byte().saturating_sub(1))
                .unwrap_or("");
            parts.push(FPart::Interpolation {
                expr: self.boxed(inner)?,
                suffix: suffix.to_string(),
            });
            pos = interp.end_byte();
        }
        parts.push(FPart::Text(self.src.get(pos..node.end_byte()).unwrap_or("").to_string()));
        Ok(Expr::FString(parts))
    }

    fn concatenated(&self, node: Node<'_>) -> Result<Expr> {
        let pieces = self.exprs(&named(node))?;
        if pieces
            .iter()
            .all(|p| matches!(p, Expr::Constant(Constant::Str(_))))
        {
            let raw: Vec<&str> = pieces
                .iter()
                .filter_map(|p| match p {
                    Expr::Constant(Constant::Str(s)) => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            return Ok(Expr::Constant(Constant::Str(raw.join(" "))));
        }

        let mut parts = Vec::new();
        for (i, piece) in pieces.into_iter().enumerate() {
            if i > 0 {
                parts.push(FPart::Text(" ".into()));
            }
            match piece {
                Expr::FString(inner) => parts.extend(inner),
                Expr::Constant(Constant::Str(s)) => parts.push(FPart::Text(s)),
                _ => return Err(ParseError::unsupported(&node)),
            }
        }
        Ok(Expr::FString(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(src: &str) -> Vec<Stmt> {
        parse_module(src).unwrap().body
    }

    #[test]
    fn parses_decorated_class() {
        let src = r#"
@version("1")
class Point:
    @at("1")
    def __init__(self, x):
        self.x = x
"#;
        let module = parse_module(src).unwrap();
        let class = module.classes().next().unwrap();
        assert_eq!(class.name, "Point");
        assert_eq!(class.decorators.len(), 1);
        let Stmt::FunctionDef(init) = &class.body[0] else {
            panic!("expected method");
        };
        assert_eq!(init.name, "__init__");
        assert_eq!(init.self_name(), Some("self"));
        assert_eq!(init.decorators.len(), 1);
        assert!(matches!(
            &init.body[0],
            Stmt::Assign { targets, .. } if targets[0].as_attr_of("self") == Some("x")
        ));
    }

    #[test]
    fn chained_and_destructuring_assignment() {
        let stmts = body("a = b = 1\nself.x, *rest = e\n");
        assert!(matches!(&stmts[0], Stmt::Assign { targets, .. } if targets.len() == 2));
        let Stmt::Assign { targets, .. } = &stmts[1] else {
            panic!("expected assignment");
        };
        let Expr::Tuple(items) = &targets[0] else {
            panic!("expected tuple target, got {:?}", targets[0]);
        };
        assert!(matches!(items[1], Expr::Starred(_)));
    }

    #[test]
    fn augmented_assignment_operator() {
        let stmts = body("self.n //= 2\n");
        assert!(matches!(
            &stmts[0],
            Stmt::AugAssign { op: BinOp::FloorDiv, .. }
        ));
    }

    #[test]
    fn comparison_with_two_word_operator() {
        let e = parse_expr("a not in b < c").unwrap();
        let Expr::Compare { ops, .. } = e else {
            panic!("expected comparison");
        };
        assert_eq!(ops.iter().map(|(op, _)| *op).collect::<Vec<_>>(), vec![CmpOp::NotIn, CmpOp::Lt]);
    }

    #[test]
    fn elif_nests_in_orelse() {
        let stmts = body("if a:\n    pass\nelif b:\n    pass\nelse:\n    x = 1\n");
        let Stmt::If { orelse, .. } = &stmts[0] else {
            panic!("expected if");
        };
        let [Stmt::If { orelse: inner, .. }] = orelse.as_slice() else {
            panic!("expected nested if");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn fstring_keeps_interpolation_expression() {
        let e = parse_expr(r#"f"v={self.x!r:>4}""#).unwrap();
        let Expr::FString(parts) = e else {
            panic!("expected f-string");
        };
        let interp = parts
            .iter()
            .find_map(|p| match p {
                FPart::Interpolation { expr, suffix } => Some((expr, suffix)),
                FPart::Text(_) => None,
            })
            .unwrap();
        assert_eq!(interp.0.as_attr_of("self"), Some("x"));
        assert_eq!(interp.1, "!r:>4");
    }

    #[test]
    fn syntax_error_has_position() {
        let err = parse_module("def f(:\n    pass\n").unwrap_err();
        assert!(matches!(err, ParseError::SyntaxError { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn unsupported_statement_is_reported() {
        let err = parse_module("match x:\n    case 1:\n        pass\n").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { ref kind, line: 1 } if kind == "match_statement"));
    }

    #[test]
    fn parameters_of_every_kind() {
        let stmts = body("def f(self, a: int, b=1, *args, c, d: str = 'x', **kw):\n    pass\n");
        let Stmt::FunctionDef(f) = &stmts[0] else {
            panic!("expected function");
        };
        let kinds: Vec<_> = f.params.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParamKind::Regular,
                ParamKind::Regular,
                ParamKind::Regular,
                ParamKind::VarArgs,
                ParamKind::Regular,
                ParamKind::Regular,
                ParamKind::KwArgs,
            ]
        );
        assert!(f.params[1].annotation.is_some());
        assert!(f.params[5].default.is_some() && f.params[5].annotation.is_some());
    }
}
