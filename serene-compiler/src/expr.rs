// Expression grammar: tagged tree -> Expr -> Rust text
//
// The parser nests expression -> term -> base_expression -> literal, each
// level holding one tagged child (plus operators and postfix forms where the
// grammar allows them). All levels collapse into one `Expr` here and are
// lowered by a single recursive function.
//
// INVARIANT: an unrecognized alternative at any level is an error. Nothing
// lowers to empty text.

use serde_json::Value;

use crate::ast::{Accessor, CallArg, Expr, InfixOp, Literal, LiteralKind, Method, UnaryOp};
use crate::error::CompileError;
use crate::function::Signatures;
use crate::names::rust_name;
use crate::scope::ScopeStack;
use crate::trace::trace;
use crate::tree_reader::{scalar_text, single_child, tag_map, tagged_sequence};

// ============================================================================
// Parsing
// ============================================================================

/// Parse the content of an `expression` node: an operand/operator sequence.
pub fn parse_expression(content: &Value) -> Result<Expr, CompileError> {
    let nodes = tagged_sequence(content)?;
    if nodes.is_empty() {
        return Err(CompileError::malformed("empty expression"));
    }

    let mut first: Option<Expr> = None;
    let mut rest: Vec<(InfixOp, Expr)> = Vec::new();
    let mut pending_op: Option<InfixOp> = None;
    let mut unaries: Vec<UnaryOp> = Vec::new();
    let mut expecting_operand = true;

    for node in nodes {
        match node.tag {
            "unary_op" if expecting_operand => {
                unaries.push(UnaryOp::from_token(&node.text()?)?);
            }
            "term" if expecting_operand => {
                let mut operand = parse_term(node.content)?;
                while let Some(op) = unaries.pop() {
                    operand = Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    };
                }
                match pending_op.take() {
                    Some(op) => rest.push((op, operand)),
                    None => first = Some(operand),
                }
                expecting_operand = false;
            }
            "infix_op" if !expecting_operand => {
                pending_op = Some(InfixOp::from_token(&node.text()?)?);
                expecting_operand = true;
            }
            "term" | "unary_op" | "infix_op" => {
                return Err(CompileError::malformed(format!(
                    "'{}' out of place in expression",
                    node.tag
                )));
            }
            other => return Err(CompileError::unknown("expression element", other)),
        }
    }

    let first = match first {
        Some(expr) if !expecting_operand => expr,
        _ => return Err(CompileError::malformed("expression ends without an operand")),
    };
    if rest.is_empty() {
        Ok(first)
    } else {
        Ok(Expr::Infix {
            first: Box::new(first),
            rest,
        })
    }
}

/// Parse the content of a `term` node: one base expression followed by
/// postfix field accesses, method calls and index calls.
pub fn parse_term(content: &Value) -> Result<Expr, CompileError> {
    let nodes = tagged_sequence(content)?;
    let (head, postfix) = nodes
        .split_first()
        .ok_or_else(|| CompileError::malformed("empty term"))?;
    head.expect_tag("base_expression")?;
    let mut expr = parse_base_expression(head.content)?;

    for node in postfix {
        expr = match node.tag {
            "field_access" => {
                let fields = tag_map(node.content, "field_access")?;
                fields.only(&["identifier"])?;
                Expr::Field {
                    base: Box::new(expr),
                    field: fields.require_text("identifier")?,
                }
            }
            "method_call" => {
                let fields = tag_map(node.content, "method_call")?;
                fields.only(&["identifier", "mutate_method_symbol", "function_call_parameters"])?;
                let method = Method::from_name(&fields.require_text("identifier")?)?;
                let args = match fields.get("function_call_parameters") {
                    Some(params) => parse_call_args(params)?,
                    None => Vec::new(),
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    if arg.accessor != Accessor::Look {
                        return Err(CompileError::Scope(format!(
                            "Arguments to method '{}' cannot carry an accessor.",
                            method.name()
                        )));
                    }
                    values.push(arg.value);
                }
                Expr::MethodCall {
                    receiver: Box::new(expr),
                    method,
                    mutating: fields.contains("mutate_method_symbol"),
                    args: values,
                }
            }
            "index_call" => {
                let fields = tag_map(node.content, "index_call")?;
                fields.only(&["expression"])?;
                Expr::Index {
                    base: Box::new(expr),
                    index: Box::new(parse_expression(fields.require("expression")?)?),
                }
            }
            other => return Err(CompileError::unknown("term postfix", other)),
        };
    }
    Ok(expr)
}

pub fn parse_base_expression(content: &Value) -> Result<Expr, CompileError> {
    let node = single_child(content)?;
    match node.tag {
        "literal" => match single_child(node.content) {
            Ok(inner) if inner.tag == "collection_literal" => {
                let mut items = Vec::new();
                for item in inner.children()? {
                    item.expect_tag("expression")?;
                    items.push(parse_expression(item.content)?);
                }
                Ok(Expr::Collection(items))
            }
            _ => Ok(Expr::Literal(parse_literal(node.content)?)),
        },
        "identifier" => Ok(Expr::Identifier(node.text()?)),
        "function_call" => {
            let fields = tag_map(node.content, "function_call")?;
            fields.only(&["identifier", "function_call_parameters"])?;
            let args = match fields.get("function_call_parameters") {
                Some(params) => parse_call_args(params)?,
                None => Vec::new(),
            };
            Ok(Expr::Call {
                name: fields.require_text("identifier")?,
                args,
            })
        }
        "expression" => Ok(Expr::Paren(Box::new(parse_expression(node.content)?))),
        other => Err(CompileError::unknown("base expression", other)),
    }
}

/// A literal holds its text directly, or one typed literal node.
pub fn parse_literal(content: &Value) -> Result<Literal, CompileError> {
    if let Some(text) = scalar_text(content) {
        if text.trim().is_empty() {
            return Err(CompileError::malformed("literal without text"));
        }
        return Ok(Literal {
            kind: LiteralKind::Verbatim,
            text,
        });
    }
    let node = single_child(content)?;
    Ok(Literal {
        kind: LiteralKind::from_tag(node.tag)?,
        text: node.text()?,
    })
}

fn parse_call_args(content: &Value) -> Result<Vec<CallArg>, CompileError> {
    let mut args = Vec::new();
    for node in tagged_sequence(content)? {
        node.expect_tag("function_call_parameter")?;
        let fields = tag_map(node.content, "function_call_parameter")?;
        fields.only(&["accessor", "expression"])?;
        let token = match fields.get("accessor") {
            Some(_) => Some(fields.require_text("accessor")?),
            None => None,
        };
        args.push(CallArg {
            accessor: Accessor::resolve(token.as_deref())?,
            value: parse_expression(fields.require("expression")?)?,
        });
    }
    Ok(args)
}

// ============================================================================
// Lowering
// ============================================================================

/// Per-function lowering state.
pub struct LowerCtx<'s> {
    signatures: &'s Signatures,
    pub scope: ScopeStack,
    /// The enclosing function declares a return type.
    pub returns_value: bool,
}

impl<'s> LowerCtx<'s> {
    pub fn new(signatures: &'s Signatures, returns_value: bool) -> Self {
        LowerCtx {
            signatures,
            scope: ScopeStack::new(),
            returns_value,
        }
    }
}

/// Lower an expression for use as a value operand.
pub fn lower_expr(expr: &Expr, ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    match expr {
        Expr::Literal(literal) => lower_literal(literal),
        Expr::Identifier(name) => {
            let by_reference = ctx.scope.check_read(name)?.reference().is_some();
            let rust = rust_name(name)?;
            if by_reference {
                Ok(format!("(*{})", rust))
            } else {
                Ok(rust)
            }
        }
        Expr::Field { .. } | Expr::Index { .. } => lower_place(expr, ctx),
        Expr::Call { name, args } => lower_call(name, args, ctx),
        Expr::MethodCall {
            receiver,
            method,
            mutating,
            args,
        } => lower_method_call(receiver, *method, *mutating, args, ctx),
        Expr::Unary { op, operand } => Ok(format!("{}{}", op.as_rust(), lower_expr(operand, ctx)?)),
        Expr::Infix { first, rest } => {
            let mut code = lower_expr(first, ctx)?;
            for (op, operand) in rest {
                code.push(' ');
                code.push_str(op.as_rust());
                code.push(' ');
                code.push_str(&lower_expr(operand, ctx)?);
            }
            Ok(code)
        }
        Expr::Paren(inner) => Ok(format!("({})", lower_expr(inner, ctx)?)),
        Expr::Collection(_) => Ok(format!("SnVector::from({})", lower_items(expr, ctx)?)),
    }
}

/// `vec![...]` of a collection literal's elements, each deep-copied.
pub fn lower_items(expr: &Expr, ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    let Expr::Collection(items) = expr else {
        return Err(CompileError::malformed("expected a collection literal"));
    };
    let mut lowered = Vec::with_capacity(items.len());
    for item in items {
        lowered.push(lower_owned(item, ctx)?);
    }
    Ok(format!("vec![{}]", lowered.join(", ")))
}

/// Lower a place without dereferencing its root, so method calls, field
/// accesses and indexing see through reference-bound parameters.
pub fn lower_place(expr: &Expr, ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    match expr {
        Expr::Identifier(name) => {
            ctx.scope.check_read(name)?;
            rust_name(name)
        }
        Expr::Field { base, field } => {
            Ok(format!("{}.{}", lower_place(base, ctx)?, rust_name(field)?))
        }
        Expr::Index { base, index } => Ok(format!(
            "{}[({}) as usize]",
            lower_place(base, ctx)?,
            lower_expr(index, ctx)?
        )),
        Expr::Paren(inner) if !inner.is_temporary() => {
            Ok(format!("({})", lower_place(inner, ctx)?))
        }
        _ => lower_expr(expr, ctx),
    }
}

/// Lower for a by-reference consumer such as the printer: places are
/// borrowed, temporaries pass by value.
pub fn lower_borrowed(expr: &Expr, ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    if expr.is_temporary() {
        return lower_expr(expr, ctx);
    }
    if let Expr::Identifier(name) = expr {
        if ctx.scope.check_read(name)?.reference().is_some() {
            return Ok(format!("&*{}", rust_name(name)?));
        }
    }
    Ok(format!("&{}", lower_place(expr, ctx)?))
}

/// Lower for storage into a new owner. Places are deep-copied so two
/// bindings never share a backing store.
pub fn lower_owned(expr: &Expr, ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    let code = lower_expr(expr, ctx)?;
    if expr.is_temporary() {
        Ok(code)
    } else {
        Ok(format!("{}.clone()", code))
    }
}

fn lower_literal(literal: &Literal) -> Result<String, CompileError> {
    let text = literal.text.as_str();
    let invalid = |what: &str| CompileError::Type(format!("Invalid {} literal {}.", what, text));
    match literal.kind {
        LiteralKind::Verbatim => Ok(text.to_string()),
        LiteralKind::Int => {
            if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '_') {
                Ok(text.to_string())
            } else {
                Err(invalid("integer"))
            }
        }
        LiteralKind::Float => {
            if text.replace('_', "").parse::<f64>().is_err() {
                return Err(invalid("float"));
            }
            if text.contains(['.', 'e', 'E']) {
                Ok(text.to_string())
            } else {
                Ok(format!("{}.0", text))
            }
        }
        LiteralKind::Bool => match text.to_ascii_lowercase().as_str() {
            "true" => Ok("true".to_string()),
            "false" => Ok("false".to_string()),
            _ => Err(invalid("boolean")),
        },
        LiteralKind::Str => {
            if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
                Ok(format!("SnString::from({})", text))
            } else {
                Err(invalid("string"))
            }
        }
        LiteralKind::Char => {
            if text.len() >= 3 && text.starts_with('\'') && text.ends_with('\'') {
                Ok(text.to_string())
            } else {
                Err(invalid("character"))
            }
        }
    }
}

fn lower_call(name: &str, args: &[CallArg], ctx: &mut LowerCtx<'_>) -> Result<String, CompileError> {
    let signatures = ctx.signatures;
    let signature = signatures
        .get(name)
        .ok_or_else(|| CompileError::Scope(format!("Function '{}' is not defined.", name)))?;
    if signature.parameters.len() != args.len() {
        return Err(CompileError::Scope(format!(
            "Function '{}' expects {} argument(s) but {} were given.",
            name,
            signature.parameters.len(),
            args.len()
        )));
    }

    let mut lowered = Vec::with_capacity(args.len());
    for (arg, (param, expected)) in args.iter().zip(&signature.parameters) {
        lowered.push(lower_argument(name, param, *expected, arg, ctx)?);
    }
    trace(&format!("call {} ({} args)", name, lowered.len()));
    Ok(format!("{}({})", rust_name(name)?, lowered.join(", ")))
}

fn lower_argument(
    function: &str,
    param: &str,
    expected: Accessor,
    arg: &CallArg,
    ctx: &mut LowerCtx<'_>,
) -> Result<String, CompileError> {
    let value = &arg.value;
    let Some(root) = value.place_root() else {
        // Temporaries have no caller-side owner to protect.
        let code = lower_expr(value, ctx)?;
        let code = if matches!(value, Expr::Infix { .. }) {
            format!("({})", code)
        } else {
            code
        };
        return Ok(match expected {
            Accessor::Look => format!("&{}", code),
            Accessor::Mutate => format!("&mut {}", code),
            Accessor::Move | Accessor::Copy => code,
        });
    };

    let given = arg.accessor;
    if given != expected && given != Accessor::Copy {
        return Err(CompileError::Scope(format!(
            "Function '{}' is called with incorrect accessor for parameter '{}'.",
            function, param
        )));
    }

    let reference_root = match value {
        Expr::Identifier(name) => ctx.scope.check_read(name)?.reference().is_some(),
        _ => false,
    };
    let code = match given {
        Accessor::Copy => {
            let duplicate = format!("{}.clone()", lower_expr(value, ctx)?);
            match expected {
                Accessor::Look => format!("&{}", duplicate),
                Accessor::Mutate => format!("&mut {}", duplicate),
                Accessor::Move | Accessor::Copy => duplicate,
            }
        }
        Accessor::Look => lower_borrowed(value, ctx)?,
        Accessor::Mutate if reference_root => format!("&mut *{}", rust_name(root)?),
        Accessor::Mutate => format!("&mut {}", lower_place(value, ctx)?),
        Accessor::Move => {
            if !matches!(value, Expr::Identifier(_)) {
                return Err(CompileError::Scope(format!(
                    "Only a variable can be passed with accessor 'move' (parameter '{}' of '{}').",
                    param, function
                )));
            }
            rust_name(root)?
        }
    };
    ctx.scope.check_pass(root, given)?;
    Ok(code)
}

fn lower_method_call(
    receiver: &Expr,
    method: Method,
    mutating: bool,
    args: &[Expr],
    ctx: &mut LowerCtx<'_>,
) -> Result<String, CompileError> {
    if args.len() != method.arity() {
        return Err(CompileError::Scope(format!(
            "Method '{}' expects {} argument(s) but {} were given.",
            method.name(),
            method.arity(),
            args.len()
        )));
    }
    match (method.is_mutating(), mutating) {
        (true, false) => {
            return Err(CompileError::Scope(format!(
                "Method '{}' mutates its receiver and must be called with the mutate symbol.",
                method.name()
            )));
        }
        (false, true) => {
            return Err(CompileError::Scope(format!(
                "Method '{}' does not mutate its receiver.",
                method.name()
            )));
        }
        _ => {}
    }

    if method.is_mutating() {
        let root = receiver.place_root().ok_or_else(|| {
            CompileError::Scope(format!(
                "Method '{}' must be called on a variable.",
                method.name()
            ))
        })?;
        ctx.scope.check_set(root)?;
    }
    let target = lower_place(receiver, ctx)?;

    match method {
        Method::Length => Ok(format!("({}.length() as i64)", target)),
        Method::Append => Ok(format!("{}.append({})", target, lower_owned(&args[0], ctx)?)),
        Method::Insert => Ok(format!(
            "{}.insert(({}) as usize, {})",
            target,
            lower_expr(&args[0], ctx)?,
            lower_owned(&args[1], ctx)?
        )),
        Method::Delete => Ok(format!(
            "{}.delete(({}) as usize)",
            target,
            lower_expr(&args[0], ctx)?
        )),
        Method::Pop => Ok(format!("{}.pop()", target)),
    }
}
