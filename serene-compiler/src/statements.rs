// Statement dispatcher
//
// A `statement` wraps exactly one tagged node whose tag names one of the
// twelve statement kinds. Each kind reads its own field set (total, fatal on
// anything unexpected) and lowers to code relative to indentation 0 that
// ends in `;\n` or `}\n`.

use serde_json::Value;

use crate::ast::{
    AssignOp, Expr, ForRange, LiteralKind, Statement, StatementDecl, StatementKind,
};
use crate::emit_rust::indent_lines;
use crate::error::CompileError;
use crate::expr::{
    lower_borrowed, lower_expr, lower_items, lower_owned, lower_place, parse_expression,
    parse_term, LowerCtx,
};
use crate::names::rust_name;
use crate::scope::BindingKind;
use crate::trace::trace;
use crate::tree_reader::{scalar_text, single_child, tag_map, tagged_sequence, TaggedNode};
use crate::types::rust_type;

// ============================================================================
// Parsing
// ============================================================================

/// Read a `statements` sequence in declaration order.
pub fn parse_statements(value: &Value) -> Result<Vec<Statement>, CompileError> {
    let mut statements = Vec::new();
    for node in tagged_sequence(value)? {
        node.expect_tag("statement")?;
        statements.push(parse_statement(node.content)?);
    }
    Ok(statements)
}

/// Classify and read the content of one `statement` node.
pub fn parse_statement(content: &Value) -> Result<Statement, CompileError> {
    let node = single_child(content)?;
    let kind = StatementKind::from_tag(node.tag)?;
    trace(&format!("statement {}", node.tag));

    match kind {
        StatementKind::Print => {
            let mut values = Vec::new();
            for child in node.children()? {
                child.expect_tag("expression")?;
                values.push(parse_expression(child.content)?);
            }
            Ok(Statement::Print(values))
        }
        StatementKind::Var | StatementKind::Const => {
            let fields = tag_map(node.content, node.tag)?;
            fields.only(&["identifier", "type", "expression"])?;
            let name = fields.require_text("identifier")?;
            let declared_type = fields.get("type").cloned();
            let value = parse_expression(fields.require("expression")?)?;
            if kind == StatementKind::Var {
                Ok(Statement::Var {
                    name,
                    declared_type,
                    value,
                })
            } else {
                Ok(Statement::Const {
                    name,
                    declared_type,
                    value,
                })
            }
        }
        StatementKind::Set => {
            let fields = tag_map(node.content, node.tag)?;
            fields.only(&["identifier", "place_term", "assignment_op", "expression"])?;
            let target = match (fields.get("identifier"), fields.get("place_term")) {
                (Some(_), None) => Expr::Identifier(fields.require_text("identifier")?),
                (None, Some(place)) => parse_place_term(place)?,
                _ => {
                    return Err(CompileError::malformed(
                        "set_statement needs exactly one of 'identifier' or 'place_term'",
                    ))
                }
            };
            Ok(Statement::Set {
                target,
                op: AssignOp::from_token(&fields.require_text("assignment_op")?)?,
                value: parse_expression(fields.require("expression")?)?,
            })
        }
        StatementKind::Run => {
            let fields = tag_map(node.content, node.tag)?;
            fields.only(&["term"])?;
            Ok(Statement::Run(parse_term(fields.require("term")?)?))
        }
        StatementKind::Return => {
            let fields = tag_map(node.content, node.tag)?;
            fields.only(&["expression"])?;
            match fields.get("expression") {
                Some(value) => Ok(Statement::Return(Some(parse_expression(value)?))),
                None => Ok(Statement::Return(None)),
            }
        }
        StatementKind::Break => {
            expect_no_fields(&node)?;
            Ok(Statement::Break)
        }
        StatementKind::Continue => {
            expect_no_fields(&node)?;
            Ok(Statement::Continue)
        }
        StatementKind::While => {
            let fields = tag_map(node.content, node.tag)?;
            fields.only(&["expression", "statements"])?;
            Ok(Statement::While {
                condition: parse_expression(fields.require("expression")?)?,
                body: parse_body(fields.get("statements"))?,
            })
        }
        StatementKind::For => parse_for(&node),
        StatementKind::If => parse_if(&node),
        StatementKind::Match => parse_match(&node),
    }
}

fn parse_body(value: Option<&Value>) -> Result<Vec<Statement>, CompileError> {
    match value {
        Some(value) => parse_statements(value),
        None => Ok(Vec::new()),
    }
}

/// A `place_term` is a term rooted at an identifier, with field accesses and
/// index calls but no method calls.
fn parse_place_term(content: &Value) -> Result<Expr, CompileError> {
    let target = parse_term(content)?;
    if !is_place(&target) {
        return Err(CompileError::Type(
            "Invalid expression for left-hand side of 'set' statement.".to_string(),
        ));
    }
    Ok(target)
}

fn is_place(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(_) => true,
        Expr::Field { base, .. } | Expr::Index { base, .. } => is_place(base),
        _ => false,
    }
}

/// Keyword-only statements carry nothing beyond their own tag.
fn expect_no_fields(node: &TaggedNode<'_>) -> Result<(), CompileError> {
    if scalar_text(node.content).is_some() || tagged_sequence(node.content)?.is_empty() {
        Ok(())
    } else {
        Err(CompileError::malformed(format!(
            "'{}' takes no fields",
            node.tag
        )))
    }
}

// for_loop is positional: the bounds form repeats the `expression` tag, so it
// cannot be read as a tag set.
fn parse_for(node: &TaggedNode<'_>) -> Result<Statement, CompileError> {
    let children = node.children()?;
    let (first, rest) = children
        .split_first()
        .ok_or_else(|| CompileError::malformed("empty for_loop"))?;
    first.expect_tag("identifier")?;
    let variable = first.text()?;

    let mut expressions = Vec::new();
    let mut body = None;
    for (position, child) in rest.iter().enumerate() {
        match child.tag {
            "expression" if body.is_none() => expressions.push(parse_expression(child.content)?),
            "statements" if position + 1 == rest.len() => {
                body = Some(parse_statements(child.content)?)
            }
            other => return Err(CompileError::unknown("for_loop field", other)),
        }
    }

    let range = match expressions.len() {
        1 => ForRange::Each(expressions.remove(0)),
        2 => {
            let end = expressions.remove(1);
            ForRange::Bounds(expressions.remove(0), end)
        }
        n => {
            return Err(CompileError::malformed(format!(
                "for_loop takes one or two expressions, found {}",
                n
            )))
        }
    };
    Ok(Statement::For {
        variable,
        range,
        body: body.unwrap_or_default(),
    })
}

fn parse_if(node: &TaggedNode<'_>) -> Result<Statement, CompileError> {
    let children = node.children()?;
    let mut branches = Vec::new();
    let mut otherwise = None;

    for (position, child) in children.iter().enumerate() {
        let fields = tag_map(child.content, child.tag)?;
        fields.only(&["expression", "statements"])?;
        let body = parse_body(fields.get("statements"))?;
        match child.tag {
            "if_branch" if position == 0 => {
                branches.push((parse_expression(fields.require("expression")?)?, body));
            }
            "elseif_branch" if position > 0 && otherwise.is_none() => {
                branches.push((parse_expression(fields.require("expression")?)?, body));
            }
            "else_branch" if position > 0 && otherwise.is_none() => {
                if fields.contains("expression") {
                    return Err(CompileError::malformed("else_branch takes no condition"));
                }
                otherwise = Some(body);
            }
            "if_branch" | "elseif_branch" | "else_branch" => {
                return Err(CompileError::malformed(format!(
                    "'{}' out of place in if_block",
                    child.tag
                )));
            }
            other => return Err(CompileError::unknown("if_block branch", other)),
        }
    }

    if branches.is_empty() {
        return Err(CompileError::malformed("if_block without an if_branch"));
    }
    Ok(Statement::If {
        branches,
        otherwise,
    })
}

fn parse_match(node: &TaggedNode<'_>) -> Result<Statement, CompileError> {
    let children = node.children()?;
    let (first, rest) = children
        .split_first()
        .ok_or_else(|| CompileError::malformed("empty match_block"))?;
    first.expect_tag("expression")?;
    let subject = parse_expression(first.content)?;

    let mut arms = Vec::new();
    let mut otherwise = None;
    for child in rest {
        if child.tag != "match_branch" {
            return Err(CompileError::unknown("match_block field", child.tag));
        }
        if otherwise.is_some() {
            return Err(CompileError::malformed("match_branch after the default branch"));
        }
        let parts = child.children()?;
        let mut values = Vec::new();
        let mut body = None;
        for (position, part) in parts.iter().enumerate() {
            match part.tag {
                "expression" if body.is_none() => values.push(parse_expression(part.content)?),
                "statements" if position + 1 == parts.len() => {
                    body = Some(parse_statements(part.content)?)
                }
                other => return Err(CompileError::unknown("match_branch field", other)),
            }
        }
        let body = body.unwrap_or_default();
        if values.is_empty() {
            otherwise = Some(body);
        } else {
            arms.push((values, body));
        }
    }

    if arms.is_empty() && otherwise.is_none() {
        return Err(CompileError::malformed("match_block without branches"));
    }
    Ok(Statement::Match {
        subject,
        arms,
        otherwise,
    })
}

// ============================================================================
// Lowering
// ============================================================================

pub fn lower_statement(
    statement: &Statement,
    ctx: &mut LowerCtx<'_>,
) -> Result<StatementDecl, CompileError> {
    let mut returns = false;
    let emitted_code = match statement {
        Statement::Print(values) => {
            let mut code = String::from("Printer::stdout()");
            for value in values {
                code.push_str(&format!(".write({})", lower_borrowed(value, ctx)?));
            }
            code.push_str(".endl();\n");
            code
        }
        Statement::Var {
            name,
            declared_type,
            value,
        } => lower_binding(name, declared_type.as_ref(), value, true, ctx)?,
        Statement::Const {
            name,
            declared_type,
            value,
        } => lower_binding(name, declared_type.as_ref(), value, false, ctx)?,
        Statement::Set { target, op, value } => {
            let root = target
                .place_root()
                .ok_or_else(|| CompileError::malformed("set_statement target is not a place"))?;
            let by_reference = ctx.scope.check_set(root)?.reference().is_some();
            let value = lower_owned(value, ctx)?;
            let target = match target {
                Expr::Identifier(name) if by_reference => format!("*{}", rust_name(name)?),
                _ => lower_place(target, ctx)?,
            };
            format!("{} {} {};\n", target, op.as_rust(), value)
        }
        Statement::Run(term) => format!("{};\n", lower_expr(term, ctx)?),
        Statement::Return(value) => {
            returns = true;
            match (value, ctx.returns_value) {
                (Some(value), true) => format!("return {};\n", lower_owned(value, ctx)?),
                (None, false) => "return;\n".to_string(),
                (Some(_), false) => {
                    return Err(CompileError::Type(
                        "A function without a return type cannot return a value.".to_string(),
                    ))
                }
                (None, true) => {
                    return Err(CompileError::Type(
                        "Return statement is missing a value.".to_string(),
                    ))
                }
            }
        }
        Statement::Break | Statement::Continue => {
            let keyword = if matches!(statement, Statement::Break) {
                "break"
            } else {
                "continue"
            };
            if !ctx.scope.in_loop() {
                return Err(CompileError::Scope(format!(
                    "'{}' is used outside of a loop.",
                    keyword
                )));
            }
            format!("{};\n", keyword)
        }
        Statement::While { condition: test, body: statements } => {
            // The condition runs on every iteration, so it belongs to the loop.
            ctx.scope.enter_loop();
            let lowered = lower_expr(test, ctx)
                .and_then(|condition| Ok((condition, lower_block(statements, ctx)?)));
            ctx.scope.exit_loop();
            let (condition, (body, body_returns)) = lowered?;
            if is_always_true(test) {
                // Only a `break` leaves an unconditional loop.
                returns = body_returns && !breaks_out(statements);
                format!("loop {{\n{}}}\n", body)
            } else {
                format!("while {} {{\n{}}}\n", condition, body)
            }
        }
        Statement::For {
            variable,
            range,
            body,
        } => {
            let (header, borrowed) = match range {
                ForRange::Bounds(start, end) => (
                    format!("({})..({})", lower_expr(start, ctx)?, lower_expr(end, ctx)?),
                    false,
                ),
                ForRange::Each(collection) if collection.is_temporary() => {
                    (format!("({}).iter()", lower_expr(collection, ctx)?), true)
                }
                ForRange::Each(collection) => {
                    (format!("{}.iter()", lower_place(collection, ctx)?), true)
                }
            };
            ctx.scope.enter_loop();
            let body = ctx
                .scope
                .declare(variable, BindingKind::LoopItem { borrowed })
                .and_then(|_| lower_block(body, ctx));
            ctx.scope.exit_loop();
            format!(
                "for {} in {} {{\n{}}}\n",
                rust_name(variable)?,
                header,
                body?.0
            )
        }
        Statement::If {
            branches,
            otherwise,
        } => {
            let mut code = String::new();
            let mut all_return = true;
            for (position, (condition, body)) in branches.iter().enumerate() {
                let condition = lower_expr(condition, ctx)?;
                let (body, body_returns) = lower_block(body, ctx)?;
                all_return &= body_returns;
                if position > 0 {
                    code.push_str(" else ");
                }
                code.push_str(&format!("if {} {{\n{}}}", condition, body));
            }
            if let Some(body) = otherwise {
                let (body, body_returns) = lower_block(body, ctx)?;
                code.push_str(&format!(" else {{\n{}}}", body));
                returns = all_return && body_returns;
            }
            code.push('\n');
            code
        }
        Statement::Match {
            subject,
            arms,
            otherwise,
        } => {
            let (code, all_return) = lower_match(subject, arms, otherwise.as_deref(), ctx)?;
            returns = all_return;
            code
        }
    };

    Ok(StatementDecl {
        kind: statement.kind(),
        emitted_code,
        returns,
    })
}

fn lower_binding(
    name: &str,
    declared_type: Option<&Value>,
    value: &Expr,
    mutable: bool,
    ctx: &mut LowerCtx<'_>,
) -> Result<String, CompileError> {
    // A typed collection literal converts into whichever container the
    // annotation names.
    let value = match (value, declared_type) {
        (Expr::Collection(_), Some(_)) => format!("{}.into()", lower_items(value, ctx)?),
        _ => lower_owned(value, ctx)?,
    };
    ctx.scope.declare(name, BindingKind::Variable { mutable })?;
    let annotation = match declared_type {
        Some(tree) => format!(": {}", rust_type(tree)?),
        None => String::new(),
    };
    let keyword = if mutable { "let mut" } else { "let" };
    Ok(format!(
        "{} {}{} = {};\n",
        keyword,
        rust_name(name)?,
        annotation,
        value
    ))
}

fn lower_match(
    subject: &Expr,
    arms: &[(Vec<Expr>, Vec<Statement>)],
    otherwise: Option<&[Statement]>,
    ctx: &mut LowerCtx<'_>,
) -> Result<(String, bool), CompileError> {
    let subject = if subject.is_temporary() {
        format!("&({})", lower_expr(subject, ctx)?)
    } else {
        lower_borrowed(subject, ctx)?
    };

    let mut chain = String::new();
    let mut all_return = true;
    for (position, (values, body)) in arms.iter().enumerate() {
        let mut tests = Vec::with_capacity(values.len());
        for value in values {
            let code = lower_expr(value, ctx)?;
            if matches!(value, Expr::Infix { .. }) {
                tests.push(format!("*match_subject == ({})", code));
            } else {
                tests.push(format!("*match_subject == {}", code));
            }
        }
        let (body, body_returns) = lower_block(body, ctx)?;
        all_return &= body_returns;
        if position > 0 {
            chain.push_str(" else ");
        }
        chain.push_str(&format!("if {} {{\n{}}}", tests.join(" || "), body));
    }

    let returns = match otherwise {
        Some(body) => {
            let (body, body_returns) = lower_block(body, ctx)?;
            if arms.is_empty() {
                chain.push_str(&format!("{{\n{}}}", body));
            } else {
                chain.push_str(&format!(" else {{\n{}}}", body));
            }
            all_return && body_returns
        }
        None => false,
    };
    chain.push('\n');

    let inner = format!("let match_subject = {};\n{}", subject, chain);
    Ok((format!("{{\n{}}}\n", indent_lines(&inner, 1)), returns))
}

/// A condition written as the literal `true`.
fn is_always_true(condition: &Expr) -> bool {
    match condition {
        Expr::Literal(literal) => {
            matches!(literal.kind, LiteralKind::Verbatim | LiteralKind::Bool)
                && literal.text.eq_ignore_ascii_case("true")
        }
        Expr::Paren(inner) => is_always_true(inner),
        _ => false,
    }
}

/// Whether a `break` in `statements` leaves the loop that directly holds them.
/// Breaks inside nested loops belong to those loops.
fn breaks_out(statements: &[Statement]) -> bool {
    statements.iter().any(|statement| match statement {
        Statement::Break => true,
        Statement::If {
            branches,
            otherwise,
        } => {
            branches.iter().any(|(_, body)| breaks_out(body))
                || otherwise.as_deref().is_some_and(breaks_out)
        }
        Statement::Match { arms, otherwise, .. } => {
            arms.iter().any(|(_, body)| breaks_out(body))
                || otherwise.as_deref().is_some_and(breaks_out)
        }
        _ => false,
    })
}

/// Lower a nested body in its own scope. Returns the code indented one
/// level and whether every path through it returns.
pub fn lower_block(
    statements: &[Statement],
    ctx: &mut LowerCtx<'_>,
) -> Result<(String, bool), CompileError> {
    ctx.scope.push();
    let lowered = lower_sequence(statements, ctx);
    ctx.scope.pop();
    let (code, returns) = lowered?;
    Ok((indent_lines(&code, 1), returns))
}

fn lower_sequence(
    statements: &[Statement],
    ctx: &mut LowerCtx<'_>,
) -> Result<(String, bool), CompileError> {
    let mut code = String::new();
    let mut returns = false;
    for statement in statements {
        let decl = lower_statement(statement, ctx)?;
        returns |= decl.returns;
        code.push_str(&decl.emitted_code);
    }
    Ok((code, returns))
}
