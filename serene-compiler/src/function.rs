// Function assembler
//
// Reads each `function` construct, collects every signature up front so calls
// resolve regardless of definition order, then lowers parameters and
// statements in declaration order into one FunctionDecl per function.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::ast::{Accessor, FunctionDecl, ParameterDecl};
use crate::error::CompileError;
use crate::expr::LowerCtx;
use crate::params::read_parameters;
use crate::scope::BindingKind;
use crate::statements::{lower_statement, parse_statements};
use crate::trace::trace;
use crate::tree_reader::{tag_map, tagged_sequence, TaggedNode};

/// What a call site needs to know about its callee.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Parameter names and declared accessors, in order.
    pub parameters: Vec<(String, Accessor)>,
    pub returns_value: bool,
}

#[derive(Debug, Default)]
pub struct Signatures {
    functions: BTreeMap<String, Signature>,
}

impl Signatures {
    pub fn insert(&mut self, name: &str, signature: Signature) -> Result<(), CompileError> {
        if self.functions.contains_key(name) {
            return Err(CompileError::Scope(format!(
                "Function '{}' is defined more than once.",
                name
            )));
        }
        self.functions.insert(name.to_string(), signature);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// A function as read from the tree, before its body is lowered.
#[derive(Debug, Clone)]
pub struct FunctionSource<'a> {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<Value>,
    pub statements: Option<&'a Value>,
}

impl FunctionSource<'_> {
    pub fn signature(&self) -> Signature {
        Signature {
            parameters: self
                .parameters
                .iter()
                .map(|p| (p.name.clone(), p.accessor))
                .collect(),
            returns_value: self.return_type.is_some(),
        }
    }
}

/// Locate the `functions` sequence. The top level is either the object
/// holding it or a one-element sequence wrapping that object.
pub fn read_functions(root: &Value) -> Result<Vec<FunctionSource<'_>>, CompileError> {
    let top = match root {
        Value::Array(items) if items.len() == 1 => &items[0],
        Value::Array(items) => {
            return Err(CompileError::malformed(format!(
                "expected one top-level document, found {}",
                items.len()
            )))
        }
        other => other,
    };
    let node = TaggedNode::from_value(top)?;
    node.expect_tag("functions")?;

    let mut functions = Vec::new();
    for item in tagged_sequence(node.content)? {
        item.expect_tag("function")?;
        functions.push(read_function(item.content)?);
    }
    Ok(functions)
}

pub fn read_function(content: &Value) -> Result<FunctionSource<'_>, CompileError> {
    let fields = tag_map(content, "function")?;
    fields.only(&["identifier", "function_parameters", "type", "statements"])?;

    let parameters = match fields.get("function_parameters") {
        Some(value) => read_parameters(value)?,
        None => Vec::new(),
    };
    Ok(FunctionSource {
        name: fields.require_text("identifier")?,
        parameters,
        return_type: fields.get("type").cloned(),
        statements: fields.get("statements"),
    })
}

/// Pre-pass: every signature, with duplicate names rejected.
pub fn collect_signatures(functions: &[FunctionSource<'_>]) -> Result<Signatures, CompileError> {
    let mut signatures = Signatures::default();
    for function in functions {
        signatures.insert(&function.name, function.signature())?;
    }
    trace(&format!("collected {} function signatures", signatures.len()));
    Ok(signatures)
}

pub fn assemble_function(
    source: &FunctionSource<'_>,
    signatures: &Signatures,
) -> Result<FunctionDecl, CompileError> {
    trace(&format!("assembling function {}", source.name));
    let mut ctx = LowerCtx::new(signatures, source.return_type.is_some());
    for param in &source.parameters {
        ctx.scope
            .declare(&param.name, BindingKind::Parameter(param.accessor))?;
    }

    let parsed = match source.statements {
        Some(value) => parse_statements(value)?,
        None => Vec::new(),
    };
    let mut statements = Vec::with_capacity(parsed.len());
    let mut emitted_code = String::new();
    let mut returns = false;
    for statement in &parsed {
        let decl = lower_statement(statement, &mut ctx)?;
        returns |= decl.returns;
        emitted_code.push_str(&decl.emitted_code);
        statements.push(decl);
    }

    if source.return_type.is_some() && !returns {
        return Err(CompileError::Type(format!(
            "Function '{}' is missing a return value in at least one execution path.",
            source.name
        )));
    }

    Ok(FunctionDecl {
        name: source.name.clone(),
        parameters: source.parameters.clone(),
        return_type: source.return_type.clone(),
        statements,
        emitted_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StatementKind;
    use serde_json::json;

    fn hello_main() -> Value {
        json!([
            {"identifier": "main"},
            {"function_parameters": []},
            {"statements": [
                {"statement": [{"print_statement": [
                    {"expression": [{"term": [{"base_expression": [{"literal": "hi"}]}]}]}
                ]}]}
            ]}
        ])
    }

    #[test]
    fn assembles_main_with_one_print() {
        let tree = hello_main();
        let source = read_function(&tree).unwrap();
        let signatures = collect_signatures(std::slice::from_ref(&source)).unwrap();
        let decl = assemble_function(&source, &signatures).unwrap();
        assert_eq!(decl.name, "main");
        assert!(decl.parameters.is_empty());
        assert_eq!(decl.statements.len(), 1);
        assert_eq!(decl.statements[0].kind, StatementKind::Print);
        assert_eq!(decl.emitted_code, "Printer::stdout().write(hi).endl();\n");
    }

    #[test]
    fn statement_outputs_concatenate_without_separators() {
        let tree = json!([
            {"identifier": "f"},
            {"statements": [
                {"statement": [{"print_statement": []}]},
                {"statement": [{"return_statement": ""}]}
            ]}
        ]);
        let source = read_function(&tree).unwrap();
        let signatures = collect_signatures(std::slice::from_ref(&source)).unwrap();
        let decl = assemble_function(&source, &signatures).unwrap();
        assert_eq!(
            decl.emitted_code,
            "Printer::stdout().endl();\nreturn;\n"
        );
        let joined: String = decl.statements.iter().map(|s| s.emitted_code.as_str()).collect();
        assert_eq!(joined, decl.emitted_code);
    }

    #[test]
    fn missing_return_path_is_fatal() {
        let tree = json!([
            {"identifier": "answer"},
            {"type": [{"base_type": "Int"}]},
            {"statements": [{"statement": [{"print_statement": []}]}]}
        ]);
        let source = read_function(&tree).unwrap();
        let signatures = collect_signatures(std::slice::from_ref(&source)).unwrap();
        let err = assemble_function(&source, &signatures).unwrap_err();
        assert!(err.to_string().contains("missing a return value"));
    }

    #[test]
    fn duplicate_function_is_fatal() {
        let first = hello_main();
        let second = hello_main();
        let sources = vec![read_function(&first).unwrap(), read_function(&second).unwrap()];
        let err = collect_signatures(&sources).unwrap_err();
        assert!(err.to_string().contains("defined more than once"));
    }

    #[test]
    fn duplicate_parameter_is_fatal() {
        let int = json!([{"base_type": "Int"}]);
        let tree = json!([
            {"identifier": "f"},
            {"function_parameters": [
                {"function_parameter": [{"identifier": "a"}, {"type": int}]},
                {"function_parameter": [{"identifier": "a"}, {"type": int}]}
            ]}
        ]);
        let source = read_function(&tree).unwrap();
        let signatures = collect_signatures(std::slice::from_ref(&source)).unwrap();
        assert!(assemble_function(&source, &signatures).is_err());
    }

    #[test]
    fn top_level_shapes() {
        let body = json!({"functions": [{"function": hello_main()}]});
        assert_eq!(read_functions(&body).unwrap().len(), 1);
        let wrapped = json!([body.clone()]);
        assert_eq!(read_functions(&wrapped).unwrap()[0].name, "main");
        assert!(read_functions(&json!([body.clone(), body])).is_err());
        assert!(read_functions(&json!({"modules": []})).is_err());
    }
}
