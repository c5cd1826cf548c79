// Emit a Rust program from assembled functions
//
// Layout: prelude import, every function in input order, then the process
// entry point that calls the program's own `main`.

use crate::ast::FunctionDecl;
use crate::error::CompileError;
use crate::names::rust_name;
use crate::params::rust_parameter;
use crate::types::rust_type;

pub const PRELUDE: &str = "use serene_runtime::prelude::*;\n";

/// The program's entry function, as named in source.
pub const ENTRY_FUNCTION: &str = "main";

pub fn emit_program(functions: &[FunctionDecl]) -> Result<String, CompileError> {
    let entry = functions
        .iter()
        .find(|f| f.name == ENTRY_FUNCTION)
        .ok_or_else(|| CompileError::Scope("No 'main()' function is defined.".to_string()))?;
    if !entry.parameters.is_empty() || entry.return_type.is_some() {
        return Err(CompileError::Type(
            "'main()' cannot take parameters or return a value.".to_string(),
        ));
    }

    let mut output = String::new();
    output.push_str(PRELUDE);
    output.push('\n');
    for function in functions {
        output.push_str(&emit_function(function)?);
        output.push('\n');
    }
    output.push_str(&format!(
        "fn main() {{\n    {}();\n}}\n",
        rust_name(ENTRY_FUNCTION)?
    ));
    Ok(output)
}

pub fn emit_function(function: &FunctionDecl) -> Result<String, CompileError> {
    let params = function
        .parameters
        .iter()
        .map(rust_parameter)
        .collect::<Result<Vec<_>, _>>()?;
    let ret = match &function.return_type {
        Some(tree) => format!(" -> {}", rust_type(tree)?),
        None => String::new(),
    };
    Ok(format!(
        "fn {}({}){} {{\n{}}}\n",
        rust_name(&function.name)?,
        params.join(", "),
        ret,
        indent_lines(&function.emitted_code, 1)
    ))
}

/// Raw statement code of every function, each followed by a newline.
pub fn emit_bodies(functions: &[FunctionDecl]) -> String {
    let mut output = String::new();
    for function in functions {
        output.push_str(&function.emitted_code);
        output.push('\n');
    }
    output
}

/// Prefix every non-empty line with `indent` levels of four spaces.
pub(crate) fn indent_lines(code: &str, indent: usize) -> String {
    let pad = "    ".repeat(indent);
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        if line != "\n" {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_keeps_blank_lines_bare() {
        assert_eq!(indent_lines("a;\n\nb;\n", 1), "    a;\n\n    b;\n");
        assert_eq!(indent_lines("x {\n    y;\n}\n", 2), "        x {\n            y;\n        }\n");
        assert_eq!(indent_lines("", 3), "");
    }
}
