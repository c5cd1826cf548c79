// Library interface for the Serene code generator
// Tagged parse tree (JSON) -> FunctionDecls -> Rust source against serene_runtime

pub mod ast;
pub mod emit_rust;
pub mod error;
pub mod expr;
pub mod function;
pub mod names;
pub mod params;
pub mod scope;
pub mod statements;
pub mod trace;
pub mod tree_reader;
pub mod types;


use std::fs;
use std::path::Path;

use serde_json::Value;

use ast::FunctionDecl;
use error::CompileError;
use trace::trace;

/// Every function of one input tree, lowered in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    /// Complete Rust program text.
    pub fn to_rust(&self) -> Result<String, CompileError> {
        emit_rust::emit_program(&self.functions)
    }

    /// Raw statement code per function.
    pub fn bodies(&self) -> String {
        emit_rust::emit_bodies(&self.functions)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

pub fn compile_tree(tree: &Value) -> Result<Program, CompileError> {
    let sources = function::read_functions(tree)?;
    let signatures = function::collect_signatures(&sources)?;
    if !signatures.contains(emit_rust::ENTRY_FUNCTION) {
        return Err(CompileError::Scope(
            "No 'main()' function is defined.".to_string(),
        ));
    }

    let mut functions = Vec::with_capacity(sources.len());
    for source in &sources {
        functions.push(function::assemble_function(source, &signatures)?);
    }
    trace(&format!("lowered {} functions", functions.len()));
    Ok(Program { functions })
}

pub fn compile_source(text: &str) -> Result<Program, CompileError> {
    let tree: Value = serde_json::from_str(text)?;
    compile_tree(&tree)
}

pub fn compile_file(path: &Path) -> Result<Program, CompileError> {
    trace(&format!("reading {}", path.display()));
    let text = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    compile_source(&text)
}
