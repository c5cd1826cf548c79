// Declared type tree -> Rust type text
//
// A type tree is `[ {base_type: "Vector"}, {type: [ {base_type: "Int"} ]} ]`:
// a base name plus, for generic containers, exactly one nested type.

use serde_json::Value;

use crate::error::CompileError;
use crate::tree_reader::tag_map;

fn scalar_type(base: &str) -> Option<&'static str> {
    let mapped = match base {
        "Int" | "Int64" => "i64",
        "Int32" => "i32",
        "Int16" => "i16",
        "Int8" => "i8",
        "Uint64" => "u64",
        "Uint32" => "u32",
        "Uint16" => "u16",
        "Uint8" => "u8",
        "Float" | "Float64" => "f64",
        "Float32" => "f32",
        "Bool" => "bool",
        "Char" => "char",
        "String" => "SnString",
        _ => return None,
    };
    Some(mapped)
}

fn generic_type(base: &str) -> Option<&'static str> {
    match base {
        "Vector" => Some("SnVector"),
        "Array" => Some("SnArray"),
        _ => None,
    }
}

pub fn rust_type(tree: &Value) -> Result<String, CompileError> {
    let fields = tag_map(tree, "type")?;
    fields.only(&["base_type", "type"])?;
    let base = fields.require_text("base_type")?;

    if let Some(container) = generic_type(&base) {
        let param = fields.get("type").ok_or_else(|| {
            CompileError::Type(format!("Type '{}' requires a type parameter.", base))
        })?;
        return Ok(format!("{}<{}>", container, rust_type(param)?));
    }

    match scalar_type(&base) {
        Some(mapped) if !fields.contains("type") => Ok(mapped.to_string()),
        Some(_) => Err(CompileError::Type(format!(
            "Type '{}' does not take a type parameter.",
            base
        ))),
        None => Err(CompileError::Type(format!("Unknown type: {}.", base))),
    }
}
