// Parameter model
//
// A `function_parameter` is the tag set {accessor?, identifier, type}. The
// declared type is kept as an opaque tree and only rendered when the
// signature is emitted.

use serde_json::Value;

use crate::ast::{Accessor, ParameterDecl};
use crate::error::CompileError;
use crate::names::rust_name;
use crate::tree_reader::{tag_map, tagged_sequence};
use crate::types::rust_type;

pub fn read_parameter(content: &Value) -> Result<ParameterDecl, CompileError> {
    let fields = tag_map(content, "function_parameter")?;
    fields.only(&["accessor", "identifier", "type"])?;

    let token = match fields.get("accessor") {
        Some(_) => Some(fields.require_text("accessor")?),
        None => None,
    };
    Ok(ParameterDecl {
        name: fields.require_text("identifier")?,
        declared_type: fields.require("type")?.clone(),
        accessor: Accessor::resolve(token.as_deref())?,
    })
}

/// Read a `function_parameters` sequence in declaration order.
pub fn read_parameters(value: &Value) -> Result<Vec<ParameterDecl>, CompileError> {
    let mut parameters = Vec::new();
    for node in tagged_sequence(value)? {
        node.expect_tag("function_parameter")?;
        parameters.push(read_parameter(node.content)?);
    }
    Ok(parameters)
}

/// Signature text for one parameter, e.g. `sn_v: &mut SnVector<i64>`.
pub fn rust_parameter(param: &ParameterDecl) -> Result<String, CompileError> {
    let name = rust_name(&param.name)?;
    let ty = rust_type(&param.declared_type)?;
    Ok(match param.accessor {
        Accessor::Look => format!("{}: &{}", name, ty),
        Accessor::Mutate => format!("{}: &mut {}", name, ty),
        Accessor::Move | Accessor::Copy => format!("mut {}: {}", name, ty),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int_type() -> Value {
        json!([{"base_type": "Int"}])
    }

    #[test]
    fn missing_accessor_resolves_to_look() {
        let content = json!([{"identifier": "n"}, {"type": int_type()}]);
        let param = read_parameter(&content).unwrap();
        assert_eq!(param.name, "n");
        assert_eq!(param.accessor, Accessor::Look);
        assert_eq!(param.declared_type, int_type());
    }

    #[test]
    fn explicit_accessors() {
        for (token, expected) in [
            ("mutate", Accessor::Mutate),
            ("move", Accessor::Move),
            ("copy", Accessor::Copy),
        ] {
            let content = json!([{"accessor": token}, {"identifier": "n"}, {"type": int_type()}]);
            assert_eq!(read_parameter(&content).unwrap().accessor, expected);
        }
    }

    #[test]
    fn invalid_accessor_is_fatal() {
        let content = json!([{"accessor": "borrow"}, {"identifier": "n"}, {"type": int_type()}]);
        assert!(matches!(
            read_parameter(&content),
            Err(CompileError::InvalidAccessor(token)) if token == "borrow"
        ));
    }

    #[test]
    fn duplicate_and_missing_fields() {
        let twice = json!([{"identifier": "a"}, {"identifier": "b"}, {"type": int_type()}]);
        assert!(matches!(
            read_parameter(&twice),
            Err(CompileError::DuplicateTag { .. })
        ));
        let untyped = json!([{"identifier": "a"}]);
        assert!(read_parameter(&untyped).is_err());
    }

    #[test]
    fn signature_text_per_accessor() {
        let vector = json!([{"base_type": "Vector"}, {"type": int_type()}]);
        let mut param = ParameterDecl {
            name: "v".into(),
            declared_type: vector,
            accessor: Accessor::Look,
        };
        assert_eq!(rust_parameter(&param).unwrap(), "sn_v: &SnVector<i64>");
        param.accessor = Accessor::Mutate;
        assert_eq!(rust_parameter(&param).unwrap(), "sn_v: &mut SnVector<i64>");
        param.accessor = Accessor::Move;
        assert_eq!(rust_parameter(&param).unwrap(), "mut sn_v: SnVector<i64>");
        param.accessor = Accessor::Copy;
        assert_eq!(rust_parameter(&param).unwrap(), "mut sn_v: SnVector<i64>");
    }

    #[test]
    fn parameters_keep_order() {
        let seq = json!([
            {"function_parameter": [{"identifier": "b"}, {"type": int_type()}]},
            {"function_parameter": [{"identifier": "a"}, {"type": int_type()}]}
        ]);
        let names: Vec<_> = read_parameters(&seq).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(read_parameters(&json!("")).unwrap().is_empty());
    }
}
