// Tagged tree reading
//
// The external parser hands over a generic tree in which every construct is
// a single-key object `{tag: content}`. Content is either a scalar (text) or
// a sequence of further tagged nodes. Everything here is shape checking only;
// no node is interpreted.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::CompileError;

/// One `{tag: content}` node.
#[derive(Debug, Clone, Copy)]
pub struct TaggedNode<'a> {
    pub tag: &'a str,
    pub content: &'a Value,
}

impl<'a> TaggedNode<'a> {
    pub fn from_value(value: &'a Value) -> Result<Self, CompileError> {
        let obj = value.as_object().ok_or_else(|| {
            CompileError::malformed(format!("expected a tagged node, found {}", describe(value)))
        })?;
        let mut entries = obj.iter();
        match (entries.next(), entries.next()) {
            (Some((tag, content)), None) => Ok(TaggedNode {
                tag: tag.as_str(),
                content,
            }),
            _ => Err(CompileError::malformed(format!(
                "a tagged node must have exactly one key, found {}",
                obj.len()
            ))),
        }
    }

    /// The node's content as a sequence of tagged nodes.
    pub fn children(&self) -> Result<Vec<TaggedNode<'a>>, CompileError> {
        tagged_sequence(self.content)
    }

    /// The node's content as leaf text.
    pub fn text(&self) -> Result<String, CompileError> {
        scalar_text(self.content).ok_or_else(|| {
            CompileError::malformed(format!(
                "'{}' must hold text, found {}",
                self.tag,
                describe(self.content)
            ))
        })
    }

    pub fn expect_tag(&self, tag: &str) -> Result<(), CompileError> {
        if self.tag == tag {
            Ok(())
        } else {
            Err(CompileError::malformed(format!(
                "expected '{}', found '{}'",
                tag, self.tag
            )))
        }
    }
}

/// Read a sequence of tagged nodes, preserving order.
/// The parser writes an empty sequence as `null` or `""`; both read as empty.
pub fn tagged_sequence(value: &Value) -> Result<Vec<TaggedNode<'_>>, CompileError> {
    match value {
        Value::Array(items) => items.iter().map(TaggedNode::from_value).collect(),
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        other => Err(CompileError::malformed(format!(
            "expected a sequence of tagged nodes, found {}",
            describe(other)
        ))),
    }
}

/// Read a single wrapped child: `[ {tag: content} ]` with exactly one element.
pub fn single_child(value: &Value) -> Result<TaggedNode<'_>, CompileError> {
    let mut nodes = tagged_sequence(value)?;
    if nodes.len() != 1 {
        return Err(CompileError::malformed(format!(
            "expected exactly one alternative, found {}",
            nodes.len()
        )));
    }
    Ok(nodes.remove(0))
}

/// Leaf text of a scalar node. Numbers and booleans are accepted as text
/// since some parser outputs do not quote them.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tag -> content mapping over a sequence whose tags must be unique.
#[derive(Debug)]
pub struct TagMap<'a> {
    construct: String,
    fields: BTreeMap<&'a str, &'a Value>,
}

impl<'a> TagMap<'a> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<&'a Value> {
        self.fields.get(tag).copied()
    }

    pub fn require(&self, tag: &str) -> Result<&'a Value, CompileError> {
        self.get(tag).ok_or_else(|| {
            CompileError::malformed(format!("{} is missing '{}'", self.construct, tag))
        })
    }

    pub fn require_text(&self, tag: &str) -> Result<String, CompileError> {
        let value = self.require(tag)?;
        scalar_text(value).ok_or_else(|| {
            CompileError::malformed(format!(
                "'{}' in {} must hold text, found {}",
                tag,
                self.construct,
                describe(value)
            ))
        })
    }

    pub fn tags(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.keys().copied()
    }

    /// Fail on any field outside `allowed`. Constructs are total over their
    /// field set, so an unexpected field is never silently skipped.
    pub fn only(&self, allowed: &[&str]) -> Result<(), CompileError> {
        for tag in self.fields.keys() {
            if !allowed.contains(tag) {
                return Err(CompileError::malformed(format!(
                    "unexpected field '{}' in {}",
                    tag, self.construct
                )));
            }
        }
        Ok(())
    }
}

/// Build a [`TagMap`] from a sequence of distinctly-tagged nodes.
/// A repeated tag is a hard error; nothing is overwritten.
pub fn tag_map<'a>(value: &'a Value, construct: &str) -> Result<TagMap<'a>, CompileError> {
    let mut fields = BTreeMap::new();
    for node in tagged_sequence(value)? {
        if fields.insert(node.tag, node.content).is_some() {
            return Err(CompileError::DuplicateTag {
                construct: construct.to_string(),
                tag: node.tag.to_string(),
            });
        }
    }
    Ok(TagMap {
        construct: construct.to_string(),
        fields,
    })
}

pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_keeps_every_unique_tag() {
        let seq = json!([
            {"identifier": "x"},
            {"accessor": "mutate"},
            {"type": [{"base_type": "Int"}]}
        ]);
        let map = tag_map(&seq, "function_parameter").unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("identifier"), Some(&json!("x")));
        assert_eq!(map.get("accessor"), Some(&json!("mutate")));
        assert_eq!(map.get("type"), Some(&json!([{"base_type": "Int"}])));
        assert!(map.only(&["identifier", "accessor", "type"]).is_ok());
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let seq = json!([{"identifier": "a"}, {"identifier": "b"}]);
        let err = tag_map(&seq, "function").unwrap_err();
        match err {
            CompileError::DuplicateTag { construct, tag } => {
                assert_eq!(construct, "function");
                assert_eq!(tag, "identifier");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn multi_key_node_is_malformed() {
        let seq = json!([{"identifier": "a", "type": "Int"}]);
        assert!(matches!(
            tag_map(&seq, "function"),
            Err(CompileError::MalformedTree(_))
        ));
    }

    #[test]
    fn non_object_element_is_malformed() {
        let seq = json!(["identifier"]);
        assert!(tagged_sequence(&seq).is_err());
    }

    #[test]
    fn empty_markers_read_as_empty_sequence() {
        assert!(tagged_sequence(&json!(null)).unwrap().is_empty());
        assert!(tagged_sequence(&json!("")).unwrap().is_empty());
        assert!(tagged_sequence(&json!([])).unwrap().is_empty());
        assert!(tagged_sequence(&json!("text")).is_err());
    }

    #[test]
    fn single_child_requires_exactly_one() {
        let one = json!([{"term": []}]);
        assert_eq!(single_child(&one).unwrap().tag, "term");
        assert!(single_child(&json!([])).is_err());
        assert!(single_child(&json!([{"term": []}, {"term": []}])).is_err());
    }

    #[test]
    fn unexpected_field_is_reported() {
        let seq = json!([{"identifier": "main"}, {"colour": "blue"}]);
        let map = tag_map(&seq, "function").unwrap();
        let err = map.only(&["identifier"]).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }
}
