// Source identifier -> Rust identifier
// Every source name is emitted behind the `sn_` prefix, so no source name can
// collide with a Rust keyword or with a runtime item.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CompileError;

const PREFIX: &str = "sn_";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
    })
}

pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

pub fn rust_name(name: &str) -> Result<String, CompileError> {
    if !is_identifier(name) {
        return Err(CompileError::malformed(format!(
            "'{}' is not a valid identifier",
            name
        )));
    }
    Ok(format!("{}{}", PREFIX, name))
}
