// Runtime failure taxonomy shared by all containers

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("index out of bounds: index {index} but length is {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("container is empty")]
    EmptyContainer,

    #[error("output failed: {0}")]
    Output(String),
}

/// Stop the running program with a runtime diagnostic.
///
/// Generated code has no recovery path, so this is where a `RuntimeError`
/// ends up when it reaches the plain (non-`try_`) API.
#[track_caller]
pub fn fatal(err: RuntimeError) -> ! {
    panic!("< Exception: {} >", err)
}

pub(crate) fn check_index(index: usize, length: usize) -> Result<(), RuntimeError> {
    if index < length {
        Ok(())
    } else {
        Err(RuntimeError::IndexOutOfBounds { index, length })
    }
}
