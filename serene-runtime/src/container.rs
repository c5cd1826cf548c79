// Shared indexed-access surface for SnArray, SnVector and SnString

use std::fmt;

use crate::error::{fatal, RuntimeError};

/// Bounds-checked element access common to every runtime container.
///
/// Implementors supply `length` and the two `try_` accessors; the fatal
/// forms used by generated code are derived from them.
pub trait SnContainer {
    type Item;

    fn length(&self) -> usize;

    fn try_get(&self, index: usize) -> Result<&Self::Item, RuntimeError>;

    fn try_get_mut(&mut self, index: usize) -> Result<&mut Self::Item, RuntimeError>;

    fn is_empty(&self) -> bool {
        self.length() == 0
    }

    fn try_set(&mut self, index: usize, value: Self::Item) -> Result<(), RuntimeError> {
        *self.try_get_mut(index)? = value;
        Ok(())
    }

    #[track_caller]
    fn get(&self, index: usize) -> &Self::Item {
        match self.try_get(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }

    #[track_caller]
    fn set(&mut self, index: usize, value: Self::Item) {
        if let Err(e) = self.try_set(index, value) {
            fatal(e);
        }
    }
}

// "[a, b, c]" in index order, "[]" when empty
pub(crate) fn render_items<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}
