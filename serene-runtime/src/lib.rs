//! Serene Runtime Library
//!
//! Container and output primitives linked by every program the Serene
//! compiler emits. Generated code only ever imports `prelude::*`.
//!
//! ## Contract
//!
//! 1. **Bounds-checked**: every indexed access checks `index < length`;
//!    nothing clamps or wraps.
//! 2. **Value semantics**: containers are `Clone` (deep copy of the backing
//!    store) and never `Copy`; two container values never share storage.
//! 3. **Two failure surfaces**: `try_*` methods return [`RuntimeError`];
//!    the plain methods and `[]` indexing used by generated code treat the
//!    same error as fatal.

pub mod array;
pub mod container;
pub mod error;
pub mod io;
pub mod string;
pub mod vector;

pub use array::SnArray;
pub use container::SnContainer;
pub use error::RuntimeError;
pub use io::Printer;
pub use string::SnString;
pub use vector::SnVector;

/// Everything emitted code refers to by name.
pub mod prelude {
    pub use crate::array::SnArray;
    pub use crate::container::SnContainer;
    pub use crate::error::RuntimeError;
    pub use crate::io::Printer;
    pub use crate::string::SnString;
    pub use crate::vector::SnVector;
}
