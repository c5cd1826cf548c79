// Fixed-length array
// Length is set at construction; there is no resize operation of any kind.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::container::{render_items, SnContainer};
use crate::error::{check_index, fatal, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnArray<T> {
    items: Vec<T>,
}

impl<T> SnArray<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for SnArray<T> {
    fn from(items: Vec<T>) -> Self {
        SnArray { items }
    }
}

impl<T, const N: usize> From<[T; N]> for SnArray<T> {
    fn from(items: [T; N]) -> Self {
        SnArray { items: items.into() }
    }
}

impl<T> SnContainer for SnArray<T> {
    type Item = T;

    fn length(&self) -> usize {
        self.items.len()
    }

    fn try_get(&self, index: usize) -> Result<&T, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(&self.items[index])
    }

    fn try_get_mut(&mut self, index: usize) -> Result<&mut T, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(&mut self.items[index])
    }
}

impl<T> Index<usize> for SnArray<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for SnArray<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.try_get_mut(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }
}

impl<'a, T> IntoIterator for &'a SnArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Display for SnArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_items(f, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_write_then_read() {
        let mut a = SnArray::from([0i64; 7]);
        for i in 0..7 {
            a[i] = (i as i64) * 2;
        }
        assert_eq!(a.length(), 7);
        assert_eq!(a[3], 6);
        assert_eq!(a.to_string(), "[0, 2, 4, 6, 8, 10, 12]");
    }

    #[test]
    fn try_get_at_length_is_an_error() {
        let a = SnArray::from(vec![1, 2, 3]);
        assert_eq!(
            a.try_get(3),
            Err(RuntimeError::IndexOutOfBounds { index: 3, length: 3 })
        );
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_at_length_is_fatal() {
        let a = SnArray::from(vec![1, 2, 3]);
        let _value = a[3];
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn set_past_end_is_fatal() {
        let mut a = SnArray::from(vec![1u8]);
        a.set(1, 9);
    }

    #[test]
    fn clone_does_not_alias() {
        let mut a = SnArray::from(vec![1i64, 2, 3]);
        let mut b = a.clone();
        a[2] = 100;
        b[0] = -5;
        assert_eq!(a.to_string(), "[1, 2, 100]");
        assert_eq!(b.to_string(), "[-5, 2, 3]");
    }

    #[test]
    fn renders_empty_and_byte_elements() {
        let empty: SnArray<i64> = SnArray::from(Vec::new());
        assert_eq!(empty.to_string(), "[]");
        let bytes = SnArray::from(vec![65u8, 7]);
        assert_eq!(bytes.to_string(), "[65, 7]");
        let signed = SnArray::from(vec![-1i8, 66]);
        assert_eq!(signed.to_string(), "[-1, 66]");
    }
}
