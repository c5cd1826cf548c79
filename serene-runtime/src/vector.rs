// Growable vector
// Append / insert / delete / pop on top of the shared bounds-checked access.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::container::{render_items, SnContainer};
use crate::error::{check_index, fatal, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnVector<T> {
    items: Vec<T>,
}

impl<T> SnVector<T> {
    pub fn new() -> Self {
        SnVector { items: Vec::new() }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Insert before `index`; `index == length` appends.
    pub fn try_insert(&mut self, index: usize, item: T) -> Result<(), RuntimeError> {
        if index > self.items.len() {
            return Err(RuntimeError::IndexOutOfBounds {
                index,
                length: self.items.len(),
            });
        }
        self.items.insert(index, item);
        Ok(())
    }

    #[track_caller]
    pub fn insert(&mut self, index: usize, item: T) {
        if let Err(e) = self.try_insert(index, item) {
            fatal(e);
        }
    }

    /// Remove the element at `index`, shifting later elements left by one.
    pub fn try_delete(&mut self, index: usize) -> Result<T, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(self.items.remove(index))
    }

    #[track_caller]
    pub fn delete(&mut self, index: usize) -> T {
        match self.try_delete(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }

    pub fn try_pop(&mut self) -> Result<T, RuntimeError> {
        self.items.pop().ok_or(RuntimeError::EmptyContainer)
    }

    #[track_caller]
    pub fn pop(&mut self) -> T {
        match self.try_pop() {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }
}

impl<T: Ord> SnVector<T> {
    /// Position of `target` in a sorted vector, if present.
    pub fn binary_search(&self, target: &T) -> Option<usize> {
        self.items.binary_search(target).ok()
    }
}

impl<T> Default for SnVector<T> {
    fn default() -> Self {
        SnVector::new()
    }
}

impl<T> From<Vec<T>> for SnVector<T> {
    fn from(items: Vec<T>) -> Self {
        SnVector { items }
    }
}

impl<T, const N: usize> From<[T; N]> for SnVector<T> {
    fn from(items: [T; N]) -> Self {
        SnVector { items: items.into() }
    }
}

impl<T> FromIterator<T> for SnVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SnVector {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> SnContainer for SnVector<T> {
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

impl<T> Index<usize> for SnVector<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for SnVector<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.try_get_mut(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }
}

impl<'a, T> IntoIterator for &'a SnVector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Display for SnVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_items(f, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evens() -> SnVector<i64> {
        let mut v = SnVector::new();
        for x in [0, 2, 4, 6, 8] {
            v.append(x);
        }
        v
    }

    #[test]
    fn append_then_read_last() {
        let mut v = evens();
        let before = v.length();
        v.append(10);
        assert_eq!(v.length(), before + 1);
        assert_eq!(v[v.length() - 1], 10);
    }

    #[test]
    fn delete_found_by_binary_search() {
        let mut v = evens();
        let index = v.binary_search(&6);
        assert_eq!(index, Some(3));
        if let Some(i) = index {
            assert_eq!(v.delete(i), 6);
        }
        assert_eq!(v.length(), 4);
        assert_eq!(v.to_string(), "[0, 2, 4, 8]");
    }

    #[test]
    fn delete_shifts_later_elements_left() {
        let mut v = SnVector::from(vec!['a', 'b', 'c', 'd']);
        v.delete(1);
        assert_eq!(v.as_slice(), &['a', 'c', 'd']);
    }

    #[test]
    fn binary_search_misses_absent_value() {
        assert_eq!(evens().binary_search(&5), None);
    }

    #[test]
    fn insert_accepts_zero_through_length() {
        let mut v = SnVector::from(vec![1, 3]);
        v.insert(1, 2);
        v.insert(0, 0);
        v.insert(4, 4);
        assert_eq!(v.to_string(), "[0, 1, 2, 3, 4]");
        assert_eq!(
            v.try_insert(6, 9),
            Err(RuntimeError::IndexOutOfBounds { index: 6, length: 5 })
        );
    }

    #[test]
    fn pop_returns_last() {
        let mut v = evens();
        assert_eq!(v.pop(), 8);
        assert_eq!(v.length(), 4);
    }

    #[test]
    fn try_pop_on_empty() {
        let mut v: SnVector<u8> = SnVector::new();
        assert_eq!(v.try_pop(), Err(RuntimeError::EmptyContainer));
    }

    #[test]
    #[should_panic(expected = "container is empty")]
    fn pop_on_empty_is_fatal() {
        let mut v: SnVector<u8> = SnVector::new();
        v.pop();
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn delete_at_length_is_fatal() {
        let mut v = evens();
        v.delete(5);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_at_length_is_fatal() {
        let v = evens();
        let _value = v[5];
    }

    #[test]
    fn renders_bracketed() {
        let empty: SnVector<i64> = SnVector::new();
        assert_eq!(empty.to_string(), "[]");
        assert_eq!(SnVector::from(vec![7u8]).to_string(), "[7]");
        assert_eq!(evens().to_string(), "[0, 2, 4, 6, 8]");
    }

    #[test]
    fn copies_are_independent() {
        let original = evens();
        let mut copy = original.clone();
        copy.append(99);
        copy[0] = -1;
        assert_eq!(original.to_string(), "[0, 2, 4, 6, 8]");
        assert_eq!(copy.length(), original.length() + 1);
    }
}
