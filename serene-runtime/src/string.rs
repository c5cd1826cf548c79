// Growable text
// Stored as a char sequence so that indexing, insert and delete are by
// character, and ordering is lexicographic over those characters.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::container::SnContainer;
use crate::error::{check_index, fatal, RuntimeError};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnString {
    items: Vec<char>,
}

impl SnString {
    pub fn new() -> Self {
        SnString { items: Vec::new() }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, char> {
        self.items.iter()
    }

    pub fn append(&mut self, item: char) {
        self.items.push(item);
    }

    pub fn try_insert(&mut self, index: usize, item: char) -> Result<(), RuntimeError> {
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
    pub fn insert(&mut self, index: usize, item: char) {
        if let Err(e) = self.try_insert(index, item) {
            fatal(e);
        }
    }

    pub fn try_delete(&mut self, index: usize) -> Result<char, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(self.items.remove(index))
    }

    #[track_caller]
    pub fn delete(&mut self, index: usize) -> char {
        match self.try_delete(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }

    pub fn try_pop(&mut self) -> Result<char, RuntimeError> {
        self.items.pop().ok_or(RuntimeError::EmptyContainer)
    }

    #[track_caller]
    pub fn pop(&mut self) -> char {
        match self.try_pop() {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }
}

impl From<&str> for SnString {
    fn from(text: &str) -> Self {
        SnString {
            items: text.chars().collect(),
        }
    }
}

impl From<String> for SnString {
    fn from(text: String) -> Self {
        SnString::from(text.as_str())
    }
}

impl SnContainer for SnString {
    type Item = char;

    fn length(&self) -> usize {
        self.items.len()
    }

    fn try_get(&self, index: usize) -> Result<&char, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(&self.items[index])
    }

    fn try_get_mut(&mut self, index: usize) -> Result<&mut char, RuntimeError> {
        check_index(index, self.items.len())?;
        Ok(&mut self.items[index])
    }
}

impl Index<usize> for SnString {
    type Output = char;

    #[track_caller]
    fn index(&self, index: usize) -> &char {
        self.get(index)
    }
}

impl IndexMut<usize> for SnString {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut char {
        match self.try_get_mut(index) {
            Ok(item) => item,
            Err(e) => fatal(e),
        }
    }
}

impl fmt::Display for SnString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.items {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_text() {
        let mut s = SnString::from("serene");
        s.append('!');
        assert_eq!(s.to_string(), "serene!");
        assert_eq!(s.length(), 7);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let apple = SnString::from("apple");
        let apply = SnString::from("apply");
        let app = SnString::from("app");
        assert!(apple < apply);
        assert!(app < apple);
        assert!(apply > app);
        assert_eq!(apple, SnString::from(String::from("apple")));
        assert_ne!(apple, apply);
    }

    #[test]
    fn edit_by_character() {
        let mut s = SnString::from("hllo");
        s.insert(1, 'e');
        assert_eq!(s.to_string(), "hello");
        assert_eq!(s.delete(0), 'h');
        assert_eq!(s.pop(), 'o');
        assert_eq!(s.to_string(), "ell");
        s[0] = 'E';
        assert_eq!(s[0], 'E');
    }

    #[test]
    fn try_forms_report_errors() {
        let mut s = SnString::new();
        assert_eq!(s.try_pop(), Err(RuntimeError::EmptyContainer));
        assert_eq!(
            s.try_delete(0),
            Err(RuntimeError::IndexOutOfBounds { index: 0, length: 0 })
        );
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_at_length_is_fatal() {
        let s = SnString::from("abc");
        let _value = s[3];
    }
}
