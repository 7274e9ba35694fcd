//! A list whose removals can be deferred while it is being iterated.
//!
//! Listener dispatch walks a list while listeners may add or remove entries
//! (including themselves). Between `begin()` and the matching `end()` removals
//! are only recorded; the items stay in place so the running iteration sees a
//! stable sequence. Appends are applied immediately and are not visited by an
//! iteration that captured the length up front.

use crate::error::{UiError, UiResult};

#[derive(Debug, Clone)]
pub struct DelayedRemovalList<T> {
    items: Vec<T>,
    iterating: usize,
    /// Pending removals, sorted ascending without duplicates
    remove: Vec<usize>,
    /// Pending "clear the first N items"
    clear: usize,
}

impl<T> Default for DelayedRemovalList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayedRemovalList<T> {
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            iterating: 0,
            remove: Vec::new(),
            clear: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Open an iteration bracket. Brackets nest.
    pub fn begin(&mut self) {
        self.iterating += 1;
    }

    /// Close an iteration bracket, applying pending removals once the outermost one closes
    pub fn end(&mut self) -> UiResult<()> {
        if self.iterating == 0 {
            return Err(UiError::NotIterating);
        }
        self.iterating -= 1;
        if self.iterating > 0 {
            return Ok(());
        }

        if self.clear > 0 && self.clear == self.items.len() {
            self.remove.clear();
            self.items.clear();
        } else {
            while let Some(index) = self.remove.pop() {
                if index >= self.clear && index < self.items.len() {
                    self.items.remove(index);
                }
            }
            self.items.drain(..self.clear.min(self.items.len()));
        }
        self.clear = 0;
        Ok(())
    }

    pub fn is_iterating(&self) -> bool {
        self.iterating > 0
    }

    fn defer_remove(&mut self, index: usize) {
        if index < self.clear {
            return;
        }
        if let Err(pos) = self.remove.binary_search(&index) {
            self.remove.insert(pos, index);
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Remove the item at `index`. While iterating the removal is deferred and
    /// the returned value is `None`, since the item stays in place until `end()`.
    pub fn remove_index(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        if self.iterating > 0 {
            self.defer_remove(index);
            return None;
        }
        Some(self.items.remove(index))
    }

    /// Clear the list, or at the end of iteration when one is in progress
    pub fn clear(&mut self) {
        if self.iterating > 0 {
            self.clear = self.items.len();
            return;
        }
        self.items.clear();
    }

    pub fn insert(&mut self, index: usize, item: T) -> UiResult<()> {
        if self.iterating > 0 {
            return Err(UiError::StructuralChangeWhileIterating("insert"));
        }
        if index > self.items.len() {
            return Err(UiError::InvalidArgument("insert index out of bounds"));
        }
        self.items.insert(index, item);
        Ok(())
    }

    pub fn set(&mut self, index: usize, item: T) -> UiResult<()> {
        if self.iterating > 0 {
            return Err(UiError::StructuralChangeWhileIterating("set"));
        }
        let slot = self
            .items
            .get_mut(index)
            .ok_or(UiError::InvalidArgument("set index out of bounds"))?;
        *slot = item;
        Ok(())
    }

    pub fn pop(&mut self) -> UiResult<Option<T>> {
        if self.iterating > 0 {
            return Err(UiError::StructuralChangeWhileIterating("pop"));
        }
        Ok(self.items.pop())
    }

    pub fn sort_by<F>(&mut self, compare: F) -> UiResult<()>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        if self.iterating > 0 {
            return Err(UiError::StructuralChangeWhileIterating("sort"));
        }
        self.items.sort_by(compare);
        Ok(())
    }

    /// Number of items, including ones with a pending removal
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> DelayedRemovalList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    /// Remove the first item equal to `item`, returning whether it was found
    pub fn remove_value(&mut self, item: &T) -> bool {
        let Some(index) = self.index_of(item) else {
            return false;
        };
        if self.iterating > 0 {
            self.defer_remove(index);
        } else {
            self.items.remove(index);
        }
        true
    }
}

impl<'a, T> IntoIterator for &'a DelayedRemovalList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(items: &[i32]) -> DelayedRemovalList<i32> {
        let mut list = DelayedRemovalList::new();
        for &item in items {
            list.push(item);
        }
        list
    }

    #[test]
    fn test_removal_deferred_until_end() {
        let mut list = list_of(&[1, 2, 3, 4]);
        list.begin();
        assert!(list.remove_value(&2));
        assert!(list.remove_value(&4));
        assert_eq!(list.len(), 4);
        assert_eq!(list.get(1), Some(&2));
        list.end().unwrap();
        assert_eq!(list.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_duplicate_removal_recorded_once() {
        let mut list = list_of(&[1, 2, 3]);
        list.begin();
        list.remove_index(1);
        list.remove_index(1);
        list.end().unwrap();
        assert_eq!(list.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_nested_brackets_apply_on_outermost_end() {
        let mut list = list_of(&[1, 2, 3]);
        list.begin();
        list.begin();
        list.remove_value(&1);
        list.end().unwrap();
        assert_eq!(list.len(), 3);
        list.end().unwrap();
        assert_eq!(list.as_slice(), &[2, 3]);
    }

    #[test]
    fn test_clear_during_iteration_keeps_later_pushes() {
        let mut list = list_of(&[1, 2]);
        list.begin();
        list.clear();
        list.push(9);
        list.end().unwrap();
        assert_eq!(list.as_slice(), &[9]);
    }

    #[test]
    fn test_clear_during_iteration() {
        let mut list = list_of(&[1, 2, 3]);
        list.begin();
        list.remove_value(&2);
        list.clear();
        list.end().unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_structural_changes_rejected_while_iterating() {
        let mut list = list_of(&[3, 1, 2]);
        list.begin();
        assert_eq!(
            list.insert(0, 5),
            Err(UiError::StructuralChangeWhileIterating("insert"))
        );
        assert!(list.set(0, 5).is_err());
        assert!(list.pop().is_err());
        assert!(list.sort_by(|a, b| a.cmp(b)).is_err());
        list.end().unwrap();

        list.sort_by(|a, b| a.cmp(b)).unwrap();
        assert_eq!(list.as_slice(), &[1, 2, 3]);
        assert_eq!(list.pop(), Ok(Some(3)));
    }

    #[test]
    fn test_end_without_begin() {
        let mut list = list_of(&[1]);
        assert_eq!(list.end(), Err(UiError::NotIterating));
    }

    #[test]
    fn test_immediate_removal_outside_iteration() {
        let mut list = list_of(&[1, 2, 3]);
        assert_eq!(list.remove_index(0), Some(1));
        assert!(!list.remove_value(&7));
        assert_eq!(list.index_of(&3), Some(1));
    }
}
