//! Reusable object pool.
//!
//! Tables rebuild their cells often; cells are returned here instead of being
//! dropped and handed back out by `obtain`.

/// Objects that can be returned to a [`Pool`]
pub trait Poolable {
    /// Return the object to its freshly constructed state
    fn reset(&mut self);
}

#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    max: usize,
    peak: usize,
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable + Default> Pool<T> {
    /// Pool that keeps at most `usize::MAX` free objects
    pub fn new() -> Self {
        Self::with_max(usize::MAX)
    }

    pub fn with_max(max: usize) -> Self {
        Self {
            free: Vec::new(),
            max,
            peak: 0,
        }
    }

    /// Take a free object, or construct a new one when the pool is empty
    pub fn obtain(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Reset an object and keep it for reuse. Objects beyond the max are dropped.
    pub fn free(&mut self, mut object: T) {
        if self.free.len() < self.max {
            object.reset();
            self.free.push(object);
            self.peak = self.peak.max(self.free.len());
        }
    }

    pub fn free_all<I: IntoIterator<Item = T>>(&mut self, objects: I) {
        for object in objects {
            self.free(object);
        }
    }

    /// Drop every free object
    pub fn clear(&mut self) {
        self.free.clear();
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Largest number of free objects held at once
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i32,
        resets: u32,
    }

    impl Poolable for Counter {
        fn reset(&mut self) {
            self.value = 0;
            self.resets += 1;
        }
    }

    #[test]
    fn test_free_resets_and_reuses() {
        let mut pool = Pool::<Counter>::new();
        let mut c = pool.obtain();
        c.value = 5;
        pool.free(c);
        assert_eq!(pool.free_count(), 1);

        let c = pool.obtain();
        assert_eq!(c.value, 0);
        assert_eq!(c.resets, 1);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_max_drops_extra_objects() {
        let mut pool = Pool::<Counter>::with_max(2);
        pool.free_all((0..5).map(|value| Counter { value, resets: 0 }));
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.peak(), 2);
        pool.clear();
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.peak(), 2);
    }
}
