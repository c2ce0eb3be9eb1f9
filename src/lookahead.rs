use std::ops::Index;

/// Fixed-capacity ring buffer used for k-token lookahead.
///
/// Lookups are relative to the oldest unread item (the head). A lookup past
/// the filled length never wraps around: [`LookaheadBuffer::get`] returns
/// `None` and indexing panics.
#[derive(Debug)]
pub struct LookaheadBuffer<T, const N: usize> {
    slots: [Option<T>; N],
    head: usize,
    len: usize,
}

impl<T, const N: usize> LookaheadBuffer<T, N> {
    pub fn new() -> Self {
        assert!(N > 0, "lookahead buffer needs at least one slot");
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Appends `item`. When the buffer is already full the oldest item is
    /// overwritten and returned.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.is_full() {
            let evicted = self.slots[self.head].replace(item);
            self.head = (self.head + 1) % N;
            evicted
        } else {
            let tail = (self.head + self.len) % N;
            self.slots[tail] = Some(item);
            self.len += 1;
            None
        }
    }

    /// Removes and returns the head.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % N;
        self.len -= 1;
        item
    }

    /// Item `i` slots ahead of the head.
    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            return None;
        }
        self.slots[(self.head + i) % N].as_ref()
    }

    pub fn head(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

impl<T, const N: usize> Default for LookaheadBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Index<usize> for LookaheadBuffer<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match self.get(i) {
            Some(item) => item,
            None => panic!("lookahead index {i} out of range (filled {})", self.len),
        }
    }
}
