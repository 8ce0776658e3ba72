/// Ordered list with move-to-front on re-insert and a fixed capacity
///
/// Index 0 is the most recent entry. Inserting past capacity evicts the
/// oldest entry at the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentList<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T: PartialEq> RecentList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild from stored items (most recent first), dropping repeats and overflow
    pub fn from_items(capacity: usize, items: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new(capacity);
        for item in items {
            if list.items.len() == capacity {
                break;
            }
            if !list.items.contains(&item) {
                list.items.push(item);
            }
        }
        list
    }

    /// Move `item` to the front; returns the evicted entry, if any
    pub fn touch(&mut self, item: T) -> Option<T> {
        if let Some(pos) = self.items.iter().position(|existing| *existing == item) {
            self.items.remove(pos);
        }
        self.items.insert(0, item);

        if self.items.len() > self.capacity {
            self.items.pop()
        } else {
            None
        }
    }

    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|existing| existing == item) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}
