//! Recency list: a doubly linked list stored in a slot arena
//!
//! Nodes link to each other by slot index, so every operation is O(1) and no
//! raw pointers are involved. `push_front` hands out a [`Handle`] that carries
//! the slot's generation; once the node is removed the slot's generation is
//! bumped, so a stale handle can never reach a recycled node.

/// Opaque position of a value inside a [`RecencyList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

/// Ordered sequence with the most-recently-used value at the front
pub struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most-recently-used entry
    pub fn front(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    /// Least-recently-used entry
    pub fn back(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_mut().map(|node| &mut node.value)
    }

    /// Insert `value` as the most-recently-used entry
    pub fn push_front(&mut self, value: T) -> Handle {
        let node = Node {
            value,
            prev: None,
            next: self.head,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        };

        if let Some(old_head) = self.head {
            if let Some(head) = self.slots[old_head].node.as_mut() {
                head.prev = Some(index);
            }
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.len += 1;

        self.handle_at(index)
    }

    /// Remove the entry behind `handle`, returning its value.
    ///
    /// Returns `None` for a handle whose entry was already removed.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.node(handle)?;
        self.unlink(handle.index);

        let slot = &mut self.slots[handle.index];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;

        Some(node.value)
    }

    /// Promote the entry behind `handle` to the front.
    ///
    /// Returns `false` if the handle is stale.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        if self.node(handle).is_none() {
            return false;
        }
        if self.head == Some(handle.index) {
            return true;
        }

        self.unlink(handle.index);

        let old_head = self.head;
        if let Some(node) = self.slots[handle.index].node.as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old_head) => {
                if let Some(head) = self.slots[old_head].node.as_mut() {
                    head.prev = Some(handle.index);
                }
            }
            None => self.tail = Some(handle.index),
        }
        self.head = Some(handle.index);

        true
    }

    /// Iterate from most- to least-recently-used
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn node(&self, handle: Handle) -> Option<&Node<T>> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn handle_at(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Detach a node from its neighbours, leaving it in its slot
    fn unlink(&mut self, index: usize) {
        let (prev, next) = match self.slots[index].node.as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.slots[prev].node.as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next) => {
                if let Some(node) = self.slots[next].node.as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    next: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.slots[self.next?].node.as_ref()?;
        self.next = node.next;
        Some(&node.value)
    }
}
