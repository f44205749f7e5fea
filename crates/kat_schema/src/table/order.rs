//! Property ordering.
//!
//! Properties are kept in a singly linked list over an arena. Each node
//! carries an `index` and a `grade`:
//!
//! - `index >= 0`: explicit position, ascending;
//! - `index == -1`: natural order, in registration order;
//! - `index <= -2`: always last, after every natural node.
//!
//! Equal indexes put the higher grade (the more distant ancestor) first.

use alloc::vec::Vec;

struct Node<T> {
    index: i32,
    grade: u32,
    next: Option<usize>,
    value: T,
}

// -----------------------------------------------------------------------------
// Sequence

/// An insertion-ordered list applying the property ordering rules.
///
/// # Examples
///
/// ```
/// use kat_schema::table::order::Sequence;
///
/// let mut seq = Sequence::new();
/// seq.insert(2, 0, "a");
/// seq.insert(0, 0, "b");
/// seq.insert(-1, 0, "c");
///
/// assert_eq!(seq.iter().copied().collect::<Vec<_>>(), ["b", "a", "c"]);
/// ```
pub struct Sequence<T> {
    nodes: Vec<Node<T>>,
    head: Option<usize>,
    // Last natural node of grade 0.
    tail: Option<usize>,
}

impl<T> Sequence<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts `value` and returns its arena id.
    pub fn insert(&mut self, index: i32, grade: u32, value: T) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            index,
            grade,
            next: None,
            value,
        });

        if index == -1 && grade == 0 {
            let prev = self.tail.or_else(|| self.last_natural());
            self.link(prev, id);
            self.tail = Some(id);
            return id;
        }

        let (prev, from) = match self.tail {
            Some(tail) if index <= -2 => (Some(tail), self.nodes[tail].next),
            _ => (None, self.head),
        };
        let prev = self.walk(prev, from, |node| {
            if index >= 0 {
                node.index < 0 || index < node.index || (index == node.index && grade > node.grade)
            } else {
                node.index < index || (index == node.index && grade > node.grade)
            }
        });
        self.link(prev, id);
        id
    }

    /// The value stored under `id`.
    #[inline]
    pub fn get(&self, id: usize) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.value)
    }

    /// Iterates in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.ids().map(|id| &self.nodes[id].value)
    }

    /// Consumes the sequence, returning its values in order.
    pub fn into_vec(self) -> Vec<T> {
        let order: Vec<usize> = self.ids().collect();
        let mut nodes: Vec<Option<T>> = self.nodes.into_iter().map(|node| Some(node.value)).collect();
        order.into_iter().filter_map(|id| nodes[id].take()).collect()
    }

    fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.head, |&id| self.nodes[id].next)
    }

    // Last node before the first always-last one.
    fn last_natural(&self) -> Option<usize> {
        self.ids().take_while(|&id| self.nodes[id].index >= -1).last()
    }

    // Returns the node after which the new one goes: the predecessor of the
    // first node from `from` on matching `stop`.
    fn walk(&self, mut prev: Option<usize>, from: Option<usize>, stop: impl Fn(&Node<T>) -> bool) -> Option<usize> {
        let mut cursor = from;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if stop(node) {
                break;
            }
            prev = Some(id);
            cursor = node.next;
        }
        prev
    }

    fn link(&mut self, prev: Option<usize>, id: usize) {
        match prev {
            Some(prev) => {
                self.nodes[id].next = self.nodes[prev].next;
                self.nodes[prev].next = Some(id);
            }
            None => {
                self.nodes[id].next = self.head;
                self.head = Some(id);
            }
        }
    }
}

impl<T> Default for Sequence<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::Sequence;

    fn order(seq: &Sequence<&'static str>) -> Vec<&'static str> {
        seq.iter().copied().collect()
    }

    #[test]
    fn explicit_then_natural() {
        let mut seq = Sequence::new();
        seq.insert(2, 0, "a");
        seq.insert(0, 0, "b");
        seq.insert(-1, 0, "c");
        assert_eq!(order(&seq), ["b", "a", "c"]);
    }

    #[test]
    fn natural_keeps_registration_order() {
        let mut seq = Sequence::new();
        for name in ["x", "y", "z"] {
            seq.insert(-1, 0, name);
        }
        seq.insert(1, 0, "one");
        assert_eq!(order(&seq), ["one", "x", "y", "z"]);
    }

    #[test]
    fn always_last_stays_last() {
        let mut seq = Sequence::new();
        seq.insert(-2, 0, "last");
        seq.insert(-1, 0, "a");
        seq.insert(-3, 0, "very last");
        seq.insert(-1, 0, "b");
        seq.insert(5, 0, "five");
        assert_eq!(order(&seq), ["five", "a", "b", "last", "very last"]);
    }

    #[test]
    fn equal_index_prefers_ancestor() {
        let mut seq = Sequence::new();
        seq.insert(0, 0, "own");
        seq.insert(0, 1, "parent");
        seq.insert(0, 2, "grandparent");
        assert_eq!(order(&seq), ["grandparent", "parent", "own"]);
    }

    #[test]
    fn inherited_natural_before_own() {
        let mut seq = Sequence::new();
        seq.insert(-1, 0, "own");
        seq.insert(-2, 0, "last");
        seq.insert(-1, 1, "inherited");
        seq.insert(-1, 0, "own too");
        assert_eq!(order(&seq), ["inherited", "own", "own too", "last"]);
    }

    #[test]
    fn into_vec_follows_order() {
        let mut seq = Sequence::new();
        seq.insert(-1, 0, 'c');
        seq.insert(1, 0, 'b');
        seq.insert(0, 0, 'a');
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.into_vec(), ['a', 'b', 'c']);
    }
}
