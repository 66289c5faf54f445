//! B-tree backend: every node holds up to `2t - 1` levels, best first.
//!
//! Insert splits full nodes on the way down and delete tops up thin nodes
//! on the way down, so both finish in one root-to-leaf pass.

use std::cmp::Ordering;
use std::mem;

use super::{PriceIndex, replace_keyed, search};
use crate::{Price, PriceComparator, PriceLevel, Side};

/// Default max children per node.
pub const DEFAULT_BRANCHING: usize = 32;

#[derive(Clone, Copy, Debug)]
struct Ranking {
    side: Side,
    comparator: PriceComparator,
    /// Minimum degree: non-root nodes hold `t - 1 ..= 2t - 1` levels.
    t: usize,
}

impl Ranking {
    #[inline]
    fn search(&self, levels: &[PriceLevel], price: Price) -> Result<usize, usize> {
        search(levels, price, self.comparator, self.side)
    }

    #[inline]
    fn max_levels(&self) -> usize {
        2 * self.t - 1
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    levels: Vec<PriceLevel>,
    /// Empty for leaves, otherwise `levels.len() + 1` entries.
    children: Vec<Node>,
}

impl Node {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First level equal to `price`, best-first.
    fn get(&self, price: Price, r: &Ranking) -> Option<&PriceLevel> {
        let (i, here) = match r.search(&self.levels, price) {
            Ok(i) => (i, true),
            Err(i) => (i, false),
        };
        // A better ranked equal key can only sit in the subtree left of slot i.
        let deeper = self.children.get(i).and_then(|child| child.get(price, r));
        if deeper.is_some() || !here {
            return deeper;
        }
        self.levels.get(i)
    }

    /// Level stored under exactly `key`. Keys are a precision apart, so the
    /// descent cannot stop at a neighbour.
    fn get_mut(&mut self, key: Price, r: &Ranking) -> Option<&mut PriceLevel> {
        match r.search(&self.levels, key) {
            Ok(i) => self.levels.get_mut(i),
            Err(i) => self.children.get_mut(i)?.get_mut(key, r),
        }
    }

    /// Split the full child `i` around its median, which moves up here.
    fn split_child(&mut self, i: usize, r: &Ranking) {
        let t = r.t;
        let child = &mut self.children[i];
        let mut right_levels = child.levels.split_off(t - 1);
        let median = right_levels.remove(0);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(t)
        };
        self.levels.insert(i, median);
        self.children.insert(
            i + 1,
            Node {
                levels: right_levels,
                children: right_children,
            },
        );
    }

    /// Insert into a node known to have room. Returns the replaced level.
    fn insert_non_full(&mut self, level: PriceLevel, r: &Ranking) -> Option<PriceLevel> {
        let mut i = match r.search(&self.levels, level.price()) {
            Ok(i) => return Some(replace_keyed(&mut self.levels[i], level)),
            Err(i) => i,
        };
        if self.is_leaf() {
            self.levels.insert(i, level);
            return None;
        }
        if self.children[i].levels.len() == r.max_levels() {
            self.split_child(i, r);
            match r
                .comparator
                .compare(r.side, level.price(), self.levels[i].price())
            {
                Ordering::Less => {}
                Ordering::Greater => i += 1,
                Ordering::Equal => return Some(replace_keyed(&mut self.levels[i], level)),
            }
        }
        self.children[i].insert_non_full(level, r)
    }

    /// Remove the level stored under exactly `key` from this subtree. The
    /// node holds at least `t` levels unless it is the root.
    fn remove(&mut self, key: Price, r: &Ranking) -> Option<PriceLevel> {
        match r.search(&self.levels, key) {
            Ok(i) if self.is_leaf() => Some(self.levels.remove(i)),
            Ok(i) => {
                if self.children[i].levels.len() >= r.t {
                    if let Some(pred) = self.children[i].pop_last(r) {
                        return Some(mem::replace(&mut self.levels[i], pred));
                    }
                }
                if self.children[i + 1].levels.len() >= r.t {
                    if let Some(succ) = self.children[i + 1].pop_first(r) {
                        return Some(mem::replace(&mut self.levels[i], succ));
                    }
                }
                self.merge_children(i);
                self.children[i].remove(key, r)
            }
            Err(_) if self.is_leaf() => None,
            Err(i) => {
                let i = self.fill_child(i, r);
                self.children[i].remove(key, r)
            }
        }
    }

    /// Remove the worst level of this subtree.
    fn pop_last(&mut self, r: &Ranking) -> Option<PriceLevel> {
        if self.is_leaf() {
            return self.levels.pop();
        }
        let i = self.fill_child(self.children.len() - 1, r);
        self.children[i].pop_last(r)
    }

    /// Remove the best level of this subtree.
    fn pop_first(&mut self, r: &Ranking) -> Option<PriceLevel> {
        if self.is_leaf() {
            return if self.levels.is_empty() {
                None
            } else {
                Some(self.levels.remove(0))
            };
        }
        let i = self.fill_child(0, r);
        self.children[i].pop_first(r)
    }

    /// Make sure child `i` has at least `t` levels before descending.
    ///
    /// Returns the index of the child that now covers the same key range
    /// (shifts left when `i` merged into its left sibling).
    fn fill_child(&mut self, i: usize, r: &Ranking) -> usize {
        if self.children[i].levels.len() >= r.t {
            return i;
        }
        if i > 0 && self.children[i - 1].levels.len() >= r.t {
            self.borrow_from_left(i);
            i
        } else if i + 1 < self.children.len() && self.children[i + 1].levels.len() >= r.t {
            self.borrow_from_right(i);
            i
        } else if i + 1 < self.children.len() {
            self.merge_children(i);
            i
        } else {
            self.merge_children(i - 1);
            i - 1
        }
    }

    /// Rotate one level from child `i - 1` through the separator into child `i`.
    fn borrow_from_left(&mut self, i: usize) {
        let (head, tail) = self.children.split_at_mut(i);
        let left = &mut head[i - 1];
        let child = &mut tail[0];
        if let Some(moved) = left.levels.pop() {
            let separator = mem::replace(&mut self.levels[i - 1], moved);
            child.levels.insert(0, separator);
            if let Some(grandchild) = left.children.pop() {
                child.children.insert(0, grandchild);
            }
        }
    }

    /// Rotate one level from child `i + 1` through the separator into child `i`.
    fn borrow_from_right(&mut self, i: usize) {
        let (head, tail) = self.children.split_at_mut(i + 1);
        let child = &mut head[i];
        let right = &mut tail[0];
        if right.levels.is_empty() {
            return;
        }
        let moved = right.levels.remove(0);
        let separator = mem::replace(&mut self.levels[i], moved);
        child.levels.push(separator);
        if !right.children.is_empty() {
            child.children.push(right.children.remove(0));
        }
    }

    /// Fold child `i + 1` and separator `i` into child `i`.
    fn merge_children(&mut self, i: usize) {
        let right = self.children.remove(i + 1);
        let separator = self.levels.remove(i);
        let child = &mut self.children[i];
        child.levels.push(separator);
        child.levels.extend(right.levels);
        child.children.extend(right.children);
    }
}

/// Price levels for one side, held in a B-tree.
#[derive(Clone, Debug)]
pub struct TreeIndex {
    root: Node,
    len: usize,
    ranking: Ranking,
}

impl TreeIndex {
    pub fn new(side: Side, comparator: PriceComparator) -> Self {
        Self::with_branching(side, comparator, DEFAULT_BRANCHING)
    }

    /// Create with a custom max children per node (at least 4).
    pub fn with_branching(side: Side, comparator: PriceComparator, branching: usize) -> Self {
        Self {
            root: Node::default(),
            len: 0,
            ranking: Ranking {
                side,
                comparator,
                t: (branching / 2).max(2),
            },
        }
    }

    /// Max children per node.
    pub fn branching(&self) -> usize {
        2 * self.ranking.t
    }

    /// Number of node layers, 1 for a lone root.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            node = child;
            height += 1;
        }
        height
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.root, self.len)
    }

    /// Panics if node fill, child counts, leaf depth or key order are off.
    #[cfg(test)]
    pub(crate) fn assert_valid(&self) {
        fn walk(
            node: &Node,
            r: &Ranking,
            is_root: bool,
            depth: usize,
            leaf_depth: &mut Option<usize>,
        ) {
            assert!(node.levels.len() <= r.max_levels());
            if !is_root {
                assert!(node.levels.len() + 1 >= r.t);
            }
            for pair in node.levels.windows(2) {
                assert_eq!(
                    r.comparator.compare(r.side, pair[0].price(), pair[1].price()),
                    Ordering::Less
                );
            }
            if node.is_leaf() {
                match leaf_depth {
                    Some(d) => assert_eq!(*d, depth),
                    None => *leaf_depth = Some(depth),
                }
            } else {
                assert_eq!(node.children.len(), node.levels.len() + 1);
                for child in &node.children {
                    walk(child, r, false, depth + 1, leaf_depth);
                }
            }
        }
        walk(&self.root, &self.ranking, true, 0, &mut None);
        assert_eq!(self.iter().count(), self.len);
    }
}

impl PriceIndex for TreeIndex {
    fn side(&self) -> Side {
        self.ranking.side
    }

    fn comparator(&self) -> PriceComparator {
        self.ranking.comparator
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.root.get(price, &self.ranking)
    }

    fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        let key = self.get(price)?.price();
        self.root.get_mut(key, &self.ranking)
    }

    fn upsert(&mut self, level: PriceLevel) -> Option<PriceLevel> {
        if let Some(slot) = self.get_mut(level.price()) {
            return Some(replace_keyed(slot, level));
        }
        let r = self.ranking;
        if self.root.levels.len() == r.max_levels() {
            let old_root = mem::take(&mut self.root);
            self.root.children.push(old_root);
            self.root.split_child(0, &r);
        }
        let replaced = self.root.insert_non_full(level, &r);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    fn delete(&mut self, price: Price) -> Option<PriceLevel> {
        let key = self.get(price)?.price();
        let r = self.ranking;
        let removed = self.root.remove(key, &r);
        if self.root.levels.is_empty() && self.root.children.len() == 1 {
            if let Some(child) = self.root.children.pop() {
                self.root = child;
            }
        }
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        Box::new(self.iter())
    }

    fn best(&self) -> Option<&PriceLevel> {
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node.levels.first()
    }

    fn clear(&mut self) {
        self.root = Node::default();
        self.len = 0;
    }
}

/// In-order, best-first traversal.
pub struct Iter<'a> {
    /// Nodes on the path to the next level, with the next level's slot.
    stack: Vec<(&'a Node, usize)>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    fn new(root: &'a Node, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        if len > 0 {
            iter.descend(root);
        }
        iter
    }

    fn descend(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PriceLevel;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, slot) = self.stack.last_mut()?;
            let node: &'a Node = *node;
            if *slot < node.levels.len() {
                let level = &node.levels[*slot];
                *slot += 1;
                let next_child = *slot;
                if let Some(child) = node.children.get(next_child) {
                    self.descend(child);
                }
                self.remaining = self.remaining.saturating_sub(1);
                return Some(level);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
