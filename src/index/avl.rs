use std::cmp::{Ordering, max};
use std::ops::Bound;

use allocative::Allocative;

use super::{KeySet, OrderedIndex};

type Link = Option<Box<Node>>;

#[derive(Debug, Clone, Allocative)]
struct Node {
    value: String,
    keys: KeySet,
    height: i32,
    left: Link,
    right: Link,
}

impl Node {
    fn new(value: &str, primary_key: &str) -> Box<Self> {
        Box::new(Self {
            value: value.to_string(),
            keys: KeySet::from([primary_key.to_string()]),
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restores the AVL property at `node`, assuming both subtrees are balanced
/// and differ in height by at most two.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn insert(link: Link, value: &str, primary_key: &str, created: &mut bool) -> Box<Node> {
    let Some(mut node) = link else {
        *created = true;
        return Node::new(value, primary_key);
    };

    match value.cmp(node.value.as_str()) {
        Ordering::Less => node.left = Some(insert(node.left.take(), value, primary_key, created)),
        Ordering::Greater => {
            node.right = Some(insert(node.right.take(), value, primary_key, created))
        }
        Ordering::Equal => {
            node.keys.insert(primary_key.to_string());
            return node;
        }
    }
    rebalance(node)
}

fn remove(link: Link, value: &str, primary_key: &str, pruned: &mut bool) -> Link {
    let mut node = link?;

    match value.cmp(node.value.as_str()) {
        Ordering::Less => node.left = remove(node.left.take(), value, primary_key, pruned),
        Ordering::Greater => node.right = remove(node.right.take(), value, primary_key, pruned),
        Ordering::Equal => {
            node.keys.remove(primary_key);
            if !node.keys.is_empty() {
                return Some(node);
            }
            *pruned = true;
            return match (node.left.take(), node.right.take()) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    Some(rebalance(successor))
                }
            };
        }
    }
    Some(rebalance(node))
}

/// Detaches the smallest node of the subtree. Returns the rebalanced
/// remainder and the detached node.
fn take_min(mut node: Box<Node>) -> (Link, Box<Node>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn scan(link: Option<&Node>, lower: Bound<&str>, upper: Bound<&str>, visitor: &mut dyn FnMut(&str, &KeySet)) {
    let Some(node) = link else {
        return;
    };
    let value = node.value.as_str();
    let above_lower = match lower {
        Bound::Unbounded => true,
        Bound::Included(bound) => value >= bound,
        Bound::Excluded(bound) => value > bound,
    };
    let below_upper = match upper {
        Bound::Unbounded => true,
        Bound::Included(bound) => value <= bound,
        Bound::Excluded(bound) => value < bound,
    };

    if above_lower {
        scan(node.left.as_deref(), lower, upper, visitor);
    }
    if above_lower && below_upper {
        visitor(value, &node.keys);
    }
    if below_upper {
        scan(node.right.as_deref(), lower, upper, visitor);
    }
}

/// Column index backed by a height-balanced (AVL) binary search tree.
#[derive(Debug, Clone, Default, Allocative)]
pub struct AvlIndex {
    root: Link,
    len: usize,
}

impl AvlIndex {
    /// Height of the tree; `0` when empty.
    pub fn height(&self) -> usize {
        height(&self.root) as usize
    }
}

impl OrderedIndex for AvlIndex {
    fn insert(&mut self, value: &str, primary_key: &str) {
        let mut created = false;
        self.root = Some(insert(self.root.take(), value, primary_key, &mut created));
        if created {
            self.len += 1;
        }
    }

    fn remove(&mut self, value: &str, primary_key: &str) {
        let mut pruned = false;
        self.root = remove(self.root.take(), value, primary_key, &mut pruned);
        if pruned {
            self.len -= 1;
        }
    }

    fn get(&self, value: &str) -> Option<&KeySet> {
        let mut link = self.root.as_deref();
        while let Some(node) = link {
            link = match value.cmp(node.value.as_str()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.keys),
            };
        }
        None
    }

    fn scan_range(&self, lower: Bound<&str>, upper: Bound<&str>, visitor: &mut dyn FnMut(&str, &KeySet)) {
        scan(self.root.as_deref(), lower, upper, visitor);
    }

    fn distinct_values(&self) -> usize {
        self.len
    }
}
