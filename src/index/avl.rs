use std::cmp::Ordering;

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: i32,
}

/// Ordered map with AVL balancing, used for the resource and booking
/// catalogs. Nodes live in an arena indexed by slot; children are optional
/// slot indices, so there are no ownership cycles and no recursion —
/// insert and delete walk down with an explicit path stack and rebalance
/// back up along it.
#[derive(Debug, Clone)]
pub struct BalancedIndex<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<K, V> Default for BalancedIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BalancedIndex<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ── Arena plumbing ───────────────────────────────────────

    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.slots[id].as_ref().expect("stale node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.slots[id].as_mut().expect("stale node id")
    }

    fn alloc(&mut self, key: K, value: V) -> NodeId {
        let node = Node {
            key,
            value,
            left: None,
            right: None,
            height: 1,
        };
        if let Some(id) = self.free.pop() {
            self.slots[id] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.slots[id].take().expect("stale node id");
        self.free.push(id);
        node
    }

    // ── Height and rotations ─────────────────────────────────

    fn height(&self, id: Option<NodeId>) -> i32 {
        id.map_or(0, |i| self.node(i).height)
    }

    fn balance_factor(&self, id: NodeId) -> i32 {
        let n = self.node(id);
        self.height(n.left) - self.height(n.right)
    }

    fn update_height(&mut self, id: NodeId) {
        let h = 1 + self.height(self.node(id).left).max(self.height(self.node(id).right));
        self.node_mut(id).height = h;
    }

    fn rotate_right(&mut self, y: NodeId) -> NodeId {
        let x = self.node(y).left.expect("rotate_right needs a left child");
        let t2 = self.node(x).right;
        self.node_mut(x).right = Some(y);
        self.node_mut(y).left = t2;
        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let y = self.node(x).right.expect("rotate_left needs a right child");
        let t2 = self.node(y).left;
        self.node_mut(y).left = Some(x);
        self.node_mut(x).right = t2;
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restore the height invariant at `id`, returning the subtree's new
    /// root. The rotation case is picked by the taller child's balance
    /// factor, which covers both the insert and the delete path (on delete
    /// the triggering key is already gone, so child shape is all there is).
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update_height(id);
        let bf = self.balance_factor(id);
        if bf > 1 {
            let l = self.node(id).left.expect("left-heavy node has a left child");
            if self.balance_factor(l) < 0 {
                // left-right
                let nl = self.rotate_left(l);
                self.node_mut(id).left = Some(nl);
            }
            // left-left
            self.rotate_right(id)
        } else if bf < -1 {
            let r = self.node(id).right.expect("right-heavy node has a right child");
            if self.balance_factor(r) > 0 {
                // right-left
                let nr = self.rotate_right(r);
                self.node_mut(id).right = Some(nr);
            }
            // right-right
            self.rotate_left(id)
        } else {
            id
        }
    }

    /// Walk the recorded path bottom-up, rebalancing each ancestor and
    /// re-attaching the (possibly new) subtree root to its parent.
    fn rebalance_path(&mut self, mut path: Vec<(NodeId, bool)>) {
        while let Some((id, _)) = path.pop() {
            let new_root = self.rebalance(id);
            match path.last() {
                None => self.root = Some(new_root),
                Some(&(pid, true)) => self.node_mut(pid).left = Some(new_root),
                Some(&(pid, false)) => self.node_mut(pid).right = Some(new_root),
            }
        }
    }
}

impl<K: Ord, V> BalancedIndex<K, V> {
    /// Insert or overwrite. Returns the previous value for a duplicate key;
    /// `len` is unchanged by an overwrite.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut path: Vec<(NodeId, bool)> = Vec::new();
        let mut cur = self.root;
        while let Some(id) = cur {
            match key.cmp(&self.node(id).key) {
                Ordering::Equal => {
                    return Some(std::mem::replace(&mut self.node_mut(id).value, value));
                }
                Ordering::Less => {
                    path.push((id, true));
                    cur = self.node(id).left;
                }
                Ordering::Greater => {
                    path.push((id, false));
                    cur = self.node(id).right;
                }
            }
        }

        let new_id = self.alloc(key, value);
        match path.last() {
            None => self.root = Some(new_id),
            Some(&(pid, true)) => self.node_mut(pid).left = Some(new_id),
            Some(&(pid, false)) => self.node_mut(pid).right = Some(new_id),
        }
        self.len += 1;
        self.rebalance_path(path);
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let n = self.node(id);
            match key.cmp(&n.key) {
                Ordering::Equal => return Some(&n.value),
                Ordering::Less => cur = n.left,
                Ordering::Greater => cur = n.right,
            }
        }
        None
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut cur = self.root;
        while let Some(id) = cur {
            match key.cmp(&self.node(id).key) {
                Ordering::Equal => return Some(&mut self.node_mut(id).value),
                Ordering::Less => cur = self.node(id).left,
                Ordering::Greater => cur = self.node(id).right,
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove a key, returning its value. Absent keys return `None`.
    /// A node with two children is spliced with its in-order successor.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut path: Vec<(NodeId, bool)> = Vec::new();
        let mut cur = self.root;
        let mut target = None;
        while let Some(id) = cur {
            match key.cmp(&self.node(id).key) {
                Ordering::Equal => {
                    target = Some(id);
                    break;
                }
                Ordering::Less => {
                    path.push((id, true));
                    cur = self.node(id).left;
                }
                Ordering::Greater => {
                    path.push((id, false));
                    cur = self.node(id).right;
                }
            }
        }
        let target = target?;

        let splice = if self.node(target).left.is_some() && self.node(target).right.is_some() {
            // Two children: move the in-order successor's key/value into the
            // target, then splice the successor node out instead.
            path.push((target, false));
            let mut s = self.node(target).right.expect("two-child node has a right child");
            while let Some(l) = self.node(s).left {
                path.push((s, true));
                s = l;
            }
            self.swap_key_value(target, s);
            s
        } else {
            target
        };

        let child = self.node(splice).left.or(self.node(splice).right);
        match path.last() {
            None => self.root = child,
            Some(&(pid, true)) => self.node_mut(pid).left = child,
            Some(&(pid, false)) => self.node_mut(pid).right = child,
        }
        let node = self.release(splice);
        self.len -= 1;
        self.rebalance_path(path);
        Some(node.value)
    }

    fn swap_key_value(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let x = head[lo].as_mut().expect("stale node id");
        let y = tail[0].as_mut().expect("stale node id");
        std::mem::swap(&mut x.key, &mut y.key);
        std::mem::swap(&mut x.value, &mut y.value);
    }

    /// All entries with `low <= key <= high`, in key order. Subtrees that
    /// cannot intersect the bounds are never descended into.
    pub fn range(&self, low: &K, high: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                stack.push(id);
                let n = self.node(id);
                cur = if *low < n.key { n.left } else { None };
            }
            let Some(id) = stack.pop() else { break };
            let n = self.node(id);
            if n.key > *high {
                break; // in-order: everything after is larger still
            }
            if n.key >= *low {
                out.push((&n.key, &n.value));
            }
            cur = n.right;
        }
        out
    }

    /// In-order iterator over `(&key, &value)` pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            index: self,
            stack: Vec::new(),
            cur: self.root,
        }
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        let mut id = self.root?;
        while let Some(l) = self.node(id).left {
            id = l;
        }
        let n = self.node(id);
        Some((&n.key, &n.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let mut id = self.root?;
        while let Some(r) = self.node(id).right {
            id = r;
        }
        let n = self.node(id);
        Some((&n.key, &n.value))
    }

    /// Verification hook: every node's subtree heights differ by at most 1.
    pub fn is_balanced(&self) -> bool {
        self.check_height(self.root).is_some()
    }

    fn check_height(&self, id: Option<NodeId>) -> Option<i32> {
        let Some(id) = id else { return Some(0) };
        let n = self.node(id);
        let lh = self.check_height(n.left)?;
        let rh = self.check_height(n.right)?;
        if (lh - rh).abs() > 1 || n.height != 1 + lh.max(rh) {
            return None;
        }
        Some(1 + lh.max(rh))
    }
}

pub struct Iter<'a, K, V> {
    index: &'a BalancedIndex<K, V>,
    stack: Vec<NodeId>,
    cur: Option<NodeId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.cur {
            self.stack.push(id);
            self.cur = self.index.node(id).left;
        }
        let id = self.stack.pop()?;
        let n = self.index.node(id);
        self.cur = n.right;
        Some((&n.key, &n.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn insert_and_get() {
        let mut idx = BalancedIndex::new();
        idx.insert("b", 2);
        idx.insert("a", 1);
        idx.insert("c", 3);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.get(&"a"), Some(&1));
        assert_eq!(idx.get(&"b"), Some(&2));
        assert_eq!(idx.get(&"c"), Some(&3));
        assert_eq!(idx.get(&"d"), None);
    }

    #[test]
    fn duplicate_insert_overwrites_without_growth() {
        let mut idx = BalancedIndex::new();
        assert_eq!(idx.insert("k", 1), None);
        assert_eq!(idx.insert("k", 2), Some(1));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get(&"k"), Some(&2));
    }

    #[test]
    fn remove_absent_returns_none() {
        let mut idx: BalancedIndex<i32, i32> = BalancedIndex::new();
        idx.insert(1, 1);
        assert_eq!(idx.remove(&2), None);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn remove_leaf_single_child_and_two_children() {
        let mut idx = BalancedIndex::new();
        for k in [50, 30, 70, 20, 40, 60, 80, 35] {
            idx.insert(k, k * 10);
        }
        assert_eq!(idx.remove(&20), Some(200)); // leaf
        assert_eq!(idx.remove(&30), Some(300)); // one child
        assert_eq!(idx.remove(&50), Some(500)); // root, two children
        assert!(idx.is_balanced());
        let keys: Vec<i32> = idx.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![35, 40, 60, 70, 80]);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut idx = BalancedIndex::new();
        for k in 0..1000 {
            idx.insert(k, k);
            assert!(idx.is_balanced());
        }
        assert_eq!(idx.len(), 1000);
        assert_eq!(idx.first(), Some((&0, &0)));
        assert_eq!(idx.last(), Some((&999, &999)));
    }

    #[test]
    fn iter_is_in_order() {
        let mut idx = BalancedIndex::new();
        for k in [5, 1, 9, 3, 7, 2, 8] {
            idx.insert(k, ());
        }
        let keys: Vec<i32> = idx.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let mut idx = BalancedIndex::new();
        for k in 0..20 {
            idx.insert(k, k);
        }
        let got: Vec<i32> = idx.range(&5, &9).iter().map(|(k, _)| **k).collect();
        assert_eq!(got, vec![5, 6, 7, 8, 9]);
        assert!(idx.range(&30, &40).is_empty());
    }

    #[test]
    fn slots_are_reused_after_removal() {
        let mut idx = BalancedIndex::new();
        for k in 0..100 {
            idx.insert(k, k);
        }
        for k in 0..100 {
            idx.remove(&k);
        }
        let arena_high_water = idx.slots.len();
        for k in 0..100 {
            idx.insert(k, k);
        }
        assert_eq!(idx.slots.len(), arena_high_water);
    }

    proptest! {
        #[test]
        fn matches_btreemap_under_random_ops(ops in proptest::collection::vec((0u8..3, 0i64..64, 0i64..1000), 1..200)) {
            let mut idx = BalancedIndex::new();
            let mut model = BTreeMap::new();
            for (op, k, v) in ops {
                match op {
                    0 | 1 => {
                        prop_assert_eq!(idx.insert(k, v), model.insert(k, v));
                    }
                    _ => {
                        prop_assert_eq!(idx.remove(&k), model.remove(&k));
                    }
                }
                prop_assert!(idx.is_balanced());
                prop_assert_eq!(idx.len(), model.len());
            }
            let got: Vec<(i64, i64)> = idx.iter().map(|(k, v)| (*k, *v)).collect();
            let want: Vec<(i64, i64)> = model.into_iter().collect();
            prop_assert_eq!(got, want);
        }
    }
}
