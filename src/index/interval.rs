use std::cmp::Ordering;

use crate::model::{BookingId, Ms, Span};

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    span: Span,
    booking_id: BookingId,
    /// Maximum `span.end` anywhere in this node's subtree, self included.
    max_end: Ms,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: i32,
}

/// One per resource: an AVL tree of half-open spans ordered by
/// `(start, end)`, augmented with `max_end` so overlap and point queries can
/// prune whole subtrees and run in O(log n + k). Each node carries the id of
/// the booking that owns the span; bounds stay in lockstep with the booking
/// because every timing change is a remove + insert.
///
/// Same arena layout and iterative walk discipline as `BalancedIndex`.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ── Arena plumbing ───────────────────────────────────────

    fn node(&self, id: NodeId) -> &Node {
        self.slots[id].as_ref().expect("stale node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id].as_mut().expect("stale node id")
    }

    fn alloc(&mut self, span: Span, booking_id: BookingId) -> NodeId {
        let node = Node {
            span,
            max_end: span.end,
            booking_id,
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

    fn release(&mut self, id: NodeId) -> Node {
        let node = self.slots[id].take().expect("stale node id");
        self.free.push(id);
        node
    }

    // ── Height, augmentation, rotations ──────────────────────

    fn height(&self, id: Option<NodeId>) -> i32 {
        id.map_or(0, |i| self.node(i).height)
    }

    fn max_end(&self, id: Option<NodeId>) -> Option<Ms> {
        id.map(|i| self.node(i).max_end)
    }

    fn balance_factor(&self, id: NodeId) -> i32 {
        let n = self.node(id);
        self.height(n.left) - self.height(n.right)
    }

    /// Recompute height and `max_end` from the children. Must run on every
    /// node from a structural change up to the root, and on both pivots of
    /// every rotation.
    fn update(&mut self, id: NodeId) {
        let (left, right) = {
            let n = self.node(id);
            (n.left, n.right)
        };
        let h = 1 + self.height(left).max(self.height(right));
        let mut m = self.node(id).span.end;
        if let Some(lm) = self.max_end(left) {
            m = m.max(lm);
        }
        if let Some(rm) = self.max_end(right) {
            m = m.max(rm);
        }
        let n = self.node_mut(id);
        n.height = h;
        n.max_end = m;
    }

    fn rotate_right(&mut self, y: NodeId) -> NodeId {
        let x = self.node(y).left.expect("rotate_right needs a left child");
        let t2 = self.node(x).right;
        self.node_mut(x).right = Some(y);
        self.node_mut(y).left = t2;
        self.update(y);
        self.update(x);
        x
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let y = self.node(x).right.expect("rotate_left needs a right child");
        let t2 = self.node(y).left;
        self.node_mut(y).left = Some(x);
        self.node_mut(x).right = t2;
        self.update(x);
        self.update(y);
        y
    }

    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update(id);
        let bf = self.balance_factor(id);
        if bf > 1 {
            let l = self.node(id).left.expect("left-heavy node has a left child");
            if self.balance_factor(l) < 0 {
                let nl = self.rotate_left(l);
                self.node_mut(id).left = Some(nl);
            }
            self.rotate_right(id)
        } else if bf < -1 {
            let r = self.node(id).right.expect("right-heavy node has a right child");
            if self.balance_factor(r) > 0 {
                let nr = self.rotate_right(r);
                self.node_mut(id).right = Some(nr);
            }
            self.rotate_left(id)
        } else {
            id
        }
    }

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

    // ── Mutations ────────────────────────────────────────────

    /// Insert a span. Ordering is by `start`, ties broken by `end`.
    pub fn insert(&mut self, span: Span, booking_id: BookingId) {
        let mut path: Vec<(NodeId, bool)> = Vec::new();
        let mut cur = self.root;
        while let Some(id) = cur {
            if span < self.node(id).span {
                path.push((id, true));
                cur = self.node(id).left;
            } else {
                path.push((id, false));
                cur = self.node(id).right;
            }
        }

        let new_id = self.alloc(span, booking_id);
        match path.last() {
            None => self.root = Some(new_id),
            Some(&(pid, true)) => self.node_mut(pid).left = Some(new_id),
            Some(&(pid, false)) => self.node_mut(pid).right = Some(new_id),
        }
        self.len += 1;
        self.rebalance_path(path);
    }

    /// Remove the interval located by exact `(start, end)` equality,
    /// returning the owning booking id. Absent spans return `None`.
    pub fn remove(&mut self, span: Span) -> Option<BookingId> {
        let mut path: Vec<(NodeId, bool)> = Vec::new();
        let mut cur = self.root;
        let mut target = None;
        while let Some(id) = cur {
            match span.cmp(&self.node(id).span) {
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
            path.push((target, false));
            let mut s = self.node(target).right.expect("two-child node has a right child");
            while let Some(l) = self.node(s).left {
                path.push((s, true));
                s = l;
            }
            self.swap_payload(target, s);
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
        Some(node.booking_id)
    }

    fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let x = head[lo].as_mut().expect("stale node id");
        let y = tail[0].as_mut().expect("stale node id");
        std::mem::swap(&mut x.span, &mut y.span);
        std::mem::swap(&mut x.booking_id, &mut y.booking_id);
    }

    // ── Queries ──────────────────────────────────────────────

    /// Every stored interval overlapping `query` under half-open semantics
    /// (touching endpoints do not conflict), in start order. Subtrees with
    /// `max_end <= query.start` are pruned wholesale, bounding the walk to
    /// O(log n + k).
    pub fn overlaps(&self, query: Span) -> Vec<(Span, &str)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                if self.node(id).max_end <= query.start {
                    cur = None;
                    break;
                }
                stack.push(id);
                cur = self.node(id).left;
            }
            let Some(id) = stack.pop() else { break };
            let n = self.node(id);
            if n.span.overlaps(&query) {
                out.push((n.span, n.booking_id.as_str()));
            }
            cur = if n.span.start < query.end { n.right } else { None };
        }
        out
    }

    /// Every stored interval containing instant `t` (`start <= t < end`),
    /// in start order.
    pub fn contains_point(&self, t: Ms) -> Vec<(Span, &str)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                if self.node(id).max_end <= t {
                    cur = None;
                    break;
                }
                stack.push(id);
                cur = self.node(id).left;
            }
            let Some(id) = stack.pop() else { break };
            let n = self.node(id);
            if n.span.contains_instant(t) {
                out.push((n.span, n.booking_id.as_str()));
            }
            cur = if n.span.start <= t { n.right } else { None };
        }
        out
    }

    /// Free sub-spans of `window` at least `min_duration` long: collect the
    /// overlapping intervals, then sweep a cursor across them emitting each
    /// gap that is wide enough, including the trailing one.
    pub fn free_gaps(&self, window: Span, min_duration: Ms) -> Vec<Span> {
        let min = min_duration.max(1);
        let busy = self.overlaps(window); // already sorted by start
        let mut gaps = Vec::new();
        let mut cursor = window.start;
        for (span, _) in busy {
            if span.start - cursor >= min {
                gaps.push(Span::new(cursor, span.start));
            }
            cursor = cursor.max(span.end);
        }
        if window.end - cursor >= min {
            gaps.push(Span::new(cursor, window.end));
        }
        gaps
    }

    /// All intervals in `(start, end)` order.
    pub fn in_order(&self) -> Vec<(Span, &str)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                stack.push(id);
                cur = self.node(id).left;
            }
            let Some(id) = stack.pop() else { break };
            let n = self.node(id);
            out.push((n.span, n.booking_id.as_str()));
            cur = n.right;
        }
        out
    }

    // ── Verification hooks ───────────────────────────────────

    /// Every node's subtree heights differ by at most 1.
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

    /// Every node's `max_end` equals the true maximum end in its subtree,
    /// recomputed independently.
    pub fn max_end_consistent(&self) -> bool {
        self.check_max_end(self.root).is_some()
    }

    fn check_max_end(&self, id: Option<NodeId>) -> Option<Option<Ms>> {
        let Some(id) = id else { return Some(None) };
        let n = self.node(id);
        let lm = self.check_max_end(n.left)?;
        let rm = self.check_max_end(n.right)?;
        let mut truth = n.span.end;
        if let Some(m) = lm {
            truth = truth.max(m);
        }
        if let Some(m) = rm {
            truth = truth.max(m);
        }
        if n.max_end != truth {
            return None;
        }
        Some(Some(truth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index_of(spans: &[(Ms, Ms)]) -> IntervalIndex {
        let mut idx = IntervalIndex::new();
        for (i, &(s, e)) in spans.iter().enumerate() {
            idx.insert(Span::new(s, e), format!("B{i}"));
        }
        idx
    }

    fn brute_force(spans: &[(Ms, Ms)], query: Span) -> Vec<Span> {
        let mut hits: Vec<Span> = spans
            .iter()
            .map(|&(s, e)| Span::new(s, e))
            .filter(|s| s.overlaps(&query))
            .collect();
        hits.sort();
        hits
    }

    #[test]
    fn overlap_query_basics() {
        // 09:00-10:00, 10:30-12:00, 13:00-14:00, 15:00-16:00, 10:00-11:00
        let idx = index_of(&[(540, 600), (630, 720), (780, 840), (900, 960), (600, 660)]);
        let hits = idx.overlaps(Span::new(570, 650));
        let spans: Vec<Span> = hits.iter().map(|(s, _)| *s).collect();
        assert_eq!(spans, vec![Span::new(540, 600), Span::new(600, 660), Span::new(630, 720)]);
    }

    #[test]
    fn touching_spans_do_not_overlap() {
        let idx = index_of(&[(540, 600)]);
        assert!(idx.overlaps(Span::new(600, 660)).is_empty());
        assert!(idx.overlaps(Span::new(480, 540)).is_empty());
        assert_eq!(idx.overlaps(Span::new(599, 601)).len(), 1);
    }

    #[test]
    fn contains_point_is_half_open() {
        let idx = index_of(&[(100, 200), (150, 250), (300, 400)]);
        let at = |t| -> Vec<Span> { idx.contains_point(t).iter().map(|(s, _)| *s).collect() };
        assert_eq!(at(100), vec![Span::new(100, 200)]);
        assert_eq!(at(175), vec![Span::new(100, 200), Span::new(150, 250)]);
        assert_eq!(at(200), vec![Span::new(150, 250)]); // end is exclusive
        assert!(at(250).is_empty());
    }

    #[test]
    fn remove_returns_owner_and_rebalances() {
        let mut idx = index_of(&[(0, 10), (20, 30), (40, 50), (60, 70), (80, 90)]);
        assert_eq!(idx.remove(Span::new(40, 50)), Some("B2".to_string()));
        assert_eq!(idx.remove(Span::new(40, 50)), None);
        assert_eq!(idx.len(), 4);
        assert!(idx.is_balanced());
        assert!(idx.max_end_consistent());
        assert!(idx.overlaps(Span::new(40, 50)).is_empty());
    }

    #[test]
    fn remove_root_with_two_children() {
        let mut idx = index_of(&[(50, 60), (20, 30), (80, 90), (10, 15), (40, 45), (70, 75), (95, 99)]);
        let all_before = idx.len();
        assert!(idx.remove(Span::new(50, 60)).is_some());
        assert_eq!(idx.len(), all_before - 1);
        assert!(idx.is_balanced());
        assert!(idx.max_end_consistent());
        let spans: Vec<Span> = idx.in_order().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            spans,
            vec![
                Span::new(10, 15),
                Span::new(20, 30),
                Span::new(40, 45),
                Span::new(70, 75),
                Span::new(80, 90),
                Span::new(95, 99),
            ]
        );
    }

    #[test]
    fn nested_interval_found_through_augmentation() {
        // A long interval hides in the left subtree; only max_end makes the
        // query reach it.
        let idx = index_of(&[(0, 1000), (100, 110), (200, 210), (300, 310), (400, 410)]);
        let hits = idx.overlaps(Span::new(500, 600));
        let spans: Vec<Span> = hits.iter().map(|(s, _)| *s).collect();
        assert_eq!(spans, vec![Span::new(0, 1000)]);
    }

    #[test]
    fn free_gaps_middle_and_trailing() {
        // 09:00-10:30 busy inside an 08:00-18:00 window, 60-minute minimum.
        let idx = index_of(&[(540, 630)]);
        let gaps = idx.free_gaps(Span::new(480, 1080), 60);
        assert_eq!(gaps, vec![Span::new(480, 540), Span::new(630, 1080)]);

        let gaps = idx.free_gaps(Span::new(480, 1080), 61);
        assert_eq!(gaps, vec![Span::new(630, 1080)]); // leading gap is exactly 60
    }

    #[test]
    fn free_gaps_empty_index_is_whole_window() {
        let idx = IntervalIndex::new();
        assert_eq!(idx.free_gaps(Span::new(0, 100), 30), vec![Span::new(0, 100)]);
        assert!(idx.free_gaps(Span::new(0, 100), 101).is_empty());
    }

    #[test]
    fn free_gaps_interval_straddling_window_edges() {
        let idx = index_of(&[(0, 120), (900, 1200)]);
        let gaps = idx.free_gaps(Span::new(100, 1000), 60);
        assert_eq!(gaps, vec![Span::new(120, 900)]);
    }

    #[test]
    fn free_gaps_back_to_back_bookings() {
        let idx = index_of(&[(100, 200), (200, 300), (300, 400)]);
        let gaps = idx.free_gaps(Span::new(100, 400), 1);
        assert!(gaps.is_empty());
    }

    proptest! {
        #[test]
        fn overlaps_matches_brute_force(
            spans in proptest::collection::vec((0i64..500, 1i64..100), 0..60),
            qs in 0i64..500,
            qlen in 1i64..100,
        ) {
            let spans: Vec<(Ms, Ms)> = spans.into_iter().map(|(s, d)| (s, s + d)).collect();
            let idx = index_of(&spans);
            let query = Span::new(qs, qs + qlen);
            let got: Vec<Span> = idx.overlaps(query).iter().map(|(s, _)| *s).collect();
            let mut got_sorted = got.clone();
            got_sorted.sort();
            prop_assert_eq!(&got, &got_sorted); // start-ordered output
            prop_assert_eq!(got_sorted, brute_force(&spans, query));
        }

        #[test]
        fn invariants_hold_under_churn(
            spans in proptest::collection::vec((0i64..300, 1i64..50), 1..80),
            removals in proptest::collection::vec(proptest::bool::ANY, 1..80),
        ) {
            let spans: Vec<(Ms, Ms)> = spans.into_iter().map(|(s, d)| (s, s + d)).collect();
            let mut idx = IntervalIndex::new();
            for (i, &(s, e)) in spans.iter().enumerate() {
                idx.insert(Span::new(s, e), format!("B{i}"));
                prop_assert!(idx.is_balanced());
                prop_assert!(idx.max_end_consistent());
            }
            let mut expected = idx.len();
            for (i, remove) in removals.iter().enumerate() {
                if *remove && i < spans.len() {
                    let (s, e) = spans[i];
                    if idx.remove(Span::new(s, e)).is_some() {
                        expected -= 1;
                    }
                    prop_assert!(idx.is_balanced());
                    prop_assert!(idx.max_end_consistent());
                }
            }
            prop_assert_eq!(idx.len(), expected);
        }
    }
}
