//! The decision-diagram manager.
//!
//! All diagrams live in one [`Bdd`] manager: nodes are hash-consed in a unique
//! table, so every Boolean function over the allocated variables has exactly
//! one representation for the fixed variable order (smaller index = closer to
//! the root). Edges may be complemented; the high edge of a stored node is
//! always regular, which keeps the representation canonical.
//!
//! Nodes are reclaimed by [`Bdd::collect_garbage`]. A node survives a
//! collection only if it is reachable from a node with a positive reference
//! count, see [`Bdd::retain`] and [`Rooted`][crate::handle::Rooted].

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::hash::{pairing3, TableHash};
use crate::reference::Ref;
use crate::table::Table;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(1),
            high: Ref::positive(1),
        }
    }
}

impl TableHash for Node {
    fn table_hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        )
    }
}

type IteKey = (Ref, Ref, Ref);

impl TableHash for IteKey {
    fn table_hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}

/// Sizing of the manager's tables.
#[derive(Debug, Clone, Copy)]
pub struct BddConfig {
    /// The unique table starts with room for `2^storage_bits` nodes and grows on demand.
    pub storage_bits: usize,
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
}

impl BddConfig {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        self.storage_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            cache_bits: 16,
        }
    }
}

pub struct Bdd {
    storage: RefCell<Table<Node>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    /// External reference counts, keyed by node index.
    refs: RefCell<HashMap<usize, usize>>,
    /// Largest variable index handed out so far.
    num_vars: Cell<u32>,
    one: Ref,
}

impl Bdd {
    pub fn new(config: BddConfig) -> Self {
        let mut storage = Table::new(config.storage_bits);

        // The terminal lives outside of the buckets and is never collected.
        let one = storage.add(Node::default());
        assert_eq!(one, 1, "The terminal node must be at index 1");

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            refs: RefCell::new(HashMap::new()),
            num_vars: Cell::new(0),
            one: Ref::positive(1),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .field("num_vars", &self.num_vars.get())
            .field("roots", &self.refs.borrow().len())
            .finish()
    }
}

impl Bdd {
    pub fn one(&self) -> Ref {
        self.one
    }
    pub fn zero(&self) -> Ref {
        -self.one
    }
    pub fn constant(&self, value: bool) -> Ref {
        if value {
            self.one
        } else {
            -self.one
        }
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_zero(&self, node: Ref) -> bool {
        node == -self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    /// Variable of the node at `index`, 0 for the terminal.
    pub fn variable(&self, index: usize) -> u32 {
        self.storage.borrow().value(index).variable
    }
    /// Stored low child of the node at `index` (polarity of the edge into the node not applied).
    pub fn low(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).low
    }
    /// Stored high child of the node at `index`; always a regular edge.
    pub fn high(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).high
    }

    /// Low cofactor of the function `node`.
    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    /// High cofactor of the function `node`.
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    /// Number of variables allocated so far (variables are `1..=num_vars`).
    pub fn num_vars(&self) -> u32 {
        self.num_vars.get()
    }

    /// Number of live internal nodes in the unique table.
    pub fn node_count(&self) -> usize {
        self.storage.borrow().real_size() - 1
    }

    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if low == high {
            return low;
        }

        // The high edge of a stored node is always regular.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        debug_assert!(self.is_terminal(low) || v < self.variable(low.index()));
        debug_assert!(self.is_terminal(high) || v < self.variable(high.index()));

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        Ref::positive(i as u32)
    }

    /// The projection function of variable `v`.
    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        if v > self.num_vars.get() {
            self.num_vars.set(v);
        }
        self.mk_node(v, self.zero(), self.one)
    }

    fn top_var(&self, node: Ref) -> u32 {
        self.variable(node.index())
    }

    /// Cofactors of `node` with respect to `v`, which must not be below the node's variable.
    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(node) || v < self.top_var(node) {
            return (node, node);
        }
        assert_eq!(v, self.top_var(node));
        (self.low_node(node), self.high_node(node))
    }

    /// `ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)`.
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // ite(F,F,H) = ite(F,1,H), ite(F,~F,H) = ite(F,0,H),
        // ite(F,G,F) = ite(F,G,0), ite(F,G,~F) = ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero()
        } else {
            g
        };
        let h = if h == f {
            self.zero()
        } else if h == -f {
            self.one
        } else {
            h
        };

        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        let i = self.top_var(f);
        let j = self.top_var(g);
        let k = self.top_var(h);

        // Among equivalent triples, prefer the one whose first argument has the
        // smallest top variable, so that they share a cache entry.
        if self.is_one(g) && k != 0 && k < i {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && j != 0 && j < i {
            return self.apply_ite(g, f, self.zero());
        }
        if self.is_one(h) && j != 0 && j < i {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && k != 0 && k < i {
            return self.apply_ite(-h, self.zero(), -f);
        }
        if g == -h && j != 0 && j < i {
            return self.apply_ite(g, f, -f);
        }

        // ite(~F,G,H) = ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };
        // ite(F,~G,H) = ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: apply_ite{:?} -> {}", key, res);
            return if negate { -res } else { res };
        }

        let m = [i, j, k].into_iter().filter(|&v| v != 0).min().unwrap_or(i);
        assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        debug!("computed: apply_ite{:?} -> {}", key, res);
        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero())
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.one, |acc, node| self.apply_and(acc, node))
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.zero(), |acc, node| self.apply_or(acc, node))
    }

    /// Increment the external reference count of `node`.
    ///
    /// Terminals are never collected and are not counted.
    pub fn retain(&self, node: Ref) {
        if self.is_terminal(node) {
            return;
        }
        *self.refs.borrow_mut().entry(node.index()).or_insert(0) += 1;
    }

    /// Decrement the external reference count of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not currently retained.
    pub fn release(&self, node: Ref) {
        if self.is_terminal(node) {
            return;
        }
        let mut refs = self.refs.borrow_mut();
        let count = refs
            .get_mut(&node.index())
            .unwrap_or_else(|| panic!("Release of unreferenced node {}", node));
        *count -= 1;
        if *count == 0 {
            refs.remove(&node.index());
        }
    }

    /// External reference count of `node` (0 for terminals).
    pub fn ref_count(&self, node: Ref) -> usize {
        self.refs.borrow().get(&node.index()).copied().unwrap_or(0)
    }

    /// Indices of all nodes reachable from `nodes`, the terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes in the diagram of `f`, the terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Free every node not reachable from a retained node.
    ///
    /// Unretained references held by the caller are dangling afterwards.
    /// Returns the number of freed nodes.
    pub fn collect_garbage(&self) -> usize {
        let roots: Vec<Ref> = self
            .refs
            .borrow()
            .keys()
            .map(|&i| Ref::positive(i as u32))
            .collect();
        let alive = self.descendants(roots);

        self.cache.borrow_mut().clear();
        let freed = self
            .storage
            .borrow_mut()
            .retain(|index| alive.contains(&index));
        debug!(
            "collect_garbage: freed {} nodes, {} alive",
            freed,
            alive.len()
        );
        freed
    }
}
