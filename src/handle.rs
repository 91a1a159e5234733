//! Scoped references to diagram nodes.

use std::fmt::{Display, Formatter};

use crate::bdd::Bdd;
use crate::reference::Ref;

/// A retained diagram node, released when dropped.
///
/// Holding a `Rooted` keeps the node alive across [`Bdd::collect_garbage`].
/// Every early return drops its handles, so a failed computation never
/// leaks references.
pub struct Rooted<'a> {
    bdd: &'a Bdd,
    node: Ref,
}

impl<'a> Rooted<'a> {
    pub fn new(bdd: &'a Bdd, node: Ref) -> Self {
        bdd.retain(node);
        Self { bdd, node }
    }

    pub fn get(&self) -> Ref {
        self.node
    }

    pub fn bdd(&self) -> &'a Bdd {
        self.bdd
    }

    /// Replace the held node by `node`, retaining the new one before the old one is released.
    pub fn replace(&mut self, node: Ref) {
        self.bdd.retain(node);
        self.bdd.release(self.node);
        self.node = node;
    }
}

impl Clone for Rooted<'_> {
    fn clone(&self) -> Self {
        Rooted::new(self.bdd, self.node)
    }
}

impl Drop for Rooted<'_> {
    fn drop(&mut self) {
        self.bdd.release(self.node);
    }
}

impl std::fmt::Debug for Rooted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rooted").field(&self.node).finish()
    }
}

impl Display for Rooted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl Bdd {
    /// Retain `node` for the lifetime of the returned handle.
    pub fn rooted(&self, node: Ref) -> Rooted<'_> {
        Rooted::new(self, node)
    }
}
