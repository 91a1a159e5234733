//! Allocation of diagram variables by key.
//!
//! Diagram variables are plain indices `1..`; an [`Encoding`] remembers what
//! each one stands for. Bits of declared variables are allocated up front,
//! variables in ascending id order and each one most significant bit first,
//! so the variable order of the diagram is fixed before anything is built.
//! Keys for substituted constraint nodes are allocated on demand after that.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::expr::Variable;
use crate::width;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DiagramKey {
    /// Bit `bit` (0 = least significant) of the declared variable `variable`.
    Bit { variable: i64, bit: u32 },
    /// Stand-in for the constraint node with this id.
    Node(i64),
}

impl fmt::Display for DiagramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramKey::Bit { variable, bit } => write!(f, "v{}[{}]", variable, bit),
            DiagramKey::Node(id) => write!(f, "#{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Encoding {
    variables: BTreeMap<i64, Variable>,
    /// `keys[v - 1]` is the key of diagram variable `v`.
    keys: Vec<DiagramKey>,
    index: HashMap<DiagramKey, u32>,
}

impl Encoding {
    /// Allocate the bits of all `variables`.
    ///
    /// Widths are clamped into `1..=64`. A later duplicate id replaces the earlier one.
    pub fn new<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Self {
        let variables: BTreeMap<i64, Variable> = variables
            .into_iter()
            .map(|v| (v.id, v.clone()))
            .collect();

        let mut encoding = Self {
            variables: BTreeMap::new(),
            keys: Vec::new(),
            index: HashMap::new(),
        };
        for var in variables.values() {
            let width = var.bit_width.clamp(1, width::MAX_WIDTH);
            for bit in (0..width).rev() {
                encoding.alloc(DiagramKey::Bit {
                    variable: var.id,
                    bit,
                });
            }
        }
        encoding.variables = variables;
        encoding
    }

    /// Diagram variable of `key`, allocating a fresh one if `key` is new.
    pub fn alloc(&mut self, key: DiagramKey) -> u32 {
        if let Some(&v) = self.index.get(&key) {
            return v;
        }
        self.keys.push(key);
        let v = self.keys.len() as u32;
        self.index.insert(key, v);
        v
    }

    pub fn var_of(&self, key: DiagramKey) -> Option<u32> {
        self.index.get(&key).copied()
    }

    pub fn key_of(&self, v: u32) -> Option<DiagramKey> {
        let i = (v as usize).checked_sub(1)?;
        self.keys.get(i).copied()
    }

    /// Number of allocated diagram variables.
    pub fn num_vars(&self) -> u32 {
        self.keys.len() as u32
    }

    pub fn variable(&self, id: i64) -> Option<&Variable> {
        self.variables.get(&id)
    }

    /// Declared variables in ascending id order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Diagram variables of the bits of variable `id`, least significant first.
    pub fn bits(&self, id: i64) -> Option<Vec<u32>> {
        let var = self.variables.get(&id)?;
        (0..var.bit_width.clamp(1, width::MAX_WIDTH))
            .map(|bit| self.var_of(DiagramKey::Bit { variable: id, bit }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_preallocation_order() {
        let vars = [Variable::new(5, "b", false, 2), Variable::new(2, "a", true, 3)];
        let enc = Encoding::new(&vars);

        assert_eq!(enc.num_vars(), 5);
        // Ascending id, most significant bit first.
        assert_eq!(enc.bits(2), Some(vec![3, 2, 1]));
        assert_eq!(enc.bits(5), Some(vec![5, 4]));
        assert_eq!(enc.key_of(1), Some(DiagramKey::Bit { variable: 2, bit: 2 }));
        assert_eq!(enc.key_of(0), None);
        assert_eq!(enc.key_of(6), None);
        assert_eq!(enc.bits(7), None);
        let ids: Vec<i64> = enc.variables().map(|v| v.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_alloc_on_demand() {
        let vars = [Variable::new(1, "a", false, 1)];
        let mut enc = Encoding::new(&vars);

        let v = enc.alloc(DiagramKey::Node(42));
        assert_eq!(v, 2);
        assert_eq!(enc.alloc(DiagramKey::Node(42)), 2);
        assert_eq!(enc.var_of(DiagramKey::Node(42)), Some(2));
        assert_eq!(enc.key_of(2), Some(DiagramKey::Node(42)));
        assert_eq!(enc.num_vars(), 2);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(DiagramKey::Bit { variable: 3, bit: 0 }.to_string(), "v3[0]");
        assert_eq!(DiagramKey::Node(9).to_string(), "#9");
    }
}
