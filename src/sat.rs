use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Number of assignments to variables `1..=num_vars` satisfying `node`.
    pub fn sat_count(&self, node: Ref, num_vars: u32) -> BigUint {
        let mut cache = HashMap::new();
        self.sat_count_with(node, num_vars, &mut cache)
    }

    /// Like [`Bdd::sat_count`], sharing `cache` between calls with the same `num_vars`.
    pub fn sat_count_with(
        &self,
        node: Ref,
        num_vars: u32,
        cache: &mut HashMap<Ref, BigUint>,
    ) -> BigUint {
        let max = BigUint::from(1u8) << num_vars;
        self.sat_count_rec(node, &max, cache)
    }

    fn sat_count_rec(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        // Each child is counted over all variables; exactly half of those
        // assignments agree with the branch taken at this node.
        let low = self.low(node.index());
        let high = self.high(node.index());
        let count_low = self.sat_count_rec(low, max, cache);
        let count_high = self.sat_count_rec(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }

    /// One satisfying path as `(variable, value)` pairs from the root down,
    /// preferring high edges. `None` for the constant-false function.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<(u32, bool)>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;
        while !self.is_one(current) {
            let var = self.variable(current.index());
            let high = self.high_node(current);
            if !self.is_zero(high) {
                path.push((var, true));
                current = high;
            } else {
                path.push((var, false));
                current = self.low_node(current);
            }
        }
        Some(path)
    }

    /// Value of the function `node` under the assignment `value_of` of its variables.
    pub fn evaluate(&self, node: Ref, value_of: impl Fn(u32) -> bool) -> bool {
        let mut current = node;
        while !self.is_terminal(current) {
            let var = self.variable(current.index());
            current = if value_of(var) {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        self.is_one(current)
    }
}
