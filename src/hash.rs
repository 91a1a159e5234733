//! Hashing for the unique table and the computed table.
//!
//! Both tables are indexed by a 64-bit key computed from small integers
//! (variable indices and node references), so a pairing function is all we need.

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Wraps on overflow: callers only use the result as a bucket selector,
/// and the tables compare full keys on lookup.
///
/// [szudzik-pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Hash used to pick a bucket in the tables.
pub trait TableHash {
    fn table_hash(&self) -> u64;
}

impl TableHash for u64 {
    fn table_hash(&self) -> u64 {
        *self
    }
}

impl TableHash for (u64, u64) {
    fn table_hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}

impl TableHash for (u64, u64, u64) {
    fn table_hash(&self) -> u64 {
        pairing3(self.0, self.1, self.2)
    }
}
