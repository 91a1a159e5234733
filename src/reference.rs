use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::hash::TableHash;

/// An edge to a diagram node, possibly complemented.
///
/// The node index lives in the absolute value, the sign carries the
/// complement bit. Index 0 is never a valid node, so `Ref(0)` has no meaning.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    /// Regular (non-complemented) edge to the node at `index`.
    pub const fn positive(index: u32) -> Self {
        assert!(index != 0 && index <= i32::MAX as u32);
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    /// Index of the node this edge points to.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Literal-style encoding `2 * index + negated`, dense and non-negative.
    pub const fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) + self.is_negated() as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

impl TableHash for Ref {
    fn table_hash(&self) -> u64 {
        self.unsigned() as u64
    }
}
