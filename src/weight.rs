//! Edge weights guiding the sampler's walk down the diagram.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::bdd::Bdd;
use crate::encoding::{DiagramKey, Encoding};
use crate::expr::{Expression, Leaf};
use crate::reference::Ref;

/// Strategy assigning weights to the two edges leaving a diagram node.
///
/// The sampler takes an edge with probability proportional to its weight.
/// Edges into the constant false are never taken, whatever their weight.
pub trait Weighting {
    /// Weights of the `(low, high)` edges of the function `node`, polarity of `node` applied.
    fn edge_weights(&mut self, bdd: &Bdd, node: Ref) -> (f64, f64);
}

/// Weights by exact model counts, making every satisfying assignment equally likely.
#[derive(Debug)]
pub struct ExactWeights {
    num_vars: u32,
    counts: HashMap<Ref, BigUint>,
}

impl ExactWeights {
    /// Count over the diagram variables `1..=num_vars`.
    pub fn new(num_vars: u32) -> Self {
        Self {
            num_vars,
            counts: HashMap::new(),
        }
    }
}

impl Weighting for ExactWeights {
    fn edge_weights(&mut self, bdd: &Bdd, node: Ref) -> (f64, f64) {
        let low = bdd.sat_count_with(bdd.low_node(node), self.num_vars, &mut self.counts);
        let high = bdd.sat_count_with(bdd.high_node(node), self.num_vars, &mut self.counts);
        ratio(&low, &high)
    }
}

/// The pair `(a, b)` as floats with the same ratio, shifted down so neither overflows.
fn ratio(a: &BigUint, b: &BigUint) -> (f64, f64) {
    let shift = a.bits().max(b.bits()).saturating_sub(64);
    let a = (a >> shift).to_f64().unwrap_or(0.0);
    let b = (b >> shift).to_f64().unwrap_or(0.0);
    (a, b)
}

/// Path counts of the constraints owning one diagram variable.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PathCounts {
    pub then_paths: u64,
    pub else_paths: u64,
    pub complement_paths: u64,
}

impl PathCounts {
    fn add(&mut self, e: &Expression) {
        self.then_paths = self.then_paths.saturating_add(e.then_paths);
        self.else_paths = self.else_paths.saturating_add(e.else_paths);
        self.complement_paths = self.complement_paths.saturating_add(e.complement_paths);
    }
}

/// Weights from the path counts of annotated constraint trees.
///
/// A diagram variable is owned by every constraint that mentions it, through
/// one of its bits or as the constraint's own substituted node. A regular high
/// edge weighs the owners' `then_paths`, a regular low edge their `else_paths`
/// and a complemented edge their `complement_paths`. Unowned variables weigh 1
/// on both edges.
#[derive(Debug, Default)]
pub struct PathWeights {
    owners: HashMap<u32, PathCounts>,
}

impl PathWeights {
    /// `constraints` must already be annotated, see [`crate::expr::annotate`].
    pub fn new(encoding: &Encoding, constraints: &[Expression]) -> Self {
        let mut owners: HashMap<u32, PathCounts> = HashMap::new();

        for constraint in constraints {
            let mut vars = HashSet::new();
            constraint.walk(&mut |e| {
                if e.leaf == Some(Leaf::Variable) {
                    vars.extend(encoding.bits(e.id).unwrap_or_default());
                }
            });
            vars.extend(encoding.var_of(DiagramKey::Node(constraint.id)));

            for v in vars {
                owners.entry(v).or_default().add(constraint);
            }
        }

        Self { owners }
    }

    pub fn counts(&self, v: u32) -> Option<&PathCounts> {
        self.owners.get(&v)
    }
}

impl Weighting for PathWeights {
    fn edge_weights(&mut self, bdd: &Bdd, node: Ref) -> (f64, f64) {
        let Some(counts) = self.owners.get(&bdd.variable(node.index())) else {
            return (1.0, 1.0);
        };
        let low = if bdd.low_node(node).is_negated() {
            counts.complement_paths
        } else {
            counts.else_paths
        };
        let high = if bdd.high_node(node).is_negated() {
            counts.complement_paths
        } else {
            counts.then_paths
        };
        (low as f64, high as f64)
    }
}

/// Selectable weighting strategy.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum WeightingKind {
    #[default]
    Exact,
    Paths,
}

impl FromStr for WeightingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(WeightingKind::Exact),
            "paths" => Ok(WeightingKind::Paths),
            _ => Err(format!("unknown weighting '{}', expected 'exact' or 'paths'", s)),
        }
    }
}

impl fmt::Display for WeightingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightingKind::Exact => write!(f, "exact"),
            WeightingKind::Paths => write!(f, "paths"),
        }
    }
}
