//! Random satisfying assignments drawn from a diagram.

use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::bdd::Bdd;
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::reference::Ref;
use crate::weight::{ExactWeights, PathWeights, Weighting, WeightingKind};
use crate::width::from_bits;

/// Values of all declared variables, sorted by variable id.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Assignment {
    pub values: Vec<(i64, i64)>,
}

impl Assignment {
    pub fn get(&self, id: i64) -> Option<i64> {
        self.values
            .binary_search_by_key(&id, |&(v, _)| v)
            .ok()
            .map(|i| self.values[i].1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub num_samples: usize,
    /// Seed of the random generator; seeded from the OS when `None`.
    pub seed: Option<u64>,
    pub weighting: WeightingKind,
}

impl SamplerConfig {
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_weighting(mut self, weighting: WeightingKind) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_samples: 5,
            seed: None,
            weighting: WeightingKind::default(),
        }
    }
}

pub struct Sampler<'a, W, R> {
    bdd: &'a Bdd,
    encoding: &'a Encoding,
    weighting: W,
    rng: R,
}

impl<'a, W: Weighting, R: Rng> Sampler<'a, W, R> {
    pub fn new(bdd: &'a Bdd, encoding: &'a Encoding, weighting: W, rng: R) -> Self {
        Self {
            bdd,
            encoding,
            weighting,
            rng,
        }
    }

    /// Draw `n` assignments satisfying `root`.
    pub fn sample(&mut self, root: Ref, n: usize) -> Result<Vec<Assignment>> {
        if self.bdd.is_zero(root) {
            return Err(Error::UnsatisfiableConstraintSet);
        }
        Ok((0..n).map(|_| self.draw(root)).collect())
    }

    /// Draw one assignment satisfying `root`, which must not be the constant false.
    fn draw(&mut self, root: Ref) -> Assignment {
        let num_vars = self.encoding.num_vars().max(self.bdd.num_vars()) as usize;
        let mut fixed: Vec<Option<bool>> = vec![None; num_vars + 1];

        let mut current = root;
        while !self.bdd.is_terminal(current) {
            let low = self.bdd.low_node(current);
            let high = self.bdd.high_node(current);
            let (w_low, w_high) = self.weighting.edge_weights(self.bdd, current);
            let w_low = if self.bdd.is_zero(low) { 0.0 } else { w_low.max(0.0) };
            let w_high = if self.bdd.is_zero(high) { 0.0 } else { w_high.max(0.0) };

            let take_high = if self.bdd.is_zero(low) {
                true
            } else if self.bdd.is_zero(high) {
                false
            } else if w_low + w_high > 0.0 {
                self.rng.random_bool(w_high / (w_low + w_high))
            } else {
                self.rng.random_bool(0.5)
            };

            let v = self.bdd.variable(current.index()) as usize;
            fixed[v] = Some(take_high);
            current = if take_high { high } else { low };
        }
        debug_assert!(self.bdd.is_one(current));

        let encoding = self.encoding;
        let rng = &mut self.rng;
        let values = encoding
            .variables()
            .map(|var| {
                // Bits left open by the path are free: pick them uniformly.
                let bits: Vec<bool> = encoding
                    .bits(var.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| fixed[v as usize].unwrap_or_else(|| rng.random_bool(0.5)))
                    .collect();
                (var.id, from_bits(&bits, var.is_signed))
            })
            .collect();
        Assignment { values }
    }
}

/// Draw `config.num_samples` assignments satisfying `root` with the configured weighting.
///
/// `constraints` are the annotated constraint trees; only path weighting looks at them.
pub fn sample(
    bdd: &Bdd,
    encoding: &Encoding,
    constraints: &[Expression],
    root: Ref,
    config: &SamplerConfig,
) -> Result<Vec<Assignment>> {
    info!(
        "Sampling {} assignments with {} weighting",
        config.num_samples, config.weighting
    );
    let rng = config.rng();
    let assignments = match config.weighting {
        WeightingKind::Exact => {
            let weights = ExactWeights::new(encoding.num_vars().max(bdd.num_vars()));
            Sampler::new(bdd, encoding, weights, rng).sample(root, config.num_samples)?
        }
        WeightingKind::Paths => {
            let weights = PathWeights::new(encoding, constraints);
            Sampler::new(bdd, encoding, weights, rng).sample(root, config.num_samples)?
        }
    };
    debug!("Drew {} assignments", assignments.len());
    Ok(assignments)
}
