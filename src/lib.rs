//! # bdd-sampler: random solutions of bit-vector constraints
//!
//! **`bdd-sampler`** compiles a set of constraints over typed bit-vector
//! variables into a single **Binary Decision Diagram** and draws random
//! satisfying assignments from it.
//!
//! ## How it works
//!
//! 1. Every bit of every declared variable becomes a diagram variable ([`encoding`]).
//! 2. Each constraint is bit-blasted into a diagram ([`compile`], circuits in [`word`]),
//!    and all constraints are conjoined into one diagram ([`conjoin`]).
//! 3. Samples are drawn by a weighted walk from the root to the `1` terminal
//!    ([`sample`], with the edge weights of [`weight`]).
//!
//! The diagram is canonical for the fixed variable order, so the constant
//! false diagram means the constraints have no solution at all.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_sampler::input::Document;
//! use bdd_sampler::pipeline::{solve, RunConfig};
//! use bdd_sampler::sample::SamplerConfig;
//!
//! let doc = Document::parse(r#"{
//!     "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 4}],
//!     "constraint_list": [{
//!         "op": ">", "id": 10, "value": 0, "bit_width": 1,
//!         "lhs_expression": {"op": "", "id": 1, "value": 0, "bit_width": 4},
//!         "rhs_expression": {"op": "", "id": 11, "value": 12, "bit_width": 4}
//!     }]
//! }"#).unwrap();
//!
//! let config = RunConfig {
//!     sampler: SamplerConfig::default().with_seed(1).with_num_samples(3),
//!     ..RunConfig::default()
//! };
//! let assignments = solve(&doc, &config).unwrap();
//! assert_eq!(assignments.len(), 3);
//! assert!(assignments.iter().all(|a| a.get(1).unwrap() > 12));
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the diagram manager, with reference counting ([`handle`]) and model counting ([`sat`]).
//! - **[`expr`]** and **[`width`]**: the expression model and two's-complement helpers.
//! - **[`input`]** and **[`emit`]**: reading constraint documents and writing assignment lists.
//! - **[`pipeline`]**: the whole run, as used by the `bdd-sample` binary.

pub mod bdd;
pub mod cache;
pub mod compile;
pub mod conjoin;
pub mod dot;
pub mod emit;
pub mod encoding;
pub mod error;
pub mod expr;
pub mod handle;
pub mod hash;
pub mod input;
pub mod pipeline;
pub mod reference;
pub mod sample;
pub mod sat;
pub mod table;
pub mod weight;
pub mod width;
pub mod word;
