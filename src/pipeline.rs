//! End-to-end run: read, compile, conjoin, sample, emit.

use std::io::Write;
use std::path::PathBuf;

use log::{debug, info};

use crate::bdd::{Bdd, BddConfig};
use crate::compile::{CompileOptions, Compiler};
use crate::conjoin::try_conjoin;
use crate::emit::{self, OutputFormat};
use crate::error::Result;
use crate::expr::annotate;
use crate::input::Document;
use crate::sample::{sample, Assignment, SamplerConfig};

/// Everything a run needs besides the input document.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub bdd: BddConfig,
    pub compile: CompileOptions,
    pub sampler: SamplerConfig,
    pub format: OutputFormat,
    /// Where to write the combined diagram in DOT format, if anywhere.
    pub dot: Option<PathBuf>,
}

/// Compile `document` and draw the configured number of assignments.
pub fn solve(document: &Document, config: &RunConfig) -> Result<Vec<Assignment>> {
    let mut constraints = document.constraints.clone();
    for constraint in &mut constraints {
        annotate(constraint);
    }

    let bdd = Bdd::new(config.bdd);
    let mut compiler = Compiler::new(&bdd, &document.variables, config.compile);
    let root = try_conjoin(&mut compiler, &constraints)?;
    info!(
        "Combined diagram: {} nodes over {} variables",
        bdd.size(root.get()),
        compiler.encoding().num_vars()
    );
    let (hits, misses) = bdd.cache_stats();
    debug!("Cache: {} hits, {} misses", hits, misses);

    if let Some(path) = &config.dot {
        let dot = bdd
            .to_dot_encoded(&[root.get()], compiler.encoding())
            .map_err(std::io::Error::other)?;
        std::fs::write(path, dot)?;
        info!("Wrote diagram to {}", path.display());
    }

    sample(&bdd, compiler.encoding(), &constraints, root.get(), &config.sampler)
}

/// Parse `input`, solve it, and write the assignments to `out`.
///
/// Nothing is written when any stage fails.
pub fn run(input: &str, out: &mut impl Write, config: &RunConfig) -> Result<Vec<Assignment>> {
    let document = Document::parse(input)?;
    info!(
        "Read {} variables and {} constraints",
        document.variables.len(),
        document.constraints.len()
    );
    let assignments = solve(&document, config)?;
    emit::write(out, &assignments, config.format)?;
    Ok(assignments)
}
