//! Conjunction of a whole constraint list into one diagram.

use std::collections::HashSet;

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::compile::Compiler;
use crate::error::Result;
use crate::expr::Expression;
use crate::handle::Rooted;
use crate::input::read_expression;

/// Conjoin all `constraints`, surfacing the first failure tagged with its constraint index.
///
/// An empty list yields the constant false. Constraints that compile to a
/// constant are substituted by their node-id variable, see [`Compiler::compile`].
pub fn try_conjoin<'a>(compiler: &mut Compiler<'a>, constraints: &[Expression]) -> Result<Rooted<'a>> {
    let bdd = compiler.bdd();
    if constraints.is_empty() {
        warn!("Empty constraint list, the result is constant false");
        return Ok(bdd.rooted(bdd.zero()));
    }

    let mut result = bdd.rooted(bdd.one());
    for (index, constraint) in constraints.iter().enumerate() {
        let node = compiler
            .compile(constraint)
            .map_err(|e| e.in_constraint(index))?;
        result.replace(bdd.apply_and(result.get(), node.get()));
        drop(node);

        compiler
            .check_limit(constraint.id)
            .map_err(|e| e.in_constraint(index))?;
        collect_if_needed(compiler);
        debug!(
            "Conjoined constraint {} (id {}): {} nodes in result",
            index,
            constraint.id,
            bdd.size(result.get())
        );
    }

    info!(
        "Conjoined {} constraints: {} nodes, {} diagram variables",
        constraints.len(),
        bdd.size(result.get()),
        compiler.encoding().num_vars()
    );
    Ok(result)
}

/// Like [`try_conjoin`], but any failure yields the constant false.
pub fn conjoin<'a>(compiler: &mut Compiler<'a>, constraints: &[Expression]) -> Rooted<'a> {
    let bdd = compiler.bdd();
    try_conjoin(compiler, constraints).unwrap_or_else(|e| {
        error!("{}", e);
        bdd.rooted(bdd.zero())
    })
}

/// Conjoin constraints given as raw JSON elements of `constraint_list`.
///
/// Each element is read and compiled in turn; a structural error in any of
/// them aborts the whole conjunction with the constant false, releasing
/// everything built so far.
pub fn conjoin_json<'a>(compiler: &mut Compiler<'a>, constraints: &[Value]) -> Rooted<'a> {
    let bdd = compiler.bdd();
    let declared: HashSet<i64> = compiler.encoding().variables().map(|v| v.id).collect();

    let mut parsed = Vec::with_capacity(constraints.len());
    for (index, value) in constraints.iter().enumerate() {
        match read_expression(value, &format!("constraint_list[{}]", index), &declared) {
            Ok(expr) => parsed.push(expr),
            Err(e) => {
                error!("Error reading constraint at index {}: {}", index, e);
                return bdd.rooted(bdd.zero());
            }
        }
    }
    conjoin(compiler, &parsed)
}

fn collect_if_needed(compiler: &Compiler<'_>) {
    let bdd = compiler.bdd();
    if bdd.node_count() > compiler.options().gc_threshold {
        let freed = bdd.collect_garbage();
        debug!("Collected {} nodes, {} remain", freed, bdd.node_count());
    }
}
