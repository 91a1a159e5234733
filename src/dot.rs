//! Graphviz export of diagrams.
//!
//! Terminals are squares at the bottom, nodes of one variable share a rank,
//! and roots are boxes at the top. High edges are solid, low edges dashed,
//! and complemented edges dotted with a hollow arrowhead.
//!
//! ```
//! use bdd_sampler::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));
//! let dot = bdd.to_dot(&[f]).unwrap();
//! assert!(dot.starts_with("graph {"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::bdd::Bdd;
use crate::encoding::Encoding;
use crate::reference::Ref;

#[derive(Debug, Clone)]
pub struct DotConfig {
    pub node_shape: &'static str,
    pub terminal_shape: &'static str,
    pub root_shape: &'static str,
    pub high_edge_style: &'static str,
    pub low_edge_style: &'static str,
    pub negated_edge_style: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "square",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
            negated_edge_style: "dotted",
        }
    }
}

impl Bdd {
    /// DOT text of the diagrams of `roots`, nodes labeled `x<variable>`.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        self.to_dot_with(roots, &DotConfig::default(), |v| format!("x{}", v))
    }

    /// DOT text of the diagrams of `roots`, nodes labeled by what their variable stands for in `encoding`.
    pub fn to_dot_encoded(&self, roots: &[Ref], encoding: &Encoding) -> Result<String, std::fmt::Error> {
        self.to_dot_with(roots, &DotConfig::default(), |v| match encoding.key_of(v) {
            Some(key) => key.to_string(),
            None => format!("x{}", v),
        })
    }

    pub fn to_dot_with(
        &self,
        roots: &[Ref],
        config: &DotConfig,
        label: impl Fn(u32) -> String,
    ) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape={}, label=\"0\"];", config.terminal_shape)?;
        writeln!(dot, "1 [shape={}, label=\"1\"];", config.terminal_shape)?;
        writeln!(dot, "}}")?;

        let terminal = self.one().index();
        let mut nodes: Vec<usize> = self
            .descendants(roots.iter().copied())
            .into_iter()
            .filter(|&i| i != terminal)
            .collect();
        nodes.sort_unstable();

        let mut levels = BTreeMap::<u32, Vec<usize>>::new();
        for &i in &nodes {
            levels.entry(self.variable(i)).or_default().push(i);
        }
        for (&v, level) in &levels {
            writeln!(dot, "{{ rank=same")?;
            for &i in level {
                writeln!(dot, "{} [label=\"{}\"];", i, label(v).replace('"', "\\\""))?;
            }
            writeln!(dot, "}}")?;
        }

        let target = |r: Ref| {
            if self.is_zero(r) {
                "0".to_string()
            } else {
                r.index().to_string()
            }
        };

        for &i in &nodes {
            let high = self.high(i);
            writeln!(dot, "{} -- {} [style={}];", i, target(high), config.high_edge_style)?;

            let low = self.low(i);
            if low.is_negated() && !self.is_zero(low) {
                writeln!(
                    dot,
                    "{} -- {} [style={}, dir=forward, arrowhead=odot];",
                    i,
                    target(low),
                    config.negated_edge_style
                )?;
            } else {
                writeln!(dot, "{} -- {} [style={}];", i, target(low), config.low_edge_style)?;
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (k, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", k, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (k, &root) in roots.iter().enumerate() {
            if root.is_negated() && !self.is_zero(root) {
                writeln!(dot, "r{} -- {} [dir=forward, arrowhead=odot];", k, target(root))?;
            } else {
                writeln!(dot, "r{} -- {};", k, target(root))?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::Variable;

    #[test]
    fn test_to_dot_basic() {
        let bdd = Bdd::default();
        let f = bdd.apply_and(bdd.mk_var(1), -bdd.mk_var(2));

        let dot = bdd.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("graph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"x1\""));
        assert!(dot.contains("label=\"x2\""));
    }

    #[test]
    fn test_to_dot_constants() {
        let bdd = Bdd::default();
        let dot = bdd.to_dot(&[bdd.zero(), bdd.one()]).unwrap();
        assert!(dot.contains("r0 -- 0;"));
        assert!(dot.contains("r1 -- 1;"));
    }

    #[test]
    fn test_to_dot_encoded_labels() {
        let bdd = Bdd::default();
        let enc = Encoding::new(&[Variable::new(7, "a", false, 2)]);
        // Variable 1 is the most significant bit of `a`.
        let f = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));

        let dot = bdd.to_dot_encoded(&[f], &enc).unwrap();
        assert!(dot.contains("label=\"v7[1]\""));
        assert!(dot.contains("label=\"v7[0]\""));
        assert!(dot.contains("arrowhead=odot"));
    }
}
