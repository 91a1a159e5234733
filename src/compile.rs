//! Compilation of constraint expressions into diagrams.
//!
//! Every expression node compiles to a word: one diagram node per bit, least
//! significant first. A constraint holds when the word of its root is
//! non-zero and all of its guards hold. Guards come from divisions whose
//! divisor may be zero: an assignment that would divide by zero does not
//! satisfy the constraint. Guards under `&&`, `||` and `?:` only apply when
//! the guarded operand is actually evaluated.

use log::{debug, warn};

use crate::bdd::Bdd;
use crate::encoding::{DiagramKey, Encoding};
use crate::error::{Error, Result};
use crate::expr::{Expression, Leaf, Operator, Variable};
use crate::handle::Rooted;
use crate::reference::Ref;
use crate::width;

/// Limits of a compilation run.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Compilation fails with [`Error::AllocationFailure`] once the diagram holds more live nodes than this.
    pub node_limit: usize,
    /// Garbage is collected between constraints once the diagram holds more nodes than this.
    pub gc_threshold: usize,
}

impl CompileOptions {
    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = node_limit;
        self
    }

    pub fn with_gc_threshold(mut self, gc_threshold: usize) -> Self {
        self.gc_threshold = gc_threshold;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            node_limit: 1 << 24,
            gc_threshold: 1 << 20,
        }
    }
}

/// Compiled form of one expression node.
#[derive(Debug, Clone)]
struct Word {
    bits: Vec<Ref>,
    is_signed: bool,
    /// Built from literals only.
    is_literal: bool,
    /// Condition under which evaluating the node is defined.
    guard: Ref,
}

impl Word {
    fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Signedness of an operation on `self` and `other`.
    ///
    /// Both operands must be signed, except that a literal takes the
    /// signedness of a non-literal operand, so `x < 0` on a signed `x` is a
    /// signed comparison.
    fn common_signedness(&self, other: &Word) -> bool {
        match (self.is_literal, other.is_literal) {
            (true, false) => other.is_signed,
            (false, true) => self.is_signed,
            _ => self.is_signed && other.is_signed,
        }
    }
}

pub struct Compiler<'a> {
    bdd: &'a Bdd,
    encoding: Encoding,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(bdd: &'a Bdd, variables: &[Variable], options: CompileOptions) -> Self {
        let encoding = Encoding::new(variables);
        // Make the diagram aware of every declared bit, even the unconstrained ones.
        if encoding.num_vars() > 0 {
            bdd.mk_var(encoding.num_vars());
        }
        Self {
            bdd,
            encoding,
            options,
        }
    }

    pub fn bdd(&self) -> &'a Bdd {
        self.bdd
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile one constraint.
    ///
    /// When the constraint turns out to be a constant, the result is instead
    /// the fresh diagram variable standing for the constraint's root node.
    pub fn compile(&mut self, expr: &Expression) -> Result<Rooted<'a>> {
        let node = self.compile_constraint(expr)?;
        if !self.bdd.is_terminal(node) {
            return Ok(self.bdd.rooted(node));
        }

        if self.bdd.is_zero(node) {
            warn!("Constraint {} is unsatisfiable on its own, substituting a fresh variable", expr.id);
        } else {
            debug!("Constraint {} always holds, substituting a fresh variable", expr.id);
        }
        let v = self.encoding.alloc(DiagramKey::Node(expr.id));
        Ok(self.bdd.rooted(self.bdd.mk_var(v)))
    }

    /// The exact function of `expr` as a constraint: truth value and guards, without substitution.
    pub fn compile_constraint(&self, expr: &Expression) -> Result<Ref> {
        let word = self.compile_word(expr)?;
        let truth = self.bdd.truth_bits(&word.bits);
        Ok(self.bdd.apply_and(truth, word.guard))
    }

    fn compile_word(&self, e: &Expression) -> Result<Word> {
        let w = e.bit_width.clamp(1, width::MAX_WIDTH);

        let word = match (e.leaf, e.if_expr.as_deref(), e.lhs.as_deref(), e.rhs.as_deref()) {
            (Some(Leaf::Variable), ..) => self.variable_word(e)?,
            (Some(Leaf::Literal), ..) => Word {
                bits: self.bdd.const_bits(e.value, w),
                is_signed: e.value < 0,
                is_literal: true,
                guard: self.bdd.one(),
            },
            (None, Some(cond), Some(then), Some(otherwise)) => self.conditional(cond, then, otherwise)?,
            (None, None, Some(a), Some(b)) => {
                let a = self.compile_word(a)?;
                let b = self.compile_word(b)?;
                self.binary(e, a, b)?
            }
            (None, None, Some(a), None) | (None, None, None, Some(a)) => {
                let a = self.compile_word(a)?;
                self.unary(e, a)?
            }
            _ => {
                return Err(Error::malformed(
                    format!("node {}", e.id),
                    format!("operator '{}' with unexpected operands", e.op),
                ))
            }
        };

        self.check_limit(e.id)?;
        Ok(self.fit(word, w))
    }

    /// Fail if the diagram has outgrown the node limit; `node` names where it happened.
    pub(crate) fn check_limit(&self, node: i64) -> Result<()> {
        let nodes = self.bdd.node_count();
        if nodes > self.options.node_limit {
            return Err(Error::AllocationFailure {
                what: format!(
                    "diagram grew to {} nodes (limit {}) at node {}",
                    nodes, self.options.node_limit, node
                ),
            });
        }
        Ok(())
    }

    fn fit(&self, word: Word, width: u32) -> Word {
        Word {
            bits: self.bdd.resize_bits(&word.bits, width, word.is_signed),
            ..word
        }
    }

    fn predicate(&self, value: Ref, guard: Ref) -> Word {
        Word {
            bits: vec![value],
            is_signed: false,
            is_literal: false,
            guard,
        }
    }

    fn variable_word(&self, e: &Expression) -> Result<Word> {
        let var = self
            .encoding
            .variable(e.id)
            .ok_or_else(|| Error::malformed(format!("node {}", e.id), "reference to undeclared variable"))?;
        let bits = self
            .encoding
            .bits(var.id)
            .ok_or_else(|| Error::malformed(format!("node {}", e.id), "variable without diagram bits"))?;
        Ok(Word {
            bits: bits.into_iter().map(|v| self.bdd.mk_var(v)).collect(),
            is_signed: var.is_signed,
            is_literal: false,
            guard: self.bdd.one(),
        })
    }

    fn conditional(&self, cond: &Expression, then: &Expression, otherwise: &Expression) -> Result<Word> {
        let bdd = self.bdd;
        let c = self.compile_word(cond)?;
        let t = self.compile_word(then)?;
        let f = self.compile_word(otherwise)?;

        let truth = bdd.truth_bits(&c.bits);
        let width = t.width().max(f.width());
        let tb = bdd.resize_bits(&t.bits, width, t.is_signed);
        let fb = bdd.resize_bits(&f.bits, width, f.is_signed);

        let branch_guard = bdd.apply_ite(truth, t.guard, f.guard);
        Ok(Word {
            bits: bdd.ite_bits(truth, &tb, &fb),
            is_signed: t.common_signedness(&f),
            is_literal: c.is_literal && t.is_literal && f.is_literal,
            guard: bdd.apply_and(c.guard, branch_guard),
        })
    }

    fn unary(&self, e: &Expression, a: Word) -> Result<Word> {
        let bdd = self.bdd;
        let word = match e.op {
            Operator::LogicalNot => self.predicate(-bdd.truth_bits(&a.bits), a.guard),
            Operator::BitwiseNot => Word {
                bits: bdd.not_bits(&a.bits),
                ..a
            },
            Operator::Subtract => Word {
                bits: bdd.neg_bits(&a.bits),
                ..a
            },
            Operator::Add => a,
            op => {
                return Err(Error::malformed(
                    format!("node {}", e.id),
                    format!("operator '{}' needs two operands", op),
                ))
            }
        };
        Ok(word)
    }

    fn binary(&self, e: &Expression, a: Word, b: Word) -> Result<Word> {
        let bdd = self.bdd;
        let guard = bdd.apply_and(a.guard, b.guard);

        let width = a.width().max(b.width());
        let is_signed = a.common_signedness(&b);
        let is_literal = a.is_literal && b.is_literal;
        let x = bdd.resize_bits(&a.bits, width, a.is_signed);
        let y = bdd.resize_bits(&b.bits, width, b.is_signed);
        let word = |bits: Vec<Ref>| Word {
            bits,
            is_signed,
            is_literal,
            guard,
        };

        let less = |p: &[Ref], q: &[Ref]| {
            if is_signed {
                bdd.slt_bits(p, q)
            } else {
                bdd.ult_bits(p, q)
            }
        };

        let result = match e.op {
            // The right operand of a short-circuit operator is only evaluated when needed.
            Operator::LogicalAnd => {
                let lhs = bdd.truth_bits(&a.bits);
                let rhs = bdd.truth_bits(&b.bits);
                let guard = bdd.apply_and(a.guard, bdd.apply_or(-lhs, b.guard));
                self.predicate(bdd.apply_and(lhs, rhs), guard)
            }
            Operator::LogicalOr => {
                let lhs = bdd.truth_bits(&a.bits);
                let rhs = bdd.truth_bits(&b.bits);
                let guard = bdd.apply_and(a.guard, bdd.apply_or(lhs, b.guard));
                self.predicate(bdd.apply_or(lhs, rhs), guard)
            }
            Operator::BitwiseAnd => word(bdd.and_bits(&x, &y)),
            Operator::BitwiseOr => word(bdd.or_bits(&x, &y)),
            Operator::BitwiseXor => word(bdd.xor_bits(&x, &y)),
            Operator::Add => word(bdd.add_bits(&x, &y)),
            Operator::Subtract => word(bdd.sub_bits(&x, &y)),
            Operator::Multiply => word(bdd.mul_bits(&x, &y)),
            Operator::Divide | Operator::Modulus => {
                if bdd.is_const_zero(&y) {
                    return Err(Error::DivisionByZero { node: e.id });
                }
                let (q, r) = if is_signed {
                    bdd.sdivrem_bits(&x, &y)
                } else {
                    bdd.udivrem_bits(&x, &y)
                };
                let bits = if e.op == Operator::Divide { q } else { r };
                Word {
                    bits,
                    is_signed,
                    is_literal,
                    guard: bdd.apply_and(guard, bdd.truth_bits(&y)),
                }
            }
            Operator::Equal => self.predicate(bdd.eq_bits(&x, &y), guard),
            Operator::NotEqual => self.predicate(-bdd.eq_bits(&x, &y), guard),
            Operator::LessThan => self.predicate(less(&x, &y), guard),
            Operator::GreaterThan => self.predicate(less(&y, &x), guard),
            Operator::LessThanOrEqual => self.predicate(-less(&y, &x), guard),
            Operator::GreaterThanOrEqual => self.predicate(-less(&x, &y), guard),
            op @ (Operator::LogicalNot | Operator::BitwiseNot | Operator::Undefined) => {
                return Err(Error::malformed(
                    format!("node {}", e.id),
                    format!("operator '{}' does not take two operands", op),
                ))
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;
    use crate::width::extend;

    fn lit(id: i64, value: i64, w: u32) -> Expression {
        Expression::literal(id, value, w)
    }

    /// Satisfying values of a single variable `a` under `constraint`.
    fn solutions(a: &Variable, constraint: &Expression) -> Vec<i64> {
        let bdd = Bdd::default();
        let mut compiler = Compiler::new(&bdd, std::slice::from_ref(a), CompileOptions::default());
        let f = compiler.compile_constraint(constraint).unwrap();
        let bits = compiler.encoding().bits(a.id).unwrap();

        (0..(1i64 << a.bit_width))
            .filter(|&value| {
                bdd.evaluate(f, |v| {
                    let i = bits.iter().position(|&b| b == v).unwrap();
                    (value >> i) & 1 == 1
                })
            })
            .map(|value| extend(value, 64, a.is_signed, a.bit_width))
            .collect()
    }

    fn check(a: &Variable, op: Operator, rhs: i64, w: u32, expected: impl Fn(i64) -> bool) {
        let e = Expression::binary(op, 100, 1, Expression::var(a), lit(101, rhs, w));
        let got = solutions(a, &e);
        let want: Vec<i64> = (0..(1i64 << a.bit_width))
            .map(|v| extend(v, 64, a.is_signed, a.bit_width))
            .filter(|&v| expected(v))
            .collect();
        assert_eq!(got, want, "{} {} {}", a.name, op, rhs);
    }

    #[test]
    fn test_relational_unsigned() {
        let a = Variable::new(1, "a", false, 4);
        check(&a, Operator::Equal, 5, 4, |v| v == 5);
        check(&a, Operator::NotEqual, 5, 4, |v| v != 5);
        check(&a, Operator::LessThan, 5, 4, |v| v < 5);
        check(&a, Operator::GreaterThan, 5, 4, |v| v > 5);
        check(&a, Operator::LessThanOrEqual, 5, 4, |v| v <= 5);
        check(&a, Operator::GreaterThanOrEqual, 5, 4, |v| v >= 5);
    }

    #[test]
    fn test_relational_signed() {
        let a = Variable::new(1, "a", true, 4);
        // A negative literal is signed, so the comparison is signed.
        check(&a, Operator::LessThan, -2, 4, |v| v < -2);
        check(&a, Operator::GreaterThanOrEqual, -2, 4, |v| v >= -2);
        // A literal takes the signedness of the variable it is compared with.
        check(&a, Operator::LessThan, 3, 4, |v| v < 3);
        check(&a, Operator::LessThan, 0, 4, |v| v < 0);
        check(&a, Operator::GreaterThanOrEqual, 0, 4, |v| v >= 0);
        check(&a, Operator::GreaterThan, 5, 4, |v| v > 5);
    }

    #[test]
    fn test_literal_keeps_unsigned_comparison_unsigned() {
        // A negative literal is sign-extended but compared unsigned against an unsigned variable.
        let a = Variable::new(1, "a", false, 4);
        check(&a, Operator::LessThan, -1, 4, |v| v < 15);
    }

    #[test]
    fn test_signed_operand_with_unsigned_variable() {
        // Two variables of different signedness compare unsigned.
        let a = Variable::new(1, "a", true, 3);
        let b = Variable::new(2, "b", false, 3);
        let bdd = Bdd::default();
        let mut compiler = Compiler::new(&bdd, &[a.clone(), b.clone()], CompileOptions::default());
        let e = Expression::binary(Operator::LessThan, 100, 1, Expression::var(&a), Expression::var(&b));
        let f = compiler.compile(&e).unwrap();
        // a == -1 (111) is never below an unsigned b.
        let a_is_minus_one = bdd.apply_and_many((1..=3).map(|v| bdd.mk_var(v)));
        assert!(bdd.is_zero(bdd.apply_and(f.get(), a_is_minus_one)));
    }

    #[test]
    fn test_arithmetic_agrees_with_evaluation() {
        let a = Variable::new(1, "a", false, 4);
        let cases: [(Operator, fn(i64) -> i64); 5] = [
            (Operator::Add, |v| (v + 7) & 0xF),
            (Operator::Subtract, |v| (v - 7) & 0xF),
            (Operator::Multiply, |v| (v * 7) & 0xF),
            (Operator::Divide, |v| v / 7),
            (Operator::Modulus, |v| v % 7),
        ];
        for (op, eval) in cases {
            for target in 0..16 {
                // (a op 7) == target
                let e = Expression::binary(
                    Operator::Equal,
                    100,
                    1,
                    Expression::binary(op, 102, 4, Expression::var(&a), lit(103, 7, 4)),
                    lit(101, target, 4),
                );
                let want: Vec<i64> = (0..16).filter(|&v| eval(v) == target).collect();
                assert_eq!(solutions(&a, &e), want, "(a {} 7) == {}", op, target);
            }
        }
    }

    #[test]
    fn test_signed_division_by_variable() {
        // -7 / a == 2 holds for a == -3 only: the quotient truncates toward zero.
        let a = Variable::new(1, "a", true, 4);
        let e = Expression::binary(
            Operator::Equal,
            100,
            1,
            Expression::binary(Operator::Divide, 104, 4, lit(105, -7, 4), Expression::var(&a)),
            lit(101, 2, 4),
        );
        assert_eq!(solutions(&a, &e), vec![-3]);
    }

    #[test]
    fn test_division_guard() {
        let a = Variable::new(1, "a", false, 3);
        // 6 / a >= 0 holds for every a except 0.
        let e = Expression::binary(
            Operator::GreaterThanOrEqual,
            100,
            1,
            Expression::binary(Operator::Divide, 102, 3, lit(103, 6, 3), Expression::var(&a)),
            lit(101, 0, 3),
        );
        assert_eq!(solutions(&a, &e), (1..8).collect::<Vec<_>>());

        // a == 0 || 6 / a > 1: the division is not evaluated when a == 0.
        let e = Expression::binary(
            Operator::LogicalOr,
            110,
            1,
            Expression::binary(Operator::Equal, 111, 1, Expression::var(&a), lit(112, 0, 3)),
            Expression::binary(
                Operator::GreaterThan,
                113,
                1,
                Expression::binary(Operator::Divide, 114, 3, lit(115, 6, 3), Expression::var(&a)),
                lit(116, 1, 3),
            ),
        );
        assert_eq!(solutions(&a, &e), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_division_by_constant_zero() {
        let bdd = Bdd::default();
        let a = Variable::new(1, "a", false, 4);
        let mut compiler = Compiler::new(&bdd, std::slice::from_ref(&a), CompileOptions::default());
        let e = Expression::binary(Operator::Modulus, 7, 4, Expression::var(&a), lit(8, 0, 4));
        assert!(matches!(compiler.compile(&e), Err(Error::DivisionByZero { node: 7 })));
    }

    #[test]
    fn test_conditional_and_logic() {
        let a = Variable::new(1, "a", false, 3);
        // (a > 4 ? a : 7 - a) == 6  →  a == 6 or a == 1
        let e = Expression::binary(
            Operator::Equal,
            100,
            1,
            Expression::conditional(
                101,
                3,
                Expression::binary(Operator::GreaterThan, 102, 1, Expression::var(&a), lit(103, 4, 3)),
                Expression::var(&a),
                Expression::binary(Operator::Subtract, 104, 3, lit(105, 7, 3), Expression::var(&a)),
            ),
            lit(106, 6, 3),
        );
        assert_eq!(solutions(&a, &e), vec![1, 6]);

        // !(a & 1) && (a ^ 2)
        let e = Expression::binary(
            Operator::LogicalAnd,
            110,
            1,
            Expression::unary(
                Operator::LogicalNot,
                111,
                1,
                Expression::binary(Operator::BitwiseAnd, 112, 3, Expression::var(&a), lit(113, 1, 3)),
            ),
            Expression::binary(Operator::BitwiseXor, 114, 3, Expression::var(&a), lit(115, 2, 3)),
        );
        assert_eq!(solutions(&a, &e), vec![0, 4, 6]);
    }

    #[test]
    fn test_variable_is_fitted_to_node_width() {
        // A signed 2-bit variable read at 4 bits is sign-extended: a == 14 iff a == -2.
        let a = Variable::new(1, "a", true, 2);
        let mut var = Expression::var(&a);
        var.bit_width = 4;
        let e = Expression::binary(Operator::Equal, 100, 1, var, lit(101, 14, 4));
        assert_eq!(solutions(&a, &e), vec![-2]);
    }

    #[test]
    fn test_constant_constraint_is_substituted() {
        let bdd = Bdd::default();
        let a = Variable::new(1, "a", false, 2);
        let mut compiler = Compiler::new(&bdd, std::slice::from_ref(&a), CompileOptions::default());

        // 1 == 1 is constant true.
        let e = Expression::binary(Operator::Equal, 50, 1, lit(51, 1, 2), lit(52, 1, 2));
        assert!(bdd.is_one(compiler.compile_constraint(&e).unwrap()));

        let f = compiler.compile(&e).unwrap();
        let v = compiler.encoding().var_of(DiagramKey::Node(50)).unwrap();
        assert_eq!(v, 3);
        assert_eq!(f.get(), bdd.mk_var(v));
        assert_eq!(bdd.sat_count(f.get(), compiler.encoding().num_vars()), BigUint::from(4u32));
    }

    #[test]
    fn test_node_limit() {
        let bdd = Bdd::default();
        let a = Variable::new(1, "a", false, 8);
        let b = Variable::new(2, "b", false, 8);
        let options = CompileOptions::default().with_node_limit(10);
        let mut compiler = Compiler::new(&bdd, &[a.clone(), b.clone()], options);
        let e = Expression::binary(
            Operator::Equal,
            100,
            1,
            Expression::binary(Operator::Multiply, 101, 8, Expression::var(&a), Expression::var(&b)),
            lit(102, 77, 8),
        );
        assert!(matches!(compiler.compile(&e), Err(Error::AllocationFailure { .. })));
    }

    #[test]
    fn test_malformed_operands() {
        let bdd = Bdd::default();
        let a = Variable::new(1, "a", false, 2);
        let mut compiler = Compiler::new(&bdd, std::slice::from_ref(&a), CompileOptions::default());

        let e = Expression::unary(Operator::Multiply, 9, 2, Expression::var(&a));
        assert!(matches!(compiler.compile(&e), Err(Error::MalformedInput { .. })));

        let ghost = Variable::new(2, "ghost", false, 2);
        let e = Expression::binary(Operator::Equal, 10, 1, Expression::var(&ghost), lit(11, 0, 2));
        assert!(matches!(compiler.compile(&e), Err(Error::MalformedInput { .. })));
    }
}
