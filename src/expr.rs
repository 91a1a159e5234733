//! Typed constraint expressions.
//!
//! An [`Expression`] is an owned tree: every child is held in a `Box` by
//! exactly one parent. Trees are built once by the input reader and only
//! read afterwards, apart from the one-shot [`annotate`] pass.

use std::fmt;

/// A declared bit-vector variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: i64,
    pub name: String,
    pub is_signed: bool,
    pub bit_width: u32,
}

impl Variable {
    pub fn new(id: i64, name: impl Into<String>, is_signed: bool, bit_width: u32) -> Self {
        Self {
            id,
            name: name.into(),
            is_signed,
            bit_width,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operator {
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
    /// Leaf marker: a variable reference or a literal.
    Undefined,
}

impl Operator {
    /// Parse an operator tag. Returns `None` for unknown tags.
    ///
    /// Leaf spellings (`""`, `"undefined"`, `"var"`, `"const"`) and explicit
    /// conditional tags (`"?"`, `"?:"`, `"ite"`) all map to [`Operator::Undefined`]:
    /// the shape of the node decides what it is.
    pub fn from_tag(tag: &str) -> Option<Self> {
        use Operator::*;
        let op = match tag {
            "&&" => LogicalAnd,
            "||" => LogicalOr,
            "!" => LogicalNot,
            "&" => BitwiseAnd,
            "|" => BitwiseOr,
            "^" => BitwiseXor,
            "~" => BitwiseNot,
            "+" => Add,
            "-" => Subtract,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulus,
            ">" => GreaterThan,
            "<" => LessThan,
            ">=" => GreaterThanOrEqual,
            "<=" => LessThanOrEqual,
            "==" => Equal,
            "!=" => NotEqual,
            "" | "undefined" | "var" | "const" | "?" | "?:" | "ite" => Undefined,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        use Operator::*;
        match self {
            LogicalAnd => "&&",
            LogicalOr => "||",
            LogicalNot => "!",
            BitwiseAnd => "&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseNot => "~",
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulus => "%",
            GreaterThan => ">",
            LessThan => "<",
            GreaterThanOrEqual => ">=",
            LessThanOrEqual => "<=",
            Equal => "==",
            NotEqual => "!=",
            Undefined => "undefined",
        }
    }

    /// Logical and relational operators produce a truth value.
    pub fn is_predicate(self) -> bool {
        use Operator::*;
        matches!(
            self,
            LogicalAnd
                | LogicalOr
                | LogicalNot
                | GreaterThan
                | LessThan
                | GreaterThanOrEqual
                | LessThanOrEqual
                | Equal
                | NotEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What a leaf denotes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Leaf {
    /// Reference to the declared variable whose id is the node's `id`.
    Variable,
    /// Integer literal carried in the node's `value`.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub op: Operator,
    pub id: i64,
    pub value: i64,
    pub bit_width: u32,
    /// Set for leaves only.
    pub leaf: Option<Leaf>,
    pub lhs: Option<Box<Expression>>,
    pub rhs: Option<Box<Expression>>,
    /// Condition of a conditional node; `lhs` and `rhs` are its branches.
    pub if_expr: Option<Box<Expression>>,
    pub then_paths: u64,
    pub else_paths: u64,
    pub complement_paths: u64,
}

impl Expression {
    fn node(op: Operator, id: i64, bit_width: u32) -> Self {
        Self {
            op,
            id,
            value: 0,
            bit_width,
            leaf: None,
            lhs: None,
            rhs: None,
            if_expr: None,
            then_paths: 0,
            else_paths: 0,
            complement_paths: 0,
        }
    }

    /// Reference to variable `var`.
    pub fn var(var: &Variable) -> Self {
        Self {
            leaf: Some(Leaf::Variable),
            ..Self::node(Operator::Undefined, var.id, var.bit_width)
        }
    }

    pub fn literal(id: i64, value: i64, bit_width: u32) -> Self {
        Self {
            value,
            leaf: Some(Leaf::Literal),
            ..Self::node(Operator::Undefined, id, bit_width)
        }
    }

    pub fn unary(op: Operator, id: i64, bit_width: u32, operand: Expression) -> Self {
        Self {
            lhs: Some(Box::new(operand)),
            ..Self::node(op, id, bit_width)
        }
    }

    pub fn binary(op: Operator, id: i64, bit_width: u32, lhs: Expression, rhs: Expression) -> Self {
        Self {
            lhs: Some(Box::new(lhs)),
            rhs: Some(Box::new(rhs)),
            ..Self::node(op, id, bit_width)
        }
    }

    /// `cond ? then : otherwise`.
    pub fn conditional(id: i64, bit_width: u32, cond: Expression, then: Expression, otherwise: Expression) -> Self {
        Self {
            if_expr: Some(Box::new(cond)),
            ..Self::binary(Operator::Undefined, id, bit_width, then, otherwise)
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    pub fn is_conditional(&self) -> bool {
        self.if_expr.is_some()
    }

    /// Children in evaluation order: condition first, then `lhs`, then `rhs`.
    pub fn children(&self) -> impl Iterator<Item = &Expression> {
        [&self.if_expr, &self.lhs, &self.rhs]
            .into_iter()
            .filter_map(|child| child.as_deref())
    }

    /// Visit the whole tree in pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expression)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(Expression::node_count).sum::<usize>()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.leaf, &self.if_expr, &self.lhs, &self.rhs) {
            (Some(Leaf::Variable), ..) => write!(f, "v{}", self.id),
            (Some(Leaf::Literal), ..) => write!(f, "{}", self.value),
            (None, Some(c), Some(t), Some(e)) => write!(f, "({} ? {} : {})", c, t, e),
            (None, None, Some(a), Some(b)) => write!(f, "({} {} {})", a, self.op, b),
            (None, None, Some(a), None) | (None, None, None, Some(a)) => write!(f, "{}{}", self.op, a),
            _ => write!(f, "<{}#{}>", self.op, self.id),
        }
    }
}

/// Fill in the path counts of every node of `root`, children before parents.
///
/// Each count is `1 + lhs + rhs`, a missing child contributing 0; a leaf gets 1.
/// The condition of a conditional node is annotated too, but it does not
/// contribute to its parent's counts.
pub fn annotate(root: &mut Expression) {
    if let Some(cond) = root.if_expr.as_deref_mut() {
        annotate(cond);
    }
    if let Some(lhs) = root.lhs.as_deref_mut() {
        annotate(lhs);
    }
    if let Some(rhs) = root.rhs.as_deref_mut() {
        annotate(rhs);
    }

    let (mut then_paths, mut else_paths, mut complement_paths) = (1, 1, 1);
    for child in [&root.lhs, &root.rhs].into_iter().flatten() {
        then_paths += child.then_paths;
        else_paths += child.else_paths;
        complement_paths += child.complement_paths;
    }
    root.then_paths = then_paths;
    root.else_paths = else_paths;
    root.complement_paths = complement_paths;
}
