//! Reading the JSON constraint document.
//!
//! The document has two lists:
//!
//! ```json
//! {
//!   "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 8}],
//!   "constraint_list": [{"op": "==", "id": 10, "value": 0, "bit_width": 1,
//!                        "lhs_expression": {"op": "", "id": 1, "value": 0, "bit_width": 8},
//!                        "rhs_expression": {"op": "", "id": 11, "value": 3, "bit_width": 8}}]
//! }
//! ```
//!
//! Errors name the offending element, e.g. `constraint_list[2].lhs_expression.bit_width`.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::expr::{Expression, Leaf, Operator, Variable};
use crate::width;

#[derive(Debug, Deserialize)]
struct RawVariable {
    id: i64,
    name: String,
    signed: bool,
    bit_width: i64,
}

#[derive(Debug, Deserialize)]
struct RawExpression {
    op: String,
    id: i64,
    value: i64,
    bit_width: i64,
    lhs_expression: Option<Value>,
    rhs_expression: Option<Value>,
    if_expression: Option<Value>,
}

/// A validated input document.
#[derive(Debug, Clone)]
pub struct Document {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Expression>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let variables = read_variables(field(value, "document", "variable_list")?)?;
        let declared: HashSet<i64> = variables.iter().map(|v| v.id).collect();

        let constraints = constraint_values(value)?
            .iter()
            .enumerate()
            .map(|(i, c)| read_expression(c, &format!("constraint_list[{}]", i), &declared))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            variables,
            constraints,
        })
    }
}

fn field<'v>(value: &'v Value, path: &str, name: &str) -> Result<&'v Value> {
    value
        .get(name)
        .ok_or_else(|| Error::malformed(path, format!("missing field '{}'", name)))
}

fn array<'v>(value: &'v Value, path: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::malformed(path, "expected an array"))
}

fn check_width(width: i64, path: &str) -> Result<u32> {
    match u32::try_from(width) {
        Ok(w) if (1..=width::MAX_WIDTH).contains(&w) => Ok(w),
        _ => Err(Error::malformed(
            format!("{}.bit_width", path),
            format!("width {} is out of range 1..={}", width, width::MAX_WIDTH),
        )),
    }
}

/// The raw elements of `constraint_list` in `document`.
pub fn constraint_values(document: &Value) -> Result<&Vec<Value>> {
    array(field(document, "document", "constraint_list")?, "constraint_list")
}

/// Read and validate the `variable_list` array.
pub fn read_variables(list: &Value) -> Result<Vec<Variable>> {
    let mut seen = HashSet::new();
    array(list, "variable_list")?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("variable_list[{}]", i);
            let raw = RawVariable::deserialize(item).map_err(|e| Error::malformed(&path, e.to_string()))?;
            let bit_width = check_width(raw.bit_width, &path)?;
            if !seen.insert(raw.id) {
                return Err(Error::malformed(
                    format!("{}.id", path),
                    format!("duplicate variable id {}", raw.id),
                ));
            }
            Ok(Variable::new(raw.id, raw.name, raw.signed, bit_width))
        })
        .collect()
}

/// Read one expression tree rooted at `value`, located at `path` in the document.
///
/// `variables` holds the declared variable ids; it decides whether an
/// untagged leaf is a variable reference or a literal.
pub fn read_expression(value: &Value, path: &str, variables: &HashSet<i64>) -> Result<Expression> {
    if !value.is_object() {
        return Err(Error::malformed(path, "expected an object"));
    }
    let raw = RawExpression::deserialize(value).map_err(|e| Error::malformed(path, e.to_string()))?;

    let op = Operator::from_tag(&raw.op)
        .ok_or_else(|| Error::malformed(format!("{}.op", path), format!("unknown operator '{}'", raw.op)))?;
    let bit_width = check_width(raw.bit_width, path)?;

    let child = |v: &Option<Value>, name: &str| -> Result<Option<Box<Expression>>> {
        v.as_ref()
            .map(|v| read_expression(v, &format!("{}.{}", path, name), variables).map(Box::new))
            .transpose()
    };
    let lhs = child(&raw.lhs_expression, "lhs_expression")?;
    let rhs = child(&raw.rhs_expression, "rhs_expression")?;
    let if_expr = child(&raw.if_expression, "if_expression")?;

    if if_expr.is_some() && (lhs.is_none() || rhs.is_none()) {
        return Err(Error::malformed(path, "conditional without both branches"));
    }

    let leaf = if lhs.is_none() && rhs.is_none() && if_expr.is_none() {
        let declared = variables.contains(&raw.id);
        let leaf = match raw.op.as_str() {
            "var" if declared => Leaf::Variable,
            "var" => {
                return Err(Error::malformed(
                    format!("{}.id", path),
                    format!("reference to undeclared variable {}", raw.id),
                ))
            }
            "const" => Leaf::Literal,
            _ if op != Operator::Undefined => {
                return Err(Error::malformed(path, format!("operator '{}' without operands", op)));
            }
            _ if declared => Leaf::Variable,
            _ => Leaf::Literal,
        };
        Some(leaf)
    } else {
        None
    };

    Ok(Expression {
        op,
        id: raw.id,
        value: raw.value,
        bit_width,
        leaf,
        lhs,
        rhs,
        if_expr,
        then_paths: 0,
        else_paths: 0,
        complement_paths: 0,
    })
}
