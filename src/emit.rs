//! Writing assignment lists.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Result;
use crate::sample::Assignment;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    /// Annotated listing, one value per line.
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown format '{}', expected 'text' or 'json'", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// `values` in ascending order of variable id.
pub fn sorted(values: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut values = values.to_vec();
    values.sort_by_key(|&(id, _)| id);
    values
}

/// Write the listing
///
/// ```text
/// "assignment_list": [
/// [ // assignment 1
/// {"value": 3} // variable 1
/// ],
/// ]
/// ```
pub fn write_text(out: &mut impl Write, assignments: &[Assignment]) -> Result<()> {
    writeln!(out, "\"assignment_list\": [")?;
    for (i, assignment) in assignments.iter().enumerate() {
        writeln!(out, "[ // assignment {}", i + 1)?;
        for (id, value) in sorted(&assignment.values) {
            writeln!(out, "{{\"value\": {}}} // variable {}", value, id)?;
        }
        writeln!(out, "],")?;
    }
    writeln!(out, "]")?;
    Ok(())
}

#[derive(Serialize)]
struct Value {
    value: i64,
}

#[derive(Serialize)]
struct AssignmentList {
    assignment_list: Vec<Vec<Value>>,
}

/// Write `{"assignment_list": [[{"value": 3}, ...], ...]}`.
pub fn write_json(out: &mut impl Write, assignments: &[Assignment]) -> Result<()> {
    let list = AssignmentList {
        assignment_list: assignments
            .iter()
            .map(|a| {
                sorted(&a.values)
                    .into_iter()
                    .map(|(_, value)| Value { value })
                    .collect()
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &list)?;
    writeln!(out)?;
    Ok(())
}

pub fn write(out: &mut impl Write, assignments: &[Assignment], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, assignments),
        OutputFormat::Json => write_json(out, assignments),
    }
}
