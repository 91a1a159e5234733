use serde_json::json;

use bdd_sampler::bdd::Bdd;
use bdd_sampler::compile::{CompileOptions, Compiler};
use bdd_sampler::conjoin::conjoin;
use bdd_sampler::emit::OutputFormat;
use bdd_sampler::encoding::DiagramKey;
use bdd_sampler::error::Error;
use bdd_sampler::expr::Variable;
use bdd_sampler::input::Document;
use bdd_sampler::pipeline::{run, solve, RunConfig};
use bdd_sampler::sample::SamplerConfig;
use bdd_sampler::weight::WeightingKind;

fn config(num_samples: usize) -> RunConfig {
    RunConfig {
        sampler: SamplerConfig::default().with_seed(2024).with_num_samples(num_samples),
        ..RunConfig::default()
    }
}

fn var_ref(id: i64, bit_width: u32) -> serde_json::Value {
    json!({"op": "", "id": id, "value": 0, "bit_width": bit_width})
}

fn literal(id: i64, value: i64, bit_width: u32) -> serde_json::Value {
    json!({"op": "", "id": id, "value": value, "bit_width": bit_width})
}

fn equals(id: i64, lhs: serde_json::Value, rhs: serde_json::Value) -> serde_json::Value {
    json!({"op": "==", "id": id, "value": 0, "bit_width": 1, "lhs_expression": lhs, "rhs_expression": rhs})
}

#[test_log::test]
fn single_bit_equal_one() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 1}],
        "constraint_list": [equals(10, var_ref(1, 1), literal(11, 1, 1))],
    });

    let mut out = Vec::new();
    let assignments = run(&doc.to_string(), &mut out, &config(3)).unwrap();

    assert_eq!(assignments.len(), 3);
    assert!(assignments.iter().all(|a| a.values == vec![(1, 1)]));
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("{\"value\": 1} // variable 1").count(), 3);
    assert!(text.starts_with("\"assignment_list\": [\n[ // assignment 1\n"));
}

#[test_log::test]
fn two_forced_variables_are_sorted() {
    // Declared out of order; output is sorted by variable id.
    let doc = json!({
        "variable_list": [
            {"id": 2, "name": "b", "signed": false, "bit_width": 1},
            {"id": 1, "name": "a", "signed": false, "bit_width": 1},
        ],
        "constraint_list": [
            equals(10, var_ref(2, 1), literal(11, 0, 1)),
            equals(20, var_ref(1, 1), literal(21, 1, 1)),
        ],
    });

    let mut out = Vec::new();
    let assignments = run(&doc.to_string(), &mut out, &config(5)).unwrap();

    assert_eq!(assignments.len(), 5);
    for a in &assignments {
        assert_eq!(a.values, vec![(1, 1), (2, 0)]);
    }
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[ // assignment 5\n{\"value\": 1} // variable 1\n{\"value\": 0} // variable 2\n],\n"));
}

#[test_log::test]
fn contradiction_is_unsatisfiable() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 4}],
        "constraint_list": [
            equals(10, var_ref(1, 4), literal(11, 3, 4)),
            equals(20, var_ref(1, 4), literal(21, 5, 4)),
        ],
    });

    let mut out = Vec::new();
    let err = run(&doc.to_string(), &mut out, &config(5)).unwrap_err();
    assert!(matches!(err, Error::UnsatisfiableConstraintSet));
    assert!(out.is_empty());
}

#[test_log::test]
fn empty_constraint_list_is_false() {
    let bdd = Bdd::default();
    let vars = [Variable::new(1, "a", false, 2)];
    let mut compiler = Compiler::new(&bdd, &vars, CompileOptions::default());
    let root = conjoin(&mut compiler, &[]);
    assert!(bdd.is_zero(root.get()));

    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 2}],
        "constraint_list": [],
    });
    let doc = Document::from_value(&doc).unwrap();
    assert!(matches!(solve(&doc, &config(1)), Err(Error::UnsatisfiableConstraintSet)));
}

#[test_log::test]
fn constant_constraint_becomes_node_variable() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 2}],
        "constraint_list": [
            equals(10, literal(11, 2, 2), literal(12, 2, 2)),
            equals(20, var_ref(1, 2), literal(21, 3, 2)),
        ],
    });
    let doc = Document::from_value(&doc).unwrap();

    let bdd = Bdd::default();
    let mut compiler = Compiler::new(&bdd, &doc.variables, CompileOptions::default());
    let root = conjoin(&mut compiler, &doc.constraints);

    let v = compiler.encoding().var_of(DiagramKey::Node(10)).unwrap();
    assert!(bdd.evaluate(root.get(), |x| x <= 2 || x == v));
    assert!(!bdd.evaluate(root.get(), |x| x <= 2));

    // The substituted variable is not part of any declared variable.
    let assignments = solve(&doc, &config(4)).unwrap();
    assert!(assignments.iter().all(|a| a.values == vec![(1, 3)]));
}

#[test_log::test]
fn signed_arithmetic_end_to_end() {
    // a + b == -3, a > b and b > 1 for signed 4-bit a and b. Only 7 + 6 wraps to -3.
    let doc = json!({
        "variable_list": [
            {"id": 1, "name": "a", "signed": true, "bit_width": 4},
            {"id": 2, "name": "b", "signed": true, "bit_width": 4},
        ],
        "constraint_list": [
            equals(10,
                json!({"op": "+", "id": 12, "value": 0, "bit_width": 4,
                       "lhs_expression": var_ref(1, 4), "rhs_expression": var_ref(2, 4)}),
                literal(11, -3, 4)),
            {"op": ">", "id": 20, "value": 0, "bit_width": 1,
             "lhs_expression": var_ref(1, 4), "rhs_expression": var_ref(2, 4)},
            {"op": ">", "id": 30, "value": 0, "bit_width": 1,
             "lhs_expression": var_ref(2, 4), "rhs_expression": literal(31, 1, 4)},
        ],
    });
    let doc = Document::from_value(&doc).unwrap();

    for weighting in [WeightingKind::Exact, WeightingKind::Paths] {
        let mut config = config(50);
        config.sampler = config.sampler.with_weighting(weighting);
        for a in solve(&doc, &config).unwrap() {
            let (x, y) = (a.get(1).unwrap(), a.get(2).unwrap());
            assert!((-8..8).contains(&x) && (-8..8).contains(&y));
            assert_eq!((x + y).rem_euclid(16), 13, "{:?}", a);
            assert!(x > y && y > 1, "{:?}", a);
            assert_eq!((x, y), (7, 6));
        }
    }
}

#[test_log::test]
fn signed_variable_below_zero() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "x", "signed": true, "bit_width": 4}],
        "constraint_list": [{"op": "<", "id": 10, "value": 0, "bit_width": 1,
                             "lhs_expression": var_ref(1, 4), "rhs_expression": literal(11, 0, 4)}],
    });
    let doc = Document::from_value(&doc).unwrap();

    let mut config = config(20);
    config.sampler = config.sampler.with_seed(1);
    let values: Vec<i64> = solve(&doc, &config)
        .unwrap()
        .iter()
        .map(|a| a.get(1).unwrap())
        .collect();
    assert_eq!(values.len(), 20);
    assert!(values.iter().all(|&x| (-8..0).contains(&x)), "{:?}", values);
}

#[test_log::test]
fn division_by_constant_zero_is_reported() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 4}],
        "constraint_list": [
            equals(10, var_ref(1, 4), literal(11, 1, 4)),
            equals(20,
                json!({"op": "/", "id": 22, "value": 0, "bit_width": 4,
                       "lhs_expression": var_ref(1, 4), "rhs_expression": literal(23, 0, 4)}),
                literal(21, 1, 4)),
        ],
    });

    let mut out = Vec::new();
    match run(&doc.to_string(), &mut out, &config(2)) {
        Err(Error::Constraint { index: 1, source }) => {
            assert!(matches!(*source, Error::DivisionByZero { node: 22 }));
        }
        other => panic!("unexpected result: {:?}", other.map(|a| a.len())),
    }
    assert!(out.is_empty());
}

#[test_log::test]
fn json_output() {
    let doc = json!({
        "variable_list": [{"id": 7, "name": "x", "signed": false, "bit_width": 3}],
        "constraint_list": [equals(10, var_ref(7, 3), literal(11, 6, 3))],
    });

    let mut config = config(2);
    config.format = OutputFormat::Json;
    let mut out = Vec::new();
    run(&doc.to_string(), &mut out, &config).unwrap();

    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed, json!({"assignment_list": [[{"value": 6}], [{"value": 6}]]}));
}

#[test_log::test]
fn dot_dump() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 2}],
        "constraint_list": [equals(10, var_ref(1, 2), literal(11, 2, 2))],
    });
    let path = std::env::temp_dir().join(format!("bdd-sampler-{}.dot", std::process::id()));

    let mut config = config(1);
    config.dot = Some(path.clone());
    let doc = Document::from_value(&doc).unwrap();
    solve(&doc, &config).unwrap();

    let dot = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(dot.starts_with("graph {"));
    assert!(dot.contains("v1[1]"));
}

#[test_log::test]
fn malformed_document() {
    let doc = json!({
        "variable_list": [{"id": 1, "name": "a", "signed": false, "bit_width": 4}],
        "constraint_list": [{"op": "==", "id": 10, "value": 0, "bit_width": 1,
                             "lhs_expression": var_ref(1, 4),
                             "rhs_expression": {"op": "", "id": 11, "bit_width": 4}}],
    });

    let mut out = Vec::new();
    match run(&doc.to_string(), &mut out, &config(1)) {
        Err(Error::MalformedInput { path, .. }) => assert_eq!(path, "constraint_list[0].rhs_expression"),
        other => panic!("unexpected result: {:?}", other.map(|a| a.len())),
    }
}
