//! Process-wide registry lifecycle.
//!
//! Runs as a single test: the registry freezes once per process.

use pasture_rules::{
    EngineConfig, EvaluationError, InnerTable, RegistryError, ShapeElement, ShapePattern, Token,
    evaluate, global, init_global, lookup, register_matcher_fn,
};

fn table(pairs: &[(&str, f64)]) -> InnerTable {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
}

fn at_least_shape() -> ShapePattern {
    ShapePattern::new([
        ShapeElement::Identifier,
        ShapeElement::keyword("ATLEAST"),
        ShapeElement::Number,
    ])
}

fn at_least(tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
    match tokens {
        [Token::Identifier(name), _, Token::Number(limit)] => Ok(lookup(table, name)? >= *limit),
        _ => Err(EvaluationError::MalformedClause {
            condition_type: "at-least".into(),
            reason: "expected <identifier> ATLEAST <number>".into(),
        }),
    }
}

#[test]
fn register_then_freeze_on_first_use() {
    // Built-in names cannot be claimed.
    assert_eq!(
        register_matcher_fn("threshold", at_least_shape(), at_least),
        Err(RegistryError::DuplicateConditionType("threshold".into()))
    );

    register_matcher_fn("at-least", at_least_shape(), at_least).unwrap();
    assert_eq!(
        register_matcher_fn("at-least", at_least_shape(), at_least),
        Err(RegistryError::DuplicateConditionType("at-least".into()))
    );
    assert!(matches!(
        register_matcher_fn("broken", ShapePattern::new([ShapeElement::And]), at_least),
        Err(RegistryError::InvalidShape { .. })
    ));

    // First evaluation freezes: built-ins first, then custom matchers.
    let readings = table(&[("feed", 12.0), ("temp", 39.2)]);
    assert_eq!(evaluate("feed ATLEAST 10 AND temp > 38.5", &readings), Ok(true));
    assert_eq!(evaluate("feed ATLEAST 20", &readings), Ok(false));

    let types: Vec<&str> = global().unwrap().registry().condition_types().collect();
    assert_eq!(
        types,
        vec!["threshold", "range", "compare", "delta", "rate-of-change", "at-least"]
    );

    // Frozen from now on.
    assert_eq!(
        register_matcher_fn("late", at_least_shape(), at_least),
        Err(RegistryError::Frozen)
    );

    // Re-initialising returns the existing engine.
    let strict = EngineConfig {
        conditions: Some(vec!["threshold".into()]),
        ..EngineConfig::default()
    };
    let engine = init_global(&strict).unwrap();
    assert_eq!(engine.registry().len(), 6);
}
