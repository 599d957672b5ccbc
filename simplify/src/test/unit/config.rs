use std::collections::HashMap;

use crate::{DEFAULT_FOLD_MAX_ELEMENTS, SimplifyConfig, passes};

fn from(vars: &[(&str, &str)]) -> SimplifyConfig {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    SimplifyConfig::from_vars(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = SimplifyConfig::default();
    assert_eq!(config.fold_max_elements, DEFAULT_FOLD_MAX_ELEMENTS);
    assert!(config.allreduce_reorder);
    assert_eq!(SimplifyConfig::builder().build(), config);
    assert_eq!(from(&[]), config);
}

#[test]
fn test_builder() {
    let config = SimplifyConfig::builder().fold_max_elements(16).allreduce_reorder(false).build();
    assert_eq!(config.fold_max_elements, 16);
    assert!(!config.allreduce_reorder);
    assert_eq!(config.folder().max_elements(), 16);
}

#[test]
fn test_from_vars() {
    let config = from(&[("GRAFT_FOLD_MAX_ELEMENTS", "64"), ("GRAFT_NO_ALLREDUCE_REORDER", "1")]);
    assert_eq!(config.fold_max_elements, 64);
    assert!(!config.allreduce_reorder);
}

#[test]
fn test_from_vars_ignores_garbage() {
    let config = from(&[("GRAFT_FOLD_MAX_ELEMENTS", "lots")]);
    assert_eq!(config.fold_max_elements, DEFAULT_FOLD_MAX_ELEMENTS);
}

#[test]
fn test_passes() {
    let names = |config: &SimplifyConfig| passes(config).iter().map(|p| p.name().to_string()).collect::<Vec<_>>();

    assert_eq!(
        names(&SimplifyConfig::default()),
        vec!["arithmetic_simplify", "arithmetic_simplify_zero", "all_reduce_reorder"]
    );
    assert_eq!(
        names(&SimplifyConfig::builder().allreduce_reorder(false).build()),
        vec!["arithmetic_simplify", "arithmetic_simplify_zero"]
    );
}
