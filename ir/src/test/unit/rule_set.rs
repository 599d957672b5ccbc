//! First-match-wins dispatch and replacement commit in `RuleSet`.

use graft_dtype::DType;

use crate::{Build, ConstValue, Graph, NodeId, Pat, Primitive, RewriteResult, Rewriter, RuleSet, Value};

fn setup() -> (Graph, NodeId, NodeId) {
    let mut graph = Graph::new();
    let main = graph.add_subgraph("main");
    let x = graph.parameter("x", Some(main)).unwrap();
    let zero = graph.scalar(DType::Int32, ConstValue::Int(0), None).unwrap();
    let add = graph.call(Primitive::Add, [x, zero], Some(main)).unwrap();
    (graph, x, add)
}

#[test]
fn test_first_match_wins() {
    let (mut graph, x, add) = setup();

    let mut rules = RuleSet::new("test");
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |_g, x| Some(Build::Existing(x)));
    pattern!(rules, Pat::var("x") + Pat::var("y") => |_g, y| Some(Build::Existing(y)));
    assert_eq!(rules.len(), 2);

    assert_eq!(rules.rewrite(&mut graph, add), RewriteResult::Rewritten(x));
    graph.verify().unwrap();
}

#[test]
#[tracing_test::traced_test]
fn test_every_tried_rule_is_traced() {
    let (mut graph, _x, add) = setup();

    let mut rules = RuleSet::new("traced");
    pattern!(rules, Pat::var("x") * Pat::one("one") => |_g, x| Some(Build::Existing(x)));
    pattern!(rules, Pat::var("x") + Pat::var("y") => |_g, y| Some(Build::Existing(y)));
    rules.rewrite(&mut graph, add);

    assert!(logs_contain("trying pattern"));
    assert!(logs_contain("pattern_idx=0"));
    assert!(logs_contain("pattern_idx=1"));
}

#[test]
fn test_declined_rule_falls_through() {
    let (mut graph, _x, add) = setup();
    let zero = graph.operands(add)[2];

    let mut rules = RuleSet::new("test");
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |g, x| g.value(x).map(|_| Build::Existing(x)));
    pattern!(rules, Pat::var("x") + Pat::var("y") => |_g, y| Some(Build::Existing(y)));

    assert_eq!(rules.rewrite(&mut graph, add), RewriteResult::Rewritten(zero));
}

#[test]
fn test_no_match_leaves_graph_untouched() {
    let (mut graph, _x, add) = setup();
    let snapshot = graph.clone();

    let mut rules = RuleSet::new("test");
    pattern!(rules, Pat::var("x") * Pat::one("one") => |_g, x| Some(Build::Existing(x)));
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |g, x| g.value(x).map(|_| Build::Existing(x)));

    assert_eq!(rules.rewrite(&mut graph, add), RewriteResult::NoMatch);
    assert_eq!(graph, snapshot);
}

#[test]
fn test_builds_into_candidate_subgraph() {
    let (mut graph, x, add) = setup();
    let main = graph.owner(add);

    let mut rules = RuleSet::new("test");
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |_g, x| {
        Some(Build::call(Primitive::Mul, vec![Build::Existing(x), Build::Value(Value::native(2i32))]))
    });

    let before = graph.len();
    let RewriteResult::Rewritten(mul) = rules.rewrite(&mut graph, add) else {
        panic!("rule should fire");
    };
    assert_eq!(graph.len(), before + 3);
    assert!(graph.is_call_with(mul, &Primitive::Mul));
    assert_eq!(graph.owner(mul), main);
    assert_eq!(graph.operands(mul)[1], x);
    assert_eq!(graph.value(graph.operands(mul)[2]), Some(&Value::native(2i32)));
    graph.verify().unwrap();
}

#[test]
fn test_reuses_operator_node() {
    let (mut graph, x, add) = setup();
    let add_op = graph.operands(add)[0];

    let mut rules = RuleSet::new("reuse");
    pattern!(rules, (Pat::var("x") + Pat::zero("zero")).named("root") => |g, x, root| {
        Some(Build::call_with(g.operands(root)[0], vec![Build::Existing(x), Build::Existing(x)]))
    });

    let RewriteResult::Rewritten(doubled) = rules.rewrite(&mut graph, add) else {
        panic!("rule should fire");
    };
    assert_eq!(graph.operands(doubled), &[add_op, x, x]);
    assert_eq!(graph.users(add_op).unwrap().len(), 2);
    graph.verify().unwrap();
}

#[test]
fn test_owned_rules_skip_detached_nodes() {
    let mut graph = Graph::new();
    let x = graph.parameter("x", None).unwrap();
    let one = graph.scalar(DType::Int32, ConstValue::Int(1), None).unwrap();
    let pow = graph.call(Primitive::Pow, [x, one], None).unwrap();

    let mut rules = RuleSet::new("owned");
    pattern!(owned rules, Pat::pow(Pat::var("x"), Pat::one_scalar("one")) => |_g, x| Some(Build::Existing(x)));

    assert_eq!(rules.rewrite(&mut graph, pow), RewriteResult::NoMatch);

    let main = graph.add_subgraph("main");
    let owned = graph.call(Primitive::Pow, [x, one], Some(main)).unwrap();
    assert_eq!(rules.rewrite(&mut graph, owned), RewriteResult::Rewritten(x));
}

#[test]
fn test_rewriter_trait() {
    let (mut graph, x, add) = setup();
    let mut rules = RuleSet::new("identities");
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |_g, x| Some(x.into()));

    let rewriter: &dyn Rewriter = &rules;
    assert_eq!(rewriter.name(), "identities");
    let result = rewriter.rewrite(&mut graph, add);
    assert!(result.is_match());
    assert_eq!(result.replacement(), Some(x));
    assert_eq!(RewriteResult::NoMatch.replacement(), None);
}

#[test]
#[should_panic(expected = "invalid replacement")]
fn test_invalid_build_panics() {
    let (mut graph, _x, add) = setup();
    let mut other = Graph::new();
    for _ in 0..10 {
        other.parameter("p", None).unwrap();
    }
    let foreign = other.parameter("p", None).unwrap();

    let mut rules = RuleSet::new("broken");
    rules.add(Pat::var("x") + Pat::zero("zero"), move |_b, _i, _g| Some(Build::Existing(foreign)));
    rules.rewrite(&mut graph, add);
}
