//! End-to-end blocks-world scenarios

use planatlas::{
    available, execute, goalstate, ground, groundactions, initstate, relevant, satisfiers, satisfy,
    transition, ActionSchema, Clause, Domain, EngineConfig, Metric, Problem, Signature, Term,
    Value, Variable,
};

fn pred(name: &str, args: Vec<Term>) -> Term {
    Term::compound(name, args)
}

fn not(term: Term) -> Term {
    Term::compound("not", vec![term])
}

fn and(args: Vec<Term>) -> Term {
    Term::compound("and", args)
}

fn blocks_domain() -> Domain {
    let mut domain = Domain::new("blocksworld");
    domain.declare_type("block");
    domain.add_predicate(Signature::new("on", &[("x", "block"), ("y", "block")]));
    domain.add_predicate(Signature::new("ontable", &[("x", "block")]));
    domain.add_predicate(Signature::new("clear", &[("x", "block")]));
    domain.add_predicate(Signature::new("holding", &[("x", "block")]));
    domain.add_predicate(Signature::new("handempty", &[]));
    domain.add_function(Signature::new("total-cost", &[]));

    domain.add_axiom(Clause::new(
        pred("above", vec![Term::var("x"), Term::var("y")]),
        vec![pred("on", vec![Term::var("x"), Term::var("y")])],
    ));
    domain.add_axiom(Clause::new(
        pred("above", vec![Term::var("x"), Term::var("y")]),
        vec![
            pred("on", vec![Term::var("x"), Term::var("z")]),
            pred("above", vec![Term::var("z"), Term::var("y")]),
        ],
    ));

    domain.add_action(ActionSchema::new(
        "pickup",
        &[("x", "block")],
        and(vec![
            pred("clear", vec![Term::var("x")]),
            pred("ontable", vec![Term::var("x")]),
            Term::sym("handempty"),
        ]),
        and(vec![
            not(pred("ontable", vec![Term::var("x")])),
            not(pred("clear", vec![Term::var("x")])),
            not(Term::sym("handempty")),
            pred("holding", vec![Term::var("x")]),
            Term::compound("increase", vec![Term::sym("total-cost"), Term::num(3.0)]),
        ]),
    ));
    domain.add_action(ActionSchema::new(
        "putdown",
        &[("x", "block")],
        pred("holding", vec![Term::var("x")]),
        and(vec![
            not(pred("holding", vec![Term::var("x")])),
            pred("ontable", vec![Term::var("x")]),
            pred("clear", vec![Term::var("x")]),
            Term::sym("handempty"),
        ]),
    ));
    domain
}

fn blocks_problem() -> Problem {
    let mut problem = Problem::new("tower", "blocksworld");
    problem.declare_object("a", "block");
    problem.declare_object("b", "block");
    problem.add_init(pred("clear", vec![Term::sym("a")]));
    problem.add_init(pred("ontable", vec![Term::sym("a")]));
    problem.add_init(pred("ontable", vec![Term::sym("b")]));
    problem.add_init(Term::sym("handempty"));
    problem.add_init(Term::compound(
        "=",
        vec![Term::sym("total-cost"), Term::num(0.0)],
    ));
    problem.set_goal(pred("holding", vec![Term::sym("a")]));
    problem.metric = Some(Metric::Minimize(Term::sym("total-cost")));
    problem
}

#[test]
fn test_build_and_query_state() {
    let domain = blocks_domain();
    let mut problem = Problem::new("query", "blocksworld");
    problem.declare_object("a", "block");
    problem.declare_object("b", "block");
    problem.add_init(pred("on", vec![Term::sym("a"), Term::sym("b")]));
    problem.add_init(pred("clear", vec![Term::sym("a")]));
    problem.add_init(pred("ontable", vec![Term::sym("b")]));

    let state = initstate(&domain, &problem).unwrap();
    let config = EngineConfig::default();

    assert!(satisfy(
        &domain,
        &state,
        &[pred("on", vec![Term::sym("a"), Term::sym("b")])],
        &config
    )
    .unwrap());
    assert!(!satisfy(
        &domain,
        &state,
        &[pred("on", vec![Term::sym("b"), Term::sym("a")])],
        &config
    )
    .unwrap());

    let sols = satisfiers(
        &domain,
        &state,
        &[pred("on", vec![Term::var("x"), Term::var("y")])],
        &config,
    )
    .unwrap();
    assert_eq!(sols.len(), 1);
    assert_eq!(sols[0].get(&Variable::new("x")), Some(&Term::sym("a")));
    assert_eq!(sols[0].get(&Variable::new("y")), Some(&Term::sym("b")));
}

#[test]
fn test_ground_pickup_schema() {
    let domain = blocks_domain();
    let state = initstate(&domain, &blocks_problem()).unwrap();
    let config = EngineConfig::default();

    let schema = domain.actions.get("pickup").unwrap();
    let actions = groundactions(&domain, &state, Some(schema), &config).unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].term, pred("pickup", vec![Term::sym("a")]));
    assert_eq!(actions[1].term, pred("pickup", vec![Term::sym("b")]));

    // clear/ontable/handempty are all dynamic, so the preconditions stay
    // as given for both instantiations
    assert_eq!(actions[0].preconds.len(), 3);
    assert_eq!(actions[1].preconds.len(), 3);
}

#[test]
fn test_available_and_execute() {
    let domain = blocks_domain();
    let state = initstate(&domain, &blocks_problem()).unwrap();
    let config = EngineConfig::default();

    let actions = available(&domain, &state, &config).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].term, pred("pickup", vec![Term::sym("a")]));

    let next = execute(&domain, &state, &actions[0], &config).unwrap();
    assert!(next.facts.contains(&pred("holding", vec![Term::sym("a")])));
    assert!(next.facts.contains(&pred("ontable", vec![Term::sym("b")])));
    assert!(!next.facts.contains(&Term::sym("handempty")));
    assert!(!next.facts.contains(&pred("ontable", vec![Term::sym("a")])));
}

#[test]
fn test_derived_predicate_via_resolver() {
    let domain = blocks_domain();
    let mut problem = Problem::new("tower3", "blocksworld");
    problem.declare_object("a", "block");
    problem.declare_object("b", "block");
    problem.declare_object("c", "block");
    problem.add_init(pred("on", vec![Term::sym("a"), Term::sym("b")]));
    problem.add_init(pred("on", vec![Term::sym("b"), Term::sym("c")]));
    let state = initstate(&domain, &problem).unwrap();
    let config = EngineConfig::default();

    let sols = satisfiers(
        &domain,
        &state,
        &[pred("above", vec![Term::sym("a"), Term::var("y")])],
        &config,
    )
    .unwrap();
    let bindings: Vec<_> = sols
        .iter()
        .map(|s| s.get(&Variable::new("y")).unwrap().clone())
        .collect();
    assert_eq!(bindings, vec![Term::sym("b"), Term::sym("c")]);

    // satisfy and satisfiers agree on ground queries
    let above_ac = pred("above", vec![Term::sym("a"), Term::sym("c")]);
    assert!(satisfy(&domain, &state, &[above_ac.clone()], &config).unwrap());
    assert!(!satisfiers(&domain, &state, &[above_ac], &config)
        .unwrap()
        .is_empty());
    let above_ca = pred("above", vec![Term::sym("c"), Term::sym("a")]);
    assert!(!satisfy(&domain, &state, &[above_ca.clone()], &config).unwrap());
    assert!(satisfiers(&domain, &state, &[above_ca], &config)
        .unwrap()
        .is_empty());
}

#[test]
fn test_numeric_fluent_accumulates() {
    let domain = blocks_domain();
    let state = initstate(&domain, &blocks_problem()).unwrap();
    let config = EngineConfig::default();

    // pickup(a), putdown(a), pickup(a): the cost increases by 3 per pickup
    let s1 = transition(&domain, &state, &pred("pickup", vec![Term::sym("a")]), &config).unwrap();
    let s2 = transition(&domain, &s1, &pred("putdown", vec![Term::sym("a")]), &config).unwrap();
    let s3 = transition(&domain, &s2, &pred("pickup", vec![Term::sym("a")]), &config).unwrap();

    assert_eq!(
        planatlas::evaluate(&domain, &s3, &Term::sym("total-cost")).unwrap(),
        Value::num(6.0)
    );
    assert!(satisfy(
        &domain,
        &s3,
        &[Term::compound(
            ">=",
            vec![Term::sym("total-cost"), Term::num(6.0)]
        )],
        &config
    )
    .unwrap());
}

#[test]
fn test_transition_equals_group_lookup_execute() {
    let domain = blocks_domain();
    let state = initstate(&domain, &blocks_problem()).unwrap();
    let config = EngineConfig::default();

    let schema = domain.actions.get("pickup").unwrap();
    let group = ground(&domain, &state, schema, &config).unwrap();
    let term = pred("pickup", vec![Term::sym("a")]);

    let via_lookup = execute(&domain, &state, group.get(&term).unwrap(), &config).unwrap();
    let via_transition = transition(&domain, &state, &term, &config).unwrap();
    assert_eq!(via_lookup, via_transition);
}

#[test]
fn test_fact_order_does_not_matter() {
    let domain = blocks_domain();
    let config = EngineConfig::default();

    let mut shuffled = Problem::new("tower", "blocksworld");
    shuffled.declare_object("a", "block");
    shuffled.declare_object("b", "block");
    shuffled.add_init(Term::sym("handempty"));
    shuffled.add_init(pred("ontable", vec![Term::sym("b")]));
    shuffled.add_init(pred("ontable", vec![Term::sym("a")]));
    shuffled.add_init(pred("clear", vec![Term::sym("a")]));
    shuffled.add_init(Term::compound(
        "=",
        vec![Term::sym("total-cost"), Term::num(0.0)],
    ));

    let s1 = initstate(&domain, &blocks_problem()).unwrap();
    let s2 = initstate(&domain, &shuffled).unwrap();
    assert_eq!(s1, s2);

    // grounding order follows object declaration, not fact insertion
    let g1 = groundactions(&domain, &s1, None, &config).unwrap();
    let g2 = groundactions(&domain, &s2, None, &config).unwrap();
    let terms1: Vec<_> = g1.iter().map(|a| a.term.clone()).collect();
    let terms2: Vec<_> = g2.iter().map(|a| a.term.clone()).collect();
    assert_eq!(terms1, terms2);
}

#[test]
fn test_effect_idempotence_for_adds() {
    let domain = blocks_domain();
    let state = initstate(&domain, &blocks_problem()).unwrap();
    let config = EngineConfig::default();

    let actions = available(&domain, &state, &config).unwrap();
    let once = execute(&domain, &state, &actions[0], &config).unwrap();
    let twice = execute(&domain, &once, &actions[0], &config).unwrap();
    assert_eq!(once.facts, twice.facts);
}

#[test]
fn test_relevant_for_goal() {
    let domain = blocks_domain();
    let problem = blocks_problem();
    let state = initstate(&domain, &problem).unwrap();
    let goal = goalstate(&domain, &problem).unwrap();
    let config = EngineConfig::default();

    let actions = relevant(&domain, &state, &goal, &config).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].term, pred("pickup", vec![Term::sym("a")]));
}

#[test]
fn test_domain_serialization_roundtrip() {
    let domain = blocks_domain();
    let encoded = serde_json::to_string(&domain).unwrap();
    let decoded: Domain = serde_json::from_str(&encoded).unwrap();
    assert_eq!(domain, decoded);

    let term = pred("on", vec![Term::sym("a"), Term::var("x")]);
    let encoded = serde_json::to_string(&term).unwrap();
    let decoded: Term = serde_json::from_str(&encoded).unwrap();
    assert_eq!(term, decoded);

    let problem = blocks_problem();
    let encoded = serde_json::to_string(&problem).unwrap();
    let decoded: Problem = serde_json::from_str(&encoded).unwrap();
    assert_eq!(problem, decoded);
    assert_eq!(
        decoded.metric,
        Some(Metric::Minimize(Term::sym("total-cost")))
    );
}
