//! Property tests for the term algebra and the state model

use planatlas::{unify, State, Substitution, Term, Value, Variable};
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(state: &State) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.hash(&mut hasher);
    hasher.finish()
}

fn var_strategy() -> impl Strategy<Value = Term> {
    prop_oneof![
        Just(Term::var("x")),
        Just(Term::var("y")),
        Just(Term::var("z")),
    ]
}

fn ground_leaf() -> impl Strategy<Value = Term> {
    prop_oneof![
        Just(Term::sym("a")),
        Just(Term::sym("b")),
        Just(Term::sym("c")),
        (-100i32..100).prop_map(|n| Term::num(n as f64)),
    ]
}

fn term_strategy() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![ground_leaf().boxed(), var_strategy().boxed()];
    leaf.prop_recursive(3, 24, 3, |inner| {
        (
            prop_oneof![Just("f"), Just("g"), Just("on")],
            prop::collection::vec(inner, 1..3),
        )
            .prop_map(|(name, args)| Term::compound(name, args))
    })
}

fn ground_term_strategy() -> impl Strategy<Value = Term> {
    ground_leaf().prop_recursive(3, 24, 3, |inner| {
        (
            prop_oneof![Just("f"), Just("g")],
            prop::collection::vec(inner, 1..3),
        )
            .prop_map(|(name, args)| Term::compound(name, args))
    })
}

fn subst_strategy() -> impl Strategy<Value = Substitution> {
    prop::collection::hash_map(
        prop_oneof![
            Just(Variable::new("x")),
            Just(Variable::new("y")),
            Just(Variable::new("z")),
        ],
        ground_term_strategy(),
        0..3,
    )
    .prop_map(Substitution::from_pairs)
}

fn atom_pool() -> Vec<Term> {
    let objects = [Term::sym("a"), Term::sym("b"), Term::sym("c")];
    let mut atoms = vec![Term::sym("handempty")];
    for x in &objects {
        atoms.push(Term::compound("clear", vec![x.clone()]));
        atoms.push(Term::compound("ontable", vec![x.clone()]));
        for y in &objects {
            atoms.push(Term::compound("on", vec![x.clone(), y.clone()]));
        }
    }
    atoms
}

proptest! {
    #[test]
    fn empty_substitution_is_identity(term in term_strategy()) {
        prop_assert_eq!(term.substitute(&Substitution::new()), term);
    }

    #[test]
    fn substitution_grounds_exactly_its_variables(
        term in term_strategy(),
        subst in subst_strategy(),
    ) {
        let substituted = term.substitute(&subst);
        for var in substituted.variables() {
            prop_assert!(!subst.contains(&var));
        }
    }

    #[test]
    fn compose_matches_sequential_application(
        term in term_strategy(),
        s1 in subst_strategy(),
        s2 in subst_strategy(),
    ) {
        let sequential = term.substitute(&s1).substitute(&s2);
        let composed = term.substitute(&s1.compose(&s2));
        prop_assert_eq!(sequential, composed);
    }

    #[test]
    fn unification_is_reflexive(term in term_strategy()) {
        prop_assert!(unify(&term, &term).is_some());
    }

    #[test]
    fn unifier_matches_ground_instance(t1 in term_strategy(), t2 in ground_term_strategy()) {
        if let Some(mgu) = unify(&t1, &t2) {
            prop_assert_eq!(t1.substitute(&mgu), t2);
        }
    }

    #[test]
    fn state_copy_roundtrip(selection in prop::collection::vec(0usize..16, 0..16)) {
        let pool = atom_pool();
        let mut state = State::new();
        state.declare_object("a", "block");
        state.declare_object("b", "block");
        state.declare_object("c", "block");
        for idx in &selection {
            state.set_fluent(Value::Bool(true), &pool[*idx]).unwrap();
        }
        state.set_fluent(Value::num(selection.len() as f64), &Term::sym("total-cost")).unwrap();

        let copy = state.clone();
        prop_assert_eq!(&copy, &state);
        prop_assert_eq!(hash_of(&copy), hash_of(&state));
    }

    #[test]
    fn state_ignores_insertion_order(selection in prop::collection::vec(0usize..16, 0..16)) {
        let pool = atom_pool();
        let mut forward = State::new();
        let mut backward = State::new();
        for idx in &selection {
            forward.set_fluent(Value::Bool(true), &pool[*idx]).unwrap();
        }
        for idx in selection.iter().rev() {
            backward.set_fluent(Value::Bool(true), &pool[*idx]).unwrap();
        }
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(hash_of(&forward), hash_of(&backward));
    }
}
