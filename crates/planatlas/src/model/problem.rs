//! Problem instances and state construction

use super::domain::Domain;
use super::state::State;
use crate::error::{EngineError, Result};
use crate::logic::{Term, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Optimisation metric carried by a problem; the core only stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Minimize(Term),
    Maximize(Term),
}

/// A problem instance: objects, initial fluents, and a goal
///
/// `init` holds ground atoms plus `=(fluent, value)` assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    pub domain: String,
    pub objects: IndexMap<String, String>,
    pub init: Vec<Term>,
    pub goal: Term,
    pub metric: Option<Metric>,
}

impl Problem {
    pub fn new(name: &str, domain: &str) -> Self {
        Problem {
            name: name.to_string(),
            domain: domain.to_string(),
            objects: IndexMap::new(),
            init: Vec::new(),
            goal: Term::boolean(true),
            metric: None,
        }
    }

    pub fn declare_object(&mut self, name: &str, objtype: &str) {
        self.objects.insert(name.to_string(), objtype.to_string());
    }

    pub fn add_init(&mut self, term: Term) {
        self.init.push(term);
    }

    pub fn set_goal(&mut self, goal: Term) {
        self.goal = goal;
    }
}

/// Build the initial state of a problem, validating typing and the
/// fact/value separation
pub fn initstate(domain: &Domain, problem: &Problem) -> Result<State> {
    let mut state = State::new();
    for (obj, objtype) in &problem.objects {
        if !domain.is_type(objtype) {
            return Err(EngineError::IllFormedState(format!(
                "object {} has undeclared type {}",
                obj, objtype
            )));
        }
        state.declare_object(obj, objtype);
    }

    for entry in &problem.init {
        if !entry.is_ground() {
            return Err(EngineError::IllFormedState(format!(
                "non-ground init entry {}",
                entry
            )));
        }
        match entry {
            Term::Compound(name, args) if name == "=" && args.len() == 2 => {
                let value = args[1].as_value().cloned().ok_or_else(|| {
                    EngineError::IllFormedState(format!(
                        "init assignment to non-literal value {}",
                        entry
                    ))
                })?;
                check_signature(domain, &state, &args[0])?;
                state.set_fluent(value, &args[0])?;
            }
            _ => {
                check_signature(domain, &state, entry)?;
                state.set_fluent(Value::Bool(true), entry)?;
            }
        }
    }
    Ok(state)
}

/// Build the goal as a partial state: the fluents it lists are required
///
/// Accepts conjunctions of positive atoms and fluent equalities; other
/// connectives have no partial-state reading.
pub fn goalstate(domain: &Domain, problem: &Problem) -> Result<State> {
    let mut state = State::new();
    for (obj, objtype) in &problem.objects {
        state.declare_object(obj, objtype);
    }
    collect_goal(domain, &mut state, &problem.goal)?;
    Ok(state)
}

fn collect_goal(domain: &Domain, state: &mut State, goal: &Term) -> Result<()> {
    match goal {
        Term::Const(Value::Bool(true)) => Ok(()),
        Term::Compound(name, args) if name == "and" => {
            for arg in args {
                collect_goal(domain, state, arg)?;
            }
            Ok(())
        }
        Term::Compound(name, args) if name == "=" && args.len() == 2 => {
            let value = args[1].as_value().cloned().ok_or_else(|| {
                EngineError::MalformedFormula(format!("goal equality on non-literal {}", goal))
            })?;
            state.set_fluent(value, &args[0])
        }
        Term::Compound(name, _)
            if !crate::logic::is_connective(name) && !crate::logic::is_quantifier(name) =>
        {
            state.set_fluent(Value::Bool(true), goal)
        }
        Term::Const(Value::Sym(_)) => state.set_fluent(Value::Bool(true), goal),
        _ => Err(EngineError::MalformedFormula(format!(
            "goal {} has no partial-state reading",
            goal
        ))),
    }
}

/// Check an init atom against the domain signature: known symbol, right
/// arity, declared and correctly typed object arguments
fn check_signature(domain: &Domain, state: &State, term: &Term) -> Result<()> {
    let name = term.name().ok_or_else(|| {
        EngineError::IllFormedState(format!("init entry {} is not a fluent", term))
    })?;
    let sig = domain
        .signature(name)
        .ok_or_else(|| EngineError::UnknownSymbol(name.to_string()))?;
    let args = term.args();
    if args.len() != sig.arity() {
        return Err(EngineError::Arity {
            symbol: name.to_string(),
            expected: sig.arity(),
            got: args.len(),
        });
    }
    let objtypes = state.get_objtypes();
    for (arg, argtype) in args.iter().zip(sig.argtypes.iter()) {
        let Some(Value::Sym(obj)) = arg.as_value() else {
            continue;
        };
        let actual = objtypes
            .get(obj)
            .or_else(|| domain.constants.get(obj))
            .ok_or_else(|| EngineError::IllFormedState(format!("unknown object {}", obj)))?;
        if !domain.all_subtypes(argtype).contains(actual) {
            return Err(EngineError::IllFormedState(format!(
                "object {} of type {} used where {} expected",
                obj, actual, argtype
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::domain::Signature;

    fn blocks_domain() -> Domain {
        let mut domain = Domain::new("blocksworld");
        domain.declare_type("block");
        domain.add_predicate(Signature::new("on", &[("x", "block"), ("y", "block")]));
        domain.add_predicate(Signature::new("clear", &[("x", "block")]));
        domain.add_function(Signature::new("total-cost", &[]));
        domain
    }

    #[test]
    fn test_initstate() {
        let domain = blocks_domain();
        let mut problem = Problem::new("p1", "blocksworld");
        problem.declare_object("a", "block");
        problem.declare_object("b", "block");
        problem.add_init(Term::compound("on", vec![Term::sym("a"), Term::sym("b")]));
        problem.add_init(Term::compound(
            "=",
            vec![Term::sym("total-cost"), Term::num(0.0)],
        ));

        let state = initstate(&domain, &problem).unwrap();
        assert!(state.facts.contains(&Term::compound(
            "on",
            vec![Term::sym("a"), Term::sym("b")]
        )));
        assert_eq!(
            state.get_fluent(&Term::sym("total-cost")),
            Value::num(0.0)
        );
        assert_eq!(state.get_objects(Some("block")).len(), 2);
    }

    #[test]
    fn test_initstate_rejects_unknown_object() {
        let domain = blocks_domain();
        let mut problem = Problem::new("p1", "blocksworld");
        problem.declare_object("a", "block");
        problem.add_init(Term::compound("on", vec![Term::sym("a"), Term::sym("z")]));
        assert!(matches!(
            initstate(&domain, &problem),
            Err(EngineError::IllFormedState(_))
        ));
    }

    #[test]
    fn test_initstate_rejects_unknown_predicate() {
        let domain = blocks_domain();
        let mut problem = Problem::new("p1", "blocksworld");
        problem.declare_object("a", "block");
        problem.add_init(Term::compound("under", vec![Term::sym("a"), Term::sym("a")]));
        assert!(matches!(
            initstate(&domain, &problem),
            Err(EngineError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_goalstate() {
        let domain = blocks_domain();
        let mut problem = Problem::new("p1", "blocksworld");
        problem.declare_object("a", "block");
        problem.declare_object("b", "block");
        problem.set_goal(Term::compound(
            "and",
            vec![
                Term::compound("on", vec![Term::sym("a"), Term::sym("b")]),
                Term::compound("=", vec![Term::sym("total-cost"), Term::num(2.0)]),
            ],
        ));

        let goal = goalstate(&domain, &problem).unwrap();
        assert_eq!(goal.facts.len(), 1);
        assert_eq!(
            goal.get_fluent(&Term::sym("total-cost")),
            Value::num(2.0)
        );
    }

    #[test]
    fn test_goalstate_rejects_negation() {
        let domain = blocks_domain();
        let mut problem = Problem::new("p1", "blocksworld");
        problem.set_goal(Term::compound(
            "not",
            vec![Term::compound("clear", vec![Term::sym("a")])],
        ));
        assert!(matches!(
            goalstate(&domain, &problem),
            Err(EngineError::MalformedFormula(_))
        ));
    }
}
