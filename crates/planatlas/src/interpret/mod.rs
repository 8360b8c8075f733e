//! Interpretation: evaluation, satisfaction, effects, and the
//! top-level operations over ground actions

pub mod effect;
pub mod eval;
pub mod satisfy;

pub use crate::model::{goalstate, initstate};
pub use effect::{effect_diff, ConditionalDiff, Diff, UpdateOp};
pub use eval::{evaluate, Evaluator, FuncTable};
pub use satisfy::{check_term, satisfiers, satisfy, Truth};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ground::{
    clauses_to_term, ground_named_instance, groundactions, GroundAction, GroundEffect,
};
use crate::logic::{Term, Value};
use crate::model::{Domain, State};

/// Whether a ground action's preconditions hold in the state
pub fn applicable(
    domain: &Domain,
    state: &State,
    action: &GroundAction,
    config: &EngineConfig,
) -> Result<bool> {
    satisfy(domain, state, &[clauses_to_term(&action.preconds)], config)
}

/// Ground actions whose preconditions hold in the state
pub fn available(
    domain: &Domain,
    state: &State,
    config: &EngineConfig,
) -> Result<Vec<GroundAction>> {
    let mut actions = Vec::new();
    for action in groundactions(domain, state, None, config)? {
        if applicable(domain, state, &action, config)? {
            actions.push(action);
        }
    }
    Ok(actions)
}

/// Apply a ground action's diff, returning the successor state
pub fn execute(
    domain: &Domain,
    state: &State,
    action: &GroundAction,
    config: &EngineConfig,
) -> Result<State> {
    let mut next = state.clone();
    match &action.effect {
        GroundEffect::Simple(diff) => diff.apply(domain, &mut next)?,
        GroundEffect::Conditional(cond) => cond.apply(domain, &mut next, config)?,
    }
    Ok(next)
}

/// Resolve a ground action term against its schema, then execute it
pub fn transition(
    domain: &Domain,
    state: &State,
    action_term: &Term,
    config: &EngineConfig,
) -> Result<State> {
    let name = action_term.name().ok_or_else(|| {
        EngineError::MalformedFormula(format!("{} does not name an action", action_term))
    })?;
    let schema = domain
        .actions
        .get(name)
        .ok_or_else(|| EngineError::UnknownSymbol(name.to_string()))?;
    if action_term.arity() != schema.params.len() {
        return Err(EngineError::Arity {
            symbol: name.to_string(),
            expected: schema.params.len(),
            got: action_term.arity(),
        });
    }
    if !action_term.is_ground() {
        return Err(EngineError::MalformedFormula(format!(
            "cannot transition on non-ground {}",
            action_term
        )));
    }
    let action = ground_named_instance(domain, state, schema, action_term.args())?
        .ok_or_else(|| {
            EngineError::MalformedFormula(format!(
                "action {} has a statically unsatisfiable precondition",
                action_term
            ))
        })?;
    execute(domain, state, &action, config)
}

/// Ground actions whose effects intersect the goal's fluents
pub fn relevant(
    domain: &Domain,
    state: &State,
    goal: &State,
    config: &EngineConfig,
) -> Result<Vec<GroundAction>> {
    let mut actions = Vec::new();
    for action in groundactions(domain, state, None, config)? {
        let touches = match &action.effect {
            GroundEffect::Simple(diff) => diff_touches(diff, goal),
            GroundEffect::Conditional(cond) => {
                diff_touches(&cond.base, goal)
                    || cond.branches.iter().any(|(_, diff)| diff_touches(diff, goal))
            }
        };
        if touches {
            actions.push(action);
        }
    }
    Ok(actions)
}

fn diff_touches(diff: &Diff, goal: &State) -> bool {
    diff.adds.iter().any(|atom| goal.facts.contains(atom))
        || diff
            .updates
            .iter()
            .any(|(target, _, _)| goal.get_fluent(target) != Value::Bool(false))
}

/// Apply a ground action's regression: retract its additions and assert
/// the positive unit clauses of its precondition
pub fn regress(domain: &Domain, state: &State, action: &GroundAction) -> Result<State> {
    let GroundEffect::Simple(diff) = &action.effect else {
        return Err(EngineError::MalformedEffect(format!(
            "cannot regress conditional effect of {}",
            action.term
        )));
    };
    let mut prev = state.clone();
    for add in &diff.adds {
        prev.facts.shift_remove(add);
    }
    for clause in &action.preconds {
        if let [literal] = clause.as_slice() {
            let is_predicate = literal
                .name()
                .is_some_and(|name| domain.predicates.contains_key(name));
            if is_predicate {
                prev.set_fluent(Value::Bool(true), literal)?;
            }
        }
    }
    Ok(prev)
}
