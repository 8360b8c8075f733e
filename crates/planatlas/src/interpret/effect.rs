//! Effect diffs and their application
//!
//! An effect term is converted into a structured diff (additions,
//! deletions, numeric updates) once, and applied to states afterwards.
//! Deletes apply before adds, updates last; a same-atom add and delete
//! in one diff therefore leaves the atom present.

use super::eval::Evaluator;
use super::satisfy::satisfy;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ground::{clauses_to_term, CnfClause};
use crate::logic::{is_connective, is_quantifier, Term, Value};
use crate::model::{Domain, State};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    Assign,
    Increase,
    Decrease,
    ScaleUp,
    ScaleDown,
}

impl UpdateOp {
    pub fn from_name(name: &str) -> Option<UpdateOp> {
        match name {
            "assign" => Some(UpdateOp::Assign),
            "increase" => Some(UpdateOp::Increase),
            "decrease" => Some(UpdateOp::Decrease),
            "scale-up" => Some(UpdateOp::ScaleUp),
            "scale-down" => Some(UpdateOp::ScaleDown),
            _ => None,
        }
    }
}

/// A structured state change: atoms to add, atoms to delete, and an
/// ordered sequence of numeric updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub adds: IndexSet<Term>,
    pub dels: IndexSet<Term>,
    pub updates: Vec<(Term, UpdateOp, Term)>,
}

impl Diff {
    pub fn new() -> Self {
        Diff::default()
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.dels.is_empty() && self.updates.is_empty()
    }

    /// Accumulate another diff into this one
    pub fn merge(&mut self, other: Diff) {
        self.adds.extend(other.adds);
        self.dels.extend(other.dels);
        self.updates.extend(other.updates);
    }

    /// Apply the diff to a state in place: deletes, then adds, then
    /// updates in declaration order against the evolving state
    pub fn apply(&self, domain: &Domain, state: &mut State) -> Result<()> {
        for del in &self.dels {
            state.set_fluent(Value::Bool(false), del)?;
        }
        for add in &self.adds {
            state.set_fluent(Value::Bool(true), add)?;
        }
        for (target, op, expr) in &self.updates {
            let rhs = Evaluator::new(domain, state).evaluate(expr)?;
            let value = match op {
                UpdateOp::Assign => rhs,
                op => {
                    let old = state.get_fluent(target).as_num().ok_or_else(|| {
                        EngineError::TypeMismatch(format!(
                            "update of non-numeric fluent {}",
                            target
                        ))
                    })?;
                    let rhs = rhs.as_num().ok_or_else(|| {
                        EngineError::TypeMismatch(format!(
                            "non-numeric update value for {}",
                            target
                        ))
                    })?;
                    Value::num(match op {
                        UpdateOp::Increase => old + rhs,
                        UpdateOp::Decrease => old - rhs,
                        UpdateOp::ScaleUp => old * rhs,
                        _ => old / rhs,
                    })
                }
            };
            state.set_fluent(value, target)?;
        }
        Ok(())
    }
}

/// A diff with conditional branches
///
/// `base` always applies. Every branch whose condition holds in the
/// pre-application state contributes its diff; contributions are merged
/// (deletes before adds across all of them) with updates sequenced in
/// branch declaration order. The branch order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionalDiff {
    pub base: Diff,
    pub branches: Vec<(Vec<CnfClause>, Diff)>,
}

impl ConditionalDiff {
    /// Apply all branches whose conditions hold in the current state
    pub fn apply(&self, domain: &Domain, state: &mut State, config: &EngineConfig) -> Result<()> {
        let mut merged = self.base.clone();
        for (cond, diff) in &self.branches {
            if satisfy(domain, state, &[clauses_to_term(cond)], config)? {
                merged.merge(diff.clone());
            }
        }
        merged.apply(domain, state)
    }
}

/// Convert an effect term into a diff
///
/// `when` and quantifiers must have been flattened away before this
/// point; encountering one here is an error.
pub fn effect_diff(domain: &Domain, state: &State, effect: &Term) -> Result<Diff> {
    let mut diff = Diff::new();
    collect_effect(domain, state, effect, &mut diff)?;
    Ok(diff)
}

fn collect_effect(domain: &Domain, state: &State, effect: &Term, diff: &mut Diff) -> Result<()> {
    match effect {
        Term::Const(Value::Bool(true)) => Ok(()),
        Term::Const(Value::Sym(_)) => {
            diff.adds.insert(effect.clone());
            Ok(())
        }
        Term::Compound(name, args) => match name.as_str() {
            "and" => {
                for arg in args {
                    collect_effect(domain, state, arg, diff)?;
                }
                Ok(())
            }
            "not" => {
                if args.len() != 1 {
                    return Err(EngineError::Arity {
                        symbol: name.clone(),
                        expected: 1,
                        got: args.len(),
                    });
                }
                match &args[0] {
                    Term::Compound(inner, _) if inner == "not" => Err(
                        EngineError::MalformedEffect(format!("double negation {}", effect)),
                    ),
                    Term::Compound(inner, _) if is_connective(inner) || is_quantifier(inner) => {
                        Err(EngineError::MalformedEffect(format!(
                            "negated connective {}",
                            effect
                        )))
                    }
                    atom => {
                        diff.dels.insert(atom.clone());
                        Ok(())
                    }
                }
            }
            _ if UpdateOp::from_name(name).is_some() => {
                if args.len() != 2 {
                    return Err(EngineError::Arity {
                        symbol: name.clone(),
                        expected: 2,
                        got: args.len(),
                    });
                }
                let op = UpdateOp::from_name(name).unwrap_or(UpdateOp::Assign);
                let expr = fold_expr(domain, state, &args[1])?;
                diff.updates.push((args[0].clone(), op, expr));
                Ok(())
            }
            "when" | "forall" | "exists" | "or" | "imply" => Err(EngineError::MalformedEffect(
                format!("{} inside an effect body", name),
            )),
            _ => {
                diff.adds.insert(effect.clone());
                Ok(())
            }
        },
        _ => Err(EngineError::MalformedEffect(format!(
            "{} cannot appear in an effect",
            effect
        ))),
    }
}

/// Constant-fold a pure arithmetic update expression; expressions that
/// mention fluents stay symbolic and are evaluated at application time
fn fold_expr(domain: &Domain, state: &State, expr: &Term) -> Result<Term> {
    if pure_arithmetic(expr) {
        Ok(Term::Const(Evaluator::new(domain, state).evaluate(expr)?))
    } else {
        Ok(expr.clone())
    }
}

fn pure_arithmetic(expr: &Term) -> bool {
    match expr {
        Term::Const(Value::Num(_)) => true,
        Term::Compound(name, args) => {
            matches!(name.as_str(), "+" | "-" | "*" | "/") && args.iter().all(pure_arithmetic)
        }
        _ => false,
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{{")?;
        for (i, t) in self.adds.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "}} -{{")?;
        for (i, t) in self.dels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "}}")?;
        for (target, op, expr) in &self.updates {
            write!(f, " {:?}({},{})", op, target, expr)?;
        }
        Ok(())
    }
}
