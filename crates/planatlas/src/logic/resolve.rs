//! SLD resolution over Horn clauses
//!
//! Goals are tried left-to-right, clauses in knowledge-base order, and
//! the search is depth-first over an explicit work stack so recursion
//! depth is bounded by configuration rather than the call stack.

use super::clause::Clause;
use super::substitution::Substitution;
use super::term::{is_quantifier, Term, Value, Variable};
use super::unify::unify;
use crate::error::{EngineError, Result};
use std::collections::HashSet;

/// Whether to stop at the first solution or enumerate all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Any,
    All,
}

/// A table of evaluable function symbols consulted for built-in goals
///
/// When a goal's symbol is known to the source, the resolver evaluates
/// the goal instead of resolving it against the knowledge base; the
/// boolean result drives success.
pub trait FuncSource {
    fn is_func(&self, name: &str) -> bool;

    /// Evaluate a function application over already-substituted arguments
    fn call(&self, name: &str, args: &[Term]) -> Result<Value>;
}

/// A function source with no entries, for purely symbolic resolution
pub struct NoFuncs;

impl FuncSource for NoFuncs {
    fn is_func(&self, _name: &str) -> bool {
        false
    }

    fn call(&self, name: &str, _args: &[Term]) -> Result<Value> {
        Err(EngineError::UnknownSymbol(name.to_string()))
    }
}

/// A choice point: remaining goals, bindings so far, resolution depth
struct Frame {
    goals: Vec<Term>,
    subst: Substitution,
    depth: usize,
}

/// Resolve a conjunction of goals against a knowledge base
///
/// Returns the substitutions satisfying the conjunction, projected onto
/// the variables of the query and de-duplicated in derivation order.
/// `max_depth` bounds the number of clause-resolution steps along any
/// branch; 0 means no bound.
pub fn resolve(
    goals: &[Term],
    kb: &[Clause],
    funcs: &dyn FuncSource,
    mode: ResolveMode,
    max_depth: usize,
) -> Result<Vec<Substitution>> {
    let mut fresh = 0usize;
    resolve_inner(goals, kb, funcs, mode, max_depth, &mut fresh)
}

// The fresh-variable counter is shared with nested negation-as-failure
// calls so a renamed clause can never capture a free variable that an
// outer rename introduced.
fn resolve_inner(
    goals: &[Term],
    kb: &[Clause],
    funcs: &dyn FuncSource,
    mode: ResolveMode,
    max_depth: usize,
    fresh: &mut usize,
) -> Result<Vec<Substitution>> {
    let mut query_vars = HashSet::new();
    for goal in goals {
        goal.collect_variables(&mut query_vars);
    }

    let mut solutions: Vec<Substitution> = Vec::new();
    let mut stack = vec![Frame {
        goals: goals.to_vec(),
        subst: Substitution::new(),
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        let Frame {
            mut goals,
            subst,
            depth,
        } = frame;

        if goals.is_empty() {
            let solution = subst.restrict(&query_vars);
            if !solutions.contains(&solution) {
                solutions.push(solution);
                if mode == ResolveMode::Any {
                    return Ok(solutions);
                }
            }
            continue;
        }

        let goal = goals.remove(0).substitute(&subst);
        match goal {
            Term::Const(Value::Bool(true)) => {
                stack.push(Frame {
                    goals,
                    subst,
                    depth,
                });
            }
            Term::Const(Value::Bool(false)) => {}
            Term::Const(Value::Num(_)) => {
                return Err(EngineError::MalformedFormula(format!(
                    "numeric literal as goal: {}",
                    goal
                )))
            }
            Term::Var(v) => {
                return Err(EngineError::MalformedFormula(format!(
                    "unbound variable as goal: ?{}",
                    v.name
                )))
            }
            Term::Compound(ref name, ref args) if name == "and" => {
                let mut spliced = args.clone();
                spliced.extend(goals);
                stack.push(Frame {
                    goals: spliced,
                    subst,
                    depth,
                });
            }
            Term::Compound(ref name, ref args) if name == "or" => {
                for arg in args.iter().rev() {
                    let mut alternative = vec![arg.clone()];
                    alternative.extend(goals.iter().cloned());
                    stack.push(Frame {
                        goals: alternative,
                        subst: subst.clone(),
                        depth,
                    });
                }
            }
            Term::Compound(ref name, ref args) if name == "imply" => {
                expect_arity(name, args, 2)?;
                let rewritten = Term::compound(
                    "or",
                    vec![Term::compound("not", vec![args[0].clone()]), args[1].clone()],
                );
                let mut spliced = vec![rewritten];
                spliced.extend(goals);
                stack.push(Frame {
                    goals: spliced,
                    subst,
                    depth,
                });
            }
            Term::Compound(ref name, ref args) if name == "not" => {
                expect_arity(name, args, 1)?;
                // Negation as failure: succeed when the inner goal has no
                // solution under the current bindings
                let inner = resolve_inner(
                    &[args[0].clone()],
                    kb,
                    funcs,
                    ResolveMode::Any,
                    max_depth,
                    fresh,
                )?;
                if inner.is_empty() {
                    stack.push(Frame {
                        goals,
                        subst,
                        depth,
                    });
                }
            }
            Term::Compound(ref name, ref args) if is_quantifier(name) => {
                expect_arity(name, args, 2)?;
                let rewritten = rewrite_quantifier(name, &args[0], &args[1], fresh)?;
                let mut spliced = vec![rewritten];
                spliced.extend(goals);
                stack.push(Frame {
                    goals: spliced,
                    subst,
                    depth,
                });
            }
            Term::Compound(ref name, ref args) if name == "=" => {
                expect_arity(name, args, 2)?;
                if goal.is_ground() {
                    let equal = if funcs.is_func(name) {
                        value_goal(funcs, name, args)?
                    } else {
                        args[0] == args[1]
                    };
                    if equal {
                        stack.push(Frame {
                            goals,
                            subst,
                            depth,
                        });
                    }
                } else if let Some(mgu) = unify(&args[0], &args[1]) {
                    stack.push(Frame {
                        goals,
                        subst: subst.compose(&mgu),
                        depth,
                    });
                }
            }
            Term::Compound(ref name, ref args) if funcs.is_func(name) => {
                if value_goal(funcs, name, args)? {
                    stack.push(Frame {
                        goals,
                        subst,
                        depth,
                    });
                }
            }
            _ => {
                if max_depth > 0 && depth + 1 > max_depth {
                    log::trace!("resolution depth limit {} reached at {}", max_depth, goal);
                    return Err(EngineError::ResolverLimit(max_depth));
                }
                let mut branches = Vec::new();
                for clause in kb {
                    if clause.head.name() != goal.name()
                        || clause.head.arity() != goal.arity()
                    {
                        continue;
                    }
                    let renamed = clause.rename(*fresh);
                    *fresh += 1;
                    if let Some(mgu) = unify(&goal, &renamed.head) {
                        let mut new_goals = renamed.body;
                        new_goals.extend(goals.iter().cloned());
                        branches.push(Frame {
                            goals: new_goals,
                            subst: subst.compose(&mgu),
                            depth: depth + 1,
                        });
                    }
                }
                // Reverse so the first clause in knowledge-base order is
                // popped first
                for branch in branches.into_iter().rev() {
                    stack.push(branch);
                }
            }
        }
    }

    Ok(solutions)
}

fn expect_arity(name: &str, args: &[Term], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(EngineError::Arity {
            symbol: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Evaluate a built-in goal and require a boolean result
fn value_goal(funcs: &dyn FuncSource, name: &str, args: &[Term]) -> Result<bool> {
    match funcs.call(name, args)? {
        Value::Bool(b) => Ok(b),
        other => Err(EngineError::TypeMismatch(format!(
            "goal {} evaluated to non-boolean {}",
            name, other
        ))),
    }
}

/// Rewrite a quantified goal into quantifier-free form
///
/// `exists` becomes the conjunction of the typing goal and the body with
/// the quantified variables freshened; `forall` is the classical double
/// negation-as-failure of that conjunction.
fn rewrite_quantifier(name: &str, typed: &Term, body: &Term, fresh: &mut usize) -> Result<Term> {
    let mut bound = HashSet::new();
    typed.collect_variables(&mut bound);
    if bound.is_empty() {
        return Err(EngineError::MalformedFormula(format!(
            "quantifier without variables: {}({},{})",
            name, typed, body
        )));
    }
    let renaming = Substitution::from_pairs(bound.into_iter().map(|v: Variable| {
        let renamed = Term::var(&format!("{}#{}", v.name, *fresh));
        (v, renamed)
    }));
    *fresh += 1;
    let typed = typed.substitute(&renaming);
    let body = body.substitute(&renaming);

    Ok(match name {
        "exists" => Term::compound("and", vec![typed, body]),
        _ => Term::compound(
            "not",
            vec![Term::compound(
                "and",
                vec![typed, Term::compound("not", vec![body])],
            )],
        ),
    })
}
