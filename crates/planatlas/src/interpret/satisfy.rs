//! Satisfaction queries: a three-valued fast path with SLD fallback
//!
//! `check_term` decides a query by direct lookup wherever it can and
//! answers `Unknown` for anything that needs search (quantifiers, free
//! variables, derived predicates). `satisfy` only invokes the resolver
//! when the fast path was inconclusive.

use super::eval::Evaluator;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ground::dequantify;
use crate::logic::{is_quantifier, resolve, Clause, ResolveMode, Substitution, Term, Value};
use crate::model::{Domain, State};
use std::fmt;

/// Three-valued truth with Kleene connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }

    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    pub fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::True => write!(f, "true"),
            Truth::False => write!(f, "false"),
            Truth::Unknown => write!(f, "unknown"),
        }
    }
}

/// Decide a query by direct lookup where possible
pub fn check_term(domain: &Domain, state: &State, term: &Term) -> Result<Truth> {
    match term {
        Term::Var(_) => Ok(Truth::Unknown),
        Term::Const(Value::Bool(b)) => Ok(Truth::from_bool(*b)),
        Term::Const(Value::Num(_)) => Err(EngineError::MalformedFormula(format!(
            "numeric literal as proposition: {}",
            term
        ))),
        Term::Const(Value::Sym(name)) => {
            if state.facts.contains(term) {
                Ok(Truth::True)
            } else if domain.is_func(name) || domain.is_derived(name) {
                Ok(Truth::Unknown)
            } else {
                Ok(Truth::False)
            }
        }
        Term::Compound(name, args) => match name.as_str() {
            "and" => {
                let mut acc = Truth::True;
                for arg in args {
                    acc = acc.and(check_term(domain, state, arg)?);
                    if acc == Truth::False {
                        break;
                    }
                }
                Ok(acc)
            }
            "or" => {
                let mut acc = Truth::False;
                for arg in args {
                    acc = acc.or(check_term(domain, state, arg)?);
                    if acc == Truth::True {
                        break;
                    }
                }
                Ok(acc)
            }
            "imply" => {
                expect_arity(name, args, 2)?;
                let a = check_term(domain, state, &args[0])?;
                let b = check_term(domain, state, &args[1])?;
                Ok(a.negate().or(b))
            }
            "not" => {
                expect_arity(name, args, 1)?;
                Ok(check_term(domain, state, &args[0])?.negate())
            }
            _ if is_quantifier(name) => Ok(Truth::Unknown),
            _ if !term.is_ground() => Ok(Truth::Unknown),
            _ if domain.is_derived(name) => Ok(Truth::Unknown),
            _ if domain.is_type(name) => {
                expect_arity(name, args, 1)?;
                if domain.has_subtypes(name) {
                    return Ok(Truth::Unknown);
                }
                let declared_constant = args[0]
                    .as_value()
                    .and_then(Value::as_sym)
                    .and_then(|obj| domain.constants.get(obj))
                    .is_some_and(|t| t == name);
                Ok(Truth::from_bool(
                    declared_constant || state.types.contains(term),
                ))
            }
            _ if is_evaluable(domain, name) => {
                match Evaluator::new(domain, state).evaluate(term)? {
                    Value::Bool(b) => Ok(Truth::from_bool(b)),
                    other => Err(EngineError::TypeMismatch(format!(
                        "proposition {} evaluated to {}",
                        term, other
                    ))),
                }
            }
            _ => {
                if domain.predicates.get(name).is_none() {
                    return Err(EngineError::UnknownSymbol(name.to_string()));
                }
                let reduced = partial_eval(domain, state, term)?;
                Ok(Truth::from_bool(state.facts.contains(&reduced)))
            }
        },
    }
}

fn is_evaluable(domain: &Domain, name: &str) -> bool {
    matches!(name, "=" | "!=" | "<" | "<=" | ">" | ">=" | "+" | "-" | "*" | "/")
        || domain.is_func(name)
}

/// Reduce any ground, evaluable function arguments to their values and
/// leave everything else unchanged
fn partial_eval(domain: &Domain, state: &State, term: &Term) -> Result<Term> {
    let Term::Compound(name, args) = term else {
        return Ok(term.clone());
    };
    let evaluator = Evaluator::new(domain, state);
    let reduced = args
        .iter()
        .map(|arg| match arg {
            Term::Compound(inner, _) if arg.is_ground() && is_evaluable(domain, inner) => {
                Ok(Term::Const(evaluator.evaluate(arg)?))
            }
            _ => Ok(arg.clone()),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Term::compound(name, reduced))
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

/// Whether the conjunction of `terms` holds in `state`
pub fn satisfy(
    domain: &Domain,
    state: &State,
    terms: &[Term],
    config: &EngineConfig,
) -> Result<bool> {
    let mut inconclusive = false;
    for term in terms {
        match check_term(domain, state, term)? {
            Truth::False => return Ok(false),
            Truth::Unknown => inconclusive = true,
            Truth::True => {}
        }
    }
    if !inconclusive {
        return Ok(true);
    }
    Ok(!satisfiers(domain, state, terms, config)?.is_empty())
}

/// Enumerate the substitutions under which the conjunction holds
///
/// The knowledge base is the domain's clauses plus the state's typing
/// atoms and facts; the function table is the built-ins merged with the
/// state values and the domain's function definitions.
pub fn satisfiers(
    domain: &Domain,
    state: &State,
    terms: &[Term],
    config: &EngineConfig,
) -> Result<Vec<Substitution>> {
    let mut kb = domain.get_clauses();
    kb.extend(state.types.iter().cloned().map(Clause::fact));
    kb.extend(state.facts.iter().cloned().map(Clause::fact));

    let goals = if config.dequantify_eagerly {
        terms
            .iter()
            .map(|t| dequantify(domain, state, t))
            .collect::<Result<Vec<_>>>()?
    } else {
        terms.to_vec()
    };

    let evaluator = Evaluator::new(domain, state);
    resolve(
        &goals,
        &kb,
        &evaluator,
        ResolveMode::All,
        config.resolver_max_depth,
    )
}
