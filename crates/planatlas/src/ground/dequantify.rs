//! Quantifier expansion over finite typed domains
//!
//! `forall`/`exists` over typed variables become the conjunction or
//! disjunction of the substituted bodies ranging over the declared
//! objects of those types.

use super::cnf::{and_fold, or_fold};
use super::typed_objects;
use crate::error::{EngineError, Result};
use crate::logic::{is_quantifier, Substitution, Term, Variable};
use crate::model::{Domain, State};
use itertools::Itertools;

/// Replace every quantifier in the term by its finite expansion
pub fn dequantify(domain: &Domain, state: &State, term: &Term) -> Result<Term> {
    match term {
        Term::Compound(name, args) if is_quantifier(name) => {
            if args.len() != 2 {
                return Err(EngineError::Arity {
                    symbol: name.clone(),
                    expected: 2,
                    got: args.len(),
                });
            }
            let bindings = parse_typing(&args[0])?;
            let body = dequantify(domain, state, &args[1])?;

            let object_lists: Vec<Vec<Term>> = bindings
                .iter()
                .map(|(_, objtype)| typed_objects(domain, state, objtype))
                .collect();
            let instances: Vec<Term> = object_lists
                .iter()
                .map(|objs| objs.iter())
                .multi_cartesian_product()
                .map(|combo| {
                    let subst = Substitution::from_pairs(
                        bindings
                            .iter()
                            .map(|(var, _)| var.clone())
                            .zip(combo.into_iter().cloned()),
                    );
                    body.substitute(&subst)
                })
                .collect();

            Ok(if name == "forall" {
                and_fold(instances)
            } else {
                or_fold(instances)
            })
        }
        Term::Compound(name, args) => {
            let expanded = args
                .iter()
                .map(|a| dequantify(domain, state, a))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::compound(name, expanded))
        }
        _ => Ok(term.clone()),
    }
}

/// Parse a quantifier's typing atom `type(?var)` or a conjunction of
/// such atoms
fn parse_typing(typing: &Term) -> Result<Vec<(Variable, String)>> {
    match typing {
        Term::Compound(name, args) if name == "and" => {
            let mut bindings = Vec::new();
            for arg in args {
                bindings.extend(parse_typing(arg)?);
            }
            Ok(bindings)
        }
        Term::Compound(name, args) if args.len() == 1 => match &args[0] {
            Term::Var(v) => Ok(vec![(v.clone(), name.clone())]),
            other => Err(EngineError::MalformedFormula(format!(
                "quantified over non-variable {}",
                other
            ))),
        },
        other => Err(EngineError::MalformedFormula(format!(
            "malformed quantifier typing {}",
            other
        ))),
    }
}
