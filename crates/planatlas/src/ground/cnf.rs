//! Conversion of quantifier-free formulas to conjunctive normal form

use crate::error::{EngineError, Result};
use crate::logic::{is_quantifier, Term, Value};

/// One disjunctive clause: literals are atoms or `not(atom)`
pub type CnfClause = Vec<Term>;

/// Convert a quantifier-free formula to a CNF clause list
///
/// An empty list is `⊤`; a list containing an empty clause is `⊥`.
pub fn to_cnf(term: &Term) -> Result<Vec<CnfClause>> {
    let nnf = to_nnf(term, false)?;
    Ok(distribute(&nnf))
}

/// Whether a clause list contains an unsatisfiable (empty) clause
pub fn clauses_falsified(clauses: &[CnfClause]) -> bool {
    clauses.iter().any(|clause| clause.is_empty())
}

/// Rebuild a clause list as a single conjunction-of-disjunctions term
pub fn clauses_to_term(clauses: &[CnfClause]) -> Term {
    let conjuncts: Vec<Term> = clauses
        .iter()
        .map(|clause| match clause.len() {
            0 => Term::boolean(false),
            1 => clause[0].clone(),
            _ => Term::compound("or", clause.clone()),
        })
        .collect();
    match conjuncts.len() {
        0 => Term::boolean(true),
        1 => conjuncts.into_iter().next().unwrap_or_else(|| Term::boolean(true)),
        _ => Term::compound("and", conjuncts),
    }
}

/// Negation normal form: eliminate `imply`, push `not` down to atoms,
/// fold boolean constants
fn to_nnf(term: &Term, negate: bool) -> Result<Term> {
    match term {
        Term::Const(Value::Bool(b)) => Ok(Term::boolean(b ^ negate)),
        Term::Compound(name, args) => match name.as_str() {
            "and" => {
                let parts = args
                    .iter()
                    .map(|a| to_nnf(a, negate))
                    .collect::<Result<Vec<_>>>()?;
                Ok(if negate {
                    or_fold(parts)
                } else {
                    and_fold(parts)
                })
            }
            "or" => {
                let parts = args
                    .iter()
                    .map(|a| to_nnf(a, negate))
                    .collect::<Result<Vec<_>>>()?;
                Ok(if negate {
                    and_fold(parts)
                } else {
                    or_fold(parts)
                })
            }
            "not" if args.len() == 1 => to_nnf(&args[0], !negate),
            "imply" if args.len() == 2 => {
                if negate {
                    // not(imply(a,b)) is and(a, not(b))
                    Ok(and_fold(vec![
                        to_nnf(&args[0], false)?,
                        to_nnf(&args[1], true)?,
                    ]))
                } else {
                    Ok(or_fold(vec![
                        to_nnf(&args[0], true)?,
                        to_nnf(&args[1], false)?,
                    ]))
                }
            }
            _ if is_quantifier(name) || name == "when" => Err(EngineError::MalformedFormula(
                format!("{} must be expanded before normalisation", name),
            )),
            _ => Ok(literal(term.clone(), negate)),
        },
        _ => Ok(literal(term.clone(), negate)),
    }
}

fn literal(atom: Term, negate: bool) -> Term {
    if negate {
        Term::compound("not", vec![atom])
    } else {
        atom
    }
}

/// Conjunction with constant folding
pub(crate) fn and_fold(parts: Vec<Term>) -> Term {
    let mut flat = Vec::new();
    for part in parts {
        if part.is_boolean(false) {
            return Term::boolean(false);
        }
        if part.is_boolean(true) {
            continue;
        }
        match part {
            Term::Compound(ref name, ref args) if name == "and" => flat.extend(args.clone()),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Term::boolean(true),
        1 => flat.into_iter().next().unwrap_or_else(|| Term::boolean(true)),
        _ => Term::compound("and", flat),
    }
}

/// Disjunction with constant folding
pub(crate) fn or_fold(parts: Vec<Term>) -> Term {
    let mut flat = Vec::new();
    for part in parts {
        if part.is_boolean(true) {
            return Term::boolean(true);
        }
        if part.is_boolean(false) {
            continue;
        }
        match part {
            Term::Compound(ref name, ref args) if name == "or" => flat.extend(args.clone()),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Term::boolean(false),
        1 => flat.into_iter().next().unwrap_or_else(|| Term::boolean(false)),
        _ => Term::compound("or", flat),
    }
}

/// Distribute an NNF formula into a clause list
fn distribute(term: &Term) -> Vec<CnfClause> {
    match term {
        Term::Const(Value::Bool(true)) => Vec::new(),
        Term::Const(Value::Bool(false)) => vec![Vec::new()],
        Term::Compound(name, args) if name == "and" => {
            args.iter().flat_map(distribute).collect()
        }
        Term::Compound(name, args) if name == "or" => {
            // Cross product of the argument clause lists
            let mut acc: Vec<CnfClause> = vec![Vec::new()];
            for arg in args {
                let arg_clauses = distribute(arg);
                let mut next = Vec::new();
                for left in &acc {
                    for right in &arg_clauses {
                        let mut combined = left.clone();
                        for lit in right {
                            if !combined.contains(lit) {
                                combined.push(lit.clone());
                            }
                        }
                        next.push(combined);
                    }
                }
                acc = next;
            }
            acc.into_iter().filter(|c| !is_tautology(c)).collect()
        }
        _ => vec![vec![term.clone()]],
    }
}

/// A clause containing complementary literals is always true
fn is_tautology(clause: &CnfClause) -> bool {
    clause.iter().any(|lit| match lit {
        Term::Compound(name, args) if name == "not" && args.len() == 1 => {
            clause.contains(&args[0])
        }
        _ => false,
    })
}
