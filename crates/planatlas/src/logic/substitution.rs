//! Variable substitutions

use super::term::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A substitution mapping variables to terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub map: HashMap<Variable, Term>,
}

impl Substitution {
    /// Create a new empty substitution
    pub fn new() -> Self {
        Substitution {
            map: HashMap::new(),
        }
    }

    /// Build a substitution from variable/term pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        Substitution {
            map: pairs.into_iter().collect(),
        }
    }

    /// Add a variable -> term mapping
    pub fn insert(&mut self, var: Variable, term: Term) {
        self.map.insert(var, term);
    }

    /// Get the term for a variable, if bound
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.map.get(var)
    }

    /// Check if a variable is bound
    pub fn contains(&self, var: &Variable) -> bool {
        self.map.contains_key(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Compose two substitutions: applying the result is equivalent to
    /// applying `self` and then `other`
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = Substitution::new();

        // Apply other to all terms in self
        for (var, term) in &self.map {
            result.insert(var.clone(), term.substitute(other));
        }

        // Add mappings from other that aren't in self
        for (var, term) in &other.map {
            if !self.map.contains_key(var) {
                result.insert(var.clone(), term.clone());
            }
        }

        result
    }

    /// Restrict the substitution to the given variables
    pub fn restrict(&self, vars: &HashSet<Variable>) -> Substitution {
        Substitution {
            map: self
                .map
                .iter()
                .filter(|(var, _)| vars.contains(var))
                .map(|(var, term)| (var.clone(), term.clone()))
                .collect(),
        }
    }
}

impl Term {
    /// Apply a substitution to this term
    pub fn substitute(&self, subst: &Substitution) -> Term {
        match self {
            Term::Var(v) => subst.map.get(v).cloned().unwrap_or_else(|| self.clone()),
            Term::Const(_) => self.clone(),
            Term::Compound(name, args) => Term::Compound(
                name.clone(),
                args.iter().map(|arg| arg.substitute(subst)).collect(),
            ),
        }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        write!(f, "{{")?;
        for (i, (var, term)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", var, term)?;
        }
        write!(f, "}}")
    }
}
