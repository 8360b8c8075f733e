//! Horn clauses

use super::substitution::Substitution;
use super::term::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A definite clause: a head and an ordered body of goals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub head: Term,
    pub body: Vec<Term>,
}

impl Clause {
    /// Create a rule with the given head and body
    pub fn new(head: Term, body: Vec<Term>) -> Self {
        Clause { head, body }
    }

    /// Create a bodyless clause (a fact)
    pub fn fact(head: Term) -> Self {
        Clause {
            head,
            body: Vec::new(),
        }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// Get all variables in this clause
    pub fn variables(&self) -> HashSet<Variable> {
        let mut vars = self.head.variables();
        for goal in &self.body {
            goal.collect_variables(&mut vars);
        }
        vars
    }

    /// Rename all variables with a fresh suffix to standardise the
    /// clause apart from a query before resolution
    pub fn rename(&self, suffix: usize) -> Clause {
        let renaming = Substitution::from_pairs(self.variables().into_iter().map(|v| {
            let fresh = Term::var(&format!("{}#{}", v.name, suffix));
            (v, fresh)
        }));
        Clause {
            head: self.head.substitute(&renaming),
            body: self.body.iter().map(|g| g.substitute(&renaming)).collect(),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            for (i, goal) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", goal)?;
            }
        }
        write!(f, ".")
    }
}
