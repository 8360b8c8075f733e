//! World state: typed objects, boolean facts, keyed fluent values

use crate::error::{EngineError, Result};
use crate::logic::{Term, Value};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The stored value of one fluent symbol: a scalar for arity-0 fluents,
/// a sparse table keyed by argument tuple otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fluent {
    Scalar(Value),
    Table(IndexMap<Vec<Value>, Value>),
}

/// A planning state
///
/// `types` holds one `type(object)` atom per declared object, `facts`
/// the ground propositions that are currently true (absence means
/// false), and `values` the non-boolean fluents. A term never appears
/// in both `facts` and `values`. Iteration order everywhere is
/// declaration/insertion order; equality and hashing are
/// order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub types: IndexSet<Term>,
    pub facts: IndexSet<Term>,
    pub values: IndexMap<String, Fluent>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    /// Declare an object of the given type
    pub fn declare_object(&mut self, name: &str, objtype: &str) {
        self.types
            .insert(Term::compound(objtype, vec![Term::sym(name)]));
    }

    /// Enumerate declared objects, optionally restricted to one exact
    /// type, in declaration order
    pub fn get_objects(&self, objtype: Option<&str>) -> Vec<Term> {
        self.types
            .iter()
            .filter_map(|t| match t {
                Term::Compound(ty, args) if args.len() == 1 => match objtype {
                    Some(wanted) if ty != wanted => None,
                    _ => Some(args[0].clone()),
                },
                _ => None,
            })
            .collect()
    }

    /// Map each declared object to its type, in declaration order
    pub fn get_objtypes(&self) -> IndexMap<String, String> {
        self.types
            .iter()
            .filter_map(|t| match t {
                Term::Compound(ty, args) if args.len() == 1 => args[0]
                    .as_value()
                    .and_then(Value::as_sym)
                    .map(|obj| (obj.to_string(), ty.clone())),
                _ => None,
            })
            .collect()
    }

    /// True when the term is a declared fact or typing atom
    pub fn holds(&self, term: &Term) -> bool {
        self.facts.contains(term) || self.types.contains(term)
    }

    /// Look up the value of a fluent term
    ///
    /// Boolean fluents read from `facts`; everything else from the
    /// `values` tables, defaulting to `false` when either layer is
    /// absent.
    pub fn get_fluent(&self, term: &Term) -> Value {
        match term {
            Term::Const(Value::Sym(name)) => {
                if self.facts.contains(term) {
                    Value::Bool(true)
                } else {
                    match self.values.get(name) {
                        Some(Fluent::Scalar(v)) => v.clone(),
                        _ => Value::Bool(false),
                    }
                }
            }
            Term::Const(v) => v.clone(),
            Term::Compound(name, args) => {
                if self.facts.contains(term) {
                    return Value::Bool(true);
                }
                match (self.values.get(name), fluent_key(args)) {
                    (Some(Fluent::Table(table)), Some(key)) => {
                        table.get(&key).cloned().unwrap_or(Value::Bool(false))
                    }
                    _ => Value::Bool(false),
                }
            }
            Term::Var(_) => Value::Bool(false),
        }
    }

    /// Write the value of a fluent term
    ///
    /// Boolean values route to `facts` (added when true, removed when
    /// false); other values route to the `values` tables, creating the
    /// inner table on demand.
    pub fn set_fluent(&mut self, value: Value, term: &Term) -> Result<()> {
        if !term.is_ground() {
            return Err(EngineError::IllFormedState(format!(
                "non-ground fluent {}",
                term
            )));
        }
        match value {
            Value::Bool(b) => {
                if let Some(name) = term.name() {
                    if self.values.contains_key(name) {
                        return Err(EngineError::IllFormedState(format!(
                            "boolean write to valued fluent {}",
                            name
                        )));
                    }
                }
                if b {
                    self.facts.insert(term.clone());
                } else {
                    self.facts.shift_remove(term);
                }
                Ok(())
            }
            value => {
                if self.facts.contains(term) {
                    return Err(EngineError::IllFormedState(format!(
                        "valued write to boolean fact {}",
                        term
                    )));
                }
                match term {
                    Term::Const(Value::Sym(name)) => {
                        match self.values.get(name) {
                            Some(Fluent::Table(_)) => {
                                return Err(EngineError::IllFormedState(format!(
                                    "scalar write to keyed fluent {}",
                                    name
                                )))
                            }
                            _ => {
                                self.values.insert(name.clone(), Fluent::Scalar(value));
                            }
                        }
                        Ok(())
                    }
                    Term::Compound(name, args) => {
                        let key = fluent_key(args).ok_or_else(|| {
                            EngineError::IllFormedState(format!(
                                "fluent {} has a non-constant argument",
                                term
                            ))
                        })?;
                        match self
                            .values
                            .entry(name.clone())
                            .or_insert_with(|| Fluent::Table(IndexMap::new()))
                        {
                            Fluent::Table(table) => {
                                table.insert(key, value);
                                Ok(())
                            }
                            Fluent::Scalar(_) => Err(EngineError::IllFormedState(format!(
                                "keyed write to scalar fluent {}",
                                name
                            ))),
                        }
                    }
                    _ => Err(EngineError::IllFormedState(format!(
                        "cannot assign to {}",
                        term
                    ))),
                }
            }
        }
    }

    /// Enumerate all (term, value) pairs: facts first with implicit
    /// `true` values, then the expanded value tables
    pub fn get_fluents(&self) -> Vec<(Term, Value)> {
        let mut fluents: Vec<(Term, Value)> = self
            .facts
            .iter()
            .map(|t| (t.clone(), Value::Bool(true)))
            .collect();
        for (name, fluent) in &self.values {
            match fluent {
                Fluent::Scalar(v) => fluents.push((Term::sym(name), v.clone())),
                Fluent::Table(table) => {
                    for (key, v) in table {
                        let args = key.iter().map(|k| Term::Const(k.clone())).collect();
                        fluents.push((Term::compound(name, args), v.clone()));
                    }
                }
            }
        }
        fluents
    }
}

/// Turn fluent arguments into a table key; fails on non-constant args
fn fluent_key(args: &[Term]) -> Option<Vec<Value>> {
    args.iter()
        .map(|a| a.as_value().cloned())
        .collect::<Option<Vec<_>>>()
}

// Equality on states is order-independent set equality, so the hash has
// to be a commutative fold of the element hashes.
impl Hash for State {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        fn item_hash<T: Hash>(item: &T) -> u64 {
            let mut h = DefaultHasher::new();
            item.hash(&mut h);
            h.finish()
        }

        let mut acc: u64 = 0;
        for t in &self.types {
            acc = acc.wrapping_add(item_hash(&(0u8, t)));
        }
        for t in &self.facts {
            acc = acc.wrapping_add(item_hash(&(1u8, t)));
        }
        for (name, fluent) in &self.values {
            match fluent {
                Fluent::Scalar(v) => acc = acc.wrapping_add(item_hash(&(2u8, name, v))),
                Fluent::Table(table) => {
                    for (key, v) in table {
                        acc = acc.wrapping_add(item_hash(&(3u8, name, key, v)));
                    }
                }
            }
        }
        hasher.write_u64(acc);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (term, value)) in self.get_fluents().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::Bool(true) => write!(f, "{}", term)?,
                v => write!(f, "{}={}", term, v)?,
            }
        }
        write!(f, "}}")
    }
}
