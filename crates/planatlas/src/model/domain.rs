//! Domain model: type hierarchy, signatures, axioms, action schemas

use crate::logic::{Clause, Term, Variable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Signature of a predicate or function: typed argument variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub argvars: Vec<Variable>,
    pub argtypes: Vec<String>,
}

impl Signature {
    pub fn new(name: &str, args: &[(&str, &str)]) -> Self {
        Signature {
            name: name.to_string(),
            argvars: args.iter().map(|(v, _)| Variable::new(v)).collect(),
            argtypes: args.iter().map(|(_, t)| t.to_string()).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.argvars.len()
    }
}

/// A domain-defined function: parameters and a body term evaluated on
/// demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDef {
    pub params: Vec<Variable>,
    pub body: Term,
}

/// A lifted action schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub params: Vec<(Variable, String)>,
    pub precond: Term,
    pub effect: Term,
}

impl ActionSchema {
    pub fn new(name: &str, params: &[(&str, &str)], precond: Term, effect: Term) -> Self {
        ActionSchema {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(v, t)| (Variable::new(v), t.to_string()))
                .collect(),
            precond,
            effect,
        }
    }

    pub fn get_argvars(&self) -> Vec<&Variable> {
        self.params.iter().map(|(v, _)| v).collect()
    }

    pub fn get_argtypes(&self) -> Vec<&str> {
        self.params.iter().map(|(_, t)| t.as_str()).collect()
    }
}

/// A planning domain
///
/// `types` maps each declared type to its supertypes (multiple
/// supertypes are permitted; roots map to the empty list). All
/// collections iterate in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub types: IndexMap<String, Vec<String>>,
    pub predicates: IndexMap<String, Signature>,
    pub functions: IndexMap<String, Signature>,
    pub funcdefs: IndexMap<String, FuncDef>,
    pub axioms: Vec<Clause>,
    pub constants: IndexMap<String, String>,
    pub actions: IndexMap<String, ActionSchema>,
}

impl Domain {
    pub fn new(name: &str) -> Self {
        Domain {
            name: name.to_string(),
            ..Domain::default()
        }
    }

    /// Declare a root type
    pub fn declare_type(&mut self, name: &str) {
        self.types.entry(name.to_string()).or_default();
    }

    /// Declare `sub` as a subtype of `sup`, declaring both as needed
    pub fn declare_subtype(&mut self, sub: &str, sup: &str) {
        self.declare_type(sup);
        self.types
            .entry(sub.to_string())
            .or_default()
            .push(sup.to_string());
    }

    /// Declare a domain constant of the given type
    pub fn declare_constant(&mut self, name: &str, objtype: &str) {
        self.constants
            .insert(name.to_string(), objtype.to_string());
    }

    pub fn add_predicate(&mut self, sig: Signature) {
        self.predicates.insert(sig.name.clone(), sig);
    }

    pub fn add_function(&mut self, sig: Signature) {
        self.functions.insert(sig.name.clone(), sig);
    }

    pub fn add_funcdef(&mut self, name: &str, params: &[&str], body: Term) {
        self.funcdefs.insert(
            name.to_string(),
            FuncDef {
                params: params.iter().map(|p| Variable::new(p)).collect(),
                body,
            },
        );
    }

    pub fn add_axiom(&mut self, clause: Clause) {
        self.axioms.push(clause);
    }

    pub fn add_action(&mut self, action: ActionSchema) {
        self.actions.insert(action.name.clone(), action);
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Whether any declared type lists `name` among its supertypes
    pub fn has_subtypes(&self, name: &str) -> bool {
        self.types.values().any(|sups| sups.iter().any(|s| s == name))
    }

    /// The type itself plus all transitive subtypes, declaration order
    pub fn all_subtypes(&self, name: &str) -> Vec<String> {
        let mut result = vec![name.to_string()];
        let mut cursor = 0;
        while cursor < result.len() {
            let current = result[cursor].clone();
            for (sub, sups) in &self.types {
                if sups.iter().any(|s| *s == current) && !result.contains(sub) {
                    result.push(sub.clone());
                }
            }
            cursor += 1;
        }
        result
    }

    /// Derived-predicate axioms plus one clause per hierarchy edge, so
    /// the resolver answers supertype membership
    pub fn get_clauses(&self) -> Vec<Clause> {
        let mut clauses = self.axioms.clone();
        for (sub, sups) in &self.types {
            for sup in sups {
                clauses.push(Clause::new(
                    Term::compound(sup, vec![Term::var("x")]),
                    vec![Term::compound(sub, vec![Term::var("x")])],
                ));
            }
        }
        clauses
    }

    pub fn get_actions(&self) -> impl Iterator<Item = &ActionSchema> {
        self.actions.values()
    }

    pub fn get_constants(&self) -> &IndexMap<String, String> {
        &self.constants
    }

    /// Domain constants of exactly the given type, declaration order
    pub fn constants_of_type(&self, objtype: &str) -> Vec<Term> {
        self.constants
            .iter()
            .filter(|(_, t)| *t == objtype)
            .map(|(name, _)| Term::sym(name))
            .collect()
    }

    pub fn is_func(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.funcdefs.contains_key(name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.axioms
            .iter()
            .any(|clause| clause.head.name() == Some(name))
    }

    /// Signature of a predicate or state function, if declared
    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.predicates
            .get(name)
            .or_else(|| self.functions.get(name))
    }
}
