//! Grounding of lifted action schemas
//!
//! A schema is dequantified once, its conditional effects flattened,
//! and every tuple of typed objects is then substituted, simplified
//! against the static fluents, normalised to CNF, and either emitted as
//! a ground action or discarded.

pub mod cnf;
pub mod dequantify;

pub use cnf::{clauses_falsified, clauses_to_term, to_cnf, CnfClause};
pub use dequantify::dequantify;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::interpret::effect::{effect_diff, ConditionalDiff, Diff};
use crate::interpret::eval::Evaluator;
use crate::logic::{is_connective, is_quantifier, Substitution, Term, Value};
use crate::model::{ActionSchema, Domain, State};
use cnf::{and_fold, or_fold};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The effect of a ground action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroundEffect {
    Simple(Diff),
    Conditional(ConditionalDiff),
}

/// A fully instantiated action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundAction {
    pub name: String,
    /// The ground head, e.g. `pickup(a)`
    pub term: Term,
    /// Precondition as a CNF clause list (empty means always applicable)
    pub preconds: Vec<CnfClause>,
    pub effect: GroundEffect,
}

impl fmt::Display for GroundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

/// All groundings of one schema, keyed by ground head term
#[derive(Debug, Clone, Default)]
pub struct GroundActionGroup {
    pub name: String,
    pub actions: IndexMap<Term, GroundAction>,
}

impl GroundActionGroup {
    pub fn get(&self, term: &Term) -> Option<&GroundAction> {
        self.actions.get(term)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Compute the fluent symbols whose extension is fixed across all
/// reachable states: those never targeted by any effect, with the
/// dynamism propagated through derived-predicate axioms
pub fn statics(domain: &Domain) -> IndexSet<String> {
    let mut dynamic: IndexSet<String> = IndexSet::new();
    for action in domain.get_actions() {
        collect_targets(&action.effect, &mut dynamic);
    }

    loop {
        let mut changed = false;
        for clause in &domain.axioms {
            let Some(head) = clause.head.name() else {
                continue;
            };
            if dynamic.contains(head) {
                continue;
            }
            let mut mentioned = IndexSet::new();
            for goal in &clause.body {
                collect_symbols(goal, &mut mentioned);
            }
            if mentioned.iter().any(|name| dynamic.contains(name)) {
                dynamic.insert(head.to_string());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    domain
        .predicates
        .keys()
        .chain(domain.functions.keys())
        .filter(|name| !dynamic.contains(*name) && !domain.is_derived(name))
        .cloned()
        .collect()
}

/// Record the fluent symbols an effect term writes to
fn collect_targets(effect: &Term, dynamic: &mut IndexSet<String>) {
    match effect {
        Term::Const(Value::Sym(name)) => {
            dynamic.insert(name.clone());
        }
        Term::Compound(name, args) => match name.as_str() {
            "and" => args.iter().for_each(|a| collect_targets(a, dynamic)),
            "not" => {
                if let Some(inner) = args.first().and_then(Term::name) {
                    dynamic.insert(inner.to_string());
                }
            }
            "when" | "forall" | "exists" => {
                if let Some(body) = args.last() {
                    collect_targets(body, dynamic);
                }
            }
            "assign" | "increase" | "decrease" | "scale-up" | "scale-down" => {
                if let Some(target) = args.first().and_then(Term::name) {
                    dynamic.insert(target.to_string());
                }
            }
            _ => {
                dynamic.insert(name.clone());
            }
        },
        _ => {}
    }
}

/// Collect every fluent symbol mentioned in a formula
fn collect_symbols(term: &Term, names: &mut IndexSet<String>) {
    match term {
        Term::Const(Value::Sym(name)) => {
            names.insert(name.clone());
        }
        Term::Compound(name, args) => {
            if !is_connective(name) && !is_quantifier(name) {
                names.insert(name.clone());
            }
            args.iter().for_each(|a| collect_symbols(a, names));
        }
        _ => {}
    }
}

/// Objects usable for a parameter of the given type: domain constants
/// first, then problem objects, each in declaration order, with
/// subtypes included
pub(crate) fn typed_objects(domain: &Domain, state: &State, objtype: &str) -> Vec<Term> {
    let subtypes = domain.all_subtypes(objtype);
    let mut objects: IndexSet<Term> = IndexSet::new();
    for (name, t) in domain.get_constants() {
        if subtypes.contains(t) {
            objects.insert(Term::sym(name));
        }
    }
    for term in &state.types {
        if let Term::Compound(t, args) = term {
            if args.len() == 1 && subtypes.contains(t) {
                objects.insert(args[0].clone());
            }
        }
    }
    objects.into_iter().collect()
}

/// Evaluate static atoms against the state and constant-fold the
/// connectives, yielding `⊤`, `⊥`, or a partially simplified term
pub fn simplify_statics(
    domain: &Domain,
    state: &State,
    statics: &IndexSet<String>,
    term: &Term,
) -> Result<Term> {
    match term {
        Term::Compound(name, args) => match name.as_str() {
            "and" => Ok(and_fold(
                args.iter()
                    .map(|a| simplify_statics(domain, state, statics, a))
                    .collect::<Result<Vec<_>>>()?,
            )),
            "or" => Ok(or_fold(
                args.iter()
                    .map(|a| simplify_statics(domain, state, statics, a))
                    .collect::<Result<Vec<_>>>()?,
            )),
            "not" if args.len() == 1 => Ok(not_fold(simplify_statics(
                domain, state, statics, &args[0],
            )?)),
            "imply" if args.len() == 2 => {
                let lhs = simplify_statics(domain, state, statics, &args[0])?;
                let rhs = simplify_statics(domain, state, statics, &args[1])?;
                Ok(or_fold(vec![not_fold(lhs), rhs]))
            }
            _ if is_quantifier(name) => Ok(term.clone()),
            _ if domain.is_type(name) && term.is_ground() && args.len() == 1 => {
                Ok(Term::boolean(type_truth(domain, state, name, &args[0])))
            }
            _ if domain.predicates.contains_key(name)
                && statics.contains(name)
                && term.is_ground() =>
            {
                Ok(Term::boolean(
                    state.get_fluent(term) == Value::Bool(true),
                ))
            }
            _ if is_comparison(name) && args.iter().all(numeric_literal) => {
                match Evaluator::new(domain, state).evaluate(term)? {
                    Value::Bool(b) => Ok(Term::boolean(b)),
                    _ => Ok(term.clone()),
                }
            }
            _ => Ok(term.clone()),
        },
        Term::Const(Value::Sym(name))
            if domain.predicates.contains_key(name) && statics.contains(name) =>
        {
            Ok(Term::boolean(state.facts.contains(term)))
        }
        _ => Ok(term.clone()),
    }
}

fn not_fold(term: Term) -> Term {
    if term.is_boolean(true) {
        return Term::boolean(false);
    }
    if term.is_boolean(false) {
        return Term::boolean(true);
    }
    match term {
        Term::Compound(ref name, ref args) if name == "not" && args.len() == 1 => args[0].clone(),
        other => Term::compound("not", vec![other]),
    }
}

/// Whether a declared object or constant has the given type, subtypes
/// included
fn type_truth(domain: &Domain, state: &State, objtype: &str, obj: &Term) -> bool {
    let Some(Value::Sym(name)) = obj.as_value() else {
        return false;
    };
    let actual = match domain.constants.get(name) {
        Some(t) => t.clone(),
        None => match state.get_objtypes().get(name) {
            Some(t) => t.clone(),
            None => return false,
        },
    };
    domain.all_subtypes(objtype).contains(&actual)
}

fn is_comparison(name: &str) -> bool {
    matches!(name, "=" | "!=" | "<" | "<=" | ">" | ">=")
}

fn numeric_literal(term: &Term) -> bool {
    match term {
        Term::Const(Value::Num(_)) => true,
        Term::Compound(name, args) => {
            matches!(name.as_str(), "+" | "-" | "*" | "/") && args.iter().all(numeric_literal)
        }
        _ => false,
    }
}

/// A schema after dequantification, with conditional effects split out
struct PreparedSchema {
    precond: Term,
    uncond: Vec<Term>,
    branches: Vec<(Term, Term)>,
}

fn prepare(domain: &Domain, state: &State, schema: &ActionSchema) -> Result<PreparedSchema> {
    let precond = dequantify(domain, state, &schema.precond)?;
    let effect = dequantify(domain, state, &schema.effect)?;
    let mut uncond = Vec::new();
    let mut branches = Vec::new();
    flatten_conditions(&effect, &mut uncond, &mut branches)?;
    Ok(PreparedSchema {
        precond,
        uncond,
        branches,
    })
}

/// Split an effect into its unconditional conjuncts and its
/// `when(cond, eff)` branches
fn flatten_conditions(
    effect: &Term,
    uncond: &mut Vec<Term>,
    branches: &mut Vec<(Term, Term)>,
) -> Result<()> {
    match effect {
        Term::Compound(name, args) if name == "and" => {
            for arg in args {
                flatten_conditions(arg, uncond, branches)?;
            }
            Ok(())
        }
        Term::Compound(name, args) if name == "when" => {
            if args.len() != 2 {
                return Err(EngineError::Arity {
                    symbol: name.clone(),
                    expected: 2,
                    got: args.len(),
                });
            }
            if contains_when(&args[1]) {
                return Err(EngineError::MalformedEffect(format!(
                    "nested conditional {}",
                    effect
                )));
            }
            branches.push((args[0].clone(), args[1].clone()));
            Ok(())
        }
        _ => {
            uncond.push(effect.clone());
            Ok(())
        }
    }
}

fn contains_when(term: &Term) -> bool {
    match term {
        Term::Compound(name, args) => {
            name == "when" || args.iter().any(contains_when)
        }
        _ => false,
    }
}

/// Instantiate a prepared schema with one argument tuple
fn ground_instance(
    domain: &Domain,
    state: &State,
    schema: &ActionSchema,
    prepared: &PreparedSchema,
    statics: &IndexSet<String>,
    args: &[Term],
) -> Result<Option<GroundAction>> {
    let subst = Substitution::from_pairs(
        schema
            .params
            .iter()
            .map(|(v, _)| v.clone())
            .zip(args.iter().cloned()),
    );

    let precond = simplify_statics(domain, state, statics, &prepared.precond.substitute(&subst))?;
    if precond.is_boolean(false) {
        return Ok(None);
    }
    let mut preconds = to_cnf(&precond)?;
    if clauses_falsified(&preconds) {
        return Ok(None);
    }

    let mut base = Diff::new();
    for eff in &prepared.uncond {
        base.merge(effect_diff(domain, state, &eff.substitute(&subst))?);
    }

    let mut branches: Vec<(Vec<CnfClause>, Diff)> = Vec::new();
    for (cond, eff) in &prepared.branches {
        let cond = simplify_statics(domain, state, statics, &cond.substitute(&subst))?;
        if cond.is_boolean(false) {
            continue;
        }
        let cond_cnf = to_cnf(&cond)?;
        if clauses_falsified(&cond_cnf) {
            continue;
        }
        let diff = effect_diff(domain, state, &eff.substitute(&subst))?;
        if cond_cnf.is_empty() {
            // Condition simplified away entirely
            base.merge(diff);
        } else {
            branches.push((cond_cnf, diff));
        }
    }

    let effect = if branches.is_empty() {
        if base.is_empty() {
            return Ok(None);
        }
        GroundEffect::Simple(base)
    } else if branches.len() == 1 && base.is_empty() {
        // A lone surviving branch degrades to a plain precondition
        let (cond, diff) = branches.into_iter().next().unwrap_or_default();
        preconds.extend(cond);
        GroundEffect::Simple(diff)
    } else {
        GroundEffect::Conditional(ConditionalDiff { base, branches })
    };

    let term = if args.is_empty() {
        Term::sym(&schema.name)
    } else {
        Term::compound(&schema.name, args.to_vec())
    };
    Ok(Some(GroundAction {
        name: schema.name.clone(),
        term,
        preconds,
        effect,
    }))
}

fn ground_schema(
    domain: &Domain,
    state: &State,
    schema: &ActionSchema,
    statics: &IndexSet<String>,
    config: &EngineConfig,
) -> Result<Vec<GroundAction>> {
    let prepared = prepare(domain, state, schema)?;
    let mut actions = Vec::new();
    let mut considered = 0usize;

    let mut emit = |args: Vec<Term>, actions: &mut Vec<GroundAction>| -> Result<()> {
        considered += 1;
        if config.max_groundings_per_schema > 0 && considered > config.max_groundings_per_schema {
            return Err(EngineError::GroundingLimit {
                schema: schema.name.clone(),
                limit: config.max_groundings_per_schema,
            });
        }
        if let Some(action) = ground_instance(domain, state, schema, &prepared, statics, &args)? {
            actions.push(action);
        }
        Ok(())
    };

    if schema.params.is_empty() {
        emit(Vec::new(), &mut actions)?;
    } else {
        let lists: Vec<Vec<Term>> = schema
            .params
            .iter()
            .map(|(_, t)| typed_objects(domain, state, t))
            .collect();
        // The leftmost parameter varies slowest
        for combo in lists.iter().map(|l| l.iter().cloned()).multi_cartesian_product() {
            emit(combo, &mut actions)?;
        }
    }

    log::debug!(
        "schema {}: {} instantiations considered, {} emitted",
        schema.name,
        considered,
        actions.len()
    );
    Ok(actions)
}

/// Ground one schema into a group keyed by ground head term
pub fn ground(
    domain: &Domain,
    state: &State,
    schema: &ActionSchema,
    config: &EngineConfig,
) -> Result<GroundActionGroup> {
    let statics = statics(domain);
    let actions = ground_schema(domain, state, schema, &statics, config)?;
    Ok(GroundActionGroup {
        name: schema.name.clone(),
        actions: actions
            .into_iter()
            .map(|action| (action.term.clone(), action))
            .collect(),
    })
}

/// Ground one schema, or every schema in declaration order
pub fn groundactions(
    domain: &Domain,
    state: &State,
    schema: Option<&ActionSchema>,
    config: &EngineConfig,
) -> Result<Vec<GroundAction>> {
    let statics = statics(domain);
    match schema {
        Some(schema) => ground_schema(domain, state, schema, &statics, config),
        None => {
            let mut actions = Vec::new();
            for schema in domain.get_actions() {
                actions.extend(ground_schema(domain, state, schema, &statics, config)?);
            }
            Ok(actions)
        }
    }
}

/// Ground the single instantiation named by a ground action term
pub(crate) fn ground_named_instance(
    domain: &Domain,
    state: &State,
    schema: &ActionSchema,
    args: &[Term],
) -> Result<Option<GroundAction>> {
    let statics = statics(domain);
    let prepared = prepare(domain, state, schema)?;
    ground_instance(domain, state, schema, &prepared, &statics, args)
}
