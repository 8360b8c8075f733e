//! Evaluation of ground terms against a state
//!
//! The function table is immutable and built once per domain: the
//! comparison and arithmetic built-ins merged with the domain's own
//! function definitions. There is no process-wide registry.

use crate::error::{EngineError, Result};
use crate::logic::{FuncSource, Substitution, Term, Value};
use crate::model::{Domain, Fluent, FuncDef, State};
use indexmap::IndexMap;

#[derive(Clone)]
enum FuncEntry {
    Builtin(fn(&str, &[Value]) -> Result<Value>),
    Defined(FuncDef),
}

/// Immutable table of evaluable function symbols
#[derive(Clone)]
pub struct FuncTable {
    entries: IndexMap<String, FuncEntry>,
}

impl FuncTable {
    /// Built-ins merged with the domain's function definitions
    pub fn for_domain(domain: &Domain) -> Self {
        let mut entries: IndexMap<String, FuncEntry> = IndexMap::new();
        for name in ["=", "!=", "<", "<=", ">", ">="] {
            entries.insert(name.to_string(), FuncEntry::Builtin(compare));
        }
        for name in ["+", "-", "*", "/"] {
            entries.insert(name.to_string(), FuncEntry::Builtin(arith));
        }
        for (name, def) in &domain.funcdefs {
            entries.insert(name.clone(), FuncEntry::Defined(def.clone()));
        }
        FuncTable { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

fn expect_nums(name: &str, args: &[Value]) -> Result<Vec<f64>> {
    args.iter()
        .map(|v| {
            v.as_num().ok_or_else(|| {
                EngineError::TypeMismatch(format!("{} applied to non-number {}", name, v))
            })
        })
        .collect()
}

fn compare(name: &str, args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(EngineError::Arity {
            symbol: name.to_string(),
            expected: 2,
            got: args.len(),
        });
    }
    match name {
        "=" => Ok(Value::Bool(args[0] == args[1])),
        "!=" => Ok(Value::Bool(args[0] != args[1])),
        _ => {
            let nums = expect_nums(name, args)?;
            let result = match name {
                "<" => nums[0] < nums[1],
                "<=" => nums[0] <= nums[1],
                ">" => nums[0] > nums[1],
                _ => nums[0] >= nums[1],
            };
            Ok(Value::Bool(result))
        }
    }
}

fn arith(name: &str, args: &[Value]) -> Result<Value> {
    if name == "-" && args.len() == 1 {
        let nums = expect_nums(name, args)?;
        return Ok(Value::num(-nums[0]));
    }
    if args.len() != 2 {
        return Err(EngineError::Arity {
            symbol: name.to_string(),
            expected: 2,
            got: args.len(),
        });
    }
    let nums = expect_nums(name, args)?;
    let result = match name {
        "+" => nums[0] + nums[1],
        "-" => nums[0] - nums[1],
        "*" => nums[0] * nums[1],
        _ => nums[0] / nums[1],
    };
    Ok(Value::num(result))
}

/// Reduces ground terms to values using a state and a function table
pub struct Evaluator<'a> {
    pub domain: &'a Domain,
    pub state: &'a State,
    funcs: FuncTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(domain: &'a Domain, state: &'a State) -> Self {
        Evaluator {
            domain,
            state,
            funcs: FuncTable::for_domain(domain),
        }
    }

    /// Evaluate a ground term to a value
    pub fn evaluate(&self, term: &Term) -> Result<Value> {
        match term {
            Term::Var(v) => Err(EngineError::UnboundVariable(v.name.clone())),
            Term::Const(Value::Sym(name)) => {
                if let Some(Fluent::Scalar(v)) = self.state.values.get(name) {
                    return Ok(v.clone());
                }
                if self.state.facts.contains(term) {
                    return Ok(Value::Bool(true));
                }
                if let Some(FuncEntry::Defined(def)) = self.funcs.entries.get(name) {
                    if def.params.is_empty() {
                        return self.evaluate(&def.body);
                    }
                }
                Ok(Value::Sym(name.clone()))
            }
            Term::Const(v) => Ok(v.clone()),
            Term::Compound(name, args) => match self.funcs.entries.get(name) {
                Some(FuncEntry::Builtin(f)) => {
                    let values = self.evaluate_args(args)?;
                    f(name, &values)
                }
                Some(FuncEntry::Defined(def)) => {
                    if args.len() != def.params.len() {
                        return Err(EngineError::Arity {
                            symbol: name.to_string(),
                            expected: def.params.len(),
                            got: args.len(),
                        });
                    }
                    let values = self.evaluate_args(args)?;
                    let binding = Substitution::from_pairs(
                        def.params
                            .iter()
                            .cloned()
                            .zip(values.into_iter().map(Term::Const)),
                    );
                    self.evaluate(&def.body.substitute(&binding))
                }
                None => {
                    if self.domain.signature(name).is_none() {
                        return Err(EngineError::UnknownSymbol(name.to_string()));
                    }
                    let values = self.evaluate_args(args)?;
                    let reduced =
                        Term::compound(name, values.into_iter().map(Term::Const).collect());
                    Ok(self.state.get_fluent(&reduced))
                }
            },
        }
    }

    fn evaluate_args(&self, args: &[Term]) -> Result<Vec<Value>> {
        args.iter().map(|a| self.evaluate(a)).collect()
    }
}

// The resolver consults the evaluator for built-in goals; state-backed
// numeric functions count as evaluable there too.
impl FuncSource for Evaluator<'_> {
    fn is_func(&self, name: &str) -> bool {
        self.funcs.contains(name) || self.domain.functions.contains_key(name)
    }

    fn call(&self, name: &str, args: &[Term]) -> Result<Value> {
        self.evaluate(&Term::compound(name, args.to_vec()))
    }
}

/// Evaluate a ground term against a state
pub fn evaluate(domain: &Domain, state: &State, term: &Term) -> Result<Value> {
    Evaluator::new(domain, state).evaluate(term)
}
