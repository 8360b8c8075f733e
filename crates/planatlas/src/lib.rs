//! planatlas: a grounding and interpretation engine for typed
//! action-description planning domains
//!
//! This library provides a first-order term algebra with SLD resolution,
//! a fluent state model, and a grounder that instantiates lifted action
//! schemas into executable ground-action tables for a given initial state.

pub mod config;
pub mod error;
pub mod ground;
pub mod interpret;
pub mod logic;
pub mod model;

// Re-export commonly used types from logic
pub use logic::{resolve, unify, Clause, FuncSource, ResolveMode, Substitution, Term, Value, Variable};

// Re-export the data model
pub use model::{ActionSchema, Domain, FuncDef, Metric, Problem, Signature, State};

// Re-export interpretation types
pub use interpret::{
    applicable, available, check_term, evaluate, execute, goalstate, initstate, regress, relevant,
    satisfiers, satisfy, transition, ConditionalDiff, Diff, Evaluator, FuncTable, Truth, UpdateOp,
};

// Re-export grounding types
pub use ground::{
    dequantify, ground, groundactions, statics, CnfClause, GroundAction, GroundActionGroup,
    GroundEffect,
};

pub use config::EngineConfig;
pub use error::{EngineError, Result};
