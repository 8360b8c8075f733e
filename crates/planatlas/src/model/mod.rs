//! Data model: domains, problems, and states

pub mod domain;
pub mod problem;
pub mod state;

pub use domain::{ActionSchema, Domain, FuncDef, Signature};
pub use problem::{goalstate, initstate, Metric, Problem};
pub use state::{Fluent, State};
