//! Error types for the engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A term references a predicate or function that is neither in the
    /// domain signature nor a built-in.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("wrong arity for {symbol}: expected {expected}, got {got}")]
    Arity {
        symbol: String,
        expected: usize,
        got: usize,
    },

    /// Effect term uses an unsupported connective or a double negation.
    #[error("malformed effect: {0}")]
    MalformedEffect(String),

    /// Malformed clause body, goal, or precondition connective.
    #[error("malformed formula: {0}")]
    MalformedFormula(String),

    /// A non-ground term reached the evaluator.
    #[error("unbound variable ?{0}")]
    UnboundVariable(String),

    /// Resolution exceeded the configured depth limit.
    #[error("resolver depth limit exceeded ({0})")]
    ResolverLimit(usize),

    /// A single schema produced more instantiations than allowed.
    #[error("too many groundings for schema {schema} (limit {limit})")]
    GroundingLimit { schema: String, limit: usize },

    /// Fact/value coexistence, unknown object, or unknown object type.
    #[error("ill-formed state: {0}")]
    IllFormedState(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
