//! First-order term algebra and SLD resolution

pub mod clause;
pub mod resolve;
pub mod substitution;
pub mod term;
pub mod unify;

pub use clause::Clause;
pub use resolve::{resolve, FuncSource, NoFuncs, ResolveMode};
pub use substitution::Substitution;
pub use term::{is_connective, is_quantifier, Term, Value, Variable};
pub use unify::{unify, unify_with_subst};
