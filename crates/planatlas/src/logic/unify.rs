//! First-order unification
//!
//! The occurs check is disabled: the action description language has no
//! self-referential terms, so a variable can never legally occur inside
//! a term it is bound to.

use super::substitution::Substitution;
use super::term::Term;

/// Unify two terms, returning a most general unifier if one exists
pub fn unify(term1: &Term, term2: &Term) -> Option<Substitution> {
    let mut subst = Substitution::new();
    if unify_with_subst(term1, term2, &mut subst) {
        Some(subst)
    } else {
        None
    }
}

/// Unify two terms under an existing substitution
pub fn unify_with_subst(term1: &Term, term2: &Term, subst: &mut Substitution) -> bool {
    let t1 = term1.substitute(subst);
    let t2 = term2.substitute(subst);

    match (&t1, &t2) {
        // Same term - nothing to do
        _ if t1 == t2 => true,

        // Variable cases
        (Term::Var(v), t) | (t, Term::Var(v)) => {
            bind(subst, v.clone(), (*t).clone());
            true
        }

        // Constants unify only when equal, handled above
        (Term::Const(_), _) | (_, Term::Const(_)) => false,

        // Compound terms
        (Term::Compound(n1, args1), Term::Compound(n2, args2)) => {
            if n1 != n2 || args1.len() != args2.len() {
                return false;
            }
            args1
                .iter()
                .zip(args2.iter())
                .all(|(a1, a2)| unify_with_subst(a1, a2, subst))
        }
    }
}

/// Bind a variable, propagating the new binding through existing ones
fn bind(subst: &mut Substitution, var: super::term::Variable, term: Term) {
    let single = Substitution::from_pairs([(var.clone(), term.clone())]);
    for bound in subst.map.values_mut() {
        *bound = bound.substitute(&single);
    }
    subst.insert(var, term);
}
