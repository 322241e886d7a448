//! Kind classification for GP/SP expressions.
//!
//! Predicates inspect the terms rather than trusting the enum tag, so an
//! expression built directly from a wider wrapper still classifies correctly.

use std::fmt;

use crate::expr::{Expr, MonomialTerm};

/// Algebraic kind of an expression, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExprKind {
    /// Single positive term.
    Monomial,
    /// Sum of positive terms.
    Posynomial,
    /// Sum of signed terms.
    Signomial,
    /// Outside the signomial algebra.
    NonGp,
}

impl ExprKind {
    /// Check if this kind is a monomial.
    pub fn is_monomial(self) -> bool {
        matches!(self, ExprKind::Monomial)
    }

    /// Check if this kind is a posynomial (monomials included).
    pub fn is_posynomial(self) -> bool {
        matches!(self, ExprKind::Monomial | ExprKind::Posynomial)
    }

    /// Check if this kind is a signomial (posynomials included).
    pub fn is_signomial(self) -> bool {
        !matches!(self, ExprKind::NonGp)
    }

    /// Get a human-readable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ExprKind::Monomial => "monomial",
            ExprKind::Posynomial => "posynomial",
            ExprKind::Signomial => "signomial",
            ExprKind::NonGp => "non-GP",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrowest kind a list of terms qualifies for.
pub fn kind_of_terms(terms: &[MonomialTerm]) -> ExprKind {
    if !terms.iter().all(MonomialTerm::is_positive) {
        ExprKind::Signomial
    } else if terms.len() == 1 {
        ExprKind::Monomial
    } else {
        ExprKind::Posynomial
    }
}

impl Expr {
    /// Get the narrowest kind of this expression.
    pub fn kind(&self) -> ExprKind {
        match self.terms() {
            Some(terms) => kind_of_terms(terms),
            None => ExprKind::NonGp,
        }
    }

    /// Check if this expression qualifies as a monomial.
    pub fn is_monomial(&self) -> bool {
        self.kind().is_monomial()
    }

    /// Check if this expression qualifies as a posynomial.
    pub fn is_posynomial(&self) -> bool {
        self.kind().is_posynomial()
    }

    /// Check if this expression qualifies as a signomial.
    pub fn is_signomial(&self) -> bool {
        self.kind().is_signomial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{NonGpExpr, Posynomial, Signomial};
    use crate::model::Model;
    use std::sync::Arc;

    #[test]
    fn test_kind_ordering() {
        assert!(ExprKind::Monomial < ExprKind::Posynomial);
        assert!(ExprKind::Posynomial < ExprKind::Signomial);
        assert!(ExprKind::Signomial < ExprKind::NonGp);
    }

    #[test]
    fn test_predicates_follow_terms_not_tag() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();

        // A one-term signomial wrapper still classifies as a monomial.
        let wrapped = Expr::Signomial(Signomial::new(vec![MonomialTerm::variable(x)]));
        assert_eq!(wrapped.kind(), ExprKind::Monomial);

        let posy = Expr::Posynomial(Posynomial::new(vec![MonomialTerm::variable(x)]).unwrap());
        assert!(posy.is_monomial());
    }

    #[test]
    fn test_containment_chain() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();

        let exprs = vec![
            Expr::from(x),
            x + y,
            x - y,
            2.0 * x * y,
            -x,
            Expr::NonGp(NonGpExpr::Neg(Arc::new(Expr::from(x)))),
        ];
        for e in &exprs {
            if e.is_monomial() {
                assert!(e.is_posynomial(), "{} is a monomial but not a posynomial", e);
            }
            if e.is_posynomial() {
                assert!(e.is_signomial(), "{} is a posynomial but not a signomial", e);
            }
        }
    }

    #[test]
    fn test_non_gp_kind() {
        let e = Expr::NonGp(NonGpExpr::Neg(Arc::new(Expr::constant(1.0))));
        assert_eq!(e.kind(), ExprKind::NonGp);
        assert!(!e.is_signomial());
    }
}
