//! Relations and their normalization into GP canonical form.
//!
//! A relation `lhs (==|<=|>=) rhs` is normalized by moving every term to one
//! side, splitting the difference by sign into posynomials `P` and `Q`
//! (`d = P - Q`), and dividing through by `Q` when it is a single term:
//! - `==`: `P / Q == 1` (both sides monomials)
//! - `<=`: `P / Q <= 1` (any posynomial `P`)
//! - `>=`: mirrored, with the dual sign flagged for negation
//!
//! When `Q` has several terms the relation is a true signomial constraint
//! `P - Q <= 0`, accepted only by signomial models.

use std::fmt;

use crate::atoms::sub_exprs;
use crate::canon::GpConstraint;
use crate::error::{GpError, Result};
use crate::expr::{Expr, Monomial, MonomialTerm, Posynomial, Variable};

/// Relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationSense {
    /// `lhs == rhs`
    Eq,
    /// `lhs <= rhs`
    Leq,
    /// `lhs >= rhs`
    Geq,
}

impl fmt::Display for RelationSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationSense::Eq => "==",
            RelationSense::Leq => "<=",
            RelationSense::Geq => ">=",
        })
    }
}

/// A built but not yet validated relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Left-hand side.
    pub lhs: Expr,
    /// Relational operator.
    pub sense: RelationSense,
    /// Right-hand side.
    pub rhs: Expr,
}

impl Relation {
    /// Create a relation.
    pub fn new(lhs: impl Into<Expr>, sense: RelationSense, rhs: impl Into<Expr>) -> Self {
        Relation {
            lhs: lhs.into(),
            sense,
            rhs: rhs.into(),
        }
    }

    /// Create an equality relation: lhs == rhs.
    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Relation::new(lhs, RelationSense::Eq, rhs)
    }

    /// Create an inequality relation: lhs <= rhs.
    pub fn leq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Relation::new(lhs, RelationSense::Leq, rhs)
    }

    /// Create an inequality relation: lhs >= rhs.
    pub fn geq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Relation::new(lhs, RelationSense::Geq, rhs)
    }

    /// Get all variables on either side.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = self.lhs.variables();
        vars.extend(self.rhs.variables());
        vars.sort();
        vars.dedup();
        vars
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.sense, self.rhs)
    }
}

/// Extension trait for creating relations from expressions.
pub trait ConstraintExt {
    /// Create equality relation: self == rhs.
    fn equals(&self, rhs: impl Into<Expr>) -> Relation;

    /// Create inequality relation: self <= rhs.
    fn leq(&self, rhs: impl Into<Expr>) -> Relation;

    /// Create inequality relation: self >= rhs.
    fn geq(&self, rhs: impl Into<Expr>) -> Relation;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::eq(self.clone(), rhs)
    }

    fn leq(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::leq(self.clone(), rhs)
    }

    fn geq(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::geq(self.clone(), rhs)
    }
}

impl ConstraintExt for Variable {
    fn equals(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::eq(*self, rhs)
    }

    fn leq(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::leq(*self, rhs)
    }

    fn geq(&self, rhs: impl Into<Expr>) -> Relation {
        Relation::geq(*self, rhs)
    }
}

/// Canonical form of an accepted constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalForm {
    /// `monomial == 1`
    MonomialEquality(Monomial),
    /// `posynomial <= 1`
    PosynomialInequality(Posynomial),
    /// `p - q <= 0` with a multi-term `q`; signomial models only.
    Signomial {
        /// Positive part.
        p: Posynomial,
        /// Negated negative part.
        q: Posynomial,
    },
}

impl CanonicalForm {
    /// Check if this form is already GP-compatible.
    pub fn is_gp(&self) -> bool {
        !matches!(self, CanonicalForm::Signomial { .. })
    }

    /// The GP constraint for this form, or `None` for signomial forms.
    pub fn to_gp(&self) -> Option<GpConstraint> {
        match self {
            CanonicalForm::MonomialEquality(m) => Some(GpConstraint::Equality(m.clone())),
            CanonicalForm::PosynomialInequality(p) => Some(GpConstraint::Inequality(p.clone())),
            CanonicalForm::Signomial { .. } => None,
        }
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConstraint {
    /// The canonical form.
    pub form: CanonicalForm,
    /// Reported duals must be negated to match the user's orientation.
    pub negate_dual: bool,
}

/// Sum the coefficients of terms with identical exponents, keeping first-seen order.
fn combine_like_terms(terms: &[MonomialTerm]) -> Vec<MonomialTerm> {
    let mut combined: Vec<MonomialTerm> = Vec::with_capacity(terms.len());
    for term in terms {
        match combined.iter_mut().find(|t| t.exponents == term.exponents) {
            Some(existing) => existing.coefficient += term.coefficient,
            None => combined.push(term.clone()),
        }
    }
    combined
}

/// Split terms by coefficient sign into `(P, Q)` with `d = P - Q`.
///
/// Like terms are combined first; terms that cancel to zero are dropped.
pub fn split_by_sign(terms: &[MonomialTerm]) -> Result<(Posynomial, Posynomial)> {
    let mut pos_terms = Vec::new();
    let mut neg_terms = Vec::new();
    for term in combine_like_terms(terms) {
        if !term.coefficient.is_finite() {
            return Err(GpError::InvalidCoefficient {
                coefficient: term.coefficient,
                reason: "constraint coefficients must be finite".into(),
            });
        }
        if term.coefficient > 0.0 {
            pos_terms.push(term);
        } else if term.coefficient < 0.0 {
            neg_terms.push(term.neg());
        }
    }
    Ok((Posynomial::new(pos_terms)?, Posynomial::new(neg_terms)?))
}

/// Normalize a relation into canonical form.
///
/// `allow_signomial` admits `P - Q <= 0` with multi-term `Q`; otherwise such
/// relations are rejected.
pub fn normalize(relation: &Relation, allow_signomial: bool) -> Result<NormalizedConstraint> {
    let rhs_terms = match (relation.lhs.is_non_gp(), relation.rhs.terms()) {
        (false, Some(terms)) => terms,
        _ => {
            return Err(GpError::InvalidConstraintForm(format!(
                "`{}` is outside the signomial algebra",
                relation
            )))
        }
    };
    if rhs_terms.iter().all(|t| t.coefficient == 0.0) {
        return Err(GpError::ZeroRightHandSide);
    }
    if relation.variables().is_empty() {
        return Err(GpError::InvalidConstraintForm(format!(
            "`{}` is a constant relation with no variables",
            relation
        )));
    }

    // `>=` is normalized as `rhs - lhs <= 0`.
    let (difference, negate_dual) = match relation.sense {
        RelationSense::Geq => (sub_exprs(&relation.rhs, &relation.lhs), true),
        RelationSense::Eq | RelationSense::Leq => (sub_exprs(&relation.lhs, &relation.rhs), false),
    };
    let (p, q) = split_by_sign(difference.terms().unwrap_or_default())?;

    let form = match relation.sense {
        RelationSense::Eq => match (p.single_term(), q.single_term()) {
            (Some(pt), Some(qt)) => CanonicalForm::MonomialEquality(Monomial::try_from_term(pt.div(qt))?),
            _ => {
                return Err(GpError::InvalidConstraintForm(format!(
                    "`{}` must equate two monomials",
                    relation
                )))
            }
        },
        RelationSense::Leq | RelationSense::Geq => {
            if p.is_empty() {
                return Err(GpError::InvalidConstraintForm(format!(
                    "`{}` has no positive terms after normalization",
                    relation
                )));
            }
            match q.terms() {
                [] => {
                    return Err(GpError::InvalidConstraintForm(format!(
                        "`{}` bounds a posynomial above by zero",
                        relation
                    )))
                }
                [qt] => CanonicalForm::PosynomialInequality(p.div_term(qt)),
                _ if allow_signomial => CanonicalForm::Signomial { p, q },
                _ => {
                    return Err(GpError::InvalidConstraintForm(format!(
                        "`{}` bounds a posynomial below by a multi-term posynomial; \
                         declare it on a signomial model",
                        relation
                    )))
                }
            }
        }
    };

    Ok(NormalizedConstraint { form, negate_dual })
}

/// Handle to a constraint stored in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintRef(pub(crate) usize);

impl ConstraintRef {
    /// Position of the constraint in its model.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An accepted constraint; immutable once stored.
#[derive(Debug, Clone)]
pub struct ConstraintRecord {
    /// The relation as the user wrote it.
    pub relation: Relation,
    /// Optional name.
    pub name: Option<String>,
    /// Canonical form used by the lowering.
    pub form: CanonicalForm,
    /// Reported duals are negated.
    pub negate_dual: bool,
}

impl ConstraintRecord {
    /// Check if this is an equality constraint.
    pub fn is_equality(&self) -> bool {
        self.relation.sense == RelationSense::Eq
    }

    /// Check if this constraint needs the signomial loop.
    pub fn is_true_signomial(&self) -> bool {
        !self.form.is_gp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    fn model_xy() -> (Model, Variable, Variable) {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        (model, x, y)
    }

    #[test]
    fn test_monomial_equality() {
        let (_, x, y) = model_xy();
        let n = normalize(&(x * y).equals(2.0), false).unwrap();
        match n.form {
            CanonicalForm::MonomialEquality(m) => {
                assert_eq!(m.coefficient(), 0.5);
                assert_eq!(m.term().exponent(x), 1.0);
                assert_eq!(m.term().exponent(y), 1.0);
            }
            other => panic!("Expected MonomialEquality, got {:?}", other),
        }
        assert!(!n.negate_dual);
    }

    #[test]
    fn test_posynomial_leq() {
        let (_, x, y) = model_xy();
        let n = normalize(&(2.0 * (x + y)).leq(10.0), false).unwrap();
        match n.form {
            CanonicalForm::PosynomialInequality(p) => {
                assert_eq!(p.len(), 2);
                assert!((p.terms()[0].coefficient - 0.2).abs() < 1e-15);
            }
            other => panic!("Expected PosynomialInequality, got {:?}", other),
        }
    }

    #[test]
    fn test_geq_flips_and_flags() {
        let (_, x, y) = model_xy();
        let n = normalize(&(x * y).geq(2.0), false).unwrap();
        assert!(n.negate_dual);
        match n.form {
            CanonicalForm::PosynomialInequality(p) => {
                let t = p.single_term().unwrap();
                assert_eq!(t.coefficient, 2.0);
                assert_eq!(t.exponent(x), -1.0);
                assert_eq!(t.exponent(y), -1.0);
            }
            other => panic!("Expected PosynomialInequality, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_ratio() {
        let (_, x, y) = model_xy();
        let n = normalize(&x.leq(y), false).unwrap();
        match n.form {
            CanonicalForm::PosynomialInequality(p) => {
                let t = p.single_term().unwrap();
                assert_eq!(t.exponent(x), 1.0);
                assert_eq!(t.exponent(y), -1.0);
            }
            other => panic!("Expected PosynomialInequality, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_rhs() {
        let (_, x, y) = model_xy();
        assert_eq!(
            normalize(&(x + y).leq(0.0), false).unwrap_err(),
            GpError::ZeroRightHandSide
        );
        assert_eq!(normalize(&x.geq(0.0), true).unwrap_err(), GpError::ZeroRightHandSide);
    }

    #[test]
    fn test_posynomial_equality_rejected() {
        let (_, x, y) = model_xy();
        let err = normalize(&(x + y).equals(1.0), true).unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_INVALID_FORM");
    }

    #[test]
    fn test_signomial_form_requires_sp() {
        let (_, x, y) = model_xy();
        let rel = (x + y).geq(2.0);
        assert_eq!(
            normalize(&rel, false).unwrap_err().code(),
            "CONSTRAINT_INVALID_FORM"
        );
        let n = normalize(&rel, true).unwrap();
        assert!(n.negate_dual);
        match n.form {
            CanonicalForm::Signomial { p, q } => {
                assert_eq!(p.len(), 1);
                assert_eq!(p.terms()[0].coefficient, 2.0);
                assert_eq!(q.len(), 2);
            }
            other => panic!("Expected Signomial, got {:?}", other),
        }
    }

    #[test]
    fn test_non_gp_rejected() {
        let (_, x, y) = model_xy();
        let err = normalize(&(x + y).powf(0.5).leq(1.0), true).unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_INVALID_FORM");
    }

    #[test]
    fn test_like_terms_cancel() {
        let (_, x, y) = model_xy();
        let n = normalize(&(x + y - y).leq(3.0), false).unwrap();
        match n.form {
            CanonicalForm::PosynomialInequality(p) => {
                assert_eq!(p.len(), 1);
                assert_eq!(p.terms()[0], MonomialTerm::new(1.0 / 3.0, [(x, 1.0)]));
            }
            other => panic!("Expected PosynomialInequality, got {:?}", other),
        }
    }

    #[test]
    fn test_no_positive_terms() {
        let (_, x, _) = model_xy();
        // 1 <= 1 + x  =>  -x <= 0
        let err = normalize(&Expr::constant(1.0).leq(x + 1.0), true).unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_INVALID_FORM");
    }

    #[test]
    fn test_constant_relation_named_as_such() {
        let (_, x, _) = model_xy();
        for relation in [
            Expr::constant(2.0).leq(3.0),
            Expr::constant(3.0).geq(2.0),
            Expr::constant(2.0).equals(2.0),
            (x / x).leq(2.0),
        ] {
            match normalize(&relation, true) {
                Err(GpError::InvalidConstraintForm(msg)) => {
                    assert!(msg.contains("constant relation"), "{}", msg)
                }
                other => panic!("Expected InvalidConstraintForm, got {:?}", other),
            }
        }
    }
}
