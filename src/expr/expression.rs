//! Core expression types for geoprog.
//!
//! The `Expr` enum is a closed sum over the four expression kinds. Every
//! operator result is narrowed to the tightest kind its terms allow:
//! `Monomial ⊂ Posynomial ⊂ Signomial`, with `NonGp` holding anything that
//! escapes the algebra (e.g. a posynomial raised to a real power).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::term::MonomialTerm;
use super::variable::Variable;
use crate::error::{GpError, Result};

/// Exactly one term with a positive coefficient (or the zero scalar).
#[derive(Debug, Clone, PartialEq)]
pub struct Monomial(MonomialTerm);

impl Monomial {
    /// Create a monomial, failing on a non-positive coefficient over variables.
    ///
    /// A zero coefficient with no exponents is accepted as the degenerate scalar.
    pub fn new(coefficient: f64, exponents: impl IntoIterator<Item = (Variable, f64)>) -> Result<Self> {
        Monomial::try_from_term(MonomialTerm::new(coefficient, exponents))
    }

    /// Wrap a term after checking its coefficient.
    pub fn try_from_term(term: MonomialTerm) -> Result<Self> {
        if term.is_positive() {
            Ok(Monomial(term))
        } else {
            Err(GpError::InvalidCoefficient {
                coefficient: term.coefficient,
                reason: "monomial coefficients must be strictly positive".into(),
            })
        }
    }

    /// The constant monomial `1`.
    pub fn one() -> Self {
        Monomial(MonomialTerm::constant(1.0))
    }

    /// The underlying term.
    pub fn term(&self) -> &MonomialTerm {
        &self.0
    }

    /// Consume into the underlying term.
    pub fn into_term(self) -> MonomialTerm {
        self.0
    }

    /// Coefficient of the monomial.
    pub fn coefficient(&self) -> f64 {
        self.0.coefficient
    }

    /// Evaluate at a point indexed by variable index.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.0.evaluate(point)
    }
}

/// A sum of terms, all with positive coefficients. The empty sum is zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Posynomial {
    terms: Vec<MonomialTerm>,
}

impl Posynomial {
    /// Create a posynomial, failing if any coefficient is non-positive.
    pub fn new(terms: Vec<MonomialTerm>) -> Result<Self> {
        if let Some(bad) = terms.iter().find(|t| !t.is_positive()) {
            return Err(GpError::InvalidCoefficient {
                coefficient: bad.coefficient,
                reason: "posynomial coefficients must be strictly positive".into(),
            });
        }
        Ok(Posynomial { terms })
    }

    /// The zero posynomial.
    pub fn zero() -> Self {
        Posynomial { terms: Vec::new() }
    }

    /// The terms of the posynomial.
    pub fn terms(&self) -> &[MonomialTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if this is the zero posynomial.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The single term, if there is exactly one.
    pub fn single_term(&self) -> Option<&MonomialTerm> {
        match self.terms.as_slice() {
            [t] => Some(t),
            _ => None,
        }
    }

    /// Divide every term by a positive term.
    pub fn div_term(&self, divisor: &MonomialTerm) -> Posynomial {
        Posynomial {
            terms: self.terms.iter().map(|t| t.div(divisor)).collect(),
        }
    }

    /// Evaluate at a point indexed by variable index.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.terms.iter().map(|t| t.evaluate(point)).sum()
    }
}

/// A sum of terms with arbitrary-sign coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signomial {
    terms: Vec<MonomialTerm>,
}

impl Signomial {
    /// Create a signomial from any terms.
    pub fn new(terms: Vec<MonomialTerm>) -> Self {
        Signomial { terms }
    }

    /// The terms of the signomial.
    pub fn terms(&self) -> &[MonomialTerm] {
        &self.terms
    }

    /// Evaluate at a point indexed by variable index.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.terms.iter().map(|t| t.evaluate(point)).sum()
    }
}

/// An expression outside the signomial algebra.
///
/// These can be evaluated but never appear in a constraint or objective.
#[derive(Debug, Clone, PartialEq)]
pub enum NonGpExpr {
    /// Multi-term expression raised to a real power.
    Power(Arc<Expr>, f64),
    /// Division by a multi-term expression or by zero.
    Quotient(Arc<Expr>, Arc<Expr>),
    /// Sum involving a non-GP operand.
    Sum(Arc<Expr>, Arc<Expr>),
    /// Product involving a non-GP operand.
    Product(Arc<Expr>, Arc<Expr>),
    /// Negation of a non-GP operand.
    Neg(Arc<Expr>),
}

/// The expression sum type.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Single positive term.
    Monomial(Monomial),
    /// Sum of positive terms.
    Posynomial(Posynomial),
    /// Sum of signed terms.
    Signomial(Signomial),
    /// Escaped the algebra.
    NonGp(NonGpExpr),
}

impl Expr {
    /// Build the narrowest expression kind for a list of terms.
    pub fn from_terms(terms: Vec<MonomialTerm>) -> Expr {
        if !terms.iter().all(MonomialTerm::is_positive) {
            return Expr::Signomial(Signomial { terms });
        }
        match <[MonomialTerm; 1]>::try_from(terms) {
            Ok([term]) => Expr::Monomial(Monomial(term)),
            Err(terms) => Expr::Posynomial(Posynomial { terms }),
        }
    }

    /// Create a constant expression.
    ///
    /// Non-negative constants are monomials; negative constants are signomials.
    pub fn constant(value: f64) -> Expr {
        Expr::from_terms(vec![MonomialTerm::constant(value)])
    }

    /// The terms of this expression, or `None` for non-GP expressions.
    pub fn terms(&self) -> Option<&[MonomialTerm]> {
        match self {
            Expr::Monomial(m) => Some(std::slice::from_ref(&m.0)),
            Expr::Posynomial(p) => Some(&p.terms),
            Expr::Signomial(s) => Some(&s.terms),
            Expr::NonGp(_) => None,
        }
    }

    /// Check if this expression escaped the algebra.
    pub fn is_non_gp(&self) -> bool {
        matches!(self, Expr::NonGp(_))
    }

    /// Checked narrowing to a monomial.
    pub fn as_monomial(&self) -> Option<Monomial> {
        match self.terms()? {
            [t] if t.is_positive() => Some(Monomial(t.clone())),
            _ => None,
        }
    }

    /// Checked narrowing to a posynomial.
    pub fn as_posynomial(&self) -> Option<Posynomial> {
        let terms = self.terms()?;
        if terms.iter().all(MonomialTerm::is_positive) {
            Some(Posynomial {
                terms: terms.to_vec(),
            })
        } else {
            None
        }
    }

    /// Widening to a signomial; `None` only for non-GP expressions.
    pub fn as_signomial(&self) -> Option<Signomial> {
        self.terms().map(|t| Signomial { terms: t.to_vec() })
    }

    /// Evaluate at a point indexed by variable index.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        match self {
            Expr::Monomial(m) => m.evaluate(point),
            Expr::Posynomial(p) => p.evaluate(point),
            Expr::Signomial(s) => s.evaluate(point),
            Expr::NonGp(n) => match n {
                NonGpExpr::Power(base, p) => base.evaluate(point).powf(*p),
                NonGpExpr::Quotient(a, b) => a.evaluate(point) / b.evaluate(point),
                NonGpExpr::Sum(a, b) => a.evaluate(point) + b.evaluate(point),
                NonGpExpr::Product(a, b) => a.evaluate(point) * b.evaluate(point),
                NonGpExpr::Neg(a) => -a.evaluate(point),
            },
        }
    }

    /// Collect all variables in this expression (sorted, deduplicated).
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars.into_iter().collect()
    }

    fn collect_variables(&self, vars: &mut BTreeSet<Variable>) {
        match self {
            Expr::Monomial(_) | Expr::Posynomial(_) | Expr::Signomial(_) => {
                for term in self.terms().unwrap_or_default() {
                    vars.extend(term.exponents.keys().copied());
                }
            }
            Expr::NonGp(n) => match n {
                NonGpExpr::Power(a, _) | NonGpExpr::Neg(a) => a.collect_variables(vars),
                NonGpExpr::Quotient(a, b) | NonGpExpr::Sum(a, b) | NonGpExpr::Product(a, b) => {
                    a.collect_variables(vars);
                    b.collect_variables(vars);
                }
            },
        }
    }
}

impl From<Monomial> for Expr {
    fn from(m: Monomial) -> Self {
        Expr::Monomial(m)
    }
}

impl From<Posynomial> for Expr {
    fn from(p: Posynomial) -> Self {
        Expr::Posynomial(p)
    }
}

impl From<Signomial> for Expr {
    fn from(s: Signomial) -> Self {
        Expr::Signomial(s)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<Variable> for Expr {
    fn from(var: Variable) -> Self {
        Expr::Monomial(var.as_monomial())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl Variable {
    /// The degenerate monomial `1 * self^1`.
    pub fn as_monomial(&self) -> Monomial {
        Monomial(MonomialTerm::variable(*self))
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[MonomialTerm]) -> fmt::Result {
    if terms.is_empty() {
        return write!(f, "0");
    }
    for (i, term) in terms.iter().enumerate() {
        if i == 0 {
            write!(f, "{}", term)?;
        } else if term.coefficient < 0.0 {
            write!(f, " - {}", term.neg())?;
        } else {
            write!(f, " + {}", term)?;
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Monomial(_) | Expr::Posynomial(_) | Expr::Signomial(_) => {
                write_terms(f, self.terms().unwrap_or_default())
            }
            Expr::NonGp(n) => match n {
                NonGpExpr::Power(a, p) => write!(f, "({})^{}", a, p),
                NonGpExpr::Quotient(a, b) => write!(f, "({}) / ({})", a, b),
                NonGpExpr::Sum(a, b) => write!(f, "({}) + ({})", a, b),
                NonGpExpr::Product(a, b) => write!(f, "({}) * ({})", a, b),
                NonGpExpr::Neg(a) => write!(f, "-({})", a),
            },
        }
    }
}
