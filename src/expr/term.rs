//! The signed monomial term, the primitive every expression is built from.

use std::collections::BTreeMap;
use std::fmt;

use super::variable::Variable;

/// A coefficient times a product of variables raised to real powers.
///
/// No sign constraint is placed on the coefficient. Exponent maps never hold
/// zero exponents, so structurally equal terms compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct MonomialTerm {
    /// Scalar coefficient.
    pub coefficient: f64,
    /// Variable -> exponent.
    pub exponents: BTreeMap<Variable, f64>,
}

impl MonomialTerm {
    /// Create a term, summing repeated variables and dropping zero exponents.
    pub fn new(coefficient: f64, exponents: impl IntoIterator<Item = (Variable, f64)>) -> Self {
        let mut term = MonomialTerm::constant(coefficient);
        for (var, exp) in exponents {
            term.add_exponent(var, exp);
        }
        term
    }

    /// Create a constant term.
    pub fn constant(coefficient: f64) -> Self {
        MonomialTerm {
            coefficient,
            exponents: BTreeMap::new(),
        }
    }

    /// Create the term `1 * var^1`.
    pub fn variable(var: Variable) -> Self {
        MonomialTerm::new(1.0, [(var, 1.0)])
    }

    fn add_exponent(&mut self, var: Variable, exp: f64) {
        let entry = self.exponents.entry(var).or_insert(0.0);
        *entry += exp;
        if *entry == 0.0 {
            self.exponents.remove(&var);
        }
    }

    /// Check if the term has no variables.
    pub fn is_constant(&self) -> bool {
        self.exponents.is_empty()
    }

    /// Check if the term may appear in a monomial or posynomial.
    ///
    /// The coefficient must be strictly positive, except for the degenerate
    /// zero scalar.
    pub fn is_positive(&self) -> bool {
        self.coefficient > 0.0 || (self.coefficient == 0.0 && self.exponents.is_empty())
    }

    /// Product of two terms: coefficients multiply, exponents add.
    pub fn mul(&self, other: &MonomialTerm) -> MonomialTerm {
        let mut result = self.clone();
        result.coefficient *= other.coefficient;
        for (&var, &exp) in &other.exponents {
            result.add_exponent(var, exp);
        }
        result
    }

    /// Quotient of two terms: coefficients divide, exponents subtract.
    pub fn div(&self, other: &MonomialTerm) -> MonomialTerm {
        let mut result = self.clone();
        result.coefficient /= other.coefficient;
        for (&var, &exp) in &other.exponents {
            result.add_exponent(var, -exp);
        }
        result
    }

    /// Raise to a real power: coefficient^p, exponents times p.
    pub fn powf(&self, p: f64) -> MonomialTerm {
        if p == 0.0 {
            return MonomialTerm::constant(1.0);
        }
        MonomialTerm {
            coefficient: self.coefficient.powf(p),
            exponents: self.exponents.iter().map(|(&v, &e)| (v, e * p)).collect(),
        }
    }

    /// Multiply the coefficient by a scalar.
    pub fn scale(&self, factor: f64) -> MonomialTerm {
        MonomialTerm {
            coefficient: self.coefficient * factor,
            exponents: self.exponents.clone(),
        }
    }

    /// Negate the coefficient.
    pub fn neg(&self) -> MonomialTerm {
        self.scale(-1.0)
    }

    /// Evaluate at a point indexed by variable index.
    ///
    /// Variables outside the point evaluate to NaN.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.exponents.iter().fold(self.coefficient, |acc, (var, &exp)| {
            let value = point.get(var.index()).copied().unwrap_or(f64::NAN);
            acc * value.powf(exp)
        })
    }

    /// Exponent of a variable (zero when absent).
    pub fn exponent(&self, var: Variable) -> f64 {
        self.exponents.get(&var).copied().unwrap_or(0.0)
    }
}

impl fmt::Display for MonomialTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponents.is_empty() {
            return write!(f, "{}", self.coefficient);
        }
        let mut first = true;
        if self.coefficient != 1.0 {
            write!(f, "{}", self.coefficient)?;
            first = false;
        }
        for (var, &exp) in &self.exponents {
            if !first {
                write!(f, "*")?;
            }
            first = false;
            if exp == 1.0 {
                write!(f, "{}", var)?;
            } else {
                write!(f, "{}^{}", var, exp)?;
            }
        }
        Ok(())
    }
}
