//! Affine expressions over solver columns.
//!
//! After lowering, every row of the conic program is represented in
//! standard form: `sum_j(a_j * y_j) + b`, where column `j` is either the
//! log of a model variable or an auxiliary introduced by the lowering.

use std::collections::HashMap;

/// A scalar affine expression `sum_j(a_j * y_j) + b`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    /// Column -> coefficient.
    pub coeffs: HashMap<usize, f64>,
    /// Constant term (offset).
    pub constant: f64,
}

impl LinExpr {
    /// Create the zero expression.
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Create an expression for a single column (unit coefficient).
    pub fn variable(col: usize) -> Self {
        let mut coeffs = HashMap::new();
        coeffs.insert(col, 1.0);
        LinExpr {
            coeffs,
            constant: 0.0,
        }
    }

    /// Create a scalar constant.
    pub fn scalar(value: f64) -> Self {
        LinExpr {
            coeffs: HashMap::new(),
            constant: value,
        }
    }

    /// Check if this is a constant (no columns).
    pub fn is_constant(&self) -> bool {
        self.coeffs.values().all(|&c| c == 0.0)
    }

    /// Accumulate `coeff * y_col`.
    pub fn add_term(&mut self, col: usize, coeff: f64) {
        *self.coeffs.entry(col).or_insert(0.0) += coeff;
    }

    /// Add two linear expressions.
    pub fn add(&self, other: &LinExpr) -> LinExpr {
        let mut result = self.clone();
        for (&col, &coeff) in &other.coeffs {
            result.add_term(col, coeff);
        }
        result.constant += other.constant;
        result
    }

    /// Negate a linear expression.
    pub fn neg(&self) -> LinExpr {
        self.scale(-1.0)
    }

    /// Scale by a scalar.
    pub fn scale(&self, scalar: f64) -> LinExpr {
        LinExpr {
            coeffs: self.coeffs.iter().map(|(&k, &v)| (k, v * scalar)).collect(),
            constant: self.constant * scalar,
        }
    }

    /// Evaluate at a column assignment.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.coeffs
            .iter()
            .map(|(&col, &coeff)| coeff * x.get(col).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_columns() {
        let a = LinExpr::variable(0).add(&LinExpr::scalar(2.0));
        let b = LinExpr::variable(0).add(&LinExpr::variable(1));
        let c = a.add(&b);
        assert_eq!(c.coeffs[&0], 2.0);
        assert_eq!(c.coeffs[&1], 1.0);
        assert_eq!(c.constant, 2.0);
    }

    #[test]
    fn test_neg_and_evaluate() {
        let mut e = LinExpr::scalar(1.5);
        e.add_term(2, 3.0);
        let n = e.neg();
        assert_eq!(n.evaluate(&[0.0, 0.0, 2.0]), -7.5);
        assert!(!n.is_constant());
        assert!(LinExpr::scalar(4.0).is_constant());
    }
}
