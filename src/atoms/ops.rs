//! Arithmetic over the expression algebra and operator overloading.
//!
//! Every operator is total over `{Variable, Expr, f64}`. Results are narrowed
//! to the tightest kind their terms allow; anything that leaves the signomial
//! algebra (division by a multi-term expression, real powers of sums) becomes
//! an opaque [`NonGpExpr`].

use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{Expr, MonomialTerm, NonGpExpr, Variable};

// ============================================================================
// Kind-level arithmetic
// ============================================================================

/// Sum of two expressions: terms are concatenated.
pub fn add_exprs(lhs: &Expr, rhs: &Expr) -> Expr {
    match (lhs.terms(), rhs.terms()) {
        (Some(a), Some(b)) => {
            let mut terms = Vec::with_capacity(a.len() + b.len());
            terms.extend_from_slice(a);
            terms.extend_from_slice(b);
            Expr::from_terms(terms)
        }
        _ => Expr::NonGp(NonGpExpr::Sum(Arc::new(lhs.clone()), Arc::new(rhs.clone()))),
    }
}

/// Negation: every coefficient flips sign.
pub fn neg_expr(expr: &Expr) -> Expr {
    match expr.terms() {
        Some(terms) => Expr::from_terms(terms.iter().map(MonomialTerm::neg).collect()),
        None => Expr::NonGp(NonGpExpr::Neg(Arc::new(expr.clone()))),
    }
}

/// Difference of two expressions.
pub fn sub_exprs(lhs: &Expr, rhs: &Expr) -> Expr {
    add_exprs(lhs, &neg_expr(rhs))
}

/// Product of two expressions: terms distribute pairwise.
pub fn mul_exprs(lhs: &Expr, rhs: &Expr) -> Expr {
    match (lhs.terms(), rhs.terms()) {
        (Some(a), Some(b)) => {
            let terms = a
                .iter()
                .flat_map(|ta| b.iter().map(move |tb| ta.mul(tb)))
                .collect();
            Expr::from_terms(terms)
        }
        _ => Expr::NonGp(NonGpExpr::Product(Arc::new(lhs.clone()), Arc::new(rhs.clone()))),
    }
}

/// Quotient of two expressions.
///
/// Dividing by a single nonzero term stays in the algebra (a negative divisor
/// degrades the result to a signomial). Division by a sum or by zero is non-GP.
pub fn div_exprs(lhs: &Expr, rhs: &Expr) -> Expr {
    match (lhs.terms(), rhs.terms()) {
        (Some(a), Some([divisor])) if divisor.coefficient != 0.0 => {
            Expr::from_terms(a.iter().map(|t| t.div(divisor)).collect())
        }
        _ => Expr::NonGp(NonGpExpr::Quotient(Arc::new(lhs.clone()), Arc::new(rhs.clone()))),
    }
}

/// Real power of an expression.
///
/// Single terms stay in the algebra when the result is real (positive base or
/// integer exponent). Zero raised to a negative power, and sums raised to any
/// power other than one, are non-GP.
pub fn power(expr: &Expr, p: f64) -> Expr {
    match expr.terms() {
        Some([term]) if term.coefficient == 0.0 && p < 0.0 => {
            Expr::NonGp(NonGpExpr::Power(Arc::new(expr.clone()), p))
        }
        Some([term]) if term.coefficient >= 0.0 || p.fract() == 0.0 => {
            Expr::from_terms(vec![term.powf(p)])
        }
        Some(_) if p == 1.0 => expr.clone(),
        _ => Expr::NonGp(NonGpExpr::Power(Arc::new(expr.clone()), p)),
    }
}

impl Expr {
    /// Raise to a real power.
    pub fn powf(&self, p: f64) -> Expr {
        power(self, p)
    }
}

impl Variable {
    /// Raise to a real power; always a monomial.
    pub fn powf(&self, p: f64) -> Expr {
        power(&Expr::Monomial(self.as_monomial()), p)
    }
}

// ============================================================================
// Operator overloading
// ============================================================================

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        neg_expr(&self)
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        neg_expr(self)
    }
}

impl Neg for Variable {
    type Output = Expr;

    fn neg(self) -> Expr {
        neg_expr(&Expr::Monomial(self.as_monomial()))
    }
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $func:ident) => {
        impl $op<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(&self, &rhs)
            }
        }

        impl $op<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(&self, rhs)
            }
        }

        impl $op<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(self, &rhs)
            }
        }

        impl $op<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(self, rhs)
            }
        }

        impl $op<Variable> for Variable {
            type Output = Expr;
            fn $method(self, rhs: Variable) -> Expr {
                $func(
                    &Expr::Monomial(self.as_monomial()),
                    &Expr::Monomial(rhs.as_monomial()),
                )
            }
        }

        impl $op<Variable> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Variable) -> Expr {
                $func(&self, &Expr::Monomial(rhs.as_monomial()))
            }
        }

        impl $op<Variable> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Variable) -> Expr {
                $func(self, &Expr::Monomial(rhs.as_monomial()))
            }
        }

        impl $op<Expr> for Variable {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(&Expr::Monomial(self.as_monomial()), &rhs)
            }
        }

        impl $op<&Expr> for Variable {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(&Expr::Monomial(self.as_monomial()), rhs)
            }
        }

        impl $op<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $func(&self, &Expr::constant(rhs))
            }
        }

        impl $op<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $func(self, &Expr::constant(rhs))
            }
        }

        impl $op<f64> for Variable {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $func(&Expr::Monomial(self.as_monomial()), &Expr::constant(rhs))
            }
        }

        impl $op<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(&Expr::constant(self), &rhs)
            }
        }

        impl $op<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(&Expr::constant(self), rhs)
            }
        }

        impl $op<Variable> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Variable) -> Expr {
                $func(&Expr::constant(self), &Expr::Monomial(rhs.as_monomial()))
            }
        }
    };
}

impl_binary_op!(Add, add, add_exprs);
impl_binary_op!(Sub, sub, sub_exprs);
impl_binary_op!(Mul, mul, mul_exprs);
impl_binary_op!(Div, div, div_exprs);

impl Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::from_terms(Vec::new()), |acc, e| add_exprs(&acc, &e))
    }
}

impl<'a> Sum<&'a Expr> for Expr {
    fn sum<I: Iterator<Item = &'a Expr>>(iter: I) -> Expr {
        iter.fold(Expr::from_terms(Vec::new()), |acc, e| add_exprs(&acc, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dgp::ExprKind;
    use crate::model::Model;

    fn xyz() -> (Variable, Variable, Variable) {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        let z = model.new_variable("z").unwrap();
        (x, y, z)
    }

    #[test]
    fn test_variable_product_is_monomial() {
        let (x, y, _) = xyz();
        let e = x * y;
        assert_eq!(e.kind(), ExprKind::Monomial);
        let m = e.as_monomial().unwrap();
        assert_eq!(m.coefficient(), 1.0);
        assert_eq!(m.term().exponent(x), 1.0);
        assert_eq!(m.term().exponent(y), 1.0);
    }

    #[test]
    fn test_scalar_products() {
        let (x, _, _) = xyz();
        assert_eq!((3.0 * x).kind(), ExprKind::Monomial);
        assert_eq!((-3.0 * x).kind(), ExprKind::Signomial);
        assert_eq!((0.0 * x).kind(), ExprKind::Signomial);
    }

    #[test]
    fn test_division_subtracts_exponents() {
        let (x, y, _) = xyz();
        let e = (6.0 * x * x) / (2.0 * y);
        let m = e.as_monomial().unwrap();
        assert_eq!(m.coefficient(), 3.0);
        assert_eq!(m.term().exponent(x), 2.0);
        assert_eq!(m.term().exponent(y), -1.0);
    }

    #[test]
    fn test_division_by_negative_constant_degrades() {
        let (x, _, _) = xyz();
        assert_eq!((x / -2.0).kind(), ExprKind::Signomial);
        assert_eq!((-2.0 / x).kind(), ExprKind::Signomial);
    }

    #[test]
    fn test_division_by_sum_is_non_gp() {
        let (x, y, z) = xyz();
        assert_eq!((x / (y + z)).kind(), ExprKind::NonGp);
        assert_eq!((x / 0.0).kind(), ExprKind::NonGp);
    }

    #[test]
    fn test_posynomial_division_by_monomial() {
        let (x, y, z) = xyz();
        let e = (x + y) / (2.0 * z);
        assert_eq!(e.kind(), ExprKind::Posynomial);
        assert_eq!(e.terms().unwrap().len(), 2);
    }

    #[test]
    fn test_power() {
        let (x, y, _) = xyz();
        let e = (4.0 * x * y.powf(2.0)).powf(0.5);
        let m = e.as_monomial().unwrap();
        assert_eq!(m.coefficient(), 2.0);
        assert_eq!(m.term().exponent(x), 0.5);
        assert_eq!(m.term().exponent(y), 1.0);

        assert_eq!((x + y).powf(2.0).kind(), ExprKind::NonGp);
        assert_eq!((x + y).powf(1.0).kind(), ExprKind::Posynomial);
    }

    #[test]
    fn test_zero_to_negative_power_is_non_gp() {
        let (x, _, _) = xyz();
        let e = Expr::constant(0.0).powf(-1.0);
        assert_eq!(e.kind(), ExprKind::NonGp);
        assert_eq!((e * x).kind(), ExprKind::NonGp);
        assert_eq!(Expr::constant(0.0).powf(2.0).kind(), ExprKind::Monomial);
    }

    #[test]
    fn test_addition_kinds() {
        let (x, y, _) = xyz();
        assert_eq!((x + y).kind(), ExprKind::Posynomial);
        assert_eq!((x + 1.0).kind(), ExprKind::Posynomial);
        assert_eq!((x - y).kind(), ExprKind::Signomial);
        assert_eq!((x + -1.0).kind(), ExprKind::Signomial);
        assert_eq!((-x).kind(), ExprKind::Signomial);
    }

    #[test]
    fn test_narrowing_back_to_posynomial() {
        let (x, y, _) = xyz();
        // Negating twice recovers positive coefficients.
        assert_eq!((-(-x)).kind(), ExprKind::Monomial);
        assert_eq!((x - (-1.0 * y)).kind(), ExprKind::Posynomial);
    }

    #[test]
    fn test_posynomial_times_monomial() {
        let (x, y, z) = xyz();
        let e = (x + y) * z;
        assert_eq!(e.kind(), ExprKind::Posynomial);
        let terms = e.terms().unwrap();
        assert_eq!(terms[0], MonomialTerm::new(1.0, [(x, 1.0), (z, 1.0)]));
        assert_eq!(terms[1], MonomialTerm::new(1.0, [(y, 1.0), (z, 1.0)]));
    }

    #[test]
    fn test_signomial_distributes() {
        let (x, y, z) = xyz();
        let e = (x - y) * (z + 1.0);
        assert_eq!(e.kind(), ExprKind::Signomial);
        assert_eq!(e.terms().unwrap().len(), 4);
    }

    #[test]
    fn test_non_gp_is_absorbing() {
        let (x, y, _) = xyz();
        let bad = (x + y).powf(0.5);
        assert_eq!((&bad + x).kind(), ExprKind::NonGp);
        assert_eq!((&bad * 2.0).kind(), ExprKind::NonGp);
        assert_eq!((-&bad).kind(), ExprKind::NonGp);
        assert!((bad.evaluate(&[1.0, 3.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sum_iterator() {
        let (x, y, z) = xyz();
        let e: Expr = [x, y, z].into_iter().map(Expr::from).sum();
        assert_eq!(e.kind(), ExprKind::Posynomial);
        assert_eq!(e.evaluate(&[1.0, 2.0, 3.0]), 6.0);
    }
}
