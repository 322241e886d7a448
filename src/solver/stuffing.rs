//! Matrix stuffing: converts a conic program to solver format.
//!
//! This module builds the matrices (q, A, b) and cone specifications
//! required by Clarabel. Column bounds become rows: fixed columns join the
//! zero cone, finite lower/upper bounds join the nonnegative cone.

use nalgebra_sparse::CscMatrix;

use crate::canon::{ConeConstraint, ConicProgram, LinExpr};
use crate::sparse::csc_from_triplets;

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
    /// Number of exponential cones (each is 3D).
    pub exp: usize,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg + self.exp * 3
    }
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Linear cost vector q (n).
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions.
    pub cone_dims: ConeDims,
    /// First row of each program constraint, for dual recovery.
    pub row_of: Vec<usize>,
    /// Constant offset in objective.
    pub objective_offset: f64,
}

impl StuffedProblem {
    /// Number of columns.
    pub fn num_vars(&self) -> usize {
        self.q.len()
    }
}

/// Row accumulator for A and b.
#[derive(Default)]
struct Rows {
    a_rows: Vec<usize>,
    a_cols: Vec<usize>,
    a_vals: Vec<f64>,
    b: Vec<f64>,
}

impl Rows {
    /// Append one row for `expr`.
    ///
    /// The LinExpr represents: expr = sum_j(a_j * y_j) + constant
    ///
    /// For Zero cone (equality): expr = 0
    ///   - Clarabel form: Ax + s = b, s = 0
    ///   - A = coeffs, b = -constant
    ///
    /// For NonNeg and Exp cones: s = expr must lie in the cone
    ///   - A = -coeffs, b = constant
    fn push(&mut self, expr: &LinExpr, negate: bool) -> usize {
        let row = self.b.len();
        let sign = if negate { -1.0 } else { 1.0 };
        for (&col, &coeff) in &expr.coeffs {
            if coeff != 0.0 {
                self.a_rows.push(row);
                self.a_cols.push(col);
                self.a_vals.push(coeff * sign);
            }
        }
        self.b.push(-sign * expr.constant);
        row
    }
}

/// Build the stuffed problem from a conic program.
pub fn stuff_problem(program: &ConicProgram) -> StuffedProblem {
    let n = program.num_vars();

    let mut q = vec![0.0; n];
    for (&col, &coeff) in &program.objective.coeffs {
        if col < n {
            q[col] += coeff;
        }
    }

    let mut rows = Rows::default();
    let mut row_of = vec![0; program.constraints.len()];
    let mut cone_dims = ConeDims::default();

    // Zero cone: fixed columns, then equalities.
    for (col, bounds) in program.bounds.iter().enumerate() {
        if bounds.is_fixed() {
            rows.push(&LinExpr::variable(col).add(&LinExpr::scalar(-bounds.lower)), false);
            cone_dims.zero += 1;
        }
    }
    for (i, c) in program.constraints.iter().enumerate() {
        if let ConeConstraint::Zero { a } = c {
            row_of[i] = rows.push(a, false);
            cone_dims.zero += 1;
        }
    }

    // Nonnegative cone: column bounds, then inequalities.
    for (col, bounds) in program.bounds.iter().enumerate() {
        if bounds.is_fixed() {
            continue;
        }
        if bounds.lower.is_finite() {
            // y - lower >= 0
            rows.push(&LinExpr::variable(col).add(&LinExpr::scalar(-bounds.lower)), true);
            cone_dims.nonneg += 1;
        }
        if bounds.upper.is_finite() {
            // upper - y >= 0
            rows.push(&LinExpr::scalar(bounds.upper).add(&LinExpr::variable(col).neg()), true);
            cone_dims.nonneg += 1;
        }
    }
    for (i, c) in program.constraints.iter().enumerate() {
        if let ConeConstraint::NonNeg { a } = c {
            row_of[i] = rows.push(a, true);
            cone_dims.nonneg += 1;
        }
    }

    // Exponential cone: (x, y, z) in K_exp, stored in that order.
    for (i, c) in program.constraints.iter().enumerate() {
        if let ConeConstraint::ExpCone { x, y, z } = c {
            row_of[i] = rows.push(x, true);
            rows.push(y, true);
            rows.push(z, true);
            cone_dims.exp += 1;
        }
    }

    let m = rows.b.len();
    let a = csc_from_triplets(m, n, rows.a_rows, rows.a_cols, rows.a_vals);

    StuffedProblem {
        q,
        a,
        b: rows.b,
        cone_dims,
        row_of,
        objective_offset: program.objective.constant,
    }
}
