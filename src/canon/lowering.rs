//! Log-space lowering of GP-canonical problems.
//!
//! With `y_i = log(x_i)` a monomial `c * prod(x_i^a_i)` becomes the affine
//! function `log(c) + sum(a_i * y_i)`. The lowering produces:
//! - `monomial == 1` -> zero-cone row `log(c) + a'y = 0`
//! - single-term `posynomial <= 1` -> nonnegative row `-(log(c) + a'y) >= 0`
//! - multi-term `posynomial <= 1` -> auxiliaries `u_k >= 0` with
//!   `(log(c_k) + a_k'y, 1, u_k)` in the exponential cone and `sum(u_k) <= 1`,
//!   the standard encoding of `log(sum(exp(z_k))) <= 0`
//! - a multi-term minimized posynomial `f` -> free auxiliary `t`, minimize `t`
//!   subject to `f / exp(t) <= 1` with the same encoding

use super::lin_expr::LinExpr;
use crate::error::{GpError, Result};
use crate::expr::{Expr, Monomial, MonomialTerm, Posynomial, VariableData};

/// A cone constraint in standard form.
#[derive(Debug, Clone, PartialEq)]
pub enum ConeConstraint {
    /// Zero cone: a'y + b = 0 (equality).
    Zero { a: LinExpr },
    /// Nonnegative cone: a'y + b >= 0.
    NonNeg { a: LinExpr },
    /// Exponential cone: {(x, y, z) | y > 0, y*exp(x/y) <= z} ∪ {(x,y,z) | x <= 0, y = 0, z >= 0}
    /// Variable order is (x, y, z).
    ExpCone {
        /// The x expression.
        x: LinExpr,
        /// The y expression.
        y: LinExpr,
        /// The z expression.
        z: LinExpr,
    },
}

/// Bounds of a solver column; equal bounds fix the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBounds {
    /// Lower bound (may be `-inf`).
    pub lower: f64,
    /// Upper bound (may be `+inf`).
    pub upper: f64,
}

impl ColumnBounds {
    /// Unbounded column.
    pub fn free() -> Self {
        ColumnBounds {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// Check if the column is fixed.
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

/// Solver-neutral conic program: minimize `objective` over bounded columns
/// subject to cone constraints.
#[derive(Debug, Clone, Default)]
pub struct ConicProgram {
    /// Bounds per column; the column count is `bounds.len()`.
    pub bounds: Vec<ColumnBounds>,
    /// Linear objective (always minimized).
    pub objective: LinExpr,
    /// Cone constraints.
    pub constraints: Vec<ConeConstraint>,
}

impl ConicProgram {
    /// Number of columns.
    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }
}

/// Objective direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveSense {
    /// Minimize a posynomial.
    Minimize,
    /// Maximize a monomial.
    Maximize,
}

/// A validated GP objective.
#[derive(Debug, Clone, PartialEq)]
pub enum GpObjective {
    /// Minimize a posynomial (zero terms removed).
    Minimize(Posynomial),
    /// Maximize a monomial.
    Maximize(Monomial),
}

impl GpObjective {
    /// Validate an objective expression against GP rules.
    pub fn new(sense: ObjectiveSense, expr: &Expr) -> Result<Self> {
        if let Some(term) = expr
            .terms()
            .and_then(|terms| terms.iter().find(|t| !t.coefficient.is_finite()))
        {
            return Err(GpError::InvalidCoefficient {
                coefficient: term.coefficient,
                reason: "objective coefficients must be finite".into(),
            });
        }
        match sense {
            ObjectiveSense::Minimize => {
                let posy = expr.as_posynomial().ok_or_else(|| {
                    GpError::InvalidObjectiveForm(format!(
                        "cannot minimize {} `{}`; the objective must be a posynomial",
                        expr.kind(),
                        expr
                    ))
                })?;
                let terms: Vec<MonomialTerm> = posy
                    .terms()
                    .iter()
                    .filter(|t| t.coefficient > 0.0)
                    .cloned()
                    .collect();
                if terms.is_empty() {
                    return Err(GpError::InvalidObjectiveForm(
                        "cannot minimize an objective that is identically zero".into(),
                    ));
                }
                Ok(GpObjective::Minimize(Posynomial::new(terms)?))
            }
            ObjectiveSense::Maximize => match expr.as_monomial() {
                Some(m) if m.coefficient() > 0.0 => Ok(GpObjective::Maximize(m)),
                _ => Err(GpError::InvalidObjectiveForm(format!(
                    "cannot maximize {} `{}`; the objective must be a monomial",
                    expr.kind(),
                    expr
                ))),
            },
        }
    }

    /// Objective direction.
    pub fn sense(&self) -> ObjectiveSense {
        match self {
            GpObjective::Minimize(_) => ObjectiveSense::Minimize,
            GpObjective::Maximize(_) => ObjectiveSense::Maximize,
        }
    }

    /// Evaluate the objective at a point.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        match self {
            GpObjective::Minimize(p) => p.evaluate(point),
            GpObjective::Maximize(m) => m.evaluate(point),
        }
    }
}

/// A GP-canonical constraint ready for lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum GpConstraint {
    /// `monomial == 1`
    Equality(Monomial),
    /// `posynomial <= 1`
    Inequality(Posynomial),
}

/// Result of lowering a GP.
#[derive(Debug)]
pub struct LoweredProblem {
    /// The conic program.
    pub program: ConicProgram,
    /// For each input constraint, the index of the cone constraint whose dual it reports.
    pub dual_rows: Vec<usize>,
    /// The solver objective is `-log(f)` rather than `log(f)`.
    pub negated_objective: bool,
}

impl LoweredProblem {
    /// Recover `log(f)` from the solver's objective value.
    pub fn log_objective(&self, solver_objective: f64) -> f64 {
        if self.negated_objective {
            -solver_objective
        } else {
            solver_objective
        }
    }
}

/// Lower a GP over the model's variables.
///
/// Column `i` of the program is `log(x_i)` for model variable `i`; auxiliary
/// columns follow. A missing objective lowers to the feasibility problem
/// `minimize 1`.
pub fn lower(
    variables: &[VariableData],
    constraints: &[GpConstraint],
    objective: Option<&GpObjective>,
) -> LoweredProblem {
    let mut ctx = LoweringContext::new(variables);

    let dual_rows = constraints
        .iter()
        .map(|c| match c {
            GpConstraint::Equality(m) => ctx.push(ConeConstraint::Zero {
                a: log_affine(m.term()),
            }),
            GpConstraint::Inequality(p) => ctx.lower_posynomial_leq(p, &LinExpr::zeros()),
        })
        .collect();

    let (objective, negated_objective) = match objective {
        None => (LinExpr::scalar(0.0), false),
        Some(GpObjective::Maximize(m)) => (log_affine(m.term()).neg(), true),
        Some(GpObjective::Minimize(p)) => match p.single_term() {
            Some(t) => (log_affine(t), false),
            None => {
                let t = ctx.new_aux_var(ColumnBounds::free());
                ctx.lower_posynomial_leq(p, &t.neg());
                (t, false)
            }
        },
    };

    tracing::debug!(
        component = "lowering",
        operation = "lower",
        status = "success",
        columns = ctx.bounds.len(),
        cones = ctx.constraints.len(),
        "Lowered geometric program to conic form"
    );

    LoweredProblem {
        program: ConicProgram {
            bounds: ctx.bounds,
            objective,
            constraints: ctx.constraints,
        },
        dual_rows,
        negated_objective,
    }
}

/// `log(c) + sum(a_i * y_i)` for a positive term.
pub fn log_affine(term: &MonomialTerm) -> LinExpr {
    let mut lin = LinExpr::scalar(term.coefficient.ln());
    for (var, &exp) in &term.exponents {
        lin.add_term(var.index(), exp);
    }
    lin
}

/// Column bounds `[log(lb), log(ub)]`, or a fixed column at `log(v)`.
fn log_bounds(data: &VariableData) -> ColumnBounds {
    match data.fixed {
        Some(v) => ColumnBounds {
            lower: v.ln(),
            upper: v.ln(),
        },
        None => ColumnBounds {
            lower: data.effective_lower().ln(),
            upper: data.effective_upper().ln(),
        },
    }
}

/// Context for lowering, tracking auxiliary columns and constraints.
struct LoweringContext {
    bounds: Vec<ColumnBounds>,
    constraints: Vec<ConeConstraint>,
}

impl LoweringContext {
    fn new(variables: &[VariableData]) -> Self {
        LoweringContext {
            bounds: variables.iter().map(log_bounds).collect(),
            constraints: Vec::new(),
        }
    }

    fn push(&mut self, constraint: ConeConstraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    /// Create a new auxiliary column.
    fn new_aux_var(&mut self, bounds: ColumnBounds) -> LinExpr {
        self.bounds.push(bounds);
        LinExpr::variable(self.bounds.len() - 1)
    }

    /// Create a new non-negative auxiliary column.
    fn new_nonneg_aux_var(&mut self) -> LinExpr {
        self.new_aux_var(ColumnBounds {
            lower: 0.0,
            upper: f64::INFINITY,
        })
    }

    /// Lower `sum_k exp(z_k + shift) <= 1`; returns the dual-bearing constraint.
    fn lower_posynomial_leq(&mut self, p: &Posynomial, shift: &LinExpr) -> usize {
        match p.terms() {
            [term] => self.push(ConeConstraint::NonNeg {
                a: log_affine(term).add(shift).neg(),
            }),
            terms => {
                let mut total = LinExpr::zeros();
                for term in terms {
                    let u = self.new_nonneg_aux_var();
                    self.push(ConeConstraint::ExpCone {
                        x: log_affine(term).add(shift),
                        y: LinExpr::scalar(1.0),
                        z: u.clone(),
                    });
                    total = total.add(&u);
                }
                // 1 - sum(u_k) >= 0
                self.push(ConeConstraint::NonNeg {
                    a: LinExpr::scalar(1.0).add(&total.neg()),
                })
            }
        }
    }
}
