//! Successive convexification for signomial programs.
//!
//! Each iteration replaces every true signomial constraint `p(x) <= q(x)` by
//! `p(x) / q~(x) <= 1`, where `q~` is the monomial tangent to `q` in log-space
//! at the current linearization point, then solves the resulting GP. The loop
//! stops when successive points agree within tolerance or the iteration
//! budget runs out; the last iterate is reported either way. Only local
//! stationarity is reached, and the objective need not improve monotonically.

use nalgebra::DVector;

use crate::canon::{lower, GpConstraint, GpObjective};
use crate::constraints::{CanonicalForm, ConstraintRecord};
use crate::error::{GpError, Result};
use crate::expr::{Monomial, Posynomial, VariableData};
use crate::solution::{map_solution, ModelSolutionInfo};
use crate::solver::{ConicSolver, SolveStatus};

/// Settings of the signomial loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SpSettings {
    /// Maximum number of convex solves.
    pub max_iterations: usize,
    /// Relative tolerance on `|x - x_prev| / |x|`.
    pub reltol: f64,
    /// Absolute tolerance on `|x - x_prev|`.
    pub abstol: f64,
}

impl Default for SpSettings {
    fn default() -> Self {
        SpSettings {
            max_iterations: 100,
            reltol: 1e-6,
            abstol: 1e-6,
        }
    }
}

impl SpSettings {
    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative step tolerance.
    pub fn with_reltol(mut self, reltol: f64) -> Self {
        self.reltol = reltol;
        self
    }

    /// Set the absolute step tolerance.
    pub fn with_abstol(mut self, abstol: f64) -> Self {
        self.abstol = abstol;
        self
    }
}

/// Approximate a posynomial by the monomial tangent to it in log-space at `point`.
///
/// With `q0 = q(x0)` the exponents are `e_i = sum_k a_ki * t_k(x0) / q0` and
/// the coefficient is `q0 / prod(x0_i^e_i)`, so the monomial matches `q` and
/// its log-space gradient at `x0`. A single-term posynomial is returned
/// unchanged.
pub fn approximate_as_monomial(posynomial: &Posynomial, point: &[f64]) -> Result<Monomial> {
    if let Some(term) = posynomial.single_term() {
        return Monomial::try_from_term(term.clone());
    }
    if posynomial.is_empty() {
        return Err(GpError::InvalidCoefficient {
            coefficient: 0.0,
            reason: "cannot approximate the zero posynomial by a monomial".into(),
        });
    }

    let q0 = posynomial.evaluate(point);
    let mut exponents = std::collections::BTreeMap::new();
    for term in posynomial.terms() {
        let weight = term.evaluate(point) / q0;
        for (&var, &a) in &term.exponents {
            *exponents.entry(var).or_insert(0.0) += a * weight;
        }
    }

    let scale: f64 = exponents
        .iter()
        .map(|(var, &e)| point.get(var.index()).map_or(f64::NAN, |x0| x0.powf(e)))
        .product();
    Monomial::new(q0 / scale, exponents)
}

/// GP constraints for one iteration, linearizing signomial records at `point`.
fn convexify(constraints: &[ConstraintRecord], point: &[f64]) -> Result<Vec<GpConstraint>> {
    constraints
        .iter()
        .map(|record| match &record.form {
            CanonicalForm::Signomial { p, q } => {
                let tangent = approximate_as_monomial(q, point)?;
                Ok(GpConstraint::Inequality(p.div_term(tangent.term())))
            }
            form => form.to_gp().ok_or_else(|| {
                GpError::InvalidConstraintForm(format!("`{}` has no GP form", record.relation))
            }),
        })
        .collect()
}

/// Run the loop, appending each iterate to the variables' linearization points.
pub(crate) fn solve_signomial(
    variables: &mut [VariableData],
    constraints: &[ConstraintRecord],
    objective: Option<&GpObjective>,
    settings: &SpSettings,
    solver: &dyn ConicSolver,
) -> Result<ModelSolutionInfo> {
    let has_signomial = constraints.iter().any(ConstraintRecord::is_true_signomial);
    for data in variables.iter_mut() {
        if data.linearization_points.is_empty() {
            let seed = data.seed_point();
            data.linearization_points.push(seed);
        }
    }

    let mut last: Option<ModelSolutionInfo> = None;
    let mut total_time = 0.0;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < settings.max_iterations.max(1) {
        iterations += 1;
        let point: Vec<f64> = variables
            .iter()
            .map(|v| v.current_point().unwrap_or_else(|| v.seed_point()))
            .collect();

        let gp_constraints = convexify(constraints, &point)?;
        let lowered = lower(variables, &gp_constraints, objective);
        let raw = solver.solve(&lowered.program)?;
        total_time += raw.solve_time;
        let info = map_solution(&raw, &lowered, constraints, variables.len());

        if !raw.status.is_acceptable() {
            tracing::warn!(
                component = "sp",
                operation = "iterate",
                status = raw.status.as_str(),
                iteration = iterations,
                "Convex subproblem failed; stopping signomial loop"
            );
            last = Some(info);
            break;
        }

        let previous = DVector::from_vec(point);
        let current = DVector::from_column_slice(&info.values);
        let abs_err = (&current - &previous).norm();
        let rel_err = abs_err / current.norm();
        for (data, &value) in variables.iter_mut().zip(&info.values) {
            data.linearization_points.push(value);
        }

        tracing::debug!(
            component = "sp",
            operation = "iterate",
            status = "success",
            iteration = iterations,
            rel_err,
            abs_err,
            objective = info.objective_value,
            "Signomial iteration"
        );

        last = Some(info);
        if !has_signomial || rel_err <= settings.reltol || abs_err <= settings.abstol {
            converged = true;
            break;
        }
    }

    let mut info = last.ok_or_else(|| GpError::SolverError("signomial loop ran no iterations".into()))?;
    info.iterations = iterations;
    info.solve_time = total_time;
    info.converged = converged;
    if converged {
        info.status = SolveStatus::LocallySolved;
    } else {
        tracing::warn!(
            component = "sp",
            operation = "solve",
            status = "not_converged",
            iterations,
            "Signomial loop did not converge; reporting the last iterate"
        );
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_single_term_is_idempotent() {
        let mut model = Model::sp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        let posy = (3.0 * x * y.powf(-0.5)).as_posynomial().unwrap();
        let mono = approximate_as_monomial(&posy, &[2.0, 7.0]).unwrap();
        assert_eq!(mono.term(), &posy.terms()[0]);
    }

    #[test]
    fn test_tangent_matches_value_and_gradient() {
        let mut model = Model::sp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        let posy = (x + 2.0 * y + x * y).as_posynomial().unwrap();
        let point = [1.5, 0.5];

        let mono = approximate_as_monomial(&posy, &point).unwrap();
        let q0 = posy.evaluate(&point);
        assert!((mono.evaluate(&point) - q0).abs() < TOL);

        // d log q / d log x = x * dq/dx / q
        let ex = point[0] * (1.0 + point[1]) / q0;
        let ey = point[1] * (2.0 + point[0]) / q0;
        assert!((mono.term().exponent(x) - ex).abs() < TOL);
        assert!((mono.term().exponent(y) - ey).abs() < TOL);
    }

    #[test]
    fn test_tangent_underestimates_posynomial() {
        let mut model = Model::sp();
        let x = model.new_variable("x").unwrap();
        let posy = (x + x.powf(-1.0)).as_posynomial().unwrap();
        let mono = approximate_as_monomial(&posy, &[2.0]).unwrap();
        for &pt in &[0.5, 1.0, 3.0, 10.0] {
            assert!(mono.evaluate(&[pt]) <= posy.evaluate(&[pt]) + TOL);
        }
    }

    #[test]
    fn test_zero_posynomial_is_rejected() {
        let err = approximate_as_monomial(&Posynomial::zero(), &[]).unwrap_err();
        assert_eq!(err.code(), "EXPR_INVALID_COEFFICIENT");
    }

    #[test]
    fn test_settings_builders() {
        let s = SpSettings::default().with_max_iterations(5).with_reltol(1e-3);
        assert_eq!(s.max_iterations, 5);
        assert_eq!(s.reltol, 1e-3);
        assert_eq!(s.abstol, 1e-6);
    }
}
