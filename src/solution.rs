//! Mapping conic solutions back to the user's variable space.

use std::fmt;

use crate::canon::LoweredProblem;
use crate::constraints::ConstraintRecord;
use crate::error::{GpError, Result};
use crate::solver::{ConicSolution, SolveStatus};

/// Results of the most recent solve of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSolutionInfo {
    /// Value of each variable, by index.
    pub values: Vec<f64>,
    /// Objective value (1 for feasibility problems).
    pub objective_value: f64,
    /// Termination status.
    pub status: SolveStatus,
    /// Total solver wall-clock time in seconds.
    pub solve_time: f64,
    /// Dual value of each constraint, by index.
    pub duals: Vec<f64>,
    /// Number of conic solves performed (1 for geometric programs).
    pub iterations: usize,
    /// Whether the signomial loop met its tolerance.
    pub converged: bool,
}

impl ModelSolutionInfo {
    /// Value of the variable at `index`.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Dual value of the constraint at `index`.
    pub fn dual(&self, index: usize) -> Option<f64> {
        self.duals.get(index).copied()
    }

    /// Promote signomial non-convergence to an error.
    pub fn ensure_converged(&self) -> Result<&Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(GpError::SolveNotConverged {
                iterations: self.iterations,
            })
        }
    }
}

impl fmt::Display for ModelSolutionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status: {}", self.status)?;
        writeln!(f, "objective: {}", self.objective_value)?;
        writeln!(
            f,
            "iterations: {} ({})",
            self.iterations,
            if self.converged { "converged" } else { "not converged" }
        )?;
        writeln!(f, "solve time: {:.6}s", self.solve_time)?;
        for (i, v) in self.values.iter().enumerate() {
            writeln!(f, "  v{} = {}", i, v)?;
        }
        for (i, d) in self.duals.iter().enumerate() {
            writeln!(f, "  dual[{}] = {}", i, d)?;
        }
        Ok(())
    }
}

/// Map a raw conic solution onto the model.
///
/// Variable values are `exp(y_i)`, the objective is `exp(log f)` for either
/// sense, and each constraint dual is the raw cone dual scaled by the
/// objective value, negated for constraints written with `>=`.
pub(crate) fn map_solution(
    raw: &ConicSolution,
    lowered: &LoweredProblem,
    constraints: &[ConstraintRecord],
    num_vars: usize,
) -> ModelSolutionInfo {
    if !raw.status.is_acceptable() {
        tracing::warn!(
            component = "solution",
            operation = "map_solution",
            status = raw.status.as_str(),
            "Solver did not report an optimal solution; values may be meaningless"
        );
    }

    let values = (0..num_vars)
        .map(|i| raw.primal.get(i).map_or(f64::NAN, |y| y.exp()))
        .collect();
    let objective_value = lowered.log_objective(raw.objective).exp();
    let duals = lowered
        .dual_rows
        .iter()
        .zip(constraints)
        .map(|(&row, record)| {
            let dual = raw.duals.get(row).copied().unwrap_or(f64::NAN) * objective_value;
            if record.negate_dual {
                -dual
            } else {
                dual
            }
        })
        .collect();

    ModelSolutionInfo {
        values,
        objective_value,
        status: raw.status,
        solve_time: raw.solve_time,
        duals,
        iterations: 1,
        converged: true,
    }
}
