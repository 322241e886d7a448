//! Backend-neutral solver interface.

use std::fmt;

use crate::canon::ConicProgram;
use crate::error::Result;

/// Termination status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Solved to reduced accuracy.
    AlmostOptimal,
    /// SP loop reached a local fixed point.
    LocallySolved,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Maximum iterations or time reached.
    MaxIterations,
    /// Numerical difficulties.
    NumericalError,
    /// Unknown status.
    Unknown,
}

impl SolveStatus {
    /// Statuses whose values can be trusted without a warning.
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::AlmostOptimal | SolveStatus::LocallySolved
        )
    }

    /// Stable lowercase name, used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::AlmostOptimal => "almost_optimal",
            SolveStatus::LocallySolved => "locally_solved",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::MaxIterations => "max_iterations",
            SolveStatus::NumericalError => "numerical_error",
            SolveStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw result of a conic solve, indexed like the program it came from.
#[derive(Debug, Clone)]
pub struct ConicSolution {
    /// Solution status.
    pub status: SolveStatus,
    /// Value of every column.
    pub primal: Vec<f64>,
    /// One dual per cone constraint (the first component for exponential cones).
    pub duals: Vec<f64>,
    /// Objective value including the constant offset.
    pub objective: f64,
    /// Number of iterations.
    pub iterations: u32,
    /// Solve time in seconds.
    pub solve_time: f64,
}

/// A conic solver accepting zero, nonnegative and exponential cones.
pub trait ConicSolver {
    /// Solve the program.
    fn solve(&self, program: &ConicProgram) -> Result<ConicSolution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptable_statuses() {
        assert!(SolveStatus::Optimal.is_acceptable());
        assert!(SolveStatus::AlmostOptimal.is_acceptable());
        assert!(SolveStatus::LocallySolved.is_acceptable());
        assert!(!SolveStatus::Infeasible.is_acceptable());
        assert!(!SolveStatus::MaxIterations.is_acceptable());
        assert_eq!(SolveStatus::LocallySolved.to_string(), "locally_solved");
    }
}
