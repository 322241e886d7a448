//! Error types for geoprog.

use thiserror::Error;

/// Error type for geoprog operations.
///
/// Every declaration-time failure is raised immediately; nothing is deferred
/// to solve time, and a failed declaration leaves the model untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GpError {
    /// A monomial or posynomial was built with a non-positive coefficient.
    #[error("Invalid coefficient {coefficient}: {reason}")]
    InvalidCoefficient { coefficient: f64, reason: String },

    /// The relation cannot be normalized into a supported canonical form.
    #[error("Invalid constraint form: {0}")]
    InvalidConstraintForm(String),

    /// An expression references a variable owned by a different model.
    #[error("Variable {variable} does not belong to this model")]
    CrossModelVariable { variable: String },

    /// The right-hand side of a relation is zero, which has no logarithm.
    #[error("Right-hand side of a constraint cannot be zero")]
    ZeroRightHandSide,

    /// The objective is not a posynomial (minimize) or monomial (maximize).
    #[error("Invalid objective form: {0}")]
    InvalidObjectiveForm(String),

    /// Variable bounds or fixed values are not strictly positive or inconsistent.
    #[error("Invalid bounds for variable {name}: {reason}")]
    InvalidBounds { name: String, reason: String },

    /// Solution data was requested before a solve completed.
    #[error("Model has not been solved yet")]
    NotSolvedYet,

    /// No dual value is available for the requested constraint.
    #[error("Dual value unavailable for constraint {0}")]
    DualUnavailable(usize),

    /// The signomial loop exhausted its iteration budget.
    #[error("Signomial solve did not converge after {iterations} iterations")]
    SolveNotConverged { iterations: usize },

    /// The conic backend could not be configured or failed to run.
    #[error("Solver error: {0}")]
    SolverError(String),
}

impl GpError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            GpError::InvalidCoefficient { .. } => "EXPR_INVALID_COEFFICIENT",
            GpError::InvalidConstraintForm(_) => "CONSTRAINT_INVALID_FORM",
            GpError::CrossModelVariable { .. } => "VARIABLE_CROSS_MODEL",
            GpError::ZeroRightHandSide => "CONSTRAINT_ZERO_RHS",
            GpError::InvalidObjectiveForm(_) => "OBJECTIVE_INVALID_FORM",
            GpError::InvalidBounds { .. } => "VARIABLE_INVALID_BOUNDS",
            GpError::NotSolvedYet => "SOLUTION_NOT_SOLVED",
            GpError::DualUnavailable(_) => "SOLUTION_DUAL_UNAVAILABLE",
            GpError::SolveNotConverged { .. } => "SOLVE_NOT_CONVERGED",
            GpError::SolverError(_) => "SOLVER_INTERNAL",
        }
    }
}

/// Result type for geoprog operations.
pub type Result<T> = std::result::Result<T, GpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            GpError::InvalidCoefficient {
                coefficient: 0.0,
                reason: "zero".into(),
            },
            GpError::InvalidConstraintForm("bad".into()),
            GpError::CrossModelVariable {
                variable: "x".into(),
            },
            GpError::ZeroRightHandSide,
            GpError::InvalidObjectiveForm("bad".into()),
            GpError::InvalidBounds {
                name: "x".into(),
                reason: "negative".into(),
            },
            GpError::NotSolvedYet,
            GpError::DualUnavailable(3),
            GpError::SolveNotConverged { iterations: 100 },
            GpError::SolverError("boom".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display() {
        let err = GpError::DualUnavailable(2);
        assert_eq!(err.to_string(), "Dual value unavailable for constraint 2");
    }
}
