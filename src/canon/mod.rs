//! Log-space lowering transforms GP problems into conic form.
//!
//! This module converts canonical GP constraints and objectives into:
//! - Affine expressions (LinExpr) over log-variables and auxiliaries
//! - Cone constraints (ConeConstraint) for zero, nonnegative and exponential cones

pub mod lin_expr;
pub mod lowering;

pub use lin_expr::LinExpr;
pub use lowering::{
    log_affine, lower, ColumnBounds, ConeConstraint, ConicProgram, GpConstraint, GpObjective,
    LoweredProblem, ObjectiveSense,
};
