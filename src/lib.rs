//! # geoprog
//!
//! Geometric (GP) and signomial (SP) programming in Rust.
//!
//! geoprog lets you declare positive variables, build monomial, posynomial
//! and signomial expressions with ordinary arithmetic, and solve the
//! resulting problems with the Clarabel conic solver after a logarithmic
//! change of variables.
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoprog::prelude::*;
//!
//! let mut model = Model::gp();
//! let w = model.new_variable("w")?;
//! let h = model.new_variable("h")?;
//!
//! model.add_constraint((2.0 * (w + h)).leq(10.0))?;
//! model.add_constraint((w * h).geq(2.0))?;
//! model.minimize(w * h)?;
//!
//! let info = model.solve()?;
//! println!("{}: w = {}, h = {}", info.status, model.value(w)?, model.value(h)?);
//! ```
//!
//! ## GP Rules
//!
//! - **Minimization** requires a **posynomial** objective
//! - **Maximization** requires a **monomial** objective
//! - **Equality constraints** must equate two **monomials**
//! - **Inequality constraints** must bound a posynomial above by a **monomial**
//!
//! Signomial models ([`Model::sp`]) additionally accept posynomial-versus-
//! posynomial inequalities and solve them by successive convexification.
//!
//! ## Architecture
//!
//! - **Expression algebra** over a closed `Expr` enum; every operator returns
//!   the narrowest kind, escaping to an opaque non-GP tree when it must
//! - **Normalizer** reduces relations to `monomial == 1` / `posynomial <= 1`
//! - **Lowering** maps `x = exp(y)` and encodes log-sum-exp with exponential cones
//! - **Solver seam** via the [`ConicSolver`](solver::ConicSolver) trait, with
//!   Clarabel as the default backend

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod dgp;
pub mod error;
pub mod expr;
pub mod model;
pub mod solution;
pub mod solver;
pub mod sp;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use geoprog::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        Expr, Monomial, MonomialTerm, Posynomial, Signomial, Variable, VariableBuilder,
        DEFAULT_LOWER_BOUND,
    };

    // Atoms
    pub use crate::atoms::power;

    // Classification
    pub use crate::dgp::ExprKind;

    // Constraints
    pub use crate::constraints::{ConstraintExt, ConstraintRef, Relation, RelationSense};

    // Model
    pub use crate::canon::ObjectiveSense;
    pub use crate::model::{Model, ModelKind};
    pub use crate::solution::ModelSolutionInfo;
    pub use crate::sp::{approximate_as_monomial, SpSettings};

    // Solver
    pub use crate::solver::{ClarabelSolver, ConicSolver, Settings, SolveStatus};

    // Errors
    pub use crate::error::{GpError, Result};
}

// Re-export main types at crate root
pub use error::{GpError, Result};
pub use model::Model;
pub use solution::ModelSolutionInfo;
pub use solver::SolveStatus;
