//! Solver interface for geoprog.
//!
//! This module provides:
//! - The backend-neutral `ConicSolver` trait and solve status
//! - Matrix stuffing to convert conic programs to solver format
//! - Clarabel solver integration

pub mod backend;
pub mod clarabel;
pub mod stuffing;

pub use self::clarabel::{ClarabelSolver, Settings};
pub use backend::{ConicSolution, ConicSolver, SolveStatus};
pub use stuffing::{stuff_problem, ConeDims, StuffedProblem};
