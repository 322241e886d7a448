//! Clarabel solver integration.
//!
//! This module provides the interface to the Clarabel conic solver.

use std::time::Instant;

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};

use super::backend::{ConicSolution, ConicSolver, SolveStatus};
use super::stuffing::{stuff_problem, ConeDims};
use crate::canon::ConicProgram;
use crate::error::{GpError, Result};

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                SolveStatus::Unbounded
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => SolveStatus::MaxIterations,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                SolveStatus::NumericalError
            }
            _ => SolveStatus::Unknown,
        }
    }
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute tolerance.
    pub tol_gap_abs: f64,
    /// Relative tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 200,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
        }
    }
}

impl Settings {
    /// Enable or disable solver output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the maximum number of interior-point iterations.
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    /// Set the absolute duality gap tolerance.
    pub fn with_tol_gap_abs(mut self, tol: f64) -> Self {
        self.tol_gap_abs = tol;
        self
    }

    /// Set the relative duality gap tolerance.
    pub fn with_tol_gap_rel(mut self, tol: f64) -> Self {
        self.tol_gap_rel = tol;
        self
    }

    /// Set the feasibility tolerance.
    pub fn with_tol_feas(mut self, tol: f64) -> Self {
        self.tol_feas = tol;
        self
    }
}

/// The Clarabel interior-point backend.
#[derive(Debug, Clone, Default)]
pub struct ClarabelSolver {
    settings: Settings,
}

impl ClarabelSolver {
    /// Create a backend with the given settings.
    pub fn new(settings: Settings) -> Self {
        ClarabelSolver { settings }
    }

    /// Settings passed to Clarabel.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl ConicSolver for ClarabelSolver {
    fn solve(&self, program: &ConicProgram) -> Result<ConicSolution> {
        let problem = stuff_problem(program);
        let n = problem.num_vars();

        // Convert to Clarabel format; the cost is linear so P is empty.
        let p = ClarabelCsc::zeros((n, n));
        let a = to_clarabel_csc(&problem.a);
        let cones = to_clarabel_cones(&problem.cone_dims);

        let clarabel_settings = DefaultSettingsBuilder::default()
            .verbose(self.settings.verbose)
            .max_iter(self.settings.max_iter)
            .time_limit(self.settings.time_limit)
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .tol_feas(self.settings.tol_feas)
            .build()
            .map_err(|e| GpError::SolverError(format!("invalid solver settings: {:?}", e)))?;

        let start = Instant::now();
        let mut solver =
            DefaultSolver::new(&p, &problem.q, &a, &problem.b, &cones, clarabel_settings);
        solver.solve();
        let solve_time = start.elapsed().as_secs_f64();

        let solution = &solver.solution;
        let status: SolveStatus = solution.status.into();
        if solution.x.len() != n || solution.z.len() != problem.cone_dims.total() {
            return Err(GpError::SolverError(format!(
                "solver returned {} primal and {} dual values for {} columns and {} rows",
                solution.x.len(),
                solution.z.len(),
                n,
                problem.cone_dims.total()
            )));
        }

        let objective = problem
            .q
            .iter()
            .zip(&solution.x)
            .map(|(qi, xi)| qi * xi)
            .sum::<f64>()
            + problem.objective_offset;
        let duals = problem.row_of.iter().map(|&row| solution.z[row]).collect();

        tracing::debug!(
            component = "solver",
            operation = "clarabel_solve",
            status = status.as_str(),
            rows = problem.cone_dims.total(),
            columns = n,
            iterations = solver.info.iterations,
            "Clarabel finished"
        );

        Ok(ConicSolution {
            status,
            primal: solution.x.clone(),
            duals,
            objective,
            iterations: solver.info.iterations,
            solve_time,
        })
    }
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }

    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }

    for _ in 0..dims.exp {
        cones.push(SupportedConeT::ExponentialConeT());
    }

    cones
}
