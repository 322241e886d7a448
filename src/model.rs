//! Model definition and solving API.
//!
//! A [`Model`] owns an arena of variables and an append-only list of
//! constraint records. Every declaration is validated immediately; a failed
//! declaration leaves the model unchanged.
//!
//! ```ignore
//! let mut model = Model::gp();
//! let x = model.new_variable("x")?;
//! let y = model.new_variable("y")?;
//! model.add_constraint((x * y).geq(1.0))?;
//! model.minimize(x + y)?;
//! let info = model.solve()?;
//! ```

use crate::canon::{lower, GpConstraint, GpObjective, ObjectiveSense};
use crate::constraints::{normalize, ConstraintRecord, ConstraintRef, Relation};
use crate::error::{GpError, Result};
use crate::expr::{Expr, ModelId, Variable, VariableBuilder, VariableData};
use crate::solution::{map_solution, ModelSolutionInfo};
use crate::solver::{ClarabelSolver, ConicSolver, Settings, SolveStatus};
use crate::sp::{solve_signomial, SpSettings};

/// Problem class of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Geometric program: solved by a single convex solve.
    Geometric,
    /// Signomial program: solved by successive convexification.
    Signomial,
}

/// A geometric or signomial programming model.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    kind: ModelKind,
    variables: Vec<VariableData>,
    constraints: Vec<ConstraintRecord>,
    objective: Option<GpObjective>,
    settings: Settings,
    sp_settings: SpSettings,
    solution: Option<ModelSolutionInfo>,
}

/// A clone is a new model: it gets its own id, so handles issued by the
/// original are rejected by the clone and vice versa.
impl Clone for Model {
    fn clone(&self) -> Self {
        Model {
            id: ModelId::new(),
            kind: self.kind,
            variables: self.variables.clone(),
            constraints: self.constraints.clone(),
            objective: self.objective.clone(),
            settings: self.settings.clone(),
            sp_settings: self.sp_settings.clone(),
            solution: self.solution.clone(),
        }
    }
}

impl Model {
    /// Create an empty model of the given kind.
    pub fn new(kind: ModelKind) -> Self {
        Model {
            id: ModelId::new(),
            kind,
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            settings: Settings::default(),
            sp_settings: SpSettings::default(),
            solution: None,
        }
    }

    /// Create a geometric programming model.
    pub fn gp() -> Self {
        Self::new(ModelKind::Geometric)
    }

    /// Create a signomial programming model.
    pub fn sp() -> Self {
        Self::new(ModelKind::Signomial)
    }

    /// Identity stamped on every variable handle of this model.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Problem class.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Conic solver settings used by [`Model::solve`].
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the conic solver settings.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Successive convexification settings.
    pub fn sp_settings(&self) -> &SpSettings {
        &self.sp_settings
    }

    /// Replace the successive convexification settings.
    pub fn set_sp_settings(&mut self, settings: SpSettings) {
        self.sp_settings = settings;
    }

    // ---- Variables ----

    /// Declare a variable.
    pub fn add_variable(&mut self, builder: VariableBuilder) -> Result<Variable> {
        let data = builder.build()?;
        let var = Variable::new(self.id, self.variables.len());
        tracing::debug!(
            component = "model",
            operation = "add_variable",
            status = "success",
            name = %data.name,
            index = var.index(),
            "Declared variable"
        );
        self.variables.push(data);
        Ok(var)
    }

    /// Declare a variable with default bounds.
    pub fn new_variable(&mut self, name: impl Into<String>) -> Result<Variable> {
        self.add_variable(VariableBuilder::new(name))
    }

    /// Number of declared variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Attributes of a variable of this model.
    pub fn variable(&self, var: Variable) -> Result<&VariableData> {
        self.check_owned(var)?;
        Ok(&self.variables[var.index()])
    }

    /// Name of a variable of this model.
    pub fn variable_name(&self, var: Variable) -> Result<&str> {
        Ok(&self.variable(var)?.name)
    }

    /// Linearization points recorded for `var` by signomial solves.
    pub fn linearization_points(&self, var: Variable) -> Result<&[f64]> {
        Ok(&self.variable(var)?.linearization_points)
    }

    fn check_owned(&self, var: Variable) -> Result<()> {
        if var.model_id() == self.id && var.index() < self.variables.len() {
            Ok(())
        } else {
            Err(GpError::CrossModelVariable {
                variable: var.to_string(),
            })
        }
    }

    fn check_expr(&self, expr: &Expr) -> Result<()> {
        expr.variables().into_iter().try_for_each(|v| self.check_owned(v))
    }

    // ---- Constraints ----

    /// Add a constraint.
    pub fn add_constraint(&mut self, relation: Relation) -> Result<ConstraintRef> {
        self.push_constraint(relation, None)
    }

    /// Add a named constraint.
    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        relation: Relation,
    ) -> Result<ConstraintRef> {
        self.push_constraint(relation, Some(name.into()))
    }

    fn push_constraint(&mut self, relation: Relation, name: Option<String>) -> Result<ConstraintRef> {
        self.check_expr(&relation.lhs)?;
        self.check_expr(&relation.rhs)?;
        let normalized = normalize(&relation, self.kind == ModelKind::Signomial)?;

        let cref = ConstraintRef(self.constraints.len());
        tracing::debug!(
            component = "model",
            operation = "add_constraint",
            status = "success",
            index = cref.index(),
            gp = normalized.form.is_gp(),
            "Declared constraint {}",
            relation
        );
        self.constraints.push(ConstraintRecord {
            relation,
            name,
            form: normalized.form,
            negate_dual: normalized.negate_dual,
        });
        Ok(cref)
    }

    /// Number of accepted constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Record of a constraint of this model.
    pub fn constraint(&self, cref: ConstraintRef) -> Option<&ConstraintRecord> {
        self.constraints.get(cref.index())
    }

    /// Name of a constraint, if it was declared with one.
    pub fn constraint_name(&self, cref: ConstraintRef) -> Option<&str> {
        self.constraint(cref).and_then(|c| c.name.as_deref())
    }

    // ---- Objective ----

    /// Set the objective; replaces any previous objective.
    pub fn set_objective(&mut self, sense: ObjectiveSense, expr: impl Into<Expr>) -> Result<()> {
        let expr = expr.into();
        self.check_expr(&expr)?;
        let objective = GpObjective::new(sense, &expr)?;
        tracing::debug!(
            component = "model",
            operation = "set_objective",
            status = "success",
            sense = ?sense,
            "Declared objective {}",
            expr
        );
        self.objective = Some(objective);
        Ok(())
    }

    /// Minimize a posynomial.
    pub fn minimize(&mut self, expr: impl Into<Expr>) -> Result<()> {
        self.set_objective(ObjectiveSense::Minimize, expr)
    }

    /// Maximize a monomial.
    pub fn maximize(&mut self, expr: impl Into<Expr>) -> Result<()> {
        self.set_objective(ObjectiveSense::Maximize, expr)
    }

    /// The validated objective, if one was set.
    pub fn objective(&self) -> Option<&GpObjective> {
        self.objective.as_ref()
    }

    // ---- Solving ----

    /// Solve with Clarabel using the model's settings.
    pub fn solve(&mut self) -> Result<&ModelSolutionInfo> {
        let solver = ClarabelSolver::new(self.settings.clone());
        self.solve_with(&solver)
    }

    /// Solve with a custom conic backend.
    ///
    /// A non-optimal status is logged as a warning, not returned as an error;
    /// check [`ModelSolutionInfo::status`] before trusting the values.
    pub fn solve_with(&mut self, solver: &dyn ConicSolver) -> Result<&ModelSolutionInfo> {
        let info = match self.kind {
            ModelKind::Geometric => self.solve_geometric(solver)?,
            ModelKind::Signomial => solve_signomial(
                &mut self.variables,
                &self.constraints,
                self.objective.as_ref(),
                &self.sp_settings,
                solver,
            )?,
        };

        tracing::info!(
            component = "model",
            operation = "solve",
            status = info.status.as_str(),
            objective = info.objective_value,
            iterations = info.iterations,
            solve_time = info.solve_time,
            "Model solved"
        );
        let info: &ModelSolutionInfo = self.solution.insert(info);
        Ok(info)
    }

    fn solve_geometric(&self, solver: &dyn ConicSolver) -> Result<ModelSolutionInfo> {
        let gp_constraints = self
            .constraints
            .iter()
            .map(|c| {
                c.form.to_gp().ok_or_else(|| {
                    GpError::InvalidConstraintForm(format!("`{}` has no GP form", c.relation))
                })
            })
            .collect::<Result<Vec<GpConstraint>>>()?;
        let lowered = lower(&self.variables, &gp_constraints, self.objective.as_ref());
        let raw = solver.solve(&lowered.program)?;
        Ok(map_solution(&raw, &lowered, &self.constraints, self.variables.len()))
    }

    // ---- Readback ----

    /// Full record of the last solve.
    pub fn solution_summary(&self) -> Result<&ModelSolutionInfo> {
        self.solution.as_ref().ok_or(GpError::NotSolvedYet)
    }

    /// Value of a variable in the last solve.
    pub fn value(&self, var: Variable) -> Result<f64> {
        self.check_owned(var)?;
        let info = self.solution_summary()?;
        info.value(var.index()).ok_or(GpError::NotSolvedYet)
    }

    /// Value of an expression at the last solution.
    pub fn evaluate(&self, expr: &Expr) -> Result<f64> {
        self.check_expr(expr)?;
        Ok(expr.evaluate(&self.solution_summary()?.values))
    }

    /// Objective value of the last solve.
    pub fn objective_value(&self) -> Result<f64> {
        Ok(self.solution_summary()?.objective_value)
    }

    /// Status of the last solve.
    pub fn termination_status(&self) -> Result<SolveStatus> {
        Ok(self.solution_summary()?.status)
    }

    /// Total solver time of the last solve, in seconds.
    pub fn solve_time(&self) -> Result<f64> {
        Ok(self.solution_summary()?.solve_time)
    }

    /// Dual value of a constraint, scaled by the objective value and oriented
    /// like the constraint as written.
    pub fn dual(&self, cref: ConstraintRef) -> Result<f64> {
        self.solution_summary()?
            .dual(cref.index())
            .ok_or(GpError::DualUnavailable(cref.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintExt;

    #[test]
    fn test_variables_are_indexed() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model
            .add_variable(VariableBuilder::new("y").bounds(1.0, 2.0))
            .unwrap();
        assert_eq!(x.index(), 0);
        assert_eq!(y.index(), 1);
        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.variable_name(y).unwrap(), "y");
        assert_eq!(model.variable(y).unwrap().upper, Some(2.0));
    }

    #[test]
    fn test_invalid_variable_leaves_model_unchanged() {
        let mut model = Model::gp();
        let err = model
            .add_variable(VariableBuilder::new("x").lower_bound(-1.0))
            .unwrap_err();
        assert_eq!(err.code(), "VARIABLE_INVALID_BOUNDS");
        assert_eq!(model.num_variables(), 0);
    }

    #[test]
    fn test_cross_model_variable() {
        let mut a = Model::gp();
        let mut b = Model::gp();
        let x = a.new_variable("x").unwrap();
        let y = b.new_variable("y").unwrap();

        let err = a.add_constraint((x * y).leq(1.0)).unwrap_err();
        assert!(matches!(err, GpError::CrossModelVariable { .. }));
        assert_eq!(a.num_constraints(), 0);
        assert!(a.minimize(y).is_err());
        assert!(a.variable_name(y).is_err());
    }

    #[test]
    fn test_named_constraints() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let c0 = model.add_constraint(x.leq(4.0)).unwrap();
        let c1 = model.add_named_constraint("floor", x.geq(2.0)).unwrap();
        assert_eq!(c1.index(), 1);
        assert_eq!(model.constraint_name(c0), None);
        assert_eq!(model.constraint_name(c1), Some("floor"));
        assert!(model.constraint(c1).unwrap().negate_dual);
    }

    #[test]
    fn test_gp_rejects_signomial_constraint() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        let err = model.add_constraint(x.leq(x * y + y)).unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_INVALID_FORM");
        assert_eq!(model.num_constraints(), 0);

        let mut sp = Model::sp();
        let x = sp.new_variable("x").unwrap();
        let y = sp.new_variable("y").unwrap();
        let c = sp.add_constraint(x.leq(x * y + y)).unwrap();
        assert!(sp.constraint(c).unwrap().is_true_signomial());
    }

    #[test]
    fn test_readback_before_solve() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let c = model.add_constraint(x.geq(1.0)).unwrap();
        assert_eq!(model.value(x), Err(GpError::NotSolvedYet));
        assert_eq!(model.objective_value(), Err(GpError::NotSolvedYet));
        assert_eq!(model.termination_status(), Err(GpError::NotSolvedYet));
        assert_eq!(model.dual(c), Err(GpError::NotSolvedYet));
        assert!(model.solution_summary().is_err());
    }

    #[test]
    fn test_objective_validation() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        assert!(model.maximize(x + y).is_err());
        assert!(model.objective().is_none());
        model.maximize(x * y).unwrap();
        assert_eq!(model.objective().unwrap().sense(), ObjectiveSense::Maximize);
        let err = model.minimize(x - y).unwrap_err();
        assert_eq!(err.code(), "OBJECTIVE_INVALID_FORM");
    }

    #[test]
    fn test_infinite_objective_coefficient_rejected() {
        let mut model = Model::gp();
        let x = model.new_variable("x").unwrap();
        let y = model.new_variable("y").unwrap();
        model.minimize(x).unwrap();

        assert!(model.minimize(Expr::constant(0.0).powf(-1.0) * y).is_err());
        assert!(model.minimize(1e300 * x.powf(2.0) * 1e300).is_err());
        // The earlier objective is kept.
        match model.objective() {
            Some(GpObjective::Minimize(p)) => assert_eq!(p.terms().len(), 1),
            other => panic!("Expected Minimize, got {:?}", other),
        }
    }

    #[test]
    fn test_clone_is_a_distinct_model() {
        let mut a = Model::gp();
        let x = a.new_variable("x").unwrap();
        let mut b = a.clone();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.num_variables(), 1);

        // Same index in both models, different identities.
        let z = b.new_variable("z").unwrap();
        let w = a.new_variable("w").unwrap();
        assert_eq!(z.index(), w.index());
        assert_ne!(z, w);

        let err = a.add_constraint(z.leq(2.0)).unwrap_err();
        assert!(matches!(err, GpError::CrossModelVariable { .. }));
        assert_eq!(a.num_constraints(), 0);
        assert!(b.add_constraint(x.leq(2.0)).is_err());
        assert!(b.maximize(w).is_err());
        assert!(a.add_constraint(w.leq(2.0)).is_ok());
    }
}
