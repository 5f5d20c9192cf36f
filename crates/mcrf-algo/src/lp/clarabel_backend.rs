//! Clarabel-backed [`LinearRelaxationSolver`].
//!
//! The model is kept column-wise in memory and rebuilt into Clarabel's conic
//! form on every [`optimize`](LinearRelaxationSolver::optimize):
//!
//! ```text
//!   minimize    q'x
//!   subject to  Ax + s = b,  s ∈ {0}^m_eq × R+^m_ineq
//! ```
//!
//! Equality rows go into the zero cone. `≤` rows and variable bounds go into
//! the nonnegative cone; `≥` rows are negated first. A maximization is solved
//! as the minimization of `-c'x`.

use super::{
    ConstraintHandle, LinearExpr, LinearRelaxationSolver, Relation, Sense, SolverError,
    VariableHandle,
};
use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interior-point settings forwarded to Clarabel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarabelSettings {
    pub max_iter: u32,
    pub tol_feas: f64,
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
    pub verbose: bool,
}

impl Default for ClarabelSettings {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol_feas: 1e-9,
            tol_gap_abs: 1e-9,
            tol_gap_rel: 1e-9,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone)]
struct VariableData {
    lower: f64,
    upper: f64,
    objective: f64,
    // (constraint index, coefficient)
    column: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Copy)]
struct ConstraintData {
    relation: Relation,
    rhs: f64,
}

/// Linear relaxation solver running Clarabel's interior-point method.
#[derive(Debug, Clone)]
pub struct ClarabelSolver {
    settings: ClarabelSettings,
    sense: Sense,
    variables: Vec<Option<VariableData>>,
    constraints: Vec<Option<ConstraintData>>,
    primal: Vec<f64>,
    dual: Vec<f64>,
    objective: f64,
    iterations: u32,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self::new(ClarabelSettings::default())
    }
}

impl ClarabelSolver {
    pub fn new(settings: ClarabelSettings) -> Self {
        Self {
            settings,
            sense: Sense::Minimize,
            variables: Vec::new(),
            constraints: Vec::new(),
            primal: Vec::new(),
            dual: Vec::new(),
            objective: 0.0,
            iterations: 0,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variables.iter().filter(|v| v.is_some()).count()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_some()).count()
    }

    /// Interior-point iterations of the last solve.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl LinearRelaxationSolver for ClarabelSolver {
    fn add_variable(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        coefficients: &[(ConstraintHandle, f64)],
    ) -> VariableHandle {
        let column = coefficients
            .iter()
            .map(|(c, coefficient)| (c.value(), *coefficient))
            .collect();
        self.variables.push(Some(VariableData {
            lower,
            upper,
            objective,
            column,
        }));
        VariableHandle::new(self.variables.len() - 1)
    }

    fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) -> ConstraintHandle {
        let index = self.constraints.len();
        self.constraints.push(Some(ConstraintData { relation, rhs }));
        for &(variable, coefficient) in expr.terms() {
            match self.variables.get_mut(variable.value()) {
                Some(Some(data)) => data.column.push((index, coefficient)),
                _ => debug_assert!(false, "constraint refers to unknown variable {}", variable.value()),
            }
        }
        ConstraintHandle::new(index)
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        if let Some(slot) = self.variables.get_mut(variable.value()) {
            *slot = None;
        }
    }

    fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        if let Some(slot) = self.constraints.get_mut(constraint.value()) {
            *slot = None;
        }
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.sense = sense;
        for data in self.variables.iter_mut().flatten() {
            data.objective = 0.0;
        }
        for &(variable, coefficient) in expr.terms() {
            if let Some(Some(data)) = self.variables.get_mut(variable.value()) {
                data.objective += coefficient;
            }
        }
    }

    fn optimize(&mut self) -> Result<(), SolverError> {
        // map live variables to matrix columns
        let live: Vec<usize> = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|_| i))
            .collect();
        let n_var = live.len();

        // row index and sign per live constraint; equalities first
        let mut row_of: Vec<Option<(usize, f64)>> = vec![None; self.constraints.len()];
        let mut rhs: Vec<f64> = Vec::new();
        for (index, constraint) in self.constraints.iter().enumerate() {
            if let Some(c) = constraint.filter(|c| c.relation == Relation::Equal) {
                row_of[index] = Some((rhs.len(), 1.0));
                rhs.push(c.rhs);
            }
        }
        let n_eq = rhs.len();
        for (index, constraint) in self.constraints.iter().enumerate() {
            match constraint {
                Some(c) if c.relation == Relation::LessEqual => {
                    row_of[index] = Some((rhs.len(), 1.0));
                    rhs.push(c.rhs);
                }
                Some(c) if c.relation == Relation::GreaterEqual => {
                    row_of[index] = Some((rhs.len(), -1.0));
                    rhs.push(-c.rhs);
                }
                _ => {}
            }
        }

        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_var];
        let mut q = Vec::with_capacity(n_var);
        for (j, &index) in live.iter().enumerate() {
            let Some(data) = &self.variables[index] else { continue };
            for &(c, coefficient) in &data.column {
                if let Some((row, sign)) = row_of[c] {
                    columns[j].push((row, sign * coefficient));
                }
            }
            q.push(match self.sense {
                Sense::Maximize => -data.objective,
                Sense::Minimize => data.objective,
            });
        }
        // variable bounds as -x <= -lower and x <= upper
        for (j, &index) in live.iter().enumerate() {
            let Some(data) = &self.variables[index] else { continue };
            if data.lower.is_finite() {
                columns[j].push((rhs.len(), -1.0));
                rhs.push(-data.lower);
            }
            if data.upper.is_finite() {
                columns[j].push((rhs.len(), 1.0));
                rhs.push(data.upper);
            }
        }
        let n_rows = rhs.len();

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if n_eq > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_eq));
        }
        if n_rows > n_eq {
            cones.push(SupportedConeT::NonnegativeConeT(n_rows - n_eq));
        }

        // compressed sparse column layout, duplicate rows merged
        let mut col_ptr = Vec::with_capacity(n_var + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        for column in &mut columns {
            col_ptr.push(row_idx.len());
            column.sort_by_key(|(r, _)| *r);
            for &(r, v) in column.iter() {
                if row_idx.len() > *col_ptr.last().unwrap_or(&0) && row_idx.last() == Some(&r) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    row_idx.push(r);
                    values.push(v);
                }
            }
        }
        col_ptr.push(row_idx.len());

        let a_mat = CscMatrix::new(n_rows, n_var, col_ptr, row_idx, values);
        let p_mat = CscMatrix::new(n_var, n_var, vec![0; n_var + 1], Vec::new(), Vec::new());

        let settings = DefaultSettingsBuilder::default()
            .verbose(self.settings.verbose)
            .max_iter(self.settings.max_iter)
            .tol_feas(self.settings.tol_feas)
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .build()
            .map_err(|e| SolverError::Setup(format!("Clarabel settings error: {:?}", e)))?;

        let mut solver = DefaultSolver::new(&p_mat, &q, &a_mat, &rhs, &cones, settings)
            .map_err(|e| SolverError::Setup(format!("Clarabel initialization failed: {:?}", e)))?;
        solver.solve();

        let sol = solver.solution;
        debug!(
            variables = n_var,
            rows = n_rows,
            iterations = sol.iterations,
            status = ?sol.status,
            "clarabel solve"
        );
        match sol.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(SolverError::Infeasible)
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Err(SolverError::Unbounded)
            }
            other => return Err(SolverError::Numerical(format!("Clarabel returned status {:?}", other))),
        }

        self.iterations = sol.iterations;
        self.primal = vec![0.0; self.variables.len()];
        let mut objective = 0.0;
        for (j, &index) in live.iter().enumerate() {
            self.primal[index] = sol.x[j];
            if let Some(data) = &self.variables[index] {
                objective += data.objective * sol.x[j];
            }
        }
        self.objective = objective;

        let sense_sign = match self.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };
        self.dual = row_of
            .iter()
            .map(|slot| match slot {
                Some((row, sign)) => sense_sign * sign * sol.z[*row],
                None => 0.0,
            })
            .collect();
        Ok(())
    }

    fn primal_value(&self, variable: VariableHandle) -> f64 {
        self.primal.get(variable.value()).copied().unwrap_or(0.0)
    }

    fn dual_value(&self, constraint: ConstraintHandle) -> f64 {
        self.dual.get(constraint.value()).copied().unwrap_or(0.0)
    }

    fn objective_value(&self) -> f64 {
        self.objective
    }
}
