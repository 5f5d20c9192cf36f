//! Linear relaxation solver abstraction.
//!
//! The column-generation engine only talks to a [`LinearRelaxationSolver`]:
//! it adds constraints once, adds (and possibly removes) variables as columns
//! arrive, re-optimizes and reads primal and dual values. The numerical solve
//! itself is delegated to a backend; [`ClarabelSolver`] is the bundled one.
//!
//! # Dual sign convention
//!
//! Dual values follow the convention that the reduced cost of a variable with
//! objective coefficient `c` and constraint column `a` is `c - aᵀπ`, for both
//! senses. For a maximization, `≤` rows have `π ≥ 0` and `≥` rows `π ≤ 0`.

pub mod clarabel_backend;

pub use clarabel_backend::{ClarabelSettings, ClarabelSolver};

use mcrf_core::McrfError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`LinearRelaxationSolver::optimize`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("linear relaxation is infeasible")]
    Infeasible,
    #[error("linear relaxation is unbounded")]
    Unbounded,
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("solver setup failed: {0}")]
    Setup(String),
}

impl From<SolverError> for McrfError {
    fn from(err: SolverError) -> Self {
        McrfError::Solver(err.to_string())
    }
}

/// Handle of a variable inside a solver model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableHandle(usize);

impl VariableHandle {
    pub fn new(value: usize) -> Self {
        VariableHandle(value)
    }
    pub fn value(&self) -> usize {
        self.0
    }
}

/// Handle of a constraint inside a solver model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintHandle(usize);

impl ConstraintHandle {
    pub fn new(value: usize) -> Self {
        ConstraintHandle(value)
    }
    pub fn value(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Sparse linear combination of variables. Repeated variables add up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VariableHandle, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coefficient · variable`; `None` stands for a variable fixed at zero.
    pub fn add_term(&mut self, coefficient: f64, variable: Option<VariableHandle>) {
        if let Some(variable) = variable {
            self.terms.push((variable, coefficient));
        }
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn term(mut self, coefficient: f64, variable: Option<VariableHandle>) -> Self {
        self.add_term(coefficient, variable);
        self
    }

    pub fn terms(&self) -> &[(VariableHandle, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Operations the column-generation engine needs from a linear relaxation solver.
pub trait LinearRelaxationSolver {
    /// Adds a variable with bounds, objective coefficient and its column
    /// entries in already existing constraints.
    fn add_variable(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        coefficients: &[(ConstraintHandle, f64)],
    ) -> VariableHandle;

    fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) -> ConstraintHandle;

    fn remove_variable(&mut self, variable: VariableHandle);

    fn remove_constraint(&mut self, constraint: ConstraintHandle);

    /// Replaces all objective coefficients by those of `expr` and sets the sense.
    fn set_objective(&mut self, expr: LinearExpr, sense: Sense);

    fn optimize(&mut self) -> Result<(), SolverError>;

    /// Value of `variable` at the last optimum.
    fn primal_value(&self, variable: VariableHandle) -> f64;

    /// Dual price of `constraint` at the last optimum.
    fn dual_value(&self, constraint: ConstraintHandle) -> f64;

    fn objective_value(&self) -> f64;
}
