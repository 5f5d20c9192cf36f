//! Restricted master loop shared by the HM and TM formulations.

use super::column::{Column, ColumnId};
use crate::lp::{ClarabelSettings, ClarabelSolver, LinearExpr, LinearRelaxationSolver, Sense, VariableHandle};
use crate::relaxation::{PhaseTimer, RelaxationResult, Utilization};
use mcrf_core::{McrfResult, EPSILON_PRICING_PROBLEM};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// When columns leave the restricted master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Columns stay until the run ends.
    #[default]
    Never,
    /// Drop a column once its value stayed at zero for this many consecutive
    /// master optimizations.
    InactiveFor { iterations: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnGenerationConfig {
    /// Slack on the pricing optimality test.
    pub pricing_tolerance: f64,
    /// Stop after this many master optimizations even if pricing still finds columns.
    pub max_iterations: Option<usize>,
    pub removal: RemovalPolicy,
    pub solver: ClarabelSettings,
}

impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            pricing_tolerance: EPSILON_PRICING_PROBLEM,
            max_iterations: None,
            removal: RemovalPolicy::Never,
            solver: ClarabelSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Optimizing,
    Pricing,
    Adding,
    Terminating,
}

impl Phase {
    /// Key under which the phase's elapsed time is reported.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Initializing => "init",
            Phase::Optimizing => "optimize",
            Phase::Pricing => "pricing",
            Phase::Adding => "adding",
            Phase::Terminating => "terminate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one pricing round.
#[derive(Debug, Clone)]
pub struct PricingOutcome<M> {
    /// Accumulated pricing score; a column improves the master iff
    /// `total < -dual`.
    pub total: f64,
    /// Dual price of the convexity row.
    pub dual: f64,
    pub column: Option<Column<M>>,
}

impl<M> PricingOutcome<M> {
    pub fn gap(&self) -> f64 {
        -self.dual - self.total
    }
}

/// A decomposition of the relaxation into master rows and a pricing oracle.
pub trait Formulation {
    type Membership: Clone + PartialEq + fmt::Debug;
    type Duals;

    fn name(&self) -> &'static str;

    fn sense(&self) -> Sense {
        Sense::Maximize
    }

    /// Creates every master row (and static variable) once and returns the
    /// columns that make the first restricted master feasible.
    fn initialize(
        &mut self,
        solver: &mut dyn LinearRelaxationSolver,
    ) -> McrfResult<Vec<Column<Self::Membership>>>;

    fn read_duals(&self, solver: &dyn LinearRelaxationSolver) -> Self::Duals;

    fn price(&self, duals: &Self::Duals, tolerance: f64) -> PricingOutcome<Self::Membership>;

    /// Fractional usage at the current master optimum.
    fn utilization(
        &self,
        solver: &dyn LinearRelaxationSolver,
        columns: &[(&Column<Self::Membership>, f64)],
    ) -> Utilization;
}

struct ActiveColumn<M> {
    column: Column<M>,
    variable: VariableHandle,
    // consecutive optimizations at zero
    inactive: usize,
}

/// Column generation driver for one formulation instance.
pub struct ColumnGeneration<F: Formulation, S: LinearRelaxationSolver = ClarabelSolver> {
    formulation: F,
    solver: S,
    config: ColumnGenerationConfig,
    terminate: Option<Box<dyn Fn(f64) -> bool>>,
    columns: BTreeMap<ColumnId, ActiveColumn<F::Membership>>,
    next_id: usize,
    phase: Phase,
}

impl<F: Formulation> ColumnGeneration<F, ClarabelSolver> {
    pub fn new(formulation: F, config: ColumnGenerationConfig) -> Self {
        let solver = ClarabelSolver::new(config.solver.clone());
        Self::with_solver(formulation, solver, config)
    }
}

impl<F: Formulation, S: LinearRelaxationSolver> ColumnGeneration<F, S> {
    pub fn with_solver(formulation: F, solver: S, config: ColumnGenerationConfig) -> Self {
        Self {
            formulation,
            solver,
            config,
            terminate: None,
            columns: BTreeMap::new(),
            next_id: 0,
            phase: Phase::Initializing,
        }
    }

    /// Stops the loop as soon as `predicate` holds for a master objective.
    pub fn with_termination(mut self, predicate: impl Fn(f64) -> bool + 'static) -> Self {
        self.terminate = Some(Box::new(predicate));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn formulation(&self) -> &F {
        &self.formulation
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Active columns in id order.
    pub fn columns(&self) -> impl Iterator<Item = &Column<F::Membership>> + '_ {
        self.columns.values().map(|active| &active.column)
    }

    /// Value of an active column at the last master optimum.
    pub fn column_value(&self, id: ColumnId) -> Option<f64> {
        self.columns
            .get(&id)
            .map(|active| self.solver.primal_value(active.variable))
    }

    pub fn utilization(&self) -> Utilization {
        let values: Vec<_> = self
            .columns
            .values()
            .map(|active| (&active.column, self.solver.primal_value(active.variable)))
            .collect();
        self.formulation.utilization(&self.solver, &values)
    }

    fn register(&mut self, mut column: Column<F::Membership>) -> ColumnId {
        let id = ColumnId::new(self.next_id);
        self.next_id += 1;
        column.assign_id(id);
        let coefficients: Vec<_> = column.coefficients().collect();
        let variable = self
            .solver
            .add_variable(0.0, f64::INFINITY, column.objective(), &coefficients);
        self.columns.insert(
            id,
            ActiveColumn {
                column,
                variable,
                inactive: 0,
            },
        );
        id
    }

    fn track_activity(&mut self) {
        let tolerance = self.config.pricing_tolerance;
        for active in self.columns.values_mut() {
            if self.solver.primal_value(active.variable) <= tolerance {
                active.inactive += 1;
            } else {
                active.inactive = 0;
            }
        }
    }

    fn remove_columns(&mut self) -> usize {
        let RemovalPolicy::InactiveFor { iterations } = self.config.removal else {
            return 0;
        };
        let stale: Vec<ColumnId> = self
            .columns
            .iter()
            .filter(|(_, active)| active.inactive >= iterations.max(1))
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            if let Some(active) = self.columns.remove(id) {
                self.solver.remove_variable(active.variable);
            }
        }
        stale.len()
    }

    fn is_duplicate(&self, column: &Column<F::Membership>) -> bool {
        self.columns
            .values()
            .any(|active| active.column.membership() == column.membership())
    }

    /// Runs the loop to termination and reports the final master objective.
    ///
    /// Errors only come from the solver; running out of improving columns is
    /// the regular way to stop.
    pub fn run(&mut self) -> McrfResult<RelaxationResult> {
        let mut timer = PhaseTimer::new();
        let mut progress = Vec::new();
        let mut iterations = 0;

        self.phase = Phase::Initializing;
        timer.start(self.phase.label());
        self.solver.set_objective(LinearExpr::new(), self.formulation.sense());
        for column in self.formulation.initialize(&mut self.solver)? {
            self.register(column);
        }

        let objective = loop {
            self.phase = Phase::Optimizing;
            timer.start(self.phase.label());
            self.solver.optimize()?;
            let objective = self.solver.objective_value();
            iterations += 1;
            progress.push((self.next_id, objective));
            self.track_activity();

            self.phase = Phase::Pricing;
            timer.start(self.phase.label());
            let duals = self.formulation.read_duals(&self.solver);
            let outcome = self
                .formulation
                .price(&duals, self.config.pricing_tolerance);
            let gap = outcome.gap();
            debug!(
                formulation = self.formulation.name(),
                iteration = iterations,
                objective,
                total = outcome.total,
                dual = outcome.dual,
                gap,
                "pricing problem: total >= -dual?"
            );

            let Some(column) = outcome.column else {
                break objective;
            };
            if self.terminate.as_ref().is_some_and(|predicate| predicate(objective)) {
                debug!(objective, "termination predicate satisfied");
                break objective;
            }
            if self.is_duplicate(&column) {
                warn!(
                    formulation = self.formulation.name(),
                    gap,
                    "pricing returned an active column, treating as converged"
                );
                break objective;
            }
            if self.config.max_iterations.is_some_and(|cap| iterations >= cap) {
                warn!(
                    formulation = self.formulation.name(),
                    iterations,
                    "iteration cap reached before pricing converged"
                );
                break objective;
            }

            self.phase = Phase::Adding;
            timer.start(self.phase.label());
            self.register(column);
            let removed = self.remove_columns();
            if removed > 0 {
                debug!(removed, active = self.columns.len(), "removed inactive columns");
            }
        };

        self.phase = Phase::Terminating;
        let utilization = self.utilization();
        let time = timer.finish();
        info!(
            formulation = self.formulation.name(),
            objective,
            iterations,
            columns = self.next_id,
            "column generation finished"
        );
        Ok(RelaxationResult {
            objective_value: objective,
            time,
            iterations,
            columns: self.next_id,
            progress,
            utilization: Some(utilization),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{ConstraintHandle, Relation};

    // max Σ v_k x_k  s.t. Σ x_k <= 1, where pricing offers values 1, 2, 3 in turn
    struct Ladder {
        convexity: Option<ConstraintHandle>,
        offered: std::cell::Cell<u32>,
        top: u32,
        stuck: bool,
    }

    impl Formulation for Ladder {
        type Membership = u32;
        type Duals = f64;

        fn name(&self) -> &'static str {
            "ladder"
        }

        fn initialize(
            &mut self,
            solver: &mut dyn LinearRelaxationSolver,
        ) -> McrfResult<Vec<Column<u32>>> {
            let convexity = solver.add_constraint(LinearExpr::new(), Relation::LessEqual, 1.0);
            self.convexity = Some(convexity);
            let mut column = Column::new(1);
            column.add_objective(1.0);
            column.add_term(1.0, convexity);
            self.offered.set(1);
            Ok(vec![column])
        }

        fn read_duals(&self, solver: &dyn LinearRelaxationSolver) -> f64 {
            self.convexity.map_or(0.0, |c| solver.dual_value(c))
        }

        fn price(&self, dual: &f64, tolerance: f64) -> PricingOutcome<u32> {
            let next = if self.stuck { 1 } else { self.offered.get() + 1 };
            // score of offering value `next`: dual - next
            let total = if self.stuck { -2.0 } else { -(f64::from(next)) };
            if next > self.top || total >= -dual - tolerance {
                return PricingOutcome {
                    total: 0.0,
                    dual: *dual,
                    column: None,
                };
            }
            self.offered.set(next);
            let mut column = Column::new(next);
            column.add_objective(f64::from(next));
            if let Some(c) = self.convexity {
                column.add_term(1.0, c);
            }
            PricingOutcome {
                total,
                dual: *dual,
                column: Some(column),
            }
        }

        fn utilization(
            &self,
            _solver: &dyn LinearRelaxationSolver,
            _columns: &[(&Column<u32>, f64)],
        ) -> Utilization {
            Utilization::default()
        }
    }

    fn ladder(top: u32) -> Ladder {
        Ladder {
            convexity: None,
            offered: std::cell::Cell::new(0),
            top,
            stuck: false,
        }
    }

    #[test]
    fn test_loop_adds_columns_until_pricing_fails() {
        let mut engine = ColumnGeneration::new(ladder(3), ColumnGenerationConfig::default());
        let result = engine.run().unwrap();
        assert!((result.objective_value - 3.0).abs() < 1e-6);
        assert_eq!(result.columns, 3);
        assert_eq!(result.iterations, 3);
        assert_eq!(engine.phase(), Phase::Terminating);
        let objectives: Vec<f64> = result.progress.iter().map(|(_, obj)| *obj).collect();
        assert!(objectives.windows(2).all(|w| w[1] >= w[0] - 1e-6));
        assert!(result.time.contains_key("optimize"));
        assert!(result.time.contains_key("pricing"));
    }

    #[test]
    fn test_repeated_column_ends_the_loop() {
        // keeps offering the initial column with a negative reduced cost
        let mut formulation = ladder(3);
        formulation.stuck = true;
        let mut engine = ColumnGeneration::new(formulation, ColumnGenerationConfig::default());
        let result = engine.run().unwrap();
        assert!((result.objective_value - 1.0).abs() < 1e-6);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.columns, 1);
        assert_eq!(engine.phase(), Phase::Terminating);
    }

    #[test]
    fn test_termination_predicate_stops_early() {
        let mut engine = ColumnGeneration::new(ladder(10), ColumnGenerationConfig::default())
            .with_termination(|objective| objective >= 1.5);
        let result = engine.run().unwrap();
        assert!((result.objective_value - 2.0).abs() < 1e-6);
        assert_eq!(result.columns, 2);
    }

    #[test]
    fn test_iteration_cap() {
        let config = ColumnGenerationConfig {
            max_iterations: Some(2),
            ..Default::default()
        };
        let result = ColumnGeneration::new(ladder(10), config).run().unwrap();
        assert_eq!(result.iterations, 2);
        assert!((result.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_inactive_columns_are_removed() {
        let config = ColumnGenerationConfig {
            removal: RemovalPolicy::InactiveFor { iterations: 1 },
            ..Default::default()
        };
        let mut engine = ColumnGeneration::new(ladder(4), config);
        let result = engine.run().unwrap();
        assert!((result.objective_value - 4.0).abs() < 1e-6);
        assert_eq!(result.columns, 4);
        // only the best column survives each round
        assert!(engine.columns().count() < 4);
        let last = engine.columns().last().and_then(|c| c.id()).unwrap();
        assert!((engine.column_value(last).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: ColumnGenerationConfig =
            serde_json::from_str(r#"{"removal": {"inactive_for": {"iterations": 3}}}"#).unwrap();
        assert_eq!(config.removal, RemovalPolicy::InactiveFor { iterations: 3 });
        assert_eq!(config.pricing_tolerance, EPSILON_PRICING_PROBLEM);
        assert_eq!(config.solver, ClarabelSettings::default());
    }
}
