use crate::lp::ConstraintHandle;
use mcrf_core::MembershipBits;
use serde::Serialize;
use std::collections::BTreeMap;

/// Sequential id assigned when a column enters the restricted master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ColumnId(usize);

impl ColumnId {
    pub fn new(value: usize) -> Self {
        ColumnId(value)
    }
    pub fn value(&self) -> usize {
        self.0
    }
}

/// A master variable together with its objective coefficient, its sparse
/// constraint column and a membership record of what it represents.
///
/// Coefficients accumulate: adding a term for a constraint that already has
/// one sums the two.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<M> {
    id: Option<ColumnId>,
    objective: f64,
    coefficients: BTreeMap<ConstraintHandle, f64>,
    membership: M,
}

impl<M> Column<M> {
    pub fn new(membership: M) -> Self {
        Self {
            id: None,
            objective: 0.0,
            coefficients: BTreeMap::new(),
            membership,
        }
    }

    /// `None` until the engine registers the column.
    pub fn id(&self) -> Option<ColumnId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ColumnId) {
        debug_assert!(self.id.is_none(), "column registered twice");
        self.id = Some(id);
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn add_objective(&mut self, delta: f64) {
        self.objective += delta;
    }

    pub fn add_term(&mut self, coefficient: f64, constraint: ConstraintHandle) {
        *self.coefficients.entry(constraint).or_insert(0.0) += coefficient;
    }

    /// Accumulated coefficient in `constraint`, zero if untouched.
    pub fn coefficient(&self, constraint: ConstraintHandle) -> f64 {
        self.coefficients.get(&constraint).copied().unwrap_or(0.0)
    }

    pub fn coefficients(&self) -> impl Iterator<Item = (ConstraintHandle, f64)> + '_ {
        self.coefficients.iter().map(|(c, v)| (*c, *v))
    }

    pub fn membership(&self) -> &M {
        &self.membership
    }

    pub(crate) fn membership_mut(&mut self) -> &mut M {
        &mut self.membership
    }

    /// `c - aᵀπ` for the given dual prices.
    pub fn reduced_cost(&self, dual: impl Fn(ConstraintHandle) -> f64) -> f64 {
        self.objective - self.coefficients().map(|(c, v)| v * dual(c)).sum::<f64>()
    }
}

/// Subforest membership: bit `d · |C| + i` for customer `i` at depot `d`,
/// bit `d · |E| + e` for edge `e` at depot `d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HmMembership {
    pub customers: MembershipBits,
    pub edges: MembershipBits,
}

/// Spanning-tree membership: one bit per edge of the augmented graph.
pub type TmMembership = MembershipBits;
