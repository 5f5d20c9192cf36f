//! Per-depot exclusion tables.
//!
//! Preprocessing proves that some arcs and customers can never appear in the
//! subtree of a given depot. Those facts are recorded here and every algorithm
//! that enumerates (arc, depot) or (customer, depot) combinations consults the
//! index first. Entries start out included and are only ever cleared.

use crate::{ArcId, CustomerId, DepotId};

/// Boolean tables `arc × depot` and `customer × depot`, row-major by depot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionIndex {
    depot_count: usize,
    arc_included: Vec<bool>,
    customer_included: Vec<bool>,
}

impl ExclusionIndex {
    /// Creates an index in which every combination is included.
    pub fn new(arc_count: usize, customer_count: usize, depot_count: usize) -> Self {
        Self {
            depot_count,
            arc_included: vec![true; arc_count * depot_count],
            customer_included: vec![true; customer_count * depot_count],
        }
    }

    #[inline]
    fn arc_slot(&self, arc: ArcId, depot: DepotId) -> usize {
        debug_assert!(depot.value() < self.depot_count);
        arc.value() * self.depot_count + depot.value()
    }

    #[inline]
    fn customer_slot(&self, customer: CustomerId, depot: DepotId) -> usize {
        debug_assert!(depot.value() < self.depot_count);
        customer.value() * self.depot_count + depot.value()
    }

    /// Whether `arc` may be used in the subtree of `depot`.
    #[inline]
    pub fn includes_arc(&self, arc: ArcId, depot: DepotId) -> bool {
        self.arc_included[self.arc_slot(arc, depot)]
    }

    /// Whether `customer` may be served by `depot`.
    #[inline]
    pub fn includes_customer(&self, customer: CustomerId, depot: DepotId) -> bool {
        self.customer_included[self.customer_slot(customer, depot)]
    }

    /// Marks `arc` as unusable for `depot`. Idempotent.
    pub fn exclude_arc(&mut self, arc: ArcId, depot: DepotId) {
        let slot = self.arc_slot(arc, depot);
        self.arc_included[slot] = false;
    }

    /// Marks `customer` as unreachable for `depot`. Idempotent.
    pub fn exclude_customer(&mut self, customer: CustomerId, depot: DepotId) {
        let slot = self.customer_slot(customer, depot);
        self.customer_included[slot] = false;
    }

    /// Number of (arc, depot) pairs still included.
    pub fn included_arc_count(&self) -> usize {
        self.arc_included.iter().filter(|included| **included).count()
    }

    /// Number of (customer, depot) pairs still included.
    pub fn included_customer_count(&self) -> usize {
        self.customer_included.iter().filter(|included| **included).count()
    }

    pub fn depot_count(&self) -> usize {
        self.depot_count
    }
}
