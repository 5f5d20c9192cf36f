//! Direct (non-decomposed) LP relaxations built with `good_lp`.
//!
//! Both formulations maximize the number of customers covered by depot
//! trees, i.e. the number of forest edges, and report the same
//! [`RelaxationResult`](crate::RelaxationResult) shape as column generation.

mod gg;
mod mcfgg;

pub use gg::solve_gg;
pub use mcfgg::solve_mcfgg;

use good_lp::{constraint, Constraint, Expression, Variable};
use mcrf_core::{DepotId, Graph, McrfError, VertexId, VertexKind};

/// Sum of `coefficient · variable` over the present variables, `None` when
/// no variable is present.
pub(crate) fn linear(terms: impl IntoIterator<Item = (f64, Option<Variable>)>) -> Option<Expression> {
    let mut expr = Expression::from(0.0);
    let mut any = false;
    for (coefficient, variable) in terms {
        if let Some(variable) = variable {
            expr += coefficient * variable;
            any = true;
        }
    }
    any.then_some(expr)
}

/// `y[v][d]` exists unless `v` is a customer excluded for `d`.
pub(crate) fn vertex_allowed(graph: &Graph, vertex: VertexId, depot: DepotId) -> bool {
    match graph.kind(vertex) {
        VertexKind::Customer(c) => graph.includes_customer(c, depot),
        VertexKind::Depot(_) => true,
    }
}

pub(crate) fn solver_error(err: impl std::fmt::Debug) -> McrfError {
    McrfError::Solver(format!("{:?}", err))
}

/// `lhs == rhs`, absent sides read as zero; `None` when both are absent.
pub(crate) fn equal(lhs: Option<Expression>, rhs: Option<Expression>) -> Option<Constraint> {
    if lhs.is_none() && rhs.is_none() {
        return None;
    }
    let lhs = lhs.unwrap_or_else(|| Expression::from(0.0));
    let rhs = rhs.unwrap_or_else(|| Expression::from(0.0));
    Some(constraint!(lhs == rhs))
}

/// `lhs <= rhs`, absent sides read as zero; `None` when both are absent.
pub(crate) fn at_most(lhs: Option<Expression>, rhs: Option<Expression>) -> Option<Constraint> {
    if lhs.is_none() && rhs.is_none() {
        return None;
    }
    let lhs = lhs.unwrap_or_else(|| Expression::from(0.0));
    let rhs = rhs.unwrap_or_else(|| Expression::from(0.0));
    Some(constraint!(lhs <= rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::{variable, variables};

    #[test]
    fn test_linear_skips_absent_variables() {
        let mut vars = variables!();
        let x = vars.add(variable().min(0.0));
        assert!(linear([(1.0, None), (2.0, None)]).is_none());
        assert!(linear([(1.0, Some(x)), (2.0, None)]).is_some());
        assert!(equal(None, None).is_none());
        assert!(at_most(None, Some(Expression::from(1.0))).is_some());
    }
}
