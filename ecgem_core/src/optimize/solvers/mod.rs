//! Solver interfaces for flux balance problems
pub mod clarabel;

use crate::optimize::problem::LinearProblem;
use crate::optimize::{OptimizationStatus, OptimizeError};

/// Solution of a [`LinearProblem`], with values in variable order
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemSolution {
    pub status: OptimizationStatus,
    /// Objective value, `None` unless the problem was solved
    pub objective_value: Option<f64>,
    /// Variable values, `None` unless the problem was solved
    pub variable_values: Option<Vec<f64>>,
}

/// A solver able to maximize linear problems
pub trait LinearSolver {
    fn solve(&self, problem: &LinearProblem) -> Result<ProblemSolution, OptimizeError>;
}
