//! Implements a solver interface for Clarabel
use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::debug;

use crate::optimize::problem::LinearProblem;
use crate::optimize::solvers::{LinearSolver, ProblemSolution};
use crate::optimize::{OptimizationStatus, OptimizeError};

/// Interior point solver, used for linear problems by leaving the quadratic term empty
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Print solver progress
    pub verbose: bool,
    /// Iteration limit
    pub max_iter: u32,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            verbose: false,
            max_iter: 200,
        }
    }
}

impl From<SolverStatus> for OptimizationStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        }
    }
}

impl LinearSolver for ClarabelSolver {
    fn solve(&self, problem: &LinearProblem) -> Result<ProblemSolution, OptimizeError> {
        let n = problem.num_variables();
        let constraints = problem.stacked_constraints();
        let (col_offsets, row_indices, values) = constraints.matrix.disassemble();
        let a = CscMatrix::new(
            constraints.equalities + constraints.inequalities,
            n,
            col_offsets,
            row_indices,
            values,
        );
        let p = CscMatrix::<f64>::zeros((n, n));
        // Clarabel minimizes
        let q: Vec<f64> = problem.objective.iter().map(|c| -c).collect();
        let cones = [
            SupportedConeT::ZeroConeT(constraints.equalities),
            SupportedConeT::NonnegativeConeT(constraints.inequalities),
        ];
        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iter)
            .build()
            .map_err(|err| OptimizeError::SolverSettings(err.to_string()))?;
        let mut solver = DefaultSolver::new(&p, &q, &a, &constraints.rhs, &cones, settings);
        solver.solve();

        let status = OptimizationStatus::from(solver.solution.status);
        debug!(
            "Clarabel finished with {:?} after {} iterations",
            solver.solution.status, solver.solution.iterations
        );
        let solved = matches!(
            status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        );
        Ok(ProblemSolution {
            status,
            objective_value: solved.then(|| -solver.solution.obj_val),
            variable_values: solved.then(|| solver.solution.x.clone()),
        })
    }
}
