//! Module for solving flux balance problems and summarizing their solutions

pub mod problem;
pub mod solvers;

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::info;
use thiserror::Error;

use crate::configuration::DEFAULT_TOLERANCE;
use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::problem::LinearProblem;
use crate::optimize::solvers::clarabel::ClarabelSolver;
use crate::optimize::solvers::LinearSolver;

/// Struct representing the solution of a flux balance problem
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Fluxes at the optimum, keyed by reaction id
    ///
    /// Some(IndexMap) if the problem could be solved, None otherwise
    pub fluxes: Option<IndexMap<String, f64>>,
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// An approximate solution has been found
    AlmostOptimal,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

impl Model {
    /// Maximize the objective with flux balance analysis
    pub fn optimize(&self) -> Result<Solution, OptimizeError> {
        self.optimize_with(&ClarabelSolver::default())
    }

    /// Maximize the objective using a specific solver
    pub fn optimize_with<S: LinearSolver>(&self, solver: &S) -> Result<Solution, OptimizeError> {
        let problem = LinearProblem::from_model(self)?;
        let solution = solver.solve(&problem)?;
        let fluxes = solution.variable_values.map(|values| {
            problem
                .variable_ids
                .iter()
                .cloned()
                .zip(values)
                .collect::<IndexMap<String, f64>>()
        });
        info!(
            "Optimization finished with status {:?}, objective {:?}",
            solution.status, solution.objective_value
        );
        Ok(Solution {
            status: solution.status,
            objective_value: solution.objective_value,
            fluxes,
        })
    }
}

impl Solution {
    /// Summarize the exchange of metabolites with the environment
    ///
    /// Boundary reactions whose metabolite enters the model with more than `tolerance` flux are
    /// listed as uptake, those where it leaves as secretion.
    pub fn summary(&self, model: &Model, tolerance: f64) -> Result<ModelSummary, OptimizeError> {
        let (Some(objective_value), Some(fluxes)) = (self.objective_value, self.fluxes.as_ref())
        else {
            return Err(OptimizeError::NoSolution(self.status));
        };
        let mut summary = ModelSummary {
            objective_value,
            objective: model
                .objective
                .iter()
                .map(|(id, coef)| (id.clone(), *coef, fluxes.get(id).copied().unwrap_or(0.)))
                .collect(),
            uptake: Vec::new(),
            secretion: Vec::new(),
        };
        for reaction in model.reactions.values().filter(|r| r.is_boundary()) {
            let flux = fluxes.get(&reaction.id).copied().unwrap_or(0.);
            let Some((metabolite, coef)) = reaction.metabolites.first() else {
                continue;
            };
            let produced = coef * flux;
            let entry = ExchangeFlux {
                metabolite: metabolite.clone(),
                reaction: reaction.id.clone(),
                flux: produced.abs(),
            };
            if produced > tolerance {
                summary.uptake.push(entry);
            } else if produced < -tolerance {
                summary.secretion.push(entry);
            }
        }
        let by_flux = |a: &ExchangeFlux, b: &ExchangeFlux| b.flux.total_cmp(&a.flux);
        summary.uptake.sort_by(by_flux);
        summary.secretion.sort_by(by_flux);
        Ok(summary)
    }
}

/// Flux of a metabolite across the model boundary
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeFlux {
    pub metabolite: String,
    pub reaction: String,
    /// Magnitude of the exchange
    pub flux: f64,
}

/// Objective value and boundary fluxes of a solved model
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSummary {
    pub objective_value: f64,
    /// (reaction id, objective coefficient, flux) of each objective reaction
    pub objective: Vec<(String, f64, f64)>,
    pub uptake: Vec<ExchangeFlux>,
    pub secretion: Vec<ExchangeFlux>,
}

impl Display for ModelSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Objective")?;
        writeln!(f, "=========")?;
        let terms: Vec<String> = self
            .objective
            .iter()
            .map(|(id, coef, _)| format!("{coef} {id}"))
            .collect();
        writeln!(f, "{} = {:.6}", terms.join(" + "), self.objective_value)?;
        for (title, rows) in [("Uptake", &self.uptake), ("Secretion", &self.secretion)] {
            writeln!(f)?;
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))?;
            writeln!(f, "{:<20} {:<20} {:>12}", "Metabolite", "Reaction", "Flux")?;
            for row in rows {
                writeln!(
                    f,
                    "{:<20} {:<20} {:>12.6}",
                    row.metabolite, row.reaction, row.flux
                )?;
            }
        }
        Ok(())
    }
}

/// Optimize a model and summarize the solution with the default tolerance
pub fn optimize_and_summarize(model: &Model) -> Result<ModelSummary, OptimizeError> {
    model.optimize()?.summary(model, DEFAULT_TOLERANCE)
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Model has no reactions to optimize")]
    EmptyModel,
    #[error("Model is inconsistent")]
    InvalidModel(#[from] ModelError),
    #[error("Reaction {0} has a lower bound above its upper bound")]
    InvalidBounds(String),
    #[error("Unable to configure the solver: {0}")]
    SolverSettings(String),
    #[error("No solution to summarize, optimization ended with status {0:?}")]
    NoSolution(OptimizationStatus),
}
