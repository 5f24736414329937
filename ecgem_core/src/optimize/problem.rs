//! Provides the linear program behind flux balance analysis
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::metabolic_model::model::Model;
use crate::optimize::OptimizeError;

/// Flux balance linear program
///
/// maximize `objective · v` subject to `S v = 0` and `lower_bounds <= v <= upper_bounds`, with
/// one variable per reaction, in model order.
#[derive(Clone, Debug)]
pub struct LinearProblem {
    /// Reaction id of each variable
    pub variable_ids: Vec<String>,
    /// Objective coefficient of each variable
    pub objective: Vec<f64>,
    /// Stoichiometric matrix, metabolites by reactions
    pub stoichiometry: CscMatrix<f64>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

/// Constraints of a [`LinearProblem`] in the form `A v + s = b`
///
/// The first `equalities` rows have `s = 0`, the remaining `inequalities` rows have `s >= 0`.
pub struct StackedConstraints {
    pub matrix: CscMatrix<f64>,
    pub rhs: Vec<f64>,
    pub equalities: usize,
    pub inequalities: usize,
}

impl LinearProblem {
    /// Build the problem for a model
    ///
    /// # Errors
    /// - [`OptimizeError::EmptyModel`] if the model has no reactions
    /// - [`OptimizeError::InvalidModel`] if the model fails validation
    /// - [`OptimizeError::InvalidBounds`] if a reaction has its lower bound above its upper bound
    pub fn from_model(model: &Model) -> Result<LinearProblem, OptimizeError> {
        if model.reactions.is_empty() {
            return Err(OptimizeError::EmptyModel);
        }
        model.validate()?;
        let n_reactions = model.reactions.len();
        let mut coo = CooMatrix::new(model.metabolites.len(), n_reactions);
        let mut variable_ids = Vec::with_capacity(n_reactions);
        let mut objective = Vec::with_capacity(n_reactions);
        let mut lower_bounds = Vec::with_capacity(n_reactions);
        let mut upper_bounds = Vec::with_capacity(n_reactions);
        for (col, reaction) in model.reactions.values().enumerate() {
            if reaction.lower_bound > reaction.upper_bound {
                return Err(OptimizeError::InvalidBounds(reaction.id.clone()));
            }
            for (met, coef) in &reaction.metabolites {
                // Validation guarantees the metabolite exists
                if let Some(row) = model.metabolites.get_index_of(met) {
                    coo.push(row, col, *coef);
                }
            }
            variable_ids.push(reaction.id.clone());
            objective.push(model.objective.get(&reaction.id).copied().unwrap_or(0.));
            lower_bounds.push(reaction.lower_bound);
            upper_bounds.push(reaction.upper_bound);
        }
        Ok(LinearProblem {
            variable_ids,
            objective,
            stoichiometry: CscMatrix::from(&coo),
            lower_bounds,
            upper_bounds,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.variable_ids.len()
    }

    /// Stack mass balance rows, then `v <= ub` rows, then `-v <= -lb` rows
    ///
    /// Rows for infinite bounds are left out.
    pub fn stacked_constraints(&self) -> StackedConstraints {
        let n = self.num_variables();
        let equalities = self.stoichiometry.nrows();
        let inequalities = self
            .upper_bounds
            .iter()
            .chain(self.lower_bounds.iter())
            .filter(|b| b.is_finite())
            .count();
        let mut rhs = vec![0.; equalities];
        let mut coo = CooMatrix::new(equalities + inequalities, n);
        for (row, col, value) in self.stoichiometry.triplet_iter() {
            coo.push(row, col, *value);
        }
        let mut row = equalities;
        for (col, ub) in self.upper_bounds.iter().enumerate() {
            if ub.is_finite() {
                coo.push(row, col, 1.);
                rhs.push(*ub);
                row += 1;
            }
        }
        for (col, lb) in self.lower_bounds.iter().enumerate() {
            if lb.is_finite() {
                coo.push(row, col, -1.);
                rhs.push(-lb);
                row += 1;
            }
        }
        StackedConstraints {
            matrix: CscMatrix::from(&coo),
            rhs,
            equalities,
            inequalities,
        }
    }
}
