//! Splits reversible reactions into irreversible forward and reverse halves
use std::collections::HashSet;

use log::{debug, info};

use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::transform::{ReactionFilter, TransformError};

/// Suffix of the forward half of a split reaction
pub const FORWARD_SUFFIX: &str = "_fwr";
/// Suffix of the reverse half of a split reaction
pub const REVERSE_SUFFIX: &str = "_rev";

/// Result of splitting
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitReport {
    /// Ids (before splitting) of the reactions which were split
    pub split: Vec<String>,
    /// Number of reactions in the model after splitting
    pub reaction_count: usize,
}

/// Split every eligible reversible reaction
///
/// The reaction keeps its place in the model, renamed to `<id>_fwr` with bounds
/// `(0, upper_bound)`. A copy named `<id>_rev` with bounds `(lower_bound, 0)` is appended after
/// all existing reactions. Stoichiometry, genes, and subsystem are shared by both halves. An
/// objective coefficient follows the forward half.
///
/// # Errors
/// [`TransformError::InvalidModel`] if a new id is already in use, in which case the model may be
/// partially modified (run inside [`Model::transaction`]).
pub fn split_reversible(
    model: &mut Model,
    filter: &ReactionFilter,
    config: &Configuration,
) -> Result<SplitReport, TransformError> {
    let targets: Vec<String> = model
        .reactions
        .values()
        .filter(|r| r.is_reversible() && filter.is_structurally_eligible(r))
        .map(|r| r.id.clone())
        .collect();
    let expected = model.reactions.len() + targets.len();

    // Clone every reverse half before any reaction is renamed
    let reverse_halves: Vec<Reaction> = targets
        .iter()
        .map(|id| {
            let mut reverse = model.reactions[id.as_str()].clone();
            reverse.id = format!("{id}{REVERSE_SUFFIX}");
            reverse.lower_bound = config.lower_bound;
            reverse.upper_bound = 0.;
            reverse
        })
        .collect();

    let target_set: HashSet<&str> = targets.iter().map(|id| id.as_str()).collect();
    let reactions = std::mem::take(&mut model.reactions);
    for (id, mut reaction) in reactions {
        if target_set.contains(id.as_str()) {
            reaction.id = format!("{id}{FORWARD_SUFFIX}");
            reaction.lower_bound = 0.;
            reaction.upper_bound = config.upper_bound;
            if let Some(coefficient) = model.objective.shift_remove(&id) {
                model.objective.insert(reaction.id.clone(), coefficient);
            }
            debug!("Split {} into {} and {}{}", id, reaction.id, id, REVERSE_SUFFIX);
        }
        model.add_reaction(reaction)?;
    }
    for reverse in reverse_halves {
        model.add_reaction(reverse)?;
    }

    let actual = model.reactions.len();
    if actual != expected {
        return Err(TransformError::SplitCountMismatch { expected, actual });
    }
    info!("Split {} reversible reactions", targets.len());
    Ok(SplitReport {
        split: targets,
        reaction_count: actual,
    })
}
