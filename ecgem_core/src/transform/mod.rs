//! Stages transforming a metabolic model into an enzyme constrained model
//!
//! The stages run in a fixed order, each on the output of the previous one:
//! 1. [`split::split_reversible`] splits reversible reactions into forward and reverse halves
//! 2. [`isozyme::expand_isozymes`] gives each alternative catalyst its own reaction
//! 3. [`usage::annotate_usage`] attaches enzyme costs computed from turnover numbers and masses
//! 4. [`calibrate::calibrate`] gives reactions without evidence the average cost
//!
//! [`pipeline::EnzymeConstraintPipeline`] runs them, each inside a [`Model::transaction`].
use std::collections::HashSet;

use thiserror::Error;

use crate::configuration::Configuration;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

pub mod calibrate;
pub mod isozyme;
pub mod pipeline;
pub mod split;
pub mod usage;

/// Id of the pseudometabolite representing the enzyme resource pool
pub const USAGE_METABOLITE: &str = "usage";
/// Name of the enzyme resource pseudometabolite
pub const USAGE_METABOLITE_NAME: &str = "resource_usage_pseudometabolite";
/// Id of the reaction supplying the enzyme resource pool
pub const USAGE_REACTION: &str = "DM_usage";

/// Decides which reactions the transformation stages may touch
///
/// Boundary reactions are identified by id against a snapshot taken when the filter is created.
pub struct ReactionFilter<'c> {
    config: &'c Configuration,
    boundary: HashSet<String>,
}

impl<'c> ReactionFilter<'c> {
    pub fn new(config: &'c Configuration, model: &Model) -> ReactionFilter<'c> {
        ReactionFilter {
            config,
            boundary: model.boundary_ids(),
        }
    }

    /// Whether the reaction is in the boundary snapshot
    pub fn is_boundary(&self, reaction: &Reaction) -> bool {
        self.boundary.contains(&reaction.id)
    }

    /// Whether the reaction's name (or id, if unnamed or the name is empty) marks it as a
    /// transporter
    pub fn is_transporter(&self, reaction: &Reaction) -> bool {
        let name = reaction
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&reaction.id);
        self.config.is_transporter_name(name)
    }

    /// Whether the reaction is explicitly excluded, by name or by id
    pub fn is_excluded(&self, reaction: &Reaction) -> bool {
        self.config
            .excluded_reactions
            .iter()
            .any(|e| Some(e.as_str()) == reaction.name.as_deref() || *e == reaction.id)
    }

    /// Reactions which may be split or expanded: neither boundary nor transporter
    pub fn is_structurally_eligible(&self, reaction: &Reaction) -> bool {
        !self.is_boundary(reaction) && !self.is_transporter(reaction)
    }

    /// Reactions which must carry an enzyme cost
    ///
    /// Structurally eligible, not excluded, catalyzed by at least one gene, and constrained to a
    /// single direction.
    pub fn is_cost_eligible(&self, reaction: &Reaction) -> bool {
        self.is_structurally_eligible(reaction)
            && !self.is_excluded(reaction)
            && reaction.has_genes()
            && reaction.direction().is_some()
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Model invariant violated")]
    InvalidModel(#[from] ModelError),
    #[error("Splitting produced {actual} reactions, expected {expected}")]
    SplitCountMismatch { expected: usize, actual: usize },
    #[error("{0} reactions need an enzyme cost but no reaction has one to calibrate against")]
    NoReferenceCoefficients(usize),
}
