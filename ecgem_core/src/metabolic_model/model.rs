//! This module provides the Model struct for representing an entire metabolic model
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Errors
    /// [`ModelError::DuplicateId`] if the reaction id is already used by any reaction,
    /// metabolite, or gene in the model
    ///
    /// # Examples
    /// ```rust
    /// use ecgem_core::metabolic_model::model::Model;
    /// use ecgem_core::metabolic_model::reaction::{Reaction, ReactionBuilder};
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction).unwrap();
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        self.check_unused(&reaction.id)?;
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(())
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) -> Result<(), ModelError> {
        self.check_unused(&metabolite.id)?;
        self.metabolites.insert(metabolite.id.clone(), metabolite);
        Ok(())
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use ecgem_core::metabolic_model::gene::GeneBuilder;
    /// use ecgem_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene).unwrap();
    /// ```
    pub fn add_gene(&mut self, gene: Gene) -> Result<(), ModelError> {
        self.check_unused(&gene.id)?;
        self.genes.insert(gene.id.clone(), gene);
        Ok(())
    }

    /// Remove a reaction, keeping the order of the remaining reactions
    ///
    /// Genes and metabolites of the reaction are kept in the model.
    pub fn remove_reaction(&mut self, id: &str) -> Option<Reaction> {
        self.objective.shift_remove(id);
        self.reactions.shift_remove(id)
    }

    /// Which kind of object (if any) already uses `id`
    pub fn id_kind(&self, id: &str) -> Option<IdKind> {
        if self.reactions.contains_key(id) {
            Some(IdKind::Reaction)
        } else if self.metabolites.contains_key(id) {
            Some(IdKind::Metabolite)
        } else if self.genes.contains_key(id) {
            Some(IdKind::Gene)
        } else {
            None
        }
    }

    fn check_unused(&self, id: &str) -> Result<(), ModelError> {
        match self.id_kind(id) {
            Some(existing) => Err(ModelError::DuplicateId {
                id: id.to_string(),
                existing,
            }),
            None => Ok(()),
        }
    }

    /// Ids of the reactions whose GPR mentions `gene_id`
    pub fn gene_reactions(&self, gene_id: &str) -> Vec<&str> {
        self.reactions
            .values()
            .filter(|r| r.genes().iter().any(|g| g == gene_id))
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Snapshot of the ids of all boundary reactions
    pub fn boundary_ids(&self) -> HashSet<String> {
        self.reactions
            .values()
            .filter(|r| r.is_boundary())
            .map(|r| r.id.clone())
            .collect()
    }

    /// Check the structural invariants of the model
    ///
    /// - every map key matches the id of the object it holds
    /// - ids are unique across reactions, metabolites, and genes
    /// - every metabolite in a reaction's stoichiometry exists
    /// - every gene in a reaction's GPR exists
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen: HashMap<&str, IdKind> = HashMap::new();
        let keyed = self
            .reactions
            .iter()
            .map(|(k, r)| (k, r.id.as_str(), IdKind::Reaction))
            .chain(
                self.metabolites
                    .iter()
                    .map(|(k, m)| (k, m.id.as_str(), IdKind::Metabolite)),
            )
            .chain(
                self.genes
                    .iter()
                    .map(|(k, g)| (k, g.id.as_str(), IdKind::Gene)),
            );
        for (key, id, kind) in keyed {
            if key != id {
                return Err(ModelError::KeyMismatch {
                    key: key.clone(),
                    id: id.to_string(),
                });
            }
            if let Some(existing) = seen.insert(id, kind) {
                return Err(ModelError::DuplicateId {
                    id: id.to_string(),
                    existing,
                });
            }
        }
        for reaction in self.reactions.values() {
            if let Some(met) = reaction
                .metabolites
                .keys()
                .find(|m| !self.metabolites.contains_key(*m))
            {
                return Err(ModelError::UnknownMetabolite {
                    reaction: reaction.id.clone(),
                    metabolite: met.clone(),
                });
            }
            if let Some(gene) = reaction
                .genes()
                .into_iter()
                .find(|g| !self.genes.contains_key(g))
            {
                return Err(ModelError::UnknownGene {
                    reaction: reaction.id.clone(),
                    gene,
                });
            }
        }
        Ok(())
    }

    /// Apply a group of changes to the model as a single unit
    ///
    /// `changes` is run against a copy of the model. The copy replaces the model only if
    /// `changes` succeeds and the copy passes [`Model::validate`], otherwise the model is left
    /// exactly as it was.
    ///
    /// # Examples
    /// ```rust
    /// use ecgem_core::metabolic_model::model::{Model, ModelError};
    /// use ecgem_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let res: Result<(), ModelError> = model.transaction(|draft| {
    ///     draft.add_reaction(ReactionBuilder::default().id("R1".to_string()).build().unwrap())?;
    ///     draft.add_reaction(ReactionBuilder::default().id("R1".to_string()).build().unwrap())
    /// });
    /// assert!(res.is_err());
    /// assert!(model.reactions.is_empty());
    /// ```
    pub fn transaction<T, E, F>(&mut self, changes: F) -> Result<T, E>
    where
        F: FnOnce(&mut Model) -> Result<T, E>,
        E: From<ModelError>,
    {
        let mut draft = self.clone();
        let value = changes(&mut draft)?;
        draft.validate()?;
        *self = draft;
        Ok(value)
    }

    /// Set the growth medium
    ///
    /// Boundary reactions listed in `medium` may import up to the given rate, all other exchange
    /// reactions (ids starting with `EX_`) have import closed. Returns the medium ids which do
    /// not name a boundary reaction of the model.
    pub fn set_medium(&mut self, medium: &IndexMap<String, f64>) -> Vec<String> {
        for reaction in self.reactions.values_mut() {
            if !reaction.is_boundary() {
                continue;
            }
            let rate = match medium.get(&reaction.id) {
                Some(rate) => *rate,
                None if reaction.id.starts_with("EX_") => 0.,
                None => continue,
            };
            // Import direction depends on which side of the reaction the metabolite is on
            let coefficient = reaction.metabolites.values().next().copied().unwrap_or(-1.);
            if coefficient < 0. {
                reaction.lower_bound = -rate;
            } else {
                reaction.upper_bound = rate;
            }
            debug!("Import bound of {} set to {}", reaction.id, rate);
        }
        medium
            .keys()
            .filter(|id| {
                self.reactions
                    .get(*id)
                    .map(|r| !r.is_boundary())
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }
}

/// Kinds of identified objects in a model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    Reaction,
    Metabolite,
    Gene,
}

impl Display for IdKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Reaction => write!(f, "reaction"),
            IdKind::Metabolite => write!(f, "metabolite"),
            IdKind::Gene => write!(f, "gene"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Id `{id}` is already used by a {existing}")]
    DuplicateId { id: String, existing: IdKind },
    #[error("Map key `{key}` does not match the id `{id}` of the object it holds")]
    KeyMismatch { key: String, id: String },
    #[error("Reaction `{reaction}` references metabolite `{metabolite}` which is not in the model")]
    UnknownMetabolite { reaction: String, metabolite: String },
    #[error("Reaction `{reaction}` references gene `{gene}` which is not in the model")]
    UnknownGene { reaction: String, gene: String },
}

#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::metabolic_model::gene::Gpr;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn metabolite(id: &str) -> Metabolite {
        MetaboliteBuilder::default()
            .id(id.to_string())
            .build()
            .unwrap()
    }

    fn reaction(id: &str, stoich: &[(&str, f64)]) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
            .build()
            .unwrap()
    }

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(metabolite("glc__D_e")).unwrap();
        model.add_metabolite(metabolite("glc__D_c")).unwrap();
        model.add_gene(Gene::new("b1101")).unwrap();
        model
            .add_reaction(reaction("EX_glc__D_e", &[("glc__D_e", -1.)]))
            .unwrap();
        model
            .add_reaction(reaction("EX_o2_e", &[("glc__D_e", -1.)]))
            .unwrap();
        let mut transport = reaction("GLCpts", &[("glc__D_e", -1.), ("glc__D_c", 1.)]);
        transport.gpr = Some(Gpr::new_gene_node("b1101"));
        model.add_reaction(transport).unwrap();
        model
    }

    #[test]
    fn duplicate_ids_rejected_across_collections() {
        let mut model = setup_model();
        let res = model.add_reaction(reaction("GLCpts", &[]));
        assert_eq!(
            res,
            Err(ModelError::DuplicateId {
                id: "GLCpts".to_string(),
                existing: IdKind::Reaction
            })
        );
        let res = model.add_metabolite(metabolite("b1101"));
        assert!(matches!(
            res,
            Err(ModelError::DuplicateId {
                existing: IdKind::Gene,
                ..
            })
        ));
        assert_eq!(model.metabolites.len(), 2);
    }

    #[test]
    fn validate_detects_dangling_references() {
        let mut model = setup_model();
        assert!(model.validate().is_ok());

        model
            .reactions
            .insert("BAD".to_string(), reaction("BAD", &[("missing_c", 1.)]));
        assert!(matches!(
            model.validate(),
            Err(ModelError::UnknownMetabolite { .. })
        ));

        let mut model = setup_model();
        let mut bad = reaction("BAD", &[("glc__D_c", 1.)]);
        bad.gpr = Some(Gpr::new_gene_node("b9999"));
        model.reactions.insert("BAD".to_string(), bad);
        assert!(matches!(model.validate(), Err(ModelError::UnknownGene { .. })));
    }

    #[test]
    fn validate_detects_key_mismatch() {
        let mut model = setup_model();
        model
            .reactions
            .insert("ALIAS".to_string(), reaction("GLCpts", &[]));
        assert!(matches!(
            model.validate(),
            Err(ModelError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn transaction_commits_on_success() {
        let mut model = setup_model();
        let res: Result<usize, ModelError> = model.transaction(|draft| {
            draft.add_metabolite(metabolite("usage"))?;
            Ok(draft.metabolites.len())
        });
        assert_eq!(res, Ok(3));
        assert!(model.metabolites.contains_key("usage"));
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut model = setup_model();
        let before = model.clone();
        let res: Result<(), ModelError> = model.transaction(|draft| {
            draft.remove_reaction("GLCpts");
            draft.add_metabolite(metabolite("glc__D_c"))
        });
        assert!(res.is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn transaction_rolls_back_on_invalid_draft() {
        let mut model = setup_model();
        let before = model.clone();
        let res: Result<(), ModelError> = model.transaction(|draft| {
            // Bypasses the add_* checks, so only validation catches it
            draft
                .reactions
                .insert("glc__D_c".to_string(), reaction("glc__D_c", &[]));
            Ok(())
        });
        assert!(matches!(res, Err(ModelError::DuplicateId { .. })));
        assert_eq!(model, before);
    }

    #[test]
    fn remove_keeps_order() {
        let mut model = setup_model();
        model.remove_reaction("EX_o2_e");
        let ids: Vec<&String> = model.reactions.keys().collect();
        assert_eq!(ids, vec!["EX_glc__D_e", "GLCpts"]);
    }

    #[test]
    fn gene_reactions_and_boundary() {
        let model = setup_model();
        assert_eq!(model.gene_reactions("b1101"), vec!["GLCpts"]);
        let boundary = model.boundary_ids();
        assert!(boundary.contains("EX_glc__D_e"));
        assert!(!boundary.contains("GLCpts"));
    }

    #[test]
    fn medium() {
        let mut model = setup_model();
        let mut medium = IndexMap::new();
        medium.insert("EX_glc__D_e".to_string(), 10.);
        medium.insert("EX_missing_e".to_string(), 5.);
        let unknown = model.set_medium(&medium);
        assert_eq!(unknown, vec!["EX_missing_e"]);
        assert!((model.reactions["EX_glc__D_e"].lower_bound + 10.).abs() < 1e-12);
        // Exchanges outside the medium are closed for import
        assert!(model.reactions["EX_o2_e"].lower_bound.abs() < 1e-12);
    }
}
