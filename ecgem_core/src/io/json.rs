//! Module providing JSON IO for models, following the COBRA JSON model schema
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    charge: Option<i32>,
    formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    subsystem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Notes and annotations are kept as JSON strings, values which are not JSON are written
/// back out as plain strings
fn to_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes.map(|v| v.to_string()),
            annotation: g.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes.map(|v| v.to_string()),
            annotation: m.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            notes: g.notes.as_deref().map(to_value),
            annotation: g.annotation.as_deref().map(to_value),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: Some(m.charge),
            formula: m.formula.clone(),
            notes: m.notes.as_deref().map(to_value),
            annotation: m.annotation.as_deref().map(to_value),
        }
    }
}

impl Model {
    /// Read a model from a COBRA JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a COBRA JSON string
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    /// Write the model to a COBRA JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Serialize the model to a COBRA JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        // Start by converting the genes and metabolites using the From methods
        for g in json_model.genes {
            model.add_gene(Gene::from(g))?;
        }
        for m in json_model.metabolites {
            model.add_metabolite(Metabolite::from(m))?;
        }
        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way
        */
        for rxn in json_model.reactions {
            let gpr = if !rxn.gene_reaction_rule.trim().is_empty() {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?)
            } else {
                None
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes.map(|v| v.to_string()))
                .annotation(rxn.annotation.map(|v| v.to_string()))
                .build()?;
            model.add_reaction(new_reaction)?;
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient.filter(|c| *c != 0.) {
                model.objective.insert(rxn.id, coef);
            }
        }
        model.id = json_model.id;
        model.compartments = json_model.compartments;
        model.version = json_model.version;
        model.validate()?;
        debug!(
            "Read model with {} reactions, {} metabolites, {} genes",
            model.reactions.len(),
            model.metabolites.len(),
            model.genes.len()
        );
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let json_reactions = self
            .reactions
            .values()
            .map(|r| self.reaction_to_json(r))
            .collect();
        JsonModel {
            metabolites: self.metabolites.values().map(JsonMetabolite::from).collect(),
            reactions: json_reactions,
            genes: self.genes.values().map(JsonGene::from).collect(),
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }

    fn reaction_to_json(&self, r: &Reaction) -> JsonReaction {
        JsonReaction {
            id: r.id.clone(),
            name: r.name.clone(),
            metabolites: r.metabolites.clone(),
            lower_bound: r.lower_bound,
            upper_bound: r.upper_bound,
            gene_reaction_rule: r.gene_reaction_rule(),
            objective_coefficient: self.objective.get(&r.id).copied(),
            subsystem: r.subsystem.clone(),
            notes: r.notes.as_deref().map(to_value),
            annotation: r.annotation.as_deref().map(to_value),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a GPR rule during conversion from JSON")]
    GprParserError(#[from] GprParseError),
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Model read from JSON is inconsistent")]
    InvalidModel(#[from] ModelError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions
