//! This module provides a struct for representing reactions
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::configuration::{DEFAULT_LOWER_BOUND, DEFAULT_UPPER_BOUND};
use crate::metabolic_model::gene::Gpr;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule describing which gene products catalyze the reaction
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "DEFAULT_LOWER_BOUND")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "DEFAULT_UPPER_BOUND")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Metabolites consumed when the reaction carries positive flux
    pub fn reactants(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0.)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Metabolites produced when the reaction carries positive flux
    pub fn products(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0.)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Ids of the genes in the reaction's GPR, in order of appearance
    pub fn genes(&self) -> Vec<String> {
        self.gpr.as_ref().map(|g| g.genes()).unwrap_or_default()
    }

    /// Whether at least one gene is associated with the reaction
    pub fn has_genes(&self) -> bool {
        self.gpr.is_some()
    }

    /// Gene reaction rule as a string, empty when there is no GPR
    pub fn gene_reaction_rule(&self) -> String {
        self.gpr
            .as_ref()
            .map(|g| g.to_string_id())
            .unwrap_or_default()
    }

    /// Whether flux is allowed in both directions
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0. && self.upper_bound > 0.
    }

    /// Whether the reaction connects the model to its environment (exchange, demand or sink)
    ///
    /// # Note:
    /// This is purely structural, any reaction involving a single metabolite is a boundary.
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// The direction flux is constrained to, `None` if both or neither direction is allowed
    pub fn direction(&self) -> Option<Direction> {
        if self.lower_bound >= 0. && self.upper_bound > 0. {
            Some(Direction::Forward)
        } else if self.lower_bound < 0. && self.upper_bound <= 0. {
            Some(Direction::Reverse)
        } else {
            None
        }
    }

    /// Metabolites acting as substrates when running in `direction`
    ///
    /// # Note:
    /// In the reverse direction the substrates are the (forward) products.
    pub fn substrates(&self, direction: Direction) -> Vec<&str> {
        match direction {
            Direction::Forward => self.reactants(),
            Direction::Reverse => self.products(),
        }
    }

    /// Stoichiometric coefficient of a metabolite, if it takes part in the reaction
    pub fn coefficient(&self, metabolite_id: &str) -> Option<f64> {
        self.metabolites.get(metabolite_id).copied()
    }

    /// Reaction equation written with metabolite ids, e.g. `2.0 h_c + pyr_c --> lac__D_c`
    ///
    /// The arrow reflects the bounds: `<=>` reversible, `-->` forward only, `<--` reverse only.
    pub fn equation(&self) -> String {
        let side = |ids: Vec<&str>| {
            ids.iter()
                .map(|id| {
                    let coef = self.metabolites[*id].abs();
                    if (coef - 1.).abs() < 1e-12 {
                        id.to_string()
                    } else {
                        format!("{coef:?} {id}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let arrow = if self.is_reversible() {
            "<=>"
        } else if self.upper_bound <= 0. && self.lower_bound < 0. {
            "<--"
        } else {
            "-->"
        };
        format!("{} {} {}", side(self.reactants()), arrow, side(self.products()))
    }
}

/// Direction a reaction carries flux in
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Sign of resource usage coefficients for reactions running in this direction
    ///
    /// Forward reactions consume the resource (negative coefficient). Reverse reactions carry
    /// negative flux, so the coefficient must be positive to consume the resource.
    pub fn usage_sign(&self) -> f64 {
        match self {
            Direction::Forward => -1.,
            Direction::Reverse => 1.,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "Forward"),
            Direction::Reverse => write!(f, "Reverse"),
        }
    }
}
