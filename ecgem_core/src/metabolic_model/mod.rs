//! Types representing a metabolic model: reactions, metabolites, genes, and the model itself.

pub mod gene;
pub mod metabolite;
pub mod model;
pub mod reaction;
