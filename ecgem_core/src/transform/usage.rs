//! Enzyme usage pool and enzyme cost annotation
//!
//! Enzyme costs are encoded as a stoichiometric coefficient of the `usage` pseudometabolite,
//! which is supplied by the `DM_usage` reaction. Bounding `DM_usage` bounds the total protein
//! mass the fluxes may use.
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::annotation::index::AnnotationIndex;
use crate::configuration::Configuration;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{Direction, Reaction};
use crate::transform::{
    ReactionFilter, TransformError, USAGE_METABOLITE, USAGE_METABOLITE_NAME, USAGE_REACTION,
};

const SECONDS_PER_HOUR: f64 = 3600.;
/// Converts a mass in g/mol into g/mmol
const MMOL_PER_MOL: f64 = 1e-3;

/// Add the `usage` pseudometabolite and the `DM_usage` reaction if absent
///
/// Returns whether anything was created.
pub fn ensure_usage_pool(model: &mut Model, config: &Configuration) -> Result<bool, TransformError> {
    let mut created = false;
    if !model.metabolites.contains_key(USAGE_METABOLITE) {
        model.add_metabolite(Metabolite {
            id: USAGE_METABOLITE.to_string(),
            name: Some(USAGE_METABOLITE_NAME.to_string()),
            compartment: Some("c".to_string()),
            charge: 0,
            formula: None,
            notes: None,
            annotation: None,
        })?;
        created = true;
    }
    if !model.reactions.contains_key(USAGE_REACTION) {
        let (lower_bound, upper_bound) = config.usage_bounds;
        model.add_reaction(Reaction {
            id: USAGE_REACTION.to_string(),
            metabolites: IndexMap::from([(USAGE_METABOLITE.to_string(), -1.)]),
            name: Some("Enzyme usage supply".to_string()),
            gpr: None,
            lower_bound,
            upper_bound,
            subsystem: None,
            notes: None,
            annotation: None,
        })?;
        created = true;
    }
    if created {
        info!("Created the enzyme usage pool");
    }
    Ok(created)
}

/// Enzyme cost (g protein per mmol of flux) of a reaction running in `direction`
///
/// Every gene with turnover evidence adds its mass once, however many substrates it has
/// evidence for. Turnover numbers are averaged per substrate and the slowest substrate sets the
/// rate. Returns `None` if no gene has both evidence and a mass.
pub fn enzyme_cost(
    reaction: &Reaction,
    direction: Direction,
    index: &AnnotationIndex,
    metabolites: &IndexMap<String, Metabolite>,
) -> Option<f64> {
    let substrates = index.candidate_substrates(reaction, direction, metabolites);
    if substrates.is_empty() {
        debug!("Reaction {} has no non-cofactor substrates", reaction.id);
        return None;
    }
    let mut total_mass = 0.;
    let mut turnover: IndexMap<String, Vec<f64>> = IndexMap::new();
    for gene in reaction.genes() {
        let evidence = index.evidence(&gene, &reaction.id, direction, &substrates);
        if evidence.is_empty() {
            continue;
        }
        let Some(mass) = index.mass(&gene) else {
            warn!(
                "Gene {} has turnover numbers for {} but no mass",
                gene, reaction.id
            );
            continue;
        };
        total_mass += mass;
        for (substrate, kcat) in evidence {
            turnover.entry(substrate).or_default().push(kcat);
        }
    }
    let slowest = turnover
        .values()
        .map(|kcats| kcats.iter().sum::<f64>() / kcats.len() as f64)
        .reduce(f64::min)?;
    let rate = slowest * SECONDS_PER_HOUR;
    Some(total_mass * MMOL_PER_MOL / rate)
}

/// Result of enzyme cost annotation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsageReport {
    /// Usage coefficients placed, by reaction id
    pub annotated: IndexMap<String, f64>,
    /// Eligible reactions without evidence, left for calibration
    pub deferred: Vec<String>,
}

/// Attach a usage coefficient to every cost eligible reaction with turnover evidence
///
/// Forward reactions get `-cost` and reverse reactions `+cost`, so that flux in the allowed
/// direction consumes the pool. Reactions which already have a usage coefficient are skipped.
pub fn annotate_usage(
    model: &mut Model,
    index: &AnnotationIndex,
    filter: &ReactionFilter,
) -> Result<UsageReport, TransformError> {
    let mut report = UsageReport::default();
    for reaction in model.reactions.values() {
        if !filter.is_cost_eligible(reaction) || reaction.coefficient(USAGE_METABOLITE).is_some() {
            continue;
        }
        let Some(direction) = reaction.direction() else {
            continue;
        };
        match enzyme_cost(reaction, direction, index, &model.metabolites) {
            Some(cost) => {
                let coefficient = direction.usage_sign() * cost;
                debug!("Usage coefficient of {} is {}", reaction.id, coefficient);
                report.annotated.insert(reaction.id.clone(), coefficient);
            }
            None => {
                debug!("No enzyme cost evidence for {}", reaction.id);
                report.deferred.push(reaction.id.clone());
            }
        }
    }
    for (id, coefficient) in &report.annotated {
        if let Some(reaction) = model.reactions.get_mut(id) {
            reaction
                .metabolites
                .insert(USAGE_METABOLITE.to_string(), *coefficient);
        }
    }
    info!(
        "Annotated {} reactions with enzyme costs, {} left for calibration",
        report.annotated.len(),
        report.deferred.len()
    );
    Ok(report)
}
