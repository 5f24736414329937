//! Expands reactions catalyzed by alternative enzymes into one reaction per isozyme
use log::{debug, info, warn};

use crate::metabolic_model::gene::{Gpr, GprError};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::transform::{ReactionFilter, TransformError};

/// Result of isozyme expansion
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IsozymeReport {
    /// Ids of the reactions which were replaced by isozyme copies
    pub expanded: Vec<String>,
    /// Ids of the isozyme copies created
    pub created: Vec<String>,
    /// Reactions left unexpanded because their rule nests an `or` inside an `and`
    pub unsupported: Vec<(String, String)>,
}

/// Replace every eligible reaction whose rule has alternative clauses by one copy per clause
///
/// Clause `i` (counting from 1) becomes reaction `<id>_iso<i>`, named `<name> iso<i>`, with the
/// same stoichiometry, bounds, and subsystem, and a rule requiring exactly the clause's genes.
/// Copies are appended after all existing reactions and the original is removed. Rules with a
/// single clause are left untouched.
pub fn expand_isozymes(
    model: &mut Model,
    filter: &ReactionFilter,
) -> Result<IsozymeReport, TransformError> {
    let mut report = IsozymeReport::default();
    let mut copies: Vec<Reaction> = Vec::new();
    for reaction in model.reactions.values() {
        if !filter.is_structurally_eligible(reaction) {
            continue;
        }
        let Some(gpr) = reaction.gpr.as_ref() else {
            continue;
        };
        let clauses = match gpr.clauses() {
            Ok(clauses) => clauses,
            Err(err) => {
                let rule = gpr.to_string_id();
                match err {
                    GprError::NestedGrouping(group) => warn!(
                        "Reaction {} has the nested group `{}` in `{}`, leaving it unexpanded",
                        reaction.id, group, rule
                    ),
                    other => warn!("Unable to split the rule of {}: {}", reaction.id, other),
                }
                report.unsupported.push((reaction.id.clone(), rule));
                continue;
            }
        };
        if clauses.len() < 2 {
            continue;
        }
        for (i, clause) in clauses.iter().enumerate() {
            copies.push(isozyme_copy(reaction, i + 1, clause));
        }
        debug!("Expanded {} into {} isozymes", reaction.id, clauses.len());
        report.expanded.push(reaction.id.clone());
    }

    for id in &report.expanded {
        if model.objective.contains_key(id) {
            warn!("Objective reaction {} was expanded, its coefficient is dropped", id);
        }
        model.remove_reaction(id);
    }
    for copy in copies {
        report.created.push(copy.id.clone());
        model.add_reaction(copy)?;
    }
    info!(
        "Expanded {} reactions into {} isozyme reactions ({} unsupported rules)",
        report.expanded.len(),
        report.created.len(),
        report.unsupported.len()
    );
    Ok(report)
}

fn isozyme_copy(reaction: &Reaction, number: usize, genes: &[String]) -> Reaction {
    let mut copy = reaction.clone();
    copy.id = format!("{}_iso{}", reaction.id, number);
    copy.name = reaction.name.as_ref().map(|n| format!("{n} iso{number}"));
    copy.gpr = Gpr::conjunction(genes);
    copy
}
