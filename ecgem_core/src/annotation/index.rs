//! Lookup index over the annotation tables
//!
//! Gene identifiers are canonicalized (see [`canonical_gene_id`]) both when the tables are
//! indexed and when they are queried, so model ids such as `G_abcD_2` find table rows written as
//! `abcD.2`. Missing rows are a normal outcome, they are logged and reported as absent.
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::annotation::tables::{AnnotationTables, SMILES_NOT_FOUND};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Direction, Reaction};

/// Canonical form of a gene identifier
///
/// Identifiers of the form `G_<name>_<integer>` become `<name>.<integer>`, anything else is
/// returned unchanged.
///
/// # Examples
/// ```rust
/// use ecgem_core::annotation::index::canonical_gene_id;
/// assert_eq!(canonical_gene_id("G_abcD_2"), "abcD.2");
/// assert_eq!(canonical_gene_id("b0001"), "b0001");
/// ```
pub fn canonical_gene_id(gene_id: &str) -> String {
    if let Some((name, number)) = gene_id
        .strip_prefix("G_")
        .and_then(|rest| rest.rsplit_once('_'))
    {
        if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
            return format!("{name}.{number}");
        }
    }
    gene_id.to_string()
}

/// Ids a derived reaction id may appear under in the turnover table, most specific first
///
/// Isozyme copies (`_iso<N>`) and split halves (`_fwr`, `_rev`) share the evidence of the
/// reaction they were derived from.
pub fn reaction_id_chain(reaction_id: &str) -> Vec<&str> {
    let mut chain = vec![reaction_id];
    let mut current = reaction_id;
    if let Some((base, number)) = current.rsplit_once("_iso") {
        if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
            current = base;
            chain.push(current);
        }
    }
    if let Some(base) = current
        .strip_suffix("_fwr")
        .or_else(|| current.strip_suffix("_rev"))
    {
        chain.push(base);
    }
    chain
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct EvidenceKey {
    gene: String,
    reaction: String,
    direction: Direction,
}

/// Indexed view of the annotation tables
#[derive(Clone, Debug, Default)]
pub struct AnnotationIndex {
    masses: HashMap<String, f64>,
    smiles: HashMap<String, String>,
    /// Turnover numbers by (gene, reaction, direction), then by substrate
    turnover: HashMap<EvidenceKey, IndexMap<String, Vec<f64>>>,
    cofactors: HashSet<String>,
}

impl AnnotationIndex {
    /// Index the tables, `cofactors` are metabolite names (or ids) never treated as substrates
    pub fn new<S: AsRef<str>>(tables: &AnnotationTables, cofactors: &[S]) -> AnnotationIndex {
        let mut index = AnnotationIndex {
            cofactors: cofactors.iter().map(|c| c.as_ref().to_string()).collect(),
            ..AnnotationIndex::default()
        };
        for gene in &tables.genes {
            match gene.mass {
                Some(mass) if mass.is_finite() && mass > 0. => {
                    index.masses.insert(canonical_gene_id(&gene.gene_id), mass);
                }
                _ => debug!("Gene {} has no usable mass", gene.gene_id),
            }
        }
        for met in &tables.metabolites {
            if let Some(smiles) = met
                .smiles
                .as_ref()
                .filter(|s| !s.is_empty() && s.as_str() != SMILES_NOT_FOUND)
            {
                index
                    .smiles
                    .insert(met.metabolite_id.clone(), smiles.clone());
            }
        }
        let mut discarded = 0usize;
        for row in &tables.kcats {
            let kcat = match row.kcat {
                Some(kcat) if kcat.is_finite() && kcat > 0. => kcat,
                Some(kcat) => {
                    warn!(
                        "Discarding turnover number {} for gene {} in {} ({})",
                        kcat, row.gene_id, row.reaction_id, row.direction
                    );
                    discarded += 1;
                    continue;
                }
                None => continue,
            };
            index
                .turnover
                .entry(EvidenceKey {
                    gene: canonical_gene_id(&row.gene_id),
                    reaction: row.reaction_id.clone(),
                    direction: row.direction,
                })
                .or_default()
                .entry(row.substrate_id.clone())
                .or_default()
                .push(kcat);
        }
        debug!(
            "Indexed {} masses, {} structures, {} turnover keys ({} rows discarded)",
            index.masses.len(),
            index.smiles.len(),
            index.turnover.len(),
            discarded
        );
        index
    }

    /// Protein mass (g/mol) of a gene's product
    pub fn mass(&self, gene_id: &str) -> Option<f64> {
        let mass = self.masses.get(&canonical_gene_id(gene_id)).copied();
        if mass.is_none() {
            debug!("No mass for gene {}", gene_id);
        }
        mass
    }

    /// SMILES string of a metabolite
    pub fn smiles(&self, metabolite_id: &str) -> Option<&str> {
        self.smiles.get(metabolite_id).map(|s| s.as_str())
    }

    /// Whether a metabolite is a cofactor, matched by name or by id
    pub fn is_cofactor(&self, metabolite_id: &str, metabolite: Option<&Metabolite>) -> bool {
        self.cofactors.contains(metabolite_id)
            || metabolite
                .and_then(|m| m.name.as_ref())
                .map(|name| self.cofactors.contains(name))
                .unwrap_or(false)
    }

    /// Non-cofactor substrates of a reaction running in `direction`
    pub fn candidate_substrates(
        &self,
        reaction: &Reaction,
        direction: Direction,
        metabolites: &IndexMap<String, Metabolite>,
    ) -> Vec<String> {
        reaction
            .substrates(direction)
            .into_iter()
            .filter(|id| !self.is_cofactor(id, metabolites.get(*id)))
            .map(|id| id.to_string())
            .collect()
    }

    /// Turnover numbers (1/s) measured for `gene_id` in a reaction and direction
    ///
    /// Only substrates in `substrates` are returned, each paired with one turnover number, a
    /// substrate can appear more than once if the table holds repeated rows. The reaction is
    /// looked up under the ids of [`reaction_id_chain`], the first id with any rows wins.
    pub fn evidence(
        &self,
        gene_id: &str,
        reaction_id: &str,
        direction: Direction,
        substrates: &[String],
    ) -> Vec<(String, f64)> {
        let gene = canonical_gene_id(gene_id);
        let rows = reaction_id_chain(reaction_id).into_iter().find_map(|id| {
            self.turnover.get(&EvidenceKey {
                gene: gene.clone(),
                reaction: id.to_string(),
                direction,
            })
        });
        let Some(rows) = rows else {
            debug!(
                "No turnover rows for gene {} in {} ({})",
                gene, reaction_id, direction
            );
            return Vec::new();
        };
        let evidence: Vec<(String, f64)> = substrates
            .iter()
            .filter_map(|s| rows.get(s).map(|kcats| (s, kcats)))
            .flat_map(|(s, kcats)| kcats.iter().map(move |k| (s.clone(), *k)))
            .collect();
        if evidence.is_empty() {
            debug!(
                "Turnover rows for gene {} in {} ({}) match no substrate",
                gene, reaction_id, direction
            );
        }
        evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::tables::{GeneRecord, KcatRecord, MetaboliteRecord};
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn gene_row(id: &str, mass: Option<f64>) -> GeneRecord {
        GeneRecord {
            gene_id: id.to_string(),
            gene_name: None,
            accession: None,
            sequence: None,
            mass,
            ec_number: None,
            organism: None,
            gene_reactions: None,
        }
    }

    fn kcat_row(
        gene: &str,
        reaction: &str,
        direction: Direction,
        substrate: &str,
        kcat: Option<f64>,
    ) -> KcatRecord {
        KcatRecord {
            gene_id: gene.to_string(),
            gene_name: None,
            sequence: None,
            reaction_id: reaction.to_string(),
            reaction_name: None,
            reaction: None,
            direction,
            substrate_name: None,
            substrate_id: substrate.to_string(),
            substrate_smiles: None,
            kcat,
        }
    }

    fn tables() -> AnnotationTables {
        AnnotationTables {
            genes: vec![gene_row("abcD.2", Some(40000.)), gene_row("b0002", None)],
            metabolites: vec![
                MetaboliteRecord {
                    metabolite_id: "s_c".to_string(),
                    name: Some("S".to_string()),
                    smiles: Some("CCO".to_string()),
                },
                MetaboliteRecord {
                    metabolite_id: "p_c".to_string(),
                    name: Some("P".to_string()),
                    smiles: Some(SMILES_NOT_FOUND.to_string()),
                },
            ],
            kcats: vec![
                kcat_row("abcD.2", "R", Direction::Forward, "s_c", Some(10.)),
                kcat_row("abcD.2", "R", Direction::Forward, "atp_c", Some(5.)),
                kcat_row("abcD.2", "R", Direction::Reverse, "p_c", Some(20.)),
                kcat_row("abcD.2", "Q", Direction::Forward, "s_c", Some(-3.)),
                kcat_row("abcD.2", "Q", Direction::Forward, "s_c", Some(f64::NAN)),
            ],
        }
    }

    fn reaction() -> Reaction {
        ReactionBuilder::default()
            .id("R".to_string())
            .metabolites(IndexMap::from([
                ("s_c".to_string(), -1.),
                ("atp_c".to_string(), -1.),
                ("p_c".to_string(), 1.),
            ]))
            .build()
            .unwrap()
    }

    fn metabolites() -> IndexMap<String, Metabolite> {
        ["s_c", "atp_c", "p_c"]
            .iter()
            .map(|id| {
                let name = if *id == "atp_c" { "ATP" } else { *id };
                let met = MetaboliteBuilder::default()
                    .id(id.to_string())
                    .name(Some(name.to_string()))
                    .build()
                    .unwrap();
                (id.to_string(), met)
            })
            .collect()
    }

    #[test]
    fn canonicalization() {
        assert_eq!(canonical_gene_id("G_abcD_2"), "abcD.2");
        assert_eq!(canonical_gene_id("G_a_b_10"), "a_b.10");
        assert_eq!(canonical_gene_id("G_abcD_x"), "G_abcD_x");
        assert_eq!(canonical_gene_id("abcD_2"), "abcD_2");
    }

    #[test]
    fn reaction_chain() {
        assert_eq!(reaction_id_chain("R"), vec!["R"]);
        assert_eq!(reaction_id_chain("R_fwr"), vec!["R_fwr", "R"]);
        assert_eq!(reaction_id_chain("R_iso2"), vec!["R_iso2", "R"]);
        assert_eq!(
            reaction_id_chain("R_rev_iso12"),
            vec!["R_rev_iso12", "R_rev", "R"]
        );
        assert_eq!(reaction_id_chain("R_isofoo"), vec!["R_isofoo"]);
    }

    #[test]
    fn mass_lookup_uses_canonical_ids() {
        let index = AnnotationIndex::new(&tables(), &["ATP"]);
        assert_eq!(index.mass("G_abcD_2"), Some(40000.));
        assert_eq!(index.mass("abcD.2"), Some(40000.));
        assert_eq!(index.mass("b0002"), None);
        assert_eq!(index.mass("missing"), None);
    }

    #[test]
    fn smiles_lookup() {
        let index = AnnotationIndex::new(&tables(), &["ATP"]);
        assert_eq!(index.smiles("s_c"), Some("CCO"));
        assert_eq!(index.smiles("p_c"), None);
    }

    #[test]
    fn cofactors_excluded_from_substrates() {
        let index = AnnotationIndex::new(&tables(), &["ATP"]);
        let substrates = index.candidate_substrates(&reaction(), Direction::Forward, &metabolites());
        assert_eq!(substrates, vec!["s_c"]);
        let substrates = index.candidate_substrates(&reaction(), Direction::Reverse, &metabolites());
        assert_eq!(substrates, vec!["p_c"]);
        // Matching by id works too
        let index = AnnotationIndex::new(&tables(), &["atp_c"]);
        let substrates = index.candidate_substrates(&reaction(), Direction::Forward, &metabolites());
        assert_eq!(substrates, vec!["s_c"]);
    }

    #[test]
    fn evidence_restricted_to_substrates() {
        let index = AnnotationIndex::new(&tables(), &["ATP"]);
        let substrates = index.candidate_substrates(&reaction(), Direction::Forward, &metabolites());
        let evidence = index.evidence("G_abcD_2", "R_fwr", Direction::Forward, &substrates);
        assert_eq!(evidence, vec![("s_c".to_string(), 10.)]);

        let substrates = index.candidate_substrates(&reaction(), Direction::Reverse, &metabolites());
        let evidence = index.evidence("G_abcD_2", "R_rev", Direction::Reverse, &substrates);
        assert_eq!(evidence, vec![("p_c".to_string(), 20.)]);

        // Direction must match
        let evidence = index.evidence("G_abcD_2", "R_rev", Direction::Forward, &substrates);
        assert!(evidence.is_empty());
    }

    #[test]
    fn invalid_turnover_discarded() {
        let index = AnnotationIndex::new(&tables(), &["ATP"]);
        let evidence = index.evidence("abcD.2", "Q", Direction::Forward, &["s_c".to_string()]);
        assert!(evidence.is_empty());
    }
}
