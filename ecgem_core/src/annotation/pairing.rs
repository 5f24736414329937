//! Builds the gene/reaction/substrate pairing table sent to turnover number prediction
use std::collections::HashMap;

use log::{info, warn};

use crate::annotation::index::{canonical_gene_id, AnnotationIndex};
use crate::annotation::tables::{AnnotationTables, GeneRecord, KcatRecord, SMILES_NOT_FOUND};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{Direction, Reaction};

/// Gene standing for spontaneous (uncatalyzed) reactions, never paired
pub const SPONTANEOUS_GENE: &str = "spontaneous";

/// Outcome of building the pairing table
#[derive(Clone, Debug, Default)]
pub struct PairingReport {
    /// One row per (gene, reaction, direction, substrate), with an empty turnover number
    pub rows: Vec<KcatRecord>,
    /// Model genes with no gene table row
    pub missing_genes: Vec<String>,
    /// Substrates absent from the metabolite table, or whose structure was not found
    pub missing_structures: Vec<String>,
}

/// Pair every gene with the substrates of the reactions it catalyzes
///
/// Each reaction contributes Forward rows for its non-cofactor reactants, and if reversible,
/// Reverse rows for its non-cofactor products. Substrates without a metabolite table row are
/// left out. A substrate whose structure was not found keeps [`SMILES_NOT_FOUND`] in its row,
/// which turnover prediction recognizes and skips. This should be run on the model before it is
/// transformed, so reaction ids in the table are the original ones.
pub fn build_pairing_table(
    model: &Model,
    tables: &AnnotationTables,
    index: &AnnotationIndex,
) -> PairingReport {
    let gene_rows: HashMap<String, &GeneRecord> = tables
        .genes
        .iter()
        .map(|g| (canonical_gene_id(&g.gene_id), g))
        .collect();
    let structures: HashMap<&str, &str> = tables
        .metabolites
        .iter()
        .map(|m| {
            let smiles = m
                .smiles
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(SMILES_NOT_FOUND);
            (m.metabolite_id.as_str(), smiles)
        })
        .collect();
    let mut report = PairingReport::default();
    for gene in model.genes.values() {
        if gene.id.eq_ignore_ascii_case(SPONTANEOUS_GENE) {
            continue;
        }
        let gene_id = canonical_gene_id(&gene.id);
        let Some(gene_row) = gene_rows.get(&gene_id) else {
            warn!("Gene {} has no row in the gene table", gene.id);
            report.missing_genes.push(gene.id.clone());
            continue;
        };
        for reaction_id in model.gene_reactions(&gene.id) {
            let reaction = &model.reactions[reaction_id];
            let mut directions = vec![Direction::Forward];
            if reaction.is_reversible() {
                directions.push(Direction::Reverse);
            }
            for direction in directions {
                for substrate in index.candidate_substrates(reaction, direction, &model.metabolites)
                {
                    let smiles = structures.get(substrate.as_str()).copied();
                    if smiles.map_or(true, |s| s == SMILES_NOT_FOUND)
                        && !report.missing_structures.contains(&substrate)
                    {
                        warn!("No structure for substrate {}", substrate);
                        report.missing_structures.push(substrate.clone());
                    }
                    let Some(smiles) = smiles else {
                        continue;
                    };
                    report.rows.push(pairing_row(
                        model, reaction, gene_row, &gene_id, direction, &substrate, smiles,
                    ));
                }
            }
        }
    }
    info!(
        "Paired {} gene/substrate rows ({} genes without sequence data)",
        report.rows.len(),
        report.missing_genes.len()
    );
    report
}

fn pairing_row(
    model: &Model,
    reaction: &Reaction,
    gene_row: &GeneRecord,
    gene_id: &str,
    direction: Direction,
    substrate: &str,
    smiles: &str,
) -> KcatRecord {
    KcatRecord {
        gene_id: gene_id.to_string(),
        gene_name: gene_row.gene_name.clone(),
        sequence: gene_row.sequence.clone(),
        reaction_id: reaction.id.clone(),
        reaction_name: reaction.name.clone(),
        reaction: Some(reaction.equation()),
        direction,
        substrate_name: model.metabolites.get(substrate).and_then(|m| m.name.clone()),
        substrate_id: substrate.to_string(),
        substrate_smiles: Some(smiles.to_string()),
        kcat: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::annotation::tables::MetaboliteRecord;
    use crate::metabolic_model::gene::Gene;
    use crate::transform::test_utils::add_reaction;
    use std::path::PathBuf;

    fn inputs() -> (Model, AnnotationTables, Configuration) {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data");
        let model = Model::read_json(root.join("test_models").join("toy_glycolysis.json")).unwrap();
        let config = Configuration::from_file(root.join("annotation").join("inputs.yml")).unwrap();
        let tables = AnnotationTables::load(&config).unwrap();
        (model, tables, config)
    }

    #[test]
    fn pairs_non_cofactor_substrates() {
        let (model, tables, config) = inputs();
        let index = AnnotationIndex::new(&tables, &config.cofactors);
        let report = build_pairing_table(&model, &tables, &index);

        // HEX1 pairs glk with glucose only, ATP is a cofactor
        let hex: Vec<&KcatRecord> = report
            .rows
            .iter()
            .filter(|r| r.reaction_id == "HEX1")
            .collect();
        assert_eq!(hex.len(), 1);
        assert_eq!(hex[0].gene_id, "b2388");
        assert_eq!(hex[0].substrate_id, "glc__D_c");
        assert_eq!(hex[0].direction, Direction::Forward);
        assert!(hex[0].substrate_smiles.is_some());
        assert!(hex[0].kcat.is_none());

        // The reversible PGI gets a row in each direction
        let pgi: Vec<(Direction, &str)> = report
            .rows
            .iter()
            .filter(|r| r.reaction_id == "PGI")
            .map(|r| (r.direction, r.substrate_id.as_str()))
            .collect();
        assert_eq!(
            pgi,
            vec![(Direction::Forward, "g6p_c"), (Direction::Reverse, "f6p_c")]
        );

        // ATPS only has cofactors
        assert!(report.rows.iter().all(|r| r.reaction_id != "ATPS"));
        // Both PFK isozymes are paired
        assert_eq!(
            report
                .rows
                .iter()
                .filter(|r| r.reaction_id == "PFK")
                .count(),
            2
        );
        assert!(report.missing_genes.is_empty());
    }

    #[test]
    fn reports_missing_genes_and_skips_spontaneous() {
        let (mut model, tables, config) = inputs();
        model.add_gene(Gene::new("b0000")).unwrap();
        model.add_gene(Gene::new("spontaneous")).unwrap();
        let index = AnnotationIndex::new(&tables, &config.cofactors);
        let report = build_pairing_table(&model, &tables, &index);
        assert_eq!(report.missing_genes, vec!["b0000"]);
    }

    #[test]
    fn unfound_structures_keep_marker_and_absent_substrates_are_skipped() {
        let mut model = Model::new_empty();
        add_reaction(
            &mut model,
            "R",
            "X and Y to P",
            &[("x_c", -1.), ("y_c", -1.), ("p_c", 1.)],
            (0., 1000.),
            "g1",
        );
        let tables = AnnotationTables {
            genes: vec![GeneRecord {
                gene_id: "g1".to_string(),
                gene_name: None,
                accession: None,
                sequence: Some("MKV".to_string()),
                mass: Some(10000.),
                ec_number: None,
                organism: None,
                gene_reactions: None,
            }],
            metabolites: vec![
                MetaboliteRecord {
                    metabolite_id: "x_c".to_string(),
                    name: None,
                    smiles: Some(SMILES_NOT_FOUND.to_string()),
                },
                MetaboliteRecord {
                    metabolite_id: "p_c".to_string(),
                    name: None,
                    smiles: Some("CCO".to_string()),
                },
            ],
            kcats: Vec::new(),
        };
        let cofactors: Vec<String> = Vec::new();
        let index = AnnotationIndex::new(&tables, &cofactors);
        let report = build_pairing_table(&model, &tables, &index);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].substrate_id, "x_c");
        assert_eq!(
            report.rows[0].substrate_smiles.as_deref(),
            Some(SMILES_NOT_FOUND)
        );
        assert_eq!(report.missing_structures, vec!["x_c", "y_c"]);
    }

    #[test]
    fn fixture_substrates_have_structures() {
        let (model, tables, config) = inputs();
        let index = AnnotationIndex::new(&tables, &config.cofactors);
        let report = build_pairing_table(&model, &tables, &index);
        // fdp_c, the only metabolite without a structure, is never a substrate
        assert!(report
            .rows
            .iter()
            .all(|r| r.substrate_smiles.as_deref() != Some("")));
        assert!(report.missing_structures.is_empty());
    }
}
