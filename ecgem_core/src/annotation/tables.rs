//! Rows of the annotation tables and functions for reading and writing them as CSV
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationError;
use crate::configuration::Configuration;
use crate::metabolic_model::reaction::Direction;

/// Marker written in the SMILES column when structure retrieval found nothing
pub const SMILES_NOT_FOUND: &str = "Compound not found";

// region Rows
/// Row of the gene table (`gene_sequence_data.csv`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    #[serde(rename = "Gene ID")]
    pub gene_id: String,
    #[serde(rename = "Gene name", default)]
    pub gene_name: Option<String>,
    #[serde(rename = "Accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "Sequence", default)]
    pub sequence: Option<String>,
    /// Protein mass in g/mol
    #[serde(rename = "Mass", default, deserialize_with = "csv::invalid_option")]
    pub mass: Option<f64>,
    #[serde(rename = "EC number", default)]
    pub ec_number: Option<String>,
    #[serde(rename = "Organism", default)]
    pub organism: Option<String>,
    #[serde(rename = "Gene reactions", default)]
    pub gene_reactions: Option<String>,
}

/// Row of the metabolite table (`metabolite_smiles_data.csv`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaboliteRecord {
    pub metabolite_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub smiles: Option<String>,
}

/// Row of the substrate pairing table, and once the turnover number is filled in, of the
/// turnover table (`sequences_smiles_complete.csv`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KcatRecord {
    #[serde(rename = "Gene ID")]
    pub gene_id: String,
    #[serde(rename = "Gene name", default)]
    pub gene_name: Option<String>,
    #[serde(rename = "Sequence", default)]
    pub sequence: Option<String>,
    #[serde(rename = "Reaction ID")]
    pub reaction_id: String,
    #[serde(rename = "Reaction name", default)]
    pub reaction_name: Option<String>,
    #[serde(rename = "Reaction", default)]
    pub reaction: Option<String>,
    #[serde(rename = "Direction")]
    pub direction: Direction,
    #[serde(rename = "Substrate Name", default)]
    pub substrate_name: Option<String>,
    #[serde(rename = "Substrate ID")]
    pub substrate_id: String,
    #[serde(rename = "Substrate Smiles", default)]
    pub substrate_smiles: Option<String>,
    /// Turnover number in 1/s, empty until predicted
    #[serde(rename = "Kcat", default, deserialize_with = "csv::invalid_option")]
    pub kcat: Option<f64>,
}
// endregion Rows

// region Reading and Writing
/// Read every row of a CSV table with a header line
pub fn read_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>, AnnotationError> {
    let path = path.as_ref();
    let to_error = |source| AnnotationError::UnableToRead {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(to_error)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(to_error)?;
    Ok(records)
}

/// Write rows to a CSV table, with a header line, creating parent directories as needed
pub fn write_records<T: Serialize, P: AsRef<Path>>(
    path: P,
    records: &[T],
) -> Result<(), AnnotationError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let to_error = |source| AnnotationError::UnableToWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for record in records {
        writer.serialize(record).map_err(to_error)?;
    }
    writer.flush()?;
    Ok(())
}
// endregion Reading and Writing

/// The three annotation tables, as loaded from disk
#[derive(Clone, Debug, Default)]
pub struct AnnotationTables {
    pub genes: Vec<GeneRecord>,
    pub metabolites: Vec<MetaboliteRecord>,
    pub kcats: Vec<KcatRecord>,
}

impl AnnotationTables {
    /// Load the tables named by the configuration
    ///
    /// # Errors
    /// The gene and turnover tables are required, [`AnnotationError::MissingTable`] is returned
    /// if either does not exist. A missing metabolite table only produces a warning, since
    /// structures are not needed to compute enzyme costs.
    pub fn load(config: &Configuration) -> Result<AnnotationTables, AnnotationError> {
        let kcat_path = config.kcat_table_path();
        if !kcat_path.exists() {
            return Err(AnnotationError::MissingTable(kcat_path));
        }
        let mut tables = AnnotationTables::load_sequences(config)?;
        tables.kcats = read_records(&kcat_path)?;
        info!(
            "Loaded {} gene rows, {} metabolite rows, {} turnover rows",
            tables.genes.len(),
            tables.metabolites.len(),
            tables.kcats.len()
        );
        Ok(tables)
    }

    /// Load only the gene and metabolite tables, as needed before turnover numbers exist
    pub fn load_sequences(config: &Configuration) -> Result<AnnotationTables, AnnotationError> {
        let gene_path = config.gene_table_path();
        if !gene_path.exists() {
            return Err(AnnotationError::MissingTable(gene_path));
        }
        let smiles_path = config.smiles_table_path();
        let metabolites = if smiles_path.exists() {
            read_records(&smiles_path)?
        } else {
            warn!("Metabolite table {:?} not found, continuing without structures", smiles_path);
            Vec::new()
        };
        Ok(AnnotationTables {
            genes: read_records(&gene_path)?,
            metabolites,
            kcats: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn annotation_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("annotation")
    }

    #[test]
    fn read_gene_table() {
        let genes: Vec<GeneRecord> =
            read_records(annotation_dir().join("gene_sequence_data.csv")).unwrap();
        assert_eq!(genes.len(), 7);
        assert_eq!(genes[0].gene_id, "b1101");
        assert_eq!(genes[0].gene_name.as_deref(), Some("ptsG"));
        assert!((genes[0].mass.unwrap() - 50676.76).abs() < 1e-6);
        // Empty cells load as absent
        let atpd = genes.iter().find(|g| g.gene_id == "b3732").unwrap();
        assert_eq!(atpd.mass, None);
        assert_eq!(atpd.sequence, None);
    }

    #[test]
    fn read_kcat_table() {
        let kcats: Vec<KcatRecord> =
            read_records(annotation_dir().join("sequences_smiles_complete.csv")).unwrap();
        assert_eq!(kcats.len(), 5);
        assert_eq!(kcats[2].direction, Direction::Reverse);
        assert_eq!(kcats[2].substrate_id, "f6p_c");
        assert!((kcats[2].kcat.unwrap() - 200.).abs() < 1e-12);
        assert_eq!(kcats[4].kcat, None);
    }

    #[test]
    fn quoted_fields() {
        let metabolites: Vec<MetaboliteRecord> =
            read_records(annotation_dir().join("metabolite_smiles_data.csv")).unwrap();
        let fdp = metabolites
            .iter()
            .find(|m| m.metabolite_id == "fdp_c")
            .unwrap();
        assert_eq!(fdp.name.as_deref(), Some("D-Fructose 1,6-bisphosphate"));
        assert_eq!(fdp.smiles.as_deref(), Some(SMILES_NOT_FOUND));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pairs.csv");
        let rows = vec![KcatRecord {
            gene_id: "b0001".to_string(),
            gene_name: None,
            sequence: Some("MKV".to_string()),
            reaction_id: "R1".to_string(),
            reaction_name: Some("Reaction one".to_string()),
            reaction: Some("a_c --> b_c".to_string()),
            direction: Direction::Forward,
            substrate_name: Some("A".to_string()),
            substrate_id: "a_c".to_string(),
            substrate_smiles: Some("CC(=O)O".to_string()),
            kcat: None,
        }];
        write_records(&path, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Gene ID,Gene name,Sequence,Reaction ID"));
        let reread: Vec<KcatRecord> = read_records(&path).unwrap();
        assert_eq!(reread, rows);
    }

    #[test]
    fn missing_required_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration {
            output_path: dir.path().to_path_buf(),
            ..Configuration::default()
        };
        assert!(matches!(
            AnnotationTables::load(&config),
            Err(AnnotationError::MissingTable(_))
        ));
    }
}
