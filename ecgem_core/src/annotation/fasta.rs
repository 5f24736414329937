//! Derive the gene table from a local protein FASTA file
use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};
use needletail::parse_fastx_file;

use crate::annotation::index::canonical_gene_id;
use crate::annotation::tables::GeneRecord;
use crate::annotation::AnnotationError;
use crate::metabolic_model::model::Model;

/// Average mass of water, lost once per peptide bond
const WATER_MASS: f64 = 18.0153;

/// Average mass (g/mol) of the free amino acid for a one letter residue code
fn residue_mass(residue: u8) -> Option<f64> {
    let mass = match residue.to_ascii_uppercase() {
        b'A' => 89.0932,
        b'C' => 121.1582,
        b'D' => 133.1027,
        b'E' => 147.1293,
        b'F' => 165.1891,
        b'G' => 75.0666,
        b'H' => 155.1546,
        b'I' => 131.1729,
        b'K' => 146.1876,
        b'L' => 131.1729,
        b'M' => 149.2113,
        b'N' => 132.1179,
        b'O' => 255.3134,
        b'P' => 115.1305,
        b'Q' => 146.1445,
        b'R' => 174.201,
        b'S' => 105.0926,
        b'T' => 119.1192,
        b'U' => 168.0532,
        b'V' => 117.1463,
        b'W' => 204.2252,
        b'Y' => 181.1885,
        _ => return None,
    };
    Some(mass)
}

/// Average molecular weight of a protein sequence
///
/// A trailing stop (`*`) is ignored. Returns `None` for an empty sequence or one containing a
/// residue outside of the standard alphabet.
pub fn protein_molecular_weight(sequence: &[u8]) -> Option<f64> {
    let sequence = sequence.strip_suffix(b"*").unwrap_or(sequence);
    if sequence.is_empty() {
        return None;
    }
    let mut total = 0.;
    for residue in sequence {
        total += residue_mass(*residue)?;
    }
    Some(total - (sequence.len() - 1) as f64 * WATER_MASS)
}

/// Build gene table rows from the records of a protein FASTA file matching model genes
///
/// A record matches a gene when the first token of its header equals the gene id, its
/// canonical form, or the id with `_` replaced by `.`. Records matching no gene, and records
/// with unknown residues, are skipped.
pub fn gene_table_from_fasta<P: AsRef<Path>>(
    path: P,
    model: &Model,
    organism: Option<&str>,
) -> Result<Vec<GeneRecord>, AnnotationError> {
    let path = path.as_ref();
    let to_error = |source| AnnotationError::UnableToReadFasta {
        path: path.to_path_buf(),
        source,
    };
    let mut lookup: HashMap<String, &str> = HashMap::new();
    for gene_id in model.genes.keys() {
        lookup.insert(gene_id.clone(), gene_id);
        lookup.insert(canonical_gene_id(gene_id), gene_id);
        lookup.insert(gene_id.replace('_', "."), gene_id);
    }

    let mut reader = parse_fastx_file(path).map_err(to_error)?;
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    while let Some(record) = reader.next() {
        let record = record.map_err(to_error)?;
        let header = String::from_utf8_lossy(record.id()).into_owned();
        let key = header.split_whitespace().next().unwrap_or_default();
        let Some(gene_id) = lookup.get(key).copied() else {
            skipped += 1;
            continue;
        };
        let sequence = record.seq();
        let Some(mass) = protein_molecular_weight(&sequence) else {
            warn!("Skipping protein {} with unknown residues", key);
            skipped += 1;
            continue;
        };
        let gene = &model.genes[gene_id];
        rows.push(GeneRecord {
            gene_id: canonical_gene_id(gene_id),
            gene_name: gene.name.clone(),
            accession: None,
            sequence: Some(String::from_utf8_lossy(&sequence).into_owned()),
            mass: Some(mass),
            ec_number: None,
            organism: organism.map(|o| o.to_string()),
            gene_reactions: Some(model.gene_reactions(gene_id).join(" ")),
        });
    }
    info!(
        "Read {} proteins from {:?} ({} records skipped)",
        rows.len(),
        path,
        skipped
    );
    Ok(rows)
}
