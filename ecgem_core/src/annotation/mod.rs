//! Annotation data used to attach enzyme costs to reactions
//!
//! The gene, metabolite, and turnover number tables are produced outside of this crate (sequence
//! and structure retrieval, turnover number prediction). This module reads and writes them,
//! indexes them for lookup, builds the substrate pairing table sent to the turnover number
//! predictor, and can derive the gene table from a local protein FASTA file.
use std::path::PathBuf;

use thiserror::Error;

pub mod fasta;
pub mod index;
pub mod pairing;
pub mod tables;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Unable to read table {path:?}")]
    UnableToRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unable to write table {path:?}")]
    UnableToWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unable to read protein file {path:?}")]
    UnableToReadFasta {
        path: PathBuf,
        #[source]
        source: needletail::errors::ParseError,
    },
    #[error("Required table {0:?} does not exist")]
    MissingTable(PathBuf),
    #[error("IO error while handling annotation tables")]
    Io(#[from] std::io::Error),
}
