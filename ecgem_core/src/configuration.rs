//! Run configuration for building an enzyme constrained model
//!
//! The configuration is read from a YAML file (conventionally `inputs.yml` inside the inputs
//! directory). Relative paths in the file are resolved against the directory containing it.
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default lower flux bound for new and split reactions
pub const DEFAULT_LOWER_BOUND: f64 = -1000.;
/// Default upper flux bound for new and split reactions
pub const DEFAULT_UPPER_BOUND: f64 = 1000.;
/// Default numerical tolerance used when reporting fluxes
pub const DEFAULT_TOLERANCE: f64 = 1e-07;
/// Default bounds of the enzyme usage sink reaction (the protein budget)
pub const DEFAULT_USAGE_BOUNDS: (f64, f64) = (-0.1, 0.0);

/// Configuration for a model transformation run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Strain the model describes, only used by annotation retrieval
    pub strain: Option<String>,
    /// Species the model describes, only used by annotation retrieval
    pub species: Option<String>,
    /// Path to the metabolic model to transform
    #[serde(alias = "sbml_model")]
    pub model_path: PathBuf,
    /// Directory where annotation tables and transformed models are written
    #[serde(alias = "output_file_path")]
    pub output_path: PathBuf,
    /// Optional protein FASTA file used in place of remote sequence retrieval
    pub protein_file_path: Option<PathBuf>,
    /// Metabolite names (or ids) never considered as substrates
    pub cofactors: Vec<String>,
    /// Keywords marking transport reactions by name (case-insensitive)
    pub transporters: Vec<String>,
    /// Reaction names excluded from enzyme cost accounting
    pub excluded_reactions: Vec<String>,
    /// Growth medium, exchange reaction id to maximum uptake rate
    pub media: IndexMap<String, f64>,
    /// Bounds of the `DM_usage` reaction
    #[serde(alias = "bounds")]
    pub usage_bounds: (f64, f64),
    /// Lower bound given to reverse halves of split reactions
    pub lower_bound: f64,
    /// Upper bound given to forward halves of split reactions
    pub upper_bound: f64,
    /// Tolerance for treating a flux as non-zero
    pub tolerance: f64,
    /// Overrides for the annotation table locations
    pub annotation: AnnotationPaths,
}

/// Locations of the annotation tables, each defaults to a file in the output directory
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationPaths {
    pub gene_table: Option<PathBuf>,
    pub smiles_table: Option<PathBuf>,
    pub kcat_table: Option<PathBuf>,
    pub pairing_table: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            strain: None,
            species: None,
            model_path: PathBuf::new(),
            output_path: PathBuf::from("output"),
            protein_file_path: None,
            cofactors: Vec::new(),
            transporters: Vec::new(),
            excluded_reactions: Vec::new(),
            media: IndexMap::new(),
            usage_bounds: DEFAULT_USAGE_BOUNDS,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            tolerance: DEFAULT_TOLERANCE,
            annotation: AnnotationPaths::default(),
        }
    }
}

impl Configuration {
    /// Read a configuration from a YAML file, resolving relative paths against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Configuration, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::UnableToRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Configuration::from_yaml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse a configuration from a YAML string, paths are left as written
    pub fn from_yaml_str(contents: &str) -> Result<Configuration, ConfigError> {
        let config: Configuration = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the model is a COBRA JSON file and the bound settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(extension) = self.model_path.extension() {
            if !extension.eq_ignore_ascii_case("json") {
                return Err(ConfigError::UnsupportedModelFormat(self.model_path.clone()));
            }
        }
        let (usage_lower, usage_upper) = self.usage_bounds;
        if usage_lower > usage_upper {
            return Err(ConfigError::InvalidBounds(format!(
                "usage bounds ({usage_lower}, {usage_upper}) have lower above upper"
            )));
        }
        if self.lower_bound >= 0. || self.upper_bound <= 0. {
            return Err(ConfigError::InvalidBounds(format!(
                "default bounds ({}, {}) must straddle zero",
                self.lower_bound, self.upper_bound
            )));
        }
        Ok(())
    }

    /// Whether a reaction name contains one of the transporter keywords
    pub fn is_transporter_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.transporters
            .iter()
            .any(|keyword| name.contains(&keyword.to_lowercase()))
    }

    /// Protein FASTA file, if one was configured (an empty entry counts as unset)
    pub fn protein_file(&self) -> Option<&Path> {
        self.protein_file_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn gene_table_path(&self) -> PathBuf {
        self.annotation
            .gene_table
            .clone()
            .unwrap_or_else(|| self.output_path.join("gene_sequence_data.csv"))
    }

    pub fn smiles_table_path(&self) -> PathBuf {
        self.annotation
            .smiles_table
            .clone()
            .unwrap_or_else(|| self.output_path.join("metabolite_smiles_data.csv"))
    }

    pub fn kcat_table_path(&self) -> PathBuf {
        self.annotation
            .kcat_table
            .clone()
            .unwrap_or_else(|| self.output_path.join("sequences_smiles_complete.csv"))
    }

    pub fn pairing_table_path(&self) -> PathBuf {
        self.annotation
            .pairing_table
            .clone()
            .unwrap_or_else(|| self.output_path.join("sequences_smiles.csv"))
    }

    /// Where the transformed model is written: `<output>/output_GEMs/ec_<model stem>.json`
    pub fn output_model_path(&self) -> PathBuf {
        let stem = self
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        self.output_path
            .join("output_GEMs")
            .join(format!("ec_{stem}.json"))
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(p.as_path());
            }
        };
        resolve(&mut self.model_path);
        resolve(&mut self.output_path);
        if let Some(p) = self.protein_file_path.as_mut() {
            resolve(p);
        }
        for p in [
            &mut self.annotation.gene_table,
            &mut self.annotation.smiles_table,
            &mut self.annotation.kcat_table,
            &mut self.annotation.pairing_table,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path:?}")]
    UnableToRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse configuration: {0}")]
    UnableToParse(#[from] serde_yaml::Error),
    #[error("Invalid bounds in configuration: {0}")]
    InvalidBounds(String),
    #[error("Model {0:?} is not a COBRA JSON file, only .json models can be read")]
    UnsupportedModelFormat(PathBuf),
}
