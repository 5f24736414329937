//! Command line driver for building enzyme constrained metabolic models
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use ecgem_core::annotation::fasta::gene_table_from_fasta;
use ecgem_core::annotation::index::AnnotationIndex;
use ecgem_core::annotation::pairing::build_pairing_table;
use ecgem_core::annotation::tables::{write_records, AnnotationTables};
use ecgem_core::configuration::Configuration;
use ecgem_core::metabolic_model::model::Model;
use ecgem_core::optimize::{optimize_and_summarize, ModelSummary};
use ecgem_core::transform::pipeline::{apply_growth_conditions, EnzymeConstraintPipeline};

/// Name of the configuration file inside the inputs directory
const CONFIG_FILE: &str = "inputs.yml";

#[derive(Parser)]
#[command(name = "ecgem")]
#[command(about = "Build enzyme constrained genome scale metabolic models", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding inputs.yml
    #[arg(short, long, env = "INPUTS", default_value = ".")]
    inputs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the gene/substrate pairing table for turnover number prediction
    Pair,
    /// Transform the configured model into an enzyme constrained model
    Run,
    /// Optimize a model and print its objective and exchange fluxes
    Summary {
        /// COBRA JSON model file
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Pair => pair(&load_config(&cli.inputs)?),
        Commands::Run => run(&load_config(&cli.inputs)?),
        Commands::Summary { model } => {
            let model = read_model(&model)?;
            let summary = optimize_and_summarize(&model).context("Failed to optimize model")?;
            println!("{summary}");
            Ok(())
        }
    }
}

fn load_config(inputs: &Path) -> Result<Configuration> {
    let path = inputs.join(CONFIG_FILE);
    let config = Configuration::from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    info!(
        "Loaded configuration for {} {}",
        config.species.as_deref().unwrap_or("unknown species"),
        config.strain.as_deref().unwrap_or("")
    );
    Ok(config)
}

fn read_model(path: &Path) -> Result<Model> {
    Model::read_json(path).with_context(|| format!("Failed to read model {}", path.display()))
}

fn summarize(model: &Model, config: &Configuration) -> Result<ModelSummary> {
    let solution = model.optimize().context("Failed to optimize model")?;
    let summary = solution
        .summary(model, config.tolerance)
        .context("Failed to summarize solution")?;
    Ok(summary)
}

fn pair(config: &Configuration) -> Result<()> {
    let model = read_model(&config.model_path)?;
    if let Some(protein_file) = config.protein_file() {
        let genes = gene_table_from_fasta(protein_file, &model, config.species.as_deref())
            .with_context(|| format!("Failed to read proteins from {}", protein_file.display()))?;
        let gene_path = config.gene_table_path();
        write_records(&gene_path, &genes)
            .with_context(|| format!("Failed to write {}", gene_path.display()))?;
        info!("Wrote {} genes to {}", genes.len(), gene_path.display());
    }
    let tables = AnnotationTables::load_sequences(config).context("Failed to load gene table")?;
    let index = AnnotationIndex::new(&tables, &config.cofactors);
    let report = build_pairing_table(&model, &tables, &index);
    if !report.missing_genes.is_empty() {
        warn!(
            "{} genes have no sequence data: {}",
            report.missing_genes.len(),
            report.missing_genes.join(", ")
        );
    }
    let pairing_path = config.pairing_table_path();
    write_records(&pairing_path, &report.rows)
        .with_context(|| format!("Failed to write {}", pairing_path.display()))?;
    info!(
        "Wrote {} pairs to {}",
        report.rows.len(),
        pairing_path.display()
    );
    Ok(())
}

fn run(config: &Configuration) -> Result<()> {
    let mut model = read_model(&config.model_path)?;
    println!("Original model\n{}", summarize(&model, config)?);

    let tables = AnnotationTables::load(config).context("Failed to load annotation tables")?;
    let index = AnnotationIndex::new(&tables, &config.cofactors);
    let report = EnzymeConstraintPipeline::new(config, &index)
        .run(&mut model)
        .context("Failed to add enzyme constraints")?;
    for (id, rule) in &report.isozymes.unsupported {
        warn!("Reaction {} was not expanded, unsupported rule `{}`", id, rule);
    }
    println!("{report}");

    apply_growth_conditions(&mut model, config);
    println!("Enzyme constrained model\n{}", summarize(&model, config)?);

    let output = config.output_model_path();
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    model
        .write_json(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote enzyme constrained model to {}", output.display());
    Ok(())
}
