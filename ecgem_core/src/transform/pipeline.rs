//! Runs the transformation stages in order
use std::fmt::{Display, Formatter};

use log::{info, warn};

use crate::annotation::index::AnnotationIndex;
use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;
use crate::transform::calibrate::{calibrate, CalibrationReport};
use crate::transform::isozyme::{expand_isozymes, IsozymeReport};
use crate::transform::split::{split_reversible, SplitReport};
use crate::transform::usage::{annotate_usage, ensure_usage_pool, UsageReport};
use crate::transform::{ReactionFilter, TransformError, USAGE_REACTION};

/// What every stage of a pipeline run did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineReport {
    pub split: SplitReport,
    pub isozymes: IsozymeReport,
    pub usage_pool_created: bool,
    pub usage: UsageReport,
    pub calibration: CalibrationReport,
}

impl Display for PipelineReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Split {} reversible reactions ({} reactions after splitting)",
            self.split.split.len(),
            self.split.reaction_count
        )?;
        writeln!(
            f,
            "Expanded {} reactions into {} isozymes, {} unsupported rules",
            self.isozymes.expanded.len(),
            self.isozymes.created.len(),
            self.isozymes.unsupported.len()
        )?;
        writeln!(
            f,
            "Annotated {} reactions from turnover evidence",
            self.usage.annotated.len()
        )?;
        match self.calibration.mean {
            Some(mean) => write!(
                f,
                "Calibrated {} reactions with mean cost {:.6}",
                self.calibration.calibrated.len(),
                mean
            ),
            None => write!(f, "Calibrated 0 reactions"),
        }
    }
}

/// Turns a metabolic model into an enzyme constrained model
///
/// Stages run in order: split, expand isozymes, create the usage pool, annotate, calibrate.
/// Each stage runs inside [`Model::transaction`], so a failing stage leaves the model as the
/// previous stage produced it.
pub struct EnzymeConstraintPipeline<'a> {
    config: &'a Configuration,
    index: &'a AnnotationIndex,
}

impl<'a> EnzymeConstraintPipeline<'a> {
    pub fn new(config: &'a Configuration, index: &'a AnnotationIndex) -> Self {
        EnzymeConstraintPipeline { config, index }
    }

    pub fn run(&self, model: &mut Model) -> Result<PipelineReport, TransformError> {
        let config = self.config;

        info!("Splitting reversible reactions");
        let filter = ReactionFilter::new(config, model);
        let split = model.transaction(|draft| split_reversible(draft, &filter, config))?;

        info!("Expanding isozymes");
        let filter = ReactionFilter::new(config, model);
        let isozymes = model.transaction(|draft| expand_isozymes(draft, &filter))?;

        let usage_pool_created = model.transaction(|draft| ensure_usage_pool(draft, config))?;

        info!("Annotating enzyme costs");
        let filter = ReactionFilter::new(config, model);
        let usage = model.transaction(|draft| annotate_usage(draft, self.index, &filter))?;

        info!("Calibrating reactions without evidence");
        let calibration =
            model.transaction(|draft| calibrate(draft, &filter, &usage.annotated))?;

        Ok(PipelineReport {
            split,
            isozymes,
            usage_pool_created,
            usage,
            calibration,
        })
    }
}

/// Apply the growth medium and the enzyme budget
///
/// Returns the medium entries which do not name a boundary reaction.
pub fn apply_growth_conditions(model: &mut Model, config: &Configuration) -> Vec<String> {
    let unknown = model.set_medium(&config.media);
    for id in &unknown {
        warn!("Medium component {} is not a boundary reaction of the model", id);
    }
    if let Some(sink) = model.reactions.get_mut(USAGE_REACTION) {
        (sink.lower_bound, sink.upper_bound) = config.usage_bounds;
    }
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::tables::AnnotationTables;
    use crate::transform::USAGE_METABOLITE;
    use std::path::PathBuf;

    fn inputs() -> (Model, Configuration, AnnotationIndex) {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data");
        let model = Model::read_json(root.join("test_models").join("toy_glycolysis.json")).unwrap();
        let config = Configuration::from_file(root.join("annotation").join("inputs.yml")).unwrap();
        let tables = AnnotationTables::load(&config).unwrap();
        let index = AnnotationIndex::new(&tables, &config.cofactors);
        (model, config, index)
    }

    #[test]
    fn toy_model() {
        let (mut model, config, index) = inputs();
        let report = EnzymeConstraintPipeline::new(&config, &index)
            .run(&mut model)
            .unwrap();

        assert_eq!(report.split.split, vec!["PGI", "ATPS"]);
        assert_eq!(report.split.reaction_count, 9);
        assert_eq!(report.isozymes.expanded, vec!["PFK"]);
        assert!(report.usage_pool_created);
        // Splitting and expansion, plus the usage sink
        assert_eq!(model.reactions.len(), 11);

        let coefficient = |id: &str| model.reactions[id].coefficient(USAGE_METABOLITE);
        let hex1 = 34723.21 * 0.001 / (50. * 3600.);
        assert!((coefficient("HEX1").unwrap() + hex1).abs() < 1e-12);
        let pgi_fwr = 61529.8 * 0.001 / (100. * 3600.);
        assert!((coefficient("PGI_fwr").unwrap() + pgi_fwr).abs() < 1e-12);
        let pgi_rev = 61529.8 * 0.001 / (200. * 3600.);
        assert!((coefficient("PGI_rev").unwrap() - pgi_rev).abs() < 1e-12);
        let pfk_iso1 = 34842.03 * 0.001 / (10. * 3600.);
        assert!((coefficient("PFK_iso1").unwrap() + pfk_iso1).abs() < 1e-12);

        // PFK_iso2 and both ATPS halves have no evidence and get the mean
        let mean = (hex1 + pgi_fwr + pgi_rev + pfk_iso1) / 4.;
        assert!((report.calibration.mean.unwrap() - mean).abs() < 1e-12);
        assert!((coefficient("PFK_iso2").unwrap() + mean).abs() < 1e-12);
        assert!((coefficient("ATPS_fwr").unwrap() + mean).abs() < 1e-12);
        assert!((coefficient("ATPS_rev").unwrap() - mean).abs() < 1e-12);

        // Boundary and transport reactions never carry a cost
        assert!(coefficient("EX_glc__D_e").is_none());
        assert!(coefficient("GLCpts").is_none());
        assert!(coefficient("DM_fdp_c").is_none());

        // Every cost eligible reaction carries exactly one usage coefficient, with the sign
        // matching its direction
        let filter = ReactionFilter::new(&config, &model);
        for reaction in model.reactions.values() {
            if filter.is_cost_eligible(reaction) {
                let c = reaction.coefficient(USAGE_METABOLITE).unwrap();
                let sign = reaction.direction().unwrap().usage_sign();
                assert!(c * sign > 0.);
            }
        }
        assert!(model.validate().is_ok());
    }

    #[test]
    fn growth_conditions() {
        let (mut model, mut config, index) = inputs();
        EnzymeConstraintPipeline::new(&config, &index)
            .run(&mut model)
            .unwrap();
        config.usage_bounds = (-0.05, 0.);
        config.media.insert("EX_o2_e".to_string(), 20.);
        let unknown = apply_growth_conditions(&mut model, &config);
        assert_eq!(unknown, vec!["EX_o2_e"]);
        assert!((model.reactions["EX_glc__D_e"].lower_bound + 10.).abs() < 1e-12);
        assert!((model.reactions[USAGE_REACTION].lower_bound + 0.05).abs() < 1e-12);
    }

    #[test]
    fn failed_stage_keeps_previous_stages() {
        let (mut model, config, _) = inputs();
        // Without turnover evidence nothing can be calibrated
        let empty = AnnotationIndex::new(&AnnotationTables::default(), &config.cofactors);
        let res = EnzymeConstraintPipeline::new(&config, &empty).run(&mut model);
        assert!(matches!(res, Err(TransformError::NoReferenceCoefficients(_))));
        // Split and expansion were committed, calibration left nothing behind
        assert!(model.reactions.contains_key("PGI_fwr"));
        assert!(model.reactions.contains_key("PFK_iso1"));
        assert!(model
            .reactions
            .values()
            .filter(|r| r.id != USAGE_REACTION)
            .all(|r| r.coefficient(USAGE_METABOLITE).is_none()));
    }
}
