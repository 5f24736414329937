//! Gives reactions without enzyme cost evidence the average cost of the annotated reactions
use indexmap::IndexMap;
use log::{debug, info};

use crate::metabolic_model::model::Model;
use crate::transform::{ReactionFilter, TransformError, USAGE_METABOLITE};

/// Result of calibration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationReport {
    /// Mean absolute usage coefficient of the reference reactions, `None` without references
    pub mean: Option<f64>,
    /// Usage coefficients placed, by reaction id
    pub calibrated: IndexMap<String, f64>,
}

/// Mean of the absolute values of `coefficients`
pub fn mean_absolute(coefficients: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = coefficients
        .into_iter()
        .fold((0., 0usize), |(sum, count), c| (sum + c.abs(), count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Add the mean cost of `reference` to every cost eligible reaction without a usage coefficient
///
/// `reference` holds the coefficients placed by [`crate::transform::usage::annotate_usage`].
/// Forward reactions get `-mean` and reverse reactions `+mean`. Reactions which already carry a
/// usage coefficient are never changed, so calibrating twice changes nothing.
///
/// # Errors
/// [`TransformError::NoReferenceCoefficients`] if `reference` is empty while some reaction
/// needs a coefficient. With nothing to calibrate an empty `reference` is fine.
pub fn calibrate(
    model: &mut Model,
    filter: &ReactionFilter,
    reference: &IndexMap<String, f64>,
) -> Result<CalibrationReport, TransformError> {
    let pending: Vec<String> = model
        .reactions
        .values()
        .filter(|r| filter.is_cost_eligible(r) && r.coefficient(USAGE_METABOLITE).is_none())
        .map(|r| r.id.clone())
        .collect();
    let mean = mean_absolute(reference.values().copied());
    let mut report = CalibrationReport {
        mean,
        calibrated: IndexMap::new(),
    };
    if pending.is_empty() {
        debug!("No reactions need calibration");
        return Ok(report);
    }
    let Some(mean) = mean else {
        return Err(TransformError::NoReferenceCoefficients(pending.len()));
    };
    for id in pending {
        let Some(reaction) = model.reactions.get_mut(&id) else {
            continue;
        };
        let Some(direction) = reaction.direction() else {
            continue;
        };
        let coefficient = direction.usage_sign() * mean;
        reaction
            .metabolites
            .insert(USAGE_METABOLITE.to_string(), coefficient);
        report.calibrated.insert(id, coefficient);
    }
    info!(
        "Calibrated {} reactions with mean enzyme cost {}",
        report.calibrated.len(),
        mean
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::transform::test_utils::add_reaction;
    use crate::transform::usage::ensure_usage_pool;

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        add_reaction(&mut model, "EX_a_e", "A exchange", &[("a_e", -1.)], (-10., 1000.), "");
        add_reaction(&mut model, "At", "A transport", &[("a_e", -1.), ("a_c", 1.)], (0., 1000.), "t1");
        add_reaction(&mut model, "R1", "R one", &[("a_c", -1.), ("b_c", 1.)], (0., 1000.), "g1");
        add_reaction(&mut model, "R2", "R two", &[("b_c", -1.), ("c_c", 1.)], (0., 1000.), "g2");
        add_reaction(&mut model, "R3", "R three", &[("c_c", -1.), ("d_c", 1.)], (0., 1000.), "g3");
        add_reaction(&mut model, "R4_rev", "R four", &[("d_c", -1.), ("e_c", 1.)], (-1000., 0.), "g4");
        add_reaction(&mut model, "R5", "R five", &[("e_c", -1.), ("f_c", 1.)], (0., 1000.), "");
        ensure_usage_pool(&mut model, &Configuration::default()).unwrap();
        for (id, coefficient) in [("R1", -0.001), ("R2", -0.003)] {
            model
                .reactions
                .get_mut(id)
                .unwrap()
                .metabolites
                .insert(USAGE_METABOLITE.to_string(), coefficient);
        }
        model
    }

    fn reference() -> IndexMap<String, f64> {
        IndexMap::from([("R1".to_string(), -0.001), ("R2".to_string(), -0.003)])
    }

    fn config() -> Configuration {
        Configuration {
            transporters: vec!["transport".to_string()],
            ..Configuration::default()
        }
    }

    #[test]
    fn mean_of_absolute_values() {
        assert!((mean_absolute([0.001, -0.003]).unwrap() - 0.002).abs() < 1e-15);
        assert_eq!(mean_absolute(Vec::new()), None);
    }

    #[test]
    fn pending_reactions_get_mean() {
        let config = config();
        let mut model = setup_model();
        let filter = ReactionFilter::new(&config, &model);
        let report = calibrate(&mut model, &filter, &reference()).unwrap();

        assert!((report.mean.unwrap() - 0.002).abs() < 1e-15);
        let r3 = model.reactions["R3"].coefficient(USAGE_METABOLITE).unwrap();
        assert!((r3 + 0.002).abs() < 1e-15);
        let r4 = model.reactions["R4_rev"].coefficient(USAGE_METABOLITE).unwrap();
        assert!((r4 - 0.002).abs() < 1e-15);
        assert_eq!(report.calibrated.len(), 2);
        // Annotated coefficients are kept
        let r1 = model.reactions["R1"].coefficient(USAGE_METABOLITE).unwrap();
        assert!((r1 + 0.001).abs() < 1e-15);
        // Ineligible reactions get nothing
        for id in ["EX_a_e", "At", "R5"] {
            assert!(model.reactions[id].coefficient(USAGE_METABOLITE).is_none());
        }
    }

    #[test]
    fn calibrating_twice_changes_nothing() {
        let config = config();
        let mut model = setup_model();
        let filter = ReactionFilter::new(&config, &model);
        calibrate(&mut model, &filter, &reference()).unwrap();
        let once = model.clone();
        let report = calibrate(&mut model, &filter, &reference()).unwrap();
        assert!(report.calibrated.is_empty());
        assert_eq!(model, once);
    }

    #[test]
    fn no_reference_with_pending_fails() {
        let config = config();
        let mut model = setup_model();
        let before = model.clone();
        let filter = ReactionFilter::new(&config, &model);
        let res = model.transaction(|draft| calibrate(draft, &filter, &IndexMap::new()));
        assert_eq!(res, Err(TransformError::NoReferenceCoefficients(2)));
        assert_eq!(model, before);
    }

    #[test]
    fn no_reference_without_pending_is_noop() {
        let config = config();
        let mut model = Model::new_empty();
        add_reaction(&mut model, "R5", "R five", &[("e_c", -1.), ("f_c", 1.)], (0., 1000.), "");
        let before = model.clone();
        let filter = ReactionFilter::new(&config, &model);
        let report = calibrate(&mut model, &filter, &IndexMap::new()).unwrap();
        assert_eq!(report.mean, None);
        assert_eq!(model, before);
    }
}
