use ecgem_core::annotation::index::AnnotationIndex;
use ecgem_core::annotation::tables::AnnotationTables;
use ecgem_core::configuration::Configuration;
use ecgem_core::metabolic_model::model::Model;
use ecgem_core::transform::pipeline::{
    apply_growth_conditions, EnzymeConstraintPipeline, PipelineReport,
};

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

/// Outcome of adding enzyme constraints to a model
#[pyclass]
struct PyPipelineSummary {
    inner: PipelineReport,
    output_path: String,
    objective_value: Option<f64>,
}

#[pymethods]
impl PyPipelineSummary {
    #[getter]
    fn split(&self) -> Vec<String> {
        self.inner.split.split.clone()
    }

    #[getter]
    fn expanded(&self) -> Vec<String> {
        self.inner.isozymes.expanded.clone()
    }

    #[getter]
    fn created(&self) -> Vec<String> {
        self.inner.isozymes.created.clone()
    }

    #[getter]
    fn unsupported(&self) -> Vec<(String, String)> {
        self.inner.isozymes.unsupported.clone()
    }

    #[getter]
    fn annotated(&self) -> Vec<(String, f64)> {
        self.inner
            .usage
            .annotated
            .iter()
            .map(|(id, cost)| (id.clone(), *cost))
            .collect()
    }

    #[getter]
    fn calibrated(&self) -> Vec<String> {
        self.inner.calibration.calibrated.keys().cloned().collect()
    }

    #[getter]
    fn mean_cost(&self) -> Option<f64> {
        self.inner.calibration.mean
    }

    #[getter]
    fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    #[getter]
    fn output_path(&self) -> String {
        self.output_path.clone()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

fn runtime_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Build the enzyme constrained model described by a configuration file and write it out
#[pyfunction]
fn run_pipeline(config_path: &str) -> PyResult<PyPipelineSummary> {
    let config = Configuration::from_file(config_path).map_err(runtime_error)?;
    let mut model = Model::read_json(&config.model_path).map_err(runtime_error)?;
    let tables = AnnotationTables::load(&config).map_err(runtime_error)?;
    let index = AnnotationIndex::new(&tables, &config.cofactors);
    let report = EnzymeConstraintPipeline::new(&config, &index)
        .run(&mut model)
        .map_err(runtime_error)?;
    apply_growth_conditions(&mut model, &config);
    let objective_value = model.optimize().map_err(runtime_error)?.objective_value;
    let output = config.output_model_path();
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(runtime_error)?;
    }
    model.write_json(&output).map_err(runtime_error)?;
    Ok(PyPipelineSummary {
        inner: report,
        output_path: output.to_string_lossy().into_owned(),
        objective_value,
    })
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run_pipeline, m)?)?;
    m.add_class::<PyPipelineSummary>()?;
    Ok(())
}
