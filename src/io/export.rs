//! Model and prediction exports.
//!
//! The model JSON is the portable form of a fit: coefficients, intercept,
//! breakdown point, diagnostics and the configuration that produced them.
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelFile, TheilSenConfig};
use crate::error::TheilSenError;
use crate::fit::TheilSenFit;

pub const TOOL_NAME: &str = "theilsen";

/// Bundle a fit with its column names and configuration.
pub fn to_model_file(
    fit: &TheilSenFit,
    feature_names: &[String],
    target_name: &str,
    config: &TheilSenConfig,
) -> ModelFile {
    ModelFile {
        tool: TOOL_NAME.to_string(),
        feature_names: feature_names.to_vec(),
        target_name: target_name.to_string(),
        coefficients: fit.coefficients().iter().copied().collect(),
        intercept: fit.intercept(),
        breakdown_point: fit.breakdown_point(),
        diagnostics: fit.diagnostics().clone(),
        config: config.clone(),
    }
}

/// Rebuild a fit from a model file, checking that names and coefficients agree.
pub fn fit_from_model_file(model: &ModelFile) -> Result<TheilSenFit, TheilSenError> {
    if model.coefficients.len() != model.feature_names.len() {
        return Err(TheilSenError::DimensionMismatch {
            what: "model coefficients",
            expected: model.feature_names.len(),
            got: model.coefficients.len(),
        });
    }
    Ok(TheilSenFit::from_parts(
        DVector::from_column_slice(&model.coefficients),
        model.intercept,
        model.breakdown_point,
        model.diagnostics.clone(),
    ))
}

pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), TheilSenError> {
    let file = File::create(path)
        .map_err(|e| TheilSenError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| TheilSenError::io(format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

pub fn read_model_json(path: &Path) -> Result<ModelFile, TheilSenError> {
    let file = File::open(path)
        .map_err(|e| TheilSenError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| TheilSenError::io(format!("Invalid model JSON: {e}")))?;
    Ok(model)
}

/// Write features plus a `prediction` column to CSV.
pub fn write_predictions_csv(
    path: &Path,
    feature_names: &[String],
    x: &DMatrix<f64>,
    predictions: &DVector<f64>,
) -> Result<(), TheilSenError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| TheilSenError::io(format!("Failed to create predictions CSV '{}': {e}", path.display())))?;

    let mut header: Vec<&str> = feature_names.iter().map(String::as_str).collect();
    header.push("prediction");
    writer
        .write_record(&header)
        .map_err(|e| TheilSenError::io(format!("Failed to write predictions CSV header: {e}")))?;

    for (i, pred) in predictions.iter().enumerate() {
        let mut record: Vec<String> = x.row(i).iter().map(|v| v.to_string()).collect();
        record.push(format!("{pred:.10}"));
        writer
            .write_record(&record)
            .map_err(|e| TheilSenError::io(format!("Failed to write predictions CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| TheilSenError::io(format!("Failed to flush predictions CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitDiagnostics, FitPath};
    use crate::io::ingest::read_dataset;

    fn sample_fit() -> TheilSenFit {
        TheilSenFit::from_parts(
            DVector::from_row_slice(&[2.0, -1.0]),
            0.5,
            0.29,
            FitDiagnostics {
                path: FitPath::Subpopulations,
                n_samples: 10,
                n_features: 2,
                n_subsamples: 3,
                n_subpopulation: 120,
                exhaustive: true,
                n_workers: 1,
                median_iterations: 7,
                median_converged: true,
            },
        )
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("theilsen-{}-{name}", std::process::id()))
    }

    #[test]
    fn model_json_survives_a_file_round_trip() {
        let fit = sample_fit();
        let names = vec!["a".to_string(), "b".to_string()];
        let model = to_model_file(&fit, &names, "y", &TheilSenConfig::default());

        let path = temp_path("model.json");
        write_model_json(&path, &model).unwrap();
        let loaded = read_model_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.tool, TOOL_NAME);
        assert_eq!(loaded.feature_names, names);
        assert_eq!(fit_from_model_file(&loaded).unwrap(), fit);
    }

    #[test]
    fn inconsistent_model_is_rejected() {
        let mut model = to_model_file(&sample_fit(), &["a".to_string()], "y", &TheilSenConfig::default());
        model.coefficients.push(1.0);
        assert!(matches!(
            fit_from_model_file(&model),
            Err(TheilSenError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn predictions_csv_has_features_and_prediction() {
        let names = vec!["a".to_string(), "b".to_string()];
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let pred = DVector::from_row_slice(&[0.5, 2.5]);

        let path = temp_path("pred.csv");
        write_predictions_csv(&path, &names, &x, &pred).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let data = read_dataset(text.as_bytes(), None).unwrap();
        assert_eq!(data.target_name, "prediction");
        assert_eq!(data.x, x);
        assert_eq!(data.y, pred);
    }
}
