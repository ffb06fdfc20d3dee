use crate::error::AppError;
use crate::models::classify_types::{DisplayLabel, Recognition};
use crate::services::classifier::engine::RunParams;
use crate::services::classifier::model_manager::ModelHandle;
use crate::services::labels::LabelTable;

/// Maps one engine outcome to what the user sees.
pub fn resolve_outcome(outcome: Result<Vec<Recognition>, AppError>, labels: &LabelTable) -> DisplayLabel {
    match outcome {
        Err(e) => {
            log::error!("Inference error: {}", e);
            DisplayLabel::Error
        }
        Ok(results) => match results.first() {
            None => DisplayLabel::NoResult,
            Some(top) => match labels.get(top.index) {
                Some(name) => DisplayLabel::Species(name.to_string()),
                None => {
                    log::debug!("Class index {} has no label", top.index);
                    DisplayLabel::Unknown
                }
            },
        },
    }
}

/// Runs one inference. No retries; a missing model resolves to "No result".
pub async fn classify(model: Option<&mut ModelHandle>, labels: &LabelTable, params: &RunParams) -> DisplayLabel {
    let Some(model) = model.filter(|m| m.is_loaded()) else {
        log::warn!("No model loaded, skipping {}", params.path.display());
        return DisplayLabel::NoResult;
    };

    let outcome = model.run(params).await;
    if let Ok(results) = &outcome {
        if let Some(top) = results.first() {
            log::info!(
                "{} -> class {} at {:.3}",
                params.path.display(),
                top.index,
                top.confidence
            );
        }
    }
    resolve_outcome(outcome, labels)
}
