use crate::config::InferenceSettings;
use crate::error::AppError;
use crate::models::classify_types::Recognition;
use futures::future::BoxFuture;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadConfig {
    pub model: PathBuf,
    pub labels: PathBuf,
    pub is_quantized: bool,
    pub num_threads: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunParams {
    pub path: PathBuf,
    pub image_mean: f32,
    pub image_std: f32,
    pub num_results: usize,
    pub threshold: f32,
    pub width: u32,
    pub height: u32,
}

impl RunParams {
    pub fn new(path: impl Into<PathBuf>, settings: &InferenceSettings) -> Self {
        Self {
            path: path.into(),
            image_mean: settings.image_mean,
            image_std: settings.image_std,
            num_results: settings.num_results,
            threshold: settings.threshold,
            width: settings.input_size,
            height: settings.input_size,
        }
    }
}

/// On-device inference backend.
pub trait InferenceEngine: Send + Sync {
    fn load_model<'a>(&'a self, config: &'a LoadConfig) -> BoxFuture<'a, Result<Box<dyn LoadedModel>, AppError>>;
}

/// A model the engine has loaded.
pub trait LoadedModel: Send {
    fn run_model_on_image<'a>(&'a mut self, params: &'a RunParams) -> BoxFuture<'a, Result<Vec<Recognition>, AppError>>;

    fn close(self: Box<Self>);
}

/// Keeps scores at or above `threshold`, best first, at most `num_results`.
pub fn top_recognitions(scores: &[f32], num_results: usize, threshold: f32) -> Vec<Recognition> {
    let mut indexed: Vec<Recognition> = scores
        .iter()
        .enumerate()
        .filter(|(_, &conf)| conf >= threshold)
        .map(|(idx, &confidence)| Recognition {
            index: idx as u32,
            confidence,
        })
        .collect();
    indexed.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indexed.truncate(num_results);
    indexed
}
