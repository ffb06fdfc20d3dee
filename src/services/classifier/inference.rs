use crate::error::AppError;
use crate::models::classify_types::Recognition;
use crate::services::classifier::engine::{
    top_recognitions, InferenceEngine, LoadConfig, LoadedModel, RunParams,
};
use futures::future::BoxFuture;
use image::ImageReader;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Arc, Mutex};

/// ONNX Runtime backend, CPU only.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtEngine;

pub struct OrtModel {
    session: Arc<Mutex<Session>>,
}

impl InferenceEngine for OrtEngine {
    fn load_model<'a>(&'a self, config: &'a LoadConfig) -> BoxFuture<'a, Result<Box<dyn LoadedModel>, AppError>> {
        Box::pin(async move {
            if !config.model.exists() {
                return Err(AppError::model_load(format!(
                    "Model file not found: {}",
                    config.model.display()
                )));
            }

            log::debug!(
                "Loading {} (labels {}, quantized {}, threads {})",
                config.model.display(),
                config.labels.display(),
                config.is_quantized,
                config.num_threads
            );

            let model_path = config.model.clone();
            let threads = config.num_threads.max(1);

            let session = tokio::task::spawn_blocking(move || -> Result<Session, AppError> {
                let _ = ort::init().with_name("nature-shield").commit();

                let builder = Session::builder()
                    .map_err(|e| AppError::model_load(format!("Failed to create session builder: {}", e)))?
                    .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
                    .map_err(|e| AppError::model_load(format!("Failed to set optimization level: {}", e)))?
                    .with_intra_threads(threads)
                    .map_err(|e| AppError::model_load(format!("Failed to set intra threads: {}", e)))?
                    .with_inter_threads(1)
                    .map_err(|e| AppError::model_load(format!("Failed to set inter threads: {}", e)))?
                    .with_execution_providers([
                        ort::execution_providers::CPUExecutionProvider::default().build(),
                    ])
                    .map_err(|e| AppError::model_load(format!("Failed to register CPU execution provider: {}", e)))?;

                builder
                    .commit_from_file(model_path)
                    .map_err(|e| AppError::model_load(format!("Failed to load ONNX model: {}", e)))
            })
            .await
            .map_err(|e| AppError::model_load(format!("Failed to spawn model loading task: {}", e)))??;

            Ok(Box::new(OrtModel {
                session: Arc::new(Mutex::new(session)),
            }) as Box<dyn LoadedModel>)
        })
    }
}

impl LoadedModel for OrtModel {
    fn run_model_on_image<'a>(&'a mut self, params: &'a RunParams) -> BoxFuture<'a, Result<Vec<Recognition>, AppError>> {
        Box::pin(async move {
            let session = Arc::clone(&self.session);
            let (num_results, threshold) = (params.num_results, params.threshold);
            let params = params.clone();

            let scores = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, AppError> {
                let tensor = preprocess_image(&params)?;
                let mut guard = session
                    .lock()
                    .map_err(|_| AppError::inference("Model session lock poisoned"))?;
                run_session(&mut guard, tensor)
            })
            .await
            .map_err(|e| AppError::inference(format!("Inference task failed: {}", e)))??;

            Ok(top_recognitions(&scores, num_results, threshold))
        })
    }

    fn close(self: Box<Self>) {
        log::debug!("Closing ONNX session");
        drop(self);
    }
}

/// Center crop to a square, resize to the model input and scale each
/// channel by `(p - mean) / std` into a `[1, height, width, 3]` tensor.
pub fn preprocess_image(params: &RunParams) -> Result<Array4<f32>, AppError> {
    let img = ImageReader::open(&params.path)
        .map_err(|e| AppError::inference(format!("Failed to open image {}: {}", params.path.display(), e)))?
        .decode()?;

    let (w, h) = (img.width(), img.height());
    let side = w.min(h);
    let cropped = img.crop_imm((w - side) / 2, (h - side) / 2, side, side);
    let resized = cropped.resize_exact(params.width, params.height, image::imageops::FilterType::Triangle);

    let data: Vec<f32> = resized
        .to_rgb8()
        .into_raw()
        .into_iter()
        .map(|p| (p as f32 - params.image_mean) / params.image_std)
        .collect();

    Array4::from_shape_vec((1, params.height as usize, params.width as usize, 3), data)
        .map_err(|e| AppError::inference(format!("Failed to create tensor: {}", e)))
}

fn run_session(session: &mut Session, input: Array4<f32>) -> Result<Vec<f32>, AppError> {
    let input_name = session.inputs()[0].name().to_string();
    let input_tensor = Value::from_array(input)?;
    let outputs = session.run(ort::inputs![input_name.as_str() => input_tensor])?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError::inference("Model produced no outputs"))?;
    let (_, data) = output_value.try_extract_tensor::<f32>()?;

    Ok(data.to_vec())
}
