use crate::config::InferenceSettings;
use crate::error::AppError;
use crate::models::category::Category;
use crate::models::classify_types::Recognition;
use crate::services::classifier::engine::{InferenceEngine, LoadConfig, LoadedModel, RunParams};
use crate::services::resources::ResourceReader;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Exclusively owned loaded model. Releasing is idempotent and also
/// happens on drop.
pub struct ModelHandle {
    category: Category,
    model: Option<Box<dyn LoadedModel>>,
}

impl ModelHandle {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn release(&mut self) {
        if let Some(model) = self.model.take() {
            log::info!("Releasing {} model", self.category);
            model.close();
        }
    }

    pub async fn run(&mut self, params: &RunParams) -> Result<Vec<Recognition>, AppError> {
        match self.model.as_mut() {
            Some(model) => model.run_model_on_image(params).await,
            None => Err(AppError::inference(format!("{} model has been released", self.category))),
        }
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("category", &self.category)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[derive(Clone)]
pub struct ModelManager {
    engine: Arc<dyn InferenceEngine>,
    resources: Arc<dyn ResourceReader>,
    settings: InferenceSettings,
    load_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        resources: Arc<dyn ResourceReader>,
        settings: InferenceSettings,
    ) -> Self {
        Self {
            engine,
            resources,
            settings,
            load_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    pub fn load_config(&self, category: Category) -> LoadConfig {
        let config = category.config();
        LoadConfig {
            model: self.resources.locate(config.model),
            labels: self.resources.locate(config.labels),
            is_quantized: false,
            num_threads: self.settings.num_threads,
        }
    }

    /// Held across a load and the install or discard that follows it, so at
    /// most one live handle exists at a time.
    pub async fn serialize(&self) -> MutexGuard<'_, ()> {
        self.load_lock.lock().await
    }

    /// Releases `previous`, then loads the model for `category`. Never
    /// reuses a previously loaded model.
    pub async fn switch_model(
        &self,
        previous: Option<ModelHandle>,
        category: Category,
    ) -> Result<ModelHandle, AppError> {
        if let Some(mut handle) = previous {
            Self::release_model(&mut handle);
        }

        let config = self.load_config(category);
        log::info!("Loading {} model from {}", category, config.model.display());
        let model = self.engine.load_model(&config).await.map_err(|e| {
            AppError::model_load(format!("loadModel error for {}: {}", category, e.message))
        })?;

        Ok(ModelHandle {
            category,
            model: Some(model),
        })
    }

    pub fn release_model(handle: &mut ModelHandle) {
        handle.release();
    }
}
