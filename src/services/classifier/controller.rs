use crate::error::{AppError, ErrorKind};
use crate::models::category::Category;
use crate::models::classify_types::{ClassifierStatus, DisplayLabel, PickOutcome};
use crate::services::classifier::engine::RunParams;
use crate::services::classifier::model_manager::{ModelHandle, ModelManager};
use crate::services::classifier::session;
use crate::services::labels::{load_label_table, LabelTable};
use crate::services::resources::ResourceReader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

/// The active category's model and labels, tagged with the generation of
/// the switch that requested them. Only completions carrying the current
/// generation may write here.
#[derive(Debug, Default)]
struct ResourceHolder {
    generation: u64,
    category: Category,
    labels: Arc<LabelTable>,
    labels_ready: bool,
    model: Option<ModelHandle>,
    model_settled: bool,
    model_error: Option<String>,
    result: DisplayLabel,
    image: Option<String>,
}

/// Handles for the two refreshes started by one category switch.
pub struct SwitchTicket {
    pub generation: u64,
    pub category: Category,
    labels: JoinHandle<()>,
    model: JoinHandle<()>,
}

impl SwitchTicket {
    /// Waits for both refreshes, whether their results were kept or discarded.
    pub async fn settled(self) {
        if let Err(e) = self.labels.await {
            log::error!("Label refresh for {} aborted: {}", self.category, e);
        }
        if let Err(e) = self.model.await {
            log::error!("Model refresh for {} aborted: {}", self.category, e);
        }
    }
}

#[derive(Clone)]
pub struct CategoryController {
    models: ModelManager,
    resources: Arc<dyn ResourceReader>,
    state: Arc<Mutex<ResourceHolder>>,
}

impl CategoryController {
    pub fn new(models: ModelManager, resources: Arc<dyn ResourceReader>) -> Self {
        Self {
            models,
            resources,
            state: Arc::new(Mutex::new(ResourceHolder::default())),
        }
    }

    /// Resets the displayed result and preview, then starts the label and
    /// model refreshes for `category` without waiting for them.
    pub async fn on_category_change(&self, category: Category) -> SwitchTicket {
        let (generation, previous) = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.category = category;
            state.result = DisplayLabel::Placeholder;
            state.image = None;
            state.labels = Arc::default();
            state.labels_ready = false;
            state.model_settled = false;
            state.model_error = None;
            (state.generation, state.model.take())
        };
        log::info!("Switching to {} (generation {})", category, generation);

        let labels = tokio::spawn(self.clone().refresh_labels(generation, category));
        let model = tokio::spawn(self.clone().refresh_model(generation, category, previous));

        SwitchTicket {
            generation,
            category,
            labels,
            model,
        }
    }

    async fn refresh_labels(self, generation: u64, category: Category) {
        let table = load_label_table(self.resources.as_ref(), category).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            log::debug!(
                "Discarding {} labels from generation {} (current {})",
                category,
                generation,
                state.generation
            );
            return;
        }
        state.labels = Arc::new(table);
        state.labels_ready = true;
    }

    async fn refresh_model(self, generation: u64, category: Category, previous: Option<ModelHandle>) {
        let _serial = self.models.serialize().await;
        let loaded = self.models.switch_model(previous, category).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            log::debug!(
                "Discarding {} model from generation {} (current {})",
                category,
                generation,
                state.generation
            );
            if let Ok(mut handle) = loaded {
                ModelManager::release_model(&mut handle);
            }
            return;
        }

        match loaded {
            Ok(handle) => state.model = Some(handle),
            Err(e) => {
                log::error!("{}", e);
                state.model_error = Some(e.message);
            }
        }
        state.model_settled = true;
    }

    /// Classifies `image` with the current category's model and labels.
    /// Refused with "No result" until both refreshes of the current
    /// generation have settled. The model is taken out of the holder for
    /// the run and only put back if no switch happened meanwhile.
    pub async fn classify(&self, image: impl Into<String>) -> DisplayLabel {
        let image = image.into();
        let generation = {
            let mut state = self.state.lock().await;
            state.image = Some(image.clone());
            if !(state.labels_ready && state.model_settled) {
                log::warn!(
                    "{} resources still loading (generation {}), refusing inference",
                    state.category,
                    state.generation
                );
                state.result = DisplayLabel::NoResult;
                return DisplayLabel::NoResult;
            }
            state.generation
        };

        let _serial = self.models.serialize().await;
        let (mut model, labels) = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                log::debug!("Generation {} superseded before inference started", generation);
                return DisplayLabel::NoResult;
            }
            (state.model.take(), Arc::clone(&state.labels))
        };

        let params = RunParams::new(image_path(&image), self.models.settings());
        let label = session::classify(model.as_mut(), &labels, &params).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            log::debug!(
                "Discarding result from generation {} (current {})",
                generation,
                state.generation
            );
            if let Some(mut handle) = model {
                log::info!("{} was switched away during inference", handle.category());
                ModelManager::release_model(&mut handle);
            }
            return label;
        }
        state.model = model;
        state.result = label.clone();
        label
    }

    /// Classifies a picked image. A cancelled or failed pick changes nothing.
    pub async fn on_pick(&self, outcome: PickOutcome) -> Option<DisplayLabel> {
        match outcome {
            PickOutcome::Picked(uri) => Some(self.classify(uri).await),
            PickOutcome::Cancelled => {
                log::debug!("Image pick cancelled");
                None
            }
            PickOutcome::Failed(message) => {
                log::error!("{}", AppError::new(ErrorKind::Picker, message));
                None
            }
        }
    }

    /// Discards in-flight loads and releases the model. Safe to repeat.
    pub async fn teardown(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.labels = Arc::default();
            state.labels_ready = false;
            state.model_settled = false;
            state.model.take()
        };
        if let Some(mut handle) = previous {
            ModelManager::release_model(&mut handle);
        }
    }

    pub async fn status(&self) -> ClassifierStatus {
        let state = self.state.lock().await;
        ClassifierStatus {
            category: state.category,
            generation: state.generation,
            labels_ready: state.labels_ready,
            label_count: state.labels.len(),
            model_ready: state.model_settled && state.model_error.is_none(),
            model_error: state.model_error.clone(),
            result: state.result.clone(),
            image: state.image.clone(),
        }
    }
}

/// `file:` URIs are percent-decoded; anything else is taken as a path.
fn image_path(uri: &str) -> PathBuf {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(uri))
}
